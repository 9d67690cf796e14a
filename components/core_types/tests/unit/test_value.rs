//! Unit tests for Value and Outcome

use core_types::{FutureError, FutureId, Outcome, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_from_primitives() {
        assert_eq!(Value::from(42), Value::Smi(42));
        assert_eq!(Value::from(1.5), Value::Double(1.5));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from("hi"), Value::String("hi".to_string()));
        assert_eq!(Value::from("hi".to_string()), Value::from("hi"));
    }

    #[test]
    fn test_value_from_vec() {
        let value = Value::from(vec![Value::Smi(1), Value::Null]);
        assert_eq!(value.as_array(), Some(&[Value::Smi(1), Value::Null][..]));
    }

    #[test]
    fn test_value_from_outcome() {
        let value = Value::from(Outcome::Fulfilled(Value::Smi(1)));
        assert_eq!(
            value.as_outcome(),
            Some(&Outcome::Fulfilled(Value::Smi(1)))
        );
    }

    #[test]
    fn test_value_from_error() {
        let value = Value::from(FutureError::Aggregate(vec![]));
        assert!(value.as_error().is_some());
        assert_eq!(value.to_string(), "all 0 futures were rejected");
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_different_variants_are_not_equal() {
        assert_ne!(Value::Undefined, Value::Null);
        assert_ne!(Value::Smi(1), Value::Double(1.0));
        assert_ne!(Value::from("1"), Value::Smi(1));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }

    #[test]
    fn test_errors_compare_by_identity() {
        let a = Value::error(FutureError::Cycle(FutureId::new(1)));
        let b = Value::error(FutureError::Cycle(FutureId::new(1)));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_arrays_compare_elementwise() {
        let a = Value::Array(vec![Value::Smi(1), Value::from("x")]);
        let b = Value::Array(vec![Value::Smi(1), Value::from("x")]);
        assert_eq!(a, b);
    }
}

#[cfg(test)]
mod value_conversion_tests {
    use super::*;

    #[test]
    fn test_display_primitives() {
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Smi(-3).to_string(), "-3");
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_display_nested_outcomes() {
        let value = Value::Array(vec![
            Outcome::Fulfilled(Value::Smi(1)).into(),
            Outcome::Rejected(Value::from("e")).into(),
        ]);
        assert_eq!(
            value.to_string(),
            "{status: fulfilled, value: 1},{status: rejected, reason: e}"
        );
    }

    #[test]
    fn test_display_error_uses_message() {
        let value = Value::error(FutureError::Cycle(FutureId::new(9)));
        assert_eq!(value.to_string(), "chaining cycle detected for future #9");
    }

    #[test]
    fn test_non_thenables_have_no_capability() {
        assert!(Value::Smi(1).as_thenable().is_none());
        assert!(Value::Smi(1).as_array().is_none());
        assert!(Value::Smi(1).as_outcome().is_none());
        assert!(Value::Smi(1).as_error().is_none());
    }
}

#[cfg(test)]
mod outcome_tests {
    use super::*;

    #[test]
    fn test_fulfilled_outcome() {
        let outcome = Outcome::Fulfilled(Value::Smi(1));
        assert_eq!(outcome.status(), "fulfilled");
        assert!(outcome.is_fulfilled());
        assert_eq!(outcome.value(), Some(&Value::Smi(1)));
        assert_eq!(outcome.reason(), None);
    }

    #[test]
    fn test_rejected_outcome() {
        let outcome = Outcome::Rejected(Value::from("e"));
        assert_eq!(outcome.status(), "rejected");
        assert!(!outcome.is_fulfilled());
        assert_eq!(outcome.value(), None);
        assert_eq!(outcome.reason(), Some(&Value::from("e")));
    }

    #[test]
    fn test_outcome_display() {
        let outcome = Outcome::Rejected(Value::from("e"));
        assert_eq!(outcome.to_string(), "{status: rejected, reason: e}");
    }
}
