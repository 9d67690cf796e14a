//! Unit tests for the Thenable capability and FutureId

use core_types::{Continuation, FutureId, Thenable, Value};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Holds its continuations until told how to settle.
#[derive(Default)]
struct Deferred {
    waiting: RefCell<Vec<(Continuation, Continuation)>>,
}

impl Deferred {
    fn fulfill(&self, value: Value) {
        for (on_fulfilled, _) in self.waiting.borrow_mut().drain(..) {
            on_fulfilled(value.clone());
        }
    }
}

impl Thenable for Deferred {
    fn attach_continuations(
        &self,
        on_fulfilled: Continuation,
        on_rejected: Continuation,
    ) -> Result<(), Value> {
        self.waiting.borrow_mut().push((on_fulfilled, on_rejected));
        Ok(())
    }

    fn future_id(&self) -> Option<FutureId> {
        Some(FutureId::new(99))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod thenable_tests {
    use super::*;

    #[test]
    fn test_continuations_run_when_settled() {
        let deferred = Deferred::default();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        deferred
            .attach_continuations(
                Box::new(move |v| *s.borrow_mut() = Some(v)),
                Box::new(|_| {}),
            )
            .unwrap();
        assert!(seen.borrow().is_none());
        deferred.fulfill(Value::Smi(3));
        assert_eq!(*seen.borrow(), Some(Value::Smi(3)));
    }

    #[test]
    fn test_downcast_through_value() {
        let value = Value::Thenable(Rc::new(Deferred::default()));
        let thenable = value.as_thenable().unwrap();
        assert!(thenable.as_any().downcast_ref::<Deferred>().is_some());
        assert!(value.as_array().is_none());
    }

    #[test]
    fn test_thenables_with_ids_compare_by_id() {
        let a = Value::Thenable(Rc::new(Deferred::default()));
        let b = Value::Thenable(Rc::new(Deferred::default()));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[future #99]");
    }
}

#[cfg(test)]
mod future_id_tests {
    use super::*;

    #[test]
    fn test_future_id_roundtrip_and_display() {
        let id = FutureId::new(5);
        assert_eq!(id.as_u64(), 5);
        assert_eq!(id.to_string(), "#5");
        assert!(FutureId::new(1) < FutureId::new(2));
    }
}
