//! Unit tests for join_all, settle_all, race and first_success

use core_types::{Continuation, FutureError, Outcome, Thenable, Value};
use eventual::{first_success, join_all, race, settle_all, FutureState, Runtime};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

fn smi(n: i32) -> Value {
    Value::Smi(n)
}

fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

/// A foreign thenable fulfilling with a fixed value when attached.
struct Fixed(Value);

impl Thenable for Fixed {
    fn attach_continuations(
        &self,
        on_fulfilled: Continuation,
        _on_rejected: Continuation,
    ) -> Result<(), Value> {
        on_fulfilled(self.0.clone());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

mod join_all_tests {
    use super::*;

    #[test]
    fn empty_input_fulfills_immediately() {
        let runtime = Runtime::new();
        let all = join_all(&runtime, Vec::<Value>::new());
        assert_eq!(all.value(), Some(array(vec![])));
    }

    #[test]
    fn values_follow_input_order_not_settlement_order() {
        let runtime = Runtime::new();
        let (a, resolve_a) = runtime.pending();
        let (b, resolve_b) = runtime.pending();
        let (c, resolve_c) = runtime.pending();
        let all = join_all(&runtime, vec![a, b, c]);

        resolve_c.resolve(3);
        runtime.drain();
        resolve_a.resolve(1);
        runtime.drain();
        assert!(all.is_pending());

        resolve_b.resolve(2);
        runtime.drain();
        assert_eq!(all.value(), Some(array(vec![smi(1), smi(2), smi(3)])));
    }

    #[test]
    fn plain_values_count_as_fulfilled() {
        let runtime = Runtime::new();
        let all = join_all(&runtime, vec![smi(1), Value::from("two"), Value::Null]);
        runtime.drain();
        assert_eq!(
            all.value(),
            Some(array(vec![smi(1), Value::from("two"), Value::Null]))
        );
    }

    #[test]
    fn foreign_thenables_are_adopted() {
        let runtime = Runtime::new();
        let inputs = vec![Value::Thenable(Rc::new(Fixed(smi(7)))), smi(8)];
        let all = join_all(&runtime, inputs);
        runtime.drain();
        assert_eq!(all.value(), Some(array(vec![smi(7), smi(8)])));
    }

    #[test]
    fn any_rejection_rejects_the_result() {
        let runtime = Runtime::new();
        let all = join_all(
            &runtime,
            vec![runtime.resolved(1), runtime.rejected("x"), runtime.resolved(3)],
        );
        runtime.drain();
        assert_eq!(all.reason(), Some(Value::from("x")));
    }

    #[test]
    fn earliest_rejection_by_time_wins() {
        let runtime = Runtime::new();
        let (first, reject_first) = runtime.pending();
        let (second, reject_second) = runtime.pending();
        let all = join_all(&runtime, vec![first, second]);

        reject_second.reject("b");
        runtime.drain();
        reject_first.reject("a");
        runtime.drain();
        assert_eq!(all.reason(), Some(Value::from("b")));
    }

    #[test]
    fn late_fulfillments_after_rejection_are_ignored() {
        let runtime = Runtime::new();
        let (slow, resolve_slow) = runtime.pending();
        let all = join_all(&runtime, vec![slow.clone(), runtime.rejected("x")]);
        runtime.drain();

        resolve_slow.resolve(1);
        runtime.drain();
        assert_eq!(all.state(), FutureState::Rejected);
        assert_eq!(slow.value(), Some(smi(1)));
    }
}

mod settle_all_tests {
    use super::*;

    #[test]
    fn empty_input_fulfills_immediately() {
        let runtime = Runtime::new();
        let settled = settle_all(&runtime, Vec::<Value>::new());
        assert_eq!(settled.value(), Some(array(vec![])));
    }

    #[test]
    fn reports_every_outcome_in_input_order() {
        let runtime = Runtime::new();
        let (late, resolve_late) = runtime.pending();
        let settled = settle_all(
            &runtime,
            vec![late.into(), runtime.rejected("e").into(), smi(3)],
        );
        runtime.drain();
        assert!(settled.is_pending());

        resolve_late.resolve(1);
        runtime.drain();
        assert_eq!(
            settled.value(),
            Some(array(vec![
                Outcome::Fulfilled(smi(1)).into(),
                Outcome::Rejected(Value::from("e")).into(),
                Outcome::Fulfilled(smi(3)).into(),
            ]))
        );
    }

    #[test]
    fn never_rejects_even_if_everything_rejects() {
        let runtime = Runtime::new();
        let settled = settle_all(&runtime, vec![runtime.rejected("a"), runtime.rejected("b")]);
        runtime.drain();
        assert_eq!(settled.state(), FutureState::Fulfilled);

        let outcomes = settled.value().unwrap();
        let statuses: Vec<&str> = outcomes
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_outcome().unwrap().status())
            .collect();
        assert_eq!(statuses, vec!["rejected", "rejected"]);
    }

    #[test]
    fn inputs_are_marked_observed() {
        let runtime = Runtime::new();
        let input = runtime.rejected("e");
        let _settled = settle_all(&runtime, vec![input]);
        runtime.drain();
        assert!(runtime.unhandled_rejections().is_empty());
    }
}

mod race_tests {
    use super::*;

    #[test]
    fn empty_input_never_settles() {
        let runtime = Runtime::new();
        let winner = race(&runtime, Vec::<Value>::new());
        runtime.drain();
        assert!(winner.is_pending());
    }

    #[test]
    fn first_settlement_wins() {
        let runtime = Runtime::new();
        let (a, resolve_a) = runtime.pending();
        let (b, resolve_b) = runtime.pending();
        let winner = race(&runtime, vec![a, b]);

        resolve_b.resolve("b");
        resolve_a.resolve("a");
        runtime.drain();
        assert_eq!(winner.value(), Some(Value::from("b")));
    }

    #[test]
    fn rejection_can_win() {
        let runtime = Runtime::new();
        let (slow, resolve_slow) = runtime.pending();
        let winner = race(&runtime, vec![slow, runtime.rejected("first")]);
        runtime.drain();
        resolve_slow.resolve(1);
        runtime.drain();
        assert_eq!(winner.reason(), Some(Value::from("first")));
    }

    #[test]
    fn abandoned_inputs_keep_running() {
        let runtime = Runtime::new();
        let (loser, resolve_loser) = runtime.pending();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        let loser_tail = loser.then(move |v| {
            r.set(true);
            Ok(v)
        });

        let winner = race(&runtime, vec![runtime.resolved("won"), loser]);
        runtime.drain();
        assert_eq!(winner.value(), Some(Value::from("won")));

        resolve_loser.resolve("lost");
        runtime.drain();
        assert!(ran.get());
        assert_eq!(loser_tail.value(), Some(Value::from("lost")));
        assert_eq!(winner.value(), Some(Value::from("won")));
    }
}

mod first_success_tests {
    use super::*;

    fn aggregate_reasons(reason: Option<Value>) -> Vec<Value> {
        match reason.as_ref().and_then(Value::as_error) {
            Some(FutureError::Aggregate(reasons)) => reasons.clone(),
            other => panic!("expected aggregate error, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_rejects_immediately() {
        let runtime = Runtime::new();
        let any = first_success(&runtime, Vec::<Value>::new());
        assert_eq!(any.state(), FutureState::Rejected);
        assert!(aggregate_reasons(any.reason()).is_empty());
    }

    #[test]
    fn first_fulfillment_wins() {
        let runtime = Runtime::new();
        let any = first_success(
            &runtime,
            vec![runtime.rejected("a"), runtime.rejected("b"), runtime.resolved(5)],
        );
        runtime.drain();
        assert_eq!(any.value(), Some(smi(5)));
    }

    #[test]
    fn all_rejected_aggregates_in_input_order() {
        let runtime = Runtime::new();
        let (a, reject_a) = runtime.pending();
        let (b, reject_b) = runtime.pending();
        let any = first_success(&runtime, vec![a, b]);

        reject_b.reject("b");
        runtime.drain();
        assert!(any.is_pending());
        reject_a.reject("a");
        runtime.drain();

        assert_eq!(
            aggregate_reasons(any.reason()),
            vec![Value::from("a"), Value::from("b")]
        );
    }

    #[test]
    fn rejections_after_success_are_ignored() {
        let runtime = Runtime::new();
        let (late, reject_late) = runtime.pending();
        let any = first_success(&runtime, vec![late.into(), smi(1)]);
        runtime.drain();
        reject_late.reject("late");
        runtime.drain();
        assert_eq!(any.value(), Some(smi(1)));
    }
}
