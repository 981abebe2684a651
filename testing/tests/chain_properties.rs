//! Traversal properties checked through the testing doubles

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(missing_docs)]

use composable_chain_core::prelude::*;
use composable_chain_testing::properties::{advancing_result, handler_result, recording_chain};
use composable_chain_testing::{ChainTest, Faulty, Journal, Recording, assertions};
use proptest::prelude::*;

struct Job;

impl Payload for Job {
    type Outcome = bool;
    type Fact = NoFacts;
}

fn names(range: impl Iterator<Item = usize>) -> Vec<String> {
    range.map(|index| index.to_string()).collect()
}

proptest! {
    #[test]
    fn prop_advancing_chain_visits_every_handler_once(
        results in prop::collection::vec(advancing_result(), 1..10)
    ) {
        let journal = Journal::new();
        let chain: Chain<Job> = recording_chain(&journal, &results);

        let execution = chain.run(Job).unwrap();

        prop_assert_eq!(journal.entries(), names(0..results.len()));
        prop_assert_eq!(Some(&execution.result), results.last());
    }

    #[test]
    fn prop_first_handled_stops_traversal(
        results in prop::collection::vec(handler_result(), 1..10)
    ) {
        let journal = Journal::new();
        let chain: Chain<Job> = recording_chain(&journal, &results);

        let execution = chain.run(Job).unwrap();

        match results.iter().position(|r| *r == HandlerResult::Handled) {
            Some(k) => {
                prop_assert_eq!(journal.entries(), names(0..=k));
                prop_assert_eq!(execution.result, HandlerResult::Handled);
            }
            None => prop_assert_eq!(journal.entries(), names(0..results.len())),
        }
    }

    #[test]
    fn prop_rejected_handlers_never_process(
        admits in prop::collection::vec(any::<bool>(), 1..10)
    ) {
        let journal = Journal::new();
        let chain = admits.iter().enumerate().fold(Chain::<Job>::new(), |chain, (index, &admit)| {
            let handler = Recording::new(index.to_string(), &journal);
            if admit {
                chain.add_handler(handler)
            } else {
                chain.add_handler(handler.rejecting())
            }
        });

        let execution = chain.run(Job).unwrap();

        let expected: Vec<String> = admits
            .iter()
            .enumerate()
            .filter(|(_, admit)| **admit)
            .map(|(index, _)| index.to_string())
            .collect();
        prop_assert_eq!(journal.entries(), expected);
        if admits.last() == Some(&false) {
            prop_assert_eq!(execution.result, HandlerResult::Handled);
        }
    }
}

#[test]
fn test_removal_relinks_remaining_members() {
    let journal = Journal::new();
    let middle = std::sync::Arc::new(Recording::new("middle", &journal));
    let chain = Chain::<Job>::new()
        .add_handler(Recording::new("first", &journal))
        .add_shared(std::sync::Arc::clone(&middle))
        .add_handler(Recording::new("last", &journal))
        .remove_handler(&middle);

    ChainTest::new(chain)
        .given_payload(Job)
        .when_executed()
        .then_result(HandlerResult::Continue)
        .then_journal(&journal, &["first", "last"])
        .run();
}

#[test]
fn test_fault_aborts_pipeline() {
    let journal = Journal::new();
    let chain = Chain::<Job>::new()
        .add_handler(Recording::new("first", &journal))
        .add_handler(Faulty::new("database unreachable").recorded(&journal))
        .add_handler(Recording::new("never", &journal));

    ChainTest::new(chain)
        .given_payload(Job)
        .when_executed()
        .then_error(|error| assert!(!error.is_configuration()))
        .run();

    assertions::assert_visited(&journal, &["first", "faulty"]);
    assertions::assert_not_visited(&journal, "never");
}

#[test]
fn test_built_head_nests_as_one_member() {
    let journal = Journal::new();
    let inner = Chain::<Job>::new()
        .add_handler(Recording::new("inner-a", &journal))
        .add_handler(Recording::new("inner-b", &journal))
        .build()
        .unwrap();
    let outer = Chain::<Job>::new()
        .add_handler(Recording::new("before", &journal))
        .add_handler(inner.logged("inner"))
        .add_handler(Recording::new("after", &journal));

    outer.run(Job).unwrap();

    assertions::assert_visited(&journal, &["before", "inner-a", "inner-b", "after"]);
}
