//! Property tests for chain traversal.
//!
//! A chain is generated as a list of scripted steps: each step either rejects
//! the request at its gate or processes it and reports a fixed result. The
//! observed visits are compared with a straightforward model of traversal.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use composable_chain_core::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Reject,
    Process(HandlerResult),
}

#[derive(Default)]
struct Probe {
    processed: Vec<usize>,
}

impl Payload for Probe {
    type Outcome = usize;
    type Fact = NoFacts;
}

struct Scripted {
    index: usize,
    step: Step,
}

impl Handler<Probe> for Scripted {
    fn can_handle(&self, _request: &Request<Probe>) -> bool {
        !matches!(self.step, Step::Reject)
    }

    fn process(&self, request: &mut Request<Probe>) -> Result<HandlerResult> {
        request.payload_mut().processed.push(self.index);
        request.set_result(self.index);
        match self.step {
            Step::Process(result) => Ok(result),
            Step::Reject => Err(ChainError::fault_msg("rejected handler was processed")),
        }
    }
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Reject),
        Just(Step::Process(HandlerResult::Handled)),
        Just(Step::Process(HandlerResult::Continue)),
        Just(Step::Process(HandlerResult::Skip)),
    ]
}

fn chain_of(steps: &[Step]) -> Chain<Probe> {
    steps
        .iter()
        .enumerate()
        .fold(Chain::new(), |chain, (index, &step)| {
            chain.add_handler(Scripted { index, step })
        })
}

/// Expected processed positions and terminal result.
fn model(steps: &[Step]) -> (Vec<usize>, HandlerResult) {
    let mut processed = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        let last = index + 1 == steps.len();
        match step {
            Step::Reject if last => return (processed, HandlerResult::Handled),
            Step::Reject => {}
            Step::Process(result) => {
                processed.push(index);
                if *result == HandlerResult::Handled || last {
                    return (processed, *result);
                }
            }
        }
    }
    (processed, HandlerResult::Handled)
}

proptest! {
    #[test]
    fn prop_traversal_matches_model(steps in prop::collection::vec(step(), 1..12)) {
        let chain = chain_of(&steps);
        let execution = chain.run(Probe::default()).unwrap();
        let (processed, result) = model(&steps);

        prop_assert_eq!(&execution.request.payload().processed, &processed);
        prop_assert_eq!(execution.result, result);
    }

    #[test]
    fn prop_processed_positions_strictly_increase(steps in prop::collection::vec(step(), 1..12)) {
        let execution = chain_of(&steps).run(Probe::default()).unwrap();
        let processed = &execution.request.payload().processed;

        prop_assert!(processed.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn prop_built_head_agrees_with_chain(steps in prop::collection::vec(step(), 1..12)) {
        let chain = chain_of(&steps);
        let head = chain.build().unwrap();

        let mut direct = Request::new(Probe::default());
        let mut via_head = Request::new(Probe::default());
        let direct_result = chain.execute(&mut direct).unwrap();
        let head_result = head.handle(&mut via_head).unwrap();

        prop_assert_eq!(direct_result, head_result);
        prop_assert_eq!(&direct.payload().processed, &via_head.payload().processed);
    }

    #[test]
    fn prop_handlers_reflect_insertion_order(len in 1usize..16) {
        let steps = vec![Step::Process(HandlerResult::Continue); len];
        let chain = chain_of(&steps);

        prop_assert_eq!(chain.len(), len);
        let execution = chain.run(Probe::default()).unwrap();
        prop_assert_eq!(
            execution.request.payload().processed.clone(),
            (0..len).collect::<Vec<_>>()
        );
        prop_assert_eq!(execution.request.result().copied().ok(), Some(len - 1));
    }
}

#[test]
fn empty_chain_cannot_run() {
    let chain: Chain<Probe> = Chain::new();
    assert!(matches!(chain.run(Probe::default()), Err(ChainError::EmptyChain)));
    assert!(matches!(chain.build(), Err(ChainError::EmptyChain)));
}

#[test]
fn traced_traversal_matches_untraced() {
    let steps = [
        Step::Process(HandlerResult::Skip),
        Step::Reject,
        Step::Process(HandlerResult::Continue),
        Step::Process(HandlerResult::Handled),
    ];
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    let traced = tracing::subscriber::with_default(subscriber, || {
        chain_of(&steps).run(Probe::default()).unwrap()
    });
    let untraced = chain_of(&steps).run(Probe::default()).unwrap();

    assert_eq!(traced.result, untraced.result);
    assert_eq!(traced.request.payload().processed, vec![0, 2, 3]);
    assert_eq!(untraced.request.payload().processed, vec![0, 2, 3]);
}
