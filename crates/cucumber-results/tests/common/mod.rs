//! Helpers shared by the integration tests.

use std::time::Duration;

use cucumber_results::event::{Event, FeatureEvent, OutcomeRecord, ScenarioEvent, StepEvent};
use cucumber_results::{BuilderConfig, Outcome, ResultTree, TreeBuilder};

/// Build a tallied tree holding one feature whose scenarios each run a
/// single step with the given outcome.
#[must_use]
pub fn single_feature(uri: &str, feature: &str, outcomes: &[Outcome]) -> ResultTree {
    let mut events = vec![
        Event::DocumentStart { uri: uri.into() },
        Event::Feature(FeatureEvent::named(feature)),
    ];
    for (index, &outcome) in outcomes.iter().enumerate() {
        events.extend([
            Event::Scenario(ScenarioEvent::named(format!("scenario {index}"))),
            Event::Step(StepEvent::new("Given ", "a step")),
            Event::Result(OutcomeRecord::new(outcome, Duration::from_millis(1))),
        ]);
    }
    events.push(Event::EndOfDocument);

    let mut builder = TreeBuilder::new(BuilderConfig::default());
    if let Err(err) = builder.process_all(events) {
        panic!("well-formed events should build: {err}");
    }
    builder.finish()
}
