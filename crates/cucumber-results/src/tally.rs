//! Bottom-up recomputation of counters, failed lists and the tag index.
//!
//! Tallying is a pure function of the primary tree: it reads outcomes and
//! tags, overwrites every derived field and never fails. Running it twice
//! yields the same result.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::{
    BackgroundNode, FeatureId, FeatureNode, ResultTree, ScenarioId, ScenarioNode, TagNode,
    UNTAGGED,
};
use crate::outcome::{Outcome, rollup};

impl BackgroundNode {
    /// Recompute the background's flags and duration from its steps.
    pub fn tally(&mut self) {
        let (failed, skipped) = rollup(self.steps.iter().map(|step| step.outcome()));
        self.failed = failed;
        self.skipped = skipped;
        self.duration = self.steps.iter().map(|step| step.duration()).sum();
    }
}

impl ScenarioNode {
    /// Recompute the scenario's flags and duration.
    ///
    /// The background, hooks and steps all contribute; any failure among
    /// them fails the scenario, and a skip only counts when nothing failed.
    pub fn tally(&mut self) {
        let background = self.background.as_mut().map(|background| {
            background.tally();
            background.counts()
        });
        let background_outcome = background.map(|counts| {
            if counts.fail > 0 {
                Outcome::Failed
            } else if counts.skip > 0 {
                Outcome::Skipped
            } else {
                Outcome::Passed
            }
        });

        let outcomes = self
            .before
            .iter()
            .map(|hook| hook.outcome())
            .chain(background_outcome)
            .chain(self.steps.iter().map(|step| step.outcome()))
            .chain(self.after.iter().map(|hook| hook.outcome()));
        let (failed, skipped) = rollup(outcomes);
        self.failed = failed;
        self.skipped = skipped;

        let hooks: Duration = self
            .before
            .iter()
            .chain(&self.after)
            .map(|hook| hook.duration())
            .sum();
        let steps: Duration = self.steps.iter().map(|step| step.duration()).sum();
        self.duration = hooks + steps + background.map_or(Duration::ZERO, |counts| counts.duration);
    }
}

impl FeatureNode {
    /// Tally every scenario and rebuild the feature's derived state.
    ///
    /// Scenario safe names are forced in positional order so that the
    /// lookup index is deterministic.
    pub fn tally(&mut self) {
        for scenario in &mut self.scenarios {
            scenario.tally();
        }
        self.counts = self.scenarios.iter().map(ScenarioNode::counts).sum();
        self.failed = self
            .scenarios
            .iter()
            .enumerate()
            .filter(|(_, scenario)| scenario.is_failed())
            .map(|(index, _)| index)
            .collect();

        let index = (0..self.scenarios.len())
            .filter_map(|position| {
                self.scenario_safe_name(position)
                    .map(|name| (name.to_string(), position))
            })
            .collect();
        self.scenarios_by_name = index;
    }
}

impl ResultTree {
    /// Recompute every derived field of the tree.
    ///
    /// Features are tallied first; the tag index is rebuilt afterwards from
    /// the already-tallied scenarios.
    pub fn tally(&mut self) {
        for feature in &mut self.features {
            feature.tally();
        }
        self.counts = self.features.iter().map(FeatureNode::counts).sum();
        self.failed = self
            .scenarios()
            .filter(|(_, scenario)| scenario.is_failed())
            .map(|(id, _)| id)
            .collect();

        let names = (0..self.features.len())
            .filter_map(|position| {
                self.feature_safe_name(FeatureId(position))
                    .map(|name| (name.to_string(), position))
            })
            .collect();
        self.features_by_name = names;
        self.tags = self.build_tag_index();
        log::debug!(
            "tallied {} features: {} passed, {} failed, {} skipped",
            self.features.len(),
            self.counts.pass,
            self.counts.fail,
            self.counts.skip
        );
    }

    fn build_tag_index(&self) -> BTreeMap<String, TagNode> {
        let mut tags: BTreeMap<String, TagNode> = BTreeMap::new();
        for (id, scenario) in self.scenarios() {
            for name in effective_tags(self, id, scenario) {
                let tag = tags
                    .entry(name.to_string())
                    .or_insert_with(|| TagNode::new(name));
                if tag.members.insert(id) {
                    tag.counts += scenario.counts();
                    if scenario.is_failed() {
                        tag.failed.push(id);
                    }
                }
            }
        }
        tags
    }
}

/// Tag names applying to a scenario: its own, the feature's, or the
/// untagged sentinel when the scenario declares none itself.
fn effective_tags<'a>(
    tree: &'a ResultTree,
    id: ScenarioId,
    scenario: &'a ScenarioNode,
) -> impl Iterator<Item = &'a str> {
    let own = scenario.tags().iter().map(|tag| tag.name.as_str());
    let sentinel = scenario.tags().is_empty().then_some(UNTAGGED);
    let inherited = tree
        .feature(id.feature_id())
        .map(FeatureNode::tags)
        .unwrap_or_default()
        .iter()
        .map(|tag| tag.name.as_str());
    own.chain(sentinel).chain(inherited)
}
