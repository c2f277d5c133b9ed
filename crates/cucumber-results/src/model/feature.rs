//! Feature nodes and their scenario collections.

use hashbrown::HashMap;

use crate::event::{FeatureEvent, Tag};
use crate::naming::{NameArena, SafeNameCell, safe};
use crate::outcome::Counts;

use super::scenario::ScenarioNode;

/// A feature as it appeared in one parsed document.
#[derive(Debug)]
pub struct FeatureNode {
    pub(crate) id: Option<String>,
    pub(crate) keyword: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) uri: Option<String>,
    pub(crate) line: Option<u32>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) scenarios: Vec<ScenarioNode>,
    pub(crate) scenario_names: NameArena,
    pub(crate) safe_name: SafeNameCell,
    pub(crate) counts: Counts,
    pub(crate) scenarios_by_name: HashMap<String, usize>,
    pub(crate) failed: Vec<usize>,
}

impl FeatureNode {
    /// Create an empty feature from its header and source URI.
    #[must_use]
    pub fn new(uri: Option<String>, event: FeatureEvent) -> Self {
        Self {
            id: event.id,
            keyword: event.keyword,
            name: event.name,
            description: event.description,
            uri,
            line: event.line,
            tags: event.tags,
            scenarios: Vec::new(),
            scenario_names: NameArena::default(),
            safe_name: SafeNameCell::default(),
            counts: Counts::default(),
            scenarios_by_name: HashMap::new(),
            failed: Vec::new(),
        }
    }

    /// Declared feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Author-supplied identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Gherkin keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Source document the feature was read from.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Line of the header.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Tags inherited by every scenario of the feature.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Scenarios in execution order.
    #[must_use]
    pub fn scenarios(&self) -> &[ScenarioNode] {
        &self.scenarios
    }

    /// Scenario at `index`.
    #[must_use]
    pub fn scenario(&self, index: usize) -> Option<&ScenarioNode> {
        self.scenarios.get(index)
    }

    /// Aggregate counters over the feature's scenarios. Valid after a tally.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Whether every scenario passed. Valid after a tally.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.counts.is_passed()
    }

    /// Failed scenarios in execution order. Valid after a tally.
    pub fn failed_scenarios(&self) -> impl Iterator<Item = &ScenarioNode> {
        self.failed
            .iter()
            .filter_map(|&index| self.scenarios.get(index))
    }

    /// Safe name of the scenario at `index`, assigning it on first request.
    ///
    /// The name is unique among the feature's scenarios and never changes
    /// once assigned.
    #[must_use]
    pub fn scenario_safe_name(&self, index: usize) -> Option<&str> {
        let scenario = self.scenarios.get(index)?;
        Some(
            scenario
                .safe_name
                .get_or_claim(&self.scenario_names, || {
                    scenario.declared_base(&self.declared_base())
                }),
        )
    }

    /// Position of the scenario with the given safe name. Valid after a tally.
    #[must_use]
    pub fn scenario_position(&self, safe_name: &str) -> Option<usize> {
        self.scenarios_by_name.get(safe_name).copied()
    }

    /// Scenario with the given safe name. Valid after a tally.
    #[must_use]
    pub fn scenario_by_safe_name(&self, safe_name: &str) -> Option<&ScenarioNode> {
        self.scenario_position(safe_name)
            .and_then(|index| self.scenarios.get(index))
    }

    /// Safe name, if one has been assigned yet.
    #[must_use]
    pub fn assigned_safe_name(&self) -> Option<&str> {
        self.safe_name.get()
    }

    /// Sanitised declared identifier, before uniquification.
    pub(crate) fn declared_base(&self) -> String {
        safe(self.id.as_deref().unwrap_or(&self.name))
    }

    pub(crate) fn push_scenario(&mut self, scenario: ScenarioNode) -> usize {
        self.scenarios.push(scenario);
        self.scenarios.len() - 1
    }

    pub(crate) fn scenario_mut(&mut self, index: usize) -> Option<&mut ScenarioNode> {
        self.scenarios.get_mut(index)
    }
}
