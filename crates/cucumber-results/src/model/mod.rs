//! The result tree and its nodes.
//!
//! Ownership flows strictly downwards: the tree owns its features, a feature
//! owns its scenarios and a scenario owns its background, steps, hooks and
//! attachment references. Upward links are positional [`FeatureId`] and
//! [`ScenarioId`] handles, never owners.
//!
//! Counters, failed lists and the tag index are derived state. They are only
//! meaningful after [`ResultTree::tally`] has run, which the builder and the
//! merge engine both do before handing a tree out.

mod feature;
mod scenario;
mod tag;

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::naming::NameArena;
use crate::outcome::Counts;

pub use feature::FeatureNode;
pub use scenario::{BackgroundNode, EmbeddedItem, HookResultNode, ScenarioNode, StepNode};
pub use tag::{TagNode, UNTAGGED};

/// Identifier of the tree root in lookup paths.
pub const ROOT_ID: &str = "cucumber";

/// Position of a feature within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub usize);

/// Position of a scenario within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioId {
    /// Position of the owning feature.
    pub feature: usize,
    /// Position of the scenario within the feature.
    pub scenario: usize,
}

impl ScenarioId {
    /// Create a scenario handle.
    #[must_use]
    pub const fn new(feature: usize, scenario: usize) -> Self {
        Self { feature, scenario }
    }

    /// Handle of the owning feature.
    #[must_use]
    pub const fn feature_id(self) -> FeatureId {
        FeatureId(self.feature)
    }
}

/// Root of the results of one or more parsed documents.
#[derive(Debug, Default)]
pub struct ResultTree {
    pub(crate) features: Vec<FeatureNode>,
    pub(crate) feature_names: NameArena,
    pub(crate) counts: Counts,
    pub(crate) features_by_name: HashMap<String, usize>,
    pub(crate) failed: Vec<ScenarioId>,
    pub(crate) tags: BTreeMap<String, TagNode>,
}

impl ResultTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Features in the order they were added.
    #[must_use]
    pub fn features(&self) -> &[FeatureNode] {
        &self.features
    }

    /// Feature at the given position.
    #[must_use]
    pub fn feature(&self, id: FeatureId) -> Option<&FeatureNode> {
        self.features.get(id.0)
    }

    /// Features read from the given source document.
    ///
    /// A rerun of the same document contributes a second feature, so more
    /// than one node can share a URI.
    pub fn features_by_uri<'a>(
        &'a self,
        uri: &'a str,
    ) -> impl Iterator<Item = (FeatureId, &'a FeatureNode)> + 'a {
        self.features
            .iter()
            .enumerate()
            .filter(move |(_, feature)| feature.uri() == Some(uri))
            .map(|(index, feature)| (FeatureId(index), feature))
    }

    /// Scenario behind a handle.
    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&ScenarioNode> {
        self.features.get(id.feature)?.scenario(id.scenario)
    }

    /// Every scenario in tree order.
    pub fn scenarios(&self) -> impl Iterator<Item = (ScenarioId, &ScenarioNode)> {
        self.features
            .iter()
            .enumerate()
            .flat_map(|(feature, node)| {
                node.scenarios()
                    .iter()
                    .enumerate()
                    .map(move |(scenario, s)| (ScenarioId::new(feature, scenario), s))
            })
    }

    /// Safe name of a feature, assigning it on first request.
    #[must_use]
    pub fn feature_safe_name(&self, id: FeatureId) -> Option<&str> {
        let feature = self.features.get(id.0)?;
        Some(
            feature
                .safe_name
                .get_or_claim(&self.feature_names, || feature.declared_base()),
        )
    }

    /// Safe name of a scenario, assigning it on first request.
    #[must_use]
    pub fn scenario_safe_name(&self, id: ScenarioId) -> Option<&str> {
        self.features.get(id.feature)?.scenario_safe_name(id.scenario)
    }

    /// Aggregate counters over every feature. Valid after a tally.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Whether every scenario passed. Valid after a tally.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.counts.is_passed()
    }

    /// Whether the tree holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub(crate) fn push_feature(&mut self, feature: FeatureNode) -> usize {
        self.features.push(feature);
        self.features.len() - 1
    }

    pub(crate) fn feature_mut(&mut self, index: usize) -> Option<&mut FeatureNode> {
        self.features.get_mut(index)
    }
}
