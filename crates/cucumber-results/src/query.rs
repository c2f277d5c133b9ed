//! Lookup of nodes by safe-name path, tag and failure.
//!
//! Paths mirror how reports link to results: `cucumber` is the root,
//! `cucumber/<feature>` a feature, `cucumber/<feature>/<scenario>` a scenario
//! and `cucumber/@tag` a tag. The root segment may be omitted.

use crate::model::{FeatureId, FeatureNode, ROOT_ID, ResultTree, ScenarioId, ScenarioNode, TagNode};
use crate::outcome::Counts;

const PATH_SEPARATOR: char = '/';
const FULL_NAME_SEPARATOR: &str = " \u{01C2} ";

/// A node found by a path lookup.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    /// The tree root.
    Root(&'a ResultTree),
    /// A feature and its position.
    Feature(FeatureId, &'a FeatureNode),
    /// A scenario and its position.
    Scenario(ScenarioId, &'a ScenarioNode),
    /// A tag view.
    Tag(&'a TagNode),
}

impl NodeRef<'_> {
    /// Counters aggregated at the node.
    #[must_use]
    pub fn counts(&self) -> Counts {
        match self {
            Self::Root(tree) => tree.counts(),
            Self::Feature(_, feature) => feature.counts(),
            Self::Scenario(_, scenario) => scenario.counts(),
            Self::Tag(tag) => tag.counts(),
        }
    }
}

impl ResultTree {
    /// Resolve a safe-name path to a node. Valid after a tally.
    ///
    /// A single `@` segment names a tag first and a feature second. A
    /// feature whose safe name is `cucumber` is only reachable through the
    /// rooted form, `cucumber/cucumber`.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::event::{Event, FeatureEvent, ScenarioEvent};
    /// use cucumber_results::query::NodeRef;
    /// use cucumber_results::{BuilderConfig, TreeBuilder};
    ///
    /// let mut builder = TreeBuilder::new(BuilderConfig::default());
    /// builder
    ///     .process_all([
    ///         Event::Feature(FeatureEvent::named("Login").with_id("login")),
    ///         Event::Scenario(ScenarioEvent::named("Valid").with_id("login;valid")),
    ///         Event::EndOfDocument,
    ///     ])
    ///     .unwrap();
    /// let tree = builder.finish();
    /// assert!(matches!(tree.find("cucumber/login/valid"), Some(NodeRef::Scenario(..))));
    /// assert!(matches!(tree.find("login"), Some(NodeRef::Feature(..))));
    /// assert!(tree.find("cucumber/logout").is_none());
    /// ```
    #[must_use]
    pub fn find(&self, path: &str) -> Option<NodeRef<'_>> {
        let path = path.trim_matches(PATH_SEPARATOR);
        let relative = if path == ROOT_ID {
            ""
        } else {
            path.strip_prefix(ROOT_ID)
                .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
                .unwrap_or(path)
        };
        if relative.is_empty() {
            return Some(NodeRef::Root(self));
        }
        let mut segments = relative.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let second = segments.next();
        if segments.next().is_some() {
            return None;
        }
        let feature = || {
            self.feature_by_safe_name(first)
                .map(|(id, feature)| NodeRef::Feature(id, feature))
        };
        match second {
            None if first.starts_with('@') => self
                .tag_by_safe_name(first)
                .map(NodeRef::Tag)
                .or_else(feature),
            None => feature(),
            Some(scenario) => self
                .scenario_by_path(first, scenario)
                .map(|(id, node)| NodeRef::Scenario(id, node)),
        }
    }

    /// Feature with the given safe name. Valid after a tally.
    #[must_use]
    pub fn feature_by_safe_name(&self, safe_name: &str) -> Option<(FeatureId, &FeatureNode)> {
        let index = *self.features_by_name.get(safe_name)?;
        self.features
            .get(index)
            .map(|feature| (FeatureId(index), feature))
    }

    /// Scenario addressed by its feature's and its own safe names.
    #[must_use]
    pub fn scenario_by_path(
        &self,
        feature: &str,
        scenario: &str,
    ) -> Option<(ScenarioId, &ScenarioNode)> {
        let (feature_id, node) = self.feature_by_safe_name(feature)?;
        let index = node.scenario_position(scenario)?;
        node.scenario(index)
            .map(|found| (ScenarioId::new(feature_id.0, index), found))
    }

    /// Tag view by exact tag name, e.g. `@smoke`.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&TagNode> {
        self.tags.get(name)
    }

    fn tag_by_safe_name(&self, safe_name: &str) -> Option<&TagNode> {
        self.tag(safe_name)
            .or_else(|| self.tags.values().find(|tag| tag.safe_name() == safe_name))
    }

    /// Every tag view, ordered by tag name.
    pub fn tags(&self) -> impl Iterator<Item = &TagNode> {
        self.tags.values()
    }

    /// Failed scenarios in tree order. Valid after a tally.
    pub fn failed_scenarios(&self) -> impl Iterator<Item = (ScenarioId, &ScenarioNode)> {
        self.failed
            .iter()
            .filter_map(|&id| self.scenario(id).map(|scenario| (id, scenario)))
    }

    /// Path of a scenario relative to the root, `<feature>/<scenario>`.
    #[must_use]
    pub fn scenario_path(&self, id: ScenarioId) -> Option<String> {
        let feature = self.feature_safe_name(id.feature_id())?;
        let scenario = self.scenario_safe_name(id)?;
        Some(format!("{feature}{PATH_SEPARATOR}{scenario}"))
    }

    /// Human-readable name combining the feature and scenario names.
    #[must_use]
    pub fn full_name(&self, id: ScenarioId) -> Option<String> {
        let feature = self.feature(id.feature_id())?;
        let scenario = feature.scenario(id.scenario)?;
        Some(format!(
            "{}{FULL_NAME_SEPARATOR}{}",
            feature.name(),
            scenario.name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::event::{FeatureEvent, OutcomeRecord, ScenarioEvent, StepEvent};
    use crate::model::{StepNode, UNTAGGED};
    use crate::outcome::Outcome;

    #[fixture]
    fn tree() -> ResultTree {
        let mut tree = ResultTree::new();
        let mut feature = FeatureNode::new(None, FeatureEvent::named("Shop: cart").with_id("shop"));
        for (name, outcome, tag) in [
            ("add item", Outcome::Passed, Some("@smoke")),
            ("remove item", Outcome::Failed, None),
        ] {
            let mut event = ScenarioEvent::named(name).with_id(format!("shop;{name}"));
            if let Some(tag) = tag {
                event = event.with_tag(tag);
            }
            let mut scenario = ScenarioNode::new(event, None);
            scenario.push_step(StepNode::new(
                StepEvent::new("When ", "x"),
                None,
                OutcomeRecord::new(outcome, Duration::from_millis(1)),
            ));
            feature.push_scenario(scenario);
        }
        tree.push_feature(feature);
        tree.tally();
        tree
    }

    #[rstest]
    #[case::root("cucumber")]
    #[case::root_with_slash("cucumber/")]
    #[case::empty("")]
    fn root_paths_resolve_to_root(tree: ResultTree, #[case] path: &str) {
        assert!(matches!(tree.find(path), Some(NodeRef::Root(_))));
    }

    #[rstest]
    #[case::with_root("cucumber/shop/remove item")]
    #[case::relative("shop/remove item")]
    fn scenario_paths_resolve(tree: ResultTree, #[case] path: &str) {
        let Some(NodeRef::Scenario(id, scenario)) = tree.find(path) else {
            panic!("{path} should resolve to a scenario");
        };
        assert_eq!(id, ScenarioId::new(0, 1));
        assert!(scenario.is_failed());
    }

    #[rstest]
    fn tag_paths_resolve(tree: ResultTree) {
        let Some(NodeRef::Tag(tag)) = tree.find("cucumber/@smoke") else {
            panic!("tag should resolve");
        };
        assert_eq!(tag.counts().pass, 1);
        let Some(NodeRef::Tag(untagged)) = tree.find("@_UNTAGGED_") else {
            panic!("untagged sentinel should resolve");
        };
        assert_eq!(untagged.name(), UNTAGGED);
    }

    #[rstest]
    #[case::unknown_feature("cucumber/nope")]
    #[case::unknown_scenario("cucumber/shop/nope")]
    #[case::too_deep("cucumber/shop/add item/extra")]
    #[case::unknown_tag("@nope")]
    fn unknown_paths_resolve_to_nothing(tree: ResultTree, #[case] path: &str) {
        assert!(tree.find(path).is_none());
    }

    #[test]
    fn features_shadowed_by_reserved_names_stay_reachable() {
        let mut tree = ResultTree::new();
        for name in ["@release", "cucumber"] {
            let mut feature = FeatureNode::new(None, FeatureEvent::named(name));
            feature.push_scenario(ScenarioNode::new(ScenarioEvent::named("s"), None));
            tree.push_feature(feature);
        }
        tree.tally();

        let Some(NodeRef::Feature(id, _)) = tree.find("@release") else {
            panic!("feature named like a tag should resolve when no such tag exists");
        };
        assert_eq!(id, FeatureId(0));
        let Some(NodeRef::Feature(id, _)) = tree.find("cucumber/cucumber") else {
            panic!("feature named after the root should resolve through the rooted path");
        };
        assert_eq!(id, FeatureId(1));
        assert!(matches!(
            tree.find("cucumber/@release/s"),
            Some(NodeRef::Scenario(..))
        ));
    }

    #[rstest]
    fn failed_scenarios_lists_failures(tree: ResultTree) {
        let failed: Vec<_> = tree.failed_scenarios().map(|(id, _)| id).collect();
        assert_eq!(failed, vec![ScenarioId::new(0, 1)]);
    }

    #[rstest]
    fn names_combine_feature_and_scenario(tree: ResultTree) {
        let id = ScenarioId::new(0, 0);
        assert_eq!(tree.scenario_path(id).as_deref(), Some("shop/add item"));
        assert_eq!(
            tree.full_name(id).as_deref(),
            Some("Shop: cart \u{01C2} add item")
        );
    }

    #[rstest]
    fn node_counts_match_their_source(tree: ResultTree) {
        let Some(root) = tree.find("cucumber") else {
            panic!("root should resolve");
        };
        assert_eq!(root.counts(), tree.counts());
        assert_eq!(root.counts().total(), 2);
    }
}
