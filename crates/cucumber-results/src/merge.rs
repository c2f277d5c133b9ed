//! Folding rerun results into an accumulated tree.
//!
//! Merging only ever appends. A rerun of a feature becomes a second feature
//! node with its own identifier; nothing is matched or deduplicated by
//! content, and nodes already in the base are left untouched.

use std::sync::{Mutex, MutexGuard};

use crate::model::ResultTree;
use crate::outcome::Counts;

/// What a merge contributed to the base tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Number of features appended.
    pub features_added: usize,
    /// Number of scenarios appended.
    pub scenarios_added: usize,
    /// Counters of the incoming tree, taken before it was merged.
    pub counts_added: Counts,
}

impl ResultTree {
    /// Append every feature of `incoming` and re-tally the combined tree.
    ///
    /// Safe names already assigned in the base never change. Names the
    /// incoming tree had assigned are kept when they are free in the base and
    /// re-assigned through the base otherwise.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::event::{Event, FeatureEvent, ScenarioEvent};
    /// use cucumber_results::{BuilderConfig, TreeBuilder};
    ///
    /// let parse = || {
    ///     let mut builder = TreeBuilder::new(BuilderConfig::default());
    ///     builder
    ///         .process_all([
    ///             Event::Feature(FeatureEvent::named("Login")),
    ///             Event::Scenario(ScenarioEvent::named("valid password")),
    ///             Event::EndOfDocument,
    ///         ])
    ///         .unwrap();
    ///     builder.finish()
    /// };
    /// let mut base = parse();
    /// let summary = base.merge(parse());
    /// assert_eq!(summary.features_added, 1);
    /// assert_eq!(base.features().len(), 2);
    /// ```
    pub fn merge(&mut self, mut incoming: Self) -> MergeSummary {
        incoming.tally();
        let summary = MergeSummary {
            features_added: incoming.features.len(),
            scenarios_added: incoming
                .features
                .iter()
                .map(|feature| feature.scenarios().len())
                .sum(),
            counts_added: incoming.counts(),
        };
        for mut feature in incoming.features {
            feature.safe_name.adopt_into(&self.feature_names);
            self.features.push(feature);
        }
        self.tally();
        log::info!(
            "merged {} features ({} scenarios) into a tree of {} features",
            summary.features_added,
            summary.scenarios_added,
            self.features.len()
        );
        summary
    }
}

/// A result tree that several publishers merge into.
///
/// Merges are serialised by an internal lock, so each one observes the
/// previous merge's tally.
#[derive(Debug, Default)]
pub struct SharedResultTree {
    tree: Mutex<ResultTree>,
}

impl SharedResultTree {
    /// Wrap an accumulated tree.
    #[must_use]
    pub fn new(tree: ResultTree) -> Self {
        Self {
            tree: Mutex::new(tree),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResultTree> {
        match self.tree.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Merge `incoming` while holding the lock.
    pub fn merge(&self, incoming: ResultTree) -> MergeSummary {
        self.lock().merge(incoming)
    }

    /// Run `read` against the current tree while holding the lock.
    pub fn with_tree<R>(&self, read: impl FnOnce(&ResultTree) -> R) -> R {
        read(&self.lock())
    }

    /// Take the accumulated tree.
    #[must_use]
    pub fn into_inner(self) -> ResultTree {
        match self.tree.into_inner() {
            Ok(tree) => tree,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl From<ResultTree> for SharedResultTree {
    fn from(tree: ResultTree) -> Self {
        Self::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::event::{FeatureEvent, OutcomeRecord, ScenarioEvent, StepEvent};
    use crate::model::{FeatureId, FeatureNode, ScenarioId, ScenarioNode, StepNode};
    use crate::outcome::Outcome;

    fn tree_with(feature: &str, outcomes: &[Outcome]) -> ResultTree {
        let mut tree = ResultTree::new();
        let mut node = FeatureNode::new(
            Some(format!("{feature}.feature")),
            FeatureEvent::named(feature),
        );
        for (index, &outcome) in outcomes.iter().enumerate() {
            let mut scenario = ScenarioNode::new(ScenarioEvent::named(format!("s{index}")), None);
            scenario.push_step(StepNode::new(
                StepEvent::new("Given ", "x"),
                None,
                OutcomeRecord::new(outcome, Duration::from_millis(2)),
            ));
            node.push_scenario(scenario);
        }
        tree.push_feature(node);
        tree.tally();
        tree
    }

    #[test]
    fn merge_conserves_counts() {
        let mut base = tree_with("login", &[Outcome::Passed, Outcome::Skipped]);
        let incoming = tree_with("search", &[Outcome::Failed, Outcome::Undefined]);
        let expected = base.counts() + incoming.counts();
        let summary = base.merge(incoming);
        assert_eq!(base.counts(), expected);
        assert_eq!(summary.scenarios_added, 2);
        assert_eq!(summary.counts_added.fail, 2);
    }

    #[test]
    fn rerun_of_same_feature_stays_addressable() {
        let mut base = tree_with("login", &[Outcome::Passed]);
        let incoming = tree_with("login", &[Outcome::Failed]);
        base.merge(incoming);

        assert_eq!(base.features().len(), 2);
        assert_eq!((base.counts().pass, base.counts().fail), (1, 1));
        assert_eq!(base.feature_safe_name(FeatureId(0)), Some("login"));
        assert_eq!(base.feature_safe_name(FeatureId(1)), Some("login_2"));
        assert!(
            base.scenario(ScenarioId::new(1, 0))
                .is_some_and(ScenarioNode::is_failed)
        );
    }

    #[test]
    fn base_names_survive_merges() {
        let mut base = tree_with("a", &[Outcome::Passed]);
        let before = base.feature_safe_name(FeatureId(0)).map(str::to_string);
        for _ in 0..3 {
            base.merge(tree_with("a", &[Outcome::Passed]));
        }
        assert_eq!(base.feature_safe_name(FeatureId(0)).map(str::to_string), before);
        let names: Vec<_> = (0..4)
            .filter_map(|index| base.feature_safe_name(FeatureId(index)))
            .collect();
        assert_eq!(names, vec!["a", "a_2", "a_3", "a_4"]);
    }

    #[test]
    fn merge_of_empty_tree_changes_nothing() {
        let mut base = tree_with("a", &[Outcome::Passed]);
        let before = base.counts();
        let summary = base.merge(ResultTree::new());
        assert_eq!(summary, MergeSummary::default());
        assert_eq!(base.counts(), before);
    }

    #[test]
    fn concurrent_merges_are_serialised() {
        let shared = SharedResultTree::new(ResultTree::new());
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| shared.merge(tree_with("parallel", &[Outcome::Passed])));
            }
        });
        let counts = shared.with_tree(ResultTree::counts);
        assert_eq!(counts.pass, 4);
        let tree = shared.into_inner();
        let mut names: Vec<_> = (0..4)
            .filter_map(|index| tree.feature_safe_name(FeatureId(index)))
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["parallel", "parallel_2", "parallel_3", "parallel_4"]);
    }
}
