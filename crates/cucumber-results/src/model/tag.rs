use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::naming::safe;
use crate::outcome::Counts;

use super::ScenarioId;

/// Name of the tag grouping scenarios that declare no tags of their own.
pub const UNTAGGED: &str = "@_UNTAGGED_";

/// Scenarios sharing a tag, with counters aggregated over them.
///
/// Tag nodes are a derived view. The tally rebuilds them from scratch, so
/// membership always reflects the current scenario set.
#[derive(Debug)]
pub struct TagNode {
    pub(crate) name: String,
    pub(crate) members: BTreeSet<ScenarioId>,
    pub(crate) counts: Counts,
    pub(crate) failed: Vec<ScenarioId>,
    safe_name: OnceLock<String>,
}

impl TagNode {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeSet::new(),
            counts: Counts::default(),
            failed: Vec::new(),
            safe_name: OnceLock::new(),
        }
    }

    /// Tag name including the leading `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sanitised tag name. Tags are shared, so no suffix is ever added.
    #[must_use]
    pub fn safe_name(&self) -> &str {
        self.safe_name.get_or_init(|| safe(&self.name))
    }

    /// Member scenarios in tree order.
    pub fn members(&self) -> impl Iterator<Item = ScenarioId> + '_ {
        self.members.iter().copied()
    }

    /// Whether the scenario carries the tag.
    #[must_use]
    pub fn contains(&self, id: ScenarioId) -> bool {
        self.members.contains(&id)
    }

    /// Number of member scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the tag has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Counters aggregated over the member scenarios.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Failed member scenarios in tree order.
    #[must_use]
    pub fn failed_scenarios(&self) -> &[ScenarioId] {
        &self.failed
    }
}
