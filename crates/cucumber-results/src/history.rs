//! Comparison of a scenario with its counterparts in earlier runs.
//!
//! Scenarios are matched across runs by safe-name path, the same identifier
//! reports link with.

use std::fmt;

use crate::model::{ResultTree, ScenarioId, ScenarioNode};

/// Status of a scenario relative to the previous run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScenarioStatus {
    /// Passed now and did not fail before.
    Passed,
    /// Skipped in this run.
    Skipped,
    /// Failed now and failed before, or has no history.
    Failed,
    /// Failed now after passing before.
    Regression,
    /// Passed now after failing before.
    Fixed,
}

impl ScenarioStatus {
    /// Lowercase label for the status.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::history::ScenarioStatus;
    ///
    /// assert_eq!(ScenarioStatus::Regression.label(), "regression");
    /// ```
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Regression => "regression",
            Self::Fixed => "fixed",
        }
    }

    /// Whether the status counts as a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Regression)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tallied tree from an earlier run and its run number.
#[derive(Clone, Copy, Debug)]
pub struct Run<'a> {
    /// Sequence number of the run.
    pub number: u64,
    /// Results of the run.
    pub tree: &'a ResultTree,
}

impl ResultTree {
    /// Scenario in `other` with the same path as `id` in this tree.
    #[must_use]
    pub fn counterpart<'o>(
        &self,
        id: ScenarioId,
        other: &'o ResultTree,
    ) -> Option<&'o ScenarioNode> {
        let feature = self.feature_safe_name(id.feature_id())?;
        let scenario = self.scenario_safe_name(id)?;
        other
            .scenario_by_path(feature, scenario)
            .map(|(_, node)| node)
    }

    /// Status of a scenario compared with the previous run.
    ///
    /// Skips win over everything else. Without a counterpart in `previous`
    /// the status is plain pass or fail.
    #[must_use]
    pub fn scenario_status(
        &self,
        id: ScenarioId,
        previous: Option<&ResultTree>,
    ) -> Option<ScenarioStatus> {
        let scenario = self.scenario(id)?;
        if scenario.is_skipped() {
            return Some(ScenarioStatus::Skipped);
        }
        let failed = scenario.is_failed();
        let status = match previous.and_then(|tree| self.counterpart(id, tree)) {
            None if failed => ScenarioStatus::Failed,
            None => ScenarioStatus::Passed,
            Some(before) => match (before.is_failed(), failed) {
                (false, false) => ScenarioStatus::Passed,
                (false, true) => ScenarioStatus::Regression,
                (true, false) => ScenarioStatus::Fixed,
                (true, true) => ScenarioStatus::Failed,
            },
        };
        Some(status)
    }

    /// Run number in which the current failure streak of a scenario began.
    ///
    /// `history` lists earlier runs newest first. Returns `None` when the
    /// scenario did not fail in this run.
    #[must_use]
    pub fn failed_since(
        &self,
        id: ScenarioId,
        run_number: u64,
        history: &[Run<'_>],
    ) -> Option<u64> {
        if !self.scenario(id)?.is_failed() {
            return None;
        }
        let since = history
            .iter()
            .take_while(|run| {
                self.counterpart(id, run.tree)
                    .is_some_and(ScenarioNode::is_failed)
            })
            .last()
            .map_or(run_number, |run| run.number);
        Some(since)
    }

    /// Number of consecutive runs, including this one, the scenario has
    /// failed in. Zero for scenarios that did not fail.
    #[must_use]
    pub fn age(&self, id: ScenarioId, run_number: u64, history: &[Run<'_>]) -> u64 {
        self.failed_since(id, run_number, history)
            .map_or(0, |since| run_number.saturating_sub(since).saturating_add(1))
    }
}
