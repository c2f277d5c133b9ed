//! Scenario-level nodes: scenarios, backgrounds, steps, hooks and embeddings.

use std::time::Duration;

use crate::event::{BackgroundEvent, MatchEvent, OutcomeRecord, ScenarioEvent, StepEvent, Tag};
use crate::naming::{SafeNameCell, safe};
use crate::outcome::{Counts, Outcome};

/// Result of one executed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepNode {
    pub(crate) keyword: String,
    pub(crate) name: String,
    pub(crate) line: Option<u32>,
    pub(crate) location: Option<String>,
    pub(crate) result: OutcomeRecord,
}

impl StepNode {
    /// Close a pending step and its optional match with the reported result.
    #[must_use]
    pub fn new(step: StepEvent, matched: Option<MatchEvent>, result: OutcomeRecord) -> Self {
        Self {
            keyword: step.keyword,
            name: step.name,
            line: step.line,
            location: matched.and_then(|m| m.location),
            result,
        }
    }

    /// Step keyword, e.g. `Given `.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Step text.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line of the step in its feature file.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Location of the glue code that ran the step.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Reported outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.result.outcome
    }

    /// Time spent running the step.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.result.duration
    }

    /// Full outcome record.
    #[must_use]
    pub fn result(&self) -> &OutcomeRecord {
        &self.result
    }

    /// Counters derived directly from the outcome.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.result.outcome.counts(self.result.duration)
    }

    /// Message explaining why the step did not pass.
    ///
    /// Undefined steps name the step; failures report the runner's message;
    /// passed and skipped steps have no message.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use cucumber_results::event::{OutcomeRecord, StepEvent};
    /// use cucumber_results::{Outcome, StepNode};
    ///
    /// let step = StepNode::new(
    ///     StepEvent::new("Given ", "a missing step"),
    ///     None,
    ///     OutcomeRecord::new(Outcome::Undefined, Duration::ZERO),
    /// );
    /// assert_eq!(step.error_message(), "Step \"a missing step\" is undefined");
    /// ```
    #[must_use]
    pub fn error_message(&self) -> String {
        match self.result.outcome {
            Outcome::Undefined => format!("Step \"{}\" is undefined", self.name),
            Outcome::Failed => self.result.error_message.clone().unwrap_or_default(),
            Outcome::Passed | Outcome::Skipped => String::new(),
        }
    }
}

/// Result of a before or after hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookResultNode {
    pub(crate) location: Option<String>,
    pub(crate) result: OutcomeRecord,
}

impl HookResultNode {
    /// Create a hook result from its match and outcome.
    #[must_use]
    pub fn new(matched: MatchEvent, result: OutcomeRecord) -> Self {
        Self {
            location: matched.location,
            result,
        }
    }

    /// Location of the hook code.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Reported outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.result.outcome
    }

    /// Time spent running the hook.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.result.duration
    }

    /// Full outcome record.
    #[must_use]
    pub fn result(&self) -> &OutcomeRecord {
        &self.result
    }

    /// Counters derived directly from the outcome.
    #[must_use]
    pub fn counts(&self) -> Counts {
        self.result.outcome.counts(self.result.duration)
    }

    /// Error message reported for a failed or undefined hook.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        if self.result.outcome.is_failure() {
            self.result.error_message.as_deref()
        } else {
            None
        }
    }
}

/// Reference to an attachment persisted by the attachment store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedItem {
    /// MIME type of the attachment.
    pub mime_type: String,
    /// Reference token returned by the store.
    pub filename: String,
}

/// Background steps as run for one scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundNode {
    pub(crate) keyword: String,
    pub(crate) name: String,
    pub(crate) line: Option<u32>,
    pub(crate) steps: Vec<StepNode>,
    pub(crate) failed: bool,
    pub(crate) skipped: bool,
    pub(crate) duration: Duration,
}

impl BackgroundNode {
    /// Create an empty background from its header.
    #[must_use]
    pub fn new(event: BackgroundEvent) -> Self {
        Self {
            keyword: event.keyword,
            name: event.name,
            line: event.line,
            steps: Vec::new(),
            failed: false,
            skipped: false,
            duration: Duration::ZERO,
        }
    }

    /// Declared background name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gherkin keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Line of the header.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepNode] {
        &self.steps
    }

    /// Whether any background step failed. Valid after a tally.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Whether a step skipped and none failed. Valid after a tally.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Sum of step durations. Valid after a tally.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Counters for the background as a single unit.
    #[must_use]
    pub fn counts(&self) -> Counts {
        Counts::unit(self.failed, self.skipped, self.duration)
    }

    pub(crate) fn push_step(&mut self, step: StepNode) {
        self.steps.push(step);
    }
}

/// One executed scenario, counted as a single unit.
#[derive(Debug)]
pub struct ScenarioNode {
    pub(crate) id: Option<String>,
    pub(crate) keyword: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) line: Option<u32>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) background: Option<BackgroundNode>,
    pub(crate) steps: Vec<StepNode>,
    pub(crate) before: Vec<HookResultNode>,
    pub(crate) after: Vec<HookResultNode>,
    pub(crate) embeddings: Vec<EmbeddedItem>,
    pub(crate) safe_name: SafeNameCell,
    pub(crate) failed: bool,
    pub(crate) skipped: bool,
    pub(crate) duration: Duration,
}

impl ScenarioNode {
    /// Create a scenario from its header, adopting the pending background.
    #[must_use]
    pub fn new(event: ScenarioEvent, background: Option<BackgroundNode>) -> Self {
        Self {
            id: event.id,
            keyword: event.keyword,
            name: event.name,
            description: event.description,
            line: event.line,
            tags: event.tags,
            background,
            steps: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            embeddings: Vec::new(),
            safe_name: SafeNameCell::default(),
            failed: false,
            skipped: false,
            duration: Duration::ZERO,
        }
    }

    /// Declared scenario name.
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

    /// Line of the header.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Tags declared on the scenario itself (feature tags are not included).
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Background run before this scenario, if any.
    #[must_use]
    pub fn background(&self) -> Option<&BackgroundNode> {
        self.background.as_ref()
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepNode] {
        &self.steps
    }

    /// Setup hooks in execution order.
    #[must_use]
    pub fn before_hooks(&self) -> &[HookResultNode] {
        &self.before
    }

    /// Teardown hooks in execution order.
    #[must_use]
    pub fn after_hooks(&self) -> &[HookResultNode] {
        &self.after
    }

    /// Attachments produced while the scenario ran.
    #[must_use]
    pub fn embedded_items(&self) -> &[EmbeddedItem] {
        &self.embeddings
    }

    /// Whether the scenario failed. Valid after a tally.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Whether the scenario skipped without failing. Valid after a tally.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Whether the scenario neither failed nor skipped. Valid after a tally.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        !self.failed && !self.skipped
    }

    /// Total time spent in hooks, background and steps. Valid after a tally.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Counters for the scenario as a single unit.
    #[must_use]
    pub fn counts(&self) -> Counts {
        Counts::unit(self.failed, self.skipped, self.duration)
    }

    /// First error message explaining why the scenario failed.
    ///
    /// Looks at before hooks, background steps, steps and after hooks, in
    /// that order. Returns `None` for scenarios that did not fail.
    #[must_use]
    pub fn error_details(&self) -> Option<String> {
        if !self.failed {
            return None;
        }
        let hook_message = |hooks: &[HookResultNode]| {
            hooks
                .iter()
                .find(|hook| hook.outcome().is_failure())
                .map(|hook| hook.error_message().unwrap_or_default().to_string())
        };
        let step_message = |steps: &[StepNode]| {
            steps
                .iter()
                .find(|step| step.outcome().is_failure())
                .map(StepNode::error_message)
        };
        hook_message(&self.before)
            .or_else(|| {
                self.background
                    .as_ref()
                    .and_then(|background| step_message(&background.steps))
            })
            .or_else(|| step_message(&self.steps))
            .or_else(|| hook_message(&self.after))
    }

    /// Safe name, if one has been assigned yet.
    ///
    /// Use [`FeatureNode::scenario_safe_name`](crate::FeatureNode::scenario_safe_name)
    /// to assign one.
    #[must_use]
    pub fn assigned_safe_name(&self) -> Option<&str> {
        self.safe_name.get()
    }

    /// Sanitised declared identifier with the owning feature's prefix removed.
    pub(crate) fn declared_base(&self, feature_base: &str) -> String {
        let declared = safe(self.id.as_deref().unwrap_or(&self.name));
        let prefix = format!("{feature_base};");
        match declared.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => declared,
        }
    }

    pub(crate) fn push_step(&mut self, step: StepNode) {
        self.steps.push(step);
    }

    pub(crate) fn push_before(&mut self, hook: HookResultNode) {
        self.before.push(hook);
    }

    pub(crate) fn push_after(&mut self, hook: HookResultNode) {
        self.after.push(hook);
    }

    pub(crate) fn push_embedding(&mut self, item: EmbeddedItem) {
        self.embeddings.push(item);
    }
}
