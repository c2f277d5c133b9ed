//! Event-driven construction of a [`ResultTree`].
//!
//! The builder keeps exactly one open context at a time, held in an explicit
//! state value. Every event is checked against that state; events that do not
//! fit are rejected with [`ModelError::UnexpectedEvent`] instead of being
//! attached somewhere arbitrary.
//!
//! A step is resolved by three events: `step`, an optional `match`, then
//! `result`. The step and match wait in a separate pending slot because they
//! can occur inside a background as well as inside a scenario.

use std::mem;

use crate::attachments::{AttachmentStore, InMemoryAttachments};
use crate::config::BuilderConfig;
use crate::error::ModelError;
use crate::event::{
    BackgroundEvent, Event, FeatureEvent, MatchEvent, OutcomeRecord, ScenarioEvent, StepEvent,
    SyntaxErrorEvent,
};
use crate::model::{
    BackgroundNode, EmbeddedItem, FeatureNode, HookResultNode, ResultTree, ScenarioNode, StepNode,
};

/// Coarse view of the builder's open context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderState {
    /// No document is open.
    Idle,
    /// A document URI has been announced and awaits its feature.
    UriSeen,
    /// A feature is open and no scenario or background has started.
    InFeature,
    /// A background is open and awaits the scenario that adopts it.
    InBackground,
    /// A scenario is open.
    InScenario,
}

impl BuilderState {
    const fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::UriSeen => "awaiting a feature",
            Self::InFeature => "in a feature",
            Self::InBackground => "in a background",
            Self::InScenario => "in a scenario",
        }
    }
}

/// Items produced while a background is open that belong to the scenario
/// adopting it.
#[derive(Debug, Default)]
struct Held {
    before: Vec<HookResultNode>,
    after: Vec<HookResultNode>,
    embeddings: Vec<EmbeddedItem>,
}

#[derive(Debug)]
enum Open {
    Idle,
    UriSeen {
        uri: String,
    },
    Feature {
        feature: usize,
    },
    Background {
        feature: usize,
        background: BackgroundNode,
        held: Held,
    },
    Scenario {
        feature: usize,
        scenario: usize,
    },
}

impl Open {
    const fn state(&self) -> BuilderState {
        match self {
            Self::Idle => BuilderState::Idle,
            Self::UriSeen { .. } => BuilderState::UriSeen,
            Self::Feature { .. } => BuilderState::InFeature,
            Self::Background { .. } => BuilderState::InBackground,
            Self::Scenario { .. } => BuilderState::InScenario,
        }
    }

    const fn feature(&self) -> Option<usize> {
        match self {
            Self::Feature { feature }
            | Self::Background { feature, .. }
            | Self::Scenario { feature, .. } => Some(*feature),
            Self::Idle | Self::UriSeen { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct PendingStep {
    step: Option<StepEvent>,
    matched: Option<MatchEvent>,
}

/// Consumes an ordered event stream and accumulates a [`ResultTree`].
///
/// Every document fed to one builder lands in the same tree. Call
/// [`TreeBuilder::finish`] to tally and take the tree.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use cucumber_results::event::{Event, FeatureEvent, OutcomeRecord, ScenarioEvent, StepEvent};
/// use cucumber_results::{BuilderConfig, Outcome, TreeBuilder};
///
/// let mut builder = TreeBuilder::new(BuilderConfig::default());
/// builder
///     .process_all([
///         Event::DocumentStart { uri: "calc.feature".into() },
///         Event::Feature(FeatureEvent::named("Calculator")),
///         Event::Scenario(ScenarioEvent::named("Adding")),
///         Event::Step(StepEvent::new("Given ", "two numbers")),
///         Event::Result(OutcomeRecord::new(Outcome::Passed, Duration::from_millis(1))),
///         Event::EndOfDocument,
///     ])
///     .unwrap();
/// let tree = builder.finish();
/// assert_eq!(tree.counts().pass, 1);
/// ```
#[derive(Debug)]
pub struct TreeBuilder<S = InMemoryAttachments> {
    config: BuilderConfig,
    store: S,
    tree: ResultTree,
    open: Open,
    pending: PendingStep,
}

impl TreeBuilder {
    /// Create a builder that keeps attachments in memory.
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self::with_store(config, InMemoryAttachments::default())
    }
}

impl<S: AttachmentStore> TreeBuilder<S> {
    /// Create a builder that hands attachments to `store`.
    #[must_use]
    pub fn with_store(config: BuilderConfig, store: S) -> Self {
        Self {
            config,
            store,
            tree: ResultTree::new(),
            open: Open::Idle,
            pending: PendingStep::default(),
        }
    }

    /// Start from an existing tree instead of an empty one.
    #[must_use]
    pub fn continuing(mut self, tree: ResultTree) -> Self {
        self.tree = tree;
        self
    }

    /// Current coarse state.
    #[must_use]
    pub fn state(&self) -> BuilderState {
        self.open.state()
    }

    /// Tree accumulated so far. Counters are stale until [`finish`](Self::finish).
    #[must_use]
    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    /// Attachment store receiving embeddings.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Feed every event in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] raised by [`process`](Self::process).
    /// Documents completed before the failing event stay in the tree.
    pub fn process_all(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<(), ModelError> {
        events.into_iter().try_for_each(|event| self.process(event))
    }

    /// Apply a single event.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when the event violates the stream protocol,
    /// reports a syntax error, or carries an attachment the store rejects.
    pub fn process(&mut self, event: Event) -> Result<(), ModelError> {
        log::debug!("{} event while {}", event.kind(), self.state().describe());
        match event {
            Event::DocumentStart { uri } => self.document_start(uri),
            Event::Feature(feature) => self.feature(feature),
            Event::Background(background) => self.background(background),
            Event::Scenario(scenario) => self.scenario(scenario),
            Event::Step(step) => self.step(step),
            Event::Match(matched) => self.matched(matched),
            Event::Result(result) => self.result(result),
            Event::Before(matched, result) => self.hook(HookKind::Before, matched, result),
            Event::After(matched, result) => self.hook(HookKind::After, matched, result),
            Event::Embedding { mime_type, data } => self.embedding(&mime_type, &data),
            Event::Write(text) => {
                log::debug!("runner output: {text}");
                Ok(())
            }
            Event::ScenarioOutline(outline) => {
                log::debug!("scenario outline '{}'", outline.name);
                Ok(())
            }
            Event::Examples(name) => {
                log::debug!("examples '{name}'");
                Ok(())
            }
            Event::EndOfDocument => {
                self.end_of_document();
                Ok(())
            }
            Event::SyntaxError(error) => Err(malformed(error)),
        }
    }

    /// Tally the accumulated tree and hand it over.
    #[must_use]
    pub fn finish(self) -> ResultTree {
        self.into_parts().0
    }

    /// Tally the accumulated tree and hand it over with the attachment store.
    #[must_use]
    pub fn into_parts(self) -> (ResultTree, S) {
        let Self {
            mut tree, store, ..
        } = self;
        tree.tally();
        (tree, store)
    }

    fn unexpected(&self, event: &'static str) -> ModelError {
        ModelError::UnexpectedEvent {
            event,
            state: self.state().describe(),
        }
    }

    /// Drop a step that never received its result.
    fn resolve_pending(&mut self, event: &'static str) -> Result<(), ModelError> {
        let Some(step) = mem::take(&mut self.pending).step else {
            return Ok(());
        };
        if self.config.strict_step_ordering {
            return Err(ModelError::UnresolvedStep {
                step: step.name,
                event,
            });
        }
        log::warn!(
            "discarding step '{}' that was never resolved before {event}",
            step.name
        );
        Ok(())
    }

    /// Close the open context before a structural event replaces it.
    fn close_context(&mut self, event: &'static str) -> Result<(), ModelError> {
        self.resolve_pending(event)?;
        if let Open::Background { background, .. } = &self.open {
            log::warn!(
                "discarding background '{}' that no scenario adopted before {event}",
                background.name()
            );
        }
        Ok(())
    }

    fn document_start(&mut self, uri: String) -> Result<(), ModelError> {
        if let Open::UriSeen { uri: pending } = &self.open {
            return Err(ModelError::OutOfOrderDocumentMarker {
                pending: pending.clone(),
                uri,
            });
        }
        self.close_context("document-start")?;
        self.open = Open::UriSeen { uri };
        Ok(())
    }

    fn feature(&mut self, event: FeatureEvent) -> Result<(), ModelError> {
        self.close_context("feature")?;
        let uri = match mem::replace(&mut self.open, Open::Idle) {
            Open::UriSeen { uri } => Some(uri),
            _ => None,
        };
        log::debug!("feature '{}' from {uri:?}", event.name);
        let feature = self.tree.push_feature(FeatureNode::new(uri, event));
        self.open = Open::Feature { feature };
        Ok(())
    }

    fn background(&mut self, event: BackgroundEvent) -> Result<(), ModelError> {
        if matches!(self.open, Open::Background { .. }) {
            return Err(ModelError::NestedBackground { name: event.name });
        }
        let Some(feature) = self.open.feature() else {
            return Err(self.unexpected("background"));
        };
        self.close_context("background")?;
        self.open = Open::Background {
            feature,
            background: BackgroundNode::new(event),
            held: Held::default(),
        };
        Ok(())
    }

    fn scenario(&mut self, event: ScenarioEvent) -> Result<(), ModelError> {
        if self.open.feature().is_none() {
            return Err(self.unexpected("scenario"));
        }
        self.resolve_pending("scenario")?;

        let (feature, background, held) = match mem::replace(&mut self.open, Open::Idle) {
            Open::Background {
                feature,
                background,
                held,
            } => (feature, Some(background), held),
            Open::Feature { feature } | Open::Scenario { feature, .. } => {
                (feature, None, Held::default())
            }
            Open::Idle | Open::UriSeen { .. } => return Err(self.unexpected("scenario")),
        };
        let mut node = ScenarioNode::new(event, background);
        node.before = held.before;
        node.after = held.after;
        node.embeddings = held.embeddings;

        let Some(owner) = self.tree.feature_mut(feature) else {
            return Err(self.unexpected("scenario"));
        };
        let scenario = owner.push_scenario(node);
        self.open = Open::Scenario { feature, scenario };
        Ok(())
    }

    fn step(&mut self, event: StepEvent) -> Result<(), ModelError> {
        if !matches!(self.open, Open::Background { .. } | Open::Scenario { .. }) {
            return Err(self.unexpected("step"));
        }
        if let Some(pending) = &self.pending.step {
            if self.config.strict_step_ordering {
                return Err(ModelError::DuplicateStep {
                    pending: pending.name.clone(),
                    step: event.name,
                });
            }
            log::warn!(
                "step '{}' received before step '{}' was resolved; discarding the stale step",
                event.name,
                pending.name
            );
            self.pending.matched = None;
        }
        self.pending.step = Some(event);
        Ok(())
    }

    fn matched(&mut self, event: MatchEvent) -> Result<(), ModelError> {
        if self.pending.step.is_none() {
            return Err(self.unexpected("match"));
        }
        if self.pending.matched.is_some() {
            let location = event.location.clone().unwrap_or_default();
            if self.config.strict_step_ordering {
                return Err(ModelError::DuplicateMatch { location });
            }
            log::warn!("match '{location}' received before the previous match was resolved");
        }
        self.pending.matched = Some(event);
        Ok(())
    }

    fn result(&mut self, result: OutcomeRecord) -> Result<(), ModelError> {
        let PendingStep { step, matched } = mem::take(&mut self.pending);
        let Some(step) = step else {
            return Err(self.unexpected("result"));
        };
        let node = StepNode::new(step, matched, result);
        if let Open::Background { background, .. } = &mut self.open {
            background.push_step(node);
            return Ok(());
        }
        self.open_scenario("result")?.push_step(node);
        Ok(())
    }

    fn hook(
        &mut self,
        kind: HookKind,
        matched: MatchEvent,
        result: OutcomeRecord,
    ) -> Result<(), ModelError> {
        let node = HookResultNode::new(matched, result);
        if let Open::Background { held, .. } = &mut self.open {
            match kind {
                HookKind::Before => held.before.push(node),
                HookKind::After => held.after.push(node),
            }
            return Ok(());
        }
        let scenario = self.open_scenario(kind.label())?;
        match kind {
            HookKind::Before => scenario.push_before(node),
            HookKind::After => scenario.push_after(node),
        }
        Ok(())
    }

    fn embedding(&mut self, mime_type: &str, data: &[u8]) -> Result<(), ModelError> {
        if !matches!(self.open, Open::Background { .. } | Open::Scenario { .. }) {
            return Err(self.unexpected("embedding"));
        }
        let filename =
            self.store
                .store(mime_type, data)
                .map_err(|source| ModelError::Attachment {
                    mime_type: mime_type.to_string(),
                    source,
                })?;
        let item = EmbeddedItem {
            mime_type: mime_type.to_string(),
            filename,
        };
        if let Open::Background { held, .. } = &mut self.open {
            held.embeddings.push(item);
            return Ok(());
        }
        self.open_scenario("embedding")?.push_embedding(item);
        Ok(())
    }

    fn end_of_document(&mut self) {
        if let Some(step) = mem::take(&mut self.pending).step {
            log::debug!("clearing unresolved step '{}' at end of document", step.name);
        }
        match mem::replace(&mut self.open, Open::Idle) {
            Open::Background { background, .. } => log::warn!(
                "discarding background '{}' that no scenario adopted",
                background.name()
            ),
            Open::UriSeen { uri } => log::debug!("document {uri} contained no feature"),
            Open::Idle | Open::Feature { .. } | Open::Scenario { .. } => {}
        }
    }

    fn open_scenario(&mut self, event: &'static str) -> Result<&mut ScenarioNode, ModelError> {
        let unexpected = self.unexpected(event);
        let Open::Scenario { feature, scenario } = self.open else {
            return Err(unexpected);
        };
        self.tree
            .feature_mut(feature)
            .and_then(|owner| owner.scenario_mut(scenario))
            .ok_or(unexpected)
    }
}

#[derive(Clone, Copy)]
enum HookKind {
    Before,
    After,
}

impl HookKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

fn malformed(error: SyntaxErrorEvent) -> ModelError {
    ModelError::Malformed {
        line: error.line,
        column: error.column,
        uri: error.uri,
        state: error.state,
        event: error.event,
        expected: error.legal_events,
    }
}
