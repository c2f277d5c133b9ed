//! Immutable records replayed into the [`TreeBuilder`](crate::TreeBuilder).
//!
//! Each record carries the fields present in a parsed report document. The
//! builder consumes them through the [`Event`] enum in the exact order they
//! were produced.

use std::time::Duration;

use crate::outcome::Outcome;

/// A tag attached to a feature or scenario, including the leading `@`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Tag name, e.g. `@smoke`.
    pub name: String,
    /// Line the tag was declared on.
    pub line: Option<u32>,
}

impl Tag {
    /// Create a tag without line information.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: None,
        }
    }
}

/// Header of a feature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureEvent {
    /// Author-supplied identifier, e.g. `calculator`.
    pub id: Option<String>,
    /// Gherkin keyword, usually `Feature`.
    pub keyword: String,
    /// Declared feature name.
    pub name: String,
    /// Free-form description below the header.
    pub description: String,
    /// Line of the header.
    pub line: Option<u32>,
    /// Tags applying to every scenario of the feature.
    pub tags: Vec<Tag>,
}

impl FeatureEvent {
    /// Create a feature header with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            keyword: "Feature".into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the author-supplied identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(Tag::new(tag));
        self
    }
}

/// Header of a background block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackgroundEvent {
    /// Gherkin keyword, usually `Background`.
    pub keyword: String,
    /// Declared background name, often empty.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Line of the header.
    pub line: Option<u32>,
}

impl BackgroundEvent {
    /// Create a background header with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            keyword: "Background".into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Header of a scenario, or of one expanded example of an outline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioEvent {
    /// Author-supplied identifier, e.g. `calculator;adding-two-numbers`.
    pub id: Option<String>,
    /// Gherkin keyword, `Scenario` or `Scenario Outline`.
    pub keyword: String,
    /// Declared scenario name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Line of the header.
    pub line: Option<u32>,
    /// Tags declared on the scenario itself.
    pub tags: Vec<Tag>,
}

impl ScenarioEvent {
    /// Create a scenario header with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            keyword: "Scenario".into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the author-supplied identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(Tag::new(tag));
        self
    }
}

/// Declaration of a step, before it has been matched or run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepEvent {
    /// Step keyword including trailing space, e.g. `Given `.
    pub keyword: String,
    /// Step text following the keyword.
    pub name: String,
    /// Line of the step.
    pub line: Option<u32>,
}

impl StepEvent {
    /// Create a step declaration.
    #[must_use]
    pub fn new(keyword: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            name: name.into(),
            line: None,
        }
    }
}

/// Binding between a step (or hook) and the glue code that ran it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchEvent {
    /// Location of the glue code, e.g. `Steps.add(int,int)`.
    pub location: Option<String>,
}

impl MatchEvent {
    /// Create a match pointing at the given location.
    #[must_use]
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }
}

/// Outcome of running a step or hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeRecord {
    /// Classification of the run.
    pub outcome: Outcome,
    /// Time spent running.
    pub duration: Duration,
    /// Error message reported by the runner, usually a stack trace.
    pub error_message: Option<String>,
}

impl OutcomeRecord {
    /// Create a record without an error message.
    #[must_use]
    pub fn new(outcome: Outcome, duration: Duration) -> Self {
        Self {
            outcome,
            duration,
            error_message: None,
        }
    }

    /// Attach an error message.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Diagnostic detail carried by a syntax error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntaxErrorEvent {
    /// Parser state when the error occurred.
    pub state: String,
    /// Event the parser could not accept.
    pub event: String,
    /// Events that would have been legal.
    pub legal_events: Vec<String>,
    /// Document the error was found in.
    pub uri: String,
    /// 1-based line of the error.
    pub line: usize,
    /// 1-based column of the error, `0` when unknown.
    pub column: usize,
}

/// A single item of the ordered event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Identifies the source of the next feature.
    DocumentStart {
        /// Source URI of the document.
        uri: String,
    },
    /// Opens a feature.
    Feature(FeatureEvent),
    /// Opens a background that the next scenario adopts.
    Background(BackgroundEvent),
    /// Opens a scenario.
    Scenario(ScenarioEvent),
    /// Declares a step awaiting its result.
    Step(StepEvent),
    /// Binds the pending step to glue code.
    Match(MatchEvent),
    /// Resolves the pending step.
    Result(OutcomeRecord),
    /// Result of a setup hook of the open scenario.
    Before(MatchEvent, OutcomeRecord),
    /// Result of a teardown hook of the open scenario.
    After(MatchEvent, OutcomeRecord),
    /// Binary attachment produced while running the open scenario.
    Embedding {
        /// MIME type of the payload.
        mime_type: String,
        /// Raw payload bytes.
        data: Vec<u8>,
    },
    /// Text written by the runner; informational only.
    Write(String),
    /// Scenario outline header; informational only, examples arrive expanded.
    ScenarioOutline(ScenarioEvent),
    /// Examples table header; informational only.
    Examples(String),
    /// Closes every open context of the current document.
    EndOfDocument,
    /// The document could not be parsed.
    SyntaxError(SyntaxErrorEvent),
}

impl Event {
    /// Short name used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DocumentStart { .. } => "document-start",
            Self::Feature(_) => "feature",
            Self::Background(_) => "background",
            Self::Scenario(_) => "scenario",
            Self::Step(_) => "step",
            Self::Match(_) => "match",
            Self::Result(_) => "result",
            Self::Before(..) => "before",
            Self::After(..) => "after",
            Self::Embedding { .. } => "embedding",
            Self::Write(_) => "write",
            Self::ScenarioOutline(_) => "scenario-outline",
            Self::Examples(_) => "examples",
            Self::EndOfDocument => "end-of-document",
            Self::SyntaxError(_) => "syntax-error",
        }
    }
}
