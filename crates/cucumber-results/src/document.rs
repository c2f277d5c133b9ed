//! Reader for Cucumber JSON report documents.
//!
//! A report is a JSON array of features. It is replayed as the event stream
//! the [`TreeBuilder`] consumes: for each feature a document marker, the
//! feature, then per element its header, before hooks, steps (each followed
//! by its match, result, output and embeddings) and after hooks, closed by an
//! end-of-document marker. Hooks are followed by their own output and
//! embeddings.
//!
//! Durations are nanoseconds. Embedding payloads are base64 and are decoded
//! before they reach the attachment store.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use serde::Deserialize;

use crate::attachments::AttachmentStore;
use crate::builder::TreeBuilder;
use crate::config::BuilderConfig;
use crate::error::{AttachmentError, ModelError, ReadError};
use crate::event::{
    BackgroundEvent, Event, FeatureEvent, MatchEvent, OutcomeRecord, ScenarioEvent, StepEvent,
    SyntaxErrorEvent, Tag,
};
use crate::model::ResultTree;
use crate::outcome::Outcome;

/// Status cucumber-jvm reports for steps marked as pending.
const PENDING: &str = "pending";

/// One feature of a report document.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FeatureDocument {
    /// Source feature file.
    pub uri: Option<String>,
    /// Author-supplied identifier.
    pub id: Option<String>,
    /// Gherkin keyword.
    pub keyword: String,
    /// Declared name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Line of the header.
    pub line: Option<u32>,
    /// Feature tags.
    pub tags: Vec<TagDocument>,
    /// Backgrounds and scenarios in execution order.
    pub elements: Vec<ElementDocument>,
}

/// A tag as written in a report.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TagDocument {
    /// Tag name including the leading `@`.
    pub name: String,
    /// Line of the tag.
    pub line: Option<u32>,
}

/// A background or scenario of a report.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ElementDocument {
    /// `background`, `scenario` or `scenario_outline`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Author-supplied identifier.
    pub id: Option<String>,
    /// Gherkin keyword.
    pub keyword: String,
    /// Declared name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Line of the header.
    pub line: Option<u32>,
    /// Scenario tags.
    pub tags: Vec<TagDocument>,
    /// Setup hooks.
    pub before: Vec<HookDocument>,
    /// Steps in execution order.
    pub steps: Vec<StepDocument>,
    /// Teardown hooks.
    pub after: Vec<HookDocument>,
}

/// A step of a report.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StepDocument {
    /// Keyword including trailing space.
    pub keyword: String,
    /// Step text.
    pub name: String,
    /// Line of the step.
    pub line: Option<u32>,
    /// Glue code the step matched.
    #[serde(rename = "match")]
    pub matched: Option<MatchDocument>,
    /// Outcome of the run.
    pub result: Option<ResultDocument>,
    /// Text written while the step ran.
    pub output: Vec<String>,
    /// Attachments produced while the step ran.
    pub embeddings: Vec<EmbeddingDocument>,
}

/// A before or after hook of a report.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HookDocument {
    /// Glue code of the hook.
    #[serde(rename = "match")]
    pub matched: Option<MatchDocument>,
    /// Outcome of the run.
    pub result: ResultDocument,
    /// Text written while the hook ran.
    pub output: Vec<String>,
    /// Attachments produced by the hook, e.g. a screenshot on teardown.
    pub embeddings: Vec<EmbeddingDocument>,
}

/// Location of the glue code.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MatchDocument {
    /// Source location, e.g. `Steps.add(int,int)`.
    pub location: Option<String>,
}

/// Outcome of a step or hook.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ResultDocument {
    /// Status label.
    pub status: String,
    /// Duration in nanoseconds.
    pub duration: Option<u64>,
    /// Error message, usually a stack trace.
    pub error_message: Option<String>,
}

/// A base64 attachment.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EmbeddingDocument {
    /// MIME type of the payload.
    #[serde(alias = "media_type")]
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// Parse a status label, treating `pending` as a skip.
///
/// # Errors
///
/// Returns [`ModelError::UnknownOutcome`] for any other unrecognised label.
pub fn parse_status(status: &str) -> Result<Outcome, ModelError> {
    if status.trim().eq_ignore_ascii_case(PENDING) {
        return Ok(Outcome::Skipped);
    }
    status.parse()
}

fn outcome_record(result: &ResultDocument) -> Result<OutcomeRecord, ModelError> {
    Ok(OutcomeRecord {
        outcome: parse_status(&result.status)?,
        duration: Duration::from_nanos(result.duration.unwrap_or_default()),
        error_message: result.error_message.clone(),
    })
}

fn tags(tags: Vec<TagDocument>) -> Vec<Tag> {
    tags.into_iter()
        .map(|tag| Tag {
            name: tag.name,
            line: tag.line,
        })
        .collect()
}

fn match_event(matched: Option<MatchDocument>) -> MatchEvent {
    MatchEvent {
        location: matched.and_then(|m| m.location),
    }
}

fn decode_embedding(embedding: EmbeddingDocument) -> Result<Event, ModelError> {
    let data = base64::engine::general_purpose::STANDARD
        .decode(embedding.data.trim())
        .map_err(|err| ModelError::Attachment {
            mime_type: embedding.mime_type.clone(),
            source: AttachmentError::Decode(err.to_string()),
        })?;
    Ok(Event::Embedding {
        mime_type: embedding.mime_type,
        data,
    })
}

fn hook_events(
    hooks: Vec<HookDocument>,
    make: fn(MatchEvent, OutcomeRecord) -> Event,
    events: &mut Vec<Event>,
) -> Result<(), ModelError> {
    for hook in hooks {
        let result = outcome_record(&hook.result)?;
        events.push(make(match_event(hook.matched), result));
        output_events(hook.output, hook.embeddings, events)?;
    }
    Ok(())
}

fn output_events(
    output: Vec<String>,
    embeddings: Vec<EmbeddingDocument>,
    events: &mut Vec<Event>,
) -> Result<(), ModelError> {
    events.extend(output.into_iter().map(Event::Write));
    for embedding in embeddings {
        events.push(decode_embedding(embedding)?);
    }
    Ok(())
}

fn step_events(step: StepDocument, events: &mut Vec<Event>) -> Result<(), ModelError> {
    events.push(Event::Step(StepEvent {
        keyword: step.keyword,
        name: step.name,
        line: step.line,
    }));
    if let Some(matched) = step.matched {
        events.push(Event::Match(match_event(Some(matched))));
    }
    if let Some(result) = &step.result {
        events.push(Event::Result(outcome_record(result)?));
    }
    output_events(step.output, step.embeddings, events)
}

fn element_events(element: ElementDocument, events: &mut Vec<Event>) -> Result<(), ModelError> {
    match element.kind.as_str() {
        "background" => events.push(Event::Background(BackgroundEvent {
            keyword: element.keyword,
            name: element.name,
            description: element.description,
            line: element.line,
        })),
        "scenario_outline" => {
            events.push(Event::ScenarioOutline(ScenarioEvent {
                id: element.id,
                keyword: element.keyword,
                name: element.name,
                description: element.description,
                line: element.line,
                tags: tags(element.tags),
            }));
            return Ok(());
        }
        _ => events.push(Event::Scenario(ScenarioEvent {
            id: element.id,
            keyword: element.keyword,
            name: element.name,
            description: element.description,
            line: element.line,
            tags: tags(element.tags),
        })),
    }
    hook_events(element.before, Event::Before, events)?;
    for step in element.steps {
        step_events(step, events)?;
    }
    hook_events(element.after, Event::After, events)
}

/// Replay parsed features as builder events.
///
/// `uri` names the document and is used for features that do not carry a
/// `uri` of their own.
///
/// # Errors
///
/// Returns [`ModelError::UnknownOutcome`] for unrecognised status labels and
/// [`ModelError::Attachment`] for embeddings that are not valid base64.
pub fn events(uri: &str, features: Vec<FeatureDocument>) -> Result<Vec<Event>, ModelError> {
    let mut events = Vec::new();
    for feature in features {
        events.push(Event::DocumentStart {
            uri: feature.uri.unwrap_or_else(|| uri.to_string()),
        });
        events.push(Event::Feature(FeatureEvent {
            id: feature.id,
            keyword: feature.keyword,
            name: feature.name,
            description: feature.description,
            line: feature.line,
            tags: tags(feature.tags),
        }));
        for element in feature.elements {
            element_events(element, &mut events)?;
        }
        events.push(Event::EndOfDocument);
    }
    Ok(events)
}

fn syntax_error(uri: &str, err: &serde_json::Error) -> Event {
    let state = match err.classify() {
        serde_json::error::Category::Io => "io",
        serde_json::error::Category::Syntax => "syntax",
        serde_json::error::Category::Data => "data",
        serde_json::error::Category::Eof => "eof",
    };
    Event::SyntaxError(SyntaxErrorEvent {
        state: state.to_string(),
        event: err.to_string(),
        legal_events: vec!["feature".into()],
        uri: uri.to_string(),
        line: err.line(),
        column: err.column(),
    })
}

/// Turn the text of a report document into builder events.
///
/// Blank documents yield no events. Documents that are not valid report JSON
/// yield a single syntax-error event, which the builder rejects.
///
/// # Errors
///
/// See [`events`].
///
/// # Examples
/// ```
/// use cucumber_results::document::read_str;
/// use cucumber_results::event::Event;
///
/// assert!(read_str("empty.json", "  \n").unwrap().is_empty());
/// let events = read_str("broken.json", "[{").unwrap();
/// assert!(matches!(events.as_slice(), [Event::SyntaxError(_)]));
/// ```
pub fn read_str(uri: &str, text: &str) -> Result<Vec<Event>, ModelError> {
    if text.trim().is_empty() {
        log::info!("{uri} is empty; no features to read");
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Vec<FeatureDocument>>(text) {
        Ok(features) => events(uri, features),
        Err(err) => Ok(vec![syntax_error(uri, &err)]),
    }
}

/// Read a report document from disk and turn it into builder events.
///
/// # Errors
///
/// Returns [`ReadError::Io`] when the file cannot be read and
/// [`ReadError::Model`] when its contents cannot be replayed.
pub fn read_path(path: &Path) -> Result<Vec<Event>, ReadError> {
    let text = fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(read_str(&path.display().to_string(), &text)?)
}

/// Feed every document into `builder`, in order.
///
/// Documents processed before a failure stay in the builder's tree. Returns
/// the number of documents read.
///
/// # Errors
///
/// Returns the first [`ReadError`] encountered.
pub fn parse_documents<S, P>(
    builder: &mut TreeBuilder<S>,
    paths: impl IntoIterator<Item = P>,
) -> Result<usize, ReadError>
where
    S: AttachmentStore,
    P: AsRef<Path>,
{
    let mut read = 0;
    for path in paths {
        let path = path.as_ref();
        let events = read_path(path)?;
        log::info!("read {} events from {}", events.len(), path.display());
        builder.process_all(events)?;
        read += 1;
    }
    Ok(read)
}

/// Parse a set of documents into a fresh, tallied tree.
///
/// # Errors
///
/// Returns the first [`ReadError`] encountered; nothing is returned in that
/// case.
pub fn parse_files<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    config: BuilderConfig,
) -> Result<ResultTree, ReadError> {
    let mut builder = TreeBuilder::new(config);
    parse_documents(&mut builder, paths)?;
    Ok(builder.finish())
}
