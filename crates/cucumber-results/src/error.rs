//! Error types surfaced while building result trees.
//!
//! Protocol violations, malformed input and unknown outcomes are all
//! [`ModelError`]s raised where they are detected; nothing retries internally.
//! Tally and merge never fail on a tree the builder produced.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning an event stream into a result tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A document-start marker arrived while a previous URI was still pending.
    #[error("out-of-order document marker: received '{uri}' before '{pending}' was handled")]
    OutOfOrderDocumentMarker {
        /// URI still waiting for its feature event.
        pending: String,
        /// URI carried by the offending marker.
        uri: String,
    },
    /// A background event arrived while another background was open.
    #[error("nested background '{name}': previous background was never adopted by a scenario")]
    NestedBackground {
        /// Name of the rejected background.
        name: String,
    },
    /// A step event arrived before the previous step was resolved.
    #[error("step '{step}' received before previous step '{pending}' was handled")]
    DuplicateStep {
        /// Text of the step still waiting for its result.
        pending: String,
        /// Text of the offending step.
        step: String,
    },
    /// A match event arrived before the previous match was resolved.
    #[error("match '{location}' received before previous match was handled")]
    DuplicateMatch {
        /// Location carried by the offending match.
        location: String,
    },
    /// A structural event closed a context that still had a pending step.
    #[error("step '{step}' was never resolved before {event}")]
    UnresolvedStep {
        /// Text of the abandoned step.
        step: String,
        /// Event that closed the context.
        event: &'static str,
    },
    /// The event is not legal in the builder's current state.
    #[error("unexpected {event} event while {state}")]
    UnexpectedEvent {
        /// Event that was rejected.
        event: &'static str,
        /// Description of the builder state.
        state: &'static str,
    },
    /// The input document could not be parsed.
    #[error(
        "malformed input: line {line}, column {column}, uri {uri}, state '{state}', event '{event}', expected one of [{}]",
        .expected.join(", ")
    )]
    Malformed {
        /// 1-based line of the failure.
        line: usize,
        /// 1-based column of the failure, `0` when unknown.
        column: usize,
        /// Document the failure was found in.
        uri: String,
        /// Parser state at the time of the failure.
        state: String,
        /// Event the parser could not accept.
        event: String,
        /// Events that would have been legal.
        expected: Vec<String>,
    },
    /// A status string outside the closed set of outcomes.
    #[error("outcome \"{status}\" is not recognised")]
    UnknownOutcome {
        /// The rejected status string.
        status: String,
    },
    /// The attachment store rejected an embedding.
    #[error("failed to store {mime_type} attachment: {source}")]
    Attachment {
        /// MIME type of the rejected embedding.
        mime_type: String,
        /// Root cause reported by the store.
        #[source]
        source: AttachmentError,
    },
}

/// Errors reported by an [`AttachmentStore`](crate::attachments::AttachmentStore).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttachmentError {
    /// The payload could not be decoded.
    #[error("attachment payload could not be decoded: {0}")]
    Decode(String),
    /// Writing the payload failed.
    #[error("attachment I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading report documents from disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadError {
    /// The document could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the unreadable document.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document was read but could not be turned into results.
    #[error("failed to parse Cucumber results: {0}")]
    Model(#[from] ModelError),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable held a value that could not be interpreted.
    #[error("invalid value '{value}' for {variable}, expected a boolean")]
    InvalidValue {
        /// Variable that was read.
        variable: &'static str,
        /// Offending value.
        value: String,
    },
}
