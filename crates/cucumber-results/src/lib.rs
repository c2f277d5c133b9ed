//! Result trees for Cucumber scenario runs.
//!
//! This crate turns the ordered event stream of a Cucumber report into a
//! [`ResultTree`] of features, scenarios, backgrounds, steps and hooks. The
//! tree carries pass/fail/skip counters and durations at every level, a
//! derived view per tag, and stable path-safe identifiers that survive
//! merging in the results of later reruns.
//!
//! - [`TreeBuilder`] consumes [`Event`]s and enforces their ordering.
//! - [`ResultTree::tally`] recomputes counters bottom-up. Failure beats
//!   skip, and skip beats pass, at every level.
//! - [`ResultTree::merge`] appends another tree's features and re-tallies.
//! - [`ResultTree::find`] resolves `cucumber/<feature>/<scenario>` paths.
//!
//! With the default `json` feature, [`document`] reads Cucumber JSON reports
//! and replays them as events.
//!
//! Logging goes through the [`log`] facade: one debug record per event,
//! warnings for tolerated ordering problems and an info record per document
//! and per merge.

pub mod attachments;
pub mod builder;
pub mod config;
#[cfg(feature = "json")]
pub mod document;
pub mod error;
pub mod event;
pub mod history;
pub mod merge;
pub mod model;
pub mod naming;
pub mod outcome;
pub mod query;
mod tally;

pub use attachments::{AttachmentStore, InMemoryAttachments};
pub use builder::{BuilderState, TreeBuilder};
pub use config::BuilderConfig;
pub use error::{AttachmentError, ConfigError, ModelError, ReadError};
pub use event::Event;
pub use history::ScenarioStatus;
pub use merge::{MergeSummary, SharedResultTree};
pub use model::{
    BackgroundNode, EmbeddedItem, FeatureId, FeatureNode, HookResultNode, ResultTree, ScenarioId,
    ScenarioNode, StepNode, TagNode,
};
pub use outcome::{Counts, Outcome};
pub use query::NodeRef;
