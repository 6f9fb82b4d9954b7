//! Slate Core - standoff text annotation library
//!
//! This crate provides the document model, span geometry, annotation store
//! and session controller for the Slate annotation tool. Rendering and key
//! handling are left to the front end.

pub mod config;
pub mod datum;
pub mod error;
pub mod manifest;
pub mod model;
pub mod session;
pub mod standoff;

pub use config::{AnnotationType, Config, LabelConfig};
pub use datum::{Datum, Disagreement, MarkKey, Marker, Markings, Mover};
pub use error::{FileListReport, Result, SlateError};
pub use manifest::{process_file_list, ManifestEntry};
pub use model::{
    Change, Direction, Document, Item, Position, Scope, SearchDirection, Span, SpanRelation,
    SpanSpec,
};
pub use session::{Command, Outcome, Place, Session};
