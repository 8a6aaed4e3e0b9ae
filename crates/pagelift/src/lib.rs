// Copyright 2026 Pagelift Contributors
// SPDX-License-Identifier: MIT

//! Pagelift — semantic component recognition over a rendered page DOM, and
//! export of the recognized tree as Elementor widget JSON.
//!
//! The pipeline is: a [`PageAccessor`] supplies per-node tag, attributes,
//! computed style, geometry and text; the [`RecognitionEngine`] scores every
//! node against the patterns in a [`PatternRegistry`] and builds a tree of
//! [`RecognizedComponent`]s; [`analyzers`] attach structural metadata; an
//! [`ElementorExporter`] maps the tree onto Elementor sections, columns and
//! widgets.

pub mod accessor;
pub mod analyzers;
pub mod config;
pub mod engine;
pub mod export;
pub mod pattern;
pub mod patterns;
pub mod registry;
pub mod selector;
pub mod snapshot;
pub mod types;

pub use accessor::{AccessError, AccessResult, ElementView, PageAccessor, StyleSnapshot};
pub use analyzers::{analyze, enrich, AnalyzerOutput};
pub use config::{ExportConfig, RecognizerConfig};
pub use engine::{Candidate, Diagnostic, DiagnosticKind, Recognition, RecognitionEngine};
pub use export::{
    ElementorDocument, ElementorExporter, ElementorWidget, ElType, ExportContext, IdGenerator,
    WidgetMapper,
};
pub use pattern::RecognitionPattern;
pub use patterns::{default_registry, load_pattern_file, load_pattern_str, registry_for};
pub use registry::PatternRegistry;
pub use selector::Selector;
pub use snapshot::{PageSnapshot, SnapshotBuilder};
pub use types::*;
