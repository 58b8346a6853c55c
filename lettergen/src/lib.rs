//! lettergen - bulk mail-merge letter generator
//!
//! Reads customer records from a CSV or Excel table and produces one
//! personalized .docx letter per record, either by filling `{PLACEHOLDER}`
//! tokens in a Word template or by composing a letter from flat-text bodies
//! chosen by account status. The letters of a batch are packaged into one zip
//! archive.
//!
//! # Modules
//!
//! - [`records`]: tabular input, field roles and status classification
//! - [`token`]: the `{NAME}` placeholder grammar
//! - [`mapping`]: per-record substitution mappings
//! - [`docx`]: the .docx package and document model
//! - [`discovery`]: placeholders present in a template
//! - [`rewriter`]: run-safe substitution over a document
//! - [`flat_template`]: status-selected flat-text bodies
//! - [`letter`]: flat-mode letter composition
//! - [`generator`]: the batch pass
//! - [`archive`]: zip packaging of a batch
//! - [`config`]: `lettergen.toml`

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::enum_variant_names)]

pub mod archive;
pub mod config;
pub mod discovery;
pub mod docx;
pub mod flat_template;
pub mod generator;
pub mod letter;
pub mod mapping;
pub mod records;
pub mod rewriter;
pub mod token;

pub use config::{GenerationSettings, LetterConfig};
pub use generator::{generate, Batch, GeneratedDocument, LetterTemplate, ProgressReporter};
pub use records::{RecordSet, RowRange, StatusClass};
