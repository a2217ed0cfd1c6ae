// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remarkup Translate - Translation of Remarkup documents through pseudo-XML
//!
//! Provides:
//! - Shielding of code and verbatim text from the translator
//! - Text-run extraction with stable translation-unit keys
//! - A dictionary backend exchanging CSV spreadsheets
//! - A remote backend for DeepLX-compatible HTTP services

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod shield;
pub mod unit;

pub use backend::{FileBackend, TranslationBackend};
pub use backends::{DictionaryBackend, ImportedDocument, RemoteBackend};
pub use config::{BackendKind, TranslatorConfig};
pub use error::{Result, TranslationError};
pub use orchestrator::{DocumentOutcome, SourceDocument, Translator};
pub use unit::{translation_key, TranslationUnit};
