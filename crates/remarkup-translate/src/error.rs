// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type for translation

use remarkup_core::ConversionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("{backend} backend failed: {message}")]
    Backend { backend: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from translation service: {0}")]
    InvalidResponse(String),

    #[error("Markup error: {0}")]
    Markup(#[from] ConversionError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TranslationError>;
