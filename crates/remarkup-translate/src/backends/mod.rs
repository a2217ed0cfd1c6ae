// SPDX-License-Identifier: AGPL-3.0-or-later
//! Translation backends

pub mod dictionary;
pub mod remote;

pub use dictionary::{export_units, import_units, DictionaryBackend, ImportedDocument};
pub use remote::RemoteBackend;
