// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backend traits

use crate::error::Result;
use async_trait::async_trait;

/// Something that turns shielded pseudo-XML in one language into another
#[async_trait]
pub trait TranslationBackend: Send {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Whether document content leaves the machine; callers must get the
    /// user's consent before using such a backend
    fn is_remote_service(&self) -> bool;

    /// Translate `text`; `origin_id` identifies the document it came from
    async fn translate(
        &mut self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
        origin_id: &str,
    ) -> Result<String>;
}

/// A backend that round-trips through a file edited outside the program
pub trait FileBackend {
    /// Serialized content to hand to the user
    fn file_bytes(&self) -> Result<Vec<u8>>;

    fn content_type(&self) -> &'static str;

    fn file_name(&self) -> String;

    /// Load an edited file, returning the number of entries read
    fn import_file(&mut self, bytes: &[u8]) -> Result<usize>;
}
