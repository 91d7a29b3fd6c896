// Source trait for turning uploads into tables
use crate::domain::table::Table;
use async_trait::async_trait;
use serde::Deserialize;

/// An uploaded file as received from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceUpload {
    pub name: String,
    pub content: String,
    /// Whether the first row holds column names
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_has_header() -> bool {
    true
}

impl SourceUpload {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            has_header: true,
        }
    }
}

#[async_trait]
pub trait TableSource: Send + Sync {
    /// Parse an upload into a table, failing on unsupported or malformed files
    async fn load(&self, upload: &SourceUpload) -> anyhow::Result<Table>;
}
