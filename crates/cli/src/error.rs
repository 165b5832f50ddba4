#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot open {0}: {1}")]
    Open(String, String),

    #[error("Page {page} out of range, the document has {count} pages")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("Failed to analyze {failed} of {total} documents")]
    AnalysisFailed { failed: usize, total: usize },
}
