use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovsumError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown format: '{0}'. Supported: auto, lcov, coverage-py, cobertura")]
    UnknownFormat(String),

    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CovsumError>;
