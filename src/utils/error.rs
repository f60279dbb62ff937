// src/utils/error.rs
use thiserror::Error;

/// How a failed remote call should be treated by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The resource does not exist (404).
    NotFound,
    /// Worth retrying later: connection problems, timeouts, error statuses,
    /// bodies that did not decode (e.g. a maintenance page).
    Transient,
    /// Retrying cannot help: the credential was rejected.
    Terminal,
}

// Errors talking to the disclosure service
#[derive(Error, Debug)]
pub enum EdinetError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Credential rejected by disclosure service: {0}")]
    Unauthorized(reqwest::StatusCode),

    #[error("Failed to parse disclosure service response: {0}")]
    Parse(String),
}

impl EdinetError {
    pub fn kind(&self) -> FailureKind {
        match self {
            // Connect/timeout/body errors carry no status
            EdinetError::Network(e) => e
                .status()
                .map_or(FailureKind::Transient, classify_status),
            EdinetError::Http(status) => classify_status(*status),
            EdinetError::Unauthorized(_) => FailureKind::Terminal,
            EdinetError::Parse(_) => FailureKind::Transient,
        }
    }
}

fn classify_status(status: reqwest::StatusCode) -> FailureKind {
    match status {
        reqwest::StatusCode::NOT_FOUND => FailureKind::NotFound,
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            FailureKind::Terminal
        }
        _ => FailureKind::Transient,
    }
}

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference archive download failed: {0}")]
    Download(#[from] EdinetError),

    #[error("Reference archive is unreadable: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Reference archive contains no CSV file")]
    NoTabularFile,

    #[error("Reference cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reference table CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Reference table has no column for {0}; the header layout has changed")]
    SchemaDrift(&'static str),

    #[error("Reference table contains no rows")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Document bundle is unreadable: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error while unpacking document bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("No structured-facts file in document bundle {0}")]
    FactsFileNotFound(String),

    #[error("Structured-facts document is not well-formed XML: {0}")]
    MalformedDocument(String),

    #[error("Structured-facts document has an unexpected layout: {0}")]
    UnexpectedSchema(String),
}

/// Request-boundary failures. Each one is terminal for its ticker only.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load EDINET code list")]
    ReferenceLoad(#[source] ReferenceError),

    #[error("Invalid ticker code: {0:?}")]
    InvalidTicker(String),

    #[error("Ticker {0} not found or has no EDINET code")]
    TickerNotFound(String),

    #[error("No annual, quarterly or semi-annual report found for {filer} in the last {window_days} days")]
    DocumentNotFound { filer: String, window_days: u32 },

    #[error("Disclosure index unavailable while searching for {filer}")]
    IndexUnavailable {
        filer: String,
        #[source]
        source: EdinetError,
    },

    #[error("Failed to download document {doc_id}")]
    Download {
        doc_id: String,
        #[source]
        source: EdinetError,
    },

    #[error("Parsing failed for document {doc_id}")]
    Extraction {
        doc_id: String,
        #[source]
        source: ExtractError,
    },

    #[error("Document {0} contains no usable balance-sheet figures")]
    NoBalanceData(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
