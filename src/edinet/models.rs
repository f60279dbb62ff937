// src/edinet/models.rs
#![allow(non_snake_case)]
use serde::Deserialize;

/// One row of the EDINET code list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub ticker: String,
    pub filer_code: String,
    pub entity_name: String,
}

/// Report types that carry a balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    AnnualSecuritiesReport,
    QuarterlyReport,
    SemiAnnualReport,
}

impl DocType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "120" => Some(DocType::AnnualSecuritiesReport),
            "140" => Some(DocType::QuarterlyReport),
            "160" => Some(DocType::SemiAnnualReport),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DocType::AnnualSecuritiesReport => "120",
            DocType::QuarterlyReport => "140",
            DocType::SemiAnnualReport => "160",
        }
    }
}

/// Response of the daily document list endpoint (`documents.json?type=2`).
/// Example: https://disclosure.edinet-fsa.go.jp/api/v2/documents.json?date=2024-06-20&type=2
#[derive(Debug, Deserialize)]
pub struct DocumentListResponse {
    pub metadata: Option<ResponseMetadata>,
    #[serde(default)]
    pub results: Vec<DocumentRecord>,
    // Gateway errors (e.g. a bad key) come back as HTTP 200 with these instead
    pub statusCode: Option<u16>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl DocumentListResponse {
    /// Status reported inside the body, when it is not a success.
    pub fn embedded_error(&self) -> Option<(u16, String)> {
        if let Some(code) = self.statusCode.filter(|c| *c != 200) {
            return Some((code, self.message.clone().unwrap_or_default()));
        }
        let meta = self.metadata.as_ref()?;
        let code: u16 = meta.status.as_deref()?.parse().ok()?;
        (code != 200).then(|| (code, meta.message.clone().unwrap_or_default()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub docID: Option<String>,
    pub edinetCode: Option<String>,
    pub docTypeCode: Option<String>,
    pub submitDateTime: Option<String>,
}

/// A listed filing whose type is on the balance-sheet allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingCandidate {
    pub filer_code: String,
    pub doc_type: DocType,
    pub doc_id: String,
    pub published: Option<String>,
}

impl FilingCandidate {
    /// Keeps only records with a filer code, a document id and an allowed type.
    pub fn from_record(record: DocumentRecord) -> Option<Self> {
        let doc_type = DocType::from_code(record.docTypeCode.as_deref()?)?;
        Some(Self {
            filer_code: record.edinetCode?,
            doc_type,
            doc_id: record.docID?,
            published: record.submitDateTime,
        })
    }
}
