// src/reference/table.rs
use crate::edinet::models::ReferenceEntry;
use crate::utils::error::ReferenceError;
use encoding_rs::SHIFT_JIS;

const SECURITY_CODE_HEADERS: &[&str] = &["証券コード", "SecuritiesCode"];
const FILER_CODE_HEADERS: &[&str] = &["ＥＤＩＮＥＴコード", "EdinetCode"];
const ENTITY_NAME_HEADERS: &[&str] = &["提出者名", "SubmitterName"];

const UNKNOWN_ENTITY: &str = "Unknown";

/// Column positions found by header substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub security_code: usize,
    pub filer_code: usize,
    pub entity_name: Option<usize>,
}

impl ColumnMap {
    pub fn discover(headers: &csv::StringRecord) -> Result<Self, ReferenceError> {
        let find = |needles: &[&str]| {
            headers
                .iter()
                .position(|h| needles.iter().any(|n| h.contains(n)))
        };
        Ok(Self {
            security_code: find(SECURITY_CODE_HEADERS)
                .ok_or(ReferenceError::SchemaDrift("security code"))?,
            filer_code: find(FILER_CODE_HEADERS).ok_or(ReferenceError::SchemaDrift("EDINET code"))?,
            entity_name: find(ENTITY_NAME_HEADERS),
        })
    }
}

/// The ticker -> filer code -> entity name lookup table, in source order.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceTable {
    /// Decodes the raw cached artifact (Shift_JIS / CP932).
    pub fn from_cp932_bytes(raw: &[u8]) -> Result<Self, ReferenceError> {
        let (text, _, had_errors) = SHIFT_JIS.decode(raw);
        if had_errors {
            tracing::warn!("Code list contained bytes that are not valid CP932; replaced");
        }
        Self::from_csv_text(&text)
    }

    /// Parses the code list: a banner line, a header row, then one row per filer.
    pub fn from_csv_text(text: &str) -> Result<Self, ReferenceError> {
        let body = text
            .trim_start_matches('\u{feff}')
            .split_once('\n')
            .map(|(_banner, rest)| rest)
            .unwrap_or("");

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());
        let columns = ColumnMap::discover(reader.headers()?)?;
        tracing::debug!("Code list columns: {:?}", columns);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            entries.push(ReferenceEntry {
                ticker: field(columns.security_code),
                filer_code: field(columns.filer_code),
                entity_name: columns
                    .entity_name
                    .map(field)
                    .unwrap_or_else(|| UNKNOWN_ENTITY.to_string()),
            });
        }

        if entries.is_empty() {
            return Err(ReferenceError::Empty);
        }
        tracing::info!("Loaded {} code list entries", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First row whose security code starts with `ticker`. The list stores
    /// five-digit codes (ticker plus a check digit), so equality would miss.
    ///
    /// Rows without a filer code are passed over rather than returned, so a
    /// later row with a usable code can still match. This is the only
    /// departure from plain first-match.
    pub fn resolve(&self, ticker: &str) -> Option<&ReferenceEntry> {
        if ticker.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.ticker.starts_with(ticker) && !e.filer_code.is_empty())
    }
}
