// src/config.rs
use std::path::PathBuf;
use std::time::Duration;

pub const CODE_LIST_URL: &str =
    "https://disclosure2dl.edinet-fsa.go.jp/searchdocument/codelist/Edinetcode.zip";
pub const DOCUMENTS_LIST_URL: &str = "https://disclosure.edinet-fsa.go.jp/api/v2/documents.json";
pub const DOCUMENT_URL: &str = "https://disclosure.edinet-fsa.go.jp/api/v2/documents";

pub const REFERENCE_CACHE_FILE: &str = "edinet_code_list.csv";

// The code list host rejects non-browser agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Trailing window searched for the latest report, in days (today inclusive).
pub const SEARCH_WINDOW_DAYS: u32 = 365;

/// Pause before each disclosure index request.
const INDEX_REQUEST_DELAY_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub cache_dir: PathBuf,
    pub search_window_days: u32,
    pub code_list_url: String,
    pub documents_list_url: String,
    pub document_url: String,
    pub user_agent: String,
    pub index_timeout: Duration,
    pub download_timeout: Duration,
    pub index_request_delay: Duration,
}

impl Config {
    pub fn new(api_key: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            cache_dir: cache_dir.into(),
            search_window_days: SEARCH_WINDOW_DAYS,
            code_list_url: CODE_LIST_URL.to_string(),
            documents_list_url: DOCUMENTS_LIST_URL.to_string(),
            document_url: DOCUMENT_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            index_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(60),
            index_request_delay: Duration::from_millis(INDEX_REQUEST_DELAY_MS),
        }
    }

    pub fn reference_cache_path(&self) -> PathBuf {
        self.cache_dir.join(REFERENCE_CACHE_FILE)
    }
}
