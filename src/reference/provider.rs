// src/reference/provider.rs
use crate::edinet::client::DisclosureApi;
use crate::reference::ReferenceTable;
use crate::storage::CacheStore;
use crate::utils::error::ReferenceError;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio::sync::OnceCell;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Process-wide holder of the code list. The first caller loads it (cache
/// file, else remote archive); concurrent callers wait on that load.
pub struct ReferenceTableProvider {
    api: Arc<dyn DisclosureApi>,
    cache: CacheStore,
    table: OnceCell<Arc<ReferenceTable>>,
}

impl ReferenceTableProvider {
    pub fn new(api: Arc<dyn DisclosureApi>, cache: CacheStore) -> Self {
        Self {
            api,
            cache,
            table: OnceCell::new(),
        }
    }

    /// Returns the loaded table, loading it on first use. A failed load is
    /// not remembered; the next call tries again.
    pub async fn table(&self) -> Result<Arc<ReferenceTable>, ReferenceError> {
        self.table
            .get_or_try_init(|| async { self.load().await.map(Arc::new) })
            .await
            .cloned()
    }

    async fn load(&self) -> Result<ReferenceTable, ReferenceError> {
        if let Some(raw) = self.cache.read() {
            match ReferenceTable::from_cp932_bytes(&raw) {
                Ok(table) => {
                    tracing::info!(
                        "Using cached code list at {} ({} entries)",
                        self.cache.path().display(),
                        table.len()
                    );
                    return Ok(table);
                }
                Err(e) => {
                    tracing::warn!("Cached code list unusable, refetching: {}", e);
                }
            }
        }

        let payload = self.api.fetch_code_list().await?;
        let csv_bytes = tokio::task::spawn_blocking(move || extract_csv(payload))
            .await
            .map_err(|e| ReferenceError::Io(std::io::Error::other(e)))??;

        if let Err(e) = self.cache.write(&csv_bytes) {
            tracing::warn!("Failed to write code list cache: {}", e);
        }
        ReferenceTable::from_cp932_bytes(&csv_bytes)
    }
}

/// Returns the first `.csv` member of the archive. A payload that is not a
/// zip is taken to be the CSV itself.
fn extract_csv(payload: Vec<u8>) -> Result<Vec<u8>, ReferenceError> {
    if !payload.starts_with(ZIP_MAGIC) {
        tracing::debug!("Code list payload is not a zip archive; treating as CSV");
        return Ok(payload);
    }

    let mut archive = ZipArchive::new(Cursor::new(payload))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_file() && entry.name().to_ascii_lowercase().ends_with(".csv") {
            tracing::debug!("Found code list file {} in archive", entry.name());
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }
    Err(ReferenceError::NoTabularFile)
}
