// src/edinet/retriever.rs
use crate::utils::error::ExtractError;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

const FACTS_EXTENSION: &str = "xbrl";
// Auxiliary instance variants carry this marker in the file name.
const EXCLUDED_NAME_MARKER: &str = "Cc";
// Only the public rendition holds the full statements.
const PUBLIC_RENDITION_DIR: &str = "PublicDoc";

/// An extracted structured-facts file. The scratch directory it lives in is
/// removed when the handle is dropped.
#[derive(Debug)]
pub struct StructuredFacts {
    _scratch: TempDir,
    path: PathBuf,
}

impl StructuredFacts {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_to_string(&self) -> Result<String, ExtractError> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

/// Unpacks a document bundle into a fresh scratch directory and locates its
/// structured-facts file. Blocking; call from `spawn_blocking`.
pub fn unpack_bundle(doc_id: &str, bundle: Vec<u8>) -> Result<StructuredFacts, ExtractError> {
    let scratch = tempfile::Builder::new()
        .prefix(&format!("doc_{}_", doc_id))
        .tempdir()?;

    let mut archive = ZipArchive::new(Cursor::new(bundle))?;
    let mut extracted = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Skip entries whose names would escape the scratch dir
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let target = scratch.path().join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        extracted.push(relative);
    }
    tracing::debug!("Unpacked {} files for {}", extracted.len(), doc_id);

    extracted.sort();
    let facts_file = extracted
        .into_iter()
        .find(|p| is_public_facts_file(p))
        .ok_or_else(|| ExtractError::FactsFileNotFound(doc_id.to_string()))?;

    tracing::info!("Using structured-facts file {}", facts_file.display());
    Ok(StructuredFacts {
        path: scratch.path().join(facts_file),
        _scratch: scratch,
    })
}

fn is_public_facts_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == FACTS_EXTENSION);
    let excluded = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(EXCLUDED_NAME_MARKER));
    let public = path
        .parent()
        .is_some_and(|dir| dir.iter().any(|c| c == PUBLIC_RENDITION_DIR));

    has_extension && !excluded && public
}
