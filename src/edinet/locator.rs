// src/edinet/locator.rs
use crate::edinet::client::DisclosureApi;
use crate::utils::error::{EdinetError, FailureKind};
use chrono::{Days, NaiveDate};

/// Dates from `today` backwards, newest first, `days` entries in total.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    next: Option<NaiveDate>,
    remaining: u32,
}

impl SearchWindow {
    pub fn new(today: NaiveDate, days: u32) -> Self {
        Self {
            next: Some(today),
            remaining: days,
        }
    }
}

impl Iterator for SearchWindow {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        let date = self.next?;
        self.remaining -= 1;
        self.next = date.checked_sub_days(Days::new(1));
        Some(date)
    }
}

#[derive(Debug)]
pub enum LocateOutcome {
    Found { doc_id: String, date: NaiveDate },
    NotFound,
}

/// Walks the daily index from `today` backwards and returns the first filing
/// by `filer_code` whose type is on the allow-list.
///
/// Transient and not-found failures for a single day count as an empty day.
/// A terminal failure (rejected key) stops the scan.
pub async fn find_latest_filing(
    api: &dyn DisclosureApi,
    filer_code: &str,
    today: NaiveDate,
    window_days: u32,
) -> Result<LocateOutcome, EdinetError> {
    tracing::info!(
        "Searching {} days of disclosure index for filer {}",
        window_days,
        filer_code
    );
    let mut skipped_days = 0u32;

    for date in SearchWindow::new(today, window_days) {
        let candidates = match api.list_documents(date).await {
            Ok(candidates) => candidates,
            Err(e) => match e.kind() {
                FailureKind::Terminal => {
                    tracing::error!("Aborting index scan on {}: {}", date, e);
                    return Err(e);
                }
                FailureKind::Transient | FailureKind::NotFound => {
                    tracing::warn!("Index page for {} unavailable, skipping: {}", date, e);
                    skipped_days += 1;
                    continue;
                }
            },
        };
        tracing::debug!("{}: {} candidate filings", date, candidates.len());

        if let Some(hit) = candidates.into_iter().find(|c| c.filer_code == filer_code) {
            tracing::info!(
                "Found document {} (type {}) listed {} submitted {}",
                hit.doc_id,
                hit.doc_type.code(),
                date,
                hit.published.as_deref().unwrap_or("unknown")
            );
            return Ok(LocateOutcome::Found {
                doc_id: hit.doc_id,
                date,
            });
        }
    }

    if skipped_days > 0 {
        tracing::warn!(
            "{} of {} index days could not be fetched during the search",
            skipped_days,
            window_days
        );
    }
    Ok(LocateOutcome::NotFound)
}
