// src/pipeline.rs
use crate::balance::{reconcile, BalanceSheetSummary, RawBalanceFacts};
use crate::edinet::client::DisclosureApi;
use crate::edinet::locator::{find_latest_filing, LocateOutcome};
use crate::edinet::retriever::unpack_bundle;
use crate::extractors::{balance_facts, parse_facts};
use crate::reference::ReferenceTableProvider;
use crate::utils::error::{ExtractError, PipelineError};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error as _;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Ticker -> filer -> latest report -> reconciled balance sheet.
pub struct Pipeline {
    api: Arc<dyn DisclosureApi>,
    reference: Arc<ReferenceTableProvider>,
    window_days: u32,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn DisclosureApi>,
        reference: Arc<ReferenceTableProvider>,
        window_days: u32,
    ) -> Self {
        Self {
            api,
            reference,
            window_days,
        }
    }

    pub async fn balance_sheet(
        &self,
        ticker: &str,
        today: NaiveDate,
    ) -> Result<BalanceSheetSummary, PipelineError> {
        let ticker = normalize_ticker(ticker)?;

        // 1. Code list
        let table = self
            .reference
            .table()
            .await
            .map_err(PipelineError::ReferenceLoad)?;

        // 2. Filer code
        let entry = table
            .resolve(&ticker)
            .ok_or_else(|| PipelineError::TickerNotFound(ticker.clone()))?;
        tracing::info!(
            "Ticker {} resolved to {} ({})",
            ticker,
            entry.filer_code,
            entry.entity_name
        );

        // 3. Latest report
        let doc_id = match find_latest_filing(
            self.api.as_ref(),
            &entry.filer_code,
            today,
            self.window_days,
        )
        .await
        {
            Ok(LocateOutcome::Found { doc_id, date }) => {
                tracing::info!("Latest report for {} is {} ({})", entry.filer_code, doc_id, date);
                doc_id
            }
            Ok(LocateOutcome::NotFound) => {
                return Err(PipelineError::DocumentNotFound {
                    filer: entry.filer_code.clone(),
                    window_days: self.window_days,
                })
            }
            Err(source) => {
                return Err(PipelineError::IndexUnavailable {
                    filer: entry.filer_code.clone(),
                    source,
                })
            }
        };

        // 4. Bundle
        let bundle = self
            .api
            .download_document(&doc_id)
            .await
            .map_err(|source| PipelineError::Download {
                doc_id: doc_id.clone(),
                source,
            })?;

        // 5. Facts
        let raw = {
            let job_doc_id = doc_id.clone();
            tokio::task::spawn_blocking(move || extract_raw_facts(&job_doc_id, bundle))
                .await
                .map_err(|e| ExtractError::Io(std::io::Error::other(e)))
                .and_then(|r| r)
                .map_err(|source| PipelineError::Extraction {
                    doc_id: doc_id.clone(),
                    source,
                })?
        };

        // 6. Reconcile
        let summary = reconcile(&entry.entity_name, &raw);
        if !summary.has_data() {
            return Err(PipelineError::NoBalanceData(doc_id));
        }
        tracing::info!(
            "Balance sheet for {}: total assets {}",
            ticker,
            summary.total_assets
        );
        Ok(summary)
    }
}

fn normalize_ticker(ticker: &str) -> Result<String, PipelineError> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PipelineError::InvalidTicker(ticker.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Unpack, parse and pick the raw figures. The scratch directory is gone
/// once this returns, whatever the outcome.
fn extract_raw_facts(doc_id: &str, bundle: Vec<u8>) -> Result<RawBalanceFacts, ExtractError> {
    let facts_file = unpack_bundle(doc_id, bundle)?;
    tracing::debug!("Reading {}", facts_file.path().display());
    let xml = facts_file.read_to_string()?;
    let facts = parse_facts(&xml)?;
    Ok(balance_facts(&facts))
}

/// What the presentation layer receives for one ticker.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestOutcome {
    Summary(BalanceSheetSummary),
    Failure {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Summary(_))
    }
}

impl From<Result<BalanceSheetSummary, PipelineError>> for RequestOutcome {
    fn from(result: Result<BalanceSheetSummary, PipelineError>) -> Self {
        match result {
            Ok(summary) => RequestOutcome::Summary(summary),
            Err(e) => {
                let mut causes = Vec::new();
                let mut source = e.source();
                while let Some(cause) = source {
                    causes.push(cause.to_string());
                    source = cause.source();
                }
                RequestOutcome::Failure {
                    error: e.to_string(),
                    details: (!causes.is_empty()).then(|| causes.join(": ")),
                }
            }
        }
    }
}

/// Runs one pipeline per ticker concurrently. A failure (or panic) for one
/// ticker never affects the others. Results come back in input order.
pub async fn run_all(
    pipeline: Arc<Pipeline>,
    tickers: Vec<String>,
    today: NaiveDate,
) -> Vec<(String, RequestOutcome)> {
    let mut tasks = JoinSet::new();
    for (index, ticker) in tickers.iter().cloned().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn(async move {
            let outcome = RequestOutcome::from(pipeline.balance_sheet(&ticker, today).await);
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<RequestOutcome>> = tickers.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => tracing::error!("Ticker task failed to complete: {}", e),
        }
    }

    tickers
        .into_iter()
        .zip(slots)
        .map(|(ticker, slot)| {
            let outcome = slot.unwrap_or_else(|| RequestOutcome::Failure {
                error: format!("Processing aborted for ticker {}", ticker),
                details: None,
            });
            (ticker, outcome)
        })
        .collect()
}
