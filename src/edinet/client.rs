// src/edinet/client.rs
use crate::config::Config;
use crate::edinet::models::{DocumentListResponse, FilingCandidate};
use crate::utils::error::EdinetError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header;
use std::time::Duration;

/// Remote operations the pipeline needs from the disclosure service.
#[async_trait]
pub trait DisclosureApi: Send + Sync {
    /// Downloads the bulk EDINET code list archive.
    async fn fetch_code_list(&self) -> Result<Vec<u8>, EdinetError>;

    /// Lists the balance-sheet-bearing filings published on `date`.
    async fn list_documents(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>, EdinetError>;

    /// Downloads the XBRL bundle (zip) for a document.
    async fn download_document(&self, doc_id: &str) -> Result<Vec<u8>, EdinetError>;
}

#[derive(Debug, Clone)]
pub struct EdinetClient {
    http: reqwest::Client,
    api_key: String,
    code_list_url: String,
    documents_list_url: String,
    document_url: String,
    index_timeout: Duration,
    download_timeout: Duration,
    index_request_delay: Duration,
}

impl EdinetClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            code_list_url: config.code_list_url.clone(),
            documents_list_url: config.documents_list_url.clone(),
            document_url: config.document_url.clone(),
            index_timeout: config.index_timeout,
            download_timeout: config.download_timeout,
            index_request_delay: config.index_request_delay,
        })
    }
}

/// Drops the request URL from transport errors; it carries the API key.
fn redact(e: reqwest::Error) -> EdinetError {
    EdinetError::Network(e.without_url())
}

/// Maps a non-success status to the matching error.
fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, EdinetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::error!("HTTP error status: {} for URL: {}", status, url);
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        tracing::warn!("Received {} - check the EDINET subscription key.", status);
        return Err(EdinetError::Unauthorized(status));
    }
    Err(EdinetError::Http(status))
}

#[async_trait]
impl DisclosureApi for EdinetClient {
    async fn fetch_code_list(&self) -> Result<Vec<u8>, EdinetError> {
        tracing::info!("Downloading EDINET code list from: {}", self.code_list_url);
        let response = self
            .http
            .get(&self.code_list_url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(redact)?;
        let response = check_status(response, &self.code_list_url)?;
        let body = response.bytes().await.map_err(redact)?;
        tracing::debug!("Downloaded {} bytes of code list", body.len());
        Ok(body.to_vec())
    }

    async fn list_documents(&self, date: NaiveDate) -> Result<Vec<FilingCandidate>, EdinetError> {
        tokio::time::sleep(self.index_request_delay).await;

        let date_param = date.format("%Y-%m-%d").to_string();
        let response = self
            .http
            .get(&self.documents_list_url)
            .query(&[
                ("date", date_param.as_str()),
                ("type", "2"), // metadata plus document list
                ("Subscription-Key", self.api_key.as_str()),
            ])
            .header(header::ACCEPT, "application/json")
            .timeout(self.index_timeout)
            .send()
            .await
            .map_err(redact)?;
        let response = check_status(response, &self.documents_list_url)?;

        let page: DocumentListResponse = response
            .json()
            .await
            .map_err(|e| {
                EdinetError::Parse(format!("document list for {}: {}", date_param, e.without_url()))
            })?;

        if let Some((code, message)) = page.embedded_error() {
            tracing::warn!("Document list for {} reported {}: {}", date_param, code, message);
            let status = reqwest::StatusCode::from_u16(code)
                .unwrap_or(reqwest::StatusCode::BAD_GATEWAY);
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    EdinetError::Unauthorized(status)
                }
                _ => EdinetError::Http(status),
            });
        }

        Ok(page
            .results
            .into_iter()
            .filter_map(FilingCandidate::from_record)
            .collect())
    }

    async fn download_document(&self, doc_id: &str) -> Result<Vec<u8>, EdinetError> {
        let url = format!("{}/{}", self.document_url, doc_id);
        tracing::info!("Downloading document bundle from: {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("type", "1"), // XBRL zip
                ("Subscription-Key", self.api_key.as_str()),
            ])
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(redact)?;
        let response = check_status(response, &url)?;

        let body = response.bytes().await.map_err(redact)?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
