use crate::error::{ExportError, ExportResult};
use crate::token::TokenProvider;
use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use config::RetryConfig;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One page of a listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
    pub page_count: Option<u32>,
    pub total: Option<u64>
}

impl<T> Page<T> {
    /// Whether another page should be requested after `requested` (1-based).
    pub fn has_more(&self, requested: u32) -> bool {
        if self.entities.is_empty() {
            return false;
        }
        match self.page_count {
            Some(count) => self.page_number.unwrap_or(requested) < count,
            None => true
        }
    }
}

/// Walks page-numbered listing endpoints to completion, one request at a time.
pub struct PaginatedFetcher {
    http_client: Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
    retry: RetryConfig
}

impl PaginatedFetcher {
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        tokens: Arc<TokenProvider>,
        retry: RetryConfig
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            retry
        }
    }

    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page_size: u32
    ) -> ExportResult<Vec<T>> {
        self.fetch_all_with(endpoint, page_size, &[]).await
    }

    /// Like [`fetch_all`](Self::fetch_all) with extra query parameters sent on
    /// every page request.
    pub async fn fetch_all_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page_size: u32,
        extra_query: &[(&str, &str)]
    ) -> ExportResult<Vec<T>> {
        let mut elements = Vec::new();
        let mut page_number = 1u32;

        loop {
            let page: Page<T> = self
                .fetch_page(endpoint, page_number, page_size, extra_query)
                .await?;
            let more = page.has_more(page_number);
            debug!(
                endpoint = %endpoint,
                page = page_number,
                count = page.entities.len(),
                page_count = ?page.page_count,
                "Retrieved page"
            );
            elements.extend(page.entities);

            if !more {
                break;
            }
            page_number += 1;
        }

        info!(
            endpoint = %endpoint,
            pages = page_number,
            total = elements.len(),
            "Completed retrieval"
        );
        Ok(elements)
    }

    fn page_url(
        &self,
        endpoint: &str,
        page_number: u32,
        page_size: u32,
        extra_query: &[(&str, &str)]
    ) -> String {
        let mut url = format!(
            "{}/{}?pageSize={}&pageNumber={}",
            self.base_url,
            endpoint.trim_start_matches('/'),
            page_size,
            page_number
        );
        for (key, value) in extra_query {
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
        url
    }

    fn server_error_schedule(&self) -> impl Backoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_backoff())
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.retry.max_backoff())
            .with_max_elapsed_time(None)
            .build()
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page_number: u32,
        page_size: u32,
        extra_query: &[(&str, &str)]
    ) -> ExportResult<Page<T>> {
        let url = self.page_url(endpoint, page_number, page_size, extra_query);

        // Retry state is scoped to this page request.
        let mut schedule = self.server_error_schedule();
        let mut server_retries = 0u32;
        let mut rate_limit_retries = 0u32;
        let mut credential_refreshed = false;

        loop {
            let credential = self.tokens.get_token().await?;
            debug!(url = %url, "Making Genesys Cloud API request");

            let sent = self
                .http_client
                .get(&url)
                .header(AUTHORIZATION, credential.bearer())
                .header(ACCEPT, "application/json")
                .send()
                .await;

            let failure = match sent {
                Err(e) => ExportError::HttpError(e),
                Ok(response) => match response.status() {
                    s if s.is_success() => {
                        let body = response.bytes().await?;
                        let page: Page<T> = serde_json::from_slice(&body)?;
                        return Ok(page);
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        let wait = retry_after(response.headers())
                            .unwrap_or_else(|| self.retry.rate_limit_default());
                        if rate_limit_retries >= self.retry.max_rate_limit_retries {
                            return Err(ExportError::RateLimitExceeded {
                                endpoint: endpoint.to_string(),
                                page: page_number,
                                attempts: rate_limit_retries,
                                retry_after_seconds: wait.as_secs()
                            });
                        }
                        rate_limit_retries += 1;
                        warn!(
                            url = %url,
                            attempt = rate_limit_retries,
                            wait_ms = wait.as_millis() as u64,
                            "Rate limited (429), waiting before retry"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    StatusCode::UNAUTHORIZED if !credential_refreshed => {
                        credential_refreshed = true;
                        warn!(
                            url = %url,
                            "Credential rejected (401), refreshing and retrying once"
                        );
                        self.tokens.refresh().await?;
                        continue;
                    }
                    s => ExportError::FetchError {
                        endpoint: endpoint.to_string(),
                        page: page_number,
                        status: s.as_u16(),
                        message: response.text().await.unwrap_or_default()
                    }
                }
            };

            if !failure.is_retryable() || server_retries >= self.retry.max_retries {
                return Err(failure);
            }
            server_retries += 1;
            let wait = schedule.next_backoff().unwrap_or(self.retry.max_backoff());
            warn!(
                url = %url,
                error = %failure,
                attempt = server_retries,
                wait_ms = wait.as_millis() as u64,
                "Transient failure, retrying with backoff"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Reads a `Retry-After` header given in delay-seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
