//! # Rule Distribution Client
//!
//! Fetches rule-set documents from the Flagpole service and reports flag
//! usage back to it.
//!
//! A fetch is two requests: a metadata request locating the distribution
//! endpoint and path for the environment, then a request to that location
//! for the document itself. The whole sequence is retried a fixed number of
//! times with exponential backoff; a malformed document is not retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FlagpoleError;
use crate::model::{Context, RuleSet};

pub const DEFAULT_API_URL: &str = "https://api.flagpole.dev";

const FETCH_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(250);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched rule set: the raw document exactly as served (for write-through
/// caching), plus its parsed form.
#[derive(Debug, Clone)]
pub struct FetchedRules {
    pub raw: String,
    pub document: RuleSet,
}

/// Remote collaborator consumed by the flag manager. Implemented over HTTP
/// by [`HttpFetcher`]; tests substitute their own.
#[async_trait]
pub trait RuleFetcher: Send + Sync + std::fmt::Debug {
    async fn get_rules(&self) -> Result<FetchedRules, FlagpoleError>;
    async fn report_usage(
        &self,
        key: &str,
        context: Option<&Context>,
    ) -> Result<(), FlagpoleError>;
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    distribution: Distribution,
}

#[derive(Debug, Deserialize)]
struct Distribution {
    endpoint: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct UsagePayload<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a Context>,
}

/// HTTP implementation of [`RuleFetcher`].
#[derive(Debug)]
pub struct HttpFetcher {
    api_url: String,
    token: String,
    client: Client,
}

impl HttpFetcher {
    pub fn new(api_url: &str, token: &str) -> Result<Self, FlagpoleError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FlagpoleError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(HttpFetcher {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    async fn fetch_once(&self) -> Result<FetchedRules, FlagpoleError> {
        let metadata_url = format!(
            "{}/v1/environments/{}/metadata",
            self.api_url, self.token
        );
        debug!(url = %metadata_url, "requesting distribution metadata");
        let response = self.client.get(&metadata_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlagpoleError::fetch(
                format!("metadata request returned {status}"),
                Some(status.as_u16()),
            ));
        }
        let metadata: MetadataResponse = response
            .json()
            .await
            .map_err(|e| FlagpoleError::InvalidRules(format!("invalid metadata response: {e}")))?;

        let document_url = format!(
            "{}{}",
            metadata.distribution.endpoint.trim_end_matches('/'),
            metadata.distribution.path
        );
        debug!(url = %document_url, "requesting rule set");
        let response = self.client.get(&document_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlagpoleError::fetch(
                format!("rule set request returned {status}"),
                Some(status.as_u16()),
            ));
        }
        let raw = response.text().await?;
        let document = RuleSet::parse(&raw)?;
        Ok(FetchedRules { raw, document })
    }
}

#[async_trait]
impl RuleFetcher for HttpFetcher {
    async fn get_rules(&self) -> Result<FetchedRules, FlagpoleError> {
        let mut backoff = BACKOFF_BASE;
        let mut last_error = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            match self.fetch_once().await {
                Ok(fetched) => {
                    debug!(
                        attempt,
                        flags = fetched.document.flags.len(),
                        version = %fetched.document.version,
                        "fetched rule set"
                    );
                    return Ok(fetched);
                }
                // A malformed document will not improve on retry.
                Err(error @ FlagpoleError::InvalidRules(_)) => return Err(error),
                Err(error) => {
                    warn!(attempt, %error, "rule fetch attempt failed");
                    last_error = Some(error);
                    if attempt < FETCH_ATTEMPTS {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| FlagpoleError::fetch("rule fetch attempts exhausted", None)))
    }

    async fn report_usage(
        &self,
        key: &str,
        context: Option<&Context>,
    ) -> Result<(), FlagpoleError> {
        let url = format!("{}/v1/environments/{}/usage", self.api_url, self.token);
        let response = self
            .client
            .post(&url)
            .json(&UsagePayload { key, context })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlagpoleError::fetch(
                format!("usage report returned {status}"),
                Some(status.as_u16()),
            ));
        }
        Ok(())
    }
}
