// src/services/matsuri.rs

//! HTTP client for the matsurihi.me MLTD API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    ApiConfig, Event, EventsQuery, RankingBorders, RankingLog, RankingLogsOptions, RankingType,
};
use crate::services::RankingSource;
use crate::utils::http::{calculate_backoff, create_async_client, is_retryable};

/// Typed GET wrapper around the remote API.
pub struct MatsuriClient {
    client: Client,
    config: ApiConfig,
}

impl MatsuriClient {
    /// Create a client for `config.base_url`.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;
        Ok(Self {
            client: create_async_client(config)?,
            config: config.clone(),
        })
    }

    /// Build `{base_url}/{path}?{params}`.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, headers: &[(&str, String)]) -> Result<T> {
        let max_retries = self.config.max_retries;
        let mut retry = 0;

        loop {
            log::debug!("GET {}", url);

            let mut request = self.client.get(url.clone());
            for (name, value) in headers {
                request = request.header(*name, value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await?;
                        return Ok(serde_json::from_slice(&bytes)?);
                    }
                    if !is_retryable(status) || retry >= max_retries {
                        return Err(AppError::Api {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    log::warn!(
                        "GET {} returned {} (attempt {}/{})",
                        url,
                        status,
                        retry + 1,
                        max_retries + 1
                    );
                }
                Err(e) => {
                    if retry >= max_retries {
                        return Err(AppError::Http(e));
                    }
                    log::warn!(
                        "GET {} failed: {} (attempt {}/{})",
                        url,
                        e,
                        retry + 1,
                        max_retries + 1
                    );
                }
            }

            tokio::time::sleep(calculate_backoff(&self.config, retry)).await;
            retry += 1;
        }
    }

    fn log_params(options: Option<&RankingLogsOptions>) -> (Vec<(&'static str, String)>, Vec<(&'static str, String)>) {
        let mut params = Vec::new();
        let mut headers = Vec::new();
        if let Some(options) = options {
            if let Some(since) = options.since {
                params.push(("since", since.to_rfc3339()));
            }
            if let Some(etag) = options.if_none_match.as_ref().filter(|e| !e.is_empty()) {
                headers.push(("If-None-Match", etag.clone()));
            }
        }
        (params, headers)
    }
}

#[async_trait]
impl RankingSource for MatsuriClient {
    async fn list_events(&self, query: &EventsQuery) -> Result<Vec<Event>> {
        let url = self.endpoint("events", &query.params())?;
        self.get_json(url, &[]).await
    }

    async fn get_event(&self, event_id: u32) -> Result<Event> {
        let url = self.endpoint(&format!("events/{event_id}"), &[])?;
        self.get_json(url, &[]).await
    }

    async fn get_ranking_borders(&self, event_id: u32) -> Result<RankingBorders> {
        let url = self.endpoint(&format!("events/{event_id}/rankings/borders"), &[])?;
        self.get_json(url, &[]).await
    }

    async fn get_ranking_logs(
        &self,
        event_id: u32,
        ranking_type: RankingType,
        border: u32,
        options: Option<&RankingLogsOptions>,
    ) -> Result<Vec<RankingLog>> {
        let (params, headers) = Self::log_params(options);
        let url = self.endpoint(
            &format!("events/{event_id}/rankings/{ranking_type}/logs/{border}"),
            &params,
        )?;
        self.get_json(url, &headers).await
    }

    async fn get_idol_ranking_logs(
        &self,
        event_id: u32,
        border: u32,
        idol_ids: &[u32],
        options: Option<&RankingLogsOptions>,
    ) -> Result<BTreeMap<u32, Vec<RankingLog>>> {
        let (params, headers) = Self::log_params(options);

        let mut logs = BTreeMap::new();
        for &idol_id in idol_ids {
            let url = self.endpoint(
                &format!(
                    "events/{event_id}/rankings/{}/{idol_id}/logs/{border}",
                    RankingType::IdolPoint
                ),
                &params,
            )?;
            match self.get_json::<Vec<RankingLog>>(url, &headers).await {
                Ok(idol_logs) => {
                    logs.insert(idol_id, idol_logs);
                }
                Err(e) => log::warn!(
                    "Failed to get idol ranking logs for event {} idol {} with border {}: {}",
                    event_id,
                    idol_id,
                    border,
                    e
                ),
            }
        }
        Ok(logs)
    }
}
