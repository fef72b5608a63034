//! Elasticsearch REST adapter for the audit index ports.

use std::time::Duration;

use async_trait::async_trait;
use auditsearch_application::{
    AuditIndexAdmin, AuditIndexConfig, AuditSearchIndex, BulkDeleteSummary,
};
use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{IndexDocument, IndexName, IndexSettings, MappedField, RetentionQuery};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;
use url::Url;

mod requests;

use requests::{
    alias_actions_body, bulk_delete_body, bulk_failure_count, create_index_body, mapping_body,
    normalize_host, search_excess_body, search_hit_ids,
};

/// Audit index backed by one or more Elasticsearch hosts.
///
/// Requests go to the first reachable host; transport failures fall through
/// to the next host in order.
#[derive(Clone)]
pub struct ElasticsearchAuditIndex {
    http_client: reqwest::Client,
    hosts: Vec<Url>,
}

impl ElasticsearchAuditIndex {
    /// Creates an adapter over the given hosts.
    pub fn new(http_client: reqwest::Client, hosts: &[String]) -> AppResult<Self> {
        let hosts = hosts
            .iter()
            .map(|host| normalize_host(host))
            .collect::<AppResult<Vec<_>>>()?;

        if hosts.is_empty() {
            return Err(AppError::Validation(
                "at least one search host is required".to_owned(),
            ));
        }

        Ok(Self { http_client, hosts })
    }

    /// Creates an adapter with a client honoring the configured request timeout.
    pub fn from_config(config: &AuditIndexConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build search http client: {error}"))
            })?;

        Self::new(http_client, &config.hosts)
    }

    /// Returns the normalized host list.
    #[must_use]
    pub fn hosts(&self) -> &[Url] {
        &self.hosts
    }

    async fn send<F>(&self, operation: &str, path: &str, build: F) -> AppResult<reqwest::Response>
    where
        F: Fn(&reqwest::Client, Url) -> reqwest::RequestBuilder,
    {
        let mut last_error: Option<String> = None;

        for host in &self.hosts {
            let url = host.join(path).map_err(|error| {
                AppError::Validation(format!("invalid search path '{path}': {error}"))
            })?;

            match build(&self.http_client, url).send().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    warn!(host = %host, operation, error = %error, "search host request failed");
                    last_error = Some(format!("{host}: {error}"));
                }
            }
        }

        Err(AppError::Unavailable(format!(
            "no search host reachable for {operation}: {}",
            last_error.unwrap_or_else(|| "no hosts configured".to_owned())
        )))
    }

    async fn send_checked<F>(&self, operation: &str, path: &str, build: F) -> AppResult<Value>
    where
        F: Fn(&reqwest::Client, Url) -> reqwest::RequestBuilder,
    {
        let response = self.send(operation, path, build).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());

        if !status.is_success() {
            return Err(status_error(operation, status, body.as_str()));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(body.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid {operation} response body: {error}"))
        })
    }
}

fn status_error(operation: &str, status: StatusCode, body: &str) -> AppError {
    let message = format!("{operation} failed with status {status}: {body}");
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::BAD_REQUEST => AppError::Conflict(message),
        status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            AppError::Unavailable(message)
        }
        _ => AppError::Internal(message),
    }
}

#[async_trait]
impl AuditSearchIndex for ElasticsearchAuditIndex {
    async fn index_document(&self, index: &IndexName, document: &IndexDocument) -> AppResult<()> {
        let path = format!("{index}/_doc/{}", document.id());
        self.send_checked("index document", path.as_str(), |client, url| {
            client.put(url).json(document.record())
        })
        .await
        .map(|_| ())
    }

    async fn search_excess_documents(
        &self,
        index: &IndexName,
        query: &RetentionQuery,
    ) -> AppResult<Vec<String>> {
        let path = format!("{index}/_search");
        let body = search_excess_body(query);
        let response = self
            .send_checked("search excess audits", path.as_str(), |client, url| {
                client.post(url).json(&body)
            })
            .await?;

        Ok(search_hit_ids(&response))
    }

    async fn bulk_delete(
        &self,
        index: &IndexName,
        document_ids: &[String],
    ) -> AppResult<BulkDeleteSummary> {
        let body = bulk_delete_body(index, document_ids)?;
        let response = self
            .send_checked("bulk delete audits", "_bulk", |client, url| {
                client
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                    .body(body.clone())
            })
            .await?;

        Ok(BulkDeleteSummary {
            requested: document_ids.len(),
            failed: bulk_failure_count(&response),
        })
    }
}

#[async_trait]
impl AuditIndexAdmin for ElasticsearchAuditIndex {
    async fn index_exists(&self, index: &IndexName) -> AppResult<bool> {
        let response = self
            .send("check index", index.as_str(), |client, url| client.head(url))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error("check index", status, "")),
        }
    }

    async fn create_index(&self, index: &IndexName, settings: IndexSettings) -> AppResult<()> {
        let body = create_index_body(settings);
        self.send_checked("create index", index.as_str(), |client, url| {
            client.put(url).json(&body)
        })
        .await
        .map(|_| ())
    }

    async fn put_mapping(&self, index: &IndexName, fields: &[MappedField]) -> AppResult<()> {
        let path = format!("{index}/_mapping");
        let body = mapping_body(fields);
        self.send_checked("put mapping", path.as_str(), |client, url| {
            client.put(url).json(&body)
        })
        .await
        .map(|_| ())
    }

    async fn add_alias(&self, index: &IndexName, alias: &str) -> AppResult<()> {
        let body = alias_actions_body(index, alias);
        self.send_checked("update aliases", "_aliases", |client, url| {
            client.post(url).json(&body)
        })
        .await
        .map(|_| ())
    }

    async fn delete_index(&self, index: &IndexName) -> AppResult<()> {
        self.send_checked("delete index", index.as_str(), |client, url| {
            client.delete(url)
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests;
