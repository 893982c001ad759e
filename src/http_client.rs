// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Transport Adapter
 * Default reqwest-backed implementation of the Transport boundary
 *
 * The engine treats send as an opaque call; retries, proxying and TLS
 * policy belong to whatever sits behind this adapter.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::dispatch::Transport;
use crate::errors::TransportError;
use crate::request_template::ProbeRequest;
use crate::types::{ContentKind, ResponseRecord, ScanConfig};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; haavi/1.0)";

/// Process-wide response id counter, so findings can reference traffic
/// unambiguously across sessions.
static NEXT_RESPONSE_ID: AtomicU64 = AtomicU64::new(1);

pub struct HttpClient {
    client: Client,
    timeout: Duration,
    max_body_size: usize,
}

impl HttpClient {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(
                config
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            timeout,
            max_body_size: config.max_body_size,
        })
    }

    fn classify(err: reqwest::Error, url: &str, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            TransportError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &ProbeRequest) -> Result<ResponseRecord, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("method {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body.clone());
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify(e, &request.url, self.timeout))?;

        let status_code = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_string(), v.to_string());
            }
        }
        let content_kind = ContentKind::from_content_type(
            headers.get("content-type").map(String::as_str).unwrap_or(""),
        );

        let bytes = response.bytes().await.map_err(|e| TransportError::BodyRead {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        if bytes.len() > self.max_body_size {
            return Err(TransportError::BodyTooLarge {
                url: request.url.clone(),
                limit: self.max_body_size,
            });
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();
        let duration_ms = started.elapsed().as_millis() as u64;

        let record = ResponseRecord {
            id: NEXT_RESPONSE_ID.fetch_add(1, Ordering::Relaxed),
            url: request.url.clone(),
            status_code,
            headers,
            body,
            content_kind,
            duration_ms,
        };
        debug!(
            "[Http] {} {} -> {} ({} bytes, {}ms)",
            request.method,
            request.url,
            record.status_code,
            record.body.len(),
            record.duration_ms
        );
        Ok(record)
    }
}
