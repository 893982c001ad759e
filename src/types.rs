// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request_template::Mutant;

/// Finding severity, reported only for vulnerability findings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// Coarse content-type classification of a response body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    PlainText,
    Json,
    Xml,
    Binary,
    Unknown,
}

impl ContentKind {
    /// Classify from a Content-Type header value.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("text/html") || ct.contains("application/xhtml") {
            ContentKind::Html
        } else if ct.contains("application/json") {
            ContentKind::Json
        } else if ct.contains("xml") {
            ContentKind::Xml
        } else if ct.starts_with("text/") {
            ContentKind::PlainText
        } else if ct.is_empty() {
            ContentKind::Unknown
        } else {
            ContentKind::Binary
        }
    }
}

/// A completed probe response as handed to analysis callbacks. Produced by
/// the transport collaborator; read-only inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    /// Process-unique response id, used to correlate findings with traffic.
    pub id: u64,
    pub url: String,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub content_kind: ContentKind,
    pub duration_ms: u64,
}

impl ResponseRecord {
    /// Grep plugins only inspect textual bodies.
    pub fn is_text_or_html(&self) -> bool {
        matches!(
            self.content_kind,
            ContentKind::Html | ContentKind::PlainText | ContentKind::Xml | ContentKind::Json
        )
    }
}

/// Engine tuning knobs shared by audit drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Bounded worker pool size for concurrent probe dispatch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_concurrency() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_ms: default_timeout_ms(),
            max_body_size: default_max_body_size(),
            user_agent: None,
        }
    }
}

/// Whether a finding is a confirmed flaw or an informational disclosure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FindingKind {
    Vulnerability { severity: Severity },
    Info,
}

/// A recorded detection result. Immutable once appended to the knowledge
/// base; the reporting collaborator reads these at scan end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    /// Name of the plugin that produced this finding.
    pub plugin: String,
    /// Finding category, the second half of the knowledge base key.
    pub category: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: FindingKind,
    pub description: String,
    pub url: String,
    /// Id of the response that triggered the detection.
    pub response_id: u64,
    /// Substrings of the response body worth highlighting in a report.
    pub highlight: Vec<String>,
    /// The probe that triggered the detection, absent for passive findings.
    pub mutant: Option<Mutant>,
    pub discovered_at: String,
}

impl Finding {
    pub fn vulnerability(plugin: &str, category: &str, name: &str, severity: Severity) -> Self {
        Self::new(plugin, category, name, FindingKind::Vulnerability { severity })
    }

    pub fn info(plugin: &str, category: &str, name: &str) -> Self {
        Self::new(plugin, category, name, FindingKind::Info)
    }

    fn new(plugin: &str, category: &str, name: &str, kind: FindingKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plugin: plugin.to_string(),
            category: category.to_string(),
            name: name.to_string(),
            kind,
            description: String::new(),
            url: String::new(),
            response_id: 0,
            highlight: Vec::new(),
            mutant: None,
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_response_id(mut self, id: u64) -> Self {
        self.response_id = id;
        self
    }

    pub fn with_highlight(mut self, snippet: impl Into<String>) -> Self {
        self.highlight.push(snippet.into());
        self
    }

    pub fn with_mutant(mut self, mutant: Mutant) -> Self {
        self.mutant = Some(mutant);
        self
    }

    pub fn severity(&self) -> Option<Severity> {
        match self.kind {
            FindingKind::Vulnerability { severity } => Some(severity),
            FindingKind::Info => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_classification() {
        assert_eq!(
            ContentKind::from_content_type("text/html; charset=utf-8"),
            ContentKind::Html
        );
        assert_eq!(
            ContentKind::from_content_type("application/json"),
            ContentKind::Json
        );
        assert_eq!(
            ContentKind::from_content_type("image/png"),
            ContentKind::Binary
        );
        assert_eq!(ContentKind::from_content_type(""), ContentKind::Unknown);
    }

    #[test]
    fn test_finding_builder() {
        let f = Finding::vulnerability("mail_injection", "mail_injection", "Mail injection", Severity::Medium)
            .with_url("http://example.com/mail?folder=x")
            .with_response_id(7)
            .with_highlight("A000");

        assert_eq!(f.severity(), Some(Severity::Medium));
        assert_eq!(f.response_id, 7);
        assert_eq!(f.highlight, vec!["A000".to_string()]);
        assert!(f.mutant.is_none());
    }

    #[test]
    fn test_info_has_no_severity() {
        let f = Finding::info("error_pages", "error_page", "Descriptive error page");
        assert_eq!(f.severity(), None);
    }

    #[test]
    fn test_finding_serializes_camel_case() {
        let f = Finding::info("error_pages", "server", "Version disclosure").with_response_id(3);
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"responseId\":3"));
        assert!(json.contains("\"kind\":\"info\""));
    }
}
