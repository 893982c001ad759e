// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Engine Error Types
 * Typed error taxonomy for the detection engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Per-probe transport failure. Recovered locally by the dispatch
/// framework: logged, counted, and skipped without aborting sibling probes.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Connection failed for {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Failed to read response body from {url}: {reason}")]
    BodyRead { url: String, reason: String },

    #[error("Response body from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("Invalid probe request: {0}")]
    InvalidRequest(String),
}

/// Engine-level errors surfaced to callers of the dispatch framework and
/// the audit driver.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A plugin analysis callback failed. This is a programming error in
    /// the plugin, fatal to that plugin's run but not to the process; it is
    /// surfaced only after the in-flight barrier completes.
    #[error("Analysis callback failed in plugin '{plugin}': {source}")]
    Analysis {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    /// The baseline request for an audit pass could not be fetched at all.
    #[error("Baseline request failed: {0}")]
    Baseline(#[from] TransportError),

    #[error("Invalid pattern in signature set: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Engine error: {0}")]
    General(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Timeout {
            url: "http://example.com/".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("http://example.com/"));
    }

    #[test]
    fn test_analysis_error_carries_plugin_name() {
        let err = EngineError::Analysis {
            plugin: "mail_injection".to_string(),
            source: anyhow::anyhow!("index out of bounds"),
        };
        assert!(err.to_string().contains("mail_injection"));
    }
}
