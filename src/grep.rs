// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Grep Composition Layer
 * Passive signature scanning over already-fetched responses
 *
 * Grep plugins are pure computation on response bodies: no fan-out, no
 * probes. The runner feeds every observed text response to each
 * registered plugin in order, synchronously.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::knowledge_base::KnowledgeBase;
use crate::types::ResponseRecord;

/// A passive check over one observed response. Implementations hold their
/// compiled pattern sets and append findings to the knowledge base; the
/// convention is at most one finding per (response, category), first
/// match wins.
pub trait GrepPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn grep(&self, response: &ResponseRecord, kb: &KnowledgeBase);
}

/// Process-wide "already reported" set for matches that are deduplicated
/// globally by matched text (e.g. a server version banner repeated on
/// every error page of a site).
#[derive(Default)]
pub struct SeenSet {
    inner: Mutex<HashSet<String>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per distinct value.
    pub fn first_sighting(&self, value: &str) -> bool {
        self.inner.lock().insert(value.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Runs every registered grep plugin over each observed response.
pub struct GrepRunner {
    kb: Arc<KnowledgeBase>,
    plugins: Vec<Box<dyn GrepPlugin>>,
}

impl GrepRunner {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn GrepPlugin>) {
        debug!("[Grep] registered plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Feed one observed response to every plugin. Non-textual bodies are
    /// skipped outright; binary payloads are not signature material.
    pub fn grep(&self, response: &ResponseRecord) {
        if !response.is_text_or_html() {
            return;
        }
        for plugin in &self.plugins {
            plugin.grep(response, &self.kb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, Finding};
    use std::collections::HashMap;

    fn response(kind: ContentKind, body: &str) -> ResponseRecord {
        ResponseRecord {
            id: 1,
            url: "http://moth/page".to_string(),
            status_code: 200,
            headers: HashMap::new(),
            body: body.to_string(),
            content_kind: kind,
            duration_ms: 1,
        }
    }

    struct CountingPlugin;

    impl GrepPlugin for CountingPlugin {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn grep(&self, response: &ResponseRecord, kb: &KnowledgeBase) {
            kb.append(
                self.name(),
                "seen",
                Finding::info(self.name(), "seen", "Observed").with_response_id(response.id),
            );
        }
    }

    #[test]
    fn test_runner_feeds_text_responses() {
        let kb = Arc::new(KnowledgeBase::new());
        let mut runner = GrepRunner::new(Arc::clone(&kb));
        runner.register(Box::new(CountingPlugin));

        runner.grep(&response(ContentKind::Html, "<html>"));
        runner.grep(&response(ContentKind::PlainText, "text"));
        assert_eq!(kb.get("counting", "seen").len(), 2);
    }

    #[test]
    fn test_runner_skips_binary_responses() {
        let kb = Arc::new(KnowledgeBase::new());
        let mut runner = GrepRunner::new(Arc::clone(&kb));
        runner.register(Box::new(CountingPlugin));

        runner.grep(&response(ContentKind::Binary, "\x00\x01"));
        runner.grep(&response(ContentKind::Unknown, "???"));
        assert!(kb.get("counting", "seen").is_empty());
    }

    #[test]
    fn test_seen_set_fires_once_per_value() {
        let seen = SeenSet::new();
        assert!(seen.first_sighting("Apache/2.2.3"));
        assert!(!seen.first_sighting("Apache/2.2.3"));
        assert!(seen.first_sighting("Apache/2.4.1"));
        assert_eq!(seen.len(), 2);
    }
}
