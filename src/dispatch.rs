// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Dispatch Framework
 * Bounded concurrent probe fan-out with a serialized analysis consumer
 *
 * Probes are pulled lazily from the mutant sequence into a bounded pool
 * of in-flight sends; completed (mutant, response) pairs flow back to a
 * single consumer loop which invokes the plugin's analysis callback.
 * Routing every result through one consumer serializes analysis without a
 * per-plugin lock: the check-then-append a callback performs against the
 * knowledge base can never race with itself.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{EngineError, TransportError};
use crate::request_template::{Mutant, ProbeRequest};
use crate::types::ResponseRecord;

/// The transport collaborator boundary. Retries, proxying and TLS are its
/// responsibility; the engine treats `send` as an opaque, possibly slow
/// call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ProbeRequest) -> Result<ResponseRecord, TransportError>;
}

/// Outcome counters for one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Mutants pulled from the sequence and handed to the pool.
    pub submitted: usize,
    /// Probes that completed send and reached analysis.
    pub completed: usize,
    /// Probes dropped on a transport error.
    pub transport_errors: usize,
    /// True when the pass was cut short by cancellation.
    pub cancelled: bool,
}

/// Runs probe batches for one plugin: a bounded worker pool over the
/// mutant sequence, one analysis consumer, and a completion barrier.
pub struct Dispatcher {
    concurrency: usize,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(concurrency: usize) -> Self {
        Self::with_cancellation(concurrency, CancellationToken::new())
    }

    pub fn with_cancellation(concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    /// Token observed between probe completions; cancelling it abandons
    /// in-flight work and returns promptly without the full barrier.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dispatch every mutant and analyze every completed response.
    ///
    /// Guarantees, absent cancellation:
    /// - `analyze` is invoked exactly once per mutant whose send succeeded,
    ///   and invocations never overlap;
    /// - the call returns only after every submitted probe has completed
    ///   both send and analysis (completion barrier);
    /// - a transport error on one probe is logged and skipped without
    ///   aborting sibling probes or the barrier.
    ///
    /// An `analyze` error is a plugin bug: the remaining probes are still
    /// driven to completion (without further analysis) so the barrier
    /// holds, then the error is surfaced as `EngineError::Analysis`.
    pub async fn run<T, A>(
        &self,
        plugin: &str,
        mutants: impl Iterator<Item = Mutant>,
        transport: &T,
        mut analyze: A,
    ) -> Result<DispatchStats, EngineError>
    where
        T: Transport + ?Sized,
        A: FnMut(&Mutant, &ResponseRecord) -> anyhow::Result<()>,
    {
        let submitted = AtomicUsize::new(0);
        let mut stream = stream::iter(mutants)
            .map(|mutant| {
                submitted.fetch_add(1, Ordering::Relaxed);
                async move {
                    let request = mutant.request();
                    let result = transport.send(&request).await;
                    (mutant, result)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut stats = DispatchStats::default();
        let mut analysis_error: Option<anyhow::Error> = None;

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("[Dispatch] {}: cancelled, abandoning in-flight probes", plugin);
                    stats.cancelled = true;
                    break;
                }
                item = stream.next() => item,
            };

            let Some((mutant, result)) = item else {
                break;
            };

            match result {
                Ok(response) => {
                    stats.completed += 1;
                    if analysis_error.is_none() {
                        if let Err(e) = analyze(&mutant, &response) {
                            warn!("[Dispatch] {}: analysis callback failed: {:#}", plugin, e);
                            analysis_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    // A failed probe means "not detected", never "proven
                    // absent"; it must not abort the rest of the batch.
                    debug!("[Dispatch] {}: probe failed: {}", plugin, e);
                    stats.transport_errors += 1;
                }
            }
        }

        stats.submitted = submitted.load(Ordering::Relaxed);
        debug!(
            "[Dispatch] {}: {} submitted, {} completed, {} transport errors",
            plugin, stats.submitted, stats.completed, stats.transport_errors
        );

        if let Some(source) = analysis_error {
            return Err(EngineError::Analysis {
                plugin: plugin.to_string(),
                source,
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::create_mutants;
    use crate::request_template::{Param, RequestTemplate};
    use crate::types::ContentKind;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted transport: echoes the request URL, optionally sleeping or
    /// failing, and tracks the in-flight high-water mark.
    struct ScriptedTransport {
        delay: Duration,
        fail_if_url_contains: Option<String>,
        next_id: AtomicU64,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                fail_if_url_contains: None,
                next_id: AtomicU64::new(1),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, needle: &str) -> Self {
            self.fail_if_url_contains = Some(needle.to_string());
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ProbeRequest) -> Result<ResponseRecord, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(needle) = &self.fail_if_url_contains {
                if request.url.contains(needle) {
                    return Err(TransportError::Connect {
                        url: request.url.clone(),
                        reason: "scripted failure".to_string(),
                    });
                }
            }
            Ok(ResponseRecord {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                url: request.url.clone(),
                status_code: 200,
                headers: HashMap::new(),
                body: format!("echo: {}", request.url),
                content_kind: ContentKind::Html,
                duration_ms: 1,
            })
        }
    }

    fn template(points: usize) -> RequestTemplate {
        let mut t = RequestTemplate::get("http://moth/test.php");
        for i in 0..points {
            t = t.with_param(Param::query(&format!("p{}", i), "orig"));
        }
        t
    }

    #[tokio::test]
    async fn test_barrier_analyzes_every_mutant() {
        let transport = ScriptedTransport::new(Duration::from_millis(1));
        let payloads: Vec<String> = (0..5).map(|i| format!("pl{}", i)).collect();
        let mutants = create_mutants(&template(4), payloads, None);
        let expected = mutants.expected_count();

        let mut analyzed = 0usize;
        let dispatcher = Dispatcher::new(10);
        let stats = dispatcher
            .run("test", mutants, &transport, |_, _| {
                analyzed += 1;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(analyzed, expected);
        assert_eq!(stats.submitted, expected);
        assert_eq!(stats.completed, expected);
        assert_eq!(stats.transport_errors, 0);
        assert!(!stats.cancelled);
    }

    #[tokio::test]
    async fn test_pool_bound_is_respected() {
        let transport = ScriptedTransport::new(Duration::from_millis(20));
        let payloads: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let mutants = create_mutants(&template(1), payloads, None);

        let dispatcher = Dispatcher::new(4);
        dispatcher
            .run("test", mutants, &transport, |_, _| Ok(()))
            .await
            .unwrap();

        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 4);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_abort_siblings() {
        // Payload "boom" fails in transport; the other probes still
        // complete and reach analysis.
        let transport = ScriptedTransport::new(Duration::from_millis(1)).failing_on("boom");
        let payloads = vec!["ok1".to_string(), "boom".to_string(), "ok2".to_string()];
        let mutants = create_mutants(&template(1), payloads, None);

        let mut analyzed = 0usize;
        let dispatcher = Dispatcher::new(3);
        let stats = dispatcher
            .run("test", mutants, &transport, |_, _| {
                analyzed += 1;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.transport_errors, 1);
        assert_eq!(analyzed, 2);
    }

    #[tokio::test]
    async fn test_analysis_error_surfaces_after_barrier() {
        let transport = ScriptedTransport::new(Duration::from_millis(1));
        let payloads: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let mutants = create_mutants(&template(1), payloads, None);

        let mut calls = 0usize;
        let dispatcher = Dispatcher::new(2);
        let err = dispatcher
            .run("broken_plugin", mutants, &transport, |_, _| {
                calls += 1;
                if calls == 3 {
                    anyhow::bail!("plugin bug");
                }
                Ok(())
            })
            .await
            .unwrap_err();

        match err {
            EngineError::Analysis { plugin, .. } => assert_eq!(plugin, "broken_plugin"),
            other => panic!("unexpected error: {other}"),
        }
        // Analysis stopped at the failure, but every probe was still sent.
        assert_eq!(calls, 3);
        assert_eq!(transport.next_id.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_cancellation_returns_promptly() {
        let transport = ScriptedTransport::new(Duration::from_secs(30));
        let payloads: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let mutants = create_mutants(&template(1), payloads, None);

        let dispatcher = Dispatcher::new(5);
        let token = dispatcher.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let stats = dispatcher
            .run("test", mutants, &transport, |_, _| Ok(()))
            .await
            .unwrap();

        assert!(stats.cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_empty_mutant_sequence() {
        let transport = ScriptedTransport::new(Duration::from_millis(1));
        let mutants = create_mutants(&template(0), vec!["x".to_string()], None);

        let dispatcher = Dispatcher::new(10);
        let stats = dispatcher
            .run("test", mutants, &transport, |_, _| Ok(()))
            .await
            .unwrap();
        assert_eq!(stats, DispatchStats::default());
    }
}
