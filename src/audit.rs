// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Composition Layer
 * Drives mutation, dispatch and the knowledge base for injection checks
 *
 * Per injectable point the driver walks a small state machine:
 * UNTESTED -> PROBED -> REPORTED, where REPORTED is terminal. Once a
 * point is reported, analysis of later probes against that point is a
 * no-op, so a flaw triggered by several payloads yields exactly one
 * finding. Which payload gets recorded depends on probe completion order
 * under concurrency; the count is deterministic, the payload is not.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatch::{DispatchStats, Dispatcher, Transport};
use crate::errors::EngineError;
use crate::knowledge_base::KnowledgeBase;
use crate::mutation::create_mutants;
use crate::request_template::{PointId, RequestTemplate};
use crate::types::{Finding, ScanConfig, Severity};

/// Per-point audit progress. `Reported` is terminal; a point whose probes
/// all complete without a match stays `Probed` (clean by omission).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointState {
    Untested,
    Probed,
    Reported,
}

/// An active-testing check: supplies the payload set and decides whether
/// a response body carries the vulnerability signature.
pub trait AuditCheck: Send + Sync {
    /// Plugin name, the knowledge base producer key.
    fn name(&self) -> &'static str;

    /// Finding category, the second half of the knowledge base key.
    fn category(&self) -> &'static str {
        self.name()
    }

    fn finding_name(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// Ordered payload sequence for this check.
    fn payloads(&self) -> Vec<String>;

    /// Every signature the body carries, in signature-set order. The
    /// driver reports the first one absent from the baseline body.
    fn match_response(&self, body: &str) -> Vec<String>;
}

/// One audit pass: state per injectable point plus the shared stores.
pub struct AuditRunner {
    kb: Arc<KnowledgeBase>,
    dispatcher: Dispatcher,
    states: HashMap<PointId, PointState>,
}

impl AuditRunner {
    pub fn new(kb: Arc<KnowledgeBase>, config: &ScanConfig) -> Self {
        Self {
            kb,
            dispatcher: Dispatcher::new(config.concurrency),
            states: HashMap::new(),
        }
    }

    /// Runner wired to an externally owned cancellation token, so an
    /// interrupt can abandon in-flight probes across plugins.
    pub fn with_dispatcher(kb: Arc<KnowledgeBase>, dispatcher: Dispatcher) -> Self {
        Self {
            kb,
            dispatcher,
            states: HashMap::new(),
        }
    }

    pub fn point_state(&self, point: &PointId) -> PointState {
        self.states
            .get(point)
            .copied()
            .unwrap_or(PointState::Untested)
    }

    /// Audit one request template with one check.
    ///
    /// Fetches the baseline (unmutated) response, derives the mutants,
    /// skips points already reported, then dispatches and analyzes. A
    /// signature only counts when it is absent from the baseline body:
    /// an error string the page always shows is not injection evidence.
    pub async fn audit<T>(
        &mut self,
        check: &dyn AuditCheck,
        template: &RequestTemplate,
        transport: &T,
    ) -> Result<DispatchStats, EngineError>
    where
        T: Transport + ?Sized,
    {
        debug!("[Audit] {} is testing: {}", check.name(), template.url);

        let baseline = transport.send(&template.request()).await?;
        let mutants = create_mutants(template, check.payloads(), Some(baseline.body));

        // Points already reported (in this pass or a previous one against
        // the same template) get no further probes at all.
        let reported: HashSet<PointId> = self
            .states
            .iter()
            .filter(|(_, state)| **state == PointState::Reported)
            .map(|(id, _)| id.clone())
            .collect();
        let kb_gate = Arc::clone(&self.kb);
        let (name, category) = (check.name(), check.category());
        let pending = mutants.filter(move |m| {
            let id = m.point_id();
            if reported.contains(&id) {
                return false;
            }
            !kb_gate.has_any(name, category, |f| {
                f.mutant.as_ref().map(|fm| fm.point_id()).as_ref() == Some(&id)
            })
        });

        let kb = Arc::clone(&self.kb);
        let states = &mut self.states;
        let stats = self
            .dispatcher
            .run(check.name(), pending, transport, |mutant, response| {
                let id = mutant.point_id();
                let state = states.entry(id.clone()).or_insert(PointState::Untested);
                if *state == PointState::Reported {
                    return Ok(());
                }

                let signature = check
                    .match_response(&response.body)
                    .into_iter()
                    .find(|sig| !mutant.original_body().contains(sig.as_str()));

                match signature {
                    Some(signature) => {
                        info!(
                            "[Audit] {} found '{}' at {}",
                            check.name(),
                            signature,
                            mutant.found_at()
                        );
                        let finding = Finding::vulnerability(
                            check.name(),
                            check.category(),
                            check.finding_name(),
                            check.severity(),
                        )
                        .with_description(format!(
                            "{} was found at: {}",
                            check.finding_name(),
                            mutant.found_at()
                        ))
                        .with_url(response.url.clone())
                        .with_response_id(response.id)
                        .with_highlight(signature)
                        .with_mutant(mutant.clone());

                        kb.append(check.name(), check.category(), finding);
                        *state = PointState::Reported;
                    }
                    None => {
                        *state = PointState::Probed;
                    }
                }
                Ok(())
            })
            .await?;

        Ok(stats)
    }
}
