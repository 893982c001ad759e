// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mutation Engine
 * Derives concrete probe requests from a template and a payload set
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;

use crate::request_template::{Mutant, RequestTemplate};

/// Lazy, restartable sequence of mutants: one per injectable point ×
/// payload, point-major, payload-minor. Cloning yields an independent
/// cursor, so the same sequence can be walked again; nothing is buffered
/// beyond the shared template and payload list, so callers can begin
/// dispatching before generation completes.
#[derive(Debug, Clone)]
pub struct Mutants {
    template: Arc<RequestTemplate>,
    payloads: Arc<Vec<String>>,
    original_response_body: Option<Arc<String>>,
    point_idx: usize,
    payload_idx: usize,
}

impl Mutants {
    /// Total number of mutants this sequence will yield.
    pub fn expected_count(&self) -> usize {
        self.template.params.len() * self.payloads.len()
    }
}

impl Iterator for Mutants {
    type Item = Mutant;

    fn next(&mut self) -> Option<Mutant> {
        if self.payloads.is_empty() {
            return None;
        }
        let param = self.template.params.get(self.point_idx)?;
        let payload = &self.payloads[self.payload_idx];

        let mutant = Mutant {
            template: (*self.template).clone(),
            point: param.name.clone(),
            payload: payload.clone(),
            original_response_body: self
                .original_response_body
                .as_ref()
                .map(|b| (**b).clone()),
        };

        self.payload_idx += 1;
        if self.payload_idx == self.payloads.len() {
            self.payload_idx = 0;
            self.point_idx += 1;
        }
        Some(mutant)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .expected_count()
            .saturating_sub(self.point_idx * self.payloads.len() + self.payload_idx);
        (remaining, Some(remaining))
    }
}

/// Build the mutant sequence for an audit pass. A template with zero
/// injectable points yields an empty sequence. `original_response_body`
/// is attached to every mutant so analysis can rule out signatures that
/// were already present before injection.
pub fn create_mutants(
    template: &RequestTemplate,
    payloads: Vec<String>,
    original_response_body: Option<String>,
) -> Mutants {
    Mutants {
        template: Arc::new(template.clone()),
        payloads: Arc::new(payloads),
        original_response_body: original_response_body.map(Arc::new),
        point_idx: 0,
        payload_idx: 0,
    }
}
