// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Haavi Detection Engine
 * Probe generation, concurrent dispatch, signature matching and the
 * shared finding store for black-box web application assessment
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod errors;
pub mod types;

// Request model and probe generation
pub mod mutation;
pub mod request_template;

// Signature matching engine
pub mod matcher;

// Shared finding store
pub mod knowledge_base;

// Concurrent probe dispatch
pub mod dispatch;

// Composition layers for active and passive checks
pub mod audit;
pub mod grep;

// Default transport adapter
pub mod http_client;

// Bundled detection plugins
pub mod plugins;
