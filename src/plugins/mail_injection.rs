// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mail Injection Audit Plugin
 * IMAP/SMTP control-string injection against webmail parameters
 *
 * For every injectable parameter a string with special meaning to a mail
 * server is sent; a mail-server error in the response that was not on the
 * original page means the parameter reaches the mail backend unescaped.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;

use crate::audit::AuditCheck;
use crate::matcher::MultiIn;
use crate::types::Severity;

/// Error strings emitted by IMAP/SMTP backends when fed malformed input.
const MAIL_ERRORS: &[&str] = &[
    "Unexpected extra arguments to Select",
    "Bad or malformed request",
    "Could not access the following folders",
    "A000",
    "A001",
    "Invalid mailbox name",
    "To check for outside changes to the folder list go to the folders page",
];

static MAIL_ERROR_MATCHER: Lazy<MultiIn> =
    Lazy::new(|| MultiIn::new(MAIL_ERRORS.iter().copied()));

pub struct MailInjection;

impl MailInjection {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MailInjection {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditCheck for MailInjection {
    fn name(&self) -> &'static str {
        "mail_injection"
    }

    fn finding_name(&self) -> &'static str {
        "Mail injection vulnerability"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn payloads(&self) -> Vec<String> {
        vec![
            "\"".to_string(),
            "iDontExist".to_string(),
            String::new(),
        ]
    }

    fn match_response(&self, body: &str) -> Vec<String> {
        MAIL_ERROR_MATCHER
            .query(body)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
