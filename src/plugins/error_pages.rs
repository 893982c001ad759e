// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Page Grep Plugin
 * Flags descriptive error pages and server-version disclosure
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use tracing::debug;

use crate::grep::{GrepPlugin, SeenSet};
use crate::knowledge_base::KnowledgeBase;
use crate::matcher::{MultiIn, MultiRe};
use crate::types::{Finding, ResponseRecord};

/// Signatures of descriptive error pages across common stacks.
const ERROR_PAGES: &[&str] = &[
    "<H1>Error page exception</H1>",
    "<h2> <i>Runtime Error</i> </h2></span>",
    "<h2> <i>Access is denied</i> </h2></span>",
    "<H3>Original Exception: </H3>",
    "Server object error",
    "invalid literal for int()",
    "exceptions.ValueError",
    "<font face=\"Arial\" size=2>Type mismatch: ",
    "[an error occurred while processing this directive]",
    // VBScript
    "<p>Microsoft VBScript runtime </font>",
    "<font face=\"Arial\" size=2>error '800a000d'</font>",
    // nwwcgi
    "<TITLE>nwwcgi Error",
    // ASP
    "<font face=\"Arial\" size=2>error '800a0005'</font>",
    "Operation is not allowed when the object is closed.",
    "<p>Active Server Pages</font> <font face=\"Arial\" size=2>error 'ASP 0126'</font>",
    // ASPX
    "<b> Description: </b>An unhandled exception occurred during the execution of the current web request",
    // Struts
    "] does not contain handler parameter named",
    // PHP
    "<b>Warning</b>: ",
    "No row with the given identifier",
    "open_basedir restriction in effect",
    "eval()'d code</b> on line <b>",
    "Cannot execute a blank command in",
    "Fatal error</b>:  preg_replace",
    "thrown in <b>",
    "#0 {main}",
    "Stack trace:",
    "</b> on line <b>",
    // Python
    "PythonHandler django.core.handlers.modpython",
    "t = loader.get_template(template_name) # You need to create a 404.html template.",
    "<h2>Traceback <span>(innermost last)</span></h2>",
    // Java
    "[java.lang.",
    "class java.lang.",
    "java.lang.NullPointerException",
    "java.rmi.ServerException",
    "at java.lang.",
    "onclick=\"toggle('full exception chain stacktrace')\"",
    "at org.apache.catalina",
    "at org.apache.coyote.",
    "at org.apache.tomcat.",
    "at org.apache.jasper.",
    // Ruby
    "<h1 class=\"error_title\">Ruby on Rails application could not be started</h1>",
    // Coldfusion
    "<title>Error Occurred While Processing Request</title></head><body><p></p>",
    "<HTML><HEAD><TITLE>Error Occurred While Processing Request</TITLE></HEAD><BODY><HR><H3>",
    "<TR><TD><H4>Error Diagnostic Information</H4><P><P>",
    "Server.Execute Error",
    // IIS
    "<h2 style=\"font:8pt/11pt verdana; color:000000\">HTTP 403.6 - Forbidden: IP address rejected<br>",
    "<TITLE>500 Internal Server Error</TITLE>",
];

/// (pattern, server) pairs pulling a version banner out of an error page.
const VERSION_REGEX: &[(&str, &str)] = &[
    (r"<address>(.*?)</address>", "Apache"),
    (r#"<HR size="1" noshade="noshade"><h3>(.*?)</h3></body>"#, "Apache Tomcat"),
    (
        r#"<a href="http://www\.microsoft\.com/ContentRedirect\.asp\?prd=iis&sbp=&pver=(.*?)&pid=&ID"#,
        "IIS",
    ),
    (r"<b>Version Information:</b>&nbsp;(.*?)\n", "ASP .NET"),
];

// Compiled once per process; the signature sets are fixed.
static ERROR_MATCHER: Lazy<MultiIn> = Lazy::new(|| MultiIn::new(ERROR_PAGES.iter().copied()));
static VERSION_MATCHER: Lazy<MultiRe> = Lazy::new(|| {
    MultiRe::new(VERSION_REGEX.iter().copied()).expect("version regexes are static and valid")
});

pub struct ErrorPages {
    /// Version banners repeat on every error page of a host; report each
    /// distinct banner once per scan session, not once per response.
    reported_versions: SeenSet,
}

impl ErrorPages {
    pub fn new() -> Self {
        Self {
            reported_versions: SeenSet::new(),
        }
    }

    /// "Descriptive error page - \"...\"" with long signatures truncated.
    fn error_finding_name(msg: &str) -> String {
        if msg.len() > 12 {
            format!("Descriptive error page - \"{}...\"", &msg[..12])
        } else {
            format!("Descriptive error page - \"{}\"", msg)
        }
    }
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self::new()
    }
}

impl GrepPlugin for ErrorPages {
    fn name(&self) -> &'static str {
        "error_pages"
    }

    fn grep(&self, response: &ResponseRecord, kb: &KnowledgeBase) {
        // One descriptive-error finding per response is enough; the first
        // matched signature wins and the rest are noise.
        if let Some(msg) = ERROR_MATCHER.query(&response.body).first() {
            debug!("[Grep] error_pages matched '{}' on {}", msg, response.url);
            let finding = Finding::info(self.name(), "error_page", &Self::error_finding_name(msg))
                .with_description(format!(
                    "The URL: \"{}\" contains the descriptive error: \"{}\"",
                    response.url, msg
                ))
                .with_url(response.url.clone())
                .with_response_id(response.id)
                .with_highlight(*msg);
            kb.append(self.name(), "error_page", finding);
        }

        // Version banners only appear on actual error responses.
        if (400..600).contains(&response.status_code) {
            for m in VERSION_MATCHER.query(&response.body) {
                if !self.reported_versions.first_sighting(&m.matched) {
                    continue;
                }
                let finding = Finding::info(
                    self.name(),
                    "server",
                    "Error page with information disclosure",
                )
                .with_description(format!(
                    "An error page sent this {} version: \"{}\".",
                    m.tag, m.matched
                ))
                .with_url(response.url.clone())
                .with_response_id(response.id)
                .with_highlight(m.tag.clone())
                .with_highlight(m.matched.clone());
                kb.append(self.name(), "server", finding);
            }
        }
    }
}
