// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Template and Mutant Model
 * Fuzzable request shapes and the concrete probes derived from them
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where an injectable point lives on the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Body,
    Header,
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamLocation::Query => write!(f, "query string"),
            ParamLocation::Body => write!(f, "request body"),
            ParamLocation::Header => write!(f, "header"),
        }
    }
}

/// A named injectable point with its original (unmutated) value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: String,
    pub location: ParamLocation,
}

impl Param {
    pub fn query(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            location: ParamLocation::Query,
        }
    }

    pub fn body(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            location: ParamLocation::Body,
        }
    }

    pub fn header(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            location: ParamLocation::Header,
        }
    }
}

/// An HTTP request shape captured by the crawl collaborator, with zero or
/// more named injectable points. Immutable once captured; the mutation
/// engine derives probes from it without modifying it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    pub method: String,
    /// Base URL without the injectable query parameters.
    pub url: String,
    pub params: Vec<Param>,
}

impl RequestTemplate {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            params: Vec::new(),
        }
    }

    pub fn post(url: &str) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.to_string(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Names of the injectable points, in declaration order.
    pub fn injectable_points(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Render the unmutated request, every point at its original value.
    pub fn request(&self) -> ProbeRequest {
        render(self, None)
    }
}

/// A concrete, sendable request: URL with encoded query, optional
/// form-encoded body, extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

/// A probe derived from a template by substituting one payload into one
/// injectable point. Never modified after creation; consumed by the
/// dispatch framework and optionally attached to the finding it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutant {
    pub template: RequestTemplate,
    /// Name of the injected point.
    pub point: String,
    pub payload: String,
    /// Body of the original (unmutated) response, used to rule out
    /// signatures already present before injection.
    pub original_response_body: Option<String>,
}

/// Dedup identity of a mutant: one audit point per (URL, parameter name).
pub type PointId = (String, String);

impl Mutant {
    /// Identity for dedup purposes. Two mutants with different payloads
    /// against the same parameter of the same URL share a point id.
    pub fn point_id(&self) -> PointId {
        (self.template.url.clone(), self.point.clone())
    }

    /// Render the concrete probe with the payload substituted into its
    /// point and all other points at their original values.
    pub fn request(&self) -> ProbeRequest {
        render(&self.template, Some((&self.point, &self.payload)))
    }

    /// Human-readable location string for finding descriptions.
    pub fn found_at(&self) -> String {
        let location = self
            .template
            .params
            .iter()
            .find(|p| p.name == self.point)
            .map(|p| p.location)
            .unwrap_or(ParamLocation::Query);
        format!(
            "\"{}\", in the {}, parameter \"{}\"",
            self.template.url, location, self.point
        )
    }

    pub fn original_body(&self) -> &str {
        self.original_response_body.as_deref().unwrap_or("")
    }
}

fn render(template: &RequestTemplate, inject: Option<(&str, &str)>) -> ProbeRequest {
    let value_for = |p: &Param| -> String {
        match inject {
            Some((point, payload)) if p.name == point => payload.to_string(),
            _ => p.value.clone(),
        }
    };

    let mut query_pairs = Vec::new();
    let mut body_pairs = Vec::new();
    let mut headers = HashMap::new();

    for param in &template.params {
        let value = value_for(param);
        match param.location {
            ParamLocation::Query => query_pairs.push(format!(
                "{}={}",
                urlencoding::encode(&param.name),
                urlencoding::encode(&value)
            )),
            ParamLocation::Body => body_pairs.push(format!(
                "{}={}",
                urlencoding::encode(&param.name),
                urlencoding::encode(&value)
            )),
            ParamLocation::Header => {
                headers.insert(param.name.clone(), value);
            }
        }
    }

    let url = if query_pairs.is_empty() {
        template.url.clone()
    } else if template.url.contains('?') {
        format!("{}&{}", template.url, query_pairs.join("&"))
    } else {
        format!("{}?{}", template.url, query_pairs.join("&"))
    };

    let body = if body_pairs.is_empty() {
        None
    } else {
        Some(body_pairs.join("&"))
    };

    ProbeRequest {
        method: template.method.clone(),
        url,
        body,
        headers,
    }
}
