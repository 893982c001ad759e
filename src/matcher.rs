// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Multi-Pattern Matching Engine
 * One-pass scanning of response bodies against signature sets
 *
 * Grep plugins scan every response against dozens or hundreds of
 * signatures; a composite scan structure compiled once at plugin
 * initialization keeps that cost independent of the signature count,
 * instead of one substring search per signature per response.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use regex::{Regex, RegexSet, RegexSetBuilder};

use crate::errors::EngineError;

/// Compiled multi-literal substring matcher. Built once from a fixed set
/// of literal signatures; `query` scans a body in a single pass and
/// returns every literal that occurs as a substring.
#[derive(Debug)]
pub struct MultiIn {
    set: RegexSet,
    literals: Vec<String>,
}

impl MultiIn {
    /// Compile a literal signature set. An empty set is legal and matches
    /// nothing. Literal text is escaped, so regex metacharacters in
    /// signatures carry no special meaning.
    pub fn new<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).collect();
        let escaped: Vec<String> = literals.iter().map(|l| regex::escape(l)).collect();
        // Large signature sets over megabyte bodies need a roomy DFA cache.
        let set = RegexSetBuilder::new(&escaped)
            .size_limit(16 * 1024 * 1024)
            .dfa_size_limit(16 * 1024 * 1024)
            .build()
            .expect("escaped literals always compile");
        Self { set, literals }
    }

    /// All literals occurring in `text`, no duplicates, order unspecified.
    pub fn query<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.set
            .matches(text)
            .into_iter()
            .map(|idx| self.literals[idx].as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }
}

/// One match produced by a `MultiRe` query.
#[derive(Debug, Clone, PartialEq)]
pub struct ReMatch {
    pub start: usize,
    pub end: usize,
    /// The matched text itself.
    pub matched: String,
    /// Source pattern that produced this match.
    pub pattern: String,
    /// Caller-supplied tag associated with the pattern.
    pub tag: String,
}

/// Compiled regex bank: a fixed sequence of (pattern, tag) pairs, each
/// searched independently so early patterns never suppress later ones.
#[derive(Debug)]
pub struct MultiRe {
    entries: Vec<(Regex, String, String)>,
}

impl MultiRe {
    pub fn new<'a, I>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries = Vec::new();
        for (pattern, tag) in pairs {
            let regex = Regex::new(pattern)?;
            entries.push((regex, pattern.to_string(), tag.to_string()));
        }
        Ok(Self { entries })
    }

    /// Every non-overlapping match of every pattern in `text`, in
    /// pattern-declaration order, match order within a pattern.
    pub fn query(&self, text: &str) -> Vec<ReMatch> {
        let mut out = Vec::new();
        for (regex, pattern, tag) in &self.entries {
            for m in regex.find_iter(text) {
                out.push(ReMatch {
                    start: m.start(),
                    end: m.end(),
                    matched: m.as_str().to_string(),
                    pattern: pattern.clone(),
                    tag: tag.clone(),
                });
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
