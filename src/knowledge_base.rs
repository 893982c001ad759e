// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Knowledge Base
 * Session-scoped, thread-safe finding store shared by every plugin
 *
 * One instance lives for the duration of a scan session: constructed
 * empty at scan start, passed by reference (Arc) to every component, and
 * drained by the reporting collaborator at scan end. Findings are
 * append-only; nothing is ever removed or mutated in place.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Finding;

type BucketKey = (String, String);
type Bucket = Arc<Mutex<Vec<Arc<Finding>>>>;

/// Findings store keyed by (producer plugin, category). Locking is
/// bucket-granular: appends to different keys never contend, and readers
/// get a snapshot copy so appends during iteration cannot corrupt a
/// returned sequence.
#[derive(Default)]
pub struct KnowledgeBase {
    buckets: RwLock<HashMap<BucketKey, Bucket>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, plugin: &str, category: &str) -> Bucket {
        let key = (plugin.to_string(), category.to_string());
        if let Some(bucket) = self.buckets.read().get(&key) {
            return Arc::clone(bucket);
        }
        let mut buckets = self.buckets.write();
        Arc::clone(buckets.entry(key).or_default())
    }

    /// Append a finding under (plugin, category). Insertion order within a
    /// bucket is preserved; appends to the same bucket are serialized by
    /// the bucket mutex, appends elsewhere proceed in parallel.
    pub fn append(&self, plugin: &str, category: &str, finding: Finding) {
        let bucket = self.bucket(plugin, category);
        bucket.lock().push(Arc::new(finding));
    }

    /// Snapshot of the findings for one key, in insertion order. Safe to
    /// call while other threads append to any key.
    pub fn get(&self, plugin: &str, category: &str) -> Vec<Arc<Finding>> {
        let key = (plugin.to_string(), category.to_string());
        match self.buckets.read().get(&key) {
            Some(bucket) => bucket.lock().clone(),
            None => Vec::new(),
        }
    }

    /// Dedup support: does any finding under (plugin, category) satisfy
    /// the predicate?
    pub fn has_any<F>(&self, plugin: &str, category: &str, predicate: F) -> bool
    where
        F: Fn(&Finding) -> bool,
    {
        let key = (plugin.to_string(), category.to_string());
        match self.buckets.read().get(&key) {
            Some(bucket) => bucket.lock().iter().any(|f| predicate(f)),
            None => false,
        }
    }

    /// Total findings across all buckets.
    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .values()
            .map(|b| b.lock().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every bucket for the reporting collaborator at scan
    /// end. Keys are unordered; findings within a key keep insertion order.
    pub fn all(&self) -> Vec<((String, String), Vec<Arc<Finding>>)> {
        self.buckets
            .read()
            .iter()
            .map(|(key, bucket)| (key.clone(), bucket.lock().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn finding(name: &str) -> Finding {
        Finding::vulnerability("test_plugin", "test_cat", name, Severity::Medium)
    }

    #[test]
    fn test_append_and_get_preserve_insertion_order() {
        let kb = KnowledgeBase::new();
        kb.append("p", "c", finding("first"));
        kb.append("p", "c", finding("second"));
        kb.append("p", "c", finding("third"));

        let names: Vec<String> = kb.get("p", "c").iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_get_unknown_key_is_empty() {
        let kb = KnowledgeBase::new();
        assert!(kb.get("nobody", "nothing").is_empty());
    }

    #[test]
    fn test_buckets_are_independent() {
        let kb = KnowledgeBase::new();
        kb.append("p1", "c", finding("a"));
        kb.append("p2", "c", finding("b"));
        assert_eq!(kb.get("p1", "c").len(), 1);
        assert_eq!(kb.get("p2", "c").len(), 1);
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_has_any_predicate() {
        let kb = KnowledgeBase::new();
        kb.append("p", "c", finding("match-me"));
        assert!(kb.has_any("p", "c", |f| f.name == "match-me"));
        assert!(!kb.has_any("p", "c", |f| f.name == "absent"));
        assert!(!kb.has_any("p", "other", |f| f.name == "match-me"));
    }

    #[test]
    fn test_get_returns_snapshot() {
        let kb = KnowledgeBase::new();
        kb.append("p", "c", finding("a"));
        let snapshot = kb.get("p", "c");
        kb.append("p", "c", finding("b"));
        // The previously returned sequence is unaffected by later appends.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(kb.get("p", "c").len(), 2);
    }

    #[test]
    fn test_concurrent_appends_same_bucket_lose_nothing() {
        let kb = Arc::new(KnowledgeBase::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let kb = Arc::clone(&kb);
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    kb.append("p", "c", finding(&format!("t{}-{}", t, i)));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(kb.get("p", "c").len(), 8 * 200);
    }
}
