// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic identity: a (name, type-name, type-hash) triple.
//! Topics are not first-class entities on the wire; matching is by this
//! tuple plus QoS.

use md5::{Digest, Md5};

/// Reserved type hash accepted by the matching rule regardless of the
/// peer's actual hash, letting a bridge endpoint match any type on a topic.
pub const WILDCARD_TYPE_HASH: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub name: String,
    pub type_name: String,
    pub type_hash: u64,
}

impl Topic {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let type_hash = hash_type_name(&type_name);
        Self { name: name.into(), type_name, type_hash }
    }

    #[must_use]
    pub fn with_wildcard_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into(), type_hash: WILDCARD_TYPE_HASH }
    }

    /// Matching rule clauses 1-2: topic name equal, and
    /// type hash equal or either side wildcarded.
    #[must_use]
    pub fn matches(&self, other: &Topic) -> bool {
        self.name == other.name
            && (self.type_hash == other.type_hash
                || self.type_hash == WILDCARD_TYPE_HASH
                || other.type_hash == WILDCARD_TYPE_HASH)
    }
}

fn hash_type_name(type_name: &str) -> u64 {
    let mut hasher = Md5::new();
    hasher.update(type_name.as_bytes());
    let digest = hasher.finalize();
    u64::from_le_bytes(digest[0..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_and_type_matches() {
        let a = Topic::new("robots", "Pose");
        let b = Topic::new("robots", "Pose");
        assert!(a.matches(&b));
    }

    #[test]
    fn different_type_name_does_not_match() {
        let a = Topic::new("robots", "Pose");
        let b = Topic::new("robots", "Twist");
        assert!(!a.matches(&b));
    }

    #[test]
    fn different_topic_name_does_not_match() {
        let a = Topic::new("robots", "Pose");
        let b = Topic::new("drones", "Pose");
        assert!(!a.matches(&b));
    }

    #[test]
    fn wildcard_type_hash_matches_anything_on_the_same_topic() {
        let bridge = Topic::with_wildcard_type("robots", "unused");
        let typed = Topic::new("robots", "Pose");
        assert!(bridge.matches(&typed));
        assert!(typed.matches(&bridge));
    }
}
