// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PARTITION QoS: an ordered list of shell-glob strings used for matching.
//! An empty list is the implicit default partition and matches only
//! another empty list.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    pub names: Vec<String>,
}

impl Partition {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    #[must_use]
    pub fn default_partition() -> Self {
        Self { names: Vec::new() }
    }

    /// True if at least one name in `self` glob-matches at least one name
    /// in `other`, or both are empty (the implicit default partition).
    #[must_use]
    pub fn matches(&self, other: &Partition) -> bool {
        if self.names.is_empty() && other.names.is_empty() {
            return true;
        }
        self.names
            .iter()
            .any(|a| other.names.iter().any(|b| glob_match(a, b) || glob_match(b, a)))
    }
}

/// Minimal shell-glob matcher supporting `*` (any run) and `?` (one char),
/// sufficient for DDS partition-name matching.
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    match_from(&p, &t)
}

fn match_from(p: &[char], t: &[char]) -> bool {
    match p.first() {
        None => t.is_empty(),
        Some('*') => match_from(&p[1..], t) || (!t.is_empty() && match_from(p, &t[1..])),
        Some('?') => !t.is_empty() && match_from(&p[1..], &t[1..]),
        Some(c) => !t.is_empty() && t[0] == *c && match_from(&p[1..], &t[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_empty_only() {
        let empty = Partition::default_partition();
        let a = Partition::new(vec!["A".into()]);
        assert!(empty.matches(&Partition::default_partition()));
        assert!(!empty.matches(&a));
        assert!(!a.matches(&empty));
    }

    #[test]
    fn exact_name_matches() {
        let a = Partition::new(vec!["robots".into()]);
        let b = Partition::new(vec!["robots".into()]);
        assert!(a.matches(&b));
    }

    #[test]
    fn glob_star_matches_prefix() {
        assert!(glob_match("robot*", "robot1"));
        assert!(glob_match("robot*", "robot"));
        assert!(!glob_match("robot*", "rob"));
    }

    #[test]
    fn glob_question_mark_matches_one_char() {
        assert!(glob_match("r?bot", "robot"));
        assert!(!glob_match("r?bot", "rbot"));
    }

    #[test]
    fn disjoint_partitions_do_not_match() {
        let a = Partition::new(vec!["A".into()]);
        let b = Partition::new(vec!["B".into()]);
        assert!(!a.matches(&b));
    }

    #[test]
    fn reconfigured_partition_can_join_overlap() {
        let a = Partition::new(vec!["A".into()]);
        let ab = Partition::new(vec!["A".into(), "B".into()]);
        assert!(a.matches(&ab));
    }
}
