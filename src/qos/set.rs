// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A full QoS set: the fixed collection of policies carried by every
//! writer and reader.

use super::deadline::Deadline;
use super::liveliness::Liveliness;
use super::ownership::OwnershipKind;
use super::partition::Partition;
use super::policy::{Durability, History, LatencyBudget, Reliability, ResourceLimits, TransportPriority};
use super::time_based_filter::TimeBasedFilter;
use super::lifespan::Lifespan;

#[derive(Debug, Clone, PartialEq)]
pub struct QosSet {
    pub reliability: Reliability,
    pub durability: Durability,
    pub history: History,
    pub deadline: Deadline,
    pub latency_budget: LatencyBudget,
    pub liveliness: Liveliness,
    pub ownership: OwnershipKind,
    /// Writer-only; meaningless on a reader's QoS set.
    pub ownership_strength: i32,
    pub lifespan: Lifespan,
    pub time_based_filter: TimeBasedFilter,
    pub resource_limits: ResourceLimits,
    pub partition: Partition,
    pub transport_priority: TransportPriority,
}

impl Default for QosSet {
    fn default() -> Self {
        Self {
            reliability: Reliability::default(),
            durability: Durability::default(),
            history: History::default(),
            deadline: Deadline::default(),
            latency_budget: LatencyBudget::default(),
            liveliness: Liveliness::default(),
            ownership: OwnershipKind::default(),
            ownership_strength: 0,
            lifespan: Lifespan::default(),
            time_based_filter: TimeBasedFilter::default(),
            resource_limits: ResourceLimits::default(),
            partition: Partition::default_partition(),
            transport_priority: TransportPriority::default(),
        }
    }
}

impl QosSet {
    /// A RELIABLE, VOLATILE set otherwise at defaults, the common starting point.
    #[must_use]
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::reliable(u64::MAX),
            ..Self::default()
        }
    }

    /// Validate internal consistency of this one endpoint's QoS, independent
    /// of any remote peer.
    ///
    /// Resolves the `history_depth == 0` open question: a
    /// `KEEP_LAST(0)` history is rejected rather than silently treated as
    /// `KEEP_ALL`; see DESIGN.md.
    pub fn validate(&self) -> Result<(), String> {
        if let History::KeepLast(0) = self.history {
            return Err("HISTORY KEEP_LAST(0) is inconsistent; use KEEP_ALL or a depth >= 1".into());
        }
        if let History::KeepLast(depth) = self.history {
            if self.resource_limits.max_samples_per_instance != super::policy::LENGTH_UNLIMITED
                && (depth as usize) > self.resource_limits.max_samples_per_instance
            {
                return Err(
                    "HISTORY depth exceeds RESOURCE_LIMITS.max_samples_per_instance".into(),
                );
            }
        }
        Ok(())
    }
}
