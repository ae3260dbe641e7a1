// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HDDS - a Rust implementation of the OMG DDS data model over RTPS
//!
//! A pub/sub middleware core for real-time systems: typed topics, QoS-
//! governed matching, and a reliable delivery protocol modeled on
//! RTPS 2.3.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hdds::{Participant, ParticipantIdPool, EntityRegistry, QoS, Result, Topic, TransportMode};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let pool = Arc::new(ParticipantIdPool::new());
//!     let registry = Arc::new(EntityRegistry::new());
//!     let participant = Participant::new("my_app", 0, TransportMode::IntraProcess, pool, registry)?;
//!
//!     let topic = Topic::new("sensors/temperature", "Temperature");
//!     let writer = participant.create_writer(topic.clone(), QoS::default())?;
//!     let reader = participant.create_reader(topic, QoS::default())?;
//!
//!     participant.write(&writer, b"key", vec![0x42], 0)?;
//!     let sample = reader.take()?;
//!     assert_eq!(sample.payload, vec![0x42]);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Application Layer                           |
//! |   Participant -> DataWriter / DataReader -> WaitSet                 |
//! +---------------------------------------------------------------------+
//! |                           DDS Layer                                 |
//! |   QoS Policies | Topic Matching | History Cache | Status Conditions |
//! +---------------------------------------------------------------------+
//! |                          RTPS Layer                                 |
//! |   Discovery (SPDP/SEDP) | Reliability | CDR Codec | Fragmentation   |
//! +---------------------------------------------------------------------+
//! |                        Transport Layer                              |
//! |   INTRA_PROCESS ring | UDP_MULTICAST                                |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Participant`] | Entry point to a DDS domain, factory for writers/readers |
//! | [`DataWriter`] | Publishes samples to a topic |
//! | [`DataReader`] | Subscribes to samples from a topic |
//! | [`Topic`] | Named data channel with an associated type hash |
//! | [`QoS`] | The full QoS policy set carried by every endpoint |
//! | [`WaitSet`] | Blocks until an attached condition triggers |
//!
//! ## Modules Overview
//!
//! - [`entity`] - participants, writers, readers, the GUID registry (C1)
//! - [`cdr`] - the wire codec (C2)
//! - [`history`] - the per-endpoint sample cache (C3)
//! - [`reliability`] - the RTPS reliability protocol (C4)
//! - [`discovery`] - SPDP/SEDP and the matching rule (C5)
//! - [`qos`] - QoS policies and their C6 state machines
//! - [`waitset`] - conditions and the WaitSet primitive (C7)
//! - [`transport`] - `INTRA_PROCESS` and `UDP_MULTICAST` transports
//!
//! ## See Also
//!
//! - [DDS Specification](https://www.omg.org/spec/DDS/1.4/)
//! - [RTPS Specification](https://www.omg.org/spec/DDSI-RTPS/2.5/)

/// CDR v2 little-endian wire codec.
pub mod cdr;
/// Runtime configuration from the process environment.
pub mod config;
/// Discovery: SPDP, SEDP and the matching rule.
pub mod discovery;
/// The shared monotonic clock and timer thread.
pub mod clock;
/// Participants, writers, readers and the GUID registry.
pub mod entity;
/// The closed error catalogue.
pub mod error;
/// The RTPS GUID.
pub mod guid;
/// The per-endpoint history cache.
pub mod history;
/// QoS policies and their C6 state machines.
pub mod qos;
/// The RTPS reliability protocol, at a design level.
pub mod reliability;
/// Process-wide telemetry counters.
pub mod telemetry;
/// `INTRA_PROCESS` and `UDP_MULTICAST` transports.
pub mod transport;
/// Conditions and the WaitSet blocking primitive.
pub mod waitset;

pub use entity::{DataReader, DataWriter, Entity, EntityRegistry, Participant, ParticipantIdPool, Topic};
pub use error::{Error, ErrorKind, Result};
pub use guid::Guid;
pub use qos::QoS;
pub use telemetry::MetricsSnapshot;
pub use transport::TransportMode;
pub use waitset::{Condition, GuardCondition, HasStatusCondition, StatusCondition, StatusMask, WaitSet};
