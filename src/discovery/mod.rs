// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C5: discovery and matching. SPDP finds participants;
//! SEDP finds their endpoints; the matcher applies the QoS compatibility
//! rule and wires matched writers/readers together.

pub mod matcher;
pub mod sedp;
pub mod spdp;

pub use matcher::Matcher;
pub use sedp::{EndpointAnnouncement, EndpointKind, SedpDatabase};
pub use spdp::{ParticipantAnnouncement, SpdpDatabase, DEFAULT_ANNOUNCE_PERIOD};
