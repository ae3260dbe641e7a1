// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C3: sample identity, instance-key derivation and the history cache.

pub mod cache;
pub mod keyhash;
pub mod sample;

pub use cache::HistoryCache;
pub use keyhash::{derive_instance_handle, InstanceHandle, ANONYMOUS_INSTANCE};
pub use sample::{InstanceState, Sample, SampleState, ViewState};
