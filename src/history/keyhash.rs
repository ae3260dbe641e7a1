// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instance-key derivation.
//!
//! The instance identifier is the first 16 bytes of the MD5 digest of
//! the CDR encoding of a sample's key members only. Types with no
//! declared key fields hash to a fixed all-zero identifier, so the
//! entire topic becomes one anonymous instance.

use md5::{Digest, Md5};

/// 16-byte instance identifier, derived from a type's key members.
pub type InstanceHandle = [u8; 16];

/// The anonymous instance identifier used by unkeyed types.
pub const ANONYMOUS_INSTANCE: InstanceHandle = [0u8; 16];

/// Hash the CDR-encoded key fields of a sample into an instance handle.
///
/// Pass an empty slice for unkeyed types; this returns [`ANONYMOUS_INSTANCE`]
/// without hashing.
#[must_use]
pub fn derive_instance_handle(key_cdr_bytes: &[u8]) -> InstanceHandle {
    if key_cdr_bytes.is_empty() {
        return ANONYMOUS_INSTANCE;
    }
    let mut hasher = Md5::new();
    hasher.update(key_cdr_bytes);
    let digest = hasher.finalize();
    let mut handle = [0u8; 16];
    handle.copy_from_slice(&digest[..16]);
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_anonymous() {
        assert_eq!(derive_instance_handle(&[]), ANONYMOUS_INSTANCE);
    }

    #[test]
    fn same_key_bytes_hash_identically() {
        let a = derive_instance_handle(b"instance-42");
        let b = derive_instance_handle(b"instance-42");
        assert_eq!(a, b);
    }

    #[test]
    fn different_key_bytes_hash_differently() {
        let a = derive_instance_handle(b"instance-42");
        let b = derive_instance_handle(b"instance-43");
        assert_ne!(a, b);
    }
}
