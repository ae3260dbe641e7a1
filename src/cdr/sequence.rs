// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded and unbounded CDR sequences, and maps.

use super::{CdrDecode, CdrEncode, Decoder, Encoder};
use crate::error::{Error, Result};

/// Hard ceiling on a decoded sequence length, independent of any
/// type-level bound, so a corrupt length field cannot trigger an
/// unbounded allocation.
const MAX_SANE_SEQUENCE_LEN: u32 = 16 * 1024 * 1024;

impl<T: CdrEncode> CdrEncode for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.align(4);
        (self.len() as u32).encode(enc);
        for item in self {
            item.encode(enc);
        }
    }
}

impl<T: CdrDecode> CdrDecode for Vec<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.align(4)?;
        let len = u32::decode(dec)?;
        if len > MAX_SANE_SEQUENCE_LEN {
            return Err(Error::BadParameter(format!(
                "CDR sequence length {len} exceeds sanity ceiling"
            )));
        }
        let mut out = Vec::with_capacity((len as usize).min(4096));
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }
        Ok(out)
    }
}

/// A sequence bounded to at most `BOUND` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedSeq<T, const BOUND: usize>(pub Vec<T>);

impl<T: CdrEncode, const BOUND: usize> CdrEncode for BoundedSeq<T, BOUND> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        self.0.encode(enc);
    }
}

impl<T: CdrDecode, const BOUND: usize> CdrDecode for BoundedSeq<T, BOUND> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let v = Vec::<T>::decode(dec)?;
        if v.len() > BOUND {
            return Err(Error::BadParameter(format!(
                "CDR bounded sequence exceeds bound {BOUND} (got {})",
                v.len()
            )));
        }
        Ok(BoundedSeq(v))
    }
}

/// A map encoded as a length-prefixed sequence of key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CdrMap<K, V>(pub Vec<(K, V)>);

impl<K: CdrEncode, V: CdrEncode> CdrEncode for CdrMap<K, V> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.align(4);
        (self.0.len() as u32).encode(enc);
        for (k, v) in &self.0 {
            k.encode(enc);
            v.encode(enc);
        }
    }
}

impl<K: CdrDecode, V: CdrDecode> CdrDecode for CdrMap<K, V> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.align(4)?;
        let len = u32::decode(dec)?;
        if len > MAX_SANE_SEQUENCE_LEN {
            return Err(Error::BadParameter(format!(
                "CDR map length {len} exceeds sanity ceiling"
            )));
        }
        let mut out = Vec::with_capacity((len as usize).min(4096));
        for _ in 0..len {
            let k = K::decode(dec)?;
            let v = V::decode(dec)?;
            out.push((k, v));
        }
        Ok(CdrMap(out))
    }
}

/// Presence bitmap for a struct's optional members: one
/// bit per declared optional field, in declaration order, packed into a
/// u32 (supports up to 32 optional members per struct).
pub struct PresenceBitmap(pub u32);

impl CdrEncode for PresenceBitmap {
    fn encode(&self, enc: &mut Encoder<'_>) {
        self.0.encode(enc);
    }
}

impl CdrDecode for PresenceBitmap {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(PresenceBitmap(u32::decode(dec)?))
    }
}

impl PresenceBitmap {
    #[must_use]
    pub fn is_present(&self, index: u32) -> bool {
        (self.0 >> index) & 1 == 1
    }

    #[must_use]
    pub fn with_bit(mut self, index: u32, present: bool) -> Self {
        if present {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
        self
    }
}
