// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded and unbounded CDR strings.
//!
//! Wire format: a 4-byte length (including the NUL terminator), aligned
//! to 4, followed by the UTF-8 bytes and a trailing NUL.

use super::{CdrDecode, CdrEncode, Decoder, Encoder};
use crate::error::{Error, Result};

impl CdrEncode for String {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.align(4);
        let len = (self.len() + 1) as u32;
        len.encode(enc);
        enc.write_bytes(self.as_bytes());
        enc.write_u8(0);
    }
}

impl CdrDecode for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.align(4)?;
        let len = u32::decode(dec)? as usize;
        if len == 0 {
            return Err(Error::BadParameter("CDR string length 0 (must include NUL)".into()));
        }
        let bytes = dec.read_bytes(len)?;
        let (body, nul) = bytes.split_at(len - 1);
        if nul != [0] {
            return Err(Error::BadParameter("CDR string missing NUL terminator".into()));
        }
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::BadParameter(format!("CDR string is not valid UTF-8: {e}")))
    }
}

/// A string bounded to at most `BOUND` characters (excluding the NUL).
/// Over-long strings are rejected at decode time rather than silently
/// truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedString<const BOUND: usize>(pub String);

impl<const BOUND: usize> CdrEncode for BoundedString<BOUND> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        self.0.encode(enc);
    }
}

impl<const BOUND: usize> CdrDecode for BoundedString<BOUND> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let s = String::decode(dec)?;
        if s.len() > BOUND {
            return Err(Error::BadParameter(format!(
                "CDR bounded string exceeds bound {BOUND} (got {})",
                s.len()
            )));
        }
        Ok(BoundedString(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::{decode, encode};

    #[test]
    fn empty_string_round_trips() {
        let s = String::new();
        assert_eq!(decode::<String>(&encode(&s)).unwrap(), s);
    }

    #[test]
    fn non_empty_string_round_trips() {
        let s = "hello, rtps".to_string();
        assert_eq!(decode::<String>(&encode(&s)).unwrap(), s);
    }

    #[test]
    fn rejects_truncated_string() {
        // header + len=10 but only 2 bytes follow
        let mut buf = vec![3, 0, 0, 0];
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(b"ab");
        assert!(decode::<String>(&buf).is_err());
    }

    #[test]
    fn bounded_string_rejects_over_long() {
        let mut buf = Vec::new();
        let mut enc = super::Encoder::new(&mut buf);
        "this is too long".to_string().encode(&mut enc);
        let err = decode::<BoundedString<4>>(&buf).unwrap_err();
        assert!(matches!(err, Error::BadParameter(_)));
    }
}
