// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration from the process environment:
//! `HDDS_DOMAIN_ID`, `HDDS_TRANSPORT`, `HDDS_LOG_LEVEL`, `HDDS_DSCP`.

use crate::transport::TransportMode;

/// DSCP (Differentiated Services Code Point) class for outgoing traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dscp {
    #[default]
    BestEffort,
    Af21,
    Af41,
    Ef,
}

impl Dscp {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "be" => Some(Self::BestEffort),
            "af21" => Some(Self::Af21),
            "af41" => Some(Self::Af41),
            "ef" => Some(Self::Ef),
            _ => None,
        }
    }

    /// The DSCP 6-bit codepoint shifted into the IPv4 TOS byte's high bits.
    #[must_use]
    pub fn tos_byte(self) -> u8 {
        let codepoint: u8 = match self {
            Self::BestEffort => 0,
            Self::Af21 => 18,
            Self::Af41 => 34,
            Self::Ef => 46,
        };
        codepoint << 2
    }
}

/// Environment-derived configuration read once at participant creation.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub domain_id: u32,
    pub transport_mode: TransportMode,
    pub dscp: Dscp,
}

impl EnvConfig {
    /// Read `HDDS_DOMAIN_ID`, `HDDS_TRANSPORT`, `HDDS_DSCP` from the
    /// process environment, falling back to defaults on absence or a
    /// malformed value.
    #[must_use]
    pub fn from_env() -> Self {
        let domain_id = std::env::var("HDDS_DOMAIN_ID").ok().and_then(|v| v.parse().ok()).unwrap_or(0);
        let transport_mode = match std::env::var("HDDS_TRANSPORT").as_deref() {
            Ok("udp") => TransportMode::UdpMulticast,
            Ok("intra") | Err(_) => TransportMode::IntraProcess,
            Ok(other) => {
                log::warn!("HDDS_TRANSPORT={other:?} not recognized, defaulting to intra-process");
                TransportMode::IntraProcess
            }
        };
        let dscp = std::env::var("HDDS_DSCP").ok().and_then(|v| Dscp::parse(&v)).unwrap_or_default();
        Self { domain_id, transport_mode, dscp }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self { domain_id: 0, transport_mode: TransportMode::IntraProcess, dscp: Dscp::default() }
    }
}

/// Parse `HDDS_LOG_LEVEL` into a `log::LevelFilter`, defaulting to `Info`.
#[must_use]
pub fn log_level_from_env() -> log::LevelFilter {
    match std::env::var("HDDS_LOG_LEVEL").as_deref() {
        Ok("error") => log::LevelFilter::Error,
        Ok("warn") => log::LevelFilter::Warn,
        Ok("debug") => log::LevelFilter::Debug,
        Ok("trace") => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dscp_parses_known_classes() {
        assert_eq!(Dscp::parse("ef"), Some(Dscp::Ef));
        assert_eq!(Dscp::parse("AF41"), Some(Dscp::Af41));
        assert_eq!(Dscp::parse("bogus"), None);
    }

    #[test]
    fn ef_tos_byte_matches_the_standard_codepoint() {
        assert_eq!(Dscp::Ef.tos_byte(), 46 << 2);
    }

    #[test]
    fn default_env_config_is_intra_process_domain_zero() {
        let cfg = EnvConfig::default();
        assert_eq!(cfg.domain_id, 0);
        assert_eq!(cfg.transport_mode, TransportMode::IntraProcess);
    }
}
