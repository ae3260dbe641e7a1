// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The closed error catalogue returned by every public HDDS operation.
//!
//! HDDS never raises exceptions or panics on a caller mistake: every
//! fallible operation returns `Result<T, Error>` drawn from this fixed
//! enumeration. Language bindings re-export the same integer values.

use std::fmt;

/// Closed set of error codes exposed by the core (DDS-RTPS error model).
#[derive(Debug)]
pub enum Error {
    /// Unspecified failure; prefer a more specific variant where possible.
    Error,
    /// Requested operation or feature is not implemented by this build.
    Unsupported,
    /// An argument was malformed (bad name, out-of-range id, ...).
    BadParameter(String),
    /// The entity/operation precondition does not hold (e.g. destroy with live children).
    PreconditionNotMet(String),
    /// A hard resource cap was hit (participant-id pool, history, etc.).
    OutOfResources(String),
    /// The entity exists but has not been enabled yet.
    NotEnabled,
    /// Attempted to change a QoS policy that is immutable after creation.
    ImmutablePolicy(String),
    /// The QoS policy set requested for one endpoint is internally inconsistent.
    InconsistentPolicy(String),
    /// The entity referenced by this handle has already been destroyed.
    AlreadyDeleted,
    /// A bounded wait exceeded its deadline.
    Timeout,
    /// No data was available to satisfy the read/take.
    NoData,
    /// The operation is not legal given the entity's current enabled state.
    IllegalOperation(String),
    /// DDS Security denied the operation (always returned; security is not implemented).
    NotAllowedBySecurity,
    /// A blocking call was interrupted (WaitSet destroyed while waiting, etc.).
    Interrupted,
    /// Transport-level I/O failure, carrying the underlying OS error.
    Transport(std::io::Error),
}

/// Fieldless mirror of [`Error`]'s variants, for callers (language bindings
/// in particular) that want to match on the closed error code set without
/// unpacking each variant's detail payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    Unsupported,
    BadParameter,
    PreconditionNotMet,
    OutOfResources,
    NotEnabled,
    ImmutablePolicy,
    InconsistentPolicy,
    AlreadyDeleted,
    Timeout,
    NoData,
    IllegalOperation,
    NotAllowedBySecurity,
    Interrupted,
    Transport,
}

impl Error {
    /// True for the two "empty cache" codes a reader's `take` may return.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData)
    }

    /// This error's code, independent of any detail string or wrapped
    /// `std::io::Error` it carries.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Error => ErrorKind::Error,
            Error::Unsupported => ErrorKind::Unsupported,
            Error::BadParameter(_) => ErrorKind::BadParameter,
            Error::PreconditionNotMet(_) => ErrorKind::PreconditionNotMet,
            Error::OutOfResources(_) => ErrorKind::OutOfResources,
            Error::NotEnabled => ErrorKind::NotEnabled,
            Error::ImmutablePolicy(_) => ErrorKind::ImmutablePolicy,
            Error::InconsistentPolicy(_) => ErrorKind::InconsistentPolicy,
            Error::AlreadyDeleted => ErrorKind::AlreadyDeleted,
            Error::Timeout => ErrorKind::Timeout,
            Error::NoData => ErrorKind::NoData,
            Error::IllegalOperation(_) => ErrorKind::IllegalOperation,
            Error::NotAllowedBySecurity => ErrorKind::NotAllowedBySecurity,
            Error::Interrupted => ErrorKind::Interrupted,
            Error::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Error => write!(f, "error"),
            Error::Unsupported => write!(f, "unsupported operation"),
            Error::BadParameter(msg) => write!(f, "bad parameter: {msg}"),
            Error::PreconditionNotMet(msg) => write!(f, "precondition not met: {msg}"),
            Error::OutOfResources(msg) => write!(f, "out of resources: {msg}"),
            Error::NotEnabled => write!(f, "entity not enabled"),
            Error::ImmutablePolicy(msg) => write!(f, "immutable policy: {msg}"),
            Error::InconsistentPolicy(msg) => write!(f, "inconsistent policy: {msg}"),
            Error::AlreadyDeleted => write!(f, "entity already deleted"),
            Error::Timeout => write!(f, "timed out"),
            Error::NoData => write!(f, "no data / not found"),
            Error::IllegalOperation(msg) => write!(f, "illegal operation: {msg}"),
            Error::NotAllowedBySecurity => write!(f, "not allowed by security"),
            Error::Interrupted => write!(f, "interrupted"),
            Error::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e)
    }
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_predicate() {
        assert!(Error::NoData.is_no_data());
        assert!(!Error::Timeout.is_no_data());
    }

    #[test]
    fn transport_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: Error = io.into();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn kind_ignores_the_detail_payload() {
        assert_eq!(Error::BadParameter("x".into()).kind(), ErrorKind::BadParameter);
        assert_eq!(Error::BadParameter("y".into()).kind(), Error::BadParameter("y".into()).kind());
        assert_eq!(Error::NoData.kind(), ErrorKind::NoData);
    }
}
