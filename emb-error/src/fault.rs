// EMB - emb-error
// Module: Native Faults
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Native runtime faults and the host signals they map to.
//!
//! A [`Fault`] is what native code raises when it cannot finish: returned as
//! the error side of a `Result` from a module function, or carried as a panic
//! payload. Trampolines classify it with [`Fault::signal_symbol`]. A fault may
//! carry several classifications; the first one in [`FaultKind::CATCH_ORDER`]
//! decides the signal.

use std::{
    collections::TryReserveError,
    ffi::CStr,
    fmt,
    num::TryFromIntError,
    str::Utf8Error,
    string::FromUtf8Error,
};

use crate::codes;

/// Classification of a native fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FaultKind {
    /// Arithmetic result too large for its representation
    Overflow = 0,
    /// Arithmetic result too small for its representation
    Underflow = 1,
    /// Value outside the domain of an operation
    Range = 2,
    /// Index or key outside the bounds of a container
    OutOfRange = 3,
    /// Allocation failure
    MemoryFull = 4,
    /// Wrong side of an `Expected` accessed, or a value failed to convert
    Convert = 5,
    /// Anything else
    Other = 6,
}

impl FaultKind {
    /// Most specific first; the order trampolines test classifications in
    pub const CATCH_ORDER: [Self; 7] = [
        Self::Overflow,
        Self::Underflow,
        Self::Range,
        Self::OutOfRange,
        Self::MemoryFull,
        Self::Convert,
        Self::Other,
    ];

    /// Host error symbol signalled for this kind
    #[must_use]
    pub const fn signal_symbol(self) -> &'static CStr {
        match self {
            Self::Overflow => c"overflow-error",
            Self::Underflow => c"underflow-error",
            Self::Range => c"range-error",
            Self::OutOfRange => c"out-of-range",
            Self::MemoryFull => c"memory-full",
            Self::Convert => c"convert-error",
            Self::Other => c"error",
        }
    }

    /// Numeric fault code
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Overflow => codes::OVERFLOW,
            Self::Underflow => codes::UNDERFLOW,
            Self::Range => codes::RANGE,
            Self::OutOfRange => codes::OUT_OF_RANGE,
            Self::MemoryFull => codes::MEMORY_FULL,
            Self::Convert => codes::CONVERT,
            Self::Other => codes::OTHER,
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of [`FaultKind`]s
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FaultKinds(u8);

impl FaultKinds {
    /// The empty set
    pub const EMPTY: Self = Self(0);

    /// A set holding only `kind`
    #[must_use]
    pub const fn only(kind: FaultKind) -> Self {
        Self(kind.bit())
    }

    /// Adds `kind`
    #[must_use]
    pub const fn with(self, kind: FaultKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Whether `kind` is in the set
    #[must_use]
    pub const fn contains(self, kind: FaultKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// The member that wins under [`FaultKind::CATCH_ORDER`], or `Other` when empty
    #[must_use]
    pub fn primary(self) -> FaultKind {
        FaultKind::CATCH_ORDER
            .into_iter()
            .find(|kind| self.contains(*kind))
            .unwrap_or(FaultKind::Other)
    }
}

/// A native runtime fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kinds: FaultKinds,
    message: String,
}

impl Fault {
    /// Creates a fault of a single kind
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kinds: FaultKinds::only(kind), message: message.into() }
    }

    /// Adds another classification to this fault
    #[must_use]
    pub fn also(mut self, kind: FaultKind) -> Self {
        self.kinds = self.kinds.with(kind);
        self
    }

    /// Overflow fault
    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Overflow, message)
    }

    /// Underflow fault
    pub fn underflow(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Underflow, message)
    }

    /// Range fault
    pub fn range(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Range, message)
    }

    /// Out-of-range fault
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(FaultKind::OutOfRange, message)
    }

    /// Allocation failure
    pub fn memory_full(message: impl Into<String>) -> Self {
        Self::new(FaultKind::MemoryFull, message)
    }

    /// Conversion failure
    pub fn convert(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Convert, message)
    }

    /// Any other failure
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Other, message)
    }

    /// All classifications carried by this fault
    #[must_use]
    pub const fn kinds(&self) -> FaultKinds {
        self.kinds
    }

    /// The classification that decides the host signal
    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kinds.primary()
    }

    /// Human readable description
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Numeric fault code of the deciding classification
    #[must_use]
    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    /// Host error symbol this fault is signalled as
    #[must_use]
    pub fn signal_symbol(&self) -> &'static CStr {
        self.kind().signal_symbol()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} fault ({}): {}", self.kind(), self.code(), self.message)
    }
}

impl std::error::Error for Fault {}

impl From<TryFromIntError> for Fault {
    fn from(err: TryFromIntError) -> Self {
        Self::overflow(err.to_string())
    }
}

impl From<TryReserveError> for Fault {
    fn from(err: TryReserveError) -> Self {
        Self::memory_full(err.to_string())
    }
}

impl From<Utf8Error> for Fault {
    fn from(err: Utf8Error) -> Self {
        Self::convert(err.to_string())
    }
}

impl From<FromUtf8Error> for Fault {
    fn from(err: FromUtf8Error) -> Self {
        Self::convert(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_order_resolves_multiple_kinds() {
        let fault = Fault::range("both").also(FaultKind::Overflow);
        assert_eq!(fault.kind(), FaultKind::Overflow);
        assert_eq!(fault.signal_symbol(), c"overflow-error");

        let fault = Fault::other("x").also(FaultKind::OutOfRange).also(FaultKind::MemoryFull);
        assert_eq!(fault.kind(), FaultKind::OutOfRange);
    }

    #[test]
    fn test_empty_set_is_other() {
        assert_eq!(FaultKinds::EMPTY.primary(), FaultKind::Other);
    }

    #[test]
    fn test_conversions() {
        let err = u8::try_from(300_i32).unwrap_err();
        assert_eq!(Fault::from(err).kind(), FaultKind::Overflow);

        let err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        assert_eq!(Fault::from(err).signal_symbol(), c"convert-error");
    }
}
