// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host object type tags.
//!
//! The host stores a small type tag in the low (or high) bits of every
//! object word. [`LispType`] names those tags. Reading them directly
//! ([`Value::lisp_type`](crate::Value::lisp_type), behind the
//! `unstable-type-tag` feature) skips a call to `type-of`, but depends on
//! host internals that are not part of the module ABI.

/// Width of the type tag in bits
pub const GCTYPEBITS: u32 = 3;

/// Host integer type backing object words
pub type EmacsInt = i64;

/// Largest value field of an object word
pub const VAL_MAX: EmacsInt = EmacsInt::MAX >> (GCTYPEBITS - 1);

/// Whether tags live in the least significant bits.
///
/// True on every build whose value range leaves room for an aligned pointer,
/// which covers the 64-bit hosts this layout was validated against.
pub const USE_LSB_TAG: bool = VAL_MAX / 2 < isize::MAX as EmacsInt;

/// Number of value bits in an object word
pub const VALBITS: u32 = EmacsInt::BITS - GCTYPEBITS;

const fn cons_tag() -> u8 {
    if USE_LSB_TAG { 3 } else { 6 }
}

const fn int1_tag() -> u8 {
    if USE_LSB_TAG { 6 } else { 3 }
}

/// Type tag of a host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LispType {
    /// Symbol
    Symbol = 0,
    /// Reserved tag
    Unused = 1,
    /// Fixnum, even variant
    Int0 = 2,
    /// Cons cell
    Cons = cons_tag(),
    /// String
    String = 4,
    /// Vectors, records, functions, user pointers and other pseudovectors
    VectorLike = 5,
    /// Fixnum, odd variant
    Int1 = int1_tag(),
    /// Float
    Float = 7,
}

impl LispType {
    /// Decodes a tag. Only the low [`GCTYPEBITS`] bits are considered.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Self {
        match tag & ((1 << GCTYPEBITS) - 1) {
            0 => Self::Symbol,
            1 => Self::Unused,
            2 => Self::Int0,
            4 => Self::String,
            5 => Self::VectorLike,
            7 => Self::Float,
            t if t == cons_tag() => Self::Cons,
            _ => Self::Int1,
        }
    }

    /// Extracts the tag from an object word
    #[must_use]
    pub const fn from_word(word: usize) -> Self {
        let tag = if USE_LSB_TAG { word as u64 } else { (word as u64) >> VALBITS };
        Self::from_tag(tag as u8)
    }

    /// The numeric tag
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether this is one of the two fixnum tags
    #[must_use]
    pub const fn is_fixnum(self) -> bool {
        matches!(self, Self::Int0 | Self::Int1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_table() {
        assert!(USE_LSB_TAG);
        assert_eq!(LispType::Symbol.code(), 0);
        assert_eq!(LispType::Unused.code(), 1);
        assert_eq!(LispType::Int0.code(), 2);
        assert_eq!(LispType::Cons.code(), 3);
        assert_eq!(LispType::String.code(), 4);
        assert_eq!(LispType::VectorLike.code(), 5);
        assert_eq!(LispType::Int1.code(), 6);
        assert_eq!(LispType::Float.code(), 7);
    }

    #[test]
    fn test_from_tag_round_trip() {
        for code in 0..8u8 {
            assert_eq!(LispType::from_tag(code).code(), code);
        }
        assert_eq!(LispType::from_word(0b1010_0111), LispType::Float);
        assert_eq!(LispType::from_word(0x1000), LispType::Symbol);
    }
}
