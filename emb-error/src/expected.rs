// EMB - emb-error
// Module: Expected
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! A value-or-error type.
//!
//! `Expected<T, E>` holds exactly one of a success value or an error value.
//! It converts losslessly to and from [`Result`], so `?` is available through
//! [`Expected::into_result`], and [`emb_try!`](crate::emb_try) propagates
//! errors out of functions that return `Expected` directly.
//!
//! Accessing the inactive side through [`Expected::value`],
//! [`Expected::error`] or their consuming variants is a programming error.
//! Such an access panics with a [`BadExpectedAccess`] payload, which the
//! host trampolines recognise and translate into a `convert-error` signal.

use std::{borrow::Cow, fmt, mem, panic};

/// Panic payload raised when the wrong side of an [`Expected`] is accessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadExpectedAccess {
    message: Cow<'static, str>,
}

impl BadExpectedAccess {
    /// Message used when no diagnostic is supplied
    pub const DEFAULT_MESSAGE: &'static str = "Bad expected access";

    /// Creates a misuse report carrying `message`
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self { message: message.into() }
    }

    /// The diagnostic message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for BadExpectedAccess {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MESSAGE)
    }
}

impl fmt::Display for BadExpectedAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BadExpectedAccess {}

#[cold]
#[track_caller]
fn bad_access(message: impl Into<Cow<'static, str>>) -> ! {
    panic::panic_any(BadExpectedAccess::new(message))
}

/// Tags a value as the error side of an [`Expected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unexpected<E>(pub E);

impl<E> Unexpected<E> {
    /// Wraps `error`
    pub const fn new(error: E) -> Self {
        Self(error)
    }

    /// Returns the wrapped error
    pub fn into_inner(self) -> E {
        self.0
    }
}

/// Either a success value or an error value, never both, never neither.
#[must_use = "this `Expected` may hold an error, which should be handled"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expected<T, E> {
    /// Success
    Value(T),
    /// Failure
    Unexpected(E),
}

impl<T, E> Expected<T, E> {
    /// Constructs the error side in place
    pub const fn unexpected(error: E) -> Self {
        Self::Unexpected(error)
    }

    /// Returns `true` if a success value is held
    #[must_use]
    pub const fn has_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` if an error value is held
    #[must_use]
    pub const fn has_error(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }

    /// Borrows the success value.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if an error is held.
    #[track_caller]
    pub fn value(&self) -> &T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
        }
    }

    /// Mutably borrows the success value.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if an error is held.
    #[track_caller]
    pub fn value_mut(&mut self) -> &mut T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
        }
    }

    /// Moves the success value out.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if an error is held.
    #[track_caller]
    pub fn into_value(self) -> T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
        }
    }

    /// Borrows the error value.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if a success value is held.
    #[track_caller]
    pub fn error(&self) -> &E {
        match self {
            Self::Value(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
            Self::Unexpected(error) => error,
        }
    }

    /// Mutably borrows the error value.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if a success value is held.
    #[track_caller]
    pub fn error_mut(&mut self) -> &mut E {
        match self {
            Self::Value(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
            Self::Unexpected(error) => error,
        }
    }

    /// Moves the error value out.
    ///
    /// # Panics
    ///
    /// Panics with [`BadExpectedAccess`] if a success value is held.
    #[track_caller]
    pub fn into_error(self) -> E {
        match self {
            Self::Value(_) => bad_access(BadExpectedAccess::DEFAULT_MESSAGE),
            Self::Unexpected(error) => error,
        }
    }

    /// Moves the success value out, reporting misuse with `message`.
    ///
    /// # Panics
    ///
    /// Panics with a [`BadExpectedAccess`] carrying `message` if an error is
    /// held.
    #[track_caller]
    pub fn expect(self, message: impl Into<Cow<'static, str>>) -> T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(_) => bad_access(message),
        }
    }

    /// Moves the error value out, reporting misuse with `message`.
    ///
    /// # Panics
    ///
    /// Panics with a [`BadExpectedAccess`] carrying `message` if a success
    /// value is held.
    #[track_caller]
    pub fn expect_err(self, message: impl Into<Cow<'static, str>>) -> E {
        match self {
            Self::Value(_) => bad_access(message),
            Self::Unexpected(error) => error,
        }
    }

    /// Returns the success value or `default`
    pub fn value_or(self, default: T) -> T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(_) => default,
        }
    }

    /// Returns the success value or computes one from the error
    pub fn value_or_else<F: FnOnce(E) -> T>(self, f: F) -> T {
        match self {
            Self::Value(value) => value,
            Self::Unexpected(error) => f(error),
        }
    }

    /// Borrows both sides
    pub const fn as_ref(&self) -> Expected<&T, &E> {
        match self {
            Self::Value(value) => Expected::Value(value),
            Self::Unexpected(error) => Expected::Unexpected(error),
        }
    }

    /// Mutably borrows both sides
    pub fn as_mut(&mut self) -> Expected<&mut T, &mut E> {
        match self {
            Self::Value(value) => Expected::Value(value),
            Self::Unexpected(error) => Expected::Unexpected(error),
        }
    }

    /// Transforms the success value; the error passes through untouched
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Expected<U, E> {
        match self {
            Self::Value(value) => Expected::Value(f(value)),
            Self::Unexpected(error) => Expected::Unexpected(error),
        }
    }

    /// Transforms the error value; the success value passes through untouched
    pub fn map_err<G, F: FnOnce(E) -> G>(self, f: F) -> Expected<T, G> {
        match self {
            Self::Value(value) => Expected::Value(value),
            Self::Unexpected(error) => Expected::Unexpected(f(error)),
        }
    }

    /// Chains a dependent fallible computation, stopping at the first error
    pub fn and_then<U, F: FnOnce(T) -> Expected<U, E>>(self, f: F) -> Expected<U, E> {
        match self {
            Self::Value(value) => f(value),
            Self::Unexpected(error) => Expected::Unexpected(error),
        }
    }

    /// Tries a fallback on error, stopping at the first success
    pub fn or_else<G, F: FnOnce(E) -> Expected<T, G>>(self, f: F) -> Expected<T, G> {
        match self {
            Self::Value(value) => Expected::Value(value),
            Self::Unexpected(error) => f(error),
        }
    }

    /// Replaces the content with a success value, dropping any prior error.
    pub fn emplace(&mut self, value: T) -> &mut T {
        *self = Self::Value(value);
        self.value_mut()
    }

    /// Exchanges contents with `other`.
    ///
    /// Both operands are moved bitwise, so no user code runs during the swap
    /// and neither side can be observed half-swapped.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Drops the success value, keeping only the outcome
    pub fn discard(self) -> Expected<(), E> {
        self.map(|_| ())
    }

    /// Converts into a [`Result`]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Unexpected(error) => Err(error),
        }
    }

    /// Borrows the success value without panicking
    pub fn try_value(&self) -> Result<&T, BadExpectedAccess> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Unexpected(_) => Err(BadExpectedAccess::default()),
        }
    }

    /// Returns the success value, if any
    pub fn ok(self) -> Option<T> {
        self.into_result().ok()
    }

    /// Returns the error value, if any
    pub fn err(self) -> Option<E> {
        self.into_result().err()
    }
}

impl<T, E> Expected<Expected<T, E>, E> {
    /// Removes one level of nesting
    pub fn flatten(self) -> Expected<T, E> {
        self.and_then(|inner| inner)
    }
}

impl<T: Default, E> Default for Expected<T, E> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T, E> From<Unexpected<E>> for Expected<T, E> {
    fn from(error: Unexpected<E>) -> Self {
        Self::Unexpected(error.0)
    }
}

impl<T, E> From<Unexpected<E>> for Result<T, E> {
    fn from(error: Unexpected<E>) -> Self {
        Err(error.0)
    }
}

impl<T, E> From<Result<T, E>> for Expected<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(error) => Self::Unexpected(error),
        }
    }
}

impl<T, E> From<Expected<T, E>> for Result<T, E> {
    fn from(expected: Expected<T, E>) -> Self {
        expected.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_message(payload: &(dyn std::any::Any + Send)) -> Option<String> {
        payload.downcast_ref::<BadExpectedAccess>().map(|bad| bad.message().to_string())
    }

    #[test]
    fn test_exactly_one_side_is_active() {
        let good: Expected<i32, &str> = Expected::Value(1);
        let bad: Expected<i32, &str> = Expected::unexpected("no");
        assert!(good.has_value() && !good.has_error());
        assert!(bad.has_error() && !bad.has_value());
    }

    #[test]
    fn test_value_on_error_panics_with_bad_access() {
        let bad: Expected<i32, &str> = Expected::unexpected("no");
        let payload = panic::catch_unwind(|| *bad.value()).unwrap_err();
        assert_eq!(payload_message(payload.as_ref()).as_deref(), Some("Bad expected access"));
    }

    #[test]
    fn test_expect_carries_message() {
        let bad: Expected<i32, &str> = Expected::unexpected("no");
        let payload = panic::catch_unwind(|| bad.expect("needed an int")).unwrap_err();
        assert_eq!(payload_message(payload.as_ref()).as_deref(), Some("needed an int"));

        let good: Expected<i32, &str> = Expected::Value(3);
        let payload = panic::catch_unwind(|| good.expect_err("needed an error")).unwrap_err();
        assert_eq!(payload_message(payload.as_ref()).as_deref(), Some("needed an error"));
    }

    #[test]
    fn test_emplace_discards_error() {
        let mut slot: Expected<String, i32> = Expected::unexpected(5);
        slot.emplace("fresh".to_string()).push('!');
        assert_eq!(slot, Expected::Value("fresh!".to_string()));
    }

    #[test]
    fn test_swap_mixed_sides() {
        let mut a: Expected<i32, String> = Expected::Value(1);
        let mut b: Expected<i32, String> = Expected::unexpected("e".to_string());
        a.swap(&mut b);
        assert_eq!(a, Expected::unexpected("e".to_string()));
        assert_eq!(b, Expected::Value(1));
    }

    #[test]
    fn test_flatten() {
        let nested: Expected<Expected<i32, u8>, u8> = Expected::Value(Expected::unexpected(4));
        assert_eq!(nested.flatten(), Expected::unexpected(4));
    }
}
