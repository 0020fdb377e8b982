// EMB - emb-error
// Module: Macros
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Propagation macros.

/// Unwraps an [`Expected`](crate::Expected) or returns its error early.
///
/// The operand is evaluated exactly once. The enclosing function may return
/// either `Expected<_, E>` or `Result<_, E>`; the error is handed back
/// unchanged.
///
/// # Examples
///
/// ```
/// use emb_error::{emb_try, Expected};
///
/// fn halve(n: i32) -> Expected<i32, &'static str> {
///     if n % 2 == 0 { Expected::Value(n / 2) } else { Expected::unexpected("odd") }
/// }
///
/// fn quarter(n: i32) -> Expected<i32, &'static str> {
///     let half = emb_try!(halve(n));
///     halve(half)
/// }
///
/// fn quarter_result(n: i32) -> Result<i32, &'static str> {
///     Ok(emb_try!(halve(emb_try!(halve(n)))))
/// }
///
/// assert_eq!(quarter(8), Expected::Value(2));
/// assert_eq!(quarter(6), Expected::unexpected("odd"));
/// assert_eq!(quarter_result(12), Ok(3));
/// ```
#[macro_export]
macro_rules! emb_try {
    ($expr:expr $(,)?) => {
        match $crate::Expected::into_result($expr) {
            ::core::result::Result::Ok(value) => value,
            ::core::result::Result::Err(error) => {
                return ::core::convert::From::from($crate::Unexpected::new(error));
            }
        }
    };
}

/// Builds a [`Fault`](crate::Fault) from a kind and a format string.
///
/// # Examples
///
/// ```
/// use emb_error::{fault, FaultKind};
///
/// let index = 9;
/// let f = fault!(OutOfRange, "index {} past end", index);
/// assert_eq!(f.kind(), FaultKind::OutOfRange);
/// assert_eq!(f.message(), "index 9 past end");
/// ```
#[macro_export]
macro_rules! fault {
    ($kind:ident, $($arg:tt)+) => {
        $crate::Fault::new($crate::FaultKind::$kind, ::std::format!($($arg)+))
    };
}
