//! Behavioural tests for `Expected`

use std::panic;

use emb_error::{BadExpectedAccess, Expected, Unexpected, emb_try};

fn misuse_message<R>(f: impl FnOnce() -> R + panic::UnwindSafe) -> String {
    let payload = panic::catch_unwind(f).err().expect("closure should panic");
    payload
        .downcast_ref::<BadExpectedAccess>()
        .map(|bad| bad.message().to_string())
        .expect("payload should be BadExpectedAccess")
}

#[test]
fn test_emplace() {
    let mut x: Expected<String, i32> = Unexpected::new(2).into();
    assert!(x.has_error());
    assert_eq!(*x.error(), 2);

    x.emplace("foo".to_string());
    assert!(x.has_value());
    assert_eq!(x.value(), "foo");
}

#[test]
fn test_has_value_and_has_error() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert!(x.has_value());
    assert!(!x.has_error());

    let y: Expected<i32, i32> = Expected::unexpected(3);
    assert!(y.has_error());
    assert!(!y.has_value());
}

#[test]
fn test_value_and_error() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert_eq!(*x.value(), 2);

    let y: Expected<i32, i32> = Expected::unexpected(3);
    assert_eq!(*y.error(), 3);
    assert_eq!(misuse_message(|| *y.value()), "Bad expected access");
    assert_eq!(misuse_message(|| *x.error()), "Bad expected access");
}

#[test]
fn test_value_or() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert_eq!(x.value_or(3), 2);

    let y: Expected<i32, i32> = Expected::unexpected(2);
    assert_eq!(y.value_or(3), 3);
}

#[test]
fn test_value_or_else() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert_eq!(x.value_or_else(|e| e), 2);

    let y: Expected<i32, i32> = Expected::unexpected(3);
    assert_eq!(y.value_or_else(|e| e), 3);
}

#[test]
fn test_expect() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert_eq!(x.expect("dummy"), 2);

    let y: Expected<i32, i32> = Expected::unexpected(3);
    assert_eq!(misuse_message(move || y.expect("dummy")), "dummy");
}

#[test]
fn test_expect_err() {
    let x: Expected<i32, i32> = Expected::Value(2);
    assert_eq!(misuse_message(move || x.expect_err("dummy")), "dummy");

    let y: Expected<i32, i32> = Expected::unexpected(3);
    assert_eq!(y.expect_err("dummy"), 3);
}

#[test]
fn test_map_skips_error() {
    let y: Expected<i32, &str> = Expected::unexpected("bad");
    let mapped = y.map(|_| -> i32 { panic!("map must not run on an error") });
    assert_eq!(mapped, Expected::unexpected("bad"));
}

#[test]
fn test_map_err_skips_value() {
    let x: Expected<i32, &str> = Expected::Value(1);
    let mapped = x.map_err(|_| -> u8 { panic!("map_err must not run on a value") });
    assert_eq!(mapped, Expected::Value(1));
}

#[test]
fn test_or_else_fallback_chain() {
    let first: Expected<i32, &str> = Expected::unexpected("first");
    let chained = first
        .or_else(|e| -> Expected<i32, String> { Expected::unexpected(format!("{e}+second")) })
        .or_else(|_| -> Expected<i32, String> { Expected::Value(7) })
        .or_else(|_| -> Expected<i32, String> { panic!("stops at the first success") });
    assert_eq!(chained, Expected::Value(7));
}

#[test]
fn test_equality() {
    assert_eq!(Expected::<i32, i32>::Value(1), Expected::Value(1));
    assert_ne!(Expected::<i32, i32>::Value(1), Expected::unexpected(1));
    assert_eq!(Expected::<i32, i32>::unexpected(4), Expected::unexpected(4));
}

#[test]
fn test_result_interop() {
    let x: Expected<i32, String> = Ok::<_, String>(5).into();
    assert_eq!(x.clone().into_result(), Ok(5));
    let r: Result<i32, String> = Expected::<i32, String>::unexpected("e".into()).into();
    assert_eq!(r, Err("e".to_string()));
    assert_eq!(x.discard(), Expected::Value(()));
}

#[test]
fn test_try_evaluates_once() {
    let mut calls = 0;
    let mut produce = || {
        calls += 1;
        Expected::<i32, ()>::Value(calls)
    };
    let mut run = || -> Expected<i32, ()> {
        let v = emb_try!(produce());
        Expected::Value(v * 10)
    };
    assert_eq!(run(), Expected::Value(10));
    drop(run);
    assert_eq!(calls, 1);
}

#[test]
fn test_try_propagates_error() {
    fn inner() -> Expected<i32, &'static str> {
        Expected::unexpected("inner failed")
    }
    fn outer() -> Expected<String, &'static str> {
        let v = emb_try!(inner());
        Expected::Value(v.to_string())
    }
    assert_eq!(outer(), Expected::unexpected("inner failed"));
}
