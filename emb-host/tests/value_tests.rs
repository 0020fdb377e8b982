// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Value proxy and conversion tests against the fake host.

use std::time::Duration;

use emb_host::prelude::*;
use emb_mock::MockHost;

fn session(host: &MockHost) -> Env {
    unsafe { Env::from_raw(host.env()) }
}

#[test]
fn test_integer_round_trip() {
    let host = MockHost::new();
    let env = session(&host);
    let integer = env.intern("integer").into_value();
    for n in [0_i64, 1, 42, 65536, -1, i64::MIN, i64::MAX] {
        let value = env.make_integer(n).into_value();
        assert_eq!(value.as_integer().into_value(), n);
        assert_eq!(value.type_of(), integer);
    }
}

#[test]
fn test_integer_is_not_a_float() {
    let host = MockHost::new();
    let env = session(&host);
    let error = env.make_integer(3).and_then(Value::as_float).into_error();
    assert_eq!(error.status(), FuncallExit::Signal);
    assert_eq!(error.symbol().symbol_name().into_value(), "wrong-type-argument");
    assert_eq!(env.check_error(), FuncallExit::Return);
}

#[test]
fn test_float_round_trip() {
    let host = MockHost::new();
    let env = session(&host);
    let value = env.make_float(1.2).into_value();
    assert_eq!(value.as_float().into_value(), 1.2);
    assert_eq!(value.type_of().symbol_name().into_value(), "float");
}

#[test]
fn test_strings() {
    let host = MockHost::new();
    let env = session(&host);

    let value = env.make_string("foo").into_value();
    assert_eq!(value.as_string().into_value(), "foo");
    assert_eq!(env.call("length", (value,)).and_then(Value::as_integer).into_value(), 3);

    let empty = env.make_string("").into_value();
    assert_eq!(empty.as_string().into_value(), "");

    let nul = env.make_string("a\0b").into_value();
    assert_eq!(nul.as_bytes().into_value(), b"a\0b".to_vec());
    assert_eq!(env.call("length", (nul,)).and_then(Value::as_integer).into_value(), 3);

    let error = env.make_string_from_bytes(&[0x66, 0xff]).into_error();
    assert!(error.is_signal());
}

#[test]
fn test_unibyte_string() {
    let host = MockHost::new();
    let env = session(&host);
    let value = env.make_unibyte_string(&[0x00, 0xff, 0x10]).into_value();
    assert_eq!(value.as_bytes().into_value(), vec![0x00, 0xff, 0x10]);
    assert_eq!(value.as_string().into_error().symbol().symbol_name().into_value(), "convert-error");
}

#[test]
fn test_vectors() {
    let host = MockHost::new();
    let env = session(&host);
    let vector = env.vector((1_i64, "foo", 1.2_f64)).into_value();
    assert_eq!(vector.vec_size().into_value(), 3);
    assert_eq!(vector.vec_get(1).and_then(Value::as_string).into_value(), "foo");

    vector.vec_set(1, "bar").into_value();
    assert_eq!(vector.vec_get(1).and_then(Value::as_string).into_value(), "bar");
    vector.vec_set(1, 7_i64).into_value();
    assert_eq!(vector.vec_get(1).and_then(Value::as_integer).into_value(), 7);

    let error = vector.vec_get(3).into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "args-out-of-range");

    let not_vector = env.make_integer(1).into_value();
    assert!(not_vector.vec_size().has_error());
}

#[test]
fn test_eq_and_equal() {
    let host = MockHost::new();
    let env = session(&host);
    let a = env.make_string("same").into_value();
    let b = env.make_string("same").into_value();
    assert_ne!(a, b);
    assert!(a.equal(b).into_value());
    assert_eq!(env.intern("foo").into_value(), env.intern("foo").into_value());
}

#[test]
fn test_nil_and_booleans() {
    let host = MockHost::new();
    let env = session(&host);
    assert!(env.nil().into_value().is_nil());
    assert!(env.t().into_value().is_not_nil());
    assert!(true.into_lisp(&env).into_value().is_not_nil());
    assert!(false.into_lisp(&env).into_value().is_nil());
    assert!(().into_lisp(&env).into_value().is_nil());
    assert_eq!(None::<i64>.into_lisp(&env).into_value(), env.nil().into_value());
    assert_eq!(env.nil().into_value().into_rust::<Option<i64>>().into_value(), None);
}

#[test]
fn test_checked_integer_conversions() {
    let host = MockHost::new();
    let env = session(&host);
    let big = u64::MAX.into_lisp(&env).into_error();
    assert_eq!(big.symbol().symbol_name().into_value(), "overflow-error");

    let value = env.make_integer(300).into_value();
    let narrow = value.into_rust::<u8>().into_error();
    assert_eq!(narrow.symbol().symbol_name().into_value(), "overflow-error");
    assert_eq!(value.into_rust::<u16>().into_value(), 300);

    let negative = env.make_integer(-1).into_value();
    assert!(negative.into_rust::<usize>().has_error());
}

#[test]
fn test_time() {
    let host = MockHost::new();
    let env = session(&host);
    let time = Timestamp::new(1, 50).unwrap();
    let value = env.make_time(time).into_value();
    assert_eq!(value.type_of().symbol_name().into_value(), "cons");
    assert_eq!(value.as_time().into_value(), time);
    assert_eq!(value.into_rust::<Duration>().into_value(), Duration::new(1, 50));

    let epoch = env.make_time(Timestamp::UNIX_EPOCH).into_value();
    assert_eq!(epoch.as_time().into_value(), Timestamp::UNIX_EPOCH);
    let value = Duration::from_secs(3).into_lisp(&env).into_value();
    assert_eq!(value.as_time().into_value().secs(), 3);
}

#[test]
fn test_time_before_epoch() {
    let host = MockHost::new();
    let env = session(&host);
    // (TICKS . HZ) with a negative tick count
    let value = env.call("cons", (-5_i64, 1_i64)).into_value();
    let time = value.as_time().into_value();
    assert_eq!(time.secs(), -5);
    assert_eq!(time.subsec_nanos(), 0);
    assert!(time.is_before_epoch());

    let half_before = Timestamp::from_nanos(-500_000_000).unwrap();
    let value = env.make_time(half_before).into_value();
    assert_eq!(value.as_time().into_value(), half_before);
    assert_eq!(value.into_rust::<Timestamp>().into_value().as_nanos(), -500_000_000);

    let error = value.into_rust::<Duration>().into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "overflow-error");
    assert_eq!(env.check_error(), FuncallExit::Return);
}

#[test]
fn test_user_ptr() {
    let host = MockHost::new();
    let env = session(&host);
    let mut slot = 5_u32;
    let ptr = (&raw mut slot).cast();
    let value = env.make_user_ptr(ptr, None).into_value();
    assert_eq!(value.type_of().symbol_name().into_value(), "user-ptr");
    assert_eq!(value.as_user_ptr().into_value(), ptr);
    assert!(value.user_finalizer().into_value().is_none());

    value.set_user_ptr(std::ptr::null_mut()).into_value();
    assert!(value.as_user_ptr().into_value().is_null());
}

#[test]
fn test_global_ref() {
    let host = MockHost::new();
    let env = session(&host);
    let value = env.make_string("kept").into_value();
    let global = value.make_global_ref().into_value();
    assert_eq!(host.global_refs(), 1);
    assert_eq!(global.bind(&env).as_string().into_value(), "kept");
    assert_eq!(env.call("length", (&global,)).and_then(Value::as_integer).into_value(), 4);
    global.free(&env);
    assert_eq!(host.global_refs(), 0);
}

#[test]
fn test_lists_and_calls() {
    let host = MockHost::new();
    let env = session(&host);
    let list = env.list((1_i64, 2_i64, 3_i64)).into_value();
    assert_eq!(env.call("length", (list,)).and_then(Value::as_integer).into_value(), 3);

    let car = env.import("car");
    assert_eq!(car.name(), "car");
    assert_eq!(car.call((list,)).and_then(Value::as_integer).into_value(), 1);

    let plus = env.intern("+").into_value();
    assert_eq!(plus.call((2_i64, 3_i64)).and_then(Value::as_integer).into_value(), 5);

    let args = vec![env.make_integer(4).into_value(), env.make_integer(5).into_value()];
    assert_eq!(env.call("+", args).and_then(Value::as_integer).into_value(), 9);
}

#[test]
fn test_message_is_not_reformatted() {
    let host = MockHost::new();
    let env = session(&host);
    env.message(format_args!("{}% done, {:?}", 50, "x")).into_value();
    assert_eq!(host.messages(), vec!["50% done, \"x\"".to_owned()]);
}

#[test]
fn test_defvar_and_eval() {
    let host = MockHost::new();
    let env = session(&host);
    let list = env.list((1_i64, 2_i64)).into_value();
    env.defvar("emb-test-var", list, "A test variable.").into_value();
    assert_eq!(host.variable("emb-test-var").as_deref(), Some("(1 2)"));

    let symbol = env.intern("emb-test-var").into_value();
    assert!(symbol.symbol_value().into_value().equal(list).into_value());
    assert!(env.eval(symbol).into_value().equal(list).into_value());

    // A second defvar keeps the existing value.
    env.defvar("emb-test-var", 3_i64, "").into_value();
    assert_eq!(host.variable("emb-test-var").as_deref(), Some("(1 2)"));
}
