// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Non-local exit capture, reporting and host version gating.

use emb_host::{ProcessInputResult, prelude::*};
use emb_mock::MockHost;

fn session(host: &MockHost) -> Env {
    unsafe { Env::from_raw(host.env()) }
}

#[test]
fn test_capture_is_destructive() {
    let host = MockHost::new();
    let env = session(&host);
    env.signal("error", env.list(("first",)).into_value()).into_value();
    assert_eq!(env.check_error(), FuncallExit::Signal);

    let error = env.get_error().expect("pending signal");
    assert!(error.is_signal());
    assert_eq!(env.check_error(), FuncallExit::Signal);
    env.clear_error();
    assert!(env.get_error().is_none());
    assert_eq!(env.check_error(), FuncallExit::Return);

    env.signal("error", env.list(("second",)).into_value()).into_value();
    assert!(env.take_error().is_some());
    assert!(env.take_error().is_none());
}

#[test]
fn test_first_exit_wins() {
    let host = MockHost::new();
    let env = session(&host);
    let tag = env.intern("done").into_value();
    let data = env.list(("ignored",)).into_value();
    env.throw(tag, 42_i64).into_value();
    env.signal("error", data).into_value();
    assert_eq!(env.check_error(), FuncallExit::Throw);

    let error = env.take_error().expect("pending throw");
    assert!(error.is_throw());
    assert_eq!(error.tag(), tag);
    assert_eq!(error.value().as_integer().into_value(), 42);
}

#[test]
fn test_exit_helpers_leave_pending_exit_alone() {
    let host = MockHost::new();
    let env = session(&host);
    let tag = env.intern("done").into_value();
    env.signal("range-error", env.list(("first",)).into_value()).into_value();

    // Converting these arguments would otherwise consume the pending signal.
    env.signal("error", "second").into_value();
    env.throw(tag, "third").into_value();
    assert_eq!(env.check_error(), FuncallExit::Signal);

    let error = env.take_error().expect("pending signal");
    assert_eq!(error.symbol().symbol_name().into_value(), "range-error");
    assert_eq!(error.data().car_string(), "first");
    assert_eq!(env.check_error(), FuncallExit::Return);
}

#[test]
fn test_report_round_trip() {
    let host = MockHost::new();
    let env = session(&host);
    let error = env.call("car", (1_i64,)).into_error();
    assert_eq!(env.check_error(), FuncallExit::Return);

    error.report(&env);
    assert_eq!(host.pending_exit().as_deref(), Some("(wrong-type-argument listp 1)"));
    let again = env.take_error().expect("reported error");
    assert_eq!(again, error);
}

#[test]
fn test_calls_fail_while_exit_pending() {
    let host = MockHost::new();
    let env = session(&host);
    env.signal("error", env.list(("pending",)).into_value()).into_value();
    let error = env.make_integer(1).into_error();
    assert_eq!(error.data().car_string(), "pending");
}

trait CarString {
    fn car_string(self) -> String;
}

impl CarString for Value<'_> {
    fn car_string(self) -> String {
        self.env().call("car", (self,)).and_then(Value::as_string).into_value()
    }
}

#[test]
fn test_make_error_shapes_data() {
    let host = MockHost::new();
    let env = session(&host);
    let error = env.make_error(c"range-error", "bad range");
    assert!(error.is_signal());
    assert_eq!(error.symbol().symbol_name().into_value(), "range-error");
    assert_eq!(error.data().car_string(), "bad range");
    assert_eq!(error.describe(), "(range-error (\"bad range\"))");
}

#[test]
fn test_fault_error_uses_first_kind_in_catch_order() {
    let host = MockHost::new();
    let env = session(&host);
    let fault = fault!(OutOfRange, "index {} too large", 9).also(FaultKind::Underflow);
    let error = env.fault_error(&fault);
    assert_eq!(error.symbol().symbol_name().into_value(), "underflow-error");
    assert_eq!(error.data().car_string(), "index 9 too large");
}

#[test]
fn test_result_fault_converts_to_signal() {
    let host = MockHost::new();
    let env = session(&host);
    let ok: Result<i64, Fault> = Ok(3);
    assert_eq!(ok.into_lisp(&env).and_then(Value::as_integer).into_value(), 3);

    let failed: Result<i64, Fault> = Err(Fault::memory_full("no room"));
    let error = failed.into_lisp(&env).into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "memory-full");
}

#[test]
fn test_interior_nul_in_symbol_name() {
    let host = MockHost::new();
    let env = session(&host);
    let error = env.intern("a\0b").into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "convert-error");
}

#[test]
fn test_emacs25_gating() {
    let host = MockHost::with_version(HostVersion::Emacs25);
    let env = session(&host);
    assert_eq!(env.version(), HostVersion::Emacs25);
    assert!(!env.supports(HostVersion::Emacs26));

    let error = env.make_time(Timestamp::new(1, 0).unwrap()).into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "error");
    assert!(error.data().car_string().contains("make_time"));

    assert!(!env.should_quit());
    host.request_quit();
    assert!(!env.should_quit());
    assert_eq!(env.process_input().into_value(), ProcessInputResult::Continue);
    assert!(env.make_unibyte_string(b"x").has_error());

    let nil = env.nil().into_value();
    assert!(env.open_channel(nil).has_error());
}

#[test]
fn test_emacs26_quit_fallback() {
    let host = MockHost::with_version(HostVersion::Emacs26);
    let env = session(&host);
    assert_eq!(env.process_input().into_value(), ProcessInputResult::Continue);
    host.request_quit();
    assert!(env.should_quit());
    assert_eq!(env.process_input().into_value(), ProcessInputResult::Quit);
    assert_eq!(env.check_error(), FuncallExit::Return);
}

#[test]
fn test_process_input_quit_leaves_signal_pending() {
    let host = MockHost::new();
    let env = session(&host);
    assert_eq!(env.process_input().into_value(), ProcessInputResult::Continue);
    host.request_quit();
    assert_eq!(env.process_input().into_value(), ProcessInputResult::Quit);
    assert_eq!(env.check_error(), FuncallExit::Signal);
    let quit = env.take_error().expect("pending quit");
    assert_eq!(quit.symbol().symbol_name().into_value(), "quit");
}

#[test]
fn test_open_channel_rejects_non_process() {
    let host = MockHost::new();
    let env = session(&host);
    let nil = env.nil().into_value();
    let error = env.open_channel(nil).into_error();
    assert_eq!(error.symbol().symbol_name().into_value(), "wrong-type-argument");
}
