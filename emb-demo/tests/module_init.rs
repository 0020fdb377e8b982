// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Loads the demo module into the fake host through its exported entry point.

use emb_host::prelude::*;
use emb_mock::MockHost;

const FUNCTIONS: &[&str] = &[
    "emb-demo-not-nil-p",
    "emb-demo-sum",
    "emb-demo-add",
    "emb-demo-greet",
    "emb-demo-checked-div",
    "emb-demo-fail",
    "emb-demo-make-counter",
    "emb-demo-counter-incr",
    "emb-demo-log",
];

fn load(host: &MockHost) -> Env {
    let status = unsafe { emb_demo::emacs_module_init(host.runtime()) };
    assert_eq!(status, 0);
    unsafe { Env::from_raw(host.env()) }
}

fn signal_symbol(error: &Error<'_>) -> String {
    error.symbol().symbol_name().into_value()
}

#[test]
fn test_module_loads() {
    let host = MockHost::new();
    let _env = load(&host);
    assert_eq!(host.features(), vec![emb_demo::FEATURE.to_owned()]);
    for name in FUNCTIONS {
        assert!(host.is_fbound(name), "{name}");
    }
    let version = format!("{:?}", env!("CARGO_PKG_VERSION"));
    assert_eq!(host.variable("emb-demo-version"), Some(version));
    assert_eq!(host.interactive_spec("emb-demo-greet").as_deref(), Some("\"sName: \""));
}

#[test]
fn test_exported_functions() {
    let host = MockHost::new();
    let env = load(&host);

    let nil = env.nil().into_value();
    assert!(env.call("emb-demo-not-nil-p", (nil,)).into_value().is_nil());
    assert!(env.call("emb-demo-not-nil-p", (0_i64,)).into_value().is_not_nil());

    assert_eq!(env.call("emb-demo-sum", (1_i64, 2_i64, 3_i64)).and_then(Value::as_integer).into_value(), 6);
    let overflow = env.call("emb-demo-sum", (i64::MAX, 1_i64)).into_error();
    assert_eq!(signal_symbol(&overflow), "overflow-error");

    assert_eq!(env.call("emb-demo-add", (40_i64, 2_i64)).and_then(Value::as_integer).into_value(), 42);
    let overflow = env.call("emb-demo-add", (i64::MAX, 1_i64)).into_error();
    assert_eq!(signal_symbol(&overflow), "overflow-error");
    assert_eq!(env.check_error(), FuncallExit::Return);
    let greeting = env.call("emb-demo-greet", ("Emacs",)).and_then(Value::as_string).into_value();
    assert_eq!(greeting, "Hello, Emacs!");

    assert_eq!(env.call("emb-demo-checked-div", (7_i64, 2_i64)).and_then(Value::as_integer).into_value(), 3);
    let error = env.call("emb-demo-checked-div", (7_i64, 0_i64)).into_error();
    assert_eq!(signal_symbol(&error), "range-error");
    assert_eq!(error.describe(), "(range-error (\"cannot divide 7 by 0\"))");

    let error = env.call("emb-demo-fail", ("boom",)).into_error();
    assert_eq!(error.describe(), "(error (\"boom\"))");
    assert_eq!(env.check_error(), FuncallExit::Return);

    let lines = env.call("emb-demo-log", ()).into_value();
    assert!(lines.is_nil() || lines.type_of().symbol_name().into_value() == "cons");
}

#[test]
fn test_counter_is_freed_by_host() {
    let host = MockHost::new();
    let env = load(&host);
    assert_eq!(emb_demo::live_counters(), 0);

    let counter = env.call("emb-demo-make-counter", ()).into_value();
    assert_eq!(counter.type_of().symbol_name().into_value(), "user-ptr");
    assert_eq!(emb_demo::live_counters(), 1);
    for expected in 1..=3_i64 {
        let count = env.call("emb-demo-counter-incr", (counter,)).and_then(Value::as_integer).into_value();
        assert_eq!(count, expected);
    }

    let error = env.call("emb-demo-counter-incr", (1_i64,)).into_error();
    assert_eq!(signal_symbol(&error), "convert-error");

    host.run_finalizers();
    assert_eq!(emb_demo::live_counters(), 0);
}

#[test]
fn test_loads_into_emacs25() {
    let host = MockHost::with_version(HostVersion::Emacs25);
    let env = load(&host);
    assert!(host.is_fbound("emb-demo-greet"));
    assert_eq!(host.interactive_spec("emb-demo-greet"), None);
    assert_eq!(env.call("emb-demo-add", (1_i64, 1_i64)).and_then(Value::as_integer).into_value(), 2);
}
