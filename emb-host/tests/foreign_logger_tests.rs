// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module init when the embedding process already installed a logger.
//!
//! Lives in its own test binary: the `log` facade accepts one logger per
//! process.

use std::sync::Mutex;

use emb_host::{module::InitStatus, prelude::*};
use emb_mock::MockHost;
use log::{Log, Metadata, Record};

struct Collector(Mutex<Vec<String>>);

impl Log for Collector {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.0.lock().unwrap().push(format!("{}: {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

static COLLECTOR: Collector = Collector(Mutex::new(Vec::new()));

fn register(registry: &mut DefunRegistry) {
    registry.add(Defun::universal("emb-foreign-add", "Add.", |_: &Env, a: i64, b: i64| a + b));
}

#[test]
fn test_init_with_foreign_logger() {
    log::set_logger(&COLLECTOR).unwrap();
    log::set_max_level(log::LevelFilter::Trace);

    let host = MockHost::new();
    let config = ModuleBuilder::new("emb-foreign").build();
    let status = unsafe { init_module(host.runtime(), config, register) };
    assert_eq!(status, InitStatus::Ok.code());
    assert_eq!(host.features(), vec!["emb-foreign".to_owned()]);
    assert!(emb_logging::installed().is_none());

    let env = unsafe { Env::from_raw(host.env()) };
    assert_eq!(env.call("emb-foreign-add", (2_i64, 3_i64)).and_then(Value::as_integer).into_value(), 5);

    let lines = COLLECTOR.0.lock().unwrap();
    assert!(lines.iter().any(|line| line.starts_with("WARN: emb-foreign: log buffer unavailable")), "{lines:?}");
}
