// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Module configuration and the init sequence behind `emacs_module_init`.

use std::{
    ffi::c_int,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use emb_error::{Expected, codes};
use emb_logging::{DEFAULT_CAPACITY, LogLevel};
use emb_sys::{HostVersion, RUNTIME_SIZE, emacs_runtime};

use crate::{DefunRegistry, Env, LispResult, logging};

/// Environment variable overriding the configured log level
pub const LOG_LEVEL_VAR: &str = "EMB_LOG_LEVEL";

/// Hook run after functions are bound and before the feature is provided
pub type SetupHook = for<'e> fn(&'e Env) -> LispResult<'e, ()>;

/// Outcome of module init, as returned to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStatus {
    /// Module loaded
    Ok,
    /// The runtime table is missing or smaller than expected
    RuntimeTooSmall,
    /// The environment table is older than the configured minimum version
    EnvTooSmall,
    /// A function failed to bind, the setup hook failed, or init panicked
    BindFailed,
    /// The feature could not be provided
    ProvideFailed,
}

impl InitStatus {
    /// Value returned from `emacs_module_init`; zero means success
    #[must_use]
    pub const fn code(self) -> c_int {
        match self {
            Self::Ok => 0,
            Self::RuntimeTooSmall => 1,
            Self::EnvTooSmall => 2,
            Self::BindFailed => 3,
            Self::ProvideFailed => 4,
        }
    }

    /// Diagnostic code used in log output
    #[must_use]
    pub const fn diagnostic(self) -> u16 {
        match self {
            Self::Ok => 0,
            Self::RuntimeTooSmall => codes::INIT_RUNTIME_TOO_SMALL,
            Self::EnvTooSmall => codes::INIT_ENV_TOO_SMALL,
            Self::BindFailed => codes::INIT_BIND_FAILED,
            Self::ProvideFailed => codes::INIT_PROVIDE_FAILED,
        }
    }
}

/// Settings applied by [`init_module`]
#[derive(Clone)]
pub struct ModuleConfig {
    feature: String,
    min_version: HostVersion,
    log_level: LogLevel,
    log_capacity: usize,
    define_errors: bool,
    echo_log: bool,
    setup: Option<SetupHook>,
}

impl ModuleConfig {
    /// Feature announced with `provide`
    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Oldest host the module loads into
    #[must_use]
    pub const fn min_version(&self) -> HostVersion {
        self.min_version
    }

    /// Least severe level kept in the log buffer
    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Number of log records buffered before the oldest are dropped
    #[must_use]
    pub const fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// Whether init defines the `convert-error` condition
    #[must_use]
    pub const fn defines_errors(&self) -> bool {
        self.define_errors
    }

    /// Whether init echoes buffered log lines through `message`
    #[must_use]
    pub const fn echoes_log(&self) -> bool {
        self.echo_log
    }
}

impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("feature", &self.feature)
            .field("min_version", &self.min_version)
            .field("log_level", &self.log_level)
            .field("log_capacity", &self.log_capacity)
            .field("define_errors", &self.define_errors)
            .field("echo_log", &self.echo_log)
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

/// Builder for [`ModuleConfig`]
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    config: ModuleConfig,
}

impl ModuleBuilder {
    /// Starts a configuration providing `feature`
    #[must_use]
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            config: ModuleConfig {
                feature: feature.into(),
                min_version: HostVersion::Emacs25,
                log_level: LogLevel::default(),
                log_capacity: DEFAULT_CAPACITY,
                define_errors: true,
                echo_log: false,
                setup: None,
            },
        }
    }

    /// Refuses to load into hosts older than `version`
    #[must_use]
    pub fn with_min_version(mut self, version: HostVersion) -> Self {
        self.config.min_version = version;
        self
    }

    /// Sets the least severe level kept in the log buffer
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    /// Sets how many log records are buffered
    #[must_use]
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    /// Whether to `define-error` the `convert-error` condition (default on)
    #[must_use]
    pub fn define_errors(mut self, enabled: bool) -> Self {
        self.config.define_errors = enabled;
        self
    }

    /// Whether to echo log lines buffered during init (default off)
    #[must_use]
    pub fn echo_log(mut self, enabled: bool) -> Self {
        self.config.echo_log = enabled;
        self
    }

    /// Runs `hook` after binding functions and before providing the feature
    #[must_use]
    pub fn with_setup(mut self, hook: SetupHook) -> Self {
        self.config.setup = Some(hook);
        self
    }

    /// Applies the `EMB_LOG_LEVEL` environment variable, if set.
    ///
    /// Unrecognized values fall back to the default level.
    #[must_use]
    pub fn from_env(self) -> Self {
        let value = std::env::var(LOG_LEVEL_VAR).ok();
        self.with_log_level_override(value.as_deref())
    }

    fn with_log_level_override(self, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_log_level(LogLevel::from_string_or_default(value)),
            None => self,
        }
    }

    /// Finishes the configuration
    #[must_use]
    pub fn build(self) -> ModuleConfig {
        self.config
    }
}

fn bind(env: &Env, config: &ModuleConfig, register: fn(&mut DefunRegistry)) -> InitStatus {
    if config.define_errors {
        let defined = env
            .intern("convert-error")
            .and_then(|symbol| env.call("define-error", (symbol, "Conversion error")));
        if let Expected::Unexpected(error) = defined {
            log::error!("[E{}] define-error: {}", codes::INIT_BIND_FAILED, error.describe());
            return InitStatus::BindFailed;
        }
    }

    let mut registry = DefunRegistry::new();
    register(&mut registry);
    if registry.def(env).has_error() {
        return InitStatus::BindFailed;
    }

    if let Some(setup) = config.setup {
        if let Expected::Unexpected(error) = setup(env) {
            log::error!("[E{}] setup hook: {}", codes::INIT_BIND_FAILED, error.describe());
            return InitStatus::BindFailed;
        }
    }

    if let Expected::Unexpected(error) = env.provide(&config.feature) {
        log::error!("[E{}] provide {}: {}", codes::INIT_PROVIDE_FAILED, config.feature, error.describe());
        return InitStatus::ProvideFailed;
    }

    log::info!("{} loaded into Emacs {}", config.feature, env.version().major());
    InitStatus::Ok
}

/// Initializes a module; called by the `emacs_module_init` that
/// [`emacs_module!`](crate::emacs_module) exports.
///
/// In order: checks the runtime and environment table sizes, installs the
/// logger, defines `convert-error`, binds the functions `register` adds, runs
/// the setup hook and provides the feature. Returns an [`InitStatus`] code.
/// Panics are trapped and reported as [`InitStatus::BindFailed`].
///
/// # Safety
///
/// `runtime` must be null or the runtime table the host passes at load time.
pub unsafe fn init_module(
    runtime: *mut emacs_runtime,
    config: ModuleConfig,
    register: fn(&mut DefunRegistry),
) -> c_int {
    if runtime.is_null() {
        return InitStatus::RuntimeTooSmall.code();
    }
    // SAFETY: non-null runtime tables are live for the duration of init.
    let runtime_size = unsafe { (*runtime).size };
    if usize::try_from(runtime_size).map_or(true, |size| size < RUNTIME_SIZE) {
        return InitStatus::RuntimeTooSmall.code();
    }

    // SAFETY: the table is at least as large as `emacs_runtime`.
    let raw = unsafe { ((*runtime).get_environment)(runtime) };
    if raw.is_null() {
        return InitStatus::EnvTooSmall.code();
    }
    // SAFETY: the host returned a live environment table.
    let env_size = unsafe { (*raw).size };
    match HostVersion::from_env_size(env_size) {
        Some(version) if version >= config.min_version => {}
        _ => return InitStatus::EnvTooSmall.code(),
    }
    // SAFETY: checked non-null and at least the Emacs 25 size above.
    let env = unsafe { Env::from_raw(raw) };

    if let Err(error) = emb_logging::install(config.log_level, config.log_capacity) {
        // Another logger owns the facade; it gets the records instead.
        log::warn!("{}: log buffer unavailable: {error}", config.feature);
    }

    let status = match panic::catch_unwind(AssertUnwindSafe(|| bind(&env, &config, register))) {
        Ok(status) => status,
        Err(_) => {
            log::error!("[E{}] panic during init of {}", codes::INIT_BIND_FAILED, config.feature);
            InitStatus::BindFailed
        }
    };

    if config.echo_log && logging::flush_to_messages(&env).has_error() {
        env.clear_error();
    }
    status.code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ModuleBuilder::new("my-module").build();
        assert_eq!(config.feature(), "my-module");
        assert_eq!(config.min_version(), HostVersion::Emacs25);
        assert_eq!(config.log_level(), LogLevel::Info);
        assert_eq!(config.log_capacity(), DEFAULT_CAPACITY);
        assert!(config.defines_errors());
        assert!(!config.echoes_log());
    }

    #[test]
    fn test_builder_chain() {
        fn setup(_env: &Env) -> LispResult<'_, ()> {
            Expected::Value(())
        }

        let config = ModuleBuilder::new("m")
            .with_min_version(HostVersion::Emacs27)
            .with_log_level(LogLevel::Debug)
            .with_log_capacity(8)
            .define_errors(false)
            .echo_log(true)
            .with_setup(setup)
            .build();
        assert_eq!(config.min_version(), HostVersion::Emacs27);
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.log_capacity(), 8);
        assert!(!config.defines_errors());
        assert!(config.echoes_log());
        assert!(format!("{config:?}").contains("setup: true"));
    }

    #[test]
    fn test_log_level_override() {
        let builder = ModuleBuilder::new("m").with_log_level(LogLevel::Warn);
        assert_eq!(builder.clone().with_log_level_override(None).build().log_level(), LogLevel::Warn);
        assert_eq!(
            builder.clone().with_log_level_override(Some("trace")).build().log_level(),
            LogLevel::Trace
        );
        assert_eq!(builder.with_log_level_override(Some("loud")).build().log_level(), LogLevel::Info);
    }

    #[test]
    fn test_init_status_codes() {
        assert_eq!(InitStatus::Ok.code(), 0);
        assert_eq!(InitStatus::RuntimeTooSmall.code(), 1);
        assert_eq!(InitStatus::EnvTooSmall.code(), 2);
        assert_eq!(InitStatus::BindFailed.code(), 3);
        assert_eq!(InitStatus::ProvideFailed.code(), 4);
        assert_eq!(InitStatus::ProvideFailed.diagnostic(), codes::INIT_PROVIDE_FAILED);
    }

    #[test]
    fn test_null_runtime() {
        let status = unsafe { init_module(std::ptr::null_mut(), ModuleBuilder::new("m").build(), |_| {}) };
        assert_eq!(status, InitStatus::RuntimeTooSmall.code());
    }
}
