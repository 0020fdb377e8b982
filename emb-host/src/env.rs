// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The per-call session wrapping the host's function table.

use std::{
    ffi::{CStr, CString, c_void},
    fmt, mem, ptr,
};

use emb_error::{Expected, Fault, FaultKind, emb_try};
use emb_sys::{HostVersion, emacs_env, emacs_function, emacs_value, ptrdiff_t, timespec};

use crate::{
    Callable, Error, FuncallExit, IntoLisp, IntoLispArgs, LispResult, ProcessInputResult, Timestamp,
    UniversalFn, Value, WrappedFn, trampoline, value::Finalizer,
};

/// Session for one host-invoked call.
///
/// An `Env` is valid for the dynamic extent of the call that produced it (a
/// module function call or module init). It must not be stored and used
/// later; doing so is undefined behaviour the host cannot detect. Values it
/// hands out borrow it, so the borrow checker keeps them inside that extent.
///
/// Every operation that can fail returns a [`LispResult`]. When the host
/// reports a signal or throw, the pending exit is captured into an [`Error`]
/// and cleared, so the next host call starts from a clean state.
pub struct Env {
    raw: *mut emacs_env,
    version: HostVersion,
}

impl Env {
    /// Wraps the environment table of the current call.
    ///
    /// # Safety
    ///
    /// `raw` must be the non-null environment the host passed to the current
    /// call (or returned from `get_environment` during module init), and its
    /// declared size must cover at least the Emacs 25 table.
    #[must_use]
    pub unsafe fn from_raw(raw: *mut emacs_env) -> Self {
        // SAFETY: the caller guarantees `raw` points at a live table.
        let size = unsafe { (*raw).size };
        let version = HostVersion::from_env_size(size).unwrap_or(HostVersion::Emacs25);
        Self { raw, version }
    }

    /// The raw environment table
    #[must_use]
    pub const fn raw(&self) -> *mut emacs_env {
        self.raw
    }

    /// Host version detected from the table size
    #[must_use]
    pub const fn version(&self) -> HostVersion {
        self.version
    }

    /// Whether the host is at least `version`
    #[must_use]
    pub fn supports(&self, version: HostVersion) -> bool {
        self.version >= version
    }

    pub(crate) fn require(&self, version: HostVersion, operation: &str) -> LispResult<'_, ()> {
        if self.supports(version) {
            Expected::Value(())
        } else {
            Expected::Unexpected(self.make_error(
                c"error",
                &format!("{operation} requires Emacs {} (host is {})", version.major(), self.version.major()),
            ))
        }
    }

    // ---- non-local exits ------------------------------------------------

    /// Pending exit state; never fails
    #[must_use]
    pub fn check_error(&self) -> FuncallExit {
        FuncallExit::from_raw(raw_call!(self, non_local_exit_check))
    }

    /// Reads the pending exit without clearing it.
    ///
    /// Returns `None` when no exit is pending.
    #[must_use]
    pub fn get_error(&self) -> Option<Error<'_>> {
        let mut first: emacs_value = ptr::null_mut();
        let mut second: emacs_value = ptr::null_mut();
        let status = raw_call!(self, non_local_exit_get, &raw mut first, &raw mut second);
        Error::from_exit(FuncallExit::from_raw(status), Value::new(first, self), Value::new(second, self))
    }

    /// Forgets the pending exit
    pub fn clear_error(&self) {
        raw_call!(self, non_local_exit_clear);
    }

    /// Reads and clears the pending exit
    pub fn take_error(&self) -> Option<Error<'_>> {
        let error = self.get_error();
        if error.is_some() {
            self.clear_error();
        }
        error
    }

    /// Requests a signal once the current call returns; no-op if an exit is pending
    pub fn signal_error(&self, error: &Error<'_>) {
        raw_call!(self, non_local_exit_signal, error.symbol().raw(), error.data().raw());
    }

    /// Requests a throw once the current call returns; no-op if an exit is pending
    pub fn throw_error(&self, error: &Error<'_>) {
        raw_call!(self, non_local_exit_throw, error.tag().raw(), error.value().raw());
    }

    /// Requests the exit `error` describes, by its status
    pub fn non_local_exit(&self, error: &Error<'_>) {
        match error.status() {
            FuncallExit::Signal => self.signal_error(error),
            FuncallExit::Throw => self.throw_error(error),
            FuncallExit::Return => {}
        }
    }

    /// Signals `symbol` with `data`.
    ///
    /// Does nothing while another exit is pending; the first exit wins.
    pub fn signal<'e, D: IntoLisp<'e>>(&'e self, symbol: &str, data: D) -> LispResult<'e, ()> {
        if self.check_error() != FuncallExit::Return {
            return Expected::Value(());
        }
        let symbol = emb_try!(self.intern(symbol));
        let data = emb_try!(data.into_lisp(self));
        self.signal_error(&Error::signal(symbol, data));
        Expected::Value(())
    }

    /// Throws `value` to `tag`; a no-op while another exit is pending
    pub fn throw<'e, V: IntoLisp<'e>>(&'e self, tag: Value<'e>, value: V) -> LispResult<'e, ()> {
        if self.check_error() != FuncallExit::Return {
            return Expected::Value(());
        }
        let value = emb_try!(value.into_lisp(self));
        self.throw_error(&Error::throw(tag, value));
        Expected::Value(())
    }

    /// Turns the exit state after a host call into a result
    pub(crate) fn check<T>(&self, ret: T) -> LispResult<'_, T> {
        match self.check_error() {
            FuncallExit::Return => Expected::Value(ret),
            FuncallExit::Signal | FuncallExit::Throw => Expected::Unexpected(self.capture()),
        }
    }

    fn capture(&self) -> Error<'_> {
        match self.take_error() {
            Some(error) => error,
            None => self.make_error(c"error", "non-local exit vanished before capture"),
        }
    }

    /// A signal of `symbol` whose data is `(list message)`.
    ///
    /// Built from raw host calls only. If the host fails while building it,
    /// that failure is returned instead.
    pub fn make_error(&self, symbol: &CStr, message: &str) -> Error<'_> {
        let symbol = raw_call!(self, intern, symbol.as_ptr());
        let text = raw_call!(self, make_string, message.as_ptr().cast(), message.len() as ptrdiff_t);
        let list = raw_call!(self, intern, c"list".as_ptr());
        let mut args = [text];
        let data = raw_call!(self, funcall, list, 1, args.as_mut_ptr());
        match self.take_error() {
            Some(error) => error,
            None => Error::signal(Value::new(symbol, self), Value::new(data, self)),
        }
    }

    /// The host signal a native fault maps to
    pub fn fault_error(&self, fault: &Fault) -> Error<'_> {
        self.make_error(fault.signal_symbol(), fault.message())
    }

    pub(crate) fn convert_fault<T>(&self, result: Result<T, Fault>) -> LispResult<'_, T> {
        match result {
            Ok(value) => Expected::Value(value),
            Err(fault) => Expected::Unexpected(self.fault_error(&fault)),
        }
    }

    pub(crate) fn index(&self, index: usize) -> LispResult<'_, ptrdiff_t> {
        self.convert_fault(ptrdiff_t::try_from(index).map_err(|_| Fault::new(FaultKind::OutOfRange, "index too large")))
    }

    fn c_string(&self, text: &str) -> LispResult<'_, CString> {
        self.convert_fault(
            CString::new(text).map_err(|e| Fault::convert(format!("interior NUL at byte {}", e.nul_position()))),
        )
    }

    // ---- symbols and calls ----------------------------------------------

    /// The canonical symbol named `name`
    pub fn intern(&self, name: &str) -> LispResult<'_, Value<'_>> {
        let name = emb_try!(self.c_string(name));
        let raw = raw_call!(self, intern, name.as_ptr());
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// `nil`
    pub fn nil(&self) -> LispResult<'_, Value<'_>> {
        self.intern("nil")
    }

    /// `t`
    pub fn t(&self) -> LispResult<'_, Value<'_>> {
        self.intern("t")
    }

    /// Calls `function` with `args`.
    ///
    /// Arguments are converted left to right; the first conversion failure is
    /// returned without calling the host. A signal or throw raised by the
    /// call is captured and cleared.
    pub fn call<'e, F, A>(&'e self, function: F, args: A) -> LispResult<'e, Value<'e>>
    where
        F: Callable<'e>,
        A: IntoLispArgs<'e>,
    {
        let function = emb_try!(function.into_function(self));
        let mut args = emb_try!(args.into_lisp_args(self));
        let args = args.as_mut();
        log::trace!("funcall {:?} with {} argument(s)", function, args.len());
        let raw = raw_call!(self, funcall, function.raw(), args.len() as ptrdiff_t, args.as_mut_ptr());
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// A callable bound to `name`
    #[must_use]
    pub fn import<'e>(&'e self, name: &'e str) -> Imported<'e> {
        Imported { env: self, name }
    }

    /// `(list args...)`
    pub fn list<'e, A: IntoLispArgs<'e>>(&'e self, args: A) -> LispResult<'e, Value<'e>> {
        self.call("list", args)
    }

    /// `(vector args...)`
    pub fn vector<'e, A: IntoLispArgs<'e>>(&'e self, args: A) -> LispResult<'e, Value<'e>> {
        self.call("vector", args)
    }

    /// `(eval form t)`, evaluating with lexical binding
    pub fn eval<'e, T: IntoLisp<'e>>(&'e self, form: T) -> LispResult<'e, Value<'e>> {
        let lexical = emb_try!(self.t());
        self.call("eval", (form, lexical))
    }

    /// `(defalias 'name definition)`
    pub fn defalias<'e>(&'e self, name: &str, definition: Value<'e>) -> LispResult<'e, ()> {
        let symbol = emb_try!(self.intern(name));
        self.call("defalias", (symbol, definition)).discard()
    }

    /// `(provide 'feature)`
    pub fn provide(&self, feature: &str) -> LispResult<'_, ()> {
        let feature = emb_try!(self.intern(feature));
        self.call("provide", (feature,)).discard()
    }

    /// `(defvar name 'init doc)`.
    ///
    /// `defvar` is a special form, so this goes through `eval`. The initial
    /// value is quoted and is not evaluated.
    pub fn defvar<'e, T: IntoLisp<'e>>(&'e self, name: &str, init: T, doc: &str) -> LispResult<'e, ()> {
        let defvar = emb_try!(self.intern("defvar"));
        let symbol = emb_try!(self.intern(name));
        let quote = emb_try!(self.intern("quote"));
        let quoted = emb_try!(self.list((quote, init)));
        let form = emb_try!(self.list((defvar, symbol, quoted, doc)));
        self.eval(form).discard()
    }

    /// Displays a formatted message in the echo area and `*Messages*`.
    ///
    /// Formatting happens on the Rust side; the host receives `"%s"` and the
    /// finished text, so `%` in the output is never reinterpreted.
    pub fn message(&self, args: fmt::Arguments<'_>) -> LispResult<'_, Value<'_>> {
        let text = fmt::format(args);
        self.call("message", ("%s", text))
    }

    // ---- constructors ---------------------------------------------------

    /// Integer
    pub fn make_integer(&self, n: i64) -> LispResult<'_, Value<'_>> {
        let raw = raw_call!(self, make_integer, n);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Float
    pub fn make_float(&self, d: f64) -> LispResult<'_, Value<'_>> {
        let raw = raw_call!(self, make_float, d);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Multibyte string from UTF-8 text
    pub fn make_string(&self, text: &str) -> LispResult<'_, Value<'_>> {
        self.make_string_from_bytes(text.as_bytes())
    }

    /// Multibyte string from bytes the host decodes as UTF-8.
    ///
    /// Embedded NULs are allowed. Bytes that are not UTF-8 make the host
    /// signal.
    pub fn make_string_from_bytes(&self, bytes: &[u8]) -> LispResult<'_, Value<'_>> {
        let raw = raw_call!(self, make_string, bytes.as_ptr().cast(), bytes.len() as ptrdiff_t);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Unibyte string holding `bytes` verbatim (Emacs 28)
    pub fn make_unibyte_string(&self, bytes: &[u8]) -> LispResult<'_, Value<'_>> {
        emb_try!(self.require(HostVersion::Emacs28, "make_unibyte_string"));
        let raw = raw_call!(self, make_unibyte_string, bytes.as_ptr().cast(), bytes.len() as ptrdiff_t);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Time value for `time` (Emacs 27)
    pub fn make_time(&self, time: Timestamp) -> LispResult<'_, Value<'_>> {
        emb_try!(self.require(HostVersion::Emacs27, "make_time"));
        let secs = emb_try!(self.convert_fault(
            libc::time_t::try_from(time.secs()).map_err(|_| Fault::overflow("time out of range")),
        ));
        // SAFETY: timespec is plain old data; all-zero is a valid value and
        // covers any padding fields the platform adds.
        let mut spec: timespec = unsafe { mem::zeroed() };
        spec.tv_sec = secs;
        spec.tv_nsec = time.subsec_nanos() as _;
        let raw = raw_call!(self, make_time, spec);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// User-pointer object wrapping `ptr`, finalized by `fin` on collection
    pub fn make_user_ptr(&self, ptr: *mut c_void, fin: Option<Finalizer>) -> LispResult<'_, Value<'_>> {
        let raw = raw_call!(self, make_user_ptr, fin, ptr);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Module function calling `func` directly with `data`.
    ///
    /// `func` is responsible for never unwinding into the host.
    pub fn make_raw_function(
        &self,
        min_arity: usize,
        max_arity: Option<usize>,
        func: emacs_function,
        doc: &str,
        data: *mut c_void,
    ) -> LispResult<'_, Value<'_>> {
        let doc = emb_try!(self.c_string(doc));
        let min = emb_try!(self.index(min_arity));
        let max = match max_arity {
            Some(max) => emb_try!(self.index(max)),
            None => emb_sys::emacs_variadic_function,
        };
        let raw = raw_call!(self, make_function, min, max, func, doc.as_ptr(), data);
        self.check(raw).map(|raw| Value::new(raw, self))
    }

    /// Module function backed by a [`WrappedFn`]
    pub fn make_wrapped_function(
        &self,
        min_arity: usize,
        max_arity: Option<usize>,
        func: WrappedFn,
        doc: &str,
    ) -> LispResult<'_, Value<'_>> {
        self.make_raw_function(min_arity, max_arity, trampoline::wrapped, doc, func as *mut c_void)
    }

    /// Module function backed by a [`UniversalFn`].
    ///
    /// The closure is boxed and owned by the host function. On Emacs 28 the
    /// box is dropped when the host collects the function; on older hosts it
    /// lives for the rest of the process.
    pub fn make_universal_function<F, Sig>(&self, func: F, doc: &str) -> LispResult<'_, Value<'_>>
    where
        F: UniversalFn<Sig>,
    {
        let data = Box::into_raw(Box::new(func)).cast::<c_void>();
        let function = self.make_raw_function(F::ARITY, Some(F::ARITY), trampoline::universal::<F, Sig>, doc, data);
        let function = match function {
            Expected::Value(function) => function,
            Expected::Unexpected(error) => {
                // SAFETY: the host rejected the function, so nothing else owns `data`.
                drop(unsafe { Box::from_raw(data.cast::<F>()) });
                return Expected::Unexpected(error);
            }
        };
        if self.supports(HostVersion::Emacs28) {
            emb_try!(function.set_function_finalizer(Some(trampoline::drop_boxed::<F>)));
        }
        Expected::Value(function)
    }

    // ---- host cooperation -----------------------------------------------

    /// Whether the user asked to quit (Emacs 26; `false` on older hosts)
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.supports(HostVersion::Emacs26) && raw_call!(self, should_quit)
    }

    /// Lets the host process pending input (Emacs 27).
    ///
    /// On Emacs 26 this falls back to [`Env::should_quit`]. A `Quit` answer
    /// means the current operation should stop and return promptly.
    pub fn process_input(&self) -> LispResult<'_, ProcessInputResult> {
        if !self.supports(HostVersion::Emacs27) {
            let quit = if self.should_quit() { ProcessInputResult::Quit } else { ProcessInputResult::Continue };
            return Expected::Value(quit);
        }
        match ProcessInputResult::from_raw(raw_call!(self, process_input)) {
            // The host leaves a `quit` signal pending; returning lets it run.
            ProcessInputResult::Quit => Expected::Value(ProcessInputResult::Quit),
            ProcessInputResult::Continue => self.check(ProcessInputResult::Continue),
        }
    }

    /// File descriptor writing to a pipe process (Emacs 28)
    pub fn open_channel<'e>(&'e self, process: Value<'e>) -> LispResult<'e, i32> {
        emb_try!(self.require(HostVersion::Emacs28, "open_channel"));
        let fd = raw_call!(self, open_channel, process.raw());
        self.check(fd)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").field("raw", &self.raw).field("version", &self.version).finish()
    }
}

/// A host function bound by name, see [`Env::import`]
#[derive(Debug, Clone, Copy)]
pub struct Imported<'e> {
    env: &'e Env,
    name: &'e str,
}

impl<'e> Imported<'e> {
    /// Calls the function with `args`
    pub fn call<A: IntoLispArgs<'e>>(&self, args: A) -> LispResult<'e, Value<'e>> {
        self.env.call(self.name, args)
    }

    /// The bound name
    #[must_use]
    pub const fn name(&self) -> &'e str {
        self.name
    }
}
