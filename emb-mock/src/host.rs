// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Interpreter state shared by the function table and the builtins.

use std::{
    cell::{Cell, RefCell},
    ptr,
};

use emb_sys::{
    emacs_env, emacs_funcall_exit, emacs_funcall_exit_signal, emacs_funcall_exit_throw,
    emacs_value,
};

use crate::{
    builtins,
    heap::{Heap, Id, Object},
};

/// A pending non-local exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pending {
    pub status: emacs_funcall_exit,
    pub first: Id,
    pub second: Id,
}

/// Result of evaluating or calling something
pub(crate) type Outcome = Result<Id, Pending>;

const MAX_ALIAS_DEPTH: usize = 16;

pub(crate) struct Host {
    pub heap: RefCell<Heap>,
    pub pending: Cell<Option<Pending>>,
    pub quit: Cell<bool>,
    pub messages: RefCell<Vec<String>>,
    pub env: Cell<*mut emacs_env>,
}

impl Host {
    pub(crate) fn new() -> Self {
        let mut heap = Heap::new();
        builtins::install(&mut heap);
        Self {
            heap: RefCell::new(heap),
            pending: Cell::new(None),
            quit: Cell::new(false),
            messages: RefCell::new(Vec::new()),
            env: Cell::new(ptr::null_mut()),
        }
    }

    pub(crate) fn nil(&self) -> Id {
        self.heap.borrow().nil
    }

    /// Makes `pending` the current exit unless one is already pending
    pub(crate) fn raise(&self, pending: Pending) {
        if self.pending.get().is_none() {
            self.pending.set(Some(pending));
        }
    }

    pub(crate) fn signal(&self, symbol: &str, data: &[Id]) -> Pending {
        let mut heap = self.heap.borrow_mut();
        let first = heap.intern(symbol);
        let second = heap.list(data);
        Pending { status: emacs_funcall_exit_signal, first, second }
    }

    pub(crate) fn signal_with(&self, symbol: Id, data: Id) -> Pending {
        Pending { status: emacs_funcall_exit_signal, first: symbol, second: data }
    }

    pub(crate) fn throw(&self, tag: Id, value: Id) -> Pending {
        Pending { status: emacs_funcall_exit_throw, first: tag, second: value }
    }

    /// `(error MESSAGE)`
    pub(crate) fn error(&self, message: &str) -> Pending {
        let message = self.heap.borrow_mut().text(message);
        self.signal("error", &[message])
    }

    /// `(wrong-type-argument PREDICATE VALUE)`
    pub(crate) fn wrong_type(&self, predicate: &str, value: Id) -> Pending {
        let predicate = self.heap.borrow_mut().intern(predicate);
        self.signal("wrong-type-argument", &[predicate, value])
    }

    /// `(args-out-of-range OBJECT INDEX)`
    pub(crate) fn out_of_range(&self, object: Id, index: i64) -> Pending {
        let index = self.heap.borrow_mut().int(index);
        self.signal("args-out-of-range", &[object, index])
    }

    /// Object id behind a handle
    pub(crate) fn value(&self, value: emacs_value) -> Outcome {
        let id = self.heap.borrow().id(value);
        id.ok_or_else(|| self.error("invalid value handle"))
    }

    pub(crate) fn handle(&self, id: Id) -> emacs_value {
        self.heap.borrow().handle(id)
    }

    pub(crate) fn int_value(&self, id: Id) -> Result<i64, Pending> {
        let n = match self.heap.borrow().get(id) {
            Some(Object::Int(n)) => Some(*n),
            _ => None,
        };
        n.ok_or_else(|| self.wrong_type("integerp", id))
    }

    pub(crate) fn symbol_value(&self, id: Id) -> Outcome {
        let value = self.heap.borrow().symbol(id).map(|symbol| symbol.value);
        match value {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(self.signal("void-variable", &[id])),
            None => Err(self.wrong_type("symbolp", id)),
        }
    }

    /// Follows symbol function cells to a function object
    fn resolve(&self, function: Id) -> Outcome {
        let mut current = function;
        for _ in 0..MAX_ALIAS_DEPTH {
            let heap = self.heap.borrow();
            let Some(symbol) = heap.symbol(current) else {
                return Ok(current);
            };
            let cell = symbol.function;
            drop(heap);
            match cell {
                Some(next) => current = next,
                None => return Err(self.signal("void-function", &[function])),
            }
        }
        Err(self.signal("cyclic-function-indirection", &[function]))
    }

    /// Calls `function` with `args`
    pub(crate) fn funcall(&self, function: Id, args: &[Id]) -> Outcome {
        enum Callee {
            Subr(crate::heap::Subr),
            Module { min: isize, max: isize, func: emb_sys::emacs_function, data: *mut libc::c_void },
            Invalid,
        }

        let target = self.resolve(function)?;
        let callee = match self.heap.borrow().get(target) {
            Some(Object::Subr(subr)) => Callee::Subr(*subr),
            Some(Object::Module(module)) => {
                Callee::Module { min: module.min, max: module.max, func: module.func, data: module.data }
            }
            _ => Callee::Invalid,
        };

        let nargs = args.len() as isize;
        match callee {
            Callee::Invalid => Err(self.signal("invalid-function", &[function])),
            Callee::Subr(subr) => {
                if args.len() < subr.min || subr.max.is_some_and(|max| args.len() > max) {
                    let given = self.heap.borrow_mut().int(nargs as i64);
                    return Err(self.signal("wrong-number-of-arguments", &[function, given]));
                }
                (subr.func)(self, args)
            }
            Callee::Module { min, max, func, data } => {
                if nargs < min || (max >= 0 && nargs > max) {
                    let given = self.heap.borrow_mut().int(nargs as i64);
                    return Err(self.signal("wrong-number-of-arguments", &[function, given]));
                }
                let mut raw: Vec<emacs_value> = args.iter().map(|&arg| self.handle(arg)).collect();
                // SAFETY: the module registered `func` and `data` together;
                // the environment is this host's table.
                let result = unsafe { func(self.env.get(), nargs, raw.as_mut_ptr(), data) };
                if let Some(pending) = self.pending.take() {
                    return Err(pending);
                }
                let id = self.heap.borrow().id(result);
                Ok(id.unwrap_or_else(|| self.nil()))
            }
        }
    }

    /// Evaluates `form`
    pub(crate) fn eval(&self, form: Id) -> Outcome {
        enum Form {
            Constant,
            Variable,
            Call { head: Id, rest: Id, special: Option<&'static str> },
        }

        let kind = {
            let heap = self.heap.borrow();
            match heap.get(form) {
                Some(Object::Symbol(symbol)) => {
                    if form == heap.nil || form == heap.t || symbol.name.starts_with(':') {
                        Form::Constant
                    } else {
                        Form::Variable
                    }
                }
                Some(Object::Cons(head, rest)) => {
                    let special = match heap.symbol_name(*head) {
                        Some("quote") => Some("quote"),
                        Some("defvar") => Some("defvar"),
                        Some("progn") => Some("progn"),
                        _ => None,
                    };
                    Form::Call { head: *head, rest: *rest, special }
                }
                _ => Form::Constant,
            }
        };

        match kind {
            Form::Constant => Ok(form),
            Form::Variable => self.symbol_value(form),
            Form::Call { head, rest, special } => {
                let items = self.heap.borrow().list_items(rest);
                let items = items.ok_or_else(|| self.wrong_type("listp", rest))?;
                match special {
                    Some("quote") => match items.as_slice() {
                        [quoted] => Ok(*quoted),
                        _ => Err(self.wrong_arity(head, items.len())),
                    },
                    Some("defvar") => self.defvar(head, &items),
                    Some("progn") => {
                        let mut last = self.nil();
                        for item in items {
                            last = self.eval(item)?;
                        }
                        Ok(last)
                    }
                    _ => {
                        let mut args = Vec::with_capacity(items.len());
                        for item in items {
                            args.push(self.eval(item)?);
                        }
                        self.funcall(head, &args)
                    }
                }
            }
        }
    }

    fn wrong_arity(&self, head: Id, given: usize) -> Pending {
        let given = self.heap.borrow_mut().int(given as i64);
        self.signal("wrong-number-of-arguments", &[head, given])
    }

    fn defvar(&self, head: Id, items: &[Id]) -> Outcome {
        let Some((&symbol, rest)) = items.split_first() else {
            return Err(self.wrong_arity(head, 0));
        };
        if rest.len() > 2 {
            return Err(self.wrong_arity(head, items.len()));
        }
        let bound = self.heap.borrow().symbol(symbol).map(|entry| entry.value.is_some());
        let Some(bound) = bound else {
            return Err(self.wrong_type("symbolp", symbol));
        };
        if let Some(&init) = rest.first() {
            if !bound {
                let value = self.eval(init)?;
                if let Some(entry) = self.heap.borrow_mut().symbol_mut(symbol) {
                    entry.value = Some(value);
                }
            }
        }
        if let Some(&doc) = rest.get(1) {
            let mut heap = self.heap.borrow_mut();
            let prop = heap.intern("variable-documentation");
            heap.put_prop(symbol, prop, doc);
        }
        Ok(symbol)
    }
}
