// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Object storage of the fake host.
//!
//! Objects are never collected. A handle is the object id shifted left by
//! three bits with the type tag in the low bits, the layout real hosts use
//! for their object words.

use std::{collections::HashMap, ffi::c_void};

use emb_sys::{emacs_finalizer, emacs_function, emacs_value};

use crate::host::{Host, Outcome};

/// Index of an object, starting at 1
pub(crate) type Id = usize;

const TAG_BITS: u32 = 3;
const TAG_MASK: usize = (1 << TAG_BITS) - 1;

pub(crate) struct Symbol {
    pub name: String,
    pub value: Option<Id>,
    pub function: Option<Id>,
    pub plist: Vec<(Id, Id)>,
}

/// Builtin function implemented by the fake host
#[derive(Clone, Copy)]
pub(crate) struct Subr {
    pub name: &'static str,
    pub min: usize,
    pub max: Option<usize>,
    pub func: fn(&Host, &[Id]) -> Outcome,
}

pub(crate) struct ModuleFunction {
    pub min: isize,
    pub max: isize,
    pub func: emacs_function,
    pub data: *mut c_void,
    pub doc: String,
    pub finalizer: Option<emacs_finalizer>,
    pub interactive: Option<Id>,
}

pub(crate) enum Object {
    Symbol(Symbol),
    Int(i64),
    Float(f64),
    Str { bytes: Vec<u8>, multibyte: bool },
    Vector(Vec<Id>),
    Cons(Id, Id),
    UserPtr { ptr: *mut c_void, finalizer: Option<emacs_finalizer> },
    Subr(Subr),
    Module(ModuleFunction),
}

impl Object {
    fn tag(&self) -> usize {
        match self {
            Self::Symbol(_) => 0,
            Self::Int(_) => 2,
            Self::Cons(..) => 3,
            Self::Str { .. } => 4,
            Self::Vector(_) | Self::UserPtr { .. } | Self::Subr(_) | Self::Module(_) => 5,
            Self::Float(_) => 7,
        }
    }

    /// Answer of `type-of`
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "symbol",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str { .. } => "string",
            Self::Vector(_) => "vector",
            Self::Cons(..) => "cons",
            Self::UserPtr { .. } => "user-ptr",
            Self::Subr(_) => "subr",
            Self::Module(_) => "module-function",
        }
    }
}

pub(crate) struct Heap {
    objects: Vec<Object>,
    symbols: HashMap<String, Id>,
    fixnums: HashMap<i64, Id>,
    pub nil: Id,
    pub t: Id,
    pub features: Vec<Id>,
    pub global_refs: HashMap<Id, usize>,
}

impl Heap {
    pub(crate) fn new() -> Self {
        let mut heap = Self {
            objects: Vec::new(),
            symbols: HashMap::new(),
            fixnums: HashMap::new(),
            nil: 0,
            t: 0,
            features: Vec::new(),
            global_refs: HashMap::new(),
        };
        heap.nil = heap.intern("nil");
        heap.t = heap.intern("t");
        for constant in [heap.nil, heap.t] {
            if let Some(symbol) = heap.symbol_mut(constant) {
                symbol.value = Some(constant);
            }
        }
        heap
    }

    pub(crate) fn alloc(&mut self, object: Object) -> Id {
        self.objects.push(object);
        self.objects.len()
    }

    pub(crate) fn get(&self, id: Id) -> Option<&Object> {
        id.checked_sub(1).and_then(|index| self.objects.get(index))
    }

    pub(crate) fn get_mut(&mut self, id: Id) -> Option<&mut Object> {
        id.checked_sub(1).and_then(|index| self.objects.get_mut(index))
    }

    pub(crate) fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.iter_mut()
    }

    pub(crate) fn handle(&self, id: Id) -> emacs_value {
        let tag = self.get(id).map_or(0, Object::tag);
        ((id << TAG_BITS) | tag) as emacs_value
    }

    /// Object id behind a handle, if the handle is one this heap issued
    pub(crate) fn id(&self, value: emacs_value) -> Option<Id> {
        let word = value as usize;
        let id = word >> TAG_BITS;
        self.get(id).filter(|object| object.tag() == word & TAG_MASK).map(|_| id)
    }

    pub(crate) fn intern(&mut self, name: &str) -> Id {
        if let Some(&id) = self.symbols.get(name) {
            return id;
        }
        let id = self.alloc(Object::Symbol(Symbol {
            name: name.to_owned(),
            value: None,
            function: None,
            plist: Vec::new(),
        }));
        self.symbols.insert(name.to_owned(), id);
        id
    }

    pub(crate) fn int(&mut self, n: i64) -> Id {
        if let Some(&id) = self.fixnums.get(&n) {
            return id;
        }
        let id = self.alloc(Object::Int(n));
        self.fixnums.insert(n, id);
        id
    }

    pub(crate) fn float(&mut self, d: f64) -> Id {
        self.alloc(Object::Float(d))
    }

    pub(crate) fn string(&mut self, bytes: Vec<u8>, multibyte: bool) -> Id {
        self.alloc(Object::Str { bytes, multibyte })
    }

    pub(crate) fn text(&mut self, text: &str) -> Id {
        self.string(text.as_bytes().to_vec(), true)
    }

    pub(crate) fn cons(&mut self, car: Id, cdr: Id) -> Id {
        self.alloc(Object::Cons(car, cdr))
    }

    pub(crate) fn list(&mut self, items: &[Id]) -> Id {
        items.iter().rev().fold(self.nil, |tail, &item| self.cons(item, tail))
    }

    pub(crate) fn bool(&self, value: bool) -> Id {
        if value { self.t } else { self.nil }
    }

    pub(crate) fn symbol(&self, id: Id) -> Option<&Symbol> {
        match self.get(id) {
            Some(Object::Symbol(symbol)) => Some(symbol),
            _ => None,
        }
    }

    pub(crate) fn symbol_mut(&mut self, id: Id) -> Option<&mut Symbol> {
        match self.get_mut(id) {
            Some(Object::Symbol(symbol)) => Some(symbol),
            _ => None,
        }
    }

    pub(crate) fn symbol_name(&self, id: Id) -> Option<&str> {
        self.symbol(id).map(|symbol| symbol.name.as_str())
    }

    pub(crate) fn is_symbol(&self, id: Id) -> bool {
        self.symbol(id).is_some()
    }

    pub(crate) fn set_function(&mut self, symbol: Id, function: Id) {
        if let Some(symbol) = self.symbol_mut(symbol) {
            symbol.function = Some(function);
        }
    }

    pub(crate) fn get_prop(&self, symbol: Id, prop: Id) -> Id {
        self.symbol(symbol)
            .and_then(|symbol| symbol.plist.iter().find(|(key, _)| *key == prop).map(|(_, value)| *value))
            .unwrap_or(self.nil)
    }

    pub(crate) fn put_prop(&mut self, symbol: Id, prop: Id, value: Id) {
        if let Some(symbol) = self.symbol_mut(symbol) {
            match symbol.plist.iter_mut().find(|(key, _)| *key == prop) {
                Some(entry) => entry.1 = value,
                None => symbol.plist.push((prop, value)),
            }
        }
    }

    /// Items of a proper list, `None` if `list` is not one
    pub(crate) fn list_items(&self, mut list: Id) -> Option<Vec<Id>> {
        let mut items = Vec::new();
        while list != self.nil {
            match self.get(list) {
                Some(Object::Cons(car, cdr)) => {
                    items.push(*car);
                    list = *cdr;
                }
                _ => return None,
            }
        }
        Some(items)
    }

    /// Structural equality, as `equal`
    pub(crate) fn equal(&self, a: Id, b: Id) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Some(Object::Int(x)), Some(Object::Int(y))) => x == y,
            (Some(Object::Float(x)), Some(Object::Float(y))) => x.to_bits() == y.to_bits(),
            (Some(Object::Str { bytes: x, .. }), Some(Object::Str { bytes: y, .. })) => x == y,
            (Some(Object::Cons(xa, xd)), Some(Object::Cons(ya, yd))) => {
                self.equal(*xa, *ya) && self.equal(*xd, *yd)
            }
            (Some(Object::Vector(x)), Some(Object::Vector(y))) => {
                x.len() == y.len() && x.iter().zip(y).all(|(x, y)| self.equal(*x, *y))
            }
            _ => false,
        }
    }
}
