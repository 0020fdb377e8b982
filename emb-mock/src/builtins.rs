// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Lisp functions the fake host provides.

use std::fmt::Write as _;

use crate::{
    heap::{Heap, Id, Object, Subr},
    host::{Host, Outcome, Pending},
};

const SUBRS: &[Subr] = &[
    Subr { name: "list", min: 0, max: None, func: list },
    Subr { name: "vector", min: 0, max: None, func: vector },
    Subr { name: "length", min: 1, max: Some(1), func: length },
    Subr { name: "eq", min: 2, max: Some(2), func: eq },
    Subr { name: "equal", min: 2, max: Some(2), func: equal },
    Subr { name: "car", min: 1, max: Some(1), func: car },
    Subr { name: "cdr", min: 1, max: Some(1), func: cdr },
    Subr { name: "cons", min: 2, max: Some(2), func: cons },
    Subr { name: "aref", min: 2, max: Some(2), func: aref },
    Subr { name: "aset", min: 3, max: Some(3), func: aset },
    Subr { name: "symbol-name", min: 1, max: Some(1), func: symbol_name },
    Subr { name: "symbol-value", min: 1, max: Some(1), func: symbol_value },
    Subr { name: "set", min: 2, max: Some(2), func: set },
    Subr { name: "defalias", min: 2, max: Some(3), func: fset },
    Subr { name: "fset", min: 2, max: Some(2), func: fset },
    Subr { name: "fboundp", min: 1, max: Some(1), func: fboundp },
    Subr { name: "provide", min: 1, max: Some(2), func: provide },
    Subr { name: "featurep", min: 1, max: Some(2), func: featurep },
    Subr { name: "define-error", min: 2, max: Some(3), func: define_error },
    Subr { name: "get", min: 2, max: Some(2), func: get },
    Subr { name: "put", min: 3, max: Some(3), func: put },
    Subr { name: "eval", min: 1, max: Some(2), func: eval },
    Subr { name: "funcall", min: 1, max: None, func: funcall },
    Subr { name: "signal", min: 2, max: Some(2), func: signal },
    Subr { name: "throw", min: 2, max: Some(2), func: throw },
    Subr { name: "message", min: 1, max: None, func: message },
    Subr { name: "format", min: 1, max: None, func: format },
    Subr { name: "+", min: 0, max: None, func: plus },
    Subr { name: "type-of", min: 1, max: Some(1), func: type_of },
    Subr { name: "identity", min: 1, max: Some(1), func: identity },
    Subr { name: "prin1-to-string", min: 1, max: Some(2), func: prin1_to_string },
];

/// Binds every builtin to its symbol and defines the standard error symbols
pub(crate) fn install(heap: &mut Heap) {
    for subr in SUBRS {
        let symbol = heap.intern(subr.name);
        let function = heap.alloc(Object::Subr(*subr));
        heap.set_function(symbol, function);
    }

    let error = heap.intern("error");
    let conditions = heap.intern("error-conditions");
    let message = heap.intern("error-message");
    for (name, text) in [
        ("error", "error"),
        ("quit", "Quit"),
        ("wrong-type-argument", "Wrong type argument"),
        ("args-out-of-range", "Args out of range"),
        ("wrong-number-of-arguments", "Wrong number of arguments"),
        ("void-function", "Symbol's function definition is void"),
        ("void-variable", "Symbol's value as variable is void"),
        ("invalid-function", "Invalid function"),
        ("no-catch", "No catch for tag"),
        ("overflow-error", "Arithmetic overflow error"),
        ("underflow-error", "Arithmetic underflow error"),
        ("range-error", "Arithmetic range error"),
        ("out-of-range", "Out of range"),
        ("memory-full", "Memory exhausted"),
    ] {
        let symbol = heap.intern(name);
        let list = if symbol == error { heap.list(&[error]) } else { heap.list(&[symbol, error]) };
        heap.put_prop(symbol, conditions, list);
        let text = heap.text(text);
        heap.put_prop(symbol, message, text);
    }
}

fn symbol_arg(host: &Host, id: Id) -> Result<Id, Pending> {
    if host.heap.borrow().is_symbol(id) { Ok(id) } else { Err(host.wrong_type("symbolp", id)) }
}

fn string_arg(host: &Host, id: Id) -> Result<String, Pending> {
    let text = match host.heap.borrow().get(id) {
        Some(Object::Str { bytes, .. }) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    };
    text.ok_or_else(|| host.wrong_type("stringp", id))
}

fn list(host: &Host, args: &[Id]) -> Outcome {
    Ok(host.heap.borrow_mut().list(args))
}

fn vector(host: &Host, args: &[Id]) -> Outcome {
    Ok(host.heap.borrow_mut().alloc(Object::Vector(args.to_vec())))
}

fn length(host: &Host, args: &[Id]) -> Outcome {
    let len = {
        let heap = host.heap.borrow();
        match heap.get(args[0]) {
            Some(Object::Vector(items)) => Some(items.len()),
            Some(Object::Str { bytes, multibyte: true }) => Some(String::from_utf8_lossy(bytes).chars().count()),
            Some(Object::Str { bytes, multibyte: false }) => Some(bytes.len()),
            _ => heap.list_items(args[0]).map(|items| items.len()),
        }
    };
    let len = len.ok_or_else(|| host.wrong_type("sequencep", args[0]))?;
    Ok(host.heap.borrow_mut().int(len as i64))
}

fn eq(host: &Host, args: &[Id]) -> Outcome {
    Ok(host.heap.borrow().bool(args[0] == args[1]))
}

fn equal(host: &Host, args: &[Id]) -> Outcome {
    let heap = host.heap.borrow();
    Ok(heap.bool(heap.equal(args[0], args[1])))
}

fn car(host: &Host, args: &[Id]) -> Outcome {
    let heap = host.heap.borrow();
    match heap.get(args[0]) {
        Some(Object::Cons(car, _)) => Ok(*car),
        _ if args[0] == heap.nil => Ok(heap.nil),
        _ => {
            drop(heap);
            Err(host.wrong_type("listp", args[0]))
        }
    }
}

fn cdr(host: &Host, args: &[Id]) -> Outcome {
    let heap = host.heap.borrow();
    match heap.get(args[0]) {
        Some(Object::Cons(_, cdr)) => Ok(*cdr),
        _ if args[0] == heap.nil => Ok(heap.nil),
        _ => {
            drop(heap);
            Err(host.wrong_type("listp", args[0]))
        }
    }
}

fn cons(host: &Host, args: &[Id]) -> Outcome {
    Ok(host.heap.borrow_mut().cons(args[0], args[1]))
}

fn vector_index(host: &Host, vector: Id, index: Id) -> Result<(usize, usize), Pending> {
    let index = host.int_value(index)?;
    let len = match host.heap.borrow().get(vector) {
        Some(Object::Vector(items)) => Some(items.len()),
        _ => None,
    };
    let len = len.ok_or_else(|| host.wrong_type("vectorp", vector))?;
    match usize::try_from(index) {
        Ok(i) if i < len => Ok((i, len)),
        _ => Err(host.out_of_range(vector, index)),
    }
}

fn aref(host: &Host, args: &[Id]) -> Outcome {
    let (index, _) = vector_index(host, args[0], args[1])?;
    match host.heap.borrow().get(args[0]) {
        Some(Object::Vector(items)) => Ok(items[index]),
        _ => Ok(args[0]),
    }
}

fn aset(host: &Host, args: &[Id]) -> Outcome {
    let (index, _) = vector_index(host, args[0], args[1])?;
    if let Some(Object::Vector(items)) = host.heap.borrow_mut().get_mut(args[0]) {
        items[index] = args[2];
    }
    Ok(args[2])
}

fn symbol_name(host: &Host, args: &[Id]) -> Outcome {
    let symbol = symbol_arg(host, args[0])?;
    let mut heap = host.heap.borrow_mut();
    let name = heap.symbol_name(symbol).unwrap_or_default().to_owned();
    Ok(heap.text(&name))
}

fn symbol_value(host: &Host, args: &[Id]) -> Outcome {
    host.symbol_value(args[0])
}

fn set(host: &Host, args: &[Id]) -> Outcome {
    let symbol = symbol_arg(host, args[0])?;
    if let Some(entry) = host.heap.borrow_mut().symbol_mut(symbol) {
        entry.value = Some(args[1]);
    }
    Ok(args[1])
}

fn fset(host: &Host, args: &[Id]) -> Outcome {
    let symbol = symbol_arg(host, args[0])?;
    host.heap.borrow_mut().set_function(symbol, args[1]);
    Ok(symbol)
}

fn fboundp(host: &Host, args: &[Id]) -> Outcome {
    let heap = host.heap.borrow();
    let bound = heap.symbol(args[0]).is_some_and(|symbol| symbol.function.is_some());
    Ok(heap.bool(bound))
}

fn provide(host: &Host, args: &[Id]) -> Outcome {
    let feature = symbol_arg(host, args[0])?;
    let mut heap = host.heap.borrow_mut();
    if !heap.features.contains(&feature) {
        heap.features.push(feature);
    }
    Ok(feature)
}

fn featurep(host: &Host, args: &[Id]) -> Outcome {
    let feature = symbol_arg(host, args[0])?;
    let heap = host.heap.borrow();
    Ok(heap.bool(heap.features.contains(&feature)))
}

fn define_error(host: &Host, args: &[Id]) -> Outcome {
    let name = symbol_arg(host, args[0])?;
    let mut heap = host.heap.borrow_mut();
    let parent = args.get(2).copied().unwrap_or(heap.nil);
    let parent = if parent == heap.nil { heap.intern("error") } else { parent };
    let mut conditions = vec![name];
    let inherited = heap.intern("error-conditions");
    let inherited = heap.get_prop(parent, inherited);
    match heap.list_items(inherited) {
        Some(items) if !items.is_empty() => conditions.extend(items),
        _ => conditions.push(parent),
    }
    let list = heap.list(&conditions);
    let conditions = heap.intern("error-conditions");
    heap.put_prop(name, conditions, list);
    let message = heap.intern("error-message");
    heap.put_prop(name, message, args[1]);
    Ok(heap.nil)
}

fn get(host: &Host, args: &[Id]) -> Outcome {
    let symbol = symbol_arg(host, args[0])?;
    Ok(host.heap.borrow().get_prop(symbol, args[1]))
}

fn put(host: &Host, args: &[Id]) -> Outcome {
    let symbol = symbol_arg(host, args[0])?;
    host.heap.borrow_mut().put_prop(symbol, args[1], args[2]);
    Ok(args[2])
}

fn eval(host: &Host, args: &[Id]) -> Outcome {
    host.eval(args[0])
}

fn funcall(host: &Host, args: &[Id]) -> Outcome {
    host.funcall(args[0], &args[1..])
}

fn signal(host: &Host, args: &[Id]) -> Outcome {
    Err(host.signal_with(args[0], args[1]))
}

fn throw(host: &Host, args: &[Id]) -> Outcome {
    Err(host.throw(args[0], args[1]))
}

fn format_text(host: &Host, args: &[Id]) -> Result<String, Pending> {
    let control = string_arg(host, args[0])?;
    let mut rest = args[1..].iter();
    let mut out = String::new();
    let mut chars = control.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let directive = chars.next();
        if directive == Some('%') {
            out.push('%');
            continue;
        }
        let Some(&arg) = rest.next() else {
            return Err(host.error("Not enough arguments for format string"));
        };
        let heap = host.heap.borrow();
        match directive {
            Some('s') => princ(&heap, arg, &mut out),
            Some('S') => prin1(&heap, arg, &mut out),
            Some('d') => match heap.get(arg) {
                Some(Object::Int(n)) => {
                    let _ = write!(out, "{n}");
                }
                Some(Object::Float(d)) => {
                    let _ = write!(out, "{}", d.trunc() as i64);
                }
                _ => {
                    drop(heap);
                    return Err(host.error("Format specifier doesn't match argument type"));
                }
            },
            _ => {
                drop(heap);
                return Err(host.error("Invalid format operation"));
            }
        }
    }
    Ok(out)
}

fn message(host: &Host, args: &[Id]) -> Outcome {
    if args[0] == host.nil() {
        return Ok(args[0]);
    }
    let text = format_text(host, args)?;
    host.messages.borrow_mut().push(text.clone());
    Ok(host.heap.borrow_mut().text(&text))
}

fn format(host: &Host, args: &[Id]) -> Outcome {
    let text = format_text(host, args)?;
    Ok(host.heap.borrow_mut().text(&text))
}

fn plus(host: &Host, args: &[Id]) -> Outcome {
    let mut int: i64 = 0;
    let mut float: Option<f64> = None;
    for &arg in args {
        let number = match host.heap.borrow().get(arg) {
            Some(Object::Int(n)) => Some(Ok(*n)),
            Some(Object::Float(d)) => Some(Err(*d)),
            _ => None,
        };
        match number {
            Some(Ok(n)) => match float.as_mut() {
                Some(sum) => *sum += n as f64,
                None => int = int.checked_add(n).ok_or_else(|| host.signal("overflow-error", &[]))?,
            },
            Some(Err(d)) => *float.get_or_insert(int as f64) += d,
            None => return Err(host.wrong_type("number-or-marker-p", arg)),
        }
    }
    let mut heap = host.heap.borrow_mut();
    Ok(match float {
        Some(sum) => heap.float(sum),
        None => heap.int(int),
    })
}

fn type_of(host: &Host, args: &[Id]) -> Outcome {
    let mut heap = host.heap.borrow_mut();
    let name = heap.get(args[0]).map_or("symbol", Object::type_name);
    Ok(heap.intern(name))
}

fn identity(_host: &Host, args: &[Id]) -> Outcome {
    Ok(args[0])
}

fn prin1_to_string(host: &Host, args: &[Id]) -> Outcome {
    let mut out = String::new();
    let noescape = args.get(1).is_some_and(|&flag| flag != host.nil());
    {
        let heap = host.heap.borrow();
        if noescape { princ(&heap, args[0], &mut out) } else { prin1(&heap, args[0], &mut out) }
    }
    Ok(host.heap.borrow_mut().text(&out))
}

/// Prints like `princ`: strings without quotes
pub(crate) fn princ(heap: &Heap, id: Id, out: &mut String) {
    match heap.get(id) {
        Some(Object::Str { bytes, .. }) => out.push_str(&String::from_utf8_lossy(bytes)),
        _ => prin1(heap, id, out),
    }
}

/// Prints like `prin1`
pub(crate) fn prin1(heap: &Heap, id: Id, out: &mut String) {
    print(heap, id, out, 0);
}

const MAX_PRINT_DEPTH: usize = 64;

fn print(heap: &Heap, id: Id, out: &mut String, depth: usize) {
    if depth > MAX_PRINT_DEPTH {
        out.push_str("...");
        return;
    }
    match heap.get(id) {
        None => out.push_str("#<invalid>"),
        Some(Object::Symbol(symbol)) => out.push_str(&symbol.name),
        Some(Object::Int(n)) => {
            let _ = write!(out, "{n}");
        }
        Some(Object::Float(d)) => {
            let _ = write!(out, "{d:?}");
        }
        Some(Object::Str { bytes, .. }) => {
            out.push('"');
            for c in String::from_utf8_lossy(bytes).chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
        Some(Object::Vector(items)) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                print(heap, *item, out, depth + 1);
            }
            out.push(']');
        }
        Some(Object::Cons(..)) => {
            out.push('(');
            let mut current = id;
            let mut first = true;
            while let Some(Object::Cons(car, cdr)) = heap.get(current) {
                if !first {
                    out.push(' ');
                }
                first = false;
                print(heap, *car, out, depth + 1);
                current = *cdr;
            }
            if current != heap.nil {
                out.push_str(" . ");
                print(heap, current, out, depth + 1);
            }
            out.push(')');
        }
        Some(Object::UserPtr { ptr, .. }) => {
            let _ = write!(out, "#<user-ptr ptr={ptr:p}>");
        }
        Some(Object::Subr(subr)) => {
            let _ = write!(out, "#<subr {}>", subr.name);
        }
        Some(Object::Module(_)) => out.push_str("#<module function>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(host: &Host, name: &str, args: &[Id]) -> Outcome {
        let symbol = host.heap.borrow_mut().intern(name);
        host.funcall(symbol, args)
    }

    fn printed(host: &Host, id: Id) -> String {
        let mut out = String::new();
        prin1(&host.heap.borrow(), id, &mut out);
        out
    }

    #[test]
    fn test_list_builtins() {
        let host = Host::new();
        let (one, two) = {
            let mut heap = host.heap.borrow_mut();
            (heap.int(1), heap.int(2))
        };
        let list = call(&host, "list", &[one, two]).unwrap();
        assert_eq!(printed(&host, list), "(1 2)");
        assert_eq!(call(&host, "car", &[list]).unwrap(), one);
        let length = call(&host, "length", &[list]).unwrap();
        assert_eq!(host.int_value(length).unwrap(), 2);
        let pair = call(&host, "cons", &[one, two]).unwrap();
        assert_eq!(printed(&host, pair), "(1 . 2)");
    }

    #[test]
    fn test_plus_and_overflow() {
        let host = Host::new();
        let (a, b, max) = {
            let mut heap = host.heap.borrow_mut();
            (heap.int(40), heap.int(2), heap.int(i64::MAX))
        };
        let sum = call(&host, "+", &[a, b]).unwrap();
        assert_eq!(host.int_value(sum).unwrap(), 42);
        let err = call(&host, "+", &[max, b]).unwrap_err();
        assert_eq!(host.heap.borrow().symbol_name(err.first), Some("overflow-error"));
    }

    #[test]
    fn test_format_directives() {
        let host = Host::new();
        let (control, n, s) = {
            let mut heap = host.heap.borrow_mut();
            (heap.text("%d%% of %s is %S"), heap.int(50), heap.text("x"))
        };
        let out = call(&host, "format", &[control, n, s, s]).unwrap();
        assert_eq!(printed(&host, out), "\"50% of x is \\\"x\\\"\"");
    }

    #[test]
    fn test_wrong_arity_for_subr() {
        let host = Host::new();
        let err = call(&host, "car", &[]).unwrap_err();
        assert_eq!(host.heap.borrow().symbol_name(err.first), Some("wrong-number-of-arguments"));
    }
}
