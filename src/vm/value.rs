//! Runtime values
//!
//! Strings live in the runtime heap: a [`Value::Str`] is only a [`Block`]
//! handle, so rendering or comparing one needs the heap it came from.

use std::rc::Rc;

use crate::backends::common::{Block, RuntimeHeap};
use crate::vm::builtins::Builtin;
use crate::vm::errors::{ExcKind, Exception, VMResult};

/// Built-in modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Sys,
}

impl Module {
    pub fn name(&self) -> &'static str {
        match self {
            Module::Sys => "sys",
        }
    }
}

/// An exception instance that has not been raised yet
#[derive(Debug, Clone, PartialEq)]
pub struct ExcValue {
    pub kind: ExcKind,
    pub args: Vec<Value>,
}

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(Block),
    /// Read-only list
    List(Rc<Vec<Value>>),
    Builtin(Builtin),
    Module(Module),
    ExcType(ExcKind),
    Exception(Rc<ExcValue>),
}

impl Value {
    /// Type name as shown in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Module(_) => "module",
            Value::ExcType(_) => "type",
            Value::Exception(exc) => exc.kind.name(),
        }
    }

    /// Integer view of ints and bools
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Truth value
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(block) => block.size() > 0,
            Value::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// `str(value)`
    pub fn to_str(
        &self,
        heap: &RuntimeHeap,
    ) -> VMResult<String> {
        match self {
            Value::Str(block) => Ok(heap.str(*block)?.to_string()),
            Value::Exception(exc) => render_args(&exc.args, heap),
            other => other.repr(heap),
        }
    }

    /// `repr(value)`
    pub fn repr(
        &self,
        heap: &RuntimeHeap,
    ) -> VMResult<String> {
        Ok(match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(block) => quote(heap.str(*block)?),
            Value::List(items) => format!("[{}]", repr_all(items, heap)?),
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
            Value::Module(m) => format!("<module '{}'>", m.name()),
            Value::ExcType(kind) => format!("<class '{}'>", kind.name()),
            Value::Exception(exc) => format!("{}({})", exc.kind.name(), repr_all(&exc.args, heap)?),
        })
    }
}

fn repr_all(
    values: &[Value],
    heap: &RuntimeHeap,
) -> VMResult<String> {
    let parts = values
        .iter()
        .map(|v| v.repr(heap))
        .collect::<VMResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

/// Exception message from its arguments
pub fn render_args(
    args: &[Value],
    heap: &RuntimeHeap,
) -> VMResult<String> {
    match args {
        [] => Ok(String::new()),
        [single] => single.to_str(heap),
        many => Ok(format!("({})", repr_all(many, heap)?)),
    }
}

/// Quote a string the way `repr` does
pub fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// `a == b`
pub fn equal(
    a: &Value,
    b: &Value,
    heap: &RuntimeHeap,
) -> VMResult<bool> {
    if let (Some(x), Some(y)) = (a.as_int(), b.as_int()) {
        return Ok(x == y);
    }
    Ok(match (a, b) {
        (Value::Str(x), Value::Str(y)) => heap.str(*x)? == heap.str(*y)?,
        (Value::List(x), Value::List(y)) => {
            if x.len() != y.len() {
                return Ok(false);
            }
            for (l, r) in x.iter().zip(y.iter()) {
                if !equal(l, r, heap)? {
                    return Ok(false);
                }
            }
            true
        }
        (Value::Exception(x), Value::Exception(y)) => Rc::ptr_eq(x, y),
        (x, y) => x == y,
    })
}

/// Message for a failed conversion to `int`
pub fn invalid_int_literal(text: &str) -> Exception {
    Exception::value_error(format!(
        "invalid literal for int() with base 10: {}",
        quote(text)
    ))
}
