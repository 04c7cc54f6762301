//! Built-in functions

use std::io::Write;
use std::rc::Rc;

use crate::backends::CallContext;
use crate::vm::errors::{ExcKind, Exception, VMResult};
use crate::vm::value::{invalid_int_literal, render_args, ExcValue, Value};

/// Built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Str,
    Int,
    Len,
    Exit,
}

impl Builtin {
    /// Functions bound in the builtin namespace
    pub const ALL: [Builtin; 5] = [
        Builtin::Print,
        Builtin::Str,
        Builtin::Int,
        Builtin::Len,
        Builtin::Exit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::Exit => "exit",
        }
    }

    /// Call with positional arguments
    pub fn call(
        &self,
        args: Vec<Value>,
        cx: &mut CallContext<'_>,
    ) -> VMResult<Value> {
        match self {
            Builtin::Print => print(&args, cx),
            Builtin::Str => {
                at_most_one(self, &args)?;
                let text = match args.first() {
                    Some(value) => value.to_str(cx.heap)?,
                    None => String::new(),
                };
                Ok(Value::Str(cx.heap.alloc_str(&text)?))
            }
            Builtin::Int => {
                at_most_one(self, &args)?;
                match args.first() {
                    None => Ok(Value::Int(0)),
                    Some(value) => int(value, cx),
                }
            }
            Builtin::Len => {
                if args.len() != 1 {
                    return Err(Exception::type_error(format!(
                        "len() takes exactly one argument ({} given)",
                        args.len()
                    )));
                }
                len(&args[0], cx)
            }
            Builtin::Exit => {
                let exit = ExcValue {
                    kind: ExcKind::SystemExit,
                    args,
                };
                Err(raise(&exit, cx)?)
            }
        }
    }
}

fn at_most_one(
    builtin: &Builtin,
    args: &[Value],
) -> VMResult<()> {
    if args.len() > 1 {
        return Err(Exception::type_error(format!(
            "{}() takes at most 1 argument ({} given)",
            builtin.name(),
            args.len()
        )));
    }
    Ok(())
}

fn print(
    args: &[Value],
    cx: &mut CallContext<'_>,
) -> VMResult<Value> {
    let parts = args
        .iter()
        .map(|v| v.to_str(cx.heap))
        .collect::<VMResult<Vec<_>>>()?;
    writeln!(cx.out, "{}", parts.join(" "))
        .map_err(|e| Exception::runtime(format!("output error: {}", e)))?;
    Ok(Value::None)
}

fn int(
    value: &Value,
    cx: &mut CallContext<'_>,
) -> VMResult<Value> {
    if let Some(n) = value.as_int() {
        return Ok(Value::Int(n));
    }
    match value {
        Value::Str(block) => {
            let text = cx.heap.str(*block)?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid_int_literal(text))
        }
        other => Err(Exception::type_error(format!(
            "can't convert {} to int",
            other.type_name()
        ))),
    }
}

fn len(
    value: &Value,
    cx: &mut CallContext<'_>,
) -> VMResult<Value> {
    let n = match value {
        Value::Str(block) => cx.heap.str(*block)?.chars().count(),
        Value::List(items) => items.len(),
        other => {
            return Err(Exception::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    i64::try_from(n).map(Value::Int).map_err(|_| Exception::overflow())
}

/// Turn an exception instance into the fault that unwinds the invocation.
///
/// A `SystemExit` carries its process status: no argument or `None` gives
/// 0, an int gives itself, a bool gives 0 or 1, anything else gives 1.
pub fn raise(
    exc: &ExcValue,
    cx: &CallContext<'_>,
) -> VMResult<Exception> {
    let message = render_args(&exc.args, cx.heap)?;
    if exc.kind != ExcKind::SystemExit {
        return Ok(Exception::new(exc.kind, message));
    }
    let code = match exc.args.first() {
        None | Some(Value::None) => 0,
        Some(value) => value.as_int().unwrap_or(1),
    };
    Ok(Exception::system_exit(code, message))
}

/// Calling an exception class builds an instance
pub fn instantiate(
    kind: ExcKind,
    args: Vec<Value>,
) -> Value {
    Value::Exception(Rc::new(ExcValue { kind, args }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::common::RuntimeHeap;
    use crate::backends::{Fault, InputKind};
    use crate::host::Ambient;

    fn with_cx<R>(f: impl FnOnce(&mut CallContext<'_>) -> R) -> (R, String) {
        let mut heap = RuntimeHeap::new(vec![0u8; 512].into_boxed_slice());
        let ambient = Ambient::default();
        let mut out = Vec::new();
        let result = {
            let mut cx = CallContext {
                source_name: "<test>",
                kind: InputKind::File,
                ambient: &ambient,
                heap: &mut heap,
                out: &mut out,
            };
            f(&mut cx)
        };
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_joins_with_spaces() {
        let (result, out) = with_cx(|cx| {
            let s = Value::Str(cx.heap.alloc_str("a").unwrap());
            Builtin::Print.call(vec![s, Value::Int(2), Value::None], cx)
        });
        assert_eq!(result, Ok(Value::None));
        assert_eq!(out, "a 2 None\n");
    }

    #[test]
    fn test_int_conversions() {
        let (results, _) = with_cx(|cx| {
            let good = Value::Str(cx.heap.alloc_str(" -42 ").unwrap());
            let bad = Value::Str(cx.heap.alloc_str("4x").unwrap());
            (
                Builtin::Int.call(vec![good], cx),
                Builtin::Int.call(vec![bad], cx),
                Builtin::Int.call(vec![Value::Bool(true)], cx),
            )
        });
        assert_eq!(results.0, Ok(Value::Int(-42)));
        let err = results.1.unwrap_err();
        assert_eq!(err.kind(), ExcKind::ValueError);
        assert_eq!(err.message(), "invalid literal for int() with base 10: '4x'");
        assert_eq!(results.2, Ok(Value::Int(1)));
    }

    #[test]
    fn test_len() {
        let (results, _) = with_cx(|cx| {
            let s = Value::Str(cx.heap.alloc_str("héllo").unwrap());
            (
                Builtin::Len.call(vec![s], cx),
                Builtin::Len.call(vec![Value::Int(1)], cx),
            )
        });
        assert_eq!(results.0, Ok(Value::Int(5)));
        assert_eq!(
            results.1.unwrap_err().message(),
            "object of type 'int' has no len()"
        );
    }

    #[test]
    fn test_exit_payloads() {
        let code = |args: Vec<Value>| {
            with_cx(|cx| Builtin::Exit.call(args, cx).unwrap_err().exit_code()).0
        };
        assert_eq!(code(vec![]), Some(0));
        assert_eq!(code(vec![Value::None]), Some(0));
        assert_eq!(code(vec![Value::Int(42)]), Some(42));
        assert_eq!(code(vec![Value::Bool(true)]), Some(1));
        assert_eq!(code(vec![Value::List(Rc::new(vec![]))]), Some(1));
    }

    #[test]
    fn test_raise_renders_message() {
        let (exc, _) = with_cx(|cx| {
            let msg = Value::Str(cx.heap.alloc_str("bad value").unwrap());
            raise(&ExcValue { kind: ExcKind::ValueError, args: vec![msg] }, cx).unwrap()
        });
        assert_eq!(exc.to_string(), "ValueError: bad value");
        assert_eq!(exc.exit_code(), None);
    }
}
