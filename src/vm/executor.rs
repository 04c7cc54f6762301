//! Virtual Machine executor
//!
//! Runs a compiled [`Program`] against a [`CallContext`]. Module globals
//! persist across invocations as long as the runtime heap stays the same;
//! a new heap starts from a clean namespace, since string values are
//! handles into the heap they were created in.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::backends::common::{Allocator, Block, MemoryLayout, RuntimeHeap};
use crate::backends::{CallContext, InputKind};
use crate::frontend::parser::ast::{BinOp, UnOp};
use crate::vm::builtins::{self, Builtin};
use crate::vm::errors::{ExcKind, Exception, VMResult};
use crate::vm::opcode::{Const, Op, Program};
use crate::vm::value::{self, ExcValue, Module, Value};

/// Virtual machine state shared by every invocation
#[derive(Debug, Default)]
pub struct Vm {
    /// Module namespace
    globals: IndexMap<String, Value>,
    /// Heap the globals refer into
    heap_id: Option<u64>,
    /// Constant strings already copied into the heap
    interned: HashMap<String, Block>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module namespace
    pub fn globals(&self) -> &IndexMap<String, Value> {
        &self.globals
    }

    /// Run a program once
    pub fn run(
        &mut self,
        program: &Program,
        cx: &mut CallContext<'_>,
    ) -> VMResult<()> {
        self.attach(cx.heap);
        self.bind_module(cx)
            .map_err(|e| e.at(cx.source_name, program.line(0)))?;

        let mut stack: Vec<Value> = Vec::new();
        let mut ip = 0;
        while let Some(&op) = program.ops.get(ip) {
            trace!("{:4} {:?}", ip, op);
            match self.step(program, op, &mut stack, cx) {
                Ok(Some(target)) => ip = target,
                Ok(None) => ip += 1,
                Err(e) => return Err(e.at(cx.source_name, program.line(ip))),
            }
        }
        Ok(())
    }

    /// Switch to `heap`, dropping every value that lives in another one
    fn attach(
        &mut self,
        heap: &RuntimeHeap,
    ) {
        if self.heap_id != Some(heap.id()) {
            if self.heap_id.is_some() {
                debug!("runtime heap changed, resetting globals");
            }
            self.globals.clear();
            self.interned.clear();
            self.heap_id = Some(heap.id());
        }
    }

    fn bind_module(
        &mut self,
        cx: &mut CallContext<'_>,
    ) -> VMResult<()> {
        let name = self.intern("__main__", cx.heap)?;
        self.globals.insert("__name__".to_string(), Value::Str(name));
        if cx.kind == InputKind::File {
            let file = self.intern(cx.source_name, cx.heap)?;
            self.globals.insert("__file__".to_string(), Value::Str(file));
        }
        Ok(())
    }

    fn intern(
        &mut self,
        text: &str,
        heap: &mut RuntimeHeap,
    ) -> VMResult<Block> {
        if let Some(block) = self.interned.get(text) {
            return Ok(*block);
        }
        let block = heap.alloc_str(text)?;
        self.interned.insert(text.to_string(), block);
        Ok(block)
    }

    /// Execute one op. Returns the jump target, if the op jumps.
    fn step(
        &mut self,
        program: &Program,
        op: Op,
        stack: &mut Vec<Value>,
        cx: &mut CallContext<'_>,
    ) -> VMResult<Option<usize>> {
        match op {
            Op::LoadConst(i) => {
                let value = match program.consts.get(i) {
                    Some(Const::None) => Value::None,
                    Some(Const::Bool(b)) => Value::Bool(*b),
                    Some(Const::Int(n)) => Value::Int(*n),
                    Some(Const::Str(s)) => Value::Str(self.intern(s, cx.heap)?),
                    None => return Err(Exception::runtime("bad constant index")),
                };
                stack.push(value);
            }
            Op::LoadName(i) => {
                let name = program.name(i);
                let value = self.lookup(name)?;
                stack.push(value);
            }
            Op::StoreName(i) => {
                let value = pop(stack)?;
                self.globals.insert(program.name(i).to_string(), value);
            }
            Op::LoadAttr(i) => {
                let object = pop(stack)?;
                let value = self.attribute(&object, program.name(i), cx)?;
                stack.push(value);
            }
            Op::Subscript => {
                let index = pop(stack)?;
                let object = pop(stack)?;
                stack.push(subscript(&object, &index, cx.heap)?);
            }
            Op::BuildList(n) => {
                let items = pop_n(stack, n)?;
                stack.push(Value::List(Rc::new(items)));
            }
            Op::Unary(op) => {
                let operand = pop(stack)?;
                stack.push(unary(op, &operand)?);
            }
            Op::Binary(op) => {
                let right = pop(stack)?;
                let left = pop(stack)?;
                stack.push(binary(op, &left, &right, cx.heap)?);
            }
            Op::Call(argc) => {
                let args = pop_n(stack, argc)?;
                let callee = pop(stack)?;
                stack.push(call(&callee, args, cx)?);
            }
            Op::Dup => {
                let top = stack.last().cloned().ok_or_else(underflow)?;
                stack.push(top);
            }
            Op::Pop => {
                pop(stack)?;
            }
            Op::PrintExpr => {
                let value = pop(stack)?;
                if value != Value::None {
                    let text = value.repr(cx.heap)?;
                    writeln!(cx.out, "{}", text)
                        .map_err(|e| Exception::runtime(format!("output error: {}", e)))?;
                }
            }
            Op::Jump(target) => return Ok(Some(target)),
            Op::JumpIfFalse(target) => {
                if !pop(stack)?.truthy() {
                    return Ok(Some(target));
                }
            }
            Op::JumpIfFalseOrPop(target) => {
                if !stack.last().ok_or_else(underflow)?.truthy() {
                    return Ok(Some(target));
                }
                pop(stack)?;
            }
            Op::JumpIfTrueOrPop(target) => {
                if stack.last().ok_or_else(underflow)?.truthy() {
                    return Ok(Some(target));
                }
                pop(stack)?;
            }
            Op::Raise(true) => {
                let value = pop(stack)?;
                return Err(self.raise(value, cx)?);
            }
            Op::Raise(false) => {
                return Err(Exception::runtime("No active exception to reraise"));
            }
        }
        Ok(None)
    }

    fn lookup(
        &self,
        name: &str,
    ) -> VMResult<Value> {
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        builtin(name).ok_or_else(|| {
            Exception::new(ExcKind::NameError, format!("name '{}' is not defined", name))
        })
    }

    fn attribute(
        &mut self,
        object: &Value,
        name: &str,
        cx: &mut CallContext<'_>,
    ) -> VMResult<Value> {
        match (object, name) {
            (Value::Module(Module::Sys), "argv") => {
                self.string_list(cx.ambient.argv.iter().cloned(), cx.heap)
            }
            (Value::Module(Module::Sys), "path") => {
                let path = cx.ambient.search_path.iter().map(|p| p.display().to_string());
                self.string_list(path, cx.heap)
            }
            (Value::Module(Module::Sys), "exit") => Ok(Value::Builtin(Builtin::Exit)),
            (Value::Module(module), _) => Err(Exception::new(
                ExcKind::AttributeError,
                format!("module '{}' has no attribute '{}'", module.name(), name),
            )),
            (other, _) => Err(Exception::new(
                ExcKind::AttributeError,
                format!("'{}' object has no attribute '{}'", other.type_name(), name),
            )),
        }
    }

    fn string_list(
        &mut self,
        items: impl Iterator<Item = String>,
        heap: &mut RuntimeHeap,
    ) -> VMResult<Value> {
        let values = items
            .map(|s| self.intern(&s, heap).map(Value::Str))
            .collect::<VMResult<Vec<_>>>()?;
        Ok(Value::List(Rc::new(values)))
    }

    fn raise(
        &self,
        value: Value,
        cx: &CallContext<'_>,
    ) -> VMResult<Exception> {
        match value {
            Value::Exception(exc) => builtins::raise(&exc, cx),
            Value::ExcType(kind) => builtins::raise(
                &ExcValue {
                    kind,
                    args: Vec::new(),
                },
                cx,
            ),
            _ => Ok(Exception::type_error(
                "exceptions must derive from BaseException",
            )),
        }
    }
}

/// Builtin namespace
fn builtin(name: &str) -> Option<Value> {
    if name == "sys" {
        return Some(Value::Module(Module::Sys));
    }
    Builtin::ALL
        .iter()
        .find(|b| b.name() == name)
        .map(|b| Value::Builtin(*b))
        .or_else(|| {
            ExcKind::ALL
                .iter()
                .find(|k| k.name() == name)
                .map(|k| Value::ExcType(*k))
        })
}

fn underflow() -> Exception {
    Exception::runtime("stack underflow")
}

fn pop(stack: &mut Vec<Value>) -> VMResult<Value> {
    stack.pop().ok_or_else(underflow)
}

fn pop_n(
    stack: &mut Vec<Value>,
    n: usize,
) -> VMResult<Vec<Value>> {
    let at = stack.len().checked_sub(n).ok_or_else(underflow)?;
    Ok(stack.split_off(at))
}

fn call(
    callee: &Value,
    args: Vec<Value>,
    cx: &mut CallContext<'_>,
) -> VMResult<Value> {
    match callee {
        Value::Builtin(builtin) => builtin.call(args, cx),
        Value::ExcType(kind) => Ok(builtins::instantiate(*kind, args)),
        other => Err(Exception::type_error(format!(
            "'{}' object is not callable",
            other.type_name()
        ))),
    }
}

fn unary(
    op: UnOp,
    operand: &Value,
) -> VMResult<Value> {
    if op == UnOp::Not {
        return Ok(Value::Bool(!operand.truthy()));
    }
    let n = operand.as_int().ok_or_else(|| {
        let symbol = if op == UnOp::Neg { "-" } else { "+" };
        Exception::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        ))
    })?;
    match op {
        UnOp::Neg => n.checked_neg().map(Value::Int).ok_or_else(Exception::overflow),
        _ => Ok(Value::Int(n)),
    }
}

fn unsupported(
    op: BinOp,
    left: &Value,
    right: &Value,
) -> Exception {
    Exception::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn binary(
    op: BinOp,
    left: &Value,
    right: &Value,
    heap: &mut RuntimeHeap,
) -> VMResult<Value> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(value::equal(left, right, heap)?)),
        BinOp::Neq => return Ok(Value::Bool(!value::equal(left, right, heap)?)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => return compare(op, left, right, heap),
        _ => {}
    }

    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return arithmetic(op, a, b).map(Value::Int);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            let joined = format!("{}{}", heap.str(*a)?, heap.str(*b)?);
            Ok(Value::Str(heap.alloc_str(&joined)?))
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            reserve_items(a.len().saturating_add(b.len()), heap)?;
            Ok(Value::List(Rc::new(a.iter().chain(b.iter()).cloned().collect())))
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s)) if n.as_int().is_some() => {
            let count = repeat_count(n)?;
            let text = heap.str(*s)?;
            let size = text.len().checked_mul(count).ok_or_else(Exception::overflow)?;
            reserve(size, heap)?;
            let repeated = heap.str(*s)?.repeat(count);
            Ok(Value::Str(heap.alloc_str(&repeated)?))
        }
        (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items))
            if n.as_int().is_some() =>
        {
            let count = repeat_count(n)?;
            let len = items.len().checked_mul(count).ok_or_else(Exception::overflow)?;
            reserve_items(len, heap)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(Rc::new(out)))
        }
        _ => Err(unsupported(op, left, right)),
    }
}

/// Fail with `MemoryError` unless `size` bytes fit in what is left of the heap
fn reserve(
    size: usize,
    heap: &RuntimeHeap,
) -> VMResult<()> {
    heap.can_alloc(MemoryLayout::bytes(size)).map_err(Exception::from)
}

/// List storage is bounded by the runtime heap's capacity too
fn reserve_items(
    len: usize,
    heap: &RuntimeHeap,
) -> VMResult<()> {
    let layout = MemoryLayout::array::<Value>(len).ok_or_else(Exception::overflow)?;
    heap.can_alloc(layout).map_err(Exception::from)
}

fn repeat_count(n: &Value) -> VMResult<usize> {
    let n = n.as_int().unwrap_or(0);
    usize::try_from(n.max(0)).map_err(|_| Exception::overflow())
}

/// Integer arithmetic with floor division semantics
fn arithmetic(
    op: BinOp,
    a: i64,
    b: i64,
) -> VMResult<i64> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::FloorDiv | BinOp::Mod if b == 0 => {
            return Err(Exception::new(
                ExcKind::ZeroDivisionError,
                "integer division or modulo by zero",
            ))
        }
        BinOp::FloorDiv => a.checked_div(b).map(|q| {
            if (a % b != 0) && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }),
        BinOp::Mod => a.checked_rem(b).map(|r| {
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }),
        _ => None,
    };
    result.ok_or_else(Exception::overflow)
}

fn compare(
    op: BinOp,
    left: &Value,
    right: &Value,
    heap: &RuntimeHeap,
) -> VMResult<Value> {
    let ordering = if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        a.cmp(&b)
    } else {
        match (left, right) {
            (Value::Str(a), Value::Str(b)) => heap.str(*a)?.cmp(heap.str(*b)?),
            _ => {
                return Err(Exception::type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                )))
            }
        }
    };
    Ok(Value::Bool(match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn subscript(
    object: &Value,
    index: &Value,
    heap: &mut RuntimeHeap,
) -> VMResult<Value> {
    let i = index.as_int().ok_or_else(|| {
        Exception::type_error(format!(
            "{} indices must be integers, not {}",
            object.type_name(),
            index.type_name()
        ))
    })?;
    match object {
        Value::List(items) => resolve_index(i, items.len())
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| Exception::new(ExcKind::IndexError, "list index out of range")),
        Value::Str(block) => {
            let text = heap.str(*block)?;
            let c = resolve_index(i, text.chars().count())
                .and_then(|i| text.chars().nth(i))
                .ok_or_else(|| Exception::new(ExcKind::IndexError, "string index out of range"))?;
            let mut buf = [0u8; 4];
            Ok(Value::Str(heap.alloc_str(c.encode_utf8(&mut buf))?))
        }
        other => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Python-style index into a sequence of `len` items
fn resolve_index(
    i: i64,
    len: usize,
) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { i.checked_add(len)? } else { i };
    if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_semantics() {
        assert_eq!(arithmetic(BinOp::FloorDiv, 7, 2), Ok(3));
        assert_eq!(arithmetic(BinOp::FloorDiv, -7, 2), Ok(-4));
        assert_eq!(arithmetic(BinOp::FloorDiv, 7, -2), Ok(-4));
        assert_eq!(arithmetic(BinOp::Mod, -7, 2), Ok(1));
        assert_eq!(arithmetic(BinOp::Mod, 7, -2), Ok(-1));
        assert_eq!(arithmetic(BinOp::Mod, 6, 3), Ok(0));
    }

    #[test]
    fn test_arithmetic_faults() {
        let err = arithmetic(BinOp::FloorDiv, 1, 0).unwrap_err();
        assert_eq!(err.kind(), ExcKind::ZeroDivisionError);
        let err = arithmetic(BinOp::Add, i64::MAX, 1).unwrap_err();
        assert_eq!(err.kind(), ExcKind::OverflowError);
        let err = arithmetic(BinOp::FloorDiv, i64::MIN, -1).unwrap_err();
        assert_eq!(err.kind(), ExcKind::OverflowError);
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }

    #[test]
    fn test_builtin_namespace() {
        assert_eq!(builtin("print"), Some(Value::Builtin(Builtin::Print)));
        assert_eq!(builtin("ValueError"), Some(Value::ExcType(ExcKind::ValueError)));
        assert_eq!(builtin("sys"), Some(Value::Module(Module::Sys)));
        assert_eq!(builtin("open"), None);
    }

    #[test]
    fn test_mixed_operands() {
        let mut heap = RuntimeHeap::new(vec![0u8; 64].into_boxed_slice());
        let s = Value::Str(heap.alloc_str("ab").unwrap());
        let err = binary(BinOp::Add, &s, &Value::Int(1), &mut heap).unwrap_err();
        assert_eq!(
            err.message(),
            "unsupported operand type(s) for +: 'str' and 'int'"
        );
        let repeated = binary(BinOp::Mul, &Value::Int(2), &s, &mut heap).unwrap();
        assert_eq!(repeated.to_str(&heap).unwrap(), "abab");
        assert_eq!(
            binary(BinOp::Lt, &s, &Value::Int(1), &mut heap).unwrap_err().kind(),
            ExcKind::TypeError
        );
    }

    #[test]
    fn test_repetition_is_bounded_by_heap() {
        let mut heap = RuntimeHeap::new(vec![0u8; 256].into_boxed_slice());
        let s = Value::Str(heap.alloc_str("a").unwrap());
        let err = binary(BinOp::Mul, &s, &Value::Int(100_000_000_000), &mut heap).unwrap_err();
        assert_eq!(err.kind(), ExcKind::MemoryError);
        assert_eq!(
            err.message(),
            "memory allocation failed, allocating 100000000000 bytes"
        );

        let list = Value::List(Rc::new(vec![Value::Int(0)]));
        let err = binary(BinOp::Mul, &Value::Int(100_000_000_000), &list, &mut heap).unwrap_err();
        assert_eq!(err.kind(), ExcKind::MemoryError);
        let used = heap.used();
        let small = binary(BinOp::Mul, &list, &Value::Int(2), &mut heap).unwrap();
        assert_eq!(small, Value::List(Rc::new(vec![Value::Int(0), Value::Int(0)])));
        assert_eq!(heap.used(), used);
    }
}
