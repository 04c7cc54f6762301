//! Virtual Machine
//!
//! Stack-based bytecode VM for the bundled language. Values that need
//! storage (strings) are allocated from the runtime heap the host leased,
//! through the [`CallContext`](crate::backends::CallContext).

pub mod builtins;
pub mod errors;
pub mod executor;
pub mod opcode;
pub mod value;

pub use errors::{ExcKind, Exception, VMResult};
pub use executor::Vm;
pub use opcode::{Const, Op, Program};
pub use value::Value;
