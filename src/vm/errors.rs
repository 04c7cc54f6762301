//! VM exceptions
//!
//! Every operation inside an invocation returns `VMResult`; an
//! [`Exception`] travels outward by `?` until the invocation returns it to
//! the driver as its fault value.

use std::fmt;

use crate::backends::common::AllocError;
use crate::backends::Fault;

/// VM result
pub type VMResult<T> = Result<T, Exception>;

/// Built-in exception classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcKind {
    BaseException,
    Exception,
    SystemExit,
    TypeError,
    ValueError,
    NameError,
    ZeroDivisionError,
    IndexError,
    AttributeError,
    OverflowError,
    MemoryError,
    RuntimeError,
}

impl ExcKind {
    /// All classes, in the order they are bound as builtins
    pub const ALL: [ExcKind; 12] = [
        ExcKind::BaseException,
        ExcKind::Exception,
        ExcKind::SystemExit,
        ExcKind::TypeError,
        ExcKind::ValueError,
        ExcKind::NameError,
        ExcKind::ZeroDivisionError,
        ExcKind::IndexError,
        ExcKind::AttributeError,
        ExcKind::OverflowError,
        ExcKind::MemoryError,
        ExcKind::RuntimeError,
    ];

    /// Class name
    pub fn name(&self) -> &'static str {
        match self {
            ExcKind::BaseException => "BaseException",
            ExcKind::Exception => "Exception",
            ExcKind::SystemExit => "SystemExit",
            ExcKind::TypeError => "TypeError",
            ExcKind::ValueError => "ValueError",
            ExcKind::NameError => "NameError",
            ExcKind::ZeroDivisionError => "ZeroDivisionError",
            ExcKind::IndexError => "IndexError",
            ExcKind::AttributeError => "AttributeError",
            ExcKind::OverflowError => "OverflowError",
            ExcKind::MemoryError => "MemoryError",
            ExcKind::RuntimeError => "RuntimeError",
        }
    }
}

/// Where an exception was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

/// A raised exception.
///
/// The message is rendered when the exception is raised, so the value no
/// longer refers to anything in the runtime heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    kind: ExcKind,
    message: String,
    exit: Option<i64>,
    location: Option<Location>,
}

impl Exception {
    /// Raise `kind` with a message
    pub fn new(
        kind: ExcKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            exit: None,
            location: None,
        }
    }

    /// `SystemExit` carrying a process status
    pub fn system_exit(
        code: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            exit: Some(code),
            ..Self::new(ExcKind::SystemExit, message)
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::ValueError, message)
    }

    pub fn overflow() -> Self {
        Self::new(ExcKind::OverflowError, "integer overflow")
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ExcKind::RuntimeError, message)
    }

    /// Record where the exception was raised; the first location wins.
    pub fn at(
        mut self,
        source: &str,
        line: usize,
    ) -> Self {
        if self.location.is_none() {
            self.location = Some(Location {
                source: source.to_string(),
                line,
            });
        }
        self
    }

    pub fn kind(&self) -> ExcKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl fmt::Display for Exception {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if let Some(location) = &self.location {
            writeln!(f, "Traceback (most recent call last):")?;
            writeln!(
                f,
                "  File \"{}\", line {}, in <module>",
                location.source, location.line
            )?;
        }
        if self.message.is_empty() {
            write!(f, "{}", self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}

impl std::error::Error for Exception {}

impl Fault for Exception {
    fn exit_code(&self) -> Option<i64> {
        match self.kind {
            ExcKind::SystemExit => Some(self.exit.unwrap_or(0)),
            _ => None,
        }
    }
}

impl From<AllocError> for Exception {
    fn from(e: AllocError) -> Self {
        match e {
            AllocError::OutOfMemory { requested, .. } => Exception::new(
                ExcKind::MemoryError,
                format!("memory allocation failed, allocating {} bytes", requested),
            ),
            other => Exception::runtime(other.to_string()),
        }
    }
}
