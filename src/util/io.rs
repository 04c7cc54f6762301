//! In-memory stream adapters
//!
//! The host writes program output and diagnostics through `Box<dyn Write>`
//! so callers other than the binary (tests, benchmarks, embedders) can
//! capture both streams.

use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer whose bytes stay readable through any clone.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create a buffer and a boxed writer feeding it.
    pub fn with_writer() -> (Self, Box<dyn Write>) {
        let buffer = Self::new();
        let writer = Box::new(buffer.clone());
        (buffer, writer)
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    /// Drop everything written so far.
    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(
        &mut self,
        data: &[u8],
    ) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_bytes() {
        let (buffer, mut writer) = SharedBuffer::with_writer();
        writer.write_all(b"hello").unwrap();
        assert_eq!(buffer.contents(), "hello");
        buffer.clear();
        assert_eq!(buffer.contents(), "");
    }
}
