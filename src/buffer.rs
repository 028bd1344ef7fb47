//! Growable text regions backing the program segments
//!
//! Every piece of accumulated program text (preamble, body, assembled total)
//! lives in a [`TextBuffer`].  Growth doubles the capacity until the request
//! fits; a request past [`BUF_MAX`] is a fatal resource error and leaves the
//! buffer untouched.  `reset` and `truncate` discard content but never
//! capacity, so a long session converges on a steady allocation.

use crate::errors::ReplError;

/// Hard ceiling on the size of any single text region.
pub const BUF_MAX: usize = usize::MAX / 2 - 1;

/// An owned, growable region of program text.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new() -> Self {
        TextBuffer {
            text: String::new(),
        }
    }

    /// Append `s`, doubling the capacity as needed.
    ///
    /// One extra byte of headroom is kept past the content so that growth is
    /// never triggered by a bare terminator append.
    pub fn append(&mut self, s: &str) -> Result<(), ReplError> {
        let required = self.text.len() + s.len() + 1;
        if required > BUF_MAX {
            return Err(ReplError::BufferOverflow {
                requested: required,
                max: BUF_MAX,
            });
        }
        if required > self.text.capacity() {
            let mut cap = self.text.capacity().max(64);
            while cap < required {
                cap *= 2;
            }
            self.text.reserve_exact(cap - self.text.len());
        }
        self.text.push_str(s);
        Ok(())
    }

    /// Discard the content, keeping the capacity.
    pub fn reset(&mut self) {
        self.text.clear();
    }

    /// Cut the content back to `len` bytes, keeping the capacity.
    ///
    /// `len` must be a byte offset previously observed via [`Self::len`];
    /// offsets recorded at append boundaries are always valid.
    pub fn truncate(&mut self, len: usize) {
        self.text.truncate(len);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_accumulates_content() {
        let mut buf = TextBuffer::new();
        buf.append("int x = 5;").expect("append should succeed");
        buf.append("\n").expect("append should succeed");
        assert_eq!(buf.as_str(), "int x = 5;\n");
        assert_eq!(buf.len(), 11);
    }

    #[test]
    fn capacity_doubles_and_never_shrinks() {
        let mut buf = TextBuffer::new();
        buf.append("x").expect("append should succeed");
        let first = buf.capacity();
        assert!(first >= 64);

        buf.append(&"y".repeat(200)).expect("append should succeed");
        let grown = buf.capacity();
        assert!(grown >= 256, "capacity {} should have doubled past 256", grown);

        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), grown, "reset must keep capacity");

        buf.append("z").expect("append should succeed");
        buf.truncate(0);
        assert_eq!(buf.capacity(), grown, "truncate must keep capacity");
    }

    #[test]
    fn truncate_restores_earlier_content() {
        let mut buf = TextBuffer::new();
        buf.append("\tint a = 1;\n").expect("append should succeed");
        let mark = buf.len();
        buf.append("\tint b = 2;\n").expect("append should succeed");
        buf.truncate(mark);
        assert_eq!(buf.as_str(), "\tint a = 1;\n");
    }
}
