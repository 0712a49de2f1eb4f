//! Owned payload storage.
//!
//! `ByteBuffer` is a fixed-size heap region. Cloning copies the bytes;
//! moving transfers the allocation. An unallocated buffer and an allocated
//! zero-length buffer are different states, although both compare equal
//! because equality only looks at contents.

use std::fmt;

/// Fixed-size owned byte region.
#[derive(Clone, Default)]
pub struct ByteBuffer {
    data: Option<Box<[u8]>>,
}

impl ByteBuffer {
    /// Create an unallocated buffer.
    pub fn new() -> Self {
        Self { data: None }
    }

    /// Allocate `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: Some(vec![0u8; len].into_boxed_slice()),
        }
    }

    /// Allocate a buffer holding a copy of `bytes`.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self {
            data: Some(bytes.into()),
        }
    }

    /// Number of bytes held. Zero for an unallocated buffer.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a region is allocated, even if it has zero length.
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Move the allocation out, leaving this buffer unallocated.
    pub fn take(&mut self) -> ByteBuffer {
        ByteBuffer {
            data: self.data.take(),
        }
    }

    /// Consume the buffer into a `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data.map(Vec::from).unwrap_or_default()
    }
}

impl PartialEq for ByteBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteBuffer {}

impl From<Vec<u8>> for ByteBuffer {
    fn from(v: Vec<u8>) -> Self {
        Self {
            data: Some(v.into_boxed_slice()),
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::copy_from_slice(bytes)
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            None => f.write_str("ByteBuffer(unallocated)"),
            Some(d) => write!(f, "ByteBuffer({} bytes)", d.len()),
        }
    }
}
