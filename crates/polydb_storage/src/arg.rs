//! Key and value arguments.
//!
//! Engine operations accept keys and values through [`ByteArg`], which
//! distinguishes a present byte string (possibly empty) from the nil argument
//! (`None`). The nil key is rejected by [`crate::validate`]; a nil value is
//! stored as a zero-length value.

/// A byte-string argument that may be nil.
pub trait ByteArg {
    /// Returns the bytes, or `None` for the nil argument.
    fn byte_arg(&self) -> Option<&[u8]>;
}

/// The nil argument.
///
/// ```rust
/// use polydb_storage::{ByteArg, NIL};
///
/// assert!(NIL.byte_arg().is_none());
/// ```
pub const NIL: Option<&[u8]> = None;

impl ByteArg for [u8] {
    fn byte_arg(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl<const N: usize> ByteArg for [u8; N] {
    fn byte_arg(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteArg for Vec<u8> {
    fn byte_arg(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteArg for str {
    fn byte_arg(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl ByteArg for String {
    fn byte_arg(&self) -> Option<&[u8]> {
        Some(self.as_bytes())
    }
}

impl<T: ByteArg + ?Sized> ByteArg for &T {
    fn byte_arg(&self) -> Option<&[u8]> {
        (**self).byte_arg()
    }
}

impl<T: ByteArg> ByteArg for Option<T> {
    fn byte_arg(&self) -> Option<&[u8]> {
        self.as_ref().and_then(ByteArg::byte_arg)
    }
}
