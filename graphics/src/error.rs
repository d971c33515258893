//! Device-side error types.

use std::fmt;

/// Errors from device-side operations and build setup.
///
/// Node builders never fail with these; empty geometry and allocation
/// failures are reported through [`BuildOutcome`](crate::BuildOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No shared vertex format has been built on the device yet.
    FormatMissing,
    /// A device buffer was requested with zero size.
    ZeroSizedBuffer,
    /// A device buffer would exceed the device's maximum buffer size.
    BufferTooLarge { size: u64, max: u64 },
    /// An upload does not fit inside its device buffer.
    WriteOutOfBounds { offset: u64, len: u64, size: u64 },
    /// The buffer outlived the device that created it.
    DeviceLost,
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormatMissing => write!(f, "vertex format not built"),
            Self::ZeroSizedBuffer => write!(f, "device buffer size cannot be zero"),
            Self::BufferTooLarge { size, max } => {
                write!(f, "device buffer of {size} bytes exceeds the limit of {max}")
            }
            Self::WriteOutOfBounds { offset, len, size } => write!(
                f,
                "upload of {len} bytes at offset {offset} exceeds buffer size {size}"
            ),
            Self::DeviceLost => write!(f, "device lost"),
        }
    }
}

impl std::error::Error for GraphicsError {}
