use thiserror::Error;

/// Violation of the class-file binary grammar.
///
/// Every parse step returns the first violation it meets; no partial class
/// model is ever produced alongside one of these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassFormatError {
    #[error("invalid class file magic 0x{found:08X}")]
    BadMagic { found: u32 },
    #[error("truncated data at offset {offset}: needed {needed} byte(s), {remaining} remaining")]
    TruncatedData {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("invalid constant pool index {index}: expected {expected}")]
    InvalidConstantPoolIndex { index: u16, expected: &'static str },
    #[error("unsupported constant pool tag {tag} at index {index}")]
    UnsupportedTag { tag: u8, index: u16 },
    #[error("malformed descriptor {descriptor:?}: {reason}")]
    MalformedDescriptor {
        descriptor: String,
        reason: &'static str,
    },
    #[error("unsupported opcode 0x{opcode:02x} at offset {offset}")]
    UnsupportedOpcode { opcode: u8, offset: usize },
    #[error("invalid code length {length}")]
    InvalidCodeLength { length: u32 },
    #[error("invalid switch table at offset {offset}")]
    InvalidSwitch { offset: usize },
}

/// Discriminant of [`ClassFormatError`], for callers that branch on the
/// failure category without caring about its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassFormatErrorKind {
    BadMagic,
    TruncatedData,
    InvalidConstantPoolIndex,
    UnsupportedTag,
    MalformedDescriptor,
    UnsupportedOpcode,
    InvalidCodeLength,
    InvalidSwitch,
}

impl ClassFormatError {
    pub fn kind(&self) -> ClassFormatErrorKind {
        match self {
            ClassFormatError::BadMagic { .. } => ClassFormatErrorKind::BadMagic,
            ClassFormatError::TruncatedData { .. } => ClassFormatErrorKind::TruncatedData,
            ClassFormatError::InvalidConstantPoolIndex { .. } => {
                ClassFormatErrorKind::InvalidConstantPoolIndex
            }
            ClassFormatError::UnsupportedTag { .. } => ClassFormatErrorKind::UnsupportedTag,
            ClassFormatError::MalformedDescriptor { .. } => {
                ClassFormatErrorKind::MalformedDescriptor
            }
            ClassFormatError::UnsupportedOpcode { .. } => ClassFormatErrorKind::UnsupportedOpcode,
            ClassFormatError::InvalidCodeLength { .. } => ClassFormatErrorKind::InvalidCodeLength,
            ClassFormatError::InvalidSwitch { .. } => ClassFormatErrorKind::InvalidSwitch,
        }
    }

    pub(crate) fn malformed_descriptor(descriptor: &str, reason: &'static str) -> Self {
        ClassFormatError::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason,
        }
    }
}

/// Top-level error for operations that read class bytes from storage.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read class bytes: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ClassFormat(#[from] ClassFormatError),
}

pub type Result<T, E = ClassFormatError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_distinguishes_bad_magic_from_truncation() {
        let magic = ClassFormatError::BadMagic { found: 0xDEADBEEF };
        let truncated = ClassFormatError::TruncatedData {
            offset: 10,
            needed: 2,
            remaining: 1,
        };

        assert_eq!(magic.kind(), ClassFormatErrorKind::BadMagic);
        assert_eq!(truncated.kind(), ClassFormatErrorKind::TruncatedData);
        assert_ne!(magic.kind(), truncated.kind());
    }

    #[test]
    fn messages_carry_payload() {
        let error = ClassFormatError::UnsupportedOpcode {
            opcode: 0xcb,
            offset: 7,
        };
        assert_eq!(error.to_string(), "unsupported opcode 0xcb at offset 7");

        let error = ClassFormatError::BadMagic { found: 0x1234 };
        assert_eq!(error.to_string(), "invalid class file magic 0x00001234");
    }

    #[test]
    fn io_errors_wrap_transparently() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = Error::from(io);
        assert!(matches!(error, Error::Io(_)));

        let error = Error::from(ClassFormatError::BadMagic { found: 0 });
        assert_eq!(error.to_string(), "invalid class file magic 0x00000000");
    }
}
