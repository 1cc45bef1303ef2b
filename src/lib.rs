//! Parsing, summarizing and disassembling JVM class files.
//!
//! [`analyze`] is the usual entry point: it turns the bytes of one `.class`
//! file into a text summary, a signature-keyed method map and a hex dump.
//! [`disassemble`] renders the bytecode of one method from that map.

pub mod access;
pub mod analysis;
pub mod class_file;
pub mod code;
pub mod constant_pool;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod hex;
pub mod instruction;
pub mod opcodes;
pub mod report;

#[cfg(test)]
pub(crate) mod test_harness;

pub use analysis::{AnalysisResult, MethodEntry, MethodMap, analyze, analyze_path, disassemble};
pub use class_file::{ClassFile, parse_class_file};
pub use error::{ClassFormatError, ClassFormatErrorKind, Error};
pub use hex::hex_dump;
pub use instruction::{Instruction, Operand, decode_instructions};
