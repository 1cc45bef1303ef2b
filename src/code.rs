use crate::class_file::{RawAttribute, read_raw_attributes};
use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::error::{ClassFormatError, Result};

/// Upper bound on `code_length` imposed by the 16-bit branch offsets.
const MAX_CODE_LENGTH: u32 = 65_535;

/// Decoded `Code` attribute. Instructions stay as raw bytes until a listing
/// is requested.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<RawAttribute>,
}

/// Exception handler covering `start_pc..end_pc`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Zero for a catch-all (`finally`) handler.
    pub catch_type_index: u16,
    /// Internal name of the caught class, resolved at parse time.
    pub catch_type: Option<String>,
}

pub(crate) fn parse_code_attribute(data: &[u8], pool: &ConstantPool) -> Result<CodeAttribute> {
    let mut cursor = ByteCursor::new(data);
    let max_stack = cursor.read_u16()?;
    let max_locals = cursor.read_u16()?;
    let code_length = cursor.read_u32()?;
    if code_length == 0 || code_length > MAX_CODE_LENGTH {
        return Err(ClassFormatError::InvalidCodeLength {
            length: code_length,
        });
    }
    let code = cursor.read_bytes(code_length as usize)?.to_vec();
    let exception_table = parse_exception_table(&mut cursor, pool)?;
    let attributes = read_raw_attributes(&mut cursor, pool)?;
    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

fn parse_exception_table(
    cursor: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<Vec<ExceptionTableEntry>> {
    let count = cursor.read_u16()?;
    let mut entries = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let start_pc = cursor.read_u16()?;
        let end_pc = cursor.read_u16()?;
        let handler_pc = cursor.read_u16()?;
        let catch_type_index = cursor.read_u16()?;
        let catch_type = if catch_type_index == 0 {
            None
        } else {
            Some(pool.class_name(catch_type_index)?.to_string())
        };
        entries.push(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type_index,
            catch_type,
        });
    }
    Ok(entries)
}
