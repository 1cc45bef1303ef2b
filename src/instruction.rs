use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::error::{ClassFormatError, Result};
use crate::opcodes::{self, OperandLayout};

/// Operand of a decoded instruction. Branch targets are absolute offsets
/// into the method's code array.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    None,
    Local(u16),
    Byte(i8),
    Short(i16),
    Constant(u16),
    Increment {
        index: u16,
        delta: i16,
    },
    Branch(i64),
    ArrayType(u8),
    InvokeInterface {
        index: u16,
        count: u8,
    },
    InvokeDynamic(u16),
    MultiANewArray {
        index: u16,
        dimensions: u8,
    },
    TableSwitch {
        default: i64,
        low: i32,
        high: i32,
        targets: Vec<i64>,
    },
    LookupSwitch {
        default: i64,
        pairs: Vec<(i32, i64)>,
    },
}

/// One decoded instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub offset: usize,
    /// Opcode of the operation; for a `wide` prefix this is the widened
    /// opcode and `wide` is set.
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub wide: bool,
    pub operand: Operand,
}

/// Decode a method's code array from offset 0 to its last byte.
pub fn decode_instructions(code: &[u8]) -> Result<Vec<Instruction>> {
    let mut cursor = ByteCursor::new(code);
    let mut instructions = Vec::new();
    while !cursor.is_empty() {
        instructions.push(decode_one(&mut cursor)?);
    }
    Ok(instructions)
}

fn decode_one(cursor: &mut ByteCursor<'_>) -> Result<Instruction> {
    let offset = cursor.position();
    let opcode = cursor.read_u8()?;
    let (mnemonic, layout) =
        opcodes::lookup(opcode).ok_or(ClassFormatError::UnsupportedOpcode { opcode, offset })?;
    let branch = |relative: i64| offset as i64 + relative;
    let operand = match layout {
        OperandLayout::None => Operand::None,
        OperandLayout::LocalIndex => Operand::Local(u16::from(cursor.read_u8()?)),
        OperandLayout::Byte => Operand::Byte(cursor.read_i8()?),
        OperandLayout::Short => Operand::Short(cursor.read_i16()?),
        OperandLayout::ConstantPoolU8 => Operand::Constant(u16::from(cursor.read_u8()?)),
        OperandLayout::ConstantPoolU16 => Operand::Constant(cursor.read_u16()?),
        OperandLayout::Increment => Operand::Increment {
            index: u16::from(cursor.read_u8()?),
            delta: i16::from(cursor.read_i8()?),
        },
        OperandLayout::BranchI16 => Operand::Branch(branch(i64::from(cursor.read_i16()?))),
        OperandLayout::BranchI32 => Operand::Branch(branch(i64::from(cursor.read_i32()?))),
        OperandLayout::ArrayType => Operand::ArrayType(cursor.read_u8()?),
        OperandLayout::InvokeInterface => {
            let index = cursor.read_u16()?;
            let count = cursor.read_u8()?;
            cursor.skip(1)?;
            Operand::InvokeInterface { index, count }
        }
        OperandLayout::InvokeDynamic => {
            let index = cursor.read_u16()?;
            cursor.skip(2)?;
            Operand::InvokeDynamic(index)
        }
        OperandLayout::MultiANewArray => Operand::MultiANewArray {
            index: cursor.read_u16()?,
            dimensions: cursor.read_u8()?,
        },
        OperandLayout::TableSwitch => {
            cursor.skip(padding(offset))?;
            let default = branch(i64::from(cursor.read_i32()?));
            let low = cursor.read_i32()?;
            let high = cursor.read_i32()?;
            if high < low {
                return Err(ClassFormatError::InvalidSwitch { offset });
            }
            let count = (i64::from(high) - i64::from(low) + 1) as usize;
            let mut targets = Vec::with_capacity(count.min(cursor.remaining() / 4));
            for _ in 0..count {
                targets.push(branch(i64::from(cursor.read_i32()?)));
            }
            Operand::TableSwitch {
                default,
                low,
                high,
                targets,
            }
        }
        OperandLayout::LookupSwitch => {
            cursor.skip(padding(offset))?;
            let default = branch(i64::from(cursor.read_i32()?));
            let npairs = cursor.read_i32()?;
            if npairs < 0 {
                return Err(ClassFormatError::InvalidSwitch { offset });
            }
            let npairs = npairs as usize;
            let mut pairs = Vec::with_capacity(npairs.min(cursor.remaining() / 8));
            for _ in 0..npairs {
                let key = cursor.read_i32()?;
                pairs.push((key, branch(i64::from(cursor.read_i32()?))));
            }
            Operand::LookupSwitch { default, pairs }
        }
        OperandLayout::Wide => return decode_wide(cursor, offset),
    };
    Ok(Instruction {
        offset,
        opcode,
        mnemonic,
        wide: false,
        operand,
    })
}

fn decode_wide(cursor: &mut ByteCursor<'_>, offset: usize) -> Result<Instruction> {
    let opcode_offset = cursor.position();
    let opcode = cursor.read_u8()?;
    let mnemonic = match opcodes::lookup(opcode) {
        Some((mnemonic, _)) if opcodes::is_widenable(opcode) => mnemonic,
        _ => {
            return Err(ClassFormatError::UnsupportedOpcode {
                opcode,
                offset: opcode_offset,
            });
        }
    };
    let operand = if opcode == opcodes::IINC {
        Operand::Increment {
            index: cursor.read_u16()?,
            delta: cursor.read_i16()?,
        }
    } else {
        Operand::Local(cursor.read_u16()?)
    };
    Ok(Instruction {
        offset,
        opcode,
        mnemonic,
        wide: true,
        operand,
    })
}

/// Bytes between a switch opcode at `offset` and the next 4-byte boundary
/// of the code array.
pub(crate) fn padding(offset: usize) -> usize {
    (4 - ((offset + 1) % 4)) % 4
}

impl Instruction {
    /// javap-style text, e.g. `    1: invokespecial #1  // Method ...`.
    /// Switches span several lines.
    pub fn render(&self, pool: &ConstantPool) -> String {
        let name = if self.wide {
            format!("wide {}", self.mnemonic)
        } else {
            self.mnemonic.to_string()
        };
        let constant = |index: u16, text: String| match pool.describe(index) {
            Ok(description) => format!("{text:<14}// {description}"),
            Err(_) => text,
        };
        let operands = match &self.operand {
            Operand::None => return format!("{:>5}: {name}", self.offset),
            Operand::Local(index) => index.to_string(),
            Operand::Byte(value) => value.to_string(),
            Operand::Short(value) => value.to_string(),
            Operand::Constant(index) => constant(*index, format!("#{index}")),
            Operand::Increment { index, delta } => format!("{index}, {delta}"),
            Operand::Branch(target) => target.to_string(),
            Operand::ArrayType(code) => opcodes::array_type_name(*code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<unknown type {code}>")),
            Operand::InvokeInterface { index, count } => {
                constant(*index, format!("#{index}, {count}"))
            }
            Operand::InvokeDynamic(index) => constant(*index, format!("#{index}, 0")),
            Operand::MultiANewArray { index, dimensions } => {
                constant(*index, format!("#{index}, {dimensions}"))
            }
            Operand::TableSwitch {
                default,
                low,
                high,
                targets,
            } => {
                let cases = (i64::from(*low)..=i64::from(*high)).zip(targets.iter().copied());
                return self.render_switch(&name, &format!("{low} to {high}"), cases, *default);
            }
            Operand::LookupSwitch { default, pairs } => {
                let cases = pairs.iter().map(|(key, target)| (i64::from(*key), *target));
                return self.render_switch(&name, &pairs.len().to_string(), cases, *default);
            }
        };
        format!("{:>5}: {name:<13} {operands}", self.offset)
    }

    fn render_switch(
        &self,
        name: &str,
        summary: &str,
        cases: impl Iterator<Item = (i64, i64)>,
        default: i64,
    ) -> String {
        let mut text = format!("{:>5}: {name:<13} {{ // {summary}", self.offset);
        for (key, target) in cases {
            text.push_str(&format!("\n{key:>18}: {target}"));
        }
        text.push_str(&format!("\n{:>18}: {default}\n{:>8}", "default", "}"));
        text
    }
}
