use std::fmt;

use crate::cursor::ByteCursor;
use crate::error::{ClassFormatError, Result};

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

/// Single constant pool entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: ReferenceKind,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

impl Constant {
    /// Long and Double entries take two pool slots.
    fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// Method handle behaviour (JVMS 5.4.3.5).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReferenceKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl ReferenceKind {
    fn from_u8(value: u8) -> Option<Self> {
        let kind = match value {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            ReferenceKind::GetField => "REF_getField",
            ReferenceKind::GetStatic => "REF_getStatic",
            ReferenceKind::PutField => "REF_putField",
            ReferenceKind::PutStatic => "REF_putStatic",
            ReferenceKind::InvokeVirtual => "REF_invokeVirtual",
            ReferenceKind::InvokeStatic => "REF_invokeStatic",
            ReferenceKind::InvokeSpecial => "REF_invokeSpecial",
            ReferenceKind::NewInvokeSpecial => "REF_newInvokeSpecial",
            ReferenceKind::InvokeInterface => "REF_invokeInterface",
        }
    }

    fn is_field_access(self) -> bool {
        matches!(
            self,
            ReferenceKind::GetField
                | ReferenceKind::GetStatic
                | ReferenceKind::PutField
                | ReferenceKind::PutStatic
        )
    }
}

/// Kind of a resolved field or method reference.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberKind {
    Field,
    Method,
    InterfaceMethod,
}

impl MemberKind {
    fn label(self) -> &'static str {
        match self {
            MemberKind::Field => "Field",
            MemberKind::Method => "Method",
            MemberKind::InterfaceMethod => "InterfaceMethod",
        }
    }
}

/// Field or method reference with every index resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemberRef<'a> {
    pub kind: MemberKind,
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

impl fmt::Display for MemberRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.starts_with('<') {
            write!(f, "{}.\"{}\":{}", self.owner, self.name, self.descriptor)
        } else {
            write!(f, "{}.{}:{}", self.owner, self.name, self.descriptor)
        }
    }
}

/// 1-based constant pool. Slot 0 and the slot after each Long/Double are
/// unusable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

impl ConstantPool {
    /// Read `constant_pool_count` and the entries that follow, then check
    /// that every cross-reference points at an entry of the right kind.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let count = cursor.read_u16()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(None);
        let count = u32::from(count);
        let mut index = 1u32;
        while index < count {
            let constant = read_constant(cursor, index as u16)?;
            let wide = constant.is_wide();
            entries.push(Some(constant));
            if wide {
                if index + 1 >= count {
                    return Err(invalid(index as u16, "two-slot constant within pool bounds"));
                }
                entries.push(None);
                index += 2;
            } else {
                index += 1;
            }
        }
        let pool = Self { entries };
        pool.validate()?;
        Ok(pool)
    }

    /// Value of `constant_pool_count`: one more than the highest slot.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Usable entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|entry| (index as u16, entry)))
    }

    pub fn get(&self, index: u16) -> Result<&Constant> {
        self.lookup(index, "constant")
    }

    fn lookup(&self, index: u16, expected: &'static str) -> Result<&Constant> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFormatError::InvalidConstantPoolIndex { index, expected })
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.lookup(index, "Utf8")? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(invalid(index, "Utf8")),
        }
    }

    /// Internal name (`java/lang/Object`) of a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.lookup(index, "Class")? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(invalid(index, "Class")),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.lookup(index, "NameAndType")? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(invalid(index, "NameAndType")),
        }
    }

    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>> {
        let expected = "field or method reference";
        let (kind, class_index, name_and_type_index) = match self.lookup(index, expected)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            } => (MemberKind::Field, *class_index, *name_and_type_index),
            Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => (MemberKind::Method, *class_index, *name_and_type_index),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (MemberKind::InterfaceMethod, *class_index, *name_and_type_index),
            _ => return Err(invalid(index, expected)),
        };
        let owner = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Ok(MemberRef {
            kind,
            owner,
            name,
            descriptor,
        })
    }

    /// Human-readable rendering of an entry, as shown next to instruction
    /// operands (`Method java/lang/Object."<init>":()V`, `String hello`).
    pub fn describe(&self, index: u16) -> Result<String> {
        let text = match self.get(index)? {
            Constant::Utf8(value) => format!("Utf8 {value}"),
            Constant::Integer(value) => format!("int {value}"),
            Constant::Float(value) => format!("float {}f", format_float(*value)),
            Constant::Long(value) => format!("long {value}l"),
            Constant::Double(value) => format!("double {}d", format_float(*value)),
            Constant::Class { name_index } => format!("class {}", self.utf8(*name_index)?),
            Constant::String { string_index } => format!("String {}", self.utf8(*string_index)?),
            Constant::FieldRef { .. }
            | Constant::MethodRef { .. }
            | Constant::InterfaceMethodRef { .. } => {
                let member = self.member_ref(index)?;
                format!("{} {member}", member.kind.label())
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => format!(
                "NameAndType {}:{}",
                self.utf8(*name_index)?,
                self.utf8(*descriptor_index)?
            ),
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => format!(
                "MethodHandle {} {}",
                reference_kind.name(),
                self.member_ref(*reference_index)?
            ),
            Constant::MethodType { descriptor_index } => {
                format!("MethodType {}", self.utf8(*descriptor_index)?)
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                format!("Dynamic #{bootstrap_method_attr_index}:{name}:{descriptor}")
            }
            Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                format!("InvokeDynamic #{bootstrap_method_attr_index}:{name}:{descriptor}")
            }
            Constant::Module { name_index } => format!("Module {}", self.utf8(*name_index)?),
            Constant::Package { name_index } => format!("Package {}", self.utf8(*name_index)?),
        };
        Ok(text)
    }

    fn validate(&self) -> Result<()> {
        for (index, constant) in self.iter() {
            match constant {
                Constant::Utf8(_)
                | Constant::Integer(_)
                | Constant::Float(_)
                | Constant::Long(_)
                | Constant::Double(_) => {}
                Constant::Class { name_index }
                | Constant::Module { name_index }
                | Constant::Package { name_index } => {
                    self.utf8(*name_index)?;
                }
                Constant::String { string_index } => {
                    self.utf8(*string_index)?;
                }
                Constant::MethodType { descriptor_index } => {
                    self.utf8(*descriptor_index)?;
                }
                Constant::NameAndType { .. } => {
                    self.name_and_type(index)?;
                }
                Constant::FieldRef { .. }
                | Constant::MethodRef { .. }
                | Constant::InterfaceMethodRef { .. } => {
                    self.member_ref(index)?;
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    let member = self.member_ref(*reference_index)?;
                    let field_target = member.kind == MemberKind::Field;
                    if field_target != reference_kind.is_field_access() {
                        return Err(invalid(
                            *reference_index,
                            "reference matching the method handle kind",
                        ));
                    }
                }
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => {
                    self.name_and_type(*name_and_type_index)?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(index: u16, expected: &'static str) -> ClassFormatError {
    ClassFormatError::InvalidConstantPoolIndex { index, expected }
}

fn read_constant(cursor: &mut ByteCursor<'_>, index: u16) -> Result<Constant> {
    let tag = cursor.read_u8()?;
    let constant = match tag {
        TAG_UTF8 => {
            let length = cursor.read_u16()? as usize;
            let bytes = cursor.read_bytes(length)?;
            Constant::Utf8(decode_modified_utf8(bytes))
        }
        TAG_INTEGER => Constant::Integer(cursor.read_i32()?),
        TAG_FLOAT => Constant::Float(cursor.read_f32()?),
        TAG_LONG => Constant::Long(cursor.read_i64()?),
        TAG_DOUBLE => Constant::Double(cursor.read_f64()?),
        TAG_CLASS => Constant::Class {
            name_index: cursor.read_u16()?,
        },
        TAG_STRING => Constant::String {
            string_index: cursor.read_u16()?,
        },
        TAG_FIELDREF => Constant::FieldRef {
            class_index: cursor.read_u16()?,
            name_and_type_index: cursor.read_u16()?,
        },
        TAG_METHODREF => Constant::MethodRef {
            class_index: cursor.read_u16()?,
            name_and_type_index: cursor.read_u16()?,
        },
        TAG_INTERFACE_METHODREF => Constant::InterfaceMethodRef {
            class_index: cursor.read_u16()?,
            name_and_type_index: cursor.read_u16()?,
        },
        TAG_NAME_AND_TYPE => Constant::NameAndType {
            name_index: cursor.read_u16()?,
            descriptor_index: cursor.read_u16()?,
        },
        TAG_METHOD_HANDLE => {
            let kind = cursor.read_u8()?;
            let reference_index = cursor.read_u16()?;
            let reference_kind = ReferenceKind::from_u8(kind)
                .ok_or_else(|| invalid(index, "method handle reference kind 1-9"))?;
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            }
        }
        TAG_METHOD_TYPE => Constant::MethodType {
            descriptor_index: cursor.read_u16()?,
        },
        TAG_DYNAMIC => Constant::Dynamic {
            bootstrap_method_attr_index: cursor.read_u16()?,
            name_and_type_index: cursor.read_u16()?,
        },
        TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
            bootstrap_method_attr_index: cursor.read_u16()?,
            name_and_type_index: cursor.read_u16()?,
        },
        TAG_MODULE => Constant::Module {
            name_index: cursor.read_u16()?,
        },
        TAG_PACKAGE => Constant::Package {
            name_index: cursor.read_u16()?,
        },
        _ => return Err(ClassFormatError::UnsupportedTag { tag, index }),
    };
    Ok(constant)
}

/// Decode the JVM's modified UTF-8: `NUL` is two bytes and supplementary
/// characters are surrogate pairs of three-byte sequences. Ill-formed input
/// decodes to U+FFFD rather than failing.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    if bytes.iter().all(|&byte| byte != 0 && byte < 0x80) {
        return bytes.iter().map(|&byte| byte as char).collect();
    }
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let first = bytes[index];
        let continuation = |at: usize| {
            bytes
                .get(at)
                .copied()
                .filter(|byte| byte & 0xC0 == 0x80)
                .map(|byte| u16::from(byte & 0x3F))
        };
        match first {
            0x01..=0x7F => {
                units.push(u16::from(first));
                index += 1;
            }
            0xC0..=0xDF => match continuation(index + 1) {
                Some(second) => {
                    units.push((u16::from(first & 0x1F) << 6) | second);
                    index += 2;
                }
                None => {
                    units.push(0xFFFD);
                    index += 1;
                }
            },
            0xE0..=0xEF => match (continuation(index + 1), continuation(index + 2)) {
                (Some(second), Some(third)) => {
                    units.push((u16::from(first & 0x0F) << 12) | (second << 6) | third);
                    index += 3;
                }
                _ => {
                    units.push(0xFFFD);
                    index += 1;
                }
            },
            _ => {
                units.push(0xFFFD);
                index += 1;
            }
        }
    }
    String::from_utf16_lossy(&units)
}

/// Float text as Java's `toString` prints it: plain decimals for
/// magnitudes in `[1e-3, 1e7)`, otherwise `1.0E10` style. Special values
/// print as `NaN` and `Infinity`.
fn format_float<T>(value: T) -> String
where
    T: Copy + fmt::Debug + fmt::LowerExp + Into<f64>,
{
    let wide: f64 = value.into();
    if wide.is_nan() {
        return "NaN".to_string();
    }
    if wide.is_infinite() {
        return if wide > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = wide.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}
