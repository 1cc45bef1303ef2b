use std::sync::Arc;

use tracing::debug;

use crate::access::{ClassAccess, FieldAccess, MethodAccess};
use crate::code::{CodeAttribute, parse_code_attribute};
use crate::constant_pool::ConstantPool;
use crate::cursor::ByteCursor;
use crate::descriptor::{
    FieldType, MethodDescriptor, class_display_name, parse_field_descriptor,
    parse_method_descriptor,
};
use crate::error::{ClassFormatError, Result};

pub const MAGIC: u32 = 0xCAFEBABE;

const CODE_ATTRIBUTE: &str = "Code";

/// Class name in both JVM-internal (`java/lang/String`) and display
/// (`java.lang.String`) form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassName {
    pub internal: String,
    pub display: String,
}

impl ClassName {
    fn resolve(pool: &ConstantPool, index: u16) -> Result<Self> {
        let internal = pool.class_name(index)?;
        Ok(Self {
            internal: internal.to_string(),
            display: class_display_name(internal)?,
        })
    }
}

/// Parsed class file. Immutable once built.
#[derive(Clone, Debug)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: Arc<ConstantPool>,
    pub access_flags: ClassAccess,
    pub this_class: ClassName,
    /// `None` only for classes without a superclass (`java.lang.Object`,
    /// `module-info`).
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Java SE release matching the major version (52 → 8).
    pub fn java_release(&self) -> i32 {
        i32::from(self.major_version) - 44
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    pub access_flags: FieldAccess,
    pub name: String,
    pub descriptor: String,
    pub field_type: FieldType,
    pub attributes: Vec<Attribute>,
}

impl FieldInfo {
    pub fn display_type(&self) -> String {
        self.field_type.display_name()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodAccess,
    pub name: String,
    pub descriptor: String,
    pub method_descriptor: MethodDescriptor,
    pub attributes: Vec<Attribute>,
}

impl MethodInfo {
    /// The method body, absent for abstract and native methods.
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Code(code) => Some(code),
            Attribute::Other(_) => None,
        })
    }

    /// `"<return> <name>(<param>, <param>)"`, the handle used to pick a
    /// method for disassembly.
    pub fn signature_key(&self) -> String {
        format!(
            "{} {}({})",
            self.method_descriptor.return_display_name(),
            self.name,
            self.method_descriptor.parameter_display_names().join(", ")
        )
    }
}

/// Attribute attached to a class, field, method or `Code` body.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Code(CodeAttribute),
    Other(RawAttribute),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Code(_) => CODE_ATTRIBUTE,
            Attribute::Other(raw) => &raw.name,
        }
    }
}

/// Attribute kept as its name and undecoded payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttribute {
    pub name: String,
    pub data: Vec<u8>,
}

/// Parse a complete class file. The first format violation aborts the parse.
pub fn parse_class_file(data: &[u8]) -> Result<ClassFile> {
    let mut cursor = ByteCursor::new(data);
    let magic = cursor.read_u32()?;
    if magic != MAGIC {
        return Err(ClassFormatError::BadMagic { found: magic });
    }
    let minor_version = cursor.read_u16()?;
    let major_version = cursor.read_u16()?;
    let pool = ConstantPool::parse(&mut cursor)?;
    let access_flags = ClassAccess::from_bits_retain(cursor.read_u16()?);
    let this_class = ClassName::resolve(&pool, cursor.read_u16()?)?;
    let super_index = cursor.read_u16()?;
    let super_class = if super_index == 0 {
        None
    } else {
        Some(ClassName::resolve(&pool, super_index)?)
    };

    let interface_count = cursor.read_u16()?;
    let mut interfaces = Vec::with_capacity(usize::from(interface_count));
    for _ in 0..interface_count {
        interfaces.push(ClassName::resolve(&pool, cursor.read_u16()?)?);
    }

    let field_count = cursor.read_u16()?;
    let mut fields = Vec::with_capacity(usize::from(field_count));
    for _ in 0..field_count {
        fields.push(parse_field(&mut cursor, &pool)?);
    }

    let method_count = cursor.read_u16()?;
    let mut methods = Vec::with_capacity(usize::from(method_count));
    for _ in 0..method_count {
        methods.push(parse_method(&mut cursor, &pool)?);
    }

    let attributes: Vec<Attribute> = read_raw_attributes(&mut cursor, &pool)?
        .into_iter()
        .map(Attribute::Other)
        .collect();
    if !cursor.is_empty() {
        debug!(
            class = %this_class.display,
            trailing = cursor.remaining(),
            "ignoring bytes after class attributes"
        );
    }
    debug!(
        class = %this_class.display,
        major_version,
        constants = pool.count(),
        fields = fields.len(),
        methods = methods.len(),
        "parsed class file"
    );

    Ok(ClassFile {
        minor_version,
        major_version,
        constant_pool: Arc::new(pool),
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn parse_field(cursor: &mut ByteCursor<'_>, pool: &ConstantPool) -> Result<FieldInfo> {
    let access_flags = FieldAccess::from_bits_retain(cursor.read_u16()?);
    let name = pool.utf8(cursor.read_u16()?)?.to_string();
    let descriptor = pool.utf8(cursor.read_u16()?)?.to_string();
    let field_type = parse_field_descriptor(&descriptor)?;
    let attributes = read_attributes(cursor, pool)?;
    Ok(FieldInfo {
        access_flags,
        name,
        descriptor,
        field_type,
        attributes,
    })
}

fn parse_method(cursor: &mut ByteCursor<'_>, pool: &ConstantPool) -> Result<MethodInfo> {
    let access_flags = MethodAccess::from_bits_retain(cursor.read_u16()?);
    let name = pool.utf8(cursor.read_u16()?)?.to_string();
    let descriptor = pool.utf8(cursor.read_u16()?)?.to_string();
    let method_descriptor = parse_method_descriptor(&descriptor)?;
    let attributes = read_attributes(cursor, pool)?;
    Ok(MethodInfo {
        access_flags,
        name,
        descriptor,
        method_descriptor,
        attributes,
    })
}

/// Member attribute table. `Code` payloads are decoded, the rest kept raw.
fn read_attributes(cursor: &mut ByteCursor<'_>, pool: &ConstantPool) -> Result<Vec<Attribute>> {
    read_raw_attributes(cursor, pool)?
        .into_iter()
        .map(|raw| {
            if raw.name == CODE_ATTRIBUTE {
                Ok(Attribute::Code(parse_code_attribute(&raw.data, pool)?))
            } else {
                Ok(Attribute::Other(raw))
            }
        })
        .collect()
}

/// Read an attribute table (`u2` count, then name index, `u4` length and
/// payload per entry) without interpreting any payload.
pub(crate) fn read_raw_attributes(
    cursor: &mut ByteCursor<'_>,
    pool: &ConstantPool,
) -> Result<Vec<RawAttribute>> {
    let count = cursor.read_u16()?;
    let mut attributes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name = pool.utf8(cursor.read_u16()?)?.to_string();
        let length = cursor.read_u32()? as usize;
        let data = cursor.read_bytes(length)?.to_vec();
        attributes.push(RawAttribute { name, data });
    }
    Ok(attributes)
}
