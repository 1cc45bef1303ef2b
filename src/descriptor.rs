use std::fmt;

use crate::error::{ClassFormatError, Result};

const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Primitive JVM types (everything but references and `void`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    fn from_code(code: u8) -> Option<Self> {
        let base = match code {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        };
        Some(base)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }
}

/// Parsed field type descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldType {
    Base(BaseType),
    /// Object type in internal form (`java/lang/String`).
    Object(String),
    Array {
        dimensions: usize,
        element: Box<FieldType>,
    },
}

impl FieldType {
    /// Source-level name: `java.lang.String[][]`.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => f.write_str(base.name()),
            FieldType::Object(name) => f.write_str(&name.replace('/', ".")),
            FieldType::Array {
                dimensions,
                element,
            } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}

/// Method return type: a field type or `void`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReturnType {
    Void,
    Value(FieldType),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("void"),
            ReturnType::Value(field_type) => write!(f, "{field_type}"),
        }
    }
}

/// Parsed method descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: ReturnType,
}

impl MethodDescriptor {
    pub fn parameter_display_names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(FieldType::display_name)
            .collect()
    }

    pub fn return_display_name(&self) -> String {
        self.return_type.to_string()
    }
}

/// Parse a single field descriptor such as `[Ljava/lang/String;`.
pub fn parse_field_descriptor(descriptor: &str) -> Result<FieldType> {
    let mut parser = DescriptorParser::new(descriptor);
    let field_type = parser.field_type()?;
    parser.finish()?;
    Ok(field_type)
}

/// Parse a method descriptor such as `(I[J)Ljava/lang/Object;`.
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor> {
    let mut parser = DescriptorParser::new(descriptor);
    if parser.next() != Some(b'(') {
        return Err(parser.error("method descriptor must start with '('"));
    }
    let mut parameters = Vec::new();
    loop {
        match parser.peek() {
            Some(b')') => {
                parser.next();
                break;
            }
            Some(_) => parameters.push(parser.field_type()?),
            None => return Err(parser.error("missing ')' in method descriptor")),
        }
    }
    let return_type = if parser.peek() == Some(b'V') {
        parser.next();
        ReturnType::Void
    } else {
        ReturnType::Value(parser.field_type()?)
    };
    parser.finish()?;
    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

/// Display name for the internal name stored in a `CONSTANT_Class` entry.
///
/// Plain class names use `/` separators; array classes are stored as field
/// descriptors.
pub fn class_display_name(internal_name: &str) -> Result<String> {
    if internal_name.starts_with('[') {
        return Ok(parse_field_descriptor(internal_name)?.display_name());
    }
    Ok(internal_name.replace('/', "."))
}

struct DescriptorParser<'a> {
    descriptor: &'a str,
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            descriptor,
            bytes: descriptor.as_bytes(),
            offset: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        Some(byte)
    }

    fn error(&self, reason: &'static str) -> ClassFormatError {
        ClassFormatError::malformed_descriptor(self.descriptor, reason)
    }

    fn field_type(&mut self) -> Result<FieldType> {
        let mut dimensions = 0usize;
        while self.peek() == Some(b'[') {
            self.next();
            dimensions += 1;
        }
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(self.error("too many array dimensions"));
        }
        let element = match self.next() {
            None if dimensions > 0 => return Err(self.error("unterminated array type")),
            None => return Err(self.error("descriptor ends mid-type")),
            Some(b'L') => self.object_type()?,
            Some(b'V') => return Err(self.error("void is only valid as a return type")),
            Some(code) => match BaseType::from_code(code) {
                Some(base) => FieldType::Base(base),
                None => return Err(self.error("unknown type code")),
            },
        };
        if dimensions == 0 {
            return Ok(element);
        }
        Ok(FieldType::Array {
            dimensions,
            element: Box::new(element),
        })
    }

    fn object_type(&mut self) -> Result<FieldType> {
        let start = self.offset;
        let Some(length) = self.bytes[start..].iter().position(|&byte| byte == b';') else {
            return Err(self.error("unterminated class name"));
        };
        if length == 0 {
            return Err(self.error("empty class name"));
        }
        let name = &self.descriptor[start..start + length];
        self.offset = start + length + 1;
        Ok(FieldType::Object(name.to_string()))
    }

    fn finish(&self) -> Result<()> {
        if self.offset != self.bytes.len() {
            return Err(self.error("trailing characters after descriptor"));
        }
        Ok(())
    }
}
