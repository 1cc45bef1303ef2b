//! Class file writer used by unit tests to produce well-formed (or
//! deliberately broken) class bytes without a Java toolchain.

/// Method body for [`ClassFileBuilder::add_method`].
pub(crate) struct CodeSpec {
    pub(crate) max_stack: u16,
    pub(crate) max_locals: u16,
    pub(crate) code: Vec<u8>,
    pub(crate) exception_table: Vec<[u16; 4]>,
}

impl CodeSpec {
    pub(crate) fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
        }
    }

    pub(crate) fn with_handler(mut self, start: u16, end: u16, handler: u16, catch: u16) -> Self {
        self.exception_table.push([start, end, handler, catch]);
        self
    }
}

/// Minimal class file writer.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    next_index: u16,
    major_version: u16,
    minor_version: u16,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<MemberSpec>,
    methods: Vec<MemberSpec>,
    attributes: Vec<(u16, Vec<u8>)>,
    code_index: u16,
}

struct MemberSpec {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    code: Option<CodeSpec>,
    raw_attributes: Vec<(u16, Vec<u8>)>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            next_index: 1,
            major_version: 52,
            minor_version: 0,
            access_flags: 0x0021,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            code_index: 0,
        };
        builder.code_index = builder.add_utf8("Code");
        builder.this_class = builder.add_class(class_name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.add_class(super_name);
        }
        builder
    }

    pub(crate) fn with_version(mut self, major: u16, minor: u16) -> Self {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    pub(crate) fn set_this_class(&mut self, index: u16) {
        self.this_class = index;
    }

    fn push(&mut self, entry: CpEntry) -> u16 {
        let index = self.next_index;
        self.next_index += entry.slots();
        self.cp.push(entry);
        index
    }

    pub(crate) fn add_utf8(&mut self, value: &str) -> u16 {
        self.push(CpEntry::Utf8(value.to_string()))
    }

    pub(crate) fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.push(CpEntry::Class(name_index))
    }

    pub(crate) fn add_string(&mut self, value: &str) -> u16 {
        let value_index = self.add_utf8(value);
        self.push(CpEntry::String(value_index))
    }

    pub(crate) fn add_integer(&mut self, value: i32) -> u16 {
        self.push(CpEntry::Integer(value))
    }

    pub(crate) fn add_long(&mut self, value: i64) -> u16 {
        self.push(CpEntry::Long(value))
    }

    pub(crate) fn add_double(&mut self, value: f64) -> u16 {
        self.push(CpEntry::Double(value))
    }

    pub(crate) fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(CpEntry::NameAndType(name_index, descriptor_index))
    }

    pub(crate) fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::FieldRef(class_index, name_and_type))
    }

    pub(crate) fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::MethodRef(class_index, name_and_type))
    }

    pub(crate) fn add_interface_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> u16 {
        let class_index = self.add_class(class);
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::InterfaceMethodRef(class_index, name_and_type))
    }

    pub(crate) fn add_invoke_dynamic(&mut self, bootstrap: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type = self.add_name_and_type(name, descriptor);
        self.push(CpEntry::InvokeDynamic(bootstrap, name_and_type))
    }

    /// Append an arbitrary tag and payload, e.g. to exercise unknown tags.
    pub(crate) fn add_raw_constant(&mut self, bytes: Vec<u8>) -> u16 {
        self.push(CpEntry::Raw(bytes))
    }

    pub(crate) fn add_interface(&mut self, name: &str) {
        let index = self.add_class(name);
        self.interfaces.push(index);
    }

    pub(crate) fn add_field(&mut self, access_flags: u16, name: &str, descriptor: &str) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.fields.push(MemberSpec {
            access_flags,
            name_index,
            descriptor_index,
            code: None,
            raw_attributes: Vec::new(),
        });
    }

    /// Field carrying one attribute with an arbitrary name and payload.
    pub(crate) fn add_field_with_attribute(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attribute: &str,
        data: Vec<u8>,
    ) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        let attribute_index = self.add_utf8(attribute);
        self.fields.push(MemberSpec {
            access_flags,
            name_index,
            descriptor_index,
            code: None,
            raw_attributes: vec![(attribute_index, data)],
        });
    }

    pub(crate) fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<CodeSpec>,
    ) {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.methods.push(MemberSpec {
            access_flags,
            name_index,
            descriptor_index,
            code,
            raw_attributes: Vec::new(),
        });
    }

    pub(crate) fn add_attribute(&mut self, name: &str, data: Vec<u8>) {
        let name_index = self.add_utf8(name);
        self.attributes.push((name_index, data));
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFEBABE);
        write_u16(&mut bytes, self.minor_version);
        write_u16(&mut bytes, self.major_version);
        write_u16(&mut bytes, self.next_index);
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, self.access_flags);
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            write_u16(&mut bytes, *interface);
        }
        for members in [&self.fields, &self.methods] {
            write_u16(&mut bytes, members.len() as u16);
            for member in members {
                write_u16(&mut bytes, member.access_flags);
                write_u16(&mut bytes, member.name_index);
                write_u16(&mut bytes, member.descriptor_index);
                let count = member.raw_attributes.len() + usize::from(member.code.is_some());
                write_u16(&mut bytes, count as u16);
                if let Some(code) = &member.code {
                    write_u16(&mut bytes, self.code_index);
                    let payload = code_attribute_payload(
                        code.max_stack,
                        code.max_locals,
                        &code.code,
                        &code.exception_table,
                    );
                    write_u32(&mut bytes, payload.len() as u32);
                    bytes.extend_from_slice(&payload);
                }
                for (name_index, data) in &member.raw_attributes {
                    write_u16(&mut bytes, *name_index);
                    write_u32(&mut bytes, data.len() as u32);
                    bytes.extend_from_slice(data);
                }
            }
        }
        write_u16(&mut bytes, self.attributes.len() as u16);
        for (name_index, data) in &self.attributes {
            write_u16(&mut bytes, *name_index);
            write_u32(&mut bytes, data.len() as u32);
            bytes.extend_from_slice(data);
        }
        bytes
    }
}

/// Payload of a `Code` attribute with no nested attributes.
pub(crate) fn code_attribute_payload(
    max_stack: u16,
    max_locals: u16,
    code: &[u8],
    exception_table: &[[u16; 4]],
) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_u16(&mut bytes, max_stack);
    write_u16(&mut bytes, max_locals);
    write_u32(&mut bytes, code.len() as u32);
    bytes.extend_from_slice(code);
    write_u16(&mut bytes, exception_table.len() as u16);
    for entry in exception_table {
        for value in entry {
            write_u16(&mut bytes, *value);
        }
    }
    write_u16(&mut bytes, 0);
    bytes
}

/// Constant pool entries the builder can emit.
enum CpEntry {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    InvokeDynamic(u16, u16),
    Raw(Vec<u8>),
}

impl CpEntry {
    fn slots(&self) -> u16 {
        match self {
            CpEntry::Long(_) | CpEntry::Double(_) => 2,
            _ => 1,
        }
    }

    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Integer(value) => {
                bytes.push(3);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            CpEntry::Long(value) => {
                bytes.push(5);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            CpEntry::Double(value) => {
                bytes.push(6);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
            CpEntry::String(value_index) => {
                bytes.push(8);
                write_u16(bytes, *value_index);
            }
            CpEntry::NameAndType(name_index, descriptor_index) => {
                bytes.push(12);
                write_u16(bytes, *name_index);
                write_u16(bytes, *descriptor_index);
            }
            CpEntry::FieldRef(class_index, name_and_type) => {
                bytes.push(9);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::MethodRef(class_index, name_and_type) => {
                bytes.push(10);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::InterfaceMethodRef(class_index, name_and_type) => {
                bytes.push(11);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::InvokeDynamic(bootstrap, name_and_type) => {
                bytes.push(18);
                write_u16(bytes, *bootstrap);
                write_u16(bytes, *name_and_type);
            }
            CpEntry::Raw(raw) => bytes.extend_from_slice(raw),
        }
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn high(value: u16) -> u8 {
    (value >> 8) as u8
}

pub(crate) fn low(value: u16) -> u8 {
    (value & 0xff) as u8
}
