use bitflags::bitflags;

bitflags! {
    /// Access flags of a class, interface or module.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ClassAccess: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags of a field.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FieldAccess: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// Access flags of a method.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MethodAccess: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl ClassAccess {
    /// Lower-case flag names in declaration order; unknown bits are dropped.
    pub fn keywords(self) -> Vec<&'static str> {
        keywords(self.iter_names())
    }
}

impl FieldAccess {
    pub fn keywords(self) -> Vec<&'static str> {
        keywords(self.iter_names())
    }
}

impl MethodAccess {
    pub fn keywords(self) -> Vec<&'static str> {
        keywords(self.iter_names())
    }
}

fn keywords<T>(names: impl Iterator<Item = (&'static str, T)>) -> Vec<&'static str> {
    names.map(|(name, _)| keyword(name)).collect()
}

fn keyword(name: &'static str) -> &'static str {
    match name {
        "PUBLIC" => "public",
        "PRIVATE" => "private",
        "PROTECTED" => "protected",
        "STATIC" => "static",
        "FINAL" => "final",
        "SUPER" => "super",
        "SYNCHRONIZED" => "synchronized",
        "VOLATILE" => "volatile",
        "BRIDGE" => "bridge",
        "TRANSIENT" => "transient",
        "VARARGS" => "varargs",
        "NATIVE" => "native",
        "INTERFACE" => "interface",
        "ABSTRACT" => "abstract",
        "STRICT" => "strictfp",
        "SYNTHETIC" => "synthetic",
        "ANNOTATION" => "annotation",
        "ENUM" => "enum",
        "MODULE" => "module",
        other => other,
    }
}
