//! JVM opcode values and their operand layouts (JVMS chapter 6).

pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const ILOAD: u8 = 0x15;
pub const ALOAD: u8 = 0x19;
pub const ISTORE: u8 = 0x36;
pub const ASTORE: u8 = 0x3a;
pub const IINC: u8 = 0x84;
pub const IFEQ: u8 = 0x99;
pub const GOTO: u8 = 0xa7;
pub const JSR: u8 = 0xa8;
pub const RET: u8 = 0xa9;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const IFNULL: u8 = 0xc6;
pub const IFNONNULL: u8 = 0xc7;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;
pub const BREAKPOINT: u8 = 0xca;
pub const IMPDEP1: u8 = 0xfe;
pub const IMPDEP2: u8 = 0xff;

/// Mnemonics for the contiguous standard range `0x00..=JSR_W`.
static MNEMONICS: [&str; 202] = [
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3",
    "iconst_4", "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2",
    "dconst_0", "dconst_1", "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload",
    "fload", "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0",
    "lload_1", "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0",
    "dload_1", "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload",
    "laload", "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
    "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
    "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3",
    "dstore_0", "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2",
    "astore_3", "iastore", "lastore", "fastore", "dastore", "aastore", "bastore", "castore",
    "sastore", "pop", "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap",
    "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub", "imul", "lmul", "fmul",
    "dmul", "idiv", "ldiv", "fdiv", "ddiv", "irem", "lrem", "frem", "drem", "ineg", "lneg",
    "fneg", "dneg", "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land", "ior",
    "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d", "l2i", "l2f", "l2d", "f2i", "f2l",
    "f2d", "d2i", "d2l", "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl",
    "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq", "if_icmpne",
    "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto",
    "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn",
    "areturn", "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual",
    "invokespecial", "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray",
    "anewarray", "arraylength", "athrow", "checkcast", "instanceof", "monitorenter",
    "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull", "goto_w", "jsr_w",
];

/// Shape of the bytes following an opcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OperandLayout {
    None,
    /// Unsigned byte local-variable index (u16 under `wide`).
    LocalIndex,
    /// Signed byte immediate (`bipush`).
    Byte,
    /// Signed short immediate (`sipush`).
    Short,
    /// One-byte constant pool index (`ldc`).
    ConstantPoolU8,
    ConstantPoolU16,
    /// Local index and signed increment (`iinc`).
    Increment,
    BranchI16,
    BranchI32,
    /// Primitive array type code (`newarray`).
    ArrayType,
    /// Index, argument count and a zero byte.
    InvokeInterface,
    /// Index and two zero bytes.
    InvokeDynamic,
    /// Class index and dimension count.
    MultiANewArray,
    TableSwitch,
    LookupSwitch,
    Wide,
}

/// Mnemonic and operand layout, or `None` for an unassigned opcode.
pub(crate) fn lookup(opcode: u8) -> Option<(&'static str, OperandLayout)> {
    let mnemonic = match opcode {
        0x00..=JSR_W => MNEMONICS[usize::from(opcode)],
        BREAKPOINT => "breakpoint",
        IMPDEP1 => "impdep1",
        IMPDEP2 => "impdep2",
        _ => return None,
    };
    let layout = match opcode {
        BIPUSH => OperandLayout::Byte,
        SIPUSH => OperandLayout::Short,
        LDC => OperandLayout::ConstantPoolU8,
        LDC_W | LDC2_W => OperandLayout::ConstantPoolU16,
        ILOAD..=ALOAD | ISTORE..=ASTORE | RET => OperandLayout::LocalIndex,
        IINC => OperandLayout::Increment,
        IFEQ..=JSR | IFNULL | IFNONNULL => OperandLayout::BranchI16,
        GOTO_W | JSR_W => OperandLayout::BranchI32,
        TABLESWITCH => OperandLayout::TableSwitch,
        LOOKUPSWITCH => OperandLayout::LookupSwitch,
        GETSTATIC..=INVOKESTATIC | NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
            OperandLayout::ConstantPoolU16
        }
        INVOKEINTERFACE => OperandLayout::InvokeInterface,
        INVOKEDYNAMIC => OperandLayout::InvokeDynamic,
        NEWARRAY => OperandLayout::ArrayType,
        MULTIANEWARRAY => OperandLayout::MultiANewArray,
        WIDE => OperandLayout::Wide,
        _ => OperandLayout::None,
    };
    Some((mnemonic, layout))
}

/// Whether `opcode` may follow `wide`.
pub(crate) fn is_widenable(opcode: u8) -> bool {
    matches!(opcode, ILOAD..=ALOAD | ISTORE..=ASTORE | RET | IINC)
}

/// Element type name for a `newarray` type code.
pub(crate) fn array_type_name(code: u8) -> Option<&'static str> {
    let name = match code {
        4 => "boolean",
        5 => "char",
        6 => "float",
        7 => "double",
        8 => "byte",
        9 => "short",
        10 => "int",
        11 => "long",
        _ => return None,
    };
    Some(name)
}
