//! Human-readable text for a parsed class: the class summary and per-method
//! bytecode listings.

use crate::class_file::{ClassFile, MethodInfo};
use crate::code::{CodeAttribute, ExceptionTableEntry};
use crate::constant_pool::ConstantPool;
use crate::instruction::decode_instructions;

const NO_SUPERCLASS: &str = "N/A";
const NO_INTERFACES: &str = "(None)";
const NO_FIELDS: &str = "(No declared fields)";
const NO_METHODS: &str = "(No declared methods)";
const NO_BYTECODE: &str = "(No bytecode for this method - it may be abstract or native)";
const RULE_WIDTH: usize = 50;

/// Class overview: name, superclass, version, interfaces, fields and method
/// signatures, in declaration order. Ends with a newline.
pub fn summary_report(class: &ClassFile) -> String {
    let superclass = class
        .super_class
        .as_ref()
        .map_or(NO_SUPERCLASS, |name| name.display.as_str());
    let interfaces = if class.interfaces.is_empty() {
        NO_INTERFACES.to_string()
    } else {
        class
            .interfaces
            .iter()
            .map(|name| name.display.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let fields = if class.fields.is_empty() {
        NO_FIELDS.to_string()
    } else {
        class
            .fields
            .iter()
            .map(|field| format!(" - {} {}", field.display_type(), field.name))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let methods = if class.methods.is_empty() {
        NO_METHODS.to_string()
    } else {
        class
            .methods
            .iter()
            .map(|method| format!(" - {}", method.signature_key()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Class:       {}\n\
         Superclass:  {superclass}\n\
         Version:     {}.{} (Java {})\n\
         Interfaces:  {interfaces}\n\
         \n\
         --- Fields ---\n\
         {fields}\n\
         \n\
         --- Methods ---\n\
         {methods}\n",
        class.this_class.display,
        class.major_version,
        class.minor_version,
        class.java_release(),
    )
}

/// Bytecode listing for one method, or a placeholder when it has no body.
pub fn method_report(method: &MethodInfo, pool: &ConstantPool) -> String {
    let mut report = format!("Bytecode for method: {}\n\n\n", method.signature_key());
    match method.code() {
        Some(code) => write_code(&mut report, code, pool),
        None => report.push_str(NO_BYTECODE),
    }
    report
}

fn write_code(report: &mut String, code: &CodeAttribute, pool: &ConstantPool) {
    report.push_str(&format!(
        "Max stack: {}, Max locals: {}, Code length: {}\n",
        code.max_stack,
        code.max_locals,
        code.code.len()
    ));
    report.push_str(&"-".repeat(RULE_WIDTH));
    report.push('\n');
    match decode_instructions(&code.code) {
        Ok(instructions) => {
            for instruction in &instructions {
                report.push_str(&instruction.render(pool));
                report.push('\n');
            }
        }
        Err(error) => {
            report.push_str(&format!("(invalid bytecode: {error})\n"));
        }
    }
    if !code.exception_table.is_empty() {
        write_exception_table(report, &code.exception_table);
    }
}

fn write_exception_table(report: &mut String, entries: &[ExceptionTableEntry]) {
    report.push_str("Exception table:\n");
    report.push_str("   from    to  target type\n");
    for entry in entries {
        let catch_type = entry
            .catch_type
            .as_deref()
            .map_or_else(|| "any".to_string(), |name| format!("Class {name}"));
        report.push_str(&format!(
            "{:>7}{:>6}{:>8}   {catch_type}\n",
            entry.start_pc, entry.end_pc, entry.handler_pc
        ));
    }
}
