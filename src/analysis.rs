use std::fs;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::class_file::{ClassFile, MethodInfo, parse_class_file};
use crate::constant_pool::ConstantPool;
use crate::error::{Error, Result};
use crate::hex::hex_dump;
use crate::instruction::decode_instructions;
use crate::report::{method_report, summary_report};

/// Methods keyed by signature, in declaration order. When two methods share
/// a key the later one is kept at the position of the first.
pub type MethodMap = IndexMap<String, MethodEntry>;

/// A method together with the constant pool its bytecode refers to.
#[derive(Clone, Debug)]
pub struct MethodEntry {
    pub method: MethodInfo,
    pub constant_pool: Arc<ConstantPool>,
}

/// Everything produced for one class file.
#[derive(Clone, Debug)]
pub struct AnalysisResult {
    pub summary: String,
    pub methods: MethodMap,
    pub hex_dump: String,
    pub class_file: ClassFile,
    /// Signature keys shared by more than one method, in first-seen order.
    pub duplicate_signatures: Vec<String>,
}

/// Parse `bytes` and build the summary, method map and hex dump.
///
/// Every method body is decoded once here, so a result that comes back `Ok`
/// can always be disassembled.
pub fn analyze(bytes: &[u8]) -> Result<AnalysisResult> {
    let class_file = parse_class_file(bytes)?;
    for method in &class_file.methods {
        if let Some(code) = method.code() {
            decode_instructions(&code.code)?;
        }
    }
    let (methods, duplicate_signatures) = build_method_map(&class_file);
    for signature in &duplicate_signatures {
        warn!(
            class = %class_file.this_class.display,
            signature = %signature,
            "duplicate method signature; keeping the last declaration"
        );
    }
    debug!(
        class = %class_file.this_class.display,
        methods = methods.len(),
        bytes = bytes.len(),
        "analyzed class"
    );
    Ok(AnalysisResult {
        summary: summary_report(&class_file),
        methods,
        hex_dump: hex_dump(bytes),
        class_file,
        duplicate_signatures,
    })
}

/// Read a class file from disk and analyze it.
pub fn analyze_path(path: &Path) -> Result<AnalysisResult, Error> {
    let bytes = fs::read(path)?;
    Ok(analyze(&bytes)?)
}

/// Bytecode listing for a method taken from [`AnalysisResult::methods`].
pub fn disassemble(entry: &MethodEntry) -> String {
    method_report(&entry.method, &entry.constant_pool)
}

fn build_method_map(class_file: &ClassFile) -> (MethodMap, Vec<String>) {
    let mut methods = MethodMap::with_capacity(class_file.methods.len());
    let mut duplicates = Vec::new();
    for method in &class_file.methods {
        let key = method.signature_key();
        let entry = MethodEntry {
            method: method.clone(),
            constant_pool: Arc::clone(&class_file.constant_pool),
        };
        if insert_last_wins(&mut methods, key.clone(), entry) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }
    (methods, duplicates)
}

/// Insert keeping the original position of an existing key. Returns whether
/// a previous entry was replaced.
fn insert_last_wins(methods: &mut MethodMap, key: String, entry: MethodEntry) -> bool {
    methods.insert(key, entry).is_some()
}
