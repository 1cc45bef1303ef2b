use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use zip::write::SimpleFileOptions;

fn classlens(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_classlens"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("run classlens")
}

/// `public class <name> extends java.lang.Object` with a `void <init>()`
/// that calls `Object.<init>`.
fn class_with_constructor(name: &str) -> Vec<u8> {
    let mut bytes = vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x3d, 0x00, 0x0d];
    push_utf8(&mut bytes, name); // #1
    bytes.extend_from_slice(&[0x07, 0x00, 0x01]); // #2 class
    push_utf8(&mut bytes, "java/lang/Object"); // #3
    bytes.extend_from_slice(&[0x07, 0x00, 0x03]); // #4 class
    push_utf8(&mut bytes, "<init>"); // #5
    push_utf8(&mut bytes, "()V"); // #6
    bytes.extend_from_slice(&[0x0c, 0x00, 0x05, 0x00, 0x06]); // #7 name and type
    bytes.extend_from_slice(&[0x0a, 0x00, 0x04, 0x00, 0x07]); // #8 method ref
    push_utf8(&mut bytes, "Code"); // #9
    push_utf8(&mut bytes, "java/lang/Runnable"); // #10
    bytes.extend_from_slice(&[0x07, 0x00, 0x0a]); // #11 class
    push_utf8(&mut bytes, "SourceFile"); // #12
    bytes.extend_from_slice(&[0x00, 0x21, 0x00, 0x02, 0x00, 0x04]);
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x0b]); // interfaces
    bytes.extend_from_slice(&[0x00, 0x00]); // fields
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x01, 0x00, 0x05, 0x00, 0x06, 0x00, 0x01]);
    let code = [0x2a, 0xb7, 0x00, 0x08, 0xb1];
    bytes.extend_from_slice(&[0x00, 0x09]);
    bytes.extend_from_slice(&(12u32 + code.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    bytes.extend_from_slice(&(code.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&code);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    // One opaque class attribute.
    bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    bytes
}

fn push_utf8(bytes: &mut Vec<u8>, value: &str) {
    bytes.push(1);
    bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
    bytes.extend_from_slice(value.as_bytes());
}

fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = fs::File::create(path).expect("create jar");
    let mut writer = zip::ZipWriter::new(file);
    for (name, bytes) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(bytes).expect("write entry");
    }
    writer.finish().expect("finish jar");
}

#[test]
fn disassembles_selected_method_from_class_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Task.class"), class_with_constructor("Task")).expect("write");

    let output = classlens(
        &["--input", "Task.class", "--method", "void <init>()", "--list-methods"],
        dir.path(),
    );

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Version:     61.0 (Java 17)\n"));
    assert!(stdout.contains("Interfaces:  java.lang.Runnable\n"));
    assert!(stdout.contains("--- Signatures ---\nvoid <init>()\n"));
    assert!(stdout.contains("Bytecode for method: void <init>()\n\n\n"));
    assert!(stdout.contains("Max stack: 1, Max locals: 1, Code length: 5\n"));
    assert!(stdout.contains("    0: aload_0\n"));
    assert!(stdout.contains("// Method java/lang/Object.\"<init>\":()V"));
    assert!(stdout.contains("    4: return\n"));
}

#[test]
fn jar_entries_are_reported_in_sorted_order_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_jar(
        &dir.path().join("app.jar"),
        &[
            ("com/example/Zeta.class", class_with_constructor("com/example/Zeta")),
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
            (
                "META-INF/versions/11/com/example/Zeta.class",
                class_with_constructor("com/example/Zeta"),
            ),
            ("com/example/Alpha.class", class_with_constructor("com/example/Alpha")),
        ],
    );

    let output = classlens(
        &[
            "--input",
            "app.jar",
            "--format",
            "json",
            "--all-methods",
            "--hex",
            "--output",
            "report.json",
        ],
        dir.path(),
    );

    assert!(output.status.success(), "{output:?}");
    let json = fs::read_to_string(dir.path().join("report.json")).expect("read report");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse report");
    let reports = value.as_array().expect("array");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["source"], "app.jar:com/example/Alpha.class");
    assert_eq!(reports[0]["class"], "com.example.Alpha");
    assert_eq!(reports[1]["class"], "com.example.Zeta");
    assert_eq!(reports[0]["superclass"], "java.lang.Object");
    assert_eq!(reports[0]["version"]["major"], 61);
    assert_eq!(reports[0]["access"], serde_json::json!(["public", "super"]));
    assert_eq!(reports[0]["methods"], serde_json::json!(["void <init>()"]));
    assert_eq!(reports[0]["disassembly"][0]["signature"], "void <init>()");
    assert!(
        reports[0]["hex_dump"]
            .as_str()
            .expect("hex dump")
            .starts_with("CA FE BA BE 00 00 00 3D")
    );
    assert!(reports[0]["error"].is_null());
}

#[test]
fn one_bad_input_does_not_hide_the_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("classes")).expect("create dir");
    fs::write(
        dir.path().join("classes").join("Good.class"),
        class_with_constructor("Good"),
    )
    .expect("write good");
    let mut truncated = class_with_constructor("Bad");
    truncated.truncate(30);
    fs::write(dir.path().join("classes").join("Bad.class"), truncated).expect("write bad");

    let output = classlens(&["--input", "classes"], dir.path());

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Class:       Good\n"));
    assert!(!stdout.contains("Class:       Bad\n"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Bad.class"));
    assert!(stderr.contains("1 of 2 classes could not be analyzed"));
}
