use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use tracing::debug;
use zip::ZipArchive;

use crate::telemetry::{Telemetry, with_span};

/// Raw bytes of one class file and a label naming where they came from
/// (`path/to/A.class` or `lib.jar:com/example/A.class`).
pub(crate) struct ClassSource {
    pub(crate) label: String,
    pub(crate) bytes: Vec<u8>,
}

/// Collect class bytes from every input, in input order. Directories and
/// JAR entries are visited in sorted order so output is deterministic.
pub(crate) fn load_inputs(
    inputs: &[PathBuf],
    telemetry: Option<&Telemetry>,
) -> Result<Vec<ClassSource>> {
    let mut sources = Vec::new();
    for input in inputs {
        load_path(input, true, telemetry, &mut sources)?;
    }
    Ok(sources)
}

fn load_path(
    path: &Path,
    strict: bool,
    telemetry: Option<&Telemetry>,
    sources: &mut Vec<ClassSource>,
) -> Result<()> {
    if path.is_dir() {
        return load_dir(path, telemetry, sources);
    }
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if extension.eq_ignore_ascii_case("class") {
        sources.push(load_class_file(path, telemetry)?);
        Ok(())
    } else if extension.eq_ignore_ascii_case("jar") {
        load_jar_file(path, telemetry, sources)
    } else if strict {
        anyhow::bail!("unsupported input file: {}", path.display())
    } else {
        Ok(())
    }
}

fn load_dir(
    path: &Path,
    telemetry: Option<&Telemetry>,
    sources: &mut Vec<ClassSource>,
) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }
    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        load_path(&entry, false, telemetry, sources)?;
    }
    Ok(())
}

fn load_class_file(path: &Path, telemetry: Option<&Telemetry>) -> Result<ClassSource> {
    let attributes = [KeyValue::new(
        "classlens.class_path",
        path.display().to_string(),
    )];
    let bytes = with_span(telemetry, "class.load", &attributes, || {
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))
    })?;
    Ok(ClassSource {
        label: path.display().to_string(),
        bytes,
    })
}

fn load_jar_file(
    path: &Path,
    telemetry: Option<&Telemetry>,
    sources: &mut Vec<ClassSource>,
) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;

    let mut entry_names = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        // Multi-release variants duplicate classes already at the root.
        if name.ends_with(".class") && !name.starts_with("META-INF/versions/") {
            entry_names.push(name);
        }
    }
    entry_names.sort();
    debug!(jar = %path.display(), classes = entry_names.len(), "reading jar");

    for name in entry_names {
        let attributes = [
            KeyValue::new("classlens.jar_path", path.display().to_string()),
            KeyValue::new("classlens.jar_entry", name.clone()),
        ];
        let bytes = with_span(telemetry, "class.load", &attributes, || -> Result<Vec<u8>> {
            let mut entry = archive
                .by_name(&name)
                .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
            Ok(bytes)
        })?;
        sources.push(ClassSource {
            label: format!("{}:{}", path.display(), name),
            bytes,
        });
    }
    Ok(())
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
