mod source;
mod telemetry;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use classlens::{AnalysisResult, analyze, disassemble, hex_dump};
use clap::{Parser, ValueEnum};
use opentelemetry::{Context as OtelContext, KeyValue};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::source::{ClassSource, load_inputs};
use crate::telemetry::{Telemetry, current_trace_id, init_logging, with_span, with_span_in};

/// CLI arguments for classlens.
#[derive(Parser, Debug)]
#[command(
    name = "classlens",
    about = "Summarize, disassemble and hex-dump JVM class files, directories and JAR files.",
    version
)]
struct Cli {
    /// Class file, directory or JAR to inspect. Repeatable.
    #[arg(long, value_name = "PATH", required = true)]
    input: Vec<PathBuf>,
    /// Disassemble the method with this signature, e.g. "void main(java.lang.String[])".
    #[arg(long, value_name = "SIGNATURE")]
    method: Vec<String>,
    /// Disassemble every method.
    #[arg(long)]
    all_methods: bool,
    /// Print the signature keys accepted by --method.
    #[arg(long)]
    list_methods: bool,
    /// Append a hex dump of the raw class bytes.
    #[arg(long)]
    hex: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write output to this file instead of stdout ("-" means stdout).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Export traces to this OTLP/HTTP collector endpoint.
    #[arg(long, value_name = "URL")]
    otel: Option<String>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// What to include for each analyzed class.
#[derive(Debug, Default)]
struct ReportOptions {
    methods: Vec<String>,
    all_methods: bool,
    list_methods: bool,
    hex: bool,
}

impl From<&Cli> for ReportOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            methods: cli.method.clone(),
            all_methods: cli.all_methods,
            list_methods: cli.list_methods,
            hex: cli.hex,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let telemetry = cli.otel.clone().map(Telemetry::new).transpose()?;
    let result = with_span(telemetry.as_ref(), "classlens.run", &[], || {
        run(&cli, telemetry.as_ref())
    });
    let shutdown = match telemetry.as_ref() {
        Some(telemetry) => telemetry.shutdown(),
        None => Ok(()),
    };
    result?;
    shutdown
}

fn run(cli: &Cli, telemetry: Option<&Telemetry>) -> Result<()> {
    for input in &cli.input {
        if !input.exists() {
            anyhow::bail!("input not found: {}", input.display());
        }
    }
    if let Some(trace_id) = current_trace_id() {
        info!(trace_id = %trace_id, "exporting spans");
    }

    let started_at = Instant::now();
    let sources = load_inputs(&cli.input, telemetry)?;
    let load_duration_ms = started_at.elapsed().as_millis();

    let options = ReportOptions::from(cli);
    let parent_cx = OtelContext::current();
    let reports: Vec<ClassReport> = sources
        .par_iter()
        .map(|source| {
            let attributes = [KeyValue::new("classlens.source", source.label.clone())];
            with_span_in(telemetry, "class.analyze", &attributes, &parent_cx, || {
                build_report(source, &options, telemetry)
            })
        })
        .collect();

    let mut writer = output_writer(cli.output.as_deref())?;
    match cli.format {
        OutputFormat::Text => write_text(&mut writer, &reports)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &reports)
                .context("failed to serialize JSON output")?;
            writer
                .write_all(b"\n")
                .context("failed to write JSON output")?;
        }
    }
    writer.flush().context("failed to flush output")?;

    let failures = reports.iter().filter(|report| report.error.is_some()).count();
    for report in &reports {
        if let Some(error) = &report.error {
            eprintln!("error: {error}");
        }
    }

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} load_ms={} classes={} failed={}",
            started_at.elapsed().as_millis(),
            load_duration_ms,
            reports.len(),
            failures
        );
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} classes could not be analyzed", reports.len());
    }
    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout().lock())),
        Some(path) => Ok(Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        ))),
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Output record for one class. Serialized as-is for `--format json`.
#[derive(Debug, Default, Serialize)]
struct ClassReport {
    source: String,
    class: Option<String>,
    superclass: Option<String>,
    version: Option<VersionReport>,
    access: Vec<&'static str>,
    interfaces: Vec<String>,
    fields: Vec<String>,
    methods: Vec<String>,
    disassembly: Vec<MethodListing>,
    duplicate_signatures: Vec<String>,
    hex_dump: Option<String>,
    error: Option<String>,
    #[serde(skip)]
    summary: Option<String>,
    #[serde(skip)]
    list_methods: bool,
}

#[derive(Debug, Serialize)]
struct VersionReport {
    major: u16,
    minor: u16,
    java: i32,
}

#[derive(Debug, Serialize)]
struct MethodListing {
    signature: String,
    listing: String,
}

fn build_report(
    source: &ClassSource,
    options: &ReportOptions,
    telemetry: Option<&Telemetry>,
) -> ClassReport {
    match analyze(&source.bytes) {
        Ok(result) => report_from_analysis(&source.label, &result, options, telemetry),
        Err(error) => {
            let error = anyhow::Error::new(error)
                .context(format!("failed to analyze {}", source.label));
            ClassReport {
                source: source.label.clone(),
                hex_dump: options.hex.then(|| hex_dump(&source.bytes)),
                error: Some(format!("{error:#}")),
                ..ClassReport::default()
            }
        }
    }
}

fn report_from_analysis(
    label: &str,
    result: &AnalysisResult,
    options: &ReportOptions,
    telemetry: Option<&Telemetry>,
) -> ClassReport {
    let class = &result.class_file;
    let mut report = ClassReport {
        source: label.to_string(),
        class: Some(class.this_class.display.clone()),
        superclass: class.super_class.as_ref().map(|name| name.display.clone()),
        version: Some(VersionReport {
            major: class.major_version,
            minor: class.minor_version,
            java: class.java_release(),
        }),
        access: class.access_flags.keywords(),
        interfaces: class
            .interfaces
            .iter()
            .map(|name| name.display.clone())
            .collect(),
        fields: class
            .fields
            .iter()
            .map(|field| format!("{} {}", field.display_type(), field.name))
            .collect(),
        methods: result.methods.keys().cloned().collect(),
        duplicate_signatures: result.duplicate_signatures.clone(),
        hex_dump: options.hex.then(|| result.hex_dump.clone()),
        summary: Some(result.summary.clone()),
        list_methods: options.list_methods,
        ..ClassReport::default()
    };

    let selected: Vec<&String> = if options.all_methods {
        result.methods.keys().collect()
    } else {
        options.methods.iter().collect()
    };
    let mut missing = Vec::new();
    for signature in selected {
        let Some(entry) = result.methods.get(signature) else {
            missing.push(signature.as_str());
            continue;
        };
        let attributes = [KeyValue::new("classlens.method", signature.clone())];
        let listing = with_span(telemetry, "method.disassemble", &attributes, || {
            disassemble(entry)
        });
        report.disassembly.push(MethodListing {
            signature: signature.clone(),
            listing,
        });
    }
    if !missing.is_empty() {
        let available: Vec<&str> = result.methods.keys().map(String::as_str).collect();
        report.error = Some(format!(
            "{label}: no method matching {}; available: {}",
            missing.join(", "),
            available.join(", ")
        ));
    }
    report
}

fn write_text(writer: &mut dyn Write, reports: &[ClassReport]) -> Result<()> {
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        write_class_text(writer, report)
            .with_context(|| format!("failed to write report for {}", report.source))?;
    }
    Ok(())
}

fn write_class_text(writer: &mut dyn Write, report: &ClassReport) -> io::Result<()> {
    writeln!(writer, "== {} ==", report.source)?;
    if let Some(summary) = &report.summary {
        write!(writer, "{summary}")?;
    }
    if report.list_methods && report.summary.is_some() {
        writeln!(writer)?;
        writeln!(writer, "--- Signatures ---")?;
        for signature in &report.methods {
            writeln!(writer, "{signature}")?;
        }
    }
    for method in &report.disassembly {
        writeln!(writer)?;
        write!(writer, "{}", method.listing)?;
        if !method.listing.ends_with('\n') {
            writeln!(writer)?;
        }
    }
    if let Some(hex) = &report.hex_dump {
        writeln!(writer)?;
        writeln!(writer, "--- Hex dump ---")?;
        writeln!(writer, "{hex}")?;
    }
    Ok(())
}
