use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};

use defercheck::diagnostics;
use defercheck::edit;
use defercheck::harness::HarnessSpec;
use defercheck::parser;
use defercheck::scan;
use defercheck::source::SourceFile;
use defercheck_contracts::DC_REPORT_SCHEMA_VERSION;

#[derive(Parser)]
#[command(name = "defercheck")]
#[command(about = "Find defer statements that drop errors and wire in a collection harness.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Check {
        #[arg(long, required = true)]
        input: Vec<PathBuf>,
        #[arg(long)]
        report_json: bool,
        #[arg(long)]
        harness_import: Option<String>,
    },
    Fix {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        write: bool,
        #[arg(long)]
        report_json: bool,
        #[arg(long)]
        harness_import: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct DefercheckToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    input_sha256: String,
    diagnostics_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<diagnostics::Diagnostic>,
    exit_code: u8,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Check {
            input,
            report_json,
            harness_import,
        } => {
            let opts = analyze_options(harness_import.as_deref());
            let mut worst: u8 = 0;
            for path in &input {
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => {
                        if report_json {
                            let report = DefercheckToolReport {
                                schema_version: DC_REPORT_SCHEMA_VERSION,
                                command: "check",
                                ok: false,
                                r#in: path.display().to_string(),
                                input_sha256: String::new(),
                                diagnostics_count: 1,
                                diagnostics: vec![cli_diagnostic(
                                    "DC-IO-READ-0001",
                                    &path.display().to_string(),
                                    &format!("read input {}: {err}", path.display()),
                                )],
                                exit_code: 2,
                            };
                            print_json(&report)?;
                            worst = worst.max(2);
                            continue;
                        }
                        return Err(err)
                            .with_context(|| format!("read input: {}", path.display()));
                    }
                };

                let src = SourceFile::new(path.display().to_string(), text.clone());
                let report = scan::check_source(&src, &opts);
                let exit_code: u8 = if report.diagnostics.is_empty() { 0 } else { 1 };

                if report_json {
                    let tool_report = DefercheckToolReport {
                        schema_version: DC_REPORT_SCHEMA_VERSION,
                        command: "check",
                        ok: exit_code == 0,
                        r#in: path.display().to_string(),
                        input_sha256: sha256_hex(text.as_bytes()),
                        diagnostics_count: report.diagnostics.len(),
                        diagnostics: report.diagnostics,
                        exit_code,
                    };
                    print_json(&tool_report)?;
                } else {
                    let out = serde_json::to_string(&report)?;
                    println!("{out}");
                }
                worst = worst.max(exit_code);
            }
            Ok(std::process::ExitCode::from(worst))
        }
        Cmd::Fix {
            input,
            write,
            report_json,
            harness_import,
        } => {
            if report_json && !write {
                let report = DefercheckToolReport {
                    schema_version: DC_REPORT_SCHEMA_VERSION,
                    command: "fix",
                    ok: false,
                    r#in: input.display().to_string(),
                    input_sha256: String::new(),
                    diagnostics_count: 1,
                    diagnostics: vec![cli_diagnostic(
                        "DC-CLI-ARGS-0001",
                        &input.display().to_string(),
                        "--report-json requires --write (otherwise stdout would be the fixed source)",
                    )],
                    exit_code: 2,
                };
                print_json(&report)?;
                return Ok(std::process::ExitCode::from(2));
            }

            let original = match std::fs::read_to_string(&input) {
                Ok(text) => text,
                Err(err) => {
                    if report_json {
                        let report = DefercheckToolReport {
                            schema_version: DC_REPORT_SCHEMA_VERSION,
                            command: "fix",
                            ok: false,
                            r#in: input.display().to_string(),
                            input_sha256: String::new(),
                            diagnostics_count: 1,
                            diagnostics: vec![cli_diagnostic(
                                "DC-IO-READ-0001",
                                &input.display().to_string(),
                                &format!("read input {}: {err}", input.display()),
                            )],
                            exit_code: 2,
                        };
                        print_json(&report)?;
                        return Ok(std::process::ExitCode::from(2));
                    }
                    return Err(err).with_context(|| format!("read input: {}", input.display()));
                }
            };

            let opts = analyze_options(harness_import.as_deref());
            let path_str = input.display().to_string();

            let (final_report, patched) = match (|| -> Result<(diagnostics::Report, String)> {
                let mut text = original.clone();
                for _pass in 0..5 {
                    let src = SourceFile::new(path_str.clone(), text.clone());
                    let report = scan::check_source(&src, &opts);
                    let edits = edit::collect_fix_edits(&report);
                    if edits.is_empty() {
                        break;
                    }
                    let next = edit::apply_edits(&text, &edits)
                        .map_err(|e| anyhow::anyhow!("apply edits failed: {e}"))?;
                    let next_src = SourceFile::new(path_str.clone(), next.clone());
                    parser::parse_file(&next_src)
                        .map_err(|e| anyhow::anyhow!("patched source does not re-parse: {e}"))?;
                    text = next;
                }
                let src = SourceFile::new(path_str.clone(), text.clone());
                let final_report = scan::check_source(&src, &opts);
                Ok((final_report, text))
            })() {
                Ok(v) => v,
                Err(err) => {
                    if report_json {
                        let report = DefercheckToolReport {
                            schema_version: DC_REPORT_SCHEMA_VERSION,
                            command: "fix",
                            ok: false,
                            r#in: path_str,
                            input_sha256: sha256_hex(original.as_bytes()),
                            diagnostics_count: 1,
                            diagnostics: vec![cli_diagnostic(
                                "DC-FIX-0001",
                                &input.display().to_string(),
                                &err.to_string(),
                            )],
                            exit_code: 2,
                        };
                        print_json(&report)?;
                        return Ok(std::process::ExitCode::from(2));
                    }
                    return Err(err);
                }
            };

            if write {
                if let Err(err) = std::fs::write(&input, patched.as_bytes()) {
                    if report_json {
                        let report = DefercheckToolReport {
                            schema_version: DC_REPORT_SCHEMA_VERSION,
                            command: "fix",
                            ok: false,
                            r#in: path_str,
                            input_sha256: sha256_hex(original.as_bytes()),
                            diagnostics_count: 1,
                            diagnostics: vec![cli_diagnostic(
                                "DC-IO-WRITE-0001",
                                &input.display().to_string(),
                                &format!("write {}: {err}", input.display()),
                            )],
                            exit_code: 2,
                        };
                        print_json(&report)?;
                        return Ok(std::process::ExitCode::from(2));
                    }
                    return Err(err).with_context(|| format!("write: {}", input.display()));
                }
            } else {
                print!("{patched}");
            }

            let exit_code: u8 = if final_report.diagnostics.is_empty() {
                0
            } else {
                1
            };
            if report_json {
                let report = DefercheckToolReport {
                    schema_version: DC_REPORT_SCHEMA_VERSION,
                    command: "fix",
                    ok: exit_code == 0,
                    r#in: path_str,
                    input_sha256: sha256_hex(patched.as_bytes()),
                    diagnostics_count: final_report.diagnostics.len(),
                    diagnostics: final_report.diagnostics,
                    exit_code,
                };
                print_json(&report)?;
            }
            Ok(std::process::ExitCode::from(exit_code))
        }
    }
}

fn analyze_options(harness_import: Option<&str>) -> scan::AnalyzeOptions {
    let harness = match harness_import {
        Some(path) => HarnessSpec::with_import_path(path),
        None => HarnessSpec::default(),
    };
    scan::AnalyzeOptions { harness }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn cli_diagnostic(code: &str, file: &str, message: &str) -> diagnostics::Diagnostic {
    diagnostics::Diagnostic {
        code: code.to_string(),
        severity: diagnostics::Severity::Error,
        message: message.to_string(),
        file: file.to_string(),
        pos: diagnostics::Position {
            line: 0,
            col: 0,
            offset: None,
        },
        fix: None,
    }
}
