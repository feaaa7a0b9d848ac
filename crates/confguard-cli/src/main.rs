//! CLI entry point for confguard.
//!
//! This module is intentionally thin: it handles argument parsing, file IO,
//! and exit codes. All business logic lives in the `confguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use confguard_app::{
    CheckInput, ValidateInput, parse_report_json, run_check, run_validate, runtime_error_report,
    serialize_report, to_annotations, to_markdown, verdict_exit_code,
};
use confguard_domain::registry::KindRegistry;
use confguard_domain::run::CancelToken;
use confguard_settings::Overrides;

#[derive(Parser, Debug)]
#[command(
    name = "confguard",
    version,
    about = "Configuration compliance engine for network device fleets"
)]
struct Cli {
    /// Path to confguard config TOML.
    #[arg(long, default_value = "confguard.toml")]
    config: Utf8PathBuf,

    /// Override the policies inventory path.
    #[arg(long)]
    policies: Option<Utf8PathBuf>,

    /// Override the devices inventory path.
    #[arg(long)]
    devices: Option<Utf8PathBuf>,

    /// Override when the run fails (non-conforming|error|never).
    #[arg(long)]
    fail_on: Option<String>,

    /// Override the evaluation worker pool size (0 = auto).
    #[arg(long)]
    workers: Option<usize>,

    /// Override the per-rule evaluation budget in milliseconds.
    #[arg(long)]
    rule_timeout_ms: Option<u64>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every policy against the device fleet and write artifacts.
    Check {
        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/confguard/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown summary alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown summary (if enabled).
        #[arg(long, default_value = "artifacts/confguard/comment.md")]
        markdown_out: Utf8PathBuf,

        /// Evaluate a single policy by name.
        #[arg(long)]
        policy: Option<String>,

        /// Evaluate a single device by name.
        #[arg(long)]
        device: Option<String>,

        /// Print per-evaluation diagnostics to stderr.
        #[arg(long)]
        verbose: bool,
    },

    /// Validate rule definitions without evaluating any device.
    Validate,

    /// Render Markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/confguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/confguard/report.json")]
        report: Utf8PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Rule evaluators are registered once, before any run. Script sandboxes
    // would be added here by an embedder; the stock binary ships the text
    // kind only.
    let registry = KindRegistry::builtin();

    match cli.cmd {
        Commands::Check {
            ref report_out,
            write_markdown,
            ref markdown_out,
            ref policy,
            ref device,
            verbose,
        } => cmd_check(
            &cli,
            &registry,
            report_out.clone(),
            write_markdown,
            markdown_out.clone(),
            policy.clone(),
            device.clone(),
            verbose,
        ),
        Commands::Validate => cmd_validate(&cli, &registry),
        Commands::Md { report, output } => cmd_md(report, output),
        Commands::Annotations { report } => cmd_annotations(report),
    }
}

fn overrides_from(cli: &Cli) -> Overrides {
    Overrides {
        fail_on: cli.fail_on.clone(),
        workers: cli.workers,
        rule_timeout_ms: cli.rule_timeout_ms,
        policies: cli.policies.as_ref().map(|p| p.to_string()),
        devices: cli.devices.as_ref().map(|p| p.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_check(
    cli: &Cli,
    registry: &KindRegistry,
    report_out: Utf8PathBuf,
    write_markdown: bool,
    markdown_out: Utf8PathBuf,
    policy: Option<String>,
    device: Option<String>,
    verbose: bool,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        // Missing config file is allowed; defaults apply.
        let cfg_text = std::fs::read_to_string(&cli.config).unwrap_or_default();

        let output = run_check(CheckInput {
            config_text: &cfg_text,
            overrides: overrides_from(cli),
            only_policy: policy,
            only_device: device,
            registry,
            cancel: CancelToken::new(),
        })?;

        if verbose {
            for line in &output.log {
                eprintln!("confguard: {line}");
            }
        }

        write_report_file(&report_out, &output.report).context("write report json")?;
        if write_markdown {
            write_text_file(&markdown_out, &to_markdown(&output.report))
                .context("write markdown")?;
        }

        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report_file(&report_out, &report);
            eprintln!("confguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_validate(cli: &Cli, registry: &KindRegistry) -> anyhow::Result<()> {
    let cfg_text = std::fs::read_to_string(&cli.config).unwrap_or_default();

    let output = run_validate(ValidateInput {
        config_text: &cfg_text,
        overrides: overrides_from(cli),
        registry,
    })?;

    if output.issues.is_empty() {
        println!(
            "confguard: {} rules across {} policies validated",
            output.rules, output.policies
        );
        return Ok(());
    }

    for issue in &output.issues {
        eprintln!("confguard: {issue}");
    }
    eprintln!(
        "confguard: {} of {} rules failed validation",
        output.issues.len(),
        output.rules
    );
    std::process::exit(2);
}

fn cmd_md(report_path: Utf8PathBuf, output: Option<Utf8PathBuf>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("read report: {report_path}"))?;
    let report = parse_report_json(&report_text)?;
    let md = to_markdown(&report);

    if let Some(out_path) = output {
        write_text_file(&out_path, &md).context("write markdown output")?;
    } else {
        print!("{md}");
    }

    Ok(())
}

fn cmd_annotations(report_path: Utf8PathBuf) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(&report_path)
        .with_context(|| format!("read report: {report_path}"))?;
    let report = parse_report_json(&report_text)?;

    for annotation in to_annotations(&report) {
        println!("{annotation}");
    }

    Ok(())
}

fn write_report_file(
    path: &Utf8Path,
    report: &confguard_app::ConfguardReport,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    let data = serialize_report(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write report: {path}"))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}
