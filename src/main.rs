use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use uuid::Uuid;

use pqlab::analytics::ExportFilters;
use pqlab::config::LabConfig;
use pqlab::crypto::{AlgorithmKind, Family};
use pqlab::harness::TestRequest;
use pqlab::lab::Lab;
use pqlab::records::{OperationKind, ReportKind};
use pqlab::report::ReportRequest;

/// Config picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "pqlab.json";

#[derive(Parser)]
#[command(
    name = "pqlab",
    about = "Classical and post-quantum cryptography lab",
    version
)]
struct Cli {
    /// Config JSON (defaults to ./pqlab.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

fn parse_family(s: &str) -> Result<Family, String> {
    Family::from_id(s).ok_or_else(|| format!("unknown family: {s}"))
}

fn parse_kind(s: &str) -> Result<AlgorithmKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "classical" => Ok(AlgorithmKind::Classical),
        "post-quantum" | "post_quantum" | "pqc" => Ok(AlgorithmKind::PostQuantum),
        _ => Err(format!("unknown algorithm kind: {s}")),
    }
}

fn parse_operation(s: &str) -> Result<OperationKind, String> {
    OperationKind::from_id(s).ok_or_else(|| format!("unknown operation: {s}"))
}

fn parse_report_kind(s: &str) -> Result<ReportKind, String> {
    ReportKind::from_id(s).ok_or_else(|| format!("unknown report kind: {s}"))
}

#[derive(Subcommand)]
enum Cmd {
    /// List catalog algorithms
    Algorithms {
        /// Only this family (RSA, ECC, AES, Kyber, Dilithium, Falcon)
        #[arg(long, value_parser = parse_family)]
        family: Option<Family>,

        /// Only classical or post-quantum algorithms
        #[arg(long, value_parser = parse_kind, conflicts_with = "family")]
        kind: Option<AlgorithmKind>,

        /// Print counts per kind and family instead of descriptors
        #[arg(long)]
        categories: bool,
    },

    /// Run and record one operation
    Run {
        /// Catalog name, e.g. AES-256
        algorithm: String,

        /// key_generation, encryption, decryption, signing or verification
        #[arg(value_parser = parse_operation)]
        operation: OperationKind,

        /// Input payload (defaults to the configured input)
        #[arg(long)]
        input: Option<String>,
    },

    /// Time key generation, encryption and decryption across algorithms
    Compare {
        /// Two or more catalog names
        #[arg(required = true, num_args = 1..)]
        algorithms: Vec<String>,

        #[arg(long)]
        input: Option<String>,
    },

    /// Generate and store a report
    Report {
        /// performance, security or comparison
        #[arg(value_parser = parse_report_kind)]
        kind: ReportKind,

        /// Algorithm to include (repeatable)
        #[arg(long = "algorithm")]
        algorithms: Vec<String>,

        /// Window in days
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        title: Option<String>,
    },

    /// Stored reports
    Reports {
        #[command(subcommand)]
        action: Option<ReportsCmd>,
    },

    /// List recorded tests, newest first
    Tests {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Delete test records (all or none)
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<Uuid>,
    },

    /// Test statistics
    Stats {
        /// Window for the recent-tests count (defaults to the configured window)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Daily latency trend of one algorithm
    Trends {
        algorithm: String,

        #[arg(long)]
        days: Option<u32>,
    },

    /// Export recorded tests as JSON
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ReportsCmd {
    /// List stored reports, newest first
    List {
        #[arg(long, value_parser = parse_report_kind)]
        kind: Option<ReportKind>,
    },
    /// Show one report
    Show { id: Uuid },
    /// Delete one report
    Delete { id: Uuid },
    /// Available report kinds
    Kinds,
}

#[derive(clap::Args)]
struct FilterArgs {
    #[arg(long)]
    algorithm: Option<String>,

    #[arg(long, value_parser = parse_operation)]
    operation: Option<OperationKind>,

    #[arg(long)]
    success_only: bool,

    /// Only records from the last N days
    #[arg(long)]
    days: Option<u32>,
}

impl FilterArgs {
    fn into_export(self) -> ExportFilters {
        ExportFilters {
            algorithm: self.algorithm,
            operation: self.operation,
            success_only: self.success_only,
            days: self.days,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    pqlab::logging::init_tracing(&config.log_filter);

    let lab = Lab::from_config(&config)
        .with_context(|| format!("opening record store {}", config.store_path.display()))?;
    let owner = config.owner.as_str();

    match cli.cmd {
        Cmd::Algorithms {
            family,
            kind,
            categories,
        } => {
            let catalog = lab.catalog();
            if categories {
                return print_json(&catalog.category_summary());
            }
            match (family, kind) {
                (Some(f), _) => print_json(&catalog.by_family(f)),
                (None, Some(k)) => print_json(&catalog.by_kind(k)),
                (None, None) => print_json(&catalog.list_all()),
            }
        }
        Cmd::Run {
            algorithm,
            operation,
            input,
        } => {
            let request = TestRequest {
                algorithm,
                operation,
                input: input.unwrap_or_else(|| config.default_input.clone()),
            };
            let outcome = lab.run_test(owner, &request)?;
            let (output, error) = match &outcome.result {
                Ok(out) => (Some(out), None),
                Err(e) => (None, Some(e.to_string())),
            };
            print_json(&json!({
                "record": outcome.record,
                "output": output,
                "error": error,
            }))
        }
        Cmd::Compare { algorithms, input } => {
            let input = input.unwrap_or_else(|| config.default_input.clone());
            print_json(&lab.compare(&algorithms, &input)?)
        }
        Cmd::Report {
            kind,
            algorithms,
            days,
            title,
        } => {
            let mut request = ReportRequest::new(kind);
            if !algorithms.is_empty() {
                request = request.algorithms(algorithms);
            }
            if let Some(d) = days {
                request = request.window_days(d);
            }
            if let Some(t) = title {
                request = request.title(t);
            }
            print_json(&lab.generate_report(owner, &request)?)
        }
        Cmd::Reports { action } => match action.unwrap_or(ReportsCmd::List { kind: None }) {
            ReportsCmd::List { kind } => print_json(&lab.list_reports(owner, kind)?),
            ReportsCmd::Show { id } => print_json(&lab.get_report(owner, id)?),
            ReportsCmd::Delete { id } => {
                lab.delete_report(owner, id)?;
                print_json(&json!({ "deleted": id }))
            }
            ReportsCmd::Kinds => print_json(&lab.report_kinds()),
        },
        Cmd::Tests { filters } => {
            let filter = filters
                .into_export()
                .to_filter(owner, OffsetDateTime::now_utc());
            print_json(&lab.list_tests(&filter)?)
        }
        Cmd::Delete { ids } => {
            let deleted = lab.delete_tests(owner, &ids)?;
            print_json(&json!({ "deleted": deleted }))
        }
        Cmd::Stats { days } => print_json(&lab.statistics(owner, days)?),
        Cmd::Trends { algorithm, days } => print_json(&lab.trends(owner, &algorithm, days)?),
        Cmd::Export { filters, output } => {
            let export = lab.export(owner, filters.into_export())?;
            match output {
                Some(path) => {
                    let bytes = serde_json::to_vec_pretty(&export)?;
                    pqlab::fs_guard::write_atomic(&path, &bytes)
                        .with_context(|| format!("writing export {}", path.display()))?;
                    print_json(&json!({
                        "exported": export.metadata.total_tests,
                        "path": path,
                    }))
                }
                None => print_json(&export),
            }
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<LabConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG);
            p.exists().then_some(p)
        }
    };
    match path {
        Some(p) => {
            LabConfig::load(Some(&p)).with_context(|| format!("loading config {}", p.display()))
        }
        None => LabConfig::load(None),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| anyhow!("encoding output: {e}"))?;
    println!("{text}");
    Ok(())
}

