#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use compliflow_core::config::CflowConfig;
use compliflow_core::errors::PromotionOutcome;
use compliflow_core::record::DeploymentRecord;
use compliflow_core::snapshot::ExecutionSnapshot;
use compliflow_core::traits::DeploymentRepository;
use compliflow_core::types::ChecklistItem;
use compliflow_engine::inspect::{simulate, Inspector};
use compliflow_engine::pipeline::PromotionPipeline;
use compliflow_engine::store::{DeploymentStore, FileStorage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "cflow",
    version,
    about = "Promote compliance workflows to production and inspect their runs."
)]
struct Cli {
    /// Config file (default: .compliflow/config.json if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding deployment data (overrides config).
    #[arg(long, global = true, env = "CFLOW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Promote a workflow through the deployment checklist.
    Deploy {
        /// Workflow name from the editor (placeholder if omitted).
        #[arg(long)]
        name: Option<String>,

        /// Version label for this deployment.
        #[arg(long, default_value = "")]
        version: String,

        /// Check "evaluation passed".
        #[arg(long)]
        evaluation_passed: bool,

        /// Check "approval obtained".
        #[arg(long)]
        approval_obtained: bool,

        /// Check "nodes validated".
        #[arg(long)]
        nodes_validated: bool,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the active workflow and aggregate production stats.
    Status {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// List deployed workflows, most recent first.
    List {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Insert the baseline deployment if none exist.
    Seed,

    /// Record a finished run against a deployed workflow.
    RecordRun {
        #[arg(long)]
        name: String,

        #[arg(long)]
        version: String,

        /// The run succeeded.
        #[arg(long, conflicts_with = "failure")]
        success: bool,

        /// The run failed.
        #[arg(long)]
        failure: bool,

        /// Run duration in milliseconds.
        #[arg(long)]
        duration_ms: f64,
    },

    /// Render an execution snapshot in the inspector panel.
    Inspect {
        /// Snapshot .json (or "-" / omit for stdin).
        #[arg(default_value = "-")]
        file: String,

        /// Render the built-in demo run at this tick instead of reading a file.
        #[arg(long)]
        demo: Option<u64>,

        /// Start with the panel collapsed.
        #[arg(long)]
        collapsed: bool,
    },

    /// Validate a deployed-workflows file against the schema.
    Check {
        /// Path to the deployed-workflows .json file.
        file: String,

        /// Output structured JSON report.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(io::stderr),
        )
        .init();

    let mut config = CflowConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), "config loaded");

    match cli.cmd {
        Cmd::Deploy {
            name,
            version,
            evaluation_passed,
            approval_obtained,
            nodes_validated,
            json,
        } => {
            let checks = [
                (ChecklistItem::EvaluationPassed, evaluation_passed),
                (ChecklistItem::ApprovalObtained, approval_obtained),
                (ChecklistItem::NodesValidated, nodes_validated),
            ];
            cmd_deploy(&config, name.as_deref(), &version, &checks, json)
        }

        Cmd::Status { json } => cmd_status(&config, json),

        Cmd::List { json } => cmd_list(&config, json),

        Cmd::Seed => cmd_seed(&config),

        Cmd::RecordRun {
            name,
            version,
            success,
            failure,
            duration_ms,
        } => {
            if success == failure {
                bail!("pass exactly one of --success or --failure");
            }
            cmd_record_run(&config, &name, &version, success, duration_ms)
        }

        Cmd::Inspect {
            file,
            demo,
            collapsed,
        } => cmd_inspect(&file, demo, collapsed),

        Cmd::Check { file, json } => cmd_check(&file, json),
    }
}

fn open_store(config: &CflowConfig) -> DeploymentStore<FileStorage> {
    DeploymentStore::open(FileStorage::new(&config.data_dir)).with_seed(config.seed.clone())
}

/// Open the store the way the production view does: seeded on first use.
fn open_seeded_store(config: &CflowConfig) -> Result<DeploymentStore<FileStorage>> {
    let mut store = open_store(config);
    store
        .seed_once()
        .with_context(|| format!("cannot seed {}", config.data_dir.display()))?;
    Ok(store)
}

fn cmd_deploy(
    config: &CflowConfig,
    name: Option<&str>,
    version: &str,
    checks: &[(ChecklistItem, bool)],
    json_out: bool,
) -> Result<()> {
    let mut store = open_seeded_store(config)?;
    let mut pipeline = PromotionPipeline::new(&mut store, |record: &DeploymentRecord| {
        eprintln!(
            "  deployed {}@{}; switching to production view",
            record.name, record.version
        );
    })
    .with_default_workflow_name(config.default_workflow_name.clone());

    pipeline.open_dialog(name);
    for (item, checked) in checks {
        if *checked {
            pipeline.toggle(*item);
        }
    }
    pipeline.set_version(version);

    let outcome = pipeline.submit()?;
    match outcome {
        PromotionOutcome::Deployed(record) => {
            if json_out {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            Ok(())
        }
        PromotionOutcome::Blocked => {
            let outstanding: Vec<ChecklistItem> = pipeline
                .state()
                .dialog()
                .map(|d| d.outstanding())
                .unwrap_or_default();
            let version_missing = version.trim().is_empty();
            if json_out {
                let report = serde_json::json!({
                    "deployed": false,
                    "outstanding": outstanding,
                    "versionMissing": version_missing,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for item in &outstanding {
                    eprintln!("  unchecked: {item}");
                }
                if version_missing {
                    eprintln!("  missing: version");
                }
            }
            bail!("deployment checklist incomplete");
        }
    }
}

fn cmd_status(config: &CflowConfig, json_out: bool) -> Result<()> {
    let store = open_seeded_store(config)?;
    let summary = store.summary();
    let active = store.active();

    if json_out {
        let status = serde_json::json!({
            "active": active,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match active {
        Some(r) => {
            eprintln!("  Active:      {} ({})", r.name, r.version);
            eprintln!("  Status:      {}", r.status);
            eprintln!("  Deployed at: {}", r.deployed_at.to_rfc3339());
            eprintln!("  Runs:        {}", r.stats.runs);
            eprintln!("  Successes:   {}", r.stats.success_count);
            eprintln!("  Avg (ms):    {:.1}", r.stats.avg_duration_ms);
        }
        None => eprintln!("  Active:      (none)"),
    }
    eprintln!("  Deployments: {}", summary.deployments);
    eprintln!("  Total runs:  {}", summary.total_runs);
    if let Some(rate) = summary.success_rate {
        eprintln!("  Success:     {:.1}%", rate * 100.0);
    }
    Ok(())
}

fn cmd_list(config: &CflowConfig, json_out: bool) -> Result<()> {
    let store = open_seeded_store(config)?;
    let records = store.load();

    if json_out {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "{:<32}  {:<10}  {:<8}  {:<25}  {:>5}",
        "NAME", "VERSION", "STATUS", "DEPLOYED", "RUNS"
    );
    println!(
        "{:<32}  {:<10}  {:<8}  {:<25}  {:>5}",
        "-".repeat(32),
        "-".repeat(10),
        "-".repeat(8),
        "-".repeat(25),
        "-".repeat(5)
    );
    for r in &records {
        println!(
            "{:<32}  {:<10}  {:<8}  {:<25}  {:>5}",
            r.name,
            r.version,
            r.status.as_str(),
            r.deployed_at.to_rfc3339(),
            r.stats.runs
        );
    }
    Ok(())
}

fn cmd_seed(config: &CflowConfig) -> Result<()> {
    let mut store = open_store(config);
    if store.seed_once()? {
        eprintln!("  seeded {}@{}", config.seed.name, config.seed.version);
    } else {
        eprintln!("  skip (already {} deployment(s))", store.records().len());
    }
    Ok(())
}

fn cmd_record_run(
    config: &CflowConfig,
    name: &str,
    version: &str,
    success: bool,
    duration_ms: f64,
) -> Result<()> {
    let mut store = open_store(config);
    let record = store.record_run(name, version, success, duration_ms)?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn read_snapshot(file: &str) -> Result<ExecutionSnapshot> {
    let content = if file == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("cannot read {file}"))?
    };
    serde_json::from_str(&content).with_context(|| format!("{file}: invalid snapshot JSON"))
}

fn cmd_inspect(file: &str, demo: Option<u64>, collapsed: bool) -> Result<()> {
    let snapshot = match demo {
        Some(tick) => simulate::demo_snapshot(tick),
        None => read_snapshot(file)?,
    };

    let mut inspector = Inspector::new();
    inspector.receive(snapshot);
    inspector.set_open(!collapsed);

    match inspector.render() {
        Some(text) => print!("{text}"),
        None => {
            let s = inspector.snapshot();
            eprintln!(
                "  inspector collapsed ({} variables, {} frames, {} errors)",
                s.variables.len(),
                s.call_stack.len(),
                s.errors.len()
            );
        }
    }
    Ok(())
}

fn cmd_check(file: &str, json_out: bool) -> Result<()> {
    let content =
        std::fs::read_to_string(Path::new(file)).with_context(|| format!("cannot read {file}"))?;
    let data: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{file}: invalid JSON"))?;

    let report = compliflow_core::schema::check(&data, file);

    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if report.pass {
            eprintln!("  ok  {file} ({} records)", report.records);
        } else {
            eprintln!("  FAIL {file}");
        }
        for e in &report.errors {
            eprintln!(
                "  error {}: {} {}",
                e.code,
                e.message,
                e.path.as_deref().unwrap_or("")
            );
        }
        for w in &report.warnings {
            eprintln!(
                "  warn  {}: {} {}",
                w.code,
                w.message,
                w.path.as_deref().unwrap_or("")
            );
        }
    }

    if !report.pass {
        bail!("check failed for {file}");
    }
    Ok(())
}
