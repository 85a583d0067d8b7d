//! # Who-Can Audit
//!
//! Audits a running cluster's RBAC configuration and prints, for every subject, which
//! bindings grant each verb on each resource in each audited namespace.
//!
//! ## Overview
//!
//! 1. **Discover resources** - Preferred API resources and their verbs
//! 2. **Collect subjects** - Every subject named by a RoleBinding or ClusterRoleBinding
//! 3. **Query** - `kubectl-who-can` for each (namespace, resource, verb)
//! 4. **Aggregate** - Subject → namespace → resource → verb → bindings
//! 5. **Render** - Ordered JSON on stdout
//!
//! ## Usage
//!
//! ```bash
//! # Audit the default namespaces
//! who-can-audit
//!
//! # Add namespaces, including all namespaces at once
//! who-can-audit -n team-a -n '*' --pretty
//!
//! # Keep going when individual checks fail
//! who-can-audit --on-query-error skip-and-record
//! ```
//!
//! Exit status is 0 for a complete pass, 2 when queries or listings were skipped
//! (the skipped items are printed as JSON on stderr) and 1 on a fatal error.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use who_can_audit::audit::{
    collect_subjects, enumerate, render_raw, resource_verb_pairs, run_pass, to_json, PassOutcome,
};
use who_can_audit::config::{load_config, AuditConfig, QueryErrorPolicy};
use who_can_audit::constants::{EXIT_CODE_FATAL, EXIT_CODE_PARTIAL};
use who_can_audit::discovery::discover_resources;
use who_can_audit::kube_lister::KubeBindingLister;
use who_can_audit::oracle::WhoCanOracle;
use who_can_audit::runtime::{create_client, init_tracing, install_crypto_provider, RequestBudget};

/// Kubernetes RBAC audit: who can do what, where
#[derive(Parser, Debug)]
#[command(name = "who-can-audit")]
#[command(about = "Reports which bindings grant each subject each verb on each resource", long_about = None)]
struct Cli {
    /// Extra namespace to audit after the defaults (repeatable, "*" for all namespaces)
    #[arg(short, long = "namespace")]
    namespaces: Vec<String>,

    /// Client-side request budget in requests per second
    #[arg(long)]
    qps: Option<f64>,

    /// Client-side request burst
    #[arg(long)]
    burst: Option<u32>,

    /// What to do when an authorization check fails
    #[arg(long, value_enum)]
    on_query_error: Option<QueryErrorPolicy>,

    /// Path or name of the kubectl-who-can binary
    #[arg(long)]
    who_can_binary: Option<String>,

    /// Write the JSON document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print per-query results instead of the subject tree
    #[arg(long)]
    raw: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    /// CLI flags take precedence over environment and `WHO_CAN_CONFIG`
    fn apply(&self, config: &mut AuditConfig) {
        config.extra_namespaces.extend(self.namespaces.iter().cloned());
        if let Some(qps) = self.qps {
            config.requests_per_second = qps;
        }
        if let Some(burst) = self.burst {
            config.burst = burst;
        }
        if let Some(policy) = self.on_query_error {
            config.query_error_policy = policy;
        }
        if let Some(binary) = &self.who_can_binary {
            config.who_can_binary.clone_from(binary);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(outcome) => ExitCode::from(exit_status(&outcome)),
        Err(e) => {
            error!("Audit failed: {:#}", e);
            ExitCode::from(EXIT_CODE_FATAL)
        }
    }
}

/// 0 for a complete pass, [`EXIT_CODE_PARTIAL`] when anything was skipped
fn exit_status(outcome: &PassOutcome) -> u8 {
    if outcome.is_complete() {
        0
    } else {
        EXIT_CODE_PARTIAL
    }
}

/// JSON report of skipped queries and listings, `None` for a complete pass
fn partial_report(outcome: &PassOutcome) -> Result<Option<String>> {
    if outcome.is_complete() {
        return Ok(None);
    }
    let report =
        serde_json::to_string(&outcome.report).context("Unable to serialize audit report")?;
    Ok(Some(report))
}

async fn run(cli: Cli) -> Result<PassOutcome> {
    install_crypto_provider()?;

    let mut config = load_config().context("Unable to load audit configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    let oracle = WhoCanOracle::locate(&config.who_can_binary)?;
    let client = create_client().await?;
    let budget = RequestBudget::from_config(&config);

    let resources = discover_resources(&client, &budget).await?;
    let pairs = resource_verb_pairs(&resources);
    let namespaces = config.query_namespaces();
    info!(
        "Auditing {} namespaces x {} resource/verb pairs ({} queries)",
        namespaces.len(),
        pairs.len(),
        namespaces.len() * pairs.len()
    );

    let lister = KubeBindingLister::new(client);
    let concurrency = usize::try_from(config.burst).unwrap_or(usize::MAX);
    let catalog = collect_subjects(&lister, &budget, concurrency).await;

    let queries = enumerate(&namespaces, &pairs)?;
    let outcome = run_pass(&oracle, catalog, queries, &config, &budget).await?;

    let document = if cli.raw {
        let rows = render_raw(&outcome.results);
        if cli.pretty {
            serde_json::to_string_pretty(&rows)?
        } else {
            serde_json::to_string(&rows)?
        }
    } else {
        to_json(&outcome.tree, cli.pretty)?
    };

    match &cli.output {
        Some(path) => std::fs::write(path, document + "\n")
            .with_context(|| format!("Unable to write output to {}", path.display()))?,
        None => println!("{document}"),
    }

    if let Some(report) = partial_report(&outcome)? {
        eprintln!("{report}");
    }

    Ok(outcome)
}
