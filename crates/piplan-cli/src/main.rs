//! `piplan`: PI planning views of a work group as JSON

mod settings;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use piplan_client::{JiraHttpSource, TOKEN_ENV_VAR};
use piplan_engine::{AggregationEngine, Hierarchy};
use piplan_rules::{exclude_assignees, parse_excluded_list, partition_rows, SPRINT_COLUMNS};
use serde::Serialize;
use serde_json::json;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn work_group_arg() -> Arg {
    Arg::new("work-group")
        .long("work-group")
        .required(true)
        .help("Leading work group to aggregate")
}

fn fix_version_arg() -> Arg {
    Arg::new("fix-version")
        .long("fix-version")
        .required(true)
        .help("Program interval fix version (e.g. PI_25w10)")
}

fn cli() -> Command {
    Command::new("piplan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Feature/Epic planning hierarchy, backlog and label statistics")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value("piplan.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs to stderr as JSON"),
        )
        .subcommand(
            Command::new("plan")
                .about("Hierarchy for one program interval")
                .arg(work_group_arg())
                .arg(fix_version_arg())
                .arg(
                    Arg::new("exclude-assignees")
                        .long("exclude-assignees")
                        .help("Assignees to leave out (\"Last, First\"; separated by ; | or newline)"),
                )
                .arg(
                    Arg::new("partition")
                        .long("partition")
                        .action(ArgAction::SetTrue)
                        .help("Split rows into committed and backlog"),
                ),
        )
        .subcommand(
            Command::new("backlog")
                .about("Hierarchy across all program intervals")
                .arg(work_group_arg()),
        )
        .subcommand(
            Command::new("issues")
                .about("Flat labelled fault-report list")
                .arg(work_group_arg())
                .arg(fix_version_arg()),
        )
        .subcommand(
            Command::new("stats")
                .about("Label class counts over the fault-report list")
                .arg(work_group_arg())
                .arg(fix_version_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn value<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{name} is required"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn warn_if_incomplete(hierarchy: &Hierarchy) {
    if hierarchy.is_incomplete() {
        tracing::warn!(
            truncated = hierarchy.truncated,
            partial = hierarchy.partial,
            "result may be missing issues"
        );
    }
}

async fn plan(engine: &AggregationEngine, args: &ArgMatches) -> anyhow::Result<()> {
    let fix_version = value(args, "fix-version")?;
    let mut hierarchy = engine.build(value(args, "work-group")?, fix_version).await?;
    warn_if_incomplete(&hierarchy);

    if let Some(raw) = args.get_one::<String>("exclude-assignees") {
        let names = parse_excluded_list(raw);
        tracing::info!(excluded = names.len(), "excluding assignees");
        exclude_assignees(&mut hierarchy.rows, &names);
    }

    if !args.get_flag("partition") {
        return print_json(&hierarchy);
    }
    let partition = partition_rows(std::mem::take(&mut hierarchy.rows), fix_version);
    print_json(&json!({
        "fix_version": hierarchy.fix_version,
        "generated_at": hierarchy.generated_at,
        "truncated": hierarchy.truncated,
        "partial": hierarchy.partial,
        "sprint_columns": SPRINT_COLUMNS,
        "committed": partition.committed,
        "backlog": partition.backlog,
        "unattached": hierarchy.unattached,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let path = matches
        .get_one::<PathBuf>("config")
        .context("--config is required")?;
    let settings = Settings::load(path)?.with_fallback_token(std::env::var(TOKEN_ENV_VAR).ok());
    if settings.tracker.token.is_none() {
        tracing::warn!("no token configured; set {} or tracker.token", TOKEN_ENV_VAR);
    }

    let schema = settings.tracker.fields.clone();
    let source = Arc::new(JiraHttpSource::new(settings.tracker)?);
    let engine = AggregationEngine::new(source, schema, settings.engine);

    match matches.subcommand() {
        Some(("plan", args)) => plan(&engine, args).await,
        Some(("backlog", args)) => {
            let hierarchy = engine.build_backlog(value(args, "work-group")?).await?;
            warn_if_incomplete(&hierarchy);
            print_json(&hierarchy)
        }
        Some(("issues", args)) => {
            let issues = engine
                .list_issues(value(args, "work-group")?, value(args, "fix-version")?)
                .await?;
            print_json(&issues)
        }
        Some(("stats", args)) => {
            let stats = engine
                .get_statistics(value(args, "work-group")?, value(args, "fix-version")?)
                .await?;
            print_json(&stats)
        }
        _ => Ok(()),
    }
}
