//! `poe`: plan compiler pass orderings from manifest files

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use poe_core::{Manifest, Request};
use poe_plan::{PlanError, Planner};
use poe_search::{SatisfactionStats, SearchConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let manifest = Arg::new("manifest")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Registry manifest (.yaml, .yml, .json or .toml)");

    let search_args = [
        Arg::new("config")
            .long("config")
            .value_parser(value_parser!(PathBuf))
            .help("Search configuration file (TOML)"),
        Arg::new("seed")
            .long("seed")
            .value_parser(value_parser!(u64))
            .help("Seed for reproducible runs"),
        Arg::new("population")
            .long("population")
            .value_parser(value_parser!(usize))
            .help("Override population-size"),
        Arg::new("stagnation")
            .long("stagnation")
            .value_parser(value_parser!(u64))
            .help("Override stagnation-limit"),
        Arg::new("max-duration-ms")
            .long("max-duration-ms")
            .value_parser(value_parser!(u64))
            .help("Override max-duration-ms"),
    ];

    Command::new("poe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pass ordering engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log search progress (debug level)"),
        )
        .subcommand(
            Command::new("plan")
                .about("Search for a valid ordering and print the plan")
                .arg(manifest.clone())
                .args(search_args.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("stats")
                        .long("stats")
                        .action(ArgAction::SetTrue)
                        .help("Print satisfaction statistics after the search"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a manifest without searching")
                .arg(manifest.clone()),
        )
        .subcommand(
            Command::new("stats")
                .about("Run several searches and print satisfaction statistics")
                .arg(manifest)
                .args(search_args)
                .arg(
                    Arg::new("runs")
                        .long("runs")
                        .default_value("10")
                        .value_parser(value_parser!(u64))
                        .help("Number of searches"),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File configuration with command-line overrides applied
fn search_config(args: &ArgMatches) -> Result<SearchConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => SearchConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(&population) = args.get_one::<usize>("population") {
        config.population_size = population;
    }
    if let Some(&stagnation) = args.get_one::<u64>("stagnation") {
        config.stagnation_limit = stagnation;
    }
    if let Some(&budget) = args.get_one::<u64>("max-duration-ms") {
        config.max_duration_ms = budget;
    }
    config.validate()?;
    Ok(config)
}

fn load_request(args: &ArgMatches) -> Result<Arc<Request>> {
    let path = args
        .get_one::<PathBuf>("manifest")
        .context("manifest path missing")?;
    let manifest = Manifest::from_path(path).with_context(|| format!("loading {}", path.display()))?;
    let (_, request) = manifest
        .build()
        .with_context(|| format!("building {}", path.display()))?;
    Ok(Arc::new(request))
}

#[derive(Serialize)]
struct PlanReport<'a> {
    digest: String,
    generations: u64,
    evaluations: u64,
    cache_hits: u64,
    elapsed_ms: u128,
    termination: poe_search::Termination,
    fitness: f64,
    plan: poe_plan::PlanNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a poe_search::StatsSnapshot>,
}

fn plan(args: &ArgMatches) -> Result<ExitCode> {
    let request = load_request(args)?;
    let config = search_config(args)?;
    let json = args.get_flag("json");
    let stats = Arc::new(SatisfactionStats::new());

    let mut planner = Planner::new(config)?;
    if args.get_flag("stats") {
        planner = planner.with_statistics(Arc::clone(&stats));
    }

    let planned = match planner.plan(Arc::clone(&request), args.get_one::<u64>("seed").copied()) {
        Ok(planned) => planned,
        Err(PlanError::PlanNotFound { report }) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                eprintln!("no valid plan found");
                eprint!("{report}");
            }
            return Ok(ExitCode::from(1));
        }
        Err(err) => return Err(err.into()),
    };

    let registry = request.registry();
    let snapshot = args.get_flag("stats").then(|| stats.snapshot());
    if json {
        let report = PlanReport {
            digest: planned.plan.digest().to_hex(),
            generations: planned.outcome.generations,
            evaluations: planned.outcome.evaluations,
            cache_hits: planned.outcome.cache_hits,
            elapsed_ms: planned.outcome.elapsed.as_millis(),
            termination: planned.outcome.termination,
            fitness: planned.outcome.best.fitness(),
            plan: planned.plan.describe(registry),
            stats: snapshot.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", planned.plan.render(registry));
        println!();
        println!("digest:      {}", planned.plan.digest());
        println!("units:       {}", planned.plan.unit_count());
        println!("adapters:    {}", planned.plan.adapter_count());
        println!("generations: {}", planned.outcome.generations);
        println!("evaluations: {}", planned.outcome.evaluations);
        if let Some(snapshot) = &snapshot {
            print_stats(snapshot);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn check(args: &ArgMatches) -> Result<ExitCode> {
    let request = load_request(args)?;
    let registry = request.registry();
    let names = |ids: &[poe_core::UnitId]| -> String {
        ids.iter()
            .map(|id| registry.unit_name(*id))
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("scopes:   {}", registry.scopes().names().len());
    println!("adapters: {}", registry.scopes().adapters().len());
    println!("tags:     {}", registry.tags().len());
    println!("units:    {}", registry.units().len());
    println!("anchors:  {}", names(request.anchors()));
    println!("fillers:  {}", names(request.fillers()));
    Ok(ExitCode::SUCCESS)
}

fn stats(args: &ArgMatches) -> Result<ExitCode> {
    let request = load_request(args)?;
    let config = search_config(args)?;
    let runs = args.get_one::<u64>("runs").copied().unwrap_or(10);
    let seed = args.get_one::<u64>("seed").copied();

    let stats = Arc::new(SatisfactionStats::new());
    let planner = Planner::new(config)?.with_statistics(Arc::clone(&stats));
    let mut found = 0u64;
    for run in 0..runs {
        let run_seed = seed.map(|s| s.wrapping_add(run));
        match planner.plan(Arc::clone(&request), run_seed) {
            Ok(_) => found += 1,
            Err(err) if err.is_recoverable() => {}
            Err(err) => return Err(err.into()),
        }
    }
    info!(runs, found, "statistics collected");

    println!("plans found: {found}/{runs}");
    print_stats(&stats.snapshot());
    Ok(ExitCode::SUCCESS)
}

fn print_stats(snapshot: &poe_search::StatsSnapshot) {
    println!();
    println!("{:<24} {:>12} {:>12}", "unit", "satisfied", "unsatisfied");
    for row in &snapshot.units {
        println!("{:<24} {:>12} {:>12}", row.name, row.satisfied, row.unsatisfied);
    }
    if !snapshot.tags.is_empty() {
        println!();
        println!("{:<24} {:>12} {:>12}", "tag", "missing", "forbidden");
        for row in &snapshot.tags {
            println!("{:<24} {:>12} {:>12}", row.name, row.missing, row.forbidden);
        }
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("plan", args)) => plan(args),
        Some(("check", args)) => check(args),
        Some(("stats", args)) => stats(args),
        _ => Ok(ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
