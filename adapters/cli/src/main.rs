#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that prints seeded gacha tables, replays routes and
//! searches for routes landing on a chosen cell.

mod master_data;
mod report;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gacha_route_core::{CellLabel, ConfigurationSet, GachaId, ItemId, Route, Segment};
use gacha_route_prng::generate_stream;
use gacha_route_roll::RollTables;
use gacha_route_search::{
    Config, FinalAction, RouteQuery, RouteSearch, ScoreWeights, DEFAULT_BEAM_WIDTH,
    DEFAULT_MAX_STEPS,
};
use gacha_route_simulator::Simulator;
use tracing_subscriber::EnvFilter;

/// Stream values generated beyond the furthest cursor a command can reach.
const SAFETY_MARGIN: usize = 256;

/// Upper bound of stream values consumed by a single pull.
const MAX_PULL_WIDTH: usize = 3;

/// Longest stream a command may request.
const MAX_STREAM_LEN: usize = 1 << 24;

#[derive(Debug, Parser)]
#[command(name = "gacha-route", author, version, about, long_about = None)]
struct Cli {
    /// Master data file; `.json` files are read as JSON, anything else as TOML.
    #[arg(short, long)]
    config: PathBuf,

    /// Seed of the roll stream; a random seed is chosen and logged when omitted.
    #[arg(short, long)]
    seed: Option<u32>,

    /// Synthetic uber entries prepended to every gacha's uber pool.
    #[arg(long, default_value_t = 0)]
    bonus_ubers: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the two-track roll table.
    Table {
        /// Number of rows to print.
        #[arg(short, long, default_value_t = 50)]
        rows: usize,
        /// Gachas to print; all when omitted.
        #[arg(short, long, value_delimiter = ',')]
        gacha: Vec<u32>,
    },
    /// Replay a route and print every pull.
    Simulate {
        /// Route such as `1:10 2:11g`.
        route: String,
        /// Starting cell as a cursor or a label such as `3B`.
        #[arg(long, default_value = "0")]
        start: String,
    },
    /// Search for a route landing on a target cell.
    Find(FindArgs),
}

#[derive(Debug, Args)]
struct FindArgs {
    /// Target cell as a cursor or a label such as `12B`.
    target: String,
    /// Gacha pulled at the target.
    #[arg(long)]
    gacha: u32,
    /// Starting cell as a cursor or a label.
    #[arg(long, default_value = "0")]
    start: String,
    /// Gachas the route may use; all when omitted.
    #[arg(long, value_delimiter = ',')]
    available: Vec<u32>,
    /// Route replayed before searching.
    #[arg(long)]
    prefix: Option<String>,
    /// Appended after landing: `none`, `<id>:1` or `<id>:<size>g`.
    #[arg(long = "final", value_parser = parse_final_action)]
    final_action: Option<FinalAction>,
    /// Item whose draw the route should favour.
    #[arg(long)]
    primary: Option<u32>,
    /// Items earning a small bonus when drawn.
    #[arg(long, value_delimiter = ',')]
    interesting: Vec<u32>,
    /// Maximum number of pulls on premium gachas.
    #[arg(long)]
    premium_cap: Option<usize>,
    /// Maximum number of guaranteed bundles.
    #[arg(long)]
    bundle_cap: Option<usize>,
    /// Candidates kept per beam step.
    #[arg(long, default_value_t = DEFAULT_BEAM_WIDTH)]
    beam_width: usize,
    /// Beam steps before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let configurations = with_bonus_ubers(master_data::load(&cli.config)?, cli.bonus_ubers)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, gachas = configurations.len(), "loaded master data");

    match cli.command {
        Command::Table { rows, gacha } => run_table(&configurations, seed, rows, &gacha),
        Command::Simulate { route, start } => run_simulate(&configurations, seed, &route, &start),
        Command::Find(args) => run_find(&configurations, seed, &args),
    }
}

fn with_bonus_ubers(configurations: ConfigurationSet, bonus: u32) -> Result<ConfigurationSet> {
    if bonus == 0 {
        return Ok(configurations);
    }
    let augmented = configurations
        .iter()
        .map(|configuration| configuration.with_bonus_ubers(bonus))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ConfigurationSet::from_configurations(augmented)?)
}

fn run_table(
    configurations: &ConfigurationSet,
    seed: u32,
    rows: usize,
    gachas: &[u32],
) -> Result<()> {
    let stream = generate_stream(seed, stream_len(rows.checked_mul(2))?);
    let tables = RollTables::build(configurations, &stream);
    let selected: Vec<GachaId> = if gachas.is_empty() {
        configurations.ids().collect()
    } else {
        gachas.iter().copied().map(GachaId::new).collect()
    };

    for gacha in selected {
        let configuration = configurations
            .get(gacha)
            .ok_or_else(|| anyhow!("gacha {gacha} is not configured"))?;
        let table = tables
            .get(gacha)
            .ok_or_else(|| anyhow!("no table was built for gacha {gacha}"))?;
        println!("{}", report::table(table, configuration, rows));
    }
    Ok(())
}

fn run_simulate(
    configurations: &ConfigurationSet,
    seed: u32,
    route: &str,
    start: &str,
) -> Result<()> {
    let start = parse_position(start)?;
    let (route, skipped) = Route::parse_with_report(route);
    for token in &skipped {
        tracing::warn!(token = token.as_str(), "skipped malformed route token");
    }

    let furthest = route
        .total_pulls()
        .checked_mul(MAX_PULL_WIDTH)
        .and_then(|span| span.checked_add(start));
    let stream = generate_stream(seed, stream_len(furthest)?);
    let tables = RollTables::build(configurations, &stream);
    let simulator = Simulator::new(configurations, &tables, &stream);
    let outcome = simulator
        .route(start, &route, None)
        .with_context(|| format!("failed to replay route `{route}`"))?;

    print!(
        "{}",
        report::steps(&outcome, &stream, |step| configurations.get(step.gacha()))
    );
    Ok(())
}

fn run_find(configurations: &ConfigurationSet, seed: u32, args: &FindArgs) -> Result<()> {
    let start = parse_position(&args.start)?;
    let target = parse_position(&args.target)?;

    let mut query = RouteQuery::new(start, target, GachaId::new(args.gacha))
        .with_available(args.available.iter().copied().map(GachaId::new))
        .with_interesting(args.interesting.iter().copied().map(ItemId::new));
    if let Some(prefix) = &args.prefix {
        query = query.with_prefix(Route::parse(prefix));
    }
    if let Some(action) = args.final_action {
        query = query.with_final_action(action);
    }
    if let Some(primary) = args.primary {
        query = query.with_primary_target(ItemId::new(primary));
    }
    if let Some(cap) = args.premium_cap {
        query = query.with_premium_cap(cap);
    }
    if let Some(cap) = args.bundle_cap {
        query = query.with_bundle_cap(cap);
    }

    let stream = generate_stream(seed, stream_len(Some(target))?);
    let tables = RollTables::build(configurations, &stream);
    let search = RouteSearch::new(
        Simulator::new(configurations, &tables, &stream),
        Config::new(args.beam_width, args.max_steps),
        ScoreWeights::default(),
    );

    let Some(found) = search.find_route(&query) else {
        bail!(
            "no route lands on {} ({target})",
            CellLabel::from_cursor(target)
        );
    };

    if args.json {
        let summary = report::FoundReport {
            seed,
            target,
            route: found.route().to_string(),
            score: found.score(),
            steps: found.steps(),
            prefix_len: found.prefix_len(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", found.route());
    }
    Ok(())
}

/// Stream length covering `furthest` plus the safety margin.
fn stream_len(furthest: Option<usize>) -> Result<usize> {
    furthest
        .and_then(|cursor| cursor.checked_add(SAFETY_MARGIN))
        .filter(|&len| len <= MAX_STREAM_LEN)
        .ok_or_else(|| anyhow!("request needs more than {MAX_STREAM_LEN} stream values"))
}

fn parse_position(value: &str) -> Result<usize> {
    let value = value.trim();
    if value.chars().all(|c| c.is_ascii_digit()) {
        return value
            .parse()
            .with_context(|| format!("invalid cursor `{value}`"));
    }
    let label: CellLabel = value
        .parse()
        .with_context(|| format!("invalid cell label `{value}`"))?;
    Ok(label.cursor())
}

fn parse_final_action(value: &str) -> Result<FinalAction, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(FinalAction::Skip);
    }
    let segment: Segment = value.parse().map_err(|error| format!("{error}"))?;
    if segment.is_bundle() {
        return Ok(FinalAction::Bundle {
            gacha: segment.gacha(),
            size: segment.count(),
        });
    }
    if segment.count() != 1 {
        return Err(format!("final pull `{value}` must have a count of 1"));
    }
    Ok(FinalAction::Pull(segment.gacha()))
}
