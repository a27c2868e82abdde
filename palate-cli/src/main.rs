mod config;
mod output;
mod prompt;
mod store;

use clap::Parser;
use palate_core::{
    click_agreement, difference, PalateError, Profile, ProfileStore, Recommendation, Recommender,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::PalateConfig;
use crate::output::ComparisonReport;
use crate::prompt::{ask_play_again, TerminalResolver};
use crate::store::{validate_identity, JsonDirStore};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "palate", version, about = "Learn your tastes one pick at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a default config file (at ~/.config/palate/config.toml unless --config is given)
    Init(InitArgs),
    /// Create an empty profile
    Signup(UserArgs),
    /// Play rounds of "which do you prefer?" and get recommendations
    Play(PlayArgs),
    /// Draw recommendations without playing
    Recommend(RecommendArgs),
    /// Compare two profiles
    Compare(CompareArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Where to write the config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Path to config file (default: ~/.config/palate/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding profile files (default: ./Profiles)
    #[arg(long)]
    profiles_dir: Option<PathBuf>,

    /// Log engine details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser)]
struct UserArgs {
    /// Profile name
    #[arg(long)]
    user: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct PlayArgs {
    #[arg(long)]
    user: String,

    /// Play exactly this many rounds instead of asking between rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Seed for recommendation draws
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct RecommendArgs {
    #[arg(long)]
    user: String,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser)]
struct CompareArgs {
    #[arg(long)]
    user: String,

    /// Profile to compare against
    #[arg(long)]
    peer: String,

    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// RUST_LOG wins; otherwise warnings only, or debug for our crates with --verbose.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "palate_core=debug,palate_cli=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Config file, profile store and engine, as every profile command needs them.
struct Context {
    store: JsonDirStore,
    engine: Recommender,
}

fn open_context(common: &CommonArgs) -> Context {
    let config_path = common.config.clone().unwrap_or_else(config::config_path);
    let cfg: PalateConfig = config::load_config(&config_path);

    let engine_config = cfg.engine_config();
    let catalog = cfg.catalog();
    if catalog.len() < engine_config.recommendation_count {
        bail(format!(
            "The catalog has {} items but {} recommendations are drawn per round. Add items or lower `recommendations` in {}",
            catalog.len(),
            engine_config.recommendation_count,
            config_path.display(),
        ));
    }

    let dir = cfg.profiles_dir(common.profiles_dir.clone());
    let store = JsonDirStore::open(&dir)
        .unwrap_or_else(|e| bail(format!("Failed to open profile directory {}: {e}", dir.display())));
    debug!(dir = %store.dir().display(), "profile store opened");

    Context {
        store,
        engine: Recommender::new(engine_config, Some(catalog)),
    }
}

fn load_profile(store: &JsonDirStore, identity: &str) -> Profile {
    match store.load(identity) {
        Ok(profile) => profile,
        Err(PalateError::ProfileNotFound(_)) => bail(format!(
            "No profile named \"{identity}\". Create one with `palate signup --user {identity}`."
        )),
        Err(e) => bail(e),
    }
}

fn recommend_for(ctx: &Context, profile: &Profile, rng: &mut SmallRng) -> Recommendation {
    let peers = ctx.store.list_peers(&profile.identity).unwrap_or_else(|e| bail(e));
    ctx.engine.recommend(profile, &peers, rng).unwrap_or_else(|e| bail(e))
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => {
            init_tracing(false);
            let path = args.config.unwrap_or_else(config::config_path);
            config::write_default_config(&path).unwrap_or_else(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    bail(format!("Config file already exists at {}", path.display()))
                }
                _ => bail(format!("Failed to write config to {}: {e}", path.display())),
            });
            println!("Created config at {}", path.display());
            println!("Edit it to set your catalog, profile directory, etc.");
        }
        Commands::Signup(args) => {
            init_tracing(args.common.verbose);
            run_signup(args);
        }
        Commands::Play(args) => {
            init_tracing(args.common.verbose);
            run_play(args);
        }
        Commands::Recommend(args) => {
            init_tracing(args.common.verbose);
            run_recommend(args);
        }
        Commands::Compare(args) => {
            init_tracing(args.common.verbose);
            run_compare(args);
        }
    }
}

fn run_signup(args: UserArgs) {
    validate_identity(&args.user).unwrap_or_else(|e| bail(e));
    let mut ctx = open_context(&args.common);

    if ctx.store.exists(&args.user).unwrap_or_else(|e| bail(e)) {
        bail(format!("Username \"{}\" already exists. Please choose a different username.", args.user));
    }
    ctx.store.save(&Profile::new(args.user.as_str())).unwrap_or_else(|e| bail(e));
    println!("Account created successfully!");
}

fn run_play(args: PlayArgs) {
    if args.rounds == Some(0) {
        bail("--rounds must be at least 1");
    }
    let mut ctx = open_context(&args.common);
    let mut rng = make_rng(args.seed);

    let profile = load_profile(&ctx.store, &args.user);
    let mut candidates = recommend_for(&ctx, &profile, &mut rng).items;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut round = 0usize;

    loop {
        round += 1;
        if args.common.verbose {
            eprintln!("Round {round}: {}", candidates.join(", "));
        }

        let mut resolver = TerminalResolver::new(&mut input, io::stdout());
        let report = ctx
            .engine
            .run_round(&mut ctx.store, &args.user, &candidates, &mut resolver, &mut rng)
            .unwrap_or_else(|e| bail(e));

        output::print_round(&report.outcome.observations);
        println!("\nYou might also like:");
        output::print_table(&report.outcome.profile, &report.recommendation);
        candidates = report.recommendation.items;

        let again = match args.rounds {
            Some(total) => round < total,
            None => ask_play_again(&mut input, &mut io::stdout())
                .unwrap_or_else(|e| bail(format!("Failed to read answer: {e}"))),
        };
        if !again {
            break;
        }
        println!();
    }
}

fn run_recommend(args: RecommendArgs) {
    let ctx = open_context(&args.common);
    let mut rng = make_rng(args.seed);

    let profile = load_profile(&ctx.store, &args.user);
    let rec = recommend_for(&ctx, &profile, &mut rng);

    if args.json {
        output::print_json(&profile, &rec);
    } else {
        output::print_table(&profile, &rec);
    }
}

fn run_compare(args: CompareArgs) {
    let ctx = open_context(&args.common);
    let user = load_profile(&ctx.store, &args.user);
    let peer = load_profile(&ctx.store, &args.peer);

    let report = ComparisonReport {
        distance: difference(&user.stats.cpi, &peer.stats.cpi),
        shared_items: user.stats.cpi.keys().filter(|k| peer.stats.cpi.contains(k)).count(),
        click_agreement: click_agreement(&user.stats.clicks, &peer.stats.clicks),
        user: user.identity,
        peer: peer.identity,
    };
    output::print_comparison(&report, args.json);
}
