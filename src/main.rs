use clap::{Parser, Subcommand};
use powerblocks::abacus::Abacus;
use powerblocks::config::{EngineConfig, FactorMode, IdScheme};
use powerblocks::engine::{Engine, Prompt};
use powerblocks::intent::load_script;
use powerblocks::numtheory::{factor_pair, is_valid_divisor, FactorTree};
use powerblocks::MAX_VALUE;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "powerblocks",
    version,
    about = "Factor, fuse and count number blocks"
)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the canonical factor pair of a number
    Factor { n: u64 },
    /// Check whether d is a valid manual divisor of n
    Divisor { n: u64, d: u64 },
    /// Factor a number all the way down to primes
    Tree { n: u64 },
    /// Deposit values into a fresh abacus and show its rows
    Abacus {
        #[arg(required = true)]
        values: Vec<u64>,
    },
    /// Replay a JSON script of intents and print the resulting catalog
    Run {
        script: PathBuf,
        /// Factor mode for clicks (manual or automatic)
        #[arg(long)]
        mode: Option<FactorMode>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Factor { n } => cmd_factor(n),
        Commands::Divisor { n, d } => cmd_divisor(n, d),
        Commands::Tree { n } => cmd_tree(n),
        Commands::Abacus { values } => cmd_abacus(&values),
        Commands::Run { script, mode } => cmd_run(cli.config.as_deref(), &script, mode),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_factor(n: u64) -> Result<(), Box<dyn std::error::Error>> {
    match factor_pair(n) {
        Some((a, b)) => println!("{} = {} x {}", n, a, b),
        None => println!("{} cannot be factored further", n),
    }
    Ok(())
}

fn cmd_divisor(n: u64, d: u64) -> Result<(), Box<dyn std::error::Error>> {
    if is_valid_divisor(n, d) {
        println!("{} = {} x {}", n, d, n / d);
    } else {
        println!("{} is not a valid divisor of {}", d, n);
    }
    Ok(())
}

fn cmd_tree(n: u64) -> Result<(), Box<dyn std::error::Error>> {
    let tree = FactorTree::build(n);
    print!("{}", tree);
    let leaves: Vec<String> = tree.leaves().iter().map(u64::to_string).collect();
    println!("= {}", leaves.join(" x "));
    Ok(())
}

fn cmd_abacus(values: &[u64]) -> Result<(), Box<dyn std::error::Error>> {
    let mut abacus = Abacus::new();
    let mut total = 0u64;
    for v in values {
        total = total
            .checked_add(*v)
            .filter(|t| *t <= MAX_VALUE)
            .ok_or_else(|| format!("abacus total would exceed {}", MAX_VALUE))?;
        abacus.deposit(*v);
    }
    print!("{}", abacus);
    Ok(())
}

fn cmd_run(
    config: Option<&Path>,
    script: &Path,
    mode: Option<FactorMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.id_scheme = IdScheme::Sequential;
    if let Some(mode) = mode {
        config.factor_mode = mode;
    }

    let intents = load_script(script)?;
    let mut engine = Engine::new(config);
    for (i, intent) in intents.iter().enumerate() {
        let outcome = engine.apply(intent);
        if let Some(notice) = &outcome.notice {
            println!("#{} {}: {}: {}", i + 1, intent.label(), notice.title(), notice);
        }
        if let Some(Prompt::ManualFactor { block, value }) = &outcome.prompt {
            println!("#{} {}: choose a divisor for {} ({})", i + 1, intent.label(), block, value);
        }
    }

    for block in engine.catalog().iter() {
        println!("{}", block);
    }
    println!("{}", serde_json::to_string_pretty(engine.catalog())?);
    println!(
        "version {} fingerprint {}",
        engine.version(),
        engine.catalog().fingerprint()
    );
    Ok(())
}
