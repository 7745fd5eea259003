use std::io::{self, Write};

use chatroll::{evaluate, format_value, handle, RollConfig};
use clap::{ArgAction, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatroll", version, about = "Roll dice notation from the command line or a chat log")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Seed for a reproducible sequence of rolls
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Alias game master rolls are whispered to
    #[arg(long, global = true, env = "CHATROLL_GM", default_value = "GameMaster")]
    gm: String,

    /// Channel that receives a copy of every game master roll
    #[arg(long, global = true, env = "CHATROLL_MODERATOR_CHANNEL")]
    moderator_channel: Option<String>,

    /// Leave the numeric result out of game master messages
    #[arg(long, global = true)]
    no_gm_value: bool,

    /// Log more, repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate roll queries and print `<trace> = <value>` for each
    Eval {
        #[arg(required = true, allow_hyphen_values = true)]
        queries: Vec<String>,
    },

    /// Handle chat lines, reading stdin when none are given
    Chat {
        lines: Vec<String>,

        /// Name the lines are attributed to
        #[arg(short, long, default_value = "someone")]
        user: String,
    },
}

impl Cli {
    fn config(&self) -> RollConfig {
        RollConfig {
            gm: self.gm.clone(),
            moderator_channel: self.moderator_channel.clone(),
            gm_includes_value: !self.no_gm_value,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        _ => EnvFilter::new(level),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    let mut rng = cli.rng();
    let mut out = io::stdout().lock();

    match &cli.command {
        Command::Eval { queries } => {
            for query in queries {
                let outcome = evaluate(query, &mut rng);
                writeln!(out, "{} = {}", outcome.trace, format_value(outcome.value))?;
            }
        }
        Command::Chat { lines, user } if lines.is_empty() => {
            debug!("reading chat lines from stdin");
            for line in io::stdin().lines() {
                chat(&mut out, &line?, user, &config, &mut rng)?;
            }
        }
        Command::Chat { lines, user } => {
            for line in lines {
                chat(&mut out, line, user, &config, &mut rng)?;
            }
        }
    }

    Ok(())
}

fn chat(out: &mut impl Write, line: &str, user: &str, config: &RollConfig, rng: &mut StdRng) -> io::Result<()> {
    for message in handle(line, user, config, rng).unwrap_or_default() {
        writeln!(out, "{message}")?;
    }

    Ok(())
}
