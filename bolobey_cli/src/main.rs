//! Command line for running Bolobey tournament brackets.
//!
//! In a dry run brackets are exchanged as JSON files: `generate` prints a
//! new bracket, `report` and `start` read one and print the updated bracket.
//! With `--persist --tournament UUID` every command reads and writes the
//! bracket stored in PostgreSQL instead.

mod commands;
mod config;

use anyhow::{Error, bail};
use commands::{BracketSource, Command};
use config::CliConfig;
use log::error;
use pico_args::Arguments;
use std::path::PathBuf;

const HELP: &str = "\
Generate and run single-elimination Bolobey brackets

USAGE:
  bolobey <COMMAND> [OPTIONS]

COMMANDS:
  generate    Create a bracket from a participants file
  report      Record a match result
  start       Mark a match as in progress
  available   List matches that can be played now
  stats       Show tournament progress

OPTIONS:
  --participants FILE   JSON array of {\"user_id\": UUID, \"seed\": N}   (generate)
  --bracket FILE        Bracket JSON printed by an earlier command      (dry run only)
  --round N             Round number, 1 = first round                   (report, start)
  --match N             Match number within the round                   (report, start)
  --winner UUID         User ID of the winner                           (report)
  --score A-B           Player 1 and player 2 scores, e.g. 3-1          (report)
  --tournament UUID     Tournament ID                                    [required with --persist]
  --db-url URL          Database connection string  [default: env DATABASE_URL]

FLAGS:
  --persist             Work on the bracket stored in PostgreSQL instead of --bracket
  -h, --help            Print help information

ENVIRONMENT:
  DATABASE_URL          PostgreSQL connection string
  RUST_LOG              Log filter (e.g. info, bolobey=debug)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let subcommand = pargs.subcommand()?;
    let db_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let command = parse_command(subcommand.as_deref(), &mut pargs)?;
    commands::ensure_no_extra_args(pargs.finish())?;

    let config = CliConfig::from_env(db_url);

    match commands::run(command, &config).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("{e:#}");
            Err(e)
        }
    }
}

fn parse_command(subcommand: Option<&str>, pargs: &mut Arguments) -> Result<Command, Error> {
    let command = match subcommand {
        Some("generate") => Command::generate(
            pargs.value_from_str::<_, PathBuf>("--participants")?,
            pargs.opt_value_from_str("--tournament")?,
            pargs.contains("--persist"),
        )?,
        Some("report") => Command::Report {
            round: pargs.value_from_str("--round")?,
            match_number: pargs.value_from_str("--match")?,
            winner_id: pargs.value_from_str("--winner")?,
            score: pargs.value_from_fn("--score", commands::parse_score)?,
            source: bracket_source(pargs)?,
        },
        Some("start") => Command::Start {
            round: pargs.value_from_str("--round")?,
            match_number: pargs.value_from_str("--match")?,
            source: bracket_source(pargs)?,
        },
        Some("available") => Command::Available {
            source: bracket_source(pargs)?,
        },
        Some("stats") => Command::Stats {
            source: bracket_source(pargs)?,
        },
        Some(other) => bail!("Unknown command: {other}\n\n{HELP}"),
        None => bail!("Missing command\n\n{HELP}"),
    };

    Ok(command)
}

fn bracket_source(pargs: &mut Arguments) -> Result<BracketSource, Error> {
    let bracket: Option<PathBuf> = pargs.opt_value_from_str("--bracket")?;
    let tournament_id = pargs.opt_value_from_str("--tournament")?;
    BracketSource::from_args(bracket, tournament_id, pargs.contains("--persist"))
}
