//! Cassette CLI
//!
//! Packs directory trees into cassettes (archives carried as 8-bit PCM WAVE
//! files), lists them, tests them and extracts them.

mod commands;
mod utils;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{ContentsArgs, ExtractArgs, TestArgs, WriteArgs};

#[derive(Parser)]
#[command(name = "cassette")]
#[command(author, version, about = "Pack directories into WAVE cassettes and back")]
#[command(long_about = "
Cassette packs directory trees into a compact bitstream carried as the sample
data of an 8-bit mono PCM WAVE file.

Files added with --negative-dir are stored as negative entries: they travel
with the cassette but are skipped by default when listing or extracting.

Examples:
  cassette write -o assets -d resources -I 'textures/**' -X '**/*.psd'
  cassette write -o assets.wav -s -d core -n optional
  cassette contents assets.wav --negatives
  cassette extract assets.wav -o out --clear
  cassette test assets.wav -v
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cassette from one or more directories
    #[command(alias = "w")]
    Write(WriteArgs),

    /// List the entries of a cassette
    #[command(alias = "l")]
    Contents(ContentsArgs),

    /// Extract a cassette into a directory
    #[command(alias = "x")]
    Extract(ExtractArgs),

    /// Read a whole cassette and check it ends cleanly
    #[command(alias = "t")]
    Test(TestArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Cli::command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let result = match &cli.command {
        Commands::Write(args) => match matches.subcommand_matches("write") {
            Some(write_matches) => commands::cmd_write(args, write_matches),
            None => Err("missing write arguments".into()),
        },
        Commands::Contents(args) => commands::cmd_contents(args),
        Commands::Extract(args) => commands::cmd_extract(args),
        Commands::Test(args) => commands::cmd_test(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
