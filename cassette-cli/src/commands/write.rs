//! Write command implementation.

use super::CommandResult;
use crate::utils::cassette_path;
use cassette_archive::{CassetteBuilder, PathFilter};
use clap::{ArgMatches, Args};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Cassette to write (`.wav` is appended when missing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Refuse to replace an existing cassette
    #[arg(short, long)]
    pub safely: bool,

    /// Directory whose files are added as regular entries
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub directories: Vec<PathBuf>,

    /// Directory whose files are added as negative entries
    #[arg(short = 'n', long = "negative-dir", value_name = "DIR")]
    pub negative_directories: Vec<PathBuf>,

    /// Only take files matching this glob from the preceding directory
    #[arg(short = 'I', long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob in the preceding directory
    #[arg(short = 'X', long, value_name = "GLOB")]
    pub exclude: Vec<String>,
}

/// A directory to add together with the filters given after it.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorySource {
    pub path: PathBuf,
    pub negative: bool,
    pub filter: Option<PathFilter>,
}

enum Flag<'a> {
    Directory(&'a PathBuf, bool),
    Include(&'a str),
    Exclude(&'a str),
}

/// Pair every directory with the `-I`/`-X` flags that follow it on the
/// command line. Several filters on one directory must all pass.
pub fn directory_sources(
    args: &WriteArgs,
    matches: &ArgMatches,
) -> Result<Vec<DirectorySource>, Box<dyn std::error::Error>> {
    let indices = |id: &str| -> Vec<usize> {
        matches
            .indices_of(id)
            .map(|indices| indices.collect())
            .unwrap_or_default()
    };

    let mut flags: Vec<(usize, Flag<'_>)> = Vec::new();
    flags.extend(
        indices("directories")
            .into_iter()
            .zip(&args.directories)
            .map(|(at, dir)| (at, Flag::Directory(dir, false))),
    );
    flags.extend(
        indices("negative_directories")
            .into_iter()
            .zip(&args.negative_directories)
            .map(|(at, dir)| (at, Flag::Directory(dir, true))),
    );
    flags.extend(
        indices("include")
            .into_iter()
            .zip(&args.include)
            .map(|(at, glob)| (at, Flag::Include(glob))),
    );
    flags.extend(
        indices("exclude")
            .into_iter()
            .zip(&args.exclude)
            .map(|(at, glob)| (at, Flag::Exclude(glob))),
    );
    flags.sort_by_key(|(at, _)| *at);

    let mut sources: Vec<DirectorySource> = Vec::new();
    for (_, flag) in flags {
        let filter = match flag {
            Flag::Directory(path, negative) => {
                sources.push(DirectorySource {
                    path: path.clone(),
                    negative,
                    filter: None,
                });
                continue;
            }
            Flag::Include(glob) => PathFilter::include(glob)?,
            Flag::Exclude(glob) => PathFilter::exclude(glob)?,
        };

        let Some(current) = sources.last_mut() else {
            return Err(format!("Filter {} given before any directory", filter).into());
        };
        current.filter = Some(match current.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
    }

    Ok(sources)
}

pub fn cmd_write(args: &WriteArgs, matches: &ArgMatches) -> CommandResult {
    let destination = cassette_path(&args.output);
    if args.safely && destination.exists() {
        return Err(format!(
            "Aborting as destination {} already exists",
            destination.display()
        )
        .into());
    }

    let sources = directory_sources(args, matches)?;
    if sources.is_empty() {
        log::warn!("No directories given, writing an empty cassette");
    }

    let mut builder = CassetteBuilder::new();
    for source in sources {
        if !source.path.is_dir() {
            return Err(format!("{} is not a directory", source.path.display()).into());
        }
        if source.negative {
            builder.add_negative_directory(&source.path, source.filter)?;
        } else {
            builder.add_directory(&source.path, source.filter)?;
        }
    }

    let frames = builder.write(&destination)?;
    println!(
        "Wrote {} entries ({} bytes of samples) to {}",
        builder.len(),
        frames,
        destination.display()
    );
    Ok(())
}
