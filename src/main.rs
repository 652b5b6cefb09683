use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;
use log::{error, info, LevelFilter};

mod convert;
mod error;
mod palette;
mod quant;
#[cfg(test)]
mod test_prelude;
mod tis;
mod wed;

use convert::{Mode, Options};

/// Convert TIS tileset overlays between classic and Enhanced Edition games.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Convert overlays from classic to Enhanced Edition format.
    #[arg(short = 'c', long, conflicts_with = "from_ee")]
    to_ee: bool,

    /// Convert overlays from Enhanced Edition to classic format. With
    /// neither direction given, each tile pair is autodetected.
    #[arg(short = 'e', long)]
    from_ee: bool,

    /// Directory to search for TIS files; may be given more than once.
    #[arg(short, long = "search", value_name = "DIR")]
    search: Vec<PathBuf>,

    /// Write converted TIS files into this directory instead of updating
    /// them in place.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also print per-tile conversion details.
    #[arg(short = 'x', long)]
    verbose: bool,

    /// WED files describing the overlays to convert.
    #[arg(value_name = "WEDFILE", required = true)]
    wed_files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        LevelFilter::Error
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let mode = if args.to_ee {
        Mode::ToEe
    } else if args.from_ee {
        Mode::FromEe
    } else {
        Mode::Auto
    };

    let (mut search_paths, missing): (Vec<_>, Vec<_>) =
        args.search.into_iter().partition(|dir| dir.is_dir());
    for dir in missing {
        error!("Search path does not exist: {}. Skipping.", dir.display());
    }
    if search_paths.is_empty() {
        search_paths.push(PathBuf::from("."));
    }

    if let Some(dir) = &args.output {
        if !dir.is_dir() {
            error!("Output directory does not exist: {}", dir.display());
            return ExitCode::FAILURE;
        }
    }

    let options = Options {
        mode,
        search_paths,
        output_dir: args.output,
    };

    info!("Using configuration:");
    info!(
        "  Conversion mode: {}",
        match mode {
            Mode::Auto => "autodetect",
            Mode::ToEe => "to EE",
            Mode::FromEe => "from EE",
        }
    );
    info!(
        "  TIS search paths: {}",
        options
            .search_paths
            .iter()
            .map(|p| p.display().to_string())
            .join(", ")
    );
    match &options.output_dir {
        Some(dir) => info!("  Output directory: {}", dir.display()),
        None => info!("  Output directory: (input files are updated in place)"),
    }
    info!("  Found {} input WED file(s)", args.wed_files.len());

    let mut failed = 0usize;
    for wed_path in &args.wed_files {
        match convert::convert_wed(wed_path, &options) {
            Ok(count) => info!("Tileset converted successfully. {count} tile pair(s) updated."),
            Err(err) => {
                error!("{err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        if args.wed_files.len() > 1 {
            error!("Conversion finished with {failed} error(s).");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
