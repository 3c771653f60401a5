// enchant-dicts: List installed Enchant dictionaries or probe language tags.
//
// Without --exists, prints one line per dictionary offered by the installed
// providers:
//   TAG    PROVIDER    DESCRIPTION
//
// With --exists TAG (repeatable), prints `TAG: installed` or `TAG: missing`
// and exits with status 1 if any tag is missing.
//
// Usage:
//   enchant-dicts [--exists TAG]... [--json] [--library PATH] [--ordering TAG=PROVIDERS]

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

/// List installed Enchant dictionaries or probe language tags.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Report whether a dictionary for this tag is installed
    #[arg(long = "exists", value_name = "TAG")]
    exists: Vec<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    library: enchant_cli::LibraryArgs,
}

#[derive(Debug, Serialize)]
struct TagStatus<'a> {
    tag: &'a str,
    installed: bool,
}

fn main() -> Result<ExitCode> {
    enchant_cli::init_tracing();
    let args = Args::parse();

    let mut broker = enchant_cli::open_broker(&args.library)?;
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut status = ExitCode::SUCCESS;

    if args.exists.is_empty() {
        let mut dicts = broker.list_dictionaries()?;
        dicts.sort_by(|a, b| a.language.cmp(&b.language));
        if args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&dicts)?)?;
        } else {
            let width = dicts.iter().map(|d| d.language.len()).max().unwrap_or(0);
            for d in &dicts {
                writeln!(
                    out,
                    "{:<width$}  {:<10}  {}",
                    d.language, d.provider_name, d.provider_description
                )?;
            }
        }
    } else {
        let mut statuses = Vec::with_capacity(args.exists.len());
        for tag in &args.exists {
            let installed = broker.dictionary_exists(tag)?;
            if !installed {
                status = ExitCode::FAILURE;
            }
            statuses.push(TagStatus { tag, installed });
        }
        if args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&statuses)?)?;
        } else {
            for s in &statuses {
                writeln!(out, "{}: {}", s.tag, if s.installed { "installed" } else { "missing" })?;
            }
        }
    }

    out.flush()?;
    broker.release()?;
    Ok(status)
}
