// enchant-spell: Check spelling of words with an Enchant dictionary.
//
// Reads words from the command line, or from stdin (one per line) if none
// are given, and reports whether each word is correctly spelled:
//   C: word    (correct)
//   W: word    (misspelled)
//   S: sugg    (suggestion for the preceding misspelled word, with -s)
//
// Usage:
//   enchant-spell [-l TAG] [-s] [--json] [--library PATH] [--ordering TAG=PROVIDERS] [WORD...]

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

/// Check spelling of words with an Enchant dictionary.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Language tag of the dictionary to use
    #[arg(short, long, default_value = "en_US")]
    language: String,

    /// Also print suggestions for misspelled words
    #[arg(short, long)]
    suggest: bool,

    /// Print one JSON object per word instead of C:/W:/S: lines
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    library: enchant_cli::LibraryArgs,

    /// Words to check (default: read from stdin)
    words: Vec<String>,
}

fn main() -> Result<()> {
    enchant_cli::init_tracing();
    let args = Args::parse();

    let mut broker = enchant_cli::open_broker(&args.library)?;
    let mut dict = broker
        .request_dictionary(&args.language)
        .with_context(|| format!("cannot spell check {:?}", args.language))?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    enchant_cli::for_each_word(&args.words, |word| {
        let report = enchant_cli::WordReport::build(&dict, word, args.suggest)?;
        let line = if args.json { report.to_json()? } else { report.to_plain() };
        writeln!(out, "{line}")?;
        Ok(())
    })?;
    out.flush()?;

    broker.release_dictionary(&mut dict)?;
    drop(dict);
    broker.release()?;
    Ok(())
}
