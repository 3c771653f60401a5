// enchant-cli: shared utilities for CLI tools.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use enchant::{Broker, Dictionary, EnchantLibrary};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Options shared by every tool for locating and configuring Enchant.
#[derive(Debug, Clone, clap::Args)]
pub struct LibraryArgs {
    /// Path of the Enchant shared library (default: system search path)
    #[arg(long, value_name = "PATH", env = "ENCHANT_LIBRARY")]
    pub library: Option<PathBuf>,

    /// Provider preference for a tag, e.g. `en_US=hunspell,aspell` or `*=nuspell`
    #[arg(long = "ordering", value_name = "TAG=PROVIDERS")]
    pub orderings: Vec<ProviderOrdering>,
}

/// A `TAG=PROVIDERS` ordering flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOrdering {
    pub tag: String,
    pub providers: String,
}

impl FromStr for ProviderOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, providers) =
            s.split_once('=').ok_or_else(|| format!("expected TAG=PROVIDERS, got {s:?}"))?;
        let (tag, providers) = (tag.trim(), providers.trim());
        if tag.is_empty() || providers.is_empty() {
            return Err(format!("expected TAG=PROVIDERS, got {s:?}"));
        }
        Ok(Self { tag: tag.to_string(), providers: providers.to_string() })
    }
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::WARN.into()).from_env_lossy(),
        )
        .init();
}

/// Load Enchant and create a broker with the requested provider orderings.
pub fn open_broker(args: &LibraryArgs) -> Result<Broker> {
    let library = EnchantLibrary::load_from(args.library.as_deref())
        .context("failed to load the enchant library")?;
    let broker = Broker::with_library(Arc::new(library))?;
    tracing::debug!(library = broker.library().origin(), "using enchant library");
    for ordering in &args.orderings {
        broker
            .set_ordering(&ordering.tag, &ordering.providers)
            .with_context(|| format!("failed to set ordering for {}", ordering.tag))?;
    }
    Ok(broker)
}

/// Spell check result for one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordReport {
    pub word: String,
    pub correct: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl WordReport {
    /// Check `word`, collecting suggestions for misspellings if asked.
    pub fn build(dict: &Dictionary<'_>, word: &str, with_suggestions: bool) -> Result<Self> {
        let correct = dict.check(word)?;
        let suggestions =
            if !correct && with_suggestions { dict.suggest(word)? } else { Vec::new() };
        Ok(Self { word: word.to_string(), correct, suggestions })
    }

    /// Plain output: `C: word` or `W: word`, then one `S: suggestion` per line.
    pub fn to_plain(&self) -> String {
        let mut out = format!("{}: {}", if self.correct { 'C' } else { 'W' }, self.word);
        for s in &self.suggestions {
            out.push_str("\nS: ");
            out.push_str(s);
        }
        out
    }

    /// One-line JSON output.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Call `f` for each word: the given arguments, or stdin lines if none.
///
/// Blank lines are skipped and surrounding whitespace is trimmed.
pub fn for_each_word(words: &[String], mut f: impl FnMut(&str) -> Result<()>) -> Result<()> {
    if !words.is_empty() {
        for word in words {
            f(word)?;
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("error reading stdin")?;
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        f(word)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enchant::testing;

    #[test]
    fn ordering_parses_tag_and_providers() {
        let ordering: ProviderOrdering = "en_US=hunspell,aspell".parse().unwrap();
        assert_eq!(
            ordering,
            ProviderOrdering { tag: "en_US".into(), providers: "hunspell,aspell".into() }
        );
        let ordering: ProviderOrdering = " * = nuspell ".parse().unwrap();
        assert_eq!(ordering.tag, "*");
        assert_eq!(ordering.providers, "nuspell");
    }

    #[test]
    fn ordering_rejects_malformed() {
        for bad in ["hunspell", "=hunspell", "en_US=", ""] {
            assert!(bad.parse::<ProviderOrdering>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn report_plain_format() {
        let broker = Broker::with_library(testing::library()).unwrap();
        let dict = broker.request_dictionary("en_US").unwrap();

        let correct = WordReport::build(&dict, "hello", true).unwrap();
        assert_eq!(correct.to_plain(), "C: hello");

        let wrong = WordReport::build(&dict, "helo", true).unwrap();
        let plain = wrong.to_plain();
        assert!(plain.starts_with("W: helo\nS: "));
        assert!(plain.lines().any(|l| l == "S: hello"));

        let no_suggest = WordReport::build(&dict, "helo", false).unwrap();
        assert_eq!(no_suggest.to_plain(), "W: helo");
    }

    #[test]
    fn report_json_format() {
        let report = WordReport { word: "helo".into(), correct: false, suggestions: vec!["hello".into()] };
        assert_eq!(report.to_json().unwrap(), r#"{"word":"helo","correct":false,"suggestions":["hello"]}"#);

        let report = WordReport { word: "hello".into(), correct: true, suggestions: Vec::new() };
        assert_eq!(report.to_json().unwrap(), r#"{"word":"hello","correct":true}"#);
    }

    #[test]
    fn for_each_word_uses_arguments() {
        let words = vec!["a".to_string(), "b".to_string()];
        let mut seen = Vec::new();
        for_each_word(&words, |w| {
            seen.push(w.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, ["a", "b"]);
    }
}
