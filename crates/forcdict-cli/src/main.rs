use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use forcdict_core::{Diagnostic, convert_batch, emit_entry, emit_entry_sanitized};
use forcdict_renderer::{Renderer, Theme};

use crate::cache::Cache;
use crate::fetch::{DEFAULT_BASE_URL, FetchError, Fetcher};
use crate::normalize::normalize;

mod cache;
mod fetch;
mod normalize;

/// Exit status when an entry fails to convert and the run is halted.
const EXIT_ENTRY_FAILED: u8 = 2;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTheme {
    Auto,
    Light,
    Dark,
}

impl From<CliTheme> for Theme {
    fn from(theme: CliTheme) -> Self {
        match theme {
            CliTheme::Auto => Theme::Auto,
            CliTheme::Light => Theme::Light,
            CliTheme::Dark => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiagnosticsMode {
    Pretty,
    Json,
}

/// Looks Latin words up in the Forcellini lexicon and prints the entries
/// as one dictionary document.
#[derive(Parser, Debug)]
#[command(name = "forcdict", version)]
struct Args {
    /// Word to look up; several words are joined with spaces
    #[arg(value_name = "WORD")]
    words: Vec<String>,

    /// Convert a saved article fragment instead of looking anything up
    #[arg(long, value_name = "FILE", conflicts_with = "words")]
    fragment: Option<PathBuf>,

    /// Directory for cached result pages
    #[arg(long, env = "FORCDICT_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Always ask the server and never write the cache
    #[arg(long)]
    no_cache: bool,

    /// Lexicon site root
    #[arg(long, env = "FORCDICT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    #[arg(long, value_enum, default_value_t = CliTheme::Auto)]
    theme: CliTheme,

    /// Pass entries through the HTML allow-list
    #[arg(long)]
    sanitized: bool,

    /// Skip entries that fail to convert instead of halting
    #[arg(long)]
    keep_going: bool,

    /// Where unparseable pages and failed entries are dumped
    #[arg(long, value_name = "FILE", default_value = "debug.html")]
    debug_artifact: PathBuf,

    #[arg(long, value_enum, default_value_t = DiagnosticsMode::Pretty)]
    diagnostics: DiagnosticsMode,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let fragments = match &args.fragment {
        Some(path) => vec![
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ],
        None => {
            let text = args.words.join(" ").to_lowercase();
            if text.trim().is_empty() {
                Args::command().print_help()?;
                return Ok(ExitCode::SUCCESS);
            }
            lookup(args, &text)?
        }
    };

    let mut diagnostics = Vec::new();
    let mut entries = Vec::new();
    let mut halted = false;
    for result in convert_batch(&fragments) {
        match result {
            Ok(conversion) => {
                entries.push(if args.sanitized {
                    emit_entry_sanitized(&conversion.entry)
                } else {
                    emit_entry(&conversion.entry)
                });
                diagnostics.extend(conversion.diagnostics);
            }
            Err(err) => {
                log::error!("entry failed: {}", err);
                diagnostics.push(err.to_diagnostic());
                if let Some(intermediate) = err.intermediate() {
                    write_debug_artifact(&args.debug_artifact, intermediate)?;
                }
                if !args.keep_going {
                    halted = true;
                    break;
                }
            }
        }
    }

    report(&diagnostics, args.diagnostics);
    if halted {
        return Ok(ExitCode::from(EXIT_ENTRY_FAILED));
    }
    if !entries.is_empty() {
        let renderer = Renderer::new(args.theme.into());
        print!("{}", renderer.embed_dictionary(&entries));
    }
    Ok(ExitCode::SUCCESS)
}

/// Collects the raw fragments of every lookup form, cache first. A lemma that
/// cannot be fetched is reported and skipped.
fn lookup(args: &Args, text: &str) -> Result<Vec<String>> {
    let cache = if args.no_cache {
        None
    } else {
        let dir = match &args.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .context("no cache directory on this system; pass --cache-dir or --no-cache")?
                .join("forcdict"),
        };
        let cache = Cache::open(dir)?;
        log::debug!("using cache at {}", cache.dir().display());
        Some(cache)
    };
    let mut fetcher = None;

    let mut fragments = Vec::new();
    for lemma in normalize(text) {
        if let Some(cache) = &cache {
            match cache.read(&lemma) {
                Ok(Some(cached)) => {
                    log::debug!("cache hit for `{}`", lemma);
                    fragments.extend(cached);
                    continue;
                }
                Ok(None) => log::debug!("cache miss for `{}`", lemma),
                Err(err) => log::warn!("ignoring cache for `{}`: {}", lemma, err),
            }
        }

        if fetcher.is_none() {
            fetcher = Some(Fetcher::new(
                args.base_url.clone(),
                Duration::from_secs(args.timeout),
            )?);
        }
        let Some(fetcher) = &fetcher else {
            continue;
        };
        let found = match fetcher.fetch(&lemma) {
            Ok(found) => found,
            Err(FetchError::Unparseable { page }) => {
                write_debug_artifact(&args.debug_artifact, &page)?;
                eprintln!(
                    "{}: cannot parse answer; see {}",
                    lemma,
                    args.debug_artifact.display()
                );
                continue;
            }
            Err(err) => {
                eprintln!("{}: {}", lemma, err);
                continue;
            }
        };
        if let Some(cache) = &cache
            && let Err(err) = cache.save(&lemma, &found)
        {
            log::warn!("failed to cache `{}`: {}", lemma, err);
        }
        fragments.extend(found);
    }
    Ok(fragments)
}

fn write_debug_artifact(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("failed to write debug artifact {}", path.display()))?;
    log::info!("wrote debug artifact {}", path.display());
    Ok(())
}

fn report(diagnostics: &[Diagnostic], mode: DiagnosticsMode) {
    match mode {
        DiagnosticsMode::Json => eprintln!("{}", diagnostics_to_json(diagnostics)),
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    match &diagnostic.snippet {
        Some(snippet) => format!("{}: {} ({})", diagnostic.code, diagnostic.message, snippet),
        None => format!("{}: {}", diagnostic.code, diagnostic.message),
    }
}

fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> String {
    let items: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|diag| {
            serde_json::json!({
                "code": diag.code,
                "severity": diag.severity.label(),
                "message": diag.message,
                "snippet": diag.snippet,
            })
        })
        .collect();
    serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::{diagnostic_to_pretty, diagnostics_to_json};
    use forcdict_core::{Diagnostic, W_STYLE_UNKNOWN};

    #[test]
    fn pretty_line_carries_snippet() {
        let diag = Diagnostic::warning(W_STYLE_UNKNOWN, "unknown span style").with_snippet("color:red");
        assert_eq!(
            diagnostic_to_pretty(&diag),
            "W_STYLE_UNKNOWN: unknown span style (color:red)"
        );
    }

    #[test]
    fn json_lists_every_diagnostic() {
        let json = diagnostics_to_json(&[Diagnostic::warning(W_STYLE_UNKNOWN, "x")]);
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value[0]["code"], "W_STYLE_UNKNOWN");
        assert_eq!(value[0]["severity"], "warning");
        assert!(value[0]["snippet"].is_null());
        assert_eq!(diagnostics_to_json(&[]), "[]");
    }
}
