mod logger;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

use rfmt_core::{format_source, FormatConfig, SourceFile, TokenType};

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

/// rfmt — R source formatter
///
/// Format R scripts, check formatting, and inspect tokens and outlines.
#[derive(Parser)]
#[command(name = "rfmt", version, about, long_about = None)]
struct Cli {
    /// Log every pipeline stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to rfmt.toml (default: discovered from the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format R files (prints to stdout unless --write or --check)
    Fmt {
        /// Paths to .R files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Rewrite files in place
        #[arg(long)]
        write: bool,
        /// Exit 1 if any file is not formatted
        #[arg(long, conflicts_with = "write")]
        check: bool,
        /// Override line_width from the config
        #[arg(long, value_name = "N")]
        line_width: Option<usize>,
    },

    /// Report files that are not formatted
    Check {
        /// Paths to .R files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump the classified token list
    Tokens {
        /// Path to .R file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List function definitions and package dependencies
    Outline {
        /// Path to .R file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the token fingerprint (SHA-256) of a file
    Hash {
        /// Path to .R file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FmtMode {
    Print,
    Write,
    Check,
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose, cli.quiet);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            EXIT_ERROR
        }
    };

    process::exit(exit_code);
}

fn run(cli: Cli) -> rfmt_core::Result<i32> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Fmt {
            files,
            write,
            check,
            line_width,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(width) = line_width {
                config.line_width = width;
                config.validate()?;
            }
            let mode = if write {
                FmtMode::Write
            } else if check {
                FmtMode::Check
            } else {
                FmtMode::Print
            };
            Ok(cmd_fmt(&files, &config, mode, quiet))
        }
        Commands::Check { files, json } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_check(&files, &config, json, quiet)
        }
        Commands::Tokens { file, json } => cmd_tokens(&file, json),
        Commands::Outline { file, json } => cmd_outline(&file, json),
        Commands::Hash { file } => {
            let text = std::fs::read_to_string(&file)?;
            println!("{}", rfmt_core::fingerprint(&text)?);
            Ok(EXIT_OK)
        }
        Commands::Version => {
            println!(
                "rfmt {} (rfmt-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            Ok(EXIT_OK)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────

fn load_config(explicit: Option<&Path>) -> rfmt_core::Result<FormatConfig> {
    let config = match explicit {
        Some(path) => FormatConfig::load(path)?,
        None => FormatConfig::discover_or_default(&std::env::current_dir()?)?,
    };
    debug!(?config, "resolved config");
    Ok(config)
}

/// Returns (original, formatted)
fn format_path(path: &Path, config: &FormatConfig) -> rfmt_core::Result<(String, String)> {
    let original = std::fs::read_to_string(path)?;
    let formatted = format_source(&original, config)?;
    Ok((original, formatted))
}

fn parse_path(path: &Path) -> rfmt_core::Result<SourceFile> {
    let text = std::fs::read_to_string(path)?;
    rfmt_core::parse(&text)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> rfmt_core::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| rfmt_core::Error::FormatError(format!("cannot serialize output: {}", e)))
}

fn report_error(path: &Path, error: &rfmt_core::Error) {
    eprintln!("{} {}: {}", "error:".red().bold(), path.display(), error);
}

/// Wire name of a token type, e.g. `SYMBOL_FUNCTION_CALL`
fn token_name(token_type: TokenType) -> String {
    serde_json::to_value(token_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", token_type))
}

// ── Commands ──────────────────────────────────────────────

fn cmd_fmt(files: &[PathBuf], config: &FormatConfig, mode: FmtMode, quiet: bool) -> i32 {
    let mut unformatted = 0;
    let mut errors = 0;

    for path in files {
        let (original, formatted) = match format_path(path, config) {
            Ok(pair) => pair,
            Err(e) => {
                report_error(path, &e);
                errors += 1;
                continue;
            }
        };
        debug!(path = %path.display(), changed = original != formatted, "formatted file");

        match mode {
            FmtMode::Print => print!("{}", formatted),
            FmtMode::Write => {
                if original == formatted {
                    continue;
                }
                if let Err(e) = std::fs::write(path, &formatted) {
                    report_error(path, &e.into());
                    errors += 1;
                    continue;
                }
                if !quiet {
                    println!("{} {}", "Formatted".green().bold(), path.display());
                }
            }
            FmtMode::Check => {
                if original != formatted {
                    unformatted += 1;
                    if !quiet {
                        println!("{} {}", "Would reformat".yellow().bold(), path.display());
                    }
                }
            }
        }
    }

    if mode == FmtMode::Check && !quiet && unformatted == 0 && errors == 0 {
        println!(
            "{} {} file(s) already formatted",
            "✓".green().bold(),
            files.len()
        );
    }

    if errors > 0 {
        EXIT_ERROR
    } else if unformatted > 0 {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

fn cmd_check(
    files: &[PathBuf],
    config: &FormatConfig,
    json: bool,
    quiet: bool,
) -> rfmt_core::Result<i32> {
    if !json {
        return Ok(cmd_fmt(files, config, FmtMode::Check, quiet));
    }

    let mut reports = Vec::new();
    let mut unformatted = 0;
    let mut errors = 0;
    for path in files {
        let report = match format_path(path, config) {
            Ok((original, formatted)) => {
                let is_formatted = original == formatted;
                if !is_formatted {
                    unformatted += 1;
                }
                serde_json::json!({
                    "path": path.display().to_string(),
                    "formatted": is_formatted,
                    "error": null,
                })
            }
            Err(e) => {
                errors += 1;
                serde_json::json!({
                    "path": path.display().to_string(),
                    "formatted": null,
                    "error": e.to_string(),
                })
            }
        };
        reports.push(report);
    }

    let summary = serde_json::json!({
        "files": reports,
        "unformatted": unformatted,
        "errors": errors,
    });
    println!("{}", to_json(&summary)?);

    Ok(if errors > 0 {
        EXIT_ERROR
    } else if unformatted > 0 {
        EXIT_FAILED
    } else {
        EXIT_OK
    })
}

fn cmd_tokens(path: &Path, json: bool) -> rfmt_core::Result<i32> {
    let source = parse_path(path)?;
    if json {
        println!("{}", to_json(&source.tokens)?);
        return Ok(EXIT_OK);
    }

    for node in source.tokens.iter().filter(|n| !n.is(TokenType::Newline)) {
        println!(
            "{:>4}:{:<4} {:<22} {}",
            node.span.line,
            node.span.column,
            token_name(node.token_type),
            node.value
        );
    }
    Ok(EXIT_OK)
}

fn cmd_outline(path: &Path, json: bool) -> rfmt_core::Result<i32> {
    let source = parse_path(path)?;
    let packages: Vec<&str> = source.packages.iter().map(|n| n.value.as_str()).collect();

    if json {
        let outline = serde_json::json!({
            "functions": source.functions,
            "packages": packages,
        });
        println!("{}", to_json(&outline)?);
        return Ok(EXIT_OK);
    }

    println!("{}", "Functions:".bold());
    if source.functions.is_empty() {
        println!("  (none)");
    }
    for function in &source.functions {
        println!("  {}  [{}]", function.to_string().cyan(), function.span);
    }
    println!("{}", "Packages:".bold());
    if packages.is_empty() {
        println!("  (none)");
    }
    for package in packages {
        println!("  {}", package);
    }
    Ok(EXIT_OK)
}
