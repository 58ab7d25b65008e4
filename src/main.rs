// src/main.rs

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zcr::config::{self, Config};
use zcr::manifest::fetch::remove_scratch_files;
use zcr::progress::{ConsoleSink, ProgressSink, SilentSink};
use zcr::registry::Registry;
use zcr::theme::{HOW_TO_ADD, Theme, Tone};
use zcr::{Outcome, PackageManager};

#[derive(Parser)]
#[command(name = "zcr")]
#[command(author, version, about = "Zenit Community Repository package manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// URL of the package manifest
    #[arg(long, global = true, env = "ZCR_MANIFEST_URL", default_value = config::DEFAULT_MANIFEST_URL)]
    manifest_url: String,

    /// Directory holding installed packages
    #[arg(long, global = true, env = "ZCR_ROOT", default_value = config::DEFAULT_ROOT)]
    root: PathBuf,

    /// Where the last fetched manifest is saved
    #[arg(long, global = true, env = "ZCR_CACHE_FILE", default_value = config::DEFAULT_CACHE_FILE)]
    cache_file: PathBuf,

    /// Log file
    #[arg(long, global = true, env = "ZCR_LOG_FILE", default_value = config::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Disable colored output (any non-empty NO_COLOR value counts)
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package
    Install {
        /// Package name as listed in the manifest
        package: String,
    },
    /// Remove a package
    Remove {
        /// Installed package name
        package: String,
    },
    /// Update a specific package
    Update {
        /// Installed package name
        package: String,
    },
    /// Update all installed packages
    #[command(name = "update-all", alias = "upgrade")]
    UpdateAll,
    /// Search for packages in the manifest
    Find {
        /// Case-insensitive substring of the package name
        query: String,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// List installed packages
    List,
    /// Download the repository list
    Refresh,
    /// Remove temporary files and logs
    Autoremove,
    /// Instructions for adding new repositories
    HowToAdd,
    /// Start the interactive interface
    Ui,
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

/// Install the tracing subscriber, writing to the log file when possible
fn init_logging(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("warn"))
                .with_writer(io::stderr)
                .init();
            warn!("Cannot open log file {}: {}", log_file.display(), e);
        }
    }
}

/// Outcomes where nothing changed are informational, not successes
fn outcome_tone(outcome: &Outcome) -> Tone {
    match outcome {
        Outcome::UpToDate { .. } | Outcome::NotPresent { .. } => Tone::Info,
        Outcome::Found(entries) if entries.is_empty() => Tone::Info,
        _ => Tone::Success,
    }
}

/// Print the outcome of a single-package command and pick the exit code
fn report(theme: &Theme, result: zcr::Result<Outcome>) -> ExitCode {
    match result {
        Ok(outcome) => {
            println!("{}", theme.line(outcome_tone(&outcome), &outcome.to_string()));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", theme.error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(&cli.log_file);

    let theme = Theme::new(!cli.no_color && io::stdout().is_terminal());
    let config = Config {
        manifest_url: cli.manifest_url,
        root: cli.root,
        cache_file: cli.cache_file,
        log_file: cli.log_file,
        ..Config::default()
    };
    let manager = || PackageManager::with_defaults(config.clone());

    match cli.command {
        Some(Commands::Install { package }) => {
            let manager = manager()?;
            Ok(report(&theme, manager.install(&package, &mut ConsoleSink::new(theme))))
        }
        Some(Commands::Remove { package }) => {
            let manager = manager()?;
            Ok(report(&theme, manager.remove(&package, &mut ConsoleSink::new(theme))))
        }
        Some(Commands::Update { package }) => {
            let manager = manager()?;
            Ok(report(&theme, manager.update(&package, &mut ConsoleSink::new(theme))))
        }
        Some(Commands::UpdateAll) => {
            let manager = manager()?;
            match manager.upgrade(&mut ConsoleSink::new(theme)) {
                Ok(Outcome::Upgraded(summary)) => {
                    for (name, error) in &summary.failures {
                        eprintln!("{}", theme.error(&format!("{}: {}", theme.package(name), error)));
                    }
                    let message = Outcome::Upgraded(summary.clone()).to_string();
                    if summary.failures.is_empty() {
                        println!("{}", theme.success(&message));
                    } else {
                        println!("{}", theme.line(Tone::Warning, &message));
                    }
                    Ok(ExitCode::SUCCESS)
                }
                other => Ok(report(&theme, other)),
            }
        }
        Some(Commands::Find { query, json }) => {
            let manager = manager()?;
            let mut console = ConsoleSink::new(theme);
            let mut silent = SilentSink;
            // JSON output keeps stdout free of status lines
            let sink: &mut dyn ProgressSink = if json { &mut silent } else { &mut console };

            match manager.find(&query, sink) {
                Ok(Outcome::Found(entries)) if json => {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                    Ok(ExitCode::SUCCESS)
                }
                Ok(Outcome::Found(entries)) if !entries.is_empty() => {
                    println!("{}", theme.paint(Tone::Title, "Available packages:"));
                    for entry in &entries {
                        println!(
                            "  {} -> {}",
                            theme.package(&entry.name),
                            theme.paint(Tone::Muted, &entry.url)
                        );
                    }
                    Ok(ExitCode::SUCCESS)
                }
                other => Ok(report(&theme, other)),
            }
        }
        Some(Commands::List) => {
            let registry = Registry::new(config.root.clone());
            let installed = registry.installed()?;
            if installed.is_empty() {
                println!("{}", theme.info("No packages installed"));
            } else {
                println!("{}", theme.paint(Tone::Title, "Installed packages:"));
                for name in &installed {
                    println!("  {}", theme.package(name));
                }
                println!("\nTotal: {} package(s)", installed.len());
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Refresh) => {
            let manager = manager()?;
            Ok(report(&theme, manager.refresh(&mut ConsoleSink::new(theme))))
        }
        Some(Commands::Autoremove) => {
            info!("Removing scratch files");
            let cleanup = remove_scratch_files(&config.scratch_files());
            for path in &cleanup.removed {
                println!("{}", theme.success(&format!("Removed {}", path.display())));
            }
            for path in &cleanup.missing {
                println!("{}", theme.info(&format!("{} not found, skipping", path.display())));
            }
            for (path, error) in &cleanup.failed {
                eprintln!(
                    "{}",
                    theme.error(&format!("Failed to remove {}: {}", path.display(), error))
                );
            }
            println!("{}", theme.success("Cleanup completed"));
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::HowToAdd) => {
            println!("{}", theme.paint(Tone::Title, "How to add your repository to zcr"));
            println!();
            println!("Add a line to library/repo-list.zcr in the zcr repository:");
            println!(
                "  {}",
                theme.paint(
                    Tone::Highlight,
                    "your-package -> https://github.com/you/your-package.git"
                )
            );
            println!();
            println!("Your repository may ship zcr-build-files/unpack.sh and remove.sh.");
            println!();
            for (label, url) in HOW_TO_ADD {
                println!("{}{}", theme.paint(Tone::Subtitle, &format!("{:<16}", label)), url);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Ui) => {
            let manager = manager()?;
            zcr::ui::run(Arc::new(manager), Theme::new(!cli.no_color))
                .context("Interactive interface failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "zcr", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
