//! Cellar CLI - dependency installer for Wine bottles
//!
//! Usage:
//!   cellar new <bottle>                Create an empty bottle
//!   cellar install <bottle> <dep>...   Install dependencies into a bottle
//!   cellar list <bottle>               Show a bottle's install ledger
//!   cellar catalog                     List dependencies in the repository
//!   cellar show <dep>                  Print a dependency's manifest

use anyhow::{bail, Context, Result};
use cellar::bottle::BottleConfig;
use cellar::executor::DependencyInstaller;
use cellar::fetch::HttpFetcher;
use cellar::manifest::DependencyRef;
use cellar::observer::NullObserver;
use cellar::output;
use cellar::paths::Paths;
use cellar::repo::DependencyRepo;
use cellar::runner::WineRunner;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cellar")]
#[command(about = "Manifest-driven dependency installer for Wine bottles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory containing bottles
    #[arg(short = 'b', long, global = true)]
    bottles_path: Option<PathBuf>,

    /// Root for download staging directories
    #[arg(short = 't', long, global = true)]
    temp_path: Option<PathBuf>,

    /// Base URL of the dependency repository
    #[arg(short = 'r', long, global = true)]
    repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty bottle
    New {
        /// Bottle name
        bottle: String,
    },

    /// Install dependencies into a bottle
    Install {
        /// Bottle name
        bottle: String,

        /// Dependency names, installed in the given order
        #[arg(required = true)]
        dependencies: Vec<String>,

        /// Repository category; looked up in the catalog if omitted
        #[arg(short, long)]
        category: Option<String>,

        /// Print install reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a bottle's installed dependencies and uninstaller entries
    List {
        /// Bottle name
        bottle: String,
    },

    /// List dependencies available in the repository
    Catalog,

    /// Print the raw manifest of a dependency
    Show {
        /// Dependency name
        dependency: String,

        /// Repository category; looked up in the catalog if omitted
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let defaults = Paths::resolve();
    let paths = Paths::with_roots(
        cli.bottles_path.unwrap_or(defaults.bottles),
        cli.temp_path.unwrap_or(defaults.temp),
    );
    let repo = match cli.repo {
        Some(url) => DependencyRepo::new(url),
        None => DependencyRepo::from_env(),
    };

    match cli.command {
        Commands::New { bottle } => {
            let dir = paths.bottle_dir(&bottle);
            if dir.join(cellar::bottle::BOTTLE_CONFIG).exists() {
                bail!("bottle '{}' already exists at {}", bottle, dir.display());
            }

            let config = BottleConfig::new(&bottle, &dir);
            std::fs::create_dir_all(config.system32())
                .with_context(|| format!("cannot create bottle at {}", dir.display()))?;
            std::fs::create_dir_all(config.fonts_dir())?;
            config.save()?;
            output::success(&format!("created bottle '{}' at {}", bottle, dir.display()));
        }

        Commands::Install {
            bottle,
            dependencies,
            category,
            json,
        } => {
            let mut config = load_bottle(&paths, &bottle)?;

            let fetcher = HttpFetcher::new();
            let runner = WineRunner::from_env();
            let installer = DependencyInstaller::new(&repo, &fetcher, &runner, paths.clone());

            let mut reports = Vec::new();
            for name in &dependencies {
                let dependency = match &category {
                    Some(category) => DependencyRef::new(name, category),
                    None => repo.find(name).with_context(|| {
                        format!("'{}' is not in the repository catalog; pass --category to skip the lookup", name)
                    })?,
                };
                let report = installer.install(&mut config, &dependency, &NullObserver)?;
                reports.push(report);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }

            let failed: usize = reports.iter().map(|r| r.failed_steps().count()).sum();
            if failed > 0 {
                bail!("{} step(s) failed; see the log above", failed);
            }
        }

        Commands::List { bottle } => {
            let config = load_bottle(&paths, &bottle)?;

            if config.installed_dependencies.is_empty() {
                output::info(&format!("no dependencies installed in '{}'", bottle));
            } else {
                output::info(&format!("dependencies in '{}':", bottle));
                for name in &config.installed_dependencies {
                    let note = match config.uninstallers.get(name).map(String::as_str) {
                        Some(cellar::NO_UNINSTALLER) => "(no uninstaller)".to_string(),
                        Some(reference) => format!("uninstaller: {}", reference),
                        None => String::new(),
                    };
                    output::list_item(name, &note, true);
                }
            }
        }

        Commands::Catalog => {
            let catalog = repo.catalog();
            if catalog.is_empty() {
                bail!("no dependencies available from {}", repo.base_url());
            }

            output::info(&format!("{} dependencies available:", catalog.len()));
            for (name, entry) in &catalog {
                let note = match &entry.description {
                    Some(description) => format!("[{}] {}", entry.category, description),
                    None => format!("[{}]", entry.category),
                };
                output::list_item(name, &note, false);
            }
        }

        Commands::Show {
            dependency,
            category,
        } => {
            let dep = match category {
                Some(category) => DependencyRef::new(&dependency, category),
                None => repo
                    .find(&dependency)
                    .with_context(|| format!("'{}' is not in the repository catalog", dependency))?,
            };
            let text = repo
                .manifest_text(&dep)
                .with_context(|| format!("no manifest found for {}", dep))?;
            print!("{}", text);
        }
    }

    Ok(())
}

fn load_bottle(paths: &Paths, name: &str) -> Result<BottleConfig> {
    BottleConfig::load(&paths.bottle_dir(name))
        .with_context(|| format!("no bottle named '{}' under {}", name, paths.bottles.display()))
}
