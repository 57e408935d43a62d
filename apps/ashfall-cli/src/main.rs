use ashfall_common::UnitId;
use ashfall_resolve::{FsManifestSource, Resolver, UnitLoader};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ashfall-cli", about = "CLI tool for ashfall loader operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// List the units and namespaces in a dependency manifest
    Inspect {
        /// Path to the manifest JSON
        manifest: String,
    },
    /// Simulate loading: resolve batches for the given namespaces and print
    /// the dispatch order
    Simulate {
        /// Path to the manifest JSON
        manifest: String,
        /// Namespaces to import
        targets: Vec<String>,
        /// Import every namespace in the manifest
        #[arg(long)]
        all: bool,
    },
}

/// Loader double that executes each dispatched unit on the spot, providing
/// every namespace it owns. Externals are only announced; nothing tracks
/// their completion.
#[derive(Default)]
struct SimLoader {
    loads: usize,
}

impl UnitLoader<()> for SimLoader {
    fn load_unit(&mut self, resolver: &mut Resolver<()>, unit: &UnitId) {
        self.loads += 1;
        println!("  load {unit}");
        let provides = resolver
            .registry()
            .unit(unit)
            .map(|u| u.provides.clone())
            .unwrap_or_default();
        for name in provides {
            resolver.provide(self, &name, ());
        }
    }

    fn load_external(&mut self, _resolver: &mut Resolver<()>, url: &str) {
        self.loads += 1;
        println!("  fetch external {url}");
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("ashfall-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", ashfall_common::crate_info());
            println!("resolve: {}", ashfall_resolve::crate_info());
        }
        Commands::Inspect { manifest } => {
            let resolver = load_manifest(&manifest)?;
            for (unit, entry) in resolver.registry().units_iter() {
                println!("{unit} ({} bytes)", entry.approx_size);
                for name in &entry.provides {
                    println!("  provides {name}");
                }
                for dep in &entry.requires {
                    println!("  requires {dep}");
                }
            }
            println!("{} namespaces total", resolver.registry().names().count());
        }
        Commands::Simulate {
            manifest,
            targets,
            all,
        } => {
            anyhow::ensure!(
                all || !targets.is_empty(),
                "give at least one namespace to import, or --all"
            );
            let mut resolver = load_manifest(&manifest)?;
            let mut loader = SimLoader::default();

            if all {
                println!("importing every namespace:");
                resolver.import_all(&mut loader);
            } else {
                for target in &targets {
                    println!("importing {target}:");
                    resolver.import(&mut loader, target);
                }
            }

            let loaded = resolver
                .registry()
                .names()
                .filter(|n| resolver.is_imported(n))
                .count();
            println!(
                "{} loads dispatched, {}/{} namespaces loaded",
                loader.loads,
                loaded,
                resolver.registry().names().count()
            );
            if resolver.pending_count() > 0 {
                println!(
                    "{} namespaces could not be scheduled \
                     (missing or cyclic dependencies, {} bytes)",
                    resolver.pending_count(),
                    resolver.pending_bytes()
                );
            }
        }
    }

    Ok(())
}

fn load_manifest(path: &str) -> anyhow::Result<Resolver<()>> {
    let mut resolver = Resolver::new();
    let mut source = FsManifestSource::new(".");
    let count = resolver.import_list(&mut source, path)?;
    tracing::debug!(path, count, "manifest loaded");
    Ok(resolver)
}
