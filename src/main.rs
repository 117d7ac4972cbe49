use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cli;

use cli::cache::CacheAction;
use cli::deps::DepsAction;

#[derive(Parser)]
#[command(
    name = "ctipkg",
    version,
    about = "Package manager for CTI type and schema packages"
)]
struct Cli {
    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Package manifest (default: nearest index.json upward from the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    index: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create index.json for a new package
    Init {
        /// Package directory (default: current directory)
        dir: Option<PathBuf>,
        /// Application code of the package (vendor.package)
        #[arg(long)]
        app_code: Option<String>,
        /// RAMLx dialect version of the entity files
        #[arg(long)]
        ramlx_version: Option<String>,
    },
    /// Install dependencies (all declared ones when no specs are given)
    Install {
        /// Dependency specs: name or name@version
        specs: Vec<String>,
        /// Re-resolve requested dependencies that are already locked
        #[arg(long)]
        replace: bool,
        /// Local registry directory (default: $CTIPKG_REGISTRY)
        #[arg(long, value_name = "DIR")]
        registry: Option<PathBuf>,
        /// Package cache directory (default: $CTIPKG_CACHE_DIR or the OS cache dir)
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
    /// Validate the package against its locked dependencies
    Validate,
    /// Write bundle.zip with the manifest, assets and metadata cache
    Pack,
    /// Inspect declared and locked dependencies
    Deps {
        #[command(subcommand)]
        action: DepsAction,
    },
    /// Inspect or clear the package cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() {
    let cli = Cli::parse();
    ctipkg::logging::init_logging(cli.verbose);
    let index = cli.index.as_deref();

    let result = match cli.command {
        Command::Init {
            dir,
            app_code,
            ramlx_version,
        } => cli::init::cmd_init(dir, app_code, ramlx_version),
        Command::Install {
            specs,
            replace,
            registry,
            cache_dir,
        } => cli::install::cmd_install(index, specs, replace, registry, cache_dir),
        Command::Validate => cli::validate::cmd_validate(index),
        Command::Pack => cli::pack::cmd_pack(index),
        Command::Deps { action } => cli::deps::cmd_deps(index, action),
        Command::Cache { action } => cli::cache::cmd_cache(action),
    };

    if let Err(e) = result {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}
