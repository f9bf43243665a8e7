//! smartsave CLI - versioned scene saves.
//!
//! Usage:
//!   smartsave save --dir scenes --descriptor ship     # scenes/ship_001.ma
//!   smartsave increment --scene scenes/ship_004.ma    # next free version
//!   smartsave latest --dir scenes --descriptor ship   # highest version
//!   smartsave list --dir scenes --descriptor ship     # all versions
//!   smartsave parse scenes/ship_004.ma                # fields of a name

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use smartsave::{
    Config, FileStore, IncrementOutcome, LocalFileStore, MatchPolicy, MemoryFileStore, OpenScene,
    SceneFile, SceneSource,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Exit status when an increment finds nothing to increment from.
const EXIT_NO_PRIOR_VERSION: i32 = 2;

#[derive(Parser)]
#[command(name = "smartsave")]
#[command(about = "smartsave - versioned scene file saves", long_about = None)]
struct Cli {
    /// Config file (default: ./.smartsave.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save at the composed path, creating missing directories
    Save {
        #[command(flatten)]
        scene: SceneArgs,

        /// Report the target without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Save one version above the highest found in the directory
    Increment {
        #[command(flatten)]
        scene: SceneArgs,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Report the target without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the highest version found in the directory
    Latest {
        #[command(flatten)]
        scene: SceneArgs,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },

    /// List every version found in the directory
    List {
        #[command(flatten)]
        scene: SceneArgs,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },

    /// Show the fields parsed from a scene path
    Parse {
        /// Path like scenes/ship_004.ma
        path: PathBuf,
    },
}

/// Scene fields. Precedence: flags, then --scene, then config.
#[derive(Args)]
struct SceneArgs {
    /// Existing scene to pre-fill fields from (also the saved payload)
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Save directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Short asset descriptor, e.g. "ship"
    #[arg(long)]
    descriptor: Option<String>,

    #[arg(long)]
    version: Option<u32>,

    /// Extension without the dot, e.g. "ma"
    #[arg(long)]
    ext: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Stem must be exactly <descriptor>_<version>
    Exact,
    /// Name only has to start with the descriptor
    Prefix,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Exact => MatchPolicy::Exact,
            PolicyArg::Prefix => MatchPolicy::Prefix,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::discover(Path::new("."))?,
    };

    match cli.command {
        Commands::Save { scene, dry_run } => {
            let file = resolve_scene(&config, &scene)?;
            let store = open_store(&config, &scene, file.directory(), dry_run)?;
            let path = file.save(&*store)?;
            if cli.json {
                print_json(&serde_json::json!({ "saved": path, "dry_run": dry_run }))?;
            } else {
                println!("{}{}", dry_run_prefix(dry_run), path.display());
            }
            Ok(0)
        }

        Commands::Increment { scene, policy, dry_run } => {
            let mut file = resolve_scene(&config, &scene)?;
            let policy = policy.map(MatchPolicy::from).unwrap_or(config.match_policy);
            let store = open_store(&config, &scene, file.directory(), dry_run)?;
            let outcome = file.increment_save(&*store, policy)?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                match &outcome {
                    IncrementOutcome::Saved { path, .. } => {
                        println!("{}{}", dry_run_prefix(dry_run), path.display())
                    }
                    IncrementOutcome::NoPriorVersion => println!(
                        "No prior version of {}_*.{} in {}; use `save` for a first version.",
                        file.descriptor(),
                        file.extension(),
                        file.directory().display()
                    ),
                }
            }
            Ok(match outcome {
                IncrementOutcome::Saved { .. } => 0,
                IncrementOutcome::NoPriorVersion => EXIT_NO_PRIOR_VERSION,
            })
        }

        Commands::Latest { scene, policy } => {
            let file = resolve_scene(&config, &scene)?;
            let policy = policy.map(MatchPolicy::from).unwrap_or(config.match_policy);
            let latest = file.latest_version(&LocalFileStore::default(), policy)?;

            if cli.json {
                print_json(&serde_json::json!({ "latest": latest }))?;
            } else {
                match latest {
                    Some(version) => println!("{}", version),
                    None => println!("No versions found"),
                }
            }
            Ok(0)
        }

        Commands::List { scene, policy } => {
            let file = resolve_scene(&config, &scene)?;
            let policy = policy.map(MatchPolicy::from).unwrap_or(config.match_policy);
            let scan = file.scan(&LocalFileStore::default(), policy)?;

            if cli.json {
                print_json(&scan)?;
            } else if scan.is_empty() {
                println!("No versions found");
            } else {
                for entry in &scan.entries {
                    println!("{:>5}  {}", entry.version, entry.name);
                }
            }
            Ok(0)
        }

        Commands::Parse { path } => {
            let file = SceneFile::from_path(&path)?;
            if cli.json {
                print_json(&file)?;
            } else {
                println!("Directory:  {}", file.directory().display());
                println!("Descriptor: {}", file.descriptor());
                println!("Version:    {}", file.version());
                println!("Extension:  {}", file.extension());
            }
            Ok(0)
        }
    }
}

/// Layer config, the open scene and flags into one `SceneFile`.
fn resolve_scene(config: &Config, args: &SceneArgs) -> Result<SceneFile> {
    let mut file = SceneFile::new(
        PathBuf::new(),
        config.descriptor.clone(),
        config.version,
        config.extension.clone(),
    )
    .context("invalid config")?;

    file.prefill_from(&OpenScene::new(args.scene.clone()));

    if let Some(dir) = &args.dir {
        file.set_directory(dir);
    }
    if let Some(descriptor) = &args.descriptor {
        file.set_descriptor(descriptor.as_str())?;
    }
    if let Some(version) = args.version {
        file.set_version(version)?;
    }
    if let Some(ext) = &args.ext {
        file.set_extension(ext.as_str())?;
    }
    Ok(file)
}

fn open_store(config: &Config, args: &SceneArgs, directory: &Path, dry_run: bool) -> Result<Box<dyn FileStore>> {
    if dry_run {
        return Ok(Box::new(dry_run_store(directory)?));
    }
    let source = match &args.scene {
        Some(path) => SceneSource::CopyFrom(path.clone()),
        None => SceneSource::Empty,
    };
    Ok(Box::new(LocalFileStore::new(source).create_new(config.exclusive)))
}

/// Mirror the directory's current entries into memory so nothing is written.
fn dry_run_store(directory: &Path) -> Result<MemoryFileStore> {
    let mut store = MemoryFileStore::new();
    if directory.is_dir() {
        store = store.with_directory(directory);
        for name in LocalFileStore::default().list_entries(directory)? {
            store = store.with_file(directory.join(name));
        }
    }
    Ok(store)
}

fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "(dry run) "
    } else {
        ""
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
