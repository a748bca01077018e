//! zfscmd - typed host-side control layer over the zfs command-line tool.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zfscmd::dataset::{
    self, CreateOptions, DatasetKind, DestroyOptions, FindOptions, ReceiveOptions, SendOptions,
    Snapshot, SnapshotOptions,
};
use zfscmd::exec::ZfsError;

/// Error type for CLI execution.
#[derive(thiserror::Error, Debug)]
enum CliError {
    /// Error reported by the zfs layer.
    #[error(transparent)]
    Zfs(#[from] ZfsError),
    /// Invalid command-line argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O error while copying a stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(
    name = "zfscmd",
    about = "Typed host-side control layer over the zfs command-line tool",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List datasets.
    List {
        /// Dataset path to list under; defaults to every pool root.
        path: Option<String>,
        /// Limit recursion depth; omit for a fully recursive listing.
        #[arg(short, long)]
        depth: Option<u32>,
        /// Restrict to dataset kinds (filesystem, volume, snapshot).
        #[arg(short = 't', long, value_delimiter = ',')]
        types: Vec<String>,
        /// Emit JSON instead of plain names.
        #[arg(long)]
        json: bool,
    },
    /// Create a filesystem.
    Create {
        /// Dataset path to create.
        name: String,
        /// Create missing parent filesystems.
        #[arg(short, long)]
        parents: bool,
        /// Properties to set, as prop=value.
        #[arg(short = 'o', long = "option")]
        props: Vec<String>,
    },
    /// Destroy a dataset.
    Destroy {
        /// Dataset path to destroy.
        name: String,
        /// Defer destruction of a held snapshot.
        #[arg(long)]
        defer: bool,
        /// Force unmount and destroy dependents.
        #[arg(short, long)]
        force: bool,
    },
    /// Snapshot a dataset.
    Snapshot {
        /// Dataset path to snapshot.
        dataset: String,
        /// Snapshot name (the part after the @).
        snapname: String,
        /// Snapshot all descendants too.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Read properties of a dataset.
    Get {
        /// Property name, or "all".
        property: String,
        /// Dataset path.
        dataset: String,
        /// Emit JSON instead of tab-separated rows.
        #[arg(long)]
        json: bool,
    },
    /// Set a property on a dataset.
    Set {
        /// Assignment, as prop=value.
        assignment: String,
        /// Dataset path.
        dataset: String,
    },
    /// Reset a property to its inherited value.
    Inherit {
        /// Property name.
        property: String,
        /// Dataset path.
        dataset: String,
        /// Apply to all descendants too.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Place a hold tag on a snapshot.
    Hold {
        /// Hold tag.
        tag: String,
        /// Snapshot path.
        snapshot: String,
        /// Hold on all descendant snapshots too.
        #[arg(short, long)]
        recursive: bool,
    },
    /// List the hold tags on a snapshot.
    Holds {
        /// Snapshot path.
        snapshot: String,
        /// Emit JSON instead of one tag per line.
        #[arg(long)]
        json: bool,
    },
    /// Release a hold tag from a snapshot.
    Release {
        /// Hold tag.
        tag: String,
        /// Snapshot path.
        snapshot: String,
        /// Release from all descendant snapshots too.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Stream a snapshot to stdout.
    Send {
        /// Snapshot path.
        snapshot: String,
        /// Send an incremental stream from this base snapshot.
        #[arg(short = 'i', long)]
        base: Option<String>,
        /// Include intermediate snapshots in the incremental stream.
        #[arg(short = 'I', long)]
        intermediates: bool,
        /// Send a replication stream.
        #[arg(short = 'R', long)]
        replicate: bool,
    },
    /// Receive a stream from stdin.
    Recv {
        /// Target dataset path.
        name: String,
        /// Roll back the target to the most recent snapshot first.
        #[arg(short = 'F', long)]
        force: bool,
        /// Do not mount the received filesystem.
        #[arg(short = 'u', long)]
        nomount: bool,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str), CliError> {
    assignment
        .split_once('=')
        .ok_or_else(|| CliError::InvalidArg(format!("expected prop=value: '{assignment}'")))
}

fn parse_types(types: &[String]) -> Result<Vec<DatasetKind>, CliError> {
    types
        .iter()
        .filter(|t| t.as_str() != "all")
        .map(|t| match t.as_str() {
            "filesystem" => Ok(DatasetKind::Filesystem),
            "volume" => Ok(DatasetKind::Volume),
            "snapshot" => Ok(DatasetKind::Snapshot),
            other => Err(CliError::InvalidArg(format!(
                "unknown dataset type '{other}'"
            ))),
        })
        .collect()
}

async fn execute(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List {
            path,
            depth,
            types,
            json,
        } => {
            let mut options = FindOptions::default().types(&parse_types(&types)?);
            if let Some(depth) = depth {
                options = options.depth(depth);
            }
            let paths: Vec<&str> = path.as_deref().into_iter().collect();
            let datasets = dataset::find(&paths, &options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&datasets)?);
            } else {
                for d in &datasets {
                    println!("{}\t{}", d.name(), d.kind().as_str());
                }
            }
        }
        Commands::Create {
            name,
            parents,
            props,
        } => {
            let mut options = CreateOptions::default();
            if parents {
                options = options.parents();
            }
            for assignment in &props {
                let (prop, value) = parse_assignment(assignment)?;
                options = options.prop(prop, value);
            }
            dataset::create(&name, &options).await?;
        }
        Commands::Destroy { name, defer, force } => {
            let mut options = DestroyOptions::default();
            if defer {
                options = options.defer();
            }
            if force {
                options = options.force();
            }
            dataset::open(&name).await?.destroy(&options).await?;
        }
        Commands::Snapshot {
            dataset: name,
            snapname,
            recursive,
        } => {
            let mut options = SnapshotOptions::default();
            if recursive {
                options = options.recursive();
            }
            dataset::open(&name)
                .await?
                .snapshot(&snapname, &options)
                .await?;
        }
        Commands::Get {
            property,
            dataset: name,
            json,
        } => {
            let dataset = dataset::open(&name).await?;
            let props = if property == "all" {
                dataset.props().await?
            } else {
                vec![dataset.prop(&property).await?]
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&props)?);
            } else {
                for p in &props {
                    println!("{}\t{}\t{}\t{}", p.dataset, p.name, p.value, p.source);
                }
            }
        }
        Commands::Set {
            assignment,
            dataset: name,
        } => {
            let (prop, value) = parse_assignment(&assignment)?;
            dataset::open(&name).await?.set_prop(prop, value).await?;
        }
        Commands::Inherit {
            property,
            dataset: name,
            recursive,
        } => {
            dataset::open(&name)
                .await?
                .inherit_prop(&property, recursive)
                .await?;
        }
        Commands::Hold {
            tag,
            snapshot,
            recursive,
        } => {
            Snapshot::new(snapshot)
                .hold(&tag, recursive)
                .await?;
        }
        Commands::Holds { snapshot, json } => {
            let tags = Snapshot::new(snapshot).holds().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for tag in &tags {
                    println!("{tag}");
                }
            }
        }
        Commands::Release {
            tag,
            snapshot,
            recursive,
        } => {
            Snapshot::new(snapshot)
                .release(&tag, recursive)
                .await?;
        }
        Commands::Send {
            snapshot,
            base,
            intermediates,
            replicate,
        } => {
            let mut options = SendOptions::default();
            if let Some(base) = base {
                options = options.base(base);
            }
            if intermediates {
                options = options.intermediates();
            }
            if replicate {
                options = options.replicate();
            }
            let mut stream = Snapshot::new(snapshot).send(&options)?;
            tokio::io::copy(&mut stream, &mut tokio::io::stdout()).await?;
            stream.close().await?;
        }
        Commands::Recv {
            name,
            force,
            nomount,
        } => {
            let mut options = ReceiveOptions::default();
            if force {
                options = options.force();
            }
            if nomount {
                options = options.nomount();
            }
            let mut stream = dataset::receive(&name, &options)?;
            tokio::io::copy(&mut tokio::io::stdin(), &mut stream).await?;
            stream.close().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("zfscmd: {e}");
            ExitCode::FAILURE
        }
    }
}
