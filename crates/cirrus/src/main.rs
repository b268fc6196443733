mod commands;
mod sim;
mod specfile;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(about = "Declarative cloud resource provisioning from a dependency graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision every resource in the spec file, keeping what was created
    Provision {
        /// Path to the resource spec file
        #[arg(short = 'f', long, env = "CIRRUS_SPEC_FILE", default_value = "cirrus.yaml")]
        spec_file: PathBuf,
        /// Keep partially provisioned resources even when provisioning fails
        #[arg(short, long)]
        keep: bool,
    },
    /// Run a full ephemeral session: provision, lifecycle steps, teardown
    Run {
        /// Path to the resource spec file
        #[arg(short = 'f', long, env = "CIRRUS_SPEC_FILE", default_value = "cirrus.yaml")]
        spec_file: PathBuf,
        /// Keep resources at session end instead of tearing down
        #[arg(short, long)]
        keep: bool,
    },
    /// Operate on an already-provisioned resource
    Operate {
        /// Resource id to operate on
        #[arg(short, long)]
        id: String,
        /// Operation: stop, start, restart, or resize:<capacity>
        #[arg(short, long)]
        op: String,
    },
    /// Delete every tracked resource in reverse dependency order
    Teardown {
        /// Path to the resource spec file
        #[arg(short = 'f', long, env = "CIRRUS_SPEC_FILE", default_value = "cirrus.yaml")]
        spec_file: PathBuf,
    },
    /// Show the provisioning ledger
    Status,
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("cirrus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let exit_code = match cli.command {
        Commands::Provision { spec_file, keep } => {
            commands::provision::handle(&spec_file, keep).await?
        }
        Commands::Run { spec_file, keep } => commands::run::handle(&spec_file, keep).await?,
        Commands::Operate { id, op } => commands::operate::handle(&id, &op).await?,
        Commands::Teardown { spec_file } => commands::teardown::handle(&spec_file).await?,
        Commands::Status => commands::status::handle().await?,
        Commands::Version => unreachable!(),
    };

    std::process::exit(exit_code);
}
