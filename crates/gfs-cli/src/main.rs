use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gfs")]
#[command(about = "Geofence status detection CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a CSV of vehicle fixes through the engine for one order
    Replay {
        /// Order context YAML (order_id, pickup, delivery, optional tier/overrides)
        #[arg(long)]
        order: String,

        /// CSV with header `latitude,longitude,timestamp` (RFC 3339 timestamps)
        #[arg(long)]
        samples: String,

        /// Layered config paths in merge order. Falls back to $GFS_CONFIG.
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Print the order's final geofence state after the last sample
        #[arg(long, default_value_t = false)]
        final_state: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> customer...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Dev-time bootstrap; a missing file is fine.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Replay {
            order,
            samples,
            config_paths,
            final_state,
        } => {
            let args = commands::replay::ReplayArgs {
                order_path: order,
                samples_path: samples,
                config_paths,
                final_state,
            };
            let mut out = std::io::stdout().lock();
            commands::replay::run(&args, &mut out)?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = gfs_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable JSON lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
