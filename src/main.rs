//! Hearth Context CLI
//!
//! Ambient context and ranked context feed for a smart-home assistant.

use clap::{Parser, Subcommand};
use hearth_context::{
    ambient::ContextManager,
    config::{Config, SourceSelection},
    core::TopContextGetter,
    sources::{get_context_snapshot, PlatformSignals},
    store::{Dataset, MemoryStore},
    VERSION,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hearth-context")]
#[command(version = VERSION)]
#[command(about = "Ambient context and ranked context feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the highest-ranked recent context items
    Top {
        /// Maximum number of items (defaults to the configured limit)
        #[arg(long, short)]
        limit: Option<usize>,

        /// Types to rank (browser, communication, insight, learning, device, or all)
        #[arg(long, default_value = "all")]
        types: String,
    },

    /// Show the ambient context
    Status {
        /// Apply a mood before printing (calm, focused, tired, stressed, happy, neutral)
        #[arg(long)]
        mood: Option<String>,
    },

    /// Read calendar, power and network signals
    Snapshot,

    /// Serve the context feed over HTTP (requires server feature)
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a sample dataset to the configured dataset path
    Seed {
        /// Overwrite an existing dataset
        #[arg(long)]
        force: bool,
    },

    /// Show configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing config file (with --init)
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Top { limit, types } => {
            cmd_top(limit, &types).await;
        }
        Commands::Status { mood } => {
            cmd_status(mood.as_deref());
        }
        Commands::Snapshot => {
            cmd_snapshot().await;
        }
        Commands::Serve { port } => {
            cmd_serve(port).await;
        }
        Commands::Seed { force } => {
            cmd_seed(force);
        }
        Commands::Config { init, force } => {
            if init {
                cmd_config_init(force);
            } else {
                cmd_config();
            }
        }
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: {e}, using default configuration");
        Config::default()
    })
}

fn build_ranker(config: &Config, store: MemoryStore) -> TopContextGetter {
    match TopContextGetter::from_config(Arc::new(store), &config.ranking) {
        Ok(tcg) => tcg,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_store(config: &Config) -> MemoryStore {
    match MemoryStore::load_json(&config.dataset_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error loading dataset {:?}: {e}", config.dataset_path);
            std::process::exit(1);
        }
    }
}

async fn cmd_top(limit: Option<usize>, types: &str) {
    let config = load_config();

    let selection = match SourceSelection::from_csv(types) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let store = load_store(&config);
    if store.is_empty() {
        println!("No records in {:?}", config.dataset_path);
        println!("Run 'hearth-context seed' to write a sample dataset.");
        return;
    }

    let tcg = build_ranker(&config, store);
    let limit = limit.unwrap_or(tcg.default_limit());

    let ranked = match tcg.rank(limit, &selection.types).await {
        Ok(ranked) => ranked,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if ranked.items.is_empty() {
        println!("No context items.");
    }
    for (rank, item) in ranked.items.iter().enumerate() {
        println!(
            "{:>3}. {:>6.3}  {:<13} {}  {}",
            rank + 1,
            item.score,
            item.item_type,
            item.timestamp.format("%Y-%m-%d %H:%M"),
            item.title
        );
    }

    if !ranked.degraded.is_empty() {
        let names: Vec<String> = ranked.degraded.iter().map(|t| t.to_string()).collect();
        eprintln!();
        eprintln!("Warning: left out unavailable sources: {}", names.join(", "));
    }
}

fn cmd_status(mood: Option<&str>) {
    let config = load_config();
    let manager = ContextManager::new(&config);

    let state = match mood {
        Some(m) => match manager.set_mood_str(m) {
            Ok(state) => state,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => manager.status(),
    };

    println!("Ambient Context");
    println!("===============");
    println!();
    println!("  Time:     {}", state.time_iso);
    println!(
        "  Local:    {}",
        manager.local_time().format("%Y-%m-%d %H:%M:%S %Z")
    );
    println!("  Timezone: {}", state.timezone);
    println!("  Host:     {}", state.hostname);
    println!(
        "  Focused:  {}",
        state.focused_app.as_deref().unwrap_or("-")
    );
    println!("  Mood:     {}", state.mood);
}

async fn cmd_snapshot() {
    let config = load_config();
    let signals = PlatformSignals::default();
    let snapshot = get_context_snapshot(&signals, &config.signals).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(feature = "server")]
async fn cmd_serve(port: Option<u16>) {
    use hearth_context::ambient::create_shared_manager;
    use hearth_context::server::{run, ServerConfig};

    let config = load_config();
    let manager = create_shared_manager(&config);
    let ranker = Arc::new(build_ranker(&config, load_store(&config)));

    let server_config = ServerConfig::new(port.unwrap_or(config.server_port), manager, ranker)
        .with_signals(Arc::new(PlatformSignals::default()), config.signals.clone());

    let (addr, shutdown_tx) = match run(server_config).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Hearth Context v{VERSION} listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for Ctrl+C: {e}");
    }
    let _ = shutdown_tx.send(());
}

#[cfg(not(feature = "server"))]
async fn cmd_serve(_port: Option<u16>) {
    eprintln!("Error: serve requires the server feature (rebuild with --features server)");
    std::process::exit(1);
}

fn cmd_seed(force: bool) {
    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    if config.dataset_path.exists() && !force {
        eprintln!(
            "Dataset already exists at {:?} (use --force to overwrite)",
            config.dataset_path
        );
        std::process::exit(1);
    }

    let store = MemoryStore::from_dataset(Dataset::sample(chrono::Utc::now()));
    match store.save_json(&config.dataset_path) {
        Ok(()) => println!(
            "Wrote {} sample records to {:?}",
            store.len(),
            config.dataset_path
        ),
        Err(e) => {
            eprintln!("Error writing dataset: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_config_init(force: bool) {
    let path = Config::config_path();
    if path.exists() && !force {
        eprintln!(
            "Config already exists at {:?} (use --force to overwrite)",
            path
        );
        std::process::exit(1);
    }

    match Config::default().save() {
        Ok(path) => println!("Wrote default configuration to {:?}", path),
        Err(e) => {
            eprintln!("Error writing configuration: {e}");
            std::process::exit(1);
        }
    }
}
