//! Integrations plugin - migration host.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use integrations_lib::config::PluginConfig;
use integrations_lib::{run_migrations, templates, MigrateAction};

#[derive(Parser)]
#[command(name = "integrations")]
#[command(about = "Integrations plugin schema migrations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Migrations directory (overrides INTEGRATIONS_MIGRATIONS_PATH)
    #[arg(long, global = true, env = "INTEGRATIONS_MIGRATIONS_PATH")]
    migrations_path: Option<PathBuf>,

    /// Table prefix (overrides DB_TABLE_PREFIX)
    #[arg(long, global = true, env = "DB_TABLE_PREFIX")]
    table_prefix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Generate project components
    Generate {
        #[command(subcommand)]
        component: GenerateCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run available migrations
    Up,
    /// List discovered migrations
    Status,
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Create a migration definition and module skeleton
    Migration {
        /// Migration name, e.g. AddReferenceColumn
        name: String,
        /// Where the module skeleton is written
        #[arg(long, default_value = "src/migration/migrations")]
        modules_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = PluginConfig::from_env();
    if let Some(path) = cli.migrations_path {
        config.migrations.path = path.display().to_string();
    }
    if let Some(prefix) = cli.table_prefix {
        config.database.table_prefix = prefix;
    }
    tracing::debug!(?config, "Configuration loaded");

    let result = match cli.command {
        Commands::Migrate { action } => {
            let action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Status => MigrateAction::Status,
            };
            run_migrations(action, &config).await
        }
        Commands::Generate {
            component: GenerateCommands::Migration { name, modules_dir },
        } => templates::generate_migration(&name, &config.migrations_path(), &modules_dir).map(
            |generated| {
                println!("Created: {}", generated.manifest_path.display());
                println!("Created: {}", generated.module_path.display());
                println!("Don't forget to register {} in the migrations registry!", generated.name);
            },
        ),
    };

    if let Err(e) = result {
        tracing::error!(code = e.code(), "Command failed: {}", e);
        if e.is_discovery_error() {
            tracing::info!("No transaction was opened; the database is unchanged");
        }
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
