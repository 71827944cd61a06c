mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flexcrm_core::kernel::bootstrap::Application;
use flexcrm_core::kernel::constants::DEFAULT_CONFIG_FILE;
use flexcrm_core::kernel::error::Result;
use flexcrm_core::plugin_system::BuiltinLoader;
use flexcrm_core::storage::AppConfig;
use log::{error, info};
use tracing_subscriber::EnvFilter;

/// FlexCRM: a small business-record manager with plugins
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Configuration file (JSON, YAML or TOML). Defaults to ./flexcrm.toml if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Manage clients
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PluginCommand {
    /// List discovered plugins
    List,
    /// Activate a plugin and print its view
    Show {
        /// Plugin id
        id: String,
    },
    /// Enable a plugin (persist setting)
    Enable {
        /// Plugin id
        id: String,
    },
    /// Disable a plugin (persist setting)
    Disable {
        /// Plugin id
        id: String,
    },
    /// Disable then enable a plugin
    Reload {
        /// Plugin id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// Add a client
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all clients
    List,
    /// Delete a client by id
    Delete {
        id: i64,
    },
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            Ok(AppConfig::load(DEFAULT_CONFIG_FILE)?)
        }
        None => Ok(AppConfig::default()),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (e.g. under a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Compiled-in plugins available to the builtin loader
fn builtin_plugins() -> BuiltinLoader {
    BuiltinLoader::new().with(flexcrm_tasks::PLUGIN_ID, flexcrm_tasks::factory)
}

fn run(app: &mut Application, command: Commands) -> Result<bool> {
    match command {
        Commands::Plugin { command } => match command {
            PluginCommand::List => cli::list_plugins(app),
            PluginCommand::Show { id } => cli::show_plugin(app, &id)?,
            PluginCommand::Enable { id } => cli::enable_plugin(app, &id)?,
            PluginCommand::Disable { id } => cli::disable_plugin(app, &id)?,
            PluginCommand::Reload { id } => cli::reload_plugin(app, &id)?,
        },
        Commands::Client { command } => match command {
            ClientCommand::Add {
                name,
                email,
                phone,
                company,
                notes,
            } => cli::add_client(
                app,
                cli::NewClient {
                    name,
                    email,
                    phone,
                    company,
                    notes,
                },
            )?,
            ClientCommand::List => cli::list_clients(app)?,
            ClientCommand::Delete { id } => return cli::delete_client(app, id),
        },
    }
    Ok(true)
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);

    let mut app = match Application::with_builtins(config, builtin_plugins()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize application: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = app.plugin_manager_mut().discover() {
        error!("Plugin discovery failed: {}", e);
    }

    let outcome = run(&mut app, args.command);

    info!("Shutting down application...");
    if let Err(e) = app.shutdown() {
        eprintln!("Shutdown error: {}", e);
    }

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
