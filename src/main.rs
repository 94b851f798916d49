use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use confreg::{
    ConfigurationRegistry, Context, HostManifest, JsonFileStore, ModuleCatalog,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration registry for extension-contributed modules
///
/// Resolves the configuration modules of the extensions listed in a host
/// manifest and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "confreg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host manifest listing the installed extensions
    #[arg(long)]
    host: PathBuf,

    /// Settings store file
    ///
    /// Defaults to settings.json in the user's data directory
    #[arg(long)]
    store: Option<PathBuf>,

    /// Namespace root the module settings are stored under
    #[arg(long)]
    namespace: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolved configuration modules of all enabled extensions
    Configs {
        /// Skip the file override layer
        #[arg(long)]
        settings_only: bool,
    },
    /// A single resolved configuration module
    Get {
        key: String,
        #[arg(long)]
        settings_only: bool,
    },
    /// Navigation items of the enabled modules
    Nav,
    /// Settings pages, control panel first
    SettingsPages,
    /// Modules known to the catalogue
    Modules,
    /// Run install migrations and seed default settings for an extension
    Install { handle: String },
    /// Run uninstall migrations for an extension's unshared modules
    Uninstall { handle: String },
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

fn resolve_store_path(provided: Option<PathBuf>) -> Result<PathBuf> {
    match provided {
        Some(path) => Ok(path),
        None => Ok(JsonFileStore::default_path()?),
    }
}

fn context_for(settings_only: bool) -> Context {
    if settings_only {
        Context::SettingsOnly
    } else {
        Context::Full
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, args.log_file)?;

    info!("Starting confreg v{}", env!("CARGO_PKG_VERSION"));

    let manifest = HostManifest::load(&args.host)
        .with_context(|| format!("Failed to load host manifest {}", args.host.display()))?;

    let catalog = ModuleCatalog::new()?.with_modules(manifest.modules.clone());
    let host = catalog.build_host(&manifest)?;
    info!("Host has {} extensions", manifest.extensions.len());

    let store_path = resolve_store_path(args.store)?;
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("Failed to open settings store {}", store_path.display()))?;
    info!("Settings store: {}", store_path.display());

    let overrides = ModuleCatalog::load_file_overrides()?;

    let mut registry =
        ConfigurationRegistry::new(Arc::new(host), Arc::new(store)).with_overrides(overrides);
    if let Some(namespace) = args.namespace {
        registry = registry.with_namespace(namespace);
    }

    match args.command {
        Command::Configs { settings_only } => {
            let configs = registry.configs(context_for(settings_only))?;
            print_json(configs.as_ref())?;
        }
        Command::Get { key, settings_only } => {
            let config = registry.config_by_key(&key, context_for(settings_only))?;
            print_json(&config)?;
        }
        Command::Nav => print_json(&registry.build_navigation_items()?)?,
        Command::SettingsPages => print_json(&registry.build_settings_page_list()?)?,
        Command::Modules => print_json(&catalog.list())?,
        Command::Install { handle } => print_json(&registry.install_extension(&handle)?)?,
        Command::Uninstall { handle } => print_json(&registry.uninstall_extension(&handle)?)?,
    }

    Ok(())
}
