// # dnsyncd - DNS Sync Daemon
//
// Thin integration layer: parses flags, initializes logging and the
// runtime, registers the built-in plugins and runs the engine. All
// reconciliation logic lives in dnsync-core.
//
// ## Configuration
//
// Every flag can also be set through the environment:
//
// - `--apikey` / `-k` (`GANDI_API_KEY`): Gandi LiveDNS API key (required)
// - `--interval` / `-i` (`DNSYNC_INTERVAL`): seconds between full passes
// - `--registry-url` (`PROTOS_URL`): Protos base URL
// - `--app-id` (`APPID`): Protos application id (required)
// - `--startup-delay` (`DNSYNC_STARTUP_DELAY`): seconds to wait before registering
// - `--poll-interval` (`DNSYNC_POLL_INTERVAL`): seconds between resource polls
// - `--keying` (`DNSYNC_KEYING`): `name` or `name-and-type`
// - `--dry-run` (`DNSYNC_DRY_RUN`): read from Gandi but never write
// - `--log-level` (`DNSYNC_LOG_LEVEL`): trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export GANDI_API_KEY=your_key
// export APPID=your_app_id
//
// dnsyncd --interval 300
// ```

use anyhow::{Context, Result};
use clap::Parser;
use dnsync_core::{
    DiffKeying, EngineConfig, EngineEvent, PluginRegistry, ProviderConfig, RegistryConfig,
    SyncConfig, SyncEngine,
};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DnsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keeps DNS resources of a Protos instance in sync with Gandi LiveDNS
#[derive(Parser, Debug)]
#[command(name = "dnsyncd", version, about)]
struct Args {
    /// Gandi LiveDNS API key
    #[arg(short = 'k', long = "apikey", env = "GANDI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Seconds between full reconciliation passes
    #[arg(short = 'i', long, default_value_t = 300, env = "DNSYNC_INTERVAL")]
    interval: u64,

    /// Protos base URL
    #[arg(long, default_value = "http://protos:8080", env = "PROTOS_URL")]
    registry_url: String,

    /// Protos application id
    #[arg(long, env = "APPID")]
    app_id: String,

    /// Gandi API base URL override
    #[arg(long, env = "GANDI_API_URL")]
    gandi_url: Option<String>,

    /// Seconds to wait before registering, so the container network can settle
    #[arg(long, default_value_t = 4, env = "DNSYNC_STARTUP_DELAY")]
    startup_delay: u64,

    /// Seconds between resource polls
    #[arg(long, default_value_t = 30, env = "DNSYNC_POLL_INTERVAL")]
    poll_interval: u64,

    /// Change-set keying: "name" or "name-and-type"
    #[arg(long, default_value = "name", env = "DNSYNC_KEYING")]
    keying: String,

    /// Read from Gandi but log writes instead of performing them
    #[arg(long, env = "DNSYNC_DRY_RUN")]
    dry_run: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info", env = "DNSYNC_LOG_LEVEL")]
    log_level: String,
}

impl Args {
    /// Validate ranges and formats the core does not know about
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("The Gandi API key is required. Set it via --apikey or GANDI_API_KEY");
        }

        let key_lower = self.api_key.to_lowercase();
        if key_lower.contains("your_key") || key_lower.contains("replace_me") {
            anyhow::bail!(
                "The Gandi API key appears to be a placeholder. \
                Use an actual API key from your Gandi account."
            );
        }

        if !(10..=86400).contains(&self.interval) {
            anyhow::bail!(
                "--interval must be between 10 and 86400 seconds. Got: {}",
                self.interval
            );
        }

        if self.startup_delay > 300 {
            anyhow::bail!(
                "--startup-delay must be at most 300 seconds. Got: {}",
                self.startup_delay
            );
        }

        if !(1..=3600).contains(&self.poll_interval) {
            anyhow::bail!(
                "--poll-interval must be between 1 and 3600 seconds. Got: {}",
                self.poll_interval
            );
        }

        if self.registry_url.starts_with("http://") && !self.registry_url.contains("protos") {
            eprintln!(
                "WARNING: --registry-url uses HTTP (not HTTPS) outside the Protos network. \
                This is less secure."
            );
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    /// Build the core configuration
    fn to_config(&self) -> Result<SyncConfig> {
        let diff_keying: DiffKeying = self
            .keying
            .parse()
            .with_context(|| format!("Invalid --keying '{}'", self.keying))?;

        let config = SyncConfig {
            provider: ProviderConfig::Gandi {
                api_key: self.api_key.clone(),
                api_url: self.gandi_url.clone(),
                dry_run: self.dry_run,
            },
            registry: RegistryConfig::Protos {
                endpoint: self.registry_url.clone(),
                app_id: self.app_id.clone(),
                poll_interval_secs: self.poll_interval,
            },
            engine: EngineConfig {
                interval_secs: self.interval,
                startup_delay_secs: self.startup_delay,
                diff_keying,
                ..EngineConfig::default()
            },
        };

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Log level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&args.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    info!("Starting dnsyncd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(args)).into()
}

/// Run the daemon until shutdown
async fn run_daemon(args: Args) -> DnsyncExitCode {
    let (engine, engine_rx) = match start(&args).await {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start: {:#}", e);
            return DnsyncExitCode::ConfigError;
        }
    };

    tokio::spawn(log_engine_events(engine_rx));

    match engine.run().await {
        Ok(()) => {
            info!("Shutting down daemon");
            DnsyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DnsyncExitCode::RuntimeError
        }
    }
}

/// Create the components from configuration and run the startup sequence
async fn start(args: &Args) -> Result<(SyncEngine, mpsc::Receiver<EngineEvent>)> {
    let config = args.to_config()?;

    let plugins = PluginRegistry::new();

    #[cfg(feature = "gandi")]
    {
        debug!("Registering Gandi provider");
        dnsync_provider_gandi::register(&plugins);
    }

    #[cfg(feature = "protos")]
    {
        debug!("Registering Protos registry");
        dnsync_registry_protos::register(&plugins);
    }

    info!("Provider: {}", config.provider.type_name());
    info!("Registry: {}", config.registry.type_name());

    let provider = plugins
        .create_provider(&config.provider)
        .context("Failed to create DNS provider")?;
    let registry = plugins
        .create_registry(&config.registry)
        .context("Failed to create resource registry")?;
    let events = plugins
        .create_event_source(&config.registry)
        .context("Failed to create event source")?;

    let started = SyncEngine::connect(provider, registry, events, config.engine)
        .await
        .context("Startup sequence failed")?;

    Ok(started)
}

/// Surface engine events in the log
async fn log_engine_events(mut rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::PassCompleted { applied, failed } if failed > 0 => {
                warn!(applied, failed, "Pass completed with failures");
            }
            EngineEvent::EventDropped { reason } => debug!("Event dropped: {}", reason),
            other => debug!(?other, "Engine event"),
        }
    }
}
