/*!
 * Cosmos Presence CLI
 *
 * `run` hosts the presence session in the foreground; the other commands
 * edit the settings and discovery documents the session reads.
 */

use clap::{Parser, Subcommand, ValueEnum};
use cosmos_presence::{
    autolaunch,
    cli_style::{
        self, catalog_table, print_error, print_info, print_success, section_header,
        settings_table, stats_table,
    },
    config::LogLevel,
    discovery::DISCOVERY_FILE,
    error::{PresenceError, Result, EXIT_SUCCESS},
    logging, session, DiscoveryTracker, PresenceConfig, SessionDeps, SessionEvent,
    SettingsStore, CATALOG,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "cosmos-presence")]
#[command(version, about = "Astronomy rich presence for Discord", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Log to this file as JSON instead of stdout
    #[arg(long = "log", value_name = "PATH", global = true)]
    log: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the presence session until interrupted (SIGHUP restarts it)
    Run,

    /// Store the Discord application client ID
    SetClientId {
        client_id: String,
    },

    /// Store the two link buttons
    SetLinks {
        steam_label: String,
        steam_url: String,
        site_label: String,
        site_url: String,
    },

    /// Show settings and rotation progress
    Show,

    /// List the catalog
    Catalog,

    /// Forget which objects were already shown
    ResetDiscoveries,

    /// Launch at login
    AutoLaunch {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            print_error(&e.to_string(), hint(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn hint(error: &PresenceError) -> Option<&'static str> {
    match error {
        PresenceError::Config(_) => Some("check the file passed with --config"),
        PresenceError::Unsupported(_) => Some("add the binary to your login items manually"),
        _ => None,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PresenceConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.log.is_some() {
        config.log_file = cli.log.clone();
    }
    config.verbose |= cli.verbose;

    if matches!(cli.command, Commands::Run) {
        if let Err(e) = logging::init_logging(&config) {
            cli_style::print_warning(&format!("Failed to initialize logging: {}", e));
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(handle_command(cli.command, config))
}

async fn handle_command(command: Commands, config: PresenceConfig) -> Result<()> {
    let settings = SettingsStore::new(&config.data_dir);
    let discovery_path = config.data_dir.join(DISCOVERY_FILE);

    match command {
        Commands::Run => run_session(config).await,
        Commands::SetClientId { client_id } => {
            settings.write_client_id(&client_id).await?;
            print_success(&format!(
                "Client ID saved to {}",
                settings.client_config_path().display()
            ));
            Ok(())
        }
        Commands::SetLinks {
            steam_label,
            steam_url,
            site_label,
            site_url,
        } => {
            settings
                .write_links(&steam_label, &steam_url, &site_label, &site_url)
                .await?;
            print_success(&format!(
                "Links saved to {}",
                settings.links_config_path().display()
            ));
            Ok(())
        }
        Commands::Show => {
            let credentials = settings.read_credentials().await;
            let tracker = DiscoveryTracker::load(&discovery_path).await;

            section_header("Settings");
            println!("{}", settings_table(&credentials));

            section_header("Rotation");
            let auto_launch = match autolaunch::is_auto_launch_enabled() {
                Ok(true) => "on".to_string(),
                Ok(false) => "off".to_string(),
                Err(_) => "unsupported".to_string(),
            };
            println!(
                "{}",
                stats_table(&[
                    ("Data directory", config.data_dir.display().to_string()),
                    ("Explored", format!("{} / {}", tracker.len(), CATALOG.len())),
                    ("Host process", config.process_name.clone()),
                    ("Launch at login", auto_launch),
                ])
            );

            let missing = credentials.missing_fields();
            if !missing.is_empty() {
                cli_style::print_warning(&format!(
                    "The session will report NO_CLIENT_ID until these are set: {}",
                    missing.join(", ")
                ));
            }
            Ok(())
        }
        Commands::Catalog => {
            let tracker = DiscoveryTracker::load(&discovery_path).await;
            println!("{}", catalog_table(&CATALOG, |name| tracker.contains(name)));
            Ok(())
        }
        Commands::ResetDiscoveries => {
            let mut tracker = DiscoveryTracker::load(&discovery_path).await;
            tracker.clear().await?;
            print_success("Discovery progress cleared");
            Ok(())
        }
        Commands::AutoLaunch { state } => {
            let enabled = state == Toggle::On;
            autolaunch::set_auto_launch(enabled)?;
            print_success(if enabled {
                "Launch at login enabled"
            } else {
                "Launch at login disabled"
            });
            Ok(())
        }
    }
}

async fn run_session(config: PresenceConfig) -> Result<()> {
    cli_style::print_banner();
    print_info(&format!(
        "Watching for {}; press Ctrl-C to stop",
        config.process_name
    ));

    let deps = SessionDeps::new(&config);
    let (handle, mut events, task) = session::spawn(config, deps);
    let mut hangup = Hangup::new()?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Status(status)) => cli_style::print_status(status),
                Some(SessionEvent::Payload(payload)) => cli_style::print_payload(&payload),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping presence session");
                handle.shutdown().await?;
                break;
            }
            _ = hangup.recv() => {
                info!("Hangup received, restarting presence session");
                handle.restart()?;
            }
        }
    }

    if let Err(e) = task.await {
        return Err(PresenceError::Ipc(format!("session task failed: {}", e)));
    }
    Ok(())
}

/// SIGHUP on Unix; never fires elsewhere
struct Hangup {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Hangup {
    #[cfg(unix)]
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            signal: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    fn new() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        if self.signal.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}
