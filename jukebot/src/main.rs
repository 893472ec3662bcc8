//! Jukebot - Main entry point
//!
//! Runs one playback session against the in-process simulated voice host.
//! Chat lines are read from stdin:
//! - `<prefix><command> args...` runs a command (e.g. `?play never gonna`)
//! - `react <emoji>` presses a status-message reaction
//! - `status` prints the status message
//! - `quit` (or end of input) leaves and exits

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jukebot::command::dispatcher::Dispatcher;
use jukebot::command::help::HelpCommand;
use jukebot::command::music::{PlayCommand, SkipCommand, StopCommand, VolumeCommand};
use jukebot::command::output::CommandOutput;
use jukebot::command::sound::SoundCommand;
use jukebot::command::text::{ClearOutputCommand, PingCommand, VoiceChannelCommand};
use jukebot::command::{Command, FixedVoiceDirectory, QueuedSubmitter, User, VoiceDirectory};
use jukebot::config::BotConfig;
use jukebot::host::simulated::{SimulatedHost, SimulatedStreamProvider};
use jukebot::host::Destination;
use jukebot::playback::{FifoQueue, PlaybackSession, QueueDiscipline, RepeatOne};
use jukebot::resolver::CatalogResolver;
use jukebot::status::{render_status, ReactionControls};
use jukebot_common::config::ConfigResolver;
use jukebot_common::events::SessionEvent;

/// Command-line arguments for jukebot
#[derive(Parser, Debug)]
#[command(name = "jukebot")]
#[command(about = "Chat music bot voice playback session (simulated host)")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "JUKEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Id of the voice destination the user is in
    #[arg(long, default_value = "1", env = "JUKEBOT_CHANNEL_ID")]
    channel_id: String,

    /// Name of the voice destination the user is in
    #[arg(long, default_value = "Music")]
    channel_name: String,

    /// Tag of the user typing on stdin
    #[arg(short, long, default_value = "listener#0001")]
    user: String,

    /// Playback speed factor for simulated streams (0.1 plays 10x faster)
    #[arg(long, default_value_t = 1.0, value_parser = parse_time_scale)]
    time_scale: f64,

    /// Repeat the current track instead of advancing
    #[arg(long)]
    repeat: bool,

    /// Log every session event as JSON
    #[arg(long)]
    events_json: bool,
}

/// Finite, non-negative speed factor
fn parse_time_scale(value: &str) -> std::result::Result<f64, String> {
    let scale: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !scale.is_finite() || scale < 0.0 {
        return Err(format!("time scale must be a finite number >= 0 (got {})", value));
    }
    Ok(scale)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Configuration decides the default log level, so load it first
    let config_path = ConfigResolver::new("jukebot").resolve(args.config.as_deref());
    let config = BotConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "jukebot={level},jukebot_common={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }
    info!(
        "Starting jukebot (prefix '{}', {} catalog entries)",
        config.command_prefix,
        config.catalog.len()
    );

    let catalog = Arc::new(CatalogResolver::new(
        config.catalog.clone(),
        config.playlists.clone(),
    ));
    let discipline: Box<dyn QueueDiscipline> = if args.repeat {
        Box::new(RepeatOne)
    } else {
        Box::new(FifoQueue)
    };
    let session = PlaybackSession::spawn(
        Arc::new(SimulatedHost),
        Arc::new(SimulatedStreamProvider::new(Arc::clone(&catalog), args.time_scale)),
        discipline,
        config.session_config(),
    );

    let output = Arc::new(CommandOutput::new(config.commands.output_lines));
    let failure_output = Arc::clone(&output);
    session.on_event(move |event| {
        if let SessionEvent::TrackFailed { track, reason, .. } = event {
            failure_output.push(format!("couldn't play {}: {}", track.display_name(), reason));
        }
    });

    info!(session_id = %session.id(), discipline = session.discipline(), "Session ready");

    let dispatcher = build_dispatcher(&config, &session, catalog, &args, Arc::clone(&output));
    let controls = ReactionControls::new(config.commands.volume_step);
    let user = User::new(args.user.clone(), args.user.clone());

    tokio::spawn(print_status_on_change(session.clone(), Arc::clone(&output), args.events_json));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let line = line.trim();
                if line == "quit" {
                    break;
                }
                if line == "status" {
                    println!("{}\n", render_status(&session.view().await, &output.lines()).await);
                } else if let Some(emoji) = line.strip_prefix("react ") {
                    match controls.request_for(emoji.trim(), user.clone(), &session.view().await) {
                        Some(request) => dispatcher.handle_command(request).await,
                        None => warn!("Reaction {} does nothing right now", emoji.trim()),
                    }
                } else {
                    dispatcher.handle_message(user.clone(), line).await;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    session
        .shutdown()
        .await
        .context("Failed to shut down playback session")?;
    info!("Shutdown complete");
    Ok(())
}

fn build_dispatcher(
    config: &BotConfig,
    session: &PlaybackSession,
    catalog: Arc<CatalogResolver>,
    args: &Args,
    output: Arc<CommandOutput>,
) -> Dispatcher {
    let (submitter, pending) = QueuedSubmitter::channel();
    let voice: Arc<dyn VoiceDirectory> = Arc::new(FixedVoiceDirectory::new(Some(Destination::new(
        args.channel_id.clone(),
        args.channel_name.clone(),
    ))));

    let mut commands: Vec<Arc<dyn Command>> = vec![
        Arc::new(PlayCommand::new(session.clone(), catalog, Arc::clone(&voice))),
        Arc::new(SkipCommand::new(session.clone())),
        Arc::new(StopCommand::new(session.clone())),
        Arc::new(VolumeCommand::new(session.clone())),
        Arc::new(PingCommand),
        Arc::new(VoiceChannelCommand::new(voice)),
        Arc::new(ClearOutputCommand::new(
            Arc::clone(&output),
            config.commands.owner_id.clone(),
        )),
    ];
    if !config.sounds.is_empty() {
        commands.push(Arc::new(SoundCommand::new(
            config.sounds.clone(),
            Arc::new(submitter),
        )));
    }
    let help = HelpCommand::new(&config.command_prefix, &commands);
    commands.push(Arc::new(help));

    Dispatcher::new(
        config.command_prefix.clone(),
        commands,
        output,
        pending,
        &config.commands,
    )
}

/// Re-print the status whenever the session or the command output changes
async fn print_status_on_change(session: PlaybackSession, output: Arc<CommandOutput>, events_json: bool) {
    let mut events = session.subscribe();
    let mut output_changes = output.watch();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if events_json {
                        match serde_json::to_string(&event) {
                            Ok(json) => info!(target: "jukebot::events", "{}", json),
                            Err(e) => warn!("Failed to serialize event: {}", e),
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Status printer lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            changed = output_changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        println!("{}\n", render_status(&session.view().await, &output.lines()).await);
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
