//! Dialer binary — a line-driven shell over the call flow.
//!
//! Starts the session store with persisted preferences, plugs the null
//! voice backends in (this host has no speech APIs), and drives the
//! screen controller from stdin commands with graceful shutdown on
//! SIGTERM/SIGINT.

use dialer_app::controller::{format_duration, ScreenController};
use dialer_app::load_config;
use dialer_client::ApiClient;
use dialer_session::{CallSessionStore, PreferenceStore};
use dialer_types::{ExportFormat, PreferencesPatch};
use dialer_voice::{
    AudioLevelSampler, NullCaptureGraph, NullRecognition, NullSynthesis, RecognizerEvent,
    SpeechRecognizer, SpeechSynthesizer,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("DIALER_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = load_config(selected_config_path)
        .expect("failed to load configuration — the app cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize the preference cache and session store
    let prefs = PreferenceStore::open(&config.preferences.path)
        .expect("failed to open preference cache — check preferences.path in config");
    let store = CallSessionStore::with_preferences(prefs);

    let api = ApiClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_seconds),
    )
    .expect("failed to build API client — check api.base_url in config");

    let mut controller = ScreenController::new(
        store,
        api,
        SpeechRecognizer::new(NullRecognition),
        SpeechSynthesizer::new(NullSynthesis::default()),
        AudioLevelSampler::new(NullCaptureGraph),
    );

    tracing::info!(api = %config.api.base_url, "dialer started, type `help` for commands");

    run(&mut controller).await;

    tracing::info!("dialer shut down");
}

/// Drives the controller from stdin until EOF, `quit`, or a shutdown
/// signal. Finalized recognizer transcripts feed the same path as typed
/// messages.
async fn run<R, S, C>(controller: &mut ScreenController<R, S, C>)
where
    R: dialer_voice::RecognitionBackend + 'static,
    S: dialer_voice::SynthesisBackend + 'static,
    C: dialer_voice::CaptureGraphBackend,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events = controller.recognizer_events();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = events.recv() => {
                if let Ok(RecognizerEvent::Transcript(chunk)) = event {
                    if chunk.is_final {
                        controller.handle_user_message(&chunk.final_text).await;
                    }
                }
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if !handle_command(controller, line.trim()).await {
                    break;
                }
            }
        }
    }
}

/// Executes one shell command. Returns `false` to quit.
async fn handle_command<R, S, C>(controller: &mut ScreenController<R, S, C>, line: &str) -> bool
where
    R: dialer_voice::RecognitionBackend + 'static,
    S: dialer_voice::SynthesisBackend + 'static,
    C: dialer_voice::CaptureGraphBackend,
{
    let (command, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" => {
            println!("commands:");
            println!("  continue            leave the welcome screen");
            println!("  call <request>      route and start a call");
            println!("  say <text>          send a message to the agent");
            println!("  end                 end the current call");
            println!("  mute | voice        toggle mute / voice mode");
            println!("  transcript          toggle the transcript panel");
            println!("  personality <tag>   set the agent personality");
            println!("  name <value>        set your display name");
            println!("  export <txt|json|md> export the transcript");
            println!("  state               print the session state");
            println!("  quit                exit");
        }
        "continue" => controller.continue_from_welcome(),
        "call" => controller.submit_request(rest).await,
        "say" => controller.handle_user_message(rest).await,
        "end" => controller.end_call(),
        "mute" => controller.toggle_mute(),
        "voice" => controller.toggle_voice_mode(),
        "transcript" => controller.toggle_transcript(),
        "personality" => controller.set_personality(rest),
        "name" => controller.update_preferences(PreferencesPatch {
            name: Some(rest.to_string()),
            ..Default::default()
        }),
        "export" => match rest.parse::<ExportFormat>() {
            Ok(format) => match controller.export_transcript(format).await {
                Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
                Err(e) => eprintln!("export failed: {e}"),
            },
            Err(e) => eprintln!("{e}"),
        },
        "state" => {
            let session = controller.session();
            println!(
                "screen={:?} state={} duration={} turns={}",
                controller.screen(),
                session.call_state,
                format_duration(session.call_duration_secs),
                session.conversation.len()
            );
            if let Some(agent) = controller.agent() {
                println!(
                    "agent={} ({}, {})",
                    agent.agent.name, agent.agent.title, agent.agent.department
                );
            }
        }
        "quit" | "exit" => return false,
        other => eprintln!("unknown command: {other} (try `help`)"),
    }
    true
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
