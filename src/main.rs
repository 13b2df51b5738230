use anyhow::{bail, Context, Result};
use parley::session::{TurnController, TurnEvent};
use parley::{CaptureKind, SessionConfig};
use std::path::PathBuf;
use std::thread;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn parse_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(config_path)
}

fn load_config(path: Option<PathBuf>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = SessionConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    Ok(config)
}

/// Print notifications as they arrive
fn spawn_printer(controller: &TurnController, patient: String) -> thread::JoinHandle<()> {
    let events = controller.events();
    thread::spawn(move || {
        for event in events.iter() {
            match event {
                TurnEvent::TurnStarted { utterance } => println!("[You] {}", utterance),
                TurnEvent::TurnIgnored => println!("(still waiting for {})", patient),
                TurnEvent::ReplyRevealed { reply } => println!("[{}] {}", patient, reply),
                TurnEvent::SpeakingStarted => println!("({} is speaking)", patient),
                TurnEvent::SpeechFailed { .. } => println!("(audio unavailable)"),
                TurnEvent::Interim(text) => println!("... {}", text),
                TurnEvent::Error(message) => println!("! {}", message),
                _ => {}
            }
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(parse_args()?)?;
    let patient = config.patient.name.clone();
    info!("Starting Parley session with {}", patient);

    let controller = TurnController::builder().config(config).build()?;
    let _printer = spawn_printer(&controller, patient);

    println!("Type to talk. /strategy <tap|toggle|hold>, /listen, /stop, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/listen", _) => controller.start_capture().await,
            ("/stop", _) => controller.stop_capture().await,
            ("/strategy", kind) => match kind.parse::<CaptureKind>() {
                Ok(kind) => controller.select_capture_strategy(kind).await?,
                Err(e) => println!("! {}", e),
            },
            _ => {
                controller.submit_text(line).await;
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}
