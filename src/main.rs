use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use duck_sentry::{
    bus,
    button::{self, ButtonDebouncer, SysfsButton},
    config::load_config,
    display::{DisplayRenderer, LoggingDisplay},
    error::Result as SentryResult,
    executor::{ActionExecutor, Collaborators, ExecutorConfig},
    fer::{self, FrustrationDetector, HttpClassifier},
    gateway::{self, AppState},
    help::RemoteHelpClient,
    llm::OpenRouterClient,
    speech::PiperSpeech,
    state,
};

#[derive(Parser)]
#[command(name = "duck-sentry", about = "Desk companion for frustrated developers")]
struct Args {
    /// Override the gateway bind host from the environment.
    #[arg(long)]
    host: Option<String>,
    /// Override the gateway bind port from the environment.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> SentryResult<()> {
    // Initialize logging
    env_logger::init();
    log::info!("🦆 Initializing duck-sentry");

    let args = Args::parse();
    let mut config = load_config()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Fatal startup checks: a broken audio setup must not reach steady state.
    let speech = Arc::new(PiperSpeech::new(config.piper.clone())?);
    log::info!("🔊 Speech synthesis initialized");

    let display: Arc<dyn DisplayRenderer> = Arc::new(LoggingDisplay);
    let advice = Arc::new(OpenRouterClient::new(config.openrouter_key().to_string()));
    let help = Arc::new(RemoteHelpClient::new(
        config.laptop_client_url.clone(),
        config.enrichment_timeout * 2,
    ));
    log::info!("🤖 Enrichment clients initialized");

    let (bus_tx, bus_rx) = bus::bounded(config.bus_capacity);
    let (state_tx, state_rx) = state::channel();
    let shutdown = CancellationToken::new();

    // Emotion source: optional, the device still answers the button and the
    // network without a camera.
    match &config.fer_service_url {
        Some(url) => {
            let classifier = Arc::new(HttpClassifier::new(url.clone()));
            let detector = FrustrationDetector::new(config.detector.clone());
            tokio::spawn(fer::classifier::run(
                classifier,
                detector,
                bus_tx.clone(),
                config.sample_interval,
                shutdown.child_token(),
            ));
            log::info!("📷 Emotion source enabled ({})", url);
        }
        None => log::warn!("📷 FER_SERVICE_URL not set; emotion source disabled"),
    }

    // Button source: skipped when the GPIO line is not exported, so the
    // device keeps working on machines without the hardware.
    if config.button_value_path.exists() {
        let source = SysfsButton::new(
            config.button_value_path.clone(),
            config.button_poll_interval,
        );
        let debouncer = ButtonDebouncer::new(config.button_refractory);
        tokio::spawn(button::run(
            source,
            debouncer,
            bus_tx.clone(),
            shutdown.child_token(),
        ));
        log::info!("🔘 Button enabled ({})", config.button_value_path.display());
    } else {
        log::warn!(
            "🔘 {} not present; button disabled",
            config.button_value_path.display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| {
            duck_sentry::SentryError::Gateway(format!("invalid bind address: {err}"))
        })?;
    let app_state = AppState {
        bus: bus_tx.clone(),
        state: state_rx.clone(),
    };
    let gateway_shutdown = shutdown.child_token();
    let gateway_task = tokio::spawn(async move {
        if let Err(err) = gateway::serve(addr, app_state, gateway_shutdown).await {
            log::error!("Gateway failed: {}", err);
        }
    });

    let executor = ActionExecutor::new(
        bus_rx,
        state_tx,
        Collaborators {
            advice,
            help,
            speech,
            display,
        },
        ExecutorConfig {
            enrichment_timeout: config.enrichment_timeout,
            speech_timeout: config.speech_timeout,
        },
    );
    let executor_task = tokio::spawn(executor.run(shutdown.child_token()));

    println!("🦆 Duck sentry ready on http://{addr}");
    println!("   Press Ctrl+C to exit");

    tokio::signal::ctrl_c().await?;
    log::info!("Received Ctrl+C, shutting down...");
    shutdown.cancel();

    let _ = executor_task.await;
    let _ = gateway_task.await;

    println!("\n👋 Goodbye!");
    Ok(())
}
