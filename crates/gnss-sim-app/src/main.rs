//! GNSS Sim - simulator daemon
//!
//! Runs the simulator task, accepts driving input over the input gateway and
//! publishes telemetry frames to the MQTT broker and to stream subscribers.

mod gateway;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gnss_sim_core::config::SimConfig;
use gnss_sim_core::projection::UtmProjection;
use gnss_sim_core::replay::Recording;
use gnss_sim_core::simulator::Simulator;
use gnss_sim_core::telemetry::{Fanout, MqttSink, TelemetryTopic};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "gnss-sim", version)]
#[command(about = "Simulate a vehicle and publish GNSS telemetry", long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/gnss-sim/config.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded session to enable replay mode
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Start publishing from the recording
    #[arg(long)]
    replay: bool,

    /// Input gateway address
    #[arg(long)]
    input_addr: Option<String>,

    /// Telemetry stream address
    #[arg(long)]
    telemetry_addr: Option<String>,

    /// MQTT broker host
    #[arg(long)]
    mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// Do not connect to an MQTT broker
    #[arg(long)]
    no_mqtt: bool,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gnss-sim").join("config.json"))
}

fn load_config(args: &Args) -> anyhow::Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => match default_config_path().filter(|path| path.exists()) {
            Some(path) => read_config(&path)?,
            None => SimConfig::default(),
        },
    };

    if let Some(recording) = &args.recording {
        config.replay.recording = Some(recording.clone());
    }
    if args.replay {
        config.replay.start_in_replay = true;
    }
    if let Some(addr) = &args.input_addr {
        config.gateway.input_addr = addr.clone();
    }
    if let Some(addr) = &args.telemetry_addr {
        config.gateway.telemetry_addr = addr.clone();
    }
    if let Some(host) = &args.mqtt_host {
        config.mqtt.host = host.clone();
    }
    if let Some(port) = args.mqtt_port {
        config.mqtt.port = port;
    }
    if args.no_mqtt {
        config.mqtt.enabled = false;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<SimConfig> {
    SimConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Log a task that panicked or was aborted; returns whether it finished cleanly
fn log_task_result(what: &str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{} task failed: {}", what, e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    logging::init_logging(config.log_level.as_deref());
    tracing::info!("gnss-sim v{}", gnss_sim_core::VERSION);

    let recording = match &config.replay.recording {
        Some(path) => Some(
            Recording::load(path)
                .with_context(|| format!("failed to load recording {}", path.display()))?,
        ),
        None => None,
    };

    let topic = TelemetryTopic::new(
        config.telemetry.topic.as_str(),
        config.telemetry.channel_capacity,
    );
    tracing::info!("Publishing telemetry on topic '{}'", topic.name());

    let shutdown = CancellationToken::new();
    let mut sink = Fanout::new().with_sink(Arc::new(topic.clone()));
    let mqtt_task = if config.mqtt.enabled {
        let (mqtt, connection) = MqttSink::new(&config.mqtt, config.telemetry.topic.as_str());
        sink = sink.with_sink(Arc::new(mqtt));
        Some(tokio::spawn(connection.run(shutdown.clone())))
    } else {
        tracing::info!("MQTT publishing disabled");
        None
    };

    let (simulator, handle) = Simulator::from_config(
        &config,
        recording,
        Arc::new(UtmProjection::new()),
        Arc::new(sink),
    );

    let (input_listener, _) = gateway::bind(&config.gateway.input_addr, "Input gateway").await?;
    let (telemetry_listener, _) =
        gateway::bind(&config.gateway.telemetry_addr, "Telemetry stream").await?;

    let sim_task = simulator.spawn();
    let input_task = tokio::spawn(gateway::serve_input(
        input_listener,
        handle.clone(),
        shutdown.clone(),
    ));
    let telemetry_task = tokio::spawn(gateway::serve_telemetry(
        telemetry_listener,
        topic,
        shutdown.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("Shutting down");

    shutdown.cancel();
    handle.shutdown();
    let (input, telemetry) = tokio::join!(input_task, telemetry_task);
    log_task_result("Input gateway", input);
    log_task_result("Telemetry stream", telemetry);
    if let Some(mqtt_task) = mqtt_task {
        log_task_result("MQTT connection", mqtt_task.await);
    }
    sim_task.await.context("simulator task failed")?;
    Ok(())
}
