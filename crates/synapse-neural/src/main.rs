//! Synapse Neural Binary
//!
//! Reads newline-delimited JSON commands from stdin and writes decisions and
//! engine events to stdout, one JSON object per line. Logs go to stderr.

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use synapse_common::TelemetrySnapshot;
use synapse_neural::{
    ComponentProfile, EventEnvelope, IntegrationStats, NeuralConfig, NeuralOrchestra,
    NEURAL_VERSION,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    Register(ComponentProfile),
    Telemetry(TelemetrySnapshot),
    Integration {
        component_id: String,
        days_since_integration: i64,
        loc_changed: i64,
        dependencies: i64,
    },
    Health {
        component_id: String,
        health_score: f64,
    },
    Status {
        component_id: String,
    },
    SystemHealth,
    Metrics,
}

#[derive(Debug, Serialize)]
struct Reply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Reply {
    fn ok(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn err(error: impl ToString) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Synapse Neural v{}", NEURAL_VERSION);

    // Load configuration
    let config = NeuralConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let registry = Registry::new();
    let engine = NeuralOrchestra::new(config)?;
    engine.metrics().register(&registry)?;

    // Forward engine events to stdout
    let mut events = engine.subscribe();
    let forwarder = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match EventEnvelope::from_event(&event).and_then(|e| e.to_json()) {
                    Ok(line) => println!("{}", line),
                    Err(err) => warn!(error = %err, "Failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');
    loop {
        tokio::select! {
            line = lines.next_segment() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                if let Some(reply) = handle_line(&engine, &registry, &line) {
                    println!("{}", serde_json::to_string(&reply)?);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    let health = engine.publish_system_health();
    info!(
        components = health.total_components,
        quarantined = health.quarantined_count,
        "Shutting down Synapse Neural"
    );

    drop(engine);
    if let Err(err) = forwarder.await {
        warn!(error = %err, "Event forwarder stopped abnormally");
    }
    Ok(())
}

/// Decode and run one input line; blank lines get no reply
fn handle_line(engine: &NeuralOrchestra, registry: &Registry, line: &[u8]) -> Option<Reply> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(err) => return Some(Reply::err(format!("invalid command: {}", err))),
    };
    if line.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<Command>(line) {
        Ok(command) => execute(engine, registry, command),
        Err(err) => Reply::err(format!("invalid command: {}", err)),
    })
}

fn execute(engine: &NeuralOrchestra, registry: &Registry, command: Command) -> Reply {
    debug!(?command, "Executing command");
    let outcome = match command {
        Command::Register(profile) => engine.register_component(profile).map(|_| Value::Null),
        Command::Telemetry(snapshot) => engine
            .process_telemetry(&snapshot.component_id, &snapshot)
            .and_then(|decision| Ok(serde_json::to_value(decision)?)),
        Command::Integration {
            component_id,
            days_since_integration,
            loc_changed,
            dependencies,
        } => engine
            .update_integration(
                &component_id,
                IntegrationStats::new(days_since_integration, loc_changed, dependencies),
            )
            .map(|_| Value::Null),
        Command::Health {
            component_id,
            health_score,
        } => engine
            .update_health(&component_id, health_score)
            .map(|_| Value::Null),
        Command::Status { component_id } => engine
            .component_status(&component_id)
            .and_then(|status| Ok(serde_json::to_value(status)?)),
        Command::SystemHealth => {
            let health = engine.publish_system_health();
            serde_json::to_value(health).map_err(Into::into)
        }
        Command::Metrics => {
            let mut buffer = Vec::new();
            let encoded = TextEncoder::new().encode(&registry.gather(), &mut buffer);
            match encoded {
                Ok(()) => Ok(json!(String::from_utf8_lossy(&buffer))),
                Err(err) => Err(synapse_common::SynapseError::Metrics(err.to_string())),
            }
        }
    };

    match outcome {
        Ok(result) => Reply::ok(result),
        Err(err) => {
            warn!(error = %err, "Command failed");
            Reply::err(err)
        }
    }
}
