//! TCP gateway
//!
//! Two line-delimited JSON endpoints:
//! - the input endpoint accepts key sets, controller samples, mode switches
//!   and status queries, answering every line with a reply line;
//! - the telemetry endpoint streams every published frame to each
//!   connected client, one JSON document per line.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use gnss_sim_core::kinematics::AnalogInput;
use gnss_sim_core::simulator::{Mode, SimHandle, SimStatus};
use gnss_sim_core::telemetry::TelemetryTopic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Longest accepted request line; longer lines close the connection
const MAX_LINE_LEN: usize = 4096;

/// A request line on the input endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Browser key identifiers currently held
    KeysPressed { keys: Vec<String> },
    /// Controller sample
    XboxInput(AnalogInput),
    /// Mode toggle; `"true"` (or `true`) selects replay
    UpdateFromLogs { value: Value },
    /// Explicit mode switch
    SetMode { mode: Mode },
    /// Current simulator status
    Status,
}

/// Reply to a request line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Request accepted
    pub ok: bool,
    /// Why the request was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Status for `status` requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SimStatus>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            status: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            status: None,
        }
    }

    fn with_status(status: SimStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::ok()
        }
    }
}

fn toggle_mode(value: &Value) -> Mode {
    match value {
        Value::Bool(true) => Mode::Replay,
        Value::String(s) => Mode::from_toggle(s),
        _ => Mode::Live,
    }
}

/// Apply one request to the simulator
pub async fn handle_request(handle: &SimHandle, request: Request) -> Reply {
    let result = match request {
        Request::KeysPressed { keys } => handle.send_keys(&keys).await,
        Request::XboxInput(input) => handle.send_analog(input).await,
        Request::UpdateFromLogs { value } => handle.set_mode(toggle_mode(&value)).await,
        Request::SetMode { mode } => handle.set_mode(mode).await,
        Request::Status => {
            return match handle.status().await {
                Ok(status) => Reply::with_status(status),
                Err(e) => Reply::error(e.to_string()),
            }
        }
    };

    match result {
        Ok(()) => Reply::ok(),
        Err(e) => Reply::error(e.to_string()),
    }
}

/// Parse and apply one request line
pub async fn handle_line(handle: &SimHandle, line: &str) -> Reply {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(handle, request).await,
        Err(e) => {
            tracing::warn!("Rejected request: {}", e);
            Reply::error(format!("invalid request: {}", e))
        }
    }
}

/// Accept input connections until shutdown
pub async fn serve_input(listener: TcpListener, handle: SimHandle, shutdown: CancellationToken) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Input accept failed: {}", e);
                    continue;
                }
            },
        };

        let span = tracing::info_span!("input", conn = %Uuid::new_v4(), %peer);
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(
            async move {
                tracing::info!("Input client connected");
                if let Err(e) = input_connection(stream, &handle, &shutdown).await {
                    tracing::debug!("Input connection error: {}", e);
                }
                tracing::info!("Input client disconnected");
            }
            .instrument(span),
        );
    }
}

async fn input_connection(
    stream: TcpStream,
    handle: &SimHandle,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next() => match line {
                Some(Ok(line)) => line,
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    tracing::warn!("Request longer than {} bytes, closing", MAX_LINE_LEN);
                    let reply = Reply::error(format!("request longer than {} bytes", MAX_LINE_LEN));
                    return write_reply(&mut writer, &reply).await;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
                None => return Ok(()),
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = handle_line(handle, line).await;
        write_reply(&mut writer, &reply).await?;
    }
}

async fn write_reply<W>(writer: &mut W, reply: &Reply) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = serde_json::to_string(reply)?;
    text.push('\n');
    writer.write_all(text.as_bytes()).await?;
    Ok(())
}

/// Stream telemetry to every connected client until shutdown
pub async fn serve_telemetry(
    listener: TcpListener,
    topic: TelemetryTopic,
    shutdown: CancellationToken,
) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Telemetry accept failed: {}", e);
                    continue;
                }
            },
        };

        let span = tracing::info_span!("telemetry", conn = %Uuid::new_v4(), %peer);
        let frames = topic.subscribe();
        let shutdown = shutdown.clone();
        tokio::spawn(
            async move {
                tracing::info!("Subscriber connected");
                if let Err(e) = telemetry_connection(stream, frames, &shutdown).await {
                    tracing::debug!("Subscriber connection error: {}", e);
                }
                tracing::info!("Subscriber disconnected");
            }
            .instrument(span),
        );
    }
}

async fn telemetry_connection(
    mut stream: TcpStream,
    mut frames: tokio::sync::broadcast::Receiver<Arc<str>>,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let payload = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            frame = frames.recv() => match frame {
                Ok(payload) => payload,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscriber lagging, skipped {} frames", skipped);
                    continue;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        };

        stream.write_all(payload.as_bytes()).await?;
        stream.write_all(b"\n").await?;
    }
}

/// Bind a listener, logging the resolved address
pub async fn bind(addr: &str, what: &str) -> anyhow::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {} on {}", what, addr))?;
    let local = listener.local_addr()?;
    tracing::info!("{} listening on {}", what, local);
    Ok((listener, local))
}
