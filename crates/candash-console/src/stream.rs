use crate::state::{Config, StreamEvent};
use candash_core::stream_ipc::{
    encode_frame, HelloPayload, StreamEnvelope, StreamFrameDecoder, StreamMsg,
    DEFAULT_MAX_FRAME_BYTES, STREAM_PROTOCOL_VERSION,
};
use candash_core::ControlCommand;
use chrono::Utc;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::warn;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Maintain the stream connection for the lifetime of the process:
/// connect, identify, forward decoded events to the app, write queued
/// control commands, and reconnect with backoff when the link drops.
pub async fn stream_loop(
    config: Config,
    tx: mpsc::Sender<StreamEvent>,
    mut command_rx: mpsc::Receiver<ControlCommand>,
) {
    let mut backoff = INITIAL_BACKOFF;
    let mut command_open = true;

    loop {
        let stream = match TcpStream::connect(&config.server_addr).await {
            Ok(stream) => stream,
            Err(err) => {
                let _ = tx
                    .send(StreamEvent::ConnectError {
                        message: err.to_string(),
                    })
                    .await;
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
                continue;
            }
        };
        backoff = INITIAL_BACKOFF;

        let (reader_half, mut writer_half) = stream.into_split();
        let hello = build_envelope(
            &config,
            StreamMsg::Hello(HelloPayload {
                username: config.username.clone(),
                role: "dashboard".to_string(),
            }),
        );
        if let Err(err) = send_envelope(&mut writer_half, &hello).await {
            let _ = tx
                .send(StreamEvent::ConnectError {
                    message: err.to_string(),
                })
                .await;
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
            continue;
        }

        let _ = tx.send(StreamEvent::Connected).await;
        let mut reader = BufReader::new(reader_half);
        let mut decoder = StreamFrameDecoder::<StreamEnvelope>::new(DEFAULT_MAX_FRAME_BYTES);
        let mut read_buf = [0u8; 8192];

        loop {
            tokio::select! {
                read = reader.read(&mut read_buf) => {
                    let read = match read {
                        Ok(value) => value,
                        Err(err) => {
                            warn!("stream_read_error: {err}");
                            break;
                        }
                    };
                    if read == 0 {
                        break;
                    }
                    let batch = decoder.feed(&read_buf[..read]);
                    for err in batch.errors {
                        warn!("stream_decode_error: {err}");
                    }
                    for envelope in batch.frames {
                        forward_envelope(&tx, envelope).await;
                    }
                }
                maybe_command = command_rx.recv(), if command_open => {
                    match maybe_command {
                        Some(command) => {
                            let envelope =
                                build_envelope(&config, StreamMsg::LoggingControl(command));
                            if let Err(err) = send_envelope(&mut writer_half, &envelope).await {
                                warn!("stream_write_error: {err}");
                                break;
                            }
                        }
                        None => {
                            command_open = false;
                        }
                    }
                }
            }
        }

        let remainder = decoder.flush();
        for err in remainder.errors {
            warn!("stream_decode_error: {err}");
        }
        for envelope in remainder.frames {
            forward_envelope(&tx, envelope).await;
        }
        let _ = tx.send(StreamEvent::Disconnected).await;
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

async fn forward_envelope(tx: &mpsc::Sender<StreamEvent>, envelope: StreamEnvelope) {
    if envelope.version > STREAM_PROTOCOL_VERSION {
        return;
    }
    match envelope.msg {
        StreamMsg::Stats(payload) => {
            let _ = tx.send(StreamEvent::Stats(payload)).await;
        }
        StreamMsg::VehicleStats(payload) => {
            let _ = tx.send(StreamEvent::VehicleStats(payload)).await;
        }
        StreamMsg::Message(text) => {
            let _ = tx.send(StreamEvent::Message(text)).await;
        }
        // Hello and control frames from other clients are not for us.
        StreamMsg::Hello(_) | StreamMsg::LoggingControl(_) => {}
    }
}

async fn send_envelope(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    envelope: &StreamEnvelope,
) -> io::Result<()> {
    let frame = encode_frame(envelope, DEFAULT_MAX_FRAME_BYTES)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    writer.write_all(&frame).await?;
    writer.flush().await
}

fn build_envelope(config: &Config, msg: StreamMsg) -> StreamEnvelope {
    StreamEnvelope {
        version: STREAM_PROTOCOL_VERSION,
        client_id: config.username.clone(),
        timestamp: Utc::now().to_rfc3339(),
        msg,
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}
