//! Live stream relay: runs the configured grabber command and pipes its
//! stdout to the client as MP4.
//!
//! The grabber is killed as soon as the client goes away or the server
//! shuts down.

use std::process::Stdio;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::process::Command;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::server::{AppError, AppState, CameraQuery};

/// Pipe buffer between the grabber and the response body.
const RELAY_BUFFER: usize = 64 * 1024;

pub async fn live(
    State(state): State<AppState>,
    Query(query): Query<CameraQuery>,
) -> Result<Response, AppError> {
    let settings = &state.settings;
    if !settings.stream_enabled {
        return Err(AppError::StreamDisabled);
    }

    let camera = state.camera(query.camera.as_deref())?;
    let stream = camera
        .stream
        .as_deref()
        .ok_or_else(|| AppError::Internal("H264 stream for camera is missing.".into()))?;
    let template = settings.stream_command.as_deref().ok_or_else(|| {
        AppError::Internal("Grabber command for web interface is missing.".into())
    })?;
    let command = grabber_command(template, stream);

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::Internal(format!("Cannot start stream command: {e}")))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Internal("Stream command has no stdout".into()))?;

    info!("Relaying live stream of camera {}", camera.id);

    let (reader, mut writer) = tokio::io::duplex(RELAY_BUFFER);
    let camera_id = camera.id.clone();
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        // The body ends once the writer is gone.
        let copied = tokio::select! {
            copied = tokio::io::copy(&mut stdout, &mut writer) => Some(copied),
            _ = shutdown.cancelled() => None,
        };
        drop(writer);

        let status = match copied {
            Some(Ok(bytes)) => {
                debug!("Stream of {camera_id} ended after {bytes} bytes");
                child.wait().await
            }
            Some(Err(e)) => {
                // Client disconnected
                debug!("Stopping stream of {camera_id}: {e}");
                let _ = child.start_kill();
                child.wait().await
            }
            None => {
                info!("Stopping stream of {camera_id} for shutdown");
                let _ = child.start_kill();
                child.wait().await
            }
        };
        match status {
            Ok(status) if !status.success() => {
                warn!("Stream command for {camera_id} exited with {status}")
            }
            Ok(_) => {}
            Err(e) => warn!("Cannot reap stream command for {camera_id}: {e}"),
        }
    });

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4"),
            (header::CONNECTION, "close"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}

/// Substitute `{STREAM}` with the single-quoted stream URL.
fn grabber_command(template: &str, stream: &str) -> String {
    template.replace("{STREAM}", &shell_quote(stream))
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grabber_command_quotes_stream() {
        assert_eq!(
            grabber_command("ffmpeg -i {STREAM} -f mp4 -", "rtsp://cam/live"),
            "ffmpeg -i 'rtsp://cam/live' -f mp4 -"
        );
        assert_eq!(
            grabber_command("grab {STREAM}", "rtsp://x/'; rm -rf /"),
            r"grab 'rtsp://x/'\''; rm -rf /'"
        );
    }
}
