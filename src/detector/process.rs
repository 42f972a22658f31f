// SPDX-License-Identifier: GPL-3.0-only

//! Sidecar detector adapter
//!
//! Runs an external landmark-detector process and speaks a small stdio
//! protocol with it. Per frame, the adapter writes a JSON header line
//! followed by the raw RGBA payload on the child's stdin, and reads back one
//! JSON line:
//!
//! ```text
//! → {"width":1280,"height":720,"timestamp_micros":16683}\n
//! → <width * height * 4 bytes of RGBA>
//! ← {"hands":[[{"x":0.42,"y":0.17,"z":-0.01}, … 21 entries]]}\n
//! ```
//!
//! An empty `hands` array means no hand was visible. The child process is
//! owned by the adapter and killed when it is dropped.

use super::landmarks::Hand;
use super::HandDetector;
use crate::backends::camera::CameraFrame;
use crate::errors::DetectorError;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Per-frame request header sent to the sidecar
#[derive(Debug, Serialize)]
struct FrameHeader {
    width: u32,
    height: u32,
    timestamp_micros: u64,
}

/// Per-frame response from the sidecar
#[derive(Debug, Deserialize)]
struct DetectResponse {
    hands: Vec<Hand>,
}

/// Hand detector backed by an external process
pub struct ProcessDetector {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    response_line: String,
}

impl ProcessDetector {
    /// Create a detector that will run the given command
    ///
    /// Nothing is spawned until [`HandDetector::init`] is called.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
            stdin: None,
            stdout: None,
            response_line: String::new(),
        }
    }
}

impl HandDetector for ProcessDetector {
    async fn init(&mut self) -> Result<(), DetectorError> {
        info!(program = %self.program, "Spawning detector sidecar");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DetectorError::InitFailure(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DetectorError::InitFailure("No stdin pipe to sidecar".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DetectorError::InitFailure("No stdout pipe from sidecar".to_string()))?;

        self.stdin = Some(stdin);
        self.stdout = Some(BufReader::new(stdout));
        self.child = Some(child);

        debug!("Detector sidecar running");
        Ok(())
    }

    async fn detect(
        &mut self,
        frame: &CameraFrame,
        timestamp_micros: u64,
    ) -> Result<Option<Hand>, DetectorError> {
        let (Some(stdin), Some(stdout)) = (self.stdin.as_mut(), self.stdout.as_mut()) else {
            return Err(DetectorError::Closed("Sidecar not initialized".to_string()));
        };

        let header = FrameHeader {
            width: frame.width,
            height: frame.height,
            timestamp_micros,
        };
        let mut header = serde_json::to_vec(&header)
            .map_err(|e| DetectorError::Transient(e.to_string()))?;
        header.push(b'\n');

        // Pipe errors mean the child exited; that is fatal, not per-frame
        let closed = |e: std::io::Error| DetectorError::Closed(e.to_string());

        stdin.write_all(&header).await.map_err(closed)?;
        // Rows are written individually so stride padding never reaches the wire
        for y in 0..frame.height {
            stdin.write_all(frame.row(y)).await.map_err(closed)?;
        }
        stdin.flush().await.map_err(closed)?;

        self.response_line.clear();
        let read = stdout
            .read_line(&mut self.response_line)
            .await
            .map_err(closed)?;
        if read == 0 {
            return Err(DetectorError::Closed("Sidecar closed stdout".to_string()));
        }

        // A malformed response only costs this frame
        let response: DetectResponse = match serde_json::from_str(&self.response_line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Malformed sidecar response");
                return Err(DetectorError::Transient(e.to_string()));
            }
        };

        // First result only; multi-hand tracking is out of scope
        Ok(response.hands.into_iter().next())
    }
}

impl Drop for ProcessDetector {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Stopping detector sidecar");
            let _ = child.start_kill();
        }
    }
}
