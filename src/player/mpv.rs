//! mpv backend driven over its JSON IPC socket.
//!
//! Each backend spawns one `mpv` process per loaded episode with
//! `--input-ipc-server` pointing at a private Unix socket. A reader thread
//! observes `time-pos` and `duration` and listens for `end-file`, folding
//! everything into a shared [`BackendSnapshot`] so queries never touch the
//! socket.
//!
//! ```text
//!  PlayerHandle ──commands──► UnixStream ──► mpv
//!       ▲                                     │
//!       └── RwLock<BackendSnapshot> ◄── reader thread ◄── events
//! ```

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::{Value, json};

use super::PlayerError;
use super::backend::{BackendFactory, PlaybackBackend};
use super::state::{BackendSnapshot, SeekDelta};
use crate::config::PlayerConfig;

const OBSERVE_TIME_POS: u64 = 1;
const OBSERVE_DURATION: u64 = 2;

static SOCKET_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates [`MpvBackend`]s sharing one player configuration.
#[derive(Debug, Clone)]
pub struct MpvFactory {
    config: PlayerConfig,
}

impl MpvFactory {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }
}

impl BackendFactory for MpvFactory {
    fn create(&self) -> Box<dyn PlaybackBackend> {
        Box::new(MpvBackend::new(self.config.clone()))
    }
}

/// A running mpv process and its IPC connection.
struct MpvProcess {
    child: Child,
    socket_path: PathBuf,
    writer: UnixStream,
    reader: Option<JoinHandle<()>>,
}

/// Backend for a single episode played through mpv.
pub struct MpvBackend {
    config: PlayerConfig,
    process: Option<MpvProcess>,
    snapshot: Arc<RwLock<BackendSnapshot>>,
}

impl MpvBackend {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            process: None,
            snapshot: Arc::new(RwLock::new(BackendSnapshot::default())),
        }
    }

    fn socket_path() -> PathBuf {
        let n = SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("castminder-{}-{}.sock", std::process::id(), n))
    }

    fn spawn(&self, locator: &str) -> Result<MpvProcess, PlayerError> {
        let socket_path = Self::socket_path();
        let _ = std::fs::remove_file(&socket_path);

        let mut child = Command::new(&self.config.command)
            .args(&self.config.extra_args)
            .arg("--no-terminal")
            .arg("--idle=no")
            .arg("--pause=no")
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .arg("--")
            .arg(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlayerError::Spawn(format!("{}: {}", self.config.command, e)))?;

        let writer = match connect(&mut child, &socket_path, self.config.ipc_timeout()) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = std::fs::remove_file(&socket_path);
                return Err(e);
            }
        };

        let snapshot = Arc::clone(&self.snapshot);
        let reader = writer.try_clone().and_then(|read_half| {
            thread::Builder::new()
                .name("mpv-ipc-reader".to_string())
                .spawn(move || read_events(read_half, snapshot))
        });
        let reader = match reader {
            Ok(reader) => reader,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = std::fs::remove_file(&socket_path);
                return Err(PlayerError::Ipc(e.to_string()));
            }
        };

        Ok(MpvProcess {
            child,
            socket_path,
            writer,
            reader: Some(reader),
        })
    }

    fn send(&mut self, command: Value) -> Result<(), PlayerError> {
        let process = self.process.as_mut().ok_or(PlayerError::NotLoaded)?;
        let line = json!({ "command": command }).to_string();
        tracing::trace!(target: "player::mpv", %line, "ipc send");
        writeln!(process.writer, "{}", line).map_err(|e| PlayerError::Ipc(e.to_string()))
    }
}

impl PlaybackBackend for MpvBackend {
    fn load(&mut self, locator: &str) -> Result<(), PlayerError> {
        self.stop();
        tracing::debug!(target: "player::mpv", locator, "spawning mpv");

        let process = self.spawn(locator)?;
        self.process = Some(process);
        self.send(json!(["observe_property", OBSERVE_TIME_POS, "time-pos"]))?;
        self.send(json!(["observe_property", OBSERVE_DURATION, "duration"]))?;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.send(json!(["set_property", "pause", false]))
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.send(json!(["set_property", "pause", true]))
    }

    fn stop(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };

        let _ = process.writer.shutdown(std::net::Shutdown::Both);
        if let Err(e) = process.child.kill() {
            tracing::debug!(target: "player::mpv", error = %e, "mpv already exited");
        }
        match process.child.wait() {
            Ok(status) => tracing::debug!(target: "player::mpv", %status, "mpv exited"),
            Err(e) => tracing::warn!(target: "player::mpv", error = %e, "failed to reap mpv"),
        }
        if let Some(reader) = process.reader.take() {
            let _ = reader.join();
        }
        let _ = std::fs::remove_file(&process.socket_path);

        *self.snapshot.write() = BackendSnapshot::default();
    }

    fn seek(&mut self, delta: SeekDelta) -> Result<(), PlayerError> {
        self.send(json!(["seek", delta.as_secs_f64(), "relative"]))
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), PlayerError> {
        self.send(json!(["set_property", "volume", percent.min(100)]))
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), PlayerError> {
        self.send(json!(["set_property", "speed", rate]))
    }

    fn snapshot(&self) -> BackendSnapshot {
        self.snapshot.read().clone()
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wait for mpv to create its IPC socket.
///
/// Runs on the caller's thread, so a `play()` from stopped blocks for at most
/// `timeout` (`ipc_timeout_ms`). An early exit of the process ends the wait
/// at the next 20 ms poll.
fn connect(
    child: &mut Child,
    socket_path: &Path,
    timeout: Duration,
) -> Result<UnixStream, PlayerError> {
    let started = Instant::now();
    loop {
        match UnixStream::connect(socket_path) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(PlayerError::Spawn(format!("mpv exited early ({})", status)));
                }
                if started.elapsed() >= timeout {
                    return Err(PlayerError::Ipc(format!(
                        "no IPC socket at {} after {:?}: {}",
                        socket_path.display(),
                        timeout,
                        e
                    )));
                }
                thread::sleep(Duration::from_millis(20));
            }
        }
    }
}

/// Reader thread body: fold mpv events into the snapshot until the socket closes.
fn read_events(stream: UnixStream, snapshot: Arc<RwLock<BackendSnapshot>>) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else { break };
        let Ok(event) = serde_json::from_str::<Value>(&line) else {
            tracing::debug!(target: "player::mpv", %line, "unparseable ipc line");
            continue;
        };
        apply_event(&event, &mut snapshot.write());
    }

    // Socket closed: either we killed mpv, or it died on its own.
    let mut snap = snapshot.write();
    if !snap.finished {
        snap.failed = true;
    }
}

/// Apply one mpv IPC message to the snapshot. Replies to our own commands
/// carry no `event` field and are ignored.
fn apply_event(event: &Value, snap: &mut BackendSnapshot) {
    match event.get("event").and_then(Value::as_str) {
        Some("property-change") => {
            let secs = event.get("data").and_then(Value::as_f64);
            match event.get("name").and_then(Value::as_str) {
                Some("time-pos") => {
                    if let Some(position) = secs.and_then(to_duration) {
                        snap.position = position;
                    }
                }
                Some("duration") => match secs {
                    None => snap.duration = None,
                    Some(secs) => {
                        if let Some(duration) = to_duration(secs) {
                            snap.duration = Some(duration);
                        }
                    }
                },
                _ => {}
            }
        }
        Some("end-file") => {
            let reason = event.get("reason").and_then(Value::as_str).unwrap_or("unknown");
            tracing::debug!(target: "player::mpv", reason, "end-file");
            match reason {
                "eof" => {
                    snap.finished = true;
                    if let Some(d) = snap.duration {
                        snap.position = d;
                    }
                }
                "error" => snap.failed = true,
                _ => {}
            }
        }
        _ => {}
    }
}

/// Seconds from mpv as a duration. Negative values clamp to zero; values a
/// `Duration` cannot hold are dropped.
fn to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}
