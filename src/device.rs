//! Serial acquisition for one receiver.
//!
//! A [`DeviceReader`] walks `Disconnected → Connecting → Streaming → Faulted`
//! forever, owning at most one open handle at a time. Parsed fixes are written
//! into [`SharedState`]; bad sentences are counted and dropped.

use chrono::Utc;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::config::DeviceConfig;
use crate::error::{ConnectionFailure, ParseFailure};
use crate::nmea::{self, SentenceFix};
use crate::reconnect::ReconnectState;
use crate::state::SharedState;
use crate::types::{DeviceConnectionState, DeviceRole, PositionFix};

/// Longest partial line kept across read timeouts.
const MAX_LINE_BYTES: usize = 512;

pub type LineStream = Box<dyn AsyncBufRead + Send + Unpin>;

/// Opens the byte stream behind a receiver.
pub trait SerialOpener: Send + Sync + 'static {
    fn open(&self, role: DeviceRole, config: &DeviceConfig) -> Result<LineStream, ConnectionFailure>;
}

/// Opens a path on disk. Character devices are first put in raw mode at the
/// configured baud rate with `stty`, with VTIME set so an idle line returns
/// zero bytes instead of blocking. Regular files and FIFOs are read as-is,
/// which is handy for replaying a capture.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtyOpener;

impl SerialOpener for TtyOpener {
    fn open(&self, _role: DeviceRole, config: &DeviceConfig) -> Result<LineStream, ConnectionFailure> {
        let path = &config.path;
        if !path.exists() {
            return Err(ConnectionFailure::NotFound(path.display().to_string()));
        }

        if is_char_device(path) {
            configure_tty(path, config.baud_rate, config.read_timeout())?;
        }

        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| ConnectionFailure::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Box::new(BufReader::new(tokio::fs::File::from_std(file))))
    }
}

#[cfg(unix)]
fn is_char_device(path: &Path) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(path)
        .map(|m| m.file_type().is_char_device())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_char_device(_path: &Path) -> bool {
    false
}

fn configure_tty(path: &Path, baud_rate: u32, read_timeout: Duration) -> Result<(), ConnectionFailure> {
    // VTIME counts tenths of a second and tops out at 255
    let vtime = (read_timeout.as_secs_f64() * 10.0).round().clamp(1.0, 255.0) as u32;

    let output = Command::new("stty")
        .arg("-F")
        .arg(path)
        .arg(baud_rate.to_string())
        .args(["raw", "-echo", "clocal", "min", "0", "time"])
        .arg(vtime.to_string())
        .output()
        .map_err(|e| ConnectionFailure::Configure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ConnectionFailure::Configure {
            path: path.display().to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

pub struct DeviceReader {
    role: DeviceRole,
    config: DeviceConfig,
    opener: Arc<dyn SerialOpener>,
    state: SharedState,
    reconnect: ReconnectState,
    observer: Option<mpsc::UnboundedSender<DeviceConnectionState>>,
}

impl DeviceReader {
    pub fn new(
        role: DeviceRole,
        config: DeviceConfig,
        opener: Arc<dyn SerialOpener>,
        state: SharedState,
    ) -> Self {
        let reconnect = ReconnectState::from_config(role.as_str(), &config);
        Self {
            role,
            config,
            opener,
            state,
            reconnect,
            observer: None,
        }
    }

    /// Receive every state transition, in order.
    #[cfg(test)]
    pub fn with_observer(mut self, tx: mpsc::UnboundedSender<DeviceConnectionState>) -> Self {
        self.observer = Some(tx);
        self
    }

    /// Reconnect loop. Returns only when `shutdown` flips to true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let role = self.role;
        log::info!(
            "[{}] reading {} at {} baud",
            role,
            self.config.path.display(),
            self.config.baud_rate
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.transition(DeviceConnectionState::Connecting);
            let opened = tokio::select! {
                opened = self.open() => opened,
                _ = shutdown.changed() => {
                    self.transition(DeviceConnectionState::Disconnected);
                    break;
                }
            };

            let faulted = match opened {
                Err(failure) => {
                    log::warn!("[{}] open failed: {}", role, failure);
                    let message = failure.to_string();
                    self.state.update_device(role, |d| {
                        d.failed_opens += 1;
                        d.last_error = Some(message);
                    });
                    self.transition(DeviceConnectionState::Disconnected);
                    false
                }
                Ok(stream) => {
                    self.reconnect.record_success();
                    self.state.update_device(role, |d| d.connects += 1);
                    self.transition(DeviceConnectionState::Streaming);
                    log::info!("[{}] streaming", role);

                    let failure = tokio::select! {
                        failure = self.stream(stream) => failure,
                        _ = shutdown.changed() => {
                            self.transition(DeviceConnectionState::Disconnected);
                            break;
                        }
                    };

                    // the handle was dropped with the stream future
                    log::warn!("[{}] link faulted: {}", role, failure);
                    let message = failure.to_string();
                    self.state.update_device(role, |d| {
                        d.faults += 1;
                        d.last_error = Some(message);
                    });
                    self.transition(DeviceConnectionState::Faulted);
                    true
                }
            };

            // a faulted link stays visible as Faulted until the backoff runs out
            let wait = self.reconnect.record_failure();
            log::debug!("[{}] retrying in {:.1}s", role, wait.as_secs_f64());
            let stopping = tokio::select! {
                _ = self.reconnect.wait() => false,
                _ = shutdown.changed() => true,
            };
            if faulted {
                self.transition(DeviceConnectionState::Disconnected);
            }
            if stopping {
                break;
            }
        }

        log::info!("[{}] reader stopped", role);
    }

    /// Run the opener off the async workers, bounded by `open_timeout`. A tty
    /// open that never returns is abandoned and counted as a failed open.
    async fn open(&self) -> Result<LineStream, ConnectionFailure> {
        let opener = Arc::clone(&self.opener);
        let config = self.config.clone();
        let role = self.role;
        let path = self.config.path.display().to_string();

        let task = tokio::task::spawn_blocking(move || opener.open(role, &config));
        match tokio::time::timeout(self.config.open_timeout(), task).await {
            Ok(Ok(opened)) => opened,
            Ok(Err(join)) => Err(ConnectionFailure::Open {
                path,
                source: std::io::Error::other(join.to_string()),
            }),
            Err(_) => Err(ConnectionFailure::OpenTimedOut(path)),
        }
    }

    /// Read lines until the link fails; the returned value says why.
    async fn stream(&self, mut stream: LineStream) -> ConnectionFailure {
        let read_timeout = self.config.read_timeout();
        let mut line = Vec::with_capacity(128);
        let mut empty_reads = 0u32;
        let mut garbled = 0u32;

        loop {
            let read = tokio::time::timeout(read_timeout, stream.read_until(b'\n', &mut line)).await;
            // VTIME expiry reads as EOF and can hand back half a sentence
            let complete = match read {
                Ok(Err(e)) => return ConnectionFailure::Read(e),
                Ok(Ok(n)) => n > 0 && line.last() == Some(&b'\n'),
                Err(_) => false,
            };
            if !complete {
                // a partial line is kept, the rest may still arrive
                if line.len() > MAX_LINE_BYTES {
                    line.clear();
                }
                empty_reads += 1;
                if empty_reads >= self.config.max_empty_reads {
                    return ConnectionFailure::Stalled(empty_reads);
                }
                continue;
            }
            empty_reads = 0;

            if line.iter().all(|b| b.is_ascii_whitespace()) {
                line.clear();
                continue;
            }

            match nmea::parse_line(&line) {
                Ok(fix) => {
                    garbled = 0;
                    self.apply(fix);
                }
                Err(ParseFailure::NonAscii) => {
                    garbled += 1;
                    self.record_parse_failure(&ParseFailure::NonAscii);
                    if garbled >= self.config.max_garbled_lines {
                        return ConnectionFailure::Garbled(garbled);
                    }
                }
                Err(failure) => {
                    garbled = 0;
                    self.record_parse_failure(&failure);
                }
            }
            line.clear();
        }
    }

    fn apply(&self, fix: SentenceFix) {
        if !self.config.accept.contains(&fix.kind) {
            log::trace!("[{}] ignoring {:?} sentence", self.role, fix.kind);
            return;
        }

        let horizontal_dilution = match fix.horizontal_dilution {
            Some(hdop) => hdop,
            None => {
                let (base, rover) = self.state.get_fixes();
                match self.role {
                    DeviceRole::Base => base.horizontal_dilution,
                    DeviceRole::Rover => rover.horizontal_dilution,
                }
            }
        };

        self.state.set_fix(PositionFix {
            latitude: fix.latitude,
            longitude: fix.longitude,
            horizontal_dilution,
            role: self.role,
            received_at: Some(Utc::now()),
        });
        self.state.update_device(self.role, |d| d.fixes_published += 1);
    }

    fn record_parse_failure(&self, failure: &ParseFailure) {
        log::debug!("[{}] dropped sentence: {}", self.role, failure);
        self.state.update_device(self.role, |d| d.parse_failures += 1);
    }

    fn transition(&self, next: DeviceConnectionState) {
        let now = Utc::now();
        self.state.update_device(self.role, |d| {
            d.state = next;
            d.state_since = Some(now);
        });
        log::debug!("[{}] -> {:?}", self.role, next);
        if let Some(tx) = &self.observer {
            let _ = tx.send(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};
    use tokio::time::Instant;

    const BASE_GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    /// Yields its bytes, then fails like an unplugged adapter.
    struct Unplugged {
        data: Cursor<Vec<u8>>,
    }

    impl AsyncRead for Unplugged {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.data.position() < self.data.get_ref().len() as u64 {
                Pin::new(&mut self.data).poll_read(cx, buf)
            } else {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")))
            }
        }
    }

    /// Hands out one chunk per read; an empty chunk reads like a VTIME expiry.
    struct Chunked {
        chunks: VecDeque<Vec<u8>>,
    }

    impl AsyncRead for Chunked {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if let Some(chunk) = self.chunks.pop_front() {
                buf.put_slice(&chunk);
            }
            Poll::Ready(Ok(()))
        }
    }

    enum Script {
        Refuse,
        Hang(Duration),
        Chunks(Vec<Vec<u8>>),
        Lines(String),
        LinesThenUnplug(String),
        Bytes(Vec<u8>),
    }

    #[derive(Default)]
    struct ScriptedOpener {
        script: Mutex<VecDeque<Script>>,
    }

    impl ScriptedOpener {
        fn new(steps: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
            })
        }
    }

    impl SerialOpener for ScriptedOpener {
        fn open(&self, _role: DeviceRole, config: &DeviceConfig) -> Result<LineStream, ConnectionFailure> {
            let step = self.script.lock().unwrap().pop_front().unwrap_or(Script::Refuse);
            match step {
                Script::Refuse => Err(ConnectionFailure::NotFound(config.path.display().to_string())),
                Script::Hang(duration) => {
                    std::thread::sleep(duration);
                    Err(ConnectionFailure::NotFound(config.path.display().to_string()))
                }
                Script::Chunks(chunks) => Ok(Box::new(BufReader::new(Chunked {
                    chunks: chunks.into(),
                }))),
                Script::Lines(text) => Ok(Box::new(Cursor::new(text.into_bytes()))),
                Script::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes))),
                Script::LinesThenUnplug(text) => Ok(Box::new(BufReader::new(Unplugged {
                    data: Cursor::new(text.into_bytes()),
                }))),
            }
        }
    }

    fn fast_config() -> DeviceConfig {
        let mut config = DeviceConfig::new("/dev/ttyTEST");
        config.read_timeout_secs = 0.05;
        config.reconnect_backoff_secs = 0.1;
        config.max_backoff_secs = 0.1;
        config.max_empty_reads = 2;
        config
    }

    fn gga(latitude: f64, longitude: f64, hdop: f64) -> String {
        format!("{}\r\n", nmea::format_gga(Utc::now(), latitude, longitude, hdop))
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn spawn_reader(
        role: DeviceRole,
        config: DeviceConfig,
        opener: Arc<ScriptedOpener>,
        state: &SharedState,
    ) -> (
        watch::Sender<bool>,
        tokio::task::JoinHandle<()>,
        mpsc::UnboundedReceiver<DeviceConnectionState>,
    ) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (obs_tx, obs_rx) = mpsc::unbounded_channel();
        let reader = DeviceReader::new(role, config, opener, state.clone()).with_observer(obs_tx);
        let handle = tokio::spawn(reader.run(shutdown_rx));
        (shutdown_tx, handle, obs_rx)
    }

    #[tokio::test]
    async fn test_publishes_fix_with_hdop() {
        let state = SharedState::new();
        let opener = ScriptedOpener::new(vec![Script::Lines(BASE_GGA.to_string())]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, fast_config(), opener, &state);

        assert!(wait_for(|| state.get_fixes().0.is_acquired()).await);
        let (base, rover) = state.get_fixes();
        assert!((base.latitude - 48.1173).abs() < 1e-9);
        assert_eq!(base.horizontal_dilution, 0.9);
        assert_eq!(base.role, DeviceRole::Base);
        assert!(base.received_at.is_some());
        assert!(!rover.is_acquired());

        let device = state.device(DeviceRole::Base);
        assert_eq!(device.connects, 1);
        assert_eq!(device.fixes_published, 1);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_checksum_mismatch_leaves_state_untouched() {
        let state = SharedState::new();
        let corrupted = BASE_GGA.replace(",0.9,", ",0.8,");
        let opener = ScriptedOpener::new(vec![Script::Lines(corrupted)]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, fast_config(), opener, &state);

        assert!(wait_for(|| state.device(DeviceRole::Base).faults >= 1).await);
        let pristine = SharedState::new();
        assert_eq!(state.get_fixes(), pristine.get_fixes());
        assert_eq!(state.device(DeviceRole::Base).parse_failures, 1);
        assert_eq!(state.device(DeviceRole::Base).fixes_published, 0);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_faults_and_recovers_within_backoff() {
        let state = SharedState::new();
        let config = fast_config();
        let backoff = config.reconnect_backoff();
        let opener = ScriptedOpener::new(vec![
            Script::LinesThenUnplug(gga(35.681800, 139.768000, 1.1)),
            Script::Refuse,
            Script::Lines(gga(35.681900, 139.768100, 0.7)),
        ]);
        let start = Instant::now();
        let (shutdown, handle, mut obs) = spawn_reader(DeviceRole::Rover, config, opener, &state);

        assert!(wait_for(|| (state.get_fixes().1.latitude - 35.6819).abs() < 1e-6).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= backoff * 2, "resumed too early: {:?}", elapsed);
        assert!(elapsed < backoff * 2 + Duration::from_secs(1), "resumed too late: {:?}", elapsed);

        use DeviceConnectionState::*;
        let mut seen = Vec::new();
        while seen.len() < 8 {
            seen.push(obs.recv().await.unwrap());
        }
        assert_eq!(
            seen,
            vec![Connecting, Streaming, Faulted, Disconnected, Connecting, Disconnected, Connecting, Streaming]
        );

        let device = state.device(DeviceRole::Rover);
        assert_eq!(device.connects, 2);
        assert_eq!(device.failed_opens, 1);
        assert!(device.faults >= 1);
        assert_eq!(state.get_fixes().1.horizontal_dilution, 0.7);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_faulted_is_held_through_backoff() {
        let state = SharedState::new();
        let mut config = fast_config();
        config.reconnect_backoff_secs = 0.5;
        config.max_backoff_secs = 0.5;
        let opener = ScriptedOpener::new(vec![Script::LinesThenUnplug(BASE_GGA.to_string())]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, config, opener, &state);

        assert!(wait_for(|| state.device(DeviceRole::Base).state == DeviceConnectionState::Faulted).await);
        let faulted_at = Instant::now();
        assert_eq!(state.device(DeviceRole::Base).faults, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(state.device(DeviceRole::Base).state, DeviceConnectionState::Faulted);

        assert!(wait_for(|| state.device(DeviceRole::Base).state != DeviceConnectionState::Faulted).await);
        assert!(faulted_at.elapsed() >= Duration::from_millis(300));

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_hung_open_is_abandoned() {
        let mut config = fast_config();
        config.open_timeout_secs = 0.1;

        let opener = ScriptedOpener::new(vec![Script::Hang(Duration::from_millis(1500))]);
        let reader = DeviceReader::new(DeviceRole::Rover, config.clone(), opener, SharedState::new());
        let start = Instant::now();
        assert!(matches!(reader.open().await, Err(ConnectionFailure::OpenTimedOut(_))));
        assert!(start.elapsed() < Duration::from_secs(1));

        let state = SharedState::new();
        let opener = ScriptedOpener::new(vec![
            Script::Hang(Duration::from_millis(1500)),
            Script::Lines(BASE_GGA.to_string()),
        ]);
        let start = Instant::now();
        let (shutdown, handle, mut obs) = spawn_reader(DeviceRole::Rover, config, opener, &state);

        assert!(wait_for(|| state.get_fixes().1.is_acquired()).await);
        assert!(start.elapsed() < Duration::from_secs(1), "reader waited on the hung open");

        use DeviceConnectionState::*;
        let mut seen = Vec::new();
        while seen.len() < 4 {
            seen.push(obs.recv().await.unwrap());
        }
        assert_eq!(seen, vec![Connecting, Disconnected, Connecting, Streaming]);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sentence_split_by_read_expiry() {
        let state = SharedState::new();
        let (head, tail) = BASE_GGA.as_bytes().split_at(30);
        let opener = ScriptedOpener::new(vec![Script::Chunks(vec![
            head.to_vec(),
            Vec::new(),
            tail.to_vec(),
        ])]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, fast_config(), opener, &state);

        assert!(wait_for(|| state.get_fixes().0.is_acquired()).await);
        let device = state.device(DeviceRole::Base);
        assert_eq!(device.fixes_published, 1);
        assert_eq!(device.parse_failures, 0);

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_garbled_stream_faults() {
        let state = SharedState::new();
        let mut config = fast_config();
        config.max_garbled_lines = 3;
        let mut noise = Vec::new();
        for _ in 0..3 {
            noise.extend_from_slice(&[0xF0, 0x9F, 0x0D, 0xFF, b'\n']);
        }
        let opener = ScriptedOpener::new(vec![Script::Bytes(noise)]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, config, opener, &state);

        assert!(wait_for(|| state.device(DeviceRole::Base).faults >= 1).await);
        let device = state.device(DeviceRole::Base);
        assert_eq!(device.parse_failures, 3);
        assert!(device.last_error.unwrap().contains("undecodable"));

        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_only_accepted_sentences_publish() {
        let rmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

        let state = SharedState::new();
        let opener = ScriptedOpener::new(vec![Script::Lines(rmc.to_string())]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, fast_config(), opener, &state);
        assert!(wait_for(|| state.device(DeviceRole::Base).faults >= 1).await);
        assert!(!state.get_fixes().0.is_acquired());
        shutdown.send(true).unwrap();
        handle.await.unwrap();

        let state = SharedState::new();
        let mut config = fast_config();
        config.accept = vec![nmea::SentenceKind::Rmc];
        let opener = ScriptedOpener::new(vec![Script::Lines(rmc.to_string())]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Base, config, opener, &state);
        assert!(wait_for(|| state.get_fixes().0.is_acquired()).await);
        assert_eq!(state.get_fixes().0.horizontal_dilution, crate::types::UNKNOWN_HDOP);
        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_for_retry() {
        let state = SharedState::new();
        let mut config = fast_config();
        config.reconnect_backoff_secs = 30.0;
        config.max_backoff_secs = 30.0;
        let opener = ScriptedOpener::new(vec![]);
        let (shutdown, handle, _obs) = spawn_reader(DeviceRole::Rover, config, opener, &state);

        assert!(wait_for(|| state.device(DeviceRole::Rover).failed_opens == 1).await);
        shutdown.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reader ignored shutdown")
            .unwrap();
        assert_eq!(
            state.device(DeviceRole::Rover).state,
            DeviceConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn test_tty_opener_reads_plain_files() {
        let missing = DeviceConfig::new("/nonexistent/ttyUSB9");
        assert!(matches!(
            TtyOpener.open(DeviceRole::Base, &missing),
            Err(ConnectionFailure::NotFound(_))
        ));

        let path = std::env::temp_dir().join(format!("gnss_compass_capture_{}.nmea", std::process::id()));
        std::fs::write(&path, BASE_GGA).unwrap();
        let mut stream = TtyOpener.open(DeviceRole::Base, &DeviceConfig::new(&path)).unwrap();
        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        assert_eq!(line, BASE_GGA);
        std::fs::remove_file(&path).unwrap();
    }
}
