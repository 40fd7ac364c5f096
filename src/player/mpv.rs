use crate::app::events::Event;
use crate::error::PlaybackError;
use crate::player::{AudioOutput, OutputEvent, OutputSignal, ResourceId};
use anyhow::Context;
use serde_json::json;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};

/// No resource loaded.
const NONE: ResourceId = 0;

/// `loadfile` request ids awaiting their reply, with the resource they load.
type PendingLoads = Arc<Mutex<HashMap<u64, ResourceId>>>;

#[derive(Debug)]
struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::io::WriteHalf<UnixStream>,
    request_id: u64,
    loads: PendingLoads,
}

#[derive(Debug)]
enum MpvCommand {
    Load(PathBuf, ResourceId),
    SetPause(bool),
    Stop,
    SetVolume(u8),
}

impl MpvHandle {
    async fn spawn(
        event_tx: mpsc::Sender<Event>,
        current: Arc<AtomicU64>,
        audio_device: Option<&str>,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join(format!("cadenza-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args([
            "--no-video",
            "--idle=yes",
            "--input-terminal=no",
            "--really-quiet",
            "--keep-open=no",
        ]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn mpv")?;

        // mpv creates the socket shortly after starting.
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        let loads = PendingLoads::default();
        let tagger = EventTagger::new(current, loads.clone());
        tokio::spawn(read_events_loop(reader, event_tx, tagger));

        let mut this = Self {
            child,
            socket_path,
            writer,
            request_id: 1,
            loads,
        };

        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "time-pos"]}))
            .await?;

        Ok(this)
    }

    async fn run(&mut self, cmd: MpvCommand) -> anyhow::Result<()> {
        match cmd {
            MpvCommand::Load(path, resource) => {
                let path = path.to_string_lossy().into_owned();
                self.command(json!({"command":["set_property", "pause", false]}))
                    .await?;
                if let Ok(mut loads) = self.loads.lock() {
                    loads.insert(self.request_id, resource);
                }
                self.command(json!({"command":["loadfile", path, "replace"]}))
                    .await
            }
            MpvCommand::SetPause(paused) => {
                self.command(json!({"command":["set_property", "pause", paused]}))
                    .await
            }
            MpvCommand::Stop => self.command(json!({"command":["stop"]})).await,
            MpvCommand::SetVolume(v) => {
                self.command(json!({"command":["set_property", "volume", v]}))
                    .await
            }
        }
    }

    async fn command(&mut self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so failures come back as structured replies.
        if let serde_json::Value::Object(ref mut o) = v {
            o.insert("request_id".to_string(), serde_json::Value::from(self.request_id));
        }
        self.request_id += 1;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        self.writer.write_all(&line).await.context("write mpv ipc")?;
        self.writer.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(
    reader: impl AsyncRead + Unpin,
    event_tx: mpsc::Sender<Event>,
    mut tagger: EventTagger,
) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "read mpv ipc");
                break;
            }
        };
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        let Some(signal) = tagger.tag(&v) else {
            continue;
        };
        if event_tx.send(Event::Output(signal)).await.is_err() {
            return;
        }
    }

    // mpv is gone; whatever it was playing cannot finish.
    let resource = tagger.current.load(Ordering::Acquire);
    if resource != NONE {
        tracing::warn!(resource, "mpv ipc closed during playback");
        let event = OutputEvent::Failed("mpv exited".to_string());
        let _ = event_tx
            .send(Event::Output(OutputSignal { resource, event }))
            .await;
    }
}

/// Attributes mpv events to the resource whose file produced them.
///
/// The `loadfile` reply names the playlist entry created for a resource, and
/// `start-file`/`end-file` carry that entry id, so an `end-file` read after
/// the next resource was acquired still lands on the file that ended.
struct EventTagger {
    current: Arc<AtomicU64>,
    loads: PendingLoads,
    entries: HashMap<u64, ResourceId>,
    playing: ResourceId,
}

impl EventTagger {
    fn new(current: Arc<AtomicU64>, loads: PendingLoads) -> Self {
        Self {
            current,
            loads,
            entries: HashMap::new(),
            playing: NONE,
        }
    }

    fn tag(&mut self, v: &serde_json::Value) -> Option<OutputSignal> {
        let owner = self.owner(v);
        let event = map_mpv_event(v)?;
        let resource = owner.unwrap_or_else(|| self.current.load(Ordering::Acquire));
        (resource != NONE).then_some(OutputSignal { resource, event })
    }

    fn owner(&mut self, v: &serde_json::Value) -> Option<ResourceId> {
        if let Some(request_id) = v.get("request_id").and_then(|r| r.as_u64()) {
            let resource = self.loads.lock().ok()?.remove(&request_id)?;
            if let Some(entry) = v.pointer("/data/playlist_entry_id").and_then(|e| e.as_u64()) {
                self.entries.insert(entry, resource);
            }
            return Some(resource);
        }

        let entry = v.get("playlist_entry_id").and_then(|e| e.as_u64());
        let playing = (self.playing != NONE).then_some(self.playing);
        match v.get("event").and_then(|e| e.as_str()) {
            Some("start-file") => {
                let resource = entry
                    .and_then(|e| self.entries.get(&e).copied())
                    .unwrap_or_else(|| self.current.load(Ordering::Acquire));
                self.playing = resource;
                Some(resource)
            }
            Some("end-file") => entry.and_then(|e| self.entries.remove(&e)).or(playing),
            _ => playing,
        }
    }
}

fn map_mpv_event(v: &serde_json::Value) -> Option<OutputEvent> {
    // Command replies: {"request_id":..., "error":"..."}
    if let (Some(_), Some(err)) = (v.get("request_id"), v.get("error").and_then(|e| e.as_str())) {
        return (err != "success").then(|| OutputEvent::Failed(format!("mpv ipc error: {err}")));
    }

    match v.get("event")?.as_str()? {
        "playback-restart" => Some(OutputEvent::Started),
        "property-change" => match v.get("name")?.as_str()? {
            "time-pos" => v.get("data")?.as_f64().map(OutputEvent::Position),
            _ => None,
        },
        "end-file" => {
            // Replacing or stopping the file also ends it; only eof and
            // error matter for the resource that was playing.
            match v.get("reason").and_then(|x| x.as_str()).unwrap_or("") {
                "eof" => Some(OutputEvent::Ended),
                "error" => {
                    let err = v.get("file_error").or_else(|| v.get("error"));
                    let err = err.and_then(|x| x.as_str()).unwrap_or("unknown");
                    Some(OutputEvent::Failed(format!("mpv end-file error: {err}")))
                }
                _ => None,
            }
        }
        "log-message" => {
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if !text.is_empty() {
                tracing::warn!(target: "cadenza::mpv", level, "{text}");
            }
            None
        }
        _ => None,
    }
}

/// Audio output backed by an mpv child process.
///
/// Each acquired preview is written to a temp file that lives exactly as long
/// as the resource; release deletes it.
pub struct MpvOutput {
    cmd_tx: Option<mpsc::UnboundedSender<MpvCommand>>,
    current: Arc<AtomicU64>,
    dir: PathBuf,
    files: HashMap<ResourceId, PathBuf>,
}

impl MpvOutput {
    pub async fn spawn(
        event_tx: mpsc::Sender<Event>,
        audio_device: Option<&str>,
        dir: &Path,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
        let current = Arc::new(AtomicU64::new(NONE));
        let log_file = dir.join("mpv.log");
        let mut handle =
            MpvHandle::spawn(event_tx.clone(), current.clone(), audio_device, Some(&log_file))
                .await?;

        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<MpvCommand>();
        let driver_current = current.clone();
        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                if let Err(e) = handle.run(cmd).await {
                    tracing::warn!(error = %format!("{e:#}"), "mpv command failed");
                    let resource = driver_current.load(Ordering::Acquire);
                    if resource != NONE {
                        let event = OutputEvent::Failed(format!("{e:#}"));
                        let _ = event_tx
                            .send(Event::Output(OutputSignal { resource, event }))
                            .await;
                    }
                }
            }
        });

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            current,
            dir: dir.to_path_buf(),
            files: HashMap::new(),
        })
    }

    /// Output that rejects every acquire; used when mpv cannot be started.
    pub fn disabled(dir: &Path) -> Self {
        Self {
            cmd_tx: None,
            current: Arc::new(AtomicU64::new(NONE)),
            dir: dir.to_path_buf(),
            files: HashMap::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.cmd_tx.is_some()
    }

    pub fn set_volume(&self, volume_0_100: u8) {
        self.send(MpvCommand::SetVolume(volume_0_100.min(100)));
    }

    fn send(&self, cmd: MpvCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(cmd);
        }
    }
}

impl AudioOutput for MpvOutput {
    fn acquire(&mut self, id: ResourceId, key: &str, audio: Vec<u8>) -> Result<(), PlaybackError> {
        if !self.is_available() {
            return Err(PlaybackError::Unavailable);
        }
        let path = self.dir.join(preview_file_name(key, id));
        std::fs::write(&path, &audio)
            .map_err(|e| PlaybackError::Output(format!("write {}: {e}", path.display())))?;
        self.files.insert(id, path.clone());
        self.current.store(id, Ordering::Release);
        self.send(MpvCommand::Load(path, id));
        Ok(())
    }

    fn pause(&mut self, id: ResourceId) {
        if self.current.load(Ordering::Acquire) == id {
            self.send(MpvCommand::SetPause(true));
        }
    }

    fn resume(&mut self, id: ResourceId) {
        if self.current.load(Ordering::Acquire) == id {
            self.send(MpvCommand::SetPause(false));
        }
    }

    fn release(&mut self, id: ResourceId) {
        if self
            .current
            .compare_exchange(id, NONE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.send(MpvCommand::Stop);
        }
        if let Some(path) = self.files.remove(&id) {
            // mpv may still have the file open; unlinking is fine on unix.
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!(path = %path.display(), error = %e, "remove preview file");
            }
        }
    }
}

impl Drop for MpvOutput {
    fn drop(&mut self) {
        for (_, path) in self.files.drain() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn preview_file_name(key: &str, id: ResourceId) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    format!("preview-{}-{id}.audio", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_file_name_is_path_safe() {
        let name = preview_file_name("../../etc:passwd", 3);
        assert!(name.starts_with("preview-"));
        assert!(name.ends_with("-3.audio"));
        assert!(!name.contains('/'));
        assert!(!name.contains(':'));
        assert_eq!(name, preview_file_name("../../etc:passwd", 3));
    }

    #[test]
    fn test_map_end_file_reasons() {
        let eof = json!({"event": "end-file", "reason": "eof"});
        assert_eq!(map_mpv_event(&eof), Some(OutputEvent::Ended));

        let replaced = json!({"event": "end-file", "reason": "stop"});
        assert_eq!(map_mpv_event(&replaced), None);

        let failed = json!({"event": "end-file", "reason": "error", "file_error": "unrecognized file format"});
        assert!(matches!(map_mpv_event(&failed), Some(OutputEvent::Failed(m)) if m.contains("unrecognized")));
    }

    #[test]
    fn test_map_progress_events() {
        let started = json!({"event": "playback-restart"});
        assert_eq!(map_mpv_event(&started), Some(OutputEvent::Started));

        let pos = json!({"event": "property-change", "id": 1, "name": "time-pos", "data": 2.5});
        assert_eq!(map_mpv_event(&pos), Some(OutputEvent::Position(2.5)));

        let unset = json!({"event": "property-change", "id": 1, "name": "time-pos"});
        assert_eq!(map_mpv_event(&unset), None);
    }

    #[test]
    fn test_map_command_replies() {
        let ok = json!({"request_id": 4, "error": "success"});
        assert_eq!(map_mpv_event(&ok), None);

        let bad = json!({"request_id": 5, "error": "invalid parameter"});
        assert!(matches!(map_mpv_event(&bad), Some(OutputEvent::Failed(_))));
    }

    #[test]
    fn test_late_end_file_keeps_its_resource() {
        let current = Arc::new(AtomicU64::new(1));
        let loads = PendingLoads::default();
        loads.lock().unwrap().insert(10, 1);
        let mut tagger = EventTagger::new(current.clone(), loads.clone());

        let reply = json!({"request_id": 10, "error": "success", "data": {"playlist_entry_id": 3}});
        assert_eq!(tagger.tag(&reply), None);
        assert_eq!(tagger.tag(&json!({"event": "start-file", "playlist_entry_id": 3})), None);
        assert_eq!(
            tagger.tag(&json!({"event": "playback-restart"})),
            Some(OutputSignal { resource: 1, event: OutputEvent::Started })
        );

        // The next preview is acquired before the first one's eof is read.
        current.store(2, Ordering::Release);
        loads.lock().unwrap().insert(11, 2);
        let eof = json!({"event": "end-file", "reason": "eof", "playlist_entry_id": 3});
        assert_eq!(
            tagger.tag(&eof),
            Some(OutputSignal { resource: 1, event: OutputEvent::Ended })
        );

        let reply = json!({"request_id": 11, "error": "success", "data": {"playlist_entry_id": 4}});
        tagger.tag(&reply);
        tagger.tag(&json!({"event": "start-file", "playlist_entry_id": 4}));
        assert_eq!(
            tagger.tag(&json!({"event": "playback-restart"})),
            Some(OutputSignal { resource: 2, event: OutputEvent::Started })
        );
    }

    #[test]
    fn test_failed_load_reply_targets_its_resource() {
        let current = Arc::new(AtomicU64::new(5));
        let loads = PendingLoads::default();
        loads.lock().unwrap().insert(8, 4);
        let mut tagger = EventTagger::new(current, loads.clone());

        let reply = json!({"request_id": 8, "error": "loading failed"});
        assert!(matches!(
            tagger.tag(&reply),
            Some(OutputSignal { resource: 4, event: OutputEvent::Failed(_) })
        ));
        assert!(loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ipc_close_fails_held_resource() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let current = Arc::new(AtomicU64::new(7));
        drop(theirs);

        read_events_loop(ours, tx, EventTagger::new(current, PendingLoads::default())).await;

        match rx.try_recv() {
            Ok(Event::Output(OutputSignal { resource: 7, event: OutputEvent::Failed(msg) })) => {
                assert!(msg.contains("exited"));
            }
            other => panic!("expected a failure for resource 7, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ipc_close_when_idle_is_silent() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        drop(theirs);

        let idle = Arc::new(AtomicU64::new(NONE));
        read_events_loop(ours, tx, EventTagger::new(idle, PendingLoads::default())).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_output_rejects_acquire() {
        let dir = std::env::temp_dir().join("cadenza-test-disabled");
        let mut out = MpvOutput::disabled(&dir);
        assert!(matches!(
            out.acquire(1, "k", vec![1, 2]),
            Err(PlaybackError::Unavailable)
        ));
        out.release(1);
    }
}
