//! Background model loading
//!
//! A load is single-shot: one thread reads the file, reporting progress,
//! parses it and sends exactly one terminal event. There is no cancellation
//! or retry; if the handle is dropped the thread finishes and its sends fail
//! silently.

use crate::{check_extension, GltfReader, IoError};
use modelview_core::SceneNode;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 64 * 1024;

/// Events emitted by a running load
#[derive(Debug)]
pub enum LoadEvent {
    /// `total` is zero when the size is unknown
    Progress { loaded: u64, total: u64 },
    Loaded(SceneNode),
    Failed(IoError),
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress { .. })
    }
}

/// Receiving end of a load started with [`spawn_load`]
pub struct LoadHandle {
    path: PathBuf,
    receiver: flume::Receiver<LoadEvent>,
    finished: bool,
}

impl LoadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the terminal event has been received
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain every event that is ready without blocking
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.receiver.try_iter().collect();
        if events.iter().any(LoadEvent::is_terminal) {
            self.finished = true;
        }
        events
    }

    /// Block until the load completes, discarding progress
    pub fn wait(mut self) -> Result<SceneNode, IoError> {
        while let Ok(event) = self.receiver.recv() {
            match event {
                LoadEvent::Progress { .. } => {}
                LoadEvent::Loaded(scene) => return Ok(scene),
                LoadEvent::Failed(e) => return Err(e),
            }
        }
        Err(IoError::ParseError {
            message: format!("loader for {} exited without a result", self.path.display()),
        })
    }
}

/// Start loading `path` on a background thread
pub fn spawn_load<P: AsRef<Path>>(path: P) -> LoadHandle {
    let path = path.as_ref().to_path_buf();
    let (sender, receiver) = flume::unbounded();

    let thread_path = path.clone();
    let spawned = std::thread::Builder::new()
        .name("model-loader".to_string())
        .spawn(move || {
            let result = load_with_progress(&thread_path, &sender);
            let event = match result {
                Ok(scene) => LoadEvent::Loaded(scene),
                Err(e) => LoadEvent::Failed(e),
            };
            let _ = sender.send(event);
        });

    let mut handle = LoadHandle {
        path,
        receiver,
        finished: false,
    };
    if let Err(e) = spawned {
        // No thread means no sender is left alive; surface the failure through poll()
        let (sender, receiver) = flume::unbounded();
        let _ = sender.send(LoadEvent::Failed(IoError::Io(e)));
        handle.receiver = receiver;
    }
    handle
}

fn load_with_progress(path: &Path, sender: &flume::Sender<LoadEvent>) -> Result<SceneNode, IoError> {
    check_extension(path)?;

    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IoError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => IoError::Io(e),
    })?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        let _ = sender.send(LoadEvent::Progress {
            loaded: bytes.len() as u64,
            total,
        });
    }

    GltfReader::from_slice(&bytes, path.parent())
}
