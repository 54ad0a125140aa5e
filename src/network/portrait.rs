use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::{Context, anyhow};
use eframe::egui::ColorImage;
use tracing::{debug, warn};

use crate::util::stable_hash;

const PORTRAIT_EDGE: u32 = 256;
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Where node portraits come from. Loads run on worker threads.
pub trait PortraitSource: Send + Sync {
    fn load(&self, label: &str) -> anyhow::Result<ColorImage>;
}

/// Source used when no portrait directory is configured; every load fails
/// and nodes keep their solid fill.
pub struct NoPortraits;

impl PortraitSource for NoPortraits {
    fn load(&self, label: &str) -> anyhow::Result<ColorImage> {
        Err(anyhow!("no portrait source configured for {label}"))
    }
}

/// Picks one image per label from a directory, deterministically by label
/// hash.
pub struct DirectoryPortraits {
    files: Vec<PathBuf>,
}

impl DirectoryPortraits {
    pub fn scan(dir: &Path) -> anyhow::Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read portrait directory {}", dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list portrait directory {}", dir.display()))?
                .path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        debug!(count = files.len(), dir = %dir.display(), "portrait directory scanned");
        Ok(Self { files })
    }

    pub fn pick(&self, label: &str) -> Option<&Path> {
        if self.files.is_empty() {
            return None;
        }
        let index = (stable_hash(label) % self.files.len() as u64) as usize;
        self.files.get(index).map(PathBuf::as_path)
    }
}

impl PortraitSource for DirectoryPortraits {
    fn load(&self, label: &str) -> anyhow::Result<ColorImage> {
        let path = self
            .pick(label)
            .ok_or_else(|| anyhow!("portrait directory has no images"))?;
        decode_portrait(path)
    }
}

pub fn decode_portrait(path: &Path) -> anyhow::Result<ColorImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode portrait {}", path.display()))?
        .thumbnail(PORTRAIT_EDGE, PORTRAIT_EDGE)
        .to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

/// Texture state of one node. Failures are final.
#[derive(Clone, Debug, Default)]
pub enum PortraitState {
    #[default]
    Unloaded,
    Loading,
    Ready(Arc<ColorImage>),
    Failed,
}

impl PortraitState {
    pub fn image(&self) -> Option<&Arc<ColorImage>> {
        match self {
            Self::Ready(image) => Some(image),
            _ => None,
        }
    }
}

pub struct PortraitLoaded {
    pub node_id: String,
    pub result: Result<ColorImage, String>,
}

/// Runs portrait loads off the frame thread and hands results back through a
/// channel polled once per update.
pub struct PortraitLoader {
    source: Arc<dyn PortraitSource>,
    tx: Sender<PortraitLoaded>,
    rx: Receiver<PortraitLoaded>,
    in_flight: usize,
}

impl PortraitLoader {
    pub fn new(source: Arc<dyn PortraitSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn request(&mut self, node_id: &str, label: &str) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let node_id = node_id.to_owned();
        let label = label.to_owned();
        self.in_flight += 1;

        thread::spawn(move || {
            let result = source.load(&label).map_err(|error| format!("{error:#}"));
            let _ = tx.send(PortraitLoaded { node_id, result });
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn drain(&mut self) -> Vec<PortraitLoaded> {
        let mut loaded = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(result) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    loaded.push(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("portrait worker channel disconnected");
                    break;
                }
            }
        }
        loaded
    }
}

impl Default for PortraitLoader {
    fn default() -> Self {
        Self::new(Arc::new(NoPortraits))
    }
}
