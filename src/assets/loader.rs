//! Asynchronous auxiliary texture loading.
//!
//! ```text
//! load()  ──spawn──▶ worker thread: read + decode (image)
//!                          │
//!                          ▼  flume channel
//! drain() ◀── start of frame: upload into the placeholder target
//! ```
//!
//! GPU resources are only touched from [`AuxTextureLoader::drain`], which the
//! camera calls at a fixed point of the frame. A failed load is logged and
//! the target keeps its previous contents.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};

use crate::device::GpuDevice;
use crate::errors::Result;
use crate::renderer::pool::{RenderTargetPool, TargetHandle};

/// Where an image is read from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    /// Encoded file contents (PNG, ...).
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Reads and decodes `source` into RGBA8.
pub fn decode_image(source: &ImageSource) -> Result<DecodedImage> {
    let image = match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path)?;
            image::load_from_memory(&bytes)?
        }
        ImageSource::Bytes(bytes) => image::load_from_memory(bytes)?,
    };
    let rgba = image.into_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

struct CompletedLoad {
    label: &'static str,
    target: TargetHandle,
    result: Result<DecodedImage>,
}

pub struct AuxTextureLoader {
    sender: Sender<CompletedLoad>,
    receiver: Receiver<CompletedLoad>,
    in_flight: usize,
}

impl Default for AuxTextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxTextureLoader {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Starts decoding `source` on a worker thread. The result is uploaded
    /// into `target` by the next [`drain`](Self::drain).
    pub fn load(&mut self, label: &'static str, target: TargetHandle, source: ImageSource) {
        let sender = self.sender.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = decode_image(&source);
            // The loader may have been dropped; nothing is waiting then.
            let _ = sender.send(CompletedLoad {
                label,
                target,
                result,
            });
        });
    }

    /// Loads not yet uploaded.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Uploads every completed load without blocking. Returns the number of
    /// textures uploaded.
    pub fn drain(&mut self, device: &mut dyn GpuDevice, pool: &mut RenderTargetPool) -> usize {
        let mut uploaded = 0;
        while let Ok(load) = self.receiver.try_recv() {
            if self.complete(device, pool, load) {
                uploaded += 1;
            }
        }
        uploaded
    }

    /// Blocks until every started load finished (or `timeout` elapsed) and
    /// uploads the results.
    pub fn drain_blocking(
        &mut self,
        device: &mut dyn GpuDevice,
        pool: &mut RenderTargetPool,
        timeout: Duration,
    ) -> usize {
        let deadline = Instant::now() + timeout;
        let mut uploaded = 0;
        while self.in_flight > 0 {
            let Ok(load) = self.receiver.recv_deadline(deadline) else {
                break;
            };
            if self.complete(device, pool, load) {
                uploaded += 1;
            }
        }
        uploaded
    }

    fn complete(
        &mut self,
        device: &mut dyn GpuDevice,
        pool: &mut RenderTargetPool,
        load: CompletedLoad,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let image = match load.result {
            Ok(image) => image,
            Err(e) => {
                log::error!("Failed to load texture '{}': {e}", load.label);
                return false;
            }
        };
        match pool.write_pixels(device, load.target, image.width, image.height, &image.pixels) {
            Ok(()) => {
                log::debug!(
                    "Uploaded texture '{}' ({}x{})",
                    load.label,
                    image.width,
                    image.height
                );
                true
            }
            Err(e) => {
                log::error!("Failed to upload texture '{}': {e}", load.label);
                false
            }
        }
    }
}
