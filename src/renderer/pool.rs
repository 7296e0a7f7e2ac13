//! Render Target Pool
//!
//! Arena of every offscreen image the frame graph uses.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 RenderTargetPool                      │
//! │                                                      │
//! │  targets: SlotMap<TargetHandle, RenderTarget>        │
//! │  viewport: the extent viewport-scaled targets follow │
//! │                                                      │
//! │  create()        → TargetHandle  (init)              │
//! │  ensure_sized()  → ResizeReport  (viewport change)   │
//! │  write_pixels()                  (async uploads)     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Handles are stable for the lifetime of the pool. Resizing recreates the
//! GPU storage behind a handle but never the handle itself, so passes built
//! once at initialization keep pointing at the right images.

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use super::target::{RenderTarget, RenderTargetDesc};
use crate::device::{GpuDevice, GpuTextureId, TextureDesc, Viewport};
use crate::errors::{PrismError, Result};

new_key_type! {
    /// Stable reference to a pooled render target.
    pub struct TargetHandle;
}

/// Targets reallocated by one [`RenderTargetPool::ensure_sized`] call.
#[derive(Debug, Default, Clone)]
pub struct ResizeReport {
    pub reallocated: SmallVec<[TargetHandle; 16]>,
}

impl ResizeReport {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reallocated.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.reallocated.len()
    }
}

pub struct RenderTargetPool {
    targets: SlotMap<TargetHandle, RenderTarget>,
    viewport: Viewport,
    batches: u64,
}

impl RenderTargetPool {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            targets: SlotMap::with_key(),
            viewport,
            batches: 0,
        }
    }

    /// Allocates a target sized against the pool's current viewport.
    pub fn create(
        &mut self,
        device: &mut dyn GpuDevice,
        desc: RenderTargetDesc,
    ) -> Result<TargetHandle> {
        let (width, height) = desc.size.resolve(&self.viewport);
        let gpu = device.create_texture(&TextureDesc {
            label: desc.name,
            width,
            height,
            format: desc.format,
            filter: desc.filter,
            wrap: desc.wrap,
        })?;
        log::debug!("Allocated target '{}' ({width}x{height}, {:?})", desc.name, desc.format);
        Ok(self.targets.insert(RenderTarget {
            desc,
            width,
            height,
            gpu,
            generation: 0,
        }))
    }

    /// Brings every viewport-scaled target to `floor(viewport * scale)`.
    ///
    /// Only targets whose extent differs are reallocated, all in one batch.
    /// Calling it again with the same viewport is a no-op. The pool adopts
    /// `viewport` only once every reallocation succeeded.
    pub fn ensure_sized(
        &mut self,
        device: &mut dyn GpuDevice,
        viewport: Viewport,
    ) -> Result<ResizeReport> {
        let mut report = ResizeReport::default();

        for (handle, target) in &mut self.targets {
            if !target.desc.size.follows_viewport() {
                continue;
            }
            let (width, height) = target.desc.size.resolve(&viewport);
            if (width, height) == (target.width, target.height) {
                continue;
            }
            device.reallocate_texture(target.gpu, width, height)?;
            log::debug!(
                "Resized target '{}' {}x{} -> {width}x{height}",
                target.desc.name,
                target.width,
                target.height
            );
            target.width = width;
            target.height = height;
            target.generation += 1;
            report.reallocated.push(handle);
        }

        self.viewport = viewport;
        if !report.is_empty() {
            self.batches += 1;
        }
        Ok(report)
    }

    /// Replaces the contents of a target, adopting the data's extent.
    pub fn write_pixels(
        &mut self,
        device: &mut dyn GpuDevice,
        handle: TargetHandle,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<()> {
        let target = self
            .targets
            .get_mut(handle)
            .ok_or(PrismError::UnknownTarget)?;
        device.write_texture(target.gpu, width, height, data)?;
        if (width, height) != (target.width, target.height) {
            target.width = width;
            target.height = height;
            target.generation += 1;
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: TargetHandle) -> Option<&RenderTarget> {
        self.targets.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: TargetHandle) -> bool {
        self.targets.contains_key(handle)
    }

    pub fn gpu_texture(&self, handle: TargetHandle) -> Result<GpuTextureId> {
        self.targets
            .get(handle)
            .map(|t| t.gpu)
            .ok_or(PrismError::UnknownTarget)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetHandle, &RenderTarget)> {
        self.targets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of `ensure_sized` calls that reallocated at least one target.
    #[must_use]
    pub fn batches(&self) -> u64 {
        self.batches
    }
}
