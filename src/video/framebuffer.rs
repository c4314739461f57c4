//! Offscreen render targets.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::color::Color;
use crate::math::vector::Vector2i;

use super::capabilities::Capability;
use super::errors::*;
use super::tga;
use super::types::*;
use super::Context;

/// The setup parameters of a `Framebuffer`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferParams {
    /// Size of the render targets in pixels.
    pub size: Vector2i,
    /// Samples per pixel. Values above 1 request multisampled storage, which
    /// falls back to a single sample if the context can not provide it.
    pub samples: u32,
}

impl Default for FramebufferParams {
    fn default() -> Self {
        FramebufferParams {
            size: Vector2i::new(800, 600),
            samples: 1,
        }
    }
}

/// A color plus depth/stencil render target.
///
/// Rendering between `bind` and `release` goes into the framebuffer instead of
/// the window. Its contents can be copied to the window with `blit`, or read
/// back with `download_pixels` and `download_tga`.
#[derive(Debug)]
pub struct Framebuffer {
    ctx: Context,
    params: FramebufferParams,
    color: Option<ObjectId>,
    depth_stencil: Option<ObjectId>,
    framebuffer: Option<ObjectId>,
}

impl Framebuffer {
    pub fn new(ctx: &Context) -> Self {
        Framebuffer {
            ctx: ctx.clone(),
            params: FramebufferParams::default(),
            color: None,
            depth_stencil: None,
            framebuffer: None,
        }
    }

    #[inline]
    pub fn init(&mut self, size: Vector2i, samples: u32) -> Result<()> {
        self.init_with(FramebufferParams { size, samples })
    }

    /// Allocates the render targets. The framebuffer is left unbound.
    ///
    /// Objects from a previous `init` are released first. If the framebuffer
    /// turns out to be incomplete, everything is released again and
    /// `Error::FramebufferIncomplete` carries the status of the context.
    pub fn init_with(&mut self, params: FramebufferParams) -> Result<()> {
        if self.ready() {
            self.free()?;
        }

        let samples = if params.samples > 1 && self.ctx.supports(Capability::MultisampleStorage) {
            params.samples
        } else {
            1
        };

        self.params = FramebufferParams {
            size: params.size,
            samples,
        };

        let result = unsafe { self.allocate() };
        if result.is_err() {
            if let Err(err) = self.free() {
                error!("Failed to release incomplete framebuffer: {}", err);
            }
        }

        result
    }

    unsafe fn allocate(&mut self) -> Result<()> {
        let FramebufferParams { size, samples } = self.params;
        let mut device = self.ctx.device();

        self.color = Some(device.create_renderbuffer(RenderbufferFormat::RGBA8, size, samples)?);
        self.depth_stencil = Some(device.create_renderbuffer(
            RenderbufferFormat::Depth24Stencil8,
            size,
            samples,
        )?);

        let (id, status) = device.create_framebuffer(
            self.color.unwrap_or_default(),
            self.depth_stencil.unwrap_or_default(),
        )?;

        self.framebuffer = Some(id);
        device.bind_framebuffer(None)?;

        if status != FRAMEBUFFER_COMPLETE {
            return Err(Error::FramebufferIncomplete(status));
        }

        debug!(
            "Created framebuffer {} ({}x{}, {} samples).",
            id, size.x, size.y, samples
        );

        Ok(())
    }

    /// Returns true if the render targets have been allocated.
    #[inline]
    pub fn ready(&self) -> bool {
        self.framebuffer.is_some()
    }

    /// The effective number of samples per pixel.
    #[inline]
    pub fn samples(&self) -> u32 {
        self.params.samples
    }

    #[inline]
    pub fn size(&self) -> Vector2i {
        self.params.size
    }

    #[inline]
    pub fn id(&self) -> Option<ObjectId> {
        self.framebuffer
    }

    #[inline]
    pub fn color_id(&self) -> Option<ObjectId> {
        self.color
    }

    #[inline]
    pub fn depth_stencil_id(&self) -> Option<ObjectId> {
        self.depth_stencil
    }

    /// Makes the framebuffer the render target. Must be paired with `release`.
    pub fn bind(&self) -> Result<()> {
        let id = self.framebuffer()?;
        let mut device = self.ctx.device();

        unsafe {
            device.bind_framebuffer(Some(id))?;
            if self.params.samples > 1 {
                device.set_multisample(true)?;
            }
        }

        Ok(())
    }

    /// Restores the default render target.
    pub fn release(&self) -> Result<()> {
        let mut device = self.ctx.device();

        unsafe {
            device.bind_framebuffer(None)?;
            if self.params.samples > 1 {
                device.set_multisample(false)?;
            }
        }

        Ok(())
    }

    /// Clears color, depth and stencil of the bound render target.
    pub fn clear(&self, color: Color) -> Result<()> {
        self.framebuffer()?;
        unsafe { self.ctx.device().clear(Some(color), Some(1.0), Some(0)) }
    }

    /// Copies color and depth into the window at the same coordinates.
    pub fn blit(&self) -> Result<()> {
        if !self.ctx.supports(Capability::FramebufferBlit) {
            return Err(Error::Unsupported {
                operation: "framebuffer blit",
                capability: Capability::FramebufferBlit,
            });
        }

        let id = self.framebuffer()?;
        unsafe { self.ctx.device().blit_framebuffer(id, self.params.size) }
    }

    /// Reads the color buffer back as BGRA rows from top to bottom.
    pub fn download_pixels(&self) -> Result<Vec<u8>> {
        if !self.ctx.supports(Capability::PixelReadback) {
            return Err(Error::Unsupported {
                operation: "pixel readback",
                capability: Capability::PixelReadback,
            });
        }

        let id = self.framebuffer()?;
        let size = self.params.size;
        let stride = size.x.max(0) as usize * 4;
        let mut pixels = vec![0; stride * size.y.max(0) as usize];

        unsafe { self.ctx.device().read_pixels(id, size, &mut pixels)? };
        Ok(tga::flip_rows(&pixels, stride))
    }

    /// Saves the color buffer as an uncompressed TGA image.
    pub fn download_tga<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let size = self.params.size;
        tga::check_size(size.x, size.y)?;

        let pixels = self.download_pixels()?;
        let path = path.as_ref();
        let file = File::create(path)?;

        tga::write(BufWriter::new(file), size.x, size.y, &pixels)?;
        info!("Saved {}x{} framebuffer to {:?}.", size.x, size.y, path);
        Ok(())
    }

    /// Releases the render targets and the framebuffer object. Calling `free`
    /// again is a no-op.
    pub fn free(&mut self) -> Result<()> {
        let mut result = Ok(());
        let mut device = self.ctx.device();

        unsafe {
            if let Some(id) = self.framebuffer.take() {
                keep_first(&mut result, device.delete_framebuffer(id));
            }

            for id in self.color.take().into_iter().chain(self.depth_stencil.take()) {
                keep_first(&mut result, device.delete_renderbuffer(id));
            }
        }

        result
    }

    fn framebuffer(&self) -> Result<ObjectId> {
        self.framebuffer
            .ok_or_else(|| Error::Uninitialized("Framebuffer".into()))
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Err(err) = self.free() {
            error!("{}", err);
        }
    }
}
