//! A thin convenience layer over OpenGL: shader programs with named vertex
//! buffers, and offscreen framebuffers.
//!
//! # Context
//!
//! All objects are created from a `Context`, a reference counted handle to the
//! `Device` of the graphics context owned by the current thread. The handle is
//! neither `Send` nor `Sync`, so the objects built from it stay on the thread
//! the context is current on.
//!
//! ```rust
//! use glkit::video::prelude::*;
//!
//! let ctx = Context::headless(Version::ES(2, 0));
//! assert!(!ctx.supports(Capability::GeometryShader));
//! ```
//!
//! # Ownership
//!
//! `ShaderProgram` and `Framebuffer` own the context objects they create and
//! release them in `free`, which also runs when they are dropped. Buffers
//! shared with `ShaderProgram::share_attrib` stay owned by the lending program.

pub mod backends;
pub mod capabilities;
pub mod errors;
pub mod framebuffer;
pub mod shader;
pub mod tga;
pub mod types;

pub mod prelude {
    pub use super::capabilities::{Capability, Version};
    pub use super::errors::Error as VideoError;
    pub use super::framebuffer::{Framebuffer, FramebufferParams};
    pub use super::shader::{Binding, NamedBuffer, ShaderProgram};
    pub use super::types::{Primitive, ShaderStage, UniformVariable, VertexFormat};
    pub use super::Context;
}

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use self::backends::headless::HeadlessDevice;
use self::backends::Device;
use self::capabilities::{Capability, Version};

/// Shared handle to the graphics context of the current thread.
#[derive(Clone)]
pub struct Context {
    device: Rc<RefCell<dyn Device>>,
}

impl Context {
    pub fn new<T: Device + 'static>(device: T) -> Self {
        Context {
            device: Rc::new(RefCell::new(device)),
        }
    }

    /// Wraps a device the caller keeps its own handle to.
    pub fn from_shared<T: Device + 'static>(device: Rc<RefCell<T>>) -> Self {
        Context { device }
    }

    /// Creates a context backed by an in-memory device emulating `version`.
    pub fn headless(version: Version) -> Self {
        Context::new(HeadlessDevice::new(version))
    }

    /// Creates a context for the OpenGL context that is current on this thread.
    ///
    /// # Safety
    ///
    /// The functions must have been loaded with `backends::gl::load_with`,
    /// and the context must stay current while the returned handle is used.
    #[cfg(not(target_arch = "wasm32"))]
    pub unsafe fn gl() -> errors::Result<Self> {
        let device = self::backends::gl::GLDevice::new()?;
        Ok(Context::new(device))
    }

    pub fn version(&self) -> Version {
        self.device.borrow().capabilities().version
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.device.borrow().capabilities().supports(capability)
    }

    #[inline]
    pub(crate) fn device(&self) -> RefMut<'_, dyn Device + 'static> {
        self.device.borrow_mut()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("version", &self.version())
            .finish()
    }
}
