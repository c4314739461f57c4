//! # What is This?
//!
//! `glkit` is the small rendering layer a desktop GUI toolkit sits on: RGBA
//! colors, fixed size vectors, an arcball controller and a thin wrapper around
//! OpenGL that compiles and links shader programs, manages their named vertex
//! buffers and renders into offscreen framebuffers.
//!
//! Every GPU object is created through a `video::Context`, which is a shared
//! handle to the graphics context of the current thread. The context is backed
//! either by a real OpenGL device or by the in-memory headless device.
//!
//! ```rust
//! use glkit::prelude::*;
//!
//! let ctx = Context::headless(Version::GL(3, 3));
//!
//! let vs = "#version 330\nin vec3 position;\nvoid main() { gl_Position = vec4(position, 1.0); }";
//! let fs = "#version 330\nout vec4 color;\nvoid main() { color = vec4(1.0); }";
//!
//! let mut shader = ShaderProgram::new(&ctx);
//! shader.init("triangle", vs, fs, "").unwrap();
//! shader.bind().unwrap();
//! shader.upload_indices(&[0u32, 1, 2], 3, 0).unwrap();
//! shader.upload_attrib("position", &[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3, 0).unwrap();
//! shader.draw_indexed(Primitive::Triangles, 0, 1).unwrap();
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

pub mod math;
pub mod video;

pub mod prelude {
    pub use crate::math::prelude::*;
    pub use crate::video::prelude::*;
}
