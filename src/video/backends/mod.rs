//! The backend of the wrappers, which should be responsible for only one thing:
//! forwarding calls to the graphics context of the current thread.

pub mod headless;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

use crate::math::color::Color;
use crate::math::vector::Vector2i;

use super::capabilities::Capabilities;
use super::errors::*;
use super::types::*;

/// The graphics context capability the shader and framebuffer wrappers are
/// built upon.
///
/// Every call is synchronous from the caller's point of view: it returns after
/// the context accepted (and for compilation, linking and readback, finished)
/// the command.
///
/// # Safety
///
/// All methods require the context to be current on the calling thread, and
/// object ids to be ones this device created and has not deleted yet.
pub trait Device {
    fn capabilities(&self) -> &Capabilities;

    /// Compiles one stage. Failures are reported as `Error::ShaderCompilation`
    /// carrying `name`, the stage, the source and the compiler log.
    unsafe fn compile_shader(
        &mut self,
        name: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ObjectId>;

    unsafe fn delete_shader(&mut self, id: ObjectId) -> Result<()>;

    /// Links the compiled `stages` into a program. Failures are reported as
    /// `Error::ShaderLink` and leave no program object behind.
    unsafe fn link_program(&mut self, name: &str, stages: &[ObjectId]) -> Result<ObjectId>;

    unsafe fn delete_program(&mut self, id: ObjectId) -> Result<()>;

    unsafe fn use_program(&mut self, id: ObjectId) -> Result<()>;

    unsafe fn attribute_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>>;

    unsafe fn uniform_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>>;

    /// Assigns `variable` to the uniform at `location` of the program in use.
    unsafe fn set_uniform(&mut self, location: Location, variable: UniformVariable) -> Result<()>;

    unsafe fn create_vertex_array(&mut self) -> Result<ObjectId>;

    unsafe fn bind_vertex_array(&mut self, id: Option<ObjectId>) -> Result<()>;

    unsafe fn delete_vertex_array(&mut self, id: ObjectId) -> Result<()>;

    unsafe fn create_buffer(&mut self) -> Result<ObjectId>;

    /// Replaces the whole contents of the buffer with `data`, using a usage hint
    /// for data that changes between uploads. Leaves the buffer bound to `target`.
    unsafe fn update_buffer(&mut self, target: BufferTarget, id: ObjectId, data: &[u8])
        -> Result<()>;

    /// Reads the first `out.len()` bytes of the buffer.
    unsafe fn read_buffer(&mut self, target: BufferTarget, id: ObjectId, out: &mut [u8])
        -> Result<()>;

    unsafe fn delete_buffer(&mut self, id: ObjectId) -> Result<()>;

    unsafe fn bind_index_buffer(&mut self, id: ObjectId) -> Result<()>;

    /// Enables the attribute at `location` and points it at `buffer`.
    unsafe fn enable_attribute(
        &mut self,
        location: Location,
        buffer: ObjectId,
        pointer: AttributePointer,
    ) -> Result<()>;

    unsafe fn disable_attribute(&mut self, location: Location) -> Result<()>;

    unsafe fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()>;

    /// Draws `count` indices of the bound index buffer starting at the byte
    /// `offset`.
    unsafe fn draw_elements(
        &mut self,
        primitive: Primitive,
        format: VertexFormat,
        count: u32,
        offset: usize,
    ) -> Result<()>;

    unsafe fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        size: Vector2i,
        samples: u32,
    ) -> Result<ObjectId>;

    unsafe fn delete_renderbuffer(&mut self, id: ObjectId) -> Result<()>;

    /// Creates a framebuffer with the given attachments and returns it with its
    /// completeness status. The framebuffer is left bound.
    unsafe fn create_framebuffer(
        &mut self,
        color: ObjectId,
        depth_stencil: ObjectId,
    ) -> Result<(ObjectId, u32)>;

    unsafe fn delete_framebuffer(&mut self, id: ObjectId) -> Result<()>;

    /// Binds `id` as the render target, or the default surface with `None`.
    unsafe fn bind_framebuffer(&mut self, id: Option<ObjectId>) -> Result<()>;

    unsafe fn set_multisample(&mut self, enable: bool) -> Result<()>;

    /// Clears the buffers of the bound render target.
    unsafe fn clear(
        &mut self,
        color: Option<Color>,
        depth: Option<f32>,
        stencil: Option<i32>,
    ) -> Result<()>;

    /// Copies color and depth of `id` into the default surface, nearest filtered.
    unsafe fn blit_framebuffer(&mut self, id: ObjectId, size: Vector2i) -> Result<()>;

    /// Reads the color buffer of `id` as BGRA bytes, bottom row first.
    unsafe fn read_pixels(&mut self, id: ObjectId, size: Vector2i, out: &mut [u8]) -> Result<()>;
}
