use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use gl;
use gl::types::*;

use crate::math::color::Color;
use crate::math::vector::Vector2i;

use super::super::super::capabilities::{Capabilities, Version};
use super::super::super::errors::*;
use super::super::super::types::*;
use super::super::Device;
use super::capabilities;

/// Forwards every call to the OpenGL context that is current on this thread.
pub struct GLDevice {
    capabilities: Capabilities,
}

impl GLDevice {
    /// # Safety
    ///
    /// The GL functions must be loaded and belong to the current context.
    pub unsafe fn new() -> Result<Self> {
        let capabilities = capabilities::parse()?;
        info!("GLDevice {:#?}", capabilities);
        Ok(GLDevice { capabilities })
    }

    unsafe fn info_log<F, G>(id: GLuint, query: F, fetch: G) -> String
    where
        F: Fn(GLuint, GLenum, *mut GLint),
        G: Fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
    {
        let mut len = 0;
        query(id, gl::INFO_LOG_LENGTH, &mut len);
        if len <= 0 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        let mut written = 0;
        fetch(id, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        buf.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Device for GLDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn compile_shader(
        &mut self,
        name: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ObjectId> {
        let c_str = cstring(source)?;
        let shader = gl::CreateShader(stage.into());
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
        gl::CompileShader(shader);

        let mut status = GLint::from(gl::FALSE);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let log = Self::info_log(
                shader,
                |id, pname, v| gl::GetShaderiv(id, pname, v),
                |id, len, written, buf| gl::GetShaderInfoLog(id, len, written, buf),
            );

            gl::DeleteShader(shader);
            return Err(Error::ShaderCompilation {
                name: name.to_owned(),
                stage,
                source: source.to_owned(),
                log,
            });
        }

        check()?;
        Ok(shader)
    }

    unsafe fn delete_shader(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteShader(id);
        check()
    }

    unsafe fn link_program(&mut self, name: &str, stages: &[ObjectId]) -> Result<ObjectId> {
        let program = gl::CreateProgram();
        for shader in stages {
            gl::AttachShader(program, *shader);
        }

        gl::LinkProgram(program);

        let mut status = GLint::from(gl::FALSE);
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let log = Self::info_log(
                program,
                |id, pname, v| gl::GetProgramiv(id, pname, v),
                |id, len, written, buf| gl::GetProgramInfoLog(id, len, written, buf),
            );

            gl::DeleteProgram(program);
            return Err(Error::ShaderLink {
                name: name.to_owned(),
                log,
            });
        }

        for shader in stages {
            gl::DetachShader(program, *shader);
        }

        check()?;
        Ok(program)
    }

    unsafe fn delete_program(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteProgram(id);
        check()
    }

    unsafe fn use_program(&mut self, id: ObjectId) -> Result<()> {
        gl::UseProgram(id);
        check()
    }

    unsafe fn attribute_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>> {
        let c_name = cstring(name)?;
        let location = gl::GetAttribLocation(program, c_name.as_ptr());
        check()?;

        if location < 0 {
            Ok(None)
        } else {
            Ok(Some(location as Location))
        }
    }

    unsafe fn uniform_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>> {
        let c_name = cstring(name)?;
        let location = gl::GetUniformLocation(program, c_name.as_ptr());
        check()?;

        if location < 0 {
            Ok(None)
        } else {
            Ok(Some(location as Location))
        }
    }

    unsafe fn set_uniform(&mut self, location: Location, variable: UniformVariable) -> Result<()> {
        let location = location as GLint;
        match variable {
            UniformVariable::I32(v) => gl::Uniform1i(location, v),
            UniformVariable::F32(v) => gl::Uniform1f(location, v),
            UniformVariable::Vector2i(v) => gl::Uniform2i(location, v[0], v[1]),
            UniformVariable::Vector3i(v) => gl::Uniform3i(location, v[0], v[1], v[2]),
            UniformVariable::Vector4i(v) => gl::Uniform4i(location, v[0], v[1], v[2], v[3]),
            UniformVariable::Vector2f(v) => gl::Uniform2f(location, v[0], v[1]),
            UniformVariable::Vector3f(v) => gl::Uniform3f(location, v[0], v[1], v[2]),
            UniformVariable::Vector4f(v) => gl::Uniform4f(location, v[0], v[1], v[2], v[3]),
            UniformVariable::Matrix4f(v, transpose) => {
                let transpose = if transpose { gl::TRUE } else { gl::FALSE };
                gl::UniformMatrix4fv(location, 1, transpose, v[0].as_ptr())
            }
        }

        check()
    }

    unsafe fn create_vertex_array(&mut self) -> Result<ObjectId> {
        let mut id = 0;
        gl::GenVertexArrays(1, &mut id);
        check()?;
        Ok(id)
    }

    unsafe fn bind_vertex_array(&mut self, id: Option<ObjectId>) -> Result<()> {
        gl::BindVertexArray(id.unwrap_or(0));
        check()
    }

    unsafe fn delete_vertex_array(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteVertexArrays(1, &id);
        check()
    }

    unsafe fn create_buffer(&mut self) -> Result<ObjectId> {
        let mut id = 0;
        gl::GenBuffers(1, &mut id);
        check()?;
        Ok(id)
    }

    unsafe fn update_buffer(
        &mut self,
        target: BufferTarget,
        id: ObjectId,
        data: &[u8],
    ) -> Result<()> {
        let target = GLenum::from(target);
        let value = if data.is_empty() {
            ptr::null()
        } else {
            data.as_ptr() as *const c_void
        };

        gl::BindBuffer(target, id);
        gl::BufferData(target, data.len() as GLsizeiptr, value, gl::DYNAMIC_DRAW);
        check()
    }

    unsafe fn read_buffer(&mut self, target: BufferTarget, id: ObjectId, out: &mut [u8]) -> Result<()> {
        if self.capabilities.version.is_embedded() {
            return Err(Error::Backend(
                "[GL] glGetBufferSubData is not available on OpenGL ES.".into(),
            ));
        }

        let target = GLenum::from(target);
        gl::BindBuffer(target, id);
        gl::GetBufferSubData(
            target,
            0,
            out.len() as GLsizeiptr,
            out.as_mut_ptr() as *mut c_void,
        );
        check()
    }

    unsafe fn delete_buffer(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteBuffers(1, &id);
        check()
    }

    unsafe fn bind_index_buffer(&mut self, id: ObjectId) -> Result<()> {
        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id);
        check()
    }

    unsafe fn enable_attribute(
        &mut self,
        location: Location,
        buffer: ObjectId,
        pointer: AttributePointer,
    ) -> Result<()> {
        let normalized = if pointer.normalized {
            gl::TRUE
        } else {
            gl::FALSE
        };

        gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
        gl::EnableVertexAttribArray(location);
        gl::VertexAttribPointer(
            location,
            pointer.dim as GLint,
            pointer.format.into(),
            normalized,
            0,
            ptr::null(),
        );
        check()
    }

    unsafe fn disable_attribute(&mut self, location: Location) -> Result<()> {
        gl::DisableVertexAttribArray(location);
        check()
    }

    unsafe fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()> {
        gl::DrawArrays(primitive.into(), first as GLint, count as GLsizei);
        check()
    }

    unsafe fn draw_elements(
        &mut self,
        primitive: Primitive,
        format: VertexFormat,
        count: u32,
        offset: usize,
    ) -> Result<()> {
        gl::DrawElements(
            primitive.into(),
            count as GLsizei,
            format.into(),
            offset as *const c_void,
        );
        check()
    }

    unsafe fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        size: Vector2i,
        samples: u32,
    ) -> Result<ObjectId> {
        let mut id = 0;
        gl::GenRenderbuffers(1, &mut id);
        gl::BindRenderbuffer(gl::RENDERBUFFER, id);

        if samples > 1 {
            gl::RenderbufferStorageMultisample(
                gl::RENDERBUFFER,
                samples as GLsizei,
                format.into(),
                size.x,
                size.y,
            );
        } else {
            gl::RenderbufferStorage(gl::RENDERBUFFER, format.into(), size.x, size.y);
        }

        gl::BindRenderbuffer(gl::RENDERBUFFER, 0);
        check()?;
        Ok(id)
    }

    unsafe fn delete_renderbuffer(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteRenderbuffers(1, &id);
        check()
    }

    unsafe fn create_framebuffer(
        &mut self,
        color: ObjectId,
        depth_stencil: ObjectId,
    ) -> Result<(ObjectId, u32)> {
        let mut id = 0;
        gl::GenFramebuffers(1, &mut id);
        gl::BindFramebuffer(gl::FRAMEBUFFER, id);

        gl::FramebufferRenderbuffer(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            gl::RENDERBUFFER,
            color,
        );

        gl::FramebufferRenderbuffer(
            gl::FRAMEBUFFER,
            gl::DEPTH_ATTACHMENT,
            gl::RENDERBUFFER,
            depth_stencil,
        );

        gl::FramebufferRenderbuffer(
            gl::FRAMEBUFFER,
            gl::STENCIL_ATTACHMENT,
            gl::RENDERBUFFER,
            depth_stencil,
        );

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        check()?;
        Ok((id, status))
    }

    unsafe fn delete_framebuffer(&mut self, id: ObjectId) -> Result<()> {
        gl::DeleteFramebuffers(1, &id);
        check()
    }

    unsafe fn bind_framebuffer(&mut self, id: Option<ObjectId>) -> Result<()> {
        gl::BindFramebuffer(gl::FRAMEBUFFER, id.unwrap_or(0));
        check()
    }

    unsafe fn set_multisample(&mut self, enable: bool) -> Result<()> {
        // Always on for ES contexts with multisampled targets.
        if self.capabilities.version.is_embedded() {
            return Ok(());
        }

        if enable {
            gl::Enable(gl::MULTISAMPLE);
        } else {
            gl::Disable(gl::MULTISAMPLE);
        }

        check()
    }

    unsafe fn clear(
        &mut self,
        color: Option<Color>,
        depth: Option<f32>,
        stencil: Option<i32>,
    ) -> Result<()> {
        let mut bits = 0;
        if let Some(v) = color {
            bits |= gl::COLOR_BUFFER_BIT;
            gl::ClearColor(v.r, v.g, v.b, v.a);
        }

        if let Some(v) = depth {
            bits |= gl::DEPTH_BUFFER_BIT;
            gl::ClearDepth(f64::from(v));
        }

        if let Some(v) = stencil {
            bits |= gl::STENCIL_BUFFER_BIT;
            gl::ClearStencil(v);
        }

        if bits != 0 {
            gl::Clear(bits);
        }

        check()
    }

    unsafe fn blit_framebuffer(&mut self, id: ObjectId, size: Vector2i) -> Result<()> {
        gl::BindFramebuffer(gl::READ_FRAMEBUFFER, id);
        gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, 0);

        if !self.capabilities.version.is_embedded() {
            gl::DrawBuffer(gl::BACK);
        }

        gl::BlitFramebuffer(
            0,
            0,
            size.x,
            size.y,
            0,
            0,
            size.x,
            size.y,
            gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT,
            gl::NEAREST,
        );

        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        check()
    }

    unsafe fn read_pixels(&mut self, id: ObjectId, size: Vector2i, out: &mut [u8]) -> Result<()> {
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
        gl::BindFramebuffer(gl::READ_FRAMEBUFFER, id);

        if self.capabilities.version >= Version::GL(2, 1)
            || self.capabilities.version >= Version::ES(3, 0)
        {
            gl::BindBuffer(gl::PIXEL_PACK_BUFFER, 0);
        }

        if !self.capabilities.version.is_embedded() {
            gl::ReadBuffer(gl::COLOR_ATTACHMENT0);
        }

        gl::ReadPixels(
            0,
            0,
            size.x,
            size.y,
            gl::BGRA,
            gl::UNSIGNED_BYTE,
            out.as_mut_ptr() as *mut c_void,
        );

        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        check()
    }
}

fn cstring(value: &str) -> Result<CString> {
    CString::new(value.as_bytes())
        .map_err(|_| Error::Backend(format!("[GL] {:?} contains a nul byte.", value)))
}

unsafe fn check() -> Result<()> {
    let desc = match gl::GetError() {
        gl::NO_ERROR => return Ok(()),
        gl::INVALID_ENUM => "[GL] An unacceptable value is specified for an enumerated argument.",
        gl::INVALID_VALUE => "[GL] A numeric argument is out of range.",
        gl::INVALID_OPERATION => "[GL] The specified operation is not allowed in the current state.",
        gl::INVALID_FRAMEBUFFER_OPERATION => {
            "[GL] The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        }
        gl::OUT_OF_MEMORY => "[GL] There is not enough memory left to execute the command.",
        _ => "[GL] Oops, Unknown OpenGL error.",
    };

    Err(Error::Backend(desc.into()))
}
