//! Shader programs with named vertex buffers.
//!
//! A `ShaderProgram` owns the compiled stages and the linked program object,
//! plus a collection of buffers addressed by attribute name. The reserved name
//! `"indices"` always refers to the element buffer.
//!
//! Every buffer carries a caller assigned version, so callers can skip uploads
//! of data the program already holds:
//!
//! ```rust
//! use glkit::prelude::*;
//!
//! let ctx = Context::headless(Version::GL(3, 3));
//! let vs = "in vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }";
//! let fs = "out vec4 color;\nvoid main() { color = vec4(1.0); }";
//!
//! let mut shader = ShaderProgram::new(&ctx);
//! shader.init("quad", vs, fs, "").unwrap();
//!
//! let frame = 7;
//! if shader.attrib_version("position") != Some(frame) {
//!     shader.upload_attrib("position", &[0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0], 2, frame).unwrap();
//! }
//!
//! assert_eq!(shader.attrib_size("position").unwrap(), 24);
//! ```
//!
//! Buffers can be shared between programs with `share_attrib`. The lending
//! program stays the owner of the underlying buffer object; borrowers never
//! delete it, and notice when the lender has released it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::backends::Device;
use super::capabilities::Capability;
use super::errors::*;
use super::types::*;
use super::Context;

#[derive(Debug, Clone)]
enum BufferStorage {
    Owned {
        id: ObjectId,
        token: Rc<()>,
    },
    Borrowed {
        id: ObjectId,
        lender: String,
        token: Weak<()>,
    },
}

impl BufferStorage {
    fn id(&self) -> ObjectId {
        match *self {
            BufferStorage::Owned { id, .. } | BufferStorage::Borrowed { id, .. } => id,
        }
    }
}

/// Where a buffer is attached in the vertex layout of its program.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The element buffer.
    Indices,
    /// A vertex attribute at the given location.
    Attribute(Location),
    /// A shared buffer under a name the program has no attribute for. It is
    /// tracked but never attached.
    Unbound,
}

/// A buffer tracked by a `ShaderProgram`.
#[derive(Debug, Clone)]
pub struct NamedBuffer {
    name: String,
    storage: BufferStorage,
    dim: usize,
    count: usize,
    format: VertexFormat,
    integral: bool,
    binding: Binding,
    version: Option<u32>,
}

impl NamedBuffer {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying buffer object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.storage.id()
    }

    /// Components per element.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn format(&self) -> VertexFormat {
        self.format
    }

    #[inline]
    pub fn component_size(&self) -> usize {
        self.format.size()
    }

    #[inline]
    pub fn integral(&self) -> bool {
        self.integral
    }

    /// Size of the contents in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.count * self.dim * self.format.size()
    }

    #[inline]
    pub fn binding(&self) -> Binding {
        self.binding
    }

    /// `None` if the buffer has been invalidated.
    #[inline]
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        match self.storage {
            BufferStorage::Owned { .. } => true,
            BufferStorage::Borrowed { .. } => false,
        }
    }

    /// The name of the program owning a borrowed buffer.
    pub fn lender(&self) -> Option<&str> {
        match self.storage {
            BufferStorage::Owned { .. } => None,
            BufferStorage::Borrowed { ref lender, .. } => Some(lender),
        }
    }

    /// Returns true if this is a borrowed buffer its owner has released.
    pub fn is_expired(&self) -> bool {
        match self.storage {
            BufferStorage::Owned { .. } => false,
            BufferStorage::Borrowed { ref token, .. } => token.upgrade().is_none(),
        }
    }

    fn pointer(&self) -> AttributePointer {
        AttributePointer {
            dim: self.dim,
            format: self.format,
            normalized: self.integral,
        }
    }

    fn target(&self) -> BufferTarget {
        match self.binding {
            Binding::Indices => BufferTarget::Index,
            Binding::Attribute(_) | Binding::Unbound => BufferTarget::Vertex,
        }
    }

    fn expired_error(&self, shader: &str) -> Error {
        Error::BufferExpired {
            shader: shader.to_owned(),
            name: self.name.clone(),
            lender: self.lender().unwrap_or_default().to_owned(),
        }
    }
}

/// A linked shader program and the vertex buffers it draws from.
#[derive(Debug)]
pub struct ShaderProgram {
    ctx: Context,
    name: String,
    definitions: BTreeMap<String, String>,
    vertex: Option<ObjectId>,
    geometry: Option<ObjectId>,
    fragment: Option<ObjectId>,
    program: Option<ObjectId>,
    vertex_array: Option<ObjectId>,
    buffers: SmallVec<[NamedBuffer; 8]>,
}

impl ShaderProgram {
    pub fn new(ctx: &Context) -> Self {
        ShaderProgram {
            ctx: ctx.clone(),
            name: String::new(),
            definitions: BTreeMap::new(),
            vertex: None,
            geometry: None,
            fragment: None,
            program: None,
            vertex_array: None,
            buffers: SmallVec::new(),
        }
    }

    /// Sets a preprocessor definition that the next `init` injects into every
    /// stage as `#define key value`.
    pub fn define<T1, T2>(&mut self, key: T1, value: T2)
    where
        T1: Into<String>,
        T2: Into<String>,
    {
        self.definitions.insert(key.into(), value.into());
    }

    pub fn definitions(&self) -> &BTreeMap<String, String> {
        &self.definitions
    }

    /// Compiles and links the program. An empty `geometry` source skips the
    /// geometry stage.
    ///
    /// Objects from a previous `init` are released first. On failure nothing
    /// is left allocated and the program is not ready.
    pub fn init(&mut self, name: &str, vertex: &str, fragment: &str, geometry: &str) -> Result<()> {
        if self.program.is_some() {
            self.free()?;
        }

        self.name = name.to_owned();

        if vertex.is_empty() {
            return Err(Error::MissingStage {
                name: self.name.clone(),
                stage: ShaderStage::Vertex,
            });
        }

        if fragment.is_empty() {
            return Err(Error::MissingStage {
                name: self.name.clone(),
                stage: ShaderStage::Fragment,
            });
        }

        if !geometry.is_empty() && !self.ctx.supports(Capability::GeometryShader) {
            return Err(Error::Unsupported {
                operation: "geometry shader stage",
                capability: Capability::GeometryShader,
            });
        }

        let mut sources: SmallVec<[(ShaderStage, String); 3]> = SmallVec::new();
        sources.push((ShaderStage::Vertex, inject_definitions(vertex, &self.definitions)));
        if !geometry.is_empty() {
            sources.push((
                ShaderStage::Geometry,
                inject_definitions(geometry, &self.definitions),
            ));
        }
        sources.push((
            ShaderStage::Fragment,
            inject_definitions(fragment, &self.definitions),
        ));

        let supports_vao = self.ctx.supports(Capability::VertexArrayObject);
        let mut device = self.ctx.device();
        let mut stages: SmallVec<[(ShaderStage, ObjectId); 3]> = SmallVec::new();

        let program = unsafe { build(&mut *device, name, &sources, &mut stages) };
        let program = match program {
            Ok(v) => v,
            Err(err) => {
                for &(_, id) in &stages {
                    if let Err(e) = unsafe { device.delete_shader(id) } {
                        error!("[{}] Failed to release {}: {}", name, id, e);
                    }
                }

                return Err(err);
            }
        };

        for &(stage, id) in &stages {
            match stage {
                ShaderStage::Vertex => self.vertex = Some(id),
                ShaderStage::Geometry => self.geometry = Some(id),
                ShaderStage::Fragment => self.fragment = Some(id),
            }
        }

        self.program = Some(program);

        if supports_vao {
            let vertex_array = unsafe { device.create_vertex_array() };
            drop(device);

            match vertex_array {
                Ok(id) => self.vertex_array = Some(id),
                Err(err) => {
                    if let Err(e) = self.free() {
                        error!("[{}] {}", name, e);
                    }

                    return Err(err);
                }
            }
        }

        debug!(
            "[{}] Linked program {} ({} stages, vertex array {:?}).",
            name,
            program,
            stages.len(),
            self.vertex_array
        );

        Ok(())
    }

    /// Reads the stage sources from files and calls `init`. An empty path
    /// means an empty source; unreadable files are logged and treated as
    /// empty as well.
    pub fn init_from_files<T1, T2, T3>(
        &mut self,
        name: &str,
        vertex: T1,
        fragment: T2,
        geometry: T3,
    ) -> Result<()>
    where
        T1: AsRef<Path>,
        T2: AsRef<Path>,
        T3: AsRef<Path>,
    {
        let vertex = read_source(name, vertex.as_ref());
        let fragment = read_source(name, fragment.as_ref());
        let geometry = read_source(name, geometry.as_ref());
        self.init(name, &vertex, &fragment, &geometry)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the program has been linked successfully.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.program.is_some()
    }

    #[inline]
    pub fn program_id(&self) -> Option<ObjectId> {
        self.program
    }

    #[inline]
    pub fn vertex_id(&self) -> Option<ObjectId> {
        self.vertex
    }

    #[inline]
    pub fn fragment_id(&self) -> Option<ObjectId> {
        self.fragment
    }

    #[inline]
    pub fn geometry_id(&self) -> Option<ObjectId> {
        self.geometry
    }

    #[inline]
    pub fn vertex_array_id(&self) -> Option<ObjectId> {
        self.vertex_array
    }

    /// Selects the program for rendering and restores its vertex layout.
    ///
    /// Without vertex array objects, the index buffer and every attribute
    /// pointer are bound again. Borrowed buffers that have been released by
    /// their owner are skipped.
    pub fn bind(&self) -> Result<()> {
        let program = self.linked()?;
        let mut device = self.ctx.device();

        unsafe {
            device.use_program(program)?;

            if let Some(vao) = self.vertex_array {
                return device.bind_vertex_array(Some(vao));
            }

            for buffer in &self.buffers {
                if buffer.is_expired() {
                    warn!(
                        "[{}] Skipping buffer {:?} released by {:?}.",
                        self.name,
                        buffer.name,
                        buffer.lender().unwrap_or_default()
                    );
                    continue;
                }

                match buffer.binding {
                    Binding::Indices => device.bind_index_buffer(buffer.id())?,
                    Binding::Attribute(location) if buffer.count > 0 => {
                        device.enable_attribute(location, buffer.id(), buffer.pointer())?
                    }
                    Binding::Attribute(location) => device.disable_attribute(location)?,
                    Binding::Unbound => {}
                }
            }
        }

        Ok(())
    }

    /// Looks up the location of an attribute. Missing attributes are logged
    /// if `warn` is set.
    pub fn attrib(&self, name: &str, warn: bool) -> Result<Option<Location>> {
        let program = self.linked()?;
        let location = unsafe { self.ctx.device().attribute_location(program, name)? };

        if location.is_none() && warn {
            warn!("[{}] Attribute {:?} not found.", self.name, name);
        }

        Ok(location)
    }

    /// Looks up the location of a uniform. Missing uniforms are logged if
    /// `warn` is set.
    pub fn uniform(&self, name: &str, warn: bool) -> Result<Option<Location>> {
        let program = self.linked()?;
        let location = unsafe { self.ctx.device().uniform_location(program, name)? };

        if location.is_none() && warn {
            warn!("[{}] Uniform {:?} not found.", self.name, name);
        }

        Ok(location)
    }

    /// Assigns a uniform of the program. The program must be bound. Missing
    /// uniforms are ignored.
    pub fn set_uniform<T>(&self, name: &str, value: T, warn: bool) -> Result<()>
    where
        T: Into<UniformVariable>,
    {
        match self.uniform(name, warn)? {
            Some(location) => unsafe { self.ctx.device().set_uniform(location, value.into()) },
            None => Ok(()),
        }
    }

    /// Uploads `data` as the attribute `name`, `dim` components per vertex.
    ///
    /// Attributes the linked program does not use are skipped without
    /// creating a buffer.
    pub fn upload_attrib<T>(&mut self, name: &str, data: &[T], dim: usize, version: u32) -> Result<()>
    where
        T: VertexComponent,
    {
        let count = match dim {
            0 => 0,
            _ => data.len() / dim,
        };

        if count * dim != data.len() {
            return Err(Error::BufferSizeMismatch {
                expected: count * dim * T::FORMAT.size(),
                actual: data.len() * T::FORMAT.size(),
            });
        }

        self.upload_attrib_raw(
            name,
            dim,
            count,
            T::FORMAT,
            T::INTEGRAL,
            as_bytes(data),
            version,
        )
    }

    /// Uploads the element buffer, `dim` indices per primitive.
    #[inline]
    pub fn upload_indices<T>(&mut self, data: &[T], dim: usize, version: u32) -> Result<()>
    where
        T: VertexComponent,
    {
        self.upload_attrib(INDICES, data, dim, version)
    }

    /// Uploads `count * dim` components of `format` from raw bytes.
    ///
    /// The contents of the buffer are replaced entirely. Uploading nothing to
    /// an attribute disables it for subsequent draws.
    #[allow(clippy::too_many_arguments)]
    pub fn upload_attrib_raw(
        &mut self,
        name: &str,
        dim: usize,
        count: usize,
        format: VertexFormat,
        integral: bool,
        data: &[u8],
        version: u32,
    ) -> Result<()> {
        let expected = count * dim * format.size();
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let binding = if name == INDICES {
            Binding::Indices
        } else {
            match self.attrib(name, false)? {
                Some(location) => Binding::Attribute(location),
                None => return Ok(()),
            }
        };

        let index = self.buffers.iter().position(|v| v.name == name);
        if let Some(i) = index {
            if self.buffers[i].is_expired() {
                return Err(self.buffers[i].expired_error(&self.name));
            }
        }

        let mut device = self.ctx.device();

        unsafe {
            if let Some(vao) = self.vertex_array {
                device.bind_vertex_array(Some(vao))?;
            }

            let storage = match index {
                Some(i) => self.buffers[i].storage.clone(),
                None => {
                    let id = device.create_buffer()?;
                    debug!("[{}] Created buffer {} for {:?}.", self.name, id, name);
                    BufferStorage::Owned {
                        id,
                        token: Rc::new(()),
                    }
                }
            };

            let buffer = NamedBuffer {
                name: name.to_owned(),
                storage,
                dim,
                count,
                format,
                integral,
                binding,
                version: Some(version),
            };

            device.update_buffer(buffer.target(), buffer.id(), data)?;

            if let Binding::Attribute(location) = binding {
                if data.is_empty() {
                    device.disable_attribute(location)?;
                } else {
                    device.enable_attribute(location, buffer.id(), buffer.pointer())?;
                }
            }

            match index {
                Some(i) => self.buffers[i] = buffer,
                None => self.buffers.push(buffer),
            }
        }

        Ok(())
    }

    /// Size in bytes of the buffer `name`.
    pub fn attrib_size(&self, name: &str) -> Result<usize> {
        self.attrib_buffer(name).map(|v| v.size())
    }

    /// Reads the contents of buffer `name` back into `out`, which must be
    /// exactly `attrib_size(name)` bytes long.
    pub fn download_attrib(&self, name: &str, out: &mut [u8]) -> Result<()> {
        if !self.ctx.supports(Capability::BufferReadback) {
            return Err(Error::Unsupported {
                operation: "buffer readback",
                capability: Capability::BufferReadback,
            });
        }

        let buffer = self.attrib_buffer(name)?;
        if buffer.is_expired() {
            return Err(buffer.expired_error(&self.name));
        }

        if out.len() != buffer.size() {
            return Err(Error::BufferSizeMismatch {
                expected: buffer.size(),
                actual: out.len(),
            });
        }

        unsafe {
            self.ctx
                .device()
                .read_buffer(buffer.target(), buffer.id(), out)
        }
    }

    /// Makes the buffer `name` of `other` available to this program under
    /// `alias` (or `name` itself).
    ///
    /// The buffer object is shared, not copied, and stays owned by the program
    /// that created it. If this program has no attribute called `alias` the
    /// buffer is still tracked, but not attached to the vertex layout.
    pub fn share_attrib(
        &mut self,
        other: &ShaderProgram,
        name: &str,
        alias: Option<&str>,
    ) -> Result<()> {
        let source = other.attrib_buffer(name)?;
        if source.is_expired() {
            return Err(source.expired_error(&other.name));
        }

        let alias = alias.unwrap_or(name);
        let binding = if alias == INDICES {
            Binding::Indices
        } else {
            match self.attrib(alias, true)? {
                Some(location) => Binding::Attribute(location),
                None => Binding::Unbound,
            }
        };

        let storage = match source.storage {
            BufferStorage::Owned { id, ref token } => BufferStorage::Borrowed {
                id,
                lender: other.name.clone(),
                token: Rc::downgrade(token),
            },
            ref borrowed => borrowed.clone(),
        };

        let buffer = NamedBuffer {
            name: alias.to_owned(),
            storage,
            binding,
            ..source.clone()
        };

        self.free_attrib(alias)?;

        unsafe {
            let mut device = self.ctx.device();
            if let Some(vao) = self.vertex_array {
                device.bind_vertex_array(Some(vao))?;
            }

            match binding {
                Binding::Indices => device.bind_index_buffer(buffer.id())?,
                Binding::Attribute(location) if buffer.count > 0 => {
                    device.enable_attribute(location, buffer.id(), buffer.pointer())?
                }
                Binding::Attribute(location) => device.disable_attribute(location)?,
                Binding::Unbound => {}
            }
        }

        self.buffers.push(buffer);
        Ok(())
    }

    /// Marks every buffer as stale, so version checks force a re-upload.
    pub fn invalidate_attribs(&mut self) {
        for buffer in &mut self.buffers {
            buffer.version = None;
        }
    }

    /// Removes the buffer `name`, deleting the buffer object if this program
    /// owns it.
    pub fn free_attrib(&mut self, name: &str) -> Result<()> {
        let index = match self.buffers.iter().position(|v| v.name == name) {
            Some(i) => i,
            None => return Ok(()),
        };

        let buffer = self.buffers.remove(index);
        if let BufferStorage::Owned { id, .. } = buffer.storage {
            unsafe { self.ctx.device().delete_buffer(id)? };
        }

        Ok(())
    }

    #[inline]
    pub fn has_attrib(&self, name: &str) -> bool {
        self.buffers.iter().any(|v| v.name == name)
    }

    /// The version of buffer `name`, `None` if it is stale or absent.
    pub fn attrib_version(&self, name: &str) -> Option<u32> {
        self.buffers
            .iter()
            .find(|v| v.name == name)
            .and_then(|v| v.version)
    }

    pub fn reset_attrib_version(&mut self, name: &str) {
        if let Some(buffer) = self.buffers.iter_mut().find(|v| v.name == name) {
            buffer.version = None;
        }
    }

    /// Total size in bytes of all tracked buffers.
    pub fn buffer_size(&self) -> usize {
        self.buffers.iter().map(|v| v.size()).sum()
    }

    pub fn attrib_buffer(&self, name: &str) -> Result<&NamedBuffer> {
        self.buffers
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| Error::BufferNotFound {
                shader: self.name.clone(),
                name: name.to_owned(),
            })
    }

    /// Iterates the tracked buffers in insertion order.
    pub fn buffers(&self) -> impl Iterator<Item = &NamedBuffer> {
        self.buffers.iter()
    }

    /// Draws `count` vertices starting at `offset`.
    pub fn draw_array(&self, primitive: Primitive, offset: u32, count: u32) -> Result<()> {
        self.linked()?;

        if count == 0 {
            return Ok(());
        }

        unsafe { self.ctx.device().draw_arrays(primitive, offset, count) }
    }

    /// Draws `count` primitives from the element buffer, skipping the first
    /// `offset` primitives.
    pub fn draw_indexed(&self, primitive: Primitive, offset: u32, count: u32) -> Result<()> {
        self.linked()?;

        if count == 0 {
            return Ok(());
        }

        let indices = self.attrib_buffer(INDICES)?;
        if indices.is_expired() {
            return Err(indices.expired_error(&self.name));
        }

        let multiplier = primitive.multiplier();
        let overflow = || Error::IndexRangeOverflow { offset, count };

        let elements = count.checked_mul(multiplier).ok_or_else(overflow)?;
        let bytes = (offset as usize)
            .checked_mul(multiplier as usize)
            .and_then(|v| v.checked_mul(indices.component_size()))
            .ok_or_else(overflow)?;

        unsafe {
            self.ctx
                .device()
                .draw_elements(primitive, indices.format, elements, bytes)
        }
    }

    /// Releases the owned buffers, the vertex array, the program and its
    /// stages. Borrowed buffers are forgotten without being deleted.
    ///
    /// Calling `free` again is a no-op. Every object is released even if an
    /// earlier release fails; the first error is returned.
    pub fn free(&mut self) -> Result<()> {
        let mut result = Ok(());
        let mut device = self.ctx.device();

        unsafe {
            for buffer in self.buffers.drain() {
                if let BufferStorage::Owned { id, .. } = buffer.storage {
                    keep_first(&mut result, device.delete_buffer(id));
                }
            }

            if let Some(id) = self.vertex_array.take() {
                keep_first(&mut result, device.delete_vertex_array(id));
            }

            if let Some(id) = self.program.take() {
                keep_first(&mut result, device.delete_program(id));
            }

            for id in self
                .vertex
                .take()
                .into_iter()
                .chain(self.geometry.take())
                .chain(self.fragment.take())
            {
                keep_first(&mut result, device.delete_shader(id));
            }
        }

        result
    }

    fn linked(&self) -> Result<ObjectId> {
        self.program
            .ok_or_else(|| Error::Uninitialized(format!("Shader {:?}", self.name)))
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Err(err) = self.free() {
            error!("[{}] {}", self.name, err);
        }
    }
}

unsafe fn build(
    device: &mut dyn Device,
    name: &str,
    sources: &[(ShaderStage, String)],
    stages: &mut SmallVec<[(ShaderStage, ObjectId); 3]>,
) -> Result<ObjectId> {
    for &(stage, ref source) in sources {
        let id = device.compile_shader(name, stage, source)?;
        stages.push((stage, id));
    }

    let ids: SmallVec<[ObjectId; 3]> = stages.iter().map(|v| v.1).collect();
    device.link_program(name, &ids)
}

fn read_source(name: &str, path: &Path) -> String {
    if path.as_os_str().is_empty() {
        return String::new();
    }

    match fs::read_to_string(path) {
        Ok(v) => v,
        Err(err) => {
            warn!("[{}] Failed to read {:?}: {}", name, path, err);
            String::new()
        }
    }
}

/// Inserts a `#define key value` line per definition into `source`, right
/// after a leading `#version` directive if there is one.
pub fn inject_definitions(source: &str, definitions: &BTreeMap<String, String>) -> String {
    if definitions.is_empty() {
        return source.to_owned();
    }

    let mut defines = String::new();
    for (k, v) in definitions {
        defines.push_str(&format!("#define {} {}\n", k, v));
    }

    let trimmed = source.trim_start();
    if !trimmed.starts_with("#version") {
        return defines + source;
    }

    let skipped = source.len() - trimmed.len();
    match trimmed.find('\n') {
        Some(i) => {
            let (head, tail) = source.split_at(skipped + i + 1);
            format!("{}{}{}", head, defines, tail)
        }
        None => format!("{}\n{}", source, defines),
    }
}
