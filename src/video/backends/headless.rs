//! An in-memory graphics context.
//!
//! `HeadlessDevice` keeps every object it hands out in plain collections, so
//! the wrappers can run without a window or a GPU. It emulates just enough of
//! the real thing to be useful in tests and tooling:
//!
//! * shader "compilation" rejects sources without a `main` function, with
//!   unbalanced braces or with an `#error` directive;
//! * top-level `in`/`attribute`/`varying`/`out`/`uniform` declarations are
//!   reflected to assign attribute and uniform locations in declaration order;
//! * linking fails when a stage reads an input the previous stage never writes;
//! * buffers and color render targets store their bytes, so uploads can be read
//!   back and clears show up in pixel readbacks.
//!
//! Deleting an object that does not exist is reported as an error, which makes
//! double frees visible.

use std::collections::HashMap;

use crate::math::color::Color;
use crate::math::vector::Vector2i;

use super::super::capabilities::{Capabilities, Extensions, Version};
use super::super::errors::*;
use super::super::types::*;
use super::Device;

#[derive(Debug, Clone, Default)]
struct Declarations {
    inputs: Vec<String>,
    outputs: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Debug, Clone)]
struct HeadlessShader {
    stage: ShaderStage,
    declarations: Declarations,
}

#[derive(Debug, Clone, Default)]
struct HeadlessProgram {
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: HashMap<Location, UniformVariable>,
}

#[derive(Debug, Clone)]
struct HeadlessRenderbuffer {
    format: RenderbufferFormat,
    size: Vector2i,
    samples: u32,
    pixels: Vec<u8>,
}

/// A draw call recorded by the headless device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub program: ObjectId,
    pub primitive: Primitive,
    /// First vertex for array draws, byte offset into the index buffer for
    /// indexed draws.
    pub offset: usize,
    pub count: u32,
    pub indexed: bool,
}

pub struct HeadlessDevice {
    capabilities: Capabilities,
    next_id: ObjectId,
    shaders: HashMap<ObjectId, HeadlessShader>,
    programs: HashMap<ObjectId, HeadlessProgram>,
    // Element buffer binding of every vertex array.
    vertex_arrays: HashMap<ObjectId, Option<ObjectId>>,
    buffers: HashMap<ObjectId, Vec<u8>>,
    renderbuffers: HashMap<ObjectId, HeadlessRenderbuffer>,
    framebuffers: HashMap<ObjectId, (ObjectId, ObjectId)>,
    attributes: HashMap<Location, (ObjectId, AttributePointer)>,
    binded_program: Option<ObjectId>,
    binded_vertex_array: Option<ObjectId>,
    binded_index_buffer: Option<ObjectId>,
    object_limit: Option<usize>,
    binded_framebuffer: Option<ObjectId>,
    multisample: bool,
    deleted_buffers: Vec<ObjectId>,
    draws: Vec<DrawCall>,
    blits: Vec<ObjectId>,
}

impl HeadlessDevice {
    pub fn new(version: Version) -> Self {
        HeadlessDevice::with_capabilities(Capabilities::new(version, Extensions::default()))
    }

    pub fn with_capabilities(mut capabilities: Capabilities) -> Self {
        capabilities.vendor = "glkit".into();
        capabilities.renderer = "headless".into();

        HeadlessDevice {
            capabilities,
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            renderbuffers: HashMap::new(),
            framebuffers: HashMap::new(),
            attributes: HashMap::new(),
            binded_program: None,
            binded_vertex_array: None,
            binded_index_buffer: None,
            object_limit: None,
            binded_framebuffer: None,
            multisample: false,
            deleted_buffers: Vec::new(),
            draws: Vec::new(),
            blits: Vec::new(),
        }
    }

    /// Returns true if `id` names any live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.shaders.contains_key(&id)
            || self.programs.contains_key(&id)
            || self.vertex_arrays.contains_key(&id)
            || self.buffers.contains_key(&id)
            || self.renderbuffers.contains_key(&id)
            || self.framebuffers.contains_key(&id)
    }

    /// Number of live objects of every kind.
    pub fn object_count(&self) -> usize {
        self.shaders.len()
            + self.programs.len()
            + self.vertex_arrays.len()
            + self.buffers.len()
            + self.renderbuffers.len()
            + self.framebuffers.len()
    }

    pub fn buffer_data(&self, id: ObjectId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|v| &v[..])
    }

    /// Every buffer deletion in order, including repeated ones.
    pub fn deleted_buffers(&self) -> &[ObjectId] {
        &self.deleted_buffers
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Framebuffers blitted into the default surface, in order.
    pub fn blits(&self) -> &[ObjectId] {
        &self.blits
    }

    pub fn binded_framebuffer(&self) -> Option<ObjectId> {
        self.binded_framebuffer
    }

    pub fn multisample(&self) -> bool {
        self.multisample
    }

    /// The attribute pointer enabled at `location`, if any.
    pub fn attribute(&self, location: Location) -> Option<(ObjectId, AttributePointer)> {
        self.attributes.get(&location).cloned()
    }

    pub fn uniform(&self, program: ObjectId, location: Location) -> Option<UniformVariable> {
        self.programs
            .get(&program)
            .and_then(|v| v.values.get(&location).cloned())
    }

    /// Sample count of a render target.
    pub fn renderbuffer_samples(&self, id: ObjectId) -> Option<u32> {
        self.renderbuffers.get(&id).map(|v| v.samples)
    }

    /// The BGRA bytes (bottom row first) of the color target of `framebuffer`.
    pub fn pixels_mut(&mut self, framebuffer: ObjectId) -> Option<&mut [u8]> {
        let color = self.framebuffers.get(&framebuffer)?.0;
        self.renderbuffers.get_mut(&color).map(|v| &mut v.pixels[..])
    }

    /// Makes object creation fail once `limit` objects are alive.
    pub fn set_object_limit(&mut self, limit: Option<usize>) {
        self.object_limit = limit;
    }

    fn allocate(&mut self) -> Result<ObjectId> {
        if let Some(limit) = self.object_limit {
            if self.object_count() >= limit {
                return Err(Error::Backend(format!(
                    "[Headless] Out of object names ({} alive).",
                    limit
                )));
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    // The element buffer binding belongs to the bound vertex array.
    fn index_buffer(&self) -> Option<ObjectId> {
        match self.binded_vertex_array {
            Some(vao) => self.vertex_arrays.get(&vao).cloned().unwrap_or(None),
            None => self.binded_index_buffer,
        }
    }

    fn set_index_buffer(&mut self, id: Option<ObjectId>) {
        match self.binded_vertex_array {
            Some(vao) => {
                self.vertex_arrays.insert(vao, id);
            }
            None => self.binded_index_buffer = id,
        }
    }
}

impl Device for HeadlessDevice {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    unsafe fn compile_shader(
        &mut self,
        name: &str,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ObjectId> {
        if let Err(log) = validate(source) {
            return Err(Error::ShaderCompilation {
                name: name.to_owned(),
                stage,
                source: source.to_owned(),
                log,
            });
        }

        let id = self.allocate()?;
        let declarations = reflect(stage, source);
        self.shaders.insert(
            id,
            HeadlessShader {
                stage,
                declarations,
            },
        );

        Ok(id)
    }

    unsafe fn delete_shader(&mut self, id: ObjectId) -> Result<()> {
        self.shaders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| invalid("Shader", id))
    }

    unsafe fn link_program(&mut self, name: &str, stages: &[ObjectId]) -> Result<ObjectId> {
        let mut vs = None;
        let mut gs = None;
        let mut fs = None;

        for id in stages {
            let shader = self.shaders.get(id).ok_or_else(|| invalid("Shader", *id))?;
            match shader.stage {
                ShaderStage::Vertex => vs = Some(&shader.declarations),
                ShaderStage::Geometry => gs = Some(&shader.declarations),
                ShaderStage::Fragment => fs = Some(&shader.declarations),
            }
        }

        let link_error = |log: String| Error::ShaderLink {
            name: name.to_owned(),
            log,
        };

        let vs = vs.ok_or_else(|| link_error("error: program lacks a vertex stage".into()))?;
        let fs = fs.ok_or_else(|| link_error("error: program lacks a fragment stage".into()))?;

        let mut previous = vs;
        for (stage, decls) in gs
            .map(|v| (ShaderStage::Geometry, v))
            .into_iter()
            .chain(Some((ShaderStage::Fragment, fs)))
        {
            for input in &decls.inputs {
                if !previous.outputs.contains(input) {
                    return Err(link_error(format!(
                        "error: {} shader input `{}` has no matching output in the previous stage",
                        stage, input
                    )));
                }
            }

            previous = decls;
        }

        let mut program = HeadlessProgram::default();
        program.attributes = vs.inputs.clone();
        for decls in Some(vs).into_iter().chain(gs).chain(Some(fs)) {
            for uniform in &decls.uniforms {
                if !program.uniforms.contains(uniform) {
                    program.uniforms.push(uniform.clone());
                }
            }
        }

        let id = self.allocate()?;
        self.programs.insert(id, program);
        Ok(id)
    }

    unsafe fn delete_program(&mut self, id: ObjectId) -> Result<()> {
        self.programs
            .remove(&id)
            .ok_or_else(|| invalid("Program", id))?;

        if self.binded_program == Some(id) {
            self.binded_program = None;
        }

        Ok(())
    }

    unsafe fn use_program(&mut self, id: ObjectId) -> Result<()> {
        if !self.programs.contains_key(&id) {
            return Err(invalid("Program", id));
        }

        self.binded_program = Some(id);
        Ok(())
    }

    unsafe fn attribute_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>> {
        let program = self
            .programs
            .get(&program)
            .ok_or_else(|| invalid("Program", program))?;

        Ok(program
            .attributes
            .iter()
            .position(|v| v == name)
            .map(|v| v as Location))
    }

    unsafe fn uniform_location(&self, program: ObjectId, name: &str) -> Result<Option<Location>> {
        let program = self
            .programs
            .get(&program)
            .ok_or_else(|| invalid("Program", program))?;

        Ok(program
            .uniforms
            .iter()
            .position(|v| v == name)
            .map(|v| v as Location))
    }

    unsafe fn set_uniform(&mut self, location: Location, variable: UniformVariable) -> Result<()> {
        let id = self
            .binded_program
            .ok_or_else(|| Error::Backend("[Headless] No program in use.".into()))?;

        let program = self
            .programs
            .get_mut(&id)
            .ok_or_else(|| invalid("Program", id))?;

        program.values.insert(location, variable);
        Ok(())
    }

    unsafe fn create_vertex_array(&mut self) -> Result<ObjectId> {
        let id = self.allocate()?;
        self.vertex_arrays.insert(id, None);
        Ok(id)
    }

    unsafe fn bind_vertex_array(&mut self, id: Option<ObjectId>) -> Result<()> {
        if let Some(id) = id {
            if !self.vertex_arrays.contains_key(&id) {
                return Err(invalid("VertexArray", id));
            }
        }

        self.binded_vertex_array = id;
        Ok(())
    }

    unsafe fn delete_vertex_array(&mut self, id: ObjectId) -> Result<()> {
        if self.vertex_arrays.remove(&id).is_none() {
            return Err(invalid("VertexArray", id));
        }

        if self.binded_vertex_array == Some(id) {
            self.binded_vertex_array = None;
        }

        Ok(())
    }

    unsafe fn create_buffer(&mut self) -> Result<ObjectId> {
        let id = self.allocate()?;
        self.buffers.insert(id, Vec::new());
        Ok(id)
    }

    unsafe fn update_buffer(
        &mut self,
        target: BufferTarget,
        id: ObjectId,
        data: &[u8],
    ) -> Result<()> {
        let buffer = self.buffers.get_mut(&id).ok_or_else(|| invalid("Buffer", id))?;
        buffer.clear();
        buffer.extend_from_slice(data);

        if target == BufferTarget::Index {
            self.set_index_buffer(Some(id));
        }

        Ok(())
    }

    unsafe fn read_buffer(&mut self, _: BufferTarget, id: ObjectId, out: &mut [u8]) -> Result<()> {
        let buffer = self.buffers.get(&id).ok_or_else(|| invalid("Buffer", id))?;
        if out.len() > buffer.len() {
            return Err(Error::Backend(format!(
                "[Headless] Reading {} bytes from buffer {} of {} bytes.",
                out.len(),
                id,
                buffer.len()
            )));
        }

        out.copy_from_slice(&buffer[..out.len()]);
        Ok(())
    }

    unsafe fn delete_buffer(&mut self, id: ObjectId) -> Result<()> {
        self.deleted_buffers.push(id);
        self.buffers.remove(&id).ok_or_else(|| invalid("Buffer", id))?;

        if self.binded_index_buffer == Some(id) {
            self.binded_index_buffer = None;
        }

        for binding in self.vertex_arrays.values_mut() {
            if *binding == Some(id) {
                *binding = None;
            }
        }

        self.attributes.retain(|_, v| v.0 != id);
        Ok(())
    }

    unsafe fn bind_index_buffer(&mut self, id: ObjectId) -> Result<()> {
        if !self.buffers.contains_key(&id) {
            return Err(invalid("Buffer", id));
        }

        self.set_index_buffer(Some(id));
        Ok(())
    }

    unsafe fn enable_attribute(
        &mut self,
        location: Location,
        buffer: ObjectId,
        pointer: AttributePointer,
    ) -> Result<()> {
        if !self.buffers.contains_key(&buffer) {
            return Err(invalid("Buffer", buffer));
        }

        self.attributes.insert(location, (buffer, pointer));
        Ok(())
    }

    unsafe fn disable_attribute(&mut self, location: Location) -> Result<()> {
        self.attributes.remove(&location);
        Ok(())
    }

    unsafe fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> Result<()> {
        let program = self
            .binded_program
            .ok_or_else(|| Error::Backend("[Headless] No program in use.".into()))?;

        self.draws.push(DrawCall {
            program,
            primitive,
            offset: first as usize,
            count,
            indexed: false,
        });

        Ok(())
    }

    unsafe fn draw_elements(
        &mut self,
        primitive: Primitive,
        format: VertexFormat,
        count: u32,
        offset: usize,
    ) -> Result<()> {
        let program = self
            .binded_program
            .ok_or_else(|| Error::Backend("[Headless] No program in use.".into()))?;

        let ibo = self
            .index_buffer()
            .ok_or_else(|| Error::Backend("[Headless] No index buffer bound.".into()))?;

        let len = self.buffers.get(&ibo).map(|v| v.len()).unwrap_or(0);
        let end = (count as usize)
            .checked_mul(format.size())
            .and_then(|v| v.checked_add(offset));

        match end {
            Some(end) if end <= len => {}
            _ => {
                return Err(Error::Backend(format!(
                    "[Headless] {} indices at byte {} are out of bounds of buffer {}.",
                    count, offset, ibo
                )));
            }
        }

        self.draws.push(DrawCall {
            program,
            primitive,
            offset,
            count,
            indexed: true,
        });

        Ok(())
    }

    unsafe fn create_renderbuffer(
        &mut self,
        format: RenderbufferFormat,
        size: Vector2i,
        samples: u32,
    ) -> Result<ObjectId> {
        let pixels = match format {
            RenderbufferFormat::RGBA8 => vec![0; pixel_count(size) * 4],
            RenderbufferFormat::Depth24Stencil8 => Vec::new(),
        };

        let id = self.allocate()?;
        self.renderbuffers.insert(
            id,
            HeadlessRenderbuffer {
                format,
                size,
                samples,
                pixels,
            },
        );

        Ok(id)
    }

    unsafe fn delete_renderbuffer(&mut self, id: ObjectId) -> Result<()> {
        self.renderbuffers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| invalid("Renderbuffer", id))
    }

    unsafe fn create_framebuffer(
        &mut self,
        color: ObjectId,
        depth_stencil: ObjectId,
    ) -> Result<(ObjectId, u32)> {
        let status = {
            let c = self
                .renderbuffers
                .get(&color)
                .ok_or_else(|| invalid("Renderbuffer", color))?;

            let d = self
                .renderbuffers
                .get(&depth_stencil)
                .ok_or_else(|| invalid("Renderbuffer", depth_stencil))?;

            if c.format != RenderbufferFormat::RGBA8
                || d.format != RenderbufferFormat::Depth24Stencil8
                || c.size != d.size
                || c.samples != d.samples
                || pixel_count(c.size) == 0
            {
                FRAMEBUFFER_INCOMPLETE_ATTACHMENT
            } else {
                FRAMEBUFFER_COMPLETE
            }
        };

        let id = self.allocate()?;
        self.framebuffers.insert(id, (color, depth_stencil));
        self.binded_framebuffer = Some(id);
        Ok((id, status))
    }

    unsafe fn delete_framebuffer(&mut self, id: ObjectId) -> Result<()> {
        self.framebuffers
            .remove(&id)
            .ok_or_else(|| invalid("Framebuffer", id))?;

        if self.binded_framebuffer == Some(id) {
            self.binded_framebuffer = None;
        }

        Ok(())
    }

    unsafe fn bind_framebuffer(&mut self, id: Option<ObjectId>) -> Result<()> {
        if let Some(id) = id {
            if !self.framebuffers.contains_key(&id) {
                return Err(invalid("Framebuffer", id));
            }
        }

        self.binded_framebuffer = id;
        Ok(())
    }

    unsafe fn set_multisample(&mut self, enable: bool) -> Result<()> {
        self.multisample = enable;
        Ok(())
    }

    unsafe fn clear(&mut self, color: Option<Color>, _: Option<f32>, _: Option<i32>) -> Result<()> {
        if let (Some(id), Some(color)) = (self.binded_framebuffer, color) {
            let [r, g, b, a]: [u8; 4] = color.into();
            if let Some(pixels) = self.pixels_mut(id) {
                for pixel in pixels.chunks_mut(4) {
                    pixel.copy_from_slice(&[b, g, r, a]);
                }
            }
        }

        Ok(())
    }

    unsafe fn blit_framebuffer(&mut self, id: ObjectId, _: Vector2i) -> Result<()> {
        if !self.framebuffers.contains_key(&id) {
            return Err(invalid("Framebuffer", id));
        }

        self.blits.push(id);
        Ok(())
    }

    unsafe fn read_pixels(&mut self, id: ObjectId, size: Vector2i, out: &mut [u8]) -> Result<()> {
        let len = pixel_count(size) * 4;
        let pixels = self
            .pixels_mut(id)
            .ok_or_else(|| invalid("Framebuffer", id))?;

        if out.len() != len || pixels.len() != len {
            return Err(Error::Backend(format!(
                "[Headless] Pixel readback of {} bytes from a {} bytes target.",
                out.len(),
                pixels.len()
            )));
        }

        out.copy_from_slice(pixels);
        Ok(())
    }
}

fn invalid(kind: &str, id: ObjectId) -> Error {
    Error::Backend(format!("[Headless] {} {} does not exist.", kind, id))
}

fn pixel_count(size: Vector2i) -> usize {
    size.x.max(0) as usize * size.y.max(0) as usize
}

/// Checks the few things the headless "compiler" understands. Returns the
/// compiler log on failure.
fn validate(source: &str) -> ::std::result::Result<(), String> {
    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.starts_with("#error") {
            return Err(format!("0:{}(1): error: {}", i + 1, line[6..].trim()));
        }
    }

    let mut depth = 0i32;
    for (i, line) in source.lines().enumerate() {
        for c in strip_comment(line).chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }

            if depth < 0 {
                return Err(format!("0:{}(1): error: syntax error, unexpected '}}'", i + 1));
            }
        }
    }

    if depth != 0 {
        return Err("0:1(1): error: syntax error, unexpected end of file".into());
    }

    let has_main = source
        .lines()
        .map(strip_comment)
        .any(|v| v.contains("void main"));

    if !has_main {
        return Err("0:1(1): error: entry point `main` is not defined".into());
    }

    Ok(())
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Collects the top-level interface declarations of a stage.
fn reflect(stage: ShaderStage, source: &str) -> Declarations {
    let mut declarations = Declarations::default();
    let mut statement = String::new();
    let mut depth = 0;

    for line in source.lines() {
        let line = strip_comment(line);
        if line.trim_start().starts_with('#') {
            continue;
        }

        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    statement.clear();
                }
                '}' => {
                    depth -= 1;
                    statement.clear();
                }
                ';' if depth == 0 => {
                    declare(stage, &statement, &mut declarations);
                    statement.clear();
                }
                _ if depth == 0 => statement.push(c),
                _ => {}
            }
        }

        statement.push(' ');
    }

    declarations
}

fn declare(stage: ShaderStage, statement: &str, declarations: &mut Declarations) {
    const MODIFIERS: &[&str] = &[
        "flat",
        "smooth",
        "noperspective",
        "centroid",
        "highp",
        "mediump",
        "lowp",
        "invariant",
    ];

    // Drops `layout(...)` qualifiers.
    let statement = match (statement.find("layout"), statement.find(')')) {
        (Some(begin), Some(end)) if begin < end => {
            format!("{} {}", &statement[..begin], &statement[end + 1..])
        }
        _ => statement.to_owned(),
    };

    let tokens: Vec<_> = statement
        .split_whitespace()
        .filter(|v| !MODIFIERS.contains(v))
        .collect();

    if tokens.len() < 3 {
        return;
    }

    let name = match tokens[2].find('[') {
        Some(i) => &tokens[2][..i],
        None => tokens[2],
    };

    let name = name.to_owned();
    match (stage, tokens[0]) {
        (_, "uniform") => declarations.uniforms.push(name),
        (ShaderStage::Vertex, "attribute") | (_, "in") => declarations.inputs.push(name),
        (ShaderStage::Fragment, "varying") => declarations.inputs.push(name),
        (_, "varying") | (_, "out") => declarations.outputs.push(name),
        _ => {}
    }
}
