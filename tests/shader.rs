extern crate env_logger;
extern crate glkit;

use std::cell::RefCell;
use std::env;
use std::fs;
use std::process;
use std::rc::Rc;

use glkit::prelude::*;
use glkit::video::backends::headless::{DrawCall, HeadlessDevice};
use glkit::video::errors::Error;

const VS: &str = "#version 330
in vec3 position;
in vec4 color;
uniform mat4 mvp;
out vec4 v_color;
void main() {
    v_color = color;
    gl_Position = mvp * vec4(position, 1.0);
}";

const FS: &str = "#version 330
in vec4 v_color;
uniform float alpha;
out vec4 frag;
void main() {
    frag = vec4(v_color.rgb, alpha);
}";

const GS: &str = "#version 330
layout(triangles) in;
layout(triangle_strip, max_vertices = 3) out;
in vec4 v_color[];
out vec4 g_color;
void main() {
    for (int i = 0; i < 3; i++) {
        g_color = v_color[i];
        gl_Position = gl_in[i].gl_Position;
        EmitVertex();
    }
}";

const GS_FS: &str = "#version 330
in vec4 g_color;
out vec4 frag;
void main() { frag = g_color; }";

fn headless(version: Version) -> (Context, Rc<RefCell<HeadlessDevice>>) {
    let _ = env_logger::try_init();
    let device = Rc::new(RefCell::new(HeadlessDevice::new(version)));
    (Context::from_shared(device.clone()), device)
}

fn program(ctx: &Context, name: &str) -> ShaderProgram {
    let mut shader = ShaderProgram::new(ctx);
    shader.init(name, VS, FS, "").unwrap();
    shader
}

#[test]
fn init() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let shader = program(&ctx, "basic");

    assert!(shader.is_ready());
    assert_eq!(shader.name(), "basic");
    assert!(shader.program_id().is_some());
    assert!(shader.vertex_id().is_some());
    assert!(shader.fragment_id().is_some());
    assert!(shader.geometry_id().is_none());
    assert!(shader.vertex_array_id().is_some());

    let device = device.borrow();
    assert!(device.is_alive(shader.program_id().unwrap()));
    assert_eq!(device.object_count(), 4);
}

#[test]
fn init_without_vertex_arrays() {
    let (ctx, _) = headless(Version::ES(2, 0));
    let mut shader = ShaderProgram::new(&ctx);

    let vs = "attribute vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }";
    let fs = "precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0); }";
    shader.init("es", vs, fs, "").unwrap();

    assert!(shader.is_ready());
    assert!(shader.vertex_array_id().is_none());
    assert_eq!(shader.attrib("position", false).unwrap(), Some(0));
}

#[test]
fn compile_error() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);

    let broken = "#version 330\nout vec4 frag;\nvoid main() { frag = vec4(1.0);";
    match shader.init("broken", VS, broken, "") {
        Err(Error::ShaderCompilation { name, stage, source, .. }) => {
            assert_eq!(name, "broken");
            assert_eq!(stage, ShaderStage::Fragment);
            assert_eq!(source, broken);
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(!shader.is_ready());
    assert!(shader.vertex_id().is_none());
    assert_eq!(device.borrow().object_count(), 0);
}

#[test]
fn missing_stage() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);

    match shader.init("empty", VS, "", "") {
        Err(Error::MissingStage { stage, .. }) => assert_eq!(stage, ShaderStage::Fragment),
        other => panic!("unexpected {:?}", other),
    }

    match shader.init("empty", "", FS, "") {
        Err(Error::MissingStage { stage, .. }) => assert_eq!(stage, ShaderStage::Vertex),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn link_error() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);

    match shader.init("unlinked", VS, GS_FS, "") {
        Err(Error::ShaderLink { name, log }) => {
            assert_eq!(name, "unlinked");
            assert!(log.contains("g_color"));
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(!shader.is_ready());
    assert!(shader.program_id().is_none());
    assert_eq!(device.borrow().object_count(), 0);
}

#[test]
fn geometry() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);
    shader.init("geometry", VS, GS_FS, GS).unwrap();
    assert!(shader.geometry_id().is_some());

    let (ctx, device) = headless(Version::ES(3, 0));
    let mut shader = ShaderProgram::new(&ctx);
    match shader.init("geometry", VS, GS_FS, GS) {
        Err(Error::Unsupported { capability, .. }) => {
            assert_eq!(capability, Capability::GeometryShader)
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(device.borrow().object_count(), 0);
}

#[test]
fn definitions() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);
    shader.define("USE_ALPHA", "1");
    shader.define("ALPHA", "0.5");

    let fs = "#version 330\n#error stop\nvoid main() {}";
    match shader.init("defines", VS, fs, "") {
        Err(Error::ShaderCompilation { stage, source, log, .. }) => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert_eq!(
                source,
                "#version 330\n#define ALPHA 0.5\n#define USE_ALPHA 1\n#error stop\nvoid main() {}"
            );
            assert!(log.contains("stop"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn init_from_files() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let dir = env::temp_dir();
    let vs_path = dir.join(format!("glkit-{}-shader.vert", process::id()));
    let fs_path = dir.join(format!("glkit-{}-shader.frag", process::id()));
    fs::write(&vs_path, VS).unwrap();
    fs::write(&fs_path, FS).unwrap();

    let mut shader = ShaderProgram::new(&ctx);
    shader.init_from_files("files", &vs_path, &fs_path, "").unwrap();
    assert!(shader.is_ready());

    let missing = dir.join(format!("glkit-{}-missing.frag", process::id()));
    match shader.init_from_files("files", &vs_path, &missing, "") {
        Err(Error::MissingStage { stage, .. }) => assert_eq!(stage, ShaderStage::Fragment),
        other => panic!("unexpected {:?}", other),
    }

    assert!(!shader.is_ready());
    fs::remove_file(&vs_path).unwrap();
    fs::remove_file(&fs_path).unwrap();
}

#[test]
fn uninitialized() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let shader = ShaderProgram::new(&ctx);

    assert!(!shader.is_ready());
    match shader.bind() {
        Err(Error::Uninitialized(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert!(shader.attrib("position", false).is_err());
    assert!(shader.draw_array(Primitive::Points, 0, 1).is_err());
}

#[test]
fn lookups() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let shader = program(&ctx, "lookups");

    assert_eq!(shader.attrib("position", true).unwrap(), Some(0));
    assert_eq!(shader.attrib("color", true).unwrap(), Some(1));
    assert_eq!(shader.attrib("normal", true).unwrap(), None);
    assert_eq!(shader.uniform("mvp", true).unwrap(), Some(0));
    assert_eq!(shader.uniform("alpha", true).unwrap(), Some(1));
    assert_eq!(shader.uniform("missing", false).unwrap(), None);
}

#[test]
fn upload_unknown_attribute() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "unknown");
    let objects = device.borrow().object_count();

    shader
        .upload_attrib("normal", &[0.0f32, 0.0, 1.0], 3, 0)
        .unwrap();

    assert!(!shader.has_attrib("normal"));
    match shader.attrib_size("normal") {
        Err(Error::BufferNotFound { shader, name }) => {
            assert_eq!(shader, "unknown");
            assert_eq!(name, "normal");
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(device.borrow().object_count(), objects);
}

#[test]
fn upload_replaces() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "replace");

    shader
        .upload_attrib("position", &[0.0f32; 9], 3, 1)
        .unwrap();
    assert_eq!(shader.attrib_size("position").unwrap(), 36);
    let id = shader.attrib_buffer("position").unwrap().id();

    shader
        .upload_attrib("position", &[1.0f32; 8], 2, 2)
        .unwrap();

    let buffer = shader.attrib_buffer("position").unwrap();
    assert_eq!(buffer.id(), id);
    assert_eq!(buffer.dim(), 2);
    assert_eq!(buffer.count(), 4);
    assert_eq!(buffer.size(), 32);
    assert_eq!(buffer.version(), Some(2));
    assert_eq!(shader.buffers().count(), 1);
    assert_eq!(device.borrow().buffer_data(id).unwrap().len(), 32);

    let (buffer, pointer) = device.borrow().attribute(0).unwrap();
    assert_eq!(buffer, id);
    assert_eq!(pointer.dim, 2);
    assert_eq!(pointer.format, VertexFormat::Float);
    assert!(!pointer.normalized);
}

#[test]
fn upload_types() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "types");

    shader
        .upload_attrib("color", &[255u8, 0, 0, 255, 0, 255, 0, 255], 4, 0)
        .unwrap();

    let buffer = shader.attrib_buffer("color").unwrap();
    assert_eq!(buffer.format(), VertexFormat::UByte);
    assert_eq!(buffer.component_size(), 1);
    assert!(buffer.integral());
    assert_eq!(buffer.count(), 2);

    let (_, pointer) = device.borrow().attribute(1).unwrap();
    assert!(pointer.normalized);

    shader.upload_indices(&[0u16, 1, 2], 3, 0).unwrap();
    let indices = shader.attrib_buffer("indices").unwrap();
    assert_eq!(indices.binding(), Binding::Indices);
    assert_eq!(indices.format(), VertexFormat::UShort);
    assert_eq!(shader.buffer_size(), 8 + 6);

    match shader.upload_attrib("position", &[0.0f32; 7], 3, 0) {
        Err(Error::BufferSizeMismatch { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    match shader.upload_attrib_raw("position", 3, 2, VertexFormat::Float, false, &[0; 20], 0) {
        Err(Error::BufferSizeMismatch { expected, actual }) => {
            assert_eq!(expected, 24);
            assert_eq!(actual, 20);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn empty_upload_disables_attribute() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "empty");

    shader.upload_attrib("position", &[0.0f32; 3], 3, 0).unwrap();
    assert!(device.borrow().attribute(0).is_some());

    shader.upload_attrib::<f32>("position", &[], 3, 1).unwrap();
    assert!(device.borrow().attribute(0).is_none());
    assert!(shader.has_attrib("position"));
    assert_eq!(shader.attrib_size("position").unwrap(), 0);
}

#[test]
fn versions() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "versions");

    shader.upload_attrib("position", &[0.0f32; 3], 3, 5).unwrap();
    shader.upload_attrib("color", &[0.0f32; 4], 4, 6).unwrap();
    assert_eq!(shader.attrib_version("position"), Some(5));
    assert_eq!(shader.attrib_version("color"), Some(6));
    assert_eq!(shader.attrib_version("normal"), None);

    shader.reset_attrib_version("position");
    assert_eq!(shader.attrib_version("position"), None);
    assert_eq!(shader.attrib_version("color"), Some(6));

    shader.upload_attrib("position", &[0.0f32; 3], 3, 7).unwrap();
    shader.invalidate_attribs();
    assert_eq!(shader.attrib_version("position"), None);
    assert_eq!(shader.attrib_version("color"), None);
    assert!(shader.has_attrib("position"));
}

#[test]
fn download() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "download");

    let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    shader.upload_attrib("position", &data, 3, 0).unwrap();

    let mut out = vec![0u8; shader.attrib_size("position").unwrap()];
    shader.download_attrib("position", &mut out).unwrap();
    let expected: Vec<u8> = data.iter().flat_map(|v| v.to_bits().to_ne_bytes().to_vec()).collect();
    assert_eq!(out, expected);

    match shader.download_attrib("normal", &mut out) {
        Err(Error::BufferNotFound { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    let (ctx, _) = headless(Version::ES(3, 0));
    let mut shader = program(&ctx, "download");
    shader.upload_attrib("position", &data, 3, 0).unwrap();
    match shader.download_attrib("position", &mut out) {
        Err(Error::Unsupported { capability, .. }) => {
            assert_eq!(capability, Capability::BufferReadback)
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn share() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut lender = program(&ctx, "lender");
    let mut borrower = program(&ctx, "borrower");

    lender.upload_attrib("position", &[0.0f32; 9], 3, 3).unwrap();
    let id = lender.attrib_buffer("position").unwrap().id();

    borrower.share_attrib(&lender, "position", None).unwrap();
    {
        let buffer = borrower.attrib_buffer("position").unwrap();
        assert_eq!(buffer.id(), id);
        assert!(!buffer.is_owned());
        assert_eq!(buffer.lender(), Some("lender"));
        assert_eq!(buffer.version(), Some(3));
        assert_eq!(buffer.size(), 36);
    }

    borrower.free().unwrap();
    assert!(device.borrow().is_alive(id));
    assert!(device.borrow().deleted_buffers().is_empty());
    assert_eq!(lender.attrib_size("position").unwrap(), 36);

    let mut borrower = program(&ctx, "borrower");
    borrower.share_attrib(&lender, "position", None).unwrap();

    lender.free_attrib("position").unwrap();
    assert!(!device.borrow().is_alive(id));
    assert_eq!(device.borrow().deleted_buffers(), &[id]);

    assert!(borrower.attrib_buffer("position").unwrap().is_expired());
    let mut out = vec![0; 36];
    match borrower.download_attrib("position", &mut out) {
        Err(Error::BufferExpired { shader, name, lender }) => {
            assert_eq!(shader, "borrower");
            assert_eq!(name, "position");
            assert_eq!(lender, "lender");
        }
        other => panic!("unexpected {:?}", other),
    }

    borrower.bind().unwrap();
    borrower.free_attrib("position").unwrap();
    borrower.free().unwrap();
    assert_eq!(device.borrow().deleted_buffers(), &[id]);
}

#[test]
fn share_alias() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut lender = program(&ctx, "lender");

    let vs = "#version 330
in vec4 tint;
in vec3 position;
out vec4 v_color;
void main() { v_color = tint; gl_Position = vec4(position, 1.0); }";

    let mut borrower = ShaderProgram::new(&ctx);
    borrower.init("borrower", vs, FS, "").unwrap();

    lender.upload_attrib("color", &[1.0f32; 8], 4, 0).unwrap();
    lender.upload_indices(&[0u32, 1, 2], 3, 0).unwrap();

    borrower.upload_attrib("tint", &[0.0f32; 4], 4, 0).unwrap();
    let replaced = borrower.attrib_buffer("tint").unwrap().id();

    borrower.share_attrib(&lender, "color", Some("tint")).unwrap();
    borrower.share_attrib(&lender, "indices", None).unwrap();

    let tint = borrower.attrib_buffer("tint").unwrap();
    assert_eq!(tint.binding(), Binding::Attribute(0));
    assert_eq!(tint.id(), lender.attrib_buffer("color").unwrap().id());
    assert_eq!(device.borrow().deleted_buffers(), &[replaced]);
    assert_eq!(
        borrower.attrib_buffer("indices").unwrap().binding(),
        Binding::Indices
    );

    // Names the borrower has no attribute for are tracked, not attached.
    borrower.share_attrib(&lender, "color", None).unwrap();
    {
        let color = borrower.attrib_buffer("color").unwrap();
        assert_eq!(color.binding(), Binding::Unbound);
        assert!(!color.is_owned());
        assert_eq!(color.id(), lender.attrib_buffer("color").unwrap().id());
    }

    assert!(borrower.has_attrib("color"));
    assert_eq!(borrower.attrib_size("color").unwrap(), 32);
    borrower.bind().unwrap();

    borrower.free().unwrap();
    assert_eq!(device.borrow().deleted_buffers(), &[replaced]);
    assert!(lender.attrib_buffer("color").is_ok());

    match borrower.share_attrib(&lender, "normal", None) {
        Err(Error::BufferNotFound { shader, name }) => {
            assert_eq!(shader, "lender");
            assert_eq!(name, "normal");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn share_chain() {
    let (ctx, _) = headless(Version::GL(3, 3));
    let mut owner = program(&ctx, "owner");
    let mut first = program(&ctx, "first");
    let mut second = program(&ctx, "second");

    owner.upload_attrib("position", &[0.0f32; 3], 3, 0).unwrap();
    first.share_attrib(&owner, "position", None).unwrap();
    second.share_attrib(&first, "position", None).unwrap();

    assert_eq!(second.attrib_buffer("position").unwrap().lender(), Some("owner"));

    owner.free().unwrap();
    assert!(second.attrib_buffer("position").unwrap().is_expired());
}

#[test]
fn draw() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "draw");
    shader.bind().unwrap();

    match shader.draw_indexed(Primitive::Triangles, 0, 1) {
        Err(Error::BufferNotFound { name, .. }) => assert_eq!(name, "indices"),
        other => panic!("unexpected {:?}", other),
    }

    shader.upload_attrib("position", &[0.0f32; 12], 3, 0).unwrap();
    shader.upload_indices(&[0u16, 1, 2, 2, 3, 0], 3, 0).unwrap();

    shader.draw_indexed(Primitive::Triangles, 1, 0).unwrap();
    shader.draw_array(Primitive::Points, 0, 0).unwrap();
    assert!(device.borrow().draws().is_empty());

    shader.draw_indexed(Primitive::Triangles, 1, 1).unwrap();
    shader.draw_indexed(Primitive::Lines, 1, 2).unwrap();
    shader.draw_array(Primitive::TriangleStrip, 1, 3).unwrap();

    let id = shader.program_id().unwrap();
    assert_eq!(
        device.borrow().draws(),
        &[
            DrawCall {
                program: id,
                primitive: Primitive::Triangles,
                offset: 6,
                count: 3,
                indexed: true,
            },
            DrawCall {
                program: id,
                primitive: Primitive::Lines,
                offset: 4,
                count: 4,
                indexed: true,
            },
            DrawCall {
                program: id,
                primitive: Primitive::TriangleStrip,
                offset: 1,
                count: 3,
                indexed: false,
            },
        ]
    );

    assert!(shader.draw_indexed(Primitive::Triangles, 1, 2).is_err());
}

#[test]
fn draw_indexed_overflow() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "overflow");
    shader.bind().unwrap();
    shader.upload_indices(&[0u32, 1, 2], 3, 0).unwrap();

    match shader.draw_indexed(Primitive::Triangles, 0x6000_0000, 1) {
        Err(Error::Backend(_)) | Err(Error::IndexRangeOverflow { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }

    match shader.draw_indexed(Primitive::Triangles, 0, 0x6000_0000) {
        Err(Error::IndexRangeOverflow { offset, count }) => {
            assert_eq!((offset, count), (0, 0x6000_0000))
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(device.borrow().draws().is_empty());
}

#[test]
fn index_buffer_per_vertex_array() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut first = program(&ctx, "first");
    let mut second = program(&ctx, "second");

    first.upload_indices(&[0u32, 1, 2, 2, 3, 0], 3, 0).unwrap();
    second.upload_indices(&[0u32, 1, 2], 3, 0).unwrap();

    first.bind().unwrap();
    first.draw_indexed(Primitive::Triangles, 0, 2).unwrap();

    second.bind().unwrap();
    assert!(second.draw_indexed(Primitive::Triangles, 0, 2).is_err());
    second.draw_indexed(Primitive::Triangles, 0, 1).unwrap();

    let draws = device.borrow().draws().to_vec();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].program, first.program_id().unwrap());
    assert_eq!(draws[0].count, 6);
    assert_eq!(draws[1].program, second.program_id().unwrap());
    assert_eq!(draws[1].count, 3);
}

#[test]
fn init_vertex_array_failure() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = ShaderProgram::new(&ctx);

    // Room for both stages and the program, but not the vertex array.
    device.borrow_mut().set_object_limit(Some(3));
    match shader.init("limited", VS, FS, "") {
        Err(Error::Backend(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert!(!shader.is_ready());
    assert!(shader.program_id().is_none());
    assert!(shader.vertex_id().is_none());
    assert!(shader.fragment_id().is_none());
    assert!(shader.vertex_array_id().is_none());
    assert_eq!(device.borrow().object_count(), 0);

    device.borrow_mut().set_object_limit(None);
    shader.init("limited", VS, FS, "").unwrap();
    assert!(shader.vertex_array_id().is_some());
}

#[test]
fn bind_without_vertex_arrays() {
    let (ctx, device) = headless(Version::ES(2, 0));
    let mut shader = ShaderProgram::new(&ctx);

    let vs = "attribute vec2 position;\nattribute vec2 uv;\nvarying vec2 v_uv;\nvoid main() { v_uv = uv; gl_Position = vec4(position, 0.0, 1.0); }";
    let fs = "precision mediump float;\nvarying vec2 v_uv;\nvoid main() { gl_FragColor = vec4(v_uv, 0.0, 1.0); }";
    shader.init("es", vs, fs, "").unwrap();

    shader.upload_attrib("position", &[0.0f32; 6], 2, 0).unwrap();
    shader.upload_attrib("uv", &[0.0f32; 6], 2, 0).unwrap();
    unsafe {
        use glkit::video::backends::Device;
        device.borrow_mut().disable_attribute(0).unwrap();
        device.borrow_mut().disable_attribute(1).unwrap();
    }

    shader.bind().unwrap();
    assert_eq!(device.borrow().attribute(0).unwrap().0, shader.attrib_buffer("position").unwrap().id());
    assert_eq!(device.borrow().attribute(1).unwrap().0, shader.attrib_buffer("uv").unwrap().id());
}

#[test]
fn uniforms() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let shader = program(&ctx, "uniforms");
    shader.bind().unwrap();

    shader.set_uniform("alpha", 0.5f32, true).unwrap();
    shader.set_uniform("mvp", Matrix4::<f32>::one(), true).unwrap();
    shader.set_uniform("missing", 1i32, false).unwrap();

    let id = shader.program_id().unwrap();
    let device = device.borrow();
    assert_eq!(device.uniform(id, 1), Some(UniformVariable::F32(0.5)));
    match device.uniform(id, 0) {
        Some(UniformVariable::Matrix4f(m, false)) => assert_eq!(m[2][2], 1.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn free() {
    let (ctx, device) = headless(Version::GL(3, 3));
    let mut shader = program(&ctx, "free");
    shader.upload_attrib("position", &[0.0f32; 3], 3, 0).unwrap();
    shader.upload_indices(&[0u8], 1, 0).unwrap();
    assert_eq!(device.borrow().object_count(), 6);

    shader.free().unwrap();
    assert!(!shader.is_ready());
    assert!(!shader.has_attrib("position"));
    assert_eq!(device.borrow().object_count(), 0);
    assert_eq!(device.borrow().deleted_buffers().len(), 2);

    shader.free().unwrap();
    assert_eq!(device.borrow().deleted_buffers().len(), 2);

    // Dropping and re-initializing release everything as well.
    let mut shader = program(&ctx, "reinit");
    shader.upload_attrib("position", &[0.0f32; 3], 3, 0).unwrap();
    shader.init("reinit", VS, FS, "").unwrap();
    assert_eq!(device.borrow().object_count(), 4);

    drop(shader);
    assert_eq!(device.borrow().object_count(), 0);
}
