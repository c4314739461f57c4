//! What the active graphics context is able to do.
//!
//! The toolkit targets two profiles of the same API: desktop OpenGL and
//! OpenGL ES. Instead of compiling different code paths, the wrappers ask the
//! context at runtime with `Capabilities::supports`.

use std::cmp;
use std::fmt;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Version::GL(major, minor) => write!(f, "OpenGL {}.{}", major, minor),
            Version::ES(major, minor) => write!(f, "OpenGL ES {}.{}", major, minor),
        }
    }
}

impl Version {
    /// Parses the string returned by `glGetString(GL_VERSION)`, e.g.
    /// `"4.6.0 NVIDIA 390.77"` or `"OpenGL ES 3.0 Mesa 18.0.5"`.
    pub fn parse_str(desc: &str) -> Option<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            // "OpenGL ES-CM 1.1" and friends.
            (true, desc.splitn(2, ' ').nth(1)?)
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc.split(' ').next()?;
        let mut iter = desc.split('.');
        let major = iter.next()?.parse().ok()?;
        let minor = iter.next()?.parse().ok()?;

        if es {
            Some(Version::ES(major, minor))
        } else {
            Some(Version::GL(major, minor))
        }
    }

    #[inline]
    pub fn is_embedded(self) -> bool {
        match self {
            Version::ES(_, _) => true,
            Version::GL(_, _) => false,
        }
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Picks the known extensions out of a list of extension names.
            pub fn from_names<'a, T>(names: T) -> Extensions
            where
                T: IntoIterator<Item = &'a str>,
            {
                let mut extensions = Extensions::default();
                for name in names {
                    match name {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => ()
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_EXT_geometry_shader" => gl_ext_geometry_shader,
    "GL_OES_geometry_shader" => gl_oes_geometry_shader,
    "GL_EXT_read_format_bgra" => gl_ext_read_format_bgra,
}

/// An optional feature of the graphics context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Programs may contain a geometry stage.
    GeometryShader,
    /// Vertex layout state can be captured in a vertex array object.
    VertexArrayObject,
    /// Buffer contents can be read back into client memory.
    BufferReadback,
    /// Render targets can be allocated with more than one sample per pixel.
    MultisampleStorage,
    /// Framebuffers can be copied with `glBlitFramebuffer`.
    FramebufferBlit,
    /// Color buffers can be read back as BGRA bytes.
    PixelReadback,
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Returns a version or release number.
    pub version: Version,

    /// The company responsible for this GL implementation.
    pub vendor: String,

    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,

    /// The list of OpenGL extensions support by this implementation.
    pub extensions: Extensions,
}

impl Capabilities {
    pub fn new(version: Version, extensions: Extensions) -> Self {
        Capabilities {
            version,
            extensions,
            vendor: String::new(),
            renderer: String::new(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        let version = self.version;
        let exts = &self.extensions;

        match capability {
            Capability::GeometryShader => {
                version >= Version::GL(3, 2)
                    || version >= Version::ES(3, 2)
                    || (version >= Version::ES(3, 1)
                        && (exts.gl_ext_geometry_shader || exts.gl_oes_geometry_shader))
            }
            Capability::VertexArrayObject
            | Capability::MultisampleStorage
            | Capability::FramebufferBlit => {
                version >= Version::GL(3, 0) || version >= Version::ES(3, 0)
            }
            Capability::BufferReadback => !version.is_embedded(),
            Capability::PixelReadback => !version.is_embedded() || exts.gl_ext_read_format_bgra,
        }
    }
}
