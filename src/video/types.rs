//! Plain data types passed between the wrappers and the graphics context.

use std::fmt;

use cgmath::Matrix4;

use crate::math::color::Color;
use crate::math::vector::{Vector2, Vector3, Vector4};

/// Raw name of a graphics context object (shader, program, buffer, ...).
pub type ObjectId = u32;

/// Location of an attribute or uniform in a linked program.
pub type Location = u32;

/// The value `glCheckFramebufferStatus` reports for a usable framebuffer.
pub const FRAMEBUFFER_COMPLETE: u32 = 0x8CD5;
/// At least one attachment is missing storage or has a zero-sized image.
pub const FRAMEBUFFER_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;

/// The name of the index buffer in a program's buffer collection.
pub const INDICES: &str = "indices";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };

        write!(f, "{}", name)
    }
}

/// Defines how the input vertex data is used to assemble primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Primitive {
    /// Number of indices a single primitive consumes in `draw_indexed`.
    #[inline]
    pub fn multiplier(self) -> u32 {
        match self {
            Primitive::Triangles => 3,
            Primitive::Lines => 2,
            _ => 1,
        }
    }
}

/// The data type of a single component of a vertex attribute or index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    HalfFloat,
    Float,
    Double,
}

impl VertexFormat {
    /// Size of one component in bytes.
    pub fn size(self) -> usize {
        match self {
            VertexFormat::Byte | VertexFormat::UByte => 1,
            VertexFormat::Short | VertexFormat::UShort | VertexFormat::HalfFloat => 2,
            VertexFormat::Int | VertexFormat::UInt | VertexFormat::Float => 4,
            VertexFormat::Double => 8,
        }
    }
}

/// Plain numeric types that can be uploaded as vertex attributes or indices.
///
/// This trait is sealed: implementors must have no padding and no invalid bit
/// patterns, since their memory is handed to the graphics context as bytes.
pub trait VertexComponent: Copy + private::Sealed {
    const FORMAT: VertexFormat;
    const INTEGRAL: bool;
}

mod private {
    pub trait Sealed {}
}

macro_rules! impl_vertex_component {
    ($($ty:ty => $format:ident, $integral:expr;)+) => {
        $(
            impl private::Sealed for $ty {}

            impl VertexComponent for $ty {
                const FORMAT: VertexFormat = VertexFormat::$format;
                const INTEGRAL: bool = $integral;
            }
        )+
    };
}

impl_vertex_component! {
    i8 => Byte, true;
    u8 => UByte, true;
    i16 => Short, true;
    u16 => UShort, true;
    i32 => Int, true;
    u32 => UInt, true;
    f32 => Float, false;
    f64 => Double, false;
}

/// Reinterprets a slice of vertex components as raw bytes.
pub fn as_bytes<T: VertexComponent>(data: &[T]) -> &[u8] {
    let len = data.len() * ::std::mem::size_of::<T>();
    // `VertexComponent` is only implemented for primitive numeric types.
    unsafe { ::std::slice::from_raw_parts(data.as_ptr() as *const u8, len) }
}

/// The binding point of a buffer object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data (`GL_ARRAY_BUFFER`).
    Vertex,
    /// Element indices (`GL_ELEMENT_ARRAY_BUFFER`).
    Index,
}

/// How an attribute location reads from its buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributePointer {
    /// Components per vertex.
    pub dim: usize,
    pub format: VertexFormat,
    /// Integer data is mapped to [0, 1] (or [-1, 1]) when read by the shader.
    pub normalized: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    RGBA8,
    Depth24Stencil8,
}

/// A value assignable to a uniform variable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformVariable {
    I32(i32),
    F32(f32),
    Vector2i([i32; 2]),
    Vector3i([i32; 3]),
    Vector4i([i32; 4]),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix4f([[f32; 4]; 4], bool),
}

impl From<i32> for UniformVariable {
    fn from(v: i32) -> Self {
        UniformVariable::I32(v)
    }
}

impl From<f32> for UniformVariable {
    fn from(v: f32) -> Self {
        UniformVariable::F32(v)
    }
}

impl From<Vector2<i32>> for UniformVariable {
    fn from(v: Vector2<i32>) -> Self {
        UniformVariable::Vector2i(v.into())
    }
}

impl From<Vector3<i32>> for UniformVariable {
    fn from(v: Vector3<i32>) -> Self {
        UniformVariable::Vector3i(v.into())
    }
}

impl From<Vector4<i32>> for UniformVariable {
    fn from(v: Vector4<i32>) -> Self {
        UniformVariable::Vector4i(v.into())
    }
}

impl From<Vector2<f32>> for UniformVariable {
    fn from(v: Vector2<f32>) -> Self {
        UniformVariable::Vector2f(v.into())
    }
}

impl From<Vector3<f32>> for UniformVariable {
    fn from(v: Vector3<f32>) -> Self {
        UniformVariable::Vector3f(v.into())
    }
}

impl From<Vector4<f32>> for UniformVariable {
    fn from(v: Vector4<f32>) -> Self {
        UniformVariable::Vector4f(v.into())
    }
}

impl From<Color> for UniformVariable {
    fn from(v: Color) -> Self {
        UniformVariable::Vector4f(v.to_native())
    }
}

impl From<Matrix4<f32>> for UniformVariable {
    fn from(v: Matrix4<f32>) -> Self {
        UniformVariable::Matrix4f(*v.as_ref(), false)
    }
}

impl From<[[f32; 4]; 4]> for UniformVariable {
    fn from(v: [[f32; 4]; 4]) -> Self {
        UniformVariable::Matrix4f(v, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn multiplier() {
        assert_eq!(Primitive::Triangles.multiplier(), 3);
        assert_eq!(Primitive::Lines.multiplier(), 2);
        assert_eq!(Primitive::TriangleStrip.multiplier(), 1);
        assert_eq!(Primitive::Points.multiplier(), 1);
    }

    #[test]
    fn bytes() {
        let data = [1u16, 0x0203];
        let bytes = as_bytes(&data);
        assert_eq!(bytes.len(), 4);
        assert_eq!(u16::from_ne_bytes([bytes[2], bytes[3]]), 0x0203);

        assert_eq!(<f32 as VertexComponent>::FORMAT.size(), 4);
        assert!(<u8 as VertexComponent>::INTEGRAL);
        assert!(!<f64 as VertexComponent>::INTEGRAL);
    }
}
