//! Value types shared by the toolkit: colors, small fixed-size vectors and the
//! arcball rotation controller. Matrices and quaternions come from `cgmath`.

pub mod arcball;
pub mod color;
pub mod vector;

pub mod prelude {
    pub use cgmath::{InnerSpace, Matrix4, One, Quaternion, Rad, Zero};

    pub use super::arcball::Arcball;
    pub use super::color::Color;
    pub use super::vector::{
        Vector2, Vector2f, Vector2i, Vector3, Vector3f, Vector3i, Vector4, Vector4f, Vector4i,
    };
}
