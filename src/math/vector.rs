//! Small fixed-size vectors with named and indexed component access.
//!
//! Unlike `cgmath` vectors, these only require the element type to be `Copy`
//! plus the arithmetic trait in use, so they work equally for `f32` positions
//! and `i32` pixel coordinates. Conversions to and from `cgmath` are provided
//! where the math library is needed.

use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::{Deserialize, Serialize};

macro_rules! impl_vector {
    ($name:ident, $cgmath:ident, $n:expr, { $($field:ident : $index:tt),+ }) => {
        #[repr(C)]
        #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name<T> {
            $(pub $field: T,)+
        }

        impl<T: Copy> $name<T> {
            #[inline]
            pub fn new($($field: T),+) -> Self {
                $name { $($field),+ }
            }

            /// Creates a vector with every component set to `value`.
            #[inline]
            pub fn splat(value: T) -> Self {
                $name { $($field: value),+ }
            }

            #[inline]
            pub fn to_array(self) -> [T; $n] {
                [$(self.$field),+]
            }
        }

        impl<T: Copy> From<[T; $n]> for $name<T> {
            #[inline]
            fn from(v: [T; $n]) -> Self {
                $name { $($field: v[$index]),+ }
            }
        }

        impl<T: Copy> From<$name<T>> for [T; $n] {
            #[inline]
            fn from(v: $name<T>) -> Self {
                v.to_array()
            }
        }

        impl<T> From<cgmath::$cgmath<T>> for $name<T> {
            #[inline]
            fn from(v: cgmath::$cgmath<T>) -> Self {
                $name { $($field: v.$field),+ }
            }
        }

        impl<T> From<$name<T>> for cgmath::$cgmath<T> {
            #[inline]
            fn from(v: $name<T>) -> Self {
                cgmath::$cgmath { $($field: v.$field),+ }
            }
        }

        /// # Panics
        ///
        /// Accessing a component outside of `0..N` is a precondition violation
        /// and panics.
        impl<T> Index<usize> for $name<T> {
            type Output = T;

            #[inline]
            fn index(&self, i: usize) -> &T {
                match i {
                    $($index => &self.$field,)+
                    _ => panic!("{} index {} is out of range.", stringify!($name), i),
                }
            }
        }

        impl<T> IndexMut<usize> for $name<T> {
            #[inline]
            fn index_mut(&mut self, i: usize) -> &mut T {
                match i {
                    $($index => &mut self.$field,)+
                    _ => panic!("{} index {} is out of range.", stringify!($name), i),
                }
            }
        }

        impl<T: Add<Output = T>> Add for $name<T> {
            type Output = $name<T>;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                $name { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl<T: Sub<Output = T>> Sub for $name<T> {
            type Output = $name<T>;

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $name { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl<T: AddAssign> AddAssign for $name<T> {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                $(self.$field += rhs.$field;)+
            }
        }

        impl<T: SubAssign> SubAssign for $name<T> {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                $(self.$field -= rhs.$field;)+
            }
        }
    };
}

impl_vector!(Vector2, Vector2, 2, { x: 0, y: 1 });
impl_vector!(Vector3, Vector3, 3, { x: 0, y: 1, z: 2 });
impl_vector!(Vector4, Vector4, 4, { x: 0, y: 1, z: 2, w: 3 });

pub type Vector2f = Vector2<f32>;
pub type Vector3f = Vector3<f32>;
pub type Vector4f = Vector4<f32>;
pub type Vector2i = Vector2<i32>;
pub type Vector3i = Vector3<i32>;
pub type Vector4i = Vector4<i32>;

impl<T: Copy + ::std::ops::Mul<Output = T>> Vector2<T> {
    /// Returns the product of both components, e.g. the pixel count of a size.
    #[inline]
    pub fn product(self) -> T {
        self.x * self.y
    }
}
