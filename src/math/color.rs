use serde::{Deserialize, Serialize};

/// A RGBA `Color`. Each color component is a floating point value with a
/// conventional range from 0 to 1, values outside of it are kept as they are.
///
/// # Layout
///
/// The struct is `#[repr(C)]` with the channels stored as four packed `f32` in
/// `r, g, b, a` order. This is the same memory layout as the `float rgba[4]`
/// color of the vector graphics and OpenGL APIs, see `Color::to_native` and
/// `Color::as_ptr`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Color::from_ints(
            i32::from(v[0]),
            i32::from(v[1]),
            i32::from(v[2]),
            i32::from(v[3]),
        )
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        let v = color.clip();
        let max = 255.0;
        [
            (v.r * max).round() as u8,
            (v.g * max).round() as u8,
            (v.b * max).round() as u8,
            (v.a * max).round() as u8,
        ]
    }
}

impl From<[f32; 4]> for Color {
    fn from(v: [f32; 4]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(color: Color) -> Self {
        color.to_native()
    }
}

impl Color {
    /// Creates the color `(r, g, b, a)`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    /// Creates the color `(intensity, intensity, intensity, alpha)`.
    pub fn gray_alpha(intensity: f32, alpha: f32) -> Self {
        Color::new(intensity, intensity, intensity, alpha)
    }

    /// Creates the color `(r, g, b, a) / 255`. Values are converted to floats
    /// before the division.
    pub fn from_ints(r: i32, g: i32, b: i32, a: i32) -> Self {
        let max = 255.0;
        Color::new(
            r as f32 / max,
            g as f32 / max,
            b as f32 / max,
            a as f32 / max,
        )
    }

    /// Creates the color `(intensity, intensity, intensity, alpha) / 255`.
    pub fn gray_alpha_ints(intensity: i32, alpha: i32) -> Self {
        Color::from_ints(intensity, intensity, intensity, alpha)
    }

    /// Returns an opaque color that stays readable on top of `self`.
    ///
    /// The luminance is computed as `0.299r + 0.587g + 0.144b`, alpha is
    /// ignored. White is returned for luminances below 0.5 and black otherwise.
    pub fn contrasting_color(&self) -> Self {
        let luminance = 0.299 * self.r + 0.587 * self.g + 0.144 * self.b;
        if luminance < 0.5 {
            Color::white()
        } else {
            Color::black()
        }
    }

    /// Returns the `grayscale` representation of RGB values.
    pub fn grayscale(&self) -> f32 {
        self.r * 0.299 + self.g * 0.587 + self.b * 0.114
    }

    /// Clip to [0.0, 1.0] range.
    pub fn clip(&self) -> Self {
        Color::new(
            self.r.max(0.0).min(1.0),
            self.g.max(0.0).min(1.0),
            self.b.max(0.0).min(1.0),
            self.a.max(0.0).min(1.0),
        )
    }

    /// Truncate alpha channel.
    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Converts into the native `float[4]` color representation. The channel
    /// order is `r, g, b, a`, identical to the in-memory layout of `Color`.
    #[inline]
    pub fn to_native(self) -> [f32; 4] {
        self.rgba()
    }

    /// Returns a pointer to the four packed channels, suitable for APIs that
    /// take a `const float*` color such as `glUniform4fv`.
    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        &self.r as *const f32
    }
}

impl Color {
    pub fn white() -> Self {
        Color::new(1.0, 1.0, 1.0, 1.0)
    }

    pub fn gray() -> Self {
        Color::new(0.5, 0.5, 0.5, 1.0)
    }

    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn red() -> Self {
        Color::new(1.0, 0.0, 0.0, 1.0)
    }

    pub fn green() -> Self {
        Color::new(0.0, 1.0, 0.0, 1.0)
    }

    pub fn blue() -> Self {
        Color::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn cyan() -> Self {
        Color::new(0.0, 1.0, 1.0, 1.0)
    }

    pub fn magenta() -> Self {
        Color::new(1.0, 0.0, 1.0, 1.0)
    }

    pub fn yellow() -> Self {
        Color::new(1.0, 1.0, 0.0, 1.0)
    }

    pub fn transparent() -> Self {
        Color::new(0.0, 0.0, 0.0, 0.0)
    }
}
