//! Uncompressed 32-bit true-color TGA images.
//!
//! Only the subset written by `Framebuffer::download_tga` is supported: no
//! color map, no run-length encoding, BGRA pixels.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::errors::*;

pub const HEADER_SIZE: usize = 18;

const TRUE_COLOR: u8 = 2;
const TOP_LEFT: u8 = 0x20;

/// A decoded image, BGRA rows from top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

/// Fails with `Error::ImageTooLarge` unless both dimensions fit the 16-bit
/// header fields.
pub fn check_size(width: i32, height: i32) -> Result<()> {
    let max = i32::from(u16::max_value());
    if width < 0 || height < 0 || width > max || height > max {
        return Err(Error::ImageTooLarge(width, height));
    }

    Ok(())
}

/// Writes `pixels` (BGRA rows from top to bottom) as a TGA image.
pub fn write<W: Write>(mut writer: W, width: i32, height: i32, pixels: &[u8]) -> Result<()> {
    check_size(width, height)?;

    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(Error::BufferSizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    // Id length, color map type, image type and color map specification.
    writer.write_all(&[0, 0, TRUE_COLOR, 0, 0, 0, 0, 0])?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u16::<LittleEndian>(width as u16)?;
    writer.write_u16::<LittleEndian>(height as u16)?;
    writer.write_u8(32)?;
    writer.write_u8(TOP_LEFT)?;
    writer.write_all(pixels)?;
    writer.flush()?;
    Ok(())
}

/// Reads an uncompressed 32-bit TGA image.
pub fn read<R: Read>(mut reader: R) -> Result<Image> {
    let id_len = reader.read_u8()?;
    let color_map = reader.read_u8()?;
    let image_type = reader.read_u8()?;

    let mut color_map_spec = [0; 5];
    reader.read_exact(&mut color_map_spec)?;

    let _x = reader.read_u16::<LittleEndian>()?;
    let _y = reader.read_u16::<LittleEndian>()?;
    let width = reader.read_u16::<LittleEndian>()?;
    let height = reader.read_u16::<LittleEndian>()?;
    let bpp = reader.read_u8()?;
    let descriptor = reader.read_u8()?;

    if color_map != 0 || image_type != TRUE_COLOR || bpp != 32 {
        return Err(invalid(format!(
            "unsupported TGA image (color map {}, type {}, {} bits per pixel)",
            color_map, image_type, bpp
        )));
    }

    let mut id = vec![0; id_len as usize];
    reader.read_exact(&mut id)?;

    let mut pixels = vec![0; width as usize * height as usize * 4];
    reader.read_exact(&mut pixels)?;

    if descriptor & TOP_LEFT == 0 {
        pixels = flip_rows(&pixels, width as usize * 4);
    }

    Ok(Image {
        width,
        height,
        pixels,
    })
}

/// Reverses the order of rows `stride` bytes long.
pub fn flip_rows(pixels: &[u8], stride: usize) -> Vec<u8> {
    if stride == 0 {
        return pixels.to_vec();
    }

    let mut flipped = Vec::with_capacity(pixels.len());
    for row in pixels.chunks(stride).rev() {
        flipped.extend_from_slice(row);
    }

    flipped
}

fn invalid(desc: String) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidData, desc))
}
