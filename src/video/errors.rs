use std::io;

use super::capabilities::Capability;
use super::types::ShaderStage;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "[{}] The {} stage source is empty.", name, stage)]
    MissingStage { name: String, stage: ShaderStage },
    #[fail(
        display = "[{}] Failed to compile {} stage:\n{}\nError:\n{}",
        name, stage, source, log
    )]
    ShaderCompilation {
        name: String,
        stage: ShaderStage,
        source: String,
        log: String,
    },
    #[fail(display = "[{}] Failed to link program:\n{}", name, log)]
    ShaderLink { name: String, log: String },
    #[fail(display = "{} is not supported by the active profile ({:?}).", operation, capability)]
    Unsupported {
        operation: &'static str,
        capability: Capability,
    },
    #[fail(display = "[{}] Buffer {:?} not found.", shader, name)]
    BufferNotFound { shader: String, name: String },
    #[fail(display = "[{}] Shared buffer {:?} has been released by {:?}.", shader, name, lender)]
    BufferExpired {
        shader: String,
        name: String,
        lender: String,
    },
    #[fail(display = "Buffer size mismatch, expects {} bytes but got {}.", expected, actual)]
    BufferSizeMismatch { expected: usize, actual: usize },
    #[fail(display = "Drawing {} primitives from {} overflows the index range.", count, offset)]
    IndexRangeOverflow { offset: u32, count: u32 },
    #[fail(display = "Framebuffer is incomplete (status 0x{:X}).", _0)]
    FramebufferIncomplete(u32),
    #[fail(display = "{} has not been initialized.", _0)]
    Uninitialized(String),
    #[fail(display = "Image of {}x{} pixels can not be encoded.", _0, _1)]
    ImageTooLarge(i32, i32),
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    #[fail(display = "{}", _0)]
    Backend(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Stores `next` into `result` unless an earlier error is already there, in
/// which case `next` is logged.
pub(crate) fn keep_first(result: &mut Result<()>, next: Result<()>) {
    if let Err(err) = next {
        if result.is_ok() {
            *result = Err(err);
        } else {
            error!("{}", err);
        }
    }
}
