//! The OpenGL (and OpenGL ES) device, built on the `gl` function loader.

pub mod capabilities;
pub mod device;
pub mod types;

pub use self::device::GLDevice;

use std::os::raw::c_void;

/// Loads the GL functions of the current context through `loader`, which maps
/// a symbol name to its address (e.g. `window.get_proc_address`).
pub fn load_with<F>(loader: F)
where
    F: FnMut(&str) -> *const c_void,
{
    gl::load_with(loader);
}
