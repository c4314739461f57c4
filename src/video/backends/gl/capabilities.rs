use std::ffi;

use gl;
use gl::types::*;

use super::super::super::capabilities::{Capabilities, Extensions, Version};
use super::super::super::errors::*;

unsafe fn string(name: GLenum) -> Result<String> {
    let desc = gl::GetString(name);
    if desc.is_null() {
        return Err(Error::Backend(format!("[GL] glGetString(0x{:X}) failed.", name)));
    }

    Ok(ffi::CStr::from_ptr(desc as *const _)
        .to_string_lossy()
        .into_owned())
}

/// Obtains the version of the current context using the loaded functions.
///
/// # Safety
///
/// You must ensure that the functions belong to the current context.
pub unsafe fn parse_version() -> Result<Version> {
    let desc = string(gl::VERSION)?;
    Version::parse_str(&desc)
        .ok_or_else(|| Error::Backend(format!("[GL] Version string {:?} is unformaled.", desc)))
}

/// Returns the list of extensions supported by the current context.
///
/// The version must match the one of the context, since the query differs
/// between the legacy and the indexed API.
pub unsafe fn parse_extensions(version: Version) -> Result<Extensions> {
    let names: Vec<String> = if version >= Version::GL(3, 0) || version >= Version::ES(3, 0) {
        let mut num = 0;
        gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num);
        (0..num.max(0))
            .filter_map(|i| {
                let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                if ext.is_null() {
                    None
                } else {
                    Some(
                        ffi::CStr::from_ptr(ext as *const _)
                            .to_string_lossy()
                            .into_owned(),
                    )
                }
            })
            .collect()
    } else {
        string(gl::EXTENSIONS)?
            .split(' ')
            .map(|v| v.to_owned())
            .collect()
    };

    Ok(Extensions::from_names(names.iter().map(|v| v.as_str())))
}

/// Queries the capabilities of the current context.
pub unsafe fn parse() -> Result<Capabilities> {
    let version = parse_version()?;
    let extensions = parse_extensions(version)?;

    let mut caps = Capabilities::new(version, extensions);
    caps.vendor = string(gl::VENDOR)?;
    caps.renderer = string(gl::RENDERER)?;
    Ok(caps)
}
