//! Resolution of the primary display, used when none is given on the command line.

use crate::error::{Error, Result};
use crate::resolution::Resolution;

#[cfg(target_os = "windows")]
pub fn primary_resolution() -> Result<Resolution> {
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    // SAFETY: GetSystemMetrics has no preconditions and only reads system state.
    let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };

    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok(Resolution::new(width, height)),
        _ => Err(Error::DisplayDetection(format!(
            "GetSystemMetrics returned {width}x{height}"
        ))),
    }
}

#[cfg(not(target_os = "windows"))]
pub fn primary_resolution() -> Result<Resolution> {
    Err(Error::DisplayDetection(
        "auto-detection is only available on Windows, pass WIDTHxHEIGHT instead".to_string(),
    ))
}
