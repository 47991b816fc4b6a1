//! Win32 backends: Raw Input keyboard/mouse and XInput pads.

pub mod keyboard;
pub mod mouse;
pub mod xinput;

use core::ffi::c_void;

use windows_sys::Win32::UI::Input::{
    GetRawInputData, RAWINPUT, RAWINPUTHEADER, RID_INPUT,
};

/// Reads the `RAWINPUT` payload behind a `WM_INPUT` lparam.
///
/// The payload is variable-sized; the fixed-size `RAWINPUT` union is large
/// enough for keyboard and mouse packets, which are all this crate inspects.
pub(crate) fn read_raw_input(lparam: isize) -> Option<RAWINPUT> {
    unsafe {
        let mut raw: RAWINPUT = core::mem::zeroed();
        let mut size = core::mem::size_of::<RAWINPUT>() as u32;
        let copied = GetRawInputData(
            lparam as _,
            RID_INPUT,
            &mut raw as *mut RAWINPUT as *mut c_void,
            &mut size,
            core::mem::size_of::<RAWINPUTHEADER>() as u32,
        );
        if copied == u32::MAX {
            return None;
        }
        Some(raw)
    }
}
