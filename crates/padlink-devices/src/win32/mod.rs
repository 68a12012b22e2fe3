//! Windows implementations of the enumeration backends.

mod cfgmgr;
mod dinput;
mod hidapi_backend;
mod setupapi;
mod xinput;

use crate::backend::{Backends, Unsupported};
use crate::hid::HidBackend;

pub(crate) use cfgmgr::ConfigManager;
pub(crate) use dinput::DirectInput;
pub(crate) use hidapi_backend::HidApiBackend;
pub(crate) use setupapi::SetupApi;
pub(crate) use xinput::XInput;

pub(crate) fn backends() -> Backends {
    let hid: Box<dyn HidBackend> = match HidApiBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            log::warn!("hidapi is unavailable: {e}");
            Box::new(Unsupported)
        }
    };
    Backends {
        topology: Box::new(ConfigManager),
        legacy: Box::new(DirectInput),
        xinput: Box::new(XInput),
        hid,
        class_query: Box::new(SetupApi),
    }
}

/// NUL-terminated UTF-16 copy of `s`.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Reads a UTF-16 buffer up to its first NUL.
pub(crate) fn from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|c| *c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}
