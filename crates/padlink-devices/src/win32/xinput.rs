use libloading::os::windows::Library;
use windows::Win32::UI::Input::XboxController::{
    XInputGetCapabilities, XInputGetState, XINPUT_CAPABILITIES, XINPUT_FLAG, XINPUT_STATE,
};

use crate::xinput::{BasicCapabilities, ExtendedCapabilities, XInputBackend};

const XINPUT_LIBRARY: &str = "xinput1_4.dll";
/// Undocumented `XInputGetCapabilitiesEx` export.
const CAPABILITIES_EX_ORDINAL: u16 = 108;
const ERROR_SUCCESS: u32 = 0;

#[repr(C)]
#[derive(Default)]
struct CapabilitiesEx {
    capabilities: XINPUT_CAPABILITIES,
    vendor_id: u16,
    product_id: u16,
    revision_id: u16,
    serial: u32,
}

type GetCapabilitiesEx = unsafe extern "system" fn(u32, u32, u32, *mut CapabilitiesEx) -> u32;

/// XInput through the system `xinput1_4.dll`.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct XInput;

impl XInputBackend for XInput {
    fn is_connected(&self, slot: u32) -> bool {
        let mut state = XINPUT_STATE::default();
        unsafe { XInputGetState(slot, &mut state) == ERROR_SUCCESS }
    }

    fn capabilities_ex(&self, slot: u32) -> Option<ExtendedCapabilities> {
        // The library is only held for the duration of the query.
        let library = unsafe { Library::new(XINPUT_LIBRARY) }
            .map_err(|e| log::debug!("{XINPUT_LIBRARY} not loadable: {e}"))
            .ok()?;
        let query = unsafe { library.get_ordinal::<GetCapabilitiesEx>(CAPABILITIES_EX_ORDINAL) }
            .map_err(|e| log::debug!("extended capability query unavailable: {e}"))
            .ok()?;

        let mut caps = CapabilitiesEx::default();
        if unsafe { query(1, slot, 0, &mut caps) } != ERROR_SUCCESS {
            return None;
        }
        Some(ExtendedCapabilities {
            subtype: caps.capabilities.SubType.0,
            vendor_id: caps.vendor_id,
            product_id: caps.product_id,
            revision: caps.revision_id,
        })
    }

    fn capabilities(&self, slot: u32) -> Option<BasicCapabilities> {
        let mut caps = XINPUT_CAPABILITIES::default();
        if unsafe { XInputGetCapabilities(slot, XINPUT_FLAG(0), &mut caps) } != ERROR_SUCCESS {
            return None;
        }
        Some(BasicCapabilities { subtype: caps.SubType.0 })
    }
}
