use std::ffi::c_void;

use windows::core::{Interface, GUID};
use windows::Win32::Devices::HumanInterfaceDevice::{
    DirectInput8Create, IDirectInput8W, IDirectInputDevice8W, DI8DEVCLASS_GAMECTRL,
    DIDEVICEINSTANCEW, DIEDFL_ATTACHEDONLY, DIPH_DEVICE, DIPROPGUIDANDPATH, DIPROPHEADER,
};
use windows::Win32::Foundation::{BOOL, HINSTANCE};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;

use super::from_wide;
use crate::legacy::{LegacyBackend, LegacyDeviceInfo};
use crate::DeviceError;

const DIRECTINPUT_VERSION: u32 = 0x0800;
const DIENUM_CONTINUE: BOOL = BOOL(1);

/// `MAKEDIPROP(12)`: property ids are small integers passed as GUID pointers.
fn guid_and_path_property() -> *const GUID {
    12usize as *const GUID
}

impl From<windows::core::Error> for DeviceError {
    fn from(e: windows::core::Error) -> Self {
        DeviceError::Os {
            call: "DirectInput",
            code: e.code().0 as u32,
        }
    }
}

/// Windows text form of a GUID, `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`.
pub(crate) fn guid_text(guid: &GUID) -> String {
    let d = guid.data4;
    format!(
        "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
        guid.data1, guid.data2, guid.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
    )
}

struct Found {
    instance: GUID,
    product: GUID,
    name: String,
}

unsafe extern "system" fn collect(instance: *mut DIDEVICEINSTANCEW, context: *mut c_void) -> BOOL {
    let found = &mut *context.cast::<Vec<Found>>();
    let instance = &*instance;
    found.push(Found {
        instance: instance.guidInstance,
        product: instance.guidProduct,
        name: from_wide(&instance.tszProductName),
    });
    DIENUM_CONTINUE
}

/// Legacy game controllers through DirectInput 8.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DirectInput;

impl DirectInput {
    fn interface_path(input: &IDirectInput8W, instance: &GUID) -> Result<String, DeviceError> {
        let mut device: Option<IDirectInputDevice8W> = None;
        unsafe { input.CreateDevice(instance, &mut device, None)? };
        let device = device.ok_or(DeviceError::Backend("CreateDevice returned no device".into()))?;

        let mut property = DIPROPGUIDANDPATH::default();
        property.diph = DIPROPHEADER {
            dwSize: std::mem::size_of::<DIPROPGUIDANDPATH>() as u32,
            dwHeaderSize: std::mem::size_of::<DIPROPHEADER>() as u32,
            dwObj: 0,
            dwHow: DIPH_DEVICE,
        };
        unsafe { device.GetProperty(guid_and_path_property(), &mut property.diph)? };
        Ok(from_wide(&property.wszPath))
    }
}

impl LegacyBackend for DirectInput {
    fn devices(&self) -> Result<Vec<LegacyDeviceInfo>, DeviceError> {
        let module = unsafe { GetModuleHandleW(None)? };
        let mut raw: *mut c_void = std::ptr::null_mut();
        unsafe {
            DirectInput8Create(
                HINSTANCE::from(module),
                DIRECTINPUT_VERSION,
                &IDirectInput8W::IID,
                &mut raw,
                None,
            )?;
        }
        let input = unsafe { IDirectInput8W::from_raw(raw) };

        let mut found: Vec<Found> = Vec::new();
        unsafe {
            input.EnumDevices(
                DI8DEVCLASS_GAMECTRL,
                Some(collect),
                (&mut found as *mut Vec<Found>).cast(),
                DIEDFL_ATTACHEDONLY,
            )?;
        }

        Ok(found
            .into_iter()
            .enumerate()
            .map(|(index, device)| {
                let path = Self::interface_path(&input, &device.instance).unwrap_or_else(|e| {
                    log::debug!("no interface path for {}: {e}", device.name);
                    String::new()
                });
                LegacyDeviceInfo {
                    index,
                    name: device.name,
                    instance_guid: guid_text(&device.instance),
                    product_guid: guid_text(&device.product),
                    path,
                }
            })
            .collect())
    }
}
