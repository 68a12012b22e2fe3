use windows::core::PCWSTR;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo, SetupDiGetClassDevsW,
    SetupDiGetDeviceInstanceIdW, SetupDiGetDeviceRegistryPropertyW, DIGCF_PRESENT,
    GUID_DEVCLASS_HIDCLASS, HDEVINFO, SETUP_DI_REGISTRY_PROPERTY, SPDRP_COMPATIBLEIDS,
    SPDRP_DEVICEDESC, SP_DEVINFO_DATA,
};
use windows::Win32::Foundation::HWND;

use super::from_wide;
use crate::class_query::{ClassDeviceInfo, ClassQueryBackend};
use crate::DeviceError;

const PROPERTY_BUFFER_LEN: usize = 1024;

/// HID class listing through SetupAPI.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SetupApi;

/// Destroys the device information set on drop.
struct DeviceInfoSet(HDEVINFO);

impl Drop for DeviceInfoSet {
    fn drop(&mut self) {
        let _ = unsafe { SetupDiDestroyDeviceInfoList(self.0) };
    }
}

fn registry_property(
    set: &DeviceInfoSet,
    data: &SP_DEVINFO_DATA,
    property: SETUP_DI_REGISTRY_PROPERTY,
) -> Vec<u16> {
    let mut bytes = vec![0u8; PROPERTY_BUFFER_LEN * 2];
    let ok = unsafe {
        SetupDiGetDeviceRegistryPropertyW(set.0, data, property, None, Some(&mut bytes), None)
    };
    if ok.is_err() {
        return Vec::new();
    }
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Splits a `REG_MULTI_SZ` value.
fn multi_string(buffer: &[u16]) -> Vec<String> {
    buffer
        .split(|c| *c == 0)
        .take_while(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

impl ClassQueryBackend for SetupApi {
    fn hid_class_devices(&self) -> Result<Vec<ClassDeviceInfo>, DeviceError> {
        let set = unsafe {
            SetupDiGetClassDevsW(Some(&GUID_DEVCLASS_HIDCLASS), PCWSTR::null(), HWND::default(), DIGCF_PRESENT)?
        };
        let set = DeviceInfoSet(set);

        let mut devices = Vec::new();
        for index in 0.. {
            let mut data = SP_DEVINFO_DATA {
                cbSize: std::mem::size_of::<SP_DEVINFO_DATA>() as u32,
                ..Default::default()
            };
            if unsafe { SetupDiEnumDeviceInfo(set.0, index, &mut data) }.is_err() {
                break;
            }

            let mut id = vec![0u16; PROPERTY_BUFFER_LEN];
            if unsafe { SetupDiGetDeviceInstanceIdW(set.0, &data, Some(&mut id), None) }.is_err() {
                continue;
            }

            devices.push(ClassDeviceInfo {
                instance_id: from_wide(&id),
                description: from_wide(&registry_property(&set, &data, SPDRP_DEVICEDESC)),
                compatible_ids: multi_string(&registry_property(&set, &data, SPDRP_COMPATIBLEIDS)),
            });
        }
        Ok(devices)
    }
}
