use std::ffi::CString;

use hidapi::HidApi;

use crate::hid::{HidBackend, HidDeviceInfo};
use crate::DeviceError;

impl From<hidapi::HidError> for DeviceError {
    fn from(e: hidapi::HidError) -> Self {
        DeviceError::Backend(e.to_string())
    }
}

/// Raw HID access through hidapi.
pub(crate) struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub(crate) fn new() -> Result<Self, DeviceError> {
        Ok(Self { api: HidApi::new()? })
    }
}

impl HidBackend for HidApiBackend {
    fn devices(&self) -> Result<Vec<HidDeviceInfo>, DeviceError> {
        Ok(self
            .api
            .device_list()
            .map(|info| HidDeviceInfo {
                path: info.path().to_string_lossy().into_owned(),
                usage_page: info.usage_page(),
                usage: info.usage(),
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                manufacturer: info.manufacturer_string().unwrap_or_default().to_owned(),
                product: info.product_string().unwrap_or_default().to_owned(),
            })
            .collect())
    }

    fn open_strings(&self, path: &str) -> Result<(String, String), DeviceError> {
        let path = CString::new(path).map_err(|e| DeviceError::Backend(e.to_string()))?;
        let device = self.api.open_path(&path)?;
        let manufacturer = device.get_manufacturer_string()?.unwrap_or_default();
        let product = device.get_product_string()?.unwrap_or_default();
        Ok((manufacturer, product))
    }
}
