use ahash::AHashSet;

use crate::path::{is_console_interface, parse_vid_pid, PathResolver};
use crate::DeviceError;

pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
pub const USAGE_JOYSTICK: u16 = 0x04;
pub const USAGE_GAMEPAD: u16 = 0x05;
pub const USAGE_MULTI_AXIS: u16 = 0x08;

/// A raw HID top-level collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HidDeviceInfo {
    pub path: String,
    pub usage_page: u16,
    pub usage: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
}

/// Access to raw HID devices.
pub trait HidBackend {
    fn devices(&self) -> Result<Vec<HidDeviceInfo>, DeviceError>;

    /// Opens `path` and reads its manufacturer and product strings. Used when
    /// enumeration did not report them.
    fn open_strings(&self, path: &str) -> Result<(String, String), DeviceError>;
}

/// A game controller collection with ids and parent resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidDevice {
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage: u16,
    pub manufacturer: String,
    pub product: String,
    pub parent_path: String,
}

impl HidDevice {
    /// Whether the collection belongs to a console-style controller.
    pub fn is_console_style(&self) -> bool {
        is_console_interface(&self.path)
    }
}

fn is_game_controller(info: &HidDeviceInfo) -> bool {
    info.usage_page == USAGE_PAGE_GENERIC_DESKTOP
        && matches!(info.usage, USAGE_JOYSTICK | USAGE_GAMEPAD | USAGE_MULTI_AXIS)
}

/// Lists joystick, gamepad and multi-axis collections. Backend failures
/// yield an empty list.
pub fn enumerate_hid(backend: &dyn HidBackend, resolver: &PathResolver<'_>) -> Vec<HidDevice> {
    let infos = match backend.devices() {
        Ok(infos) => infos,
        Err(e) => {
            log::warn!("hid enumeration failed: {e}");
            return Vec::new();
        }
    };

    let mut seen = AHashSet::new();
    let mut devices = Vec::new();
    for info in infos.into_iter().filter(is_game_controller) {
        if !seen.insert(info.path.to_ascii_lowercase()) {
            continue;
        }

        let (vendor_id, product_id) =
            parse_vid_pid(&info.path).unwrap_or((info.vendor_id, info.product_id));

        let (manufacturer, product) = if info.manufacturer.is_empty() && info.product.is_empty() {
            backend.open_strings(&info.path).unwrap_or_else(|e| {
                log::debug!("unable to read strings of {}: {e}", info.path);
                (String::new(), String::new())
            })
        } else {
            (info.manufacturer, info.product)
        };

        let parent_path = resolver.parent_of(&info.path);
        log::debug!("hid {vendor_id:04x}:{product_id:04x} {manufacturer} {product} {}", info.path);
        devices.push(HidDevice {
            path: info.path,
            vendor_id,
            product_id,
            usage: info.usage,
            manufacturer,
            product,
            parent_path,
        });
    }
    devices
}
