use crate::path::{parse_vid_pid, PathResolver};
use crate::DeviceError;

/// Compatible id the HID class driver assigns to game controllers.
const GAME_COMPATIBLE_ID: &str = "HID_DEVICE_SYSTEM_GAME";
const GAME_DESCRIPTION: &str = "game controller";

/// An entry of the HID device class listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassDeviceInfo {
    pub instance_id: String,
    pub description: String,
    pub compatible_ids: Vec<String>,
}

impl ClassDeviceInfo {
    fn is_game_controller(&self) -> bool {
        self.compatible_ids
            .iter()
            .any(|id| id.eq_ignore_ascii_case(GAME_COMPATIBLE_ID))
            || self.description.to_ascii_lowercase().contains(GAME_DESCRIPTION)
    }
}

/// Access to the OS device class listing.
pub trait ClassQueryBackend {
    fn hid_class_devices(&self) -> Result<Vec<ClassDeviceInfo>, DeviceError>;
}

/// A game controller from the class listing, tied to its USB device node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDevice {
    pub instance_id: String,
    pub description: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Closest USB ancestor, `None` for Bluetooth or virtual devices.
    pub usb_parent: Option<String>,
}

pub fn enumerate_class_devices(
    backend: &dyn ClassQueryBackend,
    resolver: &PathResolver<'_>,
) -> Vec<ClassDevice> {
    let infos = match backend.hid_class_devices() {
        Ok(infos) => infos,
        Err(e) => {
            log::warn!("device class query failed: {e}");
            return Vec::new();
        }
    };

    infos
        .into_iter()
        .filter(ClassDeviceInfo::is_game_controller)
        .map(|info| {
            let (vendor_id, product_id) = parse_vid_pid(&info.instance_id).unwrap_or_default();
            let usb_parent = resolver.usb_ancestor_of(&info.instance_id);
            ClassDevice {
                instance_id: info.instance_id,
                description: info.description,
                vendor_id,
                product_id,
                usb_parent,
            }
        })
        .collect()
}
