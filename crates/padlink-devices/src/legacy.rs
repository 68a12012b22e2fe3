use padlink_guid::{ControllerIdentity, WrappedDriver, BUS_USB};

use crate::path::{parse_vid_pid, PathResolver};
use crate::DeviceError;

/// Trailing bytes of a DirectInput product GUID whose first DWORD packs
/// the vendor and product ids (`"PIDVID"` in ASCII).
const PIDVID_SIGNATURE: &str = "504944564944";

/// A game controller as reported by the legacy polling API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDeviceInfo {
    /// Enumeration order, also the DirectInput device index.
    pub index: usize,
    pub name: String,
    pub instance_guid: String,
    /// Product GUID in Windows text form.
    pub product_guid: String,
    /// Device interface path (`DIPROP_GUIDANDPATH`).
    pub path: String,
}

/// Access to the legacy polling API.
pub trait LegacyBackend {
    fn devices(&self) -> Result<Vec<LegacyDeviceInfo>, DeviceError>;
}

/// A legacy device with its ids and topology parent resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDevice {
    pub index: usize,
    pub name: String,
    pub instance_guid: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub path: String,
    pub parent_path: String,
    pub identity: ControllerIdentity,
}

/// Reads vendor/product ids out of a `PIDVID` product GUID. The first
/// group holds the product id in its high word and the vendor id in its
/// low word.
pub fn vid_pid_from_product_guid(product_guid: &str) -> Option<(u16, u16)> {
    let compact: String = product_guid
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .chars()
        .filter(|c| *c != '-')
        .collect();
    if compact.len() != 32 || !compact.to_ascii_uppercase().ends_with(PIDVID_SIGNATURE) {
        return None;
    }
    let data1 = u32::from_str_radix(compact.get(..8)?, 16).ok()?;
    let vendor = u16::try_from(data1 & 0xFFFF).ok()?;
    let product = u16::try_from(data1 >> 16).ok()?;
    Some((vendor, product))
}

/// Lists legacy devices. Backend failures yield an empty list.
pub fn enumerate_legacy(backend: &dyn LegacyBackend, resolver: &PathResolver<'_>) -> Vec<LegacyDevice> {
    let infos = match backend.devices() {
        Ok(infos) => infos,
        Err(e) => {
            log::warn!("legacy device enumeration failed: {e}");
            return Vec::new();
        }
    };

    infos
        .into_iter()
        .map(|info| {
            let (vendor_id, product_id) = vid_pid_from_product_guid(&info.product_guid)
                .or_else(|| parse_vid_pid(&info.path))
                .unwrap_or_default();
            let parent_path = if info.path.is_empty() {
                String::new()
            } else {
                resolver.parent_of(&info.path)
            };
            let identity = ControllerIdentity::from_ids(
                BUS_USB,
                vendor_id,
                product_id,
                0,
                WrappedDriver::Legacy,
                0,
            );
            log::debug!(
                "legacy #{} {} {vendor_id:04x}:{product_id:04x} {}",
                info.index,
                info.name,
                info.path
            );
            LegacyDevice {
                index: info.index,
                name: info.name,
                instance_guid: info.instance_guid,
                vendor_id,
                product_id,
                path: info.path,
                parent_path,
                identity,
            }
        })
        .collect()
}
