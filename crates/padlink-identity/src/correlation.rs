use ahash::AHashSet;
use padlink_devices::{normalize_instance_path, shorten_path, ConsoleSlot, HidDevice, LegacyDevice};

/// Ties records of different input APIs to one physical device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Parent node, normalized and collapsed to its port alias.
    pub parent: String,
}

impl CorrelationKey {
    pub fn new(vendor_id: u16, product_id: u16, parent_path: &str) -> Self {
        Self {
            vendor_id,
            product_id,
            parent: shorten_path(&normalize_instance_path(parent_path)),
        }
    }

    pub fn of_hid(device: &HidDevice) -> Self {
        Self::new(device.vendor_id, device.product_id, &device.parent_path)
    }

    pub fn of_legacy(device: &LegacyDevice) -> Self {
        Self::new(device.vendor_id, device.product_id, &device.parent_path)
    }

    fn same_ids(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// A console-style slot and the raw HID collection behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment<'a> {
    pub slot: ConsoleSlot,
    pub hid: Option<&'a HidDevice>,
}

/// Pairs each slot, in slot order, with the first console-style HID
/// collection carrying its vendor and product id that no earlier slot took.
pub fn assign_console_slots<'a>(slots: &[ConsoleSlot], hid: &'a [HidDevice]) -> Vec<SlotAssignment<'a>> {
    let mut taken = AHashSet::new();
    let mut ordered: Vec<&ConsoleSlot> = slots.iter().collect();
    ordered.sort_by_key(|slot| slot.slot);

    ordered
        .into_iter()
        .map(|slot| {
            let device = hid.iter().find(|device| {
                device.is_console_style()
                    && device.vendor_id == slot.vendor_id()
                    && device.product_id == slot.product_id()
                    && !taken.contains(&device.path.to_ascii_lowercase())
            });
            if let Some(device) = device {
                taken.insert(device.path.to_ascii_lowercase());
            }
            SlotAssignment { slot: *slot, hid: device }
        })
        .collect()
}

/// Finds the device whose key equals `key`, falling back to the first one
/// with the same ids. Devices rejected by `available` are skipped.
pub fn find_correlated<'a, T>(
    key: &CorrelationKey,
    devices: &'a [T],
    key_of: impl Fn(&T) -> CorrelationKey,
    available: impl Fn(&T) -> bool,
) -> Option<&'a T> {
    let mut fallback = None;
    for device in devices.iter().filter(|device| available(device)) {
        let other = key_of(device);
        if other == *key {
            return Some(device);
        }
        if fallback.is_none() && key.same_ids(other.vendor_id, other.product_id) {
            fallback = Some(device);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use padlink_devices::{subtype, CapabilityTier, SlotCapabilities};

    use super::*;

    fn slot(index: u32, product_id: u16) -> ConsoleSlot {
        ConsoleSlot {
            slot: index,
            capabilities: SlotCapabilities {
                subtype: subtype::GAMEPAD,
                vendor_id: 0x045e,
                product_id,
                revision: 0,
                tier: CapabilityTier::Extended,
            },
        }
    }

    fn hid(path: &str, product_id: u16, parent: &str) -> HidDevice {
        HidDevice {
            path: path.to_owned(),
            vendor_id: 0x045e,
            product_id,
            usage: 0x05,
            manufacturer: String::new(),
            product: String::new(),
            parent_path: parent.to_owned(),
        }
    }

    #[test]
    fn keys_collapse_port_aliases() {
        let long = CorrelationKey::new(0x054c, 0x09cc, "USB\\VID_054C&PID_09CC\\6&abc1234&0&1");
        let short = CorrelationKey::new(0x054c, 0x09cc, "usb\\vid_054c&pid_09cc\\1");
        assert_eq!(long, short);
        assert_eq!(long.parent, "USB\\VID_054C&PID_09CC\\1");
    }

    #[test]
    fn no_hid_path_is_assigned_twice() {
        let slots = [slot(2, 0x028e), slot(0, 0x028e), slot(1, 0x028e), slot(3, 0x0b12)];
        let devices = [
            hid("\\\\?\\hid#vid_045e&pid_028e&ig_00#a", 0x028e, "USB\\A"),
            hid("\\\\?\\hid#vid_045e&pid_028e#plain", 0x028e, "USB\\B"),
            hid("\\\\?\\HID#VID_045E&PID_028E&IG_00#A", 0x028e, "USB\\A"),
            hid("\\\\?\\hid#vid_045e&pid_028e&ig_00#c", 0x028e, "USB\\C"),
        ];
        let assigned = assign_console_slots(&slots, &devices);

        let order: Vec<u32> = assigned.iter().map(|a| a.slot.slot).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        let paths: Vec<Option<&str>> = assigned.iter().map(|a| a.hid.map(|d| d.path.as_str())).collect();
        assert_eq!(
            paths,
            vec![
                Some("\\\\?\\hid#vid_045e&pid_028e&ig_00#a"),
                Some("\\\\?\\hid#vid_045e&pid_028e&ig_00#c"),
                None,
                None,
            ]
        );
    }

    #[test]
    fn prefers_matching_parent_over_matching_ids() {
        let devices = [
            hid("\\\\?\\hid#vid_045e&pid_028e#1", 0x028e, "USB\\VID_045E&PID_028E\\6&1&0&1"),
            hid("\\\\?\\hid#vid_045e&pid_028e#2", 0x028e, "USB\\VID_045E&PID_028E\\6&1&0&2"),
        ];
        let key = CorrelationKey::new(0x045e, 0x028e, "USB\\VID_045E&PID_028E\\2");
        let found = find_correlated(&key, &devices, CorrelationKey::of_hid, |_| true).expect("device");
        assert!(found.path.ends_with("#2"));

        let unrelated = CorrelationKey::new(0x045e, 0x028e, "BTHENUM\\X");
        let found = find_correlated(&unrelated, &devices, CorrelationKey::of_hid, |d| !d.path.ends_with("#1"))
            .expect("device");
        assert!(found.path.ends_with("#2"));

        let other = CorrelationKey::new(0x054c, 0x05c4, "");
        assert!(find_correlated(&other, &devices, CorrelationKey::of_hid, |_| true).is_none());
    }
}
