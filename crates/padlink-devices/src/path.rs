use crate::topology::DeviceTopology;
use crate::DeviceError;

const USB_PREFIX: &str = "USB\\";
/// Interface token the OS appends after the PID of console-style controllers.
const CONSOLE_INTERFACE_TOKEN: &str = "IG_";
const CLASS_GUID_MARKER: &str = "#{";
const MAX_ANCESTRY: usize = 6;

/// Collapses a USB instance path to its port alias.
///
/// The same physical port shows up both as `USB\VID_1234&PID_5678\6&abc1234&0&1`
/// and with only the trailing instance number, so the last segment is
/// replaced by whatever follows its final `&`. Non-USB paths are returned
/// unchanged.
pub fn shorten_path(path: &str) -> String {
    let is_usb = path
        .get(..USB_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(USB_PREFIX));
    if !is_usb {
        return path.to_owned();
    }
    let Some(separator) = path.rfind('\\') else {
        return path.to_owned();
    };
    let last = &path[separator + 1..];
    let Some(amp) = last.rfind('&') else {
        return path.to_owned();
    };
    format!("{}{}", &path[..=separator], &last[amp + 1..])
}

/// Turns a device interface path (`\\?\hid#vid_045e&pid_028e&ig_00#3&2a4f&0&0000#{guid}`)
/// into the device instance id the configuration manager understands
/// (`HID\VID_045E&PID_028E&IG_00\3&2A4F&0&0000`).
pub fn normalize_instance_path(path: &str) -> String {
    let mut s = path.trim();
    for prefix in ["\\\\?\\", "\\\\.\\", "\\??\\"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest;
            break;
        }
    }
    if let Some(pos) = s.find(CLASS_GUID_MARKER) {
        s = &s[..pos];
    }
    let s = s.replace('#', "\\");

    let segments: Vec<String> = s
        .split('\\')
        .enumerate()
        .map(|(i, segment)| {
            if i == 1 {
                strip_qualifiers(segment)
            } else {
                segment.to_owned()
            }
        })
        .collect();
    segments.join("\\").to_uppercase()
}

/// Drops revision qualifiers that follow the vendor/product token of a
/// hardware id segment (`VID_045E&PID_028E&REV_0114`). `MI_`, `COL` and
/// `IG_` tokens are part of the instance id and are kept.
fn strip_qualifiers(segment: &str) -> String {
    segment
        .split('&')
        .filter(|token| !token.to_ascii_uppercase().starts_with("REV_"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Extracts vendor and product ids from a device path.
///
/// Understands the USB form (`VID_045E&PID_028E`) and the Bluetooth form
/// (`VID&0002054c_PID&05c4`, where the vendor carries a source prefix).
pub fn parse_vid_pid(path: &str) -> Option<(u16, u16)> {
    let upper = path.to_ascii_uppercase();
    let vendor = hex_after(&upper, "VID_", 4)
        .or_else(|| hex_after(&upper, "VID&", 8).map(|v| v & 0xFFFF))?;
    let product =
        hex_after(&upper, "PID_", 4).or_else(|| hex_after(&upper, "PID&", 4))?;
    Some((u16::try_from(vendor).ok()?, u16::try_from(product).ok()?))
}

/// Whether `path` is the interface of a console-style controller, i.e. its
/// PID is followed by an `&IG_` token.
pub fn is_console_interface(path: &str) -> bool {
    let upper = path.to_ascii_uppercase();
    let Some(start) = upper.find("PID_") else {
        return false;
    };
    upper[start..]
        .split(['#', '\\'])
        .next()
        .is_some_and(|hardware_id| {
            hardware_id.split('&').skip(1).any(|token| token.starts_with(CONSOLE_INTERFACE_TOKEN))
        })
}

fn hex_after(haystack: &str, token: &str, digits: usize) -> Option<u32> {
    let start = haystack.find(token)? + token.len();
    let value = haystack.get(start..start + digits)?;
    if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(value, 16).ok()
}

/// Resolves device paths to their parent node in the device tree.
pub struct PathResolver<'a> {
    topology: &'a dyn DeviceTopology,
}

impl<'a> PathResolver<'a> {
    pub fn new(topology: &'a dyn DeviceTopology) -> Self {
        Self { topology }
    }

    /// Returns the device id of the parent node of `path`, or `path` itself
    /// when any step of the lookup fails.
    pub fn parent_of(&self, path: &str) -> String {
        let instance_id = normalize_instance_path(path);
        let parent = self
            .topology
            .locate(&instance_id)
            .and_then(|node| self.topology.parent(node))
            .and_then(|node| self.topology.device_id(node));
        match parent {
            Ok(id) => id,
            Err(DeviceError::Unsupported) => path.to_owned(),
            Err(e) => {
                log::debug!("unable to resolve parent of {path}: {e}");
                path.to_owned()
            }
        }
    }

    /// Walks up from `instance_id` to the closest USB device node.
    pub fn usb_ancestor_of(&self, instance_id: &str) -> Option<String> {
        let mut node = self.topology.locate(&normalize_instance_path(instance_id)).ok()?;
        for _ in 0..MAX_ANCESTRY {
            node = self.topology.parent(node).ok()?;
            let id = self.topology.device_id(node).ok()?;
            if id.to_ascii_uppercase().starts_with(USB_PREFIX) {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::tests::FakeTopology;

    #[test]
    fn shortens_usb_instance_path_to_port_alias() {
        assert_eq!(
            shorten_path("USB\\VID_1234&PID_5678\\6&abc1234&0&1"),
            "USB\\VID_1234&PID_5678\\1"
        );
        assert_eq!(
            shorten_path("usb\\VID_1234&PID_5678\\6&abc1234&0&1"),
            "usb\\VID_1234&PID_5678\\1"
        );
    }

    #[test]
    fn leaves_other_paths_untouched() {
        assert_eq!(shorten_path("HID\\VID_1234&PID_5678\\6&abc&0&1"), "HID\\VID_1234&PID_5678\\6&abc&0&1");
        assert_eq!(shorten_path("USB\\VID_1234&PID_5678\\ABCDEF"), "USB\\VID_1234&PID_5678\\ABCDEF");
        assert_eq!(shorten_path("US"), "US");
    }

    #[test]
    fn normalizes_interface_paths() {
        assert_eq!(
            normalize_instance_path(
                "\\\\?\\hid#vid_045e&pid_028e&ig_00#3&2a4f7c8&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}"
            ),
            "HID\\VID_045E&PID_028E&IG_00\\3&2A4F7C8&0&0000"
        );
        assert_eq!(
            normalize_instance_path("USB\\VID_054C&PID_05C4&REV_0100\\5&1F2&0&2"),
            "USB\\VID_054C&PID_05C4\\5&1F2&0&2"
        );
    }

    #[test]
    fn keeps_interface_and_collection_qualifiers() {
        assert_eq!(
            normalize_instance_path("\\\\?\\hid#vid_046d&pid_c52b&mi_02&col01#8&2d7e&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}"),
            "HID\\VID_046D&PID_C52B&MI_02&COL01\\8&2D7E&0&0000"
        );
    }

    #[test]
    fn console_interface_needs_ig_token_after_pid() {
        assert!(is_console_interface("\\\\?\\hid#vid_045e&pid_028e&ig_00#3&2a4f7c8&0&0000"));
        assert!(is_console_interface("HID\\VID_045E&PID_02FF&IG_01\\3&1"));
        assert!(!is_console_interface("\\\\?\\hid#vid_0079&pid_0006#7&big_0&0000"));
        assert!(!is_console_interface("\\\\?\\hid#vid_0079&pid_0006#7&1&0&0000#{ig_guid}"));
        assert!(!is_console_interface("\\\\?\\hid#vid_0079&pid_0006#7&ig_0&0000"));
        assert!(!is_console_interface("ROOT\\IG_00\\0000"));
    }

    #[test]
    fn parses_usb_and_bluetooth_ids() {
        assert_eq!(
            parse_vid_pid("\\\\?\\hid#vid_045e&pid_028e&ig_00#3&2a4f7c8&0&0000"),
            Some((0x045e, 0x028e))
        );
        assert_eq!(
            parse_vid_pid("\\\\?\\hid#{00001124-0000-1000-8000-00805f9b34fb}_vid&0002054c_pid&05c4#9&1"),
            Some((0x054c, 0x05c4))
        );
        assert_eq!(parse_vid_pid("ROOT\\SYSTEM\\0001"), None);
        assert_eq!(parse_vid_pid("VID_04zz&PID_0001"), None);
    }

    #[test]
    fn parent_lookup_uses_topology() {
        let topology = FakeTopology::new(&[
            ("HID\\VID_045E&PID_028E&IG_00\\3&2A4F7C8&0&0000", "USB\\VID_045E&PID_028E\\6&1234&0&1"),
            ("USB\\VID_045E&PID_028E\\6&1234&0&1", "USB\\ROOT_HUB30\\4&1&0&0"),
        ]);
        let resolver = PathResolver::new(&topology);
        assert_eq!(
            resolver.parent_of("\\\\?\\hid#vid_045e&pid_028e&ig_00#3&2a4f7c8&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}"),
            "USB\\VID_045E&PID_028E\\6&1234&0&1"
        );
    }

    #[test]
    fn parent_lookup_failure_returns_input() {
        let topology = FakeTopology::new(&[]);
        let resolver = PathResolver::new(&topology);
        assert_eq!(resolver.parent_of("\\\\?\\hid#unknown"), "\\\\?\\hid#unknown");
    }

    #[test]
    fn parent_lookup_without_topology_returns_input() {
        let resolver = PathResolver::new(&crate::NullTopology);
        assert_eq!(resolver.parent_of("\\\\?\\hid#vid_045e&pid_028e#1"), "\\\\?\\hid#vid_045e&pid_028e#1");
    }

    #[test]
    fn finds_usb_ancestor() {
        let topology = FakeTopology::new(&[
            ("HID\\VID_0079&PID_0006\\7&1&0&0000", "HID\\VID_0079&PID_0006\\6&9&0"),
            ("HID\\VID_0079&PID_0006\\6&9&0", "USB\\VID_0079&PID_0006\\5&2&0&3"),
        ]);
        let resolver = PathResolver::new(&topology);
        assert_eq!(
            resolver.usb_ancestor_of("HID\\VID_0079&PID_0006\\7&1&0&0000"),
            Some("USB\\VID_0079&PID_0006\\5&2&0&3".to_owned())
        );
        assert_eq!(resolver.usb_ancestor_of("HID\\NOPE\\1"), None);
    }
}
