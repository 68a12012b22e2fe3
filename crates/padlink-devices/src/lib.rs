//! Enumeration of game controllers through the OS input APIs and
//! resolution of their device tree relationships.
//!
//! Every enumerator runs over a narrow backend trait. On Windows the
//! backends talk to the configuration manager, DirectInput, XInput, hidapi
//! and SetupAPI; elsewhere they report [`DeviceError::Unsupported`] and the
//! enumerators return empty lists.

mod backend;
mod class_query;
mod hid;
mod legacy;
mod path;
mod topology;
mod xinput;

#[cfg(windows)]
mod win32;

use thiserror::Error;

pub use backend::{Backends, Unsupported};
pub use class_query::{enumerate_class_devices, ClassDevice, ClassDeviceInfo, ClassQueryBackend};
pub use hid::{
    enumerate_hid, HidBackend, HidDevice, HidDeviceInfo, USAGE_GAMEPAD, USAGE_JOYSTICK,
    USAGE_MULTI_AXIS, USAGE_PAGE_GENERIC_DESKTOP,
};
pub use legacy::{enumerate_legacy, vid_pid_from_product_guid, LegacyBackend, LegacyDevice, LegacyDeviceInfo};
pub use path::{is_console_interface, normalize_instance_path, parse_vid_pid, shorten_path, PathResolver};
pub use topology::{DevNode, DeviceTopology, NullTopology};
pub use xinput::{
    enumerate_console_slots, negotiate_capabilities, subtype, BasicCapabilities, CapabilityTier,
    ConsoleSlot, ExtendedCapabilities, SlotCapabilities, XInputBackend, DEFAULT_PRODUCT_ID,
    DEFAULT_VENDOR_ID, SLOT_COUNT,
};

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device enumeration is not supported on this platform")]
    Unsupported,
    #[error("{call} failed with code {code:#x}")]
    Os { call: &'static str, code: u32 },
    #[error("{0}")]
    Backend(String),
}
