use crate::class_query::{ClassDeviceInfo, ClassQueryBackend};
use crate::hid::{HidBackend, HidDeviceInfo};
use crate::legacy::{LegacyBackend, LegacyDeviceInfo};
use crate::topology::{DeviceTopology, NullTopology};
use crate::xinput::{BasicCapabilities, ExtendedCapabilities, XInputBackend};
use crate::DeviceError;

/// The set of OS services the enumerators run over.
pub struct Backends {
    pub topology: Box<dyn DeviceTopology>,
    pub legacy: Box<dyn LegacyBackend>,
    pub xinput: Box<dyn XInputBackend>,
    pub hid: Box<dyn HidBackend>,
    pub class_query: Box<dyn ClassQueryBackend>,
}

impl Backends {
    /// Backends of the running platform.
    #[cfg(windows)]
    pub fn system() -> Self {
        crate::win32::backends()
    }

    /// Backends of the running platform.
    #[cfg(not(windows))]
    pub fn system() -> Self {
        Self::unsupported()
    }

    /// Backends that find nothing.
    pub fn unsupported() -> Self {
        Self {
            topology: Box::new(NullTopology),
            legacy: Box::new(Unsupported),
            xinput: Box::new(Unsupported),
            hid: Box::new(Unsupported),
            class_query: Box::new(Unsupported),
        }
    }
}

/// Backend for platforms without the corresponding input API.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl LegacyBackend for Unsupported {
    fn devices(&self) -> Result<Vec<LegacyDeviceInfo>, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}

impl XInputBackend for Unsupported {
    fn is_connected(&self, _slot: u32) -> bool {
        false
    }

    fn capabilities_ex(&self, _slot: u32) -> Option<ExtendedCapabilities> {
        None
    }

    fn capabilities(&self, _slot: u32) -> Option<BasicCapabilities> {
        None
    }
}

impl HidBackend for Unsupported {
    fn devices(&self) -> Result<Vec<HidDeviceInfo>, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn open_strings(&self, _path: &str) -> Result<(String, String), DeviceError> {
        Err(DeviceError::Unsupported)
    }
}

impl ClassQueryBackend for Unsupported {
    fn hid_class_devices(&self) -> Result<Vec<ClassDeviceInfo>, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}
