use std::fmt;

use padlink_guid::{ControllerIdentity, WrappedDriver};

/// A controller as the registry presents it: one physical device with its
/// identity in the configured SDL layout and its place in the device tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerDescriptor {
    /// SDL device index when the controller came from a live database,
    /// enumeration order otherwise.
    pub index: usize,
    pub name: String,
    pub identity: ControllerIdentity,
    /// Device instance id of the best matching OS device.
    pub instance_id: String,
    pub path: String,
    pub parent_path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Live database entry the descriptor was built from.
    pub live: bool,
}

impl ControllerDescriptor {
    pub fn is_console_style(&self) -> bool {
        self.identity.driver() == WrappedDriver::ConsoleStyle
    }
}

impl fmt::Display for ControllerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{}] {:04x}:{:04x}",
            self.index, self.name, self.identity, self.vendor_id, self.product_id
        )?;
        if !self.path.is_empty() {
            write!(f, " {}", self.path)?;
        }
        Ok(())
    }
}
