use crate::DeviceError;

/// Handle of a node in the device tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevNode(pub u32);

/// Read access to the OS device tree.
pub trait DeviceTopology {
    /// Finds the node for a device instance id.
    fn locate(&self, instance_id: &str) -> Result<DevNode, DeviceError>;
    /// Returns the parent of `node`.
    fn parent(&self, node: DevNode) -> Result<DevNode, DeviceError>;
    /// Returns the instance id of `node`.
    fn device_id(&self, node: DevNode) -> Result<String, DeviceError>;
}

/// Topology for targets without a device tree service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTopology;

impl DeviceTopology for NullTopology {
    fn locate(&self, _instance_id: &str) -> Result<DevNode, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn parent(&self, _node: DevNode) -> Result<DevNode, DeviceError> {
        Err(DeviceError::Unsupported)
    }

    fn device_id(&self, _node: DevNode) -> Result<String, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory device tree built from `(child, parent)` instance ids.
    pub(crate) struct FakeTopology {
        ids: Vec<String>,
        parents: Vec<Option<usize>>,
    }

    impl FakeTopology {
        pub(crate) fn new(edges: &[(&str, &str)]) -> Self {
            let mut topology = Self {
                ids: Vec::new(),
                parents: Vec::new(),
            };
            for (child, parent) in edges {
                let child = topology.intern(child);
                let parent = topology.intern(parent);
                topology.parents[child] = Some(parent);
            }
            topology
        }

        fn intern(&mut self, id: &str) -> usize {
            if let Some(pos) = self.ids.iter().position(|known| known.eq_ignore_ascii_case(id)) {
                return pos;
            }
            self.ids.push(id.to_owned());
            self.parents.push(None);
            self.ids.len() - 1
        }
    }

    impl DeviceTopology for FakeTopology {
        fn locate(&self, instance_id: &str) -> Result<DevNode, DeviceError> {
            self.ids
                .iter()
                .position(|known| known.eq_ignore_ascii_case(instance_id))
                .map(|pos| DevNode(pos as u32))
                .ok_or(DeviceError::Os { call: "locate", code: 0x0d })
        }

        fn parent(&self, node: DevNode) -> Result<DevNode, DeviceError> {
            self.parents
                .get(node.0 as usize)
                .copied()
                .flatten()
                .map(|pos| DevNode(pos as u32))
                .ok_or(DeviceError::Os { call: "parent", code: 0x0d })
        }

        fn device_id(&self, node: DevNode) -> Result<String, DeviceError> {
            self.ids
                .get(node.0 as usize)
                .cloned()
                .ok_or(DeviceError::Os { call: "device_id", code: 0x05 })
        }
    }

    #[test]
    fn null_topology_always_fails() {
        assert!(matches!(NullTopology.locate("X"), Err(DeviceError::Unsupported)));
        assert!(matches!(NullTopology.parent(DevNode(1)), Err(DeviceError::Unsupported)));
        assert!(matches!(NullTopology.device_id(DevNode(1)), Err(DeviceError::Unsupported)));
    }
}
