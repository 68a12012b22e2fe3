use windows::core::PCWSTR;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    CM_Get_Device_IDW, CM_Get_Parent, CM_Locate_DevNodeW, CM_LOCATE_DEVNODE_NORMAL, CONFIGRET,
    CR_SUCCESS, MAX_DEVICE_ID_LEN,
};

use super::{from_wide, wide};
use crate::topology::{DevNode, DeviceTopology};
use crate::DeviceError;

/// Device tree access through the configuration manager.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConfigManager;

fn check(call: &'static str, ret: CONFIGRET) -> Result<(), DeviceError> {
    if ret == CR_SUCCESS {
        Ok(())
    } else {
        Err(DeviceError::Os { call, code: ret.0 })
    }
}

impl DeviceTopology for ConfigManager {
    fn locate(&self, instance_id: &str) -> Result<DevNode, DeviceError> {
        let id = wide(instance_id);
        let mut node = 0u32;
        let ret = unsafe { CM_Locate_DevNodeW(&mut node, PCWSTR(id.as_ptr()), CM_LOCATE_DEVNODE_NORMAL) };
        check("CM_Locate_DevNodeW", ret)?;
        Ok(DevNode(node))
    }

    fn parent(&self, node: DevNode) -> Result<DevNode, DeviceError> {
        let mut parent = 0u32;
        let ret = unsafe { CM_Get_Parent(&mut parent, node.0, 0) };
        check("CM_Get_Parent", ret)?;
        Ok(DevNode(parent))
    }

    fn device_id(&self, node: DevNode) -> Result<String, DeviceError> {
        let mut buffer = vec![0u16; MAX_DEVICE_ID_LEN as usize + 1];
        let ret = unsafe { CM_Get_Device_IDW(node.0, &mut buffer, 0) };
        check("CM_Get_Device_IDW", ret)?;
        Ok(from_wide(&buffer))
    }
}
