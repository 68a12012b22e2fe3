use padlink_guid::{ControllerIdentity, SdlVersion};

use super::{ControllerDatabaseSource, LiveController, LiveSnapshot};
use crate::DatabaseError;

/// Reads the controller list from the SDL2 linked into this binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedSdlSource;

impl ControllerDatabaseSource for LinkedSdlSource {
    fn name(&self) -> &'static str {
        "linked"
    }

    fn load(&self) -> Result<LiveSnapshot, DatabaseError> {
        let sdl = sdl2::init().map_err(DatabaseError::Source)?;
        let joystick = sdl.joystick().map_err(DatabaseError::Source)?;
        let controller = sdl.game_controller().map_err(DatabaseError::Source)?;

        let linked = sdl2::version::version();
        let version = SdlVersion::from_version(linked.major, linked.minor, linked.patch);

        let count = joystick.num_joysticks().map_err(DatabaseError::Source)?;
        let mut controllers = Vec::with_capacity(count as usize);
        for index in 0..count {
            let guid = match joystick.device_guid(index) {
                Ok(guid) => guid,
                Err(e) => {
                    log::warn!("unable to read guid of joystick {index}: {e}");
                    continue;
                }
            };
            controllers.push(LiveController {
                index: index as usize,
                name: joystick.name_for_index(index).unwrap_or_default(),
                path: String::new(),
                identity: ControllerIdentity::parse(&guid.string()),
                mapping: controller.mapping_for_guid(guid).ok(),
            });
        }
        Ok(LiveSnapshot { version, controllers })
    }
}
