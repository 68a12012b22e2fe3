use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::PathBuf;

use libloading::{Library, Symbol};
use padlink_guid::{ControllerIdentity, SdlVersion};

use super::{ControllerDatabaseSource, LiveController, LiveSnapshot};
use crate::DatabaseError;

const SDL_INIT_JOYSTICK: u32 = 0x0000_0200;
const SDL_INIT_GAMECONTROLLER: u32 = 0x0000_2000;

#[repr(C)]
#[derive(Default)]
struct SdlVersionRaw {
    major: u8,
    minor: u8,
    patch: u8,
}

#[repr(C)]
struct SdlJoystickGuid {
    data: [u8; 16],
}

type SetHint = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
type Init = unsafe extern "C" fn(u32) -> c_int;
type Quit = unsafe extern "C" fn();
type NumJoysticks = unsafe extern "C" fn() -> c_int;
type DeviceGuid = unsafe extern "C" fn(c_int) -> SdlJoystickGuid;
type StringForIndex = unsafe extern "C" fn(c_int) -> *const c_char;
type MappingForIndex = unsafe extern "C" fn(c_int) -> *mut c_char;
type Free = unsafe extern "C" fn(*mut c_void);
type GetVersion = unsafe extern "C" fn(*mut SdlVersionRaw);

/// Splits `NAME=value;NAME2=value2` into hint pairs.
pub fn parse_hints(hints: &str) -> Vec<(String, String)> {
    hints
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn symbol<'lib, T>(library: &'lib Library, name: &'static str) -> Result<Symbol<'lib, T>, DatabaseError> {
    unsafe { library.get(name.as_bytes()) }.map_err(|e| DatabaseError::Symbol {
        name: name.trim_end_matches('\0'),
        reason: e.to_string(),
    })
}

unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Reads the controller list from an SDL2 dynamic library of the
/// process's own word size. The library is loaded for one call only.
#[derive(Debug, Clone)]
pub struct LibrarySource {
    library: PathBuf,
    hints: Option<String>,
}

impl LibrarySource {
    pub fn new(library: PathBuf, hints: Option<String>) -> Self {
        Self { library, hints }
    }

    fn read(&self, library: &Library) -> Result<LiveSnapshot, DatabaseError> {
        let set_hint: Symbol<SetHint> = symbol(library, "SDL_SetHint\0")?;
        let init: Symbol<Init> = symbol(library, "SDL_Init\0")?;
        let quit: Symbol<Quit> = symbol(library, "SDL_Quit\0")?;
        let num_joysticks: Symbol<NumJoysticks> = symbol(library, "SDL_NumJoysticks\0")?;
        let device_guid: Symbol<DeviceGuid> = symbol(library, "SDL_JoystickGetDeviceGUID\0")?;
        let name_for_index: Symbol<StringForIndex> = symbol(library, "SDL_JoystickNameForIndex\0")?;
        let mapping_for_index: Symbol<MappingForIndex> =
            symbol(library, "SDL_GameControllerMappingForDeviceIndex\0")?;
        let free: Symbol<Free> = symbol(library, "SDL_free\0")?;
        let get_version: Symbol<GetVersion> = symbol(library, "SDL_GetVersion\0")?;
        // Added in 2.24.
        let path_for_index: Option<Symbol<StringForIndex>> =
            symbol(library, "SDL_JoystickPathForIndex\0").ok();

        let mut raw_version = SdlVersionRaw::default();
        unsafe { get_version(&mut raw_version) };
        let version = SdlVersion::from_version(raw_version.major, raw_version.minor, raw_version.patch);

        for (name, value) in parse_hints(self.hints.as_deref().unwrap_or_default()) {
            let (Ok(name), Ok(value)) = (CString::new(name), CString::new(value)) else {
                continue;
            };
            unsafe { set_hint(name.as_ptr(), value.as_ptr()) };
        }

        if unsafe { init(SDL_INIT_JOYSTICK | SDL_INIT_GAMECONTROLLER) } != 0 {
            return Err(DatabaseError::Source("SDL_Init failed".into()));
        }

        let count = unsafe { num_joysticks() }.max(0);
        let mut controllers = Vec::with_capacity(count as usize);
        for index in 0..count {
            let guid = unsafe { device_guid(index) };
            let name = unsafe { owned_string(name_for_index(index)) };
            let path = path_for_index
                .as_ref()
                .map(|path_for_index| unsafe { owned_string(path_for_index(index)) })
                .unwrap_or_default();
            let mapping = unsafe {
                let raw = mapping_for_index(index);
                if raw.is_null() {
                    None
                } else {
                    let record = owned_string(raw);
                    free(raw.cast());
                    Some(record)
                }
            };
            controllers.push(LiveController {
                index: index as usize,
                name,
                path,
                identity: ControllerIdentity::from_bytes(guid.data),
                mapping,
            });
        }

        unsafe { quit() };
        Ok(LiveSnapshot { version, controllers })
    }
}

impl ControllerDatabaseSource for LibrarySource {
    fn name(&self) -> &'static str {
        "library"
    }

    fn load(&self) -> Result<LiveSnapshot, DatabaseError> {
        let library = unsafe { Library::new(&self.library) }.map_err(|e| DatabaseError::Library {
            path: self.library.clone(),
            reason: e.to_string(),
        })?;
        let snapshot = self.read(&library)?;
        log::debug!(
            "read {} controllers from {} (SDL {})",
            snapshot.controllers.len(),
            self.library.display(),
            snapshot.version
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hint_pairs() {
        assert_eq!(
            parse_hints("SDL_JOYSTICK_HIDAPI=0; SDL_JOYSTICK_RAWINPUT = 1;;bad"),
            vec![
                ("SDL_JOYSTICK_HIDAPI".to_owned(), "0".to_owned()),
                ("SDL_JOYSTICK_RAWINPUT".to_owned(), "1".to_owned()),
            ]
        );
        assert!(parse_hints("").is_empty());
    }

    #[test]
    fn missing_library_is_an_error() {
        let source = LibrarySource::new(PathBuf::from("/nonexistent/libSDL2.so"), None);
        assert!(matches!(source.load(), Err(DatabaseError::Library { .. })));
    }
}
