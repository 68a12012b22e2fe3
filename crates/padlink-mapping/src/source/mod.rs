//! Strategies for reading the controller list and mappings of an SDL
//! library.

mod bundled;
mod helper;
mod library;
#[cfg(feature = "sdl2-backend")]
mod linked;
mod word_size;

use std::path::PathBuf;
use std::time::Duration;

use padlink_guid::{ControllerIdentity, SdlVersion};

use crate::DatabaseError;

pub use bundled::BundledSource;
pub use helper::{parse_helper_output, write_helper_output, HelperSource, DEFAULT_HELPER_TIMEOUT};
pub use library::{parse_hints, LibrarySource};
#[cfg(feature = "sdl2-backend")]
pub use linked::LinkedSdlSource;
pub use word_size::{library_word_size, WordSize};

/// A joystick as the SDL library reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveController {
    /// SDL device index.
    pub index: usize,
    pub name: String,
    /// Device path, empty when the library does not report one.
    pub path: String,
    pub identity: ControllerIdentity,
    /// The library's mapping record for the device, if it has one.
    pub mapping: Option<String>,
}

/// What a source read from the library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSnapshot {
    /// Layout of the identities in `controllers`.
    pub version: SdlVersion,
    pub controllers: Vec<LiveController>,
}

/// A way to obtain the live controller list.
pub trait ControllerDatabaseSource {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;
    fn load(&self) -> Result<LiveSnapshot, DatabaseError>;
}

/// Where and how to read the SDL library.
#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    pub library: Option<PathBuf>,
    pub hints: Option<String>,
    pub helper: Option<PathBuf>,
    pub helper_timeout: Option<Duration>,
}

/// Picks the loading strategy for `settings`.
///
/// A library of the process's own word size is loaded in-process; one of
/// the other word size goes through the helper. Without a library the
/// linked SDL is used when compiled in, and the bundled dataset otherwise.
pub fn select_source(settings: &SourceSettings) -> Box<dyn ControllerDatabaseSource> {
    let Some(library) = settings.library.clone() else {
        return default_source();
    };

    let library_size = match library_word_size(&library) {
        Ok(size) => size,
        Err(e) => {
            log::warn!("unable to inspect {}: {e}", library.display());
            return Box::new(BundledSource);
        }
    };

    if library_size == WordSize::current() {
        return Box::new(LibrarySource::new(library, settings.hints.clone()));
    }

    match settings.helper.clone() {
        Some(helper) => Box::new(HelperSource::new(
            helper,
            library,
            settings.hints.clone(),
            settings.helper_timeout.unwrap_or(DEFAULT_HELPER_TIMEOUT),
        )),
        None => {
            log::warn!(
                "{} is a {library_size} library and no helper is configured",
                library.display()
            );
            Box::new(BundledSource)
        }
    }
}

#[cfg(feature = "sdl2-backend")]
fn default_source() -> Box<dyn ControllerDatabaseSource> {
    Box::new(LinkedSdlSource)
}

#[cfg(not(feature = "sdl2-backend"))]
fn default_source() -> Box<dyn ControllerDatabaseSource> {
    Box::new(BundledSource)
}
