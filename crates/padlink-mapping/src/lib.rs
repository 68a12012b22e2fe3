//! Controller mapping records, the live controller database and
//! translation of native input codes.

mod capture;
mod control;
mod controllers;
mod database;
mod record;
mod source;
mod translate;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use capture::{CapturedDevice, CapturedInput, InputCaptureSet};
pub use control::{Axis, AxisRange, Button, Control};
pub use controllers::{ControllerDatabase, DatabaseEntry};
pub use database::{current_platform, MappingDatabase, BUNDLED_DATABASE};
pub use record::{Binding, ControllerMapping, InputElement, InputKind};
#[cfg(feature = "sdl2-backend")]
pub use source::LinkedSdlSource;
pub use source::{
    library_word_size, parse_helper_output, parse_hints, select_source, write_helper_output,
    BundledSource, ControllerDatabaseSource, HelperSource, LibrarySource, LiveController,
    LiveSnapshot, SourceSettings, WordSize, DEFAULT_HELPER_TIMEOUT,
};
pub use translate::HidToLegacyTranslator;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping record has no identity")]
    MissingIdentity,
    #[error("mapping record for {0} has no name")]
    MissingName(String),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a PE, ELF or Mach-O binary")]
    UnknownBinary(PathBuf),
    #[error("unable to load {path}: {reason}")]
    Library { path: PathBuf, reason: String },
    #[error("missing symbol {name}: {reason}")]
    Symbol { name: &'static str, reason: String },
    #[error("helper {path} failed: {reason}")]
    Helper { path: PathBuf, reason: String },
    #[error("helper did not finish within {0:?}")]
    HelperTimeout(Duration),
    #[error("helper produced no output")]
    EmptyHelperOutput,
    #[error("xml: {0}")]
    Xml(String),
    #[error("sdl: {0}")]
    Source(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("xml: {0}")]
    Xml(String),
}
