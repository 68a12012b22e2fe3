use super::{ControllerDatabaseSource, LiveSnapshot};
use crate::DatabaseError;

/// No live devices; lookups go to the embedded dataset.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledSource;

impl ControllerDatabaseSource for BundledSource {
    fn name(&self) -> &'static str {
        "bundled"
    }

    fn load(&self) -> Result<LiveSnapshot, DatabaseError> {
        Ok(LiveSnapshot::default())
    }
}
