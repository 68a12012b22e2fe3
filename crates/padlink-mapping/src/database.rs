use std::path::Path;

use ahash::AHashMap;
use padlink_guid::{variants, ControllerIdentity};

use crate::record::ControllerMapping;
use crate::DatabaseError;

/// Mapping records compiled into the binary.
pub const BUNDLED_DATABASE: &str = include_str!("../data/gamecontrollerdb.txt");

/// Value of the `platform:` field for records that apply to this build.
pub const fn current_platform() -> &'static str {
    if cfg!(windows) {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "Mac OS X"
    } else {
        "Linux"
    }
}

/// Controller mappings in the reference text format, keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct MappingDatabase {
    mappings: Vec<ControllerMapping>,
    by_identity: AHashMap<ControllerIdentity, usize>,
    by_crcless: AHashMap<ControllerIdentity, usize>,
}

impl MappingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a database file body. Blank lines and `#` comments are
    /// ignored; records for other platforms are dropped when `platform` is
    /// set. A later record replaces an earlier one with the same identity.
    pub fn parse(text: &str, platform: Option<&str>) -> Self {
        let mut db = Self::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match ControllerMapping::parse(line) {
                Ok(mapping) => {
                    let wanted = match (platform, mapping.platform()) {
                        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
                        _ => true,
                    };
                    if wanted {
                        db.insert(mapping);
                    }
                }
                Err(e) => log::debug!("skipping mapping line {}: {e}", number + 1),
            }
        }
        db
    }

    /// The embedded dataset, filtered to this platform.
    pub fn bundled() -> Self {
        Self::parse(BUNDLED_DATABASE, Some(current_platform()))
    }

    /// Reads a database file.
    pub fn load(path: &Path, platform: Option<&str>) -> Result<Self, DatabaseError> {
        let text = std::fs::read_to_string(path).map_err(|source| DatabaseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text, platform))
    }

    pub fn insert(&mut self, mapping: ControllerMapping) {
        let identity = mapping.identity.clone();
        if let Some(&index) = self.by_identity.get(&identity) {
            self.mappings[index] = mapping;
            return;
        }
        let index = self.mappings.len();
        self.mappings.push(mapping);
        if identity.is_valid() {
            self.by_crcless.entry(identity.without_crc()).or_insert(index);
        }
        self.by_identity.insert(identity, index);
    }

    /// Exact identity match.
    pub fn get(&self, identity: &ControllerIdentity) -> Option<&ControllerMapping> {
        self.by_identity.get(identity).map(|&index| &self.mappings[index])
    }

    /// Finds the mapping for a device: the identity itself, then the
    /// identity as each SDL version would write it, then any record that
    /// differs only in the name checksum.
    pub fn lookup(&self, identity: &ControllerIdentity, name: &str) -> Option<&ControllerMapping> {
        if let Some(mapping) = self.get(identity) {
            return Some(mapping);
        }
        if !identity.is_valid() {
            return None;
        }
        variants(identity, name, None)
            .iter()
            .find_map(|variant| self.get(variant))
            .or_else(|| {
                self.by_crcless
                    .get(&identity.without_crc())
                    .map(|&index| &self.mappings[index])
            })
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerMapping> {
        self.mappings.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::control::{Axis, Button, Control};
    use crate::record::InputElement;

    fn id(text: &str) -> ControllerIdentity {
        ControllerIdentity::parse(text)
    }

    #[test]
    fn bundled_database_parses() {
        let db = MappingDatabase::parse(BUNDLED_DATABASE, None);
        assert!(db.len() > 10);
        assert!(db.get(&id("xinput")).is_some());
    }

    #[test]
    fn filters_by_platform() {
        let windows = MappingDatabase::parse(BUNDLED_DATABASE, Some("Windows"));
        let linux = MappingDatabase::parse(BUNDLED_DATABASE, Some("Linux"));
        assert!(windows.iter().all(|m| m.platform() == Some("Windows")));
        assert!(linux.iter().all(|m| m.platform() == Some("Linux")));
        assert!(windows.get(&id("030000005e0400008e02000000000000")).is_some());
        assert!(linux.get(&id("030000005e0400008e02000000000000")).is_none());
    }

    #[test]
    fn xbox_360_triggers_split_the_shared_axis() {
        let db = MappingDatabase::parse(BUNDLED_DATABASE, Some("Windows"));
        let mapping = db.get(&id("030000005e0400008e02000000000000")).expect("mapping");
        let trigger = |wanted: Axis| {
            mapping
                .bindings
                .iter()
                .find(|b| matches!(b.control, Control::Axis { axis, .. } if axis == wanted))
                .map(|b| (b.input, b.signed_input))
        };
        assert_eq!(trigger(Axis::LeftTrigger), Some((InputElement::axis(2, 1), true)));
        assert_eq!(trigger(Axis::RightTrigger), Some((InputElement::axis(2, -1), true)));
    }

    #[test]
    fn ignores_comments_and_broken_lines() {
        let db = MappingDatabase::parse(
            "# comment\n\n,\n03000000790000000600000000000000,Pad,a:b2,\n",
            None,
        );
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn later_records_replace_earlier_ones() {
        let db = MappingDatabase::parse(
            "03000000790000000600000000000000,Old,a:b0,\n03000000790000000600000000000000,New,a:b2,\n",
            None,
        );
        assert_eq!(db.len(), 1);
        let mapping = db.get(&id("03000000790000000600000000000000")).expect("mapping");
        assert_eq!(mapping.name, "New");
    }

    #[test]
    fn lookup_finds_other_version_layouts() {
        let db = MappingDatabase::parse(BUNDLED_DATABASE, Some("Windows"));
        // XInput identity as SDL 2.0 reports it, stored with the 2.26 checksum.
        let legacy_layout = id("030000005e0400008e02000000007801");
        let mapping = db.lookup(&legacy_layout, "Xbox 360 Controller").expect("mapping");
        assert_eq!(mapping.name, "XInput Controller");
        assert_eq!(
            mapping.binding_for(Control::Button(Button::A)).map(|b| b.input),
            Some(InputElement::button(0))
        );
    }

    #[test]
    fn lookup_ignores_checksum_when_name_is_unknown() {
        let db = MappingDatabase::parse(BUNDLED_DATABASE, Some("Windows"));
        let mapping = db
            .lookup(&id("030000005e0400008e02000000007801"), "")
            .expect("mapping");
        assert_eq!(mapping.name, "XInput Controller");
        assert!(db.lookup(&id("03000000ffff0000ffff000000000000"), "Unknown").is_none());
    }

    #[test]
    fn loads_database_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "03000000790000000600000000000000,Pad,a:b2,platform:Windows,").expect("write");
        let db = MappingDatabase::load(file.path(), Some("Windows")).expect("load");
        assert_eq!(db.len(), 1);
        assert!(MappingDatabase::load(Path::new("/nonexistent/db.txt"), None).is_err());
    }
}
