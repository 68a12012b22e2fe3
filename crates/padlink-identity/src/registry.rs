use std::cell::OnceCell;

use ahash::AHashSet;
use padlink_devices::{
    enumerate_class_devices, enumerate_console_slots, enumerate_hid, enumerate_legacy,
    is_console_interface, normalize_instance_path, Backends, ClassDevice, ConsoleSlot, HidDevice,
    LegacyDevice, PathResolver,
};
use padlink_guid::{convert_with_hid, ControllerIdentity, HidStrings, SdlVersion, WrappedDriver};
use padlink_mapping::{
    current_platform, select_source, Control, ControllerDatabase, ControllerDatabaseSource,
    ControllerMapping, HidToLegacyTranslator, InputCaptureSet, InputElement, MappingDatabase,
};

use crate::config::Settings;
use crate::console::console_code;
use crate::correlation::{assign_console_slots, find_correlated, CorrelationKey, SlotAssignment};
use crate::descriptor::ControllerDescriptor;
use crate::resolve::{resolve_binding, Resolution};

const CONSOLE_FALLBACK_NAME: &str = "XInput Controller";

/// Owns every device list, the controller database and the translator of
/// one enumeration pass.
///
/// Each table is built on first access and kept until the registry is
/// dropped; [`DeviceRegistry::reload`] starts over with a new registry.
pub struct DeviceRegistry {
    settings: Settings,
    backends: Backends,
    source: Option<Box<dyn ControllerDatabaseSource>>,
    legacy: OnceCell<Vec<LegacyDevice>>,
    slots: OnceCell<Vec<ConsoleSlot>>,
    hid: OnceCell<Vec<HidDevice>>,
    class: OnceCell<Vec<ClassDevice>>,
    database: OnceCell<ControllerDatabase>,
    captures: OnceCell<InputCaptureSet>,
    translator: OnceCell<HidToLegacyTranslator>,
    controllers: OnceCell<Vec<ControllerDescriptor>>,
}

impl DeviceRegistry {
    pub fn new(settings: Settings, backends: Backends) -> Self {
        Self {
            settings,
            backends,
            source: None,
            legacy: OnceCell::new(),
            slots: OnceCell::new(),
            hid: OnceCell::new(),
            class: OnceCell::new(),
            database: OnceCell::new(),
            captures: OnceCell::new(),
            translator: OnceCell::new(),
            controllers: OnceCell::new(),
        }
    }

    /// Reads the live controller list from `source` instead of the one the
    /// settings select.
    pub fn with_source(mut self, source: Box<dyn ControllerDatabaseSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Fresh registry over the same backends with new SDL hints.
    pub fn reload(self, hints: Option<String>) -> Self {
        let Self { mut settings, backends, source, .. } = self;
        settings.hints = hints;
        Self { source, ..Self::new(settings, backends) }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self.backends.topology.as_ref())
    }

    pub fn legacy_devices(&self) -> &[LegacyDevice] {
        self.legacy
            .get_or_init(|| enumerate_legacy(self.backends.legacy.as_ref(), &self.resolver()))
    }

    pub fn console_slots(&self) -> &[ConsoleSlot] {
        self.slots
            .get_or_init(|| enumerate_console_slots(self.backends.xinput.as_ref()))
    }

    pub fn hid_devices(&self) -> &[HidDevice] {
        self.hid
            .get_or_init(|| enumerate_hid(self.backends.hid.as_ref(), &self.resolver()))
    }

    pub fn class_devices(&self) -> &[ClassDevice] {
        self.class.get_or_init(|| {
            enumerate_class_devices(self.backends.class_query.as_ref(), &self.resolver())
        })
    }

    pub fn database(&self) -> &ControllerDatabase {
        self.database.get_or_init(|| {
            let offline = self.offline_database();
            match &self.source {
                Some(source) => ControllerDatabase::load(source.as_ref(), offline),
                None => {
                    let source = select_source(&self.settings.source_settings());
                    log::debug!("controller database source: {}", source.name());
                    ControllerDatabase::load(source.as_ref(), offline)
                }
            }
        })
    }

    fn offline_database(&self) -> MappingDatabase {
        let Some(path) = &self.settings.database else {
            return MappingDatabase::bundled();
        };
        match MappingDatabase::load(path, Some(current_platform())) {
            Ok(db) => db,
            Err(e) => {
                log::warn!("{e}, using the bundled mappings");
                MappingDatabase::bundled()
            }
        }
    }

    pub fn captures(&self) -> &InputCaptureSet {
        self.captures.get_or_init(|| {
            let Some(path) = &self.settings.captures else {
                return InputCaptureSet::default();
            };
            InputCaptureSet::load(path).unwrap_or_else(|e| {
                log::warn!("ignoring input captures: {e}");
                InputCaptureSet::default()
            })
        })
    }

    pub fn translator(&self) -> &HidToLegacyTranslator {
        self.translator
            .get_or_init(|| HidToLegacyTranslator::build(self.captures()))
    }

    /// Controllers with identities in the configured layout and OS devices
    /// attached. Without live database entries they come from the console
    /// slots and the legacy device list.
    pub fn controllers(&self) -> &[ControllerDescriptor] {
        self.controllers.get_or_init(|| {
            let assignments = assign_console_slots(self.console_slots(), self.hid_devices());
            if self.database().entries().is_empty() {
                self.enumerated_controllers(&assignments)
            } else {
                self.live_controllers(&assignments)
            }
        })
    }

    fn live_controllers(&self, assignments: &[SlotAssignment<'_>]) -> Vec<ControllerDescriptor> {
        let database = self.database();
        let version = self.settings.sdl_version.unwrap_or(database.version());
        let resolver = self.resolver();
        let mut console = assignments.iter();
        let mut used_hid = AHashSet::new();
        let mut used_legacy = AHashSet::new();

        let mut out = Vec::with_capacity(database.entries().len());
        for entry in database.entries() {
            let vendor_id = entry.identity.vendor_id();
            let product_id = entry.identity.product_id();
            let console_style = entry.identity.driver() == WrappedDriver::ConsoleStyle;

            let entry_parent = if console_style || entry.path.is_empty() {
                String::new()
            } else {
                resolver.parent_of(&entry.path)
            };
            let hid = if console_style {
                console.next().and_then(|assignment| assignment.hid)
            } else {
                let key = CorrelationKey::new(vendor_id, product_id, &entry_parent);
                find_correlated(&key, self.hid_devices(), CorrelationKey::of_hid, |device| {
                    !device.is_console_style() && !used_hid.contains(&device.path.to_ascii_lowercase())
                })
            };
            if let Some(device) = hid {
                used_hid.insert(device.path.to_ascii_lowercase());
            }

            let key = match hid {
                Some(device) => CorrelationKey::of_hid(device),
                None => CorrelationKey::new(vendor_id, product_id, &entry_parent),
            };
            let legacy = find_correlated(&key, self.legacy_devices(), CorrelationKey::of_legacy, |device| {
                !used_legacy.contains(&device.index)
            });
            if let Some(device) = legacy {
                used_legacy.insert(device.index);
            }

            let identity = if version == SdlVersion::Unknown {
                entry.identity.clone()
            } else {
                convert_with_hid(&entry.identity, &entry.name, version, hid_strings(hid))
            };
            let path = hid
                .map(|d| d.path.clone())
                .or_else(|| legacy.map(|d| d.path.clone()))
                .unwrap_or_else(|| entry.path.clone());
            let parent_path = hid
                .map(|d| d.parent_path.clone())
                .or_else(|| legacy.map(|d| d.parent_path.clone()))
                .unwrap_or(entry_parent);

            out.push(ControllerDescriptor {
                index: entry.index,
                name: entry.name.clone(),
                instance_id: instance_id(&path),
                path,
                parent_path,
                vendor_id,
                product_id,
                identity,
                live: true,
            });
        }
        out
    }

    fn enumerated_controllers(&self, assignments: &[SlotAssignment<'_>]) -> Vec<ControllerDescriptor> {
        let version = match self.settings.sdl_version {
            Some(version) if version != SdlVersion::Unknown => version,
            _ => SdlVersion::LATEST,
        };
        let legacy = self.legacy_devices();
        let mut out = Vec::new();

        for assignment in assignments {
            let slot = &assignment.slot;
            let name = assignment
                .hid
                .and_then(|hid| {
                    let key = CorrelationKey::of_hid(hid);
                    legacy.iter().find(|d| CorrelationKey::of_legacy(d) == key)
                })
                .map_or(CONSOLE_FALLBACK_NAME, |d| d.name.as_str());
            let path = assignment.hid.map(|d| d.path.clone()).unwrap_or_default();
            out.push(ControllerDescriptor {
                index: out.len(),
                name: name.to_owned(),
                identity: convert_with_hid(&slot.identity(), name, version, hid_strings(assignment.hid)),
                instance_id: instance_id(&path),
                path,
                parent_path: assignment.hid.map(|d| d.parent_path.clone()).unwrap_or_default(),
                vendor_id: slot.vendor_id(),
                product_id: slot.product_id(),
                live: false,
            });
        }

        let mut used_hid = AHashSet::new();
        for device in legacy.iter().filter(|d| !is_console_interface(&d.path)) {
            let hid = find_correlated(
                &CorrelationKey::of_legacy(device),
                self.hid_devices(),
                CorrelationKey::of_hid,
                |hid| !hid.is_console_style() && !used_hid.contains(&hid.path.to_ascii_lowercase()),
            );
            if let Some(hid) = hid {
                used_hid.insert(hid.path.to_ascii_lowercase());
            }
            out.push(ControllerDescriptor {
                index: out.len(),
                name: device.name.clone(),
                identity: convert_with_hid(&device.identity, &device.name, version, hid_strings(hid)),
                instance_id: instance_id(&device.path),
                path: device.path.clone(),
                parent_path: device.parent_path.clone(),
                vendor_id: device.vendor_id,
                product_id: device.product_id,
                live: false,
            });
        }
        out
    }

    /// Mapping of `descriptor`: the live entry it was built from, then the
    /// database lookups by identity.
    pub fn mapping_for(&self, descriptor: &ControllerDescriptor) -> Option<&ControllerMapping> {
        let database = self.database();
        descriptor
            .live
            .then(|| database.entries().iter().find(|e| e.index == descriptor.index))
            .flatten()
            .and_then(|entry| entry.mapping.as_ref())
            .or_else(|| database.mapping_for(None, &descriptor.identity, &descriptor.name))
    }

    /// Looks a controller up by identity, in any SDL layout.
    pub fn find_controller(&self, identity: &ControllerIdentity) -> Option<&ControllerDescriptor> {
        let controllers = self.controllers();
        controllers.iter().find(|c| c.identity == *identity).or_else(|| {
            let wanted = identity.without_crc();
            controllers.iter().find(|c| c.identity.without_crc() == wanted)
        })
    }

    /// Resolves the captured code of `semantic` on `descriptor` through the
    /// fallback chain. Never fails: an unresolved input keeps its code.
    pub fn resolve(
        &self,
        descriptor: &ControllerDescriptor,
        semantic: Control,
        captured: InputElement,
    ) -> Resolution {
        let found = resolve_binding(self.mapping_for(descriptor), semantic, captured);
        let binding = found.map(|(binding, _)| binding);
        let input = binding.map_or(captured, |b| b.input);
        Resolution {
            semantic,
            captured,
            binding,
            matched_by: found.map(|(_, kind)| kind),
            legacy: self.translator().translate(&descriptor.identity, input),
            console: console_code(binding.map_or(semantic, |b| b.control)),
        }
    }
}

fn hid_strings(device: Option<&HidDevice>) -> Option<HidStrings<'_>> {
    device.map(|d| HidStrings::new(&d.manufacturer, &d.product))
}

fn instance_id(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        normalize_instance_path(path)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use padlink_devices::{
        subtype, BasicCapabilities, DevNode, DeviceError, DeviceTopology, ExtendedCapabilities,
        HidBackend, HidDeviceInfo, LegacyBackend, LegacyDeviceInfo, Unsupported, XInputBackend,
        USAGE_GAMEPAD,
    };
    use padlink_guid::{convert, ControllerIdentity};
    use padlink_mapping::{Button, DatabaseError, LiveController, LiveSnapshot};

    use super::*;
    use crate::console::ConsoleCode;
    use crate::resolve::MatchKind;

    const SNES_HID: &str = "\\\\?\\hid#vid_0810&pid_e501#7&1a2b&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}";
    const SNES_NODE: &str = "HID\\VID_0810&PID_E501\\7&1A2B&0&0000";
    const SNES_PARENT: &str = "USB\\VID_0810&PID_E501\\5&3c4d&0&2";
    const PAD_HID: &str = "\\\\?\\hid#vid_045e&pid_028e&ig_00#3&9f&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}";
    const PAD_NODE: &str = "HID\\VID_045E&PID_028E&IG_00\\3&9F&0&0000";
    const PAD_PARENT: &str = "USB\\VID_045E&PID_028E\\6&77&0&1";
    const SNES_MAPPING: &str = "030000001008000001e5000000000000,NEXT SNES Controller,a:b2,b:b1,dpdown:b13,dpleft:b14,dpright:b15,dpup:b12,start:b9,";
    const PAD_MAPPING: &str = "030000005e0400008e02000000007801,XInput Controller,a:b0,b:b1,dpup:h0.1,leftx:a0,lefty:a1,start:b7,";

    struct Tree;

    impl DeviceTopology for Tree {
        fn locate(&self, instance_id: &str) -> Result<DevNode, DeviceError> {
            match instance_id {
                SNES_NODE => Ok(DevNode(1)),
                PAD_NODE => Ok(DevNode(2)),
                _ => Err(DeviceError::Os { call: "locate", code: 0x0d }),
            }
        }

        fn parent(&self, node: DevNode) -> Result<DevNode, DeviceError> {
            Ok(DevNode(node.0 + 10))
        }

        fn device_id(&self, node: DevNode) -> Result<String, DeviceError> {
            match node.0 {
                11 => Ok(SNES_PARENT.to_owned()),
                12 => Ok(PAD_PARENT.to_owned()),
                _ => Err(DeviceError::Os { call: "device_id", code: 0x05 }),
            }
        }
    }

    struct Legacy;

    impl LegacyBackend for Legacy {
        fn devices(&self) -> Result<Vec<LegacyDeviceInfo>, DeviceError> {
            Ok(vec![
                LegacyDeviceInfo {
                    index: 0,
                    name: "Controller (XBOX 360 For Windows)".to_owned(),
                    instance_guid: "{00000000-0000-0000-0000-000000000001}".to_owned(),
                    product_guid: "{028E045E-0000-0000-0000-504944564944}".to_owned(),
                    path: PAD_HID.to_owned(),
                },
                LegacyDeviceInfo {
                    index: 1,
                    name: "NEXT SNES Controller".to_owned(),
                    instance_guid: "{00000000-0000-0000-0000-000000000002}".to_owned(),
                    product_guid: "{E5010810-0000-0000-0000-504944564944}".to_owned(),
                    path: SNES_HID.to_owned(),
                },
            ])
        }
    }

    struct OneSlot;

    impl XInputBackend for OneSlot {
        fn is_connected(&self, slot: u32) -> bool {
            slot == 0
        }

        fn capabilities_ex(&self, _slot: u32) -> Option<ExtendedCapabilities> {
            None
        }

        fn capabilities(&self, slot: u32) -> Option<BasicCapabilities> {
            (slot == 0).then_some(BasicCapabilities { subtype: subtype::GAMEPAD })
        }
    }

    struct Hid;

    impl HidBackend for Hid {
        fn devices(&self) -> Result<Vec<HidDeviceInfo>, DeviceError> {
            Ok(vec![
                HidDeviceInfo {
                    path: PAD_HID.to_owned(),
                    usage_page: 0x01,
                    usage: USAGE_GAMEPAD,
                    vendor_id: 0x045e,
                    product_id: 0x028e,
                    manufacturer: "Microsoft".to_owned(),
                    product: "Controller".to_owned(),
                },
                HidDeviceInfo {
                    path: SNES_HID.to_owned(),
                    usage_page: 0x01,
                    usage: USAGE_GAMEPAD,
                    vendor_id: 0x0810,
                    product_id: 0xe501,
                    manufacturer: "NEXT".to_owned(),
                    product: "SNES Controller".to_owned(),
                },
            ])
        }

        fn open_strings(&self, _path: &str) -> Result<(String, String), DeviceError> {
            Err(DeviceError::Unsupported)
        }
    }

    struct Live {
        loads: Rc<Cell<usize>>,
        controllers: Vec<LiveController>,
    }

    impl ControllerDatabaseSource for Live {
        fn name(&self) -> &'static str {
            "test"
        }

        fn load(&self) -> Result<LiveSnapshot, DatabaseError> {
            self.loads.set(self.loads.get() + 1);
            Ok(LiveSnapshot {
                version: SdlVersion::Sdl2_0,
                controllers: self.controllers.clone(),
            })
        }
    }

    fn backends() -> Backends {
        Backends {
            topology: Box::new(Tree),
            legacy: Box::new(Legacy),
            xinput: Box::new(OneSlot),
            hid: Box::new(Hid),
            class_query: Box::new(Unsupported),
        }
    }

    fn live_controllers() -> Vec<LiveController> {
        vec![
            LiveController {
                index: 0,
                name: "NEXT SNES Controller".to_owned(),
                path: SNES_HID.to_owned(),
                identity: ControllerIdentity::parse("030000001008000001e5000000000000"),
                mapping: Some(SNES_MAPPING.to_owned()),
            },
            LiveController {
                index: 1,
                name: "XInput Controller".to_owned(),
                path: String::new(),
                identity: ControllerIdentity::parse("030000005e0400008e02000000007801"),
                mapping: Some(PAD_MAPPING.to_owned()),
            },
        ]
    }

    fn registry(settings: Settings, loads: &Rc<Cell<usize>>, controllers: Vec<LiveController>) -> DeviceRegistry {
        DeviceRegistry::new(settings, backends()).with_source(Box::new(Live {
            loads: Rc::clone(loads),
            controllers,
        }))
    }

    #[test]
    fn correlates_live_entries_with_os_devices() {
        let loads = Rc::new(Cell::new(0));
        let registry = registry(Settings::default(), &loads, live_controllers());
        let controllers = registry.controllers();
        assert_eq!(controllers.len(), 2);

        let snes = &controllers[0];
        assert_eq!(snes.path, SNES_HID);
        assert_eq!(snes.instance_id, SNES_NODE);
        assert_eq!(snes.parent_path, SNES_PARENT);
        assert_eq!((snes.vendor_id, snes.product_id), (0x0810, 0xe501));
        assert!(snes.live);

        let pad = &controllers[1];
        assert!(pad.is_console_style());
        assert_eq!(pad.path, PAD_HID);
        assert_eq!(pad.parent_path, PAD_PARENT);
        assert_eq!(pad.identity.to_string(), "030000005e0400008e02000000007801");
    }

    #[test]
    fn tables_are_built_once() {
        let loads = Rc::new(Cell::new(0));
        let registry = registry(Settings::default(), &loads, live_controllers());
        assert_eq!(loads.get(), 0);
        registry.controllers();
        registry.controllers();
        registry.database();
        assert_eq!(loads.get(), 1);
        assert_eq!(registry.legacy_devices().len(), 2);
        assert_eq!(registry.console_slots().len(), 1);
        assert!(registry.class_devices().is_empty());

        let registry = registry.reload(Some("SDL_JOYSTICK_HIDAPI=0".to_owned()));
        assert_eq!(registry.settings().hints.as_deref(), Some("SDL_JOYSTICK_HIDAPI=0"));
        registry.database();
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn converts_identities_to_the_configured_layout() {
        let loads = Rc::new(Cell::new(0));
        let settings = Settings {
            sdl_version: Some(SdlVersion::Sdl2_26),
            ..Settings::default()
        };
        let registry = registry(settings, &loads, live_controllers());
        let snes = &registry.controllers()[0];
        let expected = convert_with_hid(
            &ControllerIdentity::parse("030000001008000001e5000000000000"),
            "NEXT SNES Controller",
            SdlVersion::Sdl2_26,
            Some(HidStrings::new("NEXT", "SNES Controller")),
        );
        assert_eq!(snes.identity, expected);
        assert_ne!(snes.identity.to_string(), "030000001008000001e5000000000000");

        assert_eq!(registry.find_controller(&expected).map(|c| c.index), Some(0));
        let other_layout = convert(&expected, "NEXT SNES Controller", SdlVersion::Sdl2_0);
        assert_eq!(registry.find_controller(&other_layout).map(|c| c.index), Some(0));
        assert!(registry.mapping_for(snes).is_some());
    }

    #[test]
    fn resolves_dpad_of_digital_only_pad() {
        let loads = Rc::new(Cell::new(0));
        let registry = registry(Settings::default(), &loads, live_controllers());
        let snes = registry.controllers()[0].clone();

        let resolution = registry.resolve(&snes, Control::Button(Button::DPadLeft), InputElement::axis(0, -1));
        assert!(resolution.is_resolved());
        assert_eq!(resolution.matched_by, Some(MatchKind::DPadFallback));
        assert_eq!(resolution.input(), InputElement::button(14));
        assert_eq!(resolution.legacy, InputElement::button(14));
        assert_eq!(resolution.console, Some(ConsoleCode::Button(0x0004)));
    }

    #[test]
    fn unresolved_input_is_returned_unchanged() {
        let loads = Rc::new(Cell::new(0));
        let registry = registry(Settings::default(), &loads, live_controllers());
        let pad = registry.controllers()[1].clone();

        let captured = InputElement::button(11);
        let resolution = registry.resolve(&pad, Control::Button(Button::Y), captured);
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.input(), captured);
        assert_eq!(resolution.legacy, captured);
        assert_eq!(resolution.console, Some(ConsoleCode::Button(0x8000)));

        let resolution = registry.resolve(&pad, Control::Button(Button::Start), InputElement::button(7));
        assert_eq!(resolution.matched_by, Some(MatchKind::Exact));
    }

    #[test]
    fn without_live_entries_uses_slots_and_legacy_devices() {
        let loads = Rc::new(Cell::new(0));
        let registry = registry(Settings::default(), &loads, Vec::new());
        let controllers = registry.controllers();
        assert_eq!(controllers.len(), 2);

        let pad = &controllers[0];
        assert!(pad.is_console_style());
        assert_eq!(pad.name, "Controller (XBOX 360 For Windows)");
        assert_eq!(pad.path, PAD_HID);
        assert!(!pad.live);

        let snes = &controllers[1];
        assert_eq!(snes.index, 1);
        assert_eq!(snes.name, "NEXT SNES Controller");
        assert_eq!(
            snes.identity.without_crc(),
            ControllerIdentity::parse("030000001008000001e5000000000000")
        );
    }
}
