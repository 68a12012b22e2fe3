use padlink_guid::{ControllerIdentity, WrappedDriver, BUS_USB};

/// The console-style API serves exactly four controllers.
pub const SLOT_COUNT: u32 = 4;

/// Ids reported when only the basic capability tier is available.
pub const DEFAULT_VENDOR_ID: u16 = 0x045e;
pub const DEFAULT_PRODUCT_ID: u16 = 0x028e;

/// Device subtypes reported by the console-style API.
pub mod subtype {
    pub const UNKNOWN: u8 = 0x00;
    pub const GAMEPAD: u8 = 0x01;
    pub const WHEEL: u8 = 0x02;
    pub const ARCADE_STICK: u8 = 0x03;
    pub const FLIGHT_STICK: u8 = 0x04;
    pub const DANCE_PAD: u8 = 0x05;
    pub const GUITAR: u8 = 0x06;
    pub const GUITAR_ALTERNATE: u8 = 0x07;
    pub const DRUM_KIT: u8 = 0x08;
    pub const GUITAR_BASS: u8 = 0x0b;
    pub const ARCADE_PAD: u8 = 0x13;
}

/// Result of the basic capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicCapabilities {
    pub subtype: u8,
}

/// Result of the extended capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedCapabilities {
    pub subtype: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub revision: u16,
}

/// Which capability tier answered for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    Extended,
    Basic,
}

/// Access to the console-style controller API.
///
/// The extended query is an undocumented export that some Windows builds
/// do not ship; callers go through [`negotiate_capabilities`], which falls
/// back to the basic tier.
pub trait XInputBackend {
    fn is_connected(&self, slot: u32) -> bool;
    fn capabilities_ex(&self, slot: u32) -> Option<ExtendedCapabilities>;
    fn capabilities(&self, slot: u32) -> Option<BasicCapabilities>;
}

/// Negotiated capabilities of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCapabilities {
    pub subtype: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub revision: u16,
    pub tier: CapabilityTier,
}

/// Tries the extended query first, then the basic one.
pub fn negotiate_capabilities(backend: &dyn XInputBackend, slot: u32) -> Option<SlotCapabilities> {
    if let Some(ex) = backend.capabilities_ex(slot) {
        // Some wireless receivers answer the extended query with zero ids.
        let (vendor_id, product_id) = if ex.vendor_id == 0 {
            (DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID)
        } else {
            (ex.vendor_id, ex.product_id)
        };
        return Some(SlotCapabilities {
            subtype: ex.subtype,
            vendor_id,
            product_id,
            revision: ex.revision,
            tier: CapabilityTier::Extended,
        });
    }

    let basic = backend.capabilities(slot)?;
    Some(SlotCapabilities {
        subtype: basic.subtype,
        vendor_id: DEFAULT_VENDOR_ID,
        product_id: DEFAULT_PRODUCT_ID,
        revision: 0,
        tier: CapabilityTier::Basic,
    })
}

/// A connected console-style controller slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSlot {
    pub slot: u32,
    pub capabilities: SlotCapabilities,
}

impl ConsoleSlot {
    pub fn vendor_id(&self) -> u16 {
        self.capabilities.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.capabilities.product_id
    }

    pub fn subtype(&self) -> u8 {
        self.capabilities.subtype
    }

    /// Identity SDL assigns to a controller opened through this API.
    pub fn identity(&self) -> ControllerIdentity {
        ControllerIdentity::from_ids(
            BUS_USB,
            self.vendor_id(),
            self.product_id(),
            self.capabilities.revision,
            WrappedDriver::ConsoleStyle,
            self.subtype(),
        )
    }
}

/// Queries all four slots.
pub fn enumerate_console_slots(backend: &dyn XInputBackend) -> Vec<ConsoleSlot> {
    (0..SLOT_COUNT)
        .filter(|slot| backend.is_connected(*slot))
        .filter_map(|slot| match negotiate_capabilities(backend, slot) {
            Some(capabilities) => Some(ConsoleSlot { slot, capabilities }),
            None => {
                log::warn!("xinput slot {slot} is connected but reports no capabilities");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeXInput {
        connected: [bool; 4],
        extended: [Option<ExtendedCapabilities>; 4],
        basic: [Option<BasicCapabilities>; 4],
    }

    impl XInputBackend for FakeXInput {
        fn is_connected(&self, slot: u32) -> bool {
            self.connected[slot as usize]
        }

        fn capabilities_ex(&self, slot: u32) -> Option<ExtendedCapabilities> {
            self.extended[slot as usize]
        }

        fn capabilities(&self, slot: u32) -> Option<BasicCapabilities> {
            self.basic[slot as usize]
        }
    }

    #[test]
    fn prefers_extended_capabilities() {
        let backend = FakeXInput {
            connected: [true, false, false, false],
            extended: [
                Some(ExtendedCapabilities {
                    subtype: subtype::GAMEPAD,
                    vendor_id: 0x045e,
                    product_id: 0x0b12,
                    revision: 0x0510,
                }),
                None,
                None,
                None,
            ],
            basic: [Some(BasicCapabilities { subtype: subtype::GAMEPAD }), None, None, None],
        };
        let caps = negotiate_capabilities(&backend, 0).expect("capabilities");
        assert_eq!(caps.tier, CapabilityTier::Extended);
        assert_eq!((caps.vendor_id, caps.product_id), (0x045e, 0x0b12));
    }

    #[test]
    fn falls_back_to_basic_with_default_ids() {
        let backend = FakeXInput {
            connected: [false, true, false, false],
            basic: [None, Some(BasicCapabilities { subtype: subtype::WHEEL }), None, None],
            ..FakeXInput::default()
        };
        let caps = negotiate_capabilities(&backend, 1).expect("capabilities");
        assert_eq!(caps.tier, CapabilityTier::Basic);
        assert_eq!((caps.vendor_id, caps.product_id), (DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID));
        assert_eq!(caps.subtype, subtype::WHEEL);
    }

    #[test]
    fn zero_extended_ids_use_defaults() {
        let backend = FakeXInput {
            extended: [
                Some(ExtendedCapabilities { subtype: subtype::GAMEPAD, vendor_id: 0, product_id: 0, revision: 0 }),
                None,
                None,
                None,
            ],
            ..FakeXInput::default()
        };
        let caps = negotiate_capabilities(&backend, 0).expect("capabilities");
        assert_eq!((caps.vendor_id, caps.product_id), (DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID));
        assert_eq!(caps.tier, CapabilityTier::Extended);
    }

    #[test]
    fn enumerates_only_connected_slots() {
        let basic = Some(BasicCapabilities { subtype: subtype::GAMEPAD });
        let backend = FakeXInput {
            connected: [true, false, true, true],
            basic: [basic, basic, basic, None],
            ..FakeXInput::default()
        };
        let slots = enumerate_console_slots(&backend);
        assert_eq!(slots.iter().map(|s| s.slot).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(slots[0].identity().to_string(), "030000005e0400008e02000000007801");
    }
}
