use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Length of an encoded identity in hex characters.
pub const IDENTITY_HEX_LEN: usize = 32;

const BYTE_LEN: usize = IDENTITY_HEX_LEN / 2;

const BUS: usize = 0;
const CRC: usize = 2;
const VENDOR: usize = 4;
const VENDOR_PAD: usize = 6;
const PRODUCT: usize = 8;
const PRODUCT_PAD: usize = 10;
const VERSION: usize = 12;
const DRIVER: usize = 14;
const SUBTYPE: usize = 15;

/// USB bus type as stored in the first identity word.
pub const BUS_USB: u16 = 0x0003;
/// Bluetooth bus type as stored in the first identity word.
pub const BUS_BLUETOOTH: u16 = 0x0005;

/// Which input subsystem produced an identity (byte 14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrappedDriver {
    /// DirectInput or any driver that leaves the byte empty.
    #[default]
    Legacy,
    /// Windows raw input, `'r'`.
    RawHid,
    /// SDL's own HID drivers, `'h'`.
    Hidapi,
    /// Virtual joysticks, `'v'`.
    Virtual,
    /// XInput, `'x'`.
    ConsoleStyle,
    Other(u8),
}

impl WrappedDriver {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => WrappedDriver::Legacy,
            b'r' => WrappedDriver::RawHid,
            b'h' => WrappedDriver::Hidapi,
            b'v' => WrappedDriver::Virtual,
            b'x' => WrappedDriver::ConsoleStyle,
            other => WrappedDriver::Other(other),
        }
    }

    pub const fn byte(self) -> u8 {
        match self {
            WrappedDriver::Legacy => 0,
            WrappedDriver::RawHid => b'r',
            WrappedDriver::Hidapi => b'h',
            WrappedDriver::Virtual => b'v',
            WrappedDriver::ConsoleStyle => b'x',
            WrappedDriver::Other(byte) => byte,
        }
    }

    /// Raw input and SDL's HID drivers both read the HID device directly.
    pub const fn is_raw_hid(self) -> bool {
        matches!(self, WrappedDriver::RawHid | WrappedDriver::Hidapi)
    }
}

/// Decoded sub-fields of an identity. All words are little-endian on the
/// wire, so `5e04` in the hex string reads back as vendor `0x045e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IdentityFields {
    pub bus: u16,
    pub crc: u16,
    pub vendor_id: u16,
    pub vendor_pad: u16,
    pub product_id: u16,
    pub product_pad: u16,
    pub version: u16,
    pub driver: WrappedDriver,
    pub subtype: u8,
}

impl IdentityFields {
    pub fn to_bytes(&self) -> [u8; BYTE_LEN] {
        let mut bytes = [0u8; BYTE_LEN];
        put_word(&mut bytes, BUS, self.bus);
        put_word(&mut bytes, CRC, self.crc);
        put_word(&mut bytes, VENDOR, self.vendor_id);
        put_word(&mut bytes, VENDOR_PAD, self.vendor_pad);
        put_word(&mut bytes, PRODUCT, self.product_id);
        put_word(&mut bytes, PRODUCT_PAD, self.product_pad);
        put_word(&mut bytes, VERSION, self.version);
        bytes[DRIVER] = self.driver.byte();
        bytes[SUBTYPE] = self.subtype;
        bytes
    }

    pub fn encode(&self) -> ControllerIdentity {
        ControllerIdentity::from_bytes(self.to_bytes())
    }

    fn from_bytes(bytes: &[u8; BYTE_LEN]) -> Self {
        Self {
            bus: word(bytes, BUS),
            crc: word(bytes, CRC),
            vendor_id: word(bytes, VENDOR),
            vendor_pad: word(bytes, VENDOR_PAD),
            product_id: word(bytes, PRODUCT),
            product_pad: word(bytes, PRODUCT_PAD),
            version: word(bytes, VERSION),
            driver: WrappedDriver::from_byte(bytes[DRIVER]),
            subtype: bytes[SUBTYPE],
        }
    }
}

fn word(bytes: &[u8; BYTE_LEN], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn put_word(bytes: &mut [u8; BYTE_LEN], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// A controller identity (SDL joystick GUID).
///
/// Well-formed input (exactly 32 hex digits) is stored as bytes and always
/// printed in lowercase. Anything else is kept verbatim as an opaque value:
/// it compares by its text, decodes to [`IdentityFields::default`] and is
/// returned unchanged by every transformation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerIdentity(Repr);

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Bytes([u8; BYTE_LEN]),
    Opaque(Box<str>),
}

impl ControllerIdentity {
    /// Parses an identity string. Never fails.
    pub fn parse(input: &str) -> Self {
        if input.len() == IDENTITY_HEX_LEN {
            let mut bytes = [0u8; BYTE_LEN];
            if hex::decode_to_slice(input, &mut bytes).is_ok() {
                return Self(Repr::Bytes(bytes));
            }
        }
        Self(Repr::Opaque(input.into()))
    }

    pub const fn from_bytes(bytes: [u8; BYTE_LEN]) -> Self {
        Self(Repr::Bytes(bytes))
    }

    /// Builds an identity the way SDL does for a device it knows by ids.
    pub fn from_ids(
        bus: u16,
        vendor_id: u16,
        product_id: u16,
        version: u16,
        driver: WrappedDriver,
        subtype: u8,
    ) -> Self {
        IdentityFields {
            bus,
            vendor_id,
            product_id,
            version,
            driver,
            subtype,
            ..IdentityFields::default()
        }
        .encode()
    }

    pub fn as_bytes(&self) -> Option<&[u8; BYTE_LEN]> {
        match &self.0 {
            Repr::Bytes(bytes) => Some(bytes),
            Repr::Opaque(_) => None,
        }
    }

    /// Whether the identity has the fixed 32 hex digit layout.
    pub fn is_valid(&self) -> bool {
        matches!(self.0, Repr::Bytes(_))
    }

    /// Splits the identity into its sub-fields. Opaque identities yield the
    /// legacy/unknown defaults.
    pub fn decode(&self) -> IdentityFields {
        match &self.0 {
            Repr::Bytes(bytes) => IdentityFields::from_bytes(bytes),
            Repr::Opaque(_) => IdentityFields::default(),
        }
    }

    pub fn vendor_id(&self) -> u16 {
        self.decode().vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.decode().product_id
    }

    pub fn driver(&self) -> WrappedDriver {
        self.decode().driver
    }

    /// Applies `edit` to the decoded fields and re-encodes. Opaque
    /// identities are returned unchanged.
    pub fn map_fields(&self, edit: impl FnOnce(&mut IdentityFields)) -> Self {
        match &self.0 {
            Repr::Bytes(bytes) => {
                let mut fields = IdentityFields::from_bytes(bytes);
                edit(&mut fields);
                fields.encode()
            }
            Repr::Opaque(_) => self.clone(),
        }
    }

    /// Same identity with the name checksum cleared.
    pub fn without_crc(&self) -> Self {
        self.map_fields(|fields| fields.crc = 0)
    }

    /// Rewrites the identity as XInput would report it, with `subtype` as
    /// the driver-dependent byte.
    pub fn to_console_style(&self, subtype: u8) -> Self {
        self.map_fields(|fields| {
            fields.driver = WrappedDriver::ConsoleStyle;
            fields.subtype = subtype;
        })
    }

    /// Rewrites the identity as raw input would report it.
    pub fn to_raw_style(&self) -> Self {
        self.map_fields(|fields| {
            fields.driver = WrappedDriver::RawHid;
            fields.subtype = 0;
        })
    }

    /// Parses the Windows text form of a GUID (`{xxxxxxxx-xxxx-...}`), whose
    /// first three groups are byte-swapped relative to the identity layout.
    pub fn from_platform_guid(input: &str) -> Option<Self> {
        let compact: String = input
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .chars()
            .filter(|c| *c != '-')
            .collect();
        let mut bytes = [0u8; BYTE_LEN];
        hex::decode_to_slice(&compact, &mut bytes).ok()?;
        swap_platform_groups(&mut bytes);
        Some(Self::from_bytes(bytes))
    }

    /// Formats the identity as a Windows GUID string, without braces.
    pub fn to_platform_guid(&self) -> Option<String> {
        let mut bytes = *self.as_bytes()?;
        swap_platform_groups(&mut bytes);
        let hex = hex::encode(bytes);
        Some(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }
}

fn swap_platform_groups(bytes: &mut [u8; BYTE_LEN]) {
    bytes[0..4].reverse();
    bytes[4..6].reverse();
    bytes[6..8].reverse();
}

impl fmt::Display for ControllerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
            Repr::Opaque(text) => f.write_str(text),
        }
    }
}

impl fmt::Debug for ControllerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ControllerIdentity")
            .field(&self.to_string())
            .finish()
    }
}

impl FromStr for ControllerIdentity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
