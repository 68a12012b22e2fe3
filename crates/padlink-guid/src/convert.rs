use crate::crc::{crc16, hid_name_crc, name_crc};
use crate::identity::ControllerIdentity;
use crate::version::SdlVersion;

pub const NINTENDO_VENDOR_ID: u16 = 0x057e;

/// Nintendo pads whose SDL identity must not carry the driver subtype.
const NINTENDO_UNTYPED_PRODUCTS: [u16; 10] = [
    0x2006, // Joy-Con (L)
    0x2007, // Joy-Con (R)
    0x2008, // Joy-Con pair
    0x2009, // Switch Pro Controller
    0x200e, // Joy-Con charging grip
    0x2017, // SNES controller
    0x2019, // N64 controller
    0x201e, // Genesis controller
    0x2066, // Joy-Con 2 (R)
    0x2069, // Switch 2 Pro Controller
];

/// Name checksum of a wireless receiver whose subtype is always cleared,
/// whatever vendor id it reports.
pub const WIRELESS_ADAPTER_CRC: u16 = crc16(0, b"8BitDo Receiver");

/// Manufacturer and product strings read from the correlated HID device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidStrings<'a> {
    pub manufacturer: &'a str,
    pub product: &'a str,
}

impl<'a> HidStrings<'a> {
    pub fn new(manufacturer: &'a str, product: &'a str) -> Self {
        Self { manufacturer, product }
    }

    fn is_complete(&self) -> bool {
        !self.manufacturer.is_empty() && !self.product.is_empty()
    }
}

/// Rewrites `identity` into the layout produced by SDL `version`.
///
/// Opaque identities are returned unchanged. The conversion is idempotent.
pub fn convert(identity: &ControllerIdentity, name: &str, version: SdlVersion) -> ControllerIdentity {
    convert_with_hid(identity, name, version, None)
}

/// Same as [`convert`], using `hid` strings for the checksum on layouts that
/// take them into account.
pub fn convert_with_hid(
    identity: &ControllerIdentity,
    name: &str,
    version: SdlVersion,
    hid: Option<HidStrings<'_>>,
) -> ControllerIdentity {
    identity.map_fields(|fields| {
        fields.crc = if version.has_name_crc() {
            match hid {
                Some(hid) if version.uses_hid_strings() && hid.is_complete() => {
                    hid_name_crc(hid.manufacturer, hid.product)
                }
                _ if !name.is_empty() => name_crc(name),
                _ => 0,
            }
        } else {
            0
        };

        if fields.vendor_id == NINTENDO_VENDOR_ID
            && NINTENDO_UNTYPED_PRODUCTS.contains(&fields.product_id)
        {
            fields.subtype = 0;
        }

        if fields.crc == WIRELESS_ADAPTER_CRC {
            fields.subtype = 0;
        }
    })
}

/// All distinct layouts of `identity`, the input first.
pub fn variants(
    identity: &ControllerIdentity,
    name: &str,
    hid: Option<HidStrings<'_>>,
) -> Vec<ControllerIdentity> {
    let mut out = vec![identity.clone()];
    for version in SdlVersion::ALL {
        let variant = convert_with_hid(identity, name, version, hid);
        if !out.contains(&variant) {
            out.push(variant);
        }
    }
    out
}
