//! Controller identity codec.
//!
//! An identity is the 16 byte SDL joystick GUID, written as 32 hex
//! characters: `bus, crc16(name), vendor, 0, product, 0, version` as
//! little-endian words followed by the driver byte and the subtype byte.
//! Different SDL releases fill the checksum differently, so identities are
//! converted to the layout of the library they are compared against.

mod convert;
mod crc;
mod identity;
mod version;

pub use convert::{
    convert, convert_with_hid, variants, HidStrings, NINTENDO_VENDOR_ID,
    WIRELESS_ADAPTER_CRC,
};
pub use crc::{crc16, hid_name_crc, name_crc};
pub use identity::{
    ControllerIdentity, IdentityFields, WrappedDriver, BUS_BLUETOOTH, BUS_USB,
    IDENTITY_HEX_LEN,
};
pub use version::SdlVersion;
