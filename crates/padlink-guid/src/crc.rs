/// Checksum of one byte, reflected polynomial 0xA001.
#[allow(clippy::cast_lossless)]
const fn crc16_for_byte(mut r: u8) -> u16 {
    let mut crc: u16 = 0;
    let mut i = 0;
    while i < 8 {
        let low_bit = (crc ^ r as u16) & 1;
        crc = (if low_bit != 0 { 0xA001 } else { 0 }) ^ (crc >> 1);
        r >>= 1;
        i += 1;
    }
    crc
}

/// 16-bit checksum used by SDL to fingerprint joystick names (CRC-16/ARC).
///
/// The result must match `SDL_crc16` bit for bit, otherwise identities
/// built here will not be found in the controller database. The checksum
/// is incremental: feeding `a` and then `b` with the intermediate value as
/// `seed` equals one pass over `a ++ b`.
#[allow(clippy::cast_possible_truncation)]
pub const fn crc16(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;
    let mut i = 0;
    while i < data.len() {
        crc = crc16_for_byte((crc as u8) ^ data[i]) ^ (crc >> 8);
        i += 1;
    }
    crc
}

/// Checksum of a joystick name as SDL computes it for the GUID.
pub fn name_crc(name: &str) -> u16 {
    crc16(0, name.as_bytes())
}

/// Checksum of `manufacturer + " " + product`, the form newer SDL builds
/// use for devices opened through the HID drivers.
pub fn hid_name_crc(manufacturer: &str, product: &str) -> u16 {
    let crc = crc16(0, manufacturer.as_bytes());
    let crc = crc16(crc, b" ");
    crc16(crc, product.as_bytes())
}
