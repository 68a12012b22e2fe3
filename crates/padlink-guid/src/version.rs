use std::fmt;
use std::str::FromStr;

/// SDL releases that changed the joystick GUID layout, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SdlVersion {
    #[default]
    Unknown,
    /// 2.0.x up to 2.23: no name checksum.
    Sdl2_0,
    /// 2.24 and 2.25: version word populated, still no checksum.
    Sdl2_24,
    /// 2.26 to 2.29: name checksum in bytes 2..4.
    Sdl2_26,
    /// 2.30 and newer: HID devices checksum `manufacturer product`.
    Sdl2_30,
}

impl SdlVersion {
    /// Every known layout, used to register all lookup variants.
    pub const ALL: [SdlVersion; 4] = [
        SdlVersion::Sdl2_0,
        SdlVersion::Sdl2_24,
        SdlVersion::Sdl2_26,
        SdlVersion::Sdl2_30,
    ];

    pub const LATEST: SdlVersion = SdlVersion::Sdl2_30;

    /// Maps a library version triple to the layout it produces.
    pub fn from_version(major: u8, minor: u8, _patch: u8) -> Self {
        match (major, minor) {
            (0 | 1, _) => SdlVersion::Unknown,
            (2, 30..) => SdlVersion::Sdl2_30,
            (2, 26..=29) => SdlVersion::Sdl2_26,
            (2, 24 | 25) => SdlVersion::Sdl2_24,
            (2, _) => SdlVersion::Sdl2_0,
            _ => SdlVersion::LATEST,
        }
    }

    /// Whether identities of this layout carry a name checksum.
    pub fn has_name_crc(self) -> bool {
        self >= SdlVersion::Sdl2_26
    }

    /// Whether HID manufacturer and product strings feed the checksum.
    pub fn uses_hid_strings(self) -> bool {
        self >= SdlVersion::Sdl2_30
    }
}

impl FromStr for SdlVersion {
    type Err = String;

    /// Accepts `2.30`, `2.30.2` and `2.0.22` style strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u8, String> {
            match parts.next() {
                Some(part) => part
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| format!("invalid SDL version: {s}")),
                None => Ok(0),
            }
        };
        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        if major == 0 {
            return Err(format!("invalid SDL version: {s}"));
        }
        Ok(Self::from_version(major, minor, patch))
    }
}

impl fmt::Display for SdlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdlVersion::Unknown => "unknown",
            SdlVersion::Sdl2_0 => "2.0",
            SdlVersion::Sdl2_24 => "2.24",
            SdlVersion::Sdl2_26 => "2.26",
            SdlVersion::Sdl2_30 => "2.30",
        };
        f.write_str(s)
    }
}
