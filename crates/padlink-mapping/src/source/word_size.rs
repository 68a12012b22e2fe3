use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::DatabaseError;

const PE_POINTER_OFFSET: u64 = 0x3c;
const PE32_MAGIC: u16 = 0x10b;
const PE32_PLUS_MAGIC: u16 = 0x20b;
const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const MACHO_32_MAGIC: u32 = 0xfeed_face;
const MACHO_64_MAGIC: u32 = 0xfeed_facf;

/// Pointer width of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSize {
    Bits32,
    Bits64,
}

impl WordSize {
    /// Word size of the running process.
    pub const fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            WordSize::Bits64
        } else {
            WordSize::Bits32
        }
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WordSize::Bits32 => "32-bit",
            WordSize::Bits64 => "64-bit",
        })
    }
}

fn read_array<const N: usize>(file: &mut File, offset: u64) -> std::io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads the word size of a PE, ELF or Mach-O library from its header.
pub fn library_word_size(path: &Path) -> Result<WordSize, DatabaseError> {
    let io_err = |source| DatabaseError::Read { path: path.to_path_buf(), source };
    let unknown = || DatabaseError::UnknownBinary(path.to_path_buf());

    let mut file = File::open(path).map_err(io_err)?;
    let magic: [u8; 4] = read_array(&mut file, 0).map_err(io_err)?;

    if magic[..2] == *b"MZ" {
        let pe_offset = u32::from_le_bytes(read_array(&mut file, PE_POINTER_OFFSET).map_err(io_err)?);
        let signature: [u8; 4] = read_array(&mut file, u64::from(pe_offset)).map_err(io_err)?;
        if signature != *b"PE\0\0" {
            return Err(unknown());
        }
        // The optional header follows the 4 byte signature and the 20 byte
        // file header.
        let optional = u16::from_le_bytes(read_array(&mut file, u64::from(pe_offset) + 24).map_err(io_err)?);
        return match optional {
            PE32_MAGIC => Ok(WordSize::Bits32),
            PE32_PLUS_MAGIC => Ok(WordSize::Bits64),
            _ => Err(unknown()),
        };
    }

    if magic == ELF_MAGIC {
        let [class]: [u8; 1] = read_array(&mut file, 4).map_err(io_err)?;
        return match class {
            1 => Ok(WordSize::Bits32),
            2 => Ok(WordSize::Bits64),
            _ => Err(unknown()),
        };
    }

    match u32::from_le_bytes(magic) {
        MACHO_32_MAGIC => Ok(WordSize::Bits32),
        MACHO_64_MAGIC => Ok(WordSize::Bits64),
        _ => Err(unknown()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    pub(crate) fn write_elf(size: WordSize) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        let class = match size {
            WordSize::Bits32 => 1,
            WordSize::Bits64 => 2,
        };
        let mut header = vec![0x7f, b'E', b'L', b'F', class, 1, 1];
        header.resize(64, 0);
        file.write_all(&header).expect("write");
        file
    }

    fn write_pe(optional_magic: u16) -> NamedTempFile {
        let mut image = vec![0u8; 0x200];
        image[..2].copy_from_slice(b"MZ");
        image[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());
        image[0x80..0x84].copy_from_slice(b"PE\0\0");
        image[0x98..0x9a].copy_from_slice(&optional_magic.to_le_bytes());
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&image).expect("write");
        file
    }

    #[test]
    fn detects_pe_word_size() {
        assert_eq!(library_word_size(write_pe(PE32_MAGIC).path()).unwrap(), WordSize::Bits32);
        assert_eq!(library_word_size(write_pe(PE32_PLUS_MAGIC).path()).unwrap(), WordSize::Bits64);
        assert!(matches!(
            library_word_size(write_pe(0x107).path()),
            Err(DatabaseError::UnknownBinary(_))
        ));
    }

    #[test]
    fn detects_elf_word_size() {
        assert_eq!(library_word_size(write_elf(WordSize::Bits32).path()).unwrap(), WordSize::Bits32);
        assert_eq!(library_word_size(write_elf(WordSize::Bits64).path()).unwrap(), WordSize::Bits64);
    }

    #[test]
    fn rejects_other_files() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"#!/bin/sh\necho hi\n").expect("write");
        assert!(matches!(library_word_size(file.path()), Err(DatabaseError::UnknownBinary(_))));
        assert!(matches!(
            library_word_size(Path::new("/nonexistent/lib.so")),
            Err(DatabaseError::Read { .. })
        ));
    }
}
