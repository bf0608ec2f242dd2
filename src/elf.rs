// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Minimal ELF reader for `DT_NEEDED` entries
//!
//! Only the program headers and the dynamic section are looked at. Both
//! ELF classes and both byte orders are accepted.

use thiserror::Error;

const EI_NIDENT: usize = 16;
const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

const PT_LOAD: u32 = 1;
const PT_DYNAMIC: u32 = 2;

const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRTAB: u64 = 5;

/// Reasons a file cannot be read as ELF
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElfError {
    /// Shorter than the ELF header
    #[error("file too short for an ELF header ({len} bytes)")]
    TooShort {
        /// Actual file length
        len: usize,
    },
    /// Missing `\x7fELF`
    #[error("bad ELF magic")]
    BadMagic,
    /// `EI_CLASS` is neither 32 nor 64 bit
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),
    /// `EI_DATA` is neither little nor big endian
    #[error("unsupported ELF data encoding {0}")]
    UnsupportedEncoding(u8),
    /// A header or table points past the end of the file
    #[error("{what} out of bounds at offset {offset:#x}")]
    OutOfBounds {
        /// Structure being read
        what: &'static str,
        /// File offset of the read
        offset: u64,
    },
    /// `DT_NEEDED` entries without a string table
    #[error("DT_NEEDED present without DT_STRTAB")]
    MissingStrtab,
    /// `DT_STRTAB` is not covered by any loadable segment
    #[error("DT_STRTAB address {0:#x} is not in any PT_LOAD segment")]
    UnmappedStrtab(u64),
    /// A dependency name is not valid UTF-8
    #[error("dependency name at offset {0:#x} is not valid UTF-8")]
    InvalidName(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Elf32,
    Elf64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    p_type: u32,
    offset: u64,
    vaddr: u64,
    filesz: u64,
}

struct Reader<'a> {
    bytes: &'a [u8],
    class: Class,
    endian: Endian,
}

impl<'a> Reader<'a> {
    fn slice(&self, offset: u64, len: usize, what: &'static str) -> Result<&'a [u8], ElfError> {
        let oob = ElfError::OutOfBounds { what, offset };
        let start = usize::try_from(offset).map_err(|_| oob.clone())?;
        let end = start.checked_add(len).ok_or_else(|| oob.clone())?;
        self.bytes.get(start..end).ok_or(oob)
    }

    fn u16(&self, offset: u64, what: &'static str) -> Result<u16, ElfError> {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(self.slice(offset, 2, what)?);
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    fn u32(&self, offset: u64, what: &'static str) -> Result<u32, ElfError> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.slice(offset, 4, what)?);
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    fn u64(&self, offset: u64, what: &'static str) -> Result<u64, ElfError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.slice(offset, 8, what)?);
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(raw),
            Endian::Big => u64::from_be_bytes(raw),
        })
    }

    /// Address, offset or size field: 4 bytes in ELF32, 8 in ELF64
    fn word(&self, offset: u64, what: &'static str) -> Result<u64, ElfError> {
        match self.class {
            Class::Elf32 => self.u32(offset, what).map(u64::from),
            Class::Elf64 => self.u64(offset, what),
        }
    }

    fn word_size(&self) -> u64 {
        match self.class {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }

    fn cstr(&self, offset: u64) -> Result<String, ElfError> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&s| s < self.bytes.len())
            .ok_or(ElfError::OutOfBounds { what: "string", offset })?;
        let tail = &self.bytes[start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::OutOfBounds { what: "string", offset })?;
        std::str::from_utf8(&tail[..len])
            .map(str::to_string)
            .map_err(|_| ElfError::InvalidName(offset))
    }

    fn segments(&self) -> Result<Vec<Segment>, ElfError> {
        let (phoff, phentsize, phnum) = match self.class {
            Class::Elf32 => (
                self.word(28, "e_phoff")?,
                self.u16(42, "e_phentsize")?,
                self.u16(44, "e_phnum")?,
            ),
            Class::Elf64 => (
                self.word(32, "e_phoff")?,
                self.u16(54, "e_phentsize")?,
                self.u16(56, "e_phnum")?,
            ),
        };

        let mut segments = Vec::with_capacity(usize::from(phnum));
        for i in 0..u64::from(phnum) {
            let at = i
                .checked_mul(u64::from(phentsize))
                .and_then(|rel| phoff.checked_add(rel))
                .ok_or(ElfError::OutOfBounds {
                    what: "program header",
                    offset: phoff,
                })?;

            let segment = match self.class {
                Class::Elf32 => Segment {
                    p_type: self.u32(at, "p_type")?,
                    offset: self.word(at.saturating_add(4), "p_offset")?,
                    vaddr: self.word(at.saturating_add(8), "p_vaddr")?,
                    filesz: self.word(at.saturating_add(16), "p_filesz")?,
                },
                Class::Elf64 => Segment {
                    p_type: self.u32(at, "p_type")?,
                    offset: self.word(at.saturating_add(8), "p_offset")?,
                    vaddr: self.word(at.saturating_add(16), "p_vaddr")?,
                    filesz: self.word(at.saturating_add(32), "p_filesz")?,
                },
            };
            segments.push(segment);
        }

        Ok(segments)
    }
}

fn vaddr_to_offset(segments: &[Segment], addr: u64) -> Option<u64> {
    segments
        .iter()
        .filter(|s| s.p_type == PT_LOAD)
        .find(|s| addr >= s.vaddr && addr - s.vaddr < s.filesz)
        .map(|s| s.offset.saturating_add(addr - s.vaddr))
}

/// Read the `DT_NEEDED` names of an ELF image, in dynamic-section order.
///
/// An object without a `PT_DYNAMIC` segment has no dependencies.
///
/// # Errors
///
/// Returns an [`ElfError`] when the image is truncated or malformed.
pub fn parse_needed(bytes: &[u8]) -> Result<Vec<String>, ElfError> {
    if bytes.len() < EI_NIDENT {
        return Err(ElfError::TooShort { len: bytes.len() });
    }
    if bytes[..4] != ELF_MAGIC {
        return Err(ElfError::BadMagic);
    }

    let class = match bytes[4] {
        ELFCLASS32 => Class::Elf32,
        ELFCLASS64 => Class::Elf64,
        other => return Err(ElfError::UnsupportedClass(other)),
    };
    let endian = match bytes[5] {
        ELFDATA2LSB => Endian::Little,
        ELFDATA2MSB => Endian::Big,
        other => return Err(ElfError::UnsupportedEncoding(other)),
    };

    let ehsize = match class {
        Class::Elf32 => 52,
        Class::Elf64 => 64,
    };
    if bytes.len() < ehsize {
        return Err(ElfError::TooShort { len: bytes.len() });
    }

    let reader = Reader {
        bytes,
        class,
        endian,
    };
    let segments = reader.segments()?;

    let Some(dynamic) = segments.iter().find(|s| s.p_type == PT_DYNAMIC) else {
        return Ok(Vec::new());
    };

    let entry_size = reader.word_size() * 2;
    let mut needed_offsets = Vec::new();
    let mut strtab = None;

    for i in 0..dynamic.filesz / entry_size {
        let at = dynamic.offset.saturating_add(i * entry_size);
        let tag = reader.word(at, "d_tag")?;
        let val = reader.word(at.saturating_add(reader.word_size()), "d_val")?;
        match tag {
            DT_NULL => break,
            DT_NEEDED => needed_offsets.push(val),
            DT_STRTAB => strtab = Some(val),
            _ => {}
        }
    }

    if needed_offsets.is_empty() {
        return Ok(Vec::new());
    }

    let strtab = strtab.ok_or(ElfError::MissingStrtab)?;
    let strtab_offset =
        vaddr_to_offset(&segments, strtab).ok_or(ElfError::UnmappedStrtab(strtab))?;

    needed_offsets
        .into_iter()
        .map(|off| reader.cstr(strtab_offset.saturating_add(off)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const BASE: u64 = 0x1000;

    struct Image {
        bytes: Vec<u8>,
        big_endian: bool,
    }

    impl Image {
        fn put(&mut self, at: usize, val: u64, width: usize) {
            let raw = if self.big_endian {
                val.to_be_bytes()[8 - width..].to_vec()
            } else {
                val.to_le_bytes()[..width].to_vec()
            };
            self.bytes[at..at + width].copy_from_slice(&raw);
        }
    }

    /// Build a tiny shared object with one PT_LOAD and one PT_DYNAMIC
    pub(crate) fn build_elf(needed: &[&str], is64: bool, big_endian: bool) -> Vec<u8> {
        let (ehsize, phentsize, word) = if is64 { (64, 56, 8) } else { (52, 32, 4) };
        let dynsize = word * 2;
        let phoff = ehsize;
        let dyn_off = phoff + 2 * phentsize;
        let dyn_count = needed.len() + 2;
        let str_off = dyn_off + dyn_count * dynsize;

        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for name in needed {
            name_offsets.push(strtab.len());
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
        }
        let total = str_off + strtab.len();

        let mut img = Image {
            bytes: vec![0; total],
            big_endian,
        };
        img.bytes[..4].copy_from_slice(&ELF_MAGIC);
        img.bytes[4] = if is64 { ELFCLASS64 } else { ELFCLASS32 };
        img.bytes[5] = if big_endian { ELFDATA2MSB } else { ELFDATA2LSB };
        img.bytes[6] = 1;

        if is64 {
            img.put(32, phoff as u64, 8);
            img.put(54, phentsize as u64, 2);
            img.put(56, 2, 2);
        } else {
            img.put(28, phoff as u64, 4);
            img.put(42, phentsize as u64, 2);
            img.put(44, 2, 2);
        }

        let segments = [
            (u64::from(PT_LOAD), 0, BASE, total),
            (u64::from(PT_DYNAMIC), dyn_off, BASE + dyn_off as u64, dyn_count * dynsize),
        ];
        for (i, (p_type, offset, vaddr, filesz)) in segments.into_iter().enumerate() {
            let at = phoff + i * phentsize;
            img.put(at, p_type, 4);
            if is64 {
                img.put(at + 8, offset as u64, 8);
                img.put(at + 16, vaddr, 8);
                img.put(at + 32, filesz as u64, 8);
            } else {
                img.put(at + 4, offset as u64, 4);
                img.put(at + 8, vaddr, 4);
                img.put(at + 16, filesz as u64, 4);
            }
        }

        for (i, name_off) in name_offsets.iter().enumerate() {
            let at = dyn_off + i * dynsize;
            img.put(at, DT_NEEDED, word);
            img.put(at + word, *name_off as u64, word);
        }
        let at = dyn_off + needed.len() * dynsize;
        img.put(at, DT_STRTAB, word);
        img.put(at + word, BASE + str_off as u64, word);

        img.bytes[str_off..].copy_from_slice(&strtab);
        img.bytes
    }

    #[test]
    fn test_elf64_little_endian() {
        let image = build_elf(&["libfoo.so", "libbar.so.1"], true, false);

        let needed = parse_needed(&image).unwrap();

        assert_eq!(needed, ["libfoo.so", "libbar.so.1"]);
    }

    #[test]
    fn test_elf32_big_endian() {
        let image = build_elf(&["libc.so.6"], false, true);

        assert_eq!(parse_needed(&image).unwrap(), ["libc.so.6"]);
    }

    #[test]
    fn test_no_needed_entries() {
        let image = build_elf(&[], true, false);

        assert!(parse_needed(&image).unwrap().is_empty());
    }

    #[test]
    fn test_no_dynamic_segment_means_static() {
        let mut image = build_elf(&["libfoo.so"], true, false);
        // Second program header becomes PT_NULL
        image[64 + 56..64 + 56 + 4].copy_from_slice(&0u32.to_le_bytes());

        assert!(parse_needed(&image).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_elf() {
        assert_eq!(
            parse_needed(b"not an elf file at all"),
            Err(ElfError::BadMagic)
        );
        assert_eq!(parse_needed(b"\x7fELF"), Err(ElfError::TooShort { len: 4 }));
    }

    #[test]
    fn test_rejects_unknown_class() {
        let mut image = build_elf(&[], true, false);
        image[4] = 9;

        assert_eq!(parse_needed(&image), Err(ElfError::UnsupportedClass(9)));
    }

    #[test]
    fn test_truncated_dynamic_section() {
        let image = build_elf(&["libfoo.so"], true, false);
        let truncated = &image[..64 + 2 * 56 + 4];

        assert!(matches!(
            parse_needed(truncated),
            Err(ElfError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_unmapped_string_table() {
        let mut image = build_elf(&["libfoo.so"], true, false);
        // Move the PT_LOAD segment far away from DT_STRTAB
        image[64 + 16..64 + 24].copy_from_slice(&0x9000_0000u64.to_le_bytes());

        assert!(matches!(
            parse_needed(&image),
            Err(ElfError::UnmappedStrtab(_))
        ));
    }
}
