//! Minimal EXIF reader for JPEG files.
//!
//! Extracts the handful of camera fields the culling view shows:
//! - Make (IFD0 `0x010F`) and Model (IFD0 `0x0110`)
//! - ExposureTime (`0x829A`), FNumber (`0x829D`), ISOSpeedRatings (`0x8827`)
//!   from the Exif sub-IFD pointed to by IFD0 tag `0x8769`
//!
//! Reads the APP1 segment (`"Exif\0\0"` + TIFF structure). Any malformed input
//! yields whatever was parsed so far, never an error.

use super::backend::ExifData;

const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO: u16 = 0x8827;

/// Read EXIF camera fields from in-memory JPEG bytes.
pub fn read_exif(data: &[u8]) -> ExifData {
    match find_jpeg_app1_tiff(data) {
        Some(tiff) => parse_tiff(tiff),
        None => ExifData::default(),
    }
}

// ---------------------------------------------------------------------------
// JPEG: locate the APP1 Exif segment
// ---------------------------------------------------------------------------

/// Return the TIFF block inside the first APP1 Exif segment.
fn find_jpeg_app1_tiff(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // Fill bytes between markers
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS means entropy-coded data follows; EOI ends the stream
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if seg_len < 2 || seg_start > seg_end {
            return None;
        }

        if marker == 0xE1 {
            let segment = &data[seg_start..seg_end];
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return Some(tiff);
            }
        }

        pos += 2 + seg_len;
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF structure
// ---------------------------------------------------------------------------

/// Byte-order-aware view over a TIFF block. Offsets are relative to its start.
struct Tiff<'a> {
    data: &'a [u8],
    big_endian: bool,
}

/// One 12-byte IFD entry.
struct Entry {
    tag: u16,
    typ: u16,
    count: u32,
    /// Absolute position of the 4-byte value/offset field.
    value_pos: usize,
}

impl<'a> Tiff<'a> {
    fn u16_at(&self, offset: usize) -> Option<u16> {
        let b = self.data.get(offset..offset + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let b = self.data.get(offset..offset + 4)?;
        Some(if self.big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    }

    fn entries(&self, ifd_offset: usize) -> Vec<Entry> {
        let Some(count) = self.u16_at(ifd_offset) else {
            return Vec::new();
        };
        (0..count as usize)
            .map_while(|i| {
                let pos = ifd_offset + 2 + i * 12;
                Some(Entry {
                    tag: self.u16_at(pos)?,
                    typ: self.u16_at(pos + 2)?,
                    count: self.u32_at(pos + 4)?,
                    value_pos: pos + 8,
                })
            })
            .collect()
    }

    /// Bytes of an entry's value, inline when they fit in four bytes.
    fn value_bytes(&self, entry: &Entry) -> Option<&'a [u8]> {
        let type_size = match entry.typ {
            1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => 2,         // SHORT, SSHORT
            4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
            5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
            _ => return None,
        };
        let len = (entry.count as usize).checked_mul(type_size)?;
        let start = if len <= 4 {
            entry.value_pos
        } else {
            self.u32_at(entry.value_pos)? as usize
        };
        self.data.get(start..start.checked_add(len)?)
    }

    fn ascii(&self, entry: &Entry) -> Option<String> {
        let bytes = self.value_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    fn unsigned(&self, entry: &Entry) -> Option<u32> {
        match entry.typ {
            3 => self.u16_at(entry.value_pos).map(u32::from),
            4 => self.u32_at(entry.value_pos),
            _ => None,
        }
    }

    fn rational(&self, entry: &Entry) -> Option<f64> {
        if entry.typ != 5 {
            return None;
        }
        let offset = self.u32_at(entry.value_pos)? as usize;
        let num = self.u32_at(offset)?;
        let den = self.u32_at(offset + 4)?;
        (den != 0).then(|| num as f64 / den as f64)
    }
}

fn parse_tiff(data: &[u8]) -> ExifData {
    let mut result = ExifData::default();
    let big_endian = match data.get(0..2) {
        Some(b"MM") => true,
        Some(b"II") => false,
        _ => return result,
    };
    let tiff = Tiff { data, big_endian };

    // Verify TIFF magic (42)
    if tiff.u16_at(2) != Some(42) {
        return result;
    }
    let Some(ifd0) = tiff.u32_at(4) else {
        return result;
    };

    let mut exif_ifd = None;
    for entry in tiff.entries(ifd0 as usize) {
        match entry.tag {
            TAG_MAKE => result.make = tiff.ascii(&entry),
            TAG_MODEL => result.model = tiff.ascii(&entry),
            TAG_EXIF_IFD => exif_ifd = tiff.unsigned(&entry),
            _ => {}
        }
    }

    if let Some(offset) = exif_ifd {
        for entry in tiff.entries(offset as usize) {
            match entry.tag {
                TAG_EXPOSURE_TIME => result.exposure_time = tiff.rational(&entry),
                TAG_F_NUMBER => result.f_number = tiff.rational(&entry),
                TAG_ISO => result.iso = tiff.unsigned(&entry),
                _ => {}
            }
        }
    }

    result
}
