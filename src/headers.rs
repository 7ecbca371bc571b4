// Copyright (c) 2026 ecutools Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decoders for the headers the compiler places in front of scales and tables.
//!
//! All multi-byte fields are big endian. Pointer fields are table refs and are
//! resolved against the listing's base address; plain counts are not.
//!
//! Scale header (6 bytes):
//!
//! | bytes | field |
//! |-------|-------|
//! | 0-1   | destination pointer |
//! | 2-3   | source pointer |
//! | 4-5   | entry count |
//!
//! Table headers start with a dimension tag (2 or 3, anything else means the
//! table has no header), a value offset and the Y axis pointer; 3D tables add
//! the X axis pointer and a row count. 8-bit tables use byte-wide tag, offset
//! and row count; 16-bit tables use a halfword for every field.

use crate::listing::RomListing;

pub const SCALE_HEADER_SIZE: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderWidth {
    Byte,
    Word,
}

impl HeaderWidth {
    /// Header layout used by tables whose elements are `element_size` bytes wide.
    pub fn for_element_size(element_size: u32) -> Option<Self> {
        match element_size {
            1 => Some(HeaderWidth::Byte),
            2 => Some(HeaderWidth::Word),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            2 => Some(Dimension::Two),
            3 => Some(Dimension::Three),
            _ => None,
        }
    }

    /// Parse the `type` attribute of a table definition ("2D" / "3D").
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind.trim() {
            "2D" => Some(Dimension::Two),
            "3D" => Some(Dimension::Three),
            _ => None,
        }
    }
}

pub const fn table_header_size(width: HeaderWidth, dimension: Dimension) -> u32 {
    match (width, dimension) {
        (HeaderWidth::Byte, Dimension::Two) => 4,
        (HeaderWidth::Byte, Dimension::Three) => 7,
        (HeaderWidth::Word, Dimension::Two) => 6,
        (HeaderWidth::Word, Dimension::Three) => 10,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleHeader {
    pub dest: u32,
    pub src: u32,
    pub entries: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHeader {
    Byte2D {
        value_offset: u8,
        y_axis: u32,
    },
    Byte3D {
        value_offset: u8,
        y_axis: u32,
        x_axis: u32,
        rows: u8,
    },
    Word2D {
        value_offset: u16,
        y_axis: u32,
    },
    Word3D {
        value_offset: u16,
        y_axis: u32,
        x_axis: u32,
        rows: u16,
    },
}

impl TableHeader {
    pub fn width(&self) -> HeaderWidth {
        match self {
            TableHeader::Byte2D { .. } | TableHeader::Byte3D { .. } => HeaderWidth::Byte,
            TableHeader::Word2D { .. } | TableHeader::Word3D { .. } => HeaderWidth::Word,
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            TableHeader::Byte2D { .. } | TableHeader::Word2D { .. } => Dimension::Two,
            TableHeader::Byte3D { .. } | TableHeader::Word3D { .. } => Dimension::Three,
        }
    }

    pub fn size(&self) -> u32 {
        table_header_size(self.width(), self.dimension())
    }

    pub fn y_axis(&self) -> u32 {
        match *self {
            TableHeader::Byte2D { y_axis, .. }
            | TableHeader::Byte3D { y_axis, .. }
            | TableHeader::Word2D { y_axis, .. }
            | TableHeader::Word3D { y_axis, .. } => y_axis,
        }
    }

    pub fn x_axis(&self) -> Option<u32> {
        match *self {
            TableHeader::Byte3D { x_axis, .. } | TableHeader::Word3D { x_axis, .. } => {
                Some(x_axis)
            }
            _ => None,
        }
    }

    pub fn rows(&self) -> Option<u16> {
        match *self {
            TableHeader::Byte3D { rows, .. } => Some(u16::from(rows)),
            TableHeader::Word3D { rows, .. } => Some(rows),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    Scale(ScaleHeader),
    Table(TableHeader),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Scale,
    Table(HeaderWidth),
}

/// Outcome of a decode. `Absent` is the normal result for headless data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<T> {
    Header(T),
    Absent,
    Malformed(&'static str),
}

impl<T> Decoded<T> {
    pub fn header(self) -> Option<T> {
        match self {
            Decoded::Header(h) => Some(h),
            _ => None,
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Header(h) => Decoded::Header(f(h)),
            Decoded::Absent => Decoded::Absent,
            Decoded::Malformed(reason) => Decoded::Malformed(reason),
        }
    }
}

const OUT_OF_RANGE: &str = "header extends past the end of the ROM";
const NO_BASE: &str = "pointer cannot be resolved without a base address";

fn pointer(rom: &RomListing, address: u32) -> Result<u32, &'static str> {
    let raw = rom.read_u16(address).ok_or(OUT_OF_RANGE)?;
    rom.from_table_ref(raw).ok_or(NO_BASE)
}

fn scale_fields(rom: &RomListing, address: u32) -> Result<ScaleHeader, &'static str> {
    let end = address.checked_add(4).ok_or(OUT_OF_RANGE)?;
    Ok(ScaleHeader {
        dest: pointer(rom, address)?,
        src: pointer(rom, address + 2)?,
        entries: rom.read_u16(end).ok_or(OUT_OF_RANGE)?,
    })
}

pub fn decode_scale_header(rom: &RomListing, address: u32) -> Decoded<ScaleHeader> {
    match scale_fields(rom, address) {
        Ok(header) => Decoded::Header(header),
        Err(reason) => Decoded::Malformed(reason),
    }
}

fn byte_table_fields(
    rom: &RomListing,
    address: u32,
    dimension: Dimension,
) -> Result<TableHeader, &'static str> {
    address.checked_add(6).ok_or(OUT_OF_RANGE)?;
    let value_offset = rom.read_u8(address + 1).ok_or(OUT_OF_RANGE)?;
    let y_axis = pointer(rom, address + 2)?;
    Ok(match dimension {
        Dimension::Two => TableHeader::Byte2D {
            value_offset,
            y_axis,
        },
        Dimension::Three => TableHeader::Byte3D {
            value_offset,
            y_axis,
            x_axis: pointer(rom, address + 4)?,
            rows: rom.read_u8(address + 6).ok_or(OUT_OF_RANGE)?,
        },
    })
}

fn word_table_fields(
    rom: &RomListing,
    address: u32,
    dimension: Dimension,
) -> Result<TableHeader, &'static str> {
    address.checked_add(8).ok_or(OUT_OF_RANGE)?;
    let value_offset = rom.read_u16(address + 2).ok_or(OUT_OF_RANGE)?;
    let y_axis = pointer(rom, address + 4)?;
    Ok(match dimension {
        Dimension::Two => TableHeader::Word2D {
            value_offset,
            y_axis,
        },
        Dimension::Three => TableHeader::Word3D {
            value_offset,
            y_axis,
            x_axis: pointer(rom, address + 6)?,
            rows: rom.read_u16(address + 8).ok_or(OUT_OF_RANGE)?,
        },
    })
}

pub fn decode_table_header(
    rom: &RomListing,
    address: u32,
    width: HeaderWidth,
) -> Decoded<TableHeader> {
    let tag = match width {
        HeaderWidth::Byte => rom.read_u8(address).map(u16::from),
        HeaderWidth::Word => rom.read_u16(address),
    };
    let Some(tag) = tag else {
        return Decoded::Malformed(OUT_OF_RANGE);
    };
    let Some(dimension) = Dimension::from_tag(tag) else {
        return Decoded::Absent;
    };
    let fields = match width {
        HeaderWidth::Byte => byte_table_fields(rom, address, dimension),
        HeaderWidth::Word => word_table_fields(rom, address, dimension),
    };
    match fields {
        Ok(header) => Decoded::Header(header),
        Err(reason) => Decoded::Malformed(reason),
    }
}

/// Decode whichever header `kind` names at `address`.
pub fn decode(rom: &RomListing, address: u32, kind: HeaderKind) -> Decoded<Header> {
    match kind {
        HeaderKind::Scale => decode_scale_header(rom, address).map(Header::Scale),
        HeaderKind::Table(width) => decode_table_header(rom, address, width).map(Header::Table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use crate::listing::BASE_IDIOM;

    /// Base 0x808000 followed by `data` starting at 0x10.
    fn rom_with(data: &[u8]) -> RomListing {
        let mut bytes = vec![0u8; 0x10];
        bytes.extend_from_slice(data);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        let lines = bytes
            .chunks(4)
            .enumerate()
            .map(|(i, chunk)| {
                let text = match i {
                    0 => BASE_IDIOM.to_string(),
                    1 => "ld24 fp,0x808000".to_string(),
                    _ => "nop || nop".to_string(),
                };
                Instruction::new(i as u32 * 4, [chunk[0], chunk[1], chunk[2], chunk[3]], Some(text))
            })
            .collect();
        RomListing::new(lines)
    }

    #[test]
    fn scale_header_fields() {
        let rom = rom_with(&[0xff, 0x00, 0xfe, 0x00, 0x00, 0x10]);
        assert_eq!(
            decode_scale_header(&rom, 0x10),
            Decoded::Header(ScaleHeader {
                dest: 0x807f00,
                src: 0x807e00,
                entries: 16
            })
        );
    }

    #[test]
    fn scale_header_past_end_is_malformed() {
        let rom = rom_with(&[0xff, 0x00]);
        assert!(matches!(decode_scale_header(&rom, 0x10), Decoded::Malformed(_)));
    }

    #[test]
    fn byte_tables() {
        let rom = rom_with(&[2, 0x80, 0xff, 0x00]);
        let header = decode_table_header(&rom, 0x10, HeaderWidth::Byte).header().unwrap();
        assert_eq!(
            header,
            TableHeader::Byte2D {
                value_offset: 0x80,
                y_axis: 0x807f00
            }
        );
        assert_eq!(header.size(), 4);

        let rom = rom_with(&[3, 0, 0xff, 0x00, 0xfd, 0x00, 12]);
        let header = decode_table_header(&rom, 0x10, HeaderWidth::Byte).header().unwrap();
        assert_eq!(header.size(), 7);
        assert_eq!(header.x_axis(), Some(0x807d00));
        assert_eq!(header.rows(), Some(12));
    }

    #[test]
    fn word_tables() {
        let rom = rom_with(&[0, 3, 0, 0, 0xff, 0x00, 0xfd, 0x00, 0, 9]);
        let header = decode_table_header(&rom, 0x10, HeaderWidth::Word).header().unwrap();
        assert_eq!(header.dimension(), Dimension::Three);
        assert_eq!(header.size(), 10);
        assert_eq!(header.y_axis(), 0x807f00);
        assert_eq!(header.rows(), Some(9));

        let rom = rom_with(&[0, 2, 0, 1, 0xff, 0x00]);
        let header = decode_table_header(&rom, 0x10, HeaderWidth::Word).header().unwrap();
        assert_eq!(header.size(), 6);
        assert_eq!(header.x_axis(), None);
    }

    #[test]
    fn unknown_tag_is_headless() {
        let rom = rom_with(&[5, 0, 0xff, 0x00]);
        assert_eq!(decode_table_header(&rom, 0x10, HeaderWidth::Byte), Decoded::Absent);
        // A byte tag of 2 is not a word tag of 2
        let rom = rom_with(&[2, 0, 0xff, 0x00, 0, 0]);
        assert_eq!(decode_table_header(&rom, 0x10, HeaderWidth::Word), Decoded::Absent);
    }

    #[test]
    fn decode_dispatches_on_kind() {
        let rom = rom_with(&[0xff, 0x00, 0xfe, 0x00, 0x00, 0x04]);
        assert!(matches!(
            decode(&rom, 0x10, HeaderKind::Scale),
            Decoded::Header(Header::Scale(ScaleHeader { entries: 4, .. }))
        ));
        assert_eq!(decode(&rom, 0x10, HeaderKind::Table(HeaderWidth::Byte)), Decoded::Absent);
    }

    #[test]
    fn pointers_need_a_base() {
        let lines = vec![Instruction::new(0, [0xff, 0x00, 0xfe, 0x00], Some("nop".into()))];
        let rom = RomListing::new(lines);
        assert_eq!(decode_scale_header(&rom, 0), Decoded::Malformed(NO_BASE));
    }
}
