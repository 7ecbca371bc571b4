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

/// The loaded ROM as an ordered list of 32-bit words.
///
/// Words are stored densely from address 0, so the word owning any byte is found
/// by index arithmetic rather than a map lookup. The base address and ROM id are
/// derived once when the listing is built and never change afterwards.
use std::io::Write;
use std::sync::OnceLock;

use regex::Regex;

use crate::address::{self, ROM_ID_OFFSET};
use crate::error::{Error, Result};
use crate::instruction::Instruction;

/// Store r3 to address 0 in a no-op slot; the reset code follows it with the base load.
pub const BASE_IDIOM: &str = "st r3,@r0 || nop";

fn base_load_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ld24 fp,#?(0x[0-9a-fA-F]+)").expect("valid regex"))
}

pub struct RomListing {
    pub lines: Vec<Instruction>,
    base_address: Option<u32>,
    base_load_index: Option<usize>,
    rom_id: Option<String>,
}

impl RomListing {
    pub fn new(lines: Vec<Instruction>) -> Self {
        let mut listing = Self {
            lines,
            base_address: None,
            base_load_index: None,
            rom_id: None,
        };
        if let Some((index, base)) = listing.find_base_address() {
            listing.base_load_index = Some(index);
            listing.base_address = Some(base);
        } else {
            log::warn!("Base address unknown, RAM references will not be resolved");
        }
        listing.rom_id = listing
            .read_bytes(ROM_ID_OFFSET, 4)
            .map(|bytes| bytes.iter().map(|b| format!("{:02x}", b)).collect());
        log::debug!(
            "Listing: {} words, base {:?}, ROM id {:?}",
            listing.lines.len(),
            listing.base_address,
            listing.rom_id
        );
        listing
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Load base of the RAM frame, taken from the reset idiom.
    pub fn base_address(&self) -> Option<u32> {
        self.base_address
    }

    /// Index of the `ld24 fp` word that loads the base address.
    pub fn base_load_index(&self) -> Option<usize> {
        self.base_load_index
    }

    pub fn rom_id(&self) -> Option<&str> {
        self.rom_id.as_deref()
    }

    fn find_base_address(&self) -> Option<(usize, u32)> {
        self.lines.windows(2).enumerate().find_map(|(i, pair)| {
            if pair[0].mnemonic().map(str::trim) != Some(BASE_IDIOM) {
                return None;
            }
            let caps = base_load_re().captures(pair[1].mnemonic()?.trim())?;
            address::to_address(&caps[1]).ok().map(|base| (i + 1, base))
        })
    }

    fn index_of(address: u32) -> usize {
        ((address - address % 4) / 4) as usize
    }

    /// The word containing `address`.
    pub fn instruction_at(&self, address: u32) -> Option<&Instruction> {
        self.lines.get(Self::index_of(address))
    }

    pub fn instruction_at_mut(&mut self, address: u32) -> Option<&mut Instruction> {
        self.lines.get_mut(Self::index_of(address))
    }

    /// Like [`instruction_at`](Self::instruction_at) but `address` must start a word.
    pub fn instruction_at_strict(&self, address: u32) -> Result<Option<&Instruction>> {
        if address % 4 != 0 {
            return Err(Error::Alignment(address));
        }
        Ok(self.instruction_at(address))
    }

    pub fn read_u8(&self, address: u32) -> Option<u8> {
        self.instruction_at(address)
            .map(|instr| instr.bytes[(address % 4) as usize])
    }

    /// Big-endian halfword; may straddle two words.
    pub fn read_u16(&self, address: u32) -> Option<u16> {
        let hi = self.read_u8(address)?;
        let lo = self.read_u8(address.checked_add(1)?)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    pub fn read_bytes(&self, address: u32, count: u32) -> Option<Vec<u8>> {
        (0..count)
            .map(|n| self.read_u8(address.checked_add(n)?))
            .collect()
    }

    /// `base + relative`; `None` while the base is unknown.
    pub fn absolute_address(&self, relative: i64) -> Option<u32> {
        address::resolve_relative(self.base_address?, relative)
    }

    /// Resolve a biased 16-bit pointer read out of a header.
    pub fn from_table_ref(&self, raw: u16) -> Option<u32> {
        address::decode_table_ref(self.base_address?, raw)
    }

    pub fn reset_annotations(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    /// Render the listing: a four line header, then one line per word.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "# ecutools v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(
            w,
            "# Generated assembly, ROM ID {}",
            self.rom_id().unwrap_or("unknown")
        )?;
        match self.base_address {
            Some(base) => writeln!(w, "# Base Address: 0x{:x}", base)?,
            None => writeln!(w, "# Base Address: unknown")?,
        }
        writeln!(w, "#")?;
        for line in &self.lines {
            writeln!(w, "{}", line)?;
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = Vec::with_capacity(self.lines.len() * 40);
        // Writing into a Vec cannot fail
        let _ = self.write(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(index: u32, bytes: [u8; 4], text: &str) -> Instruction {
        Instruction::new(index * 4, bytes, Some(text.to_string()))
    }

    fn listing_with_base() -> RomListing {
        RomListing::new(vec![
            word(0, [0x23, 0x40, 0x70, 0x00], BASE_IDIOM),
            word(1, [0xed, 0x80, 0x80, 0x00], "ld24 fp,0x808000"),
            word(2, [0x12, 0x34, 0x56, 0x78], "add r1,r2 || nop"),
        ])
    }

    #[test]
    fn finds_base_address_after_idiom() {
        let listing = listing_with_base();
        assert_eq!(listing.base_address(), Some(0x808000));
        assert_eq!(listing.base_load_index(), Some(1));
        assert_eq!(listing.absolute_address(-0x100), Some(0x807f00));
        assert_eq!(listing.from_table_ref(0xff00), Some(0x807f00));
    }

    #[test]
    fn base_address_unknown_without_idiom() {
        let listing = RomListing::new(vec![word(0, [0; 4], "ld24 fp,0x808000")]);
        assert_eq!(listing.base_address(), None);
        assert_eq!(listing.absolute_address(4), None);
        assert!(listing.render().contains("# Base Address: unknown"));
    }

    #[test]
    fn reads_across_word_boundaries() {
        let listing = listing_with_base();
        assert_eq!(listing.read_u8(0x9), Some(0x34));
        assert_eq!(listing.read_u16(0x7), Some(0x0012));
        assert_eq!(listing.read_bytes(0x8, 4), Some(vec![0x12, 0x34, 0x56, 0x78]));
        assert_eq!(listing.read_bytes(0xa, 4), None);
    }

    #[test]
    fn strict_lookup_requires_alignment() {
        let listing = listing_with_base();
        assert!(matches!(
            listing.instruction_at_strict(0x5),
            Err(Error::Alignment(0x5))
        ));
        assert_eq!(listing.instruction_at_strict(0x4).unwrap().unwrap().address, 4);
        assert_eq!(listing.instruction_at(0x7).unwrap().address, 4);
    }

    #[test]
    fn rom_id_missing_on_short_images() {
        assert_eq!(listing_with_base().rom_id(), None);
    }

    #[test]
    fn rom_id_is_lowercase_hex_of_four_bytes() {
        let mut lines: Vec<Instruction> = (0..=(ROM_ID_OFFSET / 4 + 1))
            .map(|i| word(i, [0; 4], "nop || nop"))
            .collect();
        // 0x5002a is the second half of word 0x50028
        let at = (ROM_ID_OFFSET / 4) as usize;
        lines[at].bytes[2..].copy_from_slice(&[0x52, 0x68]);
        lines[at + 1].bytes[..2].copy_from_slice(&[0x00, 0x1A]);
        let listing = RomListing::new(lines);
        assert_eq!(listing.rom_id(), Some("5268001a"));
        assert!(listing.render().contains("# Generated assembly, ROM ID 5268001a"));
    }

    #[test]
    fn header_block() {
        let text = listing_with_base().render();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("# ecutools v"));
        assert_eq!(lines[1], "# Generated assembly, ROM ID unknown");
        assert_eq!(lines[2], "# Base Address: 0x808000");
        assert_eq!(lines[3], "#");
        assert_eq!(lines[4], "0x0:\t23 40 70 00\tst r3,@r0 || nop");
    }
}
