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

//! Synthetic ROM images for integration tests.

#![allow(dead_code)]

use ecutools::listing::BASE_IDIOM;
use ecutools::xml::Node;
use ecutools::{Instruction, RomDefinition, RomListing};

pub const FILLER: &str = "nop || nop";

pub struct RomBuilder {
    words: Vec<([u8; 4], Option<String>)>,
}

impl RomBuilder {
    /// `count` zero words of filler code.
    pub fn new(count: usize) -> Self {
        Self {
            words: vec![([0; 4], Some(FILLER.to_string())); count],
        }
    }

    /// The reset idiom at `word` and `word + 1`, loading `base` into fp.
    pub fn base(self, word: usize, base: u32) -> Self {
        self.code(word, BASE_IDIOM)
            .code(word + 1, &format!("ld24 fp,0x{:x}", base))
    }

    pub fn code(mut self, word: usize, text: &str) -> Self {
        self.words[word].1 = Some(text.to_string());
        self
    }

    /// Overwrite the bytes starting at byte `address`.
    pub fn poke(mut self, address: u32, bytes: &[u8]) -> Self {
        for (n, byte) in bytes.iter().enumerate() {
            let at = address as usize + n;
            self.words[at / 4].0[at % 4] = *byte;
        }
        self
    }

    pub fn build(self) -> RomListing {
        let lines = self
            .words
            .into_iter()
            .enumerate()
            .map(|(i, (bytes, text))| Instruction::new((i * 4) as u32, bytes, text))
            .collect();
        RomListing::new(lines)
    }
}

/// Big-endian table-ref encoding of `absolute` against `base`.
pub fn table_ref(base: u32, absolute: u32) -> [u8; 2] {
    ecutools::address::encode_table_ref(base, absolute)
        .expect("address reachable from base")
        .to_be_bytes()
}

/// Scale header bytes: dest, src, entries.
pub fn scale_header(base: u32, dest: u32, src: u32, entries: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(table_ref(base, dest));
    bytes.extend(table_ref(base, src));
    bytes.extend(entries.to_be_bytes());
    bytes
}

pub fn definition(xml: &str) -> RomDefinition {
    RomDefinition::from_node(&Node::parse(xml).expect("valid test document"))
}

/// Comments on the word owning `address`.
pub fn comments_at(listing: &RomListing, address: u32) -> Vec<String> {
    listing
        .instruction_at(address)
        .map(|line| line.comments().map(str::to_string).collect())
        .unwrap_or_default()
}
