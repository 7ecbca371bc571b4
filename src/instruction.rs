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

use std::fmt;

use crate::error::{Error, Result};

/// One 32-bit word of the ROM as reported by the disassembler.
///
/// Code words hold two 16-bit instruction slots, so comments go into two lanes
/// (bytes 0-1 and 2-3). Once a word is marked as data every byte gets its own
/// lane and the mnemonic is no longer rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u32,
    pub bytes: [u8; 4],
    mnemonic: Option<String>,
    loaded_as_data: bool,
    data: bool,
    comments: [Option<String>; 4],
}

impl Instruction {
    pub fn new(address: u32, bytes: [u8; 4], mnemonic: Option<String>) -> Self {
        let mnemonic = mnemonic.filter(|m| !m.trim().is_empty());
        // objdump prints "*unknown*" for words it cannot decode
        let data = mnemonic.as_deref().map_or(true, |m| m.contains("unknown"));
        Self {
            address,
            bytes,
            mnemonic,
            loaded_as_data: data,
            data,
            comments: Default::default(),
        }
    }

    /// Decoded text, or `None` once the word has been classified as data.
    pub fn mnemonic(&self) -> Option<&str> {
        if self.data {
            None
        } else {
            self.mnemonic.as_deref()
        }
    }

    pub fn is_data(&self) -> bool {
        self.data
    }

    pub fn set_data(&mut self, data: bool) {
        self.data = data;
    }

    /// Drop every annotation and return to the classification made at load time.
    pub fn reset(&mut self) {
        self.data = self.loaded_as_data;
        self.comments = Default::default();
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.address && address - self.address < 4
    }

    /// Attach `text` to the lane that owns `address`.
    ///
    /// Text already present anywhere on this word is not added again.
    pub fn comment(&mut self, address: u32, text: impl Into<String>) -> Result<()> {
        if !self.contains(address) {
            return Err(Error::Bounds {
                address,
                instruction: self.address,
            });
        }
        let text = text.into();
        if self.comments.iter().flatten().any(|c| *c == text) {
            return Ok(());
        }
        let byte_offset = (address - self.address) as usize;
        let lane = if self.data { byte_offset } else { byte_offset / 2 };
        self.comments[lane] = Some(text);
        Ok(())
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().flatten().map(String::as_str)
    }

    pub fn has_comments(&self) -> bool {
        self.comments.iter().any(Option::is_some)
    }

    pub fn format_bytes(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}:\t{}", self.address, self.format_bytes())?;
        if let Some(mnemonic) = self.mnemonic() {
            write!(f, "\t{}", mnemonic)?;
        }
        if self.has_comments() {
            write!(f, "\t; {}", self.comments().collect::<Vec<_>>().join(", "))?;
        }
        Ok(())
    }
}
