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

use std::sync::OnceLock;

use regex::Regex;

use super::ops::{segments, MemoryOp, RamLoadOp};
use super::Annotator;
use crate::address::parse_signed_offset;
use crate::error::Result;

fn return_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^jmp\s+lr$").expect("valid regex"))
}

fn call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^bl\s+(?:0x)?([0-9a-fA-F]+)\b").expect("valid regex"))
}

fn hex_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"0x([0-9a-fA-F]+)").expect("valid regex"))
}

fn ram_load_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)\s+\w+,#?0x(8[0-9a-fA-F]{5})\b").expect("valid regex")
    })
}

fn frame_relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\w+)\s+(?:[^@]*?,)?@\((-?(?:0x)?[0-9a-fA-F]+),fp\)").expect("valid regex")
    })
}

fn discovery_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ld24\s+r0,#?0x([0-9a-fA-F]+)$").expect("valid regex"))
}

fn hex(text: &str) -> Option<u32> {
    u32::from_str_radix(text, 16).ok()
}

impl Annotator<'_> {
    /// Pass 3: one scan over every word of the listing.
    pub fn annotate_code(&mut self) -> Result<()> {
        let enrichment = self.enrichment;
        for index in 0..self.listing.len() {
            let (address, text) = {
                let line = &self.listing.lines[index];
                (line.address, line.mnemonic().map(str::to_string))
            };

            if let Some(name) = enrichment.subroutine_name(address) {
                self.comment(address, format!("begin subroutine {}", name))?;
            }
            if self.listing.base_load_index() == Some(index) {
                if let Some(base) = self.listing.base_address() {
                    self.comment(address, format!("assign base address 0x{:x}", base))?;
                    continue;
                }
            }
            let Some(text) = text else {
                continue;
            };

            for (offset, instruction) in segments(&text) {
                self.annotate_instruction(index, address + offset, instruction)?;
            }
        }
        Ok(())
    }

    fn annotate_instruction(&mut self, index: usize, at: u32, text: &str) -> Result<()> {
        let enrichment = self.enrichment;

        if return_re().is_match(text) {
            self.comment(at, "return")?;
            if let Some(next) = self.listing.lines.get(index + 1).map(|line| line.address) {
                self.comment(next, "likely subroutine address")?;
            }
        }

        if let Some(caps) = call_re().captures(text) {
            if let Some(name) = hex(&caps[1]).and_then(|t| enrichment.subroutine_name(t)) {
                self.comment(at, format!("call {}", name))?;
            }
        }

        for caps in hex_literal_re().captures_iter(text) {
            let Some(literal) = hex(&caps[1]) else {
                continue;
            };
            if let Some(label) = self.index.table_label(literal).map(str::to_string) {
                self.comment(at, format!("get table {}", label))?;
                self.report.found.insert(label);
            } else if let Some(label) = self.index.scale(literal).map(|s| s.label.clone()) {
                self.comment(at, format!("get scale {}", label))?;
                self.report.found.insert(label);
            }
        }

        if let Some(caps) = ram_load_re().captures(text) {
            if let Some(ram) = hex(&caps[2]) {
                let op = RamLoadOp::from_mnemonic(&caps[1]);
                self.comment(at, format!("{} {}", op, enrichment.describe_ram(ram)))?;
            }
        }

        if let Some(caps) = frame_relative_re().captures(text) {
            let op = MemoryOp::from_mnemonic(&caps[1]);
            let target = parse_signed_offset(&caps[2])
                .and_then(|offset| self.listing.absolute_address(offset));
            let text = match target {
                Some(ram) => format!("{} {}", op, enrichment.describe_ram(ram)),
                None => format!("{} unknown", op),
            };
            self.comment(at, text)?;
        }

        if let Some(caps) = discovery_re().captures(text) {
            if let Some(candidate) = hex(&caps[1]) {
                if candidate > self.options.discovery_threshold {
                    self.discover(index, at, candidate)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_relative_operands() {
        let caps = frame_relative_re().captures("lduh r4,@(-0x7ee0,fp)").unwrap();
        assert_eq!(&caps[1], "lduh");
        assert_eq!(&caps[2], "-0x7ee0");

        let caps = frame_relative_re().captures("bclr #3,@(0x1c,fp)").unwrap();
        assert_eq!(&caps[1], "bclr");
        assert_eq!(&caps[2], "0x1c");

        assert!(frame_relative_re().captures("ld r4,@(0x10,r5)").is_none());
    }

    #[test]
    fn ram_loads_and_discovery_candidates() {
        let caps = ram_load_re().captures("ld24 r4,0x804a10").unwrap();
        assert_eq!(&caps[1], "ld24");
        assert_eq!(&caps[2], "804a10");
        assert!(ram_load_re().is_match("ld24 r4,#0x804a10"));
        assert!(!ram_load_re().is_match("ld24 r4,0x5a2c0"));

        let caps = discovery_re().captures("ld24 r0,0x5a2c0").unwrap();
        assert_eq!(&caps[1], "5a2c0");
        assert!(!discovery_re().is_match("ld24 r1,0x5a2c0"));
    }

    #[test]
    fn returns_and_calls() {
        assert!(return_re().is_match("jmp lr"));
        assert!(!return_re().is_match("jmp r14"));
        assert_eq!(&call_re().captures("bl 0x1a2b4").unwrap()[1], "1a2b4");
        assert_eq!(&call_re().captures("bl 1a2b4 <foo>").unwrap()[1], "1a2b4");
    }
}
