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

/// What a frame-relative memory instruction does to its RAM operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    LoadWord,
    LoadHalfword,
    LoadUnsignedHalfword,
    LoadByte,
    LoadUnsignedByte,
    StoreWord,
    StoreHalfword,
    StoreByte,
    SetBit,
    ClearBit,
    TestBit,
    Unknown,
}

impl MemoryOp {
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        match mnemonic {
            "ld" => MemoryOp::LoadWord,
            "ldh" => MemoryOp::LoadHalfword,
            "lduh" => MemoryOp::LoadUnsignedHalfword,
            "ldb" => MemoryOp::LoadByte,
            "ldub" => MemoryOp::LoadUnsignedByte,
            "st" => MemoryOp::StoreWord,
            "sth" => MemoryOp::StoreHalfword,
            "stb" => MemoryOp::StoreByte,
            "bset" => MemoryOp::SetBit,
            "bclr" => MemoryOp::ClearBit,
            "btst" => MemoryOp::TestBit,
            _ => MemoryOp::Unknown,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            MemoryOp::LoadWord => "load word",
            MemoryOp::LoadHalfword => "load halfword",
            MemoryOp::LoadUnsignedHalfword => "load unsigned halfword",
            MemoryOp::LoadByte => "load byte",
            MemoryOp::LoadUnsignedByte => "load unsigned byte",
            MemoryOp::StoreWord => "store word",
            MemoryOp::StoreHalfword => "store halfword",
            MemoryOp::StoreByte => "store byte",
            MemoryOp::SetBit => "set bit",
            MemoryOp::ClearBit => "clear bit",
            MemoryOp::TestBit => "test bit",
            MemoryOp::Unknown => "unknown op",
        }
    }
}

impl fmt::Display for MemoryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// An instruction that puts an absolute RAM address into a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamLoadOp {
    AssignPointer,
    Unknown,
}

impl RamLoadOp {
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        match mnemonic {
            "ld24" => RamLoadOp::AssignPointer,
            _ => RamLoadOp::Unknown,
        }
    }
}

impl fmt::Display for RamLoadOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RamLoadOp::AssignPointer => f.write_str("pointer to"),
            RamLoadOp::Unknown => f.write_str("unknown op on"),
        }
    }
}

/// Split a word's text into its instructions with their byte offsets.
///
/// Two 16-bit instructions share a word and print as `a || b` (parallel) or
/// `a -> b` (sequential); the second one sits at byte offset 2.
pub fn segments(text: &str) -> Vec<(u32, &str)> {
    let split = ["||", "->"]
        .iter()
        .filter_map(|sep| text.find(sep).map(|at| (at, sep.len())))
        .min();
    match split {
        Some((at, len)) => vec![(0, text[..at].trim()), (2, text[at + len..].trim())],
        None => vec![(0, text.trim())],
    }
}
