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

//! Address arithmetic for the ROM image.
//!
//! The controller addresses its RAM relative to a frame-pointer base loaded at
//! reset. Code reaches globals with signed offsets from that base, and data
//! structures in ROM point at RAM with 16-bit values biased by `TABLE_REF_BIAS`.

use crate::error::{Error, Result};

/// Bias subtracted from every 16-bit pointer stored in a table or scale header.
pub const TABLE_REF_BIAS: i64 = 0x10000;

/// First address that belongs to live RAM rather than the ROM image.
pub const RAM_START: u32 = 0x80_0000;

/// Plausible RAM band for header pointers (0x80xxxx and 0x81xxxx).
pub const RAM_BAND_START: u32 = 0x80_0000;
pub const RAM_BAND_END: u32 = 0x82_0000;

/// Offset of the 4 ROM id bytes in the image.
pub const ROM_ID_OFFSET: u32 = 0x5002a;

/// Anything that can name an address: hex strings (with or without `0x`) or integers.
pub trait ToAddress {
    fn to_address(&self) -> Result<u32>;
}

impl ToAddress for str {
    fn to_address(&self) -> Result<u32> {
        let trimmed = self.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        // from_str_radix takes a sign, addresses never carry one
        if !digits.starts_with(|c: char| c.is_ascii_hexdigit()) {
            return Err(Error::Parse(self.to_string()));
        }
        u32::from_str_radix(digits, 16).map_err(|_| Error::Parse(self.to_string()))
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Result<u32> {
        self.as_str().to_address()
    }
}

impl ToAddress for u32 {
    fn to_address(&self) -> Result<u32> {
        Ok(*self)
    }
}

impl ToAddress for u64 {
    fn to_address(&self) -> Result<u32> {
        u32::try_from(*self).map_err(|_| Error::Parse(format!("{:x}", self)))
    }
}

impl ToAddress for usize {
    fn to_address(&self) -> Result<u32> {
        u32::try_from(*self).map_err(|_| Error::Parse(format!("{:x}", self)))
    }
}

impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Result<u32> {
        (**self).to_address()
    }
}

pub fn to_address<A: ToAddress + ?Sized>(value: &A) -> Result<u32> {
    value.to_address()
}

/// Lowercase hex without a prefix, the key format of the description documents.
pub fn to_address_string(address: u32) -> String {
    format!("{:x}", address)
}

/// `base + relative`, or `None` when the result leaves the 32-bit space.
pub fn resolve_relative(base: u32, relative: i64) -> Option<u32> {
    u32::try_from(i64::from(base) + relative).ok()
}

/// Decode a biased 16-bit pointer into an absolute address.
pub fn decode_table_ref(base: u32, raw: u16) -> Option<u32> {
    resolve_relative(base, i64::from(raw) - TABLE_REF_BIAS)
}

/// Inverse of [`decode_table_ref`]; `None` when the address is out of pointer reach.
pub fn encode_table_ref(base: u32, absolute: u32) -> Option<u16> {
    let relative = i64::from(absolute) - i64::from(base);
    u16::try_from(relative + TABLE_REF_BIAS).ok()
}

pub fn in_ram_band(address: u32) -> bool {
    (RAM_BAND_START..RAM_BAND_END).contains(&address)
}

pub fn is_ram(address: u32) -> bool {
    address >= RAM_START
}

/// Parse an operand offset as printed by objdump: signed decimal or `0x` hex.
pub fn parse_signed_offset(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = match body.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => body.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}
