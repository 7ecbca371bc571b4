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

mod common;

use common::RomBuilder;
use ecutools::address::{decode_table_ref, encode_table_ref, to_address, to_address_string};
use ecutools::headers::{decode_scale_header, decode_table_header, Decoded, HeaderWidth};
use proptest::prelude::*;

const BASE: u32 = 0x80_8000;
const AT: u32 = 0x10;

proptest! {
    #[test]
    fn hex_round_trip(n in any::<u32>(), prefixed in any::<bool>()) {
        let text = if prefixed { format!("0x{:X}", n) } else { format!("{:x}", n) };
        let address = to_address(&text).unwrap();
        prop_assert_eq!(address, n);
        prop_assert_eq!(to_address(&to_address_string(address)).unwrap(), address);
    }

    #[test]
    fn table_refs_round_trip_for_any_base(base in 0x1_0000u32..0xff00_0000, delta in 0u32..=0xffff) {
        let absolute = base - 0x1_0000 + delta;
        let raw = encode_table_ref(base, absolute);
        prop_assert_eq!(raw, Some(delta as u16));
        prop_assert_eq!(decode_table_ref(base, delta as u16), Some(absolute));
    }

    #[test]
    fn scale_header_decode_is_pure(bytes in prop::array::uniform6(any::<u8>())) {
        let rom = RomBuilder::new(8).base(0, BASE).poke(AT, &bytes).build();
        let first = decode_scale_header(&rom, AT);
        prop_assert_eq!(first, decode_scale_header(&rom, AT));
        let Decoded::Header(header) = first else {
            return Err(TestCaseError::fail("scale headers always decode with a known base"));
        };
        prop_assert_eq!(header.entries, u16::from_be_bytes([bytes[4], bytes[5]]));
    }

    #[test]
    fn byte_table_header_present_iff_tag_is_2_or_3(bytes in prop::array::uniform10(any::<u8>())) {
        let rom = RomBuilder::new(8).base(0, BASE).poke(AT, &bytes).build();
        match decode_table_header(&rom, AT, HeaderWidth::Byte) {
            Decoded::Header(header) => {
                let expected = if bytes[0] == 2 { 4 } else { 7 };
                prop_assert!(bytes[0] == 2 || bytes[0] == 3);
                prop_assert_eq!(header.size(), expected);
            }
            Decoded::Absent => prop_assert!(bytes[0] != 2 && bytes[0] != 3),
            Decoded::Malformed(reason) => prop_assert!(false, "malformed: {}", reason),
        }
    }

    #[test]
    fn word_table_header_present_iff_tag_is_2_or_3(
        tag in prop_oneof![Just(2u16), Just(3u16), any::<u16>()],
        rest in prop::array::uniform8(any::<u8>()),
    ) {
        let mut bytes = tag.to_be_bytes().to_vec();
        bytes.extend(rest);
        let rom = RomBuilder::new(8).base(0, BASE).poke(AT, &bytes).build();
        match decode_table_header(&rom, AT, HeaderWidth::Word) {
            Decoded::Header(header) => {
                let expected = if tag == 2 { 6 } else { 10 };
                prop_assert!(tag == 2 || tag == 3);
                prop_assert_eq!(header.size(), expected);
            }
            Decoded::Absent => prop_assert!(tag != 2 && tag != 3),
            Decoded::Malformed(reason) => prop_assert!(false, "malformed: {}", reason),
        }
    }
}
