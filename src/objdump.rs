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

/// We use a binutils objdump built with M32R support to decode the ROM. This
/// module runs it over the raw image and turns its text output into one
/// [`Instruction`] per 32-bit word.
///
/// objdump is asked to disassemble everything (including zero fill) as big
/// endian, so every word of the image shows up as exactly one output line:
///
/// ```text
///    5002c:	1f ce f0 00 	jmp lr || nop
/// ```
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

use regex::Regex;

use crate::error::{Error, Result};
use crate::instruction::Instruction;

const HEX_BYTE: &str = "([0-9a-fA-F]{2})";

fn line_re() -> Regex {
    Regex::new(&format!(
        r"^\s*([0-9a-fA-F]+):\s+{b} {b} {b} {b}\s+(.+?)\s*$",
        b = HEX_BYTE
    ))
    .expect("valid regex")
}

/// Parse objdump output into words, skipping banners, section headers and blanks.
pub fn parse_objdump<R: BufRead>(reader: R) -> Result<Vec<Instruction>> {
    let re = line_re();
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let Some(caps) = re.captures(&line) else {
            continue;
        };
        let Ok(address) = u32::from_str_radix(&caps[1], 16) else {
            log::debug!("Skipping objdump line with oversized address: {}", line);
            continue;
        };
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            // Two hex digits always fit in a u8
            *byte = u8::from_str_radix(&caps[i + 2], 16).unwrap_or_default();
        }
        lines.push(Instruction::new(address, bytes, Some(caps[6].to_string())));
    }
    Ok(lines)
}

/// Run `objdump` over the raw ROM image at `rom` and parse the result.
pub fn disassemble(objdump: &str, rom: &Path) -> Result<Vec<Instruction>> {
    let now = Instant::now();
    // Spawn objdump and stream its stdout to avoid holding the whole output
    let mut child = Command::new(objdump)
        .args([
            "-b",
            "binary",
            "--architecture=m32r",
            "--disassemble-all",
            "--disassemble-zeroes",
            "-EB",
        ])
        .arg(rom)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Objdump(format!("failed to start {}: {}", objdump, e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Objdump("failed to capture objdump stdout".to_string()))?;
    let parsed = parse_objdump(BufReader::with_capacity(64 * 1024, stdout));

    // Reap the child even when its output could not be read
    let status = child.wait()?;
    let lines = parsed?;
    if !status.success() {
        return Err(Error::Objdump(format!("{} exited with {}", objdump, status)));
    }
    log::info!(
        "Disassembly loaded: {} words in {:.2?}",
        lines.len(),
        now.elapsed()
    );
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
rom.bin:     file format binary


Disassembly of section .data:

00000000 <.data>:
       0:	23 40 70 00 	st r3,@r0 || nop
       4:	ed 80 80 00 	ld24 fp,0x808000
       8:	ff ff ff ff 	*unknown*
       c:	1f ce f0 00 	jmp lr || nop
";

    #[test]
    fn parses_word_lines_only() {
        let lines = parse_objdump(SAMPLE.as_bytes()).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].address, 4);
        assert_eq!(lines[1].bytes, [0xed, 0x80, 0x80, 0x00]);
        assert_eq!(lines[1].mnemonic(), Some("ld24 fp,0x808000"));
        assert!(lines[2].is_data());
        assert_eq!(lines[3].mnemonic(), Some("jmp lr || nop"));
    }

    #[test]
    fn missing_objdump_is_reported() {
        let err = disassemble("ecutools-no-such-objdump", Path::new("rom.bin")).unwrap_err();
        assert!(matches!(err, Error::Objdump(_)));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_output_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("objdump");
        // Invalid UTF-8 on stdout, then a clean exit
        std::fs::write(&script, "#!/bin/sh\nprintf '\\377\\n'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = disassemble(script.to_str().unwrap(), Path::new("rom.bin")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{:?}", err);
    }
}
