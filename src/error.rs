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

//! Error types shared by the listing, definition loader and annotation passes.
//!
//! Only conditions that abort an operation live here. Degraded inputs (unknown
//! base address, a table whose scaling is missing, a stale element count) are
//! logged and recorded in the analysis report instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A string that should have been a hexadecimal address was not.
    #[error("invalid hexadecimal address {0:?}")]
    Parse(String),

    /// Strict lookup of an address that is not word aligned.
    #[error("address 0x{0:x} does not fall on an instruction boundary")]
    Alignment(u32),

    /// A comment was aimed at a byte outside the instruction it was attached to.
    #[error("comment address 0x{address:x} is outside the 4-byte instruction at 0x{instruction:x}")]
    Bounds { address: u32, instruction: u32 },

    #[error("no ROM definition found for ROM id {0}")]
    DefinitionMissing(String),

    #[error("failed to read definition {path}: {source}")]
    DefinitionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed definition {path}: {message}")]
    DefinitionXml { path: PathBuf, message: String },

    /// Include chain, root first, ending with the id that closes the loop.
    #[error("include cycle in ROM definitions: {}", .0.join(" -> "))]
    IncludeCycle(Vec<String>),

    #[error("objdump failed: {0}")]
    Objdump(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_message_names_instruction_span() {
        let err = Error::Bounds {
            address: 0x1008,
            instruction: 0x1000,
        };
        assert_eq!(
            err.to_string(),
            "comment address 0x1008 is outside the 4-byte instruction at 0x1000"
        );
    }

    #[test]
    fn include_cycle_lists_chain() {
        let err = Error::IncludeCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.to_string().ends_with("a -> b -> a"));
    }
}
