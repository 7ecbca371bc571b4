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

//! Annotation of a loaded listing against the ROM definitions.
//!
//! Three passes run in a fixed order:
//!
//! 1. scales: mark known axis scales as data and register the addresses code
//!    uses to reach them, plus the RAM buffers they fill;
//! 2. tables: mark known tables and register their header addresses;
//! 3. code: one scan over the instructions commenting returns, calls, table
//!    loads and RAM accesses, and discovering headers the definitions lack.
//!
//! Discovery of 3D tables checks the row count against the Y axis scale found
//! by the earlier passes, so running the code pass alone finds fewer tables.

mod code;
mod discovery;
pub mod index;
pub mod ops;
mod scales;
mod tables;

use std::collections::BTreeSet;

use crate::definitions::RomDefinition;
use crate::descriptions::Enrichment;
use crate::error::Result;
use crate::listing::RomListing;
use crate::report::AnalysisReport;

pub use index::{AnnotationIndex, AxisEntry, ScaleEntry};

/// Literals loaded into r0 above this address are tried as structure headers.
pub const DISCOVERY_THRESHOLD: u32 = 0x40000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub discovery_threshold: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            discovery_threshold: DISCOVERY_THRESHOLD,
        }
    }
}

/// Result of a full analysis run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub index: AnnotationIndex,
    pub report: AnalysisReport,
}

/// Reset `listing` and run all three passes over it.
///
/// Comments and data flags left by an earlier run are discarded first, so
/// analyzing the same listing twice renders the same text.
pub fn analyze(
    listing: &mut RomListing,
    definition: &RomDefinition,
    enrichment: &Enrichment,
    options: AnalysisOptions,
) -> Result<Analysis> {
    listing.reset_annotations();
    let mut annotator = Annotator::new(listing, definition, enrichment, options);
    annotator.annotate_scales()?;
    annotator.annotate_tables()?;
    annotator.annotate_code()?;
    Ok(annotator.finish())
}

/// Owns the discovery indexes for one run and applies the passes to a listing.
pub struct Annotator<'a> {
    listing: &'a mut RomListing,
    definition: &'a RomDefinition,
    enrichment: &'a Enrichment,
    options: AnalysisOptions,
    index: AnnotationIndex,
    report: AnalysisReport,
}

impl<'a> Annotator<'a> {
    pub fn new(
        listing: &'a mut RomListing,
        definition: &'a RomDefinition,
        enrichment: &'a Enrichment,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            listing,
            definition,
            enrichment,
            options,
            index: AnnotationIndex::new(),
            report: AnalysisReport::default(),
        }
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    pub fn finish(mut self) -> Analysis {
        let registered: BTreeSet<&str> = self
            .index
            .scales()
            .map(|(_, s)| s.label.as_str())
            .chain(self.index.tables().map(|(_, label)| label))
            .collect();
        self.report.unreferenced = registered
            .iter()
            .filter(|label| !self.report.found.contains(**label))
            .map(|label| label.to_string())
            .collect();
        log::info!(
            "Analysis done: {} of {} known labels referenced, {} scales and {} tables discovered",
            registered.len() - self.report.unreferenced.len(),
            registered.len(),
            self.report.discovered_scales.len(),
            self.report.discovered_tables.len()
        );
        Analysis {
            index: self.index,
            report: self.report,
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.report.warnings.push(message);
    }

    /// Comment the byte at `address`; addresses past the end of the ROM are warned about.
    fn comment(&mut self, address: u32, text: impl Into<String>) -> Result<()> {
        match self.listing.instruction_at_mut(address) {
            Some(instr) => instr.comment(address, text),
            None => {
                self.warn(format!(
                    "Cannot comment 0x{:x}, it is past the end of the ROM",
                    address
                ));
                Ok(())
            }
        }
    }

    /// Comment the word at `index` only if nothing has been said about it yet.
    fn comment_if_bare(&mut self, index: usize, address: u32, text: String) -> Result<()> {
        match self.listing.lines.get(index) {
            Some(instr) if !instr.has_comments() => self.comment(address, text),
            _ => Ok(()),
        }
    }

    /// Flag every word overlapping `[start, start + len)` as data.
    fn mark_data(&mut self, start: u32, len: u32) {
        let Some(end) = start.checked_add(len) else {
            self.warn(format!(
                "Data range of 0x{:x} bytes at 0x{:x} overflows the address space",
                len, start
            ));
            return;
        };
        let mut word = start - start % 4;
        while word < end {
            match self.listing.instruction_at_mut(word) {
                Some(instr) => instr.set_data(true),
                None => {
                    self.warn(format!(
                        "Data range 0x{:x}..0x{:x} runs past the end of the ROM",
                        start, end
                    ));
                    return;
                }
            }
            word += 4;
        }
    }
}
