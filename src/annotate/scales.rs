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

use super::{Annotator, AxisEntry, ScaleEntry};
use crate::address::is_ram;
use crate::definitions::Table;
use crate::error::Result;
use crate::headers::{decode_scale_header, SCALE_HEADER_SIZE};

/// Distances from a scale's data back to the address code uses to reach it.
/// Compiled layouts put the pointer either at the entry count (2) or at the
/// start of the header (6); both are empirically derived.
pub const SCALE_REGISTRATION_OFFSETS: [u32; 2] = [2, SCALE_HEADER_SIZE];

impl Annotator<'_> {
    /// Pass 1: every axis with an address in ROM.
    pub fn annotate_scales(&mut self) -> Result<()> {
        let definition = self.definition;
        for table in &definition.tables {
            for axis in &table.axes {
                let Some(address) = axis.address else {
                    continue;
                };
                if is_ram(address) {
                    continue;
                }
                self.annotate_scale(table, axis, address)?;
            }
        }
        Ok(())
    }

    fn annotate_scale(&mut self, table: &Table, axis: &Table, address: u32) -> Result<()> {
        let definition = self.definition;
        let Some(scaling) = axis.scaling.as_deref().and_then(|s| definition.scaling(s)) else {
            self.warn(format!(
                "Scaling {:?} for scale {} of {} not found, skipping",
                axis.scaling.as_deref().unwrap_or(""),
                axis.name,
                table.name
            ));
            return Ok(());
        };
        let Some(element_size) = scaling.element_size() else {
            self.warn(format!(
                "Scaling {} has unknown storage type {:?}, skipping scale {}",
                scaling.name, scaling.storage_type, axis.name
            ));
            return Ok(());
        };
        let Some(elements) = axis.elements else {
            self.warn(format!(
                "Scale {} of {} has no element count, skipping",
                axis.name, table.name
            ));
            return Ok(());
        };
        let Some(bytes) = element_size.checked_mul(elements) else {
            self.warn(format!(
                "Scale {} of {} has {} elements, more than the address space holds, skipping",
                axis.name, table.name, elements
            ));
            return Ok(());
        };

        let header = address
            .checked_sub(SCALE_HEADER_SIZE)
            .and_then(|at| decode_scale_header(self.listing, at).header());
        if let Some(header) = header {
            if u32::from(header.entries) != elements {
                self.warn(format!(
                    "Scale {} at 0x{:x}: header says {} entries, definition says {}; using {}",
                    axis.name, address, header.entries, elements, elements
                ));
            }
            self.index.record_axis(
                header.dest,
                AxisEntry {
                    elements,
                    scale_address: address,
                    scaling: Some(scaling.name.clone()),
                },
            );
        }

        let entry = ScaleEntry {
            label: format!("{} ({})", axis.name, table.name),
            name: axis.name.clone(),
            scaling: Some(scaling.name.clone()),
        };
        for offset in SCALE_REGISTRATION_OFFSETS {
            if let Some(at) = address.checked_sub(offset) {
                self.index.register_scale(at, entry.clone());
            }
        }

        self.mark_data(address, bytes);
        let mut text = format!("scale {}: {} elements", axis.name, elements);
        if let Some(header) = header {
            text.push_str(&format!(
                ", from {} to {}",
                self.enrichment.describe_ram(header.src),
                self.enrichment.describe_ram(header.dest)
            ));
        }
        self.comment(address, text)
    }
}
