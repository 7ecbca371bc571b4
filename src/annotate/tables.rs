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

use super::Annotator;
use crate::definitions::Table;
use crate::error::Result;
use crate::headers::{decode_table_header, table_header_size, Dimension, HeaderWidth};

/// Extra header distance seen on 8-bit 3D tables whose axis scales are
/// headless. Empirically derived from the firmware revisions on hand.
pub const ODDBALL_BYTE_3D_OFFSET: u32 = 8;

/// Extra header distance seen on tables scaled as MAF readings. Empirically
/// derived like the one above.
pub const MAF_SCALING_OFFSET: u32 = 28;

fn is_maf_scaling(name: &str) -> bool {
    name.to_ascii_lowercase().contains("maf")
}

/// Distances from a table's data back to the addresses code may load.
///
/// Scalar tables are loaded directly. Tables with elements of a width no
/// header layout covers are treated as headless.
pub fn table_header_offsets(
    scalar: bool,
    width: Option<HeaderWidth>,
    dimension: Dimension,
) -> Vec<u32> {
    if scalar {
        return vec![0];
    }
    match width {
        Some(HeaderWidth::Byte) if dimension == Dimension::Three => vec![
            table_header_size(HeaderWidth::Byte, dimension),
            ODDBALL_BYTE_3D_OFFSET,
        ],
        Some(width) => vec![table_header_size(width, dimension)],
        None => vec![0],
    }
}

impl Annotator<'_> {
    /// Pass 2: every table with an address.
    pub fn annotate_tables(&mut self) -> Result<()> {
        let definition = self.definition;
        for table in &definition.tables {
            if let Some(address) = table.address {
                self.annotate_table(table, address)?;
            }
        }
        Ok(())
    }

    fn annotate_table(&mut self, table: &Table, address: u32) -> Result<()> {
        let definition = self.definition;
        let scalar = table.axes.is_empty();

        let mut elements: Option<u32> = Some(1);
        for axis in &table.axes {
            match axis.elements {
                Some(n) => elements = elements.and_then(|e| e.checked_mul(n)),
                None => {
                    self.warn(format!(
                        "Axis {} of table {} has no element count, skipping",
                        axis.name, table.name
                    ));
                    return Ok(());
                }
            }
        }

        let Some(scaling) = table.scaling.as_deref().and_then(|s| definition.scaling(s)) else {
            self.warn(format!(
                "Scaling {:?} for table {} not found, skipping",
                table.scaling.as_deref().unwrap_or(""),
                table.name
            ));
            return Ok(());
        };
        let Some(element_size) = scaling.element_size() else {
            self.warn(format!(
                "Scaling {} has unknown storage type {:?}, skipping table {}",
                scaling.name, scaling.storage_type, table.name
            ));
            return Ok(());
        };

        let dimension = match table.kind.as_deref().and_then(Dimension::from_type) {
            Some(dimension) => dimension,
            // Scalars carry no header, so their type is irrelevant.
            None if scalar => Dimension::Two,
            None => {
                self.warn(format!(
                    "Table {} has unsupported type {:?}, skipping",
                    table.name,
                    table.kind.as_deref().unwrap_or("")
                ));
                return Ok(());
            }
        };

        let bytes = elements
            .and_then(|e| element_size.checked_mul(e))
            .filter(|b| address.checked_add(*b).is_some());
        let (Some(elements), Some(bytes)) = (elements, bytes) else {
            self.warn(format!(
                "Table {} at 0x{:x} extends past the address space, skipping",
                table.name, address
            ));
            return Ok(());
        };

        let width = HeaderWidth::for_element_size(element_size);
        let mut offsets = table_header_offsets(scalar, width, dimension);
        if !scalar && is_maf_scaling(&scaling.name) {
            offsets.push(MAF_SCALING_OFFSET);
        }
        for offset in offsets {
            let Some(at) = address.checked_sub(offset) else {
                continue;
            };
            let label = self.table_label(&table.name, at, offset, width);
            if !self.index.register_table(at, label) {
                log::debug!(
                    "Table {} at 0x{:x} collides with {:?}, keeping the first",
                    table.name,
                    at,
                    self.index.table_label(at)
                );
            }
        }

        if !scalar {
            self.mark_data(address, bytes);
        }
        self.comment(
            address,
            format!(
                "table {}, {} bytes, {} elements",
                table.name, bytes, elements
            ),
        )
    }

    /// `name`, plus the RAM inputs of its axes when a header sits at `at`.
    fn table_label(&self, name: &str, at: u32, offset: u32, width: Option<HeaderWidth>) -> String {
        let header = match width {
            Some(width) if offset > 0 => decode_table_header(self.listing, at, width).header(),
            _ => None,
        };
        let Some(header) = header else {
            return name.to_string();
        };
        let y = self.enrichment.describe_ram(header.y_axis());
        match header.x_axis() {
            Some(x) => format!(
                "{} (y: {}, x: {})",
                name,
                y,
                self.enrichment.describe_ram(x)
            ),
            None => format!("{} (y: {})", name, y),
        }
    }
}
