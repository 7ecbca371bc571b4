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

//! Promotion of unlabeled ROM addresses to scales and tables.
//!
//! A candidate is a literal code loads into r0. It is accepted when a header
//! decoded at that address points into live RAM; 3D tables must also agree
//! with the element count of the scale that fills their Y axis.

use super::{Annotator, AxisEntry, ScaleEntry};
use crate::address::{in_ram_band, to_address_string};
use crate::error::Result;
use crate::headers::{
    decode_scale_header, decode_table_header, table_header_size, HeaderWidth, ScaleHeader,
    TableHeader, SCALE_HEADER_SIZE,
};
use crate::report::{DiscoveredScale, DiscoveredTable};

/// Real scales have far fewer breakpoints than this.
pub const MAX_DISCOVERED_SCALE_ENTRIES: u16 = 100;

fn plausible_scale(header: &ScaleHeader) -> bool {
    in_ram_band(header.dest) && in_ram_band(header.src) && header.entries < MAX_DISCOVERED_SCALE_ENTRIES
}

impl Annotator<'_> {
    /// Try `candidate` as a scale header, then as an 8-bit table header.
    pub(super) fn discover(&mut self, index: usize, at: u32, candidate: u32) -> Result<()> {
        if let Some(header) = decode_scale_header(self.listing, candidate).header() {
            if plausible_scale(&header) {
                return self.discover_scale(index, at, candidate, header);
            }
        }
        if let Some(header) = decode_table_header(self.listing, candidate, HeaderWidth::Byte).header() {
            if self.plausible_table(&header) {
                return self.discover_table(index, at, candidate, header);
            }
        }
        Ok(())
    }

    fn plausible_table(&self, header: &TableHeader) -> bool {
        if !in_ram_band(header.y_axis()) {
            return false;
        }
        match (header.x_axis(), header.rows()) {
            (Some(x), Some(rows)) => {
                in_ram_band(x)
                    && self
                        .index
                        .axis(header.y_axis())
                        .is_some_and(|axis| axis.elements == u32::from(rows))
            }
            _ => true,
        }
    }

    fn discover_scale(
        &mut self,
        index: usize,
        at: u32,
        candidate: u32,
        header: ScaleHeader,
    ) -> Result<()> {
        if self.index.scale(candidate).is_some() {
            return Ok(());
        }
        let label = format!("Unknown #{}", self.report.discovered_scales.len() + 1);
        self.index.register_scale(
            candidate,
            ScaleEntry {
                label: label.clone(),
                name: label.clone(),
                scaling: None,
            },
        );
        self.index.record_axis(
            header.dest,
            AxisEntry {
                elements: u32::from(header.entries),
                scale_address: candidate + SCALE_HEADER_SIZE,
                scaling: None,
            },
        );
        log::info!(
            "Discovered scale {} at 0x{:x}: {} entries into {}",
            label,
            candidate,
            header.entries,
            self.enrichment.describe_ram(header.dest)
        );
        self.report.discovered_scales.push(DiscoveredScale {
            label: label.clone(),
            address: candidate,
            dest: header.dest,
            src: header.src,
            entries: header.entries,
        });
        self.report.found.insert(label.clone());
        self.comment_if_bare(index, at, format!("get scale {}", label))
    }

    fn discover_table(
        &mut self,
        index: usize,
        at: u32,
        candidate: u32,
        header: TableHeader,
    ) -> Result<()> {
        if self.index.table_label(candidate).is_some() {
            return Ok(());
        }
        let label = format!("Unknown Table #{}", self.report.discovered_tables.len() + 1);
        self.index.register_table(candidate, label.clone());
        let data_address = candidate + table_header_size(header.width(), header.dimension());
        let fragment = self.table_fragment(&label, data_address, &header);
        log::info!("Discovered table {} at 0x{:x}:\n{}", label, candidate, fragment);
        self.report.discovered_tables.push(DiscoveredTable {
            label: label.clone(),
            address: candidate,
            data_address,
            dimension: match header.x_axis() {
                Some(_) => "3D",
                None => "2D",
            },
            y_axis: header.y_axis(),
            x_axis: header.x_axis(),
            fragment,
        });
        self.report.found.insert(label.clone());
        self.comment_if_bare(index, at, format!("get table {}", label))
    }

    /// Definition snippet for a discovered table, in the ROM document's format.
    fn table_fragment(&self, label: &str, data_address: u32, header: &TableHeader) -> String {
        let kind = if header.x_axis().is_some() { "3D" } else { "2D" };
        let mut out = format!(
            "<table name=\"{}\" category=\"Unknown\" address=\"{}\" type=\"{}\" scaling=\"uint8\">\n",
            label,
            to_address_string(data_address),
            kind
        );
        out.push_str(&self.axis_fragment("Y Axis", header.y_axis()));
        if let Some(x) = header.x_axis() {
            out.push_str(&self.axis_fragment("X Axis", x));
        }
        out.push_str("</table>\n");
        out
    }

    fn axis_fragment(&self, kind: &str, ram: u32) -> String {
        let name = xml_escape(&self.enrichment.describe_ram(ram));
        match self.index.axis(ram) {
            Some(axis) => format!(
                "  <table name=\"{}\" type=\"{}\" address=\"{}\" elements=\"{}\" scaling=\"{}\"/>\n",
                name,
                kind,
                to_address_string(axis.scale_address),
                axis.elements,
                axis.scaling.as_deref().unwrap_or("uint16")
            ),
            None => format!("  <table name=\"{}\" type=\"{}\"/>\n", name, kind),
        }
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_plausibility() {
        let mut header = ScaleHeader {
            dest: 0x807f00,
            src: 0x80a010,
            entries: 16,
        };
        assert!(plausible_scale(&header));
        header.entries = MAX_DISCOVERED_SCALE_ENTRIES;
        assert!(!plausible_scale(&header));
        header.entries = 16;
        header.src = 0x5a2c0;
        assert!(!plausible_scale(&header));
    }

    #[test]
    fn escapes_attribute_text() {
        assert_eq!(xml_escape("A<B> & \"C\""), "A&lt;B&gt; &amp; &quot;C&quot;");
    }
}
