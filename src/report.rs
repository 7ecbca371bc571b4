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

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

// Addresses are written as hex strings, the same way every other tool in the
// workflow prints them.
fn hex<S: Serializer>(address: &u32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{:x}", address))
}

fn opt_hex<S: Serializer>(address: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
    match address {
        Some(a) => hex(a, s),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredScale {
    pub label: String,
    #[serde(serialize_with = "hex")]
    pub address: u32,
    #[serde(serialize_with = "hex")]
    pub dest: u32,
    #[serde(serialize_with = "hex")]
    pub src: u32,
    pub entries: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredTable {
    pub label: String,
    /// Where the header starts; this is the address code loads.
    #[serde(serialize_with = "hex")]
    pub address: u32,
    #[serde(serialize_with = "hex")]
    pub data_address: u32,
    pub dimension: &'static str,
    #[serde(serialize_with = "hex")]
    pub y_axis: u32,
    #[serde(serialize_with = "opt_hex")]
    pub x_axis: Option<u32>,
    /// Definition snippet for a curator to fold into the ROM document.
    pub fragment: String,
}

/// Everything `analyze()` learned besides the comments it left in the listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub warnings: Vec<String>,
    /// Labels referenced from code.
    pub found: BTreeSet<String>,
    /// Registered labels no code referenced.
    pub unreferenced: Vec<String>,
    pub discovered_scales: Vec<DiscoveredScale>,
    pub discovered_tables: Vec<DiscoveredTable>,
}

impl AnalysisReport {
    /// All discovered table fragments, one after another.
    pub fn fragments(&self) -> String {
        self.discovered_tables
            .iter()
            .map(|t| t.fragment.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Serialize a report for machine consumption.
/// Format:
/// {
///   "t": "analysis",
///   "rom_id": "...",
///   "report": { warnings, found, unreferenced, discovered_scales, discovered_tables }
/// }
pub fn serialize_report(
    report: &AnalysisReport,
    rom_id: Option<&str>,
) -> serde_json::Result<Value> {
    Ok(json!({
        "t": "analysis",
        "rom_id": rom_id,
        "report": serde_json::to_value(report)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_addresses_as_hex() {
        let mut report = AnalysisReport::default();
        report.found.insert("Fuel".to_string());
        report.discovered_tables.push(DiscoveredTable {
            label: "Unknown Table #1".into(),
            address: 0x280,
            data_address: 0x287,
            dimension: "3D",
            y_axis: 0x807f00,
            x_axis: None,
            fragment: "<table/>".into(),
        });

        let v = serialize_report(&report, Some("52680016")).unwrap();
        assert_eq!(v["t"], "analysis");
        assert_eq!(v["rom_id"], "52680016");
        let table = &v["report"]["discovered_tables"][0];
        assert_eq!(table["address"], "0x280");
        assert_eq!(table["y_axis"], "0x807f00");
        assert!(table["x_axis"].is_null());
        assert_eq!(v["report"]["found"][0], "Fuel");
        assert_eq!(report.fragments(), "<table/>");
    }

    #[test]
    fn empty_report_serializes_every_field() {
        let v = serialize_report(&AnalysisReport::default(), None).unwrap();
        assert!(v["rom_id"].is_null());
        let report = v["report"].as_object().unwrap();
        assert_eq!(report.len(), 5);
        assert!(report["warnings"].as_array().unwrap().is_empty());
    }
}
