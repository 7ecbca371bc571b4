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

//! Address indexes grown while annotating. Every map keeps the first entry
//! registered at an address and silently ignores later ones.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleEntry {
    pub label: String,
    pub name: String,
    /// `None` for discovered scales, whose storage width is not known.
    pub scaling: Option<String>,
}

/// A scale as seen from the RAM buffer it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisEntry {
    pub elements: u32,
    /// Address of the scale's element data in ROM.
    pub scale_address: u32,
    pub scaling: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    /// ROM address a scale is reached through → scale.
    registered_scales: BTreeMap<u32, ScaleEntry>,
    /// ROM address a table is reached through → label.
    table_addresses: BTreeMap<u32, String>,
    /// RAM destination of a scale → element count and scale location.
    table_address_map: BTreeMap<u32, AxisEntry>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_scale(&mut self, address: u32, entry: ScaleEntry) -> bool {
        if self.registered_scales.contains_key(&address) {
            return false;
        }
        self.registered_scales.insert(address, entry);
        true
    }

    pub fn register_table(&mut self, address: u32, label: impl Into<String>) -> bool {
        if self.table_addresses.contains_key(&address) {
            return false;
        }
        self.table_addresses.insert(address, label.into());
        true
    }

    pub fn record_axis(&mut self, dest: u32, entry: AxisEntry) -> bool {
        if self.table_address_map.contains_key(&dest) {
            return false;
        }
        self.table_address_map.insert(dest, entry);
        true
    }

    pub fn scale(&self, address: u32) -> Option<&ScaleEntry> {
        self.registered_scales.get(&address)
    }

    pub fn table_label(&self, address: u32) -> Option<&str> {
        self.table_addresses.get(&address).map(String::as_str)
    }

    pub fn axis(&self, dest: u32) -> Option<&AxisEntry> {
        self.table_address_map.get(&dest)
    }

    pub fn scales(&self) -> impl Iterator<Item = (u32, &ScaleEntry)> {
        self.registered_scales.iter().map(|(a, e)| (*a, e))
    }

    pub fn tables(&self) -> impl Iterator<Item = (u32, &str)> {
        self.table_addresses.iter().map(|(a, l)| (*a, l.as_str()))
    }

    pub fn axes(&self) -> impl Iterator<Item = (u32, &AxisEntry)> {
        self.table_address_map.iter().map(|(a, e)| (*a, e))
    }
}
