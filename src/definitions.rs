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

//! Scalings and tables known for a ROM, merged across `<include>` chains.
//!
//! A ROM document may include other ROM documents by id. Includes are merged
//! depth first and an entry already present by name is never replaced, so the
//! including document always wins over what it includes.

use crate::address::to_address;
use crate::error::{Error, Result};
use crate::xml::{DefinitionStore, DocumentKind, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaling {
    pub name: String,
    pub storage_type: String,
}

impl Scaling {
    pub fn storage_bits(&self) -> Option<u32> {
        match self.storage_type.trim() {
            "uint8" | "int8" => Some(8),
            "uint16" | "int16" => Some(16),
            "uint32" | "int32" | "float" => Some(32),
            _ => None,
        }
    }

    /// Bytes per element, `None` for an unrecognised storage type.
    pub fn element_size(&self) -> Option<u32> {
        self.storage_bits().map(|bits| bits / 8)
    }
}

/// A `<table>` node. Nested tables describe the axes of their parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub address: Option<u32>,
    pub kind: Option<String>,
    pub scaling: Option<String>,
    pub category: Option<String>,
    pub elements: Option<u32>,
    pub axes: Vec<Table>,
}

impl Table {
    fn from_node(node: &Node) -> Table {
        let name = node.attr("name").unwrap_or_default().to_string();
        let address = node.attr("address").and_then(|a| match to_address(a) {
            Ok(address) => Some(address),
            Err(_) => {
                log::warn!("Table {:?} has an invalid address {:?}, ignoring it", name, a);
                None
            }
        });
        let elements = node.attr("elements").and_then(|e| match e.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                log::warn!("Table {:?} has an invalid element count {:?}", name, e);
                None
            }
        });
        Table {
            address,
            kind: node.attr("type").map(str::to_string),
            scaling: node.attr("scaling").map(str::to_string),
            category: node.attr("category").map(str::to_string),
            elements,
            axes: node.children_named("table").map(Table::from_node).collect(),
            name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomDefinition {
    pub scalings: Vec<Scaling>,
    pub tables: Vec<Table>,
}

impl RomDefinition {
    /// Entries of a single document, includes not followed.
    pub fn from_node(node: &Node) -> RomDefinition {
        let mut definition = RomDefinition::default();
        for scaling in node.children_named("scaling") {
            definition.add_scaling(Scaling {
                name: scaling.attr("name").unwrap_or_default().to_string(),
                storage_type: scaling.attr("storagetype").unwrap_or_default().to_string(),
            });
        }
        for table in node.children_named("table") {
            definition.add_table(Table::from_node(table));
        }
        definition
    }

    pub fn scaling(&self, name: &str) -> Option<&Scaling> {
        self.scalings.iter().find(|s| s.name == name)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Add unless an entry with this name exists; returns whether it was added.
    pub fn add_scaling(&mut self, scaling: Scaling) -> bool {
        if self.scaling(&scaling.name).is_some() {
            return false;
        }
        self.scalings.push(scaling);
        true
    }

    pub fn add_table(&mut self, table: Table) -> bool {
        if self.table(&table.name).is_some() {
            return false;
        }
        self.tables.push(table);
        true
    }

    /// Fold in entries of `other` that this definition does not already name.
    pub fn merge(&mut self, other: RomDefinition) {
        for scaling in other.scalings {
            self.add_scaling(scaling);
        }
        for table in other.tables {
            self.add_table(table);
        }
    }

    /// Load `rom_id` and everything it includes.
    ///
    /// A missing root document is an error; a missing include only loses that
    /// include. A document that includes itself, directly or not, is an error.
    pub fn load(store: &dyn DefinitionStore, rom_id: &str) -> Result<RomDefinition> {
        let mut chain = Vec::new();
        load_recursive(store, rom_id, &mut chain)?
            .ok_or_else(|| Error::DefinitionMissing(rom_id.to_string()))
    }
}

fn load_recursive(
    store: &dyn DefinitionStore,
    rom_id: &str,
    chain: &mut Vec<String>,
) -> Result<Option<RomDefinition>> {
    if chain.iter().any(|id| id == rom_id) {
        let mut cycle = chain.clone();
        cycle.push(rom_id.to_string());
        return Err(Error::IncludeCycle(cycle));
    }
    let Some(node) = store.document(DocumentKind::Rom, rom_id)? else {
        return Ok(None);
    };
    log::debug!("Loading ROM definition {}", rom_id);

    let mut definition = RomDefinition::from_node(&node);
    chain.push(rom_id.to_string());
    for include in node.children_named("include") {
        let included_id = include.text.trim();
        match load_recursive(store, included_id, chain)? {
            Some(included) => definition.merge(included),
            None => log::warn!(
                "ROM definition {} includes {}, which was not found",
                rom_id,
                included_id
            ),
        }
    }
    chain.pop();
    Ok(Some(definition))
}
