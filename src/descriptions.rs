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

use std::collections::BTreeMap;

use crate::address::{to_address, to_address_string};
use crate::error::Result;
use crate::xml::{DefinitionStore, DocumentKind, Node};

/// Address → display name, for RAM variables or code subroutines.
#[derive(Debug, Clone, Default)]
pub struct Descriptions {
    by_addr: BTreeMap<u32, String>,
}

impl Descriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u32, name: impl Into<String>) {
        self.by_addr.insert(address, name.into());
    }

    pub fn get(&self, address: u32) -> Option<&str> {
        self.by_addr.get(&address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_addr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_addr.is_empty()
    }

    /// Data logger RAM map: `DataListItem` entries keyed by a `0x`-prefixed `RequestID`.
    pub fn from_ram_node(node: &Node) -> Descriptions {
        let mut descriptions = Descriptions::new();
        for item in node.descend(&["vehicle", "ecu", "Mode2", "DataListItem"]) {
            let (Some(id), Some(display)) = (item.attr("RequestID"), item.attr("Display")) else {
                continue;
            };
            match to_address(id) {
                Ok(address) => descriptions.insert(address, display),
                Err(_) => log::debug!("Skipping RAM entry {:?} with bad RequestID {:?}", display, id),
            }
        }
        descriptions
    }

    /// Code map: `<routine address=".." name=".."/>` entries.
    pub fn from_code_node(node: &Node) -> Descriptions {
        let mut descriptions = Descriptions::new();
        for routine in node.children_named("routine") {
            let (Some(address), Some(name)) = (routine.attr("address"), routine.attr("name"))
            else {
                continue;
            };
            match to_address(address) {
                Ok(address) => descriptions.insert(address, name),
                Err(_) => log::debug!("Skipping routine {:?} with bad address", name),
            }
        }
        descriptions
    }
}

/// Optional lookups that make comments readable. Either may be missing.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub ram: Option<Descriptions>,
    pub subroutines: Option<Descriptions>,
}

impl Enrichment {
    pub fn load(store: &dyn DefinitionStore, rom_id: &str) -> Result<Enrichment> {
        let ram = store
            .document(DocumentKind::Ram, rom_id)?
            .map(|node| Descriptions::from_ram_node(&node));
        if ram.is_none() {
            log::warn!("No RAM map found for ROM {}, RAM references stay unnamed", rom_id);
        }
        let subroutines = store
            .document(DocumentKind::Code, rom_id)?
            .map(|node| Descriptions::from_code_node(&node));
        if subroutines.is_none() {
            log::warn!(
                "No subroutine map found for ROM {}, skipping subroutine identification",
                rom_id
            );
        }
        Ok(Enrichment { ram, subroutines })
    }

    pub fn ram_name(&self, address: u32) -> Option<&str> {
        self.ram.as_ref()?.get(address)
    }

    pub fn subroutine_name(&self, address: u32) -> Option<&str> {
        self.subroutines.as_ref()?.get(address)
    }

    /// RAM name for display, with the raw address as fallback.
    pub fn describe_ram(&self, address: u32) -> String {
        match self.ram_name(address) {
            Some(name) => name.to_string(),
            None => format!("unknown (0x{})", to_address_string(address)),
        }
    }
}
