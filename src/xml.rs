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

//! Owned attribute tree for the definition documents, and the stores they come from.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of element names below this node, e.g. `["vehicle", "ecu"]`.
    pub fn descend<'a>(&'a self, path: &[&str]) -> Vec<&'a Node> {
        let mut current = vec![self];
        for name in path {
            current = current
                .into_iter()
                .flat_map(move |n| n.children.iter().filter(move |c| c.name == *name))
                .collect();
        }
        current
    }

    pub fn parse(text: &str) -> std::result::Result<Node, roxmltree::Error> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self::from_element(doc.root_element()))
    }

    fn from_element(element: roxmltree::Node<'_, '_>) -> Node {
        Node {
            name: element.tag_name().name().to_string(),
            attributes: element
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: element
                .children()
                .filter(|c| c.is_text())
                .filter_map(|c| c.text())
                .collect::<String>()
                .trim()
                .to_string(),
            children: element
                .children()
                .filter(|c| c.is_element())
                .map(Self::from_element)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Table and scaling definitions.
    Rom,
    /// RAM address descriptions (data logger format).
    Ram,
    /// Subroutine names.
    Code,
}

impl DocumentKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocumentKind::Rom => "rom",
            DocumentKind::Ram => "ram",
            DocumentKind::Code => "code",
        }
    }
}

/// Where definition documents come from.
///
/// `Ok(None)` means the document does not exist; `Err` means it exists but
/// could not be read or parsed.
pub trait DefinitionStore {
    fn document(&self, kind: DocumentKind, rom_id: &str) -> Result<Option<Node>>;
}

/// Documents laid out as `<root>/<kind>/<rom_id>.xml`.
pub struct XmlDirectory {
    root: PathBuf,
}

impl XmlDirectory {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, kind: DocumentKind, rom_id: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.xml", rom_id))
    }
}

impl DefinitionStore for XmlDirectory {
    fn document(&self, kind: DocumentKind, rom_id: &str) -> Result<Option<Node>> {
        let path = self.path_for(kind, rom_id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::DefinitionIo { path, source }),
        };
        Node::parse(&text)
            .map(Some)
            .map_err(|e| Error::DefinitionXml {
                path,
                message: e.to_string(),
            })
    }
}

/// Pre-parsed documents held in memory.
#[derive(Default)]
pub struct MemoryStore {
    documents: HashMap<(DocumentKind, String), Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DocumentKind, rom_id: &str, node: Node) {
        self.documents.insert((kind, rom_id.to_string()), node);
    }
}

impl DefinitionStore for MemoryStore {
    fn document(&self, kind: DocumentKind, rom_id: &str) -> Result<Option<Node>> {
        Ok(self.documents.get(&(kind, rom_id.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attributes_text_and_children() {
        let node = Node::parse(
            r#"<rom><include>base</include><table name="Fuel" address="1a2b"><table elements="8"/></table></rom>"#,
        )
        .unwrap();
        assert_eq!(node.name, "rom");
        assert_eq!(node.children_named("include").next().unwrap().text, "base");
        let table = node.children_named("table").next().unwrap();
        assert_eq!(table.attr("address"), Some("1a2b"));
        assert_eq!(table.children[0].attr("elements"), Some("8"));
    }

    #[test]
    fn descend_follows_paths() {
        let node = Node::new("root").with_child(
            Node::new("a")
                .with_child(Node::new("b").with_attr("n", "1"))
                .with_child(Node::new("b").with_attr("n", "2")),
        );
        assert_eq!(node.descend(&["a", "b"]).len(), 2);
        assert!(node.descend(&["a", "c"]).is_empty());
    }

    #[test]
    fn directory_store_distinguishes_missing_and_broken() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("rom")).unwrap();
        std::fs::write(dir.path().join("rom/good.xml"), "<rom/>").unwrap();
        std::fs::write(dir.path().join("rom/bad.xml"), "<rom>").unwrap();
        let store = XmlDirectory::new(dir.path());

        assert_eq!(
            store.document(DocumentKind::Rom, "good").unwrap(),
            Some(Node::new("rom"))
        );
        assert!(store.document(DocumentKind::Rom, "absent").unwrap().is_none());
        assert!(matches!(
            store.document(DocumentKind::Rom, "bad"),
            Err(Error::DefinitionXml { .. })
        ));
    }
}
