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

// Crate root: declare modules and control visibility
pub mod address;
pub mod annotate;
pub mod definitions;
pub mod descriptions;
pub mod error;
pub mod headers;
pub mod instruction;
pub mod listing;
pub mod objdump;
pub mod report;
pub mod xml;

// Re-export commonly used API from the library for binaries/tests
pub use annotate::{analyze, Analysis, AnalysisOptions, AnnotationIndex, Annotator};
pub use definitions::RomDefinition;
pub use descriptions::Enrichment;
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use listing::RomListing;
pub use report::{serialize_report, AnalysisReport};
pub use xml::{DefinitionStore, DocumentKind, MemoryStore, XmlDirectory};
