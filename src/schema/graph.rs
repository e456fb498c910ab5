/// Dialogue graph document: loading, validation, and link resolution.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::character::{CharacterId, CharacterLookup};
use super::node::{NodeId, NodeRecord};
use super::property::ExposedProperty;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),
    #[error("entry node {0} is not in the node table")]
    MissingEntry(NodeId),
    #[error("entry node {0} is a {1} record, not an Entry")]
    NotAnEntry(NodeId, &'static str),
    #[error("node {0} is a second Entry record; a graph has exactly one")]
    ExtraEntry(NodeId),
    #[error("link from unknown node {source} (port '{port}')")]
    UnknownLinkSource { source: NodeId, port: String },
    #[error("link from {source} targets unknown node {target}")]
    UnknownLinkTarget { source: NodeId, target: NodeId },
    #[error("{kind} node {node} declares no port named '{port}'")]
    UndeclaredPort {
        node: NodeId,
        kind: &'static str,
        port: String,
    },
    #[error("node {node} has more than one link leaving port '{port}'")]
    DuplicatePortLink { node: NodeId, port: String },
}

/// One row of the serialized node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    pub node: NodeRecord,
}

/// An edge from a named port on one node to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLink {
    pub source: NodeId,
    pub port: String,
    pub target: NodeId,
}

/// The serialized form of a dialogue graph, as the authoring tool writes it.
///
/// The node table is a list rather than a map so that duplicate ids survive
/// deserialization long enough for validation to name them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDoc {
    pub name: String,
    pub entry: NodeId,
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub links: Vec<NodeLink>,
    #[serde(default)]
    pub properties: Vec<ExposedProperty>,
    #[serde(default)]
    pub character: Option<String>,
}

/// A validated, immutable dialogue graph.
///
/// Loading performs the full structural check; once built, the graph is
/// read-only and may be shared across concurrently running sessions. Link
/// resolution is O(1) through indexes built at load.
#[derive(Debug, Clone)]
pub struct DialogueGraph {
    name: String,
    entry: NodeId,
    nodes: FxHashMap<NodeId, NodeRecord>,
    /// Document order of the node table, kept for round-trips.
    node_order: Vec<NodeId>,
    links: Vec<NodeLink>,
    properties: Vec<ExposedProperty>,
    character: Option<String>,

    // Derived at load; never serialized.
    port_index: FxHashMap<NodeId, FxHashMap<String, usize>>,
    outgoing: FxHashMap<NodeId, Vec<usize>>,
    speakers: FxHashMap<NodeId, CharacterId>,
    base_character: Option<CharacterId>,
}

impl DialogueGraph {
    /// Validate a deserialized document and build the runtime graph.
    ///
    /// Structural problems fail here with the offending node or link named;
    /// unresolved character names are diagnostics only (the speech plays
    /// anonymously).
    pub fn from_doc(doc: GraphDoc, characters: &dyn CharacterLookup) -> Result<Self, GraphError> {
        let mut nodes: FxHashMap<NodeId, NodeRecord> = FxHashMap::default();
        let mut node_order = Vec::with_capacity(doc.nodes.len());
        for entry in &doc.nodes {
            if nodes.insert(entry.id.clone(), entry.node.clone()).is_some() {
                return Err(GraphError::DuplicateNode(entry.id.clone()));
            }
            node_order.push(entry.id.clone());
        }

        match nodes.get(&doc.entry) {
            None => return Err(GraphError::MissingEntry(doc.entry.clone())),
            Some(NodeRecord::Entry) => {}
            Some(other) => return Err(GraphError::NotAnEntry(doc.entry.clone(), other.kind())),
        }
        for id in &node_order {
            if matches!(nodes[id], NodeRecord::Entry) && *id != doc.entry {
                return Err(GraphError::ExtraEntry(id.clone()));
            }
        }

        let mut port_index: FxHashMap<NodeId, FxHashMap<String, usize>> = FxHashMap::default();
        let mut outgoing: FxHashMap<NodeId, Vec<usize>> = FxHashMap::default();
        for (i, link) in doc.links.iter().enumerate() {
            let source = nodes
                .get(&link.source)
                .ok_or_else(|| GraphError::UnknownLinkSource {
                    source: link.source.clone(),
                    port: link.port.clone(),
                })?;
            if !nodes.contains_key(&link.target) {
                return Err(GraphError::UnknownLinkTarget {
                    source: link.source.clone(),
                    target: link.target.clone(),
                });
            }
            if !source.allows_port(&link.port) {
                return Err(GraphError::UndeclaredPort {
                    node: link.source.clone(),
                    kind: source.kind(),
                    port: link.port.clone(),
                });
            }
            let ports = port_index.entry(link.source.clone()).or_default();
            if ports.insert(link.port.clone(), i).is_some() {
                return Err(GraphError::DuplicatePortLink {
                    node: link.source.clone(),
                    port: link.port.clone(),
                });
            }
            outgoing.entry(link.source.clone()).or_default().push(i);
        }

        let mut speakers: FxHashMap<NodeId, CharacterId> = FxHashMap::default();
        for id in &node_order {
            let speaker = match &nodes[id] {
                NodeRecord::Speech { speaker, .. } => speaker.as_deref(),
                NodeRecord::SpeechVariant { speaker, .. } => speaker.as_deref(),
                _ => None,
            };
            if let Some(name) = speaker {
                match characters.lookup(name) {
                    Some(cid) => {
                        speakers.insert(id.clone(), cid);
                    }
                    None => log::warn!(
                        "graph '{}': speaker '{}' on node {} did not resolve; speech will be anonymous",
                        doc.name,
                        name,
                        id
                    ),
                }
            }
        }
        let base_character = doc.character.as_deref().and_then(|name| {
            let resolved = characters.lookup(name);
            if resolved.is_none() {
                log::warn!(
                    "graph '{}': base character '{}' did not resolve",
                    doc.name,
                    name
                );
            }
            resolved
        });

        Ok(Self {
            name: doc.name,
            entry: doc.entry,
            nodes,
            node_order,
            links: doc.links,
            properties: doc.properties,
            character: doc.character,
            port_index,
            outgoing,
            speakers,
            base_character,
        })
    }

    /// Parse and validate a graph from a RON string.
    pub fn parse_ron(input: &str, characters: &dyn CharacterLookup) -> Result<Self, GraphError> {
        let doc: GraphDoc = ron::from_str(input)?;
        Self::from_doc(doc, characters)
    }

    /// Load and validate a graph from a RON file.
    pub fn load_from_ron(
        path: &Path,
        characters: &dyn CharacterLookup,
    ) -> Result<Self, GraphError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents, characters)
    }

    /// Rebuild the serialized document form. Node and link order match the
    /// document this graph was loaded from.
    pub fn to_doc(&self) -> GraphDoc {
        GraphDoc {
            name: self.name.clone(),
            entry: self.entry.clone(),
            nodes: self
                .node_order
                .iter()
                .map(|id| NodeEntry {
                    id: id.clone(),
                    node: self.nodes[id].clone(),
                })
                .collect(),
            links: self.links.clone(),
            properties: self.properties.clone(),
            character: self.character.clone(),
        }
    }

    pub fn to_ron_string(&self) -> Result<String, GraphError> {
        Ok(ron::ser::to_string_pretty(
            &self.to_doc(),
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &NodeId {
        &self.entry
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn properties(&self) -> &[ExposedProperty] {
        &self.properties
    }

    /// The graph's base character, if it named one and the name resolved.
    pub fn base_character(&self) -> Option<CharacterId> {
        self.base_character
    }

    /// Resolved speaker of a speech node, if one was named and resolved.
    pub fn speaker_of(&self, id: &NodeId) -> Option<CharacterId> {
        self.speakers.get(id).copied()
    }

    /// The link leaving `node` through `port`, if authored.
    pub fn link_from(&self, node: &NodeId, port: &str) -> Option<&NodeLink> {
        let i = *self.port_index.get(node)?.get(port)?;
        self.links.get(i)
    }

    /// All links leaving `node`, in document order. For `Options` nodes this
    /// is the presented choice order.
    pub fn links_from(&self, node: &NodeId) -> Vec<&NodeLink> {
        match self.outgoing.get(node) {
            Some(indexes) => indexes.iter().map(|&i| &self.links[i]).collect(),
            None => Vec::new(),
        }
    }
}
