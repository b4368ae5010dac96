//! Static genre catalog: a tree whose leaves are search queries.

use rand::seq::SliceRandom;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::Path;

const EMBEDDED_CATALOG: &str = include_str!("default_catalog.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unable to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenreNode {
    Category {
        name: String,
        children: Vec<GenreNode>,
    },
    Leaf {
        name: String,
        query: String,
    },
}

/// A playable catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafEntry<'a> {
    pub display_name: &'a str,
    pub query: &'a str,
}

impl GenreNode {
    pub fn name(&self) -> &str {
        match self {
            GenreNode::Category { name, .. } | GenreNode::Leaf { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[GenreNode] {
        match self {
            GenreNode::Category { children, .. } => children,
            GenreNode::Leaf { .. } => &[],
        }
    }

    pub fn leaves(&self) -> Vec<LeafEntry<'_>> {
        let mut leaves = vec![];
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<LeafEntry<'a>>) {
        match self {
            GenreNode::Leaf { name, query } => {
                if !query.trim().is_empty() {
                    leaves.push(LeafEntry {
                        display_name: name,
                        query,
                    });
                }
            }
            GenreNode::Category { children, .. } => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }

    pub fn random_leaf(&self) -> Option<LeafEntry<'_>> {
        self.leaves().choose(&mut rand::thread_rng()).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenreCatalog {
    roots: Vec<GenreNode>,
}

impl GenreCatalog {
    pub fn new(roots: Vec<GenreNode>) -> Self {
        Self { roots }
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub fn roots(&self) -> &[GenreNode] {
        &self.roots
    }

    /// Names of the top-level entries, in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        self.roots.iter().map(GenreNode::name).collect()
    }

    pub fn leaves(&self) -> Vec<LeafEntry<'_>> {
        let mut leaves = vec![];
        for root in &self.roots {
            root.collect_leaves(&mut leaves);
        }
        leaves
    }

    /// Uniform pick over every leaf of the tree, at any depth.
    pub fn random_leaf(&self) -> Option<LeafEntry<'_>> {
        self.leaves().choose(&mut rand::thread_rng()).copied()
    }

    /// Looks a node up by a `/`-separated path of names. A single name that
    /// matches no top-level category is searched for anywhere in the tree.
    /// Matching ignores case and surrounding whitespace.
    pub fn find(&self, path: &str) -> Option<&GenreNode> {
        let segments = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let (first, rest) = segments.split_first()?;

        let mut node = match find_named(&self.roots, first) {
            Some(node) => node,
            None if rest.is_empty() => return find_anywhere(&self.roots, first),
            None => return None,
        };

        for segment in rest {
            node = find_named(node.children(), segment)?;
        }

        Some(node)
    }
}

fn find_named<'a>(nodes: &'a [GenreNode], name: &str) -> Option<&'a GenreNode> {
    nodes
        .iter()
        .find(|node| node.name().trim().eq_ignore_ascii_case(name))
}

fn find_anywhere<'a>(nodes: &'a [GenreNode], name: &str) -> Option<&'a GenreNode> {
    for node in nodes {
        if node.name().trim().eq_ignore_ascii_case(name) {
            return Some(node);
        }
        if let Some(found) = find_anywhere(node.children(), name) {
            return Some(found);
        }
    }

    None
}

// Objects become categories and strings become leaves; declaration order is
// kept, so menus list genres the way the catalog file does.
struct ChildrenVisitor;

impl<'de> Visitor<'de> for ChildrenVisitor {
    type Value = Vec<GenreNode>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a map of genre names to queries or nested genres")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut children = Vec::with_capacity(map.size_hint().unwrap_or(0));

        while let Some(name) = map.next_key::<String>()? {
            let node = match map.next_value::<NodeValue>()? {
                NodeValue::Query(query) => GenreNode::Leaf { name, query },
                NodeValue::Children(children) => GenreNode::Category { name, children },
            };
            children.push(node);
        }

        Ok(children)
    }
}

enum NodeValue {
    Query(String),
    Children(Vec<GenreNode>),
}

struct NodeValueVisitor;

impl<'de> Visitor<'de> for NodeValueVisitor {
    type Value = NodeValue;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a search query string or a map of nested genres")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(NodeValue::Query(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(NodeValue::Query(value))
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        ChildrenVisitor.visit_map(map).map(NodeValue::Children)
    }
}

impl<'de> Deserialize<'de> for NodeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeValueVisitor)
    }
}

impl<'de> Deserialize<'de> for GenreCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_map(ChildrenVisitor)
            .map(GenreCatalog::new)
    }
}
