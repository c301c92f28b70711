//! Flattening rules shared by every decoded field.
//!
//! The source format freely mixes "one child" and "many children" and wraps
//! text in `{"$": value}` objects. [`normalize_list`] and [`normalize_dict`]
//! turn such subtrees into plain lists and mappings with canonical keys.

use crate::tree::{Map, Node, TEXT_KEY};
use crate::xml_path::Lookup;

/// Key separator used in normalized mappings.
pub const KEY_SEPARATOR: char = '_';

pub fn canonical_key(key: &str) -> String {
    key.replace('-', &KEY_SEPARATOR.to_string())
}

/// Normalizes `node` into a list.
///
/// Absent becomes empty, a single node becomes a list of one. An element
/// whose only key is `text_key` collapses to that value.
pub fn normalize_list(node: Lookup<'_>, text_key: &str) -> Vec<Node> {
    let items: &[Node] = match node {
        Lookup::Absent => &[],
        Lookup::Found(Node::List(items)) => items,
        Lookup::Found(single) => std::slice::from_ref(single),
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if item.is_empty() {
            tracing::warn!(index, "Skipping empty list element");
            continue;
        }
        out.push(normalize_item(item, text_key));
    }
    out
}

/// Normalizes a mapping: text wrappers collapse to their scalar, nested
/// mappings and lists are normalized recursively, keys are canonicalized.
/// Absent input or a non-mapping yields the empty mapping.
pub fn normalize_dict(node: Lookup<'_>) -> Map {
    match node {
        Lookup::Found(Node::Object(map)) => normalize_map(map),
        Lookup::Found(other) if !other.is_empty() => {
            tracing::warn!("Expected a mapping, found a scalar or list; using empty mapping");
            Map::new()
        }
        _ => Map::new(),
    }
}

fn normalize_item(item: &Node, text_key: &str) -> Node {
    let item = match item {
        Node::Object(map) if map.len() == 1 && map.contains_key(text_key) => {
            map.get(text_key).unwrap_or(item)
        }
        _ => item,
    };

    match item {
        Node::Object(map) => Node::Object(normalize_map(map)),
        Node::List(_) => Node::List(normalize_list(Lookup::Found(item), TEXT_KEY)),
        Node::Text(_) => item.clone(),
    }
}

fn normalize_map(map: &Map) -> Map {
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Node::Object(inner) => match inner.get(TEXT_KEY) {
                    Some(text) => text.clone(),
                    None => Node::Object(normalize_map(inner)),
                },
                Node::List(_) => Node::List(normalize_list(Lookup::Found(value), TEXT_KEY)),
                Node::Text(_) => value.clone(),
            };
            (canonical_key(key), value)
        })
        .collect()
}
