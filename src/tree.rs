//! Badgerfish-style document tree.
//!
//! Element attributes become `@name` entries, element text becomes a `$`
//! entry and repeated child elements of the same name collapse into a
//! [`Node::List`] under one key. Namespace prefixes are dropped.

use crate::error::{RegisterError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub const TEXT_KEY: &str = "$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Object(Map),
    List(Vec<Node>),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Text content of this node: the scalar itself, or the `$` entry of an object.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Object(map) => map.get(TEXT_KEY).and_then(Node::as_text),
            Node::List(_) => None,
        }
    }

    /// Falsy in the loose sense of the source format: empty text, object or list.
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Text(text) => text.is_empty(),
            Node::Object(map) => map.is_empty(),
            Node::List(items) => items.is_empty(),
        }
    }
}

/// Insertion-ordered mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    entries: Vec<(String, Node)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, node)| node)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Adds `value` under `key`; a repeated key turns the entry into a list.
    pub fn append(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, Node::List(items))) => items.push(value),
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.1, Node::List(Vec::new()));
                entry.1 = Node::List(vec![previous, value]);
            }
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl FromIterator<(String, Node)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Text(text) => serializer.serialize_str(text),
            Node::Object(map) => map.serialize(serializer),
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}

struct OpenElement {
    name: String,
    content: Map,
    /// Text directly inside this element.
    text: String,
    /// Text of this element and all descendants, in document order.
    full_text: String,
}

impl OpenElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().into_inner()).into_owned();
        let mut content = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| RegisterError::MalformedDocument(e.to_string()))?;
            let key = attr.key.local_name();
            let key = String::from_utf8_lossy(key.as_ref());
            // Namespace declarations carry no data.
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| RegisterError::MalformedDocument(e.to_string()))?;
            content.insert(format!("@{key}"), Node::Text(value.into_owned()));
        }
        Ok(Self {
            name,
            content,
            text: String::new(),
            full_text: String::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.full_text.push_str(text);
    }

    /// Mixed content keeps inline child text in `$`, e.g.
    /// `<t><b>Bold</b> title</t>` yields `Bold title`.
    fn finish(mut self) -> (String, Node, String) {
        if !self.text.trim().is_empty() {
            let text = self.full_text.trim();
            self.content.insert(TEXT_KEY, Node::Text(text.to_string()));
        }
        (self.name, Node::Object(self.content), self.full_text)
    }
}

/// Parses XML bytes into a tree whose single top-level key is the root element.
pub fn parse_badgerfish(xml: &[u8]) -> Result<Node> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Node)> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            RegisterError::MalformedDocument(format!(
                "at position {}: {e}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(ref start) => {
                if root.is_some() {
                    return Err(RegisterError::MalformedDocument(
                        "content after root element".to_string(),
                    ));
                }
                stack.push(OpenElement::from_start(start)?);
            }
            Event::Empty(ref start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(RegisterError::MalformedDocument(
                        "content after root element".to_string(),
                    ));
                }
                let element = OpenElement::from_start(start)?;
                close_element(&mut stack, &mut root, element);
            }
            Event::Text(ref text) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| RegisterError::MalformedDocument(e.to_string()))?;
                    current.push_text(&unescaped);
                }
            }
            Event::CData(ref cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(cdata.as_ref()));
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(RegisterError::MalformedDocument(
                        "unbalanced closing tag".to_string(),
                    ));
                };
                close_element(&mut stack, &mut root, element);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(RegisterError::MalformedDocument(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    let Some((name, node)) = root else {
        return Err(RegisterError::MalformedDocument(
            "document has no root element".to_string(),
        ));
    };

    let mut document = Map::new();
    document.insert(name, node);
    Ok(Node::Object(document))
}

fn close_element(
    stack: &mut [OpenElement],
    root: &mut Option<(String, Node)>,
    element: OpenElement,
) {
    let (name, node, full_text) = element.finish();
    match stack.last_mut() {
        Some(parent) => {
            parent.full_text.push_str(&full_text);
            parent.content.append(name, node);
        }
        None => *root = Some((name, node)),
    }
}
