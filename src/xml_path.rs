use crate::tree::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(Box<str>),
    Index(usize),
}

/// Result of a path lookup. `Absent` means the path does not exist, which is
/// distinct from a path that exists and holds an empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a Node),
    Absent,
}

impl<'a> Lookup<'a> {
    pub fn node(self) -> Option<&'a Node> {
        match self {
            Lookup::Found(node) => Some(node),
            Lookup::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, Lookup::Absent)
    }
}

impl<'a> From<&'a Node> for Lookup<'a> {
    fn from(node: &'a Node) -> Self {
        Lookup::Found(node)
    }
}

impl<'a> From<Option<&'a Node>> for Lookup<'a> {
    fn from(node: Option<&'a Node>) -> Self {
        node.map_or(Lookup::Absent, Lookup::Found)
    }
}

/// Fixed path into a document tree, e.g. `/doc/bibliographic-data/parties`.
///
/// Numeric segments index into lists; name segments select object entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Splits on `/` (or `.`), ignoring empty segments.
    pub fn parse(path: &str) -> Self {
        let mut out = Self::root();
        for segment in path.split(['/', '.']).filter(|s| !s.is_empty()) {
            match segment.parse::<usize>() {
                Ok(index) => out.segments.push(Segment::Index(index)),
                Err(_) => out.segments.push(Segment::Key(segment.into())),
            }
        }
        out
    }

    /// Appends a name segment.
    pub fn in_(mut self, key: &str) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn resolve<'a>(&self, tree: &'a Node) -> Lookup<'a> {
        let mut current = tree;
        for segment in &self.segments {
            let next = match (segment, current) {
                (Segment::Key(key), Node::Object(map)) => map.get(key),
                (Segment::Index(index), Node::List(items)) => items.get(*index),
                // A numeric name is still a valid element name.
                (Segment::Index(index), Node::Object(map)) => map.get(&index.to_string()),
                _ => None,
            };
            match next {
                Some(node) => current = node,
                None => return Lookup::Absent,
            }
        }
        Lookup::Found(current)
    }
}

pub fn resolve<'a>(tree: &'a Node, path: &str) -> Lookup<'a> {
    TreePath::parse(path).resolve(tree)
}
