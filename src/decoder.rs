//! ST.36 register document decoder.
//!
//! Decoding is driven by [`RULES`], a flat table mapping a fixed tree path to
//! a record field and the shape used to extract it.

use crate::error::{RegisterError, Result};
use crate::normalize::{normalize_dict, normalize_list};
use crate::tree::{parse_badgerfish, Map, Node, TEXT_KEY};
use crate::types::{BibliographicRecord, Party, Title};
use crate::xml_path::{Lookup, TreePath};

const EVENT_DATE_KEY: &str = "date_of_procedural_status";
const MAX_ADDRESS_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ApplicationReference,
    PublicationReference,
    Title,
    ClassificationsIpcr,
    PctOrRegionalFiling,
    PctOrRegionalPublishing,
    Applicants,
    Inventors,
    Agents,
    Correspondents,
    PriorityClaims,
    DesignatedStates,
    ReferencesCited,
    OfficeSpecificBibdata,
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Mandatory `{lang, text}` pair.
    Title,
    /// Generic list, collapsing on `$`.
    List,
    /// Generic list, collapsing on the given wrapper element.
    ListOf(&'static str),
    /// Scalars under the given key of every list element, flattened.
    ScalarsOf(&'static str),
    /// List of items, keeping each item's `document_id` mapping.
    DocumentIds,
    /// List of citations, keeping `patcit.document_id.doc_number` of each.
    CitedNumbers,
    Parties,
    Dict,
    /// Generic list sorted by procedural status date.
    Events,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub path: &'static str,
    pub field: Field,
    pub shape: Shape,
}

const fn rule(path: &'static str, field: Field, shape: Shape) -> Rule {
    Rule { path, field, shape }
}

pub static RULES: &[Rule] = &[
    rule(
        "/dpma-patent-document/bibliographic-data/application-reference",
        Field::ApplicationReference,
        Shape::DocumentIds,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/publication-references/publication-reference",
        Field::PublicationReference,
        Shape::DocumentIds,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/invention-title",
        Field::Title,
        Shape::Title,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/classifications-ipcr/classification-ipcr",
        Field::ClassificationsIpcr,
        Shape::List,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/pct-or-regional-filing-data",
        Field::PctOrRegionalFiling,
        Shape::ListOf("document-id"),
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/pct-or-regional-publishing-data",
        Field::PctOrRegionalPublishing,
        Shape::ListOf("document-id"),
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/parties/applicants/applicant",
        Field::Applicants,
        Shape::Parties,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/parties/inventors/inventor",
        Field::Inventors,
        Shape::Parties,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/parties/agents/agent",
        Field::Agents,
        Shape::Parties,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/parties/correspondence-address",
        Field::Correspondents,
        Shape::Parties,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/priority-claims/priority-claim",
        Field::PriorityClaims,
        Shape::List,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/designation-of-states/designation-pct/regional",
        Field::DesignatedStates,
        Shape::ScalarsOf("country"),
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/references-cited/citation",
        Field::ReferencesCited,
        Shape::CitedNumbers,
    ),
    rule(
        "/dpma-patent-document/bibliographic-data/office-specific-bib-data",
        Field::OfficeSpecificBibdata,
        Shape::Dict,
    ),
    rule(
        "/dpma-patent-document/events/event-data",
        Field::Events,
        Shape::Events,
    ),
];

/// Value extracted by one rule, before it is stored in the record.
enum Extracted {
    Title(Title),
    Nodes(Vec<Node>),
    Strings(Vec<String>),
    Parties(Vec<Party>),
    Dict(Map),
}

/// Parses ST.36 XML bytes into the generic tree without applying any rule.
pub fn decode_tree(xml: &[u8]) -> Result<Node> {
    parse_badgerfish(xml)
}

pub fn decode(xml: &[u8]) -> Result<BibliographicRecord> {
    let tree = decode_tree(xml)?;
    decode_document(&tree)
}

pub fn decode_document(tree: &Node) -> Result<BibliographicRecord> {
    let mut record = BibliographicRecord::default();
    for rule in RULES {
        let lookup = TreePath::parse(rule.path).resolve(tree);
        let value = extract(rule, lookup)?;
        assign(&mut record, rule.field, value)?;
    }
    Ok(record)
}

fn extract(rule: &Rule, lookup: Lookup<'_>) -> Result<Extracted> {
    let value = match rule.shape {
        Shape::Title => Extracted::Title(decode_title(lookup)?),
        Shape::List => Extracted::Nodes(normalize_list(lookup, TEXT_KEY)),
        Shape::ListOf(wrapper) => Extracted::Nodes(normalize_list(lookup, wrapper)),
        Shape::ScalarsOf(key) => {
            let mut scalars = Vec::new();
            for item in normalize_list(lookup, TEXT_KEY) {
                for value in elements(item.get(key)) {
                    match value {
                        Node::Text(text) => scalars.push(text.clone()),
                        _ => tracing::warn!(path = rule.path, key, "Skipping non-scalar value"),
                    }
                }
            }
            Extracted::Strings(scalars)
        }
        Shape::DocumentIds => Extracted::Nodes(
            normalize_list(lookup, TEXT_KEY)
                .into_iter()
                .filter_map(|item| {
                    let document_id = item.get("document_id").cloned();
                    if document_id.is_none() {
                        tracing::warn!(path = rule.path, "Reference lacks document-id");
                    }
                    document_id
                })
                .collect(),
        ),
        Shape::CitedNumbers => {
            let mut numbers = Vec::new();
            for citation in normalize_list(lookup, TEXT_KEY) {
                let patents = elements(citation.get("patcit"));
                if patents.is_empty() {
                    // Non-patent literature.
                    tracing::debug!(path = rule.path, "Skipping citation without patcit");
                }
                for patent in patents {
                    match patent
                        .get("document_id")
                        .and_then(|id| id.get("doc_number"))
                        .and_then(Node::as_text)
                    {
                        Some(number) => numbers.push(number.to_string()),
                        None => tracing::warn!(
                            path = rule.path,
                            "Citation lacks document-id/doc-number"
                        ),
                    }
                }
            }
            Extracted::Strings(numbers)
        }
        Shape::Parties => Extracted::Parties(decode_parties(lookup)),
        Shape::Dict => Extracted::Dict(normalize_dict(lookup)),
        Shape::Events => Extracted::Nodes(decode_events(lookup)?),
    };
    Ok(value)
}

fn assign(record: &mut BibliographicRecord, field: Field, value: Extracted) -> Result<()> {
    match (field, value) {
        (Field::Title, Extracted::Title(title)) => record.title = title,
        (Field::ApplicationReference, Extracted::Nodes(v)) => record.application_reference = v,
        (Field::PublicationReference, Extracted::Nodes(v)) => record.publication_reference = v,
        (Field::ClassificationsIpcr, Extracted::Nodes(v)) => record.classifications.ipcr = v,
        (Field::PctOrRegionalFiling, Extracted::Nodes(v)) => record.pct_or_regional_data.filing = v,
        (Field::PctOrRegionalPublishing, Extracted::Nodes(v)) => {
            record.pct_or_regional_data.publishing = v
        }
        (Field::Applicants, Extracted::Parties(v)) => record.applicants = v,
        (Field::Inventors, Extracted::Parties(v)) => record.inventors = v,
        (Field::Agents, Extracted::Parties(v)) => record.agents = v,
        (Field::Correspondents, Extracted::Parties(v)) => record.correspondents = v,
        (Field::PriorityClaims, Extracted::Nodes(v)) => record.priority_claims = v,
        (Field::DesignatedStates, Extracted::Strings(v)) => record.designated_states = v,
        (Field::ReferencesCited, Extracted::Strings(v)) => record.references_cited = v,
        (Field::OfficeSpecificBibdata, Extracted::Dict(v)) => record.office_specific_bibdata = v,
        (Field::Events, Extracted::Nodes(v)) => record.events = v,
        (field, _) => {
            return Err(RegisterError::UnexpectedShape(format!(
                "decoder rule for {field:?} produced a value of the wrong shape"
            )))
        }
    }
    Ok(())
}

fn decode_title(lookup: Lookup<'_>) -> Result<Title> {
    let title = match lookup {
        Lookup::Absent => {
            return Err(RegisterError::UnexpectedShape(
                "invention-title is missing".to_string(),
            ))
        }
        // Several languages: the first one wins.
        Lookup::Found(Node::List(items)) => items.first().ok_or_else(|| {
            RegisterError::UnexpectedShape("invention-title is empty".to_string())
        })?,
        Lookup::Found(node) => node,
    };

    let lang = title
        .get("@lang")
        .and_then(Node::as_text)
        .ok_or_else(|| {
            RegisterError::UnexpectedShape("invention-title lacks lang attribute".to_string())
        })?;
    let text = title
        .get(TEXT_KEY)
        .and_then(Node::as_text)
        .ok_or_else(|| RegisterError::UnexpectedShape("invention-title has no text".to_string()))?;

    Ok(Title {
        lang: lang.to_lowercase(),
        text: text.to_string(),
    })
}

/// Elements of an already normalized value: a list's items, or the value itself.
fn elements(node: Option<&Node>) -> &[Node] {
    match node {
        None => &[],
        Some(Node::List(items)) => items,
        Some(single) => std::slice::from_ref(single),
    }
}

/// Decodes applicant, inventor, agent or correspondent nodes.
fn decode_parties(lookup: Lookup<'_>) -> Vec<Party> {
    let nodes = elements(lookup.node());

    let mut parties = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Some(addressbook) = node.get("addressbook") else {
            tracing::warn!("Skipping party without addressbook");
            continue;
        };
        let address = addressbook.get("address");
        let field = |node: Option<&Node>, key: &str| {
            node.and_then(|n| n.get(key))
                .and_then(Node::text)
                .unwrap_or_default()
                .to_string()
        };

        let address_lines = (1..=MAX_ADDRESS_LINES)
            .filter_map(|index| {
                address
                    .and_then(|a| a.get(&format!("address-{index}")))
                    .and_then(Node::text)
                    .map(ToString::to_string)
            })
            .collect();

        parties.push(Party {
            name: field(Some(addressbook), "name"),
            text: field(Some(addressbook), "text"),
            country: field(address, "country"),
            address: address_lines,
        });
    }
    parties
}

/// Decodes procedural events, sorted ascending by date. Sorting is stable.
fn decode_events(lookup: Lookup<'_>) -> Result<Vec<Node>> {
    let events = normalize_list(lookup, TEXT_KEY);
    let mut keyed = Vec::with_capacity(events.len());
    for (position, event) in events.into_iter().enumerate() {
        let date = event
            .get(EVENT_DATE_KEY)
            .and_then(Node::text)
            .map(ToString::to_string)
            .ok_or_else(|| {
                RegisterError::UnexpectedShape(format!(
                    "event #{position} has no {EVENT_DATE_KEY}"
                ))
            })?;
        keyed.push((date, event));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, event)| event).collect())
}
