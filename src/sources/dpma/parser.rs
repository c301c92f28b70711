use crate::error::{RegisterError, Result};
use crate::types::ResolvedReference;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tl::VDom;

/// Body marker of the F5 web application firewall challenge page.
pub const FIREWALL_MARKER: &[u8] = b"/TSPD";
pub const NO_RESULTS_MARKER: &[u8] = b"<span>0 result/s</span>";
/// Path segment of the detail page the register redirects to on a single hit.
pub const DETAIL_PATH: &str = "/pat/register";
/// Form field taking the file reference or publication number.
pub const QUERY_FIELD: &str = "akzPn";

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?AKZ=(.+?)&").unwrap());
static ST36_HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"VIEW=st36$").unwrap());
static PDF_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"register/PAT_.*VIEW=pdf").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl SearchForm {
    /// Sets `name`, replacing a value carried over from the page.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }
}

pub fn normalize_text(input: &str) -> String {
    WHITESPACE_RE
        .replace_all(input.trim(), " ")
        .trim()
        .to_string()
}

/// Extracts the file reference from an `href` carrying `?AKZ=<reference>&`.
pub fn parse_reference_href(href: &str) -> Option<String> {
    let captures = REFERENCE_RE.captures(href)?;
    let raw = &captures[1];
    let decoded = urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(decoded)
}

/// Reads the first form on the register search page.
pub fn parse_search_form(html: &str, page_url: &str) -> Result<SearchForm> {
    let dom = parse_dom(html)?;
    let parser = dom.parser();

    let form = dom
        .nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .find(|tag| tag.name().as_utf8_str() == "form")
        .ok_or_else(|| RegisterError::MissingLink(format!("no search form on {page_url}")))?;

    let action = attr(form, "action").unwrap_or_default();
    let action = resolve_url(page_url, &action)?;

    let mut fields = Vec::new();
    for node in form.children().all(parser) {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        if tag.name().as_utf8_str() != "input" {
            continue;
        }
        let Some(name) = attr(tag, "name") else {
            continue;
        };
        let kind = attr(tag, "type").unwrap_or_default().to_ascii_lowercase();
        match kind.as_str() {
            "submit" | "button" | "image" | "reset" | "file" => continue,
            "checkbox" | "radio" if tag.attributes().get("checked").is_none() => continue,
            _ => {}
        }
        fields.push((name, attr(tag, "value").unwrap_or_default()));
    }

    Ok(SearchForm { action, fields })
}

/// Parses the reference from a detail page reached through a single-hit redirect.
pub fn parse_detail_reference(html: &str) -> Result<ResolvedReference> {
    let dom = parse_dom(html)?;
    for tag in anchors(&dom) {
        let Some(href) = attr(tag, "href") else {
            continue;
        };
        if let Some(reference) = parse_reference_href(&href) {
            return Ok(ResolvedReference::new(reference, None));
        }
    }
    tracing::error!("Could not parse document reference from detail page");
    Err(RegisterError::MissingLink(
        "no reference link on register detail page".to_string(),
    ))
}

/// Parses all `(reference, label)` pairs from a result list page.
pub fn parse_result_list(html: &str) -> Result<Vec<ResolvedReference>> {
    let dom = parse_dom(html)?;
    let parser = dom.parser();
    let mut results = Vec::new();

    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        if tag.name().as_utf8_str() != "div" || !class_set(tag).contains("dpma-ansichtcontainer")
        {
            continue;
        }
        let link = tag
            .children()
            .all(parser)
            .iter()
            .filter_map(|child| child.as_tag())
            .find(|child| child.name().as_utf8_str() == "a");
        let Some(link) = link else {
            continue;
        };
        let href = attr(link, "href").unwrap_or_default();
        let Some(reference) = parse_reference_href(&href) else {
            tracing::error!(href = %href, "Could not parse document reference from result link");
            return Err(RegisterError::MissingLink(format!(
                "result link without reference: {href}"
            )));
        };
        let label = normalize_text(&link.inner_text(parser));
        results.push(ResolvedReference::new(
            reference,
            (!label.is_empty()).then_some(label),
        ));
    }

    Ok(results)
}

/// Finds the ST.36 XML download link on a detail page.
pub fn find_st36_link(html: &str) -> Result<Option<String>> {
    let dom = parse_dom(html)?;
    let by_name = anchors(&dom)
        .find(|tag| attr(tag, "name").as_deref() == Some("st36xml"))
        .and_then(|tag| attr(tag, "href"));
    if by_name.is_some() {
        return Ok(by_name);
    }
    let by_href = anchors(&dom)
        .filter_map(|tag| attr(tag, "href"))
        .find(|href| ST36_HREF_RE.is_match(href));
    Ok(by_href)
}

/// Finds the PDF download link on a detail page.
pub fn find_pdf_link(html: &str) -> Result<Option<String>> {
    let dom = parse_dom(html)?;
    let href = anchors(&dom)
        .filter_map(|tag| attr(tag, "href"))
        .find(|href| PDF_HREF_RE.is_match(href));
    Ok(href)
}

pub(crate) fn parse_dom(html: &str) -> Result<VDom<'_>> {
    tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| RegisterError::MissingLink(format!("Failed to parse HTML: {e}")))
}

fn anchors<'a>(dom: &'a VDom<'a>) -> impl Iterator<Item = &'a tl::HTMLTag<'a>> {
    dom.nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter(|tag| tag.name().as_utf8_str() == "a")
}

/// Attribute value with `&amp;` unescaped.
fn attr(tag: &tl::HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|value| value.as_utf8_str().replace("&amp;", "&"))
}

fn class_set(tag: &tl::HTMLTag) -> HashSet<String> {
    attr(tag, "class")
        .map(|classes| classes.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn resolve_url(base_url: &str, href: &str) -> Result<String> {
    let base = reqwest::Url::parse(base_url)
        .map_err(|e| RegisterError::Transport(format!("Invalid page URL {base_url}: {e}")))?;
    base.join(href)
        .map(|url| url.to_string())
        .map_err(|e| RegisterError::Transport(format!("Failed to resolve URL {href}: {e}")))
}
