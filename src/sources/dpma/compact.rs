use crate::config::DEFAULT_BASE_URL;
use crate::error::{RegisterError, Result};
use crate::types::RegistryDocument;
use regex::Regex;
use std::sync::LazyLock;

const LOCAL_CSS: &str = "./assets/dpmabasis_d.css";

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Attribute condition selecting an element for removal.
#[derive(Debug, Clone, Copy)]
enum Filter {
    /// `class` contains the given class name.
    Class(&'static str),
    /// Attribute equals the given value.
    Attr(&'static str, &'static str),
    /// Attribute starts with the given prefix.
    AttrPrefix(&'static str, &'static str),
}

/// Elements removed, with all their content, from the register table.
static REMOVALS: &[(&str, Filter)] = &[
    ("div", Filter::Class("objektblaettern")),
    ("a", Filter::Class("button")),
    ("br", Filter::Attr("clear", "none")),
    ("div", Filter::Class("clearer")),
    ("p", Filter::Attr("style", "clear:both")),
    ("div", Filter::Class("t-invisible")),
    ("div", Filter::Class("regauskunft")),
    ("a", Filter::AttrPrefix("href", "./register:hideverfahrenstabelle")),
    ("a", Filter::Class("hidden")),
];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(/?)([a-z][a-z0-9]*)\b([^>]*)>").unwrap());
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*"([^"]*)""#).unwrap());
static TABLE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<table\b[^>]*\bid="verfahrensdaten_tabelle"[^>]*>"#).unwrap()
});
static TABLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<(/?)table\b").unwrap());
static REGISTER_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a\b[^>]*\bhref="\./register[^"]*"[^>]*>(.*?)</a>"#).unwrap());
static INSPECTION_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\./PatSchrifteneinsicht"#).unwrap());

impl RegistryDocument {
    /// Reduces the detail page to the register table, framed by links to
    /// the HTML and PDF sources.
    pub fn html_compact(&self) -> Result<String> {
        let html = self.html.as_deref().ok_or_else(|| {
            RegisterError::UnexpectedShape(format!("document {} has no HTML", self.identifier))
        })?;
        let html = String::from_utf8_lossy(html);
        let mut content = register_table(&html)
            .ok_or_else(|| {
                RegisterError::UnexpectedShape(format!(
                    "register table missing for document {}",
                    self.identifier
                ))
            })?
            .to_string();
        for (name, filter) in REMOVALS {
            content = remove_elements(&content, name, *filter);
        }
        content = INSPECTION_LINK_RE
            .replace_all(&content, format!(r#"href="{DEFAULT_BASE_URL}PatSchrifteneinsicht"#))
            .into_owned();
        content = REGISTER_LINK_RE.replace_all(&content, "$1").into_owned();
        content = content.replace("Verfahrensansicht \u{a0} \u{a0}", "");

        Ok(format!(
            r#"<html>
    <head>
        <link type="text/css" rel="stylesheet" href="{LOCAL_CSS}"/>
        <style type="text/css"><!-- ins {{background: #bfb}} del{{background: #fcc}} ins,del {{text-decoration: none}} --></style>
    </head>
    <body id="body">
        <div id="sourcelinkbox" align="left" style="padding: 10px">
            Quelle:
            <a href="{url_html}" target="_blank">HTML</a>,
            <a href="{url_pdf}" target="_blank">PDF</a>
        </div>
        {content}
    </body>
</html>"#,
            url_html = self.url_html,
            url_pdf = self.url_pdf,
        ))
    }
}

impl Filter {
    fn matches(self, attributes: &str) -> bool {
        let value = |wanted: &str| {
            ATTR_RE
                .captures_iter(attributes)
                .find(|caps| caps[1].eq_ignore_ascii_case(wanted))
                .map(|caps| caps[2].to_string())
        };
        match self {
            Filter::Class(class) => value("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            Filter::Attr(name, expected) => value(name).is_some_and(|v| v == expected),
            Filter::AttrPrefix(name, prefix) => value(name).is_some_and(|v| v.starts_with(prefix)),
        }
    }
}

/// Removes every `name` element matching `filter`, including its content.
/// An element left open until the end of `html` is kept.
fn remove_elements(html: &str, name: &str, filter: Filter) -> String {
    let is_void = VOID_TAGS.contains(&name);
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    // Start offset and nesting depth of the element being removed.
    let mut removing: Option<(usize, usize)> = None;

    for caps in TAG_RE.captures_iter(html) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        if !caps[2].eq_ignore_ascii_case(name) {
            continue;
        }
        let closing = !caps[1].is_empty();
        let self_closing = is_void || caps[3].trim_end().ends_with('/');

        if let Some((start, depth)) = removing {
            if closing {
                if depth == 1 {
                    removing = None;
                    copied = tag.end();
                } else {
                    removing = Some((start, depth - 1));
                }
            } else if !self_closing {
                removing = Some((start, depth + 1));
            }
            continue;
        }

        if closing || !filter.matches(&caps[3]) {
            continue;
        }
        out.push_str(&html[copied..tag.start()]);
        if self_closing {
            copied = tag.end();
        } else {
            removing = Some((tag.start(), 1));
            copied = tag.start();
        }
    }

    out.push_str(&html[copied..]);
    out
}

/// Source slice of the register table, including nested tables.
fn register_table(html: &str) -> Option<&str> {
    let start = TABLE_START_RE.find(html)?;
    let mut depth = 1usize;
    for tag in TABLE_TAG_RE.captures_iter(&html[start.end()..]) {
        let whole = tag.get(0)?;
        if tag[1].is_empty() {
            depth += 1;
            continue;
        }
        depth -= 1;
        if depth == 0 {
            let close_from = start.end() + whole.end();
            let close_len = html[close_from..].find('>')? + 1;
            return Some(&html[start.start()..close_from + close_len]);
        }
    }
    None
}
