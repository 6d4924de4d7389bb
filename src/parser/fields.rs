use std::collections::BTreeSet;
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

static FIELD_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.field.core_item_content__field, div.core_item_content__field--languages")
        .unwrap()
});
static FIELD_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("label.core_item_content__label").unwrap());
static FIELD_VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.value").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static TAG_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.tag_set li.tag a").unwrap());
static NOTES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.notes").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

static REPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/patterns/library/[^/]+/report").unwrap());

const CATEGORY_SEPARATOR: &str = " → ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Craft,
    Category,
    Needle,
    Yarn,
    SizesAvailable,
    Languages,
}

/// Label substrings in evaluation order. A label containing several of these
/// is assigned to the last one.
pub const FIELD_RULES: &[(&str, FieldKind)] = &[
    ("craft", FieldKind::Craft),
    ("category", FieldKind::Category),
    ("needle", FieldKind::Needle),
    ("yarn", FieldKind::Yarn),
    ("sizes available", FieldKind::SizesAvailable),
    ("languages", FieldKind::Languages),
];

/// Raw values pulled from one page, before any normalization.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageFields {
    pub pattern_page: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub designer: Option<String>,
    pub craft: Option<String>,
    pub category: Option<String>,
    pub needle: Option<String>,
    pub sizes_available: Option<String>,
    pub languages: Vec<String>,
    pub suggested_yarn: BTreeSet<String>,
    pub attributes: Vec<String>,
    pub notes: Option<String>,
}

pub fn extract(doc: &Html, base_url: &str) -> PageFields {
    let mut fields = PageFields {
        pattern_page: pattern_page(doc, base_url),
        ..Default::default()
    };

    read_metadata(doc, &mut fields);
    read_field_blocks(doc, &mut fields);

    fields.attributes = doc
        .select(&TAG_LINK)
        .map(|a| clean(&a.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unique()
        .collect();

    fields.notes = doc
        .select(&NOTES)
        .next()
        .map(|n| clean(&n.text().join(" ")));

    if fields.name.is_none() {
        fields.name = doc
            .select(&TITLE)
            .next()
            .map(|t| clean(&t.text().collect::<String>()));
    }

    fields
}

/// Collapse runs of whitespace and trim.
pub fn clean(text: &str) -> String {
    text.split_whitespace().join(" ")
}

pub fn match_label(label: &str) -> Option<FieldKind> {
    let label = label.to_lowercase();
    FIELD_RULES
        .iter()
        .filter(|(needle, _)| label.contains(needle))
        .last()
        .map(|&(_, kind)| kind)
}

fn read_field_blocks(doc: &Html, fields: &mut PageFields) {
    for block in doc.select(&FIELD_BLOCK) {
        let (Some(label), Some(value)) = (
            block.select(&FIELD_LABEL).next(),
            block.select(&FIELD_VALUE).next(),
        ) else {
            debug!("field block without label or value, skipping");
            continue;
        };
        let label = clean(&label.text().collect::<String>());
        let Some(kind) = match_label(&label) else {
            continue;
        };
        let text = clean(&value.text().collect::<String>());

        match kind {
            FieldKind::Craft => fields.craft = Some(text),
            FieldKind::Category => {
                let parts = leaf_span_texts(value);
                fields.category = Some(if parts.is_empty() {
                    text
                } else {
                    parts.join(CATEGORY_SEPARATOR)
                });
            }
            FieldKind::Needle => fields.needle = Some(text),
            FieldKind::Yarn => {
                if !text.is_empty() {
                    fields.suggested_yarn.insert(text);
                }
            }
            FieldKind::SizesAvailable => fields.sizes_available = Some(text),
            FieldKind::Languages => {
                let mut langs = leaf_span_texts(value);
                if langs.is_empty() && !text.is_empty() {
                    langs.push(text);
                }
                for lang in langs {
                    if !fields.languages.contains(&lang) {
                        fields.languages.push(lang);
                    }
                }
            }
        }
    }
}

// Spans nested inside other spans would otherwise be counted twice.
fn leaf_span_texts(value: ElementRef<'_>) -> Vec<String> {
    value
        .select(&SPAN)
        .filter(|s| {
            !s.descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(|e| e.value().name() == "span")
        })
        .map(|s| clean(&s.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn read_metadata(doc: &Html, fields: &mut PageFields) {
    let Some(script) = doc.select(&LD_JSON).next() else {
        return;
    };
    let raw = script.text().collect::<String>();
    let json = match serde_json::from_str::<Value>(&raw) {
        Ok(json) => json,
        Err(e) => {
            debug!("ignoring undecodable ld+json block: {}", e);
            return;
        }
    };
    let item = match &json {
        Value::Array(items) => items.iter().find(|v| v.is_object()),
        Value::Object(_) => Some(&json),
        _ => None,
    };
    let Some(item) = item else {
        return;
    };

    let text_at = |v: Option<&Value>| v.and_then(Value::as_str).map(clean);
    fields.name = text_at(item.get("name"));
    fields.description = text_at(item.get("description"));
    fields.designer = text_at(item.get("brand").and_then(|b| b.get("name")));
}

fn pattern_page(doc: &Html, base_url: &str) -> Option<String> {
    let href = doc
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| REPORT_RE.is_match(href))?;
    let path = href.replace("/report", "");
    let base = Url::parse(base_url).ok()?;
    base.join(&path).ok().map(String::from)
}
