use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const LINK_HINTS: &[&str] = &[".pdf", "download", "pattern"];

/// Candidate download / pattern links anywhere in the document, deduplicated.
pub fn extract(doc: &Html) -> BTreeSet<String> {
    doc.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_candidate(href))
        .map(str::to_string)
        .collect()
}

fn is_candidate(href: &str) -> bool {
    let lower = href.to_lowercase();
    LINK_HINTS.iter().any(|h| lower.contains(h))
        && (href.contains("ravelry") || lower.starts_with("http"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(html: &str) -> Vec<String> {
        extract(&Html::parse_document(html)).into_iter().collect()
    }

    #[test]
    fn duplicates_collapse() {
        let got = links(
            r#"<a href="https://example.com/x.pdf">a</a>
               <a href="https://example.com/x.pdf">b</a>"#,
        );
        assert_eq!(got, vec!["https://example.com/x.pdf"]);
    }

    #[test]
    fn relative_links_need_ravelry() {
        let got = links(
            r#"<a href="/patterns/library/foo">rel</a>
               <a href="/ravelry/download/1">rav</a>
               <a href="https://shop.example/Download?id=2">abs</a>
               <a href="https://example.com/about">about</a>
               <a>no href</a>"#,
        );
        assert_eq!(
            got,
            vec!["/ravelry/download/1", "https://shop.example/Download?id=2"]
        );
    }

    #[test]
    fn ravelry_check_is_case_sensitive() {
        let got = links(
            r#"<a href="/RAVELRY/download/1">upper</a>
               <a href="/ravelry/Download/2">lower</a>"#,
        );
        assert_eq!(got, vec!["/ravelry/Download/2"]);
    }

    #[test]
    fn hint_match_ignores_case() {
        let got = links(r#"<a href="https://cdn.example/Hat.PDF">pdf</a>"#);
        assert_eq!(got, vec!["https://cdn.example/Hat.PDF"]);
    }
}
