pub mod fields;
pub mod links;
pub mod needles;
pub mod taxonomy;

use scraper::Html;

use crate::model::{NeedleSize, PatternRecord};
use crate::translate::TextNormalizer;

/// Per-page pipeline: fields → needle sizes → links → notes translation → classification.
pub fn process_page(html: &str, base_url: &str, normalizer: &TextNormalizer) -> PatternRecord {
    let doc = Html::parse_document(html);
    let fields = fields::extract(&doc, base_url);

    let needle_size = fields.needle.map(|raw| NeedleSize {
        normalized: needles::normalize(&raw),
        raw,
    });
    let download_links = links::extract(&doc);
    drop(doc);

    let full_text = fields.notes.as_deref().map(|notes| normalizer.normalize(notes));
    let class = taxonomy::classify(fields.description.as_deref(), full_text.as_deref());

    PatternRecord {
        pattern_page: fields.pattern_page,
        name: fields.name,
        description: fields.description,
        designer: fields.designer,
        craft: fields.craft,
        category: fields.category,
        needle_size,
        sizes_available: fields.sizes_available,
        languages: fields.languages,
        suggested_yarn: fields.suggested_yarn,
        attributes: fields.attributes,
        full_text,
        techniques: class.techniques,
        shape: class.shape,
        download_links,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::TranslateError;
    use crate::model::{Shape, Technique};
    use crate::translate::{Passthrough, Translator};

    const BASE: &str = "https://www.ravelry.com";

    struct Down;

    impl Translator for Down {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            Err(TranslateError::Malformed("service unavailable".into()))
        }
    }

    /// Pretends every note is German about a tree.
    struct ToTree;

    impl Translator for ToTree {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslateError> {
            Ok("a small tree, worked flat".into())
        }
    }

    fn normalizer(t: Arc<dyn Translator>) -> TextNormalizer {
        TextNormalizer::new(t, "en", 0, Duration::ZERO)
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn round_ball_end_to_end() {
        let r = process_page(&fixture("round_ball"), BASE, &normalizer(Arc::new(Passthrough)));
        assert_eq!(r.craft.as_deref(), Some("Knitting"));
        assert_eq!(r.category.as_deref(), Some("Softies → Other"));
        let needle = r.needle_size.as_ref().unwrap();
        assert_eq!(needle.raw, "5 mm");
        assert!(needle.normalized.contains("US 8 (5.0 mm)"));
        assert_eq!(r.shape, Shape::Sphere);
        assert_eq!(
            r.techniques.iter().copied().collect::<Vec<_>>(),
            vec![Technique::Increases, Technique::WorkedInTheRound]
        );
        assert_eq!(r.download_links.len(), 2);
        assert!(r.download_links.contains("https://www.ravelry.com/dl/round-ball/download"));
    }

    #[test]
    fn classification_uses_translated_text() {
        let html = r#"<html><body><div class="notes">Ein kleiner Baum, flach gestrickt</div></body></html>"#;
        let r = process_page(html, BASE, &normalizer(Arc::new(ToTree)));
        assert_eq!(r.full_text.as_deref(), Some("a small tree, worked flat"));
        assert_eq!(r.shape, Shape::Cone);
        assert!(r.techniques.contains(&Technique::WorkedFlat));
    }

    #[test]
    fn translation_failure_keeps_source_text() {
        let html = r#"<html><body><div class="notes">Runde   Kugel</div></body></html>"#;
        let r = process_page(html, BASE, &normalizer(Arc::new(Down)));
        assert_eq!(r.full_text.as_deref(), Some("Runde Kugel"));
        assert_eq!(r.shape, Shape::Unknown);
    }

    #[test]
    fn missing_notes() {
        let r = process_page(&fixture("no_notes"), BASE, &normalizer(Arc::new(Down)));
        assert!(r.full_text.is_none());
        assert!(r.techniques.is_empty());
        assert_eq!(r.shape, Shape::Unknown);
        assert!(r.needle_size.is_none());

        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("full_text").is_none());
        assert_eq!(json["techniques"], serde_json::json!([]));
    }

    #[test]
    fn description_alone_can_set_shape() {
        let html = r#"<html><head><script type="application/ld+json">
            {"name": "Mini Box", "description": "A gift box"}</script></head><body></body></html>"#;
        let r = process_page(html, BASE, &normalizer(Arc::new(Down)));
        assert!(r.full_text.is_none());
        assert_eq!(r.shape, Shape::Cube);
    }
}
