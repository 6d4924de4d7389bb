use std::collections::BTreeSet;

use crate::model::{Shape, Technique};

/// Shape rules in priority order; the first rule with any keyword in the text wins.
pub const SHAPE_RULES: &[(Shape, &[&str])] = &[
    (Shape::Sphere, &["ball", "round", "sphere", "egg"]),
    (Shape::Cube, &["cube", "box", "square plush", "block"]),
    (Shape::Cone, &["cone", "tree", "hat cone"]),
    (Shape::Pyramid, &["pyramid", "tetra"]),
    (Shape::Cylinder, &["tube", "sock", "sleeve", "leg warmer"]),
    (Shape::Softie, &["toy", "amigurumi", "softie", "plush"]),
];

pub struct Classification {
    pub shape: Shape,
    pub techniques: BTreeSet<Technique>,
}

/// Classify the description and normalized notes of one page.
pub fn classify(description: Option<&str>, full_text: Option<&str>) -> Classification {
    let text = format!(
        "{} {}",
        description.unwrap_or_default(),
        full_text.unwrap_or_default()
    )
    .to_lowercase();

    Classification {
        shape: detect_shape(&text),
        techniques: detect_techniques(&text),
    }
}

/// Expects lower-cased text.
pub fn detect_shape(text: &str) -> Shape {
    SHAPE_RULES
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| text.contains(k)))
        .map(|&(shape, _)| shape)
        .unwrap_or(Shape::Unknown)
}

/// Expects lower-cased text.
pub fn detect_techniques(text: &str) -> BTreeSet<Technique> {
    Technique::ALL
        .into_iter()
        .filter(|t| text.contains(t.phrase()))
        .collect()
}
