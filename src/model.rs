use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// One structured record per input page.
///
/// Scalars and page-sourced collections are omitted from the JSON when the
/// page did not carry them. `shape`, `techniques` and `download_links` are
/// always written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needle_size: Option<NeedleSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes_available: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub suggested_yarn: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default)]
    pub techniques: BTreeSet<Technique>,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub download_links: BTreeSet<String>,
}

/// Needle text as found on the page plus its dual-unit rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedleSize {
    pub raw: String,
    pub normalized: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Sphere,
    Cube,
    Cone,
    Pyramid,
    Cylinder,
    Softie,
    #[default]
    Unknown,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Sphere => "sphere",
            Shape::Cube => "cube",
            Shape::Cone => "cone",
            Shape::Pyramid => "pyramid",
            Shape::Cylinder => "cylinder",
            Shape::Softie => "softie",
            Shape::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Closed vocabulary of construction methods.
///
/// Variants are declared in lexicographic order of their phrases so the
/// derived `Ord` (and therefore `BTreeSet` iteration) is alphabetical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Technique {
    #[serde(rename = "bottom-up")]
    BottomUp,
    #[serde(rename = "decreases")]
    Decreases,
    #[serde(rename = "grafting")]
    Grafting,
    #[serde(rename = "increases")]
    Increases,
    #[serde(rename = "modular")]
    Modular,
    #[serde(rename = "pick up stitches")]
    PickUpStitches,
    #[serde(rename = "seamed")]
    Seamed,
    #[serde(rename = "short rows")]
    ShortRows,
    #[serde(rename = "top-down")]
    TopDown,
    #[serde(rename = "worked flat")]
    WorkedFlat,
    #[serde(rename = "worked in the round")]
    WorkedInTheRound,
}

impl Technique {
    pub const ALL: [Technique; 11] = [
        Technique::ShortRows,
        Technique::Increases,
        Technique::Decreases,
        Technique::WorkedFlat,
        Technique::WorkedInTheRound,
        Technique::TopDown,
        Technique::BottomUp,
        Technique::Modular,
        Technique::Seamed,
        Technique::PickUpStitches,
        Technique::Grafting,
    ];

    pub fn phrase(self) -> &'static str {
        match self {
            Technique::BottomUp => "bottom-up",
            Technique::Decreases => "decreases",
            Technique::Grafting => "grafting",
            Technique::Increases => "increases",
            Technique::Modular => "modular",
            Technique::PickUpStitches => "pick up stitches",
            Technique::Seamed => "seamed",
            Technique::ShortRows => "short rows",
            Technique::TopDown => "top-down",
            Technique::WorkedFlat => "worked flat",
            Technique::WorkedInTheRound => "worked in the round",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.phrase())
    }
}

/// A page that could not be turned into a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub file: String,
    pub error: String,
}

/// Summary written next to the aggregate after a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub shapes: BTreeMap<Shape, usize>,
    pub failures: Vec<PageFailure>,
}
