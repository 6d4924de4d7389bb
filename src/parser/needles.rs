use std::sync::LazyLock;

use regex::Regex;

static MM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*mm").unwrap());
static US_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"us\s*(\d+(?:\.\d+)?)").unwrap());

/// US needle size → diameter in millimetres.
pub const US_NEEDLES: &[(&str, f64)] = &[
    ("0", 2.0),
    ("1", 2.25),
    ("2", 2.75),
    ("3", 3.25),
    ("4", 3.5),
    ("5", 3.75),
    ("6", 4.0),
    ("7", 4.5),
    ("8", 5.0),
    ("9", 5.5),
    ("10", 6.0),
    ("10.5", 6.5),
    ("11", 8.0),
    ("13", 9.0),
    ("15", 10.0),
];

const MM_TOLERANCE: f64 = 0.15;

/// Render free-text needle sizes as `US x (y mm)` fragments.
///
/// Metric values come first, then explicit US values, each in the order they
/// appear. Text with no recognizable size is returned as-is.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let lower = raw.to_lowercase();
    let mut out = Vec::new();

    for caps in MM_RE.captures_iter(&lower) {
        let Ok(mm) = caps[1].parse::<f64>() else {
            continue;
        };
        match us_for_mm(mm) {
            Some(us) => out.push(format!("US {} ({} mm)", us, fmt_mm(mm))),
            None => out.push(format!("{} mm", fmt_mm(mm))),
        }
    }

    for caps in US_RE.captures_iter(&lower) {
        let us = &caps[1];
        match mm_for_us(us) {
            Some(mm) => out.push(format!("US {} ({} mm)", us, fmt_mm(mm))),
            None => out.push(format!("US {}", us)),
        }
    }

    if out.is_empty() {
        raw.to_string()
    } else {
        out.join(", ")
    }
}

/// Closest table entry strictly within tolerance; ties go to the larger size.
fn us_for_mm(mm: f64) -> Option<&'static str> {
    US_NEEDLES
        .iter()
        .rev()
        .map(|&(us, v)| (us, (v - mm).abs()))
        .filter(|&(_, diff)| diff < MM_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(us, _)| us)
}

fn mm_for_us(us: &str) -> Option<f64> {
    US_NEEDLES.iter().find(|(k, _)| *k == us).map(|&(_, mm)| mm)
}

// Whole numbers keep one decimal ("5.0"), others print as parsed ("2.25").
fn fmt_mm(mm: f64) -> String {
    if mm.fract() == 0.0 {
        format!("{:.1}", mm)
    } else {
        format!("{}", mm)
    }
}
