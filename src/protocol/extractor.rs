// Field extractor - label-driven parsing of sensor protocol lines
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::reading::{FieldKind, FieldSet};

/// Optionally signed, optionally fractional numeric literal.
const NUMBER: &str = r"[-+]?\d+(?:\.\d+)?";

struct LabelRule {
    kind: FieldKind,
    pattern: Regex,
}

/// One independent rule per label token. The firmware concatenates fields
/// without clean delimiters, so every rule scans the whole line rather than
/// relying on position. Unit suffixes (`%`, `°C`, `uS/cm`) follow the
/// captured number and are simply not captured.
static LABEL_RULES: LazyLock<Vec<LabelRule>> = LazyLock::new(|| {
    let rule = |kind: FieldKind, label: &str| LabelRule {
        kind,
        pattern: Regex::new(&format!(r"{label}\s*({NUMBER})")).unwrap(),
    };
    vec![
        rule(FieldKind::Latitude, "Lat:"),
        rule(FieldKind::Longitude, "Lon:"),
        rule(FieldKind::Bearing, "Heading:"),
        rule(FieldKind::Nitrogen, r"\(N\):"),
        rule(FieldKind::Phosphorus, r"\(P\):"),
        rule(FieldKind::Potassium, r"\(K\):"),
        // Moisture has no colon or space before the value in the wild.
        rule(FieldKind::Moisture, r"\(M\):?"),
        rule(FieldKind::Temperature, "Temp:"),
        rule(FieldKind::Conductivity, r"\bC:"),
        rule(FieldKind::Ph, "pH:"),
    ]
});

/// `Label: value` pairs in the tail of a legacy comma-delimited line.
static LEGACY_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(pH|[NPKM])\s*:\s*({NUMBER})")).unwrap());

/// Head of the legacy line is positional: lat, lon, satellites, bearing.
const LEGACY_HEAD: [FieldKind; 4] = [
    FieldKind::Latitude,
    FieldKind::Longitude,
    FieldKind::Satellites,
    FieldKind::Bearing,
];

/// Extract every recognized field from one complete line.
///
/// Two line shapes feed the same contract: the labeled multi-line format and
/// the legacy single-line comma-delimited format, sniffed apart cheaply. A
/// blank or unmatched line yields an empty set; a malformed numeric after a
/// recognized label drops that one field, not the whole line. Humidity has
/// no label in either shape.
pub fn extract(line: &str) -> FieldSet {
    let line = line.trim();
    if line.is_empty() {
        return FieldSet::default();
    }
    if looks_like_legacy(line) {
        extract_legacy(line)
    } else {
        extract_labeled(line)
    }
}

fn looks_like_legacy(line: &str) -> bool {
    let mut tokens = line.split(',');
    let first = tokens.next().unwrap_or("");
    first.trim().parse::<f64>().is_ok() && tokens.count() >= 4
}

fn extract_labeled(line: &str) -> FieldSet {
    let mut fields = FieldSet::default();
    for rule in LABEL_RULES.iter() {
        if let Some(caps) = rule.pattern.captures(line) {
            if let Ok(value) = caps[1].parse::<f64>() {
                fields.set(rule.kind, value);
            }
        }
    }
    fields
}

fn extract_legacy(line: &str) -> FieldSet {
    let mut fields = FieldSet::default();
    let tokens: Vec<&str> = line.split(',').map(str::trim).collect();

    for (kind, token) in LEGACY_HEAD.iter().zip(&tokens) {
        if let Ok(value) = token.parse::<f64>() {
            fields.set(*kind, value);
        }
    }

    for token in tokens.iter().skip(LEGACY_HEAD.len()) {
        let Some(caps) = LEGACY_PAIR.captures(token) else {
            continue;
        };
        let kind = match &caps[1] {
            "N" => FieldKind::Nitrogen,
            "P" => FieldKind::Phosphorus,
            "K" => FieldKind::Potassium,
            "pH" => FieldKind::Ph,
            "M" => FieldKind::Moisture,
            _ => continue,
        };
        if let Ok(value) = caps[2].parse::<f64>() {
            fields.set(kind, value);
        }
    }

    fields
}
