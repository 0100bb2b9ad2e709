//! Tiered mitigation advice for a heat-island index

use std::fmt;

use serde::{Deserialize, Serialize};

pub const HIGH_THRESHOLD: f64 = 70.0;
pub const MODERATE_THRESHOLD: f64 = 45.0;

const DEFAULT_NOTE: &str = "Simulated city";

const HIGH_ADVICE: [&str; 3] = [
    "Prioritise large-scale greening (parks, urban forests) and shade corridors.",
    "Implement cool-roof programs and reflective pavements in market / high-traffic zones.",
    "Deploy temporary cooling centers & shaded transit stops during heat waves.",
];

const MODERATE_ADVICE: [&str; 2] = [
    "Target pilot retrofits: cool roofs, tree-planting, and permeable pavements in hotspot neighborhoods.",
    "Encourage building designs with cross-ventilation and outdoor shade.",
];

const LOW_ADVICE: [&str; 2] = [
    "Good baseline — maintain urban canopy, protect open green areas, and monitor changes.",
    "Use pocket parks and community tree initiatives to keep UHI low.",
];

const MAPPING_TIP: &str =
    "Mapping tips: sample day & night, gather rooftop sensors, and overlay land-cover/traffic data.";

/// Severity band of a UHI value
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum UhiTier {
    High,
    Moderate,
    Low,
}

impl UhiTier {
    #[must_use]
    pub fn from_uhi(uhi: f64) -> Self {
        if uhi >= HIGH_THRESHOLD {
            UhiTier::High
        } else if uhi >= MODERATE_THRESHOLD {
            UhiTier::Moderate
        } else {
            UhiTier::Low
        }
    }

    /// Tier-specific recommendations, without the city line or closing tip
    #[must_use]
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            UhiTier::High => &HIGH_ADVICE,
            UhiTier::Moderate => &MODERATE_ADVICE,
            UhiTier::Low => &LOW_ADVICE,
        }
    }
}

impl fmt::Display for UhiTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UhiTier::High => write!(f, "High"),
            UhiTier::Moderate => write!(f, "Moderate"),
            UhiTier::Low => write!(f, "Low"),
        }
    }
}

/// Build the ordered advisory lines.
///
/// With a city label the first line is `"{city} — {note}"`; the last line is
/// always the mapping tip.
#[must_use]
pub fn build_advice(uhi: f64, note: Option<&str>, city: Option<&str>) -> Vec<String> {
    let tier = UhiTier::from_uhi(uhi);
    let mut lines = Vec::with_capacity(tier.recommendations().len() + 2);

    if let Some(city) = city {
        lines.push(format!("{city} — {}", note.unwrap_or(DEFAULT_NOTE)));
    }
    lines.extend(tier.recommendations().iter().map(|line| line.to_string()));
    lines.push(MAPPING_TIP.to_string());
    lines
}

/// Render advisory lines as an HTML list; the city line, if any, is bolded.
#[must_use]
pub fn render_html(lines: &[String], has_city_line: bool) -> String {
    let items: String = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let text = if index == 0 && has_city_line {
                match line.split_once(" — ") {
                    Some((city, note)) => {
                        format!("<strong>{}</strong> — {}", escape_html(city), escape_html(note))
                    }
                    None => format!("<strong>{}</strong>", escape_html(line)),
                }
            } else {
                escape_html(line)
            };
            format!("<li style=\"margin:6px 0\">{text}</li>")
        })
        .collect();
    format!("<ul>{items}</ul>")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(80.0, UhiTier::High, 4)]
    #[case(70.0, UhiTier::High, 4)]
    #[case(69.99, UhiTier::Moderate, 3)]
    #[case(50.0, UhiTier::Moderate, 3)]
    #[case(45.0, UhiTier::Moderate, 3)]
    #[case(44.9, UhiTier::Low, 3)]
    #[case(20.0, UhiTier::Low, 3)]
    fn test_tiers_without_city(#[case] uhi: f64, #[case] tier: UhiTier, #[case] lines: usize) {
        assert_eq!(UhiTier::from_uhi(uhi), tier);
        let advice = build_advice(uhi, None, None);
        assert_eq!(advice.len(), lines);
        assert_eq!(advice.last().map(String::as_str), Some(MAPPING_TIP));
    }

    #[test]
    fn test_high_tier_content() {
        let advice = build_advice(80.0, None, None);
        assert!(advice[0].contains("greening"));
        assert!(advice[1].contains("cool-roof"));
        assert!(advice[2].contains("cooling centers"));
    }

    #[test]
    fn test_city_line_leads() {
        let advice = build_advice(22.0, Some("Hilly & green — low UHI"), Some("Shillong, India"));
        assert_eq!(advice.len(), 4);
        assert_eq!(advice[0], "Shillong, India — Hilly & green — low UHI");
        assert!(advice[1].contains("canopy"));

        let advice = build_advice(50.0, None, Some("Pune"));
        assert_eq!(advice[0], "Pune — Simulated city");
    }

    #[test]
    fn test_render_html_escapes_and_bolds() {
        let advice = build_advice(80.0, Some("Dense <core>"), Some("A & B"));
        let html = render_html(&advice, true);
        assert!(html.starts_with("<ul><li style=\"margin:6px 0\"><strong>A &amp; B</strong> — Dense &lt;core&gt;</li>"));
        assert!(html.contains("cooling centers &amp; shaded transit stops"));
        assert!(html.ends_with("</li></ul>"));
        assert_eq!(html.matches("<li").count(), 5);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(UhiTier::High.to_string(), "High");
        assert_eq!(UhiTier::Low.to_string(), "Low");
    }
}
