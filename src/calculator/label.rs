//! Calculation labels.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of aggregate a label asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationKind {
    /// Sum of all values
    Total,
    /// First value minus the rest
    Difference,
    /// Arithmetic mean
    Average,
}

impl CalculationKind {
    /// Aggregate `values`. Returns `None` for an empty slice.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        let (first, rest) = values.split_first()?;
        let sum: f64 = values.iter().sum();
        Some(match self {
            CalculationKind::Total => sum,
            CalculationKind::Average => sum / values.len() as f64,
            CalculationKind::Difference => first - rest.iter().sum::<f64>(),
        })
    }
}

impl fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalculationKind::Total => "total",
            CalculationKind::Difference => "difference",
            CalculationKind::Average => "average",
        };
        f.write_str(name)
    }
}

/// Ordered label patterns; the first matching rule decides the kind.
#[derive(Debug, Clone)]
pub struct LabelRules {
    rules: Vec<(CalculationKind, Regex)>,
}

impl LabelRules {
    /// Build rules from `(kind, pattern)` pairs in priority order.
    /// Patterns are matched case-insensitively.
    pub fn from_patterns<'a>(
        patterns: impl IntoIterator<Item = (CalculationKind, &'a str)>,
    ) -> Result<Self, regex::Error> {
        let rules = patterns
            .into_iter()
            .map(|(kind, pattern)| Ok((kind, Regex::new(&format!("(?i){}", pattern))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Classify cell text, or `None` if it is not a label.
    pub fn classify(&self, text: &str) -> Option<CalculationKind> {
        let text = text.trim().to_lowercase();
        self.rules
            .iter()
            .find(|(_, pattern)| pattern.is_match(&text))
            .map(|(kind, _)| *kind)
    }
}

impl Default for LabelRules {
    fn default() -> Self {
        Self::from_patterns([
            (CalculationKind::Total, r"\b(total|sum)\b"),
            (CalculationKind::Difference, r"\b(diff(?:erence)?|delta|variance)\b"),
            (CalculationKind::Average, r"\b(avg|average|mean)\b"),
        ])
        .expect("built-in label patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let rules = LabelRules::default();
        assert_eq!(rules.classify("Total"), Some(CalculationKind::Total));
        assert_eq!(rules.classify("  GRAND SUM "), Some(CalculationKind::Total));
        assert_eq!(rules.classify("Diff"), Some(CalculationKind::Difference));
        assert_eq!(rules.classify("Variance"), Some(CalculationKind::Difference));
        assert_eq!(rules.classify("Mean score"), Some(CalculationKind::Average));
        assert_eq!(rules.classify("Subtotals"), None);
        assert_eq!(rules.classify("Q1"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = LabelRules::default();
        assert_eq!(rules.classify("Average total"), Some(CalculationKind::Total));
        assert_eq!(rules.classify("Mean delta"), Some(CalculationKind::Difference));
    }

    #[test]
    fn test_custom_rules() {
        let rules = LabelRules::from_patterns([(CalculationKind::Average, r"\bø\b")]).unwrap();
        assert_eq!(rules.classify("Ø"), Some(CalculationKind::Average));
        assert_eq!(rules.classify("Total"), None);
        assert!(LabelRules::from_patterns([(CalculationKind::Total, "(")]).is_err());
    }

    #[test]
    fn test_apply() {
        assert_eq!(CalculationKind::Total.apply(&[10.0, 20.0, 30.0]), Some(60.0));
        assert_eq!(CalculationKind::Difference.apply(&[100.0, 30.0, 20.0]), Some(50.0));
        assert_eq!(CalculationKind::Difference.apply(&[7.0]), Some(7.0));
        assert_eq!(CalculationKind::Average.apply(&[1.0, 2.0]), Some(1.5));
        assert_eq!(CalculationKind::Total.apply(&[]), None);
    }
}
