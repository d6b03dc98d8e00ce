//! Reading numbers out of table cells and writing them back.

use std::sync::OnceLock;

use regex::Regex;

/// Currency symbols recognised in cells.
const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?[0-9]+\.?[0-9]*").expect("valid number pattern"))
}

/// Extract a number from cell text.
///
/// Currency symbols, thousands separators and whitespace are ignored; a
/// percent sign scales the value by 1/100. Returns `None` when the text holds
/// no ASCII digits.
///
/// ```
/// use docfill::calculator::extract_number;
///
/// assert_eq!(extract_number("$1,234.56"), Some(1234.56));
/// assert_eq!(extract_number("12.5%"), Some(0.125));
/// assert_eq!(extract_number("n/a"), None);
/// ```
pub fn extract_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();
    let is_percent = cleaned.contains('%');
    let cleaned = cleaned.replace('%', "");

    let token = number_pattern().find(&cleaned)?;
    let value: f64 = token.as_str().parse().ok()?;
    Some(if is_percent { value / 100.0 } else { value })
}

/// How a computed value is written, inferred from a neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `12.5%`
    Percent,
    /// `$1,234.56`
    Currency(char),
    /// `1,234.56`
    Decimal,
    /// `1,235`
    Integer,
}

impl NumberFormat {
    /// Infer the format of a reference cell's text.
    pub fn detect(reference: &str) -> Self {
        if reference.contains('%') {
            NumberFormat::Percent
        } else if let Some(symbol) = reference.chars().find(|c| CURRENCY_SYMBOLS.contains(c)) {
            NumberFormat::Currency(symbol)
        } else if reference.contains('.') {
            NumberFormat::Decimal
        } else {
            NumberFormat::Integer
        }
    }

    /// Render a value in this format.
    pub fn format(self, value: f64) -> String {
        match self {
            NumberFormat::Percent => format!("{:.1}%", value * 100.0),
            NumberFormat::Currency(symbol) => format!("{}{}", symbol, group_thousands(value, 2)),
            NumberFormat::Decimal => group_thousands(value, 2),
            NumberFormat::Integer => group_thousands(value, 0),
        }
    }
}

/// Format `value` the way `reference` is formatted.
///
/// ```
/// use docfill::calculator::format_value;
///
/// assert_eq!(format_value(0.125, "10.0%"), "12.5%");
/// assert_eq!(format_value(1234.5, "€10"), "€1,234.50");
/// assert_eq!(format_value(1234.4, "10"), "1,234");
/// ```
pub fn format_value(value: f64, reference: &str) -> String {
    NumberFormat::detect(reference).format(value)
}

/// Fixed-point rendering with comma thousands separators.
fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}
