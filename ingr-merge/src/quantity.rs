//! Quantity String Normalizer
//!
//! Converts free-text quantities into a magnitude. Accepted fragments,
//! separated by whitespace and summed:
//! - a single numeric glyph: `"5"`, `"٣"`, `"½"`, `"⅔"`
//! - an exact rational: `"3"`, `"3/4"`, `"1.25"`
//! - a rational immediately followed by a glyph: `"2½"`
//!
//! Unparseable input is an expected outcome for free text and yields `None`.

use tracing::trace;

/// Parse a quantity expression into a magnitude, `None` if unparseable
pub fn parse_quantity(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut fragments = 0;

    for fragment in text.split_whitespace() {
        let value = parse_fragment(fragment);
        if value.is_none() {
            trace!(fragment, text, "Unparseable quantity fragment");
        }
        total += value?;
        fragments += 1;
    }

    if fragments == 0 {
        return None;
    }
    Some(total)
}

fn parse_fragment(fragment: &str) -> Option<f64> {
    let mut chars = fragment.chars();
    let last = chars.next_back()?;

    if chars.as_str().is_empty() {
        return glyph_value(last);
    }
    if last.is_ascii_digit() {
        return parse_rational(fragment);
    }
    Some(parse_rational(chars.as_str())? + glyph_value(last)?)
}

/// Exact rational: integer, decimal, or `numerator/denominator`
fn parse_rational(text: &str) -> Option<f64> {
    if let Some((numerator, denominator)) = text.split_once('/') {
        let numerator: i64 = numerator.parse().ok()?;
        let denominator: u64 = denominator.parse().ok()?;
        if denominator == 0 {
            return None;
        }
        return Some(numerator as f64 / denominator as f64);
    }

    // f64 parsing also accepts "inf"/"nan", which are not quantities
    if !text.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Zero code point of each Unicode decimal-digit block (`0`..`9` follow it)
const DIGIT_ZEROS: [u32; 19] = [
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic
    0x07C0, // NKo
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0A66, // Gurmukhi
    0x0AE6, // Gujarati
    0x0B66, // Oriya
    0x0BE6, // Tamil
    0x0C66, // Telugu
    0x0CE6, // Kannada
    0x0D66, // Malayalam
    0x0E50, // Thai
    0x0ED0, // Lao
    0x0F20, // Tibetan
    0x1040, // Myanmar
    0x17E0, // Khmer
    0x1810, // Mongolian
    0xFF10, // Fullwidth
];

/// Numeric value of a single character (digits and vulgar fractions)
fn glyph_value(glyph: char) -> Option<f64> {
    if let Some(digit) = glyph.to_digit(10) {
        return Some(f64::from(digit));
    }

    let code = u32::from(glyph);
    if let Some(zero) = DIGIT_ZEROS.iter().find(|zero| (**zero..**zero + 10).contains(&code)) {
        return Some(f64::from(code - zero));
    }

    let value = match glyph {
        '¼' => 1.0 / 4.0,
        '½' => 1.0 / 2.0,
        '¾' => 3.0 / 4.0,
        '⅐' => 1.0 / 7.0,
        '⅑' => 1.0 / 9.0,
        '⅒' => 1.0 / 10.0,
        '⅓' => 1.0 / 3.0,
        '⅔' => 2.0 / 3.0,
        '⅕' => 1.0 / 5.0,
        '⅖' => 2.0 / 5.0,
        '⅗' => 3.0 / 5.0,
        '⅘' => 4.0 / 5.0,
        '⅙' => 1.0 / 6.0,
        '⅚' => 5.0 / 6.0,
        '⅛' => 1.0 / 8.0,
        '⅜' => 3.0 / 8.0,
        '⅝' => 5.0 / 8.0,
        '⅞' => 7.0 / 8.0,
        '↉' => 0.0,
        _ => return None,
    };
    Some(value)
}
