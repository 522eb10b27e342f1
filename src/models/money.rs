//! Brazilian real formatting, as shown in lists and the text export.

/// Formats a value as `R$ 1.234,56`. Negative values become `-R$ 200,00`;
/// non-finite values render as zero.
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0,00".to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (units, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    // -0.001 rounds to zero and prints unsigned
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{}R$ {},{}", sign, grouped, fraction)
}

/// Parses text produced by [`format_brl`] back into a value.
pub fn parse_brl(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = rest.strip_prefix("R$")?.trim();
    if digits.is_empty() {
        return None;
    }

    let normalized = digits.replace('.', "").replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}
