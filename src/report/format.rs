/// `$1234.57`: two decimals, no grouping. Used for prices.
pub fn usd(v: f64) -> String {
    if v < 0.0 {
        format!("-${:.2}", -v)
    } else {
        format!("${v:.2}")
    }
}

/// `$1,234,567.89`: two decimals with thousands separators. Used for
/// market caps, volumes and totals.
pub fn usd_grouped(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

/// `-12.50%`
pub fn pct(v: f64) -> String {
    format!("{v:.2}%")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
