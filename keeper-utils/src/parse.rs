/// Parse a compact duration like `30s`, `10m`, `1h30m`, `1d`, or plain seconds.
///
/// A bare number is only accepted on its own; zero and overflowing values are rejected.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    if let Ok(seconds) = compact.parse::<u64>() {
        return (seconds > 0).then_some(seconds);
    }

    let mut total = 0_u64;
    let mut digits = String::new();

    for ch in compact.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let multiplier = match ch.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return None,
        };

        let value = digits.parse::<u64>().ok().filter(|value| *value > 0)?;
        total = total.checked_add(value.checked_mul(multiplier)?)?;
        digits.clear();
    }

    if !digits.is_empty() || total == 0 {
        return None;
    }

    Some(total)
}

/// Parse `#rrggbb` (or `rrggbb`) into an RGB integer.
pub fn parse_hex_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    u32::from_str_radix(hex, 16).ok()
}
