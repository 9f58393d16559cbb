/// Prefix letters for powers of 1024
const KMG_CHARS: [char; 8] = ['K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

/// Format bytes into human-readable string
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a value with a power-of-two K/M/G/... suffix in at most four characters.
///
/// A prefix is chosen once the value reaches 1000 of the next smaller unit, so
/// `1000` already renders as `1.0K`. One decimal is kept while it fits in three
/// characters, otherwise the integer part is shown.
pub fn format_kmg(value: u64) -> String {
    let value = value as u128;
    let mut factor = 1u128;
    let mut prefix = None;
    for i in (0..KMG_CHARS.len()).rev() {
        if value >= 1000 * (1u128 << (10 * i)) {
            factor = 1u128 << (10 * (i + 1));
            prefix = Some(KMG_CHARS[i]);
            break;
        }
    }

    let Some(prefix) = prefix else {
        return value.to_string();
    };

    let scaled = value as f64 / factor as f64;
    let short = format!("{:.1}", scaled);
    if short.len() > 3 {
        format!("{}{}", scaled as u64, prefix)
    } else {
        format!("{}{}", short, prefix)
    }
}

/// Parse a size such as `65536`, `64K`, `1.5m` or `2G` (powers of 1024).
pub fn parse_kmg(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let (number, factor) = match text.chars().last() {
        Some(last) => match KMG_CHARS
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&last))
        {
            Some(i) => (&text[..text.len() - 1], 1u128 << (10 * (i + 1))),
            None => (text, 1),
        },
        None => return Err("empty size".to_string()),
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid size: {text:?}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid size: {text:?}"));
    }

    let scaled = value * factor as f64;
    if scaled > u64::MAX as f64 {
        return Err(format!("size too large: {text:?}"));
    }
    Ok(scaled as u64)
}

/// Calculate percentage of size relative to total
pub fn size_percentage(size: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (size as f64 / total as f64) * 100.0
    }
}

/// Format a number with thousand separators (e.g., 1,234,567)
pub fn format_count(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }

    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}
