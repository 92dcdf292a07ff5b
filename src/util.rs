/// `parseInt`-style: stops at the first non-digit, `None` unless positive.
pub(crate) fn lenient_positive(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    match raw[..end].parse::<u64>() {
        Ok(n) => Some(n).filter(|n| *n > 0),
        // only digits left, so the number overflowed
        Err(_) if end > 0 => Some(u64::MAX),
        Err(_) => None,
    }
}
