//! `HH:MM:SS` conversion for segment boundaries and player seek offsets.

/// Format whole seconds as zero-padded `HH:MM:SS`. Hours widen past two digits as needed.
pub fn format_hms(total_secs: u64) -> String {
  let hours = total_secs / 3600;
  let minutes = (total_secs % 3600) / 60;
  let secs = total_secs % 60;
  format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format a fractional second count from the wire. Fractions are floored, negatives clamp to zero.
pub fn format_secs_f64(secs: f64) -> String {
  let whole = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
  format_hms(whole)
}

/// Parse `HH:MM:SS`, `MM:SS` or bare seconds back into whole seconds.
///
/// Minutes and seconds fields must be below 60 when a larger unit precedes them.
pub fn parse_hms(s: &str) -> Option<u64> {
  let parts: Vec<&str> = s.trim().split(':').collect();
  if parts.is_empty() || parts.len() > 3 {
    return None;
  }
  let mut nums = Vec::with_capacity(parts.len());
  for p in &parts {
    if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    nums.push(p.parse::<u64>().ok()?);
  }
  match nums.as_slice() {
    [s] => Some(*s),
    [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s),
    [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_zero_padded() {
    assert_eq!(format_hms(0), "00:00:00");
    assert_eq!(format_hms(59), "00:00:59");
    assert_eq!(format_hms(61), "00:01:01");
    assert_eq!(format_hms(3600), "01:00:00");
    assert_eq!(format_hms(86_399), "23:59:59");
    assert_eq!(format_hms(360_000), "100:00:00");
  }

  #[test]
  fn round_trips_exactly() {
    let samples = (0..10_000).chain([86_399, 86_400, 359_999, 360_000, 1_000_000_007]);
    for s in samples {
      assert_eq!(parse_hms(&format_hms(s)), Some(s), "round trip failed for {s}");
    }
  }

  #[test]
  fn parses_short_forms() {
    assert_eq!(parse_hms("90"), Some(90));
    assert_eq!(parse_hms("01:30"), Some(90));
    assert_eq!(parse_hms(" 00:01:30 "), Some(90));
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(parse_hms(""), None);
    assert_eq!(parse_hms("1:2:3:4"), None);
    assert_eq!(parse_hms("00:61:00"), None);
    assert_eq!(parse_hms("00:00:60"), None);
    assert_eq!(parse_hms("-1"), None);
    assert_eq!(parse_hms("aa:bb:cc"), None);
    assert_eq!(parse_hms("01::02"), None);
  }

  #[test]
  fn fractional_seconds_floor() {
    assert_eq!(format_secs_f64(12.9), "00:00:12");
    assert_eq!(format_secs_f64(-3.0), "00:00:00");
    assert_eq!(format_secs_f64(f64::NAN), "00:00:00");
  }
}
