pub fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

pub fn sanitize(value: f64) -> f64 {
  if value.is_finite() {
    value
  } else {
    0.0
  }
}

pub fn normalize(value: f64) -> f64 {
  round2(sanitize(value))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_to_two_decimals() {
    assert_eq!(round2(1.234), 1.23);
    assert_eq!(round2(1.236), 1.24);
    assert_eq!(round2(-1.236), -1.24);
    assert_eq!(round2(0.1 + 0.2), 0.3);
    assert_eq!(round2(100.0), 100.0);
  }

  #[test]
  fn non_finite_values_become_zero() {
    assert_eq!(sanitize(f64::NAN), 0.0);
    assert_eq!(sanitize(f64::INFINITY), 0.0);
    assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
    assert_eq!(sanitize(12.5), 12.5);
  }

  #[test]
  fn normalize_combines_both() {
    assert_eq!(normalize(f64::NAN), 0.0);
    assert_eq!(normalize(99.999), 100.0);
  }
}
