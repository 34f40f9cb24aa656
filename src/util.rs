//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings, on a char boundary.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_known_keys_only() {
    let out = fill_template("{a} and {b} but not {c}", &[("a", "1"), ("b", "2")]);
    assert_eq!(out, "1 and 2 but not {c}");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("소파 위의 고양이", 4);
    assert!(t.starts_with("소"));
    assert!(t.contains("bytes total"));
  }
}
