//! Helpers for urlencoded forms with repeated keys.
//!
//! `serde_urlencoded` cannot collect `zone=a&zone=b` into a `Vec`, so forms
//! with checkboxes or per-size quantities are extracted as
//! `Form<Vec<(String, String)>>` and read through [`FormPairs`].

use std::collections::BTreeMap;

/// Borrowed view over raw form pairs.
pub struct FormPairs<'a>(pub &'a [(String, String)]);

impl<'a> FormPairs<'a> {
    /// First non-blank value for `key`, trimmed.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&'a str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// All non-blank values for `key`, in order.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }

    /// Values of `prefix[name]` keys, parsed as quantities.
    ///
    /// `qty[M]=10&qty[L]=` yields `{"M": 10}`; blank and unparsable values are
    /// skipped, negatives count as zero and repeated names are summed
    /// (saturating).
    #[must_use]
    pub fn quantities(&self, prefix: &str) -> BTreeMap<String, i64> {
        let mut out = BTreeMap::new();
        for (key, value) in self.0 {
            let Some(name) = key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('['))
                .and_then(|rest| rest.strip_suffix(']'))
            else {
                continue;
            };
            if let Ok(qty) = value.trim().parse::<i64>() {
                let entry = out.entry(name.to_string()).or_insert(0_i64);
                *entry = entry.saturating_add(qty.max(0));
            }
        }
        out
    }

    /// Whether a checkbox named `key` was ticked.
    #[must_use]
    pub fn checked(&self, key: &str) -> bool {
        self.first(key)
            .is_some_and(|v| matches!(v, "on" | "true" | "1" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_first_and_all() {
        let raw = pairs(&[("zone", "frontal"), ("zone", " "), ("zone", "espalda"), ("color", " Azul ")]);
        let form = FormPairs(&raw);
        assert_eq!(form.first("color"), Some("Azul"));
        assert_eq!(form.first("missing"), None);
        assert_eq!(form.all("zone"), vec!["frontal", "espalda"]);
    }

    #[test]
    fn test_quantities() {
        let raw = pairs(&[
            ("qty[M]", "10"),
            ("qty[L]", ""),
            ("qty[XL]", "abc"),
            ("qty[M]", "5"),
            ("qty", "7"),
            ("other[S]", "3"),
        ]);
        let quantities = FormPairs(&raw).quantities("qty");
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities.get("M"), Some(&15));
    }

    #[test]
    fn test_repeated_quantities_saturate() {
        let raw = pairs(&[
            ("qty[M]", "9223372036854775807"),
            ("qty[M]", "1"),
            ("qty[L]", "-5"),
        ]);
        let quantities = FormPairs(&raw).quantities("qty");
        assert_eq!(quantities.get("M"), Some(&i64::MAX));
        assert_eq!(quantities.get("L"), Some(&0));
    }

    #[test]
    fn test_checked() {
        let raw = pairs(&[("newsletter", "on"), ("terms", "off")]);
        let form = FormPairs(&raw);
        assert!(form.checked("newsletter"));
        assert!(!form.checked("terms"));
        assert!(!form.checked("missing"));
    }
}
