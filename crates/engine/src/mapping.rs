use std::collections::BTreeMap;

/// Old identifier to flattened file name, accumulated during the move phase.
///
/// Every successful move contributes two keys, the bare file name and the
/// `namespace:file_name` form, both pointing at the new name. A later record for the
/// same key replaces the earlier one; callers record in enumeration order, which makes
/// the winner deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMapping {
    entries: BTreeMap<String, String>,
}

impl RenameMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, namespace: &str, old: &str, new: &str) {
        self.entries.insert(format!("{namespace}:{old}"), new.to_owned());
        self.entries.insert(old.to_owned(), new.to_owned());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a RenameMapping {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stores_both_forms() {
        let mut mapping = RenameMapping::new();
        mapping.record("ns1", "a.png", "ns1_a.png");

        assert_eq!(mapping.get("ns1:a.png"), Some("ns1_a.png"));
        assert_eq!(mapping.get("a.png"), Some("ns1_a.png"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_bare_name_follows_last_record() {
        let mut mapping = RenameMapping::new();
        mapping.record("ns1", "a.png", "ns1_a.png");
        mapping.record("ns2", "a.png", "ns2_a.png");

        assert_eq!(mapping.get("a.png"), Some("ns2_a.png"));
        assert_eq!(mapping.get("ns1:a.png"), Some("ns1_a.png"));
        assert_eq!(mapping.get("ns2:a.png"), Some("ns2_a.png"));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut mapping = RenameMapping::new();
        mapping.record("z", "b.ogg", "z_b.ogg");
        mapping.record("a", "c.png", "a_c.png");

        let keys: Vec<&str> = mapping.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a:c.png", "b.ogg", "c.png", "z:b.ogg"]);
    }
}
