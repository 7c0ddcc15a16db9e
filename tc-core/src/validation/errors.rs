use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field key → messages for every rule the field broke.
///
/// Keys are the camelCase field names the form uses (`mlsNumber`,
/// `clients[0].email`). An empty map means the input is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn add(
        &mut self,
        key: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.entry(key.into()).or_default().push(message.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Fold another error map into this one, appending messages for shared
    /// keys.
    pub fn merge(
        &mut self,
        other: FieldErrors,
    ) {
        for (key, messages) in other.0 {
            self.0.entry(key).or_default().extend(messages);
        }
    }

    /// Drop every entry whose key is absent from `current`.
    pub fn retain_present_in(
        &mut self,
        current: &FieldErrors,
    ) {
        self.0.retain(|key, _| current.contains(key));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: Into<String>, M: Into<String>> FromIterator<(K, M)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (K, M)>>(iter: T) -> Self {
        let mut errors = FieldErrors::new();
        for (key, message) in iter {
            errors.add(key, message);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn add_groups_messages_by_key() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Email is invalid");
        errors.add("phone", "Phone is invalid");

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("email"),
            Some(&["Email is required".to_string(), "Email is invalid".to_string()][..])
        );
    }

    #[test]
    fn merge_appends_shared_keys() {
        let mut a: FieldErrors = [("name", "one")].into_iter().collect();
        let b: FieldErrors = [("name", "two"), ("zip", "three")].into_iter().collect();
        a.merge(b);

        assert_eq!(a.get("name").map(<[String]>::len), Some(2));
        assert!(a.contains("zip"));
    }

    #[test]
    fn retain_present_in_drops_resolved_keys() {
        let mut shown: FieldErrors = [("hoaName", "x"), ("county", "y")].into_iter().collect();
        let current: FieldErrors = [("county", "y")].into_iter().collect();
        shown.retain_present_in(&current);

        assert_eq!(shown.keys().collect::<Vec<_>>(), vec!["county"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let errors: FieldErrors = [("clients", "At least one client is required")]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "clients": ["At least one client is required"] })
        );
    }
}
