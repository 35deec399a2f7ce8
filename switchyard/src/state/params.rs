//! The parameter store shared by routing, filters and handlers.

use std::slice;

/// Ordered path parameters captured while routing a request.
///
/// Parameters keep the order in which they were captured. Setting a name which is already present
/// replaces its value in place, so the last write wins without reordering.
///
/// ```rust
/// use switchyard::state::Params;
///
/// let mut params = Params::new();
/// params.set("id", "42");
/// params.set("format", "json");
/// params.set("id", "43");
///
/// assert_eq!(params.get("id"), Some("43"));
/// assert_eq!(params.names().collect::<Vec<_>>(), vec!["id", "format"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Creates an empty store.
    pub fn new() -> Self {
        Params::default()
    }

    /// Sets `name` to `value`, replacing any existing value.
    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value for `name`, if one was captured.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Parameter names in capture order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Parameter values in capture order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// Iterates `(name, value)` pairs in capture order.
    pub fn iter(&self) -> slice::Iter<'_, (String, String)> {
        self.entries.iter()
    }

    /// Number of parameters held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets every pair from `pairs`, in order.
    pub fn extend<I, N, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.set(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (String, String);
    type IntoIter = slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_in_place() {
        let mut params = Params::new();
        params.extend(vec![("a", "1"), ("b", "2"), ("a", "3")]);

        assert_eq!(params.len(), 2);
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["3", "2"]);
    }

    #[test]
    fn remove_keeps_order_of_others() {
        let mut params = Params::new();
        params.extend(vec![("a", "1"), ("b", "2"), ("c", "3")]);

        assert_eq!(params.remove("b"), Some("2".to_owned()));
        assert_eq!(params.remove("b"), None);
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
