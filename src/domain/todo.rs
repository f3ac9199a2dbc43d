use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    /// Id for the n-th todo of a contiguous sequence, starting at 1.
    pub fn from_index(n: u64) -> Self { Self(n.to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn numeric(&self) -> Option<u64> { self.0.parse().ok() }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for TodoId {
    fn from(s: String) -> Self { Self(s) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    pub content: String,
}

/// Todos keyed by id. Iteration order is insertion order, which is also the
/// order of the object keys in the backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoCollection {
    entries: Vec<(TodoId, Todo)>,
}

impl TodoCollection {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&TodoId, &Todo)> {
        self.entries.iter().map(|(id, todo)| (id, todo))
    }

    pub fn ids(&self) -> Vec<TodoId> { self.entries.iter().map(|(id, _)| id.clone()).collect() }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, id: &TodoId) -> Option<&mut Todo> {
        self.entries.iter_mut().find(|(k, _)| k == id).map(|(_, t)| t)
    }

    pub fn contains(&self, id: &TodoId) -> bool { self.get(id).is_some() }

    /// Appends a new entry, or replaces an existing one in place.
    pub fn insert(&mut self, id: TodoId, todo: Todo) {
        match self.get_mut(&id) {
            Some(existing) => *existing = todo,
            None => self.entries.push((id, todo)),
        }
    }

    pub fn remove(&mut self, id: &TodoId) -> Option<Todo> {
        let pos = self.entries.iter().position(|(k, _)| k == id)?;
        Some(self.entries.remove(pos).1)
    }

    /// Next id after the numerically greatest existing key. Gaps left by
    /// earlier deletions never cause a collision. `None` once a key already
    /// holds `u64::MAX`.
    pub fn next_id(&self) -> Option<TodoId> {
        let max = self.entries.iter().filter_map(|(id, _)| id.numeric()).max().unwrap_or(0);
        max.checked_add(1).map(TodoId::from_index)
    }

    /// Renumbers every entry to "1".."N", keeping relative order.
    pub fn reindexed(self) -> Self {
        let entries = self
            .entries
            .into_iter()
            .zip(1u64..)
            .map(|((_, todo), n)| (TodoId::from_index(n), todo))
            .collect();
        Self { entries }
    }
}

impl FromIterator<(TodoId, Todo)> for TodoCollection {
    fn from_iter<I: IntoIterator<Item = (TodoId, Todo)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (id, todo) in iter { collection.insert(id, todo); }
        collection
    }
}

impl Serialize for TodoCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, todo) in &self.entries {
            map.serialize_entry(id, todo)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TodoCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CollectionVisitor;

        impl<'de> Visitor<'de> for CollectionVisitor {
            type Value = TodoCollection;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of todo ids to todos")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut collection = TodoCollection::new();
                while let Some((id, todo)) = access.next_entry::<TodoId, Todo>()? {
                    collection.insert(id, todo);
                }
                Ok(collection)
            }
        }

        deserializer.deserialize_map(CollectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(title: &str) -> Todo {
        Todo { title: title.into(), content: format!("{title} body"), done: false }
    }

    #[test]
    fn next_id_follows_greatest_numeric_key() {
        let mut c = TodoCollection::new();
        assert_eq!(c.next_id(), Some(TodoId::from("1")));
        c.insert("1".into(), todo("a"));
        c.insert("7".into(), todo("b"));
        c.insert("3".into(), todo("c"));
        assert_eq!(c.next_id(), Some(TodoId::from("8")));
    }

    #[test]
    fn next_id_is_exhausted_at_u64_max() {
        let mut c = TodoCollection::new();
        c.insert(TodoId::from_index(u64::MAX - 1), todo("almost"));
        assert_eq!(c.next_id(), Some(TodoId::from_index(u64::MAX)));
        c.insert(TodoId::from_index(u64::MAX), todo("last"));
        assert_eq!(c.next_id(), None);
        // Keys past the u64 range are not numeric and do not count.
        c.insert("18446744073709551616".into(), todo("huge"));
        assert_eq!(c.next_id(), None);
    }

    #[test]
    fn reindex_keeps_relative_order() {
        let c: TodoCollection = [("2", "a"), ("5", "b"), ("9", "c")]
            .into_iter()
            .map(|(id, t)| (TodoId::from(id), todo(t)))
            .collect();
        let c = c.reindexed();
        let ids: Vec<_> = c.iter().map(|(id, t)| (id.as_str(), t.title.as_str())).collect();
        assert_eq!(ids, vec![("1", "a"), ("2", "b"), ("3", "c")]);
    }

    #[test]
    fn deserialize_keeps_file_order_and_defaults_done() {
        let raw = r#"{"10": {"title": "x", "content": "y"},
                      "2": {"title": "p", "content": "q", "done": true}}"#;
        let c: TodoCollection = serde_json::from_str(raw).unwrap();
        assert_eq!(c.ids(), vec![TodoId::from("10"), TodoId::from("2")]);
        assert!(!c.get(&"10".into()).unwrap().done);
        assert!(c.get(&"2".into()).unwrap().done);
    }

    #[test]
    fn duplicate_keys_keep_first_position_last_value() {
        let raw = r#"{"1": {"title": "a", "content": "a"},
                      "2": {"title": "b", "content": "b"},
                      "1": {"title": "c", "content": "c"}}"#;
        let c: TodoCollection = serde_json::from_str(raw).unwrap();
        assert_eq!(c.ids(), vec![TodoId::from("1"), TodoId::from("2")]);
        assert_eq!(c.get(&"1".into()).unwrap().title, "c");
    }

    #[test]
    fn rejects_records_missing_fields() {
        assert!(serde_json::from_str::<TodoCollection>(r#"{"1": {"title": "a"}}"#).is_err());
        assert!(serde_json::from_str::<TodoCollection>("[1, 2]").is_err());
    }
}
