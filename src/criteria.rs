//! Ordered field/value maps and the equality-conjunction `WHERE` clauses built from them.

use crate::quoting::quote_identifier;
use crate::types::RowValues;

/// Field names mapped to values, in insertion order.
///
/// Used both as criteria (`"field" = $N AND ...`) and as the column values of an
/// insert or update. Inserting a field that is already present replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, RowValues)>,
}

/// Criteria compiled into `WHERE` predicates.
pub type Criteria = FieldMap;

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldMap::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RowValues>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<RowValues>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

/// Predicates and their arguments produced by [`build_where`].
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// `"field" = $N` fragments, one per criterion.
    pub predicates: Vec<String>,
    /// Values for the placeholders, in placeholder order.
    pub args: Vec<RowValues>,
    /// First placeholder index not used by this clause.
    pub next_index: usize,
}

impl WhereClause {
    /// Predicates joined with `AND`. Empty when there were no criteria.
    #[must_use]
    pub fn sql(&self) -> String {
        self.predicates.join(" AND ")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Compile `criteria` into `"field" = $N` predicates, numbering from `start_index`.
///
/// Empty criteria give an empty clause; it is up to the caller not to render a
/// bare `WHERE`.
#[must_use]
pub fn build_where(criteria: &FieldMap, start_index: usize) -> WhereClause {
    let mut predicates = Vec::with_capacity(criteria.len());
    let mut args = Vec::with_capacity(criteria.len());
    let mut n = start_index;
    for (field, value) in criteria.iter() {
        predicates.push(format!("{} = ${n}", quote_identifier(field)));
        args.push(value.clone());
        n += 1;
    }
    WhereClause {
        predicates,
        args,
        next_index: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_from_the_start_index() {
        let criteria = Criteria::new().with("name", "0002_add_index").with("batch", 4);
        let clause = build_where(&criteria, 3);
        assert_eq!(clause.sql(), "\"name\" = $3 AND \"batch\" = $4");
        assert_eq!(
            clause.args,
            vec![RowValues::Text("0002_add_index".into()), RowValues::Int(4)]
        );
        assert_eq!(clause.next_index, 5);
    }

    #[test]
    fn empty_criteria_yield_no_predicates() {
        let clause = build_where(&Criteria::new(), 1);
        assert!(clause.is_empty());
        assert_eq!(clause.sql(), "");
        assert_eq!(clause.next_index, 1);
    }

    #[test]
    fn reinserting_a_field_keeps_its_position() {
        let map: FieldMap = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(map.fields().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&RowValues::Int(3)));
    }
}
