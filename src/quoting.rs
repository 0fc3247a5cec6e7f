use std::fmt;

/// Wrap an identifier in double quotes.
///
/// Identifiers come from the calling code, never from end users; nothing beyond the
/// surrounding quotes is escaped.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{name}\"")
}

/// A table name with an optional schema, rendered as a quoted SQL literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    /// Qualify the table with `schema`. An empty schema leaves it unqualified.
    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.schema = (!schema.is_empty()).then_some(schema);
        self
    }

    /// `"schema"."name"`, or `"name"` without a schema.
    #[must_use]
    pub fn literal(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "\"{schema}\".")?;
        }
        write!(f, "\"{}\"", self.name)
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for TableRef {
    /// `(schema, name)`
    fn from((schema, name): (&str, &str)) -> Self {
        Self::new(name).in_schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_fields() {
        assert_eq!(quote_identifier("version"), "\"version\"");
    }

    #[test]
    fn schema_qualification_is_optional() {
        assert_eq!(TableRef::new("migrations").literal(), "\"migrations\"");
        assert_eq!(
            TableRef::new("migrations").in_schema("meta").literal(),
            "\"meta\".\"migrations\""
        );
        assert_eq!(TableRef::from(("meta", "t")).to_string(), "\"meta\".\"t\"");
        assert_eq!(TableRef::new("t").in_schema("").schema, None);
    }
}
