use std::fmt;

use crate::error::{QueryError, QueryResult};

/// Semantic type descriptor of the items a clause binds.
///
/// The model does not check values against their descriptor; translators use
/// it to pick column mappings or target types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Unknown or heterogeneous items
    Any,
    Boolean,
    Integer,
    Float,
    String,

    /// A domain entity such as `Student`
    Named(String),

    /// A sequence of items of the inner type
    Sequence(Box<ItemType>),
}

impl ItemType {
    pub fn named(name: impl Into<String>) -> Self {
        ItemType::Named(name.into())
    }

    pub fn sequence_of(element: ItemType) -> Self {
        ItemType::Sequence(Box::new(element))
    }

    /// Fails with an argument error when a named descriptor is empty.
    pub fn validate(&self, parameter: &'static str) -> QueryResult<()> {
        match self {
            ItemType::Named(name) if name.trim().is_empty() => Err(QueryError::empty(parameter)),
            ItemType::Sequence(inner) => inner.validate(parameter),
            _ => Ok(()),
        }
    }

    /// Parse the textual form produced by `Display`.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QueryError::empty("item_type"));
        }
        if let Some(inner) = text
            .strip_prefix("Sequence<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(ItemType::sequence_of(ItemType::parse(inner)?));
        }
        Ok(match text {
            "any" => ItemType::Any,
            "bool" => ItemType::Boolean,
            "int" => ItemType::Integer,
            "float" => ItemType::Float,
            "string" => ItemType::String,
            name => ItemType::Named(name.to_string()),
        })
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Any => f.write_str("any"),
            ItemType::Boolean => f.write_str("bool"),
            ItemType::Integer => f.write_str("int"),
            ItemType::Float => f.write_str("float"),
            ItemType::String => f.write_str("string"),
            ItemType::Named(name) => f.write_str(name),
            ItemType::Sequence(inner) => write!(f, "Sequence<{}>", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_display() {
        let ty = ItemType::sequence_of(ItemType::named("Student"));
        assert_eq!(ty.to_string(), "Sequence<Student>");
        assert_eq!(ItemType::parse("Sequence<Student>").unwrap(), ty);
        assert_eq!(ItemType::parse("int").unwrap(), ItemType::Integer);
    }

    #[test]
    fn test_empty_named_type_is_rejected() {
        assert!(ItemType::named("").validate("item_type").unwrap_err().is_argument());
        assert!(
            ItemType::sequence_of(ItemType::named(" "))
                .validate("item_type")
                .is_err()
        );
        assert!(ItemType::parse("").unwrap_err().is_argument());
    }
}
