//! Maps stored search hits back to [`Document`] values
//!
//! Only `number`, `title` and `status` survive the trip through the index.
//! A projected document always has an empty identifier, no date and an empty
//! body, even though the record it came from may have all three.

use tantivy::schema::{NamedFieldDocument, OwnedValue};

use crate::corpus::Document;
use crate::error::{Error, Result};

fn first_value<'a>(hit: &'a NamedFieldDocument, field: &'static str) -> Result<&'a OwnedValue> {
    hit.0
        .get(field)
        .and_then(|values| values.first())
        .ok_or(Error::Projection { field })
}

fn text_field(hit: &NamedFieldDocument, field: &'static str) -> Result<String> {
    match first_value(hit, field)? {
        OwnedValue::Str(text) => Ok(text.clone()),
        _ => Err(Error::Projection { field }),
    }
}

fn integer_field(hit: &NamedFieldDocument, field: &'static str) -> Result<i64> {
    match first_value(hit, field)? {
        OwnedValue::I64(value) => Ok(*value),
        OwnedValue::U64(value) => i64::try_from(*value).map_err(|_| Error::Projection { field }),
        _ => Err(Error::Projection { field }),
    }
}

/// Decode a hit's stored fields into a document
pub fn project_hit(hit: &NamedFieldDocument) -> Result<Document> {
    Ok(Document {
        number: integer_field(hit, "number")?,
        title: text_field(hit, "title")?,
        status: text_field(hit, "status")?,
        ..Document::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn hit(entries: Vec<(&str, OwnedValue)>) -> NamedFieldDocument {
        let mut map = BTreeMap::new();
        for (name, value) in entries {
            map.insert(name.to_string(), vec![value]);
        }
        NamedFieldDocument(map)
    }

    #[test]
    fn test_project_hit() {
        let doc = project_hit(&hit(vec![
            ("id", OwnedValue::Str("0001-use-markdown.yaml".to_string())),
            ("number", OwnedValue::I64(1)),
            ("title", OwnedValue::Str("Use Markdown".to_string())),
            ("status", OwnedValue::Str("accepted".to_string())),
            ("body", OwnedValue::Str("We decided to use Markdown.".to_string())),
        ]))
        .unwrap();

        assert_eq!(doc.number, 1);
        assert_eq!(doc.title, "Use Markdown");
        assert_eq!(doc.status, "accepted");
        // Stored id and body are deliberately not carried over
        assert!(doc.identifier.is_empty());
        assert!(doc.date.is_none());
        assert!(doc.body.is_empty());
    }

    #[test]
    fn test_missing_field() {
        let err = project_hit(&hit(vec![
            ("number", OwnedValue::I64(1)),
            ("title", OwnedValue::Str("Use Markdown".to_string())),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Projection { field: "status" }));
    }

    #[test]
    fn test_wrong_type() {
        let err = project_hit(&hit(vec![
            ("number", OwnedValue::Str("one".to_string())),
            ("title", OwnedValue::Str("Use Markdown".to_string())),
            ("status", OwnedValue::Str("accepted".to_string())),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Projection { field: "number" }));
    }

    #[test]
    fn test_unsigned_number_out_of_range() {
        let err = project_hit(&hit(vec![
            ("number", OwnedValue::U64(u64::MAX)),
            ("title", OwnedValue::Str("x".to_string())),
            ("status", OwnedValue::Str("y".to_string())),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Projection { field: "number" }));
    }
}
