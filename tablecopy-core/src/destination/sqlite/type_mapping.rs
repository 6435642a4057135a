//! Remote field types to SQLite column types.

use crate::models::{FieldDescription, FieldType};

/// SQLite storage class for a remote field type.
pub fn map_field_type(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::Integer | FieldType::Boolean => "INTEGER",
        FieldType::Double => "REAL",
        FieldType::Id
        | FieldType::String
        | FieldType::Date
        | FieldType::DateTime
        | FieldType::Reference
        | FieldType::Other(_) => "TEXT",
    }
}

/// Whether a field becomes the table's primary key.
pub fn is_primary_key(field: &FieldDescription) -> bool {
    field.field_type == FieldType::Id && field.name.eq_ignore_ascii_case("id")
}

/// Quotes an identifier for SQLite.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column definition for `CREATE TABLE`.
pub fn column_definition(field: &FieldDescription) -> String {
    let mut definition = format!(
        "{} {}",
        quote_identifier(&field.name),
        map_field_type(&field.field_type)
    );
    if is_primary_key(field) {
        definition.push_str(" PRIMARY KEY");
    }
    definition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_field_type() {
        assert_eq!(map_field_type(&FieldType::Integer), "INTEGER");
        assert_eq!(map_field_type(&FieldType::Boolean), "INTEGER");
        assert_eq!(map_field_type(&FieldType::Double), "REAL");
        assert_eq!(map_field_type(&FieldType::DateTime), "TEXT");
        assert_eq!(map_field_type(&FieldType::Other("blob".to_string())), "TEXT");
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("Account"), "\"Account\"");
        assert_eq!(quote_identifier("We\"ird"), "\"We\"\"ird\"");
    }

    #[test]
    fn test_column_definition_primary_key() {
        let id = FieldDescription::new("Id", FieldType::Id);
        assert_eq!(column_definition(&id), "\"Id\" TEXT PRIMARY KEY");

        let owner = FieldDescription::new("OwnerId", FieldType::Reference);
        assert_eq!(column_definition(&owner), "\"OwnerId\" TEXT");

        let amount = FieldDescription::new("Amount", FieldType::Double);
        assert_eq!(column_definition(&amount), "\"Amount\" REAL");
    }
}
