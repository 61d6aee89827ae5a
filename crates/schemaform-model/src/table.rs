//! The schema container.
//!
//! A [`Table`] is an ordered, name-unique collection of [`Field`]
//! descriptors. Construction flattens inherited tables, rejects duplicate
//! or invalid names, and resolves each field's default validator chain
//! exactly once for fields that did not supply one.

use std::sync::Arc;

use schemaform_core::error::{FormError, FormResult};
use schemaform_core::utils::is_valid_identifier;

use crate::field::{Field, FieldType};
use crate::validators::{
    IsDate, IsDatetime, IsDecimalInRange, IsFloatInRange, IsIntInRange, IsLength, IsTime,
    ValidatorChain,
};

/// One constructor argument of [`Table::define`]: a field, or another
/// table whose non-identifier fields are copied in.
pub enum TableMember {
    /// A field descriptor.
    Field(Field),
    /// A table to inherit fields from.
    Inherit(Table),
}

impl From<Field> for TableMember {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<Table> for TableMember {
    fn from(table: Table) -> Self {
        Self::Inherit(table)
    }
}

/// An ordered, name-unique collection of field descriptors.
///
/// # Examples
///
/// ```
/// use schemaform_model::{Field, FieldType, Table};
///
/// let table = Table::define(
///     "person",
///     vec![
///         Field::new("name", FieldType::Str).unwrap().default("hello").into(),
///         Field::new("age", FieldType::Integer).unwrap().default(20).into(),
///     ],
/// )
/// .unwrap();
/// assert_eq!(table.field_names(), ["name", "age"]);
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    fields: Vec<Field>,
}

impl Table {
    /// Builds a table from fields and inherited tables, in order.
    ///
    /// Fails on an invalid table name, a duplicate field name, and nothing
    /// else; fields whose chain was left unset get the default validators
    /// for their type.
    pub fn define(name: impl Into<String>, members: Vec<TableMember>) -> FormResult<Self> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(FormError::InvalidFieldName(name));
        }

        let mut fields: Vec<Field> = Vec::new();
        for member in members {
            match member {
                TableMember::Field(field) => fields.push(field),
                TableMember::Inherit(table) => {
                    for field in table.fields {
                        if !matches!(field.field_type.base(), FieldType::Id) {
                            fields.push(field);
                        }
                    }
                }
            }
        }

        let mut table = Self {
            name,
            fields: Vec::with_capacity(fields.len()),
        };
        for mut field in fields {
            if table.contains(field.name()) {
                return Err(FormError::DuplicateField(field.name().to_string()));
            }
            if field.requires_unset() {
                let chain = default_validators(&field.field_type, field.length);
                field.set_validators(chain);
            }
            table.fields.push(field);
        }
        Ok(table)
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Looks up a field mutably (for post-construction configuration such
    /// as replacing a validator chain).
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    /// Returns `true` if a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name() == name)
    }

    /// Iterates the fields in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(Field::name).collect()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the table has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Resolves the default validator chain for a field type.
///
/// Custom types use their own chain when one was supplied; otherwise
/// resolution recurses on the declared kind, so a custom type over
/// `Double` still gets range checking unless the caller opts out with an
/// explicitly empty chain.
fn default_validators(field_type: &FieldType, length: usize) -> ValidatorChain {
    match field_type {
        FieldType::Str | FieldType::Password => vec![Arc::new(IsLength::new(length))],
        FieldType::Text => vec![Arc::new(IsLength::new(65536))],
        FieldType::Integer => vec![Arc::new(IsIntInRange::new(None, None))],
        FieldType::Double => vec![Arc::new(IsFloatInRange::new(None, None))],
        FieldType::Decimal => vec![Arc::new(IsDecimalInRange::new(-1e10, 1e10))],
        FieldType::Date => vec![Arc::new(IsDate::default())],
        FieldType::Time => vec![Arc::new(IsTime::default())],
        FieldType::Datetime => vec![Arc::new(IsDatetime::default())],
        FieldType::Custom(custom) => custom
            .validators()
            .cloned()
            .unwrap_or_else(|| default_validators(&custom.declared, length)),
        FieldType::Boolean
        | FieldType::Upload
        | FieldType::Hidden
        | FieldType::Blob
        | FieldType::Id
        | FieldType::StrList
        | FieldType::IntList => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::CustomType;
    use crate::validators::{IsInSet, Validator};
    use crate::value::Value;

    fn field(name: &str, ftype: FieldType) -> Field {
        Field::new(name, ftype).unwrap()
    }

    #[test]
    fn test_define_preserves_order() {
        let t = Table::define(
            "person",
            vec![
                field("name", FieldType::Str).into(),
                field("age", FieldType::Integer).into(),
                field("bio", FieldType::Text).into(),
            ],
        )
        .unwrap();
        assert_eq!(t.field_names(), ["name", "age", "bio"]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.name(), "person");
    }

    #[test]
    fn test_define_rejects_duplicates() {
        let err = Table::define(
            "person",
            vec![
                field("name", FieldType::Str).into(),
                field("name", FieldType::Text).into(),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, FormError::DuplicateField(name) if name == "name"));
    }

    #[test]
    fn test_define_rejects_bad_table_name() {
        assert!(Table::define("bad name", vec![]).is_err());
    }

    #[test]
    fn test_inherit_copies_non_id_fields() {
        let base = Table::define(
            "base",
            vec![
                field("id", FieldType::Id).into(),
                field("created", FieldType::Datetime).into(),
            ],
        )
        .unwrap();
        let t = Table::define(
            "person",
            vec![field("name", FieldType::Str).into(), base.into()],
        )
        .unwrap();
        assert_eq!(t.field_names(), ["name", "created"]);
    }

    #[test]
    fn test_default_validator_resolution() {
        let t = Table::define(
            "sample",
            vec![
                field("name", FieldType::Str).into(),
                field("age", FieldType::Integer).into(),
                field("ratio", FieldType::Double).into(),
                field("born", FieldType::Date).into(),
                field("flag", FieldType::Boolean).into(),
            ],
        )
        .unwrap();

        // String fields get a bounded length check.
        let name = t.field("name").unwrap();
        assert_eq!(name.validators().len(), 1);
        assert!(name.validate(Value::from("ok")).is_ok());
        assert!(name.validate(Value::from("x".repeat(513))).is_err());

        // Integer fields coerce strings to ints.
        let age = t.field("age").unwrap();
        assert_eq!(age.validate(Value::from("40")).unwrap(), Value::Int(40));

        // Double fields coerce strings to floats.
        let ratio = t.field("ratio").unwrap();
        assert_eq!(
            ratio.validate(Value::from("2.5")).unwrap(),
            Value::Float(2.5)
        );

        // Date fields parse.
        let born = t.field("born").unwrap();
        assert!(matches!(
            born.validate(Value::from("1999-01-02")).unwrap(),
            Value::Date(_)
        ));

        // Booleans have no natural canonical validator.
        assert!(t.field("flag").unwrap().validators().is_empty());
    }

    #[test]
    fn test_explicit_empty_chain_not_overridden() {
        let t = Table::define(
            "sample",
            vec![field("name", FieldType::Str).no_validation().into()],
        )
        .unwrap();
        assert!(t.field("name").unwrap().validators().is_empty());
        // Anything goes.
        assert!(t
            .field("name")
            .unwrap()
            .validate(Value::from("x".repeat(100_000)))
            .is_ok());
    }

    #[test]
    fn test_explicit_chain_not_overridden() {
        let chain: Vec<Arc<dyn Validator>> = vec![Arc::new(IsInSet::new(vec![("a", "A")]))];
        let t = Table::define(
            "sample",
            vec![field("pick", FieldType::Str).requires(chain).into()],
        )
        .unwrap();
        let pick = t.field("pick").unwrap();
        assert!(pick.has_options());
        assert!(pick.validate(Value::from("b")).is_err());
    }

    #[test]
    fn test_custom_type_falls_back_to_declared_defaults() {
        let custom = FieldType::Custom(CustomType::new(FieldType::Double, FieldType::Integer));
        let t = Table::define("sample", vec![field("amount", custom).into()]).unwrap();
        let amount = t.field("amount").unwrap();
        assert_eq!(amount.validators().len(), 1);
        assert_eq!(
            amount.validate(Value::from("1.5")).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_custom_type_own_chain_wins() {
        let custom = CustomType::new(FieldType::Str, FieldType::Str)
            .validator(vec![Arc::new(IsInSet::new(vec![("only", "Only")]))]);
        let t = Table::define(
            "sample",
            vec![field("pick", FieldType::Custom(custom)).into()],
        )
        .unwrap();
        assert!(t.field("pick").unwrap().has_options());
    }

    #[test]
    fn test_field_mut_allows_reconfiguring_chain() {
        let mut t = Table::define(
            "person",
            vec![field("age", FieldType::Integer).into()],
        )
        .unwrap();
        t.field_mut("age")
            .unwrap()
            .set_validators(vec![Arc::new(IsIntInRange::new(Some(18), Some(25)))]);
        assert!(t.field("age").unwrap().validate(Value::from("40")).is_err());
    }

    #[test]
    fn test_lookup_missing() {
        let t = Table::define("empty", vec![]).unwrap();
        assert!(t.field("nope").is_none());
        assert!(t.is_empty());
    }
}
