//! Schema layer for schemaform.
//!
//! A [`Table`] is an ordered, name-unique collection of [`Field`]
//! descriptors. Each field carries a closed [`FieldType`], an optional
//! validator chain, defaults, read/write policy, and rendering hints. The
//! [`Value`] enum is the typed currency passed between the schema, the
//! widgets, and the bind path.

pub mod field;
pub mod table;
pub mod validators;
pub mod value;

pub use field::{CustomType, Field, FieldType, WidgetKind};
pub use table::{Table, TableMember};
pub use validators::Validator;
pub use value::Value;
