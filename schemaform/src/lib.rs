//! # schemaform
//!
//! Schema-driven HTML form generation and data binding: declare a record
//! schema once (field names, types, validators, defaults) and get both a
//! rendered input form and a server-side acceptance routine that
//! type-coerces and validates posted values.
//!
//! This is the meta-crate re-exporting all sub-crates. Depend on it for
//! the whole stack, or on individual crates for finer-grained control.
//!
//! ```
//! use schemaform::forms::FormBuilder;
//! use schemaform::http::FormData;
//! use schemaform::model::{Field, FieldType, Table, Value};
//!
//! let table = Table::define(
//!     "person",
//!     vec![
//!         Field::new("name", FieldType::Str).unwrap().default("hello").into(),
//!         Field::new("age", FieldType::Integer).unwrap().default(20).into(),
//!     ],
//! )
//! .unwrap();
//!
//! let mut form = FormBuilder::new(table).build().unwrap();
//! assert!(form.xml().contains("person_age"));
//!
//! let posted = FormData::parse("name=huaiyu&age=40");
//! assert!(form.accept(&posted).unwrap());
//! assert_eq!(form.values().get("age"), Some(&Value::Int(40)));
//! ```

/// Errors, settings, logging, and text utilities.
pub use schemaform_core as core;

/// Markup nodes and HTML serialization.
pub use schemaform_html as html;

/// Posted form data: `QueryDict`, uploaded files, `FormData`.
pub use schemaform_http as http;

/// Field descriptors, tables, values, and validators.
pub use schemaform_model as model;

/// File persistence for upload fields.
pub use schemaform_storage as storage;

/// Widget registry, form builder, and submission acceptance.
pub use schemaform_forms as forms;
