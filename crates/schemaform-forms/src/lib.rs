//! Form layer for schemaform.
//!
//! Two independent traversals over a [`Table`](schemaform_model::Table)
//! share the widget registry: the render path ([`FormBuilder`] → [`Form`])
//! produces the markup tree, and the bind path ([`Form::accept`]) validates
//! and coerces posted values back into typed form.

pub mod accept;
pub mod form;
pub mod widgets;

pub use accept::{AcceptContext, BaseAccept, ValidatingAccept, FIELDNAME_REQUEST_DELETE};
pub use form::{DeletePolicy, Form, FormBuilder, FormStyle, RowLayout, TabGroup};
pub use widgets::{widget_for, Widget, PASSWORD_DISPLAY, UPLOAD_DELETE_SUFFIX};
