//! Posted form data for schemaform.
//!
//! Form submissions arrive as a string-keyed mapping where a key may carry
//! one value or several (repeated keys in form-encoded bodies arrive as
//! sequences). [`QueryDict`] models that mapping; [`FormData`] pairs it with
//! any uploaded file payloads for the bind path.

pub mod querydict;
pub mod upload;

pub use querydict::QueryDict;
pub use upload::{FormData, UploadedFile};
