//! Field descriptors.
//!
//! A [`Field`] describes one named, typed form input: its [`FieldType`],
//! length, defaults, read/write policy, validator chain, and rendering
//! hints. Behavior that belongs to the descriptor itself lives here:
//! chain validation (short-circuiting), reverse-order display formatting,
//! and upload store/retrieve dispatch.

use std::fmt;
use std::sync::Arc;

use schemaform_core::error::{FormError, FormResult, ValidationError};
use schemaform_core::settings::MAX_CHAR_LENGTH;
use schemaform_core::utils::{is_valid_identifier, label_from_name};
use schemaform_http::UploadedFile;
use schemaform_storage::{FileStore, StorageSlot};

use crate::validators::{Validator, ValidatorChain};
use crate::value::Value;

/// A custom field type: a declared form-facing kind, a native storage
/// kind, and encoder/decoder closures translating between them.
#[derive(Clone)]
pub struct CustomType {
    /// The kind the form layer sees (drives widgets and defaults).
    pub declared: Box<FieldType>,
    /// The kind the storage layer sees.
    pub native: Box<FieldType>,
    encoder: Arc<dyn Fn(Value) -> Value + Send + Sync>,
    decoder: Arc<dyn Fn(Value) -> Value + Send + Sync>,
    validator: Option<ValidatorChain>,
}

impl CustomType {
    /// Creates a custom type with identity encoding.
    pub fn new(declared: FieldType, native: FieldType) -> Self {
        Self {
            declared: Box::new(declared),
            native: Box::new(native),
            encoder: Arc::new(|v| v),
            decoder: Arc::new(|v| v),
            validator: None,
        }
    }

    /// Sets the encoder applied when storing a value.
    #[must_use]
    pub fn encoder(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.encoder = Arc::new(f);
        self
    }

    /// Sets the decoder applied when loading a value.
    #[must_use]
    pub fn decoder(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.decoder = Arc::new(f);
        self
    }

    /// Supplies the validator chain used instead of the declared kind's
    /// defaults.
    #[must_use]
    pub fn validator(mut self, chain: ValidatorChain) -> Self {
        self.validator = Some(chain);
        self
    }

    /// Encodes a value for storage.
    pub fn encode(&self, value: Value) -> Value {
        (self.encoder)(value)
    }

    /// Decodes a stored value.
    pub fn decode(&self, value: Value) -> Value {
        (self.decoder)(value)
    }

    /// Returns the explicit validator chain, if one was supplied.
    pub fn validators(&self) -> Option<&ValidatorChain> {
        self.validator.as_ref()
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("declared", &self.declared)
            .field("native", &self.native)
            .finish_non_exhaustive()
    }
}

/// The closed vocabulary of field types.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A bounded single-line string.
    Str,
    /// Multi-line text.
    Text,
    /// A password (masked on display, sentinel-guarded on accept).
    Password,
    /// A 64-bit integer.
    Integer,
    /// A 64-bit float.
    Double,
    /// A fixed-point decimal amount.
    Decimal,
    /// A calendar date.
    Date,
    /// A time of day.
    Time,
    /// A date and time.
    Datetime,
    /// A true/false flag.
    Boolean,
    /// An uploaded file, stored by reference token.
    Upload,
    /// A value carried through the form without user editing.
    Hidden,
    /// Raw bytes; never rendered and never bound from posted data.
    Blob,
    /// A record identifier; skipped by the bind path.
    Id,
    /// A growable list of strings.
    StrList,
    /// A growable list of integers.
    IntList,
    /// A caller-defined type built over a declared kind.
    Custom(CustomType),
}

impl FieldType {
    /// Resolves the form-facing kind, unwrapping custom types.
    pub fn base(&self) -> &Self {
        match self {
            Self::Custom(custom) => custom.declared.base(),
            other => other,
        }
    }

    /// Returns `true` for list-typed fields (posted sequences are
    /// preserved rather than collapsed).
    pub fn is_list(&self) -> bool {
        matches!(self.base(), Self::StrList | Self::IntList)
    }

    /// The CSS class widgets attach to controls of this type.
    pub fn css_class(&self) -> &'static str {
        match self.base() {
            Self::Str => "string",
            Self::Text => "text",
            Self::Password => "password",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Upload => "upload",
            Self::Hidden => "hidden",
            Self::Blob => "blob",
            Self::Id => "id",
            Self::StrList | Self::IntList => "list",
            Self::Custom(_) => unreachable!("base() unwraps custom types"),
        }
    }

    /// The widget kind this type renders with by default, or `None` for
    /// types that are never rendered.
    pub fn default_widget(&self) -> Option<WidgetKind> {
        let kind = match self.base() {
            Self::Str => WidgetKind::Str,
            Self::Text => WidgetKind::Text,
            Self::Password => WidgetKind::Password,
            Self::Integer => WidgetKind::Integer,
            Self::Double => WidgetKind::Double,
            Self::Decimal => WidgetKind::Decimal,
            Self::Date => WidgetKind::Date,
            Self::Time => WidgetKind::Time,
            Self::Datetime => WidgetKind::Datetime,
            Self::Boolean => WidgetKind::Boolean,
            Self::Upload => WidgetKind::Upload,
            Self::Hidden => WidgetKind::Hidden,
            Self::StrList | Self::IntList => WidgetKind::List,
            Self::Blob | Self::Id => return None,
            Self::Custom(_) => unreachable!("base() unwraps custom types"),
        };
        Some(kind)
    }
}

/// Widget kinds a field may hint at or a registry may dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Single-line text input.
    Str,
    /// Multi-line textarea.
    Text,
    /// Masked password input.
    Password,
    /// Text input classed as integer.
    Integer,
    /// Text input classed as double.
    Double,
    /// Text input classed as decimal.
    Decimal,
    /// Text input classed as date.
    Date,
    /// Text input classed as time.
    Time,
    /// Text input classed as datetime.
    Datetime,
    /// Checkbox.
    Boolean,
    /// File input with link/preview/delete affordances.
    Upload,
    /// Hidden input.
    Hidden,
    /// Single-select dropdown fed by validator options.
    Options,
    /// Multi-select list fed by validator options.
    MultiOptions,
    /// Radio-button grid fed by validator options.
    Radio,
    /// Checkbox grid fed by validator options.
    Checkboxes,
    /// Growable list of single-value inputs.
    List,
}

/// Hook storing an upload, bypassing the file-store collaborator.
pub type StoreHook = dyn Fn(&UploadedFile, Option<&str>) -> FormResult<String> + Send + Sync;

/// Hook resolving a stored reference, bypassing the file-store collaborator.
pub type RetrieveHook = dyn Fn(&str) -> FormResult<(String, Vec<u8>)> + Send + Sync;

/// Hook producing a read-only rendering of a value.
///
/// The returned string is inserted into the markup verbatim.
pub type RepresentHook = dyn Fn(&Value) -> String + Send + Sync;

/// The validator-chain slot: distinguishes "resolve defaults for me" from
/// an explicitly supplied chain (including an explicitly empty one).
#[derive(Debug, Clone, Default)]
pub(crate) enum Requires {
    /// No chain supplied; the owning table resolves type defaults.
    #[default]
    Unset,
    /// An explicit chain; empty means "no validation".
    Chain(ValidatorChain),
}

/// Metadata and behavior for one named, typed form input.
#[derive(Clone)]
pub struct Field {
    name: String,
    /// The field's type.
    pub field_type: FieldType,
    /// Maximum representable size for text-like types.
    pub length: usize,
    /// Value used when no record or posted value is present.
    pub default: Option<Value>,
    /// Value used instead of `default` when editing an existing record.
    pub update: Option<Value>,
    /// Whether the bind path accepts posted values for this field.
    pub writable: bool,
    /// Whether the render path may show this field.
    pub readable: bool,
    /// Display label; defaults to a title-cased rendering of the name.
    pub label: String,
    /// Side comment shown next to the control.
    pub comment: Option<String>,
    /// Optional widget-kind override for rendering.
    pub widget: Option<WidgetKind>,
    /// Optional read-only renderer.
    pub represent: Option<Arc<RepresentHook>>,
    pub(crate) requires: Requires,
    custom_store: Option<Arc<StoreHook>>,
    custom_retrieve: Option<Arc<RetrieveHook>>,
}

impl Field {
    /// Creates a field descriptor.
    ///
    /// Fails if `name` contains characters outside `[0-9A-Za-z_]`.
    /// List-typed fields get a comma-joining `represent` by default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> FormResult<Self> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(FormError::InvalidFieldName(name));
        }
        let label = label_from_name(&name);
        let represent: Option<Arc<RepresentHook>> = if field_type.is_list() {
            Some(Arc::new(|v: &Value| v.to_string()))
        } else {
            None
        };
        Ok(Self {
            name,
            field_type,
            length: MAX_CHAR_LENGTH,
            default: None,
            update: None,
            writable: true,
            readable: true,
            label,
            comment: None,
            widget: None,
            represent,
            requires: Requires::Unset,
            custom_store: None,
            custom_retrieve: None,
        })
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ── builder methods ────────────────────────────────────────────────

    /// Sets the maximum length for text-like types.
    #[must_use]
    pub const fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the update-only value (used instead of the default when
    /// editing an existing record).
    #[must_use]
    pub fn update(mut self, value: impl Into<Value>) -> Self {
        self.update = Some(value.into());
        self
    }

    /// Sets whether posted values are accepted.
    #[must_use]
    pub const fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Sets whether the field may be shown.
    #[must_use]
    pub const fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Overrides the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the side comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Hints the widget kind to render with.
    #[must_use]
    pub const fn widget(mut self, kind: WidgetKind) -> Self {
        self.widget = Some(kind);
        self
    }

    /// Sets the read-only renderer.
    #[must_use]
    pub fn represent(mut self, f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.represent = Some(Arc::new(f));
        self
    }

    /// Supplies the validator chain explicitly.
    #[must_use]
    pub fn requires(mut self, chain: ValidatorChain) -> Self {
        self.requires = Requires::Chain(chain);
        self
    }

    /// Supplies a single validator as the whole chain.
    #[must_use]
    pub fn validator(self, validator: Arc<dyn Validator>) -> Self {
        self.requires(vec![validator])
    }

    /// Declares that this field performs no validation at all (distinct
    /// from leaving the chain unset, which resolves type defaults).
    #[must_use]
    pub fn no_validation(self) -> Self {
        self.requires(Vec::new())
    }

    /// Sets the custom store hook for upload fields.
    #[must_use]
    pub fn custom_store(
        mut self,
        f: impl Fn(&UploadedFile, Option<&str>) -> FormResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.custom_store = Some(Arc::new(f));
        self
    }

    /// Sets the custom retrieve hook for upload fields.
    #[must_use]
    pub fn custom_retrieve(
        mut self,
        f: impl Fn(&str) -> FormResult<(String, Vec<u8>)> + Send + Sync + 'static,
    ) -> Self {
        self.custom_retrieve = Some(Arc::new(f));
        self
    }

    // ── chain accessors ────────────────────────────────────────────────

    /// Returns the validator chain (empty when unset or explicitly empty).
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        match &self.requires {
            Requires::Unset => &[],
            Requires::Chain(chain) => chain,
        }
    }

    /// Replaces the validator chain after construction.
    pub fn set_validators(&mut self, chain: ValidatorChain) {
        self.requires = Requires::Chain(chain);
    }

    pub(crate) fn requires_unset(&self) -> bool {
        matches!(self.requires, Requires::Unset)
    }

    /// Returns `true` if the chain exposes an option set.
    pub fn has_options(&self) -> bool {
        self.validators()
            .first()
            .is_some_and(|v| v.options().is_some())
    }

    /// Returns the chain's option set, if any.
    pub fn options(&self) -> Option<Vec<(String, String)>> {
        self.validators().first().and_then(|v| v.options())
    }

    /// Returns `true` if the chain allows multiple selections.
    pub fn multiple(&self) -> bool {
        self.validators().first().is_some_and(|v| v.is_multiple())
    }

    /// Returns `true` if the chain accepts empty input (empty chain or a
    /// leading empty-tolerant validator).
    pub fn allows_empty(&self) -> bool {
        self.validators()
            .first()
            .map_or(true, |v| v.allows_empty())
    }

    // ── descriptor behavior ────────────────────────────────────────────

    /// Applies the validator chain left to right, stopping at the first
    /// error. Later validators never see a value once one has failed.
    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let mut value = value;
        for validator in self.validators() {
            value = validator.validate(value)?;
        }
        Ok(value)
    }

    /// Applies the chain's display formatting in reverse order.
    ///
    /// A no-op when the value is `Null` or the chain is empty.
    pub fn format(&self, value: Value) -> Value {
        if value.is_null() || self.validators().is_empty() {
            return value;
        }
        let mut value = value;
        for validator in self.validators().iter().rev() {
            value = validator.format(value);
        }
        value
    }

    /// Resolves the value shown when no posted value exists: the
    /// update-only value wins while editing, else the default.
    pub fn display_default(&self, editing: bool) -> Value {
        let chosen = if editing {
            self.update.as_ref().or(self.default.as_ref())
        } else {
            self.default.as_ref()
        };
        chosen.cloned().unwrap_or(Value::Null)
    }

    /// Persists an upload through the custom hook or the file-store
    /// collaborator.
    ///
    /// Fails with a configuration error when neither is available.
    pub fn store(
        &self,
        file: &UploadedFile,
        filename_hint: Option<&str>,
        store: Option<&dyn FileStore>,
        slot: &StorageSlot<'_>,
    ) -> FormResult<String> {
        if let Some(hook) = &self.custom_store {
            return hook(file, filename_hint);
        }
        match store {
            Some(fs) => fs.store(file, filename_hint, slot),
            None => Err(FormError::MissingStorageTarget(self.name.clone())),
        }
    }

    /// Resolves a stored reference through the custom hook or the
    /// file-store collaborator.
    pub fn retrieve(
        &self,
        token: &str,
        store: Option<&dyn FileStore>,
        slot: &StorageSlot<'_>,
    ) -> FormResult<(String, Vec<u8>)> {
        if let Some(hook) = &self.custom_retrieve {
            return hook(token);
        }
        match store {
            Some(fs) => fs.retrieve(token, slot),
            None => Err(FormError::MissingStorageTarget(self.name.clone())),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("length", &self.length)
            .field("default", &self.default)
            .field("writable", &self.writable)
            .field("readable", &self.readable)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
