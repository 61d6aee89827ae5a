//! The form builder and form instance.
//!
//! [`FormBuilder`] collects configuration (record, field subset, overrides,
//! layout, policies) and its `build` performs the render pass: it walks the
//! permitted fields, resolves each display value, dispatches to a widget or
//! a read-only rendering, and records one row per field together with a
//! row-handle registry used later by re-render-on-error. [`Form`] owns the
//! produced rows plus all bind-path state; layout assembly happens at
//! [`Form::render`] time so patched controls are always reflected.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use schemaform_core::error::{FormError, FormResult};
use schemaform_core::logging;
use schemaform_html::{Element, Node};
use schemaform_http::FormData;
use schemaform_model::{Field, FieldType, Table, Value};
use schemaform_storage::FileStore;

use crate::accept::{BaseAccept, ValidatingAccept};
use crate::widgets::{widget_for, AttrMap, FileUpload, Widget};

/// Suffix of each field row's id attribute.
pub const ID_ROW_SUFFIX: &str = "__row";

/// Suffix of each field label's id attribute.
pub const ID_LABEL_SUFFIX: &str = "__label";

/// A custom row layout callback for [`FormStyle::Custom`].
pub trait RowLayout: Send + Sync {
    /// Produces the layout nodes for one row.
    fn rows(&self, row_id: &str, label: Node, control: Node, comment: Node) -> Vec<Node>;
}

/// The fixed set of form layout styles.
#[derive(Clone)]
pub enum FormStyle {
    /// One table row per field: label, control, comment.
    Table3Cols,
    /// Two table rows per field: label+comment, then the control.
    Table2Cols,
    /// Nested `<div>` groups.
    Divs,
    /// An `<ul>` with one `<li>` per field.
    UnorderedList,
    /// A caller-supplied row layout.
    Custom(Arc<dyn RowLayout>),
}

impl Default for FormStyle {
    fn default() -> Self {
        Self::Table3Cols
    }
}

impl fmt::Debug for FormStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table3Cols => write!(f, "Table3Cols"),
            Self::Table2Cols => write!(f, "Table2Cols"),
            Self::Divs => write!(f, "Divs"),
            Self::UnorderedList => write!(f, "UnorderedList"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl FromStr for FormStyle {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table3cols" => Ok(Self::Table3Cols),
            "table2cols" => Ok(Self::Table2Cols),
            "divs" => Ok(Self::Divs),
            "ul" => Ok(Self::UnorderedList),
            other => Err(FormError::UnknownFormStyle(other.to_string())),
        }
    }
}

/// Whether a delete request is honored on a submission whose base
/// validation failed for unrelated reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Honor deletion of an existing record even when other fields are
    /// invalid; deletion does not require the record to validate first.
    #[default]
    IgnoreErrors,
    /// Only honor deletion when base validation succeeded.
    RequireValid,
}

/// One tab of a grouped form: an identifier, a visible caption, and the
/// member field list.
#[derive(Debug, Clone)]
pub struct TabGroup {
    /// Tab identifier (used in element ids).
    pub name: String,
    /// Visible caption.
    pub caption: String,
    /// Names of the fields rendered inside this tab.
    pub members: Vec<String>,
}

impl TabGroup {
    /// Creates a tab group.
    pub fn new(
        name: impl Into<String>,
        caption: impl Into<String>,
        members: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
            members,
        }
    }
}

/// Caller-supplied upload handler replacing the default store dispatch.
pub type UploadHandler = dyn Fn(&Field, &FormData) -> FormResult<Value> + Send + Sync;

pub(crate) struct FormConfig {
    pub(crate) ignore_rw: bool,
    pub(crate) deletable: bool,
    pub(crate) delete_policy: DeletePolicy,
    pub(crate) style: FormStyle,
    pub(crate) download_url: Option<String>,
    pub(crate) hidden: Vec<(String, String)>,
    pub(crate) tabs: Option<Vec<TabGroup>>,
    pub(crate) record_key: String,
    pub(crate) formname: String,
    pub(crate) multipart: bool,
    pub(crate) upload_handler: Option<Arc<UploadHandler>>,
    pub(crate) file_store: Option<Arc<dyn FileStore>>,
    pub(crate) widget_overrides: HashMap<String, Arc<dyn Widget>>,
    pub(crate) base_accept: Arc<dyn BaseAccept>,
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("ignore_rw", &self.ignore_rw)
            .field("deletable", &self.deletable)
            .field("delete_policy", &self.delete_policy)
            .field("style", &self.style)
            .field("download_url", &self.download_url)
            .field("hidden", &self.hidden)
            .field("tabs", &self.tabs)
            .field("record_key", &self.record_key)
            .field("formname", &self.formname)
            .field("multipart", &self.multipart)
            .field("upload_handler", &self.upload_handler.as_ref().map(|_| "<fn>"))
            .field("file_store", &self.file_store)
            .field("widget_overrides", &self.widget_overrides)
            .field("base_accept", &self.base_accept)
            .finish()
    }
}

/// One rendered row: the owning field (if any), the row id, and the
/// label/control/comment nodes.
#[derive(Debug)]
pub(crate) struct FormRow {
    pub(crate) field: Option<String>,
    pub(crate) row_id: String,
    pub(crate) label: Node,
    pub(crate) control: Node,
    pub(crate) comment: Node,
}

/// Collects configuration for one form instance.
pub struct FormBuilder {
    table: Table,
    record: Option<HashMap<String, Value>>,
    field_subset: Option<Vec<String>>,
    labels: HashMap<String, String>,
    comments: HashMap<String, String>,
    show_comments: bool,
    readonly: bool,
    ignore_rw: bool,
    deletable: bool,
    delete_policy: DeletePolicy,
    delete_label: String,
    submit_label: String,
    style: FormStyle,
    download_url: Option<String>,
    hidden: Vec<(String, String)>,
    tabs: Option<Vec<TabGroup>>,
    record_key: String,
    prefill: HashMap<String, Value>,
    upload_handler: Option<Arc<UploadHandler>>,
    file_store: Option<Arc<dyn FileStore>>,
    widget_overrides: HashMap<String, Arc<dyn Widget>>,
    base_accept: Arc<dyn BaseAccept>,
}

impl fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormBuilder")
            .field("table", &self.table)
            .field("record", &self.record)
            .field("field_subset", &self.field_subset)
            .field("labels", &self.labels)
            .field("comments", &self.comments)
            .field("show_comments", &self.show_comments)
            .field("readonly", &self.readonly)
            .field("ignore_rw", &self.ignore_rw)
            .field("deletable", &self.deletable)
            .field("delete_policy", &self.delete_policy)
            .field("delete_label", &self.delete_label)
            .field("submit_label", &self.submit_label)
            .field("style", &self.style)
            .field("download_url", &self.download_url)
            .field("hidden", &self.hidden)
            .field("tabs", &self.tabs)
            .field("record_key", &self.record_key)
            .field("prefill", &self.prefill)
            .field("upload_handler", &self.upload_handler.as_ref().map(|_| "<fn>"))
            .field("file_store", &self.file_store)
            .field("widget_overrides", &self.widget_overrides)
            .field("base_accept", &self.base_accept)
            .finish()
    }
}

impl FormBuilder {
    /// Starts a builder over a schema.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            record: None,
            field_subset: None,
            labels: HashMap::new(),
            comments: HashMap::new(),
            show_comments: true,
            readonly: false,
            ignore_rw: false,
            deletable: false,
            delete_policy: DeletePolicy::default(),
            delete_label: "Check to delete:".to_string(),
            submit_label: "Submit".to_string(),
            style: FormStyle::default(),
            download_url: None,
            hidden: Vec::new(),
            tabs: None,
            record_key: "_id".to_string(),
            prefill: HashMap::new(),
            upload_handler: None,
            file_store: None,
            widget_overrides: HashMap::new(),
            base_accept: Arc::new(ValidatingAccept),
        }
    }

    /// Binds an existing record; the form becomes an update form.
    #[must_use]
    pub fn record(mut self, record: HashMap<String, Value>) -> Self {
        self.record = Some(record);
        self
    }

    /// Restricts the form to an explicit field subset, in order.
    #[must_use]
    pub fn fields(mut self, names: Vec<String>) -> Self {
        self.field_subset = Some(names);
        self
    }

    /// Overrides one field's label (rendered without the default colon).
    #[must_use]
    pub fn label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    /// Overrides one field's side comment.
    #[must_use]
    pub fn comment(mut self, field: impl Into<String>, comment: impl Into<String>) -> Self {
        self.comments.insert(field.into(), comment.into());
        self
    }

    /// Hides the comment column entirely.
    #[must_use]
    pub const fn show_comments(mut self, show: bool) -> Self {
        self.show_comments = show;
        self
    }

    /// Renders every field read-only and drops the submit control.
    #[must_use]
    pub const fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Ignores per-field read/write flags.
    #[must_use]
    pub const fn ignore_rw(mut self, ignore: bool) -> Self {
        self.ignore_rw = ignore;
        self
    }

    /// Allows the delete-request sub-flow.
    #[must_use]
    pub const fn deletable(mut self, deletable: bool) -> Self {
        self.deletable = deletable;
        self
    }

    /// Chooses how delete requests interact with failed validation.
    #[must_use]
    pub const fn delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Overrides the delete-row label.
    #[must_use]
    pub fn delete_label(mut self, label: impl Into<String>) -> Self {
        self.delete_label = label.into();
        self
    }

    /// Overrides the submit-button label.
    #[must_use]
    pub fn submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    /// Selects the layout style.
    #[must_use]
    pub fn style(mut self, style: FormStyle) -> Self {
        self.style = style;
        self
    }

    /// Selects the layout style from its string selector.
    pub fn style_named(self, name: &str) -> FormResult<Self> {
        let style = FormStyle::from_str(name)?;
        Ok(self.style(style))
    }

    /// Base URL stored uploads are linked under.
    #[must_use]
    pub fn download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Adds a hidden name/value pair to the rendered form.
    #[must_use]
    pub fn hidden(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.hidden.push((name.into(), value.into()));
        self
    }

    /// Groups fields into tabs.
    #[must_use]
    pub fn tabs(mut self, tabs: Vec<TabGroup>) -> Self {
        self.tabs = Some(tabs);
        self
    }

    /// Names the record-key entry (default `_id`).
    #[must_use]
    pub fn record_key(mut self, key: impl Into<String>) -> Self {
        self.record_key = key.into();
        self
    }

    /// Pre-populates a working value before any submission arrives.
    #[must_use]
    pub fn prefill(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prefill.insert(field.into(), value.into());
        self
    }

    /// Replaces default upload handling with a caller-supplied handler.
    #[must_use]
    pub fn upload_handler(
        mut self,
        handler: impl Fn(&Field, &FormData) -> FormResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.upload_handler = Some(Arc::new(handler));
        self
    }

    /// Supplies the file-store collaborator for upload fields.
    #[must_use]
    pub fn file_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.file_store = Some(store);
        self
    }

    /// Overrides one field's widget with a custom strategy.
    #[must_use]
    pub fn widget_override(mut self, field: impl Into<String>, widget: Arc<dyn Widget>) -> Self {
        self.widget_overrides.insert(field.into(), widget);
        self
    }

    /// Replaces the base structural-validation collaborator.
    #[must_use]
    pub fn base_accept(mut self, accept: Arc<dyn BaseAccept>) -> Self {
        self.base_accept = accept;
        self
    }

    /// Runs the render pass and produces the form instance.
    ///
    /// Fails on structural problems only: a choice widget with no option
    /// source, or a failing custom widget.
    pub fn build(self) -> FormResult<Form> {
        let span = logging::render_span(self.table.name());
        let _guard = span.enter();

        let editing = self.record.is_some();
        let field_list: Vec<String> = match &self.field_subset {
            Some(list) => list.clone(),
            None => self
                .table
                .iter()
                .filter(|f| self.ignore_rw || f.writable || f.readable)
                .map(|f| f.name().to_string())
                .collect(),
        };

        let mut rows: Vec<FormRow> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();

        for name in &field_list {
            // Dotted names reference related fields and are not rendered
            // here.
            if name.contains('.') {
                continue;
            }
            let Some(field) = self.table.field(name) else {
                continue;
            };
            if self.readonly && !self.ignore_rw && !field.readable {
                continue;
            }

            let field_id = format!("{}_{}", self.table.name(), name);
            let row_id = format!("{field_id}{ID_ROW_SUFFIX}");

            let comment = if self.show_comments {
                self.comments
                    .get(name)
                    .cloned()
                    .or_else(|| field.comment.clone())
                    .unwrap_or_default()
            } else {
                String::new()
            };

            let (label_text, colon) = self.labels.get(name).map_or_else(
                || (field.label.clone(), ": "),
                |custom| (custom.clone(), ""),
            );
            let label: Node = Element::new("label")
                .attr("for", field_id.clone())
                .attr("id", format!("{field_id}{ID_LABEL_SUFFIX}"))
                .child(Node::text(format!("{label_text}{colon}")))
                .into();

            let mut display = self
                .record
                .as_ref()
                .and_then(|r| r.get(name))
                .cloned()
                .unwrap_or_else(|| field.display_default(editing));
            let protected =
                self.readonly || (!self.ignore_rw && !field.writable && field.readable);
            if display.is_truthy() && !protected {
                display = field.format(display);
            }

            let control = if protected {
                self.represent_control(field, &display)?
            } else {
                self.widget_control(field, &display)?
            };
            let Some(control) = control else {
                continue;
            };

            row_index.insert(name.clone(), rows.len());
            rows.push(FormRow {
                field: Some(name.clone()),
                row_id,
                label,
                control,
                comment: Node::text(comment),
            });
        }

        if self.deletable && editing && !self.readonly {
            let control_id = format!("{}_delete_this_record", self.table.name());
            let label: Node = Element::new("label")
                .attr("for", control_id.clone())
                .child(Node::text(self.delete_label.clone()))
                .into();
            let checkbox = Element::new("input")
                .attr("type", "checkbox")
                .attr("class", "delete")
                .attr("id", control_id)
                .attr("name", crate::accept::FIELDNAME_REQUEST_DELETE);
            rows.push(FormRow {
                field: None,
                row_id: format!("delete_record{ID_ROW_SUFFIX}"),
                label,
                control: checkbox.into(),
                comment: Node::text(""),
            });
        }

        if !self.readonly {
            let submit = Element::new("input")
                .attr("type", "submit")
                .attr("class", "submit")
                .attr("value", self.submit_label.clone());
            rows.push(FormRow {
                field: None,
                row_id: format!("submit_record{ID_ROW_SUFFIX}"),
                label: Node::text(""),
                control: submit.into(),
                comment: Node::text(
                    self.comments.get("submit_button").cloned().unwrap_or_default(),
                ),
            });
        }

        let formname = match self
            .record
            .as_ref()
            .map(|r| r.get(&self.record_key))
        {
            Some(Some(id)) => format!("{}_{id}", self.table.name()),
            Some(None) => format!("{}_update", self.table.name()),
            None => format!("{}_create", self.table.name()),
        };

        let multipart = field_list.iter().any(|name| {
            self.table
                .field(name)
                .is_some_and(|f| matches!(f.field_type.base(), FieldType::Upload))
        });

        debug!(fields = field_list.len(), rows = rows.len(), "form built");

        Ok(Form {
            table: self.table,
            record: self.record,
            field_list,
            rows,
            row_index,
            vars: self.prefill,
            values: HashMap::new(),
            errors: HashMap::new(),
            accepted: None,
            delete_requested: false,
            cfg: FormConfig {
                ignore_rw: self.ignore_rw,
                deletable: self.deletable,
                delete_policy: self.delete_policy,
                style: self.style,
                download_url: self.download_url,
                hidden: self.hidden,
                tabs: self.tabs,
                record_key: self.record_key,
                formname,
                multipart,
                upload_handler: self.upload_handler,
                file_store: self.file_store,
                widget_overrides: self.widget_overrides,
                base_accept: self.base_accept,
            },
        })
    }

    /// Read-only rendering for a protected field; `None` skips the field.
    fn represent_control(&self, field: &Field, display: &Value) -> FormResult<Option<Node>> {
        if let Some(represent) = &field.represent {
            return Ok(Some(Node::raw(represent(display))));
        }
        let node = match field.field_type.base() {
            FieldType::Blob => return Ok(None),
            FieldType::Upload => {
                FileUpload::represent(display, self.download_url.as_deref())
            }
            FieldType::Boolean => {
                let mut attrs = AttrMap::new();
                attrs.insert("disabled".to_string(), true.into());
                widget_for(schemaform_model::WidgetKind::Boolean).render(
                    self.table.name(),
                    field,
                    display,
                    &attrs,
                )?
            }
            _ => Node::text(field.format(display.clone()).to_string()),
        };
        Ok(Some(node))
    }

    /// Interactive widget dispatch; `None` skips the field.
    fn widget_control(&self, field: &Field, display: &Value) -> FormResult<Option<Node>> {
        let table = self.table.name();
        let attrs = AttrMap::new();

        // Uploads come first so they receive the download collaborator.
        if matches!(field.field_type.base(), FieldType::Upload) {
            if let Some(custom) = self.widget_overrides.get(field.name()) {
                return custom.render(table, field, display, &attrs).map(Some);
            }
            return FileUpload::render_with_download(
                table,
                field,
                display,
                self.download_url.as_deref(),
                &attrs,
            )
            .map(Some);
        }
        if let Some(custom) = self.widget_overrides.get(field.name()) {
            return custom.render(table, field, display, &attrs).map(Some);
        }
        if let Some(kind) = field.widget {
            return widget_for(kind).render(table, field, display, &attrs).map(Some);
        }
        if matches!(field.field_type.base(), FieldType::Boolean) {
            return widget_for(schemaform_model::WidgetKind::Boolean)
                .render(table, field, display, &attrs)
                .map(Some);
        }
        // Options-bearing fields dispatch before generic list handling.
        if field.has_options() {
            let kind = if field.multiple() {
                schemaform_model::WidgetKind::MultiOptions
            } else {
                schemaform_model::WidgetKind::Options
            };
            return widget_for(kind).render(table, field, display, &attrs).map(Some);
        }
        match field.field_type.default_widget() {
            Some(kind) => widget_for(kind).render(table, field, display, &attrs).map(Some),
            None => Ok(None),
        }
    }
}

/// A form instance: the rendered rows plus all bind-path state.
#[derive(Debug)]
pub struct Form {
    pub(crate) table: Table,
    pub(crate) record: Option<HashMap<String, Value>>,
    pub(crate) field_list: Vec<String>,
    pub(crate) rows: Vec<FormRow>,
    pub(crate) row_index: HashMap<String, usize>,
    pub(crate) vars: HashMap<String, Value>,
    pub(crate) values: HashMap<String, Value>,
    pub(crate) errors: HashMap<String, String>,
    pub(crate) accepted: Option<bool>,
    pub(crate) delete_requested: bool,
    pub(crate) cfg: FormConfig,
}

impl Form {
    /// Returns the schema this form was built over.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Returns the working value set.
    pub fn vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    /// Returns the final typed value mapping produced by the last accept.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Returns the per-field error mapping.
    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Returns one field's error message, if any.
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Returns the result of the last accept, if one ran.
    pub const fn accepted(&self) -> Option<bool> {
        self.accepted
    }

    /// Returns `true` if the last accept honored a delete request.
    pub const fn deletion_requested(&self) -> bool {
        self.delete_requested
    }

    /// Returns the form's identity name (`{table}_{id}` or
    /// `{table}_create`).
    pub fn formname(&self) -> &str {
        &self.cfg.formname
    }

    /// Returns a field's current rendered control node.
    pub fn widget_node(&self, field: &str) -> Option<&Node> {
        self.row_index.get(field).map(|&i| &self.rows[i].control)
    }

    /// Serializes the form to markup.
    pub fn xml(&self) -> String {
        self.render().to_string()
    }

    /// Assembles the markup tree from the current rows, layout style, and
    /// error state.
    pub fn render(&self) -> Node {
        let mut form = Element::new("form")
            .attr("action", "")
            .attr("method", "post");
        if self.cfg.multipart {
            form.set_attr("enctype", "multipart/form-data");
        }

        let body = match &self.cfg.tabs {
            Some(tabs) => self.tabbed_body(tabs),
            None => {
                let all: Vec<&FormRow> = self.rows.iter().collect();
                self.layout(&all)
            }
        };
        for node in body {
            form.push(node);
        }

        form.push(hidden_input("_formname", &self.cfg.formname));
        if let Some(record) = &self.record {
            if let Some(id) = record.get(&self.cfg.record_key) {
                form.push(hidden_input(&self.cfg.record_key, &id.to_string()));
            }
        }
        for (name, value) in &self.cfg.hidden {
            form.push(hidden_input(name, value));
        }
        form.into()
    }

    fn tabbed_body(&self, tabs: &[TabGroup]) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (index, tab) in tabs.iter().enumerate() {
            let members: Vec<&FormRow> = self
                .rows
                .iter()
                .filter(|row| {
                    row.field
                        .as_ref()
                        .is_some_and(|f| tab.members.contains(f))
                })
                .collect();
            let header = Element::new("div")
                .attr("class", "tab-header")
                .attr("id", format!("{}_tab_{}", self.table.name(), tab.name))
                .child(Node::text(tab.caption.clone()));
            let mut body = Element::new("div")
                .attr("class", "tab-body")
                .attr("id", format!("{}_tab_{}_body", self.table.name(), tab.name));
            if index > 0 {
                body.set_attr("style", "display:none");
            }
            for node in self.layout(&members) {
                body.push(node);
            }
            nodes.push(header.into());
            nodes.push(body.into());
        }

        // Rows not claimed by any tab (including submit) follow the tabs.
        let leftover: Vec<&FormRow> = self
            .rows
            .iter()
            .filter(|row| {
                row.field.as_ref().map_or(true, |f| {
                    !tabs.iter().any(|tab| tab.members.contains(f))
                })
            })
            .collect();
        nodes.extend(self.layout(&leftover));
        nodes
    }

    /// The control cell's contents: the control plus an error note when
    /// the last accept left one.
    fn control_cell(&self, row: &FormRow) -> Vec<Node> {
        let mut nodes = vec![row.control.clone()];
        if let Some(name) = &row.field {
            if let Some(message) = self.errors.get(name) {
                nodes.push(
                    Element::new("div")
                        .attr("class", "error")
                        .child(Node::text(message.clone()))
                        .into(),
                );
            }
        }
        nodes
    }

    fn control_node(&self, row: &FormRow) -> Node {
        let mut cell = self.control_cell(row);
        if cell.len() == 1 {
            cell.remove(0)
        } else {
            Element::new("div").children(cell).into()
        }
    }

    fn layout(&self, rows: &[&FormRow]) -> Vec<Node> {
        match &self.cfg.style {
            FormStyle::Table3Cols => {
                let mut table = Element::new("table");
                for row in rows {
                    table.push(
                        Element::new("tr")
                            .attr("id", row.row_id.clone())
                            .child(
                                Element::new("td")
                                    .attr("class", "form-label")
                                    .child(row.label.clone()),
                            )
                            .child(
                                Element::new("td")
                                    .attr("class", "form-widget")
                                    .children(self.control_cell(row)),
                            )
                            .child(
                                Element::new("td")
                                    .attr("class", "form-comment")
                                    .child(row.comment.clone()),
                            ),
                    );
                }
                vec![table.into()]
            }
            FormStyle::Table2Cols => {
                let mut table = Element::new("table");
                for row in rows {
                    table.push(
                        Element::new("tr")
                            .attr("id", format!("{}1", row.row_id))
                            .attr("class", "even")
                            .child(
                                Element::new("td")
                                    .attr("class", "form-label")
                                    .child(row.label.clone()),
                            )
                            .child(
                                Element::new("td")
                                    .attr("class", "form-comment")
                                    .child(row.comment.clone()),
                            ),
                    );
                    table.push(
                        Element::new("tr")
                            .attr("id", format!("{}2", row.row_id))
                            .attr("class", "odd")
                            .child(
                                Element::new("td")
                                    .attr("class", "form-widget")
                                    .attr("colspan", 2_i64)
                                    .children(self.control_cell(row)),
                            ),
                    );
                }
                vec![table.into()]
            }
            FormStyle::Divs => rows
                .iter()
                .map(|row| {
                    Element::new("div")
                        .attr("id", row.row_id.clone())
                        .child(
                            Element::new("div")
                                .attr("class", "form-label")
                                .child(row.label.clone()),
                        )
                        .child(
                            Element::new("div")
                                .attr("class", "form-widget")
                                .children(self.control_cell(row)),
                        )
                        .child(
                            Element::new("div")
                                .attr("class", "form-comment")
                                .child(row.comment.clone()),
                        )
                        .into()
                })
                .collect(),
            FormStyle::UnorderedList => {
                let mut list = Element::new("ul");
                for row in rows {
                    list.push(
                        Element::new("li")
                            .attr("id", row.row_id.clone())
                            .child(
                                Element::new("div")
                                    .attr("class", "form-label")
                                    .child(row.label.clone()),
                            )
                            .child(
                                Element::new("div")
                                    .attr("class", "form-widget")
                                    .children(self.control_cell(row)),
                            )
                            .child(
                                Element::new("div")
                                    .attr("class", "form-comment")
                                    .child(row.comment.clone()),
                            ),
                    );
                }
                vec![list.into()]
            }
            FormStyle::Custom(callback) => {
                let mut table = Element::new("table");
                for row in rows {
                    let nodes = callback.rows(
                        &row.row_id,
                        row.label.clone(),
                        self.control_node(row),
                        row.comment.clone(),
                    );
                    for node in nodes {
                        table.push(node);
                    }
                }
                vec![table.into()]
            }
        }
    }
}

fn hidden_input(name: &str, value: &str) -> Element {
    Element::new("input")
        .attr("type", "hidden")
        .attr("name", name)
        .attr("value", value)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use schemaform_model::validators::IsInSet;
    use schemaform_model::{Field, FieldType, Table, WidgetKind};

    use super::*;

    fn person_table() -> Table {
        Table::define(
            "person",
            vec![
                Field::new("name", FieldType::Str)
                    .unwrap()
                    .default("hello")
                    .into(),
                Field::new("age", FieldType::Integer)
                    .unwrap()
                    .default(20)
                    .into(),
                Field::new("mysex", FieldType::Boolean)
                    .unwrap()
                    .default(false)
                    .comment("select your sex")
                    .into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_build_renders_all_fields() {
        let form = FormBuilder::new(person_table()).build().unwrap();
        let html = form.xml();
        assert!(html.starts_with("<form"));
        assert!(html.contains(r#"id="person_name""#));
        assert!(html.contains(r#"value="hello""#));
        assert!(html.contains(r#"id="person_age""#));
        assert!(html.contains(r#"value="20""#));
        assert!(html.contains(r#"type="checkbox""#));
        assert!(html.contains(r#"type="submit""#));
        assert!(html.contains("select your sex"));
    }

    #[test]
    fn test_row_ids_present() {
        let form = FormBuilder::new(person_table()).build().unwrap();
        let html = form.xml();
        assert!(html.contains(r#"id="person_name__row""#));
        assert!(html.contains(r#"id="person_age__row""#));
        assert!(html.contains(r#"id="submit_record__row""#));
    }

    #[test]
    fn test_labels_and_colon() {
        let form = FormBuilder::new(person_table())
            .label("name", "Your name")
            .build()
            .unwrap();
        let html = form.xml();
        // Override: no colon. Default: colon plus title-cased name.
        assert!(html.contains(">Your name</label>"));
        assert!(html.contains(">Age: </label>"));
        assert!(html.contains(r#"for="person_name""#));
        assert!(html.contains(r#"id="person_name__label""#));
    }

    #[test]
    fn test_record_values_take_precedence() {
        let mut record = HashMap::new();
        record.insert("name".to_string(), Value::from("huaiyu"));
        record.insert("_id".to_string(), Value::from(98234_i64));
        let form = FormBuilder::new(person_table())
            .record(record)
            .build()
            .unwrap();
        let html = form.xml();
        assert!(html.contains(r#"value="huaiyu""#));
        // Field default still fills fields missing from the record.
        assert!(html.contains(r#"value="20""#));
        // The record key is carried as a hidden input.
        assert!(html.contains(r#"name="_id" type="hidden" value="98234""#));
    }

    #[test]
    fn test_formname() {
        let form = FormBuilder::new(person_table()).build().unwrap();
        assert_eq!(form.formname(), "person_create");

        let mut record = HashMap::new();
        record.insert("_id".to_string(), Value::from(7_i64));
        let form = FormBuilder::new(person_table())
            .record(record)
            .build()
            .unwrap();
        assert_eq!(form.formname(), "person_7");
        assert!(form.xml().contains(r#"value="person_7""#));
    }

    #[test]
    fn test_field_subset_and_dotted_skip() {
        let form = FormBuilder::new(person_table())
            .fields(vec![
                "age".to_string(),
                "other.related".to_string(),
                "missing".to_string(),
            ])
            .build()
            .unwrap();
        let html = form.xml();
        assert!(html.contains(r#"id="person_age""#));
        assert!(!html.contains("person_name__row"));
        assert!(!html.contains("related"));
    }

    #[test]
    fn test_readonly_formats_instead_of_inputs() {
        let mut record = HashMap::new();
        record.insert("name".to_string(), Value::from("huaiyu"));
        let form = FormBuilder::new(person_table())
            .record(record)
            .readonly(true)
            .build()
            .unwrap();
        let html = form.xml();
        assert!(!html.contains(r#"type="text""#));
        assert!(!html.contains(r#"type="submit""#));
        assert!(html.contains("huaiyu"));
        // Read-only booleans render as disabled checkboxes.
        assert!(html.contains("disabled"));
    }

    #[test]
    fn test_protected_field_uses_represent() {
        let table = Table::define(
            "t",
            vec![Field::new("state", FieldType::Str)
                .unwrap()
                .writable(false)
                .default("on")
                .represent(|v| format!("<b>{v}</b>"))
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(html.contains("<b>on</b>"));
    }

    #[test]
    fn test_blob_never_rendered() {
        let table = Table::define(
            "t",
            vec![
                Field::new("payload", FieldType::Blob).unwrap().into(),
                Field::new("name", FieldType::Str).unwrap().into(),
            ],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(!html.contains("payload"));
        assert!(html.contains("t_name"));
    }

    #[test]
    fn test_unreadable_field_skipped_when_readonly() {
        let table = Table::define(
            "t",
            vec![Field::new("secret", FieldType::Str)
                .unwrap()
                .readable(false)
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table)
            .readonly(true)
            .build()
            .unwrap()
            .xml();
        assert!(!html.contains("secret"));

        // ignore_rw overrides the policy.
        let table = Table::define(
            "t",
            vec![Field::new("secret", FieldType::Str)
                .unwrap()
                .readable(false)
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table)
            .readonly(true)
            .ignore_rw(true)
            .build()
            .unwrap()
            .xml();
        assert!(html.contains("secret"));
    }

    #[test]
    fn test_options_field_renders_select() {
        let table = Table::define(
            "t",
            vec![Field::new("friends", FieldType::StrList)
                .unwrap()
                .validator(Arc::new(
                    IsInSet::new(vec![("huaiyu", "wang huaiyu"), ("jim", "jim green")])
                        .multiple(true),
                ))
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(html.contains("<select"));
        assert!(html.contains("multiple"));
        assert!(html.contains("wang huaiyu"));
    }

    #[test]
    fn test_plain_list_field_renders_grow_input() {
        let table = Table::define(
            "t",
            vec![Field::new("friends", FieldType::StrList)
                .unwrap()
                .default(vec!["a", "b"])
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(html.contains("grow_input"));
        assert_eq!(html.matches("<li>").count(), 3);
    }

    #[test]
    fn test_widget_hint_overrides_default() {
        let table = Table::define(
            "t",
            vec![Field::new("color", FieldType::Str)
                .unwrap()
                .validator(Arc::new(IsInSet::new(vec![("r", "Red"), ("g", "Green")])))
                .widget(WidgetKind::Radio)
                .into()],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(html.contains(r#"type="radio""#));
        assert!(!html.contains("<select"));
    }

    #[test]
    fn test_options_without_source_is_structural_error() {
        let table = Table::define(
            "t",
            vec![Field::new("color", FieldType::Str)
                .unwrap()
                .no_validation()
                .widget(WidgetKind::Options)
                .into()],
        )
        .unwrap();
        let err = FormBuilder::new(table).build().unwrap_err();
        assert!(matches!(err, FormError::UnresolvedOptions(name) if name == "color"));
    }

    #[test]
    fn test_style_selection() {
        let t = || person_table();
        let divs = FormBuilder::new(t())
            .style_named("divs")
            .unwrap()
            .build()
            .unwrap()
            .xml();
        assert!(!divs.contains("<table"));
        assert!(divs.contains(r#"<div class="form-label">"#));

        let two = FormBuilder::new(t())
            .style_named("table2cols")
            .unwrap()
            .build()
            .unwrap()
            .xml();
        assert!(two.contains(r#"id="person_name__row1""#));
        assert!(two.contains(r#"id="person_name__row2""#));
        assert!(two.contains(r#"colspan="2""#));

        let ul = FormBuilder::new(t())
            .style_named("ul")
            .unwrap()
            .build()
            .unwrap()
            .xml();
        assert!(ul.contains("<ul>"));
        assert!(ul.contains(r#"<li id="person_name__row">"#));
    }

    #[test]
    fn test_unknown_style_is_error() {
        let err = FormBuilder::new(person_table())
            .style_named("grid")
            .unwrap_err();
        assert!(matches!(err, FormError::UnknownFormStyle(s) if s == "grid"));
    }

    #[test]
    fn test_custom_style_callback() {
        struct OneCell;
        impl RowLayout for OneCell {
            fn rows(&self, row_id: &str, label: Node, control: Node, _comment: Node) -> Vec<Node> {
                vec![Element::new("tr")
                    .attr("id", row_id)
                    .child(Element::new("td").child(label).child(control))
                    .into()]
            }
        }
        let html = FormBuilder::new(person_table())
            .style(FormStyle::Custom(Arc::new(OneCell)))
            .build()
            .unwrap()
            .xml();
        assert!(html.contains(r#"<tr id="person_name__row">"#));
        assert!(!html.contains("form-comment"));
    }

    #[test]
    fn test_tab_grouping() {
        let form = FormBuilder::new(person_table())
            .tabs(vec![
                TabGroup::new("main", "Main", vec!["name".to_string()]),
                TabGroup::new("extra", "Extra", vec!["age".to_string(), "mysex".to_string()]),
            ])
            .build()
            .unwrap();
        let html = form.xml();
        assert!(html.contains(r#"id="person_tab_main""#));
        assert!(html.contains(">Main</div>"));
        assert!(html.contains(r#"id="person_tab_extra_body" style="display:none""#));
        // The first tab body is visible.
        let first_body = html.find(r#"id="person_tab_main_body""#).unwrap();
        let visible_slice = &html[first_body..first_body + 60];
        assert!(!visible_slice.contains("display:none"));
        // Submit lands after the tabs.
        assert!(html.contains("submit_record__row"));
    }

    #[test]
    fn test_delete_row_rendered_when_editing_and_deletable() {
        let mut record = HashMap::new();
        record.insert("_id".to_string(), Value::from(1_i64));
        let form = FormBuilder::new(person_table())
            .record(record)
            .deletable(true)
            .build()
            .unwrap();
        let html = form.xml();
        assert!(html.contains(r#"name="delete_this_record""#));
        assert!(html.contains("Check to delete:"));

        // Not on create forms.
        let form = FormBuilder::new(person_table()).deletable(true).build().unwrap();
        assert!(!form.xml().contains("delete_this_record"));
    }

    #[test]
    fn test_hidden_pairs() {
        let form = FormBuilder::new(person_table())
            .hidden("xslf", "sfsdfsfwwr23ds")
            .build()
            .unwrap();
        let html = form.xml();
        assert!(html.contains(r#"name="xslf" type="hidden" value="sfsdfsfwwr23ds""#));
        assert!(html.contains(r#"name="_formname""#));
    }

    #[test]
    fn test_multipart_only_with_uploads() {
        let html = FormBuilder::new(person_table()).build().unwrap().xml();
        assert!(!html.contains("multipart"));

        let table = Table::define(
            "t",
            vec![Field::new("profile", FieldType::Upload).unwrap().into()],
        )
        .unwrap();
        let html = FormBuilder::new(table).build().unwrap().xml();
        assert!(html.contains(r#"enctype="multipart/form-data""#));
    }

    #[test]
    fn test_update_value_used_only_when_editing() {
        let table = || {
            Table::define(
                "t",
                vec![Field::new("state", FieldType::Str)
                    .unwrap()
                    .default("fresh")
                    .update("touched")
                    .into()],
            )
            .unwrap()
        };
        let create = FormBuilder::new(table()).build().unwrap().xml();
        assert!(create.contains(r#"value="fresh""#));

        let edit = FormBuilder::new(table())
            .record(HashMap::new())
            .build()
            .unwrap()
            .xml();
        assert!(edit.contains(r#"value="touched""#));
    }

    #[test]
    fn test_show_comments_off() {
        let html = FormBuilder::new(person_table())
            .show_comments(false)
            .build()
            .unwrap()
            .xml();
        assert!(!html.contains("select your sex"));
    }

    #[test]
    fn test_widget_node_lookup() {
        let form = FormBuilder::new(person_table()).build().unwrap();
        let node = form.widget_node("name").unwrap();
        assert!(node.to_string().contains(r#"id="person_name""#));
        assert!(form.widget_node("nope").is_none());
    }
}
