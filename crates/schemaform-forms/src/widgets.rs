//! Widget strategies and the static widget registry.
//!
//! A [`Widget`] renders one typed input control given the field
//! descriptor, the current value, and extra attributes. The registry
//! ([`widget_for`]) is a closed mapping from [`WidgetKind`] to a static
//! strategy instance, resolved by matching rather than by mutable lookup
//! tables.
//!
//! Rendering is fallible for one reason only: a choice widget asked to
//! render a field whose validators expose no option set fails with
//! [`FormError::UnresolvedOptions`] instead of producing an empty control.

use std::collections::BTreeMap;
use std::fmt;

use schemaform_core::error::{FormError, FormResult};
use schemaform_html::{AttrValue, Element, Node};
use schemaform_model::{Field, FieldType, Value, WidgetKind};

/// Placeholder shown instead of a stored password; unrelated to the
/// password's actual length. Posting it back means "unchanged".
pub const PASSWORD_DISPLAY: &str = "********";

/// Suffix of the checkbox requesting deletion of a stored upload.
pub const UPLOAD_DELETE_SUFFIX: &str = "__delete";

/// Filename extensions rendered with an inline preview.
pub const IMAGE_EXTENSIONS: &[&str] = &["gif", "png", "jpg", "jpeg", "bmp"];

const IMAGE_PREVIEW_WIDTH: &str = "150px";

/// Extra attributes passed into a widget render call.
pub type AttrMap = BTreeMap<String, AttrValue>;

/// A rendering strategy for one kind of input control.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Renders the control for `field` holding `value`.
    ///
    /// The produced element carries `id="{table}_{name}"`, a CSS class
    /// derived from the field type, and `name="{name}"`; entries in
    /// `attrs` override those defaults.
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node>;
}

/// Returns the strategy for a widget kind.
pub fn widget_for(kind: WidgetKind) -> &'static dyn Widget {
    match kind {
        WidgetKind::Str
        | WidgetKind::Integer
        | WidgetKind::Double
        | WidgetKind::Decimal
        | WidgetKind::Date
        | WidgetKind::Time
        | WidgetKind::Datetime => &StringInput,
        WidgetKind::Text => &TextArea,
        WidgetKind::Password => &PasswordInput,
        WidgetKind::Hidden => &HiddenInput,
        WidgetKind::Boolean => &CheckboxInput,
        WidgetKind::Upload => &FileUpload,
        WidgetKind::Options => &SelectOptions,
        WidgetKind::MultiOptions => &SelectMultiple,
        WidgetKind::Radio => &RadioGrid,
        WidgetKind::Checkboxes => &CheckboxGrid,
        WidgetKind::List => &GrowableList,
    }
}

/// Control id: `{table}_{field}`.
pub fn control_id(table: &str, field: &Field) -> String {
    format!("{table}_{}", field.name())
}

fn base_attrs(table: &str, field: &Field, extra: &AttrMap) -> AttrMap {
    let mut attrs = AttrMap::new();
    attrs.insert(
        "id".to_string(),
        AttrValue::Text(control_id(table, field)),
    );
    attrs.insert(
        "class".to_string(),
        AttrValue::Text(field.field_type.css_class().to_string()),
    );
    attrs.insert(
        "name".to_string(),
        AttrValue::Text(field.name().to_string()),
    );
    for (k, v) in extra {
        attrs.insert(k.clone(), v.clone());
    }
    attrs
}

fn apply_attrs(mut el: Element, attrs: &AttrMap) -> Element {
    for (k, v) in attrs {
        el.set_attr(k.clone(), v.clone());
    }
    el
}

fn resolved_options(field: &Field) -> FormResult<Vec<(String, String)>> {
    field
        .options()
        .ok_or_else(|| FormError::UnresolvedOptions(field.name().to_string()))
}

/// The display strings currently selected: a list fans out, a scalar
/// wraps into a singleton, `Null` selects nothing.
fn selected_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.iter().map(ToString::to_string).collect(),
        other => vec![other.to_string()],
    }
}

// ---------------------------------------------------------------------------
// Scalar inputs
// ---------------------------------------------------------------------------

/// `<input type="text">`, shared by every scalar text-like kind.
#[derive(Debug, Clone)]
pub struct StringInput;

impl Widget for StringInput {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let el = Element::new("input")
            .attr("type", "text")
            .attr("value", value.to_string());
        Ok(apply_attrs(el, &base_attrs(table, field, attrs)).into())
    }
}

/// `<input type="hidden">`.
#[derive(Debug, Clone)]
pub struct HiddenInput;

impl Widget for HiddenInput {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let el = Element::new("input")
            .attr("type", "hidden")
            .attr("value", value.to_string());
        Ok(apply_attrs(el, &base_attrs(table, field, attrs)).into())
    }
}

/// `<textarea>`.
#[derive(Debug, Clone)]
pub struct TextArea;

impl Widget for TextArea {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let el = Element::new("textarea").child(Node::text(value.to_string()));
        Ok(apply_attrs(el, &base_attrs(table, field, attrs)).into())
    }
}

/// `<input type="password">`.
///
/// Never echoes the stored value: a present value renders as the fixed
/// [`PASSWORD_DISPLAY`] placeholder.
#[derive(Debug, Clone)]
pub struct PasswordInput;

impl Widget for PasswordInput {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let masked = if value.is_truthy() { PASSWORD_DISPLAY } else { "" };
        let el = Element::new("input")
            .attr("type", "password")
            .attr("value", masked);
        Ok(apply_attrs(el, &base_attrs(table, field, attrs)).into())
    }
}

/// `<input type="checkbox">`; a truthy value renders checked.
#[derive(Debug, Clone)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let el = Element::new("input")
            .attr("type", "checkbox")
            .attr("value", "on")
            .attr("checked", value.is_truthy());
        Ok(apply_attrs(el, &base_attrs(table, field, attrs)).into())
    }
}

// ---------------------------------------------------------------------------
// Choice widgets
// ---------------------------------------------------------------------------

/// `<select>` populated from the field's option enumeration.
#[derive(Debug, Clone)]
pub struct SelectOptions;

impl Widget for SelectOptions {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let current = value.to_string();
        let mut select = Element::new("select");
        for (key, display) in resolved_options(field)? {
            let opt = Element::new("option")
                .attr("selected", key == current)
                .attr("value", key)
                .child(Node::text(display));
            select.push(opt);
        }
        Ok(apply_attrs(select, &base_attrs(table, field, attrs)).into())
    }
}

/// `<select multiple>` with a visible row count (default 5).
#[derive(Debug, Clone)]
pub struct SelectMultiple;

impl Widget for SelectMultiple {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let selected = selected_keys(value);
        let mut select = Element::new("select")
            .attr("multiple", true)
            .attr("size", 5_i64);
        for (key, display) in resolved_options(field)? {
            let opt = Element::new("option")
                .attr("selected", selected.contains(&key))
                .attr("value", key)
                .child(Node::text(display));
            select.push(opt);
        }
        Ok(apply_attrs(select, &base_attrs(table, field, attrs)).into())
    }
}

/// Reads a column count from the extra attributes (default 1) and strips
/// the pseudo-attribute so it never reaches the markup.
fn take_cols(attrs: &AttrMap) -> (usize, AttrMap) {
    let mut rest = attrs.clone();
    let cols = match rest.remove("cols") {
        Some(AttrValue::Number(n)) if n > 0 => n as usize,
        _ => 1,
    };
    (cols, rest)
}

fn grid(
    table: &str,
    field: &Field,
    options: Vec<(String, String)>,
    cols: usize,
    attrs: &AttrMap,
    mut cell: impl FnMut(&str, &str) -> Element,
) -> Node {
    let mut grid = Element::new("table");
    for chunk in options.chunks(cols) {
        let mut row = Element::new("tr");
        for (key, display) in chunk {
            row.push(
                Element::new("td")
                    .child(cell(key, display))
                    .child(Node::text(display.clone())),
            );
        }
        grid.push(row);
    }
    let mut merged = AttrMap::new();
    merged.insert(
        "id".to_string(),
        AttrValue::Text(control_id(table, field)),
    );
    merged.insert(
        "class".to_string(),
        AttrValue::Text(field.field_type.css_class().to_string()),
    );
    for (k, v) in attrs {
        merged.insert(k.clone(), v.clone());
    }
    apply_attrs(grid, &merged).into()
}

/// A grid of `<input type="radio">` controls, one per option.
#[derive(Debug, Clone)]
pub struct RadioGrid;

impl Widget for RadioGrid {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let (cols, rest) = take_cols(attrs);
        let current = value.to_string();
        let options: Vec<_> = resolved_options(field)?
            .into_iter()
            .filter(|(_, display)| !display.is_empty())
            .collect();
        let name = field.name().to_string();
        Ok(grid(table, field, options, cols, &rest, |key, _| {
            Element::new("input")
                .attr("type", "radio")
                .attr("name", name.clone())
                .attr("value", key)
                .attr("checked", key == current)
        }))
    }
}

/// A grid of `<input type="checkbox">` controls, one per option; an
/// option renders checked when it appears in the (singleton-wrapped)
/// current value collection.
#[derive(Debug, Clone)]
pub struct CheckboxGrid;

impl Widget for CheckboxGrid {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let (cols, rest) = take_cols(attrs);
        let selected = selected_keys(value);
        let options: Vec<_> = resolved_options(field)?
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .collect();
        let name = field.name().to_string();
        Ok(grid(table, field, options, cols, &rest, |key, _| {
            Element::new("input")
                .attr("type", "checkbox")
                .attr("name", name.clone())
                .attr("value", key)
                .attr("checked", selected.contains(&key.to_string()))
        }))
    }
}

// ---------------------------------------------------------------------------
// List widget
// ---------------------------------------------------------------------------

/// A dynamically growable list of single-value inputs: one per existing
/// element plus a trailing empty slot, with attached client-side behavior
/// for adding and removing rows (inert content from this layer's view).
#[derive(Debug, Clone)]
pub struct GrowableList;

impl Widget for GrowableList {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let id = control_id(table, field);
        let class = if matches!(field.field_type.base(), FieldType::IntList) {
            "integer"
        } else {
            "string"
        };

        let mut items = selected_keys(value);
        items.push(String::new());

        let mut list = Element::new("ul").attr("id", format!("{id}_grow_input"));
        for item in items {
            let input = Element::new("input")
                .attr("id", id.clone())
                .attr("class", class)
                .attr("name", field.name())
                .attr("value", item);
            list.push(Element::new("li").child(input));
        }
        let list = apply_attrs(list, attrs);

        let script = Element::new("script").child(Node::raw(grow_input_script(&id)));
        Ok(Element::new("div").child(list).child(script).into())
    }
}

fn grow_input_script(id: &str) -> String {
    format!(
        "(function(){{jQuery.fn.grow_input=function(){{return this.each(function(){{\
var ul=this;jQuery(ul).find(\":text\").after('<a href=\"javascript:void(0)\">+</a>')\
.keypress(function(e){{return (e.which==13)?pe(ul):true;}}).next().click(function(){{pe(ul)}});}});}};\
function pe(ul){{var nl=ml(ul);rel(ul);nl.appendTo(ul);nl.find(\":text\").focus();return false;}}\
function ml(ul){{var line=jQuery(ul).find(\"li:first\").clone(true);line.find(':text').val('');return line;}}\
function rel(ul){{jQuery(ul).find(\"li\").each(function(){{\
var t=jQuery.trim(jQuery(this.firstChild).val());\
if(t=='')jQuery(this).remove();else jQuery(this.firstChild).val(t);}});}}}})();\
jQuery(document).ready(function(){{jQuery('#{id}_grow_input').grow_input();}});"
    )
}

// ---------------------------------------------------------------------------
// Upload widget
// ---------------------------------------------------------------------------

/// `<input type="file">` plus, for an already-stored reference with a
/// download collaborator, a link, an optional inline image preview, and
/// (when the field's validators do not demand a value) a delete checkbox.
#[derive(Debug, Clone)]
pub struct FileUpload;

impl FileUpload {
    /// Renders the upload control, wiring in the download URL when the
    /// caller has one.
    pub fn render_with_download(
        table: &str,
        field: &Field,
        value: &Value,
        download_url: Option<&str>,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        let input: Element = apply_attrs(
            Element::new("input").attr("type", "file"),
            &base_attrs(table, field, attrs),
        );

        let current = value.to_string();
        let (Some(download), false) = (download_url, current.is_empty()) else {
            return Ok(input.into());
        };

        let url = format!("{download}{current}");
        let mut wrapper = Element::new("div")
            .child(input)
            .child(Node::text("["))
            .child(
                Element::new("a")
                    .attr("href", url.clone())
                    .child(Node::text("file")),
            );
        if field.allows_empty() {
            wrapper.push(Node::text("|"));
            wrapper.push(
                Element::new("input")
                    .attr("type", "checkbox")
                    .attr("name", format!("{}{UPLOAD_DELETE_SUFFIX}", field.name())),
            );
            wrapper.push(Node::text("delete"));
        }
        wrapper.push(Node::text("]"));
        if Self::is_image(&current) {
            wrapper.push(Element::new("br"));
            wrapper.push(
                Element::new("img")
                    .attr("src", url)
                    .attr("width", IMAGE_PREVIEW_WIDTH),
            );
        }
        Ok(wrapper.into())
    }

    /// Read-only rendering: an image preview or a download link when a
    /// download collaborator is present, plain text otherwise.
    pub fn represent(value: &Value, download_url: Option<&str>) -> Node {
        let current = value.to_string();
        let (Some(download), false) = (download_url, current.is_empty()) else {
            return Node::text("file");
        };
        let url = format!("{download}{current}");
        let link = Element::new("a").attr("href", url.clone());
        if Self::is_image(&current) {
            link.child(
                Element::new("img")
                    .attr("src", url)
                    .attr("width", IMAGE_PREVIEW_WIDTH),
            )
            .into()
        } else {
            link.child(Node::text("file")).into()
        }
    }

    /// Checks a stored reference's extension against the recognized
    /// image list.
    pub fn is_image(value: &str) -> bool {
        value
            .rsplit('.')
            .next()
            .map(str::to_lowercase)
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl Widget for FileUpload {
    fn render(
        &self,
        table: &str,
        field: &Field,
        value: &Value,
        attrs: &AttrMap,
    ) -> FormResult<Node> {
        Self::render_with_download(table, field, value, None, attrs)
    }
}
