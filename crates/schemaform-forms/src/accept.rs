//! The form acceptor: validating and coercing posted values.
//!
//! [`Form::accept`] drives one submission through a fixed sequence:
//! normalization, identity resolution, the base structural pass (a
//! [`BaseAccept`] collaborator), upload-error suppression, the delete
//! sub-flow, per-field type coercion, carry-over of pre-populated working
//! values, and re-render-on-error. Validation failures produce `Ok(false)`
//! with the per-field error map populated; only structural problems
//! (missing storage target, failing custom widget) return `Err`.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use schemaform_core::error::FormResult;
use schemaform_core::logging;
use schemaform_http::FormData;
use schemaform_model::{FieldType, Table, Value, WidgetKind};
use schemaform_storage::StorageSlot;

use crate::form::Form;
use crate::widgets::{widget_for, AttrMap, PASSWORD_DISPLAY, UPLOAD_DELETE_SUFFIX};

/// Name of the posted variable requesting record deletion.
pub const FIELDNAME_REQUEST_DELETE: &str = "delete_this_record";

/// Name of the hidden variable carrying the form identity.
pub const FORMNAME_KEY: &str = "_formname";

/// Read-only context handed to the base structural pass.
pub struct AcceptContext<'a> {
    /// The schema under acceptance.
    pub table: &'a Table,
    /// The form's field subset, in order.
    pub fields: &'a [String],
    /// The raw submission.
    pub posted: &'a FormData,
    /// The normalized submission: sequences collapsed to their last
    /// element except for list-typed fields.
    pub raw: &'a HashMap<String, Value>,
    /// The expected form identity name.
    pub formname: &'a str,
    /// Whether per-field read/write flags are ignored.
    pub ignore_rw: bool,
}

/// The base structural-validation collaborator.
///
/// Implementations populate the working value map and the per-field error
/// map and report overall success. The default, [`ValidatingAccept`], runs
/// each posted field through its validator chain and checks the posted
/// form identity; callers with CSRF tokens or other hidden-field
/// bookkeeping plug in their own.
pub trait BaseAccept: Send + Sync + fmt::Debug {
    /// Runs the base pass over one normalized submission.
    fn accepts(
        &self,
        ctx: &AcceptContext<'_>,
        vars: &mut HashMap<String, Value>,
        errors: &mut HashMap<String, String>,
    ) -> bool;
}

/// The default base pass: per-field validator chains plus a form-identity
/// check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatingAccept;

impl BaseAccept for ValidatingAccept {
    fn accepts(
        &self,
        ctx: &AcceptContext<'_>,
        vars: &mut HashMap<String, Value>,
        errors: &mut HashMap<String, String>,
    ) -> bool {
        if let Some(posted_name) = ctx.posted.get(FORMNAME_KEY) {
            if posted_name != ctx.formname {
                errors.insert(FORMNAME_KEY.to_string(), "unexpected form name".to_string());
            }
        }

        // Every posted variable enters the working set; schema fields are
        // then validated in place.
        for (key, value) in ctx.raw {
            vars.insert(key.clone(), value.clone());
        }

        for name in ctx.fields {
            let Some(field) = ctx.table.field(name) else {
                continue;
            };
            if !ctx.ignore_rw && !field.writable {
                continue;
            }
            let raw = if matches!(field.field_type.base(), FieldType::Upload) {
                match ctx.posted.files.get(name) {
                    Some(file) if !file.name.is_empty() => Some(Value::from(file.name.clone())),
                    _ => ctx.raw.get(name).cloned(),
                }
            } else {
                ctx.raw.get(name).cloned()
            };
            let Some(raw) = raw else {
                continue;
            };
            match field.validate(raw) {
                Ok(value) => {
                    vars.insert(name.clone(), value);
                }
                Err(error) => {
                    errors.insert(name.clone(), error.to_string());
                }
            }
        }
        errors.is_empty()
    }
}

impl Form {
    /// Accepts one posted submission.
    ///
    /// Returns `Ok(true)` when every field validated (or a delete request
    /// was honored), `Ok(false)` when validation failed, and `Err` only on
    /// structural problems. After a failure, widget-bearing fields present
    /// in the submission have been re-rendered with the user's latest
    /// input, and [`errors`](Form::errors) is populated; after success,
    /// [`values`](Form::values) holds the final typed mapping.
    pub fn accept(&mut self, posted: &FormData) -> FormResult<bool> {
        let span = logging::accept_span(self.table.name());
        let _guard = span.enter();

        self.errors.clear();
        self.delete_requested = false;

        // Step 1: normalize. A posted sequence collapses to its last
        // element unless the field is list-typed.
        let mut raw: HashMap<String, Value> = HashMap::new();
        for (key, list) in posted.vars.iter() {
            let is_list = self
                .table
                .field(key)
                .is_some_and(|f| f.field_type.is_list());
            let value = if is_list {
                Value::List(list.iter().cloned().map(Value::Str).collect())
            } else {
                list.last().cloned().map_or(Value::Null, Value::Str)
            };
            raw.insert(key.clone(), value);
        }

        // Step 2: identity resolution.
        let record_id = self
            .record
            .as_ref()
            .and_then(|r| r.get(&self.cfg.record_key))
            .cloned();

        // The final mapping is seeded from pre-populated working values
        // before the base pass touches them. Only schema fields qualify.
        let mut values: HashMap<String, Value> = self
            .vars
            .iter()
            .filter(|(name, _)| self.table.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        // Step 3: the base structural pass.
        let ctx = AcceptContext {
            table: &self.table,
            fields: &self.field_list,
            posted,
            raw: &raw,
            formname: &self.cfg.formname,
            ignore_rw: self.cfg.ignore_rw,
        };
        let base_accept = self.cfg.base_accept.clone();
        let mut ret = base_accept.accepts(&ctx, &mut self.vars, &mut self.errors);

        // Step 4: upload-error suppression. A mandatory-file validator
        // must not block unrelated edits to a record that already has a
        // file, so errors on upload fields with no new file, no deletion
        // request, and an existing stored value are dropped.
        if !ret {
            if let Some(record) = &self.record {
                let keys: Vec<String> = self.errors.keys().cloned().collect();
                for key in keys {
                    let Some(field) = self.table.field(&key) else {
                        continue;
                    };
                    if !matches!(field.field_type.base(), FieldType::Upload) {
                        continue;
                    }
                    let new_file = posted
                        .files
                        .get(&key)
                        .is_some_and(|f| !f.name.is_empty());
                    let posted_empty = raw.get(&key).map_or(true, Value::is_empty_input);
                    let existing = record.get(&key).is_some_and(Value::is_truthy);
                    let delete_key = format!("{key}{UPLOAD_DELETE_SUFFIX}");
                    if !new_file && posted_empty && existing && !posted.contains_key(&delete_key)
                    {
                        debug!(field = %key, "suppressed upload error for stored file");
                        self.errors.remove(&key);
                    }
                }
                if self.errors.is_empty() {
                    ret = true;
                }
            }
        }

        // Step 5: the delete sub-flow.
        let requested_delete = raw
            .get(FIELDNAME_REQUEST_DELETE)
            .is_some_and(Value::is_truthy);
        let delete_despite_errors = match self.cfg.delete_policy {
            crate::form::DeletePolicy::IgnoreErrors => {
                record_id.is_some() && !self.errors.is_empty() && requested_delete
            }
            crate::form::DeletePolicy::RequireValid => false,
        };

        if !ret && !delete_despite_errors {
            self.redisplay(posted)?;
            debug!(errors = self.errors.len(), "form rejected");
            self.accepted = Some(false);
            return Ok(false);
        }

        if requested_delete && self.cfg.deletable {
            self.errors.clear();
            for row in &mut self.rows {
                row.control.visit_elements_mut(&mut |el| {
                    if matches!(el.tag(), "input" | "select" | "textarea") {
                        el.set_attr("disabled", true);
                    }
                });
            }
            self.delete_requested = true;
            self.accepted = Some(true);
            debug!("delete request honored");
            return Ok(true);
        }

        // Step 6: per-field type coercion, in declaration order. Aborts
        // at the first field with no posted value and no default.
        let field_list = self.field_list.clone();
        for name in &field_list {
            let Some(field) = self.table.field(name) else {
                continue;
            };

            if !self.cfg.ignore_rw && !field.writable {
                // An absent checkbox on a non-writable boolean cannot be
                // told apart from "not submitted"; drop it from the
                // working set instead of keeping an erroneous Null.
                if matches!(field.field_type.base(), FieldType::Boolean)
                    && self.vars.get(name).map_or(true, Value::is_null)
                {
                    self.vars.remove(name);
                }
                continue;
            }

            match field.field_type.base() {
                FieldType::Id => continue,
                FieldType::Boolean => {
                    let flag = self.vars.get(name).is_some_and(Value::is_truthy);
                    self.vars.insert(name.clone(), Value::Bool(flag));
                    values.insert(name.clone(), Value::Bool(flag));
                    continue;
                }
                FieldType::Password
                    if self.record.is_some() && posted.get(name) == Some(PASSWORD_DISPLAY) =>
                {
                    // The masked placeholder round-tripped: unchanged.
                    continue;
                }
                FieldType::Upload => {
                    let delete_key = format!("{name}{UPLOAD_DELETE_SUFFIX}");
                    if raw.get(&delete_key).is_some_and(Value::is_truthy) {
                        self.vars.insert(name.clone(), Value::Str(String::new()));
                        values.insert(name.clone(), Value::Str(String::new()));
                        self.vars.remove(&delete_key);
                        continue;
                    }
                    if let Some(handler) = &self.cfg.upload_handler {
                        let stored = handler(field, posted)?;
                        self.vars.insert(name.clone(), stored.clone());
                        values.insert(name.clone(), stored);
                    } else if let Some(file) = posted.files.get(name) {
                        if file.name.is_empty() {
                            continue;
                        }
                        let hint_key = format!("{name}.original");
                        let hint = posted.get(&hint_key);
                        let slot = StorageSlot::new(self.table.name(), name);
                        let token =
                            field.store(file, hint, self.cfg.file_store.as_deref(), &slot)?;
                        self.vars.insert(name.clone(), Value::Str(token.clone()));
                        values.insert(name.clone(), Value::Str(token));
                    }
                    continue;
                }
                _ => {
                    if let Some(value) = self.vars.get(name) {
                        values.insert(name.clone(), value.clone());
                    } else if field.default.is_none()
                        && field.update.is_none()
                        && !matches!(field.field_type.base(), FieldType::Blob)
                    {
                        self.errors.insert(name.clone(), "no data".to_string());
                        debug!(field = %name, "missing required data, aborting");
                        self.accepted = Some(false);
                        return Ok(false);
                    }
                }
            }

            let current = values.get(name).cloned();
            match field.field_type.base() {
                FieldType::StrList => {
                    if let Some(value) = current {
                        if !matches!(value, Value::List(_)) {
                            let wrapped = if value.is_truthy() {
                                Value::List(vec![value])
                            } else {
                                Value::List(Vec::new())
                            };
                            values.insert(name.clone(), wrapped);
                        }
                    }
                }
                FieldType::IntList => {
                    if let Some(value) = current {
                        let items = match value {
                            Value::List(items) => items,
                            other if other.is_truthy() => vec![other],
                            _ => Vec::new(),
                        };
                        let coerced =
                            items.iter().map(|i| Value::Int(safe_int(i))).collect();
                        values.insert(name.clone(), Value::List(coerced));
                    }
                }
                FieldType::Integer => {
                    if let Some(value) = current {
                        if !value.is_null() {
                            values.insert(name.clone(), Value::Int(safe_int(&value)));
                        }
                    }
                }
                FieldType::Double => {
                    if let Some(value) = current {
                        if !value.is_null() {
                            values.insert(name.clone(), Value::Float(safe_float(&value)));
                        }
                    }
                }
                _ => {}
            }
        }

        // Step 7: carry-over. Working values that were neither just
        // computed nor posted survive into the final mapping.
        for (name, value) in &self.vars {
            if name != "id"
                && name != &self.cfg.record_key
                && self.table.contains(name)
                && !values.contains_key(name)
                && !posted.contains_key(name)
                && !posted.files.contains_key(name)
            {
                values.insert(name.clone(), value.clone());
            }
        }

        self.values = values;
        self.accepted = Some(ret);
        debug!(accepted = ret, "accept finished");
        Ok(ret)
    }

    /// Step 8: re-render-on-error. Widget-bearing fields present in the
    /// submission get their control regenerated in place with the user's
    /// latest candidate value, so a redisplayed form shows the rejected
    /// input rather than the original default.
    fn redisplay(&mut self, posted: &FormData) -> FormResult<()> {
        let editing = self.record.is_some();
        let field_list = self.field_list.clone();
        for name in &field_list {
            let Some(field) = self.table.field(name) else {
                continue;
            };
            // List fields without options always re-render through the
            // list widget, even with no explicit hint.
            let hinted = field.widget.or_else(|| {
                if field.field_type.is_list() && !field.has_options() {
                    Some(WidgetKind::List)
                } else {
                    None
                }
            });
            let custom = self.cfg.widget_overrides.get(name).cloned();
            if !posted.contains_key(name) {
                continue;
            }
            let value = self
                .vars
                .get(name)
                .cloned()
                .or_else(|| self.record.as_ref().and_then(|r| r.get(name)).cloned())
                .unwrap_or_else(|| field.display_default(editing));
            let attrs = AttrMap::new();
            let node = match (custom, hinted) {
                (Some(widget), _) => widget.render(self.table.name(), field, &value, &attrs)?,
                (None, Some(WidgetKind::Upload)) => crate::widgets::FileUpload::render_with_download(
                    self.table.name(),
                    field,
                    &value,
                    self.cfg.download_url.as_deref(),
                    &attrs,
                )?,
                (None, Some(kind)) => {
                    widget_for(kind).render(self.table.name(), field, &value, &attrs)?
                }
                (None, None) => continue,
            };
            if let Some(&index) = self.row_index.get(name) {
                self.rows[index].control = node;
                debug!(field = %name, "re-rendered control with submitted value");
            }
        }
        Ok(())
    }
}

/// Integer coercion with a zero default for unparseable input.
fn safe_int(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::Float(f) => *f as i64,
        Value::Bool(b) => i64::from(*b),
        Value::Str(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Float coercion with a zero default for unparseable input.
fn safe_float(value: &Value) -> f64 {
    match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Str(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_int() {
        assert_eq!(safe_int(&Value::from("40")), 40);
        assert_eq!(safe_int(&Value::from("junk")), 0);
        assert_eq!(safe_int(&Value::Int(7)), 7);
        assert_eq!(safe_int(&Value::Float(2.9)), 2);
        assert_eq!(safe_int(&Value::Null), 0);
    }

    #[test]
    fn test_safe_float() {
        assert_eq!(safe_float(&Value::from("2.5")), 2.5);
        assert_eq!(safe_float(&Value::from("junk")), 0.0);
        assert_eq!(safe_float(&Value::Int(3)), 3.0);
        assert_eq!(safe_float(&Value::Null), 0.0);
    }
}
