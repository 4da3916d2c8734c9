//! Conversions between typed attribute values and the role model.
//!
//! Domain to typed conversions take a `null_on_empty` flag: Terraform tells
//! an explicitly empty list apart from an unset one, and the plan and the
//! post-apply refresh need different answers to avoid spurious diffs.
//! Typed to domain conversions always produce a (possibly empty) `Vec`.
//!
//! Attribute lookups go through [`crate::schema`]; a value whose type does
//! not match the schema is an [`AttrError`], never a silent default.

use crate::error::{AttrError, Result};
use crate::schema::{attr, INDEX_PERMISSION_TYPE, TENANT_PERMISSION_TYPE};
use crate::types::{AttrType, ObjectType, ObjectValue, Value};
use std::collections::BTreeMap;
use tfos_client::{IndexPermission, TenantPermission};

/// Strings to a typed string list.
pub fn strings_to_list(items: &[String], null_on_empty: bool) -> Value {
    if null_on_empty && items.is_empty() {
        return Value::null(AttrType::list(AttrType::String));
    }
    let elems = items.iter().map(|s| Value::string(s.as_str())).collect();
    // every element is a string
    Value::list(AttrType::String, elems).unwrap_or_else(|_| Value::empty_list(AttrType::String))
}

/// Typed string list to strings. Null and unknown lists are empty.
pub fn list_to_strings(value: &Value, attribute: &str) -> Result<Vec<String>> {
    match value {
        Value::Null(AttrType::List(elem)) | Value::Unknown(AttrType::List(elem))
            if **elem == AttrType::String =>
        {
            Ok(Vec::new())
        }
        Value::List(list) if *list.elem_type() == AttrType::String => list
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::String(s) => Ok(s.clone()),
                other => Err(AttrError::mismatch(
                    format!("{}[{}]", attribute, i),
                    AttrType::String,
                    other.ty(),
                )),
            })
            .collect(),
        other => Err(AttrError::mismatch(
            attribute,
            AttrType::list(AttrType::String),
            other.ty(),
        )),
    }
}

/// Optional flag to a typed bool; `None` is null.
pub fn bool_to_value(flag: Option<bool>) -> Value {
    flag.map(Value::Bool).unwrap_or(Value::Null(AttrType::Bool))
}

fn to_nested_list<T>(
    object_type: &ObjectType,
    items: &[T],
    null_on_empty: bool,
    to_object: impl Fn(&T) -> Result<Value>,
) -> Result<Value> {
    let elem_type = AttrType::Object(object_type.clone());
    if null_on_empty && items.is_empty() {
        return Ok(Value::null(AttrType::list(elem_type)));
    }
    let elems = items.iter().map(to_object).collect::<Result<Vec<_>>>()?;
    Value::list(elem_type, elems)
}

fn from_nested_list<T>(
    value: &Value,
    attribute: &str,
    object_type: &ObjectType,
    from_object: impl Fn(&ObjectValue) -> Result<T>,
) -> Result<Vec<T>> {
    let expected = AttrType::list(AttrType::Object(object_type.clone()));
    if !value.conforms_to(&expected) {
        return Err(AttrError::mismatch(attribute, expected, value.ty()));
    }
    match value.as_list() {
        // conforms_to guarantees object elements
        Some(list) => list
            .iter()
            .filter_map(Value::as_object)
            .map(from_object)
            .collect(),
        None => Ok(Vec::new()),
    }
}

fn object(object_type: &ObjectType, attrs: Vec<(&str, Value)>) -> Result<Value> {
    let attrs: BTreeMap<_, _> = attrs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Value::object(object_type.clone(), attrs)
}

/// One index permission as a typed object. Nested lists are always
/// explicit, even when empty.
pub fn index_permission_to_object(p: &IndexPermission) -> Result<Value> {
    object(
        &INDEX_PERMISSION_TYPE,
        vec![
            (attr::INDEX_PATTERNS, strings_to_list(&p.index_patterns, false)),
            (attr::DLS, Value::string(p.dls.as_str())),
            (attr::FLS, Value::string(p.fls.as_str())),
            (attr::MASKED_FIELDS, strings_to_list(&p.masked_fields, false)),
            (attr::ALLOWED_ACTIONS, strings_to_list(&p.allowed_actions, false)),
        ],
    )
}

/// One tenant permission as a typed object.
pub fn tenant_permission_to_object(p: &TenantPermission) -> Result<Value> {
    object(
        &TENANT_PERMISSION_TYPE,
        vec![
            (attr::TENANT_PATTERNS, strings_to_list(&p.tenant_patterns, false)),
            (attr::ALLOWED_ACTIONS, strings_to_list(&p.allowed_actions, false)),
        ],
    )
}

pub fn index_permissions_to_list(perms: &[IndexPermission], null_on_empty: bool) -> Result<Value> {
    to_nested_list(&INDEX_PERMISSION_TYPE, perms, null_on_empty, index_permission_to_object)
}

pub fn tenant_permissions_to_list(perms: &[TenantPermission], null_on_empty: bool) -> Result<Value> {
    to_nested_list(&TENANT_PERMISSION_TYPE, perms, null_on_empty, tenant_permission_to_object)
}

/// Typed `index_permissions` to the domain model.
///
/// A null `dls` or `fls` is the empty string, which the cluster treats as
/// "no restriction".
pub fn list_to_index_permissions(value: &Value) -> Result<Vec<IndexPermission>> {
    from_nested_list(value, attr::INDEX_PERMISSIONS, &INDEX_PERMISSION_TYPE, |obj| {
        Ok(IndexPermission {
            index_patterns: list_to_strings(obj.list(attr::INDEX_PATTERNS)?, attr::INDEX_PATTERNS)?,
            dls: obj.string(attr::DLS)?.unwrap_or_default(),
            fls: obj.string(attr::FLS)?.unwrap_or_default(),
            masked_fields: list_to_strings(obj.list(attr::MASKED_FIELDS)?, attr::MASKED_FIELDS)?,
            allowed_actions: list_to_strings(obj.list(attr::ALLOWED_ACTIONS)?, attr::ALLOWED_ACTIONS)?,
        })
    })
}

/// Typed `tenant_permissions` to the domain model.
pub fn list_to_tenant_permissions(value: &Value) -> Result<Vec<TenantPermission>> {
    from_nested_list(value, attr::TENANT_PERMISSIONS, &TENANT_PERMISSION_TYPE, |obj| {
        Ok(TenantPermission {
            tenant_patterns: list_to_strings(obj.list(attr::TENANT_PATTERNS)?, attr::TENANT_PATTERNS)?,
            allowed_actions: list_to_strings(obj.list(attr::ALLOWED_ACTIONS)?, attr::ALLOWED_ACTIONS)?,
        })
    })
}
