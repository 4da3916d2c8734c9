//! Typed attribute model.
//!
//! Terraform tracks every attribute as a typed value that may also be null
//! (not set) or unknown (known only after apply). [`Value`] mirrors that,
//! and its constructors check element and attribute types so a value can
//! never disagree with its declared [`AttrType`].

use crate::error::{AttrError, Result};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrType {
    String,
    Bool,
    Int64,
    List(Box<AttrType>),
    Object(ObjectType),
}

impl AttrType {
    /// List of `elem`
    pub fn list(elem: AttrType) -> Self {
        AttrType::List(Box::new(elem))
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::String => write!(f, "string"),
            AttrType::Bool => write!(f, "bool"),
            AttrType::Int64 => write!(f, "number"),
            AttrType::List(elem) => write!(f, "list({})", elem),
            AttrType::Object(obj) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in obj.attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, ty)?;
                }
                write!(f, "}})")
            }
        }
    }
}

/// Attribute names and types of an object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectType {
    attrs: BTreeMap<String, AttrType>,
}

impl ObjectType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, ty: AttrType) -> Self {
        self.attrs.insert(name.into(), ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrType> {
        self.attrs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrType)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null(AttrType),
    Unknown(AttrType),
    String(String),
    Bool(bool),
    Int64(i64),
    List(ListValue),
    Object(ObjectValue),
}

impl Value {
    pub fn null(ty: AttrType) -> Self {
        Value::Null(ty)
    }

    pub fn unknown(ty: AttrType) -> Self {
        Value::Unknown(ty)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Typed list; every element must be of `elem_type`.
    pub fn list(elem_type: AttrType, elems: Vec<Value>) -> Result<Self> {
        ListValue::new(elem_type, elems).map(Value::List)
    }

    /// Explicitly empty list, as opposed to a null one.
    pub fn empty_list(elem_type: AttrType) -> Self {
        Value::List(ListValue {
            elem_type,
            elems: Vec::new(),
        })
    }

    pub fn object(ty: ObjectType, attrs: BTreeMap<String, Value>) -> Result<Self> {
        ObjectValue::new(ty, attrs).map(Value::Object)
    }

    /// The type this value carries.
    pub fn ty(&self) -> AttrType {
        match self {
            Value::Null(ty) | Value::Unknown(ty) => ty.clone(),
            Value::String(_) => AttrType::String,
            Value::Bool(_) => AttrType::Bool,
            Value::Int64(_) => AttrType::Int64,
            Value::List(list) => AttrType::list(list.elem_type.clone()),
            Value::Object(obj) => AttrType::Object(obj.ty.clone()),
        }
    }

    pub fn conforms_to(&self, ty: &AttrType) -> bool {
        match (self, ty) {
            (Value::Null(own) | Value::Unknown(own), _) => own == ty,
            (Value::String(_), AttrType::String) => true,
            (Value::Bool(_), AttrType::Bool) => true,
            (Value::Int64(_), AttrType::Int64) => true,
            (Value::List(list), AttrType::List(elem)) => list.elem_type == **elem,
            (Value::Object(obj), AttrType::Object(object_type)) => &obj.ty == object_type,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    /// Neither null nor unknown
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Decode the JSON rendering of a value of type `ty`.
    ///
    /// JSON `null` is a null value. Object keys missing from the JSON are
    /// null; keys the type does not declare are rejected.
    pub fn from_json(ty: &AttrType, json: &Json) -> Result<Self> {
        decode_json(ty, json, "")
    }

    /// JSON rendering. Unknown values render as `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null(_) | Value::Unknown(_) => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Bool(b) => Json::Bool(*b),
            Value::Int64(n) => Json::from(*n),
            Value::List(list) => Json::Array(list.elems.iter().map(Value::to_json).collect()),
            Value::Object(obj) => Json::Object(
                obj.attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Known list value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    elem_type: AttrType,
    elems: Vec<Value>,
}

impl ListValue {
    pub fn new(elem_type: AttrType, elems: Vec<Value>) -> Result<Self> {
        for (i, elem) in elems.iter().enumerate() {
            if !elem.conforms_to(&elem_type) {
                return Err(AttrError::mismatch(format!("[{}]", i), &elem_type, elem.ty()));
            }
        }
        Ok(Self { elem_type, elems })
    }

    pub fn elem_type(&self) -> &AttrType {
        &self.elem_type
    }

    pub fn elements(&self) -> &[Value] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elems.iter()
    }
}

/// Known object value; holds exactly the attributes of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectValue {
    ty: ObjectType,
    attrs: BTreeMap<String, Value>,
}

impl ObjectValue {
    pub fn new(ty: ObjectType, attrs: BTreeMap<String, Value>) -> Result<Self> {
        if let Some(extra) = attrs.keys().find(|k| ty.get(k).is_none()) {
            return Err(AttrError::UnknownAttribute(extra.clone()));
        }
        for (name, attr_type) in ty.iter() {
            let value = attrs
                .get(name)
                .ok_or_else(|| AttrError::MissingAttribute(name.to_string()))?;
            if !value.conforms_to(attr_type) {
                return Err(AttrError::mismatch(name, attr_type, value.ty()));
            }
        }
        Ok(Self { ty, attrs })
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.ty
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.attrs
            .get(name)
            .ok_or_else(|| AttrError::MissingAttribute(name.to_string()))
    }

    /// Replace one attribute, keeping the object well typed.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let ty = self
            .ty
            .get(name)
            .ok_or_else(|| AttrError::UnknownAttribute(name.to_string()))?;
        if !value.conforms_to(ty) {
            return Err(AttrError::mismatch(name, ty, value.ty()));
        }
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    /// String attribute; `None` when null or unknown.
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        match self.get(name)? {
            Value::String(s) => Ok(Some(s.clone())),
            Value::Null(AttrType::String) | Value::Unknown(AttrType::String) => Ok(None),
            other => Err(AttrError::mismatch(name, AttrType::String, other.ty())),
        }
    }

    /// Bool attribute; `None` when null or unknown.
    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name)? {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Null(AttrType::Bool) | Value::Unknown(AttrType::Bool) => Ok(None),
            other => Err(AttrError::mismatch(name, AttrType::Bool, other.ty())),
        }
    }

    /// List attribute as a value, checked to be list typed.
    pub fn list(&self, name: &str) -> Result<&Value> {
        let value = self.get(name)?;
        match value.ty() {
            AttrType::List(_) => Ok(value),
            other => Err(AttrError::mismatch(name, "list", other)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_attrs(self) -> BTreeMap<String, Value> {
        self.attrs
    }
}

fn decode_json(ty: &AttrType, json: &Json, path: &str) -> Result<Value> {
    let mismatch = || AttrError::mismatch(path, ty, json_kind(json));

    if json.is_null() {
        return Ok(Value::Null(ty.clone()));
    }

    match ty {
        AttrType::String => json.as_str().map(Value::string).ok_or_else(mismatch),
        AttrType::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        AttrType::Int64 => json.as_i64().map(Value::Int64).ok_or_else(mismatch),
        AttrType::List(elem) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            let elems = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_json(elem, item, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>>>()?;
            Value::list((**elem).clone(), elems)
        }
        AttrType::Object(object_type) => {
            let map = json.as_object().ok_or_else(mismatch)?;
            if let Some(extra) = map.keys().find(|k| object_type.get(k).is_none()) {
                return Err(AttrError::UnknownAttribute(join_path(path, extra)));
            }
            let mut attrs = BTreeMap::new();
            for (name, attr_type) in object_type.iter() {
                let child = join_path(path, name);
                let value = match map.get(name) {
                    Some(v) => decode_json(attr_type, v, &child)?,
                    None => Value::Null(attr_type.clone()),
                };
                attrs.insert(name.to_string(), value);
            }
            Value::object(object_type.clone(), attrs)
        }
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}
