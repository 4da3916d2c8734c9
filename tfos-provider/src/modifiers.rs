// Plan modifiers

use crate::types::{AttrType, Value};
use std::fmt;

/// Rewrites an attribute's planned value before Terraform diffs it.
pub trait PlanModifier: fmt::Debug + Send + Sync {
    /// Human readable description
    fn description(&self) -> &'static str;

    /// Return the value to plan in place of `plan`.
    fn modify(&self, plan: Value) -> Value;
}

/// Plans an explicit empty list where the configuration leaves a list unset.
///
/// The cluster always reports permission lists, empty or not, so a null
/// plan would otherwise diff against `[]` after every apply.
#[derive(Debug, Clone)]
pub struct DefaultEmptyList {
    elem_type: AttrType,
}

impl DefaultEmptyList {
    pub fn new(elem_type: AttrType) -> Self {
        Self { elem_type }
    }
}

impl PlanModifier for DefaultEmptyList {
    fn description(&self) -> &'static str {
        "Ensures state consistency when no value is provided in state"
    }

    fn modify(&self, plan: Value) -> Value {
        if plan.is_null() {
            Value::empty_list(self.elem_type.clone())
        } else {
            plan
        }
    }
}

/// Plans a fixed string where the configuration leaves a string unset.
#[derive(Debug, Clone)]
pub struct DefaultString(pub &'static str);

impl PlanModifier for DefaultString {
    fn description(&self) -> &'static str {
        "Sets a default value when state is null"
    }

    fn modify(&self, plan: Value) -> Value {
        if plan.is_null() {
            Value::string(self.0)
        } else {
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_empty_list() {
        let modifier = DefaultEmptyList::new(AttrType::String);
        let planned = modifier.modify(Value::null(AttrType::list(AttrType::String)));
        assert_eq!(planned, Value::empty_list(AttrType::String));

        let unknown = Value::unknown(AttrType::list(AttrType::String));
        assert_eq!(modifier.modify(unknown.clone()), unknown);
    }

    #[test]
    fn test_default_string_keeps_configured_value() {
        let modifier = DefaultString("");
        assert_eq!(modifier.modify(Value::null(AttrType::String)), Value::string(""));
        assert_eq!(modifier.modify(Value::string("set")), Value::string("set"));
    }
}
