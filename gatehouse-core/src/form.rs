//! Dynamic form definitions as served to renderers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Submitted field values, keyed by field name.
pub type Submission = Map<String, Value>;

/// A renderable form with its fields and visibility rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FormDefinition {
    /// Stable identifier. Never changes once published.
    pub id: String,
    /// Business domain the form belongs to (e.g. `"IT"`).
    pub domain: String,
    /// End-user facing title.
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub image_url: String,
    /// Self-service portal URL where the form can be completed directly.
    pub url: String,
    pub last_updated_at: DateTime<Utc>,
    pub fields: Vec<FormField>,
    pub dynamic_field_rules: Vec<DynamicFieldRule>,
}

/// One input (or label) of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FormField {
    pub label: String,
    /// Key used for this field in a submission. Unique within the form.
    pub name: String,
    pub placeholder: Option<String>,
    /// Tooltip or help text. May contain HTML.
    pub help: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Visibility on first render, before any rule applies.
    pub visible: bool,
    pub options: Vec<FieldOption>,
}

/// A selectable choice of a picker field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FieldOption {
    /// Text shown in the dropdown.
    pub label: String,
    /// Value submitted when this option is chosen.
    pub value: String,
}

/// Kind of widget a field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    SingleUserOptionPicker,
    MultiOptionPicker,
    SingleOptionPicker,
    SingleLineText,
    MultiLineText,
    DatePicker,
    /// Static text. `placeholder`, `help` and `required` have no effect.
    Label,
    /// `placeholder` and `required` have no effect.
    Checkbox,
}

/// Declarative condition to action mapping over a form's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct DynamicFieldRule {
    pub name: String,
    /// How condition results combine. Irrelevant for a single condition.
    pub logical: Logical,
    pub conditions: Vec<Condition>,
    /// Applied as written when the rule holds, negated when it does not.
    pub actions: Vec<RuleAction>,
}

/// Combinator over a rule's condition results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logical {
    And,
    Or,
}

/// A test of one submitted field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    /// Operand of the test. `null` for operators that take none.
    #[serde(default)]
    pub value: Value,
}

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Operator {
    Equals,
    NotEquals,
    NotEmpty,
    Empty,
    In,
}

/// Visibility and requirement assigned to a target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RuleAction {
    pub field_name: String,
    pub visible: bool,
    pub required: bool,
}

impl FormDefinition {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks the structural invariants of the definition.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateField`] if two fields share a name, or
    /// [`CoreError::UnknownRuleField`] if a rule condition or action names a
    /// field the form does not declare.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut names = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(CoreError::DuplicateField {
                    form_id: self.id.clone(),
                    field: field.name.clone(),
                });
            }
        }

        for rule in &self.dynamic_field_rules {
            let referenced = rule
                .conditions
                .iter()
                .map(|c| c.field_name.as_str())
                .chain(rule.actions.iter().map(|a| a.field_name.as_str()));
            for field in referenced {
                if !names.contains(field) {
                    return Err(CoreError::UnknownRuleField {
                        form_id: self.id.clone(),
                        rule: rule.name.clone(),
                        field: field.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::sample_forms;

    fn erp_form() -> FormDefinition {
        match sample_forms().into_iter().next() {
            Some(f) => f,
            None => panic!("sample catalog is empty"),
        }
    }

    #[test]
    fn sample_form_is_valid() {
        assert!(erp_form().validate().is_ok());
    }

    #[test]
    fn duplicate_field_name_is_rejected() {
        let mut form = erp_form();
        let copy = form.fields[0].clone();
        form.fields.push(copy);
        match form.validate() {
            Err(CoreError::DuplicateField { field, .. }) => assert_eq!(field, "requested_for"),
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn rule_targeting_unknown_field_is_rejected() {
        let mut form = erp_form();
        form.dynamic_field_rules[0].actions[0].field_name = "cost_center".to_owned();
        match form.validate() {
            Err(CoreError::UnknownRuleField { rule, field, .. }) => {
                assert_eq!(rule, "read_or_write_ctrl_business_justification");
                assert_eq!(field, "cost_center");
            }
            other => panic!("expected UnknownRuleField, got {other:?}"),
        }
    }

    #[test]
    fn field_type_uses_wire_names() {
        let json = match serde_json::to_string(&FieldType::SingleUserOptionPicker) {
            Ok(s) => s,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json, "\"SINGLE_USER_OPTION_PICKER\"");
    }

    #[test]
    fn definition_serializes_to_wire_shape() {
        let json = match serde_json::to_value(erp_form()) {
            Ok(v) => v,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json["id"], "123456789");
        assert_eq!(json["last_updated_at"], "2021-10-20T17:28:52Z");
        assert_eq!(json["fields"][1]["type"], "MULTI_OPTION_PICKER");
        assert_eq!(json["fields"][1]["placeholder"], Value::Null);
        assert_eq!(json["dynamic_field_rules"][0]["logical"], "OR");
        let second_rule = &json["dynamic_field_rules"][1];
        assert_eq!(second_rule["conditions"][0]["operator"], "NOT_EMPTY");
    }

    #[test]
    fn definition_round_trips_through_json() {
        let form = erp_form();
        let text = match serde_json::to_string(&form) {
            Ok(t) => t,
            Err(e) => panic!("serialization failed: {e}"),
        };
        let parsed: FormDefinition = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(e) => panic!("json round trip failed: {e}"),
        };
        assert_eq!(parsed, form);
    }

    #[test]
    fn condition_without_value_defaults_to_null() {
        let json = r#"{"field_name":"a","operator":"NOT_EMPTY"}"#;
        let condition: Condition = match serde_json::from_str(json) {
            Ok(c) => c,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(condition.operator, Operator::NotEmpty);
        assert!(condition.value.is_null());
    }
}
