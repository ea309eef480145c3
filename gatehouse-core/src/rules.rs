//! Evaluation of dynamic field rules against a submission.
//!
//! A rule that holds applies each action as written. A rule that does not
//! hold applies the negation of each action's flags, so a rule granting
//! `visible: true` hides its target while its conditions are unmet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form::{
    Condition, DynamicFieldRule, FormDefinition, Logical, Operator, RuleAction, Submission,
};

/// Render state of one field after rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub visible: bool,
    pub required: bool,
}

impl RuleAction {
    /// State this action assigns when its rule evaluated to `satisfied`.
    #[must_use]
    pub fn state(&self, satisfied: bool) -> FieldState {
        if satisfied {
            FieldState {
                visible: self.visible,
                required: self.required,
            }
        } else {
            FieldState {
                visible: !self.visible,
                required: !self.required,
            }
        }
    }
}

impl Condition {
    /// Tests the submitted value of `field_name`.
    ///
    /// Array submissions (multi-pickers) satisfy `EQUALS` and `IN` when any
    /// element does.
    #[must_use]
    pub fn holds(&self, submission: &Submission) -> bool {
        let submitted = submission.get(&self.field_name);
        let equals = |item: &Value| item == &self.value;
        match self.operator {
            Operator::Equals => submitted.is_some_and(|v| matches_any(v, equals)),
            Operator::NotEquals => !submitted.is_some_and(|v| matches_any(v, equals)),
            Operator::NotEmpty => !is_empty(submitted),
            Operator::Empty => is_empty(submitted),
            Operator::In => {
                let Value::Array(allowed) = &self.value else {
                    return false;
                };
                let member = |item: &Value| allowed.contains(item);
                submitted.is_some_and(|v| matches_any(v, member))
            }
        }
    }
}

impl DynamicFieldRule {
    /// Combines the condition results with the rule's combinator.
    ///
    /// An `AND` rule without conditions holds; an `OR` rule without
    /// conditions does not.
    #[must_use]
    pub fn is_satisfied(&self, submission: &Submission) -> bool {
        match self.logical {
            Logical::And => self.conditions.iter().all(|c| c.holds(submission)),
            Logical::Or => self.conditions.iter().any(|c| c.holds(submission)),
        }
    }
}

fn matches_any(value: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => items.iter().any(pred),
        scalar => pred(scalar),
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// Computes every field's state for `submission`.
///
/// Starts from each field's declared `visible`/`required` and applies the
/// rules in declaration order; when two rules target the same field the
/// later one wins.
#[must_use]
pub fn evaluate(form: &FormDefinition, submission: &Submission) -> BTreeMap<String, FieldState> {
    let mut states: BTreeMap<String, FieldState> = form
        .fields
        .iter()
        .map(|f| {
            let declared = FieldState {
                visible: f.visible,
                required: f.required,
            };
            (f.name.clone(), declared)
        })
        .collect();

    for rule in &form.dynamic_field_rules {
        let satisfied = rule.is_satisfied(submission);
        for action in &rule.actions {
            states.insert(action.field_name.clone(), action.state(satisfied));
        }
    }
    states
}

/// Names of fields that are visible and required but have no value.
///
/// Diagnostic only: the gateways never reject a submission on this basis.
#[must_use]
pub fn missing_required(form: &FormDefinition, submission: &Submission) -> Vec<String> {
    let states = evaluate(form, submission);
    form.fields
        .iter()
        .filter(|f| states.get(&f.name).is_some_and(|s| s.visible && s.required))
        .filter(|f| is_empty(submission.get(&f.name)))
        .map(|f| f.name.clone())
        .collect()
}
