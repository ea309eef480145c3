//! Sample form catalog demonstrating the schema.
//!
//! One IT form, "Request ERP System Access", exercising every field type and
//! all three rule shapes: single condition, `NOT_EMPTY`, and an `AND` of two
//! conditions.

use serde_json::{json, Value};

use crate::form::{
    Condition, DynamicFieldRule, FieldOption, FieldType, FormDefinition, FormField, Logical,
    Operator, RuleAction,
};

/// Id of the ERP access request form.
pub const ERP_ACCESS_FORM_ID: &str = "123456789";

const PERMISSIONS_HELP: &str =
    r#"You can check <a href="help.moveworks.com/erp">this link</a> for help."#;

/// Returns the sample forms, in catalog order.
#[must_use]
pub fn sample_forms() -> Vec<FormDefinition> {
    vec![erp_access_form()]
}

fn erp_access_form() -> FormDefinition {
    FormDefinition {
        id: ERP_ACCESS_FORM_ID.to_owned(),
        domain: "IT".to_owned(),
        title: "Request ERP System Access".to_owned(),
        short_description: "Lorem".to_owned(),
        description: "Lorem ipsum".to_owned(),
        image_url: "https://form-image.example.com/stock-image.png".to_owned(),
        url: "https://google.com/forms?id=23493".to_owned(),
        #[expect(clippy::unwrap_used, reason = "2021-10-20T17:28:52Z is a valid RFC 3339 instant")]
        last_updated_at: "2021-10-20T17:28:52Z".parse().unwrap(),
        fields: vec![
            field(
                "Who is this account for?",
                "requested_for",
                FieldType::SingleUserOptionPicker,
                (true, true),
            )
            .placeholder("Select a user")
            .help("The user who needs to be given ERP system access"),
            field(
                "What permissions do you need?",
                "permissions",
                FieldType::MultiOptionPicker,
                (true, true),
            )
            .help(PERMISSIONS_HELP)
            .options(&[
                ("Banking Manager", "banking_manager"),
                ("Returns Preparer", "returns_preparer"),
            ]),
            field(
                "Do you need read or write access?",
                "read_or_write",
                FieldType::SingleOptionPicker,
                (true, true),
            )
            .options(&[("Read", "read"), ("Write", "write")]),
            field(
                "Why do you need this access?",
                "business_justification",
                FieldType::SingleLineText,
                (false, true),
            ),
            field(
                "When do you need this to take effect?",
                "effective_date",
                FieldType::DatePicker,
                (false, true),
            ),
            field(
                "2FA is recommended for ERP access.",
                "2fa_device_advice",
                FieldType::Label,
                (false, false),
            ),
            field(
                "Do you want to also give them a 2FA device?",
                "2fa_device",
                FieldType::Checkbox,
                (false, false),
            ),
            field(
                "Any additional details?",
                "additional_details",
                FieldType::MultiLineText,
                (false, true),
            ),
        ],
        dynamic_field_rules: vec![
            // Mandatory justification when read access is requested.
            rule(
                "read_or_write_ctrl_business_justification",
                Logical::Or,
                vec![condition("read_or_write", Operator::Equals, json!("read"))],
                vec![action("business_justification", true, true)],
            ),
            rule(
                "read_or_write_ctrl_additional_details",
                Logical::And,
                vec![condition("read_or_write", Operator::NotEmpty, Value::Null)],
                vec![action("additional_details", true, true)],
            ),
            rule(
                "make_2fa_visible",
                Logical::And,
                vec![
                    condition("read_or_write", Operator::In, json!(["read", "write"])),
                    condition("permissions", Operator::Equals, json!("banking_manager")),
                ],
                vec![
                    action("2fa_device_advice", true, false),
                    action("2fa_device", true, false),
                ],
            ),
        ],
    }
}

/// Field with the given `(required, visible)` flags and no options.
fn field(
    label: &str,
    name: &str,
    field_type: FieldType,
    (required, visible): (bool, bool),
) -> FormField {
    FormField {
        label: label.to_owned(),
        name: name.to_owned(),
        placeholder: None,
        help: None,
        field_type,
        required,
        visible,
        options: vec![],
    }
}

impl FormField {
    fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_owned());
        self
    }

    fn help(mut self, text: &str) -> Self {
        self.help = Some(text.to_owned());
        self
    }

    fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(label, value)| FieldOption {
                label: (*label).to_owned(),
                value: (*value).to_owned(),
            })
            .collect();
        self
    }
}

fn rule(
    name: &str,
    logical: Logical,
    conditions: Vec<Condition>,
    actions: Vec<RuleAction>,
) -> DynamicFieldRule {
    DynamicFieldRule {
        name: name.to_owned(),
        logical,
        conditions,
        actions,
    }
}

fn condition(field_name: &str, operator: Operator, value: Value) -> Condition {
    Condition {
        field_name: field_name.to_owned(),
        operator,
        value,
    }
}

fn action(field_name: &str, visible: bool, required: bool) -> RuleAction {
    RuleAction {
        field_name: field_name.to_owned(),
        visible,
        required,
    }
}
