use platform_api::FieldErrors;
use serde_json::Value;
use uuid::Uuid;

use crate::additional_info::{AdditionalInfo, NOT_NULL, REQUIRED};

const NON_FIELD: &str = "non_field_errors";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Every required field must be present.
    Create,
    /// Absent fields are left untouched.
    Update,
}

/// What the payload asked for the `manager` reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ManagerField {
    #[default]
    Unchanged,
    Clear,
    Set(Uuid),
}

/// The writable subset of an employee, as submitted by a client.
///
/// Read-only keys (`employee_id`, `login`, `creator_id`, `created`,
/// `updated`, `allow_edit`) and unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeInput {
    pub manager: ManagerField,
    pub additional_info: Option<AdditionalInfo>,
}

impl EmployeeInput {
    pub fn from_json(payload: &Value, mode: InputMode) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let Some(map) = payload.as_object() else {
            errors.add(NON_FIELD, "Invalid data. Expected a dictionary.");
            return Err(errors);
        };

        let manager = match map.get("manager") {
            None => ManagerField::Unchanged,
            Some(value) => parse_manager(value).unwrap_or_else(|message| {
                errors.add("manager", message);
                ManagerField::Unchanged
            }),
        };

        let additional_info = match map.get("additional_info") {
            None => {
                if mode == InputMode::Create {
                    errors.add("additional_info", REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                errors.add("additional_info", NOT_NULL);
                None
            }
            Some(Value::Object(nested)) => match AdditionalInfo::from_input(nested) {
                Ok(info) => Some(info),
                Err(nested_errors) => {
                    errors.nest("additional_info", nested_errors);
                    None
                }
            },
            Some(_) => {
                errors.add(
                    "additional_info",
                    "Invalid data. Expected a dictionary.",
                );
                None
            }
        };

        errors.into_result(Self {
            manager,
            additional_info,
        })
    }
}

/// Accepts a UUID string, `null`, or a rendered manager object carrying
/// `employee_id` so that output can be submitted back unchanged.
fn parse_manager(value: &Value) -> Result<ManagerField, &'static str> {
    match value {
        Value::Null => Ok(ManagerField::Clear),
        Value::String(raw) => Uuid::parse_str(raw.trim())
            .map(ManagerField::Set)
            .map_err(|_| "Must be a valid UUID."),
        Value::Object(map) => match map.get("employee_id") {
            Some(Value::String(raw)) => Uuid::parse_str(raw.trim())
                .map(ManagerField::Set)
                .map_err(|_| "Must be a valid UUID."),
            _ => Err("Expected an employee id."),
        },
        _ => Err("Must be a valid UUID."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Value {
        json!({"full_name": "Jane Doe", "email": "jdoe@corp.test"})
    }

    #[test]
    fn read_only_keys_are_ignored() {
        let input = EmployeeInput::from_json(
            &json!({
                "employee_id": Uuid::new_v4(),
                "login": "root",
                "creator_id": Uuid::new_v4(),
                "created": "2020-01-01T00:00:00Z",
                "updated": "2020-01-01T00:00:00Z",
                "allow_edit": true,
                "additional_info": profile(),
            }),
            InputMode::Create,
        )
        .unwrap();
        assert_eq!(input.manager, ManagerField::Unchanged);
        assert_eq!(input.additional_info.unwrap().full_name, "Jane Doe");
    }

    #[test]
    fn create_requires_additional_info() {
        let errors = EmployeeInput::from_json(&json!({}), InputMode::Create).unwrap_err();
        assert_eq!(
            errors.get("additional_info"),
            Some(&[REQUIRED.to_string()][..])
        );
        let update = EmployeeInput::from_json(&json!({}), InputMode::Update).unwrap();
        assert_eq!(update, EmployeeInput::default());
    }

    #[test]
    fn manager_accepts_id_null_or_rendered_object() {
        let id = Uuid::new_v4();
        let parse = |manager: Value| {
            EmployeeInput::from_json(&json!({"manager": manager}), InputMode::Update)
                .map(|input| input.manager)
        };
        assert_eq!(parse(json!(id.to_string())), Ok(ManagerField::Set(id)));
        assert_eq!(parse(Value::Null), Ok(ManagerField::Clear));
        assert_eq!(
            parse(json!({"employee_id": id, "login": "boss"})),
            Ok(ManagerField::Set(id))
        );
        let errors = parse(json!(17)).unwrap_err();
        assert_eq!(
            errors.get("manager"),
            Some(&["Must be a valid UUID.".to_string()][..])
        );
    }

    #[test]
    fn nested_errors_are_prefixed() {
        let errors = EmployeeInput::from_json(
            &json!({"manager": "nope", "additional_info": {"email": "x@y"}}),
            InputMode::Create,
        )
        .unwrap_err();
        assert!(errors.contains("manager"));
        assert!(errors.contains("additional_info.full_name"));
        assert!(!errors.contains("additional_info.email"));
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        let errors = EmployeeInput::from_json(&json!([1, 2]), InputMode::Update).unwrap_err();
        assert!(errors.contains(NON_FIELD));
        let errors =
            EmployeeInput::from_json(&json!({"additional_info": "x"}), InputMode::Update)
                .unwrap_err();
        assert!(errors.contains("additional_info"));
    }
}
