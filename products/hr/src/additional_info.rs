use chrono::NaiveDate;
use platform_api::FieldErrors;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const NOT_NULL: &str = "This field may not be null.";

const MAX_LOGIN_LEN: usize = 150;

/// Nested profile stored alongside an employee as JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl AdditionalInfo {
    /// Validate a client-supplied object. Errors are keyed by the bare field
    /// name; callers nest them under `additional_info`.
    pub fn from_input(map: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let full_name = required_string(map, "full_name", 256, &mut errors);
        let email = required_string(map, "email", 320, &mut errors);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }
        let position = optional_string(map, "position", 128, &mut errors);
        let department = optional_string(map, "department", 128, &mut errors);
        let phone = optional_string(map, "phone", 64, &mut errors);
        let start_date = optional_date(map, "start_date", &mut errors);

        match (full_name, email) {
            (Some(full_name), Some(email)) => errors.into_result(Self {
                full_name,
                email,
                position,
                department,
                phone,
                start_date,
            }),
            _ => Err(errors),
        }
    }

    /// Read back what was stored. Rows are only ever written from a validated
    /// value, so a parse failure means the column was edited out of band.
    pub fn from_stored(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Login for a new employee: the lowercased local part of the email.
    pub fn derive_login(&self) -> Option<String> {
        let (local, _) = self.email.split_once('@')?;
        let login = local.to_ascii_lowercase();
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        if login.is_empty() || login.len() > MAX_LOGIN_LEN || !login.chars().all(allowed) {
            return None;
        }
        Some(login)
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
}

fn string_field(
    map: &Map<String, Value>,
    field: &str,
    max: usize,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.chars().count() > max {
                errors.add(
                    field,
                    format!("Ensure this field has no more than {max} characters."),
                );
                return None;
            }
            Some((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => {
            errors.add(field, "Not a valid string.");
            None
        }
    }
}

fn required_string(
    map: &Map<String, Value>,
    field: &str,
    max: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    match map.get(field) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(Value::Null) => {
            errors.add(field, NOT_NULL);
            None
        }
        Some(_) => match string_field(map, field, max, errors)? {
            Some(value) => Some(value),
            None => {
                errors.add(field, "This field may not be blank.");
                None
            }
        },
    }
}

fn optional_string(
    map: &Map<String, Value>,
    field: &str,
    max: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    string_field(map, field, max, errors).flatten()
}

fn optional_date(
    map: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<NaiveDate> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(field, "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        },
        Some(_) => {
            errors.add(field, "Date has wrong format. Use YYYY-MM-DD.");
            None
        }
    }
}
