use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Check that `value` has between `min` and `max` characters.
pub fn check_char_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    let len = value.chars().count();
    if len < min {
        issues.push(ValidationIssue::new(
            field,
            "too_short",
            format!("{field} must be at least {min} character(s)"),
        ));
    } else if len > max {
        issues.push(ValidationIssue::new(
            field,
            "too_long",
            format!("{field} must be at most {max} characters"),
        ));
    }
}

/// Check that a list holds between `min` and `max` items.
pub fn check_item_count(
    field: &str,
    count: usize,
    min: usize,
    max: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    if count < min {
        issues.push(ValidationIssue::new(
            field,
            "too_few",
            format!("{field} must contain at least {min} item(s)"),
        ));
    } else if count > max {
        issues.push(ValidationIssue::new(
            field,
            "too_many",
            format!("{field} must contain at most {max} items"),
        ));
    }
}

pub fn to_payload(issues: &[ValidationIssue]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for issue in issues {
        map.insert(
            issue.field.clone(),
            serde_json::json!({ "code": issue.code, "message": issue.message }),
        );
    }
    serde_json::json!({ "validation": serde_json::Value::Object(map) })
}
