use crate::store::StudentFields;
use chrono::Datelike;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub const FIRST_ACADEMIC_YEAR: i32 = 2020;

/// Largest fee amount a form may submit, in whole rupees.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Four ASCII digits between `FIRST_ACADEMIC_YEAR` and next year.
    Year,
    /// Whole rupees in `0..=MAX_AMOUNT`.
    Amount,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

pub const STUDENT_FIELD_RULES: [FieldRule; 8] = [
    FieldRule {
        key: "name",
        label: "Full Name",
        required: true,
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "class",
        label: "Class",
        required: true,
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "section",
        label: "Section",
        required: false,
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "classTeacher",
        label: "Class Teacher",
        required: false,
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "phone",
        label: "Phone Number",
        required: false,
        kind: FieldKind::Text,
    },
    FieldRule {
        key: "year",
        label: "Academic Year",
        required: true,
        kind: FieldKind::Year,
    },
    FieldRule {
        key: "feePaid",
        label: "Fee Paid",
        required: false,
        kind: FieldKind::Amount,
    },
    FieldRule {
        key: "feeBalance",
        label: "Fee Balance",
        required: false,
        kind: FieldKind::Amount,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone)]
enum Checked {
    Text(String),
    Amount(i64),
}

/// Academic years offered by the add/edit forms.
pub fn academic_years(current_year: i32) -> Vec<String> {
    (FIRST_ACADEMIC_YEAR..=current_year + 1)
        .map(|y| y.to_string())
        .collect()
}

pub fn parse_student_fields(params: &Value) -> Result<StudentFields, ValidationError> {
    parse_student_fields_at(params, chrono::Local::now().year())
}

/// Checks every rule and reports all failures at once. The photo columns
/// are left empty for the caller to fill.
pub fn parse_student_fields_at(
    params: &Value,
    current_year: i32,
) -> Result<StudentFields, ValidationError> {
    let mut values: HashMap<&'static str, Checked> = HashMap::new();
    let mut errors: Vec<FieldError> = Vec::new();

    for rule in STUDENT_FIELD_RULES.iter() {
        match check_field(rule, params.get(rule.key), current_year) {
            Ok(v) => {
                values.insert(rule.key, v);
            }
            Err(message) => errors.push(FieldError {
                field: rule.key,
                message,
            }),
        }
    }
    if !errors.is_empty() {
        return Err(ValidationError { errors });
    }

    let text = |key: &str| match values.get(key) {
        Some(Checked::Text(s)) => s.clone(),
        _ => String::new(),
    };
    let amount = |key: &str| match values.get(key) {
        Some(Checked::Amount(n)) => *n,
        _ => 0,
    };

    Ok(StudentFields {
        name: text("name"),
        class: text("class"),
        section: text("section"),
        class_teacher: text("classTeacher"),
        phone: text("phone"),
        year: text("year"),
        fee_paid: amount("feePaid"),
        fee_balance: amount("feeBalance"),
        photo: String::new(),
        photo_key: None,
    })
}

fn check_field(rule: &FieldRule, raw: Option<&Value>, current_year: i32) -> Result<Checked, String> {
    match rule.kind {
        FieldKind::Text => {
            let s = coerce_text(rule, raw)?;
            if rule.required && s.is_empty() {
                return Err(format!("{} is required", rule.label));
            }
            Ok(Checked::Text(s))
        }
        FieldKind::Year => {
            let s = coerce_text(rule, raw)?;
            if s.is_empty() {
                return Err(format!("{} is required", rule.label));
            }
            if s.len() != 4 || !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("{} must be a 4-digit year", rule.label));
            }
            let y: i32 = s
                .parse()
                .map_err(|_| format!("{} must be a 4-digit year", rule.label))?;
            if y < FIRST_ACADEMIC_YEAR || y > current_year + 1 {
                return Err(format!(
                    "{} must be between {} and {}",
                    rule.label,
                    FIRST_ACADEMIC_YEAR,
                    current_year + 1
                ));
            }
            Ok(Checked::Text(s))
        }
        FieldKind::Amount => {
            let n = match raw {
                None | Some(Value::Null) => {
                    if rule.required {
                        return Err(format!("{} is required", rule.label));
                    }
                    0
                }
                Some(Value::Number(n)) => {
                    if let Some(v) = n.as_i64() {
                        v
                    } else {
                        match n.as_f64() {
                            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => f as i64,
                            _ => return Err(format!("{} must be a whole number", rule.label)),
                        }
                    }
                }
                Some(Value::String(s)) if s.trim().is_empty() => 0,
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("{} must be a whole number", rule.label))?,
                Some(_) => return Err(format!("{} must be a whole number", rule.label)),
            };
            if n < 0 {
                return Err(format!("{} must not be negative", rule.label));
            }
            if n > MAX_AMOUNT {
                return Err(format!("{} must not exceed {}", rule.label, MAX_AMOUNT));
            }
            Ok(Checked::Amount(n))
        }
    }
}

fn coerce_text(rule: &FieldRule, raw: Option<&Value>) -> Result<String, String> {
    match raw {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        // Phone numbers and years often arrive as JSON numbers.
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(format!("{} must be text", rule.label)),
    }
}
