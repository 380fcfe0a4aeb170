//! Validation and sanitization of raw task input.
//!
//! Everything here is pure: the only outside fact a rule needs is "today",
//! which [`validate`] reads from the local clock and [`validate_on`] takes as
//! an argument.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::task::{Priority, TaskFields};

pub const TITLE_MAX: usize = 120;
pub const DESCRIPTION_MAX: usize = 1000;

/// Task fields exactly as they arrive from a form or a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
}

/// The sanitized but not yet accepted values, kept for redisplay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
}

pub fn sanitize_text(raw: Option<&str>, max_len: usize) -> String {
    raw.unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_control())
        .take(max_len)
        .collect()
}

/// Accepts `YYYY-MM-DD` naming a real calendar day.
pub fn is_valid_date(text: &str) -> bool {
    parse_date(text).is_some()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Task ids are UUIDs; anything else cannot name a record.
pub fn is_valid_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

pub fn validate(raw: &RawTaskInput) -> Result<TaskFields, ValidationError> {
    validate_on(raw, Local::now().date_naive())
}

pub fn validate_on(raw: &RawTaskInput, today: NaiveDate) -> Result<TaskFields, ValidationError> {
    let mut errors = Vec::new();

    let title = sanitize_text(raw.title.as_deref(), TITLE_MAX);
    let description = sanitize_text(raw.description.as_deref(), DESCRIPTION_MAX);
    let due_date = raw.due_date.as_deref().unwrap_or_default().trim().to_string();
    // absent and empty both mean "not chosen"; anything else must match
    let priority = match raw.priority.as_deref() {
        None | Some("") => Priority::Low.as_str().to_string(),
        Some(p) => p.trim().to_lowercase(),
    };

    if title.is_empty() {
        errors.push("Title is required".to_string());
    }
    if title.chars().count() > TITLE_MAX {
        errors.push(format!("Title must be {TITLE_MAX} characters or fewer"));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        errors.push(format!(
            "Description must be {DESCRIPTION_MAX} characters or fewer"
        ));
    }

    let mut due = None;
    if !due_date.is_empty() {
        match parse_date(&due_date) {
            None => errors.push("Due date must be a valid date in format YYYY-MM-DD".to_string()),
            Some(d) if d < today => errors.push("Due date cannot be in the past".to_string()),
            Some(d) => due = Some(d),
        }
    }

    let parsed_priority = priority.parse::<Priority>().ok();
    if parsed_priority.is_none() {
        errors.push("Priority must be low, medium, or high".to_string());
    }

    match parsed_priority {
        Some(priority) if errors.is_empty() => Ok(TaskFields {
            title,
            description,
            due_date: due,
            priority,
        }),
        _ => Err(ValidationError {
            errors,
            values: TaskDraft {
                title,
                description,
                due_date,
                priority,
            },
        }),
    }
}
