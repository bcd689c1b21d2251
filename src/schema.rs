//! Per-kind schema checks for step properties.
//!
//! Findings are keyed by the wire name of the offending property
//! (`dueHours`, `webhookUrl`) so editors can attach them to the matching
//! input. Email checks test shape only: one `@`, non-empty local part,
//! a dotted domain, no whitespace. Deliverability is the mail system's
//! problem.

use url::Url;

use crate::types::{
    ApprovalProperties, AutomationProperties, Channel, ConditionProperties, ErrorHandling,
    NotificationProperties, Step, StepProperties, TaskProperties, ValidationError,
};

/// Bounds for task and approval deadlines, in hours (one hour to one year).
pub const MIN_DUE_HOURS: u32 = 1;
pub const MAX_DUE_HOURS: u32 = 8760;

/// Bounds for automation execution budgets, in seconds.
pub const MIN_TIMEOUT_SECONDS: u32 = 1;
pub const MAX_TIMEOUT_SECONDS: u32 = 3600;

/// Bounds for automation retry counts.
pub const MIN_RETRY_ATTEMPTS: u32 = 1;
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Check one step against the schema of its kind. Returns every finding
/// at once; an empty result means the step is activation-ready.
#[must_use]
pub fn validate_step(step: &Step) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if step.name().trim().is_empty() {
        errors.push(ValidationError::new("name", "step name must not be empty"));
    }
    match step.properties() {
        StepProperties::Task(props) => validate_task(props, &mut errors),
        StepProperties::Approval(props) => validate_approval(props, &mut errors),
        StepProperties::Notification(props) => validate_notification(props, &mut errors),
        StepProperties::Condition(props) => validate_condition_step(props, &mut errors),
        StepProperties::Automation(props) => validate_automation(props, &mut errors),
    }
    errors
}

fn validate_task(props: &TaskProperties, errors: &mut Vec<ValidationError>) {
    match props.due_hours {
        None => errors.push(ValidationError::new(
            "dueHours",
            "dueHours is required for task steps",
        )),
        Some(hours) => check_due_hours(hours, errors),
    }
    if let Some(assignee) = &props.assignee {
        if !looks_like_email(assignee) {
            errors.push(ValidationError::new(
                "assignee",
                format!("'{assignee}' is not a valid email address"),
            ));
        }
    }
}

fn validate_approval(props: &ApprovalProperties, errors: &mut Vec<ValidationError>) {
    if props.approvers.is_empty() {
        errors.push(ValidationError::new(
            "approvers",
            "at least one approver is required",
        ));
    }
    for approver in &props.approvers {
        if !looks_like_email(approver) {
            errors.push(ValidationError::new(
                "approvers",
                format!("'{approver}' is not a valid email address"),
            ));
        }
    }
    if let Some(hours) = props.due_hours {
        check_due_hours(hours, errors);
    }
}

fn validate_notification(props: &NotificationProperties, errors: &mut Vec<ValidationError>) {
    if props.recipients.is_empty() {
        errors.push(ValidationError::new(
            "recipients",
            "at least one recipient is required",
        ));
    }
    if props.template.trim().is_empty() {
        errors.push(ValidationError::new("template", "template must not be empty"));
    }
    match props.channel {
        Channel::Email => {
            let blank = props.subject.as_deref().map_or(true, |s| s.trim().is_empty());
            if blank {
                errors.push(ValidationError::warning(
                    "subject",
                    "subject is recommended for email notifications",
                ));
            }
        }
        Channel::Webhook => match props.webhook_url.as_deref() {
            None => errors.push(ValidationError::new(
                "webhookUrl",
                "webhookUrl is required for the webhook channel",
            )),
            Some(raw) => {
                if !is_http_url(raw) {
                    errors.push(ValidationError::new(
                        "webhookUrl",
                        format!("'{raw}' is not a valid http or https URL"),
                    ));
                }
            }
        },
        Channel::Sms | Channel::InApp => {}
    }
}

fn validate_condition_step(props: &ConditionProperties, errors: &mut Vec<ValidationError>) {
    if props.condition.is_empty() {
        errors.push(ValidationError::new(
            "condition",
            "at least one rule is required",
        ));
    } else {
        errors.extend(props.condition.validate());
    }
}

fn validate_automation(props: &AutomationProperties, errors: &mut Vec<ValidationError>) {
    if props.script.trim().is_empty() {
        errors.push(ValidationError::new("script", "script must not be empty"));
    }
    if let Some(seconds) = props.timeout_seconds {
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
            errors.push(ValidationError::new(
                "timeout",
                format!(
                    "timeout must be between {MIN_TIMEOUT_SECONDS} and {MAX_TIMEOUT_SECONDS} seconds, got {seconds}"
                ),
            ));
        }
    }
    match props.retry_attempts {
        None => {
            if props.error_handling == ErrorHandling::Retry {
                errors.push(ValidationError::new(
                    "retryAttempts",
                    "retryAttempts is required when errorHandling is retry",
                ));
            }
        }
        Some(attempts) => {
            if !(MIN_RETRY_ATTEMPTS..=MAX_RETRY_ATTEMPTS).contains(&attempts) {
                errors.push(ValidationError::new(
                    "retryAttempts",
                    format!(
                        "retryAttempts must be between {MIN_RETRY_ATTEMPTS} and {MAX_RETRY_ATTEMPTS}, got {attempts}"
                    ),
                ));
            }
        }
    }
}

fn check_due_hours(hours: u32, errors: &mut Vec<ValidationError>) {
    if !(MIN_DUE_HOURS..=MAX_DUE_HOURS).contains(&hours) {
        errors.push(ValidationError::new(
            "dueHours",
            format!("dueHours must be between {MIN_DUE_HOURS} and {MAX_DUE_HOURS}, got {hours}"),
        ));
    }
}

fn looks_like_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
