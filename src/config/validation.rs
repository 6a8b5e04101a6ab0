use std::error::Error;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// License keys are 40 characters; newer keys end in `NRAL` but stay alphanumeric.
    static ref LICENSE_KEY_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9]{40}$").expect("license key pattern is valid");
}

/// Most application names the agent accepts in one `;`-separated list.
pub const MAX_APP_NAMES: usize = 3;

/// Severity level for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    /// Accepted, but likely not what the caller meant
    Warning,
    /// The agent would reject the value
    Error,
    /// The configuration cannot be interpreted at all
    Critical,
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationSeverity::Warning => write!(f, "WARNING"),
            ValidationSeverity::Error => write!(f, "ERROR"),
            ValidationSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug)]
pub enum ValidationErrorKind {
    /// Rule validation failure with severity level
    RuleFailed(String, ValidationSeverity),
    /// (message, expected_type)
    TypeMismatch(String, String),
    MissingField(String),
    AggregateError(Vec<ValidationError>),
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::RuleFailed(msg, severity) => {
                write!(f, "[{}] Validation rule failed: {}", severity, msg)
            }
            ValidationErrorKind::TypeMismatch(msg, expected) => {
                write!(f, "Type mismatch: {} (Expected: {})", msg, expected)
            }
            ValidationErrorKind::MissingField(field) => write!(f, "Missing field: {}", field),
            ValidationErrorKind::AggregateError(errors) => {
                write!(f, "{} validation errors occurred", errors.len())?;
                for error in errors {
                    write!(f, "; {}", error)?;
                }
                Ok(())
            }
        }
    }
}

/// Validation error with the path of the offending field
#[derive(Debug)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, path: impl Into<String>) -> Self {
        ValidationError { kind, path: path.into() }
    }

    pub fn severity(&self) -> ValidationSeverity {
        match &self.kind {
            ValidationErrorKind::RuleFailed(_, severity) => *severity,
            ValidationErrorKind::TypeMismatch(_, _) => ValidationSeverity::Error,
            ValidationErrorKind::MissingField(_) => ValidationSeverity::Critical,
            ValidationErrorKind::AggregateError(errors) => errors
                .iter()
                .map(|e| e.severity())
                .max()
                .unwrap_or(ValidationSeverity::Error),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity() == ValidationSeverity::Critical
    }

    /// Paths of every leaf error, in rule order.
    pub fn paths(&self) -> Vec<&str> {
        match &self.kind {
            ValidationErrorKind::AggregateError(errors) => {
                errors.iter().flat_map(|e| e.paths()).collect()
            }
            _ => vec![self.path.as_str()],
        }
    }

    /// One line per leaf error, indented by nesting depth.
    pub fn detailed_report(&self) -> String {
        let mut report = String::new();
        self.write_report(&mut report, 0);
        report
    }

    fn write_report(&self, report: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match &self.kind {
            ValidationErrorKind::AggregateError(errors) => {
                report.push_str(&format!("{}At path '{}':\n", indent, self.path));
                for error in errors {
                    error.write_report(report, depth + 1);
                }
            }
            kind => report.push_str(&format!("{}At path '{}': {}\n", indent, self.path, kind)),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] At path '{}': {}", self.severity(), self.path, self.kind)
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Validation rule over one field of a JSON object
pub trait ValidationRule: Send + Sync {
    fn validate(&self, value: &Value, path: &str) -> ValidationResult;
    fn description(&self) -> String;
}

fn string_field<'v>(value: &'v Value, field_name: &str, path: &str) -> Result<&'v str, ValidationError> {
    let field_path = format!("{}.{}", path, field_name);
    match value.get(field_name) {
        None | Some(Value::Null) => Err(ValidationError::new(
            ValidationErrorKind::MissingField(field_name.to_string()),
            field_path,
        )),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::new(
            ValidationErrorKind::TypeMismatch(
                format!("{} must be a string", field_name),
                "string".to_string(),
            ),
            field_path,
        )),
    }
}

/// Pattern validation rule for string fields
pub struct PatternRule {
    pattern: Regex,
    field_name: String,
}

impl PatternRule {
    pub fn new(pattern: Regex, field_name: &str) -> Self {
        PatternRule { pattern, field_name: field_name.to_string() }
    }
}

impl ValidationRule for PatternRule {
    fn validate(&self, value: &Value, path: &str) -> ValidationResult {
        let str_value = string_field(value, &self.field_name, path)?;
        if self.pattern.is_match(str_value) {
            Ok(())
        } else {
            // The value itself may be a secret, so only the pattern is reported.
            Err(ValidationError::new(
                ValidationErrorKind::RuleFailed(
                    format!(
                        "{} does not match the required pattern: {}",
                        self.field_name,
                        self.pattern.as_str()
                    ),
                    ValidationSeverity::Error,
                ),
                format!("{}.{}", path, self.field_name),
            ))
        }
    }

    fn description(&self) -> String {
        format!("{} must match pattern: {}", self.field_name, self.pattern.as_str())
    }
}

/// Non-empty string validation rule
pub struct NonEmptyRule {
    field_name: String,
}

impl NonEmptyRule {
    pub fn new(field_name: &str) -> Self {
        NonEmptyRule { field_name: field_name.to_string() }
    }
}

impl ValidationRule for NonEmptyRule {
    fn validate(&self, value: &Value, path: &str) -> ValidationResult {
        let str_value = string_field(value, &self.field_name, path)?;
        if str_value.trim().is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::RuleFailed(
                    format!("{} cannot be empty", self.field_name),
                    ValidationSeverity::Error,
                ),
                format!("{}.{}", path, self.field_name),
            ));
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("{} must not be empty", self.field_name)
    }
}

/// Application name rule: up to [`MAX_APP_NAMES`] non-empty names separated by `;`.
///
/// Data is reported under the first name and rolled up under the others.
pub struct AppNameRule {
    max_names: usize,
}

impl AppNameRule {
    pub fn new() -> Self {
        AppNameRule { max_names: MAX_APP_NAMES }
    }

    pub fn with_max_names(mut self, max_names: usize) -> Self {
        self.max_names = max_names;
        self
    }
}

impl Default for AppNameRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationRule for AppNameRule {
    fn validate(&self, value: &Value, path: &str) -> ValidationResult {
        let app_name = string_field(value, "app_name", path)?;
        let field_path = format!("{}.app_name", path);
        let names: Vec<&str> = app_name.split(';').collect();

        if names.len() > self.max_names {
            return Err(ValidationError::new(
                ValidationErrorKind::RuleFailed(
                    format!("app_name lists {} names, at most {} allowed", names.len(), self.max_names),
                    ValidationSeverity::Error,
                ),
                field_path,
            ));
        }
        if names.len() > 1 && names.iter().any(|n| n.trim().is_empty()) {
            return Err(ValidationError::new(
                ValidationErrorKind::RuleFailed(
                    "app_name contains an empty name between ';' separators".to_string(),
                    ValidationSeverity::Warning,
                ),
                field_path,
            ));
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("app_name must list at most {} ';'-separated names", self.max_names)
    }
}

/// Runs a set of rules and aggregates their failures
pub struct Validator {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Validator { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.description()).collect()
    }

    /// Fails when any rule reports [`ValidationSeverity::Error`] or worse.
    /// Warnings alone are logged and the value is accepted.
    pub fn validate(&self, value: &Value, path: &str) -> ValidationResult {
        let errors: Vec<ValidationError> = self
            .rules
            .iter()
            .filter_map(|rule| rule.validate(value, path).err())
            .collect();

        if errors.iter().all(|e| e.severity() == ValidationSeverity::Warning) {
            for warning in &errors {
                log::warn!("newrelic: configuration accepted with warning: {}", warning);
            }
            return Ok(());
        }
        Err(ValidationError::new(ValidationErrorKind::AggregateError(errors), path))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rules applied to an agent configuration before initialization.
pub fn agent_config_validator() -> Validator {
    let mut validator = Validator::new();
    validator.add_rule(Arc::new(PatternRule::new(LICENSE_KEY_PATTERN.clone(), "license_key")));
    validator.add_rule(Arc::new(NonEmptyRule::new("app_name")));
    validator.add_rule(Arc::new(AppNameRule::new()));
    validator.add_rule(Arc::new(NonEmptyRule::new("language")));
    validator.add_rule(Arc::new(NonEmptyRule::new("language_version")));
    validator
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LICENSE: &str = "0123456789abcdef0123456789abcdef01234567";

    fn valid() -> Value {
        json!({
            "license_key": LICENSE,
            "app_name": "checkout",
            "language": "Rust",
            "language_version": "1.70",
        })
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(agent_config_validator().validate(&valid(), "config").is_ok());
    }

    #[test]
    fn test_short_license_key_rejected() {
        let mut value = valid();
        value["license_key"] = json!("abc");
        let err = agent_config_validator().validate(&value, "config").unwrap_err();
        assert_eq!(err.paths(), vec!["config.license_key"]);
        assert_eq!(err.severity(), ValidationSeverity::Error);
        assert!(!err.to_string().contains("abc"));
    }

    #[test]
    fn test_missing_field_is_critical() {
        let mut value = valid();
        value.as_object_mut().unwrap().remove("language");
        let err = agent_config_validator().validate(&value, "config").unwrap_err();
        assert!(err.is_critical());
        assert_eq!(err.paths(), vec!["config.language"]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut value = valid();
        value["app_name"] = json!(42);
        let err = agent_config_validator().validate(&value, "config").unwrap_err();
        // both app_name rules report the mismatch
        assert_eq!(err.paths(), vec!["config.app_name", "config.app_name"]);
        assert!(err.detailed_report().contains("Type mismatch"));
    }

    #[test]
    fn test_app_name_lists() {
        let rule = AppNameRule::new();
        let ok = json!({ "app_name": "checkout;shop;all" });
        assert!(rule.validate(&ok, "config").is_ok());

        let too_many = json!({ "app_name": "a;b;c;d" });
        assert!(rule.validate(&too_many, "config").is_err());

        let gap = json!({ "app_name": "a;;b" });
        let err = rule.validate(&gap, "config").unwrap_err();
        assert_eq!(err.severity(), ValidationSeverity::Warning);

        let relaxed = AppNameRule::new().with_max_names(5);
        assert!(relaxed.validate(&too_many, "config").is_ok());
    }

    #[test]
    fn test_warnings_alone_pass_validation() {
        let mut value = valid();
        value["app_name"] = json!("checkout;;all");
        assert!(agent_config_validator().validate(&value, "config").is_ok());

        value["license_key"] = json!("short");
        let err = agent_config_validator().validate(&value, "config").unwrap_err();
        // the warning still travels with the failure
        assert_eq!(err.paths(), vec!["config.license_key", "config.app_name"]);
        assert_eq!(err.severity(), ValidationSeverity::Error);
    }

    #[test]
    fn test_aggregates_every_failure() {
        let value = json!({
            "license_key": "",
            "app_name": " ",
            "language": "",
            "language_version": "",
        });
        let err = agent_config_validator().validate(&value, "config").unwrap_err();
        assert_eq!(err.paths().len(), 4);
        assert_eq!(err.detailed_report().lines().count(), 5);
    }

    #[test]
    fn test_descriptions() {
        let descriptions = agent_config_validator().descriptions();
        assert_eq!(descriptions.len(), 5);
        assert!(descriptions[0].starts_with("license_key must match pattern"));
    }
}
