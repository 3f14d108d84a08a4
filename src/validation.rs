use axum::extract::rejection::JsonRejection;
use axum::Json;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::response::ApiResponse;

/// Unwraps a JSON body, converting framework rejections into the envelope.
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiResponse> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ApiResponse::bad_request().with_error(rejection.body_text())),
    }
}

/// String field out of a validated body; absent fields read as empty.
pub fn str_field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// A file lifted out of a multipart request body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Extension of the original filename, including the leading dot.
    pub fn extension(&self) -> String {
        match self.name.rfind('.') {
            Some(idx) => self.name[idx..].to_ascii_lowercase(),
            None => String::new(),
        }
    }
}

/// Request-scoped validator. Each checked field appends its failure message;
/// `finish` rejects with the first queued message only. One instance per
/// request; never shared.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds one body field for a chain of checks.
    pub fn body<'a>(&mut self, value: Option<&'a Value>, field: &'a str) -> FieldCheck<'_, 'a> {
        FieldCheck {
            value,
            field,
            errors: &mut self.errors,
        }
    }

    /// Binds one uploaded file for a chain of checks.
    pub fn file<'a>(
        &mut self,
        file: Option<&'a UploadedFile>,
        field: &'a str,
    ) -> FileCheck<'_, 'a> {
        FileCheck {
            file,
            field,
            errors: &mut self.errors,
        }
    }

    /// Responds 400 with the first queued message, or passes through.
    pub fn finish(self) -> Result<(), ApiResponse> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ApiResponse::bad_request().with_error(first)),
            None => Ok(()),
        }
    }
}

pub struct FieldCheck<'v, 'a> {
    value: Option<&'a Value>,
    field: &'a str,
    errors: &'v mut Vec<String>,
}

impl<'v, 'a> FieldCheck<'v, 'a> {
    fn check(self, is_valid: bool, invalid_msg: String) -> Self {
        if !is_valid {
            self.errors.push(invalid_msg);
        }
        self
    }

    fn display(&self) -> String {
        match self.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn len(&self) -> Option<usize> {
        match self.value {
            Some(Value::String(s)) => Some(s.chars().count()),
            Some(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }

    /// Present and non-falsy: missing, null, `""`, `0` and `false` all fail.
    pub fn required(self) -> Self {
        let required = match self.value {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        let msg = format!("{} is required", self.field);
        self.check(required, msg)
    }

    pub fn is_string(self) -> Self {
        let is_string = matches!(self.value, Some(Value::String(_)));
        let msg = format!("{} must be a string", self.field);
        self.check(is_string, msg)
    }

    pub fn is_number(self) -> Self {
        let is_number = matches!(self.value, Some(Value::Number(_)));
        let msg = format!("{} must be a number", self.field);
        self.check(is_number, msg)
    }

    /// Arrays only: fails on empty arrays and on anything that is not an array.
    pub fn not_empty(self) -> Self {
        match self.value {
            Some(Value::Array(items)) => {
                let is_not_empty = !items.is_empty();
                let msg = format!("{} is empty", self.field);
                self.check(is_not_empty, msg)
            }
            _ => {
                let msg = format!("{} is not an array", self.field);
                self.check(false, msg)
            }
        }
    }

    pub fn contains_one(self, allowed_items: &[&str]) -> Self {
        let contains_one = self
            .value
            .and_then(Value::as_str)
            .map(|v| allowed_items.contains(&v))
            .unwrap_or(false);
        let msg = format!("{} is not a valid {} item", self.display(), self.field);
        self.check(contains_one, msg)
    }

    pub fn email(self) -> Self {
        let is_email = self
            .value
            .and_then(Value::as_str)
            .map(|v| EMAIL_RE.is_match(&v.to_lowercase()))
            .unwrap_or(false);
        let msg = format!("{} is not a valid email", self.display());
        self.check(is_email, msg)
    }

    pub fn min_length(self, min_length: usize) -> Self {
        let is_min_length = self.len().map(|l| l >= min_length).unwrap_or(false);
        let msg = format!("{} is less than {} characters", self.field, min_length);
        self.check(is_min_length, msg)
    }

    pub fn max_length(self, max_length: usize) -> Self {
        let is_max_length = self.len().map(|l| max_length > l).unwrap_or(false);
        let msg = format!("{} is greater than {} characters", self.field, max_length);
        self.check(is_max_length, msg)
    }

    /// Passes on either tier: strong needs upper + lower + digit + symbol at
    /// length 8, medium relaxes to length 6 or drops the digit at length 8.
    pub fn strong_pwd(self) -> Self {
        let is_strong_pwd = self
            .value
            .and_then(Value::as_str)
            .map(password_strength_ok)
            .unwrap_or(false);
        let msg = format!("{} provided is weak", self.field);
        self.check(is_strong_pwd, msg)
    }

    pub fn word_count(self, count: usize) -> Self {
        let is_valid_count = self
            .value
            .and_then(Value::as_str)
            .map(|v| v.split(' ').count() == count)
            .unwrap_or(false);
        let msg = format!("{} should contain exactly {} words", self.field, count);
        self.check(is_valid_count, msg)
    }
}

pub struct FileCheck<'v, 'a> {
    file: Option<&'a UploadedFile>,
    field: &'a str,
    errors: &'v mut Vec<String>,
}

impl<'v, 'a> FileCheck<'v, 'a> {
    fn check(self, is_valid: bool, invalid_msg: String) -> Self {
        if !is_valid {
            self.errors.push(invalid_msg);
        }
        self
    }

    pub fn required(self) -> Self {
        let required = self.file.is_some();
        let msg = format!("{} is required", self.field);
        self.check(required, msg)
    }

    /// Ceiling in bytes. Absent files pass; `required` covers presence.
    pub fn file_size(self, file_size: usize) -> Self {
        match self.file {
            Some(file) => {
                let is_valid_file_size = file_size >= file.bytes.len();
                let msg = format!("{} size is greater than {}", self.field, file_size);
                self.check(is_valid_file_size, msg)
            }
            None => self,
        }
    }

    pub fn file_type(self, allowed_types: &[&str]) -> Self {
        match self.file {
            Some(file) => {
                let extension = file.extension();
                let is_valid_file_type = allowed_types.contains(&extension.as_str());
                let msg = format!(
                    "{} is not within the range of valid types: {}",
                    self.field,
                    allowed_types.join(", ")
                );
                self.check(is_valid_file_type, msg)
            }
            None => self,
        }
    }
}

fn password_strength_ok(pwd: &str) -> bool {
    let lower = pwd.chars().any(|c| c.is_ascii_lowercase());
    let upper = pwd.chars().any(|c| c.is_ascii_uppercase());
    let digit = pwd.chars().any(|c| c.is_ascii_digit());
    let symbol = pwd.chars().any(|c| !c.is_ascii_alphanumeric());
    let len = pwd.chars().count();

    let strong = lower && upper && digit && symbol && len >= 8;
    let medium =
        (lower && upper && digit && symbol && len >= 6) || (lower && upper && symbol && len >= 8);
    strong || medium
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first_error(validator: Validator) -> Option<String> {
        match validator.finish() {
            Ok(()) => None,
            Err(response) => response.error,
        }
    }

    #[test]
    fn required_rejects_missing_null_and_empty() {
        for value in [None, Some(json!(null)), Some(json!(""))] {
            let mut validate = Validator::new();
            validate.body(value.as_ref(), "email").required();
            assert_eq!(first_error(validate).as_deref(), Some("email is required"));
        }

        let value = json!("someone@example.com");
        let mut validate = Validator::new();
        validate.body(Some(&value), "email").required();
        assert!(first_error(validate).is_none());
    }

    #[test]
    fn only_the_first_error_is_reported() {
        let email = json!("not-an-email");
        let password = json!("short");
        let mut validate = Validator::new();
        validate.body(Some(&email), "email").required().email();
        validate
            .body(Some(&password), "password")
            .required()
            .min_length(6)
            .strong_pwd();
        assert_eq!(
            first_error(validate).as_deref(),
            Some("not-an-email is not a valid email")
        );
    }

    #[test]
    fn strong_password_accepts_the_strong_tier() {
        let pwd = json!("Abcdef1!");
        let mut validate = Validator::new();
        validate.body(Some(&pwd), "password").strong_pwd();
        assert!(first_error(validate).is_none());
    }

    #[test]
    fn strong_password_rejects_weak_input() {
        let pwd = json!("abcdefgh");
        let mut validate = Validator::new();
        validate.body(Some(&pwd), "password").strong_pwd();
        assert_eq!(
            first_error(validate).as_deref(),
            Some("password provided is weak")
        );
    }

    #[test]
    fn strong_password_accepts_the_medium_tiers() {
        // upper + lower + digit + symbol at length 6
        let pwd = json!("Abc1!x");
        let mut validate = Validator::new();
        validate.body(Some(&pwd), "password").strong_pwd();
        assert!(first_error(validate).is_none());

        // upper + lower + symbol at length 8, no digit
        let pwd = json!("Abcdefg!");
        let mut validate = Validator::new();
        validate.body(Some(&pwd), "password").strong_pwd();
        assert!(first_error(validate).is_none());
    }

    #[test]
    fn length_checks_use_the_field_name() {
        let value = json!("a");
        let mut validate = Validator::new();
        validate.body(Some(&value), "firstname").min_length(2);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("firstname is less than 2 characters")
        );

        let value = json!("abcdef");
        let mut validate = Validator::new();
        validate.body(Some(&value), "bio").max_length(3);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("bio is greater than 3 characters")
        );
    }

    #[test]
    fn not_empty_distinguishes_arrays_from_non_arrays() {
        let empty = json!([]);
        let mut validate = Validator::new();
        validate.body(Some(&empty), "user data").not_empty();
        assert_eq!(first_error(validate).as_deref(), Some("user data is empty"));

        let not_array = json!("x");
        let mut validate = Validator::new();
        validate.body(Some(&not_array), "user data").not_empty();
        assert_eq!(
            first_error(validate).as_deref(),
            Some("user data is not an array")
        );

        let filled = json!(["designer"]);
        let mut validate = Validator::new();
        validate.body(Some(&filled), "user data").not_empty();
        assert!(first_error(validate).is_none());
    }

    #[test]
    fn contains_one_checks_set_membership() {
        let value = json!("expert");
        let mut validate = Validator::new();
        validate
            .body(Some(&value), "user type")
            .contains_one(&["beginner", "intermediate", "advanced"]);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("expert is not a valid user type item")
        );
    }

    #[test]
    fn word_count_matches_exactly() {
        let value = json!("two words");
        let mut validate = Validator::new();
        validate.body(Some(&value), "fullname").word_count(2);
        assert!(first_error(validate).is_none());

        let value = json!("three word name");
        let mut validate = Validator::new();
        validate.body(Some(&value), "fullname").word_count(2);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("fullname should contain exactly 2 words")
        );
    }

    #[test]
    fn file_checks_enforce_size_and_extension() {
        let file = UploadedFile {
            name: "avatar.PNG".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from(vec![0u8; 16]),
        };

        let mut validate = Validator::new();
        validate
            .file(Some(&file), "avatar")
            .required()
            .file_size(1024)
            .file_type(&[".jpg", ".jpeg", ".png", ".webp"]);
        assert!(first_error(validate).is_none());

        let mut validate = Validator::new();
        validate.file(Some(&file), "avatar").file_size(4);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("avatar size is greater than 4")
        );

        let gif = UploadedFile {
            name: "avatar.gif".into(),
            content_type: "image/gif".into(),
            bytes: Bytes::new(),
        };
        let mut validate = Validator::new();
        validate.file(Some(&gif), "avatar").file_type(&[".jpg", ".png"]);
        assert_eq!(
            first_error(validate).as_deref(),
            Some("avatar is not within the range of valid types: .jpg, .png")
        );

        let mut validate = Validator::new();
        validate.file(None, "avatar").required();
        assert_eq!(first_error(validate).as_deref(), Some("avatar is required"));
    }
}
