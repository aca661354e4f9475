//! Redactor forms: registration, profile update and the staff-only
//! administrative change form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{check_text, FormData, FormErrors, FormFields, MSG_REQUIRED};
use crate::models::{Redactor, RedactorFlags, RedactorProfile, PERSON_NAME_MAX_LEN, USERNAME_MAX_LEN};
use crate::services::password::validate_password_strength;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid")
});

const MSG_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const MSG_PASSWORD_MISMATCH: &str = "The two password fields didn\u{2019}t match.";

/// Fields shared by every redactor form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct ProfileFields {
    username: String,
    first_name: String,
    last_name: String,
    years_of_experience: String,
}

impl ProfileFields {
    fn from_instance(redactor: &Redactor) -> Self {
        Self {
            username: redactor.username.clone(),
            first_name: redactor.first_name.clone(),
            last_name: redactor.last_name.clone(),
            years_of_experience: redactor.years_of_experience.to_string(),
        }
    }

    fn bind(&mut self, data: &FormData) {
        data.bind_text("username", &mut self.username);
        data.bind_text("first_name", &mut self.first_name);
        data.bind_text("last_name", &mut self.last_name);
        data.bind_text("years_of_experience", &mut self.years_of_experience);
    }

    fn validate(&self, errors: &mut FormErrors) -> RedactorProfile {
        check_text(errors, "username", &self.username, true, USERNAME_MAX_LEN);
        if !self.username.is_empty() && !USERNAME_RE.is_match(&self.username) {
            errors.add("username", MSG_USERNAME);
        }
        check_text(errors, "first_name", &self.first_name, false, PERSON_NAME_MAX_LEN);
        check_text(errors, "last_name", &self.last_name, false, PERSON_NAME_MAX_LEN);

        RedactorProfile {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            years_of_experience: parse_experience(errors, &self.years_of_experience),
        }
    }
}

fn parse_experience(errors: &mut FormErrors, raw: &str) -> u32 {
    if raw.is_empty() {
        errors.add("years_of_experience", MSG_REQUIRED);
        return 0;
    }
    match raw.parse::<i64>() {
        Err(_) => {
            errors.add("years_of_experience", "Enter a whole number.");
            0
        }
        Ok(years) if years < 0 => {
            errors.add(
                "years_of_experience",
                "Ensure this value is greater than or equal to 0.",
            );
            0
        }
        Ok(years) => u32::try_from(years).unwrap_or_else(|_| {
            errors.add(
                "years_of_experience",
                format!("Ensure this value is less than or equal to {}.", u32::MAX),
            );
            0
        }),
    }
}

/// Validated registration data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactorRegistration {
    pub profile: RedactorProfile,
    pub password: String,
}

/// Registration form: profile fields plus a confirmed password.
///
/// Passwords are never echoed back in responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactorCreationForm {
    #[serde(flatten)]
    fields: ProfileFields,
    #[serde(skip)]
    password1: String,
    #[serde(skip)]
    password2: String,
}

impl FormFields for RedactorCreationForm {
    const FIELDS: &'static [&'static str] = &[
        "username",
        "password1",
        "password2",
        "first_name",
        "last_name",
        "years_of_experience",
    ];
}

impl RedactorCreationForm {
    pub fn bind(mut self, data: &FormData) -> Self {
        self.fields.bind(data);
        // Passwords keep surrounding whitespace
        if let Some(value) = data.value("password1") {
            self.password1 = value.to_string();
        }
        if let Some(value) = data.value("password2") {
            self.password2 = value.to_string();
        }
        self
    }

    pub fn username(&self) -> &str {
        &self.fields.username
    }

    pub fn validate(&self) -> Result<RedactorRegistration, FormErrors> {
        let mut errors = FormErrors::new();
        let profile = self.fields.validate(&mut errors);

        if self.password1.is_empty() {
            errors.add("password1", MSG_REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", MSG_REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", MSG_PASSWORD_MISMATCH);
            } else {
                for problem in validate_password_strength(&self.password2, &profile.username) {
                    errors.add("password2", problem);
                }
            }
        }

        errors.into_result(RedactorRegistration {
            profile,
            password: self.password1.clone(),
        })
    }
}

/// Profile update form used by redactors themselves. Never touches the password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactorInfoForm {
    #[serde(flatten)]
    fields: ProfileFields,
}

impl FormFields for RedactorInfoForm {
    const FIELDS: &'static [&'static str] =
        &["username", "first_name", "last_name", "years_of_experience"];
}

impl RedactorInfoForm {
    pub fn from_instance(redactor: &Redactor) -> Self {
        Self {
            fields: ProfileFields::from_instance(redactor),
        }
    }

    pub fn bind(mut self, data: &FormData) -> Self {
        self.fields.bind(data);
        self
    }

    pub fn validate(&self) -> Result<RedactorProfile, FormErrors> {
        let mut errors = FormErrors::new();
        let profile = self.fields.validate(&mut errors);
        errors.into_result(profile)
    }
}

/// Administrative change form: profile fields plus staff flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminRedactorForm {
    #[serde(flatten)]
    fields: ProfileFields,
    is_staff: bool,
    is_superuser: bool,
}

impl FormFields for AdminRedactorForm {
    const FIELDS: &'static [&'static str] = &[
        "username",
        "first_name",
        "last_name",
        "years_of_experience",
        "is_staff",
        "is_superuser",
    ];
}

impl AdminRedactorForm {
    pub fn from_instance(redactor: &Redactor) -> Self {
        Self {
            fields: ProfileFields::from_instance(redactor),
            is_staff: redactor.is_staff,
            is_superuser: redactor.is_superuser,
        }
    }

    pub fn bind(mut self, data: &FormData) -> Self {
        self.fields.bind(data);
        if let Some(value) = data.value("is_staff") {
            self.is_staff = parse_checkbox(value);
        }
        if let Some(value) = data.value("is_superuser") {
            self.is_superuser = parse_checkbox(value);
        }
        self
    }

    pub fn validate(&self) -> Result<(RedactorProfile, RedactorFlags), FormErrors> {
        let mut errors = FormErrors::new();
        let profile = self.fields.validate(&mut errors);
        let flags = RedactorFlags {
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        };
        errors.into_result((profile, flags))
    }
}

fn parse_checkbox(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&'static str, &'static str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    fn registration() -> Vec<(&'static str, &'static str)> {
        vec![
            ("username", "jdoe"),
            ("password1", "Sturdy-pass-42"),
            ("password2", "Sturdy-pass-42"),
            ("first_name", "John"),
            ("last_name", "Doe"),
            ("years_of_experience", "5"),
        ]
    }

    fn sample_redactor() -> Redactor {
        let mut redactor = Redactor::new("jdoe", "hash", "John", "Doe", 5);
        redactor.id = 1;
        redactor
    }

    #[test]
    fn test_valid_registration() {
        let form = RedactorCreationForm::default().bind(&data(&registration()));
        let valid = form.validate().unwrap();
        assert_eq!(valid.profile.username, "jdoe");
        assert_eq!(valid.profile.years_of_experience, 5);
        assert_eq!(valid.password, "Sturdy-pass-42");
    }

    #[test]
    fn test_password_mismatch() {
        let mut pairs = registration();
        pairs[2] = ("password2", "Other-pass-42");
        let errors = RedactorCreationForm::default().bind(&data(&pairs)).validate().unwrap_err();
        assert_eq!(errors.get("password2"), [MSG_PASSWORD_MISMATCH]);
    }

    #[test]
    fn test_weak_password() {
        let mut pairs = registration();
        pairs[1] = ("password1", "123");
        pairs[2] = ("password2", "123");
        let errors = RedactorCreationForm::default().bind(&data(&pairs)).validate().unwrap_err();
        assert_eq!(errors.get("password2").len(), 2);
    }

    #[test]
    fn test_passwords_not_serialized() {
        let form = RedactorCreationForm::default().bind(&data(&registration()));
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["username"], "jdoe");
        assert!(value.get("password1").is_none());
        assert!(value.get("password2").is_none());
    }

    #[test]
    fn test_invalid_username_and_experience() {
        let mut pairs = registration();
        pairs[0] = ("username", "john doe!");
        pairs[5] = ("years_of_experience", "-1");
        let errors = RedactorCreationForm::default().bind(&data(&pairs)).validate().unwrap_err();
        assert_eq!(errors.get("username"), [MSG_USERNAME]);
        assert!(errors.contains("years_of_experience"));

        pairs[5] = ("years_of_experience", "five");
        let errors = RedactorCreationForm::default().bind(&data(&pairs)).validate().unwrap_err();
        assert_eq!(errors.get("years_of_experience"), ["Enter a whole number."]);
    }

    #[test]
    fn test_info_form_username_only_patch() {
        let form = RedactorInfoForm::from_instance(&sample_redactor()).bind(&data(&[("username", "jdoe2")]));
        let profile = form.validate().unwrap();
        assert_eq!(profile.username, "jdoe2");
        assert_eq!(profile.first_name, "John");
        assert_eq!(profile.years_of_experience, 5);
    }

    #[test]
    fn test_admin_form_flags() {
        let form = AdminRedactorForm::from_instance(&sample_redactor())
            .bind(&data(&[("is_staff", "on"), ("years_of_experience", "9")]));
        let (profile, flags) = form.validate().unwrap();
        assert_eq!(profile.years_of_experience, 9);
        assert!(flags.is_staff);
        assert!(!flags.is_superuser);

        let form = AdminRedactorForm::from_instance(&sample_redactor()).bind(&data(&[]));
        assert_eq!(form.validate().unwrap().1, RedactorFlags::default());
    }
}
