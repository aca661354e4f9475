use serde::Serialize;

use super::{FormData, FormErrors, FormFields, MSG_REQUIRED};

/// Login form. The password is never echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

impl FormFields for LoginForm {
    const FIELDS: &'static [&'static str] = &["username", "password"];
}

impl LoginForm {
    pub fn bind(mut self, data: &FormData) -> Self {
        data.bind_text("username", &mut self.username);
        if let Some(value) = data.value("password") {
            self.password = value.to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.username.is_empty() {
            errors.add("username", MSG_REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", MSG_REQUIRED);
        }
        errors.into_result(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form() {
        let data: FormData = [("username", " jdoe "), ("password", " secret ")].into_iter().collect();
        let form = LoginForm::default().bind(&data);
        assert_eq!(form.username, "jdoe");
        assert_eq!(form.password, " secret ");
        assert!(form.validate().is_ok());

        let value = serde_json::to_value(&form).unwrap();
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let errors = LoginForm::default().bind(&FormData::default()).validate().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
    }
}
