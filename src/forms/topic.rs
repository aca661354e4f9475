use serde::Serialize;

use super::{check_text, FormData, FormErrors, FormFields};
use crate::models::{Topic, TOPIC_NAME_MAX_LEN};

/// Topic create/update form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicForm {
    pub name: String,
}

impl FormFields for TopicForm {
    const FIELDS: &'static [&'static str] = &["name"];
}

impl TopicForm {
    pub fn from_instance(topic: &Topic) -> Self {
        Self {
            name: topic.name.clone(),
        }
    }

    pub fn bind(mut self, data: &FormData) -> Self {
        data.bind_text("name", &mut self.name);
        self
    }

    /// The validated topic name
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        check_text(&mut errors, "name", &self.name, true, TOPIC_NAME_MAX_LEN);
        errors.into_result(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::MSG_REQUIRED;

    #[test]
    fn test_bind_and_validate() {
        let data: FormData = [("name", "  Politics ")].into_iter().collect();
        let form = TopicForm::default().bind(&data);
        assert_eq!(form.validate(), Ok("Politics".to_string()));
    }

    #[test]
    fn test_missing_name_is_required() {
        let errors = TopicForm::default().bind(&FormData::default()).validate().unwrap_err();
        assert_eq!(errors.get("name"), [MSG_REQUIRED]);
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let topic = Topic { id: 1, name: "Sports".into() };
        let form = TopicForm::from_instance(&topic).bind(&FormData::default());
        assert_eq!(form.validate(), Ok("Sports".to_string()));
    }

    #[test]
    fn test_name_too_long() {
        let long = "n".repeat(TOPIC_NAME_MAX_LEN + 1);
        let data: FormData = [("name", long.as_str())].into_iter().collect();
        assert!(TopicForm::default().bind(&data).validate().unwrap_err().contains("name"));
    }
}
