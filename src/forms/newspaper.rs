use serde::Serialize;

use super::{
    check_text, parse_id, FormData, FormErrors, FormFields, MSG_INVALID_CHOICE, MSG_REQUIRED,
};
use crate::models::{NewspaperInput, NewspaperWithTopic, TITLE_MAX_LEN};

/// Newspaper create/update form.
///
/// `topic` and `redactors` hold the raw submitted ids; the service checks
/// that they exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewspaperForm {
    pub title: String,
    pub content: String,
    pub topic: String,
    pub redactors: Vec<String>,
}

impl FormFields for NewspaperForm {
    const FIELDS: &'static [&'static str] = &["title", "topic", "content", "redactors"];
}

impl NewspaperForm {
    pub fn from_instance(newspaper: &NewspaperWithTopic, redactor_ids: &[i64]) -> Self {
        Self {
            title: newspaper.newspaper.title.clone(),
            content: newspaper.newspaper.content.clone(),
            topic: newspaper.newspaper.topic_id.to_string(),
            redactors: redactor_ids.iter().map(i64::to_string).collect(),
        }
    }

    pub fn bind(mut self, data: &FormData) -> Self {
        data.bind_text("title", &mut self.title);
        data.bind_text("content", &mut self.content);
        data.bind_text("topic", &mut self.topic);
        if data.contains("redactors") {
            // An empty value clears the selection
            self.redactors = data
                .values("redactors")
                .into_iter()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
        }
        self
    }

    pub fn validate(&self) -> Result<NewspaperInput, FormErrors> {
        let mut errors = FormErrors::new();
        check_text(&mut errors, "title", &self.title, true, TITLE_MAX_LEN);
        if self.content.is_empty() {
            errors.add("content", MSG_REQUIRED);
        }

        let topic_id = if self.topic.is_empty() {
            errors.add("topic", MSG_REQUIRED);
            0
        } else {
            parse_id(&self.topic).unwrap_or_else(|| {
                errors.add("topic", MSG_INVALID_CHOICE);
                0
            })
        };

        let mut redactor_ids = Vec::with_capacity(self.redactors.len());
        for raw in &self.redactors {
            match parse_id(raw) {
                Some(id) if !redactor_ids.contains(&id) => redactor_ids.push(id),
                Some(_) => {}
                None => errors.add("redactors", format!("\u{201c}{}\u{201d} is not a valid value.", raw)),
            }
        }

        errors.into_result(NewspaperInput {
            title: self.title.clone(),
            content: self.content.clone(),
            topic_id,
            redactor_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Newspaper, Topic};
    use chrono::Utc;

    fn data(pairs: &[(&'static str, &'static str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_valid_form() {
        let form = NewspaperForm::default().bind(&data(&[
            ("title", "Election"),
            ("content", "Results"),
            ("topic", "2"),
            ("redactors", "1"),
            ("redactors", "3"),
            ("redactors", "1"),
        ]));
        let input = form.validate().unwrap();
        assert_eq!(input.title, "Election");
        assert_eq!(input.topic_id, 2);
        assert_eq!(input.redactor_ids, vec![1, 3]);
    }

    #[test]
    fn test_required_fields() {
        let errors = NewspaperForm::default().bind(&FormData::default()).validate().unwrap_err();
        assert!(errors.contains("title"));
        assert!(errors.contains("content"));
        assert!(errors.contains("topic"));
        assert!(!errors.contains("redactors"));
    }

    #[test]
    fn test_invalid_ids() {
        let errors = NewspaperForm::default()
            .bind(&data(&[("title", "t"), ("content", "c"), ("topic", "abc"), ("redactors", "x")]))
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("topic"), [MSG_INVALID_CHOICE]);
        assert_eq!(errors.get("redactors").len(), 1);
    }

    #[test]
    fn test_update_patch_semantics() {
        let existing = NewspaperWithTopic {
            newspaper: Newspaper {
                id: 1,
                title: "A".into(),
                content: "Body".into(),
                published_date: Utc::now(),
                topic_id: 4,
            },
            topic: Topic { id: 4, name: "World".into() },
        };

        let form = NewspaperForm::from_instance(&existing, &[7]).bind(&data(&[("title", "B")]));
        let input = form.validate().unwrap();
        assert_eq!(input.title, "B");
        assert_eq!(input.content, "Body");
        assert_eq!(input.topic_id, 4);
        assert_eq!(input.redactor_ids, vec![7]);

        let cleared = NewspaperForm::from_instance(&existing, &[7])
            .bind(&data(&[("redactors", "")]))
            .validate()
            .unwrap();
        assert!(cleared.redactor_ids.is_empty());
    }
}
