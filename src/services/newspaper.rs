//! Newspaper service
//!
//! Validates newspaper forms against the store (the topic and every credited
//! redactor must exist) and stamps the published date on creation.

use crate::db::repositories::{NewspaperFilter, NewspaperRepository, RedactorRepository, TopicRepository};
use crate::forms::{Choice, FormErrors, NewspaperForm, MSG_INVALID_CHOICE};
use crate::models::{ListParams, Newspaper, NewspaperDetail, NewspaperInput, PagedResult, NewspaperWithTopic};
use anyhow::Context;
use chrono::{SubsecRound, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::{ServiceError, ServiceResult};

const ENTITY: &str = "Newspaper";

/// Options offered by the `topic` and `redactors` fields
#[derive(Debug, Clone, Serialize)]
pub struct NewspaperChoices {
    pub topic: Vec<Choice>,
    pub redactors: Vec<Choice>,
}

/// Newspaper service
pub struct NewspaperService {
    repo: Arc<dyn NewspaperRepository>,
    topics: Arc<dyn TopicRepository>,
    redactors: Arc<dyn RedactorRepository>,
}

impl NewspaperService {
    pub fn new(
        repo: Arc<dyn NewspaperRepository>,
        topics: Arc<dyn TopicRepository>,
        redactors: Arc<dyn RedactorRepository>,
    ) -> Self {
        Self {
            repo,
            topics,
            redactors,
        }
    }

    /// One page of newspapers, newest first
    pub async fn list(
        &self,
        filter: NewspaperFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<NewspaperWithTopic>> {
        let total = self.repo.count(&filter).await.context("Failed to count newspapers")?;
        let items = self
            .repo
            .list(&filter, params.offset(), params.limit())
            .await
            .context("Failed to list newspapers")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<NewspaperWithTopic> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get newspaper")?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// Newspaper with its topic and credited redactors
    pub async fn detail(&self, id: i64) -> ServiceResult<NewspaperDetail> {
        let NewspaperWithTopic { newspaper, topic } = self.get(id).await?;
        let redactors = self
            .repo
            .list_redactors(id)
            .await
            .context("Failed to list newspaper redactors")?;
        Ok(NewspaperDetail {
            newspaper,
            topic,
            redactors,
        })
    }

    /// Form initialized from an existing newspaper
    pub async fn edit_form(&self, id: i64) -> ServiceResult<NewspaperForm> {
        let newspaper = self.get(id).await?;
        let redactor_ids = self
            .repo
            .redactor_ids(id)
            .await
            .context("Failed to get newspaper redactors")?;
        Ok(NewspaperForm::from_instance(&newspaper, &redactor_ids))
    }

    pub async fn choices(&self) -> ServiceResult<NewspaperChoices> {
        let topics = self.topics.list_all().await.context("Failed to list topics")?;
        let redactors = self
            .redactors
            .list_all()
            .await
            .context("Failed to list redactors")?;
        Ok(NewspaperChoices {
            topic: topics.iter().map(|t| Choice::new(t.id, t)).collect(),
            redactors: redactors.iter().map(|r| Choice::new(r.id, r)).collect(),
        })
    }

    pub async fn create(&self, form: &NewspaperForm) -> ServiceResult<Newspaper> {
        let input = self.validate(form).await?;
        // Stored timestamps keep microseconds on both drivers
        let published_date = Utc::now().trunc_subsecs(6);
        let newspaper = self
            .repo
            .create(&input, published_date)
            .await
            .context("Failed to create newspaper")?;
        tracing::info!(newspaper_id = newspaper.id, "Newspaper created");
        Ok(newspaper)
    }

    pub async fn update(&self, id: i64, form: &NewspaperForm) -> ServiceResult<Newspaper> {
        self.get(id).await?;
        let input = self.validate(form).await?;
        self.repo
            .update(id, &input)
            .await
            .context("Failed to update newspaper")?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await.context("Failed to delete newspaper")? {
            return Err(ServiceError::not_found(ENTITY, id));
        }
        tracing::info!(newspaper_id = id, "Newspaper deleted");
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self
            .repo
            .count(&NewspaperFilter::default())
            .await
            .context("Failed to count newspapers")?)
    }

    /// Form validation plus existence checks for the referenced records
    async fn validate(&self, form: &NewspaperForm) -> ServiceResult<NewspaperInput> {
        let input = form.validate()?;
        let mut errors = FormErrors::new();

        let topic = self
            .topics
            .get_by_id(input.topic_id)
            .await
            .context("Failed to get topic")?;
        if topic.is_none() {
            errors.add("topic", MSG_INVALID_CHOICE);
        }

        let existing = self
            .redactors
            .existing_ids(&input.redactor_ids)
            .await
            .context("Failed to check redactors")?;
        for id in input.redactor_ids.iter().filter(|id| !existing.contains(*id)) {
            errors.add(
                "redactors",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    id
                ),
            );
        }

        Ok(errors.into_result(input)?)
    }
}
