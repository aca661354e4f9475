//! Topic service
//!
//! Topic CRUD with a restricted delete: a topic that still has newspapers
//! filed under it is never removed.

use crate::db::repositories::{NewspaperRepository, TopicFilter, TopicRepository};
use crate::forms::TopicForm;
use crate::models::{ListParams, PagedResult, Topic, TopicWithCount};
use anyhow::Context;
use std::sync::Arc;

use super::{ServiceError, ServiceResult};

const ENTITY: &str = "Topic";

/// Topic service
pub struct TopicService {
    repo: Arc<dyn TopicRepository>,
    newspapers: Arc<dyn NewspaperRepository>,
}

impl TopicService {
    pub fn new(repo: Arc<dyn TopicRepository>, newspapers: Arc<dyn NewspaperRepository>) -> Self {
        Self { repo, newspapers }
    }

    /// One page of topics whose name contains `name`
    pub async fn list(&self, name: Option<String>, params: &ListParams) -> ServiceResult<PagedResult<Topic>> {
        let filter = TopicFilter { name };
        let total = self.repo.count(&filter).await.context("Failed to count topics")?;
        let items = self
            .repo
            .list(&filter, params.offset(), params.limit())
            .await
            .context("Failed to list topics")?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Every topic, for choice lists
    pub async fn all(&self) -> ServiceResult<Vec<Topic>> {
        Ok(self.repo.list_all().await.context("Failed to list topics")?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Topic> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get topic")?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// Topic with the number of newspapers filed under it
    pub async fn get_with_count(&self, id: i64) -> ServiceResult<TopicWithCount> {
        let topic = self.get(id).await?;
        let newspaper_count = self
            .newspapers
            .count_by_topic(id)
            .await
            .context("Failed to count topic newspapers")?;
        Ok(TopicWithCount {
            topic,
            newspaper_count,
        })
    }

    /// Form initialized from an existing topic
    pub async fn edit_form(&self, id: i64) -> ServiceResult<TopicForm> {
        Ok(TopicForm::from_instance(&self.get(id).await?))
    }

    pub async fn create(&self, form: &TopicForm) -> ServiceResult<Topic> {
        let name = form.validate()?;
        let topic = self.repo.create(&name).await.context("Failed to create topic")?;
        tracing::info!(topic_id = topic.id, "Topic created");
        Ok(topic)
    }

    pub async fn update(&self, id: i64, form: &TopicForm) -> ServiceResult<Topic> {
        let mut topic = self.get(id).await?;
        topic.name = form.validate()?;
        Ok(self.repo.update(&topic).await.context("Failed to update topic")?)
    }

    /// Delete a topic.
    ///
    /// # Errors
    /// - `NotFound` if the topic does not exist
    /// - `Protected` if newspapers are still filed under it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let TopicWithCount {
            topic,
            newspaper_count,
        } = self.get_with_count(id).await?;

        if newspaper_count > 0 {
            return Err(ServiceError::Protected(format!(
                "Cannot delete topic \"{}\": {} newspaper(s) are filed under it",
                topic.name, newspaper_count
            )));
        }

        if !self.repo.delete(id).await.context("Failed to delete topic")? {
            return Err(ServiceError::not_found(ENTITY, id));
        }
        tracing::info!(topic_id = id, "Topic deleted");
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self
            .repo
            .count(&TopicFilter::default())
            .await
            .context("Failed to count topics")?)
    }
}
