//! Data models
//!
//! Database entities (Topic, Redactor, Newspaper, Session) and the
//! pagination types shared by list queries.

mod newspaper;
mod pagination;
mod redactor;
mod session;
mod topic;

pub use newspaper::{Newspaper, NewspaperDetail, NewspaperInput, NewspaperWithTopic, TITLE_MAX_LEN};
pub use pagination::{ListParams, PagedResult, MAX_PER_PAGE};
pub use redactor::{
    Redactor, RedactorDetail, RedactorFlags, RedactorProfile, PERSON_NAME_MAX_LEN, USERNAME_MAX_LEN,
};
pub use session::Session;
pub use topic::{Topic, TopicWithCount, TOPIC_NAME_MAX_LEN};
