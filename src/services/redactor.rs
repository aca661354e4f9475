//! Redactor service
//!
//! Implements business logic for redactor accounts:
//! - registration with unique usernames and hashed passwords
//! - profile updates (never the password) and staff-only flag changes
//! - login/logout backed by server-side sessions
//! - session validation for the auth gate
//! - the bootstrap administrator created at startup

use crate::db::repositories::{NewspaperRepository, RedactorFilter, RedactorRepository, SessionRepository};
use crate::forms::{
    AdminRedactorForm, FormErrors, LoginForm, RedactorCreationForm, RedactorInfoForm, NON_FIELD_ERRORS,
};
use crate::models::{
    ListParams, PagedResult, Redactor, RedactorDetail, RedactorProfile, Session,
};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::{ServiceError, ServiceResult};

/// Default session expiration time in days
pub const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

const ENTITY: &str = "Redactor";
const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";
const MSG_INVALID_LOGIN: &str = "Please enter a correct username and password.";

/// Redactor service
pub struct RedactorService {
    repo: Arc<dyn RedactorRepository>,
    session_repo: Arc<dyn SessionRepository>,
    newspapers: Arc<dyn NewspaperRepository>,
    session_expiration_days: i64,
}

impl RedactorService {
    pub fn new(
        repo: Arc<dyn RedactorRepository>,
        session_repo: Arc<dyn SessionRepository>,
        newspapers: Arc<dyn NewspaperRepository>,
    ) -> Self {
        Self::with_session_expiration(repo, session_repo, newspapers, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new redactor service with custom session expiration
    pub fn with_session_expiration(
        repo: Arc<dyn RedactorRepository>,
        session_repo: Arc<dyn SessionRepository>,
        newspapers: Arc<dyn NewspaperRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            repo,
            session_repo,
            newspapers,
            session_expiration_days,
        }
    }

    /// Session lifetime, used for the cookie `Max-Age`
    pub fn session_lifetime(&self) -> Duration {
        Duration::days(self.session_expiration_days)
    }

    pub async fn list(&self, filter: RedactorFilter, params: &ListParams) -> ServiceResult<PagedResult<Redactor>> {
        let total = self.repo.count(&filter).await.context("Failed to count redactors")?;
        let items = self
            .repo
            .list(&filter, params.offset(), params.limit())
            .await
            .context("Failed to list redactors")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Redactor> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get redactor")?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// Redactor with every newspaper credited to them
    pub async fn detail(&self, id: i64) -> ServiceResult<RedactorDetail> {
        let redactor = self.get(id).await?;
        let newspapers = self
            .newspapers
            .list_by_redactor(id)
            .await
            .context("Failed to list redactor newspapers")?;
        Ok(RedactorDetail {
            redactor,
            newspapers,
        })
    }

    pub async fn info_form(&self, id: i64) -> ServiceResult<RedactorInfoForm> {
        Ok(RedactorInfoForm::from_instance(&self.get(id).await?))
    }

    pub async fn admin_form(&self, id: i64) -> ServiceResult<AdminRedactorForm> {
        Ok(AdminRedactorForm::from_instance(&self.get(id).await?))
    }

    /// Register a new redactor.
    ///
    /// # Errors
    /// - `Invalid` for form errors or a username already in use
    /// - `Protected` if a concurrent registration claimed the username first
    pub async fn register(&self, form: &RedactorCreationForm) -> ServiceResult<Redactor> {
        let mut errors = FormErrors::new();
        let registration = match form.validate() {
            Ok(registration) => Some(registration),
            Err(form_errors) => {
                errors = form_errors;
                None
            }
        };
        if !form.username().is_empty() && self.username_taken(form.username(), None).await? {
            errors.add("username", MSG_USERNAME_TAKEN);
        }
        let registration = match registration {
            Some(registration) if errors.is_empty() => registration,
            _ => return Err(ServiceError::Invalid(errors)),
        };

        let password_hash =
            hash_password(&registration.password).context("Failed to hash password")?;
        let profile = registration.profile;
        let redactor = Redactor::new(
            profile.username,
            password_hash,
            profile.first_name,
            profile.last_name,
            profile.years_of_experience,
        );

        let created = self.insert(&redactor).await?;
        tracing::info!(redactor_id = created.id, username = %created.username, "Redactor registered");
        Ok(created)
    }

    /// Update the profile fields of a redactor
    pub async fn update_profile(&self, id: i64, form: &RedactorInfoForm) -> ServiceResult<Redactor> {
        let current = self.get(id).await?;
        let profile = self.check_profile(id, form.validate()).await?;
        self.save(apply_profile(current, profile)).await
    }

    /// Update profile fields and staff flags
    pub async fn admin_update(&self, id: i64, form: &AdminRedactorForm) -> ServiceResult<Redactor> {
        let current = self.get(id).await?;
        let validated = form.validate();
        let flags = validated.as_ref().map(|(_, flags)| *flags).unwrap_or_default();
        let profile = self
            .check_profile(id, validated.map(|(profile, _)| profile))
            .await?;

        let mut redactor = apply_profile(current, profile);
        redactor.is_staff = flags.is_staff;
        redactor.is_superuser = flags.is_superuser;
        self.save(redactor).await
    }

    /// Delete a redactor. Their sessions and credits go with them.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await.context("Failed to delete redactor")? {
            return Err(ServiceError::not_found(ENTITY, id));
        }
        tracing::info!(redactor_id = id, "Redactor deleted");
        Ok(())
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self
            .repo
            .count(&RedactorFilter::default())
            .await
            .context("Failed to count redactors")?)
    }

    /// Check credentials and open a new session.
    ///
    /// Unknown usernames and wrong passwords produce the same non-field error.
    pub async fn login(&self, form: &LoginForm) -> ServiceResult<(Redactor, Session)> {
        form.validate()?;

        let redactor = self
            .repo
            .get_by_username(&form.username)
            .await
            .context("Failed to get redactor by username")?;
        let redactor = match redactor {
            Some(redactor) if verify_password(&form.password, &redactor.password_hash)? => redactor,
            _ => {
                tracing::warn!(username = %form.username, "Failed login attempt");
                return Err(ServiceError::Invalid(FormErrors::single(
                    NON_FIELD_ERRORS,
                    MSG_INVALID_LOGIN,
                )));
            }
        };

        let session = self.create_session(redactor.id).await?;
        tracing::info!(redactor_id = redactor.id, "Redactor logged in");
        Ok((redactor, session))
    }

    /// Invalidate a session
    pub async fn logout(&self, session_id: &str) -> ServiceResult<()> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its redactor.
    ///
    /// Returns `None` for unknown or expired sessions; expired ones are removed.
    pub async fn validate_session(&self, token: &str) -> ServiceResult<Option<Redactor>> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        Ok(self
            .repo
            .get_by_id(session.redactor_id)
            .await
            .context("Failed to get session redactor")?)
    }

    /// Delete all expired sessions
    pub async fn cleanup_expired_sessions(&self) -> ServiceResult<i64> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    /// Create a staff superuser unless the username is already taken.
    ///
    /// Returns the new redactor, or `None` if one already existed.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<Option<Redactor>> {
        if self.username_taken(username, None).await? {
            return Ok(None);
        }
        let password_hash = hash_password(password).context("Failed to hash password")?;
        let mut redactor = Redactor::new(username, password_hash, "", "", 0);
        redactor.is_staff = true;
        redactor.is_superuser = true;
        let created = self.insert(&redactor).await?;
        tracing::info!(username = %created.username, "Bootstrap administrator created");
        Ok(Some(created))
    }

    async fn create_session(&self, redactor_id: i64) -> ServiceResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            redactor_id,
            expires_at: now + self.session_lifetime(),
            created_at: now,
        };

        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<i64>) -> ServiceResult<bool> {
        let existing = self
            .repo
            .get_by_username(username)
            .await
            .context("Failed to get redactor by username")?;
        Ok(existing.is_some_and(|r| Some(r.id) != exclude_id))
    }

    /// Merge form errors with the username uniqueness check
    async fn check_profile(
        &self,
        id: i64,
        validated: Result<RedactorProfile, FormErrors>,
    ) -> ServiceResult<RedactorProfile> {
        let (profile, mut errors) = match validated {
            Ok(profile) => (Some(profile), FormErrors::new()),
            Err(errors) => (None, errors),
        };
        if let Some(profile) = &profile {
            if self.username_taken(&profile.username, Some(id)).await? {
                errors.add("username", MSG_USERNAME_TAKEN);
            }
        }
        match profile {
            Some(profile) if errors.is_empty() => Ok(profile),
            _ => Err(ServiceError::Invalid(errors)),
        }
    }

    /// Insert, reporting a lost username race as a conflict
    async fn insert(&self, redactor: &Redactor) -> ServiceResult<Redactor> {
        match self.repo.create(redactor).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if self.username_taken(&redactor.username, None).await? {
                    return Err(ServiceError::Protected(format!(
                        "Username {} was registered concurrently",
                        redactor.username
                    )));
                }
                Err(ServiceError::Internal(e.context("Failed to create redactor")))
            }
        }
    }

    async fn save(&self, redactor: Redactor) -> ServiceResult<Redactor> {
        match self.repo.update(&redactor).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                if self.username_taken(&redactor.username, Some(redactor.id)).await? {
                    return Err(ServiceError::Protected(format!(
                        "Username {} was taken concurrently",
                        redactor.username
                    )));
                }
                Err(ServiceError::Internal(e.context("Failed to update redactor")))
            }
        }
    }
}

fn apply_profile(mut redactor: Redactor, profile: RedactorProfile) -> Redactor {
    redactor.username = profile.username;
    redactor.first_name = profile.first_name;
    redactor.last_name = profile.last_name;
    redactor.years_of_experience = profile.years_of_experience;
    redactor
}
