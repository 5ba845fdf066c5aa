/// User directory - identity lookup and onboarding
use std::sync::Arc;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};

pub struct UserDirectory {
    store: Arc<dyn ContentStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn current_user(&self, external_id: &str) -> Result<Option<User>> {
        self.store.find_user_by_external_id(external_id).await
    }

    /// Resolve the caller and require a completed profile.
    ///
    /// # Errors
    ///
    /// `AppError::OnboardingRequired` when the caller has no record yet or
    /// has not finished onboarding.
    pub async fn require_onboarded(&self, external_id: &str) -> Result<User> {
        match self.current_user(external_id).await? {
            Some(user) if user.onboarded => Ok(user),
            _ => {
                tracing::debug!(%external_id, "caller has not completed onboarding");
                Err(AppError::OnboardingRequired)
            }
        }
    }

    /// Create or update the caller's profile and mark it onboarded.
    pub async fn complete_onboarding(&self, profile: UserProfile) -> Result<User> {
        let user = self.store.upsert_user(&profile).await?;
        tracing::info!(user_id = %user.id, external_id = %user.external_id, "profile saved");
        Ok(user)
    }
}
