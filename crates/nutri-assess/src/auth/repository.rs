use chrono::{DateTime, Utc};

use super::domain::{UserAccount, UserId};

/// Storage abstraction for user accounts. Emails are stored normalized and must be
/// unique.
pub trait UserRepository: Send + Sync {
    fn create(&self, account: UserAccount) -> Result<UserAccount, AccountStoreError>;
    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountStoreError>;
    fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: String,
        updated_at: DateTime<Utc>,
    ) -> Result<UserAccount, AccountStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("account not found")]
    NotFound,
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}
