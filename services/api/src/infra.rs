use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use nutri_assess::assessment::{
    AssessmentId, AssessmentRecord, AssessmentRepository, AssessmentRow, AssessmentStatus,
    RepositoryError,
};
use nutri_assess::auth::{
    AccountStoreError, NotifyError, OtpMessage, OtpNotifier, UserAccount, UserId, UserRepository,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps assessments in their persisted row form so every write round-trips through
/// the storage codec, the same way a database adapter would.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    rows: Arc<Mutex<HashMap<String, AssessmentRow>>>,
}

impl InMemoryAssessmentRepository {
    fn latest_matching(
        &self,
        owner: &UserId,
        completed_only: bool,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        let completed = AssessmentStatus::Completed.label();
        guard
            .values()
            .filter(|row| row.user_id == owner.0)
            .filter(|row| !completed_only || row.status == completed)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .cloned()
            .map(AssessmentRecord::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let row = AssessmentRow::try_from(&record)?;
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        if guard.contains_key(&row.id) {
            return Err(RepositoryError::Conflict);
        }
        let active = AssessmentStatus::Active.label();
        if row.status == active
            && guard
                .values()
                .any(|existing| existing.user_id == row.user_id && existing.status == active)
        {
            return Err(RepositoryError::ActiveAssessmentExists);
        }
        guard.insert(row.id.clone(), row);
        Ok(record)
    }

    fn update(&self, mut record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.rows.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(&record.id.0)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != record.revision {
            return Err(RepositoryError::StaleRevision {
                expected: record.revision,
                found: stored.revision,
            });
        }
        record.revision += 1;
        *stored = AssessmentRow::try_from(&record)?;
        Ok(record)
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.rows.lock().expect("repository mutex poisoned");
        guard
            .get(&id.0)
            .cloned()
            .map(AssessmentRecord::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn latest_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        self.latest_matching(owner, false)
    }

    fn latest_completed_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        self.latest_matching(owner, true)
    }
}

/// Accounts keyed by normalized email.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    accounts: Arc<Mutex<HashMap<String, UserAccount>>>,
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, account: UserAccount) -> Result<UserAccount, AccountStoreError> {
        let mut guard = self.accounts.lock().expect("user mutex poisoned");
        if guard.contains_key(&account.email) {
            return Err(AccountStoreError::EmailTaken);
        }
        guard.insert(account.email.clone(), account.clone());
        Ok(account)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountStoreError> {
        let guard = self.accounts.lock().expect("user mutex poisoned");
        Ok(guard.get(email).cloned())
    }

    fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: String,
        updated_at: DateTime<Utc>,
    ) -> Result<UserAccount, AccountStoreError> {
        let mut guard = self.accounts.lock().expect("user mutex poisoned");
        let account = guard
            .values_mut()
            .find(|account| &account.id == id)
            .ok_or(AccountStoreError::NotFound)?;
        account.password_hash = password_hash;
        account.updated_at = updated_at;
        Ok(account.clone())
    }
}

/// Holds reset codes for pickup instead of sending mail. Codes never reach the logs.
#[derive(Default, Clone)]
pub(crate) struct InMemoryOtpOutbox {
    messages: Arc<Mutex<Vec<OtpMessage>>>,
}

impl OtpNotifier for InMemoryOtpOutbox {
    fn deliver(&self, message: OtpMessage) -> Result<(), NotifyError> {
        info!(
            email = %message.email,
            expires_at = %message.expires_at,
            "password reset code queued"
        );
        let mut guard = self.messages.lock().expect("outbox mutex poisoned");
        guard.push(message);
        Ok(())
    }
}

impl InMemoryOtpOutbox {
    pub(crate) fn latest_for(&self, email: &str) -> Option<OtpMessage> {
        let guard = self.messages.lock().expect("outbox mutex poisoned");
        guard
            .iter()
            .rev()
            .find(|message| message.email == email)
            .cloned()
    }
}
