use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    normalize_email, Credentials, PasswordReset, Registration, UserAccount, UserId,
};
use super::hashing::{BcryptHasher, HashError, PasswordHasher};
use super::otp::{
    verify_code, InMemoryOtpStore, NotifyError, OtpCode, OtpEntry, OtpError, OtpMessage,
    OtpNotifier, OtpStore,
};
use super::repository::{AccountStoreError, UserRepository};
use crate::config::AuthConfig;

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("usr-{id:06}"))
}

/// Registration, sign-in, and OTP based password resets.
pub struct AuthService<U, N> {
    users: Arc<U>,
    notifier: Arc<N>,
    otp_store: Arc<dyn OtpStore>,
    hasher: Arc<dyn PasswordHasher>,
    config: AuthConfig,
    clock: fn() -> DateTime<Utc>,
}

impl<U, N> AuthService<U, N>
where
    U: UserRepository + 'static,
    N: OtpNotifier + 'static,
{
    /// Uses bcrypt at the configured cost and an in-process code store.
    pub fn new(users: Arc<U>, notifier: Arc<N>, config: AuthConfig) -> Self {
        Self {
            users,
            notifier,
            otp_store: Arc::new(InMemoryOtpStore::default()),
            hasher: Arc::new(BcryptHasher::new(config.bcrypt_cost)),
            config,
            clock: Utc::now,
        }
    }

    pub fn with_otp_store(mut self, otp_store: Arc<dyn OtpStore>) -> Self {
        self.otp_store = otp_store;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn register(&self, registration: Registration) -> Result<UserAccount, AuthError> {
        let email = normalize_email(&registration.email);
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        self.check_password(
            &registration.password,
            registration.confirm_password.as_deref(),
        )?;

        if self.users.find_by_email(&email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let now = (self.clock)();
        let account = UserAccount {
            id: next_user_id(),
            email,
            password_hash: self.hasher.hash(&registration.password)?,
            role: registration.role,
            created_at: now,
            updated_at: now,
        };
        let created = self.users.create(account)?;
        info!(user_id = %created.id.0, role = ?created.role, "account registered");
        Ok(created)
    }

    pub fn sign_in(&self, credentials: Credentials) -> Result<UserAccount, AuthError> {
        let email = normalize_email(&credentials.email);
        let account = self
            .users
            .find_by_email(&email)?
            .ok_or(AuthError::UnknownUser)?;

        if !self
            .hasher
            .verify(&credentials.password, &account.password_hash)?
        {
            warn!(user_id = %account.id.0, "sign-in rejected");
            return Err(AuthError::InvalidPassword);
        }

        Ok(account)
    }

    /// Issues a fresh code for `email`, replacing any outstanding one, and hands it
    /// to the notifier. Codes already expired for any email are swept first.
    /// Returns the expiry.
    pub fn request_password_reset(&self, email: &str) -> Result<DateTime<Utc>, AuthError> {
        let email = normalize_email(email);
        let account = self
            .users
            .find_by_email(&email)?
            .ok_or(AuthError::UnknownUser)?;

        let now = (self.clock)();
        let purged = self.otp_store.purge_expired(now)?;
        if purged > 0 {
            debug!(purged, "expired reset codes dropped");
        }

        let code = OtpCode::generate(&mut rand::thread_rng());
        let expires_at = now + Duration::minutes(i64::from(self.config.otp_ttl_minutes));

        self.otp_store.put(
            &email,
            OtpEntry {
                code: code.clone(),
                expires_at,
            },
        )?;
        self.notifier.deliver(OtpMessage {
            email,
            code,
            expires_at,
        })?;

        info!(user_id = %account.id.0, %expires_at, "password reset code issued");
        Ok(expires_at)
    }

    /// Replaces the password once the code checks out. The code is consumed only
    /// after the new hash is stored.
    pub fn reset_password(&self, reset: PasswordReset) -> Result<UserAccount, AuthError> {
        self.check_password(&reset.new_password, reset.confirm_password.as_deref())?;

        let email = normalize_email(&reset.email);
        let now = (self.clock)();
        verify_code(self.otp_store.as_ref(), &email, &reset.code, now)?;

        let account = self
            .users
            .find_by_email(&email)?
            .ok_or(AuthError::UnknownUser)?;
        let password_hash = self.hasher.hash(&reset.new_password)?;
        let updated = self
            .users
            .update_password_hash(&account.id, password_hash, now)?;

        self.otp_store.remove(&email)?;
        info!(user_id = %updated.id.0, "password reset");
        Ok(updated)
    }

    /// Drops every expired code. Called periodically by the server.
    pub fn purge_expired_codes(&self) -> Result<usize, AuthError> {
        Ok(self.otp_store.purge_expired((self.clock)())?)
    }

    fn check_password(&self, password: &str, confirmation: Option<&str>) -> Result<(), AuthError> {
        if let Some(confirmation) = confirmation {
            if confirmation != password {
                return Err(AuthError::PasswordMismatch);
            }
        }
        if password.chars().count() < self.config.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.config.min_password_length,
            });
        }
        Ok(())
    }
}

/// Error raised by the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("no account found for this email")]
    UnknownUser,
    #[error("incorrect password")]
    InvalidPassword,
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Store(AccountStoreError),
}

impl From<AccountStoreError> for AuthError {
    fn from(value: AccountStoreError) -> Self {
        match value {
            AccountStoreError::EmailTaken => AuthError::EmailTaken,
            other => AuthError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::Role;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn after_expiry() -> DateTime<Utc> {
        fixed_now() + Duration::minutes(11)
    }

    #[derive(Default)]
    struct MemoryUsers {
        accounts: Mutex<HashMap<String, UserAccount>>,
    }

    impl UserRepository for MemoryUsers {
        fn create(&self, account: UserAccount) -> Result<UserAccount, AccountStoreError> {
            let mut guard = self.accounts.lock().expect("users mutex poisoned");
            if guard.contains_key(&account.email) {
                return Err(AccountStoreError::EmailTaken);
            }
            guard.insert(account.email.clone(), account.clone());
            Ok(account)
        }

        fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountStoreError> {
            Ok(self
                .accounts
                .lock()
                .expect("users mutex poisoned")
                .get(email)
                .cloned())
        }

        fn update_password_hash(
            &self,
            id: &UserId,
            password_hash: String,
            updated_at: DateTime<Utc>,
        ) -> Result<UserAccount, AccountStoreError> {
            let mut guard = self.accounts.lock().expect("users mutex poisoned");
            let account = guard
                .values_mut()
                .find(|account| &account.id == id)
                .ok_or(AccountStoreError::NotFound)?;
            account.password_hash = password_hash;
            account.updated_at = updated_at;
            Ok(account.clone())
        }
    }

    #[derive(Default)]
    struct Outbox {
        messages: Mutex<Vec<OtpMessage>>,
    }

    impl Outbox {
        fn last_code(&self) -> String {
            self.messages
                .lock()
                .expect("outbox mutex poisoned")
                .last()
                .map(|message| message.code.as_str().to_string())
                .expect("a delivered code")
        }
    }

    impl OtpNotifier for Outbox {
        fn deliver(&self, message: OtpMessage) -> Result<(), NotifyError> {
            self.messages
                .lock()
                .expect("outbox mutex poisoned")
                .push(message);
            Ok(())
        }
    }

    fn config() -> AuthConfig {
        AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        }
    }

    fn build_service() -> (AuthService<MemoryUsers, Outbox>, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::default());
        let service = AuthService::new(Arc::new(MemoryUsers::default()), outbox.clone(), config())
            .with_clock(fixed_now);
        (service, outbox)
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: Some(password.to_string()),
            role: Role::User,
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn reset(email: &str, code: &str, password: &str) -> PasswordReset {
        PasswordReset {
            email: email.to_string(),
            code: code.to_string(),
            new_password: password.to_string(),
            confirm_password: None,
        }
    }

    #[test]
    fn register_hashes_and_normalizes() {
        let (service, _) = build_service();

        let account = service
            .register(registration(" Student@Example.com ", "secret1"))
            .expect("register");

        assert_eq!(account.email, "student@example.com");
        assert_ne!(account.password_hash, "secret1");
        assert!(account.id.0.starts_with("usr-"));
        assert_eq!(account.view().role, Role::User);
    }

    #[test]
    fn register_rejects_bad_input() {
        let (service, _) = build_service();

        assert!(matches!(
            service.register(registration("no-at-sign", "secret1")),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            service.register(registration("a@example.com", "short")),
            Err(AuthError::PasswordTooShort { min: 6 })
        ));

        let mut mismatched = registration("a@example.com", "secret1");
        mismatched.confirm_password = Some("secret2".to_string());
        assert!(matches!(
            service.register(mismatched),
            Err(AuthError::PasswordMismatch)
        ));

        service
            .register(registration("a@example.com", "secret1"))
            .expect("first registration");
        assert!(matches!(
            service.register(registration("A@example.com", "secret1")),
            Err(AuthError::EmailTaken)
        ));
    }

    #[test]
    fn sign_in_distinguishes_unknown_user_from_wrong_password() {
        let (service, _) = build_service();
        service
            .register(registration("a@example.com", "secret1"))
            .expect("register");

        assert!(service
            .sign_in(credentials("a@example.com", "secret1"))
            .is_ok());
        assert!(matches!(
            service.sign_in(credentials("a@example.com", "wrong-pass")),
            Err(AuthError::InvalidPassword)
        ));
        assert!(matches!(
            service.sign_in(credentials("b@example.com", "secret1")),
            Err(AuthError::UnknownUser)
        ));
    }

    #[test]
    fn password_reset_consumes_the_code() {
        let (service, outbox) = build_service();
        service
            .register(registration("a@example.com", "secret1"))
            .expect("register");

        let expires_at = service
            .request_password_reset("a@example.com")
            .expect("request reset");
        assert_eq!(expires_at, fixed_now() + Duration::minutes(10));
        let code = outbox.last_code();

        assert!(matches!(
            service.reset_password(reset("a@example.com", "000000", "new-secret")),
            Err(AuthError::Otp(OtpError::Mismatch))
        ));

        service
            .reset_password(reset("a@example.com", &code, "new-secret"))
            .expect("reset");
        assert!(service
            .sign_in(credentials("a@example.com", "new-secret"))
            .is_ok());
        assert!(matches!(
            service.reset_password(reset("a@example.com", &code, "another-secret")),
            Err(AuthError::Otp(OtpError::NotFound))
        ));
    }

    #[test]
    fn expired_code_is_rejected_and_removed() {
        let (service, outbox) = build_service();
        service
            .register(registration("a@example.com", "secret1"))
            .expect("register");
        service
            .request_password_reset("a@example.com")
            .expect("request reset");
        let code = outbox.last_code();

        let service = service.with_clock(after_expiry);
        assert!(matches!(
            service.reset_password(reset("a@example.com", &code, "new-secret")),
            Err(AuthError::Otp(OtpError::Expired))
        ));
        assert!(matches!(
            service.reset_password(reset("a@example.com", &code, "new-secret")),
            Err(AuthError::Otp(OtpError::NotFound))
        ));
    }

    #[test]
    fn reset_for_unknown_email_is_rejected() {
        let (service, outbox) = build_service();

        assert!(matches!(
            service.request_password_reset("ghost@example.com"),
            Err(AuthError::UnknownUser)
        ));
        assert!(outbox.messages.lock().expect("outbox").is_empty());
    }

    #[test]
    fn purge_removes_stale_codes() {
        let (service, _) = build_service();
        service
            .register(registration("a@example.com", "secret1"))
            .expect("register");
        service
            .request_password_reset("a@example.com")
            .expect("request reset");

        assert_eq!(service.purge_expired_codes().expect("purge"), 0);
        let service = service.with_clock(after_expiry);
        assert_eq!(service.purge_expired_codes().expect("purge"), 1);
    }

    #[test]
    fn issuing_a_code_sweeps_codes_nobody_redeemed() {
        let store = Arc::new(InMemoryOtpStore::default());
        let (service, _) = build_service();
        let service = service.with_otp_store(store.clone());
        for email in ["a@example.com", "b@example.com"] {
            service
                .register(registration(email, "secret1"))
                .expect("register");
        }
        service
            .request_password_reset("a@example.com")
            .expect("request reset");
        assert!(store.get("a@example.com").expect("get").is_some());

        let service = service.with_clock(after_expiry);
        service
            .request_password_reset("b@example.com")
            .expect("request reset");

        assert!(store.get("a@example.com").expect("get").is_none());
        assert!(store.get("b@example.com").expect("get").is_some());
    }
}
