//! Accounts, password hashing, and OTP based password resets.

pub mod domain;
pub mod hashing;
pub mod otp;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    normalize_email, AccountView, Credentials, PasswordReset, PasswordResetRequest,
    Registration, Role, UserAccount, UserId,
};
pub use hashing::{BcryptHasher, HashError, PasswordHasher};
pub use otp::{
    InMemoryOtpStore, NotifyError, OtpCode, OtpEntry, OtpError, OtpMessage, OtpNotifier,
    OtpStore,
};
pub use repository::{AccountStoreError, UserRepository};
pub use router::auth_router;
pub use service::{AuthError, AuthService};
