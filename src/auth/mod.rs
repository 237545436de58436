//! Account and client authentication support for filevault.
//!
//! Session handling lives with the external identity provider; this module
//! covers what the store itself needs:
//! - Password hashing with Argon2id
//! - Validated user registration
//! - The shared API bearer token

mod password;
mod registration;
mod token;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{no_control_chars, register, username_chars, RegistrationRequest};
pub use token::{ApiToken, GENERATED_TOKEN_LENGTH};
