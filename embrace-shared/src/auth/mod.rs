/// Credential handling
///
/// - [`password`]: Argon2id password hashing and verification
///
/// Plaintext passwords only ever pass through this module on their way to a
/// PHC string; they are never stored or logged.

pub mod password;

pub use password::{Argon2Params, CredentialService, PasswordError};
