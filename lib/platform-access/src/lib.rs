//! Sign-in and identity for the campus desk portal.
//!
//! This crate provides:
//! - The signed-in identity (`Identity`) and its session (`AuthSession`)
//! - The identity provider seam (`IdentityProvider`) with a managed user
//!   pool client (`CognitoIdentityProvider`) and an in-process fallback
//!   (`OfflineIdentityProvider`)
//! - The login surface state machine (`LoginFlow`, `AuthView`)
//! - Provider error classification (`AuthError`)
//!
//! # Example
//!
//! ```
//! use campus_desk_platform_access::{Identity, AuthSession};
//! use chrono::Duration;
//!
//! let identity = Identity::with_all_fields(
//!     Some("alice".to_string()),
//!     Some("Alice".to_string()),
//!     Some("alice@example.edu".to_string()),
//!     Some("S1001".to_string()),
//! );
//! let session = AuthSession::new(identity, Duration::hours(8));
//!
//! assert!(session.is_valid());
//! assert_eq!(session.identity().session_key(), "S1001");
//! assert_eq!(session.identity().greeting_name(), "Alice");
//! ```

pub mod cognito;
pub mod error;
pub mod flow;
pub mod identity;
pub mod offline;
pub mod password;
pub mod provider;
pub mod session;

// Re-export main types at crate root
pub use cognito::{CognitoIdentityProvider, IdentityConfig};
pub use error::AuthError;
pub use flow::{AuthView, LoginFlow};
pub use identity::{DEFAULT_DISPLAY_NAME, GUEST_SESSION_KEY, Identity};
pub use offline::OfflineIdentityProvider;
pub use password::PasswordPolicy;
pub use provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
pub use session::{AuthSession, SessionTokens};
