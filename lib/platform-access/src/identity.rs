//! Identity of a signed-in student.
//!
//! The identity is read-only to the rest of the portal. It is populated
//! from the identity provider's user attributes after sign-in and is used
//! for the dashboard greeting and as the bot runtime's session key.

use serde::{Deserialize, Serialize};

/// Session key used when no student id is known.
pub const GUEST_SESSION_KEY: &str = "guest";

/// Display name used when the provider returns no `name` attribute.
pub const DEFAULT_DISPLAY_NAME: &str = "Student";

/// Represents a signed-in student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-side username (often an opaque subject id).
    username: Option<String>,
    /// Human readable name.
    display_name: Option<String>,
    /// Email address used to sign in.
    email: Option<String>,
    /// Institution-issued student id (e.g. "S1001").
    student_id: Option<String>,
}

impl Identity {
    /// Creates an empty identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an identity with all fields specified.
    #[must_use]
    pub fn with_all_fields(
        username: Option<String>,
        display_name: Option<String>,
        email: Option<String>,
        student_id: Option<String>,
    ) -> Self {
        Self {
            username: non_blank(username),
            display_name: non_blank(display_name),
            email: non_blank(email),
            student_id: non_blank(student_id),
        }
    }

    /// Returns the provider-side username, if available.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the display name, if available.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the email address, if available.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the student id, if available.
    #[must_use]
    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    /// Returns the name to greet the student with.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name().unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Returns the key correlating bot turns to this student.
    ///
    /// This is the student id, or `"guest"` when none is known.
    #[must_use]
    pub fn session_key(&self) -> &str {
        self.student_id().unwrap_or(GUEST_SESSION_KEY)
    }

    /// Sets the username.
    pub fn set_username(&mut self, username: Option<String>) {
        self.username = non_blank(username);
    }

    /// Sets the display name.
    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = non_blank(display_name);
    }

    /// Sets the email address.
    pub fn set_email(&mut self, email: Option<String>) {
        self.email = non_blank(email);
    }

    /// Sets the student id.
    pub fn set_student_id(&mut self, student_id: Option<String>) {
        self.student_id = non_blank(student_id);
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
