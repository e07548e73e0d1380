/// Identity of the signed-in user, derived from a valid session token.
///
/// Never persisted on its own: it is rebuilt from the stored token at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    display_name: String,
    identity: String,
}

impl UserSession {
    #[must_use]
    pub fn new(display_name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identity: identity.into(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Stable identity of the user (the account email).
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }
}
