//! Login gating.
//!
//! The backend's own error detail is deliberately discarded — every failed
//! login shows the same fixed message.  Logging out only toggles visibility
//! and clears the credential inputs; server-side session invalidation is the
//! backend's concern.

use tracing::info;

use crate::api::ApiClient;
use crate::state::AppState;

/// Fixed message for any failed login, regardless of the backend's detail.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Default)]
pub struct AuthGate {
    authenticated: bool,
}

impl AuthGate {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// POST credentials.  On success the main application is revealed and
    /// the app state is reset (tenant empty, data cleared); the shell then
    /// navigates to Dashboard.
    pub async fn login(
        &mut self,
        api: &ApiClient,
        username: &str,
        password: &str,
        state: &mut AppState,
    ) -> Result<(), &'static str> {
        match api.login(username, password).await {
            Ok(_) => {
                info!(username, "login ok");
                self.authenticated = true;
                state.reset();
                Ok(())
            }
            Err(_) => Err(INVALID_CREDENTIALS),
        }
    }

    /// Reverse the visibility toggle.  The shell clears the credential
    /// fields; no server-side call is made.
    pub fn logout(&mut self) {
        self.authenticated = false;
    }
}
