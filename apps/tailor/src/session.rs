use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api_client::JobApi;
use crate::errors::{FlowError, Precondition};
use crate::models::profile::Profile;

/// Authenticated context handed explicitly to every flow.
///
/// Created once a credential is available, consumed by `sign_out`. There is no
/// process-wide copy: a flow can only act while it holds a `Session`.
#[derive(Clone)]
pub struct Session {
    credential: Arc<str>,
    profile: Option<Profile>,
}

impl Session {
    /// Validates the credential and loads the profile. A profile that cannot be
    /// fetched is logged and left empty; the credential itself stays usable.
    pub async fn establish(api: &dyn JobApi, credential: &str) -> Result<Self, FlowError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(FlowError::Precondition(Precondition::Credential));
        }

        let profile = match api.get_profile(credential).await {
            Ok(profile) => Some(profile),
            Err(e) if e.is_unauthorized() => {
                return Err(FlowError::Precondition(Precondition::Credential));
            }
            Err(e) => {
                warn!("Failed to fetch user profile: {e}");
                None
            }
        };

        if let Some(profile) = &profile {
            info!(
                "Session established for {}",
                profile.email.as_deref().unwrap_or(&profile.id)
            );
        }

        Ok(Self {
            credential: Arc::from(credential),
            profile,
        })
    }

    /// Session with a known profile, no network round trip.
    pub fn with_profile(credential: &str, profile: Option<Profile>) -> Self {
        Self {
            credential: Arc::from(credential.trim()),
            profile,
        }
    }

    pub fn credential(&self) -> Arc<str> {
        self.credential.clone()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn has_base_resume(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.has_base_resume)
    }

    /// Ends the session. Clones held by running flows stay valid until those flows finish.
    pub fn sign_out(self) {
        info!("Signed out");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}
