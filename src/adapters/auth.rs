use crate::adapters::backend::BackendClient;
use crate::core::account::{LoginForm, RegistrationForm};
use crate::utils::error::{BackendService, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in user. Passed around explicitly; see `BackendClient::with_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Sign-up either signs the user straight in or waits for email confirmation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired(AuthUser),
}

impl BackendClient {
    pub async fn sign_in_with_password(&self, form: &LoginForm) -> Result<AuthSession> {
        form.validate()?;

        let url = self.auth_url("token");
        tracing::debug!("Signing in {} via {}", form.email, url);

        let request = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({
                "email": form.email,
                "password": form.password,
            }));
        let response = self.send(BackendService::Auth, request).await?;
        let session: AuthSession = response.json().await?;

        tracing::info!("Signed in as {}", session.user.id);
        Ok(session)
    }

    pub async fn sign_up(&self, form: &RegistrationForm) -> Result<SignUpOutcome> {
        form.validate()?;

        let url = self.auth_url("signup");
        let request = self.client.post(&url).json(&serde_json::json!({
            "email": form.email,
            "password": form.password,
            "data": {
                "username": form.username(),
                "full_name": form.full_name.trim(),
                "university": form.university.trim(),
                "major": form.major.trim(),
            }
        }));
        let response = self.send(BackendService::Auth, request).await?;
        let outcome: SignUpOutcome = response.json().await?;

        match &outcome {
            SignUpOutcome::SignedIn(session) => tracing::info!("Registered and signed in {}", session.user.id),
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!("Registered {}, waiting for email confirmation", user.id)
            }
        }
        Ok(outcome)
    }
}
