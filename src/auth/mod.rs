//! Login, signup and OTP verification.
//!
//! The server answers with fixed message strings and the flow routes on them:
//! the success literal establishes the session, the not-verified literal parks the
//! email for OTP entry, anything else is shown as an error and the form stays.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::errors::AppError;
use crate::notify::Notifier;
use crate::session::{Session, SessionStore};

pub const LOGIN_SUCCESS: &str = "Login successful";
pub const NOT_VERIFIED: &str = "Account not verified. OTP has been sent to your email.";
pub const SIGNUP_SUCCESS: &str = "Signup successful. Verify OTP sent to your email.";
pub const CAPTCHA_REQUIRED: &str = "Please complete the reCAPTCHA";
pub const INVALID_OTP: &str = "Please enter the 6-digit code sent to your email.";
pub const NO_PENDING_EMAIL: &str = "No account is waiting for verification. Please log in.";
pub const LOGGED_OUT: &str = "Logged out successfully.";

const LOGIN_ERROR: &str = "Login error";
const OTP_ERROR: &str = "OTP verification error";
const SIGNUP_ERROR: &str = "Signup error";

/// Where the user is in the sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    Authenticating,
    AwaitingOtp { email: String },
    Authenticated(Session),
}

/// Page the user should see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Dashboard,
    VerifyOtp,
    /// Stay on (reload) the current form
    Retry,
    Login,
}

impl Destination {
    pub fn path(&self) -> &'static str {
        match self {
            Destination::Dashboard => "/admin",
            Destination::VerifyOtp => "/admin/verify",
            Destination::Retry | Destination::Login => "/login",
        }
    }
}

/// Result of a sign-in step that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    message: String,
    destination: Destination,
}

impl AuthOutcome {
    fn new(message: impl Into<String>, destination: Destination) -> Self {
        Self {
            message: message.into(),
            destination,
        }
    }

    /// The server's message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "recaptchaToken", skip_serializing_if = "Option::is_none")]
    recaptcha_token: Option<&'a str>,
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    otp: &'a str,
    #[serde(rename = "recaptchaToken")]
    recaptcha_token: &'a str,
}

/// Login and OTP replies.
#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    mobile: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl AuthResponse {
    fn into_session(self) -> Result<Session, AppError> {
        match (self.token, self.id) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Ok(Session {
                    token,
                    user_id,
                    email: self.email.unwrap_or_default(),
                    mobile: self.mobile.unwrap_or_default(),
                    name: self.name.unwrap_or_default(),
                })
            }
            _ => Err(AppError::BadRequest(
                "Login response is missing the token or user id".to_string(),
            )),
        }
    }
}

/// Fields of the signup form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub mobile_no: String,
    pub email: String,
    pub date_of_birth: String,
    pub gender: String,
    pub password: String,
    #[serde(rename = "recaptchaToken")]
    pub recaptcha_token: Option<String>,
}

/// The sign-in state machine.
#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
    session: SessionStore,
    notifier: Notifier,
    state: Arc<RwLock<AuthState>>,
}

impl AuthFlow {
    pub fn new(api: ApiClient, session: SessionStore, notifier: Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
            state: Arc::new(RwLock::new(AuthState::LoggedOut)),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// Rebuild the state from persisted storage.
    pub async fn restore(&self) -> Result<AuthState, AppError> {
        let state = if let Some(session) = self.session.current().await? {
            AuthState::Authenticated(session)
        } else if let Some(email) = self.session.pending_email().await? {
            AuthState::AwaitingOtp { email }
        } else {
            AuthState::LoggedOut
        };
        self.set_state(state.clone()).await;
        Ok(state)
    }

    /// Email and password login.
    ///
    /// Only the success literal touches the session. The not-verified reply
    /// arrives as a rejected call and leads to OTP entry.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        recaptcha_token: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        self.set_state(AuthState::Authenticating).await;
        tracing::info!(%email, "Logging in");

        let request = LoginRequest {
            email,
            password,
            recaptcha_token: recaptcha_token.filter(|t| !t.is_empty()),
        };
        let reply = self.api.post::<_, AuthResponse>("auth/login", &request).await;

        match reply {
            Ok(response) => {
                let message = response.message.clone().unwrap_or_default();
                if message == LOGIN_SUCCESS {
                    self.establish(response, false).await?;
                    self.notifier.notify(message.as_str());
                    Ok(AuthOutcome::new(message, Destination::Dashboard))
                } else {
                    self.reject(message.as_str(), LOGIN_ERROR).await;
                    Ok(AuthOutcome::new(message, Destination::Retry))
                }
            }
            Err(err) if err.server_message() == Some(NOT_VERIFIED) => {
                self.await_otp(email).await?;
                self.notifier.notify_error(NOT_VERIFIED);
                Ok(AuthOutcome::new(NOT_VERIFIED, Destination::VerifyOtp))
            }
            Err(err) => {
                self.reject(err.server_message().unwrap_or_default(), LOGIN_ERROR)
                    .await;
                Err(err)
            }
        }
    }

    /// Verify the code mailed to the pending email.
    ///
    /// On success storage is wiped and replaced by the new session. Any failure
    /// returns the flow to logged out; the pending email stays for a retry.
    pub async fn verify_otp(
        &self,
        otp: &str,
        recaptcha_token: Option<&str>,
    ) -> Result<AuthOutcome, AppError> {
        let Some(recaptcha_token) = recaptcha_token.filter(|t| !t.is_empty()) else {
            return Err(self.invalid(CAPTCHA_REQUIRED));
        };
        let otp = otp.trim();
        if !is_valid_otp(otp) {
            return Err(self.invalid(INVALID_OTP));
        }
        let Some(email) = self.session.pending_email().await? else {
            self.set_state(AuthState::LoggedOut).await;
            return Err(self.invalid(NO_PENDING_EMAIL));
        };

        self.set_state(AuthState::Authenticating).await;
        tracing::info!(%email, "Verifying OTP");

        let request = OtpRequest {
            email: &email,
            otp,
            recaptcha_token,
        };
        match self.api.post::<_, AuthResponse>("auth/verify-otp", &request).await {
            Ok(response) => {
                let message = response.message.clone().unwrap_or_default();
                if message == LOGIN_SUCCESS {
                    self.establish(response, true).await?;
                    self.notifier.notify(message.as_str());
                    Ok(AuthOutcome::new(message, Destination::Dashboard))
                } else {
                    self.reject(message.as_str(), OTP_ERROR).await;
                    Ok(AuthOutcome::new(message, Destination::Retry))
                }
            }
            Err(err) => {
                self.reject(err.server_message().unwrap_or_default(), OTP_ERROR)
                    .await;
                Err(err)
            }
        }
    }

    /// Create an admin account. The captcha must be completed first.
    pub async fn signup(&self, form: &SignupForm) -> Result<AuthOutcome, AppError> {
        if form
            .recaptcha_token
            .as_deref()
            .map(|t| t.is_empty())
            .unwrap_or(true)
        {
            return Err(self.invalid(CAPTCHA_REQUIRED));
        }

        self.set_state(AuthState::Authenticating).await;
        tracing::info!(email = %form.email, "Signing up");

        match self
            .api
            .post::<_, crate::api::MessageResponse>("auth/add_admin", form)
            .await
        {
            Ok(response) => {
                let message = response.message.unwrap_or_default();
                if message == SIGNUP_SUCCESS {
                    self.await_otp(&form.email).await?;
                    self.notifier.notify(message.as_str());
                    Ok(AuthOutcome::new(message, Destination::VerifyOtp))
                } else {
                    self.reject(message.as_str(), SIGNUP_ERROR).await;
                    Ok(AuthOutcome::new(message, Destination::Retry))
                }
            }
            Err(err) => {
                self.reject(err.server_message().unwrap_or_default(), SIGNUP_ERROR)
                    .await;
                Err(err)
            }
        }
    }

    /// Clear the session. The dashboard section preference survives.
    pub async fn logout(&self) -> Result<AuthOutcome, AppError> {
        self.session.clear_session().await?;
        self.set_state(AuthState::LoggedOut).await;
        self.notifier.notify(LOGGED_OUT);
        Ok(AuthOutcome::new(LOGGED_OUT, Destination::Login))
    }

    async fn establish(&self, response: AuthResponse, replace: bool) -> Result<(), AppError> {
        let session = match response.into_session() {
            Ok(session) => session,
            Err(err) => {
                self.reject("", LOGIN_ERROR).await;
                return Err(err);
            }
        };
        if replace {
            self.session.replace_session(&session).await?;
        } else {
            self.session.set_session(&session).await?;
        }
        self.set_state(AuthState::Authenticated(session)).await;
        Ok(())
    }

    async fn await_otp(&self, email: &str) -> Result<(), AppError> {
        self.session.set_pending_email(email).await?;
        self.set_state(AuthState::AwaitingOtp {
            email: email.to_string(),
        })
        .await;
        tracing::info!(%email, "Awaiting OTP");
        Ok(())
    }

    async fn reject(&self, message: &str, fallback: &str) {
        self.set_state(AuthState::LoggedOut).await;
        let text = if message.trim().is_empty() {
            fallback
        } else {
            message
        };
        tracing::warn!(message = %text, "Sign-in step rejected");
        self.notifier.notify_error(text);
    }

    fn invalid(&self, message: &str) -> AppError {
        self.notifier.notify_error(message);
        AppError::Validation(message.to_string())
    }

    async fn set_state(&self, state: AuthState) {
        *self.state.write().await = state;
    }
}

/// Exactly six ASCII digits.
pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_otp_format() {
        assert!(is_valid_otp("012345"));
        assert!(!is_valid_otp("12345"));
        assert!(!is_valid_otp("1234567"));
        assert!(!is_valid_otp("12a456"));
        assert!(!is_valid_otp("١٢٣٤٥٦"));
    }

    #[test]
    fn test_login_request_field_names() {
        let body = serde_json::to_value(LoginRequest {
            email: "a@b.c",
            password: "pw",
            recaptcha_token: Some("cap"),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "email": "a@b.c", "password": "pw", "recaptchaToken": "cap" })
        );
    }

    #[test]
    fn test_response_without_token_is_not_a_session() {
        let response: AuthResponse =
            serde_json::from_value(json!({ "message": LOGIN_SUCCESS, "id": "u1" })).unwrap();
        assert!(response.into_session().is_err());
    }

    #[test]
    fn test_destination_paths() {
        assert_eq!(Destination::Dashboard.path(), "/admin");
        assert_eq!(Destination::VerifyOtp.path(), "/admin/verify");
    }
}
