//! The authentication gate.
//!
//! Credentials are entered through a [`LoginForm`] and validated before the
//! [`AuthService`] is called. A successful login stores the token in the
//! [`AuthSession`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use vform::{Field, FormSnapshot, Rule, Schema, SubmitHandler, TextField, VForm, ValidationErrors};

use crate::error::{Result, ServiceError};
use crate::services::RestClient;
use crate::services::rest::send;

const LOGIN_FAILED: &str = "Erro no login.";

/// Exchanges credentials for a token.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Returns a bearer token for the credentials.
    async fn auth(&self, email: &str, password: &str) -> Result<String>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Posts credentials to `{base}/tokens/`.
#[derive(Debug, Clone)]
pub struct RestAuthService {
    client: RestClient,
}

impl RestAuthService {
    /// Creates the service over `client`.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for RestAuthService {
    async fn auth(&self, email: &str, password: &str) -> Result<String> {
        let mut url = self.client.endpoint(&["tokens"])?;
        // The API expects the trailing slash.
        url.set_path(&format!("{}/", url.path()));
        let request = self
            .client
            .http()
            .post(url)
            .json(&Credentials { email, password });
        let response = send(request, LOGIN_FAILED, None).await?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::decode(LOGIN_FAILED, e))?;
        Ok(body.token)
    }
}

/// Why a login attempt failed.
#[derive(Error, Debug)]
pub enum LoginError {
    /// The credentials did not pass validation; messages are on the fields.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    /// The service rejected the credentials or failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Holds the token once logged in.
pub struct AuthSession<A> {
    service: A,
    token: Option<String>,
}

impl<A> fmt::Debug for AuthSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: AuthService> AuthSession<A> {
    /// Creates a logged-out session.
    pub fn new(service: A) -> Self {
        Self {
            service,
            token: None,
        }
    }

    /// Logs in directly, bypassing the form.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        match self.service.auth(email, password).await {
            Ok(token) => {
                info!("logged in");
                self.token = Some(token);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                Err(err)
            }
        }
    }

    /// Forgets the token.
    pub fn logout(&mut self) {
        self.token = None;
    }

    /// Returns true once a login succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait(?Send)]
impl<A: AuthService> SubmitHandler for AuthSession<A> {
    type Output = std::result::Result<(), LoginError>;

    async fn on_submit(&mut self, data: FormSnapshot, form: &VForm) -> Self::Output {
        let valid = match LoginForm::schema().validate(&data.to_value()) {
            Ok(valid) => valid,
            Err(errors) => {
                form.form().apply_errors(&errors);
                return Err(errors.into());
            }
        };
        let email = valid["email"].as_str().unwrap_or_default();
        let password = valid["password"].as_str().unwrap_or_default();
        self.login(email, password).await?;
        Ok(())
    }
}

/// The login screen's form.
#[derive(Debug)]
pub struct LoginForm {
    form: VForm,
    pub email: TextField,
    pub password: TextField,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    /// Mounts the email and password fields.
    pub fn new() -> Self {
        let form = VForm::new();
        let email = TextField::mount(form.context(), "email").label("Email");
        let password = TextField::mount(form.context(), "password").label("Senha");
        Self {
            form,
            email,
            password,
        }
    }

    /// Validation rules for the credentials.
    pub fn schema() -> Schema {
        Schema::object()
            .field("email", Rule::string().required().email())
            .field("password", Rule::string().required().min(6))
    }

    /// Fills both fields as if typed.
    pub fn fill(&self, email: &str, password: &str) {
        self.email.input(email.to_string());
        self.password.input(password.to_string());
    }

    /// Submits the form to `session`.
    pub async fn submit<A: AuthService>(
        &self,
        session: &mut AuthSession<A>,
    ) -> std::result::Result<(), LoginError> {
        self.form.save(session).await
    }

    /// Returns the message shown on the email field.
    pub fn email_error(&self) -> Option<String> {
        self.email.error()
    }

    /// Returns the message shown on the password field.
    pub fn password_error(&self) -> Option<String> {
        self.password.error()
    }

    /// Returns the form.
    pub fn form(&self) -> &VForm {
        &self.form
    }
}
