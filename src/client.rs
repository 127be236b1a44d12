//! Client for the Kwikset account API.
//!
//! Login is a Cognito user-pool exchange in two phases: [`Api::authenticate`]
//! proves the password with SRP and stops at the second-factor challenge,
//! [`Api::verify_user`] answers that challenge with the one-time code. Only
//! then does the session hold the tokens the account API accepts.

use crate::cognito::{self, AuthenticationResult, Cognito};
use crate::config::Config;
use crate::home::{Home, HomesResponse};
use crate::srp::{self, Srp};
use async_trait::async_trait;
use chrono::Utc;
use log::*;
use reqwest::Client as HttpClient;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed")]
    Authentication(#[source] cognito::Error),

    #[error("verification failed")]
    Verification(#[source] cognito::Error),

    #[error("failed to list homes")]
    Retrieval(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to list homes: {status} - {body}")]
    RetrievalStatus { status: u16, body: String },

    #[error("password proof failed")]
    Srp(#[from] srp::Error),

    #[error("unexpected challenge from identity provider: {0}")]
    UnexpectedChallenge(String),

    #[error("challenge is missing parameter {0}")]
    MissingParameter(&'static str),

    #[error("session is not authenticated; verify the login first")]
    NotAuthenticated,

    #[error("session has no refresh token")]
    MissingRefreshToken,
}

/// The account operations the setup flow relies on.
#[async_trait]
pub trait Account {
    /// Intermediate credential between the two login phases.
    type PreAuth: Send;

    async fn authenticate(&mut self, password: &str) -> Result<Self::PreAuth, Error>;

    async fn verify_user(&mut self, pre_auth: Self::PreAuth, code: &str) -> Result<(), Error>;

    async fn get_homes(&self) -> Result<Vec<Home>, Error>;

    fn refresh_token(&self) -> Option<&str>;
}

/// Result of the password phase. Consumed by [`Api::verify_user`].
pub struct PreAuth {
    username: String,
    step: Step,
}

enum Step {
    Challenge {
        name: String,
        session: Option<String>,
    },
    // the pool issued tokens without asking for a second factor
    Done(AuthenticationResult),
}

impl PreAuth {
    /// Name of the pending Cognito challenge, if any.
    pub fn challenge(&self) -> Option<&str> {
        match &self.step {
            Step::Challenge { name, .. } => Some(name),
            Step::Done(_) => None,
        }
    }
}

struct Tokens {
    id_token: String,
    refresh_token: Option<String>,
}

impl From<AuthenticationResult> for Tokens {
    fn from(r: AuthenticationResult) -> Self {
        Tokens {
            id_token: r.id_token,
            refresh_token: r.refresh_token,
        }
    }
}

/// Session context for one account, created from its email address.
pub struct Api {
    email: String,
    config: Config,
    http: HttpClient,
    cognito: Cognito,
    tokens: Option<Tokens>,
}

impl Api {
    pub fn new(email: &str) -> Api {
        Api::with_config(email, Config::default())
    }

    pub fn with_config(email: &str, config: Config) -> Api {
        let http = HttpClient::new();
        let cognito = Cognito::new(http.clone(), &config.idp_url, &config.client_id);
        Api {
            email: email.to_string(),
            config,
            http,
            cognito,
            tokens: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub async fn authenticate(&mut self, password: &str) -> Result<PreAuth, Error> {
        let srp = Srp::new();
        let mut params = HashMap::new();
        params.insert("USERNAME", self.email.clone());
        params.insert("SRP_A", srp.srp_a());

        debug!("initiating SRP login");
        let rsp = self
            .cognito
            .initiate_auth("USER_SRP_AUTH", &params)
            .await
            .map_err(Error::Authentication)?;
        if rsp.challenge_name.as_deref() != Some("PASSWORD_VERIFIER") {
            return Err(Error::UnexpectedChallenge(
                rsp.challenge_name.unwrap_or_default(),
            ));
        }

        let p = &rsp.challenge_parameters;
        let user_id = param(p, "USER_ID_FOR_SRP")?;
        let secret_block = param(p, "SECRET_BLOCK")?;
        let timestamp = srp::timestamp(Utc::now());
        let signature = srp.password_claim(
            self.config.pool_name(),
            user_id,
            password,
            param(p, "SALT")?,
            param(p, "SRP_B")?,
            secret_block,
            &timestamp,
        )?;

        let mut responses = HashMap::new();
        responses.insert("TIMESTAMP", timestamp);
        responses.insert("USERNAME", user_id.to_string());
        responses.insert("PASSWORD_CLAIM_SECRET_BLOCK", secret_block.to_string());
        responses.insert("PASSWORD_CLAIM_SIGNATURE", signature);

        debug!("answering password verifier");
        let rsp = self
            .cognito
            .respond_to_auth_challenge("PASSWORD_VERIFIER", rsp.session.as_deref(), &responses)
            .await
            .map_err(Error::Authentication)?;

        let step = match (rsp.authentication_result, rsp.challenge_name) {
            (Some(tokens), _) => Step::Done(tokens),
            (None, Some(name)) if answer_key(&name).is_some() => {
                debug!("identity provider requested {}", name);
                Step::Challenge {
                    name,
                    session: rsp.session,
                }
            }
            (None, name) => return Err(Error::UnexpectedChallenge(name.unwrap_or_default())),
        };

        Ok(PreAuth {
            username: user_id.to_string(),
            step,
        })
    }

    pub async fn verify_user(&mut self, pre_auth: PreAuth, code: &str) -> Result<(), Error> {
        let tokens = match pre_auth.step {
            Step::Done(tokens) => {
                warn!("login needed no verification code; ignoring it");
                tokens
            }
            Step::Challenge { name, session } => {
                let key = answer_key(&name).ok_or_else(|| Error::UnexpectedChallenge(name.clone()))?;
                let mut responses = HashMap::new();
                responses.insert(key, code.to_string());
                responses.insert("USERNAME", pre_auth.username);

                debug!("answering {}", name);
                let rsp = self
                    .cognito
                    .respond_to_auth_challenge(&name, session.as_deref(), &responses)
                    .await
                    .map_err(Error::Verification)?;
                match rsp.authentication_result {
                    Some(tokens) => tokens,
                    None => {
                        return Err(Error::UnexpectedChallenge(
                            rsp.challenge_name.unwrap_or_default(),
                        ))
                    }
                }
            }
        };

        self.tokens = Some(tokens.into());
        Ok(())
    }

    /// Starts a session from a refresh token printed by an earlier login.
    pub async fn renew(&mut self, refresh_token: &str) -> Result<(), Error> {
        let mut params = HashMap::new();
        params.insert("REFRESH_TOKEN", refresh_token.to_string());

        debug!("renewing session from refresh token");
        let rsp = self
            .cognito
            .initiate_auth("REFRESH_TOKEN_AUTH", &params)
            .await
            .map_err(Error::Authentication)?;
        let result = rsp
            .authentication_result
            .ok_or_else(|| Error::UnexpectedChallenge(rsp.challenge_name.unwrap_or_default()))?;

        let mut tokens = Tokens::from(result);
        // Cognito does not rotate refresh tokens on this flow
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        self.tokens = Some(tokens);
        Ok(())
    }

    pub async fn get_homes(&self) -> Result<Vec<Home>, Error> {
        let tokens = self.tokens.as_ref().ok_or(Error::NotAuthenticated)?;
        let url = format!("{}/users/me/homes", self.config.api_url.trim_end_matches('/'));

        debug!("requesting homes");
        let rsp = self
            .http
            .get(&url)
            .bearer_auth(&tokens.id_token)
            .send()
            .await
            .map_err(|e| Error::Retrieval(e.into()))?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(Error::RetrievalStatus {
                status: status.as_u16(),
                body: rsp.text().await.unwrap_or_default(),
            });
        }

        let body = rsp.bytes().await.map_err(|e| Error::Retrieval(e.into()))?;
        let homes: HomesResponse =
            serde_json::from_slice(&body).map_err(|e| Error::Retrieval(e.into()))?;
        debug!("account has {} homes", homes.data.len());
        Ok(homes.data)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref()?.refresh_token.as_deref()
    }
}

#[async_trait]
impl Account for Api {
    type PreAuth = PreAuth;

    async fn authenticate(&mut self, password: &str) -> Result<PreAuth, Error> {
        Api::authenticate(self, password).await
    }

    async fn verify_user(&mut self, pre_auth: PreAuth, code: &str) -> Result<(), Error> {
        Api::verify_user(self, pre_auth, code).await
    }

    async fn get_homes(&self) -> Result<Vec<Home>, Error> {
        Api::get_homes(self).await
    }

    fn refresh_token(&self) -> Option<&str> {
        Api::refresh_token(self)
    }
}

/// Challenge response key carrying the one-time code.
fn answer_key(challenge: &str) -> Option<&'static str> {
    match challenge {
        "SMS_MFA" => Some("SMS_MFA_CODE"),
        "SOFTWARE_TOKEN_MFA" => Some("SOFTWARE_TOKEN_MFA_CODE"),
        "EMAIL_OTP" => Some("EMAIL_OTP_CODE"),
        "CUSTOM_CHALLENGE" => Some("ANSWER"),
        _ => None,
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, Error> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or(Error::MissingParameter(name))
}
