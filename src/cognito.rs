//! The two Cognito identity provider calls a user-pool login needs.

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";

#[derive(Error, Debug)]
pub enum Error {
    /// The service rejected the call, e.g. `NotAuthorizedException`.
    #[error("{kind}: {message}")]
    Service { kind: String, message: String },

    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct Cognito {
    http: HttpClient,
    url: String,
    client_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: &'a HashMap<&'a str, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToAuthChallengeRequest<'a> {
    challenge_name: &'a str,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a str>,
    challenge_responses: &'a HashMap<&'a str, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthResponse {
    pub challenge_name: Option<String>,
    pub session: Option<String>,
    #[serde(default)]
    pub challenge_parameters: HashMap<String, String>,
    pub authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(rename = "__type")]
    kind: String,
    #[serde(default)]
    message: String,
}

impl Cognito {
    pub fn new(http: HttpClient, url: &str, client_id: &str) -> Cognito {
        Cognito {
            http,
            url: url.to_string(),
            client_id: client_id.to_string(),
        }
    }

    pub async fn initiate_auth(
        &self,
        flow: &str,
        params: &HashMap<&str, String>,
    ) -> Result<AuthResponse, Error> {
        let body = InitiateAuthRequest {
            auth_flow: flow,
            client_id: &self.client_id,
            auth_parameters: params,
        };
        self.call("InitiateAuth", &body).await
    }

    pub async fn respond_to_auth_challenge(
        &self,
        challenge: &str,
        session: Option<&str>,
        responses: &HashMap<&str, String>,
    ) -> Result<AuthResponse, Error> {
        let body = RespondToAuthChallengeRequest {
            challenge_name: challenge,
            client_id: &self.client_id,
            session,
            challenge_responses: responses,
        };
        self.call("RespondToAuthChallenge", &body).await
    }

    async fn call<T: Serialize>(&self, operation: &str, body: &T) -> Result<AuthResponse, Error> {
        let rsp = self
            .http
            .post(&self.url)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", format!("{}{}", TARGET_PREFIX, operation))
            .json(body)
            .send()
            .await?;

        let status = rsp.status();
        if status.is_success() {
            return Ok(rsp.json::<AuthResponse>().await?);
        }

        let body = rsp.text().await.unwrap_or_default();
        match serde_json::from_str::<ServiceError>(&body) {
            Ok(e) => Err(Error::Service {
                kind: short_kind(&e.kind).to_string(),
                message: e.message,
            }),
            Err(_) => Err(Error::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

// "com.amazonaws...#NotAuthorizedException" -> "NotAuthorizedException"
fn short_kind(kind: &str) -> &str {
    kind.rsplit('#').next().unwrap_or(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_kind_strips_namespace() {
        assert_eq!(
            short_kind("com.amazonaws.cognito#NotAuthorizedException"),
            "NotAuthorizedException"
        );
        assert_eq!(short_kind("CodeMismatchException"), "CodeMismatchException");
    }

    #[test]
    fn challenge_response_deserializes() {
        let json = r#"{
            "ChallengeName": "PASSWORD_VERIFIER",
            "ChallengeParameters": {
                "SALT": "abc",
                "SRP_B": "def",
                "SECRET_BLOCK": "c2VjcmV0",
                "USER_ID_FOR_SRP": "user-1"
            }
        }"#;
        let rsp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(rsp.challenge_name.as_deref(), Some("PASSWORD_VERIFIER"));
        assert_eq!(rsp.challenge_parameters["USER_ID_FOR_SRP"], "user-1");
        assert!(rsp.session.is_none());
        assert!(rsp.authentication_result.is_none());
    }

    #[test]
    fn tokens_deserialize_without_refresh_token() {
        let json = r#"{
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            },
            "ChallengeParameters": {}
        }"#;
        let rsp: AuthResponse = serde_json::from_str(json).unwrap();
        let tokens = rsp.authentication_result.unwrap();
        assert_eq!(tokens.id_token, "id");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[test]
    fn request_uses_pascal_case() {
        let mut params = HashMap::new();
        params.insert("USERNAME", "a@example.com".to_string());
        let body = InitiateAuthRequest {
            auth_flow: "USER_SRP_AUTH",
            client_id: "client",
            auth_parameters: &params,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["AuthFlow"], "USER_SRP_AUTH");
        assert_eq!(json["ClientId"], "client");
        assert_eq!(json["AuthParameters"]["USERNAME"], "a@example.com");
    }
}
