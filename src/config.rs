/// Endpoints and identifiers of the Kwikset cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cognito user pool id, e.g. `us-east-1_6B3uo6uKN`.
    pub pool_id: String,
    /// Cognito app client id used by the Kwikset mobile app.
    pub client_id: String,
    /// Cognito identity provider endpoint.
    pub idp_url: String,
    /// Base URL of the account API, without a trailing slash.
    pub api_url: String,
}

const POOL_ID: &str = "us-east-1_6B3uo6uKN";
const CLIENT_ID: &str = "5eu1cdkjp1itd1fi7b91m6g79s";
const IDP_URL: &str = "https://cognito-idp.us-east-1.amazonaws.com/";
const API_URL: &str = "https://ynk95r1v52.execute-api.us-east-1.amazonaws.com/prod_v1";

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_id: POOL_ID.to_string(),
            client_id: CLIENT_ID.to_string(),
            idp_url: IDP_URL.to_string(),
            api_url: API_URL.to_string(),
        }
    }
}

impl Config {
    /// The pool id without its region prefix. SRP mixes this into the
    /// password hash.
    pub fn pool_name(&self) -> &str {
        match self.pool_id.split_once('_') {
            Some((_, name)) => name,
            None => &self.pool_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_name_strips_region() {
        assert_eq!(Config::default().pool_name(), "6B3uo6uKN");
    }

    #[test]
    fn pool_name_without_region() {
        let c = Config {
            pool_id: "local".to_string(),
            ..Config::default()
        };
        assert_eq!(c.pool_name(), "local");
    }
}
