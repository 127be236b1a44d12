use serde::Deserialize;
use std::fmt;

/// One property attached to a Kwikset account.
///
/// Every field is required; a record missing any of them fails the listing
/// it came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Home {
    #[serde(rename = "homeid")]
    pub id: HomeId,
    #[serde(rename = "homename")]
    pub name: String,
    #[serde(rename = "ownername")]
    pub owner_name: String,
    #[serde(rename = "email")]
    pub email: String,
}

/// The API has sent home ids both as strings and as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HomeId {
    Text(String),
    Number(i64),
}

impl fmt::Display for HomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomeId::Text(s) => write!(f, "{}", s),
            HomeId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for HomeId {
    fn from(s: &str) -> Self {
        HomeId::Text(s.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomesResponse {
    pub data: Vec<Home>,
}
