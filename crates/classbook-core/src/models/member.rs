use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried in the id token issued by the studio's user pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Member UUID used in the data API paths
    #[serde(rename = "cognito:username")]
    pub member_uuid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "given_name", default)]
    pub first_name: Option<String>,
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
}

impl IdTokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|t| Utc::now() >= t).unwrap_or(true)
    }
}

/// Identity of the logged-in member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_uuid: String,
    pub first_name: String,
    pub email: Option<String>,
}

impl From<&IdTokenClaims> for Member {
    fn from(claims: &IdTokenClaims) -> Self {
        Self {
            member_uuid: claims.member_uuid.clone(),
            first_name: claims
                .first_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "member".to_string()),
            email: claims.email.clone(),
        }
    }
}
