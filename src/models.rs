use serde::{Deserialize, Serialize};

/// Grant as listed on the dashboard. Only the fields the list renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrantSummary {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grant {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub amount: i64,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub eligibility: Option<String>,
}

/// Body of `POST /users/register`, also the sign-up form's fields.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /applications`.
#[derive(Debug, Serialize)]
pub struct NewApplication {
    pub grant_id: i64,
}

/// The part of the API's application record this front cares about.
#[derive(Debug, Deserialize)]
pub struct ApplicationReceipt {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationForm {
    #[serde(default)]
    pub grant_id: String,
}
