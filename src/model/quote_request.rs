use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A stored quote request. Written once, never updated.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub firstName: String,
    pub lastName: String,
    pub jobTitle: String,
    pub zipCode: String,
    pub email: String,
    pub number: String,
    pub city: String,
    pub country: String,
    pub message: String,

    pub createdAt: Option<String>,
}
