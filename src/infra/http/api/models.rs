use serde::{Deserialize, Serialize};

use crate::application::subscriptions::{
    CreateSubscriptionCommand, SubscriptionTotalQuery, UpdateSubscriptionCommand,
};

/// Missing fields deserialize to empty values and are rejected by the
/// service with a field-specific message.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionCreateRequest {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl From<SubscriptionCreateRequest> for CreateSubscriptionCommand {
    fn from(request: SubscriptionCreateRequest) -> Self {
        Self {
            service_name: request.service_name,
            price: request.price,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionUpdateRequest {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<SubscriptionUpdateRequest> for UpdateSubscriptionCommand {
    fn from(request: SubscriptionUpdateRequest) -> Self {
        Self {
            service_name: request.service_name,
            price: request.price,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TotalQueryParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

impl From<TotalQueryParams> for SubscriptionTotalQuery {
    fn from(params: TotalQueryParams) -> Self {
        Self {
            start_date: params.start_date,
            end_date: params.end_date,
            user_id: params.user_id,
            service_name: params.service_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalResponse {
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub result: String,
}

impl DeleteResponse {
    pub fn success() -> Self {
        Self {
            result: "success".to_string(),
        }
    }
}
