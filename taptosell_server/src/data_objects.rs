use std::fmt::Display;

use serde::{Deserialize, Serialize};
use taptosell_engine::db_types::Role;
use tts_common::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderPayload {
    pub product_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentParams {
    #[serde(default)]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositParams {
    pub user_id: i64,
    pub amount: Money,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalParams {
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductPayload {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub is_variable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeParams {
    pub requested_price: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionSetting {
    pub commission_bps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub user_id: i64,
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIssueRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
