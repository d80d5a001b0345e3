use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::order::{Address, VehicleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub uid: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub vehicle_type: VehicleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub status: DriverStatus,
    pub green_score: u32,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: Option<DateTime<Utc>>,
    pub last_logged_out: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_hash: String,
}
