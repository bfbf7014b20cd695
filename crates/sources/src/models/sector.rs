use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Performance of one market sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSnapshot {
    /// Sector name (e.g., "IT", "BANKING")
    pub sector: String,

    /// Percentage change over the current session
    pub change_percent_1d: Decimal,

    /// Percentage change over the trailing week
    pub change_percent_1w: Decimal,

    /// Constituents up on the session
    pub advancers: u32,

    /// Constituents down on the session
    pub decliners: u32,

    pub timestamp: DateTime<Utc>,
}
