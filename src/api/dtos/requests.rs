use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// One entry of a PUT /availability batch. Every field is optional on the
/// wire; normalization decides what is usable.
#[derive(Debug, Deserialize)]
pub struct SlotEntry {
    pub slot_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i32>,
}

#[derive(Deserialize)]
pub struct PublishSlotsRequest {
    pub slots: Option<Vec<SlotEntry>>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    #[serde(rename = "qariId")]
    pub qari_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Selector for DELETE /availability/bulk; exactly one of the three forms
/// is honored, checked in this order: dates, start/end range, week start.
#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub dates: Option<Vec<NaiveDate>>,
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "weekStartDate")]
    pub week_start_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct HoldRequest {
    #[serde(rename = "qariId")]
    pub qari_id: Option<i64>,
    pub slot_date: Option<NaiveDate>,
    pub start_time: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub booking_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub booking_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: Option<String>,
    pub payload: Option<Value>,
}
