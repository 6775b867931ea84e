use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use serde_json::Value;

/// The slot window an external calendar event refers to, in the wall-clock
/// time the calendar reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalWindow {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Extracts the qari the event belongs to.
///
/// Preferred source is a campaign tag of the form `qari-<id>` under
/// `tracking.utm_campaign` (or `tracking.campaign`); the fallback is a
/// `questions_and_answers` entry whose question mentions "qari" and whose
/// answer is a plain number. Events carrying neither cannot be mapped and
/// are dropped by the caller.
pub fn extract_qari_id(payload: &Value) -> Option<i64> {
    let tracking = &payload["tracking"];
    let campaign = tracking["utm_campaign"]
        .as_str()
        .or_else(|| tracking["campaign"].as_str());

    if let Some(campaign) = campaign {
        if let Some(id) = campaign
            .strip_prefix("qari-")
            .or_else(|| campaign.strip_prefix("QARI-"))
            .or_else(|| campaign.strip_prefix("Qari-"))
        {
            if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                return id.parse().ok();
            }
        }
    }

    let qa = payload["questions_and_answers"].as_array()?;
    qa.iter().find_map(|entry| {
        let question = entry["question"].as_str()?;
        if !question.to_lowercase().contains("qari") {
            return None;
        }
        let answer = entry["answer"].as_str()?;
        if answer.is_empty() || !answer.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        answer.parse().ok()
    })
}

/// Reads `payload.scheduled_event.{start_time,end_time}` (RFC3339) into a
/// slot window, truncated to whole minutes. Returns `None` when either
/// timestamp is missing or malformed.
pub fn extract_window(payload: &Value) -> Option<ExternalWindow> {
    let scheduled = &payload["scheduled_event"];
    let start = DateTime::parse_from_rfc3339(scheduled["start_time"].as_str()?).ok()?;
    let end = DateTime::parse_from_rfc3339(scheduled["end_time"].as_str()?).ok()?;

    let start = start.naive_local();
    let end = end.naive_local();

    Some(ExternalWindow {
        slot_date: start.date(),
        start_time: start.time().with_second(0)?.with_nanosecond(0)?,
        end_time: end.time().with_second(0)?.with_nanosecond(0)?,
    })
}
