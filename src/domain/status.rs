use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Only ever used for lookups that found no stored payment.
    #[default]
    Unknown,
    Approved,
    Rejected,
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "UNKNOWN",
            Status::Approved => "APPROVED",
            Status::Rejected => "REJECTED",
            Status::Pending => "PENDING",
            Status::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Status {
        match s {
            "APPROVED" => Status::Approved,
            "REJECTED" => Status::Rejected,
            "PENDING" => Status::Pending,
            "COMPLETED" => Status::Completed,
            _ => Status::Unknown,
        }
    }
}

/// Acquirer response codes. Anything not listed resolves to `Pending` so an
/// unrecognised answer is queued for manual review instead of being dropped.
const RESPONSE_CODES: &[(&str, Status)] = &[
    ("00", Status::Approved),
    ("06", Status::Rejected),
    ("39", Status::Rejected),
    ("12", Status::Rejected),
    ("19", Status::Pending),
    ("20", Status::Completed),
];

pub fn resolve_status(code: &str) -> Status {
    RESPONSE_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, status)| *status)
        .unwrap_or(Status::Pending)
}
