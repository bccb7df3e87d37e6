use serde::{Deserialize, Serialize};

/// Emitted after every successful ledger mutation that a notifier would care
/// about. Delivery is fire-and-forget; nobody inside the core waits on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub business_id: String,
    pub booking_id: String,
    pub kind: BookingEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Created,
    Cancelled,
    Completed,
}

impl BookingEvent {
    pub fn new(business_id: &str, booking_id: &str, kind: BookingEventKind) -> Self {
        Self {
            business_id: business_id.to_string(),
            booking_id: booking_id.to_string(),
            kind,
        }
    }
}
