use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A dated consultation entry on a patient's history.
///
/// Carries no doctor id of its own: the tenant authorized to act on a
/// consultation is whoever owns the referenced patient. Every query
/// against this table resolves ownership through that join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub record_date: NaiveDate,
    pub note: String,
    /// Reference string handed back by the external file store, opaque here.
    pub attachment: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Create payload. The parent patient id comes from the route, not the body.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConsultation {
    pub record_date: NaiveDate,
    pub note: String,
    pub attachment: Option<String>,
}

/// Partial update. A present `patient_id` re-points the consultation to
/// another patient and is only honored when the caller owns that patient
/// too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationPatch {
    pub patient_id: Option<i64>,
    pub record_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub attachment: Option<String>,
}

impl ConsultationPatch {
    pub fn is_empty(&self) -> bool {
        self.patient_id.is_none()
            && self.record_date.is_none()
            && self.note.is_none()
            && self.attachment.is_none()
    }
}
