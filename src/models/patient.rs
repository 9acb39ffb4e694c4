use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A patient record. `doctor_id` is the isolation key: set once at
/// creation from the authenticated caller, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub doctor_id: i64,
    pub name: String,
    pub document: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub insurance: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Create payload. Deliberately has no owner field: the owning doctor
/// always comes from the verified credential, never from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub document: String,
    pub birth_date: NaiveDate,
    pub gender: Option<String>,
    pub insurance: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields are left unchanged. `doctor_id` is
/// accepted for parsing only so that reassignment attempts can be
/// rejected explicitly instead of silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub insurance: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub doctor_id: Option<i64>,
}

impl PatientPatch {
    /// True when no updatable field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.document.is_none()
            && self.birth_date.is_none()
            && self.gender.is_none()
            && self.insurance.is_none()
            && self.email.is_none()
            && self.city.is_none()
            && self.notes.is_none()
    }
}
