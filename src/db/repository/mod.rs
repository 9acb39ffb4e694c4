//! Tenant-scoped repositories.
//!
//! Every patient operation is parameterized by the calling doctor's id
//! and keeps `doctor_id = ?` in the statement itself. Consultations have
//! no doctor column; their operations resolve ownership through the
//! parent patient. A row owned by another doctor is indistinguishable
//! from an absent row at this layer — callers translate `None` to 404.

pub mod consultation;
pub mod doctor;
pub mod patient;
