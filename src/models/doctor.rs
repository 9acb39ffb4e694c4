use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A doctor account — the unit of data isolation. Every patient row
/// carries the id of exactly one doctor; nothing a doctor does can
/// reach rows owned by another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    /// PBKDF2 verifier, never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub specialty: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Insert payload for a new doctor. The password arrives already hashed;
/// plaintext never reaches the repository layer.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub specialty: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
}
