//! Patient repository, scoped to the calling doctor.
//!
//! The tenant predicate `doctor_id = ?` is part of every statement here.
//! Search and pagination only ever narrow that predicate. A patient that
//! exists but belongs to another doctor reads as absent.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection};

use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient, PatientFilter, PatientPatch};

const PATIENT_COLUMNS: &str =
    "id, doctor_id, name, document, birth_date, gender, insurance, email, city, notes, created_at";

/// Columns the search filter matches against, case-insensitively.
const SEARCH_CLAUSE: &str = " AND (LOWER(name) LIKE ?2 OR LOWER(document) LIKE ?2
     OR LOWER(insurance) LIKE ?2 OR LOWER(city) LIKE ?2 OR LOWER(email) LIKE ?2)";

/// List a doctor's patients, newest first, with the total count under
/// the same predicate.
pub fn list_for_doctor(
    conn: &Connection,
    doctor_id: i64,
    filter: &PatientFilter,
) -> Result<(Vec<Patient>, i64), DatabaseError> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let where_clause = if pattern.is_some() {
        format!("WHERE doctor_id = ?1{SEARCH_CLAUSE}")
    } else {
        "WHERE doctor_id = ?1".to_string()
    };

    let total: i64 = match &pattern {
        Some(p) => conn.query_row(
            &format!("SELECT COUNT(*) FROM patients {where_clause}"),
            params![doctor_id, p],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            &format!("SELECT COUNT(*) FROM patients {where_clause}"),
            params![doctor_id],
            |row| row.get(0),
        )?,
    };

    let (limit_marks, limit, offset) = if pattern.is_some() {
        ("LIMIT ?3 OFFSET ?4", filter.per_page(), filter.offset())
    } else {
        ("LIMIT ?2 OFFSET ?3", filter.per_page(), filter.offset())
    };
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients {where_clause} ORDER BY id DESC {limit_marks}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = match &pattern {
        Some(p) => stmt.query_map(params![doctor_id, p, limit, offset], patient_from_row)?,
        None => stmt.query_map(params![doctor_id, limit, offset], patient_from_row)?,
    };

    let mut patients = Vec::new();
    for row in rows {
        patients.push(row?);
    }
    Ok((patients, total))
}

/// Fetch one patient if and only if it belongs to the given doctor.
pub fn get_owned(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
) -> Result<Option<Patient>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1 AND doctor_id = ?2"),
        params![id, doctor_id],
        patient_from_row,
    );

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Tenant-scoped duplicate lookup by national document number.
pub fn find_by_document(
    conn: &Connection,
    document: &str,
    doctor_id: i64,
) -> Result<Option<Patient>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE document = ?1 AND doctor_id = ?2"),
        params![document, doctor_id],
        patient_from_row,
    );

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create a patient for the given doctor. The owner column is taken from
/// the `doctor_id` argument — `NewPatient` carries no owner field, so a
/// client cannot smuggle one in. Single INSERT; the owner is never
/// absent, not even transiently.
pub fn insert_patient(
    conn: &Connection,
    doctor_id: i64,
    patient: &NewPatient,
) -> Result<Patient, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (doctor_id, name, document, birth_date, gender, insurance, email, city, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            doctor_id,
            patient.name,
            patient.document,
            patient.birth_date.to_string(),
            patient.gender,
            patient.insurance,
            patient.email,
            patient.city,
            patient.notes,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_owned(conn, id, doctor_id)?.ok_or_else(|| {
        DatabaseError::ConstraintViolation(format!("inserted patient {id} not readable"))
    })
}

/// Apply a partial update to an owned patient.
///
/// Returns `Ok(None)` when the patient is absent or foreign (the caller
/// reports 404 either way). A patch that names a different `doctor_id`
/// fails with [`DatabaseError::OwnerImmutable`] and leaves the row
/// untouched — the one case surfaced as 403, since the caller already
/// proved ownership to get this far.
pub fn update_owned(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
    patch: &PatientPatch,
) -> Result<Option<Patient>, DatabaseError> {
    let Some(existing) = get_owned(conn, id, doctor_id)? else {
        return Ok(None);
    };

    if let Some(target) = patch.doctor_id {
        if target != existing.doctor_id {
            return Err(DatabaseError::OwnerImmutable);
        }
    }

    if patch.is_empty() {
        return Ok(Some(existing));
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(v) = &patch.name {
        sets.push("name = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.document {
        sets.push("document = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.birth_date {
        sets.push("birth_date = ?");
        values.push(Box::new(v.to_string()));
    }
    if let Some(v) = &patch.gender {
        sets.push("gender = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.insurance {
        sets.push("insurance = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.email {
        sets.push("email = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.city {
        sets.push("city = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.notes {
        sets.push("notes = ?");
        values.push(Box::new(v.clone()));
    }

    // The tenant predicate stays in the UPDATE itself, so the write can
    // never land on a row the ownership check did not cover.
    values.push(Box::new(id));
    values.push(Box::new(doctor_id));
    let sql = format!(
        "UPDATE patients SET {} WHERE id = ? AND doctor_id = ?",
        sets.join(", ")
    );
    conn.execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))?;

    get_owned(conn, id, doctor_id)
}

/// Delete an owned patient. Single statement; the affected-row count is
/// the outcome, so a foreign id deletes nothing and reads as absent.
pub fn delete_owned(conn: &Connection, id: i64, doctor_id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM patients WHERE id = ?1 AND doctor_id = ?2",
        params![id, doctor_id],
    )?;
    Ok(affected > 0)
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        name: row.get(2)?,
        document: row.get(3)?,
        birth_date: NaiveDate::parse_from_str(&row.get::<_, String>(4)?, "%Y-%m-%d")
            .unwrap_or_default(),
        gender: row.get(5)?,
        insurance: row.get(6)?,
        email: row.get(7)?,
        city: row.get(8)?,
        notes: row.get(9)?,
        created_at: NaiveDateTime::parse_from_str(
            &row.get::<_, String>(10)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_default(),
    })
}
