//! Consultation repository — the ownership cascade.
//!
//! Consultations carry no doctor column. The doctor authorized to act on
//! one is whoever owns the referenced patient, so reads and deletes embed
//! the patient join (or an ownership subquery) in the statement itself
//! rather than checking first and acting second. Writes that attach or
//! re-point a consultation resolve the target patient through the
//! tenant-scoped patient lookup before touching anything.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection};

use crate::db::repository::patient;
use crate::db::DatabaseError;
use crate::models::{Consultation, ConsultationPatch, NewConsultation, PageQuery};

const CONSULTATION_COLUMNS: &str =
    "c.id, c.patient_id, c.record_date, c.note, c.attachment, c.created_at";

/// Fetch one consultation if and only if its patient belongs to the
/// given doctor. The ownership check and the fetch are one query.
pub fn get_owned(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
) -> Result<Option<Consultation>, DatabaseError> {
    let result = conn.query_row(
        &format!(
            "SELECT {CONSULTATION_COLUMNS}
             FROM consultations c
             JOIN patients p ON p.id = c.patient_id
             WHERE c.id = ?1 AND p.doctor_id = ?2"
        ),
        params![id, doctor_id],
        consultation_from_row,
    );

    match result {
        Ok(consultation) => Ok(Some(consultation)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create a consultation under a patient the caller owns.
///
/// Returns `Ok(None)` when the patient is absent or belongs to another
/// doctor — the two cases are indistinguishable to the caller.
pub fn insert_for_patient(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    consultation: &NewConsultation,
) -> Result<Option<Consultation>, DatabaseError> {
    if patient::get_owned(conn, patient_id, doctor_id)?.is_none() {
        return Ok(None);
    }

    conn.execute(
        "INSERT INTO consultations (patient_id, record_date, note, attachment)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            patient_id,
            consultation.record_date.to_string(),
            consultation.note,
            consultation.attachment,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_owned(conn, id, doctor_id)
}

/// List a patient's consultations, newest first.
///
/// Ownership of the patient is resolved before anything is listed; an
/// unauthorized caller gets `None`, never a partial page.
pub fn list_for_patient(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    page: &PageQuery,
) -> Result<Option<(Vec<Consultation>, i64)>, DatabaseError> {
    if patient::get_owned(conn, patient_id, doctor_id)?.is_none() {
        return Ok(None);
    }

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM consultations WHERE patient_id = ?1",
        params![patient_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSULTATION_COLUMNS}
         FROM consultations c
         WHERE c.patient_id = ?1
         ORDER BY c.record_date DESC, c.id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt.query_map(
        params![patient_id, page.per_page(), page.offset()],
        consultation_from_row,
    )?;

    let mut consultations = Vec::new();
    for row in rows {
        consultations.push(row?);
    }
    Ok(Some((consultations, total)))
}

/// Apply a partial update to an owned consultation.
///
/// A patch that re-points `patient_id` is honored only when the caller
/// owns the target patient as well; a foreign or absent target reads as
/// `None`, exactly like a miss on the consultation itself.
pub fn update_owned(
    conn: &Connection,
    id: i64,
    doctor_id: i64,
    patch: &ConsultationPatch,
) -> Result<Option<Consultation>, DatabaseError> {
    let Some(existing) = get_owned(conn, id, doctor_id)? else {
        return Ok(None);
    };

    if let Some(target) = patch.patient_id {
        if target != existing.patient_id
            && patient::get_owned(conn, target, doctor_id)?.is_none()
        {
            return Ok(None);
        }
    }

    if patch.is_empty() {
        return Ok(Some(existing));
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(v) = patch.patient_id {
        sets.push("patient_id = ?");
        values.push(Box::new(v));
    }
    if let Some(v) = &patch.record_date {
        sets.push("record_date = ?");
        values.push(Box::new(v.to_string()));
    }
    if let Some(v) = &patch.note {
        sets.push("note = ?");
        values.push(Box::new(v.clone()));
    }
    if let Some(v) = &patch.attachment {
        sets.push("attachment = ?");
        values.push(Box::new(v.clone()));
    }

    // Ownership guard stays inside the UPDATE.
    values.push(Box::new(id));
    values.push(Box::new(doctor_id));
    let sql = format!(
        "UPDATE consultations SET {}
         WHERE id = ? AND patient_id IN (SELECT id FROM patients WHERE doctor_id = ?)",
        sets.join(", ")
    );
    conn.execute(&sql, params_from_iter(values.iter().map(|v| v.as_ref())))?;

    get_owned(conn, id, doctor_id)
}

/// Delete an owned consultation. Single statement with the ownership
/// subquery in the WHERE clause; a foreign id deletes nothing.
pub fn delete_owned(conn: &Connection, id: i64, doctor_id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM consultations
         WHERE id = ?1 AND patient_id IN (SELECT id FROM patients WHERE doctor_id = ?2)",
        params![id, doctor_id],
    )?;
    Ok(affected > 0)
}

fn consultation_from_row(row: &rusqlite::Row<'_>) -> Result<Consultation, rusqlite::Error> {
    Ok(Consultation {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        record_date: NaiveDate::parse_from_str(&row.get::<_, String>(2)?, "%Y-%m-%d")
            .unwrap_or_default(),
        note: row.get(3)?,
        attachment: row.get(4)?,
        created_at: NaiveDateTime::parse_from_str(
            &row.get::<_, String>(5)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::doctor::insert_doctor;
    use crate::db::repository::patient::insert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{NewDoctor, NewPatient};

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn seed_doctor(conn: &Connection, email: &str) -> i64 {
        insert_doctor(
            conn,
            &NewDoctor {
                name: "Doc".into(),
                last_name: None,
                email: email.into(),
                password_hash: "x".into(),
                specialty: None,
                license: None,
                phone: None,
            },
        )
        .unwrap()
        .id
    }

    fn seed_patient(conn: &Connection, doctor_id: i64, document: &str) -> i64 {
        insert_patient(
            conn,
            doctor_id,
            &NewPatient {
                name: "Juan Pérez".into(),
                document: document.into(),
                birth_date: NaiveDate::from_ymd_opt(1980, 5, 12).unwrap(),
                gender: None,
                insurance: None,
                email: None,
                city: None,
                notes: None,
            },
        )
        .unwrap()
        .id
    }

    fn make_consultation(note: &str) -> NewConsultation {
        NewConsultation {
            record_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            note: note.into(),
            attachment: None,
        }
    }

    #[test]
    fn create_and_fetch_through_cascade() {
        let conn = test_db();
        let doc = seed_doctor(&conn, "a@clinica.test");
        let patient_id = seed_patient(&conn, doc, "30111222");

        let consultation =
            insert_for_patient(&conn, patient_id, doc, &make_consultation("control anual"))
                .unwrap()
                .unwrap();
        assert_eq!(consultation.patient_id, patient_id);

        let fetched = get_owned(&conn, consultation.id, doc).unwrap().unwrap();
        assert_eq!(fetched.note, "control anual");
    }

    #[test]
    fn cascade_hides_foreign_consultation() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_id = seed_patient(&conn, doc_a, "30111222");
        let consultation =
            insert_for_patient(&conn, patient_id, doc_a, &make_consultation("privado"))
                .unwrap()
                .unwrap();

        // No doctor column on consultations, yet B cannot reach it.
        assert!(get_owned(&conn, consultation.id, doc_b).unwrap().is_none());
        assert!(get_owned(&conn, consultation.id, doc_a).unwrap().is_some());
    }

    #[test]
    fn create_under_foreign_patient_reads_as_absent() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_id = seed_patient(&conn, doc_a, "30111222");

        let result =
            insert_for_patient(&conn, patient_id, doc_b, &make_consultation("intrusion")).unwrap();
        assert!(result.is_none());

        // Nothing was written.
        let (list, total) = list_for_patient(&conn, patient_id, doc_a, &PageQuery::default())
            .unwrap()
            .unwrap();
        assert_eq!(total, 0);
        assert!(list.is_empty());
    }

    #[test]
    fn list_unauthorized_gets_nothing_not_partial() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_id = seed_patient(&conn, doc_a, "30111222");
        insert_for_patient(&conn, patient_id, doc_a, &make_consultation("uno"))
            .unwrap()
            .unwrap();
        insert_for_patient(&conn, patient_id, doc_a, &make_consultation("dos"))
            .unwrap()
            .unwrap();

        assert!(list_for_patient(&conn, patient_id, doc_b, &PageQuery::default())
            .unwrap()
            .is_none());

        let (list, total) = list_for_patient(&conn, patient_id, doc_a, &PageQuery::default())
            .unwrap()
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn list_nonexistent_patient_is_none() {
        let conn = test_db();
        let doc = seed_doctor(&conn, "a@clinica.test");
        assert!(list_for_patient(&conn, 9999, doc, &PageQuery::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_owned_consultation() {
        let conn = test_db();
        let doc = seed_doctor(&conn, "a@clinica.test");
        let patient_id = seed_patient(&conn, doc, "30111222");
        let consultation =
            insert_for_patient(&conn, patient_id, doc, &make_consultation("borrador"))
                .unwrap()
                .unwrap();

        let patch = ConsultationPatch {
            note: Some("versión final".into()),
            ..Default::default()
        };
        let updated = update_owned(&conn, consultation.id, doc, &patch)
            .unwrap()
            .unwrap();
        assert_eq!(updated.note, "versión final");
        assert_eq!(updated.patient_id, patient_id);
    }

    #[test]
    fn update_by_foreign_doctor_reads_as_absent() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_id = seed_patient(&conn, doc_a, "30111222");
        let consultation =
            insert_for_patient(&conn, patient_id, doc_a, &make_consultation("original"))
                .unwrap()
                .unwrap();

        let patch = ConsultationPatch {
            note: Some("alterado".into()),
            ..Default::default()
        };
        assert!(update_owned(&conn, consultation.id, doc_b, &patch)
            .unwrap()
            .is_none());

        let stored = get_owned(&conn, consultation.id, doc_a).unwrap().unwrap();
        assert_eq!(stored.note, "original");
    }

    #[test]
    fn repoint_to_own_patient_allowed() {
        let conn = test_db();
        let doc = seed_doctor(&conn, "a@clinica.test");
        let patient_a = seed_patient(&conn, doc, "30111222");
        let patient_b = seed_patient(&conn, doc, "28000111");
        let consultation =
            insert_for_patient(&conn, patient_a, doc, &make_consultation("traslado"))
                .unwrap()
                .unwrap();

        let patch = ConsultationPatch {
            patient_id: Some(patient_b),
            ..Default::default()
        };
        let updated = update_owned(&conn, consultation.id, doc, &patch)
            .unwrap()
            .unwrap();
        assert_eq!(updated.patient_id, patient_b);
    }

    #[test]
    fn repoint_to_foreign_patient_reads_as_absent() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_a = seed_patient(&conn, doc_a, "30111222");
        let patient_b = seed_patient(&conn, doc_b, "28000111");
        let consultation =
            insert_for_patient(&conn, patient_a, doc_a, &make_consultation("fuga"))
                .unwrap()
                .unwrap();

        // Re-pointing at another doctor's patient must fail without
        // confirming that the target exists.
        let patch = ConsultationPatch {
            patient_id: Some(patient_b),
            ..Default::default()
        };
        assert!(update_owned(&conn, consultation.id, doc_a, &patch)
            .unwrap()
            .is_none());

        let stored = get_owned(&conn, consultation.id, doc_a).unwrap().unwrap();
        assert_eq!(stored.patient_id, patient_a);
    }

    #[test]
    fn delete_scoped_through_cascade() {
        let conn = test_db();
        let doc_a = seed_doctor(&conn, "a@clinica.test");
        let doc_b = seed_doctor(&conn, "b@clinica.test");
        let patient_id = seed_patient(&conn, doc_a, "30111222");
        let consultation =
            insert_for_patient(&conn, patient_id, doc_a, &make_consultation("efímero"))
                .unwrap()
                .unwrap();

        assert!(!delete_owned(&conn, consultation.id, doc_b).unwrap());
        assert!(get_owned(&conn, consultation.id, doc_a).unwrap().is_some());

        assert!(delete_owned(&conn, consultation.id, doc_a).unwrap());
        assert!(get_owned(&conn, consultation.id, doc_a).unwrap().is_none());
    }

    #[test]
    fn deleting_patient_cascades_to_consultations() {
        let conn = test_db();
        let doc = seed_doctor(&conn, "a@clinica.test");
        let patient_id = seed_patient(&conn, doc, "30111222");
        let consultation =
            insert_for_patient(&conn, patient_id, doc, &make_consultation("huérfana"))
                .unwrap()
                .unwrap();

        crate::db::repository::patient::delete_owned(&conn, patient_id, doc).unwrap();
        assert!(get_owned(&conn, consultation.id, doc).unwrap().is_none());
    }
}
