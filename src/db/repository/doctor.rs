use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Doctor, NewDoctor};

const DOCTOR_COLUMNS: &str =
    "id, name, last_name, email, password_hash, specialty, license, phone, created_at";

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<Doctor, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (name, last_name, email, password_hash, specialty, license, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            doctor.name,
            doctor.last_name,
            doctor.email,
            doctor.password_hash,
            doctor.specialty,
            doctor.license,
            doctor.phone,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_doctor(conn, id)?.ok_or_else(|| {
        DatabaseError::ConstraintViolation(format!("inserted doctor {id} not readable"))
    })
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"),
        params![id],
        doctor_from_row,
    );

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Doctor>, DatabaseError> {
    let result = conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = ?1"),
        params![email],
        doctor_from_row,
    );

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Number of registered doctors. The bootstrap gate calls this on every
/// registration request; it is never cached.
pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_password(
    conn: &Connection,
    id: i64,
    password_hash: &str,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "UPDATE doctors SET password_hash = ?2 WHERE id = ?1",
        params![id, password_hash],
    )?;
    Ok(affected > 0)
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> Result<Doctor, rusqlite::Error> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        specialty: row.get(5)?,
        license: row.get(6)?,
        phone: row.get(7)?,
        created_at: NaiveDateTime::parse_from_str(
            &row.get::<_, String>(8)?,
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap_or_default(),
    })
}
