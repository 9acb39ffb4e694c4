//! Patient endpoints. Every repository call carries the verified
//! caller's doctor id; a patient owned by another doctor is reported as
//! not found, indistinguishable from true absence.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::db::repository::patient;
use crate::models::{NewPatient, Patient, PatientFilter, PatientPatch};

const PATIENT_NOT_FOUND: &str = "Patient not found";

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// `GET /api/patients` — the caller's patients, searchable and paginated.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.conn()?;
    let (patients, total) = patient::list_for_doctor(&conn, doctor.identity.id, &filter)?;

    let per_page = filter.per_page();
    Ok(Json(PatientsResponse {
        patients,
        total,
        page: filter.page(),
        per_page,
        total_pages: (total + per_page - 1) / per_page,
    }))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.conn()?;
    patient::get_owned(&conn, id, doctor.identity.id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))
}

/// `POST /api/patients` — the owner is always the authenticated caller.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Json(body): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    if body.document.trim().is_empty() {
        return Err(ApiError::Validation("document is required".into()));
    }

    let conn = ctx.conn()?;

    if patient::find_by_document(&conn, &body.document, doctor.identity.id)?.is_some() {
        return Err(ApiError::Validation(
            "a patient with this document already exists".into(),
        ));
    }

    let created = patient::insert_patient(&conn, doctor.identity.id, &body)?;
    tracing::info!(doctor = doctor.identity.id, patient = created.id, "patient created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/patients/:id` — partial update; a patch naming a
/// different owner is the one request answered with 403.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
    Json(patch): Json<PatientPatch>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.conn()?;
    patient::update_owned(&conn, id, doctor.identity.id, &patch)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))
}

/// `DELETE /api/patients/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.conn()?;
    if patient::delete_owned(&conn, id, doctor.identity.id)? {
        tracing::info!(doctor = doctor.identity.id, patient = id, "patient deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(PATIENT_NOT_FOUND.into()))
    }
}
