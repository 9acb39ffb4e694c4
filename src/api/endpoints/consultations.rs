//! Consultation endpoints.
//!
//! Creation and listing hang off the owning patient's route; detail,
//! update and delete address the consultation directly and resolve the
//! caller's right to it through the patient it belongs to. A miss on
//! either level reads as not found.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::db::repository::consultation;
use crate::models::{Consultation, ConsultationPatch, NewConsultation, PageQuery};

const CONSULTATION_NOT_FOUND: &str = "Consultation not found";
const PATIENT_NOT_FOUND: &str = "Patient not found";

#[derive(Serialize)]
pub struct ConsultationsResponse {
    pub consultations: Vec<Consultation>,
    pub total: i64,
}

/// `POST /api/patients/:id/consultations`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(patient_id): Path<i64>,
    Json(body): Json<NewConsultation>,
) -> Result<(StatusCode, Json<Consultation>), ApiError> {
    if body.note.trim().is_empty() {
        return Err(ApiError::Validation("note is required".into()));
    }

    let conn = ctx.conn()?;
    let created = consultation::insert_for_patient(&conn, patient_id, doctor.identity.id, &body)?
        .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;

    tracing::info!(
        doctor = doctor.identity.id,
        patient = patient_id,
        consultation = created.id,
        "consultation created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/patients/:id/consultations` — newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(patient_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ConsultationsResponse>, ApiError> {
    let conn = ctx.conn()?;
    let (consultations, total) =
        consultation::list_for_patient(&conn, patient_id, doctor.identity.id, &page)?
            .ok_or_else(|| ApiError::NotFound(PATIENT_NOT_FOUND.into()))?;

    Ok(Json(ConsultationsResponse {
        consultations,
        total,
    }))
}

/// `GET /api/consultations/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
) -> Result<Json<Consultation>, ApiError> {
    let conn = ctx.conn()?;
    consultation::get_owned(&conn, id, doctor.identity.id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(CONSULTATION_NOT_FOUND.into()))
}

/// `PATCH /api/consultations/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
    Json(patch): Json<ConsultationPatch>,
) -> Result<Json<Consultation>, ApiError> {
    let conn = ctx.conn()?;
    consultation::update_owned(&conn, id, doctor.identity.id, &patch)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(CONSULTATION_NOT_FOUND.into()))
}

/// `DELETE /api/consultations/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.conn()?;
    if consultation::delete_owned(&conn, id, doctor.identity.id)? {
        tracing::info!(
            doctor = doctor.identity.id,
            consultation = id,
            "consultation deleted"
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(CONSULTATION_NOT_FOUND.into()))
    }
}
