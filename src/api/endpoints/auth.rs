//! Account endpoints: registration, login, identity echo.
//!
//! Registration sits behind the bootstrap gate: the very first doctor
//! self-registers without a credential; afterwards only an authenticated
//! doctor can register a colleague.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{issue_token, DoctorIdentity};
use crate::db::repository::doctor;
use crate::models::{Doctor, NewDoctor};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
    pub specialty: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub doctor: Doctor,
    pub token: String,
}

/// `POST /api/doctors` — register a doctor (bootstrap-gated).
pub async fn register(
    State(ctx): State<ApiContext>,
    sponsor: Option<Extension<DoctorContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    validate_registration(&body)?;

    match &sponsor {
        Some(Extension(doctor)) => tracing::info!(
            sponsor = doctor.identity.id,
            email = %body.email,
            "registering doctor"
        ),
        None => tracing::info!(email = %body.email, "registering first doctor (bootstrap)"),
    }

    let conn = ctx.conn()?;

    if doctor::find_by_email(&conn, &body.email)?.is_some() {
        return Err(ApiError::Validation(
            "a doctor with this email already exists".into(),
        ));
    }

    let created = doctor::insert_doctor(
        &conn,
        &NewDoctor {
            name: body.name,
            last_name: body.last_name,
            email: body.email,
            password_hash: hash_password(&body.password),
            specialty: body.specialty,
            license: body.license,
            phone: body.phone,
        },
    )?;

    let token = issue_token(&identity_of(&created), &ctx.config)
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            doctor: created,
            token,
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let conn = ctx.conn()?;

    // Unknown email and wrong password produce the same outcome.
    let found = doctor::find_by_email(&conn, &body.email)?;
    let Some(doctor) = found.filter(|d| verify_password(&body.password, &d.password_hash))
    else {
        tracing::debug!(email = %body.email, "login rejected");
        return Err(ApiError::Unauthenticated);
    };

    let token = issue_token(&identity_of(&doctor), &ctx.config).map_err(ApiError::from)?;

    tracing::info!(doctor = doctor.id, "login");
    Ok(Json(SessionResponse { doctor, token }))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `PUT /api/auth/password` — requires the current password again even
/// though the caller already holds a valid token.
pub async fn change_password(
    State(ctx): State<ApiContext>,
    Extension(doctor): Extension<DoctorContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if body.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "password must have at least 6 characters".into(),
        ));
    }

    let conn = ctx.conn()?;
    let stored = doctor::get_doctor(&conn, doctor.identity.id)?
        .ok_or(ApiError::Unauthenticated)?;

    if !verify_password(&body.current_password, &stored.password_hash) {
        return Err(ApiError::Unauthenticated);
    }

    doctor::update_password(&conn, stored.id, &hash_password(&body.new_password))?;
    tracing::info!(doctor = stored.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me` — identity as reconstructed from the credential.
pub async fn me(
    Extension(doctor): Extension<DoctorContext>,
) -> Json<DoctorIdentity> {
    Json(doctor.identity)
}

fn identity_of(doctor: &Doctor) -> DoctorIdentity {
    let display_name = match &doctor.last_name {
        Some(last) => format!("{} {}", doctor.name, last),
        None => doctor.name.clone(),
    };
    DoctorIdentity {
        id: doctor.id,
        email: doctor.email.clone(),
        display_name,
    }
}

fn validate_registration(body: &RegisterRequest) -> Result<(), ApiError> {
    if body.name.trim().len() < 2 {
        return Err(ApiError::Validation("name must have at least 2 characters".into()));
    }
    if !body.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".into()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must have at least 6 characters".into(),
        ));
    }
    Ok(())
}
