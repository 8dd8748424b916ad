use crate::auth::{password, session};
use crate::auth::current_user::CurrentUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use chrono::{Duration, Utc};
use model::entities::prelude::{Account, ResetToken, StudentProfile};
use model::entities::{account, reset_token, student_profile};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// How long a password reset token stays redeemable.
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Request body for registering a new account
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Given and family name separated by whitespace, exactly two tokens
    #[validate(length(min = 1))]
    pub full_name: String,
    /// Login email (must be unique)
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            is_superuser: model.is_superuser,
        }
    }
}

/// Successful login: a bearer token plus where the client should go next
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// "home" when the account is ready, "complete-profile" when the
    /// student still has to fill in their profile
    pub next: String,
    pub account: AccountResponse,
}

/// Request body for starting a password reset
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset credentials to put into the reset link
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordResponse {
    /// base64url-encoded account id
    pub uid: String,
    /// Single-use raw token; only its hash is stored
    pub token: String,
}

/// Request body for completing a password reset
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    pub uid: String,
    pub token: String,
    #[validate(length(min = 8))]
    pub new_password: String,
    pub confirm_password: String,
}

/// Request body for changing the password of a logged-in account
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

fn internal_error(context: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Internal server error while {context}"),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

fn invalid_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials provided".to_string(),
            code: "INVALID_CREDENTIALS".to_string(),
            success: false,
        }),
    )
}

/// True when a database error is a unique-constraint violation
pub(crate) fn is_unique_violation(db_error: &DbErr) -> bool {
    match db_error {
        DbErr::Exec(exec_err) => {
            let error_msg = exec_err.to_string().to_lowercase();
            error_msg.contains("unique") || error_msg.contains("constraint")
        }
        _ => false,
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Malformed full name or invalid fields", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Registering account for email: {}", request.email);

    // The form collects one full-name field; it must split into given and
    // family name, nothing more and nothing less.
    let name_parts: Vec<&str> = request.full_name.split_whitespace().collect();
    let [first_name, last_name] = name_parts.as_slice() else {
        warn!("Rejecting registration with malformed full name");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Full name must consist of a first and a last name".to_string(),
                code: "INVALID_FULL_NAME".to_string(),
                success: false,
            }),
        ));
    };

    let password_hash = password::hash_string(&request.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error("creating account")
    })?;

    let new_account = account::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        email: Set(request.email.clone()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        is_superuser: Set(false),
        date_joined: Set(Utc::now()),
        ..Default::default()
    };

    match new_account.insert(&state.db).await {
        Ok(account_model) => {
            info!(
                "Account created successfully with ID: {}, email: {}",
                account_model.id, account_model.email
            );
            let response = ApiResponse {
                data: AccountResponse::from(account_model),
                message: "Account created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create account '{}': {}", request.email, db_error);

            if is_unique_violation(&db_error) {
                Err((
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: format!("Email '{}' is already registered", request.email),
                        code: "EMAIL_ALREADY_EXISTS".to_string(),
                        success: false,
                    }),
                ))
            } else {
                Err(internal_error("creating account"))
            }
        }
    }
}

/// Authenticate and open a session
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Login attempt for email: {}", request.email);

    let account_model = Account::find()
        .filter(account::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up account '{}': {}", request.email, e);
            internal_error("logging in")
        })?
        .ok_or_else(invalid_credentials)?;

    if !account_model.is_active {
        warn!("Login attempt for deactivated account {}", account_model.id);
        return Err(invalid_credentials());
    }

    let verified = password::verify_string(&request.password, &account_model.password_hash)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            internal_error("logging in")
        })?;
    if !verified {
        return Err(invalid_credentials());
    }

    // Superusers and students who already completed their profile go home;
    // everyone else is sent to the complete-profile flow first.
    let has_profile = StudentProfile::find()
        .filter(student_profile::Column::AccountId.eq(account_model.id))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up student profile: {}", e);
            internal_error("logging in")
        })?
        .is_some();

    let next = if account_model.is_superuser || has_profile {
        "home"
    } else {
        "complete-profile"
    };

    let token = session::create_session_token(&account_model, &state.secret_key).map_err(|e| {
        error!("Failed to create session token: {}", e);
        internal_error("logging in")
    })?;

    info!("Account {} logged in, next: {}", account_model.id, next);

    let response = ApiResponse {
        data: LoginResponse {
            token,
            next: next.to_string(),
            account: AccountResponse::from(account_model),
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Terminate the session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>)
    )
)]
#[instrument]
pub async fn logout() -> Json<ApiResponse<String>> {
    // Sessions are stateless bearer tokens; logging out always succeeds and
    // the client discards its token.
    Json(ApiResponse {
        data: "Logged out".to_string(),
        message: "Logged out".to_string(),
        success: true,
    })
}

/// Issue a single-use password reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset token issued", body = ApiResponse<ForgotPasswordResponse>),
        (status = 400, description = "Unknown email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Password reset requested for email: {}", request.email);

    let account_model = Account::find()
        .filter(account::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up account '{}': {}", request.email, e);
            internal_error("issuing reset token")
        })?
        .ok_or_else(|| {
            warn!("Password reset requested for unknown email");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid email".to_string(),
                    code: "INVALID_EMAIL".to_string(),
                    success: false,
                }),
            )
        })?;

    let raw_token = password::generate_reset_token();
    let token_hash = password::hash_string(&raw_token).map_err(|e| {
        error!("Failed to hash reset token: {}", e);
        internal_error("issuing reset token")
    })?;

    let now = Utc::now();
    reset_token::ActiveModel {
        account_id: Set(account_model.id),
        token_hash: Set(token_hash),
        created_at: Set(now),
        expires_at: Set(now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)),
        used_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        error!("Failed to store reset token: {}", e);
        internal_error("issuing reset token")
    })?;

    info!("Issued reset token for account {}", account_model.id);

    let response = ApiResponse {
        data: ForgotPasswordResponse {
            uid: password::encode_account_id(account_model.id),
            token: raw_token,
        },
        message: "Reset token issued".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Complete a password reset
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<String>),
        (status = 400, description = "Passwords do not match", body = ErrorResponse),
        (status = 401, description = "Invalid or expired reset token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ResetPasswordRequest>>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    if request.new_password != request.confirm_password {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Password doesn't match".to_string(),
                code: "PASSWORD_MISMATCH".to_string(),
                success: false,
            }),
        ));
    }

    let invalid_token = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or expired reset token".to_string(),
                code: "INVALID_RESET_TOKEN".to_string(),
                success: false,
            }),
        )
    };

    let account_id = password::decode_account_id(&request.uid).ok_or_else(invalid_token)?;

    let account_model = Account::find_by_id(account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up account {}: {}", account_id, e);
            internal_error("resetting password")
        })?
        .ok_or_else(invalid_token)?;

    // The raw token is matched against every live token hash for the
    // account; expired and already-used rows never qualify.
    let candidates = ResetToken::find()
        .filter(reset_token::Column::AccountId.eq(account_model.id))
        .filter(reset_token::Column::UsedAt.is_null())
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load reset tokens: {}", e);
            internal_error("resetting password")
        })?;

    let now = Utc::now();
    let matched = candidates.into_iter().find(|candidate| {
        candidate.expires_at > now
            && password::verify_string(&request.token, &candidate.token_hash).unwrap_or(false)
    });
    let matched = matched.ok_or_else(invalid_token)?;

    let password_hash = password::hash_string(&request.new_password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error("resetting password")
    })?;

    let mut account_active: account::ActiveModel = account_model.into();
    account_active.password_hash = Set(password_hash);
    account_active.update(&state.db).await.map_err(|e| {
        error!("Failed to update password for account {}: {}", account_id, e);
        internal_error("resetting password")
    })?;

    // Burn the token
    let mut token_active: reset_token::ActiveModel = matched.into();
    token_active.used_at = Set(Some(now));
    token_active.update(&state.db).await.map_err(|e| {
        error!("Failed to mark reset token as used: {}", e);
        internal_error("resetting password")
    })?;

    info!("Password reset completed for account {}", account_id);

    Ok(Json(ApiResponse {
        data: format!("Password reset for account {account_id}"),
        message: "Password reset successfully".to_string(),
        success: true,
    }))
}

/// Change the password of the logged-in account
#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 401, description = "Old password does not verify", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Valid(Json(request)): Valid<Json<ChangePasswordRequest>>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    let account_model = Account::find_by_id(user.account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up account {}: {}", user.account_id, e);
            internal_error("changing password")
        })?
        .ok_or_else(|| {
            warn!("Session for missing account {}", user.account_id);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Account not found".to_string(),
                    code: "ACCOUNT_NOT_FOUND".to_string(),
                    success: false,
                }),
            )
        })?;

    let verified = password::verify_string(&request.old_password, &account_model.password_hash)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            internal_error("changing password")
        })?;
    if !verified {
        return Err(invalid_credentials());
    }

    let password_hash = password::hash_string(&request.new_password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error("changing password")
    })?;

    let account_id = account_model.id;
    let mut account_active: account::ActiveModel = account_model.into();
    account_active.password_hash = Set(password_hash);
    account_active.update(&state.db).await.map_err(|e| {
        error!("Failed to update password for account {}: {}", account_id, e);
        internal_error("changing password")
    })?;

    info!("Password changed for account {}", account_id);

    Ok(Json(ApiResponse {
        data: "Password changed".to_string(),
        message: "Password changed successfully".to_string(),
        success: true,
    }))
}
