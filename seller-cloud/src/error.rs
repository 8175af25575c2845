//! Service-layer error type
//!
//! `ServiceError` bridges database, store and credential errors and the API
//! error (`AppError`), so handlers can propagate with `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::kv::StoreError;
use crate::token::CredentialError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// - `Db`: database or infrastructure error, logged and mapped to a system code
/// - `App`: already an `AppError`, passed through to the client
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::App(AppError::cache(e.to_string()))
    }
}

impl From<CredentialError> for ServiceError {
    fn from(e: CredentialError) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_become_database_code() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn store_errors_become_cache_code() {
        let err: ServiceError = StoreError::Redis("connection refused".into()).into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::CacheError);
    }

    #[test]
    fn app_errors_pass_through() {
        let err: ServiceError = AppError::new(ErrorCode::InvalidDateRange).into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InvalidDateRange);
    }
}
