use platform_api::{ApiError, FieldErrors};
use platform_authz::AuthzError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("employee not found")]
    NotFound,
    #[error("permission denied")]
    Forbidden,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<FieldErrors> for HrError {
    fn from(value: FieldErrors) -> Self {
        HrError::Validation(value)
    }
}

impl From<AuthzError> for HrError {
    fn from(_: AuthzError) -> Self {
        HrError::Forbidden
    }
}

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        match value {
            HrError::Validation(fields) => ApiError::Validation(fields),
            HrError::NotFound => ApiError::NotFound,
            HrError::Forbidden => ApiError::Forbidden,
            HrError::Db(err) => ApiError::internal(anyhow::Error::new(err)),
        }
    }
}
