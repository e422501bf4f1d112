use axum::http::StatusCode;
use roost_accounts::AccountError;
use tracing::error;

/// Map a core failure to the HTTP status returned to clients.
///
/// A missing account, a wrong token and an expired token all come back as
/// 404 so a caller learns nothing about which one it hit.
pub fn status_for(err: AccountError) -> StatusCode {
    match err {
        AccountError::NotFound(_) | AccountError::TokenMismatch | AccountError::Expired => {
            StatusCode::NOT_FOUND
        }
        AccountError::AlreadyExists(_) => StatusCode::CONFLICT,
        AccountError::Conflict => StatusCode::PRECONDITION_FAILED,
        AccountError::InvalidCredential => StatusCode::UNAUTHORIZED,
        AccountError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        AccountError::Internal(e) => {
            error!("Internal error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_are_indistinguishable() {
        let statuses = [
            status_for(AccountError::NotFound("alice".into())),
            status_for(AccountError::TokenMismatch),
            status_for(AccountError::Expired),
        ];
        assert!(statuses.iter().all(|s| *s == StatusCode::NOT_FOUND));
    }

    #[test]
    fn stale_etag_is_a_failed_precondition() {
        assert_eq!(status_for(AccountError::Conflict), StatusCode::PRECONDITION_FAILED);
        assert_eq!(
            status_for(AccountError::AlreadyExists("alice".into())),
            StatusCode::CONFLICT
        );
    }
}
