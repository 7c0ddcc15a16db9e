use reqwest::{Response, StatusCode};
use tc_core::RepositoryError;

/// Pass successful responses through and map failures onto
/// [`RepositoryError`].
pub(crate) async fn check(response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

pub(crate) fn status_error(
    status: StatusCode,
    body: &str,
) -> RepositoryError {
    match status {
        StatusCode::NOT_FOUND => RepositoryError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepositoryError::Configuration(
            format!("remote service rejected the credentials ({status})"),
        ),
        _ => RepositoryError::Database(format!("remote service returned {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn maps_statuses_onto_repository_errors() {
        assert_eq!(status_error(StatusCode::NOT_FOUND, ""), RepositoryError::NotFound);
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            RepositoryError::Configuration(_)
        ));
        assert_eq!(
            status_error(StatusCode::UNPROCESSABLE_ENTITY, "bad field"),
            RepositoryError::Database(
                "remote service returned 422 Unprocessable Entity: bad field".to_string()
            )
        );
    }
}
