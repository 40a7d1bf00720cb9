//! Internal error helpers for mapping HTTP/reqwest errors to [`ProviderError`].

use research_llm::ProviderError;

/// Map an HTTP status code (from the Anthropic API) to a [`ProviderError`].
///
/// Reference: <https://docs.anthropic.com/en/api/errors>
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(body.to_string()),
        400 | 404 => ProviderError::InvalidRequest(body.to_string()),
        429 => ProviderError::RateLimited,
        // 529 is Anthropic's overloaded status.
        s @ (500..=528 | 530..=599) => {
            ProviderError::Status { status: s, body: body.to_string() }
        }
        s => ProviderError::Status { status: s, body: body.to_string() },
    }
}

/// Map a [`reqwest::Error`] to a [`ProviderError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::RequestFailed(format!("timed out: {err}"))
    } else {
        ProviderError::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn maps_known_statuses() {
        assert!(matches!(
            map_http_status(StatusCode::UNAUTHORIZED, "bad key"),
            ProviderError::AuthFailed(_)
        ));
        assert!(matches!(
            map_http_status(StatusCode::BAD_REQUEST, "oops"),
            ProviderError::InvalidRequest(_)
        ));
        assert!(matches!(
            map_http_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ProviderError::RateLimited
        ));
    }

    #[test]
    fn maps_server_errors_to_status() {
        let err = map_http_status(StatusCode::INTERNAL_SERVER_ERROR, "down");
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "down");
            }
            _ => panic!("expected Status variant"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn overloaded_status_is_retryable() {
        let err = map_http_status(StatusCode::from_u16(529).unwrap(), "overloaded");
        assert!(err.is_retryable());
    }
}
