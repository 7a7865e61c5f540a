//! Response validators run against the upstream response before its body is
//! handed to the caller.

use reqwest::Response;

use crate::client::Rejection;

/// Accepts or rejects a completed response.
///
/// Any error fails the stream with
/// [`StreamError::ValidationRejected`](crate::client::StreamError::ValidationRejected)
/// and the response body is released without being read.
pub trait ResponseValidator: Send + Sync {
    fn check(&self, response: &Response) -> Result<(), Rejection>;
}

impl<F> ResponseValidator for F
where
    F: Fn(&Response) -> Result<(), Rejection> + Send + Sync,
{
    fn check(&self, response: &Response) -> Result<(), Rejection> {
        self(response)
    }
}

/// Accepts every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ResponseValidator for AcceptAll {
    fn check(&self, _response: &Response) -> Result<(), Rejection> {
        Ok(())
    }
}

/// Accepts 2xx responses and rejects everything else with the status code.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusValidator;

impl ResponseValidator for StatusValidator {
    fn check(&self, response: &Response) -> Result<(), Rejection> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Rejection::new(format!("upstream {} returned {}", response.url(), status))
            .with_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn response(status: u16) -> Response {
        http::Response::builder()
            .status(status)
            .body("")
            .unwrap()
            .into()
    }

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.check(&response(500)).is_ok());
    }

    #[test]
    fn test_status_validator() {
        assert!(StatusValidator.check(&response(200)).is_ok());
        assert!(StatusValidator.check(&response(204)).is_ok());

        let rejection = StatusValidator.check(&response(404)).unwrap_err();
        assert_eq!(rejection.status(), Some(StatusCode::NOT_FOUND));
        assert!(rejection.message().contains("404"));
    }

    #[test]
    fn test_closure_validator() {
        let no_server_errors = |r: &Response| {
            if r.status().is_server_error() {
                Err(Rejection::new("server error").with_status(r.status()))
            } else {
                Ok(())
            }
        };
        assert!(no_server_errors.check(&response(404)).is_ok());
        assert!(no_server_errors.check(&response(503)).is_err());
    }
}
