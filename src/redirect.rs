//! Redirect policies consulted before each redirect hop is followed.

use reqwest::{Request, Url};

use crate::client::Rejection;

/// Number of hops followed when no policy is configured.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Decides whether a redirect hop should be followed.
///
/// `next` is the request about to be sent; `via` lists the URLs already
/// requested, oldest first. Returning an error aborts the stream with
/// [`StreamError::RedirectRejected`](crate::client::StreamError::RedirectRejected).
///
/// Closures with the same signature implement this trait.
pub trait RedirectPolicy: Send + Sync {
    fn check(&self, next: &Request, via: &[Url]) -> Result<(), Rejection>;
}

impl<F> RedirectPolicy for F
where
    F: Fn(&Request, &[Url]) -> Result<(), Rejection> + Send + Sync,
{
    fn check(&self, next: &Request, via: &[Url]) -> Result<(), Rejection> {
        self(next, via)
    }
}

/// Refuses every redirect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreventRedirects;

impl RedirectPolicy for PreventRedirects {
    fn check(&self, _next: &Request, _via: &[Url]) -> Result<(), Rejection> {
        Err(Rejection::new("redirects forbidden"))
    }
}

/// Follows at most the given number of hops.
#[derive(Debug, Clone, Copy)]
pub struct LimitRedirects(pub usize);

impl Default for LimitRedirects {
    fn default() -> Self {
        Self(DEFAULT_MAX_REDIRECTS)
    }
}

impl RedirectPolicy for LimitRedirects {
    fn check(&self, _next: &Request, via: &[Url]) -> Result<(), Rejection> {
        if via.len() > self.0 {
            return Err(Rejection::new(format!("stopped after {} redirects", self.0)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn request(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).unwrap())
    }

    fn visited(n: usize) -> Vec<Url> {
        (0..n)
            .map(|i| Url::parse(&format!("http://hop.local/{}", i)).unwrap())
            .collect()
    }

    #[test]
    fn test_prevent_redirects() {
        let err = PreventRedirects
            .check(&request("http://up.local/next"), &visited(1))
            .unwrap_err();
        assert_eq!(err.message(), "redirects forbidden");
    }

    #[test]
    fn test_limit_redirects() {
        let policy = LimitRedirects(2);
        let next = request("http://up.local/next");
        assert!(policy.check(&next, &visited(1)).is_ok());
        assert!(policy.check(&next, &visited(2)).is_ok());
        assert_eq!(
            policy.check(&next, &visited(3)).unwrap_err().message(),
            "stopped after 2 redirects"
        );
    }

    #[test]
    fn test_closure_policy() {
        let same_host = |next: &Request, via: &[Url]| {
            if via.iter().all(|u| u.host_str() == next.url().host_str()) {
                Ok(())
            } else {
                Err(Rejection::new("cross-host redirect"))
            }
        };
        assert!(same_host.check(&request("http://hop.local/x"), &visited(3)).is_ok());
        assert!(same_host.check(&request("http://other.local/x"), &visited(1)).is_err());
    }
}
