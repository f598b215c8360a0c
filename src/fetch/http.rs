//! Reqwest-based blocking transport for run output data.

use std::{io::Read, time::Duration};

use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::RANGE,
    StatusCode, Url,
};
use tracing::{debug, warn};

use super::{ByteRange, Credentials, RangeFetcher};
use crate::{
    config::Config,
    error::{Error, Result},
};

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http))
    }

    /// Use an already configured client (proxy, TLS roots, headers).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(Duration::from_secs(cfg.request_timeout()))
    }

    fn get(&self, reference: &Url, credentials: Option<&Credentials>) -> RequestBuilder {
        let request = self.http.get(reference.clone());
        match credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.password)),
            None => request,
        }
    }
}

impl RangeFetcher for HttpFetcher {
    fn read(
        &self,
        reference: &Url,
        range: Option<ByteRange>,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<u8>> {
        let mut request = self.get(reference, credentials);
        let success = match range {
            Some(r) => {
                request = request.header(RANGE, r.header_value());
                StatusCode::PARTIAL_CONTENT
            }
            None => StatusCode::OK,
        };

        debug!(%reference, range = ?range, "GET");
        let resp = request.send()?;
        let resp = check_status(resp, success, reference)?;
        let body = resp.bytes()?.to_vec();

        if let Some(r) = range {
            if body.len() as u64 != r.len() {
                warn!(%reference, expected = r.len(), got = body.len(), "short ranged read");
                return Err(Error::UnexpectedResponse(format!(
                    "expected {} bytes for range {} of '{}', got {}",
                    r.len(),
                    r,
                    reference,
                    body.len()
                )));
            }
        }
        Ok(body)
    }

    fn open(
        &self,
        reference: &Url,
        credentials: Option<&Credentials>,
    ) -> Result<Box<dyn Read + Send>> {
        debug!(%reference, "GET (stream)");
        let resp = self.get(reference, credentials).send()?;
        let resp = check_status(resp, StatusCode::OK, reference)?;
        Ok(Box::new(resp))
    }
}

fn check_status(resp: Response, success: StatusCode, reference: &Url) -> Result<Response> {
    let status = resp.status();
    if status == success {
        return Ok(resp);
    }
    // Drain the body so the connection can be reused; keep it for the message.
    let content = resp.text().ok().filter(|t| !t.trim().is_empty());
    Err(status_error(status, reference, content))
}

fn status_error(status: StatusCode, reference: &Url, content: Option<String>) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(reference.to_string()),
        StatusCode::FORBIDDEN => Error::Forbidden(reference.to_string()),
        StatusCode::UNAUTHORIZED => Error::Unauthorized,
        StatusCode::INTERNAL_SERVER_ERROR => {
            Error::InternalServerError(content.unwrap_or_else(|| "<not specified>".into()))
        }
        other => Error::UnexpectedResponse(format!(
            "{} while accessing '{}' - {}",
            other,
            reference,
            content.as_deref().unwrap_or("<not specified>")
        )),
    }
}
