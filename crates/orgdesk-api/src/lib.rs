// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod endpoints;

use anyhow::{Context, Result, bail};
use orgdesk_app::{
    Branch, Collection, EntityKind, LoginResponse, Record, RequestError, Session, Submission,
    SubmissionBody,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response, multipart};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Blocking client for the organization REST API. Every call that needs
/// authentication takes the session explicitly.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?} -- fix the config and retry",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, RequestError> {
        let request = self
            .http
            .post(self.url(endpoints::LOGIN))
            .json(&serde_json::json!({ "username": username, "password": password }));
        let response = self
            .execute(request, endpoints::LOGIN, RequestError::SignInFailed)
            .map_err(|_| RequestError::SignInFailed)?;
        decode(response, endpoints::LOGIN, RequestError::SignInFailed)
    }

    pub fn list<T: DeserializeOwned>(
        &self,
        session: &Session,
        kind: EntityKind,
    ) -> Result<Vec<T>, RequestError> {
        let path = endpoints::list(kind);
        self.fetch(session, &path, RequestError::FetchFailed(kind))
    }

    pub fn collection(&self, session: &Session, kind: EntityKind) -> Result<Collection, RequestError> {
        let collection = match kind {
            EntityKind::Company => Collection::Companies(self.list(session, kind)?),
            EntityKind::Branch => Collection::Branches(self.list(session, kind)?),
            EntityKind::Department => Collection::Departments(self.list(session, kind)?),
            EntityKind::Employee => Collection::Employees(self.list(session, kind)?),
            EntityKind::Role => Collection::Roles(self.list(session, kind)?),
            EntityKind::User => Collection::Users(self.list(session, kind)?),
        };
        Ok(collection)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        kind: EntityKind,
        id: &str,
    ) -> Result<T, RequestError> {
        let path = endpoints::get(kind, id);
        self.fetch(session, &path, RequestError::FetchFailed(kind))
    }

    pub fn record(&self, session: &Session, kind: EntityKind, id: &str) -> Result<Record, RequestError> {
        let record = match kind {
            EntityKind::Company => Record::Company(self.get(session, kind, id)?),
            EntityKind::Branch => Record::Branch(self.get(session, kind, id)?),
            EntityKind::Department => Record::Department(self.get(session, kind, id)?),
            EntityKind::Employee => Record::Employee(self.get(session, kind, id)?),
            EntityKind::Role => Record::Role(self.get(session, kind, id)?),
            EntityKind::User => Record::User(self.get(session, kind, id)?),
        };
        Ok(record)
    }

    pub fn branches_for_company(
        &self,
        session: &Session,
        company_id: &str,
    ) -> Result<Vec<Branch>, RequestError> {
        let path = endpoints::branches_for_company(company_id);
        self.fetch(session, &path, RequestError::FetchFailed(EntityKind::Branch))
    }

    pub fn delete(&self, session: &Session, kind: EntityKind, id: &str) -> Result<(), RequestError> {
        let path = endpoints::delete(kind, id);
        let request = self.authorized(self.http.delete(self.url(&path)), session);
        self.execute(request, &path, RequestError::DeleteFailed(kind))?;
        Ok(())
    }

    /// Sends a create or update. Multipart bodies carry the attachment as a
    /// file part.
    pub fn submit(&self, session: &Session, submission: &Submission) -> Result<(), RequestError> {
        let failure = RequestError::SubmitFailed {
            kind: submission.kind,
            operation: submission.operation,
        };
        let path = endpoints::submit(
            submission.kind,
            submission.operation,
            submission.id.as_deref(),
        );
        let url = self.url(&path);
        let request = match submission.id {
            Some(_) => self.http.put(url),
            None => self.http.post(url),
        };

        let request = match &submission.body {
            SubmissionBody::Json(body) => request.json(body),
            SubmissionBody::Multipart { fields, attachment } => {
                let mut form = multipart::Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), value.clone());
                }
                if let Some(attachment) = attachment {
                    let bytes = std::fs::read(&attachment.path).map_err(|error| {
                        warn!(
                            path = %attachment.path.display(),
                            %error,
                            "cannot read attachment"
                        );
                        failure.clone()
                    })?;
                    let part = multipart::Part::bytes(bytes).file_name(attachment.file_name());
                    form = form.part(attachment.field.clone(), part);
                }
                request.multipart(form)
            }
        };

        self.execute(self.authorized(request, session), &path, failure)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        failure: RequestError,
    ) -> Result<T, RequestError> {
        let request = self.authorized(self.http.get(self.url(path)), session);
        let response = self.execute(request, path, failure.clone())?;
        decode(response, path, failure)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.header(AUTHORIZATION, session.bearer())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Sends the request and maps the outcome onto the request taxonomy:
    /// 403 is always `PermissionDenied`, 401 is `SessionExpired`, anything
    /// else unsuccessful is `failure`.
    fn execute(
        &self,
        request: RequestBuilder,
        path: &str,
        failure: RequestError,
    ) -> Result<Response, RequestError> {
        debug!(path, "sending request");
        let response = request.send().map_err(|error| {
            warn!(base_url = %self.base_url, path, %error, "cannot reach API");
            failure.clone()
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(path, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        warn!(
            path,
            status = status.as_u16(),
            detail = %server_message(status, &body),
            "request failed"
        );
        Err(match status {
            StatusCode::FORBIDDEN => RequestError::PermissionDenied,
            StatusCode::UNAUTHORIZED => RequestError::SessionExpired,
            _ => failure,
        })
    }
}

fn decode<T: DeserializeOwned>(
    response: Response,
    path: &str,
    failure: RequestError,
) -> Result<T, RequestError> {
    response.json().map_err(|error| {
        warn!(path, %error, "cannot decode response");
        failure
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return format!("server error ({}): {message}", status.as_u16());
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return format!("server error ({}): {}", status.as_u16(), body.trim());
    }

    format!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, server_message};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn base_url_is_validated() {
        assert!(Client::new("", Duration::from_secs(1)).is_err());
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
        let error = Client::new("ftp://example.com", Duration::from_secs(1))
            .expect_err("ftp should be rejected");
        assert!(error.to_string().contains("http or https"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = Client::new("http://localhost:8080/api/v1/", Duration::from_secs(1))
            .expect("client should initialize");
        assert_eq!(client.base_url(), "http://localhost:8080/api/v1");
    }

    #[test]
    fn server_message_prefers_envelope() {
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, r#"{"message":"name taken"}"#),
            "server error (400): name taken"
        );
        assert_eq!(
            server_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "server error (502): upstream down"
        );
        assert_eq!(
            server_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"trace":"..."}"#),
            "server returned 500"
        );
    }
}
