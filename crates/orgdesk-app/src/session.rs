// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{LoginResponse, RequestError};

/// The signed-in user's credential, passed explicitly to every API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let expires_at = token_expiry(&token);
        Self {
            token,
            username: None,
            role: None,
            expires_at,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Tokens without a readable `exp` claim never expire locally; the
    /// server still gets the final say.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

fn token_expiry(token: &str) -> Option<OffsetDateTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    OffsetDateTime::from_unix_timestamp(claims.exp?).ok()
}

/// Where the single credential string lives between runs.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    token: Option<String>,
}

impl MemoryCredentialStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.token = Some(token.to_owned());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

/// Owns the session lifecycle: login sets it, logout clears it, and
/// expiry is checked on every use.
#[derive(Debug)]
pub struct SessionManager<S> {
    store: S,
    session: Option<Session>,
}

impl<S: CredentialStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
        }
    }

    pub fn restore(&mut self) -> Result<()> {
        self.session = self
            .store
            .load()
            .context("load stored credential")?
            .filter(|token| !token.trim().is_empty())
            .map(Session::new);
        Ok(())
    }

    pub fn current(&self, now: OffsetDateTime) -> Result<&Session, RequestError> {
        let session = self
            .session
            .as_ref()
            .ok_or(RequestError::AuthenticationMissing)?;
        if session.is_expired(now) {
            return Err(RequestError::SessionExpired);
        }
        Ok(session)
    }

    pub fn is_signed_in(&self, now: OffsetDateTime) -> bool {
        self.current(now).is_ok()
    }

    pub fn establish(&mut self, response: LoginResponse, username: &str) -> Result<&Session> {
        if response.token.trim().is_empty() {
            bail!("server returned an empty token -- check the API base_url and retry");
        }
        self.store
            .save(&response.token)
            .context("save credential")?;
        let mut session = Session::new(response.token);
        session.username = Some(username.to_owned());
        session.role = response.role;
        Ok(self.session.insert(session))
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.session = None;
        self.store.clear().context("clear stored credential")
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
