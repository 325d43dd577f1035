// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use orgdesk_api::Client;
use orgdesk_app::{
    Branch, Collection, CredentialStore, Descriptor, EntityKind, FaceDetector, Record,
    RequestError, Session, SessionManager, Submission, VisitorCounter,
};
use time::OffsetDateTime;
use tracing::{info, warn};

/// Glues the API client and the local session to the dashboard.
pub struct ApiRuntime<S> {
    client: Client,
    sessions: SessionManager<S>,
    detector: Box<dyn FaceDetector>,
    visitor_threshold: f32,
    visitor_max_known: usize,
}

impl<S: CredentialStore> ApiRuntime<S> {
    pub fn new(
        client: Client,
        sessions: SessionManager<S>,
        detector: Box<dyn FaceDetector>,
        visitor_threshold: f32,
        visitor_max_known: usize,
    ) -> Self {
        Self {
            client,
            sessions,
            detector,
            visitor_threshold,
            visitor_max_known,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.sessions.is_signed_in(OffsetDateTime::now_utc())
    }

    fn session(&self) -> Result<&Session, RequestError> {
        self.sessions.current(OffsetDateTime::now_utc())
    }
}

impl<S: CredentialStore> orgdesk_tui::AppRuntime for ApiRuntime<S> {
    fn sign_in(&mut self, username: &str, password: &str) -> Result<(), RequestError> {
        let response = self.client.login(username, password)?;
        self.sessions
            .establish(response, username)
            .map_err(|error| {
                warn!(%error, "cannot keep session");
                RequestError::SignInFailed
            })?;
        info!(username, "signed in");
        Ok(())
    }

    fn sign_out(&mut self) -> Result<()> {
        self.sessions.sign_out()?;
        info!("signed out");
        Ok(())
    }

    fn load_collection(&mut self, kind: EntityKind) -> Result<Collection, RequestError> {
        self.client.collection(self.session()?, kind)
    }

    fn load_record(&mut self, kind: EntityKind, id: &str) -> Result<Record, RequestError> {
        self.client.record(self.session()?, kind, id)
    }

    fn load_branches(&mut self, company_id: &str) -> Result<Vec<Branch>, RequestError> {
        self.client.branches_for_company(self.session()?, company_id)
    }

    fn delete_entity(&mut self, kind: EntityKind, id: &str) -> Result<(), RequestError> {
        self.client.delete(self.session()?, kind, id)?;
        info!(kind = kind.as_str(), id, "deleted");
        Ok(())
    }

    fn submit(&mut self, submission: &Submission) -> Result<(), RequestError> {
        self.client.submit(self.session()?, submission)?;
        info!(
            kind = submission.kind.as_str(),
            operation = submission.operation.verb(),
            "submitted"
        );
        Ok(())
    }

    fn visitor_counter(&mut self) -> VisitorCounter {
        VisitorCounter::new(self.visitor_threshold, self.visitor_max_known)
    }

    fn next_visitor_frame(&mut self) -> Result<Option<Vec<Descriptor>>> {
        self.detector.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use crate::feed::NoDetector;
    use anyhow::Result;
    use orgdesk_api::Client;
    use orgdesk_app::{
        Collection, EntityKind, MemoryCredentialStore, RequestError, SessionManager,
    };
    use orgdesk_testkit::{MockApi, MockReply, OrgFaker};
    use orgdesk_tui::AppRuntime;
    use serde_json::json;
    use std::time::Duration;

    fn runtime(api: &MockApi, store: MemoryCredentialStore) -> Result<ApiRuntime<MemoryCredentialStore>> {
        let client = Client::new(api.base_url(), Duration::from_secs(2))?;
        let mut sessions = SessionManager::new(store);
        sessions.restore()?;
        Ok(ApiRuntime::new(
            client,
            sessions,
            Box::new(NoDetector),
            0.6,
            8,
        ))
    }

    #[test]
    fn signed_out_runtime_never_calls_the_api() -> Result<()> {
        let api = MockApi::start(Vec::new())?;
        let mut runtime = runtime(&api, MemoryCredentialStore::default())?;
        assert!(!runtime.is_signed_in());
        assert_eq!(
            runtime.load_collection(EntityKind::Company),
            Err(RequestError::AuthenticationMissing)
        );
        assert!(api.finish()?.is_empty());
        Ok(())
    }

    #[test]
    fn sign_in_stores_token_and_authorizes_later_calls() -> Result<()> {
        let mut faker = OrgFaker::new(3);
        let api = MockApi::start(vec![
            MockReply::json(200, &json!({ "token": "fresh-token", "role": "ADMIN" })),
            MockReply::json(200, &faker.list_json(EntityKind::Role, 2)),
        ])?;
        let mut runtime = runtime(&api, MemoryCredentialStore::default())?;

        runtime.sign_in("admin", "secret")?;
        assert!(runtime.is_signed_in());
        let roles = runtime.load_collection(EntityKind::Role)?;
        assert!(matches!(roles, Collection::Roles(ref rows) if rows.len() == 2));

        let requests = api.finish()?;
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer fresh-token"));

        runtime.sign_out()?;
        assert!(!runtime.is_signed_in());
        Ok(())
    }

    #[test]
    fn restored_token_is_used() -> Result<()> {
        let api = MockApi::start(vec![MockReply::status(200)])?;
        let mut runtime = runtime(&api, MemoryCredentialStore::with_token("kept"))?;
        runtime.delete_entity(EntityKind::Branch, "5")?;

        let requests = api.finish()?;
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer kept"));
        Ok(())
    }

    #[test]
    fn visitor_counter_uses_configured_limits() -> Result<()> {
        let api = MockApi::start(Vec::new())?;
        let mut runtime = runtime(&api, MemoryCredentialStore::default())?;
        let counter = runtime.visitor_counter();
        assert!((counter.threshold() - 0.6).abs() < f32::EPSILON);
        assert_eq!(runtime.next_visitor_frame()?, None);
        api.finish()?;
        Ok(())
    }
}
