// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use orgdesk_api::Client;
use orgdesk_app::{
    Branch, Collection, EntityKind, FormOutput, FormState, FormTarget, Record, RequestError,
    Session, SubmissionBody,
};
use orgdesk_testkit::{MockApi, MockReply, OrgFaker};
use serde_json::json;
use std::time::Duration;

fn client(api: &MockApi) -> Result<Client> {
    Client::new(api.base_url(), Duration::from_secs(2))
}

fn session() -> Session {
    Session::new("test-token")
}

fn branch_submission(form: &mut FormState) -> Result<orgdesk_app::Submission> {
    form.lookups_loaded();
    for (key, value) in [
        ("name", "North"),
        ("description", "Main office"),
        ("location", "Tashkent"),
        ("longitude", "69.24"),
        ("latitude", "41.31"),
        ("companyId", "1"),
    ] {
        form.set_value(key, value);
    }
    match form.submit()? {
        FormOutput::Submit(submission) => Ok(submission),
        other => panic!("expected entity submission, got {other:?}"),
    }
}

#[test]
fn unreachable_server_reports_fetch_failure() {
    let client = Client::new("http://127.0.0.1:1/api/v1", Duration::from_millis(100))
        .expect("client should initialize");
    let error = client
        .collection(&session(), EntityKind::Company)
        .expect_err("fetch should fail for unreachable endpoint");
    assert_eq!(error, RequestError::FetchFailed(EntityKind::Company));
    assert_eq!(error.to_string(), "Failed to fetch company data");
}

#[test]
fn list_sends_bearer_and_decodes_collection() -> Result<()> {
    let mut faker = OrgFaker::new(11);
    let body = faker.list_json(EntityKind::Branch, 4);
    let api = MockApi::start(vec![MockReply::json(200, &body)])?;

    let collection = client(&api)?.collection(&session(), EntityKind::Branch)?;
    let Collection::Branches(branches) = collection else {
        panic!("expected branches");
    };
    assert_eq!(branches.len(), 4);

    let requests = api.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/v1/branch/list");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer test-token"));
    Ok(())
}

#[test]
fn forbidden_maps_to_permission_denied() -> Result<()> {
    let api = MockApi::start(vec![
        MockReply::status(403),
        MockReply::status(403),
        MockReply::status(403),
    ])?;
    let client = client(&api)?;

    assert_eq!(
        client.collection(&session(), EntityKind::User),
        Err(RequestError::PermissionDenied)
    );
    assert_eq!(
        client.delete(&session(), EntityKind::User, "2"),
        Err(RequestError::PermissionDenied)
    );
    assert_eq!(
        client.record(&session(), EntityKind::User, "2"),
        Err(RequestError::PermissionDenied)
    );
    api.finish()?;
    Ok(())
}

#[test]
fn unauthorized_maps_to_session_expired() -> Result<()> {
    let api = MockApi::start(vec![MockReply::status(401)])?;
    assert_eq!(
        client(&api)?.collection(&session(), EntityKind::Role),
        Err(RequestError::SessionExpired)
    );
    api.finish()?;
    Ok(())
}

#[test]
fn server_error_maps_to_fetch_failed() -> Result<()> {
    let api = MockApi::start(vec![MockReply::json(
        500,
        &json!({ "message": "database offline" }),
    )])?;
    assert_eq!(
        client(&api)?.collection(&session(), EntityKind::Department),
        Err(RequestError::FetchFailed(EntityKind::Department))
    );
    api.finish()?;
    Ok(())
}

#[test]
fn malformed_body_maps_to_fetch_failed() -> Result<()> {
    let api = MockApi::start(vec![MockReply::json(200, &json!({ "not": "a list" }))])?;
    assert_eq!(
        client(&api)?.collection(&session(), EntityKind::Company),
        Err(RequestError::FetchFailed(EntityKind::Company))
    );
    api.finish()?;
    Ok(())
}

#[test]
fn record_fetch_uses_get_path() -> Result<()> {
    let mut faker = OrgFaker::new(5);
    let api = MockApi::start(vec![MockReply::json(200, &faker.branch_json(7, 3))])?;

    let record = client(&api)?.record(&session(), EntityKind::Branch, "7")?;
    let Record::Branch(branch) = record else {
        panic!("expected branch record");
    };
    assert_eq!(branch.company_id().as_deref(), Some("3"));

    let requests = api.finish()?;
    assert_eq!(requests[0].url, "/api/v1/branch/7");
    Ok(())
}

#[test]
fn branches_for_company_uses_company_path() -> Result<()> {
    let mut faker = OrgFaker::new(5);
    let body = json!([faker.branch_json(1, 4), faker.branch_json(2, 4)]);
    let api = MockApi::start(vec![MockReply::json(200, &body)])?;

    let branches: Vec<Branch> = client(&api)?.branches_for_company(&session(), "4")?;
    assert_eq!(branches.len(), 2);

    let requests = api.finish()?;
    assert_eq!(requests[0].url, "/api/v1/branch/list/4");
    Ok(())
}

#[test]
fn role_delete_uses_its_own_path() -> Result<()> {
    let api = MockApi::start(vec![MockReply::status(200), MockReply::status(500)])?;
    let client = client(&api)?;

    client.delete(&session(), EntityKind::Role, "3")?;
    assert_eq!(
        client.delete(&session(), EntityKind::Company, "8"),
        Err(RequestError::DeleteFailed(EntityKind::Company))
    );

    let requests = api.finish()?;
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].url, "/api/v1/role/delete/3");
    assert_eq!(requests[1].url, "/api/v1/company/8");
    Ok(())
}

#[test]
fn branch_create_issues_one_write() -> Result<()> {
    let api = MockApi::start(vec![MockReply::status(200)])?;
    let mut form = FormState::new(FormTarget::Create(EntityKind::Branch));
    let submission = branch_submission(&mut form)?;

    client(&api)?.submit(&session(), &submission)?;

    let requests = api.finish()?;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/v1/branch/register");
    assert_eq!(
        requests[0].json()?,
        json!({
            "name": "North",
            "description": "Main office",
            "location": "Tashkent",
            "longitude": 69.24,
            "latitude": 41.31,
            "companyId": 1,
        })
    );
    Ok(())
}

#[test]
fn branch_create_forbidden_and_failed() -> Result<()> {
    let api = MockApi::start(vec![MockReply::status(403), MockReply::status(400)])?;
    let client = client(&api)?;
    let mut form = FormState::new(FormTarget::Create(EntityKind::Branch));
    let submission = branch_submission(&mut form)?;

    assert_eq!(
        client.submit(&session(), &submission),
        Err(RequestError::PermissionDenied)
    );
    let error = client
        .submit(&session(), &submission)
        .expect_err("400 should fail");
    assert_eq!(error.to_string(), "Failed to create branch");
    api.finish()?;
    Ok(())
}

#[test]
fn update_uses_put_and_record_id() -> Result<()> {
    let api = MockApi::start(vec![MockReply::status(200)])?;
    let mut form = FormState::new(FormTarget::Edit(EntityKind::Branch, "12".to_owned()));
    form.populate(&Record::Branch(serde_json::from_value(json!({ "id": 12 }))?));
    let submission = branch_submission(&mut form)?;

    client(&api)?.submit(&session(), &submission)?;

    let requests = api.finish()?;
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].url, "/api/v1/branch/update/12");
    Ok(())
}

#[test]
fn employee_with_photo_posts_multipart() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let photo = temp.path().join("avery.jpg");
    std::fs::write(&photo, b"jpeg-bytes")?;

    let api = MockApi::start(vec![MockReply::status(200)])?;
    let mut form = FormState::new(FormTarget::Create(EntityKind::Employee));
    form.lookups_loaded();
    for (key, value) in [
        ("firstName", "Avery"),
        ("lastName", "Walker"),
        ("middleName", "J"),
        ("email", "avery@acme.io"),
        ("phoneNumber", "555-0100"),
        ("birthDate", "1990-04-21"),
        ("gender", "FEMALE"),
        ("jobTitle", "Engineer"),
        ("schedule", "9-5"),
        ("salary", "1200"),
        ("companyId", "2"),
    ] {
        form.set_value(key, value);
    }
    form.set_value("image", &photo.to_string_lossy());
    let FormOutput::Submit(submission) = form.submit()? else {
        panic!("expected entity submission");
    };
    assert!(matches!(submission.body, SubmissionBody::Multipart { .. }));

    client(&api)?.submit(&session(), &submission)?;

    let requests = api.finish()?;
    assert_eq!(requests[0].url, "/api/v1/employee");
    let content_type = requests[0].content_type.clone().unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
    assert!(requests[0].body.contains("name=\"image\"; filename=\"avery.jpg\""));
    assert!(requests[0].body.contains("jpeg-bytes"));
    assert!(requests[0].body.contains("name=\"salary\""));
    Ok(())
}

#[test]
fn login_returns_token_and_rejects_bad_credentials() -> Result<()> {
    let api = MockApi::start(vec![
        MockReply::json(
            200,
            &json!({ "token": "abc", "role": "ADMIN", "firstName": "Avery", "email": null }),
        ),
        MockReply::status(401),
    ])?;
    let client = client(&api)?;

    let login = client.login("admin", "secret")?;
    assert_eq!(login.token, "abc");
    assert_eq!(login.role.as_deref(), Some("ADMIN"));
    assert_eq!(
        client.login("admin", "wrong"),
        Err(RequestError::SignInFailed)
    );

    let requests = api.finish()?;
    assert_eq!(requests[0].url, "/api/v1/auth/login");
    assert_eq!(requests[0].authorization, None);
    assert_eq!(
        requests[0].json()?,
        json!({ "username": "admin", "password": "secret" })
    );
    Ok(())
}
