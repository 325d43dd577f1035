// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use orgdesk_app::{EntityKind, SubmitOperation};

pub const LOGIN: &str = "auth/login";

pub fn list(kind: EntityKind) -> String {
    format!("{}/list", kind.as_str())
}

pub fn get(kind: EntityKind, id: &str) -> String {
    format!("{}/{id}", kind.as_str())
}

pub fn branches_for_company(company_id: &str) -> String {
    format!("branch/list/{company_id}")
}

pub fn create(kind: EntityKind) -> String {
    match kind {
        EntityKind::Employee => "employee".to_owned(),
        _ => format!("{}/register", kind.as_str()),
    }
}

pub fn update(kind: EntityKind, id: &str) -> String {
    format!("{}/update/{id}", kind.as_str())
}

pub fn delete(kind: EntityKind, id: &str) -> String {
    match kind {
        EntityKind::Role => format!("role/delete/{id}"),
        _ => format!("{}/{id}", kind.as_str()),
    }
}

pub fn submit(kind: EntityKind, operation: SubmitOperation, id: Option<&str>) -> String {
    match (operation, id) {
        (SubmitOperation::Update, Some(id)) => update(kind, id),
        _ => create(kind),
    }
}
