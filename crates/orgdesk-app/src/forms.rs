// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::Date;
use time::macros::format_description;

use crate::errors::{RequestError, SubmitOperation};
use crate::model::{Collection, EntityKind, Listable, Permission, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Secret,
    Choice,
    MultiChoice,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MinLength(usize),
    /// Must equal the value of the named field.
    Matches(&'static str),
    Number,
    Date,
    ExistingFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
    /// Sent to the server; local fields only drive other fields.
    pub submit: bool,
    /// Only enforced when creating; a blank value on edit leaves the
    /// server-side value alone.
    pub create_only: bool,
}

impl FieldSpec {
    const fn new(
        key: &'static str,
        label: &'static str,
        kind: FieldKind,
        rules: &'static [Rule],
    ) -> Self {
        Self {
            key,
            label,
            kind,
            rules,
            submit: true,
            create_only: false,
        }
    }

    const fn local(self) -> Self {
        Self {
            submit: false,
            ..self
        }
    }

    const fn create_only(self) -> Self {
        Self {
            create_only: true,
            ..self
        }
    }
}

const REQUIRED: &[Rule] = &[Rule::Required];
const REQUIRED_EMAIL: &[Rule] = &[Rule::Required, Rule::Email];
const REQUIRED_NUMBER: &[Rule] = &[Rule::Required, Rule::Number];
const REQUIRED_DATE: &[Rule] = &[Rule::Required, Rule::Date];
const REQUIRED_FILE: &[Rule] = &[Rule::Required, Rule::ExistingFile];
const PASSWORD: &[Rule] = &[Rule::Required, Rule::MinLength(6)];
const REPEAT_PASSWORD: &[Rule] = &[Rule::Required, Rule::Matches("password")];

const COMPANY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "name", FieldKind::Text, REQUIRED),
    FieldSpec::new("address", "address", FieldKind::Text, REQUIRED),
    FieldSpec::new("email", "email", FieldKind::Text, REQUIRED_EMAIL),
    FieldSpec::new("phone", "phone", FieldKind::Text, REQUIRED),
];

const BRANCH_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "name", FieldKind::Text, REQUIRED),
    FieldSpec::new("description", "description", FieldKind::Text, REQUIRED),
    FieldSpec::new("location", "location", FieldKind::Text, REQUIRED),
    FieldSpec::new("longitude", "longitude", FieldKind::Text, REQUIRED_NUMBER),
    FieldSpec::new("latitude", "latitude", FieldKind::Text, REQUIRED_NUMBER),
    FieldSpec::new("companyId", "company", FieldKind::Choice, REQUIRED),
];

const DEPARTMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("companyId", "company", FieldKind::Choice, &[]).local(),
    FieldSpec::new("name", "name", FieldKind::Text, REQUIRED),
    FieldSpec::new("branchId", "branch", FieldKind::Choice, REQUIRED),
];

const EMPLOYEE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("firstName", "first name", FieldKind::Text, REQUIRED),
    FieldSpec::new("lastName", "last name", FieldKind::Text, REQUIRED),
    FieldSpec::new("middleName", "middle name", FieldKind::Text, REQUIRED),
    FieldSpec::new("email", "email", FieldKind::Text, REQUIRED_EMAIL),
    FieldSpec::new("phoneNumber", "phone", FieldKind::Text, REQUIRED),
    FieldSpec::new("birthDate", "birth date", FieldKind::Text, REQUIRED_DATE),
    FieldSpec::new("gender", "gender", FieldKind::Choice, REQUIRED),
    FieldSpec::new("jobTitle", "job title", FieldKind::Text, REQUIRED),
    FieldSpec::new("schedule", "schedule", FieldKind::Text, REQUIRED),
    FieldSpec::new("salary", "salary", FieldKind::Text, REQUIRED_NUMBER),
    FieldSpec::new("companyId", "company", FieldKind::Choice, REQUIRED),
    FieldSpec::new("image", "photo", FieldKind::File, REQUIRED_FILE).create_only(),
];

const ROLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "name", FieldKind::Text, REQUIRED),
    FieldSpec::new("permissionList", "permissions", FieldKind::MultiChoice, &[]),
];

const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("firstName", "first name", FieldKind::Text, REQUIRED),
    FieldSpec::new("lastName", "last name", FieldKind::Text, REQUIRED),
    FieldSpec::new("middleName", "middle name", FieldKind::Text, REQUIRED),
    FieldSpec::new("email", "email", FieldKind::Text, REQUIRED_EMAIL),
    FieldSpec::new("phoneNumber", "phone", FieldKind::Text, REQUIRED),
    FieldSpec::new("birthDate", "birth date", FieldKind::Text, REQUIRED_DATE),
    FieldSpec::new("gender", "gender", FieldKind::Choice, REQUIRED),
    FieldSpec::new("jobTitle", "job title", FieldKind::Text, REQUIRED),
    FieldSpec::new("username", "username", FieldKind::Text, REQUIRED),
    FieldSpec::new("password", "password", FieldKind::Secret, PASSWORD).create_only(),
    FieldSpec::new(
        "repeatPassword",
        "repeat password",
        FieldKind::Secret,
        REPEAT_PASSWORD,
    )
    .create_only()
    .local(),
    FieldSpec::new("roleId", "role", FieldKind::Choice, REQUIRED),
    FieldSpec::new("companyId", "company", FieldKind::Choice, REQUIRED),
    FieldSpec::new("image", "photo", FieldKind::File, REQUIRED_FILE).create_only(),
];

const SIGN_IN_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", "username", FieldKind::Text, REQUIRED),
    FieldSpec::new("password", "password", FieldKind::Secret, REQUIRED),
];

const GENDERS: [&str; 2] = ["MALE", "FEMALE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// A chooser entry for a fetched record, labelled by its display field.
    pub fn from_record<T: Listable>(item: &T) -> Self {
        let label = item.field(T::KIND.display_field()).display();
        let label = if label.is_empty() {
            item.row_id().to_owned()
        } else {
            label
        };
        Self::new(item.row_id(), label)
    }
}

pub fn choices(collection: &Collection) -> Vec<Choice> {
    match collection {
        Collection::Companies(rows) => rows.iter().map(Choice::from_record).collect(),
        Collection::Branches(rows) => rows.iter().map(Choice::from_record).collect(),
        Collection::Departments(rows) => rows.iter().map(Choice::from_record).collect(),
        Collection::Employees(rows) => rows.iter().map(Choice::from_record).collect(),
        Collection::Roles(rows) => rows.iter().map(Choice::from_record).collect(),
        Collection::Users(rows) => rows.iter().map(Choice::from_record).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub spec: FieldSpec,
    pub value: String,
    pub selected: BTreeSet<String>,
    pub choices: Vec<Choice>,
    pub cursor: usize,
    pub touched: bool,
}

impl Field {
    fn new(spec: FieldSpec) -> Self {
        Self {
            spec,
            value: String::new(),
            selected: BTreeSet::new(),
            choices: Vec::new(),
            cursor: 0,
            touched: false,
        }
    }

    fn is_blank(&self) -> bool {
        match self.spec.kind {
            FieldKind::MultiChoice => self.selected.is_empty(),
            _ => self.value.trim().is_empty(),
        }
    }

    /// Text shown in the form for this field's current value.
    pub fn display_value(&self) -> String {
        match self.spec.kind {
            FieldKind::Secret => "•".repeat(self.value.chars().count()),
            FieldKind::Choice => self
                .choices
                .iter()
                .find(|choice| choice.value == self.value)
                .map(|choice| choice.label.clone())
                .unwrap_or_else(|| self.value.clone()),
            FieldKind::MultiChoice => self
                .selected
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            FieldKind::Text | FieldKind::File => self.value.clone(),
        }
    }

    fn sync_cursor(&mut self) {
        if let Some(index) = self
            .choices
            .iter()
            .position(|choice| choice.value == self.value)
        {
            self.cursor = index;
        } else {
            self.cursor = self.cursor.min(self.choices.len().saturating_sub(1));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create(EntityKind),
    Edit(EntityKind, String),
    SignIn,
}

impl FormTarget {
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Self::Create(kind) | Self::Edit(kind, _) => Some(*kind),
            Self::SignIn => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Create(kind) => format!("new {}", kind.as_str()),
            Self::Edit(kind, id) => format!("edit {} {id}", kind.as_str()),
            Self::SignIn => "sign in".to_owned(),
        }
    }

    const fn is_edit(&self) -> bool {
        matches!(self, Self::Edit(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    LoadingReference,
    LoadingEntity,
    Ready,
    Submitting,
    Succeeded,
}

/// Remote collections a form needs before its choice fields are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Companies,
    Roles,
}

impl Lookup {
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Companies => EntityKind::Company,
            Self::Roles => EntityKind::Role,
        }
    }

    pub const fn field_key(self) -> &'static str {
        match self {
            Self::Companies => "companyId",
            Self::Roles => "roleId",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub field: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.field.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionBody {
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        attachment: Option<Attachment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub kind: EntityKind,
    pub operation: SubmitOperation,
    pub id: Option<String>,
    pub body: SubmissionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutput {
    Submit(Submission),
    SignIn { username: String, password: String },
}

/// Create, edit, and sign-in forms: field values, validation, and the
/// loading/submitting lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    target: FormTarget,
    fields: Vec<Field>,
    focus: usize,
    lookups_pending: bool,
    entity_pending: bool,
    stage: FormPhase,
    error: Option<String>,
}

impl FormState {
    pub fn new(target: FormTarget) -> Self {
        let specs = match target.kind() {
            Some(EntityKind::Company) => COMPANY_FIELDS,
            Some(EntityKind::Branch) => BRANCH_FIELDS,
            Some(EntityKind::Department) => DEPARTMENT_FIELDS,
            Some(EntityKind::Employee) => EMPLOYEE_FIELDS,
            Some(EntityKind::Role) => ROLE_FIELDS,
            Some(EntityKind::User) => USER_FIELDS,
            None => SIGN_IN_FIELDS,
        };
        let mut fields = specs.iter().copied().map(Field::new).collect::<Vec<_>>();
        for field in &mut fields {
            match field.spec.key {
                "gender" => {
                    field.choices = GENDERS
                        .iter()
                        .map(|gender| Choice::new(*gender, *gender))
                        .collect();
                }
                "permissionList" => {
                    field.choices = Permission::ALL
                        .iter()
                        .map(|permission| Choice::new(permission.as_str(), permission.as_str()))
                        .collect();
                }
                _ => {}
            }
        }

        let mut form = Self {
            entity_pending: target.is_edit(),
            target,
            fields,
            focus: 0,
            lookups_pending: false,
            stage: FormPhase::Ready,
            error: None,
        };
        form.lookups_pending = !form.lookups().is_empty();
        form
    }

    pub fn target(&self) -> &FormTarget {
        &self.target
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.field(key).map(|field| field.value.as_str())
    }

    pub fn phase(&self) -> FormPhase {
        if self.lookups_pending {
            FormPhase::LoadingReference
        } else if self.entity_pending {
            FormPhase::LoadingEntity
        } else {
            self.stage
        }
    }

    pub fn lookups(&self) -> Vec<Lookup> {
        [Lookup::Companies, Lookup::Roles]
            .into_iter()
            .filter(|lookup| self.field(lookup.field_key()).is_some())
            .collect()
    }

    pub fn set_choices(&mut self, key: &str, choices: Vec<Choice>) {
        if let Some(field) = self.field_mut(key) {
            field.choices = choices;
            field.sync_cursor();
        }
    }

    pub fn lookups_loaded(&mut self) {
        self.lookups_pending = false;
    }

    pub fn lookup_failed(&mut self, error: &RequestError) {
        self.lookups_pending = false;
        self.error = Some(error.to_string());
    }

    /// Department forms pick a company first; changing it reloads the
    /// branch choices for that company.
    pub fn branch_company(&self) -> Option<&str> {
        if self.target.kind() != Some(EntityKind::Department) {
            return None;
        }
        self.value("companyId").filter(|value| !value.is_empty())
    }

    /// Seeds the form from a fetched record. Safe to call again when a
    /// later fetch lands, whatever phase the form is in.
    pub fn populate(&mut self, record: &Record) {
        let values: Vec<(&str, Option<String>)> = match record {
            Record::Company(company) => vec![
                ("name", company.name.clone()),
                ("address", company.address.clone()),
                ("email", company.email.clone()),
                ("phone", company.phone.clone()),
            ],
            Record::Branch(branch) => vec![
                ("name", branch.name.clone()),
                ("description", branch.description.clone()),
                ("location", branch.location.clone()),
                ("longitude", branch.longitude.map(|value| value.to_string())),
                ("latitude", branch.latitude.map(|value| value.to_string())),
                ("companyId", branch.company_id()),
            ],
            Record::Department(department) => vec![
                ("name", department.name.clone()),
                (
                    "branchId",
                    department.branch_id.clone().map(String::from),
                ),
            ],
            Record::Employee(employee) => vec![
                ("firstName", employee.first_name.clone()),
                ("lastName", employee.last_name.clone()),
                ("middleName", employee.middle_name.clone()),
                ("email", employee.email.clone()),
                ("phoneNumber", employee.phone_number.clone()),
                ("birthDate", employee.birth_date.clone()),
                ("gender", employee.gender.clone()),
                ("jobTitle", employee.job_title.clone()),
                ("schedule", employee.schedule.clone()),
                ("salary", employee.salary.map(|value| value.to_string())),
                (
                    "companyId",
                    employee.company.as_ref().and_then(|company| company.id.clone()),
                ),
            ],
            Record::Role(role) => {
                if let Some(field) = self.field_mut("permissionList") {
                    field.selected = role.permissions.iter().cloned().collect();
                }
                vec![("name", role.role_name.clone())]
            }
            Record::User(user) => vec![
                ("firstName", user.first_name.clone()),
                ("lastName", user.last_name.clone()),
                ("middleName", user.middle_name.clone()),
                ("email", user.email.clone()),
                ("phoneNumber", user.phone_number.clone()),
                ("birthDate", user.birth_date.clone()),
                ("gender", user.gender.clone()),
                ("jobTitle", user.job_title.clone()),
                ("username", user.username.clone()),
                ("roleId", user.role.as_ref().and_then(|role| role.id.clone())),
                (
                    "companyId",
                    user.company.as_ref().and_then(|company| company.id.clone()),
                ),
            ],
        };

        for (key, value) in values {
            if let Some(field) = self.field_mut(key) {
                field.value = value.unwrap_or_default();
                field.sync_cursor();
            }
        }
        for field in &mut self.fields {
            field.touched = false;
        }
        self.entity_pending = false;
        self.error = None;
    }

    pub fn entity_failed(&mut self, error: &RequestError) {
        self.entity_pending = false;
        self.error = Some(error.to_string());
    }

    pub fn focus_next(&mut self) {
        self.blur();
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn focus_prev(&mut self) {
        self.blur();
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    fn blur(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.touched = true;
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(field) = self.editable_text_field() {
            field.value.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.editable_text_field() {
            field.value.pop();
        }
    }

    fn editable_text_field(&mut self) -> Option<&mut Field> {
        self.fields.get_mut(self.focus).filter(|field| {
            matches!(
                field.spec.kind,
                FieldKind::Text | FieldKind::Secret | FieldKind::File
            )
        })
    }

    /// Moves through the choices of the focused field. Single choice fields
    /// take the highlighted value immediately.
    pub fn cycle_choice(&mut self, delta: isize) -> bool {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return false;
        };
        if !matches!(field.spec.kind, FieldKind::Choice | FieldKind::MultiChoice)
            || field.choices.is_empty()
        {
            return false;
        }
        let len = field.choices.len() as isize;
        let start = if field.spec.kind == FieldKind::Choice && field.value.is_empty() && delta > 0
        {
            -1
        } else {
            field.cursor as isize
        };
        field.cursor = (start + delta).rem_euclid(len) as usize;
        if field.spec.kind == FieldKind::Choice {
            let previous = std::mem::replace(
                &mut field.value,
                field.choices[field.cursor].value.clone(),
            );
            field.touched = true;
            return previous != field.value;
        }
        false
    }

    pub fn toggle_choice(&mut self) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        if field.spec.kind != FieldKind::MultiChoice {
            return;
        }
        if let Some(choice) = field.choices.get(field.cursor) {
            if !field.selected.remove(&choice.value) {
                field.selected.insert(choice.value.clone());
            }
            field.touched = true;
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(field) = self.field_mut(key) {
            field.value = value.to_owned();
            field.sync_cursor();
        }
    }

    pub fn clear_value(&mut self, key: &str) {
        if let Some(field) = self.field_mut(key) {
            field.value.clear();
            field.cursor = 0;
        }
    }

    /// Validation message for a field, regardless of whether it was touched.
    pub fn field_error(&self, index: usize) -> Option<String> {
        let field = self.fields.get(index)?;
        if field.spec.create_only && self.target.is_edit() && field.is_blank() {
            return None;
        }
        for rule in field.spec.rules {
            if let Some(message) = self.check(field, *rule) {
                return Some(message);
            }
        }
        None
    }

    /// Validation message shown next to the field: only once touched.
    pub fn visible_error(&self, index: usize) -> Option<String> {
        let field = self.fields.get(index)?;
        if !field.touched {
            return None;
        }
        self.field_error(index)
    }

    pub fn is_valid(&self) -> bool {
        (0..self.fields.len()).all(|index| self.field_error(index).is_none())
    }

    fn check(&self, field: &Field, rule: Rule) -> Option<String> {
        let label = field.spec.label;
        let value = field.value.trim();
        if rule == Rule::Required {
            return field.is_blank().then(|| format!("{label} is required"));
        }
        if field.is_blank() {
            return None;
        }
        match rule {
            Rule::Required => None,
            Rule::Email => (!is_email(value)).then(|| format!("{label} must be a valid email")),
            Rule::MinLength(min) => (field.value.chars().count() < min)
                .then(|| format!("{label} must be at least {min} characters")),
            Rule::Matches(other) => {
                let other_field = self.field(other)?;
                (other_field.value != field.value)
                    .then(|| format!("{label} must match {}", other_field.spec.label))
            }
            Rule::Number => (!value.parse::<f64>().is_ok_and(f64::is_finite))
                .then(|| format!("{label} must be a number")),
            Rule::Date => parse_date(value)
                .is_none()
                .then(|| format!("{label} must be a date like 1990-04-21")),
            Rule::ExistingFile => (!Path::new(value).is_file())
                .then(|| format!("{label} must point to an existing file")),
        }
    }

    /// Touches every field and, when valid, moves to `Submitting` and
    /// returns what to send.
    pub fn submit(&mut self) -> Result<FormOutput> {
        if self.phase() != FormPhase::Ready {
            bail!("form is not ready -- wait for it to finish loading and retry");
        }
        for field in &mut self.fields {
            field.touched = true;
        }
        let invalid = (0..self.fields.len())
            .filter(|index| self.field_error(*index).is_some())
            .count();
        if invalid > 0 {
            if let Some(first) =
                (0..self.fields.len()).find(|index| self.field_error(*index).is_some())
            {
                self.focus = first;
            }
            bail!("{invalid} field(s) need attention -- fix them and retry");
        }

        let output = match &self.target {
            FormTarget::SignIn => FormOutput::SignIn {
                username: self.value("username").unwrap_or_default().trim().to_owned(),
                password: self.value("password").unwrap_or_default().to_owned(),
            },
            FormTarget::Create(kind) => FormOutput::Submit(Submission {
                kind: *kind,
                operation: SubmitOperation::Create,
                id: None,
                body: self.body(),
            }),
            FormTarget::Edit(kind, id) => FormOutput::Submit(Submission {
                kind: *kind,
                operation: SubmitOperation::Update,
                id: Some(id.clone()),
                body: self.body(),
            }),
        };
        self.stage = FormPhase::Submitting;
        self.error = None;
        Ok(output)
    }

    pub fn submit_succeeded(&mut self) {
        self.stage = FormPhase::Succeeded;
    }

    pub fn submit_failed(&mut self, error: &RequestError) {
        self.stage = FormPhase::Ready;
        self.error = Some(error.to_string());
    }

    fn sendable(&self) -> impl Iterator<Item = &Field> {
        let editing = self.target.is_edit();
        self.fields
            .iter()
            .filter(move |field| field.spec.submit && !(editing && field.spec.create_only && field.is_blank()))
    }

    fn body(&self) -> SubmissionBody {
        let attachment = self
            .sendable()
            .find(|field| field.spec.kind == FieldKind::File && !field.is_blank())
            .map(|field| Attachment {
                field: field.spec.key.to_owned(),
                path: PathBuf::from(field.value.trim()),
            });

        if attachment.is_some() {
            let fields = self
                .sendable()
                .filter(|field| field.spec.kind != FieldKind::File)
                .map(|field| (field.spec.key.to_owned(), text_value(field)))
                .collect();
            return SubmissionBody::Multipart { fields, attachment };
        }

        let mut object = Map::new();
        for field in self.sendable() {
            if field.spec.kind == FieldKind::File {
                continue;
            }
            object.insert(field.spec.key.to_owned(), json_value(field));
        }
        SubmissionBody::Json(Value::Object(object))
    }

    fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.spec.key == key)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.spec.key == key)
    }
}

fn text_value(field: &Field) -> String {
    match field.spec.kind {
        FieldKind::MultiChoice => field.selected.iter().cloned().collect::<Vec<_>>().join(","),
        FieldKind::Secret => field.value.clone(),
        _ => field.value.trim().to_owned(),
    }
}

fn json_value(field: &Field) -> Value {
    if field.spec.kind == FieldKind::MultiChoice {
        return Value::Array(field.selected.iter().cloned().map(Value::String).collect());
    }
    let text = text_value(field);
    if field.spec.rules.contains(&Rule::Number)
        && let Ok(number) = text.parse::<f64>()
    {
        return number_value(number);
    }
    if field.spec.key.ends_with("Id")
        && let Ok(id) = text.parse::<i64>()
    {
        return Value::from(id);
    }
    Value::String(text)
}

fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        Value::from(number as i64)
    } else {
        serde_json::Number::from_f64(number).map_or(Value::Null, Value::Number)
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
    use super::{
        Choice, FormOutput, FormPhase, FormState, FormTarget, Lookup, SubmissionBody, choices,
    };
    use crate::{
        Branch, BranchId, Collection, Company, CompanyId, EntityKind, Record, RequestError,
        SubmitOperation,
    };
    use anyhow::Result;
    use serde_json::json;

    fn type_into(form: &mut FormState, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    fn fill_branch(form: &mut FormState) {
        let values = ["North", "Main office", "Tashkent", "69.24", "41.31"];
        for value in values {
            type_into(form, value);
            form.focus_next();
        }
        assert!(form.cycle_choice(1));
    }

    fn company_choices() -> Vec<Choice> {
        vec![Choice::new("1", "Acme"), Choice::new("2", "Borealis")]
    }

    #[test]
    fn create_form_waits_for_lookups_before_ready() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Branch));
        assert_eq!(form.lookups(), vec![Lookup::Companies]);
        assert_eq!(form.phase(), FormPhase::LoadingReference);

        form.set_choices("companyId", company_choices());
        form.lookups_loaded();
        assert_eq!(form.phase(), FormPhase::Ready);

        let company = FormState::new(FormTarget::Create(EntityKind::Company));
        assert!(company.lookups().is_empty());
        assert_eq!(company.phase(), FormPhase::Ready);
    }

    #[test]
    fn errors_show_only_after_touch() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Company));
        assert_eq!(form.field_error(0).as_deref(), Some("name is required"));
        assert_eq!(form.visible_error(0), None);

        form.focus_next();
        assert_eq!(form.visible_error(0).as_deref(), Some("name is required"));
    }

    #[test]
    fn email_and_number_rules_apply_to_non_empty_values() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Company));
        form.set_value("email", "not-an-email");
        assert_eq!(
            form.field_error(2).as_deref(),
            Some("email must be a valid email")
        );
        form.set_value("email", "ops@acme.io");
        assert_eq!(form.field_error(2), None);

        let mut branch = FormState::new(FormTarget::Create(EntityKind::Branch));
        branch.set_value("longitude", "east");
        assert_eq!(
            branch.field_error(3).as_deref(),
            Some("longitude must be a number")
        );
    }

    #[test]
    fn number_rule_rejects_non_finite_values() -> Result<()> {
        let mut branch = FormState::new(FormTarget::Create(EntityKind::Branch));
        branch.set_choices("companyId", company_choices());
        branch.lookups_loaded();
        fill_branch(&mut branch);

        for text in ["NaN", "inf", "-inf", "infinity"] {
            branch.set_value("longitude", text);
            assert_eq!(
                branch.field_error(3).as_deref(),
                Some("longitude must be a number"),
                "{text} accepted"
            );
        }
        branch.set_value("latitude", "-Infinity");
        assert_eq!(
            branch.field_error(4).as_deref(),
            Some("latitude must be a number")
        );

        let error = branch.submit().expect_err("non-finite coordinates should not submit");
        assert!(error.to_string().contains("2 field(s)"));
        assert_eq!(branch.phase(), FormPhase::Ready);

        branch.set_value("longitude", "-69.5");
        branch.set_value("latitude", "41");
        assert!(branch.submit().is_ok());
        Ok(())
    }

    #[test]
    fn submit_blocks_invalid_form_and_touches_everything() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Company));
        let error = form.submit().expect_err("blank form should not submit");
        assert!(error.to_string().contains("4 field(s)"));
        assert!(form.fields().iter().all(|field| field.touched));
        assert_eq!(form.phase(), FormPhase::Ready);
    }

    #[test]
    fn branch_submission_is_typed_json() -> Result<()> {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Branch));
        form.set_choices("companyId", company_choices());
        form.lookups_loaded();
        fill_branch(&mut form);

        let FormOutput::Submit(submission) = form.submit()? else {
            panic!("expected entity submission");
        };
        assert_eq!(form.phase(), FormPhase::Submitting);
        assert_eq!(submission.kind, EntityKind::Branch);
        assert_eq!(submission.operation, SubmitOperation::Create);
        assert_eq!(
            submission.body,
            SubmissionBody::Json(json!({
                "name": "North",
                "description": "Main office",
                "location": "Tashkent",
                "longitude": 69.24,
                "latitude": 41.31,
                "companyId": 1,
            }))
        );
        Ok(())
    }

    #[test]
    fn failed_submit_returns_to_ready_with_message() -> Result<()> {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Branch));
        form.set_choices("companyId", company_choices());
        form.lookups_loaded();
        fill_branch(&mut form);
        form.submit()?;

        form.submit_failed(&RequestError::SubmitFailed {
            kind: EntityKind::Branch,
            operation: SubmitOperation::Create,
        });
        assert_eq!(form.phase(), FormPhase::Ready);
        assert_eq!(form.error(), Some("Failed to create branch"));
        Ok(())
    }

    #[test]
    fn edit_form_reinitializes_when_entity_arrives_late() {
        let mut form = FormState::new(FormTarget::Edit(EntityKind::Branch, "4".to_owned()));
        let record = Record::Branch(Branch {
            id: BranchId::new("4"),
            name: Some("South".to_owned()),
            description: Some("Depot".to_owned()),
            location: Some("Samarkand".to_owned()),
            longitude: Some(66.9),
            latitude: Some(39.6),
            department_count: None,
            company: None,
            company_id: Some(crate::RawId::Integer(2)),
        });

        form.populate(&record);
        assert_eq!(form.phase(), FormPhase::LoadingReference);
        assert_eq!(form.value("companyId"), Some("2"));

        form.set_choices("companyId", company_choices());
        form.lookups_loaded();
        assert_eq!(form.phase(), FormPhase::Ready);
        assert_eq!(form.fields()[5].display_value(), "Borealis");

        form.set_value("name", "edited");
        form.populate(&record);
        assert_eq!(form.value("name"), Some("South"));
    }

    #[test]
    fn entity_before_lookup_or_after_gives_the_same_form() {
        let record = Record::Company(Company {
            id: CompanyId::new("1"),
            name: Some("Acme".to_owned()),
            email: Some("ops@acme.io".to_owned()),
            address: Some("1 Main St".to_owned()),
            phone: Some("555".to_owned()),
            branch_count: None,
            department_count: None,
        });
        let mut form = FormState::new(FormTarget::Edit(EntityKind::Company, "1".to_owned()));
        assert_eq!(form.phase(), FormPhase::LoadingEntity);
        form.populate(&record);
        assert_eq!(form.phase(), FormPhase::Ready);
        assert!(form.is_valid());
    }

    #[test]
    fn user_password_rules() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::User));
        form.set_value("password", "abc");
        let password = form
            .fields()
            .iter()
            .position(|field| field.spec.key == "password")
            .expect("password field");
        assert_eq!(
            form.field_error(password).as_deref(),
            Some("password must be at least 6 characters")
        );

        form.set_value("password", "abcdef");
        form.set_value("repeatPassword", "abcdeg");
        assert_eq!(
            form.field_error(password + 1).as_deref(),
            Some("repeat password must match password")
        );
        form.set_value("repeatPassword", "abcdef");
        assert_eq!(form.field_error(password + 1), None);
    }

    #[test]
    fn edit_user_does_not_require_password_or_photo() {
        let form = FormState::new(FormTarget::Edit(EntityKind::User, "3".to_owned()));
        for key in ["password", "repeatPassword", "image"] {
            let index = form
                .fields()
                .iter()
                .position(|field| field.spec.key == key)
                .expect("field present");
            assert_eq!(form.field_error(index), None, "{key}");
        }
    }

    #[test]
    fn employee_with_photo_submits_multipart() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("avery.jpg");
        std::fs::write(&photo, b"jpeg")?;

        let mut form = FormState::new(FormTarget::Create(EntityKind::Employee));
        form.set_choices("companyId", company_choices());
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
        let SubmissionBody::Multipart { fields, attachment } = submission.body else {
            panic!("expected multipart body");
        };
        let attachment = attachment.expect("photo attached");
        assert_eq!(attachment.field, "image");
        assert_eq!(attachment.file_name(), "avery.jpg");
        assert!(fields.contains(&("salary".to_owned(), "1200".to_owned())));
        assert!(!fields.iter().any(|(key, _)| key == "image"));
        Ok(())
    }

    #[test]
    fn bad_birth_date_is_rejected() {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Employee));
        form.set_value("birthDate", "21/04/1990");
        let index = form
            .fields()
            .iter()
            .position(|field| field.spec.key == "birthDate")
            .expect("birth date field");
        assert!(form.field_error(index).is_some());
    }

    #[test]
    fn role_permissions_toggle_into_a_list() -> Result<()> {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Role));
        type_into(&mut form, "Auditor");
        form.focus_next();
        form.toggle_choice();
        form.cycle_choice(2);
        form.toggle_choice();

        let FormOutput::Submit(submission) = form.submit()? else {
            panic!("expected entity submission");
        };
        assert_eq!(
            submission.body,
            SubmissionBody::Json(json!({
                "name": "Auditor",
                "permissionList": ["CREATE_COMPANY", "READ_COMPANY"],
            }))
        );
        Ok(())
    }

    #[test]
    fn department_company_is_local_and_drives_branch_lookup() -> Result<()> {
        let mut form = FormState::new(FormTarget::Create(EntityKind::Department));
        form.set_choices("companyId", company_choices());
        form.lookups_loaded();
        assert_eq!(form.branch_company(), None);

        assert!(form.cycle_choice(1));
        assert_eq!(form.branch_company(), Some("1"));

        form.set_choices("branchId", vec![Choice::new("10", "North")]);
        form.focus_next();
        type_into(&mut form, "Finance");
        form.focus_next();
        form.cycle_choice(1);

        let FormOutput::Submit(submission) = form.submit()? else {
            panic!("expected entity submission");
        };
        assert_eq!(
            submission.body,
            SubmissionBody::Json(json!({ "name": "Finance", "branchId": 10 }))
        );
        Ok(())
    }

    #[test]
    fn record_choices_use_the_display_field() {
        let collection = Collection::Companies(vec![
            Company {
                id: CompanyId::new("1"),
                name: Some("Acme".to_owned()),
                email: None,
                address: None,
                phone: None,
                branch_count: None,
                department_count: None,
            },
            Company {
                id: CompanyId::new("2"),
                name: None,
                email: None,
                address: None,
                phone: None,
                branch_count: None,
                department_count: None,
            },
        ]);
        assert_eq!(
            choices(&collection),
            vec![Choice::new("1", "Acme"), Choice::new("2", "2")]
        );
    }

    #[test]
    fn sign_in_form_yields_credentials() -> Result<()> {
        let mut form = FormState::new(FormTarget::SignIn);
        type_into(&mut form, "admin");
        form.focus_next();
        type_into(&mut form, "secret");
        assert_eq!(form.fields()[1].display_value(), "••••••");

        assert_eq!(
            form.submit()?,
            FormOutput::SignIn {
                username: "admin".to_owned(),
                password: "secret".to_owned(),
            }
        );
        Ok(())
    }
}
