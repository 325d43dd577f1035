// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::*;
use crate::listing::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Company,
    Branch,
    Department,
    Employee,
    Role,
    User,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Company,
        Self::Branch,
        Self::Department,
        Self::Employee,
        Self::Role,
        Self::User,
    ];

    /// Path segment used by both the API and the route table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Branch => "branch",
            Self::Department => "department",
            Self::Employee => "employee",
            Self::Role => "role",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "company" => Some(Self::Company),
            "branch" => Some(Self::Branch),
            "department" => Some(Self::Department),
            "employee" => Some(Self::Employee),
            "role" => Some(Self::Role),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Company => "companies",
            Self::Branch => "branches",
            Self::Department => "departments",
            Self::Employee => "employees",
            Self::Role => "roles",
            Self::User => "users",
        }
    }

    /// Field the filter box matches against; also the initial sort key.
    pub const fn display_field(self) -> &'static str {
        match self {
            Self::Company | Self::Branch | Self::Department => "name",
            Self::Role => "roleName",
            Self::Employee | Self::User => "firstName",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    CreateCompany,
    UpdateCompany,
    ReadCompany,
    DeleteCompany,
    CreateBranch,
    UpdateBranch,
    ReadBranch,
    DeleteBranch,
    CreateUser,
    UpdateUser,
    ReadUser,
    DeleteUser,
}

impl Permission {
    pub const ALL: [Self; 12] = [
        Self::CreateCompany,
        Self::UpdateCompany,
        Self::ReadCompany,
        Self::DeleteCompany,
        Self::CreateBranch,
        Self::UpdateBranch,
        Self::ReadBranch,
        Self::DeleteBranch,
        Self::CreateUser,
        Self::UpdateUser,
        Self::ReadUser,
        Self::DeleteUser,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateCompany => "CREATE_COMPANY",
            Self::UpdateCompany => "UPDATE_COMPANY",
            Self::ReadCompany => "READ_COMPANY",
            Self::DeleteCompany => "DELETE_COMPANY",
            Self::CreateBranch => "CREATE_BRANCH",
            Self::UpdateBranch => "UPDATE_BRANCH",
            Self::ReadBranch => "READ_BRANCH",
            Self::DeleteBranch => "DELETE_BRANCH",
            Self::CreateUser => "CREATE_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::ReadUser => "READ_USER",
            Self::DeleteUser => "DELETE_USER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == value)
    }
}

/// A related record as the API embeds it: sometimes just a name, sometimes
/// a bare id, sometimes an object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reference {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Reference {
    pub fn display(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReference {
    Integer(i64),
    Text(String),
    Object {
        #[serde(default)]
        id: Option<RawId>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "roleName")]
        role_name: Option<String>,
    },
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let reference = match RawReference::deserialize(deserializer)? {
            RawReference::Integer(id) => Self {
                id: Some(id.to_string()),
                name: None,
            },
            RawReference::Text(name) => Self {
                id: None,
                name: Some(name),
            },
            RawReference::Object {
                id,
                name,
                role_name,
            } => Self {
                id: id.map(String::from),
                name: name.or(role_name),
            },
        };
        Ok(reference)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub branch_count: Option<i64>,
    pub department_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub department_count: Option<i64>,
    pub company: Option<Reference>,
    pub company_id: Option<RawId>,
}

impl Branch {
    /// Owning company id, whichever way the server chose to send it.
    pub fn company_id(&self) -> Option<String> {
        self.company_id
            .clone()
            .map(String::from)
            .or_else(|| self.company.as_ref().and_then(|company| company.id.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: Option<String>,
    pub branch_name: Option<String>,
    pub branch_id: Option<RawId>,
    pub employee_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub job_title: Option<String>,
    pub schedule: Option<String>,
    pub salary: Option<f64>,
    pub company: Option<Reference>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub role_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<Reference>,
    pub role: Option<Reference>,
    pub enabled: Option<bool>,
    pub account_non_locked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn column(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// An entity that can back a list screen.
pub trait Listable: Clone {
    const KIND: EntityKind;

    fn columns() -> &'static [Column];
    fn row_id(&self) -> &str;
    fn field(&self, key: &str) -> FieldValue;
}

fn flag(value: Option<bool>) -> FieldValue {
    match value {
        Some(true) => FieldValue::text("yes"),
        Some(false) => FieldValue::text("no"),
        None => FieldValue::Missing,
    }
}

fn reference(value: &Option<Reference>) -> FieldValue {
    FieldValue::from(value.as_ref().and_then(Reference::display))
}

impl Listable for Company {
    const KIND: EntityKind = EntityKind::Company;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 6] = [
            column("name", "name"),
            column("email", "email"),
            column("address", "address"),
            column("phone", "phone"),
            column("branchCount", "branches"),
            column("departmentCount", "departments"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::from(self.name.as_deref()),
            "email" => FieldValue::from(self.email.as_deref()),
            "address" => FieldValue::from(self.address.as_deref()),
            "phone" => FieldValue::from(self.phone.as_deref()),
            "branchCount" => FieldValue::from(self.branch_count),
            "departmentCount" => FieldValue::from(self.department_count),
            _ => FieldValue::Missing,
        }
    }
}

impl Listable for Branch {
    const KIND: EntityKind = EntityKind::Branch;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 5] = [
            column("name", "name"),
            column("description", "description"),
            column("location", "location"),
            column("company", "company"),
            column("departmentCount", "departments"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::from(self.name.as_deref()),
            "description" => FieldValue::from(self.description.as_deref()),
            "location" => FieldValue::from(self.location.as_deref()),
            "longitude" => FieldValue::from(self.longitude),
            "latitude" => FieldValue::from(self.latitude),
            "company" => reference(&self.company),
            "departmentCount" => FieldValue::from(self.department_count),
            _ => FieldValue::Missing,
        }
    }
}

impl Listable for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 3] = [
            column("name", "name"),
            column("branchName", "branch"),
            column("employeeCount", "employees"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "name" => FieldValue::from(self.name.as_deref()),
            "branchName" => FieldValue::from(self.branch_name.as_deref()),
            "employeeCount" => FieldValue::from(self.employee_count),
            _ => FieldValue::Missing,
        }
    }
}

impl Listable for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 8] = [
            column("firstName", "first name"),
            column("lastName", "last name"),
            column("email", "email"),
            column("phoneNumber", "phone"),
            column("username", "username"),
            column("company", "company"),
            column("jobTitle", "job title"),
            column("enabled", "enabled"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "firstName" => FieldValue::from(self.first_name.as_deref()),
            "lastName" => FieldValue::from(self.last_name.as_deref()),
            "email" => FieldValue::from(self.email.as_deref()),
            "phoneNumber" => FieldValue::from(self.phone_number.as_deref()),
            "username" => FieldValue::from(self.username.as_deref()),
            "company" => reference(&self.company),
            "jobTitle" => FieldValue::from(self.job_title.as_deref()),
            "salary" => FieldValue::from(self.salary),
            "enabled" => flag(self.enabled),
            _ => FieldValue::Missing,
        }
    }
}

impl Listable for Role {
    const KIND: EntityKind = EntityKind::Role;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 2] = [
            column("roleName", "role"),
            column("permissions", "permissions"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "roleName" => FieldValue::from(self.role_name.as_deref()),
            "permissions" if self.permissions.is_empty() => FieldValue::Missing,
            "permissions" => FieldValue::Text(self.permissions.join(", ")),
            _ => FieldValue::Missing,
        }
    }
}

impl Listable for User {
    const KIND: EntityKind = EntityKind::User;

    fn columns() -> &'static [Column] {
        const COLUMNS: [Column; 7] = [
            column("firstName", "first name"),
            column("lastName", "last name"),
            column("email", "email"),
            column("username", "username"),
            column("role", "role"),
            column("enabled", "enabled"),
            column("accountNonLocked", "unlocked"),
        ];
        &COLUMNS
    }

    fn row_id(&self) -> &str {
        self.id.as_str()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "firstName" => FieldValue::from(self.first_name.as_deref()),
            "lastName" => FieldValue::from(self.last_name.as_deref()),
            "email" => FieldValue::from(self.email.as_deref()),
            "phoneNumber" => FieldValue::from(self.phone_number.as_deref()),
            "username" => FieldValue::from(self.username.as_deref()),
            "role" => reference(&self.role),
            "enabled" => flag(self.enabled),
            "accountNonLocked" => flag(self.account_non_locked),
            _ => FieldValue::Missing,
        }
    }
}

/// A fetched collection for one list screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Companies(Vec<Company>),
    Branches(Vec<Branch>),
    Departments(Vec<Department>),
    Employees(Vec<Employee>),
    Roles(Vec<Role>),
    Users(Vec<User>),
}

impl Collection {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Companies(_) => EntityKind::Company,
            Self::Branches(_) => EntityKind::Branch,
            Self::Departments(_) => EntityKind::Department,
            Self::Employees(_) => EntityKind::Employee,
            Self::Roles(_) => EntityKind::Role,
            Self::Users(_) => EntityKind::User,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Companies(rows) => rows.len(),
            Self::Branches(rows) => rows.len(),
            Self::Departments(rows) => rows.len(),
            Self::Employees(rows) => rows.len(),
            Self::Roles(rows) => rows.len(),
            Self::Users(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single fetched record, used to seed edit forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Company(Company),
    Branch(Branch),
    Department(Department),
    Employee(Employee),
    Role(Role),
    User(User),
}

impl Record {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Company(_) => EntityKind::Company,
            Self::Branch(_) => EntityKind::Branch,
            Self::Department(_) => EntityKind::Department,
            Self::Employee(_) => EntityKind::Employee,
            Self::Role(_) => EntityKind::Role,
            Self::User(_) => EntityKind::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Branch, Company, EntityKind, Listable, Permission, Role, User};
    use crate::listing::FieldValue;

    #[test]
    fn entity_kind_round_trips_through_path_segment() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("house"), None);
    }

    #[test]
    fn permission_names_match_server_enum() {
        assert_eq!(Permission::ALL.len(), 12);
        assert_eq!(
            Permission::parse("DELETE_BRANCH"),
            Some(Permission::DeleteBranch)
        );
        assert_eq!(Permission::parse("delete_branch"), None);
    }

    #[test]
    fn company_decodes_with_missing_optional_fields() {
        let company: Company =
            serde_json::from_str(r#"{"id":3,"name":"Acme"}"#).expect("decode company");
        assert_eq!(company.row_id(), "3");
        assert_eq!(company.field("name"), FieldValue::text("Acme"));
        assert_eq!(company.field("email"), FieldValue::Missing);
    }

    #[test]
    fn branch_company_accepts_name_or_object() {
        let by_name: Branch =
            serde_json::from_str(r#"{"id":1,"name":"North","company":"Acme"}"#)
                .expect("decode branch by name");
        assert_eq!(by_name.field("company"), FieldValue::text("Acme"));
        assert_eq!(by_name.company_id(), None);

        let by_object: Branch = serde_json::from_str(
            r#"{"id":"1","name":"North","company":{"id":9,"name":"Acme"}}"#,
        )
        .expect("decode branch by object");
        assert_eq!(by_object.field("company"), FieldValue::text("Acme"));
        assert_eq!(by_object.company_id().as_deref(), Some("9"));
    }

    #[test]
    fn user_role_reads_role_name_from_object() {
        let user: User = serde_json::from_str(
            r#"{"id":5,"firstName":"Avery","role":{"id":2,"roleName":"Admin","permissions":[]},"enabled":true}"#,
        )
        .expect("decode user");
        assert_eq!(user.field("role"), FieldValue::text("Admin"));
        assert_eq!(user.field("enabled"), FieldValue::text("yes"));
        assert_eq!(user.field("accountNonLocked"), FieldValue::Missing);
    }

    #[test]
    fn role_permissions_join_for_display() {
        let role: Role = serde_json::from_str(
            r#"{"id":1,"roleName":"Manager","permissions":["READ_COMPANY","READ_BRANCH"]}"#,
        )
        .expect("decode role");
        assert_eq!(
            role.field("permissions"),
            FieldValue::text("READ_COMPANY, READ_BRANCH")
        );
    }
}
