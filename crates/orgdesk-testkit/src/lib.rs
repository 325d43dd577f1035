// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use orgdesk_app::{Branch, Collection, Company, Department, Employee, EntityKind, Role, User};
use serde_json::{Value, json};
use std::io::{Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::NamedTempFile;
use tiny_http::{Header, Response, Server};

const COMPANY_ADJECTIVES: [&str; 12] = [
    "Premier", "Central", "Reliable", "Bright", "Summit", "Eagle", "Heritage", "Greenleaf",
    "Northern", "Harbor", "Apex", "Frontier",
];
const COMPANY_NOUNS: [&str; 10] = [
    "Logistics",
    "Textiles",
    "Foods",
    "Energy",
    "Systems",
    "Motors",
    "Pharma",
    "Media",
    "Builders",
    "Trading",
];
const COMPANY_SUFFIXES: [&str; 5] = ["LLC", "Group", "Holdings", "Co", "Partners"];

const CITIES: [&str; 10] = [
    "Tashkent",
    "Samarkand",
    "Bukhara",
    "Namangan",
    "Andijan",
    "Fergana",
    "Nukus",
    "Termez",
    "Khiva",
    "Navoi",
];
const STREET_NAMES: [&str; 8] = [
    "Amir Temur", "Navoi", "Mustaqillik", "Bobur", "Shota Rustaveli", "Chilonzor", "Yunusobod",
    "Olmazor",
];
const DEPARTMENT_NAMES: [&str; 10] = [
    "Finance",
    "Operations",
    "Human Resources",
    "Engineering",
    "Sales",
    "Marketing",
    "Procurement",
    "Legal",
    "Support",
    "Security",
];
const JOB_TITLES: [&str; 8] = [
    "Accountant",
    "Engineer",
    "Manager",
    "Analyst",
    "Driver",
    "Receptionist",
    "Technician",
    "Coordinator",
];
const SCHEDULES: [&str; 3] = ["09:00-18:00", "08:00-17:00", "shift"];
const ROLE_NAMES: [&str; 6] = ["ADMIN", "MANAGER", "HR", "AUDITOR", "OPERATOR", "VIEWER"];
const PERMISSIONS: [&str; 12] = [
    "CREATE_COMPANY",
    "UPDATE_COMPANY",
    "READ_COMPANY",
    "DELETE_COMPANY",
    "CREATE_BRANCH",
    "UPDATE_BRANCH",
    "READ_BRANCH",
    "DELETE_BRANCH",
    "CREATE_USER",
    "UPDATE_USER",
    "READ_USER",
    "DELETE_USER",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of server-shaped records. The same seed always yields
/// the same payloads.
#[derive(Debug, Clone)]
pub struct OrgFaker {
    rng: DeterministicRng,
}

impl OrgFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn company_json(&mut self, id: i64) -> Value {
        let name = format!(
            "{} {} {}",
            self.pick(&COMPANY_ADJECTIVES),
            self.pick(&COMPANY_NOUNS),
            self.pick(&COMPANY_SUFFIXES)
        );
        let domain = name
            .split_whitespace()
            .take(2)
            .collect::<String>()
            .to_lowercase();
        json!({
            "id": id,
            "name": name,
            "email": format!("office@{domain}.uz"),
            "address": self.address(),
            "phone": self.phone(),
            "branchCount": self.int_n(6),
            "departmentCount": self.int_n(20),
        })
    }

    pub fn branch_json(&mut self, id: i64, company_id: i64) -> Value {
        let city = self.pick(&CITIES);
        json!({
            "id": id,
            "name": format!("{city} branch"),
            "description": format!("{} office", self.pick(&DEPARTMENT_NAMES)),
            "location": city,
            "longitude": 55.0 + self.int_n(1_500) as f64 / 100.0,
            "latitude": 37.0 + self.int_n(600) as f64 / 100.0,
            "departmentCount": self.int_n(8),
            "companyId": company_id,
        })
    }

    pub fn department_json(&mut self, id: i64, branch_id: i64) -> Value {
        let city = self.pick(&CITIES);
        json!({
            "id": id,
            "name": self.pick(&DEPARTMENT_NAMES),
            "branchName": format!("{city} branch"),
            "branchId": branch_id,
            "employeeCount": self.int_n(40),
        })
    }

    pub fn employee_json(&mut self, id: i64, company_id: i64) -> Value {
        let (first, last) = self.person();
        json!({
            "id": id,
            "firstName": first,
            "lastName": last,
            "middleName": self.pick(&FIRST_NAMES),
            "email": format!("{}.{}@example.uz", first.to_lowercase(), last.to_lowercase()),
            "phoneNumber": self.phone(),
            "username": format!("{}{}", first.to_lowercase(), id),
            "birthDate": self.birth_date(),
            "gender": if self.rng.bool() { "MALE" } else { "FEMALE" },
            "jobTitle": self.pick(&JOB_TITLES),
            "schedule": self.pick(&SCHEDULES),
            "salary": 500 + self.int_n(4_500),
            "company": { "id": company_id, "name": format!("Company {company_id}") },
            "enabled": true,
        })
    }

    pub fn role_json(&mut self, id: i64) -> Value {
        let count = 1 + self.int_n(PERMISSIONS.len());
        let offset = self.int_n(PERMISSIONS.len());
        let permissions = (0..count)
            .map(|index| PERMISSIONS[(offset + index) % PERMISSIONS.len()])
            .collect::<Vec<_>>();
        json!({
            "id": id,
            "roleName": self.pick(&ROLE_NAMES),
            "permissions": permissions,
        })
    }

    pub fn user_json(&mut self, id: i64, company_id: i64, role_id: i64) -> Value {
        let mut user = self.employee_json(id, company_id);
        if let Value::Object(fields) = &mut user {
            fields.remove("schedule");
            fields.remove("salary");
            fields.insert(
                "role".to_owned(),
                json!({ "id": role_id, "roleName": self.pick(&ROLE_NAMES) }),
            );
            fields.insert("accountNonLocked".to_owned(), Value::Bool(self.rng.bool()));
        }
        user
    }

    /// A JSON array of `count` records of `kind`, ids starting at 1.
    pub fn list_json(&mut self, kind: EntityKind, count: usize) -> Value {
        let rows = (1..=count as i64)
            .map(|id| match kind {
                EntityKind::Company => self.company_json(id),
                EntityKind::Branch => self.branch_json(id, 1),
                EntityKind::Department => self.department_json(id, 1),
                EntityKind::Employee => self.employee_json(id, 1),
                EntityKind::Role => self.role_json(id),
                EntityKind::User => self.user_json(id, 1, 1),
            })
            .collect();
        Value::Array(rows)
    }

    pub fn collection(&mut self, kind: EntityKind, count: usize) -> Result<Collection> {
        let rows = self.list_json(kind, count);
        let collection = match kind {
            EntityKind::Company => Collection::Companies(decode::<Vec<Company>>(rows)?),
            EntityKind::Branch => Collection::Branches(decode::<Vec<Branch>>(rows)?),
            EntityKind::Department => Collection::Departments(decode::<Vec<Department>>(rows)?),
            EntityKind::Employee => Collection::Employees(decode::<Vec<Employee>>(rows)?),
            EntityKind::Role => Collection::Roles(decode::<Vec<Role>>(rows)?),
            EntityKind::User => Collection::Users(decode::<Vec<User>>(rows)?),
        };
        Ok(collection)
    }

    pub fn company(&mut self, id: i64) -> Result<Company> {
        decode(self.company_json(id))
    }

    fn person(&mut self) -> (&'static str, &'static str) {
        (self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn address(&mut self) -> String {
        format!(
            "{} {} street, {}",
            1 + self.int_n(120),
            self.pick(&STREET_NAMES),
            self.pick(&CITIES)
        )
    }

    fn phone(&mut self) -> String {
        format!(
            "+998 9{} {:03} {:02} {:02}",
            self.int_n(10),
            self.int_n(1_000),
            self.int_n(100),
            self.int_n(100)
        )
    }

    fn birth_date(&mut self) -> String {
        format!(
            "{}-{:02}-{:02}",
            1960 + self.int_n(45),
            1 + self.int_n(12),
            1 + self.int_n(28)
        )
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.int_n(items.len())]
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).context("decode generated record")
}

/// One canned reply for `MockApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
}

impl MockReply {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// What the client actually sent, captured by `MockApi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("decode recorded request body")
    }
}

/// Scripted HTTP server: answers requests with the given replies in order
/// and records each request. Stops after the last reply or when no request
/// arrives for a few seconds.
pub struct MockApi {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockApi {
    pub const PREFIX: &'static str = "/api/v1";

    pub fn start(replies: Vec<MockReply>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}{}", server.server_addr(), Self::PREFIX);

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for reply in replies {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                    break;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv(name))
                        .map(|header| header.value.as_str().to_owned())
                };
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    authorization: header("Authorization"),
                    content_type: header("Content-Type"),
                    body,
                });

                let mut response = Response::from_string(reply.body).with_status_code(reply.status);
                if let Ok(content_type) = Header::from_bytes("Content-Type", "application/json") {
                    response = response.with_header(content_type);
                }
                let _ = request.respond(response);
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for the server thread and returns every request it saw.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))
    }
}

/// Writes a JSON-lines descriptor feed, one frame per line.
pub fn descriptor_feed(frames: &[Vec<Vec<f32>>]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("create descriptor feed")?;
    for frame in frames {
        let line = serde_json::to_string(frame).context("encode frame")?;
        writeln!(file, "{line}").context("write descriptor feed")?;
    }
    file.flush().context("flush descriptor feed")?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::{MockApi, MockReply, OrgFaker, descriptor_feed};
    use anyhow::Result;
    use orgdesk_app::{EntityKind, Listable};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::io::Read;
    use std::net::TcpStream;

    #[test]
    fn same_seed_same_records() {
        let mut left = OrgFaker::new(42);
        let mut right = OrgFaker::new(42);
        assert_eq!(left.company_json(1), right.company_json(1));
        assert_eq!(left.user_json(2, 1, 1), right.user_json(2, 1, 1));
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = OrgFaker::new(seed);
            names.insert(faker.company_json(1)["name"].to_string());
        }
        assert!(names.len() >= 10, "got {}", names.len());
    }

    #[test]
    fn every_kind_decodes() -> Result<()> {
        let mut faker = OrgFaker::new(7);
        for kind in EntityKind::ALL {
            let collection = faker.collection(kind, 3)?;
            assert_eq!(collection.kind(), kind);
            assert_eq!(collection.len(), 3);
        }
        Ok(())
    }

    #[test]
    fn generated_company_has_display_field() -> Result<()> {
        let mut faker = OrgFaker::new(3);
        let company = faker.company(9)?;
        assert_eq!(company.row_id(), "9");
        assert!(!company.field("name").display().is_empty());
        Ok(())
    }

    #[test]
    fn int_n() {
        let mut faker = OrgFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }

    #[test]
    fn mock_api_records_requests() -> Result<()> {
        let api = MockApi::start(vec![MockReply::json(200, &json!([]))])?;
        let address = api
            .base_url()
            .trim_start_matches("http://")
            .trim_end_matches(MockApi::PREFIX)
            .to_owned();

        let mut stream = TcpStream::connect(&address)?;
        std::io::Write::write_all(
            &mut stream,
            b"GET /api/v1/company/list HTTP/1.1\r\nHost: test\r\nAuthorization: Bearer t\r\nConnection: close\r\n\r\n",
        )?;
        let mut response = String::new();
        stream.read_to_string(&mut response)?;
        assert!(response.starts_with("HTTP/1.1 200"));

        let requests = api.finish()?;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "/api/v1/company/list");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer t"));
        Ok(())
    }

    #[test]
    fn descriptor_feed_writes_one_line_per_frame() -> Result<()> {
        let feed = descriptor_feed(&[vec![vec![0.1, 0.2]], vec![]])?;
        let contents = std::fs::read_to_string(feed.path())?;
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(contents.lines().nth(1), Some("[]"));
        Ok(())
    }
}
