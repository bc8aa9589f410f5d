//! Demo company dataset: departments, employees, projects and assignments.
//!
//! Generation is driven by a seeded RNG and an anchor date, so the same
//! [`SeedPlan`] always produces the same rows.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection};
use tracing::info;

use tabletalk_core::error::{Result, TabletalkError};

use crate::db::Database;

const COMPANY_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS departments (
    dept_id     INTEGER PRIMARY KEY,
    dept_name   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    emp_id          INTEGER PRIMARY KEY,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    phone_number    TEXT,
    hire_date       DATE NOT NULL,
    job_id          TEXT,
    salary          REAL,
    dept_id         INTEGER REFERENCES departments (dept_id)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id      INTEGER PRIMARY KEY,
    project_name    TEXT NOT NULL,
    start_date      DATE NOT NULL,
    end_date        DATE
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id   INTEGER PRIMARY KEY,
    emp_id          INTEGER NOT NULL REFERENCES employees (emp_id),
    project_id      INTEGER NOT NULL REFERENCES projects (project_id),
    assignment_date DATE NOT NULL
);
";

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Carlos", "Priya", "Wei", "Amara", "Kenji", "Fatima",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Taylor", "Moore", "Nguyen", "Patel",
    "Kim", "Okafor",
];

const JOBS: &[&str] = &[
    "Accountant", "Data Analyst", "Software Engineer", "Recruiter", "Product Manager",
    "Sales Associate", "Support Specialist", "Designer", "Legal Counsel", "Operations Lead",
    "Marketing Manager", "Research Scientist", "Quality Engineer", "Buyer",
];

const DEPARTMENT_AREAS: &[&str] = &[
    "Finance", "Engineering", "Human Resources", "Sales", "Marketing", "Operations", "Legal",
    "Research", "Support", "Procurement", "Design", "Quality",
];

const PROJECT_ADJECTIVES: &[&str] = &[
    "Adaptive", "Unified", "Scalable", "Integrated", "Proactive", "Streamlined", "Secure",
    "Distributed",
];

const PROJECT_NOUNS: &[&str] = &[
    "Platform", "Pipeline", "Portal", "Framework", "Dashboard", "Migration", "Rollout", "Toolkit",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// How much data to generate.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub departments: usize,
    pub employees: usize,
    pub projects: usize,
    pub assignments: usize,
    pub seed: u64,
    /// "Today" for the generated date ranges.
    pub anchor: NaiveDate,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            departments: 10,
            employees: 150,
            projects: 30,
            assignments: 220,
            seed: 42,
            anchor: Utc::now().date_naive(),
        }
    }
}

/// Row counts actually written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub departments: usize,
    pub employees: usize,
    pub projects: usize,
    pub assignments: usize,
}

/// Create the company tables if needed and replace their contents.
pub fn seed_company(db: &Database, plan: &SeedPlan) -> Result<SeedReport> {
    let report = db.with_conn(|conn| {
        conn.execute_batch(COMPANY_SCHEMA).map_err(storage_err)?;
        let tx = conn.unchecked_transaction().map_err(storage_err)?;
        let report = populate(&tx, plan)?;
        tx.commit().map_err(storage_err)?;
        Ok(report)
    })?;

    info!(
        departments = report.departments,
        employees = report.employees,
        projects = report.projects,
        assignments = report.assignments,
        seed = plan.seed,
        "Company dataset seeded"
    );
    Ok(report)
}

fn populate(conn: &Connection, plan: &SeedPlan) -> Result<SeedReport> {
    conn.execute_batch(
        "DELETE FROM assignments;
         DELETE FROM projects;
         DELETE FROM employees;
         DELETE FROM departments;",
    )
    .map_err(storage_err)?;

    let mut rng = StdRng::seed_from_u64(plan.seed);
    let mut report = SeedReport::default();

    for i in 0..plan.departments {
        let area = DEPARTMENT_AREAS[i % DEPARTMENT_AREAS.len()];
        let name = match i / DEPARTMENT_AREAS.len() {
            0 => format!("{} Department", area),
            round => format!("{} Department {}", area, round + 1),
        };
        conn.execute(
            "INSERT INTO departments (dept_id, dept_name) VALUES (?1, ?2)",
            params![i as i64 + 1, name],
        )
        .map_err(storage_err)?;
        report.departments += 1;
    }

    let dept_ids: Vec<i64> = (1..=plan.departments as i64).collect();
    for i in 0..plan.employees {
        let first = pick(&mut rng, FIRST_NAMES);
        let last = pick(&mut rng, LAST_NAMES);
        let email = format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            i,
            pick(&mut rng, EMAIL_DOMAINS)
        );
        let phone = format!(
            "555-{:03}-{:04}",
            rng.random_range(100..1000),
            rng.random_range(0..10000)
        );
        let hire_date = days_before(&mut rng, plan.anchor, 5 * 365);
        let salary = (rng.random_range(30_000.0..120_000.0_f64) * 100.0).round() / 100.0;
        let dept_id = dept_ids.choose(&mut rng).copied();
        conn.execute(
            "INSERT INTO employees
                (emp_id, first_name, last_name, email, phone_number, hire_date, job_id, salary, dept_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                i as i64 + 1,
                first,
                last,
                email,
                phone,
                iso(hire_date),
                pick(&mut rng, JOBS),
                salary,
                dept_id
            ],
        )
        .map_err(storage_err)?;
        report.employees += 1;
    }

    for i in 0..plan.projects {
        let name = format!(
            "{} {}",
            pick(&mut rng, PROJECT_ADJECTIVES),
            pick(&mut rng, PROJECT_NOUNS)
        );
        let start = days_before(&mut rng, plan.anchor, 2 * 365);
        let end = rng
            .random_bool(0.8)
            .then(|| start + Duration::days(rng.random_range(30..=365)));
        conn.execute(
            "INSERT INTO projects (project_id, project_name, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![i as i64 + 1, name, iso(start), end.map(iso)],
        )
        .map_err(storage_err)?;
        report.projects += 1;
    }

    if plan.employees > 0 && plan.projects > 0 {
        for i in 0..plan.assignments {
            let emp_id = rng.random_range(1..=plan.employees as i64);
            let project_id = rng.random_range(1..=plan.projects as i64);
            let date = days_before(&mut rng, plan.anchor, 365);
            conn.execute(
                "INSERT INTO assignments (assignment_id, emp_id, project_id, assignment_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![i as i64 + 1, emp_id, project_id, iso(date)],
            )
            .map_err(storage_err)?;
            report.assignments += 1;
        }
    }

    Ok(report)
}

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn days_before(rng: &mut StdRng, anchor: NaiveDate, max_days: i64) -> NaiveDate {
    anchor - Duration::days(rng.random_range(0..=max_days))
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn storage_err(e: rusqlite::Error) -> TabletalkError {
    TabletalkError::Storage(e.to_string())
}
