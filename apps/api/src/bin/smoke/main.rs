//! End-to-end smoke run against a live API: registers a throwaway admin, walks
//! a job from creation through resume upload, evaluation and analytics, then
//! cleans up. Exits non-zero when any step fails.

mod client;

use anyhow::{bail, Result};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::client::{Outcome, SmokeClient, SmokeError};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const PASSWORD: &str = "SmokeTest123!";

const RESUME_TEXT: &str = "Jordan Smoke
jordan.smoke@example.com
(555) 123-4567

Skills: Python, Django, PostgreSQL, Docker, AWS

Experience
Senior Software Engineer at Acme Corp (2018 - 2024)
6+ years of experience building Python web services.

Education
B.S. in Computer Science, State University
";

#[derive(Default)]
struct Tally {
    passed: usize,
    failed: usize,
}

impl Tally {
    /// Prints the step result and returns the outcome only when it succeeded.
    fn record(&mut self, step: &str, result: Result<Outcome, SmokeError>) -> Option<Outcome> {
        match result {
            Ok(outcome) if outcome.is_success() => {
                println!("PASS  {step} ({})", outcome.status);
                self.passed += 1;
                Some(outcome)
            }
            Ok(outcome) => {
                println!("FAIL  {step} ({})", outcome.status);
                println!("      {}", outcome.body);
                self.failed += 1;
                None
            }
            Err(e) => {
                println!("FAIL  {step} ({e})");
                self.failed += 1;
                None
            }
        }
    }

    fn skip(&mut self, step: &str, reason: &str) {
        println!("FAIL  {step} (skipped: {reason})");
        self.failed += 1;
    }
}

fn job_payload() -> Value {
    json!({
        "title": "Smoke Test Python Developer",
        "description": "Build and run Python services with Django and PostgreSQL.",
        "requirements": ["3+ years of Python", "Relational databases"],
        "skills_required": ["Python", "Django", "PostgreSQL"],
        "department": "Engineering",
        "location": "Remote",
        "job_type": "Full-time",
        "experience_required": 3,
        "salary_range": {"min": 90000, "max": 130000},
        "status": "Open"
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let base_url =
        std::env::var("SMOKE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    println!("Smoke run against {base_url}");

    let mut api = SmokeClient::new(&base_url)?;
    let mut tally = Tally::default();

    tally.record("GET /health", api.send(|c| c.get(api.url("/health"))).await);
    tally.record("GET /", api.send(|c| c.get(api.url("/"))).await);

    let email = format!("smoke-admin-{}@example.com", Uuid::new_v4().simple());
    tally.record(
        "POST /auth/register",
        api.send(|c| {
            c.post(api.url("/auth/register")).json(&json!({
                "name": "Smoke Admin",
                "email": email,
                "password": PASSWORD,
                "role": "admin"
            }))
        })
        .await,
    );

    let token = tally
        .record(
            "POST /auth/token",
            api.send(|c| {
                c.post(api.url("/auth/token"))
                    .form(&[("username", email.as_str()), ("password", PASSWORD)])
            })
            .await,
        )
        .and_then(|o| {
            o.body
                .get("access_token")
                .and_then(Value::as_str)
                .map(String::from)
        });
    let Some(token) = token else {
        tally.skip("remaining steps", "no access token");
        bail!("smoke run failed: {} passed, {} failed", tally.passed, tally.failed);
    };
    api.set_token(token);

    tally.record("GET /auth/me", api.send(|c| c.get(api.url("/auth/me"))).await);

    let job = job_payload();
    let job_id = tally
        .record("POST /jobs/", api.send(|c| c.post(api.url("/jobs/")).json(&job)).await)
        .and_then(|o| o.id());
    tally.record("GET /jobs/", api.send(|c| c.get(api.url("/jobs/"))).await);

    if let Some(job_id) = job_id {
        let path = format!("/jobs/{job_id}");
        tally.record(&format!("GET {path}"), api.send(|c| c.get(api.url(&path))).await);

        let bytes = RESUME_TEXT.as_bytes().to_vec();
        let applicant_email = format!("smoke-applicant-{}@example.com", Uuid::new_v4().simple());
        let resume_id = tally
            .record(
                "POST /resumes/",
                api.send(|c| {
                    let part = Part::bytes(bytes.clone())
                        .file_name("resume.txt")
                        .mime_str("text/plain")
                        .unwrap_or_else(|_| Part::bytes(bytes.clone()).file_name("resume.txt"));
                    let form = Form::new()
                        .text("job_id", job_id.to_string())
                        .text("name", "Jordan Smoke")
                        .text("email", applicant_email.clone())
                        .text("phone", "(555) 123-4567")
                        .part("file", part);
                    c.post(api.url("/resumes/")).multipart(form)
                })
                .await,
            )
            .and_then(|o| o.id());

        match resume_id {
            Some(resume_id) => {
                let path = format!("/matching/evaluate/{job_id}/{resume_id}");
                tally.record(&format!("POST {path}"), api.send(|c| c.post(api.url(&path))).await);
            }
            None => tally.skip("POST /matching/evaluate", "no resume id"),
        }

        let path = format!("/screening/job/{job_id}");
        tally.record(&format!("GET {path}"), api.send(|c| c.get(api.url(&path))).await);

        tally.record(
            "GET /analytics/dashboard",
            api.send(|c| c.get(api.url("/analytics/dashboard"))).await,
        );
        let path = format!("/analytics/jobs/{job_id}");
        tally.record(&format!("GET {path}"), api.send(|c| c.get(api.url(&path))).await);
        tally.record(
            "GET /analytics/skills",
            api.send(|c| c.get(api.url("/analytics/skills"))).await,
        );

        let path = format!("/jobs/{job_id}");
        tally.record(&format!("DELETE {path}"), api.send(|c| c.delete(api.url(&path))).await);
    } else {
        tally.skip("job steps", "no job id");
    }

    tally.record(
        "POST /auth/deactivate",
        api.send(|c| c.post(api.url("/auth/deactivate"))).await,
    );

    println!("\n{} passed, {} failed", tally.passed, tally.failed);
    if tally.failed > 0 {
        bail!("smoke run failed");
    }
    Ok(())
}
