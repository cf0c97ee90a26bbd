//! Regex-based field extraction from resume plain text.
//!
//! Everything here is pure and synchronous. Fields that cannot be found are
//! left empty rather than failing the parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::keywords::{max_years, resume_skills_in};

const EDUCATION_KEYWORDS: &[&str] = &[
    "bachelor", "master", "phd", "doctorate", "bsc", "msc", "mba", "b.tech", "m.tech", "b.e.",
    "m.e.", "bca", "mca", "diploma", "certification", "course", "training",
];

const EXPERIENCE_KEYWORDS: &[&str] = &[
    "experience", "work", "employment", "career", "professional", "job", "role", "position",
    "responsibilities", "achievements", "projects",
];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}")
        .expect("valid phone regex")
});
static LINKEDIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)linkedin\.com/(?:in|company)/[a-zA-Z0-9-]+").expect("valid linkedin regex")
});
static GITHUB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)github\.com/[a-zA-Z0-9-]+").expect("valid github regex"));
static WEBSITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:/\S*)?")
        .expect("valid website regex")
});
static DEGREE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(bachelor|master|phd|doctorate|bsc|msc|mba|b\.tech|m\.tech|b\.e\.|m\.e\.|bca|mca|diploma)\S*\s*(?:in|of)?\s*([a-z][a-z ]*)?",
    )
    .expect("valid degree regex")
});
static DATE_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{4})\s*[-–]\s*(\d{4}|present|current)").expect("valid date regex")
});
static GPA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gpa\s*:?\s*(\d+(?:\.\d+)?)").expect("valid gpa regex"));
static COMPANY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bat\s+([a-z0-9][a-z0-9 &.]*)").expect("valid company regex"));
static POSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z][A-Za-z ]*?(?:Developer|Engineer|Architect|Manager|Consultant|Analyst|Specialist|Lead|Director|Head|developer|engineer|architect|manager|consultant|analyst|specialist|lead|director|head))\b",
    )
    .expect("valid position regex")
});
static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bin\s+([a-z][a-z ,]*)").expect("valid location regex"));
static INLINE_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\f\v]+").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub field: String,
    pub institution: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: String,
    pub description: Vec<String>,
}

/// Structured fields pulled out of a resume. Stored as `parsed_data` JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
}

/// Collapses runs of spaces/tabs, trims every line and drops blank-line runs.
pub fn normalize_text(text: &str) -> String {
    let mut lines = Vec::new();
    let mut previous_blank = true;
    for line in text.replace('\r', "").lines() {
        let line = INLINE_SPACE_RE.replace_all(line.trim(), " ").into_owned();
        let blank = line.is_empty();
        if !(blank && previous_blank) {
            lines.push(line);
        }
        previous_blank = blank;
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

pub fn parse_resume(text: &str) -> ParsedResume {
    let text = normalize_text(text);
    let contact = extract_contact_info(&text);
    let name = first_line(&text);

    if name.is_empty() && contact.email.is_none() {
        return basic_info(&text);
    }

    ParsedResume {
        name,
        contact,
        skills: resume_skills_in(&text).into_iter().map(str::to_string).collect(),
        experience_years: max_years(&text).unwrap_or(0.0),
        education: extract_education(&text),
        work_experience: extract_experience(&text),
    }
}

/// Minimal fallback: first line as name (or `Unknown`), email and phone only.
pub fn basic_info(text: &str) -> ParsedResume {
    let name = first_line(text);
    ParsedResume {
        name: if name.is_empty() { "Unknown".to_string() } else { name },
        contact: ContactInfo {
            email: EMAIL_RE.find(text).map(|m| m.as_str().to_string()),
            phone: find_phone(text),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub fn extract_contact_info(text: &str) -> ContactInfo {
    let website = WEBSITE_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|url| {
            let lower = url.to_lowercase();
            !lower.contains("linkedin.com") && !lower.contains("github.com")
        })
        .map(str::to_string);

    ContactInfo {
        email: EMAIL_RE.find(text).map(|m| m.as_str().to_string()),
        phone: find_phone(text),
        linkedin: LINKEDIN_RE.find(text).map(|m| m.as_str().to_string()),
        github: GITHUB_RE.find(text).map(|m| m.as_str().to_string()),
        website,
    }
}

/// First phone-shaped run with at least ten digits, so year ranges are skipped.
fn find_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| candidate.chars().filter(char::is_ascii_digit).count() >= 10)
        .map(str::to_string)
}

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn date_range(line: &str) -> (Option<String>, Option<String>) {
    match DATE_RANGE_RE.captures(line) {
        Some(c) => (Some(c[1].to_string()), Some(c[2].to_string())),
        None => (None, None),
    }
}

pub fn extract_education(text: &str) -> Vec<Education> {
    let lines: Vec<&str> = text.lines().collect();
    let mut education = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !contains_any(line, EDUCATION_KEYWORDS) {
            continue;
        }
        let lower = line.to_lowercase();
        let (degree, field) = match DEGREE_RE.captures(&lower) {
            Some(c) => (
                c[1].to_string(),
                c.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        let (start_date, end_date) = date_range(line);

        education.push(Education {
            degree,
            field,
            institution: lines.get(i + 1).map(|l| l.trim().to_string()).unwrap_or_default(),
            start_date,
            end_date,
            gpa: GPA_RE.captures(&lower).map(|c| c[1].to_string()),
        });
    }
    education
}

pub fn extract_experience(text: &str) -> Vec<WorkExperience> {
    let lines: Vec<&str> = text.lines().collect();
    let mut experience = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !is_experience_line(line) {
            continue;
        }
        let lower = line.to_lowercase();
        let (start_date, end_date) = date_range(line);

        let description = lines[i + 1..]
            .iter()
            .map(|l| l.trim())
            .take_while(|l| !l.is_empty() && !is_experience_line(l))
            .filter_map(|l| l.strip_prefix('-').or_else(|| l.strip_prefix('•')))
            .map(|l| l.trim().to_string())
            .collect();

        experience.push(WorkExperience {
            company: company_name(&capture_trimmed(&COMPANY_RE, &lower)),
            position: capture_trimmed(&POSITION_RE, line),
            start_date,
            end_date,
            location: capture_trimmed(&LOCATION_RE, &lower)
                .trim_end_matches(',')
                .trim()
                .to_string(),
            description,
        });
    }
    experience
}

/// A heading with an experience keyword, or a "Title at Company YYYY - YYYY" line.
fn is_experience_line(line: &str) -> bool {
    contains_any(line, EXPERIENCE_KEYWORDS)
        || (DATE_RANGE_RE.is_match(line) && COMPANY_RE.is_match(&line.to_lowercase()))
}

/// Cuts the "at ..." capture before a trailing location or date.
fn company_name(raw: &str) -> String {
    let head = raw.split(" in ").next().unwrap_or_default();
    head.split_whitespace()
        .take_while(|word| !word.starts_with(|c: char| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capture_trimmed(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "John   Doe\r\n\
        john.doe@example.com | +1 555-123-4567\n\
        linkedin.com/in/johndoe  github.com/johndoe  https://johndoe.dev\n\
        \n\
        \n\
        Summary: Python developer with 5 years of experience in Django and AWS.\n\
        \n\
        Work Experience\n\
        Senior Software Engineer at Acme Corp in Berlin, Germany 2019 - Present\n\
        - Built REST APIs with FastAPI\n\
        - Led migration to Kubernetes\n\
        \n\
        Education\n\
        Bachelor of Science in Computer Science 2012 - 2016 GPA: 3.8\n\
        State University\n";

    #[test]
    fn test_normalize_text() {
        let text = normalize_text("  A \t  B  \r\n\n\n\nC  \n\n");
        assert_eq!(text, "A B\n\nC");
    }

    #[test]
    fn test_contact_info() {
        let contact = extract_contact_info(&normalize_text(SAMPLE));
        assert_eq!(contact.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+1 555-123-4567"));
        assert_eq!(contact.linkedin.as_deref(), Some("linkedin.com/in/johndoe"));
        assert_eq!(contact.github.as_deref(), Some("github.com/johndoe"));
        assert_eq!(contact.website.as_deref(), Some("https://johndoe.dev"));
    }

    #[test]
    fn test_phone_skips_year_ranges() {
        assert_eq!(find_phone("Worked 2018-2020 then 2020 - 2023"), None);
    }

    #[test]
    fn test_parse_resume_fields() {
        let parsed = parse_resume(SAMPLE);
        assert_eq!(parsed.name, "John Doe");
        assert_eq!(parsed.experience_years, 5.0);
        for skill in ["python", "django", "fastapi", "aws", "kubernetes", "rest"] {
            assert!(parsed.skills.contains(&skill.to_string()), "missing {skill}");
        }
        assert!(!parsed.skills.contains(&"java".to_string()));
    }

    #[test]
    fn test_work_experience_line() {
        let parsed = parse_resume(SAMPLE);
        let job = parsed
            .work_experience
            .iter()
            .find(|w| !w.company.is_empty())
            .expect("experience entry with company");
        assert_eq!(job.company, "acme corp");
        assert_eq!(job.position, "Senior Software Engineer");
        assert_eq!(job.location, "berlin, germany");
        assert_eq!(job.start_date.as_deref(), Some("2019"));
        assert_eq!(job.end_date.as_deref(), Some("Present"));
        assert_eq!(
            job.description,
            vec!["Built REST APIs with FastAPI", "Led migration to Kubernetes"]
        );
    }

    #[test]
    fn test_education_line() {
        let parsed = parse_resume(SAMPLE);
        let degree = parsed
            .education
            .iter()
            .find(|e| e.degree == "bachelor")
            .expect("bachelor entry");
        assert_eq!(degree.field, "science in computer science");
        assert_eq!(degree.institution, "State University");
        assert_eq!(degree.start_date.as_deref(), Some("2012"));
        assert_eq!(degree.end_date.as_deref(), Some("2016"));
        assert_eq!(degree.gpa.as_deref(), Some("3.8"));
    }

    #[test]
    fn test_company_name_trimming() {
        assert_eq!(company_name("acme corp in berlin"), "acme corp");
        assert_eq!(company_name("initech 2019 - 2021"), "initech");
        assert_eq!(company_name(""), "");
    }

    #[test]
    fn test_empty_text_falls_back_to_unknown() {
        let parsed = parse_resume("   \n  \n");
        assert_eq!(parsed.name, "Unknown");
        assert!(parsed.contact.email.is_none());
        assert!(parsed.skills.is_empty());
    }

    #[test]
    fn test_parsed_data_serializes_flat_contact() {
        let json = serde_json::to_value(parse_resume(SAMPLE)).unwrap();
        assert_eq!(json["email"], "john.doe@example.com");
        assert_eq!(json["name"], "John Doe");
        assert!(json["work_experience"].is_array());
    }
}
