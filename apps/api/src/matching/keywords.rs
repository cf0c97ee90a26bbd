//! Text primitives shared by the scorers and the resume parser: tokenising,
//! skill vocabularies and "N years" extraction.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Dropped before keyword overlap is computed.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Vocabulary the keyword scorer treats as technical skills.
pub const TECHNICAL_SKILLS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "c++",
    "c#",
    "ruby",
    "php",
    "html",
    "css",
    "react",
    "angular",
    "vue",
    "node.js",
    "sql",
    "mysql",
    "postgresql",
    "mongodb",
    "docker",
    "kubernetes",
    "aws",
    "azure",
    "gcp",
    "machine learning",
    "artificial intelligence",
    "data science",
];

/// Wider vocabulary used when extracting skills from an uploaded resume.
pub const RESUME_SKILLS: &[&str] = &[
    // languages
    "python", "java", "javascript", "typescript", "c++", "c#", "ruby", "php", "go", "rust",
    "swift", "kotlin", "scala", "r", "matlab", "perl", "shell", "bash", "powershell",
    // web
    "html", "css", "sass", "less", "react", "angular", "vue", "node.js", "express",
    "django", "flask", "fastapi", "spring", "laravel", "ruby on rails", "asp.net",
    // databases
    "sql", "mysql", "postgresql", "mongodb", "redis", "cassandra", "oracle", "sqlite",
    "dynamodb", "firebase", "neo4j",
    // devops and cloud
    "docker", "kubernetes", "aws", "azure", "gcp", "terraform", "ansible", "jenkins",
    "git", "ci/cd", "github actions", "gitlab ci", "prometheus", "grafana",
    // ml and data
    "machine learning", "deep learning", "tensorflow", "pytorch", "keras", "scikit-learn",
    "pandas", "numpy", "matplotlib", "seaborn", "opencv", "nlp", "computer vision",
    // mobile
    "android", "ios", "react native", "flutter", "xamarin",
    // other
    "rest", "graphql", "grpc", "microservices", "serverless", "blockchain", "solidity",
    "ethereum", "web3", "cybersecurity", "penetration testing", "ethical hacking",
];

static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\+?\s*(?:years|yrs)").expect("valid years regex"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

static TECHNICAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> =
    Lazy::new(|| compile_vocabulary(TECHNICAL_SKILLS));
static RESUME_PATTERNS: Lazy<Vec<(&'static str, Regex)>> =
    Lazy::new(|| compile_vocabulary(RESUME_SKILLS));

fn compile_vocabulary(words: &[&'static str]) -> Vec<(&'static str, Regex)> {
    words
        .iter()
        .map(|w| (*w, skill_pattern(w)))
        .collect()
}

/// Whole-term matcher. Alphanumeric neighbours break the match, so `java` does not
/// hit `javascript`, while terms ending in punctuation (`c++`, `node.js`) still match.
fn skill_pattern(term: &str) -> Regex {
    let pattern = format!(r"(?:^|[^a-z0-9_]){}(?:$|[^a-z0-9_])", regex::escape(term));
    Regex::new(&pattern).expect("escaped skill pattern is valid")
}

/// Lowercased tokens with punctuation stripped and stop-words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD_RE
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

pub fn unique_tokens(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Technical-vocabulary skills named anywhere in `text`.
pub fn technical_skills_in(text: &str) -> Vec<&'static str> {
    find_terms(&TECHNICAL_PATTERNS, text)
}

/// Resume-vocabulary skills named anywhere in `text`, in vocabulary order.
pub fn resume_skills_in(text: &str) -> Vec<&'static str> {
    find_terms(&RESUME_PATTERNS, text)
}

fn find_terms(patterns: &[(&'static str, Regex)], text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let mut found = Vec::new();
    for (term, re) in patterns {
        if re.is_match(&lowered) && !found.contains(term) {
            found.push(*term);
        }
    }
    found
}

/// True when `term` appears in `text` as a whole term, case-insensitively.
pub fn mentions(text: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    skill_pattern(&term).is_match(&text.to_lowercase())
}

/// First "N years" / "N+ yrs" figure in the text.
pub fn first_years(text: &str) -> Option<f64> {
    YEARS_RE
        .captures(&text.to_lowercase())
        .and_then(|c| c[1].parse::<f64>().ok())
}

/// Largest "N years" figure in the text.
pub fn max_years(text: &str) -> Option<f64> {
    YEARS_RE
        .captures_iter(&text.to_lowercase())
        .filter_map(|c| c[1].parse::<f64>().ok())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation_and_stop_words() {
        let tokens = tokenize("The Senior, Python-developer at ACME and co.");
        assert_eq!(tokens, vec!["senior", "python", "developer", "acme", "co"]);
    }

    #[test]
    fn test_punctuated_skills_match_as_whole_terms() {
        let found = technical_skills_in("Built APIs in Node.js and C++; some C# too.");
        assert!(found.contains(&"node.js"));
        assert!(found.contains(&"c++"));
        assert!(found.contains(&"c#"));
    }

    #[test]
    fn test_skill_does_not_match_inside_longer_word() {
        let found = technical_skills_in("JavaScript only");
        assert_eq!(found, vec!["javascript"]);
        assert!(!mentions("reactive systems", "react"));
        assert!(mentions("Experience with React, Redux", "react"));
    }

    #[test]
    fn test_multi_word_skills() {
        let found = resume_skills_in("Interested in machine learning and Ruby on Rails.");
        assert!(found.contains(&"machine learning"));
        assert!(found.contains(&"ruby on rails"));
        assert!(found.contains(&"ruby"));
    }

    #[test]
    fn test_years_extraction() {
        let text = "3 years at Foo, then 7+ yrs at Bar";
        assert_eq!(first_years(text), Some(3.0));
        assert_eq!(max_years(text), Some(7.0));
        assert_eq!(first_years("no figures here"), None);
        assert_eq!(max_years(""), None);
    }
}
