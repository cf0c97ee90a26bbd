// Candidate evaluations: reviewer-entered results and automated scoring.

pub mod handlers;
pub mod models;
pub mod repository;
