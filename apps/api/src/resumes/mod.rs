// Resume intake: upload validation, text extraction, field parsing and S3 storage.

pub mod extract;
pub mod handlers;
pub mod parser;
pub mod repository;
pub mod storage;
