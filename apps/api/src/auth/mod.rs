// Authentication: bcrypt password hashing, HS256 bearer tokens, role guards and
// Redis-backed login throttling.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod repository;
pub mod throttle;
pub mod token;

pub use extractor::CurrentUser;
