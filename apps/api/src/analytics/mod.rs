// Recruiting analytics: per-job score distributions, dashboard totals, skill and
// department breakdowns, hiring trends. Cross-job reports are cached in Redis.

pub mod cache;
pub mod handlers;
pub mod service;
