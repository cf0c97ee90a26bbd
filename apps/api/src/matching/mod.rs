// Resume-to-job scoring. The scorer backend is chosen at startup and shared via AppState.

pub mod handlers;
pub mod keywords;
pub mod scorer;
