//! Business logic shared between route handlers and background tasks.

pub mod documentation;
pub mod game_service;
pub mod health_service;
pub mod lobby_service;
pub mod payout;
pub mod roster;
pub mod sse_events;
pub mod sse_service;
pub mod storage_supervisor;
