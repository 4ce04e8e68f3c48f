//! Port trait definitions (Hexagonal Architecture)
//!
//! - Logger: structured logging
//! - Clock: source of the current time
//!
//! The service layer depends only on these traits; adapters live in
//! `infrastructure` (or are the simple implementations below).

pub mod clock;
pub mod logger;
pub mod null_logger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logger::{Level, Logger};
pub use null_logger::NullLogger;
