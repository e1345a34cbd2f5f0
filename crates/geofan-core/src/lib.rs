pub mod error;
pub mod item;
pub mod params;
pub mod time;

pub use error::{CoreError, ErrorCategory, Result};
pub use item::{DedupKeys, ResultItem};
pub use params::{ParamSet, ParamValue};
pub use time::{Timestamp, now_utc};
