pub mod clock;
pub mod counter_store;
pub mod local_counters;
pub mod metrics;
pub mod quota;
pub mod redis;

pub use clock::*;
pub use counter_store::*;
pub use local_counters::*;
pub use metrics::*;
pub use quota::*;
pub use self::redis::*;
