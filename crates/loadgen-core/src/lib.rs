pub mod config;
pub mod dispatch;
pub mod payload;
pub mod pool;
pub mod sink;
pub mod worker;

pub use config::*;
pub use dispatch::*;
pub use payload::*;
pub use pool::*;
pub use sink::*;
pub use worker::*;
