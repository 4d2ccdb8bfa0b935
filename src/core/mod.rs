pub mod config;
pub mod telemetry;

pub use self::config::AppConfig;
pub use self::telemetry::init_tracing;
