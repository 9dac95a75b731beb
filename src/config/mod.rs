mod settings;

pub use settings::{RealtimeConfig, ReconnectConfig, Settings};
