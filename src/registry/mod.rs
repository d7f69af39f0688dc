pub mod items;
pub mod paths;

pub use items::{ConfigItemRegistry, ConfigItemSink};
pub use paths::PathRegistry;
