pub mod definition;
pub mod hardware;
pub mod identity;
pub mod reading;

pub use definition::SensorDefinition;
pub use hardware::{BusHandle, Pin};
pub use identity::{ConfigIdentity, SensorFamily, StageKind};
pub use reading::Reading;
