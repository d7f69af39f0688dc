use std::fmt;

/// A GPIO pin number on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin(pub u8);

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Handle to a shared multi-drop probe bus.
///
/// One handle serves any number of probe pipelines; the bus driver behind the
/// [`ProbeBus`](crate::hardware::ProbeBus) trait serializes the actual reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusHandle {
    pub pin: Pin,
}

impl BusHandle {
    pub fn new(pin: Pin) -> Self {
        Self { pin }
    }
}

impl fmt::Display for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1-Wire bus on {}", self.pin)
    }
}
