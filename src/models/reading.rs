/// A single value travelling down a pipeline.
///
/// `timestamp_ms` is taken by the hardware source and carried unchanged
/// through every transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f32,
    pub timestamp_ms: u64,
}

impl Reading {
    pub fn new(value: f32, timestamp_ms: u64) -> Self {
        Self { value, timestamp_ms }
    }

    pub fn with_value(self, value: f32) -> Self {
        Self { value, ..self }
    }
}
