use crate::MockConnection;
use spool_core::Driver;

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDriver;
impl MockDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;
    const NAME: &'static str = "mock";
}
