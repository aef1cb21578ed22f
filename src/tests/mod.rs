//! Crate-level test suites exercising handles, binding and groups together.

mod stress;

/// Knobs shared by the heavier suites.
pub(crate) struct TestConfig {
    pub(crate) stress_task_count: usize,
    pub(crate) property_rounds: usize,
    pub(crate) seed: u64,
}

pub(crate) static TEST_CONFIG: spin::Mutex<TestConfig> = spin::Mutex::new(TestConfig {
    stress_task_count: 64,
    property_rounds: 20,
    seed: 0x5EED_1234_ABCD_0001,
});
