/// Initialises the logger for tests, such that log messages are captured by
/// the test harness. Can be called multiple times, only the first call has an
/// effect.
pub fn test_logger() -> Result<(), log::SetLoggerError> {
    env_logger::builder().is_test(true).try_init()
}
