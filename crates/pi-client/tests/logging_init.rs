//! Subscriber installation runs in its own test binary so it cannot race
//! other tests that install a global subscriber.

use pi_client::logging::{self, LogFormat, TracingConfig};
use tracing::Level;

#[test]
fn test_init_is_idempotent() {
    let config = TracingConfig::new(Level::WARN).with_format(LogFormat::Compact);
    assert!(logging::init(config.clone()).is_ok());
    assert!(logging::init(config).is_ok());
    tracing::warn!("still logging after a second init");
}
