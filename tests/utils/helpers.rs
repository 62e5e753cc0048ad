/// Test helper functions and service builders
use super::fakes::{FakeIdentity, FakeRegistry, RecordingObserver};
use orgsync::shared::config::{PipelineConfig, RetryTierConfig};
use orgsync::shared::utils::init_logger;
use orgsync::{BulkUploadService, InMemoryStatusSink};
use std::sync::Arc;

/// Config with millisecond backoffs so retried tests stay fast in real time
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.resilience.general = RetryTierConfig {
        max_retries: 3,
        initial_delay_ms: 5,
        max_delay_ms: 20,
        backoff_multiplier: 2.0,
        jitter_ratio: 0.1,
    };
    config.resilience.rate_limit = RetryTierConfig {
        max_retries: 5,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_multiplier: 2.0,
        jitter_ratio: 0.2,
    };
    config.resilience.overall_timeout_secs = 10;
    config
}

pub struct TestServices {
    pub service: BulkUploadService,
    pub registry: Arc<FakeRegistry>,
    pub sink: Arc<InMemoryStatusSink>,
    pub observer: Arc<RecordingObserver>,
}

/// Build the upload service around a fake registry and in-memory sink
pub fn build_test_services(registry: FakeRegistry) -> TestServices {
    build_test_services_with(fast_config(), registry, FakeIdentity::fixed())
}

pub fn build_test_services_with(
    config: PipelineConfig,
    registry: FakeRegistry,
    identity: FakeIdentity,
) -> TestServices {
    init_logger();
    let registry = Arc::new(registry);
    let sink = Arc::new(InMemoryStatusSink::new());
    let observer = Arc::new(RecordingObserver::default());

    let service = BulkUploadService::with_retry_observer(
        &config,
        observer.clone(),
        registry.clone(),
        Arc::new(identity),
        sink.clone(),
    );

    TestServices {
        service,
        registry,
        sink,
        observer,
    }
}
