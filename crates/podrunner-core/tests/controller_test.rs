//! Lifecycle controller behavior against in-memory collaborators.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use podrunner_common::error::{PodRunnerError, Result};
use podrunner_common::status::{PodPhase, PodStatus, StatusReport};
use podrunner_common::types::{ContainerId, ContainerSpec, PodSpec};
use podrunner_core::lifecycle::PodLifecycle;
use podrunner_core::{
    Collaborators, ControllerSettings, CoreError, PodController, error::TeardownStep,
};
use podrunner_runtime::engine::{ContainerInfo, RuntimeEngine};
use podrunner_runtime::engine::memory::{EngineCall, MemoryEngine};
use podrunner_runtime::registry::memory::{MemoryRegistry, RegistryCall};
use podrunner_runtime::status::StatusStore;
use podrunner_runtime::status::json::JsonStatusStore;
use podrunner_runtime::status::memory::MemoryStatusStore;
use podrunner_runtime::translate::{ConfigTranslator, RuntimeConfig};

// ── Fixtures ─────────────────────────────────────────────────────────

fn container(name: &str, image: &str, ports: &[(u16, &str)]) -> ContainerSpec {
    ContainerSpec {
        name: name.into(),
        image: image.into(),
        http_ports: ports
            .iter()
            .map(|(p, s)| (*p, (*s).to_string()))
            .collect::<BTreeMap<_, _>>(),
        mem_limit: "128MiB".into(),
        cpus: 0.5,
        env: vec!["MODE=test".into()],
    }
}

fn web_pod() -> PodSpec {
    PodSpec {
        name: "web".into(),
        containers: vec![container("app", "app:v1", &[(8080, "web-svc")])],
    }
}

fn two_container_pod() -> PodSpec {
    PodSpec {
        name: "shop".into(),
        containers: vec![
            container("api", "api:v2", &[(8080, "api-svc")]),
            container("worker", "worker:v2", &[(9090, "worker-svc")]),
        ],
    }
}

struct Harness {
    engine: Arc<MemoryEngine>,
    registry: Arc<MemoryRegistry>,
    status: Arc<MemoryStatusStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with(MemoryEngine::new(), MemoryRegistry::new())
    }

    fn with(engine: MemoryEngine, registry: MemoryRegistry) -> Self {
        Self {
            engine: Arc::new(engine),
            registry: Arc::new(registry),
            status: Arc::new(MemoryStatusStore::new()),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            engine: self.engine.clone(),
            registry: self.registry.clone(),
            status: self.status.clone(),
            translator: ConfigTranslator::default(),
        }
    }

    fn controller(&self, spec: PodSpec) -> PodController {
        PodController::new(spec, self.collaborators(), ControllerSettings::default())
    }

    async fn history(&self, pod: &str) -> Vec<(PodPhase, String)> {
        self.status
            .get_latest(pod)
            .await
            .unwrap()
            .map(|s| {
                s.chronological()
                    .map(|r| (r.status, r.reason.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn latest(&self, pod: &str) -> StatusReport {
        self.status
            .get_latest(pod)
            .await
            .unwrap()
            .and_then(|s| s.latest().map(|e| e.report.clone()))
            .expect("pod has a status")
    }

    fn creates(&self) -> usize {
        self.engine.count(|c| matches!(c, EngineCall::Create(_)))
    }

    fn starts(&self) -> usize {
        self.engine.count(|c| matches!(c, EngineCall::Start(_)))
    }

    fn registered_ids(&self) -> BTreeSet<String> {
        self.registry
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RegistryCall::Register(r) => Some(r.id),
                RegistryCall::Deregister(_) => None,
            })
            .collect()
    }

    fn deregistered_ids(&self) -> Vec<String> {
        self.registry
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RegistryCall::Deregister(id) => Some(id),
                RegistryCall::Register(_) => None,
            })
            .collect()
    }
}

fn entry(status: PodPhase, reason: &str) -> (PodPhase, String) {
    (status, reason.to_string())
}

// ── Start sequence ───────────────────────────────────────────────────

#[tokio::test]
async fn web_pod_starts_and_registers_its_service() {
    let h = Harness::new();
    let controller = h.controller(web_pod());
    controller.await_start().await;

    assert_eq!(
        h.history("web").await,
        vec![
            entry(PodPhase::Pending, "PullingContainers"),
            entry(PodPhase::Pending, "StartingContainers"),
            entry(PodPhase::Running, "Started"),
        ]
    );
    assert_eq!(controller.state(), PodLifecycle::Running);
    assert!(
        h.engine
            .calls()
            .contains(&EngineCall::Create("podrunner-web-app".into()))
    );

    let live = h.engine.container("podrunner-web-app").expect("container exists");
    assert!(live.running);
    let (public, private) = live.published_ports().next().expect("published port");
    assert_eq!(private, 8080);

    let services = h.registry.services();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id, live.id.to_string());
    assert_eq!(services[0].name, "web-svc");
    assert_eq!(services[0].port, public);
    assert!(services[0].tags.is_empty());

    let registered = controller.registered_services();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].container, "app");
}

#[tokio::test]
async fn await_start_is_repeatable() {
    let h = Harness::new();
    let controller = h.controller(web_pod());
    controller.await_start().await;
    controller.await_start().await;
    assert_eq!(h.history("web").await.len(), 3);
    assert_eq!(h.creates(), 1);
}

#[tokio::test]
async fn failed_pod_is_never_restarted() {
    let h = Harness::new();
    h.status
        .seed(
            "web",
            [StatusReport::new(PodPhase::Failed, "ContainerFailedPulling")],
        )
        .await;

    let controller = h.controller(web_pod());
    controller.await_start().await;

    assert_eq!(
        h.history("web").await,
        vec![entry(PodPhase::Failed, "ContainerFailedPulling")]
    );
    assert!(h.engine.calls().is_empty());
    assert_eq!(controller.state(), PodLifecycle::Refused);
}

#[tokio::test]
async fn removed_pod_may_start_again() {
    let h = Harness::new();
    h.status
        .seed(
            "web",
            [
                StatusReport::new(PodPhase::Failed, "ContainerFailedStarting"),
                StatusReport::new(PodPhase::Removed, "RemovedOk"),
            ],
        )
        .await;

    let controller = h.controller(web_pod());
    controller.await_start().await;
    assert_eq!(h.latest("web").await.reason, "Started");
}

#[tokio::test]
async fn pull_failure_stops_before_creation() {
    let h = Harness::with(
        MemoryEngine::new().with_missing_image("app:v1"),
        MemoryRegistry::new(),
    );
    let controller = h.controller(web_pod());
    controller.await_start().await;

    let latest = h.latest("web").await;
    assert_eq!(latest.status, PodPhase::Failed);
    assert_eq!(latest.reason, "ContainerFailedPulling");
    assert!(latest.message.contains("app:v1"));
    assert_eq!(h.creates(), 0);
    assert_eq!(h.starts(), 0);
    assert!(h.registry.calls().is_empty());
    assert_eq!(controller.state(), PodLifecycle::Failed);
}

#[tokio::test]
async fn pull_failure_reports_first_container_in_declared_order() {
    let h = Harness::with(
        MemoryEngine::new()
            .with_missing_image("api:v2")
            .with_pull_delay("api:v2", Duration::from_millis(50))
            .with_missing_image("worker:v2"),
        MemoryRegistry::new(),
    );
    let controller = h.controller(two_container_pod());
    controller.await_start().await;

    let latest = h.latest("shop").await;
    assert_eq!(latest.reason, "ContainerFailedPulling");
    assert_eq!(latest.message, "Failed pulling image api:v2");
    assert_eq!(h.creates(), 0);
}

#[tokio::test]
async fn existing_container_is_not_created_again() {
    let h = Harness::new();
    let pod = web_pod();
    let config = ConfigTranslator::default().translate(&pod, &pod.containers[0]).unwrap();
    let _ = h.engine.insert_existing(&config, false);

    let controller = h.controller(pod);
    controller.await_start().await;

    assert_eq!(h.creates(), 0);
    assert_eq!(h.starts(), 1);
    assert_eq!(h.latest("web").await.reason, "Started");
}

#[tokio::test]
async fn running_container_is_neither_started_nor_registered() {
    let h = Harness::new();
    let pod = web_pod();
    let config = ConfigTranslator::default().translate(&pod, &pod.containers[0]).unwrap();
    let _ = h.engine.insert_existing(&config, true);

    let controller = h.controller(pod);
    controller.await_start().await;

    assert_eq!(h.creates(), 0);
    assert_eq!(h.starts(), 0);
    assert!(h.registry.calls().is_empty());
    assert_eq!(h.latest("web").await.reason, "Started");
}

#[tokio::test]
async fn second_controller_reuses_containers_of_the_first() {
    let h = Harness::new();
    let first = h.controller(two_container_pod());
    first.await_start().await;
    let second = h.controller(two_container_pod());
    second.await_start().await;

    assert_eq!(h.creates(), 2);
    assert_eq!(h.starts(), 2);
}

#[tokio::test]
async fn creation_failure_is_reported_and_nothing_starts() {
    let h = Harness::with(
        MemoryEngine::new().with_failing_create("podrunner-shop-worker"),
        MemoryRegistry::new(),
    );
    let controller = h.controller(two_container_pod());
    controller.await_start().await;

    let latest = h.latest("shop").await;
    assert_eq!(latest.status, PodPhase::Failed);
    assert_eq!(latest.reason, "ContainerFailedStarting");
    assert!(latest.message.starts_with("Failed starting containers"));
    assert!(latest.message.contains("simulated create failure"));
    assert_eq!(h.starts(), 0);
    // The sibling creation was not cancelled.
    assert!(h.engine.container("podrunner-shop-api").is_some());
}

#[tokio::test]
async fn start_failure_is_reported() {
    let h = Harness::with(
        MemoryEngine::new().with_failing_start("podrunner-web-app"),
        MemoryRegistry::new(),
    );
    let controller = h.controller(web_pod());
    controller.await_start().await;

    assert_eq!(
        h.history("web").await,
        vec![
            entry(PodPhase::Pending, "PullingContainers"),
            entry(PodPhase::Pending, "StartingContainers"),
            entry(PodPhase::Failed, "ContainerFailedStarting"),
        ]
    );
    assert!(h.latest("web").await.message.contains("simulated start failure"));
    assert!(h.registry.calls().is_empty());
}

#[tokio::test]
async fn failure_messages_respect_the_configured_limit() {
    let h = Harness::with(
        MemoryEngine::new().with_failing_create("podrunner-web-app"),
        MemoryRegistry::new(),
    );
    let settings = ControllerSettings {
        message_limit: 40,
        ..ControllerSettings::default()
    };
    let controller = PodController::new(web_pod(), h.collaborators(), settings);
    controller.await_start().await;
    assert_eq!(h.latest("web").await.message.chars().count(), 40);
}

#[tokio::test]
async fn oversized_memory_limit_fails_the_start() {
    let h = Harness::new();
    let mut pod = web_pod();
    pod.containers[0].mem_limit = "20000000000GiB".into();
    let controller = h.controller(pod);
    controller.await_start().await;

    let latest = h.latest("web").await;
    assert_eq!(latest.status, PodPhase::Failed);
    assert_eq!(latest.reason, "ContainerFailedStarting");
    assert!(latest.message.contains("invalid memLimit"));
    assert_eq!(h.creates(), 0);
    assert_eq!(controller.state(), PodLifecycle::Failed);
}

/// Engine whose `create` panics; everything else goes to a [`MemoryEngine`].
struct PanicOnCreate(Arc<MemoryEngine>);

#[async_trait]
impl RuntimeEngine for PanicOnCreate {
    async fn ensure_image(&self, image: &str) -> bool {
        self.0.ensure_image(image).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ContainerInfo>> {
        self.0.find_by_name(name).await
    }

    async fn find_by_id(&self, id: &ContainerId) -> Result<Option<ContainerInfo>> {
        self.0.find_by_id(id).await
    }

    async fn create(&self, config: &RuntimeConfig) -> Result<()> {
        panic!("runtime client bug while creating {}", config.name)
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.0.start(id).await
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<()> {
        self.0.remove(name, grace).await
    }
}

#[tokio::test]
async fn crashed_start_sequence_fails_the_pod_and_stop_still_tears_down() {
    let memory = Arc::new(MemoryEngine::new());
    let status = Arc::new(MemoryStatusStore::new());
    let deps = Collaborators {
        engine: Arc::new(PanicOnCreate(memory.clone())),
        registry: Arc::new(MemoryRegistry::new()),
        status: status.clone(),
        translator: ConfigTranslator::default(),
    };
    let controller = PodController::new(web_pod(), deps, ControllerSettings::default());
    controller.await_start().await;

    assert_eq!(controller.state(), PodLifecycle::Failed);
    let history = status.get_latest("web").await.unwrap().unwrap();
    let latest = &history.latest().unwrap().report;
    assert_eq!(latest.status, PodPhase::Failed);
    assert_eq!(latest.reason, "ContainerFailedStarting");
    assert!(latest.message.contains("panicked"));

    controller.stop(false).await.expect("teardown");
    let history = status.get_latest("web").await.unwrap().unwrap();
    assert_eq!(history.latest().unwrap().report.reason, "RemovedOk");
    assert_eq!(
        memory.count(|c| matches!(c, EngineCall::Remove { .. })),
        1
    );
    assert_eq!(controller.state(), PodLifecycle::Removed);
}

#[tokio::test]
async fn registration_is_retried_once() {
    let h = Harness::with(
        MemoryEngine::new(),
        MemoryRegistry::new().with_failing_register("web-svc", 1),
    );
    let controller = h.controller(web_pod());
    controller.await_start().await;

    assert_eq!(h.latest("web").await.reason, "Started");
    assert_eq!(h.registry.calls().len(), 2);
    assert_eq!(controller.registered_services().len(), 1);
}

#[tokio::test]
async fn persistent_registration_failure_is_published() {
    let h = Harness::with(
        MemoryEngine::new(),
        MemoryRegistry::new().with_failing_register("web-svc", 2),
    );
    let controller = h.controller(web_pod());
    controller.await_start().await;

    assert_eq!(
        h.history("web").await,
        vec![
            entry(PodPhase::Pending, "PullingContainers"),
            entry(PodPhase::Pending, "StartingContainers"),
            entry(PodPhase::Running, "Started"),
            entry(PodPhase::Running, "ServiceRegistrationFailed"),
        ]
    );
    assert!(controller.registered_services().is_empty());
    assert_eq!(controller.state(), PodLifecycle::Running);
}

// ── Teardown ─────────────────────────────────────────────────────────

#[tokio::test]
async fn stop_removes_and_deregisters_symmetrically() {
    let h = Harness::new();
    let controller = h.controller(two_container_pod());
    controller.await_start().await;
    let registered = h.registered_ids();
    assert_eq!(registered.len(), 2);

    controller.stop(false).await.expect("teardown");

    let deregistered = h.deregistered_ids();
    assert_eq!(deregistered.len(), registered.len());
    assert_eq!(deregistered.into_iter().collect::<BTreeSet<_>>(), registered);
    assert!(h.registry.services().is_empty());
    assert!(h.engine.container("podrunner-shop-api").is_none());
    assert!(
        h.engine.calls().contains(&EngineCall::Remove {
            name: "podrunner-shop-worker".into(),
            grace: Duration::from_secs(30),
        })
    );
    assert_eq!(h.latest("shop").await, StatusReport::new(PodPhase::Removed, "RemovedOk"));
    assert_eq!(controller.state(), PodLifecycle::Removed);
    assert!(controller.registered_services().is_empty());
}

#[tokio::test]
async fn forced_stop_uses_no_grace_period() {
    let h = Harness::new();
    let controller = h.controller(web_pod());
    controller.await_start().await;
    controller.stop(true).await.expect("teardown");

    assert!(h.engine.calls().contains(&EngineCall::Remove {
        name: "podrunner-web-app".into(),
        grace: Duration::ZERO,
    }));
}

#[tokio::test]
async fn stop_runs_once_when_called_sequentially() {
    let h = Harness::new();
    let controller = h.controller(web_pod());
    controller.await_start().await;

    controller.stop(false).await.expect("first stop");
    let calls_after_first = h.engine.calls().len();
    let history_after_first = h.history("web").await.len();

    controller.stop(false).await.expect("second stop");
    assert_eq!(h.engine.calls().len(), calls_after_first);
    assert_eq!(h.history("web").await.len(), history_after_first);
    assert_eq!(h.deregistered_ids().len(), 1);
}

#[tokio::test]
async fn stop_runs_once_when_calls_overlap() {
    let h = Harness::new();
    let controller = h.controller(two_container_pod());
    controller.await_start().await;

    let (a, b) = tokio::join!(controller.stop(false), controller.stop(false));
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(
        h.engine.count(|c| matches!(c, EngineCall::Remove { .. })),
        2
    );
    assert_eq!(h.deregistered_ids().len(), 2);
}

#[tokio::test]
async fn pod_without_public_ports_deregisters_nothing() {
    let h = Harness::new();
    let pod = PodSpec {
        name: "batch".into(),
        containers: vec![container("job", "job:v1", &[])],
    };
    let controller = h.controller(pod);
    controller.await_start().await;
    controller.stop(false).await.expect("teardown");

    assert!(h.registry.calls().is_empty());
    assert_eq!(h.latest("batch").await.reason, "RemovedOk");
}

#[tokio::test]
async fn failed_removal_still_deregisters_removed_containers() {
    let h = Harness::with(
        MemoryEngine::new().with_failing_remove("podrunner-shop-worker"),
        MemoryRegistry::new(),
    );
    let controller = h.controller(two_container_pod());
    controller.await_start().await;

    let err = controller.stop(false).await.expect_err("teardown must fail");
    let CoreError::Teardown(teardown) = err else {
        panic!("expected a teardown error");
    };
    assert_eq!(teardown.failures.len(), 1);
    assert_eq!(teardown.failures[0].step, TeardownStep::Remove);
    assert_eq!(teardown.failures[0].target, "podrunner-shop-worker");

    let api_id = h
        .registry
        .calls()
        .into_iter()
        .find_map(|c| match c {
            RegistryCall::Register(r) if r.name == "api-svc" => Some(r.id),
            _ => None,
        })
        .expect("api registered");
    assert_eq!(h.deregistered_ids(), vec![api_id]);

    assert_eq!(h.latest("shop").await.reason, "Started");
    assert_eq!(controller.state(), PodLifecycle::StopFailed);
    let leftover = controller.registered_services();
    assert_eq!(leftover.len(), 1);
    assert_eq!(leftover[0].container, "worker");
}

#[tokio::test]
async fn stop_during_start_waits_and_skips_later_stages() {
    let h = Harness::with(
        MemoryEngine::new().with_pull_delay("app:v1", Duration::from_millis(100)),
        MemoryRegistry::new(),
    );
    let controller = h.controller(web_pod());
    // Let the start sequence reach the pull stage.
    tokio::time::sleep(Duration::from_millis(20)).await;

    controller.stop(false).await.expect("teardown");

    assert_eq!(
        h.history("web").await,
        vec![
            entry(PodPhase::Pending, "PullingContainers"),
            entry(PodPhase::Removed, "RemovedOk"),
        ]
    );
    assert_eq!(h.creates(), 0);
    assert_eq!(h.starts(), 0);
    assert!(h.registry.calls().is_empty());
}

#[tokio::test]
async fn stop_during_creation_skips_the_start_stage() {
    let h = Harness::with(
        MemoryEngine::new().with_create_delay("podrunner-web-app", Duration::from_millis(100)),
        MemoryRegistry::new(),
    );
    let controller = h.controller(web_pod());
    // Let the start sequence reach the create stage.
    tokio::time::sleep(Duration::from_millis(20)).await;

    controller.stop(false).await.expect("teardown");

    assert_eq!(
        h.history("web").await,
        vec![
            entry(PodPhase::Pending, "PullingContainers"),
            entry(PodPhase::Pending, "StartingContainers"),
            entry(PodPhase::Removed, "RemovedOk"),
        ]
    );
    assert_eq!(h.creates(), 1);
    assert_eq!(h.starts(), 0);
    assert!(h.engine.container("podrunner-web-app").is_none());
    assert!(h.registry.calls().is_empty());
}

#[tokio::test]
async fn stop_of_refused_pod_clears_the_failure() {
    let h = Harness::new();
    h.status
        .seed(
            "web",
            [StatusReport::new(PodPhase::Failed, "ContainerFailedStarting")],
        )
        .await;
    let controller = h.controller(web_pod());
    controller.await_start().await;
    controller.stop(false).await.expect("teardown");

    assert_eq!(h.latest("web").await.reason, "RemovedOk");
    let restarted = h.controller(web_pod());
    restarted.await_start().await;
    assert_eq!(h.latest("web").await.reason, "Started");
}

// ── Status store interaction ─────────────────────────────────────────

struct UnavailableStore;

#[async_trait]
impl StatusStore for UnavailableStore {
    async fn ready(&self) -> Result<()> {
        Err(PodRunnerError::Config {
            message: "store offline".into(),
        })
    }

    async fn get_latest(&self, _pod: &str) -> Result<Option<PodStatus>> {
        Ok(None)
    }

    async fn report(&self, _pod: &str, _report: StatusReport) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn unavailable_status_store_aborts_quietly() {
    let engine = Arc::new(MemoryEngine::new());
    let deps = Collaborators {
        engine: engine.clone(),
        registry: Arc::new(MemoryRegistry::new()),
        status: Arc::new(UnavailableStore),
        translator: ConfigTranslator::default(),
    };
    let controller = PodController::new(web_pod(), deps, ControllerSettings::default());
    controller.await_start().await;

    assert_eq!(controller.state(), PodLifecycle::Aborted);
    assert!(engine.calls().is_empty());
}

/// Store whose `report` fails on the `fail_on`-th call (1-based).
struct FailingReport {
    inner: MemoryStatusStore,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingReport {
    fn new(fail_on: usize) -> Self {
        Self {
            inner: MemoryStatusStore::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StatusStore for FailingReport {
    async fn ready(&self) -> Result<()> {
        self.inner.ready().await
    }

    async fn get_latest(&self, pod: &str) -> Result<Option<PodStatus>> {
        self.inner.get_latest(pod).await
    }

    async fn report(&self, pod: &str, report: StatusReport) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(PodRunnerError::Config {
                message: "disk full".into(),
            });
        }
        self.inner.report(pod, report).await
    }
}

#[tokio::test]
async fn failed_publication_aborts_the_start_sequence() {
    for fail_on in [1, 2] {
        let engine = Arc::new(MemoryEngine::new());
        let status = Arc::new(FailingReport::new(fail_on));
        let deps = Collaborators {
            engine: engine.clone(),
            registry: Arc::new(MemoryRegistry::new()),
            status: status.clone(),
            translator: ConfigTranslator::default(),
        };
        let controller = PodController::new(web_pod(), deps, ControllerSettings::default());
        controller.await_start().await;

        assert_eq!(controller.state(), PodLifecycle::Aborted, "fail_on={fail_on}");
        assert_eq!(engine.count(|c| matches!(c, EngineCall::Create(_))), 0);
        assert_eq!(engine.count(|c| matches!(c, EngineCall::Start(_))), 0);
        if fail_on == 1 {
            assert_eq!(engine.count(|c| matches!(c, EngineCall::EnsureImage(_))), 0);
        }

        controller.stop(false).await.expect("teardown");
        let latest = status.get_latest("web").await.unwrap().unwrap();
        assert_eq!(latest.latest().unwrap().report.reason, "RemovedOk");
    }
}

#[tokio::test]
async fn json_store_records_the_full_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("status.json");
    let engine: Arc<dyn RuntimeEngine> = Arc::new(MemoryEngine::new());
    let deps = Collaborators {
        engine,
        registry: Arc::new(MemoryRegistry::new()),
        status: Arc::new(JsonStatusStore::new(&path)),
        translator: ConfigTranslator::new("edge"),
    };
    let controller = PodController::new(web_pod(), deps, ControllerSettings::default());
    controller.await_start().await;
    controller.stop(false).await.expect("teardown");

    let reopened = JsonStatusStore::new(&path);
    let status = reopened.get_latest("web").await.unwrap().unwrap();
    let reasons: Vec<_> = status.chronological().map(|r| r.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec!["PullingContainers", "StartingContainers", "Started", "RemovedOk"]
    );
}
