//! Scheduler Tests
//!
//! Job CRUD rules, the eligibility predicate, queue behavior and the two
//! dispatch-loop outcomes: log-and-continue versus fatal stop.

#[cfg(test)]
mod tests {
    use crate::bus::{self, CorrelationBus};
    use crate::config::Timeouts;
    use crate::error::OrchestratorError;
    use crate::orchestrator::actor::OrchestratorActor;
    use crate::orchestrator::messages::{OrchestratorReply, OrchestratorRequest};
    use crate::registry::table::ProcessorTable;
    use crate::registry::types::{ClusterExport, ClusterMode, ModuleConfig, ProcessorAddr};
    use crate::scheduler::scheduler::JobScheduler;
    use crate::scheduler::types::{Interval, Job, JobFilter};
    use crate::storage::actor::{StorageActor, StorageReply, StorageRequest};
    use crate::storage::logging::MemoryLog;
    use crate::storage::memory::{Config, MemoryStore};
    use crate::supervisor::registry::SupervisorRegistry;

    use axum::{Router, http::StatusCode, routing::post};
    use std::sync::Arc;
    use std::time::Duration;

    fn timeouts() -> Timeouts {
        Timeouts {
            bus_call: Duration::from_secs(1),
            provision: Duration::from_secs(1),
            ..Timeouts::default()
        }
    }

    /// Whole control plane minus the HTTP boundary: storage actor, supervisor
    /// registry, orchestrator actor, scheduler.
    struct Harness {
        scheduler: Arc<JobScheduler>,
        table: Arc<ProcessorTable>,
        store: Arc<MemoryStore>,
        supervisors: Arc<SupervisorRegistry>,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let (storage_bus, storage_inbox) = bus::channel(16);
        tokio::spawn(StorageActor::new(store.clone()).run(storage_inbox));

        let supervisors =
            SupervisorRegistry::new(storage_bus.clone(), MemoryLog::new(), timeouts());
        let (supervisor_bus, supervisor_inbox) = bus::channel(16);
        tokio::spawn(supervisors.clone().serve(supervisor_inbox));

        let table = Arc::new(ProcessorTable::new());
        let actor = OrchestratorActor::new(
            table.clone(),
            supervisor_bus,
            storage_bus.clone(),
            timeouts(),
        );
        let (orchestrator_bus, orchestrator_inbox) = bus::channel(16);
        tokio::spawn(actor.run(orchestrator_inbox));

        let scheduler = JobScheduler::new(storage_bus, orchestrator_bus, timeouts());
        Harness {
            scheduler,
            table,
            store,
            supervisors,
        }
    }

    fn job(id: &str, module: &str, cluster: &str, minutes: u32) -> Job {
        Job {
            id: id.to_string(),
            module: module.to_string(),
            cluster: cluster.to_string(),
            config: "default".to_string(),
            interval: Interval::minutes(minutes),
            metadata: serde_json::Value::Null,
        }
    }

    async fn stub_processor(status: StatusCode) -> ProcessorAddr {
        let app = Router::new().route("/supervisor", post(move || async move { status }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ProcessorAddr::new(addr.ip().to_string(), addr.port())
    }

    // ============================================================
    // TEST 1: The eligibility rule
    // ============================================================

    #[test]
    fn test_is_time_to_run() {
        let every_ten = job("a", "sales", "ingest", 10);

        assert!(every_ten.is_time_to_run(0, false));
        assert!(every_ten.is_time_to_run(20, false));
        assert!(!every_ten.is_time_to_run(25, false));

        // A running job never fires, whatever the minute
        assert!(!every_ten.is_time_to_run(20, true));

        // A zero interval is inert data
        let inert = job("b", "sales", "ingest", 0);
        assert!(!inert.is_time_to_run(0, false));
    }

    // ============================================================
    // TEST 2: Duplicate rules on create
    // ============================================================

    #[tokio::test]
    async fn test_create_job_rejects_duplicates() {
        let h = harness();

        h.scheduler
            .create_job(job("a", "sales", "ingest", 10))
            .await
            .unwrap();

        // Same identifier
        assert!(matches!(
            h.scheduler
                .create_job(job("a", "billing", "export", 5))
                .await,
            Err(OrchestratorError::DuplicateJob(_))
        ));

        // Different identifier, identical (module, cluster, interval)
        assert!(matches!(
            h.scheduler.create_job(job("b", "sales", "ingest", 10)).await,
            Err(OrchestratorError::DuplicateJob(_))
        ));

        // Same binding at a different cadence is a new job
        h.scheduler
            .create_job(job("b", "sales", "ingest", 5))
            .await
            .unwrap();
        assert_eq!(h.store.job_count(), 2);
    }

    #[tokio::test]
    async fn test_create_job_generates_missing_identifier() {
        let h = harness();

        let stored = h
            .scheduler
            .create_job(job("", "sales", "ingest", 10))
            .await
            .unwrap();

        assert!(!stored.id.is_empty());
    }

    #[tokio::test]
    async fn test_create_job_rejects_registered_stream_cluster() {
        // ARRANGE: the target cluster is registered as stream-mode
        let h = harness();
        h.table.add_processor("10.0.0.1", 9000).await.unwrap();
        h.table
            .add_module(
                &ProcessorAddr::new("10.0.0.1", 9000),
                ModuleConfig {
                    name: "sales".to_string(),
                    version: "1.0.0".to_string(),
                    contact: "ops@example.com".to_string(),
                    clusters: vec![ClusterExport {
                        name: "firehose".to_string(),
                        mode: ClusterMode::Stream,
                        static_mount: true,
                    }],
                },
            )
            .await
            .unwrap();

        // ACT + ASSERT
        assert!(matches!(
            h.scheduler
                .create_job(job("a", "sales", "firehose", 10))
                .await,
            Err(OrchestratorError::CanNotProvisionStreamCluster { .. })
        ));

        // A job for a not-yet-registered module is accepted
        h.scheduler
            .create_job(job("b", "billing", "export", 10))
            .await
            .unwrap();
    }

    // ============================================================
    // TEST 3: Filter precedence on list and delete
    // ============================================================

    #[tokio::test]
    async fn test_filter_precedence() {
        let h = harness();
        h.scheduler
            .create_job(job("a", "m", "c1", 10))
            .await
            .unwrap();
        h.scheduler
            .create_job(job("b", "m", "c2", 10))
            .await
            .unwrap();

        // Module alone selects both
        let by_module = h.scheduler.list_jobs(JobFilter::by_module("m")).await.unwrap();
        assert_eq!(by_module.len(), 2);

        // Module + cluster selects one
        let by_cluster = h
            .scheduler
            .list_jobs(JobFilter::by_cluster("m", "c1"))
            .await
            .unwrap();
        assert_eq!(by_cluster.len(), 1);
        assert_eq!(by_cluster[0].id, "a");

        // Identifier wins over everything else in the filter
        let by_id = h
            .scheduler
            .list_jobs(JobFilter {
                id: Some("b".to_string()),
                module: Some("elsewhere".to_string()),
                cluster: None,
                interval: None,
            })
            .await
            .unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].id, "b");

        // Module + cluster + interval is the most specific non-id filter
        let exact = h
            .scheduler
            .list_jobs(JobFilter {
                id: None,
                module: Some("m".to_string()),
                cluster: Some("c1".to_string()),
                interval: Some(Interval::minutes(10)),
            })
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        // Delete follows the same precedence
        assert_eq!(
            h.scheduler.delete_jobs(JobFilter::by_id("b")).await.unwrap(),
            1
        );
        assert_eq!(
            h.scheduler
                .delete_jobs(JobFilter::by_module("m"))
                .await
                .unwrap(),
            1
        );
        assert!(matches!(
            h.scheduler.delete_jobs(JobFilter::by_module("m")).await,
            Err(OrchestratorError::NotFound)
        ));
    }

    // ============================================================
    // TEST 4: Eligibility pass and queue behavior
    // ============================================================

    #[tokio::test]
    async fn test_tick_enqueues_once_per_dispatch() {
        let h = harness();
        h.scheduler
            .create_job(job("a", "sales", "ingest", 10))
            .await
            .unwrap();
        h.scheduler
            .create_job(job("b", "sales", "export", 20))
            .await
            .unwrap();

        // ACT: minute 20 makes both eligible, in id order
        h.scheduler.tick(20).await;

        let queued = h.scheduler.queued_jobs().await;
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].id, "a");
        assert_eq!(queued[1].id, "b");

        // The snapshot did not drain anything
        assert_eq!(h.scheduler.queued_jobs().await.len(), 2);

        // ASSERT: a second pass skips jobs already in flight
        h.scheduler.tick(20).await;
        assert_eq!(h.scheduler.queued_jobs().await.len(), 2);

        // Minute 25 makes neither eligible
        h.scheduler.tick(25).await;
        assert_eq!(h.scheduler.queued_jobs().await.len(), 2);
    }

    // ============================================================
    // TEST 5: Dispatch outcomes
    // ============================================================

    #[tokio::test]
    async fn test_dispatch_empty_queue_is_idle() {
        let h = harness();
        assert_eq!(h.scheduler.dispatch_next().await.unwrap(), false);
    }

    #[tokio::test]
    async fn test_dispatch_success_creates_supervisor() {
        // ARRANGE: registered processor, mounted batch cluster, stored config
        let h = harness();
        let processor = stub_processor(StatusCode::OK).await;
        h.table
            .add_processor(&processor.host, processor.port)
            .await
            .unwrap();
        h.table
            .add_module(
                &processor,
                ModuleConfig {
                    name: "sales".to_string(),
                    version: "1.0.0".to_string(),
                    contact: "ops@example.com".to_string(),
                    clusters: vec![ClusterExport {
                        name: "ingest".to_string(),
                        mode: ClusterMode::Batch,
                        static_mount: true,
                    }],
                },
            )
            .await
            .unwrap();
        h.store
            .store_config(
                "sales",
                "ingest",
                Config {
                    name: "default".to_string(),
                    content: serde_json::json!({}),
                },
            )
            .unwrap();

        h.scheduler
            .create_job(job("a", "sales", "ingest", 1))
            .await
            .unwrap();
        h.scheduler.tick(7).await;

        // ACT
        assert_eq!(h.scheduler.dispatch_next().await.unwrap(), true);

        // ASSERT: the supervisor exists and the job can fire again
        assert_eq!(h.supervisors.count(), 1);
        h.scheduler.tick(7).await;
        assert_eq!(h.scheduler.queued_jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ordinary_dispatch_failure_continues() {
        // ARRANGE: the job's module is not registered anywhere
        let h = harness();
        h.scheduler
            .create_job(job("a", "sales", "ingest", 1))
            .await
            .unwrap();
        h.scheduler.tick(0).await;

        // ACT: dispatch fails (ModuleDoesNotExist) but the loop keeps going
        assert_eq!(h.scheduler.dispatch_next().await.unwrap(), true);

        // ASSERT: the in-flight mark was cleared, the next tick retries
        h.scheduler.tick(0).await;
        assert_eq!(h.scheduler.queued_jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stream_cluster_dispatch_is_fatal() {
        // ARRANGE: the definition slipped in before the module registered as
        // stream-mode
        let h = harness();
        h.scheduler
            .create_job(job("a", "sales", "firehose", 1))
            .await
            .unwrap();
        h.table.add_processor("10.0.0.1", 9000).await.unwrap();
        h.table
            .add_module(
                &ProcessorAddr::new("10.0.0.1", 9000),
                ModuleConfig {
                    name: "sales".to_string(),
                    version: "1.0.0".to_string(),
                    contact: "ops@example.com".to_string(),
                    clusters: vec![ClusterExport {
                        name: "firehose".to_string(),
                        mode: ClusterMode::Stream,
                        static_mount: true,
                    }],
                },
            )
            .await
            .unwrap();
        h.scheduler.tick(0).await;

        // ACT + ASSERT
        assert!(matches!(
            h.scheduler.dispatch_next().await,
            Err(OrchestratorError::CanNotProvisionStreamCluster { .. })
        ));
    }

    #[tokio::test]
    async fn test_bus_timeout_during_dispatch_is_fatal() {
        // ARRANGE: a scheduler whose orchestrator actor is gone
        let store = MemoryStore::new();
        let (storage_bus, storage_inbox) = bus::channel::<StorageRequest, StorageReply>(16);
        tokio::spawn(StorageActor::new(store.clone()).run(storage_inbox));

        let (dead_orchestrator, inbox) =
            bus::channel::<OrchestratorRequest, OrchestratorReply>(16);
        drop(inbox);

        let scheduler = JobScheduler::new(storage_bus, dead_orchestrator, timeouts());
        store.create_job(job("a", "sales", "ingest", 1)).unwrap();
        scheduler.tick(0).await;

        // ACT + ASSERT
        assert!(matches!(
            scheduler.dispatch_next().await,
            Err(OrchestratorError::NoResponseReceived { .. })
        ));
    }
}
