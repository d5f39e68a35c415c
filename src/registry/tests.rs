//! Processor Registry Tests
//!
//! Covers registration identity rules, module version/contact uniqueness,
//! mount gating, cascading deletion and the round-robin selection invariant.

#[cfg(test)]
mod tests {
    use crate::error::OrchestratorError;
    use crate::registry::table::ProcessorTable;
    use crate::registry::types::{ClusterExport, ClusterMode, ModuleConfig, ProcessorAddr};

    fn export(name: &str, mode: ClusterMode, static_mount: bool) -> ClusterExport {
        ClusterExport {
            name: name.to_string(),
            mode,
            static_mount,
        }
    }

    fn sales_config() -> ModuleConfig {
        ModuleConfig {
            name: "sales".to_string(),
            version: "1.0.0".to_string(),
            contact: "ops@example.com".to_string(),
            clusters: vec![export("ingest", ClusterMode::Batch, true)],
        }
    }

    async fn table_with_processor(host: &str, port: u16) -> (ProcessorTable, ProcessorAddr) {
        let table = ProcessorTable::new();
        table.add_processor(host, port).await.unwrap();
        (table, ProcessorAddr::new(host, port))
    }

    // ============================================================
    // TEST 1: Processor identity is unique
    // ============================================================

    #[tokio::test]
    async fn test_duplicate_processor_is_rejected() {
        // ARRANGE
        let (table, _) = table_with_processor("10.0.0.1", 9000).await;
        assert_eq!(table.processor_count().await, 1);

        // ACT
        let result = table.add_processor("10.0.0.1", 9000).await;

        // ASSERT: rejected and the count is unchanged
        assert!(matches!(result, Err(OrchestratorError::AlreadyExists { .. })));
        assert_eq!(table.processor_count().await, 1);

        // Same host, different port is a different identity
        table.add_processor("10.0.0.1", 9001).await.unwrap();
        assert_eq!(table.processor_count().await, 2);
    }

    #[tokio::test]
    async fn test_remove_unknown_processor_fails() {
        let table = ProcessorTable::new();

        let result = table.remove_processor("10.0.0.9", 9000).await;

        assert!(matches!(result, Err(OrchestratorError::DoesNotExist { .. })));
    }

    // ============================================================
    // TEST 2: Module registration rules
    // ============================================================

    #[tokio::test]
    async fn test_register_module_creates_mounted_module() {
        // ARRANGE
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;

        // ACT
        table.add_module(&addr, sales_config()).await.unwrap();

        // ASSERT: module mounted by default, cluster mounted via static_mount
        let modules = table.registered_modules().await;
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "sales");
        assert!(modules[0].mounted);

        let clusters = table.get_clusters("sales").await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].mounted);
        assert_eq!(clusters[0].owners, vec!["10.0.0.1:9000".to_string()]);
    }

    #[tokio::test]
    async fn test_cluster_without_static_mount_starts_unmounted() {
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;

        let config = ModuleConfig {
            clusters: vec![export("ingest", ClusterMode::Batch, false)],
            ..sales_config()
        };
        table.add_module(&addr, config).await.unwrap();

        let clusters = table.get_clusters("sales").await.unwrap();
        assert!(!clusters[0].mounted);
    }

    #[tokio::test]
    async fn test_register_module_for_unknown_processor_fails() {
        let table = ProcessorTable::new();
        let ghost = ProcessorAddr::new("10.0.0.9", 9000);

        let result = table.add_module(&ghost, sales_config()).await;

        assert!(matches!(result, Err(OrchestratorError::DoesNotExist { .. })));
    }

    #[tokio::test]
    async fn test_version_and_contact_must_match_exactly() {
        // ARRANGE: two processors, the first establishes version and contact
        let (table, p1) = table_with_processor("10.0.0.1", 9000).await;
        table.add_processor("10.0.0.2", 9000).await.unwrap();
        let p2 = ProcessorAddr::new("10.0.0.2", 9000);

        table.add_module(&p1, sales_config()).await.unwrap();

        // ACT + ASSERT: version clash
        let clashing_version = ModuleConfig {
            version: "2.0.0".to_string(),
            ..sales_config()
        };
        assert!(matches!(
            table.add_module(&p2, clashing_version).await,
            Err(OrchestratorError::ModuleVersionClash { .. })
        ));

        // ACT + ASSERT: contact clash
        let clashing_contact = ModuleConfig {
            contact: "other@example.com".to_string(),
            ..sales_config()
        };
        assert!(matches!(
            table.add_module(&p2, clashing_contact).await,
            Err(OrchestratorError::ModuleContactClash { .. })
        ));

        // An exact match is accepted
        table.add_module(&p2, sales_config()).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_processor_cannot_register_module_twice() {
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();

        let result = table.add_module(&addr, sales_config()).await;

        assert!(matches!(
            result,
            Err(OrchestratorError::ModuleAlreadyRegistered(_))
        ));
    }

    // ============================================================
    // TEST 3: Round-robin selection invariant
    // ============================================================

    #[tokio::test]
    async fn test_round_robin_visits_owners_in_registration_order() {
        // ARRANGE: three owners of the same cluster
        let (table, p1) = table_with_processor("10.0.0.1", 9000).await;
        table.add_processor("10.0.0.2", 9000).await.unwrap();
        table.add_processor("10.0.0.3", 9000).await.unwrap();
        let p2 = ProcessorAddr::new("10.0.0.2", 9000);
        let p3 = ProcessorAddr::new("10.0.0.3", 9000);

        table.add_module(&p1, sales_config()).await.unwrap();
        table.add_module(&p2, sales_config()).await.unwrap();
        table.add_module(&p3, sales_config()).await.unwrap();

        // ACT: six consecutive selections
        let mut picks = Vec::new();
        for _ in 0..6 {
            picks.push(table.select_processor("sales", "ingest").await.unwrap());
        }

        // ASSERT: each owner exactly once per cycle, in registration order,
        // and the sequence repeats identically
        assert_eq!(
            picks,
            vec![
                p1.clone(),
                p2.clone(),
                p3.clone(),
                p1.clone(),
                p2.clone(),
                p3.clone()
            ]
        );
    }

    #[tokio::test]
    async fn test_round_robin_wraps_after_owner_removal() {
        // ARRANGE: two owners, cursor advanced past the first
        let (table, p1) = table_with_processor("10.0.0.1", 9000).await;
        table.add_processor("10.0.0.2", 9000).await.unwrap();
        let p2 = ProcessorAddr::new("10.0.0.2", 9000);
        table.add_module(&p1, sales_config()).await.unwrap();
        table.add_module(&p2, sales_config()).await.unwrap();

        assert_eq!(table.select_processor("sales", "ingest").await.unwrap(), p1);

        // ACT: the remaining selection target disappears
        table.remove_processor("10.0.0.2", 9000).await.unwrap();

        // ASSERT: the cursor wraps to the only owner left
        assert_eq!(table.select_processor("sales", "ingest").await.unwrap(), p1);
        assert_eq!(table.select_processor("sales", "ingest").await.unwrap(), p1);
    }

    #[tokio::test]
    async fn test_select_on_unknown_cluster_fails() {
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();

        assert!(matches!(
            table.select_processor("sales", "export").await,
            Err(OrchestratorError::ClusterDoesNotExist { .. })
        ));
        assert!(matches!(
            table.select_processor("billing", "ingest").await,
            Err(OrchestratorError::ModuleDoesNotExist(_))
        ));
    }

    // ============================================================
    // TEST 4: Cascading deletion
    // ============================================================

    #[tokio::test]
    async fn test_removing_sole_owner_deletes_cluster_and_module() {
        // ARRANGE: one processor owning the module's only cluster
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();
        assert_eq!(table.module_count().await, 1);

        // ACT
        table.remove_processor("10.0.0.1", 9000).await.unwrap();

        // ASSERT: the whole chain is gone
        assert_eq!(table.processor_count().await, 0);
        assert_eq!(table.module_count().await, 0);
    }

    #[tokio::test]
    async fn test_removing_non_sole_owner_only_shrinks_owner_list() {
        // ARRANGE: two owners
        let (table, p1) = table_with_processor("10.0.0.1", 9000).await;
        table.add_processor("10.0.0.2", 9000).await.unwrap();
        let p2 = ProcessorAddr::new("10.0.0.2", 9000);
        table.add_module(&p1, sales_config()).await.unwrap();
        table.add_module(&p2, sales_config()).await.unwrap();

        // ACT
        table.remove_processor("10.0.0.1", 9000).await.unwrap();

        // ASSERT: cluster and module survive with the remaining owner
        assert_eq!(table.module_count().await, 1);
        let clusters = table.get_clusters("sales").await.unwrap();
        assert_eq!(clusters[0].owners, vec!["10.0.0.2:9000".to_string()]);
    }

    #[tokio::test]
    async fn test_deregister_module_cascades_and_updates_processor() {
        // ARRANGE: one processor advertising two modules
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();
        let billing = ModuleConfig {
            name: "billing".to_string(),
            ..sales_config()
        };
        table.add_module(&addr, billing).await.unwrap();

        // ACT
        table.remove_module(&addr, "sales").await.unwrap();

        // ASSERT: sales is gone, billing stays, advertisement list shrank
        assert_eq!(table.module_count().await, 1);
        let processors = table.processors().await;
        assert_eq!(processors[0].modules, vec!["billing".to_string()]);

        assert!(matches!(
            table.remove_module(&addr, "sales").await,
            Err(OrchestratorError::ModuleDoesNotExist(_))
        ));
    }

    // ============================================================
    // TEST 5: Mount gating
    // ============================================================

    #[tokio::test]
    async fn test_mount_flips_are_guarded() {
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();

        assert!(matches!(
            table.mount_module("billing").await,
            Err(OrchestratorError::ModuleDoesNotExist(_))
        ));
        assert!(matches!(
            table.unmount_cluster("sales", "export").await,
            Err(OrchestratorError::ClusterDoesNotExist { .. })
        ));

        table.unmount_module("sales").await.unwrap();
        assert!(!table.registered_modules().await[0].mounted);
        table.mount_module("sales").await.unwrap();
        assert!(table.registered_modules().await[0].mounted);
    }

    #[tokio::test]
    async fn test_ensure_provisionable_checks_mounts_and_mode() {
        // ARRANGE: a batch cluster and a stream cluster
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        let config = ModuleConfig {
            clusters: vec![
                export("ingest", ClusterMode::Batch, true),
                export("firehose", ClusterMode::Stream, true),
            ],
            ..sales_config()
        };
        table.add_module(&addr, config).await.unwrap();

        // Mounted batch cluster is provisionable
        table.ensure_provisionable("sales", "ingest").await.unwrap();

        // Unmounted cluster is not
        table.unmount_cluster("sales", "ingest").await.unwrap();
        assert!(matches!(
            table.ensure_provisionable("sales", "ingest").await,
            Err(OrchestratorError::ClusterNotMounted { .. })
        ));
        table.mount_cluster("sales", "ingest").await.unwrap();

        // Unmounted module trumps the cluster flag
        table.unmount_module("sales").await.unwrap();
        assert!(matches!(
            table.ensure_provisionable("sales", "ingest").await,
            Err(OrchestratorError::ModuleNotMounted(_))
        ));
        table.mount_module("sales").await.unwrap();

        // Stream mode is never provisionable through this path
        assert!(matches!(
            table.ensure_provisionable("sales", "firehose").await,
            Err(OrchestratorError::CanNotProvisionStreamCluster { .. })
        ));
    }

    // ============================================================
    // TEST 6: Reads hand out copies, not live references
    // ============================================================

    #[tokio::test]
    async fn test_snapshots_do_not_follow_later_mutations() {
        let (table, addr) = table_with_processor("10.0.0.1", 9000).await;
        table.add_module(&addr, sales_config()).await.unwrap();

        let snapshot = table.registered_modules().await;
        table.unmount_module("sales").await.unwrap();

        assert!(snapshot[0].mounted);
        assert!(!table.registered_modules().await[0].mounted);
    }
}
