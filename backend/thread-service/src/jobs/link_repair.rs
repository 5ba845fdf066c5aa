//! Link Repair Background Job
//!
//! New content is linked to its author and parent in the same transaction
//! as the insert. Records written by older clients may still be missing
//! from their author's authored list or their parent's `children`; this job
//! appends those references so populated views stay complete.

use crate::config::LinkRepairConfig;
use crate::db::ContentStore;
use crate::error::Result;
use crate::metrics::link_repair as metrics;
use crate::models::ContentKind;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// References restored by one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    pub author_links: u64,
    pub parent_links: u64,
}

impl RepairReport {
    pub fn total(&self) -> u64 {
        self.author_links + self.parent_links
    }
}

pub async fn start_link_repair(store: Arc<dyn ContentStore>, config: LinkRepairConfig) {
    if !config.enabled() {
        tracing::info!("Link repair job disabled (LINK_REPAIR_INTERVAL_SECS=0)");
        return;
    }

    let interval = Duration::from_secs(config.interval_secs);
    tracing::info!(
        "Starting link repair background job (interval={}s, batch_size={})",
        config.interval_secs,
        config.batch_size
    );

    loop {
        sleep(interval).await;

        let cycle_start = Instant::now();
        match run_once(store.as_ref(), config.batch_size).await {
            Ok(report) => {
                metrics::record_repair_run("success");
                metrics::record_repair_duration(cycle_start.elapsed());
                if report.total() > 0 {
                    tracing::info!(
                        author_links = report.author_links,
                        parent_links = report.parent_links,
                        duration_ms = cycle_start.elapsed().as_millis(),
                        "Link repair sweep restored references"
                    );
                } else {
                    tracing::debug!("Link repair sweep found nothing to restore");
                }
            }
            Err(e) => {
                metrics::record_repair_run("error");
                metrics::record_repair_duration(cycle_start.elapsed());
                tracing::error!(error = %e, duration_ms = cycle_start.elapsed().as_millis(), "Link repair sweep failed");
            }
        }
    }
}

/// Run one sweep over both collections.
pub async fn run_once(store: &dyn ContentStore, batch_size: i64) -> Result<RepairReport> {
    let mut report = RepairReport::default();

    for kind in ContentKind::ALL {
        let authors = store.repair_author_links(kind, batch_size).await?;
        if authors > 0 {
            metrics::record_links_repaired(kind.label(), "author", authors);
        }

        let parents = store.repair_parent_links(kind, batch_size).await?;
        if parents > 0 {
            metrics::record_links_repaired(kind.label(), "parent", parents);
        }

        report.author_links += authors;
        report.parent_links += parents;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryContentStore;
    use crate::models::{Content, UserProfile};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_run_once_on_clean_store() {
        let store = MemoryContentStore::new();
        let report = run_once(&store, 10).await.unwrap();
        assert_eq!(report, RepairReport::default());
    }

    #[tokio::test]
    async fn test_run_once_covers_both_kinds() {
        let store = MemoryContentStore::new();
        let user = store
            .upsert_user(&UserProfile {
                external_id: "legacy".to_string(),
                username: "legacy".to_string(),
                name: "Legacy".to_string(),
                image: None,
                bio: None,
            })
            .await
            .unwrap();

        for kind in ContentKind::ALL {
            store
                .import_content(
                    kind,
                    Content {
                        id: Uuid::new_v4(),
                        text: "old".to_string(),
                        author: user.id,
                        parent_id: None,
                        children: Vec::new(),
                        community: None,
                        created_at: chrono::Utc::now(),
                    },
                )
                .await;
        }

        let report = run_once(&store, 10).await.unwrap();
        assert_eq!(report.author_links, 2);
        assert_eq!(report.parent_links, 0);

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.threads.len(), 1);
        assert_eq!(user.posts.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_job_returns_immediately() {
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        start_link_repair(
            store,
            LinkRepairConfig {
                interval_secs: 0,
                batch_size: 10,
            },
        )
        .await;
    }
}
