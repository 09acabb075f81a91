//! End-to-end dispatch cycles against the in-memory store.

mod common;

use std::sync::Arc;

use chrono::Duration;

use common::*;
use shortcast_models::{
    AggregationPolicy, Channel, DayKey, JobPatch, JobStatus, Platform, PlatformStatus,
    VideoMetadata,
};
use shortcast_platforms::{UploadError, UploaderRegistry};
use shortcast_store::{KvStore, MemoryKvStore};
use shortcast_worker::CycleReport;

#[tokio::test]
async fn test_cap_admits_only_the_last_slot() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let h = Harness::new(config(20, 5), Arc::new(FixedMetadata), registry(&[youtube.clone()]));
    let day = DayKey::from_timestamp(now());
    for _ in 0..19 {
        h.counter.increment(Channel::TechBuni, Platform::Youtube, &day).await.unwrap();
    }

    let j = h.queue(Channel::TechBuni, &[Platform::Youtube], now()).await;
    let k = h.queue(Channel::TechBuni, &[Platform::Youtube], now()).await;

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.skipped_capped, 1);

    assert_eq!(
        h.counter.get_count(Channel::TechBuni, Platform::Youtube, &day).await.unwrap(),
        20
    );

    let mut statuses = vec![
        h.jobs.get(&j).await.unwrap().status,
        h.jobs.get(&k).await.unwrap().status,
    ];
    statuses.sort_by_key(|s| s.as_str());
    assert_eq!(statuses, vec![JobStatus::Pending, JobStatus::Uploaded]);
    assert_eq!(youtube.calls(), 1);
}

#[tokio::test]
async fn test_metadata_failure_uses_fallback_and_still_delivers() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let h = Harness::new(config(20, 5), Arc::new(FailingMetadata), registry(&[youtube.clone()]));
    let id = h.queue(Channel::CookingBuni, &[Platform::Youtube], now()).await;

    h.engine.run_cycle_at(now()).await.unwrap();

    let job = h.jobs.get(&id).await.unwrap();
    let fallback = VideoMetadata::fallback(&job.prompt);
    assert_eq!(job.status, JobStatus::Uploaded);
    assert_eq!(job.title.as_deref(), Some(fallback.title.as_str()));
    assert_eq!(job.description.as_deref(), Some(fallback.description.as_str()));
    assert_eq!(job.tags, Some(fallback.tags));
    assert_eq!(youtube.calls(), 1);
}

#[tokio::test]
async fn test_one_platform_failing_does_not_stop_the_other() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let tiktok = ScriptedUploader::failing(Platform::Tiktok, UploadError::rejected("video too short"));
    let h = Harness::new(
        config(20, 5),
        Arc::new(FixedMetadata),
        registry(&[youtube.clone(), tiktok.clone()]),
    );
    let id = h.queue(Channel::TravelBuni, &[Platform::Youtube, Platform::Tiktok], now()).await;

    h.engine.run_cycle_at(now()).await.unwrap();

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Uploaded);
    assert_eq!(job.platform_status(Platform::Youtube), PlatformStatus::Uploaded);
    assert_eq!(job.platform_status(Platform::Tiktok), PlatformStatus::Failed);
    assert_eq!(
        job.platform_errors.get(&Platform::Tiktok).map(String::as_str),
        Some("rejected: video too short")
    );
    assert_eq!(job.title.as_deref(), Some("Generated title"));
    assert_eq!(youtube.calls(), 1);
    assert_eq!(tiktok.calls(), 1);
}

#[tokio::test]
async fn test_all_of_policy_fails_on_partial_delivery() {
    let mut cfg = config(20, 5);
    cfg.aggregation_policy = AggregationPolicy::AllOf;
    let h = Harness::new(
        cfg,
        Arc::new(FixedMetadata),
        registry(&[
            ScriptedUploader::ok(Platform::Youtube),
            ScriptedUploader::failing(Platform::Tiktok, UploadError::transport("connection reset")),
        ]),
    );
    let id = h.queue(Channel::TravelBuni, &[Platform::Youtube, Platform::Tiktok], now()).await;

    h.engine.run_cycle_at(now()).await.unwrap();

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.platform_status(Platform::Youtube), PlatformStatus::Uploaded);
}

#[tokio::test]
async fn test_every_platform_failing_fails_the_job() {
    let h = Harness::new(config(20, 5), Arc::new(FixedMetadata), registry(&[]));
    let id = h.queue(Channel::LifeBuni, &[Platform::Instagram, Platform::Facebook], now()).await;

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report.failed, 1);

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    for platform in [Platform::Instagram, Platform::Facebook] {
        assert!(job.platform_errors[&platform].starts_with("unsupported_platform"));
    }
}

#[tokio::test]
async fn test_future_job_is_not_admitted() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let h = Harness::new(config(20, 5), Arc::new(FixedMetadata), registry(&[youtube.clone()]));
    let id = h.queue(Channel::GamingBuni, &[Platform::Youtube], now() + Duration::hours(1)).await;

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report, CycleReport::default());

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.attempts, 0);
    assert_eq!(youtube.calls(), 0);
}

#[tokio::test]
async fn test_platform_status_keys_match_targets() {
    let h = Harness::new(config(20, 10), Arc::new(FixedMetadata), UploaderRegistry::dry_run());
    let targets: Vec<Vec<Platform>> = vec![
        vec![Platform::Youtube],
        vec![Platform::Tiktok, Platform::Instagram],
        Platform::ALL.to_vec(),
    ];
    for platforms in &targets {
        h.queue(Channel::TechBuni, platforms, now()).await;
    }

    h.engine.run_cycle_at(now()).await.unwrap();

    for job in h.jobs.list().await.unwrap() {
        assert_eq!(job.status, JobStatus::Uploaded);
        let keys: Vec<Platform> = job.platform_status.keys().copied().collect();
        let targets: Vec<Platform> = job.platforms.iter().copied().collect();
        assert_eq!(keys, targets);
    }
}

#[tokio::test]
async fn test_cap_holds_across_cycles() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let h = Harness::new(config(3, 2), Arc::new(FixedMetadata), registry(&[youtube.clone()]));
    for _ in 0..5 {
        h.queue(Channel::LifeBuni, &[Platform::Youtube], now()).await;
    }

    for _ in 0..4 {
        h.engine.run_cycle_at(now()).await.unwrap();
    }

    let day = DayKey::from_timestamp(now());
    assert_eq!(h.counter.get_count(Channel::LifeBuni, Platform::Youtube, &day).await.unwrap(), 3);
    assert_eq!(youtube.calls(), 3);

    let stats = h.stats.compute_for(&day).await.unwrap();
    assert_eq!(stats[&Channel::LifeBuni].uploaded, 3);
    assert_eq!(stats[&Channel::LifeBuni].pending, 2);
}

#[tokio::test]
async fn test_capped_platform_in_multi_platform_job_is_recorded() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let tiktok = ScriptedUploader::ok(Platform::Tiktok);
    let h = Harness::new(
        config(1, 5),
        Arc::new(FixedMetadata),
        registry(&[youtube.clone(), tiktok.clone()]),
    );
    let day = DayKey::from_timestamp(now());
    h.counter.increment(Channel::CookingBuni, Platform::Tiktok, &day).await.unwrap();
    let id = h.queue(Channel::CookingBuni, &[Platform::Youtube, Platform::Tiktok], now()).await;

    h.engine.run_cycle_at(now()).await.unwrap();

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Uploaded);
    assert_eq!(job.platform_status(Platform::Tiktok), PlatformStatus::Failed);
    assert!(job.platform_errors[&Platform::Tiktok].starts_with("quota_exceeded"));
    assert_eq!(tiktok.calls(), 0);
    assert_eq!(h.counter.get_count(Channel::CookingBuni, Platform::Tiktok, &day).await.unwrap(), 1);
}

#[tokio::test]
async fn test_stale_job_resumes_only_unfinished_platforms() {
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let tiktok = ScriptedUploader::ok(Platform::Tiktok);
    let h = Harness::new(
        config(20, 5),
        Arc::new(FailingMetadata),
        registry(&[youtube.clone(), tiktok.clone()]),
    );
    let claimed_at = now() - Duration::hours(2);
    let id = h.queue(Channel::TravelBuni, &[Platform::Youtube, Platform::Tiktok], claimed_at).await;

    // A previous cycle claimed the job, stored metadata, delivered youtube, then died.
    let job = h.jobs.get(&id).await.unwrap();
    h.jobs.claim(&job, claimed_at).await.unwrap().unwrap();
    let stored = VideoMetadata::new("Stored title", "Stored description", vec!["stored".into()]);
    h.jobs
        .update_status(
            &id,
            JobStatus::Processing,
            JobPatch::new()
                .with_metadata(&stored)
                .with_platform(Platform::Youtube, PlatformStatus::Uploaded, None),
        )
        .await
        .unwrap();

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report.recovered, 1);
    assert_eq!(report.uploaded, 1);

    let job = h.jobs.get(&id).await.unwrap();
    assert_eq!(job.status, JobStatus::Uploaded);
    assert_eq!(job.title.as_deref(), Some("Stored title"));
    assert_eq!(job.platform_status(Platform::Tiktok), PlatformStatus::Uploaded);
    assert_eq!(job.attempts, 2);
    assert_eq!(youtube.calls(), 0);
    assert_eq!(tiktok.calls(), 1);
}

#[tokio::test]
async fn test_storage_failure_aborts_cycle() {
    let kv = Arc::new(FlakyKv::default());
    let h = Harness::with_kv(
        kv.clone(),
        config(20, 5),
        Arc::new(FixedMetadata),
        registry(&[ScriptedUploader::ok(Platform::Youtube)]),
    );
    h.queue(Channel::TechBuni, &[Platform::Youtube], now()).await;
    kv.fail_writes();

    let err = h.engine.run_cycle_at(now()).await.unwrap_err();
    assert!(err.is_storage());
}

#[tokio::test]
async fn test_reservation_failure_keeps_already_claimed_jobs_moving() {
    let kv = Arc::new(FlakyKv::default());
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let h = Harness::with_kv(
        kv.clone(),
        config(20, 5),
        Arc::new(FixedMetadata),
        registry(&[youtube.clone()]),
    );
    for _ in 0..3 {
        h.queue(Channel::GamingBuni, &[Platform::Youtube], now()).await;
    }
    kv.fail_increments_after(1);

    let err = h.engine.run_cycle_at(now()).await.unwrap_err();
    assert!(err.is_storage());

    let jobs = h.jobs.list().await.unwrap();
    let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
    assert_eq!(count(JobStatus::Processing), 0);
    assert_eq!(count(JobStatus::Uploaded), 1);
    assert_eq!(count(JobStatus::Pending), 2);
    assert_eq!(youtube.calls(), 1);

    let day = DayKey::from_timestamp(now());
    assert_eq!(
        h.counter.get_count(Channel::GamingBuni, Platform::Youtube, &day).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_job_finished_elsewhere_fails_alone() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let uploaders = registry(&[youtube.clone()]).with_uploader(InterferingUploader::new(
        Platform::Tiktok,
        Interference::Finish,
        kv.clone(),
    ));
    let h = Harness::with_kv(kv, config(20, 5), Arc::new(FixedMetadata), uploaders);
    let finished = h.queue(Channel::TechBuni, &[Platform::Tiktok], now()).await;
    let healthy = h.queue(Channel::TechBuni, &[Platform::Youtube], now()).await;

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.uploaded, 1);

    assert_eq!(h.jobs.get(&finished).await.unwrap().status, JobStatus::Failed);
    assert_eq!(h.jobs.get(&healthy).await.unwrap().status, JobStatus::Uploaded);
}

#[tokio::test]
async fn test_job_deleted_mid_dispatch_fails_alone() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let youtube = ScriptedUploader::ok(Platform::Youtube);
    let uploaders = registry(&[youtube.clone()]).with_uploader(InterferingUploader::new(
        Platform::Instagram,
        Interference::Delete,
        kv.clone(),
    ));
    let h = Harness::with_kv(kv, config(20, 5), Arc::new(FixedMetadata), uploaders);
    let vanished = h.queue(Channel::LifeBuni, &[Platform::Instagram], now()).await;
    let healthy = h.queue(Channel::LifeBuni, &[Platform::Youtube], now()).await;

    let report = h.engine.run_cycle_at(now()).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.uploaded, 1);

    assert!(h.jobs.get(&vanished).await.unwrap_err().is_not_found());
    assert_eq!(h.jobs.get(&healthy).await.unwrap().status, JobStatus::Uploaded);
}

#[tokio::test]
async fn test_stats_classify_by_status() {
    let h = Harness::new(
        config(20, 5),
        Arc::new(FixedMetadata),
        registry(&[
            ScriptedUploader::ok(Platform::Youtube),
            ScriptedUploader::failing(Platform::Facebook, UploadError::rejected("policy")),
        ]),
    );
    h.queue(Channel::TechBuni, &[Platform::Youtube], now()).await;
    h.queue(Channel::TechBuni, &[Platform::Facebook], now()).await;
    h.queue(Channel::TechBuni, &[Platform::Youtube], now() + Duration::days(1)).await;

    h.engine.run_cycle_at(now()).await.unwrap();

    let stats = h.stats.compute_for(&DayKey::from_timestamp(now())).await.unwrap();
    let tech = &stats[&Channel::TechBuni];
    assert_eq!((tech.pending, tech.uploaded, tech.failed), (1, 1, 1));
    assert_eq!(tech.total(), 3);
}
