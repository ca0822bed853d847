//! Advisory engine behaviour against the offline canned backend.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::time::Duration;

use agrisim_advisor::{
    Advisor, AdvisorConfig, AdvisoryDispatcher, AdvisorySubject, AdvisorError, CannedBackend,
    CannedReply, Delivery, LlmBackend, Submission,
};
use agrisim_types::{ConditionBand, CropId, CropKind, EnvironmentState, ReportSource, WaterNeed};

const REPLY: &str = "1. Condition assessment: steady growth, slight water stress.
2. Urgent: irrigate within the next few hours.
3. Recommend a thin mulch layer.
4. Disease pressure is low; keep scouting for pests.
5. Yield estimate: 3 kg per plant.
6. Timeline: re-check in 2 days.";

fn subject(health: f64, water: f64, nutrients: f64, disease: f64) -> AdvisorySubject {
    AdvisorySubject {
        crop: CropId::new(),
        kind: CropKind::Wheat,
        growth: 45.0,
        health,
        water_level: water,
        soil_moisture: 55.0,
        nutrient_level: nutrients,
        disease_level: disease,
        environmental_stress: 0.2,
        days_planted: 12,
        days_to_maturity: 48,
        growth_days: 60,
        water_need: WaterNeed::Medium,
        yield_descriptor: "2-3 kg per plant",
    }
}

fn config() -> AdvisorConfig {
    AdvisorConfig {
        request_timeout_ms: 10_000,
        ..AdvisorConfig::default()
    }
}

/// A backend that answers the startup probe, then replies with `reply`.
fn backend(reply: CannedReply) -> Option<LlmBackend> {
    Some(LlmBackend::Canned(CannedBackend::scripted(
        vec![CannedReply::text("OK")],
        reply,
    )))
}

#[tokio::test(start_paused = true)]
async fn concurrent_analyses_share_one_request() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text(REPLY).delayed(Duration::from_secs(1))),
    )
    .unwrap();
    let s = subject(70.0, 60.0, 60.0, 10.0);

    let (a, b) = tokio::join!(advisor.analyze(s.clone()), advisor.analyze(s.clone()));

    assert_eq!(a, b);
    assert_eq!(a.source, ReportSource::Service);
    assert_eq!(a.urgent_action, "Urgent: irrigate within the next few hours.");
    assert_eq!(advisor.status().request_count, 1);
    assert!(!advisor.is_in_flight(s.crop));
}

#[tokio::test(start_paused = true)]
async fn unchanged_fingerprint_hits_the_cache() {
    let advisor = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    let mut s = subject(70.0, 60.0, 60.0, 10.0);

    let first = advisor.analyze(s.clone()).await;
    // Same deciles, different exact values.
    s.health = 73.0;
    s.water_level = 64.0;
    let second = advisor.analyze(s.clone()).await;

    assert_eq!(first.generated_at, second.generated_at);
    assert_eq!(first, second);
    assert_eq!(advisor.status().request_count, 1);

    // Crossing a decile is a fresh miss.
    s.health = 81.0;
    let third = advisor.analyze(s).await;
    assert_eq!(advisor.status().request_count, 2);
    assert_eq!(third.source, ReportSource::Service);
}

#[tokio::test(start_paused = true)]
async fn clear_cache_forces_a_miss() {
    let advisor = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    let s = subject(70.0, 60.0, 60.0, 10.0);

    let _ = advisor.analyze(s.clone()).await;
    assert_eq!(advisor.cache_len(), 1);
    advisor.clear_cache();
    assert_eq!(advisor.cache_len(), 0);
    let _ = advisor.analyze(s).await;
    assert_eq!(advisor.status().request_count, 2);
}

#[tokio::test(start_paused = true)]
async fn slow_reply_times_out_into_fallback() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text(REPLY).delayed(Duration::from_secs(30))),
    )
    .unwrap();
    let s = subject(70.0, 60.0, 60.0, 10.0);

    let started = tokio::time::Instant::now();
    let report = advisor.analyze(s).await;

    assert!(started.elapsed() <= Duration::from_secs(11));
    assert_eq!(report.source, ReportSource::Fallback);
    assert_eq!(report.confidence, 85);
    let status = advisor.status();
    assert!(!status.connected);
    assert_eq!(status.request_count, 1);
    assert_eq!(status.failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn incoherent_reply_falls_back_but_stays_connected() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text("lorem ipsum\ndolor sit amet")),
    )
    .unwrap();

    let report = advisor.analyze(subject(70.0, 60.0, 60.0, 10.0)).await;

    assert_eq!(report.source, ReportSource::Fallback);
    let status = advisor.status();
    assert!(status.connected);
    assert_eq!(status.failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_service_is_not_hammered() {
    let advisor = Advisor::with_backend(
        &config(),
        Some(LlmBackend::Canned(CannedBackend::failing(AdvisorError::Transport(
            "connection refused".to_owned(),
        )))),
    )
    .unwrap();

    for disease in [5.0, 15.0, 25.0, 35.0] {
        let report = advisor.analyze(subject(70.0, 60.0, 60.0, disease)).await;
        assert_eq!(report.source, ReportSource::Fallback);
    }

    // Only the first miss probed; none of them got as far as a request.
    let status = advisor.status();
    assert!(!status.connected);
    assert_eq!(status.request_count, 0);
}

#[tokio::test]
async fn disabled_service_is_deterministic() {
    let a = Advisor::with_backend(&config(), None).unwrap();
    let b = Advisor::with_backend(&config(), None).unwrap();
    let s = subject(20.0, 50.0, 50.0, 10.0);

    let first = a.analyze(s.clone()).await;
    let second = b.analyze(s).await;

    assert!(matches!(
        first.condition_band,
        ConditionBand::Critical | ConditionBand::Poor
    ));
    assert!(first.urgent_action.to_lowercase().contains("treatment"));
    assert_eq!(first.source, ReportSource::Fallback);
    assert_eq!(first.confidence, 85);
    assert_eq!(first.condition, second.condition);
    assert_eq!(first.urgent_action, second.urgent_action);
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.yield_prediction, second.yield_prediction);
    assert_eq!(first.timeline, second.timeline);

    let status = a.status();
    assert!(!status.has_credential);
    assert_eq!(status.request_count, 0);
}

#[test]
fn dispatcher_without_runtime_answers_synchronously() {
    let advisor = Advisor::with_backend(&config(), None).unwrap();
    let mut dispatcher = AdvisoryDispatcher::with_runtime(advisor, None);
    let s = subject(20.0, 50.0, 50.0, 10.0);

    let Submission::Ready(report) = dispatcher.submit(s.clone()) else {
        panic!("offline submissions are answered immediately");
    };
    assert_eq!(report.source, ReportSource::Fallback);

    // The heuristic report is cached too.
    assert_eq!(dispatcher.submit(s), Submission::Ready(report));
    assert_eq!(dispatcher.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn dispatcher_delivers_on_a_later_drain() {
    let advisor = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    let mut dispatcher = AdvisoryDispatcher::new(advisor);
    let s = subject(70.0, 60.0, 60.0, 10.0);

    assert_eq!(dispatcher.submit(s.clone()), Submission::Pending);
    // A second submission while pending does not start another request.
    assert_eq!(dispatcher.submit(s.clone()), Submission::Pending);
    // Nothing has run yet on the current-thread runtime.
    assert!(dispatcher.drain().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let deliveries = dispatcher.drain();
    assert_eq!(deliveries.len(), 1);
    assert!(matches!(
        &deliveries[0],
        Delivery::Report { crop, report } if *crop == s.crop && report.source == ReportSource::Service
    ));
    assert_eq!(dispatcher.advisor().status().request_count, 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_crop_result_is_discarded() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text(REPLY).delayed(Duration::from_secs(2))),
    )
    .unwrap();
    let mut dispatcher = AdvisoryDispatcher::new(advisor);
    let s = subject(70.0, 60.0, 60.0, 10.0);

    assert_eq!(dispatcher.submit(s.clone()), Submission::Pending);
    assert!(dispatcher.cancel(s.crop));

    tokio::time::sleep(Duration::from_secs(3)).await;
    let deliveries = dispatcher.drain();
    assert_eq!(deliveries, vec![Delivery::Discarded { crop: s.crop }]);
}

#[tokio::test(start_paused = true)]
async fn variation_hint_is_requested_once_per_species() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text(
            "```json\n{\"growth_rate_modifier\": 1.1, \"disease_resistance\": 0.6, \"leaf_count\": 1.2,}\n```",
        )),
    )
    .unwrap();
    assert!(advisor.probe().await);
    let dispatcher = AdvisoryDispatcher::new(advisor.clone());

    assert!(dispatcher.request_variation(CropKind::Corn, EnvironmentState::default()));
    assert!(!dispatcher.request_variation(CropKind::Corn, EnvironmentState::default()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let hint = advisor.variation_hint(CropKind::Corn).unwrap();
    assert!((hint.growth_rate_modifier - 1.1).abs() < 1e-9);
    assert!((hint.leaf_count - 1.2).abs() < 1e-9);
    assert_eq!(advisor.variation_hint(CropKind::Wheat), None);
    assert_eq!(advisor.status().request_count, 1);
}

#[tokio::test(start_paused = true)]
async fn canned_backend_reports_no_credential() {
    let advisor = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    assert!(advisor.probe().await);

    let status = advisor.status();
    assert!(status.connected);
    assert!(!status.has_credential);
}

#[tokio::test(start_paused = true)]
async fn yield_refresh_arrives_as_text() {
    let advisor = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    let mut dispatcher = AdvisoryDispatcher::new(advisor);
    let s = subject(85.0, 60.0, 60.0, 5.0);

    assert!(dispatcher.refresh_yield(s.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        dispatcher.drain(),
        vec![Delivery::Yield {
            crop: s.crop,
            text: "Yield estimate: 3 kg per plant.".to_owned(),
            source: ReportSource::Service,
        }]
    );
    assert_eq!(dispatcher.advisor().status().request_count, 1);
}

#[tokio::test(start_paused = true)]
async fn yield_refresh_shares_the_pending_analysis() {
    let advisor = Advisor::with_backend(
        &config(),
        backend(CannedReply::text(REPLY).delayed(Duration::from_secs(2))),
    )
    .unwrap();
    let mut dispatcher = AdvisoryDispatcher::new(advisor);
    let s = subject(85.0, 60.0, 60.0, 5.0);

    assert_eq!(dispatcher.submit(s.clone()), Submission::Pending);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(dispatcher.cancel(s.crop));
    assert!(dispatcher.refresh_yield(s.clone()));

    tokio::time::sleep(Duration::from_secs(3)).await;
    let deliveries = dispatcher.drain();
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries.contains(&Delivery::Discarded { crop: s.crop }));
    assert!(deliveries.iter().any(|d| matches!(
        d,
        Delivery::Yield { crop, source: ReportSource::Service, .. } if *crop == s.crop
    )));
    assert_eq!(dispatcher.advisor().status().request_count, 1);
}

#[test]
fn yield_refresh_needs_a_runtime_and_a_service() {
    let s = subject(85.0, 60.0, 60.0, 5.0);
    let offline = Advisor::with_backend(&config(), None).unwrap();
    assert!(!AdvisoryDispatcher::with_runtime(offline, None).refresh_yield(s.clone()));

    let connected = Advisor::with_backend(&config(), backend(CannedReply::text(REPLY))).unwrap();
    assert!(!AdvisoryDispatcher::with_runtime(connected, None).refresh_yield(s));
}
