use std::time::Duration;

use sentri_protocol::CrowdUpdate;
use sentri_telemetry::{ChannelSource, SimulatedSource, TelemetrySource};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_simulated_source_ticks_on_fixed_period() {
    let mut source = SimulatedSource::new(Duration::from_secs(3), Some(42));
    let start = Instant::now();

    // First tick is immediate and yields one update per zone.
    for _ in 0..4 {
        let update = source.next_update().await.unwrap();
        assert!((20.0..=100.0).contains(&update.density));
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    source.next_update().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_simulated_tick_is_clamped() {
    assert_eq!(SimulatedSource::new(Duration::from_millis(100), Some(1)).period(), Duration::from_secs(2));
    assert_eq!(SimulatedSource::new(Duration::from_secs(60), Some(1)).period(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_seeded_sources_agree() {
    let mut a = SimulatedSource::new(Duration::from_secs(2), Some(7));
    let mut b = SimulatedSource::new(Duration::from_secs(2), Some(7));
    for _ in 0..12 {
        let (ua, ub) = (a.next_update().await.unwrap(), b.next_update().await.unwrap());
        assert_eq!(ua.zone, ub.zone);
        assert_eq!(ua.density, ub.density);
        assert_eq!(ua.people_count, ub.people_count);
    }
}

#[tokio::test]
async fn test_channel_source_normalizes_and_ends() {
    let (tx, mut source) = ChannelSource::channel();
    tx.send(CrowdUpdate {
        zone: "Exit Gate B".into(),
        density: 180.0,
        ..Default::default()
    })
    .unwrap();
    drop(tx);

    let update = source.next_update().await.unwrap();
    assert_eq!(update.density, 100.0);
    assert!(source.next_update().await.is_none());
    assert_eq!(source.name(), "live");
}
