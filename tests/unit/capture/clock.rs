use super::*;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[tokio::test]
async fn stepped_clock_advances_by_step() {
    let mut clock = SteppedClock::at_fps(t0(), 4).unwrap();
    assert_eq!(clock.tick().await, t0());
    assert_eq!(clock.tick().await, t0() + TimeDelta::milliseconds(250));
    assert_eq!(clock.tick().await, t0() + TimeDelta::milliseconds(500));
}

#[tokio::test(start_paused = true)]
async fn limited_clock_stops_ticking() {
    let mut clock = SteppedClock::new(t0(), TimeDelta::seconds(1)).limit(1);
    clock.tick().await;
    let next = tokio::time::timeout(Duration::from_secs(5), clock.tick()).await;
    assert!(next.is_err());
}

#[tokio::test(start_paused = true)]
async fn interval_clock_period_matches_fps() {
    let mut clock = IntervalClock::new(30).unwrap();
    assert_eq!(clock.period(), Duration::from_secs(1) / 30);
    let started = tokio::time::Instant::now();
    clock.tick().await;
    clock.tick().await;
    assert!(started.elapsed() >= clock.period());
}

#[test]
fn zero_fps_is_rejected() {
    assert!(IntervalClock::new(0).is_err());
    assert!(SteppedClock::at_fps(t0(), 0).is_err());
}
