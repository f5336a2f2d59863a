use rand::Rng;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::SystemStatsSnapshot;

/// Plausible gaming-rig readings for when nothing has been reported yet.
/// The result is never persisted.
pub fn sample() -> SystemStatsSnapshot {
    let mut rng = rand::thread_rng();
    SystemStatsSnapshot {
        id: Uuid::new_v4(),
        cpu_usage: round1(rng.gen_range(15.0..85.0)),
        ram_usage: round1(rng.gen_range(30.0..80.0)),
        gpu_usage: round1(rng.gen_range(20.0..95.0)),
        disk_usage: round1(rng.gen_range(5.0..60.0)),
        temperature: round1(rng.gen_range(45.0..80.0)),
        fps: rng.gen_range(45..=165) as f64,
        ping: rng.gen_range(10..=120) as f64,
        recorded_at: OffsetDateTime::now_utc(),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_range() {
        for _ in 0..100 {
            let s = sample();
            for gauge in [s.cpu_usage, s.ram_usage, s.gpu_usage, s.disk_usage] {
                assert!((0.0..=100.0).contains(&gauge));
            }
            assert!(s.fps >= 0.0 && s.ping >= 0.0);
        }
    }
}
