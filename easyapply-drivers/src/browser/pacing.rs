use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Fixed and randomised pauses between UI-mutating actions.
///
/// [`Pacing::instant`] turns every pause into a no-op for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after a field write or a click.
    pub settle: Duration,
    /// Pause after a step transition or submission.
    pub long_settle: Duration,
    /// Pause between keystroke chunks.
    pub chunk_pause: Duration,
    /// Inclusive bounds of the per-character keystroke delay, in ms.
    pub keystroke_ms: (u64, u64),
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            long_settle: Duration::from_millis(2000),
            chunk_pause: Duration::from_millis(300),
            keystroke_ms: (10, 30),
        }
    }
}

impl Pacing {
    pub fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            long_settle: Duration::ZERO,
            chunk_pause: Duration::ZERO,
            keystroke_ms: (0, 0),
        }
    }

    pub fn is_instant(&self) -> bool {
        *self == Self::instant()
    }

    pub async fn settle(&self) {
        pause(self.settle).await;
    }

    pub async fn long_settle(&self) {
        pause(self.long_settle).await;
    }

    pub async fn chunk_pause(&self) {
        pause(self.chunk_pause).await;
    }

    pub async fn keystroke(&self) {
        let (min, max) = self.keystroke_ms;
        random_delay(min, max).await;
    }
}

/// Sleep for a random duration between `min` and `max` milliseconds.
pub async fn random_delay(min: u64, max: u64) {
    if max == 0 {
        return;
    }
    let mut rng = OsRng;
    let ms = rng.gen_range(min.min(max)..=max);
    sleep(Duration::from_millis(ms)).await;
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn random_delay_waits_at_least_min() {
        let start = std::time::Instant::now();
        random_delay(10, 30).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn instant_pacing_does_not_sleep() {
        let pacing = Pacing::instant();
        assert!(pacing.is_instant());
        let start = std::time::Instant::now();
        pacing.settle().await;
        pacing.long_settle().await;
        pacing.keystroke().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
