use std::time::Duration;
use tokio::time::Instant;

use crate::config::DeviceConfig;

/// Retry schedule for one serial source.
///
/// The cooldown starts at `base_cooldown`, is multiplied by `growth` after each
/// failed attempt, never exceeds `max_cooldown`, and snaps back on success.
#[derive(Clone, Debug)]
pub struct ReconnectState {
    pub name: String,
    pub attempts: u32,
    pub base_cooldown: Duration,
    pub current_cooldown: Duration,
    pub max_cooldown: Duration,
    pub growth: f64,
    next_retry_time: Instant,
}

impl ReconnectState {
    pub fn new(name: &str, base_cooldown: Duration, growth: f64, max_cooldown: Duration) -> Self {
        ReconnectState {
            name: name.to_string(),
            attempts: 0,
            base_cooldown,
            current_cooldown: base_cooldown,
            max_cooldown: max_cooldown.max(base_cooldown),
            growth: growth.max(1.0),
            next_retry_time: Instant::now(),
        }
    }

    pub fn from_config(name: &str, config: &DeviceConfig) -> Self {
        Self::new(
            name,
            config.reconnect_backoff(),
            config.backoff_growth,
            config.max_backoff(),
        )
    }

    /// Record a failed open or a fault and schedule the next attempt.
    pub fn record_failure(&mut self) -> Duration {
        let wait = if self.attempts == 0 {
            self.base_cooldown
        } else {
            Duration::from_secs_f64(
                (self.current_cooldown.as_secs_f64() * self.growth)
                    .min(self.max_cooldown.as_secs_f64()),
            )
        };
        self.attempts += 1;
        self.current_cooldown = wait;
        self.next_retry_time = Instant::now() + wait;

        log::debug!(
            "[{}] attempt {} failed, next retry in {:.1}s",
            self.name,
            self.attempts,
            wait.as_secs_f64()
        );
        wait
    }

    pub fn record_success(&mut self) {
        if self.attempts > 0 {
            log::info!(
                "[{}] reconnected after {} failed attempt(s)",
                self.name,
                self.attempts
            );
        }
        self.attempts = 0;
        self.current_cooldown = self.base_cooldown;
        self.next_retry_time = Instant::now();
    }

    /// Sleep until the scheduled retry time.
    pub async fn wait(&self) {
        tokio::time::sleep_until(self.next_retry_time).await;
    }
}
