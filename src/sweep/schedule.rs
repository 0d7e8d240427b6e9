use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::SessionSweep;

const MIN_PERIOD: Duration = Duration::from_secs(1);

impl SessionSweep {
    /// Runs the sweep every `period`, first firing one period after start.
    /// Each run is awaited before the next tick; late ticks are delayed
    /// rather than bunched up. Periods shorter than a second are raised
    /// to one second.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = period.max(MIN_PERIOD);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!("Session sweep scheduled every {:?}", period);
            loop {
                ticker.tick().await;
                self.trigger().await;
            }
        })
    }
}
