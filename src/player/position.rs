//! Position signal carried by the `Playing` state

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::audio::MediaEngine;

/// Handle to a periodic sampler of the engine's playback position.
///
/// The handle is finished as soon as the state that carried it is replaced,
/// which ends every stream obtained from [`PositionStream::samples`].
#[derive(Clone)]
pub struct PositionStream {
    engine: Arc<dyn MediaEngine>,
    interval: Duration,
    finished: CancellationToken,
}

impl PositionStream {
    pub(crate) fn new(engine: Arc<dyn MediaEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            finished: CancellationToken::new(),
        }
    }

    /// Stream of positions in milliseconds, one per interval, starting immediately
    pub fn samples(&self) -> impl Stream<Item = u64> + Send + 'static {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let state = (self.engine.clone(), self.finished.clone(), ticker);

        futures::stream::unfold(state, |(engine, finished, mut ticker)| async move {
            tokio::select! {
                biased;
                _ = finished.cancelled() => None,
                _ = ticker.tick() => {
                    let position = engine.position_ms();
                    Some((position, (engine, finished, ticker)))
                }
            }
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_cancelled()
    }

    pub(crate) fn finish(&self) {
        self.finished.cancel();
    }
}

// Equality of playback states is structural over what the UI shows; the
// sampler handle is not part of it.
impl PartialEq for PositionStream {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for PositionStream {}

impl fmt::Debug for PositionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionStream")
            .field("interval", &self.interval)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakeEngine;
    use futures::StreamExt;

    #[tokio::test(start_paused = true)]
    async fn samples_engine_position_until_finished() {
        let engine = Arc::new(FakeEngine::new());
        let position = PositionStream::new(engine.clone(), Duration::from_millis(250));
        let mut samples = Box::pin(position.samples());

        engine.set_position(1_000);
        assert_eq!(samples.next().await, Some(1_000));

        engine.set_position(1_250);
        assert_eq!(samples.next().await, Some(1_250));

        position.finish();
        assert!(position.is_finished());
        assert_eq!(samples.next().await, None);
    }

    #[tokio::test]
    async fn clones_share_the_finish_signal() {
        let engine = Arc::new(FakeEngine::new());
        let position = PositionStream::new(engine, Duration::from_millis(250));
        let clone = position.clone();

        position.finish();

        assert!(clone.is_finished());
        assert_eq!(Box::pin(clone.samples()).next().await, None);
    }
}
