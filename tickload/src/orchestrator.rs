use crate::events::LoadEvents;
use crate::{LoadEvent, LoadItem, LoadResult, ResourceBackend};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// How a loader decides what to request and when its items are done. The orchestrator owns the
/// timing and completion bookkeeping and calls into the strategy for everything else.
pub trait LoadStrategy {
    /// Issue the initial backend request(s)
    fn start(
        &mut self,
        backend: &dyn ResourceBackend,
    ) -> LoadResult<()>;

    /// Poll the in-flight item(s) and update item state. Only called while `all_finished` is false.
    fn step(
        &mut self,
        backend: &dyn ResourceBackend,
        events: &mut LoadEvents,
    );

    fn all_finished(&self) -> bool;

    /// Overall progress in [0, 1]
    fn total_progress(
        &self,
        backend: &dyn ResourceBackend,
    ) -> f32;

    /// Strategy-specific events sent right after the generic load complete event
    fn send_complete_events(
        &mut self,
        _events: &mut LoadEvents,
    ) {
    }
}

/// Drives a [`LoadStrategy`] from a frame loop.
///
/// Call [`start`](Self::start) once, then [`advance`](Self::advance) every frame with the frame
/// time. The loader is complete when every item finished *and* at least `min_load_duration` has
/// been accumulated, which lets a loading screen stay up for a minimum time even if everything
/// loads instantly. The load complete event is sent exactly once, on the first `advance` where
/// that holds.
pub struct LoadOrchestrator<S: LoadStrategy> {
    strategy: S,
    backend: Arc<dyn ResourceBackend>,
    events: LoadEvents,
    elapsed: f32,
    min_load_duration: f32,
    complete_event_fired: bool,
}

impl<S: LoadStrategy> LoadOrchestrator<S> {
    pub fn with_strategy(
        strategy: S,
        backend: Arc<dyn ResourceBackend>,
        min_load_duration: f32,
    ) -> Self {
        let min_load_duration = if min_load_duration.is_finite() && min_load_duration >= 0.0 {
            min_load_duration
        } else {
            log::warn!(
                "invalid min_load_duration {}, using 0 instead",
                min_load_duration
            );
            0.0
        };

        LoadOrchestrator {
            strategy,
            backend,
            events: LoadEvents::new(),
            elapsed: 0.0,
            min_load_duration,
            complete_event_fired: false,
        }
    }

    pub fn start(&mut self) -> LoadResult<()> {
        self.strategy.start(&*self.backend)
    }

    /// Advance by `delta` seconds: accumulate time, poll the backend, and send the completion
    /// events if the loader just became complete.
    #[profiling::function]
    pub fn advance(
        &mut self,
        delta: f32,
    ) {
        if delta.is_finite() && delta >= 0.0 {
            self.elapsed += delta;
        } else {
            log::warn!("ignoring invalid load delta {}", delta);
        }

        if !self.strategy.all_finished() {
            self.strategy.step(&*self.backend, &mut self.events);
        }

        self.check_complete();
    }

    fn check_complete(&mut self) {
        if self.complete_event_fired || !self.is_complete() {
            return;
        }

        log::debug!("load complete after {}s", self.elapsed);
        self.complete_event_fired = true;
        self.events.load_complete(self.elapsed);
        self.strategy.send_complete_events(&mut self.events);
    }

    pub fn is_complete(&self) -> bool {
        self.strategy.all_finished() && self.elapsed >= self.min_load_duration
    }

    pub fn total_progress(&self) -> f32 {
        self.strategy.total_progress(&*self.backend)
    }

    // Seconds accumulated by advance() so far
    pub fn load_duration(&self) -> f32 {
        self.elapsed
    }

    pub fn min_load_duration(&self) -> f32 {
        self.min_load_duration
    }

    /// Queue of events produced by `advance`. Drain it with `try_iter()` after each tick.
    pub fn events(&self) -> &Receiver<LoadEvent> {
        self.events.receiver()
    }

    /// Called once when loading completes, before any other completion callbacks
    pub fn on_load_complete(
        &mut self,
        callback: impl FnMut() + 'static,
    ) {
        self.events.add_load_complete(Box::new(callback));
    }

    /// Called with each item as it finishes. A single-resource loader calls it once, after the
    /// load complete callbacks.
    pub fn on_item_complete(
        &mut self,
        callback: impl FnMut(&LoadItem) + 'static,
    ) {
        self.events.add_item_complete(Box::new(callback));
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub(crate) fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn into_strategy(self) -> S {
        self.strategy
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_backend::{Behavior, TestBackend};
    use crate::{LoadEvents, ResourceBackend};
    use std::cell::Cell;
    use std::rc::Rc;

    // Finishes after a fixed number of steps, without touching the backend
    struct CountdownStrategy {
        remaining_steps: u32,
    }

    impl LoadStrategy for CountdownStrategy {
        fn start(
            &mut self,
            _backend: &dyn ResourceBackend,
        ) -> LoadResult<()> {
            Ok(())
        }

        fn step(
            &mut self,
            _backend: &dyn ResourceBackend,
            _events: &mut LoadEvents,
        ) {
            self.remaining_steps -= 1;
        }

        fn all_finished(&self) -> bool {
            self.remaining_steps == 0
        }

        fn total_progress(
            &self,
            _backend: &dyn ResourceBackend,
        ) -> f32 {
            if self.remaining_steps == 0 {
                1.0
            } else {
                0.0
            }
        }
    }

    fn countdown(
        remaining_steps: u32,
        min_load_duration: f32,
    ) -> LoadOrchestrator<CountdownStrategy> {
        LoadOrchestrator::with_strategy(
            CountdownStrategy { remaining_steps },
            TestBackend::new(Behavior::Manual),
            min_load_duration,
        )
    }

    #[test]
    fn elapsed_time_is_the_sum_of_deltas() {
        let mut loader = countdown(100, 0.0);
        assert_eq!(loader.load_duration(), 0.0);

        let deltas = [0.016, 0.5, 0.0, 0.25, 1.125];
        let mut expected = 0.0f32;
        for delta in deltas {
            loader.advance(delta);
            expected += delta;
            assert_eq!(loader.load_duration(), expected);
        }
    }

    #[test]
    fn invalid_deltas_are_ignored() {
        let mut loader = countdown(100, 0.0);
        loader.advance(0.5);
        loader.advance(-1.0);
        loader.advance(f32::NAN);
        loader.advance(f32::INFINITY);
        assert_eq!(loader.load_duration(), 0.5);
    }

    #[test]
    fn completion_waits_for_min_duration() {
        let mut loader = countdown(1, 1.0);
        loader.start().unwrap();

        loader.advance(0.25);
        assert!(loader.strategy().all_finished());
        assert!(!loader.is_complete());

        loader.advance(0.5);
        assert!(!loader.is_complete());

        loader.advance(0.25);
        assert!(loader.is_complete());

        for _ in 0..10 {
            loader.advance(0.1);
            assert!(loader.is_complete());
        }
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut loader = countdown(3, 0.0);
        let fired = Rc::new(Cell::new(0));
        let fired_clone = fired.clone();
        loader.on_load_complete(move || fired_clone.set(fired_clone.get() + 1));
        loader.start().unwrap();

        for _ in 0..10 {
            loader.advance(0.1);
        }

        assert_eq!(fired.get(), 1);
        let events: Vec<_> = loader.events().try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::LoadComplete { .. }));
    }

    #[test]
    fn steps_stop_once_finished() {
        // CountdownStrategy would underflow if stepped after finishing
        let mut loader = countdown(2, 5.0);
        for _ in 0..20 {
            loader.advance(0.5);
        }
        assert!(loader.is_complete());
    }

    #[test]
    fn invalid_min_duration_falls_back_to_zero() {
        let loader = countdown(1, f32::NAN);
        assert_eq!(loader.min_load_duration(), 0.0);
        let loader = countdown(1, -3.0);
        assert_eq!(loader.min_load_duration(), 0.0);
    }
}
