//! Generic scenario executor.
//!
//! Interprets the declarative script against a live engine session: one step
//! at a time, one visible action at a time, suspending on waits and settle
//! delays. The session is closed on every exit path; a timestamp record is
//! produced only when the whole scenario succeeds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::engine::{EngineError, PointerOffset, UiEngine};
use crate::sequencer::cursor;
use crate::sequencer::script::{Action, Axis, Mark, Scenario, Settle, Step, Wait};
use crate::sequencer::wait::{wait_for_count, wait_for_enabled};
use crate::timeline::TimestampRecord;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("failed to open session: {0}")]
    Open(#[source] EngineError),
    #[error("scene '{scene}' failed: {source}")]
    Scene {
        scene: String,
        #[source]
        source: EngineError,
    },
    #[error("scene '{0}' records a beat before the loaded anchor")]
    BeatBeforeLoaded(String),
    #[error("scene '{0}' captures the loaded anchor twice")]
    DuplicateLoadedAnchor(String),
    #[error("scenario never captured the loaded anchor")]
    MissingLoadedAnchor,
}

/// Fixed pacing for a session: the three settle delay classes plus the
/// cursor ease duration. Not adaptive.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub keyboard: Duration,
    pub action: Duration,
    pub cell: Duration,
    pub cursor_ease: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            keyboard: Duration::from_millis(100),
            action: Duration::from_millis(300),
            cell: Duration::from_millis(500),
            cursor_ease: Duration::from_millis(500),
        }
    }
}

pub struct Sequencer<'a> {
    engine: &'a dyn UiEngine,
    pacing: Pacing,
}

impl<'a> Sequencer<'a> {
    pub fn new(engine: &'a dyn UiEngine, pacing: Pacing) -> Self {
        Self { engine, pacing }
    }

    /// Run the scenario to completion and return the captured timeline.
    ///
    /// The engine session is torn down whether the run succeeds or fails, so
    /// callers may persist the record as soon as this returns `Ok`.
    pub async fn run(&self, scenario: &Scenario) -> Result<TimestampRecord, SequencerError> {
        let result = self.drive(scenario).await;
        if let Err(err) = self.engine.close().await {
            tracing::warn!(error = %err, "session teardown failed");
        }
        result
    }

    async fn drive(&self, scenario: &Scenario) -> Result<TimestampRecord, SequencerError> {
        // The session-start anchor precedes any load waiting; the recording
        // side effect begins with the page.
        let start_time = now_ms();
        tracing::info!(url = %scenario.url, "opening session");
        self.engine
            .open(&scenario.url)
            .await
            .map_err(SequencerError::Open)?;

        if let Some(svg) = &scenario.cursor_svg {
            cursor::inject(self.engine, svg, self.pacing.cursor_ease)
                .await
                .map_err(|source| scene_err("cursor-overlay", source))?;
        }

        let mut loaded_time: Option<u64> = None;
        let mut event_times = Vec::new();

        for scene in &scenario.scenes {
            tracing::info!(scene = %scene.name, "scene");
            for step in &scene.steps {
                self.run_step(step, &scene.name, &mut loaded_time, &mut event_times)
                    .await?;
            }
        }

        let loaded_time = loaded_time.ok_or(SequencerError::MissingLoadedAnchor)?;
        tracing::info!(
            setup_ms = loaded_time - start_time,
            beats = event_times.len(),
            "scenario complete"
        );
        Ok(TimestampRecord {
            start_time,
            loaded_time,
            event_times,
        })
    }

    async fn run_step(
        &self,
        step: &Step,
        scene: &str,
        loaded_time: &mut Option<u64>,
        event_times: &mut Vec<u64>,
    ) -> Result<(), SequencerError> {
        if let Some(cursor_move) = &step.cursor {
            cursor::move_to(
                self.engine,
                &cursor_move.target,
                cursor_move.at,
                self.pacing.cursor_ease,
            )
            .await
            .map_err(|source| scene_err(scene, source))?;
        }

        if let Some(action) = &step.action {
            self.perform(action)
                .await
                .map_err(|source| scene_err(scene, source))?;
        }

        if let Some(wait) = &step.wait {
            match wait {
                Wait::Count { css, expected } => {
                    wait_for_count(self.engine, css, *expected).await
                }
                Wait::Enabled(locator) => wait_for_enabled(self.engine, locator).await,
            }
            .map_err(|source| scene_err(scene, source))?;
        }

        match step.mark {
            Some(Mark::Loaded) => {
                if loaded_time.is_some() {
                    return Err(SequencerError::DuplicateLoadedAnchor(scene.to_string()));
                }
                let at = now_ms();
                tracing::info!(scene, at, "loaded anchor");
                *loaded_time = Some(at);
            }
            Some(Mark::Beat) => {
                if loaded_time.is_none() {
                    return Err(SequencerError::BeatBeforeLoaded(scene.to_string()));
                }
                event_times.push(now_ms());
            }
            None => {}
        }

        if let Some(settle) = &step.settle {
            tokio::time::sleep(self.settle_duration(settle)).await;
        }

        Ok(())
    }

    async fn perform(&self, action: &Action) -> Result<(), EngineError> {
        match action {
            Action::Click { target, at } => {
                tracing::debug!(target = %target, "click");
                self.engine.click(target, *at).await
            }
            Action::Type { target, text } => {
                tracing::debug!(target = %target, "type text");
                self.engine
                    .type_text(target, text, self.pacing.keyboard)
                    .await
            }
            Action::Press { target, key } => self.engine.press_key(target, *key).await,
            Action::Slide {
                target,
                axis,
                range,
                value,
            } => {
                let fraction = range.fraction_of(*value);
                let at = match axis {
                    Axis::Horizontal => PointerOffset::new(fraction, 0.0),
                    Axis::Vertical => PointerOffset::new(0.0, fraction),
                };
                tracing::debug!(target = %target, value, fraction, "slide");
                self.engine.click(target, Some(at)).await
            }
            Action::DropFile {
                target_css,
                file_name,
                payload,
            } => {
                self.engine
                    .drop_payload(target_css, file_name, payload)
                    .await
            }
            Action::Script { name, source, args } => {
                tracing::debug!(script = %name, "page script");
                self.engine.run_script(source, args.clone()).await.map(drop)
            }
        }
    }

    fn settle_duration(&self, settle: &Settle) -> Duration {
        match settle {
            Settle::Keyboard => self.pacing.keyboard,
            Settle::Action => self.pacing.action,
            Settle::Cell => self.pacing.cell,
            Settle::For(duration) => *duration,
        }
    }
}

fn scene_err(scene: &str, source: EngineError) -> SequencerError {
    SequencerError::Scene {
        scene: scene.to_string(),
        source,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Locator, MockEngine};
    use crate::sequencer::script::{Scenario, Scene, Step};

    fn play_button() -> Locator {
        Locator::css("button.play")
    }

    fn minimal_scenario() -> Scenario {
        Scenario::new("http://demo.invalid")
            .scene(
                Scene::new("load").step(
                    Step::new()
                        .wait(Wait::Count {
                            css: ".cell".into(),
                            expected: 2,
                        })
                        .mark(Mark::Loaded)
                        .settle(Settle::For(Duration::from_millis(200))),
                ),
            )
            .scene(
                Scene::new("play").step(
                    Step::new()
                        .act(Action::Click {
                            target: play_button(),
                            at: None,
                        })
                        .wait(Wait::Enabled(play_button()))
                        .mark(Mark::Beat)
                        .settle(Settle::Cell),
                ),
            )
    }

    #[tokio::test(start_paused = true)]
    async fn successful_run_produces_a_monotonic_record_and_closes_the_session() {
        let engine = MockEngine::new()
            .with_counts(".cell", vec![0, 1, 2])
            .with_enabled(&play_button(), vec![false, true]);

        let sequencer = Sequencer::new(&engine, Pacing::default());
        let record = sequencer.run(&minimal_scenario()).await.unwrap();

        assert!(record.start_time <= record.loaded_time);
        assert_eq!(record.event_times.len(), 1);
        record.validate().unwrap();
        assert!(engine.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn structural_failure_names_the_scene_and_still_tears_down() {
        let engine = MockEngine::new()
            .with_counts(".cell", vec![2])
            .with_structural(&play_button());

        let sequencer = Sequencer::new(&engine, Pacing::default());
        let err = sequencer.run(&minimal_scenario()).await.unwrap_err();

        match err {
            SequencerError::Scene { scene, source } => {
                assert_eq!(scene, "play");
                assert!(matches!(source, EngineError::Structural(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine.closed(), "teardown must run on the failure path");
    }

    #[tokio::test(start_paused = true)]
    async fn beat_before_loaded_anchor_is_rejected() {
        let scenario = Scenario::new("http://demo.invalid").scene(
            Scene::new("too-early").step(Step::new().mark(Mark::Beat)),
        );
        let engine = MockEngine::new();

        let err = Sequencer::new(&engine, Pacing::default())
            .run(&scenario)
            .await
            .unwrap_err();

        assert!(matches!(err, SequencerError::BeatBeforeLoaded(scene) if scene == "too-early"));
        assert!(engine.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_loaded_anchor_is_rejected() {
        let scenario = Scenario::new("http://demo.invalid")
            .scene(Scene::new("empty").step(Step::new().settle(Settle::Action)));
        let engine = MockEngine::new();

        let err = Sequencer::new(&engine, Pacing::default())
            .run(&scenario)
            .await
            .unwrap_err();

        assert!(matches!(err, SequencerError::MissingLoadedAnchor));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_loaded_anchor_is_rejected() {
        let scenario = Scenario::new("http://demo.invalid")
            .scene(Scene::new("first").step(Step::new().mark(Mark::Loaded)))
            .scene(Scene::new("second").step(Step::new().mark(Mark::Loaded)));
        let engine = MockEngine::new();

        let err = Sequencer::new(&engine, Pacing::default())
            .run(&scenario)
            .await
            .unwrap_err();

        assert!(matches!(err, SequencerError::DuplicateLoadedAnchor(scene) if scene == "second"));
    }

    #[tokio::test(start_paused = true)]
    async fn steps_execute_strictly_in_scene_order() {
        let engine = MockEngine::new()
            .with_counts(".cell", vec![2])
            .with_enabled(&play_button(), vec![true]);

        Sequencer::new(&engine, Pacing::default())
            .run(&minimal_scenario())
            .await
            .unwrap();

        let calls = engine.calls();
        let open = calls.iter().position(|c| c.starts_with("open")).unwrap();
        let count = calls.iter().position(|c| c.starts_with("count")).unwrap();
        let click = calls.iter().position(|c| c.starts_with("click")).unwrap();
        let close = calls.iter().position(|c| c == "close").unwrap();
        assert!(open < count && count < click && click < close);
    }
}
