//! End-to-end flow: a scripted scenario driven against the mock engine, the
//! timing record handed off through the filesystem, and the compositor's
//! preconditions checked against it.

use std::fs;
use std::time::Duration;

use showreel::composite::{CompositeError, Compositor};
use showreel::engine::{Locator, MockEngine};
use showreel::sequencer::{
    cleanup_scene, precache_scene, slide_step, Action, Axis, CleanupSpec, Mark, Pacing,
    PrecacheSpec, Scenario, Scene, Sequencer, Settle, Step, ValueRange, Wait,
};
use showreel::timeline::TimestampRecord;

fn fast_pacing() -> Pacing {
    Pacing {
        keyboard: Duration::from_millis(1),
        action: Duration::from_millis(1),
        cell: Duration::from_millis(1),
        cursor_ease: Duration::from_millis(1),
    }
}

fn trigger() -> Locator {
    Locator::css("button.go")
}

fn demo_scenario() -> Scenario {
    Scenario::new("http://demo.invalid")
        .with_cursor("<svg></svg>")
        .scene(precache_scene(
            "precache",
            &PrecacheSpec {
                item_css: ".item input".into(),
                item_count: 3,
                trigger: trigger(),
            },
        ))
        .scene(cleanup_scene(
            "cleanup",
            &CleanupSpec {
                select_css: ".item input".into(),
                remove_css: ".item .remove".into(),
            },
            &[1, 3],
        ))
        .scene(
            Scene::new("load").step(
                Step::new()
                    .wait(Wait::Count {
                        css: ".item".into(),
                        expected: 4,
                    })
                    .mark(Mark::Loaded)
                    .settle(Settle::For(Duration::from_millis(5))),
            ),
        )
        .scene(
            Scene::new("first-beat").step(
                Step::new()
                    .act(Action::Click {
                        target: trigger(),
                        at: None,
                    })
                    .wait(Wait::Enabled(trigger()))
                    .mark(Mark::Beat)
                    .settle(Settle::Cell),
            ),
        )
        .scene(
            Scene::new("adjust").step(slide_step(
                Locator::css(".slider"),
                Axis::Horizontal,
                ValueRange::new(0.0, 10.0),
                7.5,
                Settle::Action,
            )),
        )
}

#[tokio::test]
async fn recorded_timeline_flows_into_the_compositor() {
    let engine = MockEngine::new()
        .with_counts(".item", vec![2, 2, 4])
        .with_enabled(&trigger(), vec![true]);

    let record = Sequencer::new(&engine, fast_pacing())
        .run(&demo_scenario())
        .await
        .unwrap();

    assert!(engine.closed(), "session must be released before persisting");
    record.validate().unwrap();
    assert_eq!(record.event_times.len(), 1);

    // Handoff through the well-known path.
    let dir = tempfile::tempdir().unwrap();
    let timings_path = dir.path().join("timings.json");
    record.write(&timings_path).unwrap();
    let read_back = TimestampRecord::read(&timings_path).unwrap();
    assert_eq!(read_back, record);

    // The slider click landed at the inverse-lerped fraction.
    let calls = engine.calls();
    assert!(
        calls.iter().any(|c| c.contains("click .slider@0 at (0.750")),
        "slider click missing from {calls:?}"
    );
}

#[tokio::test]
async fn failed_run_leaves_nothing_for_the_compositor() {
    let absent = Locator::css("button.go");
    let engine = MockEngine::new()
        .with_counts(".item", vec![4])
        .with_structural(&absent);

    let result = Sequencer::new(&engine, fast_pacing())
        .run(&demo_scenario())
        .await;

    assert!(result.is_err());
    assert!(engine.closed(), "teardown must still happen");

    // No record was written, so compositing fails before any encoder call.
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("videos")).unwrap();
    let compositor = Compositor::new(
        dir.path().join("videos"),
        dir.path().join("timings.json"),
        dir.path().join("dist.mp4"),
        Some("/nonexistent/encoder".into()),
    );
    let err = compositor.run().await.unwrap_err();
    assert!(matches!(err, CompositeError::Timeline(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn compositor_invokes_the_configured_encoder_on_a_clean_handoff() {
    let dir = tempfile::tempdir().unwrap();
    let videos = dir.path().join("videos");
    fs::create_dir_all(&videos).unwrap();
    fs::write(videos.join("session.webm"), b"raw").unwrap();

    let record = TimestampRecord {
        start_time: 1000,
        loaded_time: 3500,
        event_times: vec![4000],
    };
    let timings_path = dir.path().join("timings.json");
    record.write(&timings_path).unwrap();

    // `true` stands in for ffmpeg: accepts any arguments, exits zero.
    let encoder = which::which("true").unwrap();
    let compositor = Compositor::new(
        videos,
        timings_path,
        dir.path().join("dist.mp4"),
        Some(encoder),
    );

    let output = compositor.run().await.unwrap();
    assert_eq!(output, dir.path().join("dist.mp4"));
}
