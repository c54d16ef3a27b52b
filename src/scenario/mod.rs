//! The shipped demo script for the speech-synthesis editor, expressed as
//! scenario data.
//!
//! Everything target-specific lives here: selectors, dialog order, slider
//! ranges, and the narrative itself. The sequencer interprets this without
//! knowing anything about the application.

use std::fs;

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Settings;
use crate::engine::{Key, Locator, PointerOffset};
use crate::sequencer::{
    cleanup_scene, precache_scene, slide_step, Action, Axis, CleanupSpec, Mark, PrecacheSpec,
    Scenario, Scene, Settle, Step, ValueRange, Wait,
};

// Selectors tracking the editor build this script targets.
const AUDIO_CELL: &str = ".audio-cell";
const CELL_INPUT: &str = ".audio-cell input";
const CELL_PANE: &str = ".audio-cell-pane";
const CELL_DELETE: &str = ".audio-cell .delete-button";
const CHARACTER_BUTTON: &str = ".audio-cell .character-button";
const CHARACTER_OPTION: &str = ".character-menu .q-item";
const PLAY_BUTTON: &str = ".play-button-wrapper button";
const DETAIL_TAB: &str = ".detail-selector .q-tab";
const TIP_CONFIRM: &str = ".tip-tweakable-slider-by-scroll button";
const STARTUP_CONFIRM: &str = ".q-dialog .q-btn--unelevated";
const ACCENT_SLIDER: &str = ".accent-phrase-table .mora-table:nth-child(4) .q-slider";
const PITCH_SLIDER: &str = ".pitch-cell .q-slider__track";

// Detail tab order in the editor.
const TAB_ACCENT: usize = 0;
const TAB_INTONATION: usize = 1;
const TAB_LENGTH: usize = 2;

/// Number of cells the demo project loads.
const PROJECT_CELL_COUNT: usize = 9;
/// Cells that exist only to warm the synthesis cache; removed before the
/// timed narrative so the demo plays without synthesis stalls.
const CACHE_CELLS: [usize; 4] = [1, 4, 6, 8];

/// Intonation sliders run 6.5 at the top to 3.0 at the bottom.
const INTONATION_RANGE: ValueRange = ValueRange { from: 6.5, to: 3.0 };
/// Phoneme-length sliders run 0.3 at the top to 0.0 at the bottom.
const LENGTH_RANGE: ValueRange = ValueRange { from: 0.3, to: 0.0 };

const WINDOW_TITLE: &str = "Demo Editor v0.22";
const FIRST_LINE: &str = "You can type a sentence here";

const SET_TITLE_SCRIPT: &str = r#"
const [title] = arguments;
const node = document.querySelector(".window-title");
if (!node) {
    throw new Error("window title not found");
}
node.textContent = title;
"#;

const RESET_SCROLL_SCRIPT: &str = r#"
const pane = document.querySelector(".audio-cells");
if (!pane) {
    throw new Error("cell pane not found");
}
pane.scrollTo(0, 0);
"#;

fn cell_input(index: usize) -> Locator {
    Locator::css(CELL_INPUT).nth(index)
}

fn play_button() -> Locator {
    Locator::css(PLAY_BUTTON)
}

/// End of playback is observed through the first cell input re-enabling, not
/// the play button's own state: the editor re-enables text entry only once
/// playback has fully stopped.
fn playback_end_proxy() -> Locator {
    cell_input(0)
}

fn click(target: Locator) -> Action {
    Action::Click { target, at: None }
}

/// Move to a cell's text input and select it.
fn select_cell(index: usize) -> Step {
    Step::new()
        .move_cursor(cell_input(index), PointerOffset::new(0.2, 1.0))
        .act(click(cell_input(index)))
        .settle(Settle::Action)
}

/// Start playback; its start (the trigger re-enabling after synthesis) is a
/// recordable beat.
fn play_with_beat() -> Step {
    Step::new()
        .move_cursor(play_button(), PointerOffset::CENTER)
        .act(click(play_button()))
        .wait(Wait::Enabled(play_button()))
        .mark(Mark::Beat)
}

fn await_playback_end(settle: Settle) -> Step {
    Step::new()
        .wait(Wait::Enabled(playback_end_proxy()))
        .settle(settle)
}

fn tab_step(tab: usize, settle: Settle) -> Step {
    Step::new()
        .move_cursor(Locator::css(DETAIL_TAB).nth(tab), PointerOffset::CENTER)
        .act(click(Locator::css(DETAIL_TAB).nth(tab)))
        .settle(settle)
}

/// Build the full demo scenario from the configured assets.
pub fn build(settings: &Settings) -> Result<Scenario> {
    let project = fs::read(&settings.project_file).with_context(|| {
        format!(
            "failed to read project file {}",
            settings.project_file.display()
        )
    })?;
    let project_name = settings
        .project_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project.json".into());
    let cursor_svg = fs::read_to_string(&settings.cursor_file).with_context(|| {
        format!(
            "failed to read cursor asset {}",
            settings.cursor_file.display()
        )
    })?;

    let scenario = Scenario::new(settings.target_url.clone())
        .with_cursor(cursor_svg)
        .scene(
            // The editor walks new users through three confirmation dialogs.
            Scene::new("startup-dialogs")
                .step(Step::new().act(click(Locator::css(STARTUP_CONFIRM))))
                .step(Step::new().act(click(Locator::css(STARTUP_CONFIRM))))
                .step(Step::new().act(click(Locator::css(STARTUP_CONFIRM)))),
        )
        .scene(
            Scene::new("load-project")
                .step(Step::new().act(Action::DropFile {
                    target_css: CELL_PANE.into(),
                    file_name: project_name,
                    payload: project,
                }))
                .step(Step::new().act(Action::Script {
                    name: "set-window-title".into(),
                    source: SET_TITLE_SCRIPT.into(),
                    args: vec![json!(WINDOW_TITLE)],
                }))
                .step(Step::new().wait(Wait::Count {
                    css: AUDIO_CELL.into(),
                    expected: PROJECT_CELL_COUNT,
                }))
                .step(Step::new().act(click(Locator::css(AUDIO_CELL)))),
        )
        .scene(precache_scene(
            "precache-audio",
            &PrecacheSpec {
                item_css: CELL_INPUT.into(),
                item_count: PROJECT_CELL_COUNT,
                trigger: play_button(),
            },
        ))
        .scene(
            // Visiting the intonation tab once dismisses its one-time tip so
            // it cannot pop up mid-narrative.
            Scene::new("confirm-tips")
                .step(Step::new().act(click(Locator::css(DETAIL_TAB).nth(TAB_INTONATION))))
                .step(Step::new().act(click(Locator::css(TIP_CONFIRM))))
                .step(Step::new().act(click(Locator::css(DETAIL_TAB).nth(TAB_ACCENT)))),
        )
        .scene(cleanup_scene(
            "remove-cache-cells",
            &CleanupSpec {
                select_css: CELL_INPUT.into(),
                remove_css: CELL_DELETE.into(),
            },
            &CACHE_CELLS,
        ))
        .scene(
            // The cell pane is occasionally left scrolled by the cleanup
            // pass; reset it so the narrative starts from a known frame.
            Scene::new("loaded-anchor")
                .step(Step::new().act(Action::Script {
                    name: "reset-scroll".into(),
                    source: RESET_SCROLL_SCRIPT.into(),
                    args: vec![],
                }))
                .step(
                    Step::new()
                        .move_cursor(cell_input(0), PointerOffset::new(0.2, 1.0))
                        .settle(Settle::For(settings.loaded_settle)),
                )
                .step(
                    Step::new()
                        .mark(Mark::Loaded)
                        .settle(Settle::For(settings.loaded_settle)),
                ),
        )
        .scene(
            Scene::new("type-first-line")
                .step(
                    Step::new()
                        .act(Action::Type {
                            target: cell_input(0),
                            text: FIRST_LINE.into(),
                        })
                        .settle(Settle::Keyboard),
                )
                .step(
                    Step::new()
                        .act(Action::Press {
                            target: cell_input(0),
                            key: Key::Enter,
                        })
                        .settle(Settle::Cell),
                ),
        )
        .scene(
            Scene::new("play-second-line")
                .step(select_cell(1))
                .step(play_with_beat())
                .step(await_playback_end(Settle::Cell)),
        )
        .scene(
            Scene::new("fix-accent")
                .step(select_cell(2))
                .step(play_with_beat())
                .step(await_playback_end(Settle::Action))
                // The mispronounced phrase sits in the fourth mora table;
                // dragging its accent point to 3/8 of the slider corrects it.
                .step(
                    Step::new()
                        .move_cursor(
                            Locator::css(ACCENT_SLIDER),
                            PointerOffset::new(3.0 / 8.0, 1.0),
                        )
                        .act(Action::Click {
                            target: Locator::css(ACCENT_SLIDER),
                            at: Some(PointerOffset::new(3.0 / 8.0, 0.0)),
                        })
                        .settle(Settle::Action),
                )
                .step(play_with_beat())
                .step(await_playback_end(Settle::Cell)),
        )
        .scene(
            Scene::new("adjust-intonation")
                .step(select_cell(3))
                .step(play_with_beat())
                .step(await_playback_end(Settle::Action))
                .step(tab_step(TAB_INTONATION, Settle::Action))
                .step(slide_step(
                    Locator::css(PITCH_SLIDER),
                    Axis::Vertical,
                    INTONATION_RANGE,
                    5.85,
                    Settle::Action,
                ))
                .step(slide_step(
                    Locator::css(PITCH_SLIDER).nth(18),
                    Axis::Vertical,
                    INTONATION_RANGE,
                    5.91,
                    Settle::Action,
                ))
                .step(tab_step(TAB_LENGTH, Settle::Action))
                .step(slide_step(
                    Locator::css(PITCH_SLIDER).nth(1),
                    Axis::Vertical,
                    LENGTH_RANGE,
                    0.207,
                    Settle::Action,
                ))
                .step(play_with_beat())
                .step(await_playback_end(Settle::Cell)),
        )
        .scene(
            Scene::new("switch-character")
                .step(select_cell(4))
                .step(
                    Step::new()
                        .move_cursor(
                            Locator::css(CHARACTER_BUTTON).nth(4),
                            PointerOffset::CENTER,
                        )
                        .act(click(Locator::css(CHARACTER_BUTTON).nth(4)))
                        .settle(Settle::Action),
                )
                .step(
                    Step::new()
                        .move_cursor(Locator::css(CHARACTER_OPTION).nth(1), PointerOffset::CENTER)
                        .act(click(Locator::css(CHARACTER_OPTION).nth(1)))
                        .settle(Settle::Action),
                )
                .step(play_with_beat())
                .step(await_playback_end(Settle::Cell)),
        )
        .scene(
            // Trailing second so the final playback is not cut off by
            // teardown.
            Scene::new("tail").step(Step::new().settle(Settle::For(
                std::time::Duration::from_secs(1),
            ))),
        );

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn settings_with_assets(dir: &TempDir) -> Settings {
        let project = dir.path().join("demo-project.json");
        fs::File::create(&project)
            .unwrap()
            .write_all(b"{\"cells\":[]}")
            .unwrap();
        let cursor = dir.path().join("cursor.svg");
        fs::File::create(&cursor)
            .unwrap()
            .write_all(b"<svg></svg>")
            .unwrap();

        Settings {
            project_file: project,
            cursor_file: cursor,
            ..Settings::default()
        }
    }

    #[test]
    fn demo_scenario_marks_one_loaded_anchor_and_six_beats() {
        let dir = TempDir::new().unwrap();
        let scenario = build(&settings_with_assets(&dir)).unwrap();

        let marks: Vec<Mark> = scenario
            .scenes
            .iter()
            .flat_map(|scene| scene.steps.iter())
            .filter_map(|step| step.mark)
            .collect();

        assert_eq!(marks.iter().filter(|m| **m == Mark::Loaded).count(), 1);
        assert_eq!(marks.iter().filter(|m| **m == Mark::Beat).count(), 6);
        // Every beat comes after the loaded anchor.
        let loaded_at = marks.iter().position(|m| *m == Mark::Loaded).unwrap();
        assert!(marks
            .iter()
            .enumerate()
            .all(|(i, m)| *m != Mark::Beat || i > loaded_at));
    }

    #[test]
    fn precache_covers_every_project_cell_before_the_anchor() {
        let dir = TempDir::new().unwrap();
        let scenario = build(&settings_with_assets(&dir)).unwrap();

        let precache_pos = scenario
            .scenes
            .iter()
            .position(|s| s.name == "precache-audio")
            .unwrap();
        let anchor_pos = scenario
            .scenes
            .iter()
            .position(|s| s.name == "loaded-anchor")
            .unwrap();
        assert!(precache_pos < anchor_pos);
        assert_eq!(
            scenario.scenes[precache_pos].steps.len(),
            PROJECT_CELL_COUNT * 3
        );
    }

    #[test]
    fn missing_assets_fail_with_context() {
        let settings = Settings {
            project_file: "/nonexistent/demo-project.json".into(),
            ..Settings::default()
        };
        let err = build(&settings).unwrap_err();
        assert!(err.to_string().contains("project file"));
    }
}
