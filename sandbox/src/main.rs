// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Lucent sandbox
// Drives the frame loop on a render thread while the main thread plays the
// host shell: rotation, backgrounding and teardown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use lucent_core::math::{LinearRgba, Vec3};
use lucent_core::{
    DisplayRotation, ImageExtent, LightEstimate, LucentError, Pose, TrackableUpdate,
    TrackingState,
};
use lucent_infra::{FrameSpec, ScriptHandle, ScriptedProvider};
use lucent_runtime::{
    AugmentedImageApp, FrameLoop, LifecycleController, LucentConfig, RenderOutcome, TickOutcome,
};
use lucent_telemetry::init_logging;

#[derive(Parser)]
#[command(name = "sandbox", about = "Replay a scripted augmented-image session")]
struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of render ticks to run.
    #[arg(long, default_value_t = 400)]
    ticks: u32,

    /// Number of reference images that show up during the run.
    #[arg(long, default_value_t = 3)]
    images: u32,

    /// Milliseconds between render ticks.
    #[arg(long, default_value_t = 4)]
    tick_ms: u64,

    /// Start with the tracking service not yet installed.
    #[arg(long)]
    needs_install: bool,
}

#[derive(Debug, Default)]
struct RunSummary {
    rendered: u32,
    augmented: u32,
    skipped: u32,
    failed: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => LucentConfig::from_file(path)?,
        None => LucentConfig::default(),
    };
    init_logging(&config.telemetry);

    let base_dir = cli
        .config
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let provider = ScriptedProvider::new();
    let script = provider.handle();
    if cli.needs_install {
        script.set_availability(lucent_core::Availability::InstallRequested);
    }
    queue_scenario(&script, cli.ticks, cli.images);

    let app = AugmentedImageApp::from_config(Arc::new(provider), &config, base_dir)?;
    let (mut controller, frame_loop) = app.into_parts();
    start_session(&mut controller)?;

    let tick = Duration::from_millis(cli.tick_ms);
    let ticks = cli.ticks;
    let render = thread::Builder::new()
        .name("render".to_string())
        .spawn(move || render_loop(frame_loop, ticks, tick))?;

    play_shell(&mut controller, tick * ticks);

    let (mut frame_loop, summary) = render
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;
    frame_loop.release_anchors();
    controller.destroy()?;

    frame_loop.telemetry().log_summary();
    log::info!(
        "Run finished: {} rendered, {} with images, {} skipped, {} failed.",
        summary.rendered,
        summary.augmented,
        summary.skipped,
        summary.failed
    );
    Ok(())
}

/// Starts the session, going through the install prompt once if needed.
fn start_session(controller: &mut LifecycleController) -> Result<()> {
    match controller.start() {
        Err(e @ LucentError::SessionUnavailable { .. }) if e.is_recoverable() => {
            log::info!("{e}; retrying after install.");
            controller.start()?;
        }
        result => result?,
    }
    Ok(())
}

/// Rotates the display, backgrounds the app and brings it back.
fn play_shell(controller: &mut LifecycleController, run_time: Duration) {
    let notifier = controller.geometry_notifier();
    notifier.notify(DisplayRotation::Rotation0, 1080, 1920);

    thread::sleep(run_time / 4);
    notifier.notify(DisplayRotation::Rotation90, 1920, 1080);

    thread::sleep(run_time / 4);
    if let Err(e) = controller.pause() {
        log::error!("Pause failed: {e}");
    }
    thread::sleep(run_time / 10);
    if let Err(e) = controller.resume() {
        log::warn!("Resume failed: {e}");
    }
    notifier.notify(DisplayRotation::Rotation0, 1080, 1920);
}

fn render_loop(mut frame_loop: FrameLoop, ticks: u32, interval: Duration) -> (FrameLoop, RunSummary) {
    let mut summary = RunSummary::default();
    let mut images_in_view = false;

    for _ in 0..ticks {
        match frame_loop.tick() {
            Ok(TickOutcome::Rendered(outcome)) => {
                summary.rendered += 1;
                if outcome.images_in_view() {
                    summary.augmented += 1;
                }
                if outcome.images_in_view() != images_in_view {
                    images_in_view = outcome.images_in_view();
                    log::info!(
                        "Fit-image hint {}.",
                        if images_in_view { "hidden" } else { "shown" }
                    );
                }
                if let RenderOutcome::Augmented(frame) = &outcome {
                    // Upload sizes a renderer would see.
                    let uniform_bytes = frame.uniforms().as_bytes().len()
                        + frame
                            .images
                            .iter()
                            .map(|image| 4 * image.corner_uniforms(0).as_bytes().len())
                            .sum::<usize>();
                    log::trace!(
                        "Frame {}: {} images, {uniform_bytes} uniform bytes.",
                        frame.sequence,
                        frame.images.len()
                    );
                }
            }
            Ok(TickOutcome::NoFrame(reason)) => {
                summary.skipped += 1;
                log::trace!("No frame: {reason:?}.");
            }
            Err(e) => {
                summary.failed += 1;
                log::error!("Tick failed: {e}");
            }
        }
        thread::sleep(interval);
    }

    (frame_loop, summary)
}

/// Queues one frame per tick. Each image is detected, tracked, briefly lost
/// and finally stopped; the camera skips an image every few ticks.
fn queue_scenario(script: &ScriptHandle, ticks: u32, images: u32) {
    let light = LightEstimate::Valid(LinearRgba::new(0.9, 0.95, 1.0, 0.8));

    for t in 0..ticks {
        if t % 9 == 8 {
            script.push_no_frame();
            continue;
        }
        if t % 23 == 22 {
            script.push_repeat();
            continue;
        }

        let sway = (t as f32 * 0.05).sin() * 0.02;
        let mut frame = FrameSpec::tracking(Pose::from_translation(Vec3::new(sway, 1.4, 0.0)))
            .with_light_estimate(light);

        for i in 0..images {
            let appear = 20 + i * 40;
            let Some(state) = image_state(t, appear) else {
                continue;
            };
            let pose = Pose::from_translation(Vec3::new(i as f32 * 0.3 - 0.3, 1.0, -1.0));
            let update = TrackableUpdate::new(
                format!("image-{i}"),
                i as i32,
                state,
                ImageExtent::new(0.2, 0.28),
                pose,
            )
            .with_name(format!("poster_{i}.png"));
            frame = frame.with_trackable(update);
        }
        script.push_frame(frame);
    }
}

fn image_state(t: u32, appear: u32) -> Option<TrackingState> {
    let age = t.checked_sub(appear)?;
    match age {
        0..=4 => Some(TrackingState::Paused),
        5..=149 => Some(TrackingState::Tracking),
        150..=169 => Some(TrackingState::Paused),
        170 => Some(TrackingState::Stopped),
        _ => None,
    }
}
