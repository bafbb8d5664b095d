use crate::stage::Stage;
use anyhow::Result;
use reflex_core::{color, Color, EventSource, InputEvent, StopCondition, UnitOutcome};
use reflex_render::{Canvas, ImageId};
use reflex_timing::Clock;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Parameter problems a stimulus kind can reject before running.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("text stimulus requires a non-empty message")]
    EmptyMessage,
    #[error("image file not found: {0}")]
    MissingImage(PathBuf),
}

/// Parameters shared by the single-line and multi-line text kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub message: String,
    pub font_size: f32,
    pub color: Color,
    pub backcolor: Color,
}

impl TextParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            font_size: 24.0,
            color: color::WHITE,
            backcolor: color::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleParams {
    pub radius: u32,
    pub color: Color,
    pub backcolor: Color,
    /// Signed horizontal shift from center, in pixels.
    pub offset: i32,
}

impl Default for CircleParams {
    fn default() -> Self {
        Self {
            radius: 50,
            color: color::WHITE,
            backcolor: color::BLACK,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageParams {
    pub path: PathBuf,
    pub backcolor: Color,
    /// Stretch to fill the whole canvas instead of centering.
    pub fullscreen: bool,
}

impl ImageParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backcolor: color::BLACK,
            fullscreen: false,
        }
    }
}

/// The four stimulus kinds, each with its own validate/layout/draw rules
/// behind the shared polling loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusKind {
    Text(TextParams),
    Multiline(TextParams),
    Circle(CircleParams),
    Image(ImageParams),
}

/// Geometry computed once on the first frame and redrawn statically.
#[derive(Debug)]
enum Layout {
    Text { pos: (i32, i32) },
    Multiline { lines: Vec<(String, (i32, i32))> },
    Circle { center: (i32, i32) },
    Image { image: ImageId, pos: (i32, i32) },
}

impl StimulusKind {
    fn validate(&self) -> Result<(), ParamError> {
        match self {
            StimulusKind::Text(p) | StimulusKind::Multiline(p) => {
                if p.message.is_empty() {
                    Err(ParamError::EmptyMessage)
                } else {
                    Ok(())
                }
            }
            StimulusKind::Circle(_) => Ok(()),
            StimulusKind::Image(p) => {
                if p.path.is_file() {
                    Ok(())
                } else {
                    Err(ParamError::MissingImage(p.path.clone()))
                }
            }
        }
    }

    fn backcolor(&self) -> Color {
        match self {
            StimulusKind::Text(p) | StimulusKind::Multiline(p) => p.backcolor,
            StimulusKind::Circle(p) => p.backcolor,
            StimulusKind::Image(p) => p.backcolor,
        }
    }

    fn layout<C: Canvas>(&self, canvas: &mut C) -> Result<Layout> {
        let (w, h) = canvas.size();
        let (w, h) = (w as i32, h as i32);
        match self {
            StimulusKind::Text(p) => {
                let (tw, th) = canvas.measure_text(&p.message, p.font_size);
                Ok(Layout::Text {
                    pos: ((w - tw as i32) / 2, (h - th as i32) / 2),
                })
            }
            StimulusKind::Multiline(p) => {
                let measured: Vec<(&str, (u32, u32))> = p
                    .message
                    .split('\n')
                    .map(|line| (line, canvas.measure_text(line, p.font_size)))
                    .collect();
                let max_h = measured.iter().map(|(_, (_, lh))| *lh).max().unwrap_or(0) as i32;
                let sum_h: i32 = measured.iter().map(|(_, (_, lh))| *lh as i32).sum();
                let upper = (h - sum_h) / 2;
                let lines = measured
                    .into_iter()
                    .enumerate()
                    .map(|(i, (line, (lw, _)))| {
                        (line.to_string(), ((w - lw as i32) / 2, upper + max_h * i as i32))
                    })
                    .collect();
                Ok(Layout::Multiline { lines })
            }
            StimulusKind::Circle(p) => Ok(Layout::Circle {
                center: (w / 2 + p.offset, h / 2),
            }),
            StimulusKind::Image(p) => {
                let image = canvas.load_image(&p.path)?;
                let image = if p.fullscreen {
                    match canvas.scale_image(image, w as u32, h as u32) {
                        Ok(scaled) => scaled,
                        Err(err) => {
                            warn!(
                                "unable to scale {} to fullscreen: {err:#}",
                                p.path.display()
                            );
                            image
                        }
                    }
                } else {
                    image
                };
                let (iw, ih) = canvas.image_size(image);
                Ok(Layout::Image {
                    image,
                    pos: ((w - iw as i32) / 2, (h - ih as i32) / 2),
                })
            }
        }
    }

    fn draw<C: Canvas>(&self, layout: &Layout, canvas: &mut C) {
        canvas.clear(self.backcolor());
        match (self, layout) {
            (StimulusKind::Text(p), Layout::Text { pos }) => {
                canvas.draw_text(&p.message, *pos, p.font_size, p.color);
            }
            (StimulusKind::Multiline(p), Layout::Multiline { lines }) => {
                for (line, pos) in lines {
                    canvas.draw_text(line, *pos, p.font_size, p.color);
                }
            }
            (StimulusKind::Circle(p), Layout::Circle { center }) => {
                canvas.fill_circle(*center, p.radius, p.color);
            }
            (StimulusKind::Image(_), Layout::Image { image, pos }) => {
                canvas.draw_image(*image, *pos);
            }
            _ => {}
        }
    }
}

/// One short-lived stimulus: renders until its stopping condition or the
/// quit signal ends the polling loop.
#[derive(Debug, Clone)]
pub struct StimulusUnit {
    kind: StimulusKind,
    stop: StopCondition,
}

impl StimulusUnit {
    pub fn new(kind: StimulusKind, stop: StopCondition) -> Self {
        Self { kind, stop }
    }

    /// Blocks until a stopping condition is met. Returns `(None, None)`
    /// without rendering when parameters fail validation; a failure here
    /// is local and the caller proceeds as if no response was given.
    pub fn run<C, E, K>(&self, stage: &mut Stage<C, E, K>) -> UnitOutcome
    where
        C: Canvas,
        E: EventSource,
        K: Clock,
    {
        if let Err(err) = self.kind.validate() {
            warn!("invalid stimulus parameters: {err}");
            return UnitOutcome::invalid();
        }
        let layout = match self.kind.layout(&mut stage.canvas) {
            Ok(layout) => layout,
            Err(err) => {
                warn!("stimulus setup failed: {err:#}");
                return UnitOutcome::invalid();
            }
        };

        let start = stage.clock.now();
        loop {
            match stage.events.poll() {
                Some(InputEvent::Quit) => {
                    return UnitOutcome::quit(stage.clock.elapsed(start));
                }
                Some(InputEvent::Key(ch)) if self.stop.accepts(ch) => {
                    return UnitOutcome::key(ch, stage.clock.elapsed(start));
                }
                _ => {}
            }

            if let Some(limit) = self.stop.time_limit {
                let elapsed = stage.clock.elapsed(start);
                if elapsed > limit {
                    return UnitOutcome::timeout(elapsed);
                }
            }

            self.kind.draw(&layout, &mut stage.canvas);
            stage.canvas.present();

            if !stage.poll_interval.is_zero() {
                stage.clock.sleep(stage.poll_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_core::EventQueue;
    use reflex_render::NullCanvas;
    use reflex_timing::ManualClock;
    use std::time::Duration;

    fn stage(canvas: NullCanvas) -> Stage<NullCanvas, EventQueue, ManualClock> {
        Stage::new(canvas, EventQueue::new(), ManualClock::new(Duration::from_millis(10)))
    }

    #[test]
    fn matching_key_stops_the_unit() {
        let mut stage = stage(NullCanvas::new(640, 480));
        stage.events.push(InputEvent::Key('u'));
        let unit = StimulusUnit::new(
            StimulusKind::Circle(CircleParams::default()),
            StopCondition::keys_or_timeout(['u', 'i'], Duration::from_secs(6)),
        );
        let outcome = unit.run(&mut stage);
        assert_eq!(outcome.response, Some('u'));
        assert!(!outcome.quit);
        assert!(outcome.elapsed.is_some());
    }

    #[test]
    fn non_matching_key_is_discarded() {
        let mut stage = stage(NullCanvas::new(640, 480));
        stage.events.push(InputEvent::Key('z'));
        let unit = StimulusUnit::new(
            StimulusKind::Circle(CircleParams::default()),
            StopCondition::keys_or_timeout(['u'], Duration::from_millis(200)),
        );
        let outcome = unit.run(&mut stage);
        assert!(outcome.timed_out());
    }

    #[test]
    fn timeout_reports_elapsed_time() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Text(TextParams::new(" ")),
            StopCondition::time_limit(Duration::from_secs(1)),
        );
        let outcome = unit.run(&mut stage);
        assert!(outcome.timed_out());
        assert!(outcome.elapsed.unwrap() > Duration::from_secs(1));
        assert!(stage.canvas.presents > 0);
    }

    #[test]
    fn quit_signal_overrides_everything() {
        let mut stage = stage(NullCanvas::new(640, 480));
        stage.events.push(InputEvent::Quit);
        let unit = StimulusUnit::new(
            StimulusKind::Text(TextParams::new("message")),
            StopCondition::none(),
        );
        let outcome = unit.run(&mut stage);
        assert!(outcome.quit);
        assert_eq!(outcome.response, None);
    }

    #[test]
    fn empty_message_never_renders() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Text(TextParams::new("")),
            StopCondition::time_limit(Duration::from_secs(1)),
        );
        let outcome = unit.run(&mut stage);
        assert_eq!(outcome, UnitOutcome::invalid());
        assert_eq!(stage.canvas.clears, 0);
        assert_eq!(stage.canvas.presents, 0);
    }

    #[test]
    fn missing_image_never_renders() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Image(ImageParams::new("/no/such/file.png")),
            StopCondition::time_limit(Duration::from_secs(1)),
        );
        let outcome = unit.run(&mut stage);
        assert_eq!(outcome, UnitOutcome::invalid());
        assert_eq!(stage.canvas.presents, 0);
    }

    #[test]
    fn scale_failure_falls_back_to_unscaled() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut canvas = NullCanvas::new(640, 480).with_image_size(100, 50);
        canvas.fail_scaling = true;
        let mut stage = stage(canvas);
        let unit = StimulusUnit::new(
            StimulusKind::Image(ImageParams {
                fullscreen: true,
                ..ImageParams::new(file.path())
            }),
            StopCondition::time_limit(Duration::from_millis(100)),
        );
        let outcome = unit.run(&mut stage);
        assert!(outcome.timed_out());
        assert!(stage.canvas.draws > 0);
    }

    #[test]
    fn single_line_text_is_centered() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Text(TextParams {
                font_size: 40.0,
                ..TextParams::new("ab")
            }),
            StopCondition::time_limit(Duration::from_millis(50)),
        );
        unit.run(&mut stage);
        // NullCanvas metrics: "ab" at 40px measures 40x40.
        assert_eq!(stage.canvas.text_draws[0], ("ab".to_string(), (300, 220)));
    }

    #[test]
    fn multiline_block_centers_as_a_unit() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Multiline(TextParams {
                font_size: 40.0,
                ..TextParams::new("ab\ncd")
            }),
            StopCondition::time_limit(Duration::from_millis(50)),
        );
        unit.run(&mut stage);
        // Two 40px lines: block top at (480-80)/2, advance by the tallest.
        assert_eq!(stage.canvas.text_draws[0], ("ab".to_string(), (300, 200)));
        assert_eq!(stage.canvas.text_draws[1], ("cd".to_string(), (300, 240)));
    }

    #[test]
    fn circle_offset_shifts_along_x() {
        let mut stage = stage(NullCanvas::new(640, 480));
        let unit = StimulusUnit::new(
            StimulusKind::Circle(CircleParams {
                offset: -60,
                ..CircleParams::default()
            }),
            StopCondition::time_limit(Duration::from_millis(50)),
        );
        unit.run(&mut stage);
        assert_eq!(stage.canvas.circle_draws[0], (260, 240));
    }
}
