use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use pixels::{Pixels, SurfaceTexture};
use reflex_core::{InputEvent, EventSource};
use reflex_render::{Canvas, ImageId, SkiaCanvas};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::{Fullscreen, Window, WindowId};

/// Winit-side state: owns the window until `open` hands its pieces out,
/// and keeps translating raw input into engine events afterwards.
struct Host {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    queue: VecDeque<InputEvent>,
    shift: bool,
    requested: PhysicalSize<u32>,
    fullscreen: bool,
}

impl Host {
    fn translate(&self, key: &Key) -> Option<InputEvent> {
        match key {
            Key::Named(NamedKey::Space) => Some(InputEvent::Key(' ')),
            Key::Character(text) => {
                let ch = text.chars().next()?;
                // Shift+X is the reserved force-quit chord.
                if self.shift && ch.eq_ignore_ascii_case(&'x') {
                    Some(InputEvent::Quit)
                } else {
                    Some(InputEvent::Key(ch.to_ascii_lowercase()))
                }
            }
            _ => None,
        }
    }
}

impl ApplicationHandler for Host {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let mut attrs = Window::default_attributes()
            .with_title("Reflex")
            .with_resizable(false);
        attrs = if self.fullscreen {
            attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
        } else {
            attrs.with_inner_size(self.requested)
        };
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                window.set_cursor_visible(false);
                let size = window.inner_size();
                let surface = SurfaceTexture::new(size.width, size.height, window.clone());
                match Pixels::new(size.width, size.height, surface) {
                    Ok(pixels) => {
                        self.pixels = Some(pixels);
                        self.window = Some(window);
                    }
                    Err(err) => error!("unable to create a pixel surface: {err}"),
                }
            }
            Err(err) => error!("unable to create a window: {err}"),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.queue.push_back(InputEvent::Quit),
            WindowEvent::ModifiersChanged(mods) => self.shift = mods.state().shift_key(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                if let Some(translated) = self.translate(&event.logical_key) {
                    self.queue.push_back(translated);
                }
            }
            _ => {}
        }
    }
}

/// Canvas half of the display: draws offscreen through tiny-skia and
/// presents by copying the frame into the pixels surface.
pub struct WindowCanvas {
    skia: SkiaCanvas,
    pixels: Pixels<'static>,
    window: Arc<Window>,
}

/// Event half of the display: pumps winit once per poll, non-blocking.
pub struct WindowEvents {
    event_loop: EventLoop<()>,
    host: Host,
}

/// Creates the window and splits it into the engine's two surfaces.
pub fn open(
    width: u32,
    height: u32,
    fullscreen: bool,
    font: FontArc,
) -> Result<(WindowCanvas, WindowEvents)> {
    let mut event_loop = EventLoop::new().context("unable to create the event loop")?;
    let mut host = Host {
        window: None,
        pixels: None,
        queue: VecDeque::new(),
        shift: false,
        requested: PhysicalSize::new(width, height),
        fullscreen,
    };
    for _ in 0..200 {
        let _ = event_loop.pump_app_events(Some(Duration::ZERO), &mut host);
        if host.window.is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let window = host
        .window
        .clone()
        .ok_or_else(|| anyhow!("the display never came up"))?;
    let pixels = host
        .pixels
        .take()
        .ok_or_else(|| anyhow!("no pixel surface was created"))?;
    let size = window.inner_size();
    info!("display ready at {}x{}", size.width, size.height);
    let skia = SkiaCanvas::new(size.width, size.height, font)?;
    Ok((
        WindowCanvas {
            skia,
            pixels,
            window,
        },
        WindowEvents { event_loop, host },
    ))
}

impl Canvas for WindowCanvas {
    fn size(&self) -> (u32, u32) {
        self.skia.size()
    }

    fn clear(&mut self, color: reflex_core::Color) {
        self.skia.clear(color);
    }

    fn measure_text(&self, text: &str, size: f32) -> (u32, u32) {
        self.skia.measure_text(text, size)
    }

    fn draw_text(&mut self, text: &str, top_left: (i32, i32), size: f32, color: reflex_core::Color) {
        self.skia.draw_text(text, top_left, size, color);
    }

    fn load_image(&mut self, path: &Path) -> Result<ImageId> {
        self.skia.load_image(path)
    }

    fn image_size(&self, image: ImageId) -> (u32, u32) {
        self.skia.image_size(image)
    }

    fn scale_image(&mut self, image: ImageId, width: u32, height: u32) -> Result<ImageId> {
        self.skia.scale_image(image, width, height)
    }

    fn draw_image(&mut self, image: ImageId, top_left: (i32, i32)) {
        self.skia.draw_image(image, top_left);
    }

    fn fill_circle(&mut self, center: (i32, i32), radius: u32, color: reflex_core::Color) {
        self.skia.fill_circle(center, radius, color);
    }

    fn present(&mut self) {
        self.pixels.frame_mut().copy_from_slice(self.skia.data());
        if let Err(err) = self.pixels.render() {
            error!("frame presentation failed: {err}");
        }
    }
}

impl Drop for WindowCanvas {
    fn drop(&mut self) {
        self.window.set_cursor_visible(true);
    }
}

impl EventSource for WindowEvents {
    fn poll(&mut self) -> Option<InputEvent> {
        let _ = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.host);
        self.host.queue.pop_front()
    }
}
