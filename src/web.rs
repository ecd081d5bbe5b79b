//! Browser host
//!
//! `FlappyGame` binds a canvas, drives `requestAnimationFrame` and forwards
//! DOM input to the session. The overlay is written into DOM elements the
//! embedding page provides (all optional):
//!
//! - `flappy-score`, `flappy-best`, `flappy-prompt`
//! - `flappy-summary` with `flappy-final-score`, `flappy-summary-best`,
//!   `flappy-new-record`, `flappy-saving`, `flappy-save-failed`,
//!   `flappy-retry`

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, EventTarget, HtmlCanvasElement, KeyboardEvent};

use crate::audio::{self, AudioManager};
use crate::consts::SIM_DT;
use crate::platform::{HostAction, InputSource, dispatch};
use crate::renderer::{Overlay, RenderState};
use crate::scores::{ScoreBook, ScoreSubmitter, SharedScoreBook, SubmitError, SubmitTicket};
use crate::session::Session;
use crate::settings::{QualityPreset, Settings};
use crate::tuning::Tuning;

/// Player id for scores kept on this device
const LOCAL_USER: &str = "local";

/// Hands final scores to the page's `onGameOver(score) -> Promise`
struct JsSubmitter {
    callback: js_sys::Function,
}

impl ScoreSubmitter for JsSubmitter {
    fn submit(&mut self, score: u32, ticket: SubmitTicket) {
        let callback = self.callback.clone();
        // Off the current call stack: the page may call back into the game
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match callback.call1(&JsValue::NULL, &JsValue::from(score)) {
                Ok(value) => JsFuture::from(js_sys::Promise::resolve(&value))
                    .await
                    .map(|_| ())
                    .map_err(rejection),
                Err(e) => Err(rejection(e)),
            };
            ticket.complete(outcome);
        });
    }
}

fn rejection(e: JsValue) -> SubmitError {
    SubmitError::Rejected(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// A registered DOM listener, kept so it can be removed on close
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn remove(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Everything the page-facing handle shares with its callbacks
struct Host {
    session: Session,
    render_state: Option<RenderState>,
    audio: AudioManager,
    document: Document,
    last_time: f64,
    raf_id: Option<i32>,
    frame_cb: Option<Closure<dyn FnMut(f64)>>,
    listeners: Vec<Listener>,
    last_overlay: Option<Overlay>,
    /// Device score book when the page supplied no callback
    book: Option<SharedScoreBook>,
}

impl Host {
    fn act(&mut self, action: HostAction) {
        match action {
            HostAction::Close => self.close(),
            HostAction::Impulse => {
                // First gesture unlocks audio
                self.audio.resume();
                dispatch(&mut self.session, action);
            }
            HostAction::Retry => {
                dispatch(&mut self.session, action);
                self.refresh_best();
            }
        }
    }

    /// Pick up runs the device book recorded since the last refresh
    fn refresh_best(&mut self) {
        if let Some(book) = &self.book {
            let best = self.session.personal_best().max(book.own_best());
            self.session.set_personal_best(best);
        }
    }

    /// One animation frame: simulate, play cues, draw
    fn step(&mut self, time: f64) {
        let dt = if self.last_time > 0.0 {
            ((time - self.last_time) / 1000.0) as f32
        } else {
            SIM_DT
        };
        self.last_time = time;

        self.session.advance(dt);

        let events = self.session.drain_events();
        if !events.is_empty() {
            let new_record = self.session.summary().is_some_and(|s| s.new_record);
            for cue in audio::cues(&events, new_record) {
                self.audio.play(cue);
            }
        }

        let frame = self.session.frame();
        if let Some(render_state) = self.render_state.as_mut() {
            match render_state.render(&frame.vertices) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        if self.last_overlay != Some(frame.overlay) {
            update_hud(&self.document, &frame.overlay);
            self.last_overlay = Some(frame.overlay);
        }
    }

    fn close(&mut self) {
        if self.session.is_closed() && self.frame_cb.is_none() {
            return;
        }
        self.session.close();

        if let (Some(id), Some(window)) = (self.raf_id.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
        for listener in &self.listeners {
            listener.remove();
        }
        self.audio.close();

        // The closing callback may be one of these; free them after it returns
        let listeners = std::mem::take(&mut self.listeners);
        let frame_cb = self.frame_cb.take();
        wasm_bindgen_futures::spawn_local(async move {
            drop(listeners);
            drop(frame_cb);
        });
        log::info!("Flappy Pinta detached");
    }
}

/// Page-facing game handle
#[wasm_bindgen]
pub struct FlappyGame {
    host: Rc<RefCell<Host>>,
}

#[wasm_bindgen]
impl FlappyGame {
    /// Bind a game to the canvas with id `canvas_id`
    ///
    /// Without `on_game_over` scores go to the device's LocalStorage score
    /// book. `tuning_json` overrides physics constants; invalid values are
    /// rejected here.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        personal_best: u32,
        on_game_over: Option<js_sys::Function>,
        tuning_json: Option<String>,
    ) -> Result<FlappyGame, JsValue> {
        console_error_panic_hook::set_once();
        // A second game on the same page finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str(&format!("#{} is not a canvas", canvas_id)))?;

        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => Tuning::default(),
        };
        let settings = Settings::load();

        let (submitter, book): (Box<dyn ScoreSubmitter>, _) = match on_game_over {
            Some(callback) => (Box::new(JsSubmitter { callback }), None),
            None => {
                let book = SharedScoreBook::new(ScoreBook::load(LOCAL_USER));
                (Box::new(book.clone()), Some(book))
            }
        };
        let personal_best = book
            .as_ref()
            .map_or(personal_best, |b| personal_best.max(b.own_best()));

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(tuning, settings, personal_best, seed, submitter)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        // Backing store in device pixels, geometry stays in game pixels
        let dpr = window.device_pixel_ratio();
        let css_w = match canvas.client_width() {
            0 => session.tuning().width as f64,
            w => w as f64,
        };
        let css_h = match canvas.client_height() {
            0 => session.tuning().height as f64,
            h => h as f64,
        };
        let width = (css_w * dpr) as u32;
        let height = (css_h * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let viewport = (session.tuning().width, session.tuning().height);

        let audio = AudioManager::new(session.settings().effective_volume());
        let host = Rc::new(RefCell::new(Host {
            session,
            render_state: None,
            audio,
            document: document.clone(),
            last_time: 0.0,
            raf_id: None,
            frame_cb: None,
            listeners: Vec::new(),
            last_overlay: None,
            book,
        }));

        bind_input(&host, &window, &document, &canvas);
        spawn_renderer(Rc::downgrade(&host), canvas, width, height, viewport);
        schedule(&host);

        log::info!("Flappy Pinta attached to #{} (seed {})", canvas_id, seed);
        Ok(FlappyGame { host })
    }

    /// Same as a tap on the canvas
    pub fn request_impulse(&self) {
        self.host.borrow_mut().act(HostAction::Impulse);
    }

    /// Start without flapping
    pub fn start(&self) {
        self.host.borrow_mut().session.start();
    }

    /// Back to Idle after a run ended
    pub fn reset(&self) {
        self.host.borrow_mut().act(HostAction::Retry);
    }

    /// Detach from the page; the handle is inert afterwards
    pub fn close(&self) {
        self.host.borrow_mut().close();
    }

    pub fn set_personal_best(&self, best: u32) {
        self.host.borrow_mut().session.set_personal_best(best);
    }

    /// Current score of the run
    pub fn score(&self) -> u32 {
        self.host.borrow().session.score()
    }

    pub fn set_muted(&self, muted: bool) {
        let mut host = self.host.borrow_mut();
        let mut settings = host.session.settings().clone();
        settings.muted = muted;
        host.audio.set_volume(settings.effective_volume());
        settings.save();
        host.session.apply_settings(settings);
    }

    /// Switch quality preset ("low", "medium", "high")
    pub fn set_quality(&self, preset: &str) -> Result<(), JsValue> {
        let preset = QualityPreset::parse(preset)
            .ok_or_else(|| JsValue::from_str(&format!("unknown quality preset: {}", preset)))?;
        let mut host = self.host.borrow_mut();
        let mut settings = host.session.settings().clone();
        settings.apply_preset(preset);
        settings.save();
        host.session.apply_settings(settings);
        Ok(())
    }
}

impl Drop for FlappyGame {
    fn drop(&mut self) {
        if let Ok(mut host) = self.host.try_borrow_mut() {
            host.close();
        }
    }
}

fn schedule(host: &Rc<RefCell<Host>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut guard = host.borrow_mut();
    let h = &mut *guard;
    if h.session.is_closed() {
        return;
    }
    let cb = h.frame_cb.get_or_insert_with(|| {
        let weak = Rc::downgrade(host);
        Closure::new(move |time: f64| {
            if let Some(host) = weak.upgrade() {
                on_frame(&host, time);
            }
        })
    });
    h.raf_id = window
        .request_animation_frame(cb.as_ref().unchecked_ref())
        .ok();
}

fn on_frame(host: &Rc<RefCell<Host>>, time: f64) {
    {
        let mut h = host.borrow_mut();
        h.raf_id = None;
        if h.session.is_closed() {
            return;
        }
        h.step(time);
    }
    schedule(host);
}

fn listen(
    host: &Rc<RefCell<Host>>,
    target: &EventTarget,
    kind: &'static str,
    handler: impl FnMut(&mut Host, web_sys::Event) + 'static,
) {
    let weak = Rc::downgrade(host);
    let mut handler = handler;
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if let Some(host) = weak.upgrade() {
            if let Ok(mut h) = host.try_borrow_mut() {
                handler(&mut *h, event);
            }
        }
    });
    if target
        .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
        .is_err()
    {
        log::warn!("Could not listen for {}", kind);
        return;
    }
    host.borrow_mut().listeners.push(Listener {
        target: target.clone(),
        kind,
        closure,
    });
}

fn bind_input(
    host: &Rc<RefCell<Host>>,
    window: &web_sys::Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) {
    listen(host, canvas, "pointerdown", |h, event| {
        event.prevent_default();
        if let Some(action) = InputSource::PointerDown.action() {
            h.act(action);
        }
    });
    listen(host, canvas, "touchstart", |h, event| {
        event.prevent_default();
        if let Some(action) = InputSource::TouchStart.action() {
            h.act(action);
        }
    });
    listen(host, window, "keydown", |h, event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if key.repeat() {
            return;
        }
        let code = key.code();
        if let Some(action) = InputSource::Key(&code).action() {
            // Keep Space/ArrowUp from scrolling the page
            event.prevent_default();
            h.act(action);
        }
    });
    if let Some(retry) = document.get_element_by_id("flappy-retry") {
        listen(host, &retry, "click", |h, _event| {
            h.act(HostAction::Retry);
        });
    }
}

fn spawn_renderer(
    host: Weak<RefCell<Host>>,
    canvas: HtmlCanvasElement,
    width: u32,
    height: u32,
    viewport: (f32, f32),
) {
    wasm_bindgen_futures::spawn_local(async move {
        match init_renderer(canvas, width, height, viewport).await {
            Ok(render_state) => {
                if let Some(host) = host.upgrade() {
                    let mut h = host.borrow_mut();
                    if !h.session.is_closed() {
                        h.render_state = Some(render_state);
                    }
                }
            }
            Err(e) => log::error!("Renderer unavailable: {}", e),
        }
    });
}

async fn init_renderer(
    canvas: HtmlCanvasElement,
    width: u32,
    height: u32,
    viewport: (f32, f32),
) -> Result<RenderState, String> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
        ..Default::default()
    });
    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
        .map_err(|e| e.to_string())?;
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| e.to_string())?;

    log::info!("Using adapter: {:?}", adapter.get_info().name);

    RenderState::new(surface, &adapter, width, height, viewport)
        .await
        .map_err(|e| e.to_string())
}

fn show(document: &Document, id: &str, visible: bool) {
    if let Some(el) = document.get_element_by_id(id) {
        let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
    }
}

fn set_text(document: &Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

/// Update HUD elements in DOM
fn update_hud(document: &Document, overlay: &Overlay) {
    show(document, "flappy-prompt", overlay.prompt);

    show(document, "flappy-score", overlay.score.is_some());
    if let Some(score) = overlay.score {
        set_text(document, "flappy-score", &score.to_string());
    }
    set_text(document, "flappy-best", &overlay.personal_best.to_string());

    show(document, "flappy-summary", overlay.summary.is_some());
    if let Some(summary) = overlay.summary {
        set_text(document, "flappy-final-score", &summary.final_score.to_string());
        set_text(document, "flappy-summary-best", &summary.personal_best.to_string());
        show(document, "flappy-new-record", summary.new_record);
        show(document, "flappy-saving", summary.saving);
        show(document, "flappy-save-failed", summary.save_failed);
        show(document, "flappy-retry", summary.retry);
    }
}
