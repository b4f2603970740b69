//! Browser bridge. The page owns the canvas, the `<audio>` elements and the
//! DOM widgets; this crate owns the engine and tells the page what to do.
//!
//! Everything crosses the boundary as JSON: the page draws the
//! `commands` of each frame and applies the `ops` (widget and audio
//! changes) in order.

use danmaku_core::{
    AnchoredComment, BufferedHost, Callbacks, Engine, EngineConfig, PlaybackSync, Submission,
    TextMeasure,
};
use danmaku_protocol::{
    AudioHandle, HostOp, ItemId, Point, RenderCommand, Viewport, WidgetEvent, WidgetHandle,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod console;

#[wasm_bindgen(start)]
pub fn start() {
    // Redirect tracing/panics to console
    console_error_panic_hook::set_once();
    let _ = tracing_subscriber::fmt()
        .with_writer(console::MakeConsoleWriter)
        .without_time()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Calls back into `CanvasRenderingContext2D.measureText` on the page.
struct JsMeasure {
    measure: js_sys::Function,
}

impl TextMeasure for JsMeasure {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.measure
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(text),
                &JsValue::from_f64(font_size),
            )
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }
}

#[derive(Serialize)]
struct Frame {
    commands: Option<Vec<RenderCommand>>,
    ops: Vec<HostOp>,
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn id_callback(f: js_sys::Function) -> impl FnMut(&ItemId) + 'static {
    move |id: &ItemId| {
        if let Err(err) = f.call1(&JsValue::NULL, &JsValue::from_str(id.as_str())) {
            tracing::warn!(?err, %id, "card callback threw");
        }
    }
}

/// One overlay per player view.
#[wasm_bindgen]
pub struct DanmakuPlayer {
    engine: Engine<BufferedHost<JsMeasure>>,
    sync: PlaybackSync,
    comments: Vec<AnchoredComment>,
}

#[wasm_bindgen]
impl DanmakuPlayer {
    /// `config_json` may be empty for defaults. `measure(text, fontSize)`
    /// must return the rendered width in CSS pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, measure: js_sys::Function) -> Result<DanmakuPlayer, JsError> {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json).map_err(js_err)?
        };
        let sync = PlaybackSync::new(config.sync.clone());
        Ok(Self {
            engine: Engine::new(config, BufferedHost::new(JsMeasure { measure })),
            sync,
            comments: Vec::new(),
        })
    }

    pub fn init(&mut self, width: f64, height: f64, dpr: f64) {
        let mut viewport = Viewport::new(width, height);
        if dpr.is_finite() && dpr > 0.0 {
            viewport.dpr = dpr;
        }
        self.engine.init(viewport);
    }

    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Admit one comment right away (e.g. the viewer's own post).
    pub fn submit(&mut self, submission_json: &str) -> Result<u64, JsError> {
        let submission: Submission = serde_json::from_str(submission_json).map_err(js_err)?;
        if let Some(id) = &submission.id {
            self.sync.mark_shown(id.clone());
        }
        Ok(self.engine.submit(submission).0)
    }

    #[wasm_bindgen(js_name = updatePopularity)]
    pub fn update_popularity(&mut self, id: &str, count: u32, liked: Option<bool>) -> bool {
        self.engine.update_popularity(&ItemId::from(id), count, liked)
    }

    #[wasm_bindgen(js_name = setCallbacks)]
    pub fn set_callbacks(
        &mut self,
        on_like: Option<js_sys::Function>,
        on_report: Option<js_sys::Function>,
        on_delete: Option<js_sys::Function>,
    ) {
        let mut callbacks = Callbacks::new();
        if let Some(f) = on_like {
            callbacks = callbacks.on_like(id_callback(f));
        }
        if let Some(f) = on_report {
            callbacks = callbacks.on_report(id_callback(f));
        }
        if let Some(f) = on_delete {
            callbacks = callbacks.on_delete(id_callback(f));
        }
        self.engine.set_callbacks(callbacks);
    }

    /// Run one frame. Returns `{ commands, ops }` as JSON; `commands` is
    /// null once the engine is stopped.
    pub fn tick(&mut self, now_ms: f64) -> Result<String, JsError> {
        let commands = self.engine.tick(now_ms);
        let ops = self.engine.host_mut().drain();
        serde_json::to_string(&Frame { commands, ops }).map_err(js_err)
    }

    /// Widget and audio operations queued outside of `tick` (after pointer
    /// events or card actions), as a JSON array.
    #[wasm_bindgen(js_name = drainOps)]
    pub fn drain_ops(&mut self) -> Result<String, JsError> {
        serde_json::to_string(&self.engine.host_mut().drain()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.engine.pointer_move(Point::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.engine.pointer_leave();
    }

    /// `event_json` is a `WidgetEvent`, e.g. `{"type":"action","action":"like"}`.
    #[wasm_bindgen(js_name = widgetEvent)]
    pub fn widget_event(&mut self, handle: u32, event_json: &str) -> Result<(), JsError> {
        let event: WidgetEvent = serde_json::from_str(event_json).map_err(js_err)?;
        self.engine.widget_event(WidgetHandle(handle), event);
        Ok(())
    }

    #[wasm_bindgen(js_name = audioEnded)]
    pub fn audio_ended(&mut self, handle: u32) {
        self.engine.audio_ended(AudioHandle(handle));
    }

    // --- Playback sync ---

    /// Replace the time-anchored comment list. Returns how many were loaded.
    #[wasm_bindgen(js_name = loadComments)]
    pub fn load_comments(&mut self, comments_json: &str) -> Result<usize, JsError> {
        self.comments = serde_json::from_str(comments_json).map_err(js_err)?;
        Ok(self.comments.len())
    }

    /// Media `timeupdate`, in seconds. Returns how many comments were admitted.
    #[wasm_bindgen(js_name = timeUpdate)]
    pub fn time_update(&mut self, current_time: f64) -> usize {
        self.sync.advance(&mut self.engine, current_time, &self.comments)
    }

    pub fn seek(&mut self, current_time: f64) {
        self.sync.seek(&mut self.engine, current_time);
    }

    #[wasm_bindgen(js_name = setPlaying)]
    pub fn set_playing(&mut self, playing: bool) {
        self.sync.set_playing(&mut self.engine, playing);
    }

    #[wasm_bindgen(js_name = markShown)]
    pub fn mark_shown(&mut self, id: &str) {
        self.sync.mark_shown(ItemId::from(id));
    }
}
