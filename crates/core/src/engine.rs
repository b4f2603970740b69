use danmaku_protocol::{ItemKey, RenderCommand, SharedStr, Viewport, WidgetSpec};
use tracing::{debug, warn};

use crate::card::{Callbacks, Toast};
use crate::config::EngineConfig;
use crate::host::Host;
use crate::interaction::Interaction;
use crate::item::{ItemKind, OverlayItem, Submission, VoiceAttachment};
use crate::lane::LaneTable;
use crate::layout;
use crate::render;

/// One overlay engine per player view.
///
/// The engine owns its lane table and live items exclusively; hosts change
/// them only through the methods here. Nothing blocks and nothing runs on
/// its own: a host driver calls [`Engine::tick`] once per display frame and
/// forwards pointer and widget events in between.
pub struct Engine<H> {
    pub(crate) config: EngineConfig,
    pub(crate) host: H,
    pub(crate) viewport: Viewport,
    pub(crate) lanes: LaneTable,
    pub(crate) items: Vec<OverlayItem>,
    next_key: u64,
    running: bool,
    paused: bool,
    pub(crate) now_ms: f64,
    pub(crate) interaction: Interaction,
    pub(crate) toast: Option<Toast>,
    pub(crate) callbacks: Callbacks,
}

impl<H: Host> Engine<H> {
    pub fn new(config: EngineConfig, host: H) -> Self {
        let lanes = LaneTable::new(
            config.lane_height,
            config.lane_margin,
            config.lane_fallback_ms,
        );
        Self {
            config,
            host,
            viewport: Viewport::default(),
            lanes,
            items: Vec::new(),
            next_key: 0,
            running: false,
            paused: false,
            now_ms: 0.0,
            interaction: Interaction::default(),
            toast: None,
            callbacks: Callbacks::default(),
        }
    }

    // --- Lifecycle ---

    /// Measure the surface and rebuild the lanes. Call again on resize;
    /// items already in flight keep their old lanes.
    pub fn init(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.lanes.resize(viewport.height);
        debug!(
            width = viewport.width,
            height = viewport.height,
            lanes = self.lanes.len(),
            "overlay engine initialized"
        );
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop producing frames. Live items and their widgets stay until
    /// [`Engine::clear`].
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Freeze all motion; rendering continues.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drop every live item, releasing its audio and widgets, and forget
    /// all lane admissions.
    pub fn clear(&mut self) {
        let released = self.items.len();
        for mut item in self.items.drain(..) {
            item.voice.release(&mut self.host);
        }
        self.end_hover();
        self.lanes.reset();
        if released > 0 {
            debug!(released, "cleared overlay items");
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn lanes(&self) -> &LaneTable {
        &self.lanes
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Live items, oldest first (later items paint on top).
    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn item(&self, key: ItemKey) -> Option<&OverlayItem> {
        self.items.iter().find(|i| i.key == key)
    }

    pub(crate) fn item_mut(&mut self, key: ItemKey) -> Option<&mut OverlayItem> {
        self.items.iter_mut().find(|i| i.key == key)
    }

    /// Clock value of the most recent tick, in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    // --- Admission ---

    /// Lay out a new comment and admit it at the right edge.
    ///
    /// Never fails: empty text gives a zero-width item, a missing audio
    /// resource gives a voice item without a play button, and a full lane
    /// table overlaps lane 0.
    pub fn submit(&mut self, submission: Submission) -> ItemKey {
        let Submission {
            text,
            color,
            kind,
            popularity,
            id,
            liked,
            owned,
        } = submission;

        let size = self.config.size_for(popularity);
        let wrapped = layout::wrap_text(&text, size, self.config.max_line_width, &self.host);
        let mut bounding_width = layout::block_width(&wrapped, size, &self.host);
        let lines: Vec<SharedStr> = wrapped.into_iter().map(SharedStr::from).collect();
        if matches!(kind, ItemKind::Voice { .. }) {
            bounding_width += self.config.voice_allowance;
        }

        let key = ItemKey(self.next_key);
        self.next_key += 1;
        let lane = self
            .lanes
            .allocate(key, bounding_width, self.viewport.width, self.now_ms);

        let mut item = OverlayItem {
            key,
            id,
            text: SharedStr::from(text),
            lines,
            color,
            kind,
            voice: VoiceAttachment::default(),
            x: self.viewport.width,
            lane,
            baseline: layout::baseline_for(lane, self.config.lane_height, size),
            size,
            bounding_width,
            popularity,
            liked,
            owned,
            is_paused: false,
        };

        if let ItemKind::Voice { audio_reference } = &item.kind
            && !audio_reference.is_empty()
        {
            let url = self.config.resolve_resource_url(audio_reference);
            match self.host.open(&url) {
                Ok(audio) => {
                    item.voice.audio = Some(audio);
                    let button = self.host.create(WidgetSpec::VoiceButton {
                        item: key,
                        playing: false,
                        size: self.config.voice_button_size,
                    });
                    self.host.reposition(button, item.button_origin(&self.config));
                    item.voice.button = Some(button);
                }
                Err(err) => warn!(%url, %err, "voice comment audio unavailable"),
            }
        }

        debug!(
            key = key.0,
            lane,
            width = bounding_width,
            lines = item.lines.len(),
            "admitted overlay item"
        );
        self.items.push(item);
        key
    }

    // --- Frame ---

    /// Advance the clock to `now_ms` and, if running, produce one frame.
    ///
    /// Moves every item not paused (globally or by hover) left by `speed`,
    /// keeps voice buttons glued to their text, draws, and culls items whose
    /// trailing edge has passed the left border. Returns `None` while
    /// stopped; the driver should stop scheduling once
    /// [`Engine::is_running`] is false.
    pub fn tick(&mut self, now_ms: f64) -> Option<Vec<RenderCommand>> {
        if now_ms.is_finite() {
            self.now_ms = now_ms;
        }
        self.expire_toast();
        if !self.running {
            return None;
        }

        let mut commands = Vec::with_capacity(self.items.len() * 3 + 1);
        commands.push(RenderCommand::Clear {
            width: self.viewport.width,
            height: self.viewport.height,
        });

        let globally_paused = self.paused;
        let mut culled = Vec::new();
        let Self {
            items,
            lanes,
            host,
            config,
            ..
        } = self;
        items.retain_mut(|item| {
            if !globally_paused && !item.is_paused {
                item.x -= config.speed;
                lanes.track(item.lane, item.key, item.x);
            }
            if let Some(button) = item.voice.button {
                host.reposition(button, item.button_origin(config));
            }
            render::draw_item(item, config, &mut commands);

            let keep = item.is_visible();
            if !keep {
                item.voice.release(&mut *host);
                culled.push(item.key);
            }
            keep
        });

        for key in culled {
            debug!(key = key.0, "culled overlay item");
            if self.hovered_key() == Some(key) {
                self.end_hover();
            }
        }

        Some(commands)
    }

    fn expire_toast(&mut self) {
        if let Some(toast) = self.toast
            && self.now_ms >= toast.expires_at
        {
            self.host.destroy(toast.handle);
            self.toast = None;
        }
    }

    pub(crate) fn show_toast(&mut self) {
        if let Some(old) = self.toast.take() {
            self.host.destroy(old.handle);
        }
        let handle = self.host.create(WidgetSpec::Toast {
            message: SharedStr::from(self.config.toast_message.as_str()),
        });
        self.toast = Some(Toast {
            handle,
            expires_at: self.now_ms + self.config.toast_ms,
        });
    }

    pub fn toast_visible(&self) -> bool {
        self.toast.is_some()
    }
}
