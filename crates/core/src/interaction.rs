//! Hover hit-testing, the action card, and voice button events.
//!
//! Pointer and widget events arrive between frames. They flip pause flags
//! and show or hide widgets but never move items; only
//! [`Engine::tick`] touches positions.

use danmaku_protocol::{
    AudioHandle, CardAction, ItemId, ItemKey, Point, WidgetEvent, WidgetHandle, WidgetSpec,
};
use tracing::{debug, warn};

use crate::card::{self, Callbacks};
use crate::engine::Engine;
use crate::host::Host;
use crate::layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    None,
    Hovering(ItemKey),
}

#[derive(Debug, Default)]
pub(crate) struct Interaction {
    pub hover: HoverState,
    /// The pointer is directly over the action card.
    pub panel_focus: bool,
    pub card: Option<WidgetHandle>,
    /// Last pointer position over the surface, if any.
    pub pointer: Option<Point>,
}

impl<H: Host> Engine<H> {
    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }

    pub fn hover(&self) -> HoverState {
        self.interaction.hover
    }

    pub fn hovered_key(&self) -> Option<ItemKey> {
        match self.interaction.hover {
            HoverState::Hovering(key) => Some(key),
            HoverState::None => None,
        }
    }

    pub fn panel_focus(&self) -> bool {
        self.interaction.panel_focus
    }

    pub fn card_handle(&self) -> Option<WidgetHandle> {
        self.interaction.card
    }

    // --- Pointer ---

    pub fn pointer_move(&mut self, at: Point) {
        self.interaction.pointer = Some(at);
        self.update_hover();
    }

    /// The pointer left the drawing surface.
    pub fn pointer_leave(&mut self) {
        self.interaction.pointer = None;
        self.update_hover();
    }

    fn update_hover(&mut self) {
        let current = self.hovered_key();
        let pointer = self.interaction.pointer;

        // The padded card region keeps the hover while the pointer travels
        // from the text down to the card buttons.
        if let (Some(key), Some(p)) = (current, pointer)
            && let Some(item) = self.item(key)
            && item.hover_region(&self.config).contains(p)
        {
            return;
        }
        if current.is_some() && self.interaction.panel_focus {
            return;
        }

        let hit = pointer.and_then(|p| {
            self.items
                .iter()
                .rev()
                .find(|item| item.text_rect(&self.config).contains(p))
                .map(|item| item.key)
        });

        match (current, hit) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                self.leave(a);
                self.enter(b);
            }
            (None, Some(b)) => self.enter(b),
            (Some(a), None) => self.leave(a),
            (None, None) => {}
        }
    }

    fn enter(&mut self, key: ItemKey) {
        let Some(item) = self.item_mut(key) else {
            return;
        };
        item.is_paused = true;
        self.interaction.hover = HoverState::Hovering(key);
        self.show_card(key);
    }

    fn leave(&mut self, key: ItemKey) {
        if let Some(item) = self.item_mut(key) {
            item.is_paused = false;
        }
        self.interaction.hover = HoverState::None;
        self.hide_card();
    }

    /// Drop any hover without consulting the pointer (clear, cull).
    pub(crate) fn end_hover(&mut self) {
        if let Some(key) = self.hovered_key() {
            self.leave(key);
        }
        self.interaction.panel_focus = false;
    }

    // --- Action card ---

    fn show_card(&mut self, key: ItemKey) {
        self.hide_card();
        let Some(item) = self.item(key) else {
            return;
        };
        let view = card::card_view(item, &self.config);
        let origin = item.card_rect(&self.config);
        let handle = self.host.create(WidgetSpec::ActionCard(view));
        self.host.reposition(handle, Point::new(origin.x, origin.y));
        self.interaction.card = Some(handle);
    }

    fn hide_card(&mut self) {
        if let Some(handle) = self.interaction.card.take() {
            self.host.destroy(handle);
        }
        self.interaction.panel_focus = false;
    }

    fn refresh_card(&mut self) {
        let (Some(handle), Some(key)) = (self.interaction.card, self.hovered_key()) else {
            return;
        };
        let Some(item) = self.item(key) else {
            return;
        };
        let view = card::card_view(item, &self.config);
        let origin = item.card_rect(&self.config);
        self.host.update(handle, WidgetSpec::ActionCard(view));
        self.host.reposition(handle, Point::new(origin.x, origin.y));
    }

    /// Route an event raised by a host widget.
    pub fn widget_event(&mut self, handle: WidgetHandle, event: WidgetEvent) {
        if self.interaction.card == Some(handle) {
            match event {
                WidgetEvent::PointerEnter => self.interaction.panel_focus = true,
                WidgetEvent::PointerLeave => {
                    self.interaction.panel_focus = false;
                    self.update_hover();
                }
                WidgetEvent::Action(action) => self.card_action(action),
                WidgetEvent::Click => {}
            }
            return;
        }

        let voice_item = self
            .items
            .iter()
            .find(|i| i.voice.button == Some(handle))
            .map(|i| i.key);
        match (voice_item, event) {
            (Some(key), WidgetEvent::Click) => self.toggle_voice(key),
            (Some(_), _) => {}
            (None, _) => debug!(handle = handle.0, "event for unknown widget"),
        }
    }

    fn card_action(&mut self, action: CardAction) {
        let Some(key) = self.hovered_key() else {
            return;
        };
        let Some(item) = self.item(key) else {
            return;
        };

        if action == CardAction::Copy {
            let text = item.text.clone();
            match self.host.write_text(&text) {
                Ok(()) => self.show_toast(),
                Err(err) => debug!(%err, "copy failed"),
            }
            return;
        }

        let owned = item.owned;
        let Some(id) = item.id.clone() else {
            debug!(key = key.0, ?action, "item has no id yet, ignoring");
            return;
        };
        let callback = match action {
            CardAction::Like => self.callbacks.on_like.as_mut(),
            CardAction::Report => self.callbacks.on_report.as_mut(),
            CardAction::Delete if owned => self.callbacks.on_delete.as_mut(),
            CardAction::Delete | CardAction::Copy => None,
        };
        if let Some(callback) = callback {
            callback(&id);
        }
    }

    // --- Popularity ---

    /// Apply a new like count (and optionally the viewer's like state) to
    /// every live item with `id`. Size and baseline follow the count; the
    /// wrapped lines do not. Returns whether any item matched.
    pub fn update_popularity(&mut self, id: &ItemId, count: u32, liked: Option<bool>) -> bool {
        let hovered = self.hovered_key();
        let mut matched = false;
        let mut hovered_changed = false;
        for item in self.items.iter_mut().filter(|i| i.id.as_ref() == Some(id)) {
            item.popularity = count;
            if let Some(liked) = liked {
                item.liked = liked;
            }
            item.size = self.config.size_for(count);
            item.baseline = layout::baseline_for(item.lane, self.config.lane_height, item.size);
            matched = true;
            hovered_changed |= hovered == Some(item.key);
        }
        if hovered_changed {
            self.refresh_card();
        }
        matched
    }

    // --- Voice playback ---

    fn toggle_voice(&mut self, key: ItemKey) {
        let Some(item) = self.items.iter_mut().find(|i| i.key == key) else {
            return;
        };
        let Some(audio) = item.voice.audio else {
            return;
        };
        if item.voice.is_playing {
            self.host.pause(audio);
            item.voice.is_playing = false;
        } else {
            match self.host.play(audio) {
                Ok(()) => item.voice.is_playing = true,
                Err(err) => warn!(%err, key = key.0, "voice comment playback failed"),
            }
        }
        if let Some(button) = item.voice.button {
            self.host.update(
                button,
                WidgetSpec::VoiceButton {
                    item: key,
                    playing: item.voice.is_playing,
                    size: self.config.voice_button_size,
                },
            );
        }
    }

    /// The host finished playing `audio`.
    pub fn audio_ended(&mut self, audio: AudioHandle) {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.voice.audio == Some(audio))
        else {
            return;
        };
        item.voice.is_playing = false;
        if let Some(button) = item.voice.button {
            self.host.update(
                button,
                WidgetSpec::VoiceButton {
                    item: item.key,
                    playing: false,
                    size: self.config.voice_button_size,
                },
            );
        }
    }
}
