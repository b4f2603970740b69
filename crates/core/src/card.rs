//! Action card contents, host callbacks and the copy toast.

use danmaku_protocol::{CardView, ItemId, WidgetHandle};

use crate::config::EngineConfig;
use crate::item::OverlayItem;

pub type ItemCallback = Box<dyn FnMut(&ItemId)>;

/// Host-supplied reactions to card buttons. The engine only forwards the
/// item id; persisting a like or a report is the host's job.
#[derive(Default)]
pub struct Callbacks {
    pub on_like: Option<ItemCallback>,
    pub on_report: Option<ItemCallback>,
    pub on_delete: Option<ItemCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_like(mut self, f: impl FnMut(&ItemId) + 'static) -> Self {
        self.on_like = Some(Box::new(f));
        self
    }

    pub fn on_report(mut self, f: impl FnMut(&ItemId) + 'static) -> Self {
        self.on_report = Some(Box::new(f));
        self
    }

    pub fn on_delete(mut self, f: impl FnMut(&ItemId) + 'static) -> Self {
        self.on_delete = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_like", &self.on_like.is_some())
            .field("on_report", &self.on_report.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .finish()
    }
}

pub fn card_view(item: &OverlayItem, config: &EngineConfig) -> CardView {
    let rect = item.card_rect(config);
    CardView {
        item: item.key,
        like_count: item.popularity,
        liked: item.liked,
        owned: item.owned,
        text: item.text.clone(),
        width: rect.w,
        height: rect.h,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Toast {
    pub handle: WidgetHandle,
    pub expires_at: f64,
}
