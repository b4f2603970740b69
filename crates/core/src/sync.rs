//! Admitting time-anchored comments as media playback advances.
//!
//! The media element reports its current time at its own cadence (a few
//! times per second). Each report opens a window `[last, now]`; comments
//! anchored inside it are submitted once. A report far from the previous
//! one is a jump (scrubbing, buffering catch-up) and only admits comments
//! right around the new position instead of flooding the screen.

use std::collections::HashSet;

use danmaku_protocol::{Color, ItemId};
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::engine::Engine;
use crate::host::Host;
use crate::item::{ItemKind, Submission};

/// One persisted comment as the item source delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoredComment {
    #[serde(alias = "_id")]
    pub id: ItemId,
    /// Anchor time in seconds from the start of the media.
    pub time: f64,
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub owned: bool,
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

impl AnchoredComment {
    pub fn to_submission(&self) -> Submission {
        let kind = match (&self.audio_url, self.is_voice) {
            (Some(url), true) => ItemKind::Voice {
                audio_reference: url.clone(),
            },
            _ => ItemKind::Text,
        };
        Submission {
            text: self.text.clone(),
            color: Color::from_hex_or_white(&self.color),
            kind,
            popularity: self.likes,
            id: Some(self.id.clone()),
            liked: self.liked,
            owned: self.owned,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackSync {
    config: SyncConfig,
    last_time: f64,
    shown: HashSet<ItemId>,
}

impl PlaybackSync {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            last_time: 0.0,
            shown: HashSet::new(),
        }
    }

    /// Record a comment the host already echoed locally (e.g. right after
    /// the viewer posted it) so playback does not show it twice.
    pub fn mark_shown(&mut self, id: ItemId) {
        self.shown.insert(id);
    }

    /// Comments that become due at `current_time`, marking them shown.
    pub fn due<'a>(
        &mut self,
        current_time: f64,
        comments: &'a [AnchoredComment],
    ) -> Vec<&'a AnchoredComment> {
        if !current_time.is_finite() {
            return Vec::new();
        }
        let last = self.last_time;
        let jumped = (current_time - last).abs() > self.config.jump_threshold;
        let window = self.config.jump_window;

        let due: Vec<&AnchoredComment> = comments
            .iter()
            .filter(|c| !self.shown.contains(&c.id))
            .filter(|c| {
                if jumped {
                    (c.time - current_time).abs() < window
                } else {
                    c.time >= last && c.time <= current_time
                }
            })
            .collect();
        for c in &due {
            self.shown.insert(c.id.clone());
        }
        self.last_time = current_time;
        due
    }

    /// Submit everything due at `current_time`. Returns how many were
    /// admitted.
    pub fn advance<H: Host>(
        &mut self,
        engine: &mut Engine<H>,
        current_time: f64,
        comments: &[AnchoredComment],
    ) -> usize {
        let due = self.due(current_time, comments);
        let count = due.len();
        for comment in due {
            engine.submit(comment.to_submission());
        }
        count
    }

    /// A seek happened: flush the screen and allow every comment to show
    /// again from the new position.
    pub fn seek<H: Host>(&mut self, engine: &mut Engine<H>, current_time: f64) {
        engine.clear();
        self.shown.clear();
        if current_time.is_finite() {
            self.last_time = current_time;
        }
    }

    /// Mirror the media element's play state onto the engine.
    pub fn set_playing<H: Host>(&self, engine: &mut Engine<H>, playing: bool) {
        if playing {
            engine.resume();
        } else {
            engine.pause();
        }
    }
}

impl Default for PlaybackSync {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, time: f64) -> AnchoredComment {
        AnchoredComment {
            id: ItemId::from(id),
            time,
            text: format!("comment {id}"),
            color: default_color(),
            is_voice: false,
            audio_url: None,
            likes: 0,
            liked: false,
            owned: false,
        }
    }

    fn ids(due: &[&AnchoredComment]) -> Vec<String> {
        due.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn admits_comments_inside_elapsed_window_once() {
        let comments = vec![comment("a", 0.2), comment("b", 0.6), comment("c", 1.4)];
        let mut sync = PlaybackSync::default();
        assert_eq!(ids(&sync.due(0.5, &comments)), vec!["a"]);
        assert_eq!(ids(&sync.due(1.0, &comments)), vec!["b"]);
        assert!(sync.due(1.0, &comments).is_empty());
        assert_eq!(ids(&sync.due(1.5, &comments)), vec!["c"]);
    }

    #[test]
    fn jump_only_admits_comments_near_new_time() {
        let comments = vec![comment("a", 3.0), comment("b", 9.8), comment("c", 10.3)];
        let mut sync = PlaybackSync::default();
        let due = sync.due(10.0, &comments);
        assert_eq!(ids(&due), vec!["b", "c"]);
        assert_eq!(sync.last_time, 10.0);
    }

    #[test]
    fn local_echo_is_not_shown_again() {
        let comments = vec![comment("mine", 0.4)];
        let mut sync = PlaybackSync::default();
        sync.mark_shown(ItemId::from("mine"));
        assert!(sync.due(0.5, &comments).is_empty());
    }

    #[test]
    fn voice_comment_becomes_voice_submission() {
        let json = r##"{"_id":"v1","time":2.5,"text":"hello","isVoice":true,"audioUrl":"/uploads/v1.webm","likes":11}"##;
        let c: AnchoredComment = serde_json::from_str(json).expect("stored comment parses");
        let sub = c.to_submission();
        assert_eq!(
            sub.kind,
            ItemKind::Voice {
                audio_reference: "/uploads/v1.webm".to_string()
            }
        );
        assert_eq!(sub.popularity, 11);
        assert_eq!(sub.color, Color::WHITE);
        assert_eq!(sub.id, Some(ItemId::from("v1")));
    }

    #[test]
    fn voice_flag_without_url_is_plain_text() {
        let mut c = comment("x", 0.0);
        c.is_voice = true;
        assert_eq!(c.to_submission().kind, ItemKind::Text);
    }
}
