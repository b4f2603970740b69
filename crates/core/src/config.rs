use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Tuning for the overlay engine. Every field has a default, so a host can
/// send `{}` or override a handful of keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Height of one lane in logical pixels.
    pub lane_height: f64,
    /// Font size of an item with zero popularity.
    pub font_size: f64,
    /// Font size added per `popularity_step` likes.
    pub font_step: f64,
    pub popularity_step: u32,
    /// Horizontal travel per frame.
    pub speed: f64,
    /// Minimum gap kept between consecutive items in one lane.
    pub lane_margin: f64,
    /// After this long a lane is reused regardless of where its last item is.
    pub lane_fallback_ms: f64,
    /// Wrap budget for a single line.
    pub max_line_width: f64,
    pub line_height_factor: f64,
    /// Extra footprint reserved in front of voice comments.
    pub voice_allowance: f64,
    pub voice_button_size: f64,
    pub voice_button_gap: f64,
    pub card_height: f64,
    pub card_min_width: f64,
    /// Slack around the hovered text and its card that still counts as
    /// "over the item".
    pub card_padding: f64,
    pub toast_ms: f64,
    pub toast_message: String,
    /// Prefix for relative audio references, e.g. `http://localhost:5002`.
    pub asset_base_url: Option<String>,
    pub sync: SyncConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lane_height: 30.0,
            font_size: 24.0,
            font_step: 1.0,
            popularity_step: 10,
            speed: 3.0,
            lane_margin: 50.0,
            lane_fallback_ms: 3000.0,
            max_line_width: 360.0,
            line_height_factor: 1.2,
            voice_allowance: 40.0,
            voice_button_size: 24.0,
            voice_button_gap: 8.0,
            card_height: 36.0,
            card_min_width: 180.0,
            card_padding: 8.0,
            toast_ms: 1500.0,
            toast_message: "Copied".to_string(),
            asset_base_url: None,
            sync: SyncConfig::default(),
        }
    }
}

/// How the playback synchronizer decides which anchored comments are due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// A time update further than this (seconds) from the previous one is
    /// treated as a jump rather than normal playback.
    pub jump_threshold: f64,
    /// After a jump, only comments this close (seconds) to the new time show.
    pub jump_window: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            jump_threshold: 1.0,
            jump_window: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("laneHeight", self.lane_height),
            ("fontSize", self.font_size),
            ("maxLineWidth", self.max_line_width),
            ("lineHeightFactor", self.line_height_factor),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "a positive number",
                    value,
                });
            }
        }
        let non_negative = [
            ("speed", self.speed),
            ("fontStep", self.font_step),
            ("laneMargin", self.lane_margin),
            ("laneFallbackMs", self.lane_fallback_ms),
            ("voiceAllowance", self.voice_allowance),
            ("cardPadding", self.card_padding),
            ("toastMs", self.toast_ms),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "zero or positive",
                    value,
                });
            }
        }
        if self.popularity_step == 0 {
            return Err(ConfigError::OutOfRange {
                field: "popularityStep",
                expected: "at least 1",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Font size for an item with `popularity` likes: one `font_step` per
    /// full `popularity_step`.
    pub fn size_for(&self, popularity: u32) -> f64 {
        self.font_size + f64::from(popularity / self.popularity_step.max(1)) * self.font_step
    }

    /// Horizontal offset of voice comment text past its play button.
    pub fn voice_text_offset(&self) -> f64 {
        self.voice_button_size + self.voice_button_gap
    }

    /// Turn a stored audio reference into a playable URL.
    ///
    /// Absolute `http(s)` URLs pass through. Relative paths get a leading
    /// `/` if missing and are prefixed with `asset_base_url` when set.
    pub fn resolve_resource_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        match &self.asset_base_url {
            Some(base) => format!("{}{normalized}", base.trim_end_matches('/')),
            None => normalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = EngineConfig::from_json("{}").expect("empty object is a valid config");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let json = r#"{"laneHeight": 50, "sync": {"jumpWindow": 0.25}}"#;
        let config = EngineConfig::from_json(json).expect("partial config parses");
        assert_eq!(config.lane_height, 50.0);
        assert_eq!(config.font_size, 24.0);
        assert_eq!(config.sync.jump_window, 0.25);
        assert_eq!(config.sync.jump_threshold, 1.0);
    }

    #[test]
    fn rejects_zero_lane_height() {
        let err = EngineConfig::from_json(r#"{"laneHeight": 0}"#);
        assert!(matches!(
            err,
            Err(ConfigError::OutOfRange {
                field: "laneHeight",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_popularity_step() {
        let err = EngineConfig::from_json(r#"{"popularityStep": 0}"#);
        assert!(matches!(
            err,
            Err(ConfigError::OutOfRange {
                field: "popularityStep",
                ..
            })
        ));
    }

    #[test]
    fn size_grows_one_step_per_ten_likes() {
        let config = EngineConfig::default();
        assert_eq!(config.size_for(0), 24.0);
        assert_eq!(config.size_for(9), 24.0);
        assert_eq!(config.size_for(10), 25.0);
        assert_eq!(config.size_for(23), 26.0);
    }

    #[test]
    fn resolves_resource_urls() {
        let mut config = EngineConfig::default();
        assert_eq!(config.resolve_resource_url("a.webm"), "/a.webm");
        config.asset_base_url = Some("http://localhost:5002/".to_string());
        assert_eq!(
            config.resolve_resource_url("/uploads/a.webm"),
            "http://localhost:5002/uploads/a.webm"
        );
        assert_eq!(
            config.resolve_resource_url("https://cdn.example.com/a.webm"),
            "https://cdn.example.com/a.webm"
        );
    }
}
