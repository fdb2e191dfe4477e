//! Game settings and preferences
//!
//! Persisted separately from progress and statistics under their own key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};
use crate::sim::{Difficulty, GameMode, SessionConfig};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preferred shape catalog for new games
    pub difficulty: Difficulty,

    // === Board ===
    /// Ghost preview of the shape under the pointer
    pub placement_preview: bool,
    /// Ask before spending coins or score on a power-up
    pub confirm_power_ups: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no line-clear shake or flashes)
    pub reduced_motion: bool,
    /// High contrast mode
    pub high_contrast: bool,
    /// Patterned blocks in addition to colour
    pub colorblind_patterns: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,

            placement_preview: true,
            confirm_power_ups: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            mute_on_blur: true,

            reduced_motion: false,
            high_contrast: false,
            colorblind_patterns: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "blockfit_settings";

    /// Stored settings merged over the defaults
    pub fn load(store: &dyn Storage) -> Self {
        let mut settings: Self = persistence::load(store, Self::STORAGE_KEY);
        settings.clamp_volumes();
        settings
    }

    pub fn save(&self, store: &mut dyn Storage) -> bool {
        let ok = persistence::save(store, Self::STORAGE_KEY, self);
        if ok {
            log::info!("Settings saved");
        }
        ok
    }

    fn clamp_volumes(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
    }

    /// Effective sound effect gain (master × sfx)
    pub fn effective_sfx_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    /// Effective music gain (master × music)
    pub fn effective_music_volume(&self) -> f32 {
        self.master_volume * self.music_volume
    }

    /// Line-clear animations (respects reduced_motion)
    pub fn effective_clear_animation(&self) -> bool {
        !self.reduced_motion
    }

    /// Session config for a new game in `mode` at the preferred difficulty
    pub fn session_config(&self, mode: GameMode) -> SessionConfig {
        SessionConfig::new(mode, self.difficulty)
    }
}
