//! Game settings and preferences
//!
//! Persisted in LocalStorage next to the ranking.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{KeyValueStore, load_json, save_json};

/// How atoms and bonds are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderStyle {
    #[default]
    BallAndStick,
    Stick,
    SpaceFilling,
}

impl RenderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStyle::BallAndStick => "ball-and-stick",
            RenderStyle::Stick => "stick",
            RenderStyle::SpaceFilling => "space-filling",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ball-and-stick" | "ball" | "balls" => Some(RenderStyle::BallAndStick),
            "stick" | "sticks" => Some(RenderStyle::Stick),
            "space-filling" | "sphere" | "cpk" => Some(RenderStyle::SpaceFilling),
            _ => None,
        }
    }

    /// Fraction of the van der Waals radius used for atom spheres
    pub fn sphere_scale(&self) -> f32 {
        match self {
            RenderStyle::BallAndStick => 0.3,
            RenderStyle::Stick => 0.1,
            RenderStyle::SpaceFilling => 1.0,
        }
    }

    /// Bond cylinder radius (0 = bonds hidden)
    pub fn stick_radius(&self) -> f32 {
        match self {
            RenderStyle::BallAndStick => 0.15,
            RenderStyle::Stick => 0.2,
            RenderStyle::SpaceFilling => 0.0,
        }
    }
}

/// Which viewer backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RendererPreference {
    /// 3D when the molecule library is present, 2D otherwise
    #[default]
    Auto,
    ThreeD,
    Flat,
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Session ===
    /// Countdown length in seconds
    pub time_limit_secs: u32,
    /// Pause after a correct answer before the next round
    pub advance_delay_ms: u32,
    /// How long a wrong pick stays disabled
    pub wrong_flash_ms: u32,
    /// Countdown refresh interval
    pub tick_interval_ms: u32,
    /// Wait before retrying a round the catalog could not fill
    pub retry_delay_ms: u32,

    // === Data ===
    /// Leveled dataset
    pub levels_url: String,
    /// Flat list of molecule paths, used when the dataset is missing
    pub catalog_url: String,
    /// Prefix for bare file names in the dataset
    pub molecule_dir: String,

    // === Viewer ===
    pub renderer: RendererPreference,
    pub style: RenderStyle,
    /// Extra arbitrary-axis rotation on top of the per-axis angles
    pub axis_twist: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_limit_secs: TIME_LIMIT_SECS,
            advance_delay_ms: ADVANCE_DELAY_MS,
            wrong_flash_ms: WRONG_FLASH_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
            retry_delay_ms: RETRY_DELAY_MS,

            levels_url: "data/molecules.json".to_string(),
            catalog_url: "data/catalog.json".to_string(),
            molecule_dir: "data/DB/".to_string(),

            renderer: RendererPreference::Auto,
            style: RenderStyle::BallAndStick,
            axis_twist: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "molecule_match_settings";

    /// Load settings, falling back to defaults on absence or corruption
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from storage");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {e}"),
        }
    }

    /// Whether the 3D backend should be used given library availability
    pub fn wants_3d(&self, library_available: bool) -> bool {
        match self.renderer {
            RendererPreference::Auto | RendererPreference::ThreeD => library_available,
            RendererPreference::Flat => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_match_consts() {
        let s = Settings::default();
        assert_eq!(s.time_limit_secs, 60);
        assert_eq!(s.advance_delay_ms, 600);
        assert_eq!(s.wrong_flash_ms, 800);
        assert_eq!(s.tick_interval_ms, 200);
        assert!(s.axis_twist);
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in [RenderStyle::BallAndStick, RenderStyle::Stick, RenderStyle::SpaceFilling] {
            assert_eq!(RenderStyle::from_str(style.as_str()), Some(style));
        }
        assert_eq!(RenderStyle::from_str("CPK"), Some(RenderStyle::SpaceFilling));
        assert_eq!(RenderStyle::from_str("wireframe"), None);
    }

    #[test]
    fn test_load_missing_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_load_corrupt_gives_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{"time_limit_secs": 30, "style": "Stick"}"#)
            .unwrap();
        let s = Settings::load(&store);
        assert_eq!(s.time_limit_secs, 30);
        assert_eq!(s.style, RenderStyle::Stick);
        assert_eq!(s.advance_delay_ms, 600);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut s = Settings::default();
        s.renderer = RendererPreference::Flat;
        s.axis_twist = false;
        s.save(&mut store);
        assert_eq!(Settings::load(&store), s);
    }

    #[test]
    fn test_renderer_choice() {
        let mut s = Settings::default();
        assert!(s.wants_3d(true));
        assert!(!s.wants_3d(false));
        s.renderer = RendererPreference::Flat;
        assert!(!s.wants_3d(true));
    }
}
