//! Settings management
//!
//! Every field has a default, so a settings file only needs the values it
//! wants to change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use survivors_core::ecs::InvariantPolicy;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings")]
    Encode(#[from] serde_json::Error),

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub simulation: SimulationSettings,
    pub scene: SceneSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub tick_rate_hz: u32,
    pub invariant_policy: InvariantPolicy,
    /// Stop after this many ticks; `0` runs until game over.
    pub max_ticks: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: survivors_core::time::TICK_RATE_HZ,
            invariant_policy: InvariantPolicy::default(),
            max_ticks: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub player: PlayerSettings,
    pub enemy: EnemySettings,
    pub spawner: SpawnerSettings,
    pub plasma_blast: PlasmaBlastSettings,
    pub gem: GemSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub move_speed: f32,
    pub hit_points: i32,
    pub attack_cooldown: f32,
    /// Half extent of the square searched for attack targets.
    pub detection_size: f32,
    pub collider_radius: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            hit_points: 1000,
            attack_cooldown: 0.5,
            detection_size: 10.0,
            collider_radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    pub move_speed: f32,
    pub hit_points: i32,
    pub attack_damage: i32,
    pub attack_cooldown: f32,
    pub collider_radius: f32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            hit_points: 20,
            attack_damage: 10,
            attack_cooldown: 1.0,
            collider_radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerSettings {
    pub interval: f32,
    pub distance: f32,
    pub seed: u32,
}

impl Default for SpawnerSettings {
    fn default() -> Self {
        Self {
            interval: 1.0,
            distance: 15.0,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaBlastSettings {
    pub move_speed: f32,
    pub attack_damage: i32,
    pub collider_radius: f32,
}

impl Default for PlasmaBlastSettings {
    fn default() -> Self {
        Self {
            move_speed: 12.0,
            attack_damage: 10,
            collider_radius: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GemSettings {
    pub collider_radius: f32,
}

impl Default for GemSettings {
    fn default() -> Self {
        Self {
            collider_radius: 0.3,
        }
    }
}

impl Settings {
    /// Read and validate a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&text).map_err(|err| match err {
            SettingsError::Encode(source) => SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let scene = &self.scene;
        positive("simulation.tick_rate_hz", self.simulation.tick_rate_hz as f32)?;
        positive("scene.spawner.interval", scene.spawner.interval)?;
        positive("scene.player.hit_points", scene.player.hit_points as f32)?;
        positive("scene.enemy.hit_points", scene.enemy.hit_points as f32)?;
        non_negative("scene.player.attack_cooldown", scene.player.attack_cooldown)?;
        non_negative("scene.enemy.attack_cooldown", scene.enemy.attack_cooldown)?;
        non_negative("scene.player.detection_size", scene.player.detection_size)?;
        non_negative("scene.spawner.distance", scene.spawner.distance)?;
        Ok(())
    }

    /// Fixed step in seconds.
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.simulation.tick_rate_hz.max(1) as f32
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            field,
            reason: format!("must not be negative, got {value}"),
        })
    }
}
