use std::time::Duration;

use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::coordinate_system::{
    CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CAMERA_START_POSITION,
};
use constants::render_settings::{
    AXES_LENGTH, BACKGROUND_COLOUR, CAMERA_DAMPING_FACTOR, CAMERA_MAX_DISTANCE,
    CAMERA_MIN_DISTANCE, CAMERA_PAN_SPEED, CAMERA_ROTATE_SPEED, CAMERA_ZOOM_SPEED,
    DEFAULT_POINT_SIZE, GRID_DIVISIONS, GRID_SIZE, MAX_PIXEL_RATIO, POINT_SIZE_SCALE,
    SURFACE_RETRY_DELAY_MS,
};
use constants::texture::{MAX_POINT_CAPACITY, SOURCE_HEIGHT, SOURCE_WIDTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::core::app_state::ViewerWarning;

/// Optional override file, relative to the asset root.
pub const SETTINGS_PATH: &str = "config/settings.viewer.json";

/// Runtime viewer configuration. Read when the viewer mounts, so changes
/// take effect from the next mount.
#[derive(Resource, Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Sensor resolution; one point per pixel sizes the initial buffer.
    pub source_width: u32,
    pub source_height: u32,
    /// Ceiling for buffer growth; larger snapshots are rejected.
    pub max_point_capacity: usize,
    pub point_size: f32,
    pub point_size_scale: f32,
    /// sRGB
    pub background_colour: [f32; 3],
    pub camera_start: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub surface_retry_delay_ms: u64,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub axes_length: f32,
    /// Device pixels per logical pixel are capped here on the web canvas.
    pub max_pixel_ratio: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            source_width: SOURCE_WIDTH,
            source_height: SOURCE_HEIGHT,
            max_point_capacity: MAX_POINT_CAPACITY,
            point_size: DEFAULT_POINT_SIZE,
            point_size_scale: POINT_SIZE_SCALE,
            background_colour: BACKGROUND_COLOUR,
            camera_start: CAMERA_START_POSITION.to_array(),
            fov_degrees: CAMERA_FOV_DEGREES,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            damping_factor: CAMERA_DAMPING_FACTOR,
            rotate_speed: CAMERA_ROTATE_SPEED,
            pan_speed: CAMERA_PAN_SPEED,
            zoom_speed: CAMERA_ZOOM_SPEED,
            min_distance: CAMERA_MIN_DISTANCE,
            max_distance: CAMERA_MAX_DISTANCE,
            surface_retry_delay_ms: SURFACE_RETRY_DELAY_MS,
            grid_size: GRID_SIZE,
            grid_divisions: GRID_DIVISIONS,
            axes_length: AXES_LENGTH,
            max_pixel_ratio: MAX_PIXEL_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("source resolution {width}x{height} has no pixels")]
    EmptySourceResolution { width: u32, height: u32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("damping factor {0} must lie in (0, 1]")]
    DampingOutOfRange(f32),
    #[error("clip planes near={near} far={far} are not ordered")]
    ClipPlanes { near: f32, far: f32 },
    #[error("camera distance range [{min}, {max}] is empty")]
    DistanceRange { min: f32, max: f32 },
    #[error("field of view {0} must lie in (0, 180) degrees")]
    FieldOfView(f32),
    #[error("{points} points exceed the capacity limit of {limit}")]
    CapacityTooLarge { points: u64, limit: u64 },
}

impl ViewerSettings {
    pub fn max_points(&self) -> usize {
        self.source_width as usize * self.source_height as usize
    }

    pub fn camera_start(&self) -> Vec3 {
        Vec3::from_array(self.camera_start)
    }

    pub fn background_colour(&self) -> Color {
        let [r, g, b] = self.background_colour;
        Color::srgb(r, g, b)
    }

    pub fn surface_retry_delay(&self) -> Duration {
        Duration::from_millis(self.surface_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.source_width == 0 || self.source_height == 0 {
            return Err(SettingsError::EmptySourceResolution {
                width: self.source_width,
                height: self.source_height,
            });
        }

        if self.max_point_capacity > MAX_POINT_CAPACITY {
            return Err(SettingsError::CapacityTooLarge {
                points: self.max_point_capacity as u64,
                limit: MAX_POINT_CAPACITY as u64,
            });
        }
        // u64 so 32-bit targets cannot overflow.
        let source_points = u64::from(self.source_width) * u64::from(self.source_height);
        if source_points > self.max_point_capacity as u64 {
            return Err(SettingsError::CapacityTooLarge {
                points: source_points,
                limit: self.max_point_capacity as u64,
            });
        }

        for (field, value) in [
            ("point_size", self.point_size),
            ("point_size_scale", self.point_size_scale),
            ("near", self.near),
            ("grid_size", self.grid_size),
            ("axes_length", self.axes_length),
            ("min_distance", self.min_distance),
            ("max_pixel_ratio", self.max_pixel_ratio),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(SettingsError::NotPositive { field, value });
            }
        }

        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(SettingsError::DampingOutOfRange(self.damping_factor));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SettingsError::FieldOfView(self.fov_degrees));
        }
        if self.far <= self.near {
            return Err(SettingsError::ClipPlanes {
                near: self.near,
                far: self.far,
            });
        }
        if self.max_distance < self.min_distance {
            return Err(SettingsError::DistanceRange {
                min: self.min_distance,
                max: self.max_distance,
            });
        }

        Ok(())
    }
}

/// Tracks the settings file load started at startup.
#[derive(Resource, Default)]
pub struct SettingsLoader {
    pub handle: Option<Handle<ViewerSettings>>,
    pub resolved: bool,
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<ViewerSettings>::new(&["viewer.json"]))
            .init_resource::<ViewerSettings>()
            .init_resource::<SettingsLoader>()
            .add_systems(Startup, start_settings_load)
            .add_systems(Update, apply_loaded_settings);
    }
}

fn start_settings_load(mut loader: ResMut<SettingsLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(SETTINGS_PATH));
}

/// Adopt the settings file once it loads. A missing or invalid file leaves
/// the defaults in place.
fn apply_loaded_settings(
    mut loader: ResMut<SettingsLoader>,
    asset_server: Res<AssetServer>,
    loaded_settings: Res<Assets<ViewerSettings>>,
    mut settings: ResMut<ViewerSettings>,
    mut warnings: EventWriter<ViewerWarning>,
) {
    if loader.resolved {
        return;
    }
    let Some(handle) = loader.handle.clone() else {
        return;
    };

    if let Some(loaded) = loaded_settings.get(&handle) {
        loader.resolved = true;
        match loaded.validate() {
            Ok(()) => {
                info!("Viewer settings loaded from {}", SETTINGS_PATH);
                *settings = loaded.clone();
            }
            Err(error) => {
                warnings.write(ViewerWarning::new(format!(
                    "Ignoring {SETTINGS_PATH}: {error}"
                )));
            }
        }
    } else if asset_server.load_state(&handle).is_failed() {
        loader.resolved = true;
        debug!("No usable {}, using default viewer settings", SETTINGS_PATH);
    }
}

/// Run condition: the settings file has been applied or given up on.
pub fn settings_resolved(loader: Option<Res<SettingsLoader>>) -> bool {
    loader.is_none_or(|loader| loader.resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::texture::MAX_POINTS;

    #[test]
    fn defaults_validate() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.max_points(), MAX_POINTS);
        assert_eq!(settings.surface_retry_delay(), Duration::from_millis(100));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let settings: ViewerSettings =
            serde_json::from_str(r#"{ "point_size": 2.0, "source_width": 640 }"#).unwrap();

        assert_eq!(settings.point_size, 2.0);
        assert_eq!(settings.source_width, 640);
        assert_eq!(settings.source_height, SOURCE_HEIGHT);
        assert_eq!(settings.damping_factor, CAMERA_DAMPING_FACTOR);
    }

    #[test]
    fn invalid_values_are_reported() {
        let settings = ViewerSettings {
            source_height: 0,
            ..default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::EmptySourceResolution { height: 0, .. })
        ));

        let settings = ViewerSettings {
            damping_factor: 0.0,
            ..default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::DampingOutOfRange(0.0))
        );

        let settings = ViewerSettings {
            near: 10.0,
            far: 1.0,
            ..default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::ClipPlanes { .. })
        ));
    }

    #[test]
    fn capacities_past_texture_addressing_are_rejected() {
        let settings = ViewerSettings {
            source_width: 3840,
            source_height: 2160,
            ..default()
        };
        assert_eq!(settings.validate(), Ok(()));

        let settings = ViewerSettings {
            source_width: 16_384,
            source_height: 8_192,
            ..default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::CapacityTooLarge {
                points: 16_384 * 8_192,
                limit: MAX_POINT_CAPACITY as u64,
            })
        );

        let settings = ViewerSettings {
            max_point_capacity: MAX_POINT_CAPACITY + 1,
            ..default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::CapacityTooLarge { .. })
        ));

        let settings = ViewerSettings {
            max_point_capacity: 1_000,
            ..default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::CapacityTooLarge {
                points: 1280 * 720,
                limit: 1_000,
            })
        );
    }

    #[test]
    fn bundled_settings_file_parses() {
        let raw = include_str!("../../../assets/config/settings.viewer.json");
        let settings: ViewerSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.validate(), Ok(()));
    }
}
