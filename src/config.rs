//! Start-up settings for the window, camera and asset location.

use std::path::PathBuf;

/// Environment variable that overrides [`SceneConfig::asset_dir`].
pub const ASSET_DIR_ENV: &str = "RETRO_DESK_ASSETS";

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Root the texture paths are resolved against.
    pub asset_dir: PathBuf,
    pub clear_colour: wgpu::Color,
    pub camera_position: [f32; 3],
    /// Degrees, 0 looks along +X and -90 along -Z.
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    pub camera_speed: f32,
    pub camera_sensitivity: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "Retro Desk".to_string(),
            width: 1000,
            height: 800,
            asset_dir: PathBuf::from("assets"),
            clear_colour: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
            camera_position: [0.0, 9.0, 18.0],
            camera_yaw: -90.0,
            camera_pitch: -25.0,
            camera_speed: 10.0,
            camera_sensitivity: 0.4,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl SceneConfig {
    /// Defaults, with the asset root taken from `RETRO_DESK_ASSETS` when it is set.
    /// [`crate::run`] logs the asset root once logging is initialised.
    pub fn from_env() -> Self {
        if cfg!(target_arch = "wasm32") {
            return Self::default();
        }
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `var`. Empty values are ignored.
    pub fn with_overrides(self, var: impl Fn(&str) -> Option<String>) -> Self {
        match var(ASSET_DIR_ENV) {
            Some(dir) if !dir.is_empty() => self.with_asset_dir(dir),
            _ => self,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_asset_dir(mut self, asset_dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = asset_dir.into();
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_camera(mut self, position: [f32; 3], yaw: f32, pitch: f32) -> Self {
        self.camera_position = position;
        self.camera_yaw = yaw;
        self.camera_pitch = pitch;
        self
    }

    pub fn with_camera_speed(mut self, speed: f32, sensitivity: f32) -> Self {
        self.camera_speed = speed;
        self.camera_sensitivity = sensitivity;
        self
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = SceneConfig::default()
            .with_title("desk")
            .with_size(640, 480)
            .with_asset_dir("/tmp/desk-assets")
            .with_camera([1.0, 2.0, 3.0], 0.0, -10.0)
            .with_camera_speed(4.0, 0.1);

        assert_eq!(config.title, "desk");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.asset_dir, PathBuf::from("/tmp/desk-assets"));
        assert_eq!(config.camera_position, [1.0, 2.0, 3.0]);
        assert_eq!(config.camera_pitch, -10.0);
        assert_eq!(config.camera_speed, 4.0);
        assert!((config.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn default_assets_are_relative() {
        assert_eq!(SceneConfig::default().asset_dir, PathBuf::from("assets"));
    }

    #[test]
    fn asset_dir_override_applies_when_set() {
        let config = SceneConfig::default().with_overrides(|key| {
            (key == ASSET_DIR_ENV).then(|| "/srv/desk".to_string())
        });
        assert_eq!(config.asset_dir, PathBuf::from("/srv/desk"));
    }

    #[test]
    fn empty_or_missing_override_keeps_default() {
        let empty = SceneConfig::default().with_overrides(|_| Some(String::new()));
        let missing = SceneConfig::default().with_overrides(|_| None);
        assert_eq!(empty, SceneConfig::default());
        assert_eq!(missing, SceneConfig::default());
    }
}
