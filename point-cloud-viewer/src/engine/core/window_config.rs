use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};

use crate::engine::core::settings::ViewerSettings;

/// Primary window: vsynced, and on wasm bound to the `#bevy` canvas sized by
/// its parent element.
pub fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "Point Cloud Viewer".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}

/// Scale factor override that keeps the surface at or below `max_ratio`
/// device pixels per logical pixel. `None` leaves the platform ratio alone.
pub fn pixel_ratio_override(base_ratio: f32, max_ratio: f32) -> Option<f32> {
    (base_ratio > max_ratio).then_some(max_ratio)
}

/// Cap the primary window's pixel ratio. High-density displays otherwise
/// shade several times the fragments for little visible gain.
pub fn cap_pixel_ratio(
    settings: Res<ViewerSettings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.single_mut() else {
        return;
    };

    let wanted = pixel_ratio_override(window.resolution.base_scale_factor(), settings.max_pixel_ratio);
    if window.resolution.scale_factor_override() != wanted {
        debug!("Pixel ratio override set to {:?}", wanted);
        window.resolution.set_scale_factor_override(wanted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped_only_above_the_limit() {
        assert_eq!(pixel_ratio_override(3.0, 1.5), Some(1.5));
        assert_eq!(pixel_ratio_override(2.0, 1.5), Some(1.5));
        assert_eq!(pixel_ratio_override(1.5, 1.5), None);
        assert_eq!(pixel_ratio_override(1.0, 1.5), None);
    }

    fn window_app(base_ratio: f32) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<ViewerSettings>()
            .add_systems(Update, cap_pixel_ratio);

        let mut window = Window::default();
        window.resolution.set_scale_factor(base_ratio);
        app.world_mut().spawn((window, PrimaryWindow));
        app
    }

    fn scale_factor(app: &mut App) -> (Option<f32>, f32) {
        let world = app.world_mut();
        let mut windows = world.query_filtered::<&Window, With<PrimaryWindow>>();
        let Ok(window) = windows.single(world) else {
            panic!("primary window missing");
        };
        (
            window.resolution.scale_factor_override(),
            window.resolution.scale_factor(),
        )
    }

    #[test]
    fn dense_display_renders_at_capped_ratio() {
        let mut app = window_app(2.0);
        app.update();

        assert_eq!(scale_factor(&mut app), (Some(1.5), 1.5));
    }

    #[test]
    fn standard_display_keeps_its_ratio() {
        let mut app = window_app(1.0);
        app.update();

        assert_eq!(scale_factor(&mut app), (None, 1.0));
    }
}
