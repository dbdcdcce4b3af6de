/// Size attribute every point starts with, in display units
pub const DEFAULT_POINT_SIZE: f32 = 1.5;

/// Numerator of the perspective size falloff: `size * (scale / depth)` pixels.
pub const POINT_SIZE_SCALE: f32 = 3.0;

/// Sprite palette (linear RGB): warm orange fill, dark brown border.
pub const POINT_FILL_COLOUR: [f32; 3] = [1.0, 0.4, 0.0];
pub const POINT_BORDER_COLOUR: [f32; 3] = [0.2, 0.08, 0.0];

/// Radial sprite profile, as a fraction of the sprite footprint.
pub const SPRITE_BORDER_START: f32 = 0.3;
pub const SPRITE_BORDER_END: f32 = 0.45;
pub const SPRITE_RADIUS: f32 = 0.5;

/// Scene background, sRGB `#0a0a0f`.
pub const BACKGROUND_COLOUR: [f32; 3] = [10.0 / 255.0, 10.0 / 255.0, 15.0 / 255.0];

pub const GRID_SIZE: f32 = 10.0;
pub const GRID_DIVISIONS: u32 = 20;
/// sRGB `#303040`
pub const GRID_CENTRE_LINE_COLOUR: [f32; 3] = [48.0 / 255.0, 48.0 / 255.0, 64.0 / 255.0];
/// sRGB `#202030`
pub const GRID_LINE_COLOUR: [f32; 3] = [32.0 / 255.0, 32.0 / 255.0, 48.0 / 255.0];

pub const AXES_LENGTH: f32 = 1.0;

/// Highest device pixel ratio the canvas renders at; denser displays are
/// upscaled to save fill-rate.
pub const MAX_PIXEL_RATIO: f32 = 1.5;

/// Delay before the single re-check of a zero-sized host surface.
pub const SURFACE_RETRY_DELAY_MS: u64 = 100;

/// Fraction of pending orbit/pan/zoom motion applied per frame.
pub const CAMERA_DAMPING_FACTOR: f32 = 0.05;
pub const CAMERA_ROTATE_SPEED: f32 = 1.0;
pub const CAMERA_PAN_SPEED: f32 = 1.0;
pub const CAMERA_ZOOM_SPEED: f32 = 1.0;
pub const CAMERA_MIN_DISTANCE: f32 = 0.05;
pub const CAMERA_MAX_DISTANCE: f32 = 500.0;
