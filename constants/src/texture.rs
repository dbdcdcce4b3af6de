/// Width of the sensor frame feeding the viewer (one point per depth pixel).
pub const SOURCE_WIDTH: u32 = 1280;

/// Height of the sensor frame feeding the viewer.
pub const SOURCE_HEIGHT: u32 = 720;

/// Maximum points a single sensor frame can produce
pub const MAX_POINTS: usize = SOURCE_WIDTH as usize * SOURCE_HEIGHT as usize;

/// Largest texture edge the point texture may use (WebGPU default limit)
pub const MAX_TEXTURE_DIMENSION: u32 = 8192;

/// Most points the point texture can address: one texel each in a
/// `MAX_TEXTURE_DIMENSION` square.
pub const MAX_POINT_CAPACITY: usize = MAX_TEXTURE_DIMENSION as usize * MAX_TEXTURE_DIMENSION as usize;
