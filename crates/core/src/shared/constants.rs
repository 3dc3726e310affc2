pub const FACE_MODEL_NAME: &str = "yolov8n-face_thermal.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/thermotrack/thermotrack/releases/download/v0.1.0/yolov8n-face_thermal.onnx";

/// Frames further apart than this are treated as a stream dropout.
pub const FRAME_DROPOUT_SECS: f64 = 1.0;

/// Tracker output is trusted only while the last detection is this recent.
pub const DETECTION_RECENCY_SECS: f64 = 2.0;

/// Faces smaller than this in either axis are discarded as noise.
pub const MIN_FACE_SIDE_PX: i32 = 24;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Eye region half extents as fractions of the face box size.
pub const EYE_HALF_WIDTH_RATIO: f64 = 0.32;
pub const EYE_HALF_HEIGHT_RATIO: f64 = 0.14;

/// Mouth region half extents as fractions of the face box size.
pub const MOUTH_HALF_WIDTH_RATIO: f64 = 0.26;
pub const MOUTH_HALF_HEIGHT_RATIO: f64 = 0.18;

/// Half extents never shrink below this fraction of the landmark spread
/// (eye span, mouth span), so the region always covers both landmarks.
pub const SPAN_FLOOR_RATIO: f64 = 0.65;
