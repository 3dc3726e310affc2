/// Pretrained face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing of mono16 thermal frames, inference,
/// and NMS post-processing. Expects a YOLO-style face model emitting
/// `[cx, cy, w, h, conf]` plus five landmark triples per candidate.
use std::path::Path;

use crate::detection::domain::face_detector::{FaceDetection, FaceDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::ThermalFrame;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoint values per detection (5 landmarks × 3: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Face detector backed by an ONNX Runtime session.
pub struct OnnxFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Load a face ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW). Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        // Try to read input size from model metadata (NCHW: [1, 3, H, W])
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    // shape is [N, C, H, W] — use H (square input expected)
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(
        &mut self,
        frame: &ThermalFrame,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // Output is [1, num_features, num_detections] (transposed) or
        // [1, num_detections, num_features]. Handle both.
        let (num_dets, num_feats) = if shape.len() == 3 {
            if shape[1] < shape[2] {
                (shape[2], shape[1])
            } else {
                (shape[1], shape[2])
            }
        } else {
            return Err(format!("unexpected model output shape: {shape:?}").into());
        };

        let data = tensor.as_slice().ok_or("cannot get tensor slice")?;
        let transposed = shape.len() == 3 && shape[1] < shape[2];

        // 3. Parse candidates
        let mut raw_dets = Vec::new();
        for i in 0..num_dets {
            let row = if transposed {
                (0..num_feats)
                    .map(|f| data[f * num_dets + i])
                    .collect::<Vec<f32>>()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };

            // row format: [cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]
            if row.len() < 5 {
                continue;
            }
            let conf = row[4] as f64;
            if conf < self.confidence {
                continue;
            }

            let cx = row[0] as f64;
            let cy = row[1] as f64;
            let w = row[2] as f64;
            let h = row[3] as f64;

            // Convert from letterbox coords back to original frame coords
            let x1 = ((cx - w / 2.0) - pad_x as f64) / scale;
            let y1 = ((cy - h / 2.0) - pad_y as f64) / scale;
            let x2 = ((cx + w / 2.0) - pad_x as f64) / scale;
            let y2 = ((cy + h / 2.0) - pad_y as f64) / scale;

            // Parse keypoints if present, filtering by confidence
            let keypoints = if row.len() >= 5 + NUM_KEYPOINT_VALUES {
                let mut pts = [(0.0f64, 0.0f64); 5];
                for k in 0..5 {
                    let kconf = row[5 + k * 3 + 2] as f64;
                    if kconf >= KEYPOINT_CONF_THRESH {
                        let kx = row[5 + k * 3] as f64;
                        let ky = row[5 + k * 3 + 1] as f64;
                        pts[k] = ((kx - pad_x as f64) / scale, (ky - pad_y as f64) / scale);
                    }
                    // else: pts[k] stays (0.0, 0.0), invisible per FaceLandmarks
                }
                Some(pts)
            } else {
                None
            };

            raw_dets.push(RawDetection {
                x1,
                y1,
                x2,
                y2,
                confidence: conf,
                keypoints,
            });
        }

        // 4. NMS, then map into domain detections
        let kept = nms(&mut raw_dets, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|d| FaceDetection {
                bbox: (d.x1, d.y1, d.x2, d.y2),
                confidence: d.confidence,
                landmarks: d.keypoints.map(FaceLandmarks::new),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a mono16 frame to `target_size` × `target_size`.
///
/// Intensities are scaled to [0, 1] and replicated across three channels,
/// since the pretrained model expects RGB-shaped input.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &ThermalFrame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Pad with mid-gray (114/255, YOLO convention)
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray(); // [H, W] u16
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            let value = src[[src_y, src_x]] as f32 / u16::MAX as f32;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = value;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: Option<[(f64, f64); 5]>,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] {
                continue;
            }
            let iou = bbox_iou(
                &[dets[i].x1, dets[i].y1, dets[i].x2, dets[i].y2],
                &[dets[j].x1, dets[j].y1, dets[j].x2, dets[j].y2],
            );
            if iou > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
