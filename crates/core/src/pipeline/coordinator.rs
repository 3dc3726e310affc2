use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::detection::domain::face_detector::{FaceDetection, FaceDetector};
use crate::detection::domain::region_builder::{FacialRegionBuilder, FacialRegions};
use crate::io::domain::messages::{PolygonMessage, StatusMessage};
use crate::io::domain::publisher::NodeOutputs;
use crate::shared::frame::ThermalFrame;
use crate::shared::region::RegionRect;
use crate::tracking::domain::region_tracker::RegionTracker;

use super::config::CoordinatorConfig;
use super::normalize;
use super::overlay;

/// Glue between detection and tracking.
///
/// Per frame: gate on the enable toggle and timestamp continuity,
/// normalize, then either advance the two region trackers (cheap path) or
/// re-run detection and re-seed them. All outcomes publish; nothing is
/// returned to the caller and no per-frame failure is fatal.
pub struct TrackingCoordinator {
    config: CoordinatorConfig,
    builder: FacialRegionBuilder,
    detector: Box<dyn FaceDetector>,
    eye_tracker: Box<dyn RegionTracker>,
    mouth_tracker: Box<dyn RegionTracker>,
    outputs: NodeOutputs,
    enabled: Arc<AtomicBool>,
    last_stamp: Option<f64>,
    last_detection_stamp: Option<f64>,
    eye_valid: bool,
    mouth_valid: bool,
}

impl TrackingCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        detector: Box<dyn FaceDetector>,
        eye_tracker: Box<dyn RegionTracker>,
        mouth_tracker: Box<dyn RegionTracker>,
        outputs: NodeOutputs,
    ) -> Self {
        let builder = FacialRegionBuilder::new(config.eye, config.mouth);
        Self {
            config,
            builder,
            detector,
            eye_tracker,
            mouth_tracker,
            outputs,
            enabled: Arc::new(AtomicBool::new(true)),
            last_stamp: None,
            last_detection_stamp: None,
            eye_valid: false,
            mouth_valid: false,
        }
    }

    /// Shared handle for toggling processing from another callback context.
    pub fn enabled_handle(&self) -> Arc<AtomicBool> {
        self.enabled.clone()
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
    }

    pub fn has_valid_trackers(&self) -> bool {
        self.eye_valid && self.mouth_valid
    }

    /// Forgets all session state: timestamps and tracker validity.
    pub fn reset(&mut self) {
        self.last_stamp = None;
        self.last_detection_stamp = None;
        self.invalidate_trackers();
    }

    pub fn process_frame(&mut self, frame: &ThermalFrame) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let stamp = frame.stamp();

        if !self.temporal_gate(stamp) {
            self.last_stamp = Some(stamp);
            self.publish_status(stamp, false);
            return;
        }
        self.last_stamp = Some(stamp);

        let Some(normalized) = normalize::rescale_full_range(frame) else {
            log::warn!("blank frame at {stamp:.3}s: zero dynamic range");
            self.invalidate_trackers();
            self.publish_status(stamp, false);
            return;
        };

        self.outputs
            .rescaled_image
            .publish(normalize::to_mono8(&normalized));

        if self.should_track(stamp) {
            self.run_tracking(&normalized, stamp);
        } else {
            self.run_detection(&normalized, stamp);
        }
    }

    /// Returns false when the frame must be rejected; resets on every
    /// rejection so a discontinuity never leaks stale tracker state.
    fn temporal_gate(&mut self, stamp: f64) -> bool {
        let Some(last) = self.last_stamp else {
            log::warn!("first frame at {stamp:.3}s: waiting for stream continuity");
            self.reset();
            return false;
        };
        if stamp < last {
            log::warn!("timestamp jumped backward ({last:.3}s -> {stamp:.3}s): resetting");
            self.reset();
            return false;
        }
        if stamp - last > self.config.frame_dropout_secs {
            log::warn!(
                "frame dropout of {:.3}s (threshold {:.3}s): resetting",
                stamp - last,
                self.config.frame_dropout_secs
            );
            self.reset();
            return false;
        }
        true
    }

    fn should_track(&self, stamp: f64) -> bool {
        self.eye_valid
            && self.mouth_valid
            && self
                .last_detection_stamp
                .is_some_and(|d| stamp - d <= self.config.detection_recency_secs)
    }

    fn run_tracking(&mut self, frame: &ThermalFrame, stamp: f64) {
        let eye = self.eye_tracker.update(frame);
        let mouth = self.mouth_tracker.update(frame);

        match (eye, mouth) {
            (Some(eye), Some(mouth)) => {
                let mut debug = normalize::to_mono8(frame);
                overlay::draw_rect(&mut debug, &eye, overlay::REGION_VALUE);
                overlay::draw_rect(&mut debug, &mouth, overlay::REGION_VALUE);
                self.outputs.debug_image.publish(debug);

                self.publish_regions(stamp, &eye, &mouth);
                self.publish_status(stamp, true);
            }
            _ => {
                // Never keep one tracker alive: the regions must come from
                // a single detection event.
                log::warn!("tracker lost at {stamp:.3}s; re-detecting next frame");
                self.invalidate_trackers();
                self.outputs.debug_image.publish(normalize::to_mono8(frame));
                self.publish_status(stamp, false);
            }
        }
    }

    fn run_detection(&mut self, frame: &ThermalFrame, stamp: f64) {
        self.invalidate_trackers();

        let detections = match self.detector.detect(frame) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("detector failed at {stamp:.3}s: {e}");
                self.outputs.debug_image.publish(normalize::to_mono8(frame));
                self.publish_status(stamp, false);
                return;
            }
        };

        let mut debug = normalize::to_mono8(frame);
        overlay::draw_detections(&mut debug, &detections);

        match self.seed_trackers(frame, stamp, &detections) {
            Some(regions) => {
                overlay::draw_rect(&mut debug, &regions.eye, overlay::REGION_VALUE);
                overlay::draw_rect(&mut debug, &regions.mouth, overlay::REGION_VALUE);
                self.outputs.debug_image.publish(debug);

                self.eye_valid = true;
                self.mouth_valid = true;
                self.last_detection_stamp = Some(stamp);
                self.publish_regions(stamp, &regions.eye, &regions.mouth);
                self.publish_status(stamp, true);
            }
            None => {
                self.outputs.debug_image.publish(debug);
                self.last_detection_stamp = None;
                self.publish_status(stamp, false);
            }
        }
    }

    /// Picks the first face, derives both regions, and initializes the
    /// trackers. `None` on any rejection (no face, undersized face,
    /// unusable landmarks).
    fn seed_trackers(
        &mut self,
        frame: &ThermalFrame,
        stamp: f64,
        detections: &[FaceDetection],
    ) -> Option<FacialRegions> {
        let Some(first) = detections.first() else {
            log::warn!("no face detected at {stamp:.3}s");
            return None;
        };
        if detections.len() > 1 {
            // Provisional: first face wins; multi-face selection is
            // intentionally unspecified.
            log::debug!(
                "using first of {} detected faces at {stamp:.3}s",
                detections.len()
            );
        }

        let min = self.config.min_face_side_px as f64;
        if first.width() < min || first.height() < min {
            log::warn!(
                "face {:.0}x{:.0}px below {}px minimum at {stamp:.3}s",
                first.width(),
                first.height(),
                self.config.min_face_side_px
            );
            return None;
        }

        let Some(landmarks) = first.landmarks.as_ref() else {
            log::warn!("detection without landmarks at {stamp:.3}s");
            return None;
        };
        let Some(regions) = self
            .builder
            .build(first.bbox, landmarks, frame.width(), frame.height())
        else {
            log::warn!("landmarks not visible enough to derive regions at {stamp:.3}s");
            return None;
        };
        if regions.eye.is_empty() || regions.mouth.is_empty() {
            log::warn!("derived region clamped away at {stamp:.3}s");
            return None;
        }

        self.eye_tracker.init(frame, regions.eye);
        self.mouth_tracker.init(frame, regions.mouth);
        Some(regions)
    }

    fn invalidate_trackers(&mut self) {
        self.eye_valid = false;
        self.mouth_valid = false;
    }

    fn publish_regions(&self, stamp: f64, eye: &RegionRect, mouth: &RegionRect) {
        self.outputs
            .eye_region
            .publish(PolygonMessage::from_region(stamp, eye));
        self.outputs
            .mouth_region
            .publish(PolygonMessage::from_region(stamp, mouth));
    }

    fn publish_status(&self, stamp: f64, detected: bool) {
        self.outputs.status.publish(StatusMessage { stamp, detected });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::detection::domain::face_landmarks::FaceLandmarks;
    use crate::io::domain::messages::ImageMessage;
    use crate::io::domain::publisher::Publisher;
    use crate::shared::region::RegionRect;

    const W: u32 = 160;
    const H: u32 = 120;

    // --- Stubs ---

    struct ScriptedDetector {
        results: Vec<Vec<FaceDetection>>,
        calls: Arc<Mutex<usize>>,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _frame: &ThermalFrame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            let mut calls = self.calls.lock().unwrap();
            let result = if self.results.is_empty() {
                Vec::new()
            } else {
                self.results[*calls % self.results.len()].clone()
            };
            *calls += 1;
            Ok(result)
        }
    }

    struct FailingDetector {
        calls: Arc<Mutex<usize>>,
    }

    impl FaceDetector for FailingDetector {
        fn detect(
            &mut self,
            _frame: &ThermalFrame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            *self.calls.lock().unwrap() += 1;
            Err("model exploded".into())
        }
    }

    /// Follows the scripted update results; once the script runs dry it
    /// keeps returning the region it was last initialized with.
    struct ScriptedTracker {
        inits: Arc<Mutex<Vec<RegionRect>>>,
        script: Arc<Mutex<VecDeque<Option<RegionRect>>>>,
        current: Option<RegionRect>,
    }

    impl ScriptedTracker {
        fn new() -> (Self, Arc<Mutex<Vec<RegionRect>>>, Arc<Mutex<VecDeque<Option<RegionRect>>>>) {
            let inits = Arc::new(Mutex::new(Vec::new()));
            let script = Arc::new(Mutex::new(VecDeque::new()));
            (
                Self {
                    inits: inits.clone(),
                    script: script.clone(),
                    current: None,
                },
                inits,
                script,
            )
        }
    }

    impl RegionTracker for ScriptedTracker {
        fn init(&mut self, _frame: &ThermalFrame, region: RegionRect) {
            self.inits.lock().unwrap().push(region);
            self.current = Some(region);
        }

        fn update(&mut self, _frame: &ThermalFrame) -> Option<RegionRect> {
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                self.current = next;
            }
            self.current
        }
    }

    struct CapturingPublisher<T> {
        sent: Arc<Mutex<Vec<T>>>,
    }

    impl<T: Send> Publisher<T> for CapturingPublisher<T> {
        fn publish(&self, msg: T) {
            self.sent.lock().unwrap().push(msg);
        }
    }

    #[allow(clippy::type_complexity)]
    struct Captured {
        eye: Arc<Mutex<Vec<PolygonMessage>>>,
        mouth: Arc<Mutex<Vec<PolygonMessage>>>,
        rescaled: Arc<Mutex<Vec<ImageMessage>>>,
        debug: Arc<Mutex<Vec<ImageMessage>>>,
        status: Arc<Mutex<Vec<StatusMessage>>>,
    }

    impl Captured {
        fn statuses(&self) -> Vec<bool> {
            self.status.lock().unwrap().iter().map(|s| s.detected).collect()
        }
    }

    fn outputs() -> (NodeOutputs, Captured) {
        let eye = Arc::new(Mutex::new(Vec::new()));
        let mouth = Arc::new(Mutex::new(Vec::new()));
        let rescaled = Arc::new(Mutex::new(Vec::new()));
        let debug = Arc::new(Mutex::new(Vec::new()));
        let status = Arc::new(Mutex::new(Vec::new()));
        (
            NodeOutputs {
                eye_region: Box::new(CapturingPublisher { sent: eye.clone() }),
                mouth_region: Box::new(CapturingPublisher { sent: mouth.clone() }),
                rescaled_image: Box::new(CapturingPublisher { sent: rescaled.clone() }),
                debug_image: Box::new(CapturingPublisher { sent: debug.clone() }),
                status: Box::new(CapturingPublisher { sent: status.clone() }),
            },
            Captured {
                eye,
                mouth,
                rescaled,
                debug,
                status,
            },
        )
    }

    // --- Helpers ---

    fn textured_frame(stamp: f64) -> ThermalFrame {
        let mut data = Vec::with_capacity((W * H) as usize);
        for y in 0..H {
            for x in 0..W {
                data.push(((x + y) * 199) as u16);
            }
        }
        ThermalFrame::new(data, W, H, stamp)
    }

    fn flat_frame(stamp: f64) -> ThermalFrame {
        ThermalFrame::new(vec![700u16; (W * H) as usize], W, H, stamp)
    }

    /// A well-formed face with landmarks laid out proportionally.
    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceDetection {
        let w = x2 - x1;
        let h = y2 - y1;
        FaceDetection {
            bbox: (x1, y1, x2, y2),
            confidence: 0.9,
            landmarks: Some(FaceLandmarks::new([
                (x1 + 0.3 * w, y1 + 0.35 * h),
                (x1 + 0.7 * w, y1 + 0.35 * h),
                (x1 + 0.5 * w, y1 + 0.55 * h),
                (x1 + 0.4 * w, y1 + 0.75 * h),
                (x1 + 0.6 * w, y1 + 0.75 * h),
            ])),
        }
    }

    struct Fixture {
        coordinator: TrackingCoordinator,
        captured: Captured,
        detector_calls: Arc<Mutex<usize>>,
        eye_script: Arc<Mutex<VecDeque<Option<RegionRect>>>>,
        mouth_script: Arc<Mutex<VecDeque<Option<RegionRect>>>>,
    }

    fn fixture_with(config: CoordinatorConfig, results: Vec<Vec<FaceDetection>>) -> Fixture {
        let calls = Arc::new(Mutex::new(0));
        let detector = ScriptedDetector {
            results,
            calls: calls.clone(),
        };
        let (eye_tracker, _eye_inits, eye_script) = ScriptedTracker::new();
        let (mouth_tracker, _mouth_inits, mouth_script) = ScriptedTracker::new();
        let (outs, captured) = outputs();
        Fixture {
            coordinator: TrackingCoordinator::new(
                config,
                Box::new(detector),
                Box::new(eye_tracker),
                Box::new(mouth_tracker),
                outs,
            ),
            captured,
            detector_calls: calls,
            eye_script,
            mouth_script,
        }
    }

    fn fixture(results: Vec<Vec<FaceDetection>>) -> Fixture {
        fixture_with(CoordinatorConfig::default(), results)
    }

    fn detector_calls(f: &Fixture) -> usize {
        *f.detector_calls.lock().unwrap()
    }

    // --- Temporal gate ---

    #[test]
    fn test_first_frame_rejected_without_detection() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));

        assert_eq!(f.captured.statuses(), vec![false]);
        assert_eq!(detector_calls(&f), 0);
        assert!(f.captured.eye.lock().unwrap().is_empty());
    }

    #[test]
    fn test_second_frame_runs_detection() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, true]);
        assert_eq!(detector_calls(&f), 1);
        assert_eq!(f.captured.eye.lock().unwrap().len(), 1);
        assert_eq!(f.captured.mouth.lock().unwrap().len(), 1);
        assert!(f.coordinator.has_valid_trackers());
    }

    #[test]
    fn test_dropout_resets_even_with_valid_trackers() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // detect
        f.coordinator.process_frame(&textured_frame(5.0)); // dropout

        assert_eq!(f.captured.statuses(), vec![false, true, false]);
        assert!(!f.coordinator.has_valid_trackers());
        assert_eq!(detector_calls(&f), 1); // dropout frame never reaches the detector
    }

    #[test]
    fn test_backward_timestamp_resets() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(1.0));
        f.coordinator.process_frame(&textured_frame(1.1)); // detect
        f.coordinator.process_frame(&textured_frame(0.5)); // replay

        assert_eq!(f.captured.statuses(), vec![false, true, false]);
        assert!(!f.coordinator.has_valid_trackers());

        // Stream continues from the replayed clock: next frame detects again
        f.coordinator.process_frame(&textured_frame(0.6));
        assert_eq!(f.captured.statuses(), vec![false, true, false, true]);
        assert_eq!(detector_calls(&f), 2);
    }

    // --- Normalization ---

    #[test]
    fn test_blank_frame_rejected_before_detection() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&flat_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, false]);
        assert_eq!(detector_calls(&f), 0);
        assert!(f.captured.rescaled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rescaled_image_published_for_processed_frames() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        let rescaled = f.captured.rescaled.lock().unwrap();
        assert_eq!(rescaled.len(), 1);
        assert_eq!(rescaled[0].width, W);
        assert_eq!(rescaled[0].height, H);
        assert_eq!(rescaled[0].stamp, 0.1);
        // Full-range stretch: some pixel hits the ceiling
        assert!(rescaled[0].data.contains(&255));
    }

    // --- Detection handling ---

    #[test]
    fn test_zero_faces_gives_status_false_and_invalid_trackers() {
        let mut f = fixture(vec![vec![]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, false]);
        assert!(!f.coordinator.has_valid_trackers());
        assert!(f.captured.eye.lock().unwrap().is_empty());
    }

    #[test]
    fn test_undersized_face_rejected() {
        // 10x10 face, below the 24px default minimum
        let mut f = fixture(vec![vec![face(50.0, 50.0, 60.0, 60.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, false]);
        assert!(f.captured.eye.lock().unwrap().is_empty());
        assert!(f.captured.mouth.lock().unwrap().is_empty());
    }

    #[test]
    fn test_undersized_in_one_axis_rejected() {
        // Wide but short
        let mut f = fixture(vec![vec![face(30.0, 50.0, 130.0, 60.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, false]);
    }

    #[test]
    fn test_detection_without_landmarks_rejected() {
        let det = FaceDetection {
            bbox: (40.0, 30.0, 110.0, 100.0),
            confidence: 0.9,
            landmarks: None,
        };
        let mut f = fixture(vec![vec![det]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert_eq!(f.captured.statuses(), vec![false, false]);
    }

    #[test]
    fn test_detector_error_is_nonfatal() {
        let calls = Arc::new(Mutex::new(0));
        let detector = FailingDetector { calls: calls.clone() };
        let (eye_tracker, _, _) = ScriptedTracker::new();
        let (mouth_tracker, _, _) = ScriptedTracker::new();
        let (outs, captured) = outputs();
        let mut coordinator = TrackingCoordinator::new(
            CoordinatorConfig::default(),
            Box::new(detector),
            Box::new(eye_tracker),
            Box::new(mouth_tracker),
            outs,
        );

        coordinator.process_frame(&textured_frame(0.0));
        coordinator.process_frame(&textured_frame(0.1));
        coordinator.process_frame(&textured_frame(0.2));

        assert_eq!(
            captured.status.lock().unwrap().iter().map(|s| s.detected).collect::<Vec<_>>(),
            vec![false, false, false]
        );
        assert_eq!(*calls.lock().unwrap(), 2); // keeps retrying next frame
    }

    #[test]
    fn test_first_face_wins() {
        let near = face(20.0, 20.0, 90.0, 90.0);
        let far = face(100.0, 20.0, 150.0, 80.0);
        let mut f = fixture(vec![vec![near.clone(), far]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        let eye = f.captured.eye.lock().unwrap();
        assert_eq!(eye.len(), 1);
        // Eye region centered on the first face's eye midpoint (x=55)
        let mid_x = (eye[0].points[0].0 + eye[0].points[1].0) / 2;
        assert!((mid_x - 55).abs() <= 2, "eye region at x={mid_x}, expected ~55");
    }

    // --- Tracking path ---

    #[test]
    fn test_valid_trackers_skip_detection() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // detect + seed
        f.coordinator.process_frame(&textured_frame(0.2)); // track
        f.coordinator.process_frame(&textured_frame(0.3)); // track

        assert_eq!(detector_calls(&f), 1);
        assert_eq!(f.captured.statuses(), vec![false, true, true, true]);
        assert_eq!(f.captured.eye.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_tracked_regions_follow_tracker_output() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // seed

        let moved_eye = RegionRect::new(10, 12, 30, 14);
        let moved_mouth = RegionRect::new(20, 60, 24, 16);
        f.eye_script.lock().unwrap().push_back(Some(moved_eye));
        f.mouth_script.lock().unwrap().push_back(Some(moved_mouth));

        f.coordinator.process_frame(&textured_frame(0.2));

        let eye = f.captured.eye.lock().unwrap();
        let mouth = f.captured.mouth.lock().unwrap();
        assert_eq!(eye[1].points, [(10, 12), (40, 26)]);
        assert_eq!(mouth[1].points, [(20, 60), (44, 76)]);
    }

    #[test]
    fn test_tracker_loss_invalidates_both_then_redetects() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // detect + seed

        f.eye_script.lock().unwrap().push_back(None); // eye tracker dies
        f.coordinator.process_frame(&textured_frame(0.2));

        assert_eq!(f.captured.statuses(), vec![false, true, false]);
        assert!(!f.coordinator.has_valid_trackers());
        assert_eq!(f.captured.eye.lock().unwrap().len(), 1); // no region this frame

        // Next frame goes back through detection
        f.coordinator.process_frame(&textured_frame(0.3));
        assert_eq!(detector_calls(&f), 2);
        assert_eq!(f.captured.statuses(), vec![false, true, false, true]);
    }

    #[test]
    fn test_recency_window_expiry_forces_redetection() {
        let config = CoordinatorConfig {
            frame_dropout_secs: 10.0,
            detection_recency_secs: 2.0,
            ..CoordinatorConfig::default()
        };
        let mut f = fixture_with(config, vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // detect at 0.1
        f.coordinator.process_frame(&textured_frame(1.0)); // track (0.9 since detect)
        f.coordinator.process_frame(&textured_frame(1.9)); // track (1.8 since detect)
        assert_eq!(detector_calls(&f), 1);

        f.coordinator.process_frame(&textured_frame(2.5)); // 2.4 since detect > 2.0
        assert_eq!(detector_calls(&f), 2);
        assert_eq!(f.captured.statuses(), vec![false, true, true, true, true]);
    }

    // --- Enable toggle ---

    #[test]
    fn test_disabled_ignores_frames_entirely() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.set_enabled(false);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        assert!(f.captured.status.lock().unwrap().is_empty());
        assert!(f.captured.rescaled.lock().unwrap().is_empty());
        assert_eq!(detector_calls(&f), 0);
    }

    #[test]
    fn test_reenable_starts_from_clean_state() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1)); // detect

        f.coordinator.set_enabled(false);
        f.coordinator.process_frame(&textured_frame(0.2));
        f.coordinator.set_enabled(true);

        // Wall clock moved past the dropout threshold while disabled
        f.coordinator.process_frame(&textured_frame(3.0));
        assert_eq!(f.captured.statuses(), vec![false, true, false]);
        assert!(!f.coordinator.has_valid_trackers());
    }

    #[test]
    fn test_enabled_handle_toggles_from_outside() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        let handle = f.coordinator.enabled_handle();
        handle.store(false, Ordering::Relaxed);
        f.coordinator.process_frame(&textured_frame(0.0));
        assert!(f.captured.status.lock().unwrap().is_empty());
    }

    // --- Publishing invariants ---

    #[test]
    fn test_eye_and_mouth_stamps_always_match() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        for i in 0..6 {
            f.coordinator.process_frame(&textured_frame(i as f64 * 0.1));
        }

        let eye = f.captured.eye.lock().unwrap();
        let mouth = f.captured.mouth.lock().unwrap();
        assert_eq!(eye.len(), mouth.len());
        for (e, m) in eye.iter().zip(mouth.iter()) {
            assert_eq!(e.stamp, m.stamp);
        }
    }

    #[test]
    fn test_debug_image_carries_region_overlay() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));

        let debug = f.captured.debug.lock().unwrap();
        assert_eq!(debug.len(), 1);
        assert!(
            debug[0].data.contains(&overlay::REGION_VALUE),
            "debug image should contain tracked-region outlines"
        );
        assert!(
            debug[0].data.contains(&overlay::DETECTION_VALUE),
            "debug image should contain detection annotations"
        );
    }

    #[test]
    fn test_status_published_every_processed_frame() {
        let mut f = fixture(vec![vec![]]);
        for i in 0..4 {
            f.coordinator.process_frame(&textured_frame(i as f64 * 0.1));
        }
        assert_eq!(f.captured.status.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_manual_reset_clears_state() {
        let mut f = fixture(vec![vec![face(40.0, 30.0, 110.0, 100.0)]]);
        f.coordinator.process_frame(&textured_frame(0.0));
        f.coordinator.process_frame(&textured_frame(0.1));
        assert!(f.coordinator.has_valid_trackers());

        f.coordinator.reset();
        assert!(!f.coordinator.has_valid_trackers());

        // Next frame is treated as a stream start again
        f.coordinator.process_frame(&textured_frame(0.2));
        assert_eq!(f.captured.statuses(), vec![false, true, false]);
    }
}
