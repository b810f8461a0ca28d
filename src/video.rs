//! # Video Sources and Frame Handoff
//!
//! A [`VideoSource`] decodes frames on its own schedule, usually on a background thread,
//! and hands each one to a [`FrameProducer`]. The renderer holds the matching
//! [`FrameConsumer`] and pulls at most one frame per render.
//!
//! The slot between them is one frame deep. Publishing over a frame the renderer has not
//! picked up yet replaces it, so a slow renderer drops frames instead of queueing them, and
//! every frame it does see is the newest one, delivered exactly once.
//!
//! Failures on the producer side are reported through [`FrameProducer::fail`]; the renderer
//! keeps drawing whatever texture it already has and shows the failure in
//! [`VideoStatus::Failed`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nalgebra_glm as glm;

use crate::error::VideoError;

/// One decoded RGBA8 frame together with the texture-coordinate transform it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub transform: glm::Mat4,
}

impl VideoFrame {
    /// Wraps row-0-at-top RGBA8 pixels, which need [`top_down_transform`].
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, VideoError> {
        Self::with_transform(width, height, pixels, top_down_transform())
    }

    pub fn with_transform(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        transform: glm::Mat4,
    ) -> Result<Self, VideoError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(VideoError::InvalidFrame {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            transform,
        })
    }
}

/// Flips `v` so that texture coordinate `v = 1` samples the first pixel row.
pub fn top_down_transform() -> glm::Mat4 {
    glm::Mat4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, 1.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<VideoFrame>,
    error: Option<VideoError>,
    published: u64,
    dropped: u64,
    consumer_gone: bool,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a connected producer/consumer pair around an empty slot.
pub fn frame_slot() -> (FrameProducer, FrameConsumer) {
    let slot = Arc::new(Mutex::new(Slot::default()));
    (
        FrameProducer { slot: slot.clone() },
        FrameConsumer { slot },
    )
}

/// Decoder side of the slot. Cheap to clone into a worker thread.
#[derive(Debug, Clone)]
pub struct FrameProducer {
    slot: Arc<Mutex<Slot>>,
}

impl FrameProducer {
    /// Frame-available callback: stores `frame` as the newest one.
    pub fn publish(&self, frame: VideoFrame) {
        let mut slot = lock(&self.slot);
        if slot.frame.replace(frame).is_some() {
            slot.dropped += 1;
        }
        slot.published += 1;
    }

    pub fn fail(&self, error: VideoError) {
        log::error!("video source failed: {error}");
        lock(&self.slot).error = Some(error);
    }

    /// `false` once the [`FrameConsumer`] was dropped, however many producer clones remain.
    pub fn is_connected(&self) -> bool {
        !lock(&self.slot).consumer_gone
    }
}

/// Renderer side of the slot.
#[derive(Debug)]
pub struct FrameConsumer {
    slot: Arc<Mutex<Slot>>,
}

impl FrameConsumer {
    /// Takes the pending frame, if any. The same frame is never returned twice.
    pub fn take_latest(&self) -> Option<VideoFrame> {
        lock(&self.slot).frame.take()
    }

    pub fn take_error(&self) -> Option<VideoError> {
        lock(&self.slot).error.take()
    }

    /// Frames published so far and how many of them were overwritten unseen.
    pub fn counters(&self) -> (u64, u64) {
        let slot = lock(&self.slot);
        (slot.published, slot.dropped)
    }
}

impl Drop for FrameConsumer {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        slot.consumer_gone = true;
        slot.frame = None;
    }
}

/// Playback state as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    /// No source attached, or no frame arrived yet.
    Waiting,
    Playing { frames: u64 },
    Failed(String),
}

/// Something that decodes frames into a [`FrameProducer`].
pub trait VideoSource {
    /// Starts decoding without blocking. Playback begins as soon as the source is ready.
    ///
    /// Called again on every resume with a fresh producer; implementations drop any
    /// previous producer.
    fn prepare(&mut self, producer: FrameProducer) -> Result<(), VideoError>;

    /// Stops decoding. The default does nothing.
    fn stop(&mut self) {}
}

/// Animated equirectangular test card: longitude bands, a latitude grid and a marker that
/// circles the equator.
#[derive(Debug)]
pub struct PatternSource {
    width: u32,
    height: u32,
    #[cfg(not(target_arch = "wasm32"))]
    frame_interval: std::time::Duration,
    #[cfg(not(target_arch = "wasm32"))]
    worker: Option<worker::Worker>,
}

impl PatternSource {
    /// `frames_per_second` only paces the desktop worker. On the web a single frame is shown.
    pub fn new(width: u32, height: u32, frames_per_second: u32) -> Self {
        #[cfg(target_arch = "wasm32")]
        let _ = frames_per_second;
        Self {
            width: width.max(2),
            height: height.max(1),
            #[cfg(not(target_arch = "wasm32"))]
            frame_interval: std::time::Duration::from_secs(1) / frames_per_second.max(1),
            #[cfg(not(target_arch = "wasm32"))]
            worker: None,
        }
    }
}

impl Default for PatternSource {
    fn default() -> Self {
        Self::new(1024, 512, 30)
    }
}

impl VideoSource for PatternSource {
    #[cfg(not(target_arch = "wasm32"))]
    fn prepare(&mut self, producer: FrameProducer) -> Result<(), VideoError> {
        self.stop();
        let (width, height, interval) = (self.width, self.height, self.frame_interval);
        self.worker = Some(worker::Worker::spawn("pattern-source", move |stop| {
            let mut tick = 0u64;
            while !stop.is_stopped() && producer.is_connected() {
                producer.publish(pattern_frame(width, height, tick));
                tick += 1;
                std::thread::sleep(interval);
            }
            log::debug!("pattern source stopped after {tick} frames");
        })?);
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn prepare(&mut self, producer: FrameProducer) -> Result<(), VideoError> {
        // No threads here; a single still frame stands in for playback.
        producer.publish(pattern_frame(self.width, self.height, 0));
        Ok(())
    }

    fn stop(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }
}

impl Drop for PatternSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Renders test card frame number `tick`.
pub fn pattern_frame(width: u32, height: u32, tick: u64) -> VideoFrame {
    const BANDS: [[u8; 3]; 6] = [
        [220, 60, 60],
        [230, 160, 40],
        [210, 210, 60],
        [60, 180, 90],
        [60, 120, 220],
        [150, 80, 200],
    ];

    let marker_column = (tick % u64::from(width)) as u32;
    let marker_half_width = (width / 64).max(1);
    let grid_every_row = (height / 12).max(1);
    let grid_every_column = (width / 24).max(1);

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for row in 0..height {
        for column in 0..width {
            let band = (column as usize * BANDS.len()) / width as usize;
            let mut rgb = BANDS[band];

            if row % grid_every_row == 0 || column % grid_every_column == 0 {
                rgb = [30, 30, 30];
            }

            let equator = row.abs_diff(height / 2) <= marker_half_width;
            if equator && column.abs_diff(marker_column) <= marker_half_width {
                rgb = [255, 255, 255];
            }

            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }

    VideoFrame {
        width,
        height,
        pixels,
        transform: top_down_transform(),
    }
}

/// Plays a single equirectangular still image, decoded in the background.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct ImageSource {
    path: std::path::PathBuf,
    max_dimension: u32,
    worker: Option<worker::Worker>,
}

#[cfg(not(target_arch = "wasm32"))]
impl ImageSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_dimension: 4096,
            worker: None,
        }
    }

    /// Images larger than this along either axis are scaled down before upload.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl VideoSource for ImageSource {
    fn prepare(&mut self, producer: FrameProducer) -> Result<(), VideoError> {
        self.stop();

        // Open up front so a missing file fails the prepare call itself.
        let file = std::fs::File::open(&self.path).map_err(|source| VideoError::Open {
            path: self.path.clone(),
            source,
        })?;

        let path = self.path.clone();
        let max_dimension = self.max_dimension;
        self.worker = Some(worker::Worker::spawn("image-source", move |_stop| {
            log::info!("decoding {} in the background", path.display());
            match decode_image(file, max_dimension) {
                Ok(frame) => {
                    log::info!("decoded {}x{} frame", frame.width, frame.height);
                    producer.publish(frame);
                }
                Err(e) => producer.fail(e),
            }
        })?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Drop for ImageSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn decode_image(file: std::fs::File, max_dimension: u32) -> Result<VideoFrame, VideoError> {
    let image = image::ImageReader::new(std::io::BufReader::new(file))
        .with_guessed_format()
        .map_err(|e| VideoError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| VideoError::Decode(e.to_string()))?;

    let image = if image.width() > max_dimension || image.height() > max_dimension {
        log::warn!(
            "image {}x{} exceeds {max_dimension}, scaling down",
            image.width(),
            image.height()
        );
        image.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Triangle,
        )
    } else {
        image
    };

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    VideoFrame::new(width, height, rgba.into_raw())
}

#[cfg(not(target_arch = "wasm32"))]
mod worker {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::JoinHandle;

    use crate::error::VideoError;

    #[derive(Debug, Clone)]
    pub struct StopFlag(Arc<AtomicBool>);

    impl StopFlag {
        pub fn is_stopped(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }

    /// Background decode thread with a cooperative stop flag.
    #[derive(Debug)]
    pub struct Worker {
        stop: StopFlag,
        handle: JoinHandle<()>,
    }

    impl Worker {
        pub fn spawn(
            name: &str,
            body: impl FnOnce(StopFlag) + Send + 'static,
        ) -> Result<Self, VideoError> {
            let stop = StopFlag(Arc::new(AtomicBool::new(false)));
            let flag = stop.clone();
            let handle = std::thread::Builder::new()
                .name(name.to_owned())
                .spawn(move || body(flag))
                .map_err(|e| VideoError::Unsupported(format!("cannot start {name}: {e}")))?;
            Ok(Self { stop, handle })
        }

        pub fn stop(self) {
            self.stop.0.store(true, Ordering::Release);
            if self.handle.join().is_err() {
                log::error!("video worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> VideoFrame {
        VideoFrame::new(1, 1, vec![tag, 0, 0, 255]).unwrap()
    }

    #[test]
    fn frame_size_is_validated() {
        assert!(VideoFrame::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            VideoFrame::new(2, 2, vec![0; 15]),
            Err(VideoError::InvalidFrame {
                expected: 16,
                actual: 15,
                ..
            })
        ));
        assert!(VideoFrame::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn top_down_transform_flips_v_only() {
        let m = top_down_transform();
        let top = m * glm::vec4(0.25, 1.0, 0.0, 1.0);
        assert!((top.x - 0.25).abs() < 1e-6);
        assert!(top.y.abs() < 1e-6);
        let bottom = m * glm::vec4(0.75, 0.0, 0.0, 1.0);
        assert!((bottom.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn each_frame_is_taken_exactly_once() {
        let (producer, consumer) = frame_slot();
        assert!(consumer.take_latest().is_none());

        producer.publish(frame(1));
        assert_eq!(consumer.take_latest(), Some(frame(1)));
        assert!(consumer.take_latest().is_none());
    }

    #[test]
    fn unconsumed_frames_are_overwritten_by_newer_ones() {
        let (producer, consumer) = frame_slot();
        producer.publish(frame(1));
        producer.publish(frame(2));
        producer.publish(frame(3));
        assert_eq!(consumer.take_latest(), Some(frame(3)));
        assert_eq!(consumer.counters(), (3, 2));
    }

    #[test]
    fn errors_are_reported_once() {
        let (producer, consumer) = frame_slot();
        producer.fail(VideoError::Decode("bad header".into()));
        assert!(matches!(consumer.take_error(), Some(VideoError::Decode(_))));
        assert!(consumer.take_error().is_none());
    }

    #[test]
    fn producer_notices_a_dropped_consumer() {
        let (producer, consumer) = frame_slot();
        assert!(producer.is_connected());
        drop(consumer);
        assert!(!producer.is_connected());
    }

    #[test]
    fn every_producer_clone_notices_a_dropped_consumer() {
        let (producer, consumer) = frame_slot();
        let worker_side = producer.clone();
        assert!(producer.is_connected() && worker_side.is_connected());
        drop(consumer);
        assert!(!producer.is_connected());
        assert!(!worker_side.is_connected());
    }

    #[test]
    fn pattern_worker_exits_when_the_renderer_side_goes_away() {
        let (producer, consumer) = frame_slot();
        let mut source = PatternSource::new(8, 4, 1000);
        source.prepare(producer.clone()).unwrap();
        drop(consumer);
        // The worker loop checks the connection on every frame; joining must not hang.
        source.stop();
        assert!(!producer.is_connected());
    }

    #[test]
    fn producer_thread_hands_over_the_newest_frame() {
        let (producer, consumer) = frame_slot();
        let worker = std::thread::spawn(move || {
            for tag in 0..=50u8 {
                producer.publish(frame(tag));
            }
        });
        worker.join().unwrap();
        assert_eq!(consumer.take_latest(), Some(frame(50)));
        assert_eq!(consumer.counters().0, 51);
    }

    #[test]
    fn pattern_frames_are_well_formed_and_animated() {
        let first = pattern_frame(64, 32, 0);
        let later = pattern_frame(64, 32, 10);
        assert_eq!(first.pixels.len(), 64 * 32 * 4);
        assert!(VideoFrame::with_transform(64, 32, first.pixels.clone(), first.transform).is_ok());
        assert_ne!(first.pixels, later.pixels);
        assert!(first.pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn pattern_source_plays_until_stopped() {
        let (producer, consumer) = frame_slot();
        let mut source = PatternSource::new(16, 8, 200);
        source.prepare(producer).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let frame = loop {
            if let Some(frame) = consumer.take_latest() {
                break frame;
            }
            assert!(std::time::Instant::now() < deadline, "no frame published");
            std::thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!((frame.width, frame.height), (16, 8));

        source.stop();
        let (published, _) = consumer.counters();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(consumer.counters().0, published);
    }

    #[test]
    fn image_source_reports_missing_files_from_prepare() {
        let (producer, _consumer) = frame_slot();
        let mut source = ImageSource::new("/definitely/not/here.png");
        assert!(matches!(
            source.prepare(producer),
            Err(VideoError::Open { .. })
        ));
    }

    fn temp_image_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sphere-video-{}-{name}.png", std::process::id()))
    }

    #[test]
    fn image_source_publishes_the_decoded_image() {
        let path = temp_image_path("small");
        let image = image::RgbaImage::from_fn(3, 2, |x, y| {
            image::Rgba([x as u8 * 80, y as u8 * 100, 7, 255])
        });
        image.save(&path).unwrap();

        let (producer, consumer) = frame_slot();
        let mut source = ImageSource::new(&path);
        source.prepare(producer).unwrap();
        // Joins the decode thread.
        source.stop();

        assert!(consumer.take_error().is_none());
        let frame = consumer.take_latest().expect("decoded frame");
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.pixels, image.into_raw());
        assert_eq!(frame.transform, top_down_transform());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn image_source_scales_large_images_down_keeping_the_aspect_ratio() {
        let path = temp_image_path("wide");
        image::RgbaImage::from_pixel(16, 8, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let (producer, consumer) = frame_slot();
        let mut source = ImageSource::new(&path).with_max_dimension(4);
        source.prepare(producer).unwrap();
        source.stop();

        let frame = consumer.take_latest().expect("decoded frame");
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn image_source_reports_undecodable_files_through_the_slot() {
        let path = temp_image_path("garbage");
        std::fs::write(&path, b"not an image").unwrap();

        let (producer, consumer) = frame_slot();
        let mut source = ImageSource::new(&path);
        source.prepare(producer).unwrap();
        source.stop();

        assert!(matches!(consumer.take_error(), Some(VideoError::Decode(_))));
        assert!(consumer.take_latest().is_none());
        let _ = std::fs::remove_file(path);
    }
}
