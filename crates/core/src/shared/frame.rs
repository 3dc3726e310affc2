use ndarray::ArrayView2;

/// A single thermal camera frame: contiguous 16-bit intensities in
/// row-major order, stamped with the capture time in seconds.
///
/// Radiometric conversion happens at I/O boundaries only; the domain
/// layer treats intensities as opaque counts.
#[derive(Clone, Debug)]
pub struct ThermalFrame {
    data: Vec<u16>,
    width: u32,
    height: u32,
    stamp: f64,
}

impl ThermalFrame {
    pub fn new(data: Vec<u16>, width: u32, height: u32, stamp: f64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
            stamp,
        }
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capture time in seconds since an arbitrary epoch.
    pub fn stamp(&self) -> f64 {
        self.stamp
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u16> {
        ArrayView2::from_shape(self.shape(), &self.data)
            .expect("ThermalFrame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize) {
        (self.height as usize, self.width as usize)
    }
}
