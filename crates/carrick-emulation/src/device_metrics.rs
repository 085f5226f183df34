//! Device metrics used for mobile emulation overrides.

/// Screen and input characteristics of an emulated device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMetrics {
    pub width: u64,
    pub height: u64,
    pub device_scale_factor: f64,
    pub touch: bool,
    pub mobile: bool,
    pub fit_window: bool,
    pub text_autosizing: bool,
    pub font_scale_factor: f64,
}

impl DeviceMetrics {
    pub fn new(width: u64, height: u64, device_scale_factor: f64, touch: bool, mobile: bool) -> Self {
        Self {
            width,
            height,
            device_scale_factor,
            touch,
            mobile,
            fit_window: false,
            text_autosizing: true,
            font_scale_factor: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_defaults() {
        let metrics = DeviceMetrics::new(360, 640, 2.0, true, true);
        assert_eq!(metrics.width, 360);
        assert_eq!(metrics.height, 640);
        assert!(!metrics.fit_window);
        assert!(metrics.text_autosizing);
        assert!((metrics.font_scale_factor - 1.0).abs() < f64::EPSILON);
    }
}
