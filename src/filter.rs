#[allow(unused_imports)]
use micromath::F32Ext;

/// Generic scalar Kalman smoother. One instance per smoothed quantity;
/// assumes a roughly uniform call cadence, no internal timestamps.
pub struct KalmanSmoother {
    estimate: f32,
    error_covariance: f32,

    // Tunable parameters
    // Q: process noise. Higher Q = faster response, more noise passed through.
    q: f32,
    // R: measurement noise. Higher R = smoother but laggy.
    r: f32,

    initial_estimate: f32,
}

impl KalmanSmoother {
    pub fn new(q: f32, r: f32, initial_estimate: f32) -> Self {
        Self {
            estimate: initial_estimate,
            error_covariance: 1.0,
            q,
            r,
            initial_estimate,
        }
    }

    /// Predict/update with a new measurement, returns the smoothed estimate.
    pub fn update(&mut self, measurement: f32) -> f32 {
        // Predict: covariance grows by process noise
        self.error_covariance += self.q;

        // Gain
        let k = self.error_covariance / (self.error_covariance + self.r);

        // Correct
        self.estimate += k * (measurement - self.estimate);
        self.error_covariance *= 1.0 - k;

        self.estimate
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// Back to the configured initial estimate, covariance 1.
    pub fn reset(&mut self) {
        self.estimate = self.initial_estimate;
        self.error_covariance = 1.0;
    }
}

/// Biquad low-pass (Direct Form 2 Transposed), used to smooth vertical
/// acceleration before it is integrated.
pub struct BiquadFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
    initialized: bool,
}

impl BiquadFilter {
    pub fn new_lpf(cutoff_freq: f32, sample_rate: f32, q: f32) -> Self {
        let omega = 2.0 * core::f32::consts::PI * cutoff_freq / sample_rate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * q);

        let b0 = (1.0 - cs) / 2.0;
        let b1 = 1.0 - cs;
        let b2 = (1.0 - cs) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cs;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
            initialized: false,
        }
    }

    pub fn filter(&mut self, input: f32) -> f32 {
        if !self.initialized {
            // Steady-state init: first sample passes through unchanged
            self.z1 = input * (self.b1 + self.b2 - self.a1 - self.a2);
            self.z2 = input * (self.b2 - self.a2);
            self.initialized = true;
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;

        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoother_converges_to_constant() {
        let mut kf = KalmanSmoother::new(0.05, 6.0, 0.0);
        for _ in 0..200 {
            kf.update(120.0);
        }
        assert!((kf.estimate() - 120.0).abs() < 0.5);
    }

    #[test]
    fn test_smoother_holds_matching_measurement() {
        let mut kf = KalmanSmoother::new(0.05, 6.0, 80.0);
        for _ in 0..50 {
            let est = kf.update(80.0);
            assert!((est - 80.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_smoother_reset_restores_initial() {
        let mut kf = KalmanSmoother::new(0.05, 6.0, 10.0);
        for _ in 0..20 {
            kf.update(300.0);
        }
        kf.reset();
        assert!((kf.estimate() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_biquad_dc_passes_through() {
        let mut lpf = BiquadFilter::new_lpf(10.0, 50.0, 0.707);
        for _ in 0..100 {
            let out = lpf.filter(42.0);
            assert!((out - 42.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_biquad_attenuates_alternating_input() {
        let mut lpf = BiquadFilter::new_lpf(5.0, 50.0, 0.707);
        let mut out = 0.0;
        for i in 0..200 {
            let input = if i % 2 == 0 { 100.0 } else { -100.0 };
            out = lpf.filter(input);
        }
        // Nyquist-rate square wave should be strongly attenuated
        assert!(out.abs() < 20.0);
    }
}
