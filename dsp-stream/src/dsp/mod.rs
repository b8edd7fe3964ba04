//! Fixed-point signal processing used by the streaming pipeline.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`intrinsics`] | Q31 multiply kernels (ARM DSP instructions or fallbacks) |
//! | [`q31`] | Float ↔ Q31 conversion |
//! | [`signal`] | Synthetic tone / carrier / modulated / noisy blocks |
//! | [`fir`] | Sinc low-pass design and block FIR filter |
//! | [`fft`] | Q31 FFT, complex magnitude, peak search |

pub mod fft;
pub mod fir;
pub mod intrinsics;
pub mod q31;
pub mod signal;

pub use fft::{complex_magnitude, max_with_index, RealFft};
pub use fir::{design_low_pass, FirFilter, LowPassFilter};
pub use signal::TestSignals;
