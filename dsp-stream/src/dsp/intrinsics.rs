//! Q31 multiply kernels: ARM DSP instructions with pure-Rust fallbacks.
//!
//! On `thumbv7em` targets (Cortex-M4/M7 with DSP extension) these compile to
//! single-cycle `SMMULR`/`SMMLAR`/`SMMLSR`. On other targets (host tests,
//! Cortex-M0) equivalent pure-Rust implementations are used; the fallbacks
//! wrap on overflow the way the instructions do.

/// Multiply two Q31 values, return the rounded upper 32 bits.
///
/// Computes `(a * b + 0x80000000) >> 32`, i.e. the Q31 product halved.
/// Maps to ARM `SMMULR`.
#[inline(always)]
pub fn mul_32x32_rshift32_rounded(a: i32, b: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "smmulr {out}, {a}, {b}",
                out = out(reg) out,
                a = in(reg) a,
                b = in(reg) b,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        ((a as i64 * b as i64 + 0x8000_0000i64) >> 32) as i32
    }
}

/// Multiply-accumulate: `sum + (a * b + 0x80000000) >> 32`. Maps to ARM `SMMLAR`.
#[inline(always)]
pub fn multiply_accumulate_32x32_rshift32_rounded(sum: i32, a: i32, b: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "smmlar {out}, {a}, {b}, {sum}",
                out = out(reg) out,
                a = in(reg) a,
                b = in(reg) b,
                sum = in(reg) sum,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        ((sum as i64 * (1i64 << 32) + a as i64 * b as i64 + 0x8000_0000i64) >> 32) as i32
    }
}

/// Multiply-subtract: `sum - (a * b) >> 32`, rounded. Maps to ARM `SMMLSR`.
#[inline(always)]
pub fn multiply_subtract_32x32_rshift32_rounded(sum: i32, a: i32, b: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "smmlsr {out}, {a}, {b}, {sum}",
                out = out(reg) out,
                a = in(reg) a,
                b = in(reg) b,
                sum = in(reg) sum,
            );
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        ((sum as i64 * (1i64 << 32) - a as i64 * b as i64 + 0x8000_0000i64) >> 32) as i32
    }
}

/// Saturate a 64-bit accumulator to `i32` range.
#[inline(always)]
pub fn saturate32(val: i64) -> i32 {
    if val > i32::MAX as i64 {
        i32::MAX
    } else if val < i32::MIN as i64 {
        i32::MIN
    } else {
        val as i32
    }
}
