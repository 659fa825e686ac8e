//! Two-channel polyphase filter bank routines (family FILTERBANK)
//!
//! An analysis bank splits one stream into two half-rate sub-bands
//! through a long and a short polyphase filter sharing one tap-delay
//! line; a synthesis bank interpolates two sub-band streams back into
//! one full-rate stream. The decimation/interpolation factor is fixed
//! at 2. All tap-delay buffers, partial sums and circular indices are
//! caller-owned and carried across calls; nothing is allocated.

use num_complex::Complex64;
use num_traits::Zero;
use std::ops::{AddAssign, Mul};

/// Two-channel polyphase analysis filter bank step, real signals.
///
/// Consumes `in_frame_size` samples per channel from `u` and writes
/// `in_frame_size / 2` samples per channel to each sub-band output. The
/// long and short filters are stored phase-major: coefficients of phase
/// 0 first, then phase 1 (`2 · poly_len` values each). Both filters read
/// from one circular tap-delay line of `2 · poly_len_long` samples per
/// channel; partial sums accumulate in `sums` (2 per channel: short
/// filter first, long second) so a frame boundary may fall mid-phase.
///
/// # Arguments
///
/// * `u` - input, `num_chans · in_frame_size` samples, channel-major
/// * `long_out` - low-band output, `num_chans · in_frame_size/2`
/// * `short_out` - high-band output, same size
/// * `tap_buf` - persisted tap-delay lines, `num_chans · 2·poly_len_long`
/// * `sums` - persisted partial sums, `2 · num_chans`
/// * `filt_long` - long polyphase filter, `2 · poly_len_long`
/// * `filt_short` - short polyphase filter, `2 · poly_len_short`
/// * `tap_idx` - persisted circular tap index (shared by all channels)
/// * `phase_idx` - persisted polyphase phase index
/// * `num_chans` - independent channels
/// * `in_frame_size` - input samples per channel per call
/// * `poly_len_long` / `poly_len_short` - per-phase filter lengths,
///   `poly_len_long >= poly_len_short`
///
/// # Reference
///
/// Translation of `MWDSP_2ChABank_Fr_DF_DD`
/// (`dspfilterbank/2chabank_fr_df_dd_rt.c`); the pointer walks over the
/// circular tap line become wrapped index arithmetic.
#[allow(clippy::too_many_arguments)]
pub fn abank_fr_df_dd(
    u: &[f64],
    long_out: &mut [f64],
    short_out: &mut [f64],
    tap_buf: &mut [f64],
    sums: &mut [f64],
    filt_long: &[f64],
    filt_short: &[f64],
    tap_idx: &mut usize,
    phase_idx: &mut usize,
    num_chans: usize,
    in_frame_size: usize,
    poly_len_long: usize,
    poly_len_short: usize,
) {
    let filt_len_long = 2 * poly_len_long;
    let out_frame_size = in_frame_size / 2;
    let left_to_do = poly_len_long - poly_len_short;

    let mut cur_phase = *phase_idx;
    let mut cur_tap = *tap_idx;
    let mut u_pos = 0;

    for ch in 0..num_chans {
        let tap0 = ch * filt_len_long;
        let sums0 = 2 * ch;
        let out0 = ch * out_frame_size;
        let mut cff_long = *phase_idx * poly_len_long;
        let mut cff_short = *phase_idx * poly_len_short;
        let mut out_idx = 0;
        cur_phase = *phase_idx;
        cur_tap = *tap_idx;

        for _ in 0..in_frame_size {
            let mut mem = cur_tap;
            tap_buf[tap0 + mem] = u[u_pos];
            u_pos += 1;

            // Both filters walk the shared tap line at stride 2.
            for _ in 0..poly_len_short {
                let x = tap_buf[tap0 + mem];
                sums[sums0] += x * filt_short[cff_short];
                cff_short += 1;
                sums[sums0 + 1] += x * filt_long[cff_long];
                cff_long += 1;
                mem = if mem < 2 { mem + filt_len_long - 2 } else { mem - 2 };
            }
            for _ in 0..left_to_do {
                let x = tap_buf[tap0 + mem];
                sums[sums0 + 1] += x * filt_long[cff_long];
                cff_long += 1;
                mem = if mem < 2 { mem + filt_len_long - 2 } else { mem - 2 };
            }

            cur_tap += 1;
            if cur_tap >= filt_len_long {
                cur_tap = 0;
            }

            // Emit one output pair only when both phases have run.
            cur_phase += 1;
            if cur_phase >= 2 {
                short_out[out0 + out_idx] = sums[sums0];
                long_out[out0 + out_idx] = sums[sums0 + 1];
                sums[sums0] = 0.0;
                sums[sums0 + 1] = 0.0;
                out_idx += 1;
                if out_idx >= out_frame_size {
                    out_idx = 0;
                }
                cur_phase = 0;
                cff_long = 0;
                cff_short = 0;
            }
        }
    }

    *phase_idx = cur_phase;
    *tap_idx = cur_tap;
}

/// Shared synthesis core: one circular FIR walk per sub-band per
/// interpolation phase, summed into a single output sample.
#[allow(clippy::too_many_arguments)]
fn sbank_df<T>(
    in_long: &[T],
    in_short: &[T],
    out: &mut [T],
    long_tap: &mut [T],
    short_tap: &mut [T],
    filt_long: &[T],
    filt_short: &[T],
    long_idx: &mut usize,
    short_idx: &mut usize,
    num_chans: usize,
    in_frame_size: usize,
    poly_len_long: usize,
    poly_len_short: usize,
) where
    T: Copy + Zero + AddAssign + Mul<Output = T>,
{
    let mut cur_long = *long_idx;
    let mut cur_short = *short_idx;
    let mut in_pos = 0;
    let mut out_pos = 0;

    for ch in 0..num_chans {
        let lbase = ch * poly_len_long;
        let sbase = ch * poly_len_short;
        cur_long = *long_idx;
        cur_short = *short_idx;

        for _ in 0..in_frame_size {
            long_tap[lbase + cur_long] = in_long[in_pos];
            short_tap[sbase + cur_short] = in_short[in_pos];
            in_pos += 1;

            let mut cff_long = 0;
            let mut cff_short = 0;
            for _ in 0..2 {
                let mut sum = T::zero();
                let mut mem = cur_long;
                for _ in 0..poly_len_long {
                    sum += long_tap[lbase + mem] * filt_long[cff_long];
                    cff_long += 1;
                    mem = if mem == 0 { poly_len_long - 1 } else { mem - 1 };
                }
                let mut mem = cur_short;
                for _ in 0..poly_len_short {
                    sum += short_tap[sbase + mem] * filt_short[cff_short];
                    cff_short += 1;
                    mem = if mem == 0 { poly_len_short - 1 } else { mem - 1 };
                }
                out[out_pos] = sum;
                out_pos += 1;
            }

            cur_long += 1;
            if cur_long >= poly_len_long {
                cur_long = 0;
            }
            cur_short += 1;
            if cur_short >= poly_len_short {
                cur_short = 0;
            }
        }
    }

    *long_idx = cur_long;
    *short_idx = cur_short;
}

/// Two-channel polyphase synthesis filter bank step, real signals.
///
/// Consumes `in_frame_size` samples per channel from each sub-band and
/// writes `2 · in_frame_size` interpolated samples per channel to `out`.
/// Each sub-band carries its own circular tap line (`poly_len` samples
/// per channel) and persisted tap index; per input sample the two
/// interpolation phases each emit one output sample, using consecutive
/// coefficient blocks of the phase-major filters.
///
/// # Reference
///
/// Translation of `MWDSP_2ChSBank_DF_DD`
/// (`dspfilterbank/2chsbank_df_dd_rt.c`). The original interleaves the
/// long and short tap walks; here each sub-band's taps are summed in one
/// pass each, visiting the taps in the same order per filter.
#[allow(clippy::too_many_arguments)]
pub fn sbank_df_dd(
    in_long: &[f64],
    in_short: &[f64],
    out: &mut [f64],
    long_tap: &mut [f64],
    short_tap: &mut [f64],
    filt_long: &[f64],
    filt_short: &[f64],
    long_idx: &mut usize,
    short_idx: &mut usize,
    num_chans: usize,
    in_frame_size: usize,
    poly_len_long: usize,
    poly_len_short: usize,
) {
    sbank_df(
        in_long,
        in_short,
        out,
        long_tap,
        short_tap,
        filt_long,
        filt_short,
        long_idx,
        short_idx,
        num_chans,
        in_frame_size,
        poly_len_long,
        poly_len_short,
    );
}

/// Two-channel polyphase synthesis filter bank step, complex signals.
///
/// Identical structure to [`sbank_df_dd`] over `Complex64` samples and
/// coefficients.
///
/// # Reference
///
/// Translation of `MWDSP_2ChSBank_DF_ZZ`
/// (`dspfilterbank/2chsbank_df_zz_rt.c`).
#[allow(clippy::too_many_arguments)]
pub fn sbank_df_zz(
    in_long: &[Complex64],
    in_short: &[Complex64],
    out: &mut [Complex64],
    long_tap: &mut [Complex64],
    short_tap: &mut [Complex64],
    filt_long: &[Complex64],
    filt_short: &[Complex64],
    long_idx: &mut usize,
    short_idx: &mut usize,
    num_chans: usize,
    in_frame_size: usize,
    poly_len_long: usize,
    poly_len_short: usize,
) {
    sbank_df(
        in_long,
        in_short,
        out,
        long_tap,
        short_tap,
        filt_long,
        filt_short,
        long_idx,
        short_idx,
        num_chans,
        in_frame_size,
        poly_len_long,
        poly_len_short,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_abank_unit_taps_decimate() {
        // poly_len 1 filters: phase-0 coefficient sees even samples,
        // phase-1 the odd ones. long = [1,0] picks x0, short = [0,1]
        // picks x1 of each pair.
        let u = [10.0, 20.0, 30.0, 40.0];
        let mut long_out = [0.0; 2];
        let mut short_out = [0.0; 2];
        let mut taps = [0.0; 2];
        let mut sums = [0.0; 2];
        let mut tap_idx = 0;
        let mut phase_idx = 0;
        abank_fr_df_dd(
            &u,
            &mut long_out,
            &mut short_out,
            &mut taps,
            &mut sums,
            &[1.0, 0.0],
            &[0.0, 1.0],
            &mut tap_idx,
            &mut phase_idx,
            1,
            4,
            1,
            1,
        );
        assert_eq!(long_out, [10.0, 30.0]);
        assert_eq!(short_out, [20.0, 40.0]);
        assert_eq!(phase_idx, 0);
        assert_eq!(tap_idx, 0);
    }

    #[test]
    fn test_abank_partial_phase_persists_in_sums() {
        // Odd frame length: the second output pair is still mid-phase
        // when the call returns, its half-sum parked in `sums`.
        let mut long_out = [0.0; 1];
        let mut short_out = [0.0; 1];
        let mut taps = [0.0; 2];
        let mut sums = [0.0; 2];
        let mut tap_idx = 0;
        let mut phase_idx = 0;
        abank_fr_df_dd(
            &[1.0, 2.0, 3.0],
            &mut long_out,
            &mut short_out,
            &mut taps,
            &mut sums,
            &[1.0, 1.0],
            &[1.0, 1.0],
            &mut tap_idx,
            &mut phase_idx,
            1,
            3,
            1,
            1,
        );
        assert_eq!(long_out, [3.0]); // 1 + 2
        assert_eq!(short_out, [3.0]);
        assert_eq!(phase_idx, 1);
        assert_eq!(sums, [3.0, 3.0]); // third sample parked

        // Feeding one more sample completes the pair.
        abank_fr_df_dd(
            &[4.0],
            &mut long_out,
            &mut short_out,
            &mut taps,
            &mut sums,
            &[1.0, 1.0],
            &[1.0, 1.0],
            &mut tap_idx,
            &mut phase_idx,
            1,
            1,
            1,
            1,
        );
        assert_eq!(long_out, [7.0]); // 3 + 4
        assert_eq!(phase_idx, 0);
        assert_eq!(sums, [0.0, 0.0]);
    }

    #[test]
    fn test_abank_longer_filter_uses_history() {
        // poly_len_long = 2, short = 1: the long filter taps reach back
        // across the shared delay line at stride 2.
        let u = [1.0, 2.0, 3.0, 4.0];
        let mut long_out = [0.0; 2];
        let mut short_out = [0.0; 2];
        let mut taps = [0.0; 4];
        let mut sums = [0.0; 2];
        let mut tap_idx = 0;
        let mut phase_idx = 0;
        // Long phase 0 = [1, 1] (current even sample + previous even),
        // phase 1 = [0, 0]; short passes nothing.
        abank_fr_df_dd(
            &u,
            &mut long_out,
            &mut short_out,
            &mut taps,
            &mut sums,
            &[1.0, 1.0, 0.0, 0.0],
            &[0.0, 0.0],
            &mut tap_idx,
            &mut phase_idx,
            1,
            4,
            2,
            1,
        );
        // First pair: x0 plus empty history; second pair: x2 + x0.
        assert_eq!(long_out, [1.0, 4.0]);
        assert_eq!(short_out, [0.0, 0.0]);
    }

    #[test]
    fn test_sbank_interpolates_with_phase_coefficients() {
        // poly_len 1: out pair = [a*x + c*y, b*x + d*y] for long filter
        // [a, b] and short filter [c, d].
        let mut out = [0.0; 2];
        let mut long_tap = [0.0; 1];
        let mut short_tap = [0.0; 1];
        let mut li = 0;
        let mut si = 0;
        sbank_df_dd(
            &[2.0],
            &[3.0],
            &mut out,
            &mut long_tap,
            &mut short_tap,
            &[1.0, 10.0],
            &[100.0, 1000.0],
            &mut li,
            &mut si,
            1,
            1,
            1,
            1,
        );
        assert_abs_diff_eq!(out[0], 302.0, epsilon = 1e-13); // 1*2 + 100*3
        assert_abs_diff_eq!(out[1], 3020.0, epsilon = 1e-13); // 10*2 + 1000*3
    }

    #[test]
    fn test_sbank_tap_history_wraps() {
        // poly_len 2 long filter summing the two most recent sub-band
        // samples in both phases; short filter silent.
        let mut out = [0.0; 4];
        let mut long_tap = [0.0; 2];
        let mut short_tap = [0.0; 1];
        let mut li = 0;
        let mut si = 0;
        sbank_df_dd(
            &[5.0, 7.0],
            &[0.0, 0.0],
            &mut out,
            &mut long_tap,
            &mut short_tap,
            &[1.0, 1.0, 1.0, 1.0],
            &[0.0, 0.0],
            &mut li,
            &mut si,
            1,
            2,
            2,
            1,
        );
        assert_eq!(out, [5.0, 5.0, 12.0, 12.0]);
        assert_eq!(li, 0); // wrapped around the 2-tap line
    }

    #[test]
    fn test_sbank_state_persists_across_calls() {
        let mut long_tap = [0.0; 2];
        let mut short_tap = [0.0; 1];
        let mut li = 0;
        let mut si = 0;
        let filt_long = [1.0, 1.0, 1.0, 1.0];
        let filt_short = [0.0, 0.0];
        let mut out = [0.0; 2];
        sbank_df_dd(
            &[5.0],
            &[0.0],
            &mut out,
            &mut long_tap,
            &mut short_tap,
            &filt_long,
            &filt_short,
            &mut li,
            &mut si,
            1,
            1,
            2,
            1,
        );
        assert_eq!(out, [5.0, 5.0]);
        let mut out = [0.0; 2];
        sbank_df_dd(
            &[7.0],
            &[0.0],
            &mut out,
            &mut long_tap,
            &mut short_tap,
            &filt_long,
            &filt_short,
            &mut li,
            &mut si,
            1,
            1,
            2,
            1,
        );
        // Second call still sees the 5.0 in the tap line.
        assert_eq!(out, [12.0, 12.0]);
    }

    #[test]
    fn test_sbank_zz_matches_real_parts() {
        let z = |re: f64| Complex64::new(re, 0.0);
        let mut out = [z(0.0); 2];
        let mut long_tap = [z(0.0); 1];
        let mut short_tap = [z(0.0); 1];
        let mut li = 0;
        let mut si = 0;
        sbank_df_zz(
            &[z(2.0)],
            &[z(3.0)],
            &mut out,
            &mut long_tap,
            &mut short_tap,
            &[z(1.0), z(10.0)],
            &[z(100.0), z(1000.0)],
            &mut li,
            &mut si,
            1,
            1,
            1,
            1,
        );
        assert_abs_diff_eq!(out[0].re, 302.0, epsilon = 1e-13);
        assert_abs_diff_eq!(out[1].re, 3020.0, epsilon = 1e-13);
        assert_abs_diff_eq!(out[0].im, 0.0, epsilon = 1e-13);
    }

    #[test]
    fn test_abank_two_channels_share_phase() {
        let u = [1.0, 2.0, 10.0, 20.0]; // channel-major: ch0 = [1,2], ch1 = [10,20]
        let mut long_out = [0.0; 2];
        let mut short_out = [0.0; 2];
        let mut taps = [0.0; 4];
        let mut sums = [0.0; 4];
        let mut tap_idx = 0;
        let mut phase_idx = 0;
        abank_fr_df_dd(
            &u,
            &mut long_out,
            &mut short_out,
            &mut taps,
            &mut sums,
            &[1.0, 0.0],
            &[0.0, 1.0],
            &mut tap_idx,
            &mut phase_idx,
            2,
            2,
            1,
            1,
        );
        assert_eq!(long_out, [1.0, 10.0]);
        assert_eq!(short_out, [2.0, 20.0]);
    }
}
