//! Block LMS adaptive filter routines (family BLMS)
//!
//! One call processes a whole frame of input/desired samples in blocks:
//! for each block the routine slides the caller's linear tap-delay
//! buffer, filters the block with the current weights, emits output and
//! error samples, and then (optionally) updates the weights from the
//! block's error with a leakage factor. The tap-delay and weight buffers
//! persist across calls; the routine allocates nothing.

use num_complex::Complex64;

/// Block LMS adaptive filter step, real signals.
///
/// Processes `in_sig.len() / block_len` blocks. Per block:
/// 1. slide `in_buff` left by `block_len` and append the new block,
/// 2. convolve the buffer with the weight vector to produce `out_y`
///    (`wgt_buff[i]` multiplies the sample `i` steps back),
/// 3. `err_y = de_sig - out_y`,
/// 4. if `need_adapt`, correlate the block error against the buffer and
///    fold into the weights: `w ← μ·Σ e·x + leakage·w`.
///
/// # Arguments
///
/// * `in_sig` - input frame; its length is the frame length and must be
///   a multiple of `block_len`
/// * `de_sig` - desired frame, same length as `in_sig`
/// * `mu` - adaptation step size
/// * `in_buff` - persisted tap-delay buffer, length
///   `wgt_buff.len() + block_len`
/// * `wgt_buff` - persisted filter weights; its length is the filter
///   length
/// * `block_len` - samples per adaptation block
/// * `lkg_factor` - leakage applied to the old weights on update
///   (1.0 = none)
/// * `out_y` - output frame, fully rewritten
/// * `err_y` - error frame, fully rewritten
/// * `need_adapt` - whether to update the weights
///
/// # Examples
///
/// ```
/// use dsprt_rs::blms::blms_ay_wn_dd;
///
/// // Identity filter, no adaptation: output echoes the newest sample.
/// let input = [1.0, 2.0, 3.0];
/// let desired = [1.0, 2.0, 3.0];
/// let mut taps = [0.0; 2]; // filter_len 1 + block_len 1
/// let mut weights = [1.0];
/// let mut out = [0.0; 3];
/// let mut err = [0.0; 3];
/// blms_ay_wn_dd(&input, &desired, 0.1, &mut taps, &mut weights, 1, 1.0, &mut out, &mut err, false);
/// assert_eq!(out, [1.0, 2.0, 3.0]);
/// assert_eq!(err, [0.0, 0.0, 0.0]);
/// ```
///
/// # Reference
///
/// Translation of `MWDSP_blms_ay_wn_DD` (`dspblms/blms_ay_wn_dd_rt.c`).
/// The filter length and frame length are taken from the slice lengths
/// instead of being separate parameters.
#[allow(clippy::too_many_arguments)]
pub fn blms_ay_wn_dd(
    in_sig: &[f64],
    de_sig: &[f64],
    mu: f64,
    in_buff: &mut [f64],
    wgt_buff: &mut [f64],
    block_len: usize,
    lkg_factor: f64,
    out_y: &mut [f64],
    err_y: &mut [f64],
    need_adapt: bool,
) {
    let filter_len = wgt_buff.len();
    let frame_len = in_sig.len();
    let num_blocks = frame_len / block_len;

    out_y.fill(0.0);

    for i in 0..num_blocks {
        // Slide the linear buffer and append the new block at the end.
        in_buff.copy_within(block_len.., 0);
        in_buff[filter_len..].copy_from_slice(&in_sig[i * block_len..(i + 1) * block_len]);

        let mut m = i * block_len;
        for j in 0..block_len {
            for k in 0..filter_len {
                out_y[m] += wgt_buff[filter_len - 1 - k] * in_buff[k + j + 1];
            }
            err_y[m] = de_sig[m] - out_y[m];
            m += 1;
        }

        if need_adapt {
            let m0 = i * block_len;
            for j in 0..filter_len {
                let mut acc = 0.0;
                for k in 0..block_len {
                    acc += mu * err_y[m0 + k] * in_buff[k + j + 1];
                }
                wgt_buff[filter_len - 1 - j] = acc + lkg_factor * wgt_buff[filter_len - 1 - j];
            }
        }
    }
}

/// Block LMS adaptive filter step, complex signals.
///
/// Same block structure as [`blms_ay_wn_dd`]; the weight update
/// correlates the error against the conjugated input,
/// `w ← μ·Σ e·conj(x) + leakage·w`, as required for a complex LMS.
///
/// # Reference
///
/// Translation of `MWDSP_blms_ay_wn_CC` (`dspblms/blms_ay_wn_cc_rt.c`),
/// carried at double precision (the original's complex variant is
/// single precision; this crate is uniformly `f64`).
#[allow(clippy::too_many_arguments)]
pub fn blms_ay_wn_zz(
    in_sig: &[Complex64],
    de_sig: &[Complex64],
    mu: f64,
    in_buff: &mut [Complex64],
    wgt_buff: &mut [Complex64],
    block_len: usize,
    lkg_factor: f64,
    out_y: &mut [Complex64],
    err_y: &mut [Complex64],
    need_adapt: bool,
) {
    let filter_len = wgt_buff.len();
    let frame_len = in_sig.len();
    let num_blocks = frame_len / block_len;
    let zero = Complex64::new(0.0, 0.0);

    out_y.fill(zero);

    for i in 0..num_blocks {
        in_buff.copy_within(block_len.., 0);
        in_buff[filter_len..].copy_from_slice(&in_sig[i * block_len..(i + 1) * block_len]);

        let mut m = i * block_len;
        for j in 0..block_len {
            for k in 0..filter_len {
                let prod = wgt_buff[filter_len - 1 - k] * in_buff[k + j + 1];
                out_y[m] += prod;
            }
            err_y[m] = de_sig[m] - out_y[m];
            m += 1;
        }

        if need_adapt {
            let m0 = i * block_len;
            for j in 0..filter_len {
                let mut acc = zero;
                for k in 0..block_len {
                    acc += mu * (err_y[m0 + k] * in_buff[k + j + 1].conj());
                }
                wgt_buff[filter_len - 1 - j] = acc + lkg_factor * wgt_buff[filter_len - 1 - j];
            }
        }
    }
}
