//! Persisted-state random source routines (family RANDSRC)
//!
//! Uniform sources draw from a lagged subtract-with-borrow generator
//! over 32 doubles, whitened by XORing a 13/17/5 xorshift sequence into
//! the mantissa bits of each draw. Gaussian sources use the GRAND
//! rejection scheme over a 69069 congruential generator mixed with the
//! same xorshift. All generator state lives in caller-owned buffers and
//! survives across calls, so a stream can be reproduced from its seeds
//! and consumed frame by frame.

use num_complex::Complex64;

/// Doubles of state per uniform-generator channel: 32 lagged values,
/// the borrow, the lag index, and the shift register.
pub const UNIFORM_STATE_LEN: usize = 35;

const TWO_NEG53: f64 = 1.0 / 9007199254740992.0;

#[inline]
fn xorshift(j: u32) -> u32 {
    let mut j = j ^ (j << 13);
    j ^= j >> 17;
    j ^ (j << 5)
}

/// Initializes uniform-generator state from 32-bit seeds.
///
/// Each seed fills one channel of `state` (`UNIFORM_STATE_LEN` doubles
/// per channel): 32 lagged values built one bit at a time from bit 19
/// of the seeded shift-register sequence, a zero borrow, a zero lag
/// index, and the seed itself as the shift register. A zero seed is
/// replaced by `0x8000_0000`.
///
/// # Reference
///
/// Translation of `MWDSP_RandSrcInitState_U_64`
/// (`dsprandsrc/randsrcinitstate_u_64_rt.c`).
pub fn rand_src_init_state_u_64(seeds: &[u32], state: &mut [f64]) {
    for (ch, &seed) in seeds.iter().enumerate() {
        let st = &mut state[ch * UNIFORM_STATE_LEN..(ch + 1) * UNIFORM_STATE_LEN];
        let seed = if seed != 0 { seed } else { 0x8000_0000 };
        let mut j = seed;
        for v in st.iter_mut().take(32) {
            let mut d = 0.0;
            for _ in 0..53 {
                j = xorshift(j);
                d = d + d + ((j >> 19) & 1) as f64;
            }
            *v = d * TWO_NEG53;
        }
        st[32] = 0.0; // borrow
        st[33] = 0.0; // lag index
        st[34] = f64::from(seed);
    }
}

/// One subtract-with-borrow draw, whitened through the shift register.
/// `i` is the lag index, `j` the shift register; the raw lagged value
/// goes back into the state, the whitened one to the caller.
#[inline]
fn swb_draw(st: &mut [f64], i: &mut u32, j: &mut u32) -> f64 {
    let mut r = st[((*i + 20) & 31) as usize] - st[((*i + 5) & 31) as usize] - st[32];
    if r >= 0.0 {
        st[32] = 0.0;
    } else {
        r += 1.0;
        st[32] = TWO_NEG53;
    }
    st[*i as usize] = r;
    *i = (*i + 1) & 31;

    // XOR the shift register into the mantissa: the low word fully,
    // then only the 20 mantissa bits of the high word, leaving sign
    // and exponent untouched.
    let bits = r.to_bits();
    let lo = (bits as u32) ^ *j;
    *j = xorshift(*j);
    let hi = ((bits >> 32) as u32) ^ (*j & 0x000f_ffff);
    f64::from_bits(((hi as u64) << 32) | lo as u64)
}

#[inline]
fn param(v: &[f64], ch: usize) -> f64 {
    v[if v.len() > 1 { ch } else { 0 }]
}

/// Fills `y` with uniform doubles in `[min, max)` per channel.
///
/// `state` holds `UNIFORM_STATE_LEN` doubles per channel (seeded with
/// [`rand_src_init_state_u_64`]) and is advanced in place. The channel
/// count is `state.len() / UNIFORM_STATE_LEN`; `y` is channel-major
/// with `y.len() / nchans` samples per channel. `min` and `max` hold
/// either one shared value or one value per channel.
///
/// # Reference
///
/// Real-valued counterpart of `MWDSP_RandSrc_U_Z`
/// (`dsprandsrc/randsrc_u_z_rt.c`), drawing one value per output sample
/// from the same stream.
pub fn rand_src_u_d(y: &mut [f64], min: &[f64], max: &[f64], state: &mut [f64]) {
    let nchans = state.len() / UNIFORM_STATE_LEN;
    let nsamps = y.len() / nchans;

    for ch in 0..nchans {
        let st = &mut state[ch * UNIFORM_STATE_LEN..(ch + 1) * UNIFORM_STATE_LEN];
        let mut i = (st[33] as u32) & 31;
        let mut j = st[34] as u32;
        let mn = param(min, ch);
        let scale = param(max, ch) - mn;

        for s in y[ch * nsamps..(ch + 1) * nsamps].iter_mut() {
            *s = mn + scale * swb_draw(st, &mut i, &mut j);
        }
        st[33] = f64::from(i);
        st[34] = f64::from(j);
    }
}

/// Fills `y` with complex uniform samples; real and imaginary parts are
/// consecutive draws of the channel's stream and `min`/`max` bound both
/// parts, so `min = 2, max = 6` fills the square from `2+2i` to `6+6i`.
///
/// # Reference
///
/// Translation of `MWDSP_RandSrc_U_Z` (`dsprandsrc/randsrc_u_z_rt.c`).
pub fn rand_src_u_z(y: &mut [Complex64], min: &[f64], max: &[f64], state: &mut [f64]) {
    let nchans = state.len() / UNIFORM_STATE_LEN;
    let nsamps = y.len() / nchans;

    for ch in 0..nchans {
        let st = &mut state[ch * UNIFORM_STATE_LEN..(ch + 1) * UNIFORM_STATE_LEN];
        let mut i = (st[33] as u32) & 31;
        let mut j = st[34] as u32;
        let mn = param(min, ch);
        let scale = param(max, ch) - mn;

        for s in y[ch * nsamps..(ch + 1) * nsamps].iter_mut() {
            let re = mn + scale * swb_draw(st, &mut i, &mut j);
            let im = mn + scale * swb_draw(st, &mut i, &mut j);
            *s = Complex64::new(re, im);
        }
        st[33] = f64::from(i);
        st[34] = f64::from(j);
    }
}

const GRAND_AA: f64 = 12.37586;
const GRAND_B: f64 = 0.4878992;
const GRAND_C: f64 = 12.67706;
const GRAND_C1: f64 = 0.9689279;
const GRAND_C2: f64 = 1.301198;
const GRAND_PC: f64 = 0.01958303;
const GRAND_XN: f64 = 2.776994;
const TPM31: f64 = 4.656612873077393e-10;
const TPM32: f64 = 2.328306436538696e-10;

const GRAND_VT: [f64; 65] = [
    0.3409450, 0.4573146, 0.5397793, 0.6062427, 0.6631691, 0.7136975, 0.7596125, 0.8020356,
    0.8417227, 0.8792102, 0.9148948, 0.9490791, 0.9820005, 1.0138492, 1.0447810, 1.0749254,
    1.1043917, 1.1332738, 1.1616530, 1.1896010, 1.2171815, 1.2444516, 1.2714635, 1.2982650,
    1.3249008, 1.3514125, 1.3778399, 1.4042211, 1.4305929, 1.4569915, 1.4834527, 1.5100122,
    1.5367061, 1.5635712, 1.5906454, 1.6179680, 1.6455802, 1.6735255, 1.7018503, 1.7306045,
    1.7598422, 1.7896223, 1.8200099, 1.8510770, 1.8829044, 1.9155831, 1.9492166, 1.9839239,
    2.0198431, 2.0571356, 2.0959930, 2.1366450, 2.1793713, 2.2245175, 2.2725186, 2.3239338,
    2.3795008, 2.4402218, 2.5075117, 2.5834658, 2.6713916, 2.7769942, 2.7769942, 2.7769942,
    2.7769942,
];

#[inline]
fn grand_step(icng: &mut u32, jsr: &mut u32) -> i32 {
    *icng = icng.wrapping_mul(69069).wrapping_add(1234567);
    *jsr = xorshift(*jsr);
    icng.wrapping_add(*jsr) as i32
}

/// One standard normal draw from the GRAND rejection scheme.
fn grand_draw(icng: &mut u32, jsr: &mut u32) -> f64 {
    let i = grand_step(icng, jsr);
    let j = (i & 0x3f) as usize;
    let r = f64::from(i) * TPM31 * GRAND_VT[j + 1];
    if r.abs() <= GRAND_VT[j] {
        return r;
    }

    let mut x = (r.abs() - GRAND_VT[j]) / (GRAND_VT[j + 1] - GRAND_VT[j]);
    let i = grand_step(icng, jsr);
    let y = 0.5 + f64::from(i) * TPM32;
    let s = x + y;
    if s > GRAND_C2 {
        return if r < 0.0 { GRAND_B * x - GRAND_B } else { GRAND_B - GRAND_B * x };
    }
    if s <= GRAND_C1 {
        return r;
    }

    x = GRAND_B - GRAND_B * x;
    if y > GRAND_C - GRAND_AA * (-0.5 * x * x).exp() {
        return if r < 0.0 { -x } else { x };
    }
    let vj1 = GRAND_VT[j + 1];
    if (-0.5 * vj1 * vj1).exp() + y * GRAND_PC / vj1 <= (-0.5 * r * r).exp() {
        return r;
    }

    // Tail: sample the exponential wedge beyond xn.
    loop {
        let i = grand_step(icng, jsr);
        let x = (0.5 + f64::from(i) * TPM32).ln() / GRAND_XN;
        let i = grand_step(icng, jsr);
        if -2.0 * (0.5 + f64::from(i) * TPM32).ln() > x * x {
            return if r < 0.0 { x - GRAND_XN } else { GRAND_XN - x };
        }
    }
}

/// Fills `y` with complex Gaussian samples, `mean + std · n` with `n`
/// standard normal per component; real and imaginary parts are
/// consecutive draws. `std` is the per-component deviation, i.e. the
/// caller divides the complex deviation by `sqrt(2)` beforehand.
///
/// `state` holds two words per channel (the congruential and shift
/// registers); `mean` and `std` hold one shared value or one per
/// channel.
///
/// # Reference
///
/// Translation of `MWDSP_RandSrc_GZ_Z` (`dsprandsrc/randsrc_gz_z_rt.c`),
/// itself the GRAND algorithm of Brent (1974).
pub fn rand_src_gz_z(y: &mut [Complex64], mean: &[Complex64], std: &[f64], state: &mut [u32]) {
    let nchans = state.len() / 2;
    let nsamps = y.len() / nchans;

    for ch in 0..nchans {
        let mut icng = state[2 * ch];
        let mut jsr = state[2 * ch + 1];
        let mn = mean[if mean.len() > 1 { ch } else { 0 }];
        let sd = param(std, ch);

        for s in y[ch * nsamps..(ch + 1) * nsamps].iter_mut() {
            let re = mn.re + sd * grand_draw(&mut icng, &mut jsr);
            let im = mn.im + sd * grand_draw(&mut icng, &mut jsr);
            *s = Complex64::new(re, im);
        }
        state[2 * ch] = icng;
        state[2 * ch + 1] = jsr;
    }
}

/// Derives decorrelated channel seeds from one initial seed by running
/// the uniform generator and scaling each draw by 2^31.
///
/// # Reference
///
/// Translation of `MWDSP_RandSrcCreateSeeds_32`
/// (`dsprandsrc/randsrccreateseeds_32_rt.c`), carried through the
/// double-precision generator.
pub fn rand_src_create_seeds_32(init_seed: u32, seed_array: &mut [u32]) {
    let mut state = [0.0; UNIFORM_STATE_LEN];
    rand_src_init_state_u_64(&[init_seed], &mut state);
    let mut tmp = [0.0];
    for seed in seed_array.iter_mut() {
        rand_src_u_d(&mut tmp, &[0.0], &[1.0], &mut state);
        *seed = (tmp[0] * 2147483648.0) as u32;
    }
}
