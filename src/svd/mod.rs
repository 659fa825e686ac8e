//! Singular Value Decomposition routines (family SVD)
//!
//! This module contains the complex-valued SVD kernel of the DSP run-time
//! library. The kernel reduces a dense complex matrix to real bidiagonal
//! form with Householder-style eliminations, then drives the bidiagonal to
//! diagonal form with an implicit-shift QR iteration built from scaled
//! plane rotations, ordering the singular values descending and flipping
//! them non-negative as they converge.
//!
//! The code descends from LINPACK's ZSVDC rather than LAPACK, which means
//! it has no internal economy-size handling: the caller must present a
//! matrix with at least as many rows as columns and swap the roles of U
//! and V if it had to transpose (see [`svd_z`] and the [`svd`] wrapper).
//!
//! Three layers are exposed:
//! - [`rotg`] / [`rot_cplx`]: the plane-rotation primitives,
//! - [`svd_z`]: the allocation-free kernel over caller-owned buffers,
//! - [`svd`]: an `ndarray` convenience wrapper playing the role of the
//!   original library's client code.

use ndarray::Array2;
use num_complex::Complex64;

/// Iteration cap per singular value. Each convergence event resets the
/// counter, so the total work is bounded by `MAXIT` QR sweeps between any
/// two convergences. This is a required safety valve, not a tuning knob.
pub const MAXIT: usize = 75;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Error type for the SVD kernel.
///
/// Maps the integer status of the C original: a negative status becomes
/// [`SvdError::NonFinite`], a positive status `k` becomes
/// [`SvdError::NonConvergence`] with `unresolved == k`, and status `0`
/// becomes `Ok(())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvdError {
    /// A NaN or infinity was observed while testing convergence
    /// thresholds. All output buffers are left in an undefined,
    /// partially-transformed state and must be discarded.
    NonFinite,
    /// The iteration bound was exhausted before the leading block
    /// converged. The trailing `total - unresolved` singular values are
    /// valid, non-negative and sorted; the first `unresolved` entries of
    /// `s` (and the matching U/V columns) are undefined.
    NonConvergence {
        /// Number of singular values that failed to converge.
        unresolved: usize,
    },
}

impl std::fmt::Display for SvdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SvdError::NonFinite => {
                write!(f, "non-finite value encountered during convergence test")
            }
            SvdError::NonConvergence { unresolved } => {
                write!(f, "{} singular value(s) failed to converge", unresolved)
            }
        }
    }
}

impl std::error::Error for SvdError {}

/// Construct a real plane rotation, safely.
///
/// Given scalars `a` and `b`, computes `(c, s, r)` with `c² + s² = 1`,
/// `c·a + s·b = r` and `c·b − s·a = 0`. The magnitude is accumulated on
/// values pre-divided by `|a| + |b|`, so very large or very small inputs
/// neither overflow nor underflow. `r` carries the sign of whichever
/// input is larger in magnitude (the BLAS `drotg` convention).
///
/// # Examples
///
/// ```
/// use dsprt_rs::svd::rotg;
///
/// let (c, s, r) = rotg(3.0, 4.0);
/// assert!((r - 5.0).abs() < 1e-14);
/// assert!((c * 3.0 + s * 4.0 - 5.0).abs() < 1e-14);
/// assert!((c * 4.0 - s * 3.0).abs() < 1e-14);
/// ```
pub fn rotg(a: f64, b: f64) -> (f64, f64, f64) {
    let roe = if a.abs() > b.abs() { a } else { b };
    let scale = a.abs() + b.abs();
    if scale == 0.0 {
        return (1.0, 0.0, 0.0);
    }
    let mut r = scale * ((a / scale).powi(2) + (b / scale).powi(2)).sqrt();
    if roe < 0.0 {
        r = -r;
    }
    (a / r, b / r, r)
}

/// Apply a real plane rotation to a pair of complex vectors, in place.
///
/// For each index `i`: `x[i] ← c·x[i] + s·y[i]` and
/// `y[i] ← c·y[i] − s·x[i]` (using the old `x[i]`). Processes
/// `min(x.len(), y.len())` elements; no other side effects.
///
/// # Examples
///
/// ```
/// use dsprt_rs::svd::rot_cplx;
/// use num_complex::Complex64;
///
/// let mut x = [Complex64::new(3.0, 1.0)];
/// let mut y = [Complex64::new(4.0, 0.0)];
/// rot_cplx(0.6, 0.8, &mut x, &mut y);
/// assert!((x[0].re - 5.0).abs() < 1e-14);
/// assert!((y[0].re - 0.0).abs() < 1e-14);
/// ```
pub fn rot_cplx(c: f64, s: f64, x: &mut [Complex64], y: &mut [Complex64]) {
    for (xi, yi) in x.iter_mut().zip(y.iter_mut()) {
        let t = Complex64::new(c * xi.re + s * yi.re, c * xi.im + s * yi.im);
        *yi = Complex64::new(c * yi.re - s * xi.re, c * yi.im - s * xi.im);
        *xi = t;
    }
}

/// Quick magnitude estimate `|re| + |im|`, used only for zero tests
/// (the C original's `CQABS`).
#[inline]
fn cqabs(z: Complex64) -> f64 {
    z.re.abs() + z.im.abs()
}

/// Compute `sqrt(x² + y²)` without intermediate overflow or underflow
/// (the LAPACK DLAPY2 construction). NaN and infinity pass through, so
/// a corrupted input surfaces in the accumulated norm instead of being
/// absorbed.
#[inline]
fn pythag(x: f64, y: f64) -> f64 {
    let x_abs = x.abs();
    let y_abs = y.abs();
    if x_abs > y_abs {
        let ratio = y_abs / x_abs;
        x_abs * (1.0 + ratio * ratio).sqrt()
    } else if y_abs == 0.0 {
        // covers (0, 0) and keeps a NaN in x alive
        x_abs
    } else {
        let ratio = x_abs / y_abs;
        y_abs * (1.0 + ratio * ratio).sqrt()
    }
}

/// `sign(a, b)`: the magnitude of `a` carried on the phase of `b`.
/// Falls back to a real magnitude when `b` vanishes.
fn csign(a: Complex64, b: Complex64) -> Complex64 {
    let rt1 = pythag(b.re, b.im);
    if rt1 == 0.0 {
        Complex64::new(pythag(a.re, a.im), 0.0)
    } else {
        let rt2 = pythag(a.re, a.im) / rt1;
        Complex64::new(rt2 * b.re, rt2 * b.im)
    }
}

/// Borrow two distinct columns of a column-major matrix buffer mutably.
fn col_pair(
    mat: &mut [Complex64],
    rows: usize,
    a: usize,
    b: usize,
) -> (&mut [Complex64], &mut [Complex64]) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = mat.split_at_mut(b * rows);
        (&mut lo[a * rows..(a + 1) * rows], &mut hi[..rows])
    } else {
        let (lo, hi) = mat.split_at_mut(a * rows);
        (&mut hi[..rows], &mut lo[b * rows..(b + 1) * rows])
    }
}

fn rot_cols(mat: &mut [Complex64], rows: usize, a: usize, b: usize, c: f64, s: f64) {
    let (x, y) = col_pair(mat, rows, a, b);
    rot_cplx(c, s, x, y);
}

fn swap_cols(mat: &mut [Complex64], rows: usize, a: usize, b: usize) {
    let (x, y) = col_pair(mat, rows, a, b);
    x.swap_with_slice(y);
}

fn scale_col(mat: &mut [Complex64], rows: usize, col: usize, r: Complex64) {
    for z in &mut mat[col * rows..(col + 1) * rows] {
        *z *= r;
    }
}

fn neg_col(mat: &mut [Complex64], rows: usize, col: usize) {
    for z in &mut mat[col * rows..(col + 1) * rows] {
        *z = -*z;
    }
}

/// Outcome of one classification pass over the active window of the
/// bidiagonal matrix. `l` is the window index the corresponding handler
/// starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kase {
    /// Trailing `s[m-1]` is negligible: chase a rotation backward from
    /// the tail to zero the last superdiagonal.
    Deflate { l: usize },
    /// A diagonal `s[l-1]` inside the window is negligible: chase a
    /// rotation forward to split the window.
    Split { l: usize },
    /// No negligible entry: perform one implicit-shift QR sweep.
    QrStep { l: usize },
    /// Last superdiagonal of the window is negligible: `s[l]` is final.
    Converge { l: usize },
}

/// Inspect `s` and `e` for negligible entries and pick the next case.
///
/// Scans backward from `m-2` for the first superdiagonal entry that is
/// negligible against its neighbouring diagonals (or below the absolute
/// `tiny` floor, or, after 20 stagnating sweeps, below `eps·snorm`,
/// the relaxed fallback that forces progress). A found entry is zeroed.
/// If none is found above the window start the trailing value has
/// converged. Otherwise a second forward scan looks for a negligible
/// diagonal to decide between deflation, a split, and a QR step.
fn classify(
    s: &mut [Complex64],
    e: &mut [Complex64],
    m: usize,
    iter: usize,
    snorm: f64,
) -> Result<Kase, SvdError> {
    let eps = f64::EPSILON;
    let tiny = f64::MIN_POSITIVE / f64::EPSILON;

    let mm2 = m as isize - 2;
    let mut l = mm2;
    while l >= 0 {
        let li = l as usize;
        let test = s[li].re.abs() + s[li + 1].re.abs();
        let ztest = e[li].re.abs();
        if !test.is_finite() || !ztest.is_finite() {
            return Err(SvdError::NonFinite);
        }
        if ztest <= eps * test || ztest <= tiny || (iter > 20 && ztest <= eps * snorm) {
            e[li].re = 0.0;
            break;
        }
        l -= 1;
    }
    if l == mm2 {
        return Ok(Kase::Converge { l: m - 1 });
    }

    let lp1 = l + 1;
    let mut ls = m as isize;
    while ls > lp1 {
        let mut test = 0.0;
        if ls != m as isize {
            test += e[(ls - 1) as usize].re.abs();
        }
        if ls != l + 2 {
            test += e[(ls - 2) as usize].re.abs();
        }
        let ztest = s[(ls - 1) as usize].re.abs();
        if !test.is_finite() || !ztest.is_finite() {
            return Err(SvdError::NonFinite);
        }
        if ztest <= eps * test || ztest <= tiny {
            s[(ls - 1) as usize].re = 0.0;
            break;
        }
        ls -= 1;
    }
    if ls == lp1 {
        Ok(Kase::QrStep { l: lp1 as usize })
    } else if ls == m as isize {
        Ok(Kase::Deflate { l: lp1 as usize })
    } else {
        Ok(Kase::Split { l: ls as usize })
    }
}

/// Case 1: deflate the negligible trailing `s[m-1]`, rotating the last
/// superdiagonal away and folding each rotation into the V columns.
fn deflate(
    s: &mut [Complex64],
    e: &mut [Complex64],
    v: &mut [Complex64],
    wantv: bool,
    p: usize,
    m: usize,
    l: usize,
) {
    let mm1 = m - 1;
    let mm2 = m - 2;
    let mut f = e[mm2].re;
    e[mm2].re = 0.0;
    for k in (l..=mm2).rev() {
        let (cs, sn, r) = rotg(s[k].re, f);
        s[k].re = r;
        if k != l {
            f = -sn * e[k - 1].re;
            e[k - 1].re *= cs;
        }
        if wantv {
            rot_cols(v, p, k, mm1, cs, sn);
        }
    }
}

/// Case 2: split at the negligible `s[l-1]`, chasing a rotation forward
/// to the end of the window and folding each rotation into the U columns.
fn split(
    s: &mut [Complex64],
    e: &mut [Complex64],
    u: &mut [Complex64],
    wantv: bool,
    n: usize,
    m: usize,
    l: usize,
) {
    let lm1 = l - 1;
    let mut f = e[lm1].re;
    e[lm1].re = 0.0;
    for k in l..m {
        let (cs, sn, r) = rotg(s[k].re, f);
        s[k].re = r;
        f = -sn * e[k].re;
        e[k].re *= cs;
        if wantv {
            rot_cols(u, n, k, lm1, cs, sn);
        }
    }
}

/// Case 3: one implicit-shift QR sweep over the window `[l, m)`.
///
/// The Wilkinson-style shift comes from the trailing 2×2 block, computed
/// on entries pre-scaled by the largest magnitude in play so the squares
/// cannot overflow. The sweep alternates two rotations per column: one
/// folds the shift in and creates the bulge, the next restores bidiagonal
/// form, with V updated column-side and U row-side.
fn qr_step(
    s: &mut [Complex64],
    e: &mut [Complex64],
    u: &mut [Complex64],
    v: &mut [Complex64],
    wantv: bool,
    n: usize,
    p: usize,
    m: usize,
    l: usize,
) {
    let mm1 = m - 1;
    let mm2 = m - 2;
    let scale = s[mm1]
        .re
        .abs()
        .max(s[mm2].re.abs())
        .max(e[mm2].re.abs())
        .max(s[l].re.abs())
        .max(e[l].re.abs());
    let sm = s[mm1].re / scale;
    let smm1 = s[mm2].re / scale;
    let emm1 = e[mm2].re / scale;
    let sl = s[l].re / scale;
    let el = e[l].re / scale;
    let b = ((smm1 + sm) * (smm1 - sm) + emm1 * emm1) / 2.0;
    let mut c = sm * emm1;
    c *= c;
    let mut shift = 0.0;
    if b != 0.0 || c != 0.0 {
        shift = (b * b + c).sqrt();
        if b < 0.0 {
            shift = -shift;
        }
        shift = c / (b + shift);
    }
    let mut f = (sl + sm) * (sl - sm) + shift;
    let mut g = sl * el;

    // Chase the bulge down the window.
    for k in l..mm1 {
        let kp1 = k + 1;
        let (cs, sn, r) = rotg(f, g);
        if k != l {
            e[k - 1].re = r;
        }
        f = cs * s[k].re + sn * e[k].re;
        e[k].re = cs * e[k].re - sn * s[k].re;
        g = sn * s[kp1].re;
        s[kp1].re *= cs;
        if wantv {
            rot_cols(v, p, k, kp1, cs, sn);
        }
        let (cs, sn, r) = rotg(f, g);
        s[k].re = r;
        f = cs * e[k].re + sn * s[kp1].re;
        s[kp1].re = -sn * e[k].re + cs * s[kp1].re;
        g = sn * e[kp1].re;
        e[kp1].re *= cs;
        if wantv && k < n - 1 {
            rot_cols(u, n, k, kp1, cs, sn);
        }
    }
    e[mm2].re = f;
}

/// Case 4: `s[l]` has converged. Flip it non-negative (negating the V
/// column to match) and bubble it into descending position against its
/// still-active neighbours, swapping U/V columns along the way.
fn converge(
    s: &mut [Complex64],
    u: &mut [Complex64],
    v: &mut [Complex64],
    wantv: bool,
    n: usize,
    p: usize,
    mm: usize,
    l: usize,
) {
    if s[l].re < 0.0 {
        s[l].re = -s[l].re;
        if wantv {
            neg_col(v, p, l);
        }
    }
    let mut l = l;
    while l != mm - 1 && s[l].re < s[l + 1].re {
        let lp1 = l + 1;
        let t = s[l].re;
        s[l].re = s[lp1].re;
        s[lp1].re = t;
        if wantv && lp1 < p {
            swap_cols(v, p, l, lp1);
        }
        if wantv && lp1 < n {
            swap_cols(u, n, l, lp1);
        }
        l = lp1;
    }
}

/// Singular value decomposition of a complex matrix over caller-owned
/// workspace.
///
/// Reduces the `n`×`p` column-major matrix `x` (mutated in place, its
/// final content is scratch) so that on success `s` holds the singular
/// values of `x`, real, non-negative and sorted descending, and (when
/// `uv` is supplied) `u` and `v` hold matrices with unitary columns
/// such that `x = u · diag(s) · vᴴ`.
///
/// # Arguments
///
/// * `x` - `n·p` column-major complex matrix; consumed as scratch
/// * `n` - number of rows (`n >= 1`)
/// * `p` - number of columns (`p >= 1`)
/// * `s` - output singular values, length `min(p, n + 1)`
/// * `e` - superdiagonal scratch, length `p`
/// * `work` - row-transform scratch, length `n`
/// * `uv` - `Some((u, v))` to accumulate the transforms: `u` is
///   `n·min(n, p)` and `v` is `p·p`, both column-major. Both are fully
///   rewritten. `None` computes singular values only.
///
/// # Returns
///
/// * `Ok(())` - all singular values converged
/// * `Err(SvdError::NonFinite)` - NaN/Inf observed; discard all buffers
/// * `Err(SvdError::NonConvergence { unresolved })` - iteration bound
///   exhausted; the trailing `min(p, n+1) - unresolved` entries of `s`
///   are valid and ordered, the prefix is undefined
///
/// # Preconditions
///
/// The kernel trusts the caller: `n >= 1`, `p >= 1`, and for correct
/// economy-size behaviour the input must have `n >= p`. A caller holding
/// a wide matrix must pass its conjugate transpose and swap the roles of
/// `u` and `v` on return (see [`svd`], which does exactly that). The
/// kernel performs no dimension validation; undersized buffers panic on
/// out-of-range indexing. No allocation occurs inside the call.
///
/// # Examples
///
/// ```
/// use dsprt_rs::svd::svd_z;
/// use num_complex::Complex64;
///
/// // [[3, 0], [4, 0]] stored column-major.
/// let z = |re| Complex64::new(re, 0.0);
/// let mut x = [z(3.0), z(4.0), z(0.0), z(0.0)];
/// let mut s = [z(0.0); 2];
/// let mut e = [z(0.0); 2];
/// let mut work = [z(0.0); 2];
/// let mut u = [z(0.0); 4];
/// let mut v = [z(0.0); 4];
///
/// svd_z(&mut x, 2, 2, &mut s, &mut e, &mut work, Some((&mut u, &mut v))).unwrap();
/// assert!((s[0].re - 5.0).abs() < 1e-12);
/// assert!(s[1].re.abs() < 1e-12);
/// ```
///
/// # Reference
///
/// Translation of `MWDSP_SVD_Z` (`dspsvd/svd_z_rt.c`), itself based on
/// LINPACK ZSVDC. Differences from the C version:
/// - returns `Result` instead of an integer `info` code,
/// - the `wantv` flag is folded into the `Option` on `(u, v)`,
/// - pointer-arithmetic walks become `(base, stride, length)` indexing
///   over the slices, with identical element visitation order,
/// - a non-finite value in either negligibility scan reports
///   [`SvdError::NonFinite`] (the C returned a stale status from the
///   second scan).
pub fn svd_z(
    x: &mut [Complex64],
    n: usize,
    p: usize,
    s: &mut [Complex64],
    e: &mut [Complex64],
    work: &mut [Complex64],
    uv: Option<(&mut [Complex64], &mut [Complex64])>,
) -> Result<(), SvdError> {
    let (wantv, u, v): (bool, &mut [Complex64], &mut [Complex64]) = match uv {
        Some((u, v)) => (true, u, v),
        None => (false, Default::default(), Default::default()),
    };

    // ------------------------------------------------------------------
    // Reduce x to bidiagonal form, storing the diagonal elements in s
    // and the super-diagonal elements in e.
    let ncu = n.min(p);
    let nct = (n - 1).min(p);
    let nrt = if p >= 2 { (p - 2).min(n) } else { 0 };
    let lu = nct.max(nrt);
    for l in 0..lu {
        let nml = n - l;
        let lp1 = l + 1;
        let xll = l * n + l; // x(l,l)

        if l < nct {
            // Compute the transformation for the l-th column and place
            // the l-th diagonal in s(l).
            let mut nrm = 0.0;
            for i in 0..nml {
                nrm = pythag(nrm, x[xll + i].re);
                nrm = pythag(nrm, x[xll + i].im);
            }
            s[l] = Complex64::new(nrm, 0.0);
            if cqabs(s[l]) != 0.0 {
                if cqabs(x[xll]) != 0.0 {
                    s[l] = csign(s[l], x[xll]);
                }
                let t1 = ONE / s[l];
                for i in 0..nml {
                    x[xll + i] *= t1;
                }
                x[xll].re += 1.0;
            }
            s[l] = -s[l];
        }

        for j in lp1..p {
            let xlj = j * n + l; // x(l,j)
            if l < nct && cqabs(s[l]) != 0.0 {
                // Apply the transformation: t = -<x(l:,l), x(l:,j)> / x(l,l).
                let mut t = ZERO;
                for i in 0..nml {
                    let a = x[xll + i];
                    let b = x[xlj + i];
                    t.re += a.re * b.re + a.im * b.im;
                    t.im += a.re * b.im - a.im * b.re;
                }
                t = -t;
                t /= x[xll];
                for i in 0..nml {
                    let prod = t * x[xll + i];
                    x[xlj + i] += prod;
                }
            }
            // Place the l-th row of x into e for the subsequent
            // calculation of the row transformation.
            e[j] = x[xlj].conj();
        }

        if wantv && l < nct {
            // Save the column reflector in u for back multiplication.
            for i in 0..nml {
                u[l * n + l + i] = x[xll + i];
            }
        }

        if l < nrt {
            // Compute the l-th row transformation and place the l-th
            // super-diagonal in e(l).
            let mut nrm = 0.0;
            for j in lp1..p {
                nrm = pythag(nrm, e[j].re);
                nrm = pythag(nrm, e[j].im);
            }
            e[l] = Complex64::new(nrm, 0.0);
            if cqabs(e[l]) != 0.0 {
                if cqabs(e[lp1]) != 0.0 {
                    e[l] = csign(e[l], e[lp1]);
                }
                let t1 = ONE / e[l];
                for j in lp1..p {
                    e[j] *= t1;
                }
                e[lp1].re += 1.0;
            }
            e[l].re = -e[l].re;
            if lp1 < n && cqabs(e[l]) != 0.0 {
                // Apply the transformation through the work vector.
                for i in lp1..n {
                    work[i] = ZERO;
                }
                for j in lp1..p {
                    let xlj = j * n + lp1;
                    for i in 0..n - lp1 {
                        let prod = e[j] * x[xlj + i];
                        work[lp1 + i] += prod;
                    }
                }
                for j in lp1..p {
                    let t = (-e[j] / e[lp1]).conj();
                    let xlj = j * n + lp1;
                    for i in 0..n - lp1 {
                        let prod = t * work[lp1 + i];
                        x[xlj + i] += prod;
                    }
                }
            }
            if wantv {
                // Save the row reflector in v for back multiplication.
                for j in lp1..p {
                    v[l * p + j] = e[j];
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Set up the final bidiagonal matrix of order m.
    let m_total = p.min(n + 1);
    let mm1 = m_total - 1;
    if nct < p {
        s[nct] = x[nct * n + nct];
    }
    if n < m_total {
        s[mm1] = ZERO;
    }
    if nrt < mm1 {
        e[nrt] = x[mm1 * n + nrt]; // x(nrt, m-1)
    }
    e[mm1] = ZERO;

    // ------------------------------------------------------------------
    // If required, generate u.
    if wantv {
        for j in nct..ncu {
            for i in 0..n {
                u[j * n + i] = ZERO;
            }
            u[j * n + j] = ONE;
        }
        for l in (0..nct).rev() {
            let nml = n - l;
            let ull = l * n + l; // u(l,l)
            if cqabs(s[l]) != 0.0 {
                for j in l + 1..ncu {
                    let ulj = j * n + l; // u(l,j)
                    let mut t = ZERO;
                    for i in 0..nml {
                        let a = u[ull + i];
                        let b = u[ulj + i];
                        t.re += a.re * b.re + a.im * b.im;
                        t.im += a.re * b.im - a.im * b.re;
                    }
                    t = -t;
                    t /= u[ull];
                    for i in 0..nml {
                        let prod = t * u[ull + i];
                        u[ulj + i] += prod;
                    }
                }
                for i in 0..nml {
                    u[ull + i] = -u[ull + i];
                }
                u[ull].re += 1.0;
                for i in 0..l {
                    u[l * n + i] = ZERO;
                }
            } else {
                for i in 0..n {
                    u[l * n + i] = ZERO;
                }
                u[ull] = ONE;
            }
        }
    }

    // ------------------------------------------------------------------
    // If required, generate v.
    if wantv {
        for l in (0..p).rev() {
            let lp1 = l + 1;
            if l < nrt && cqabs(e[l]) != 0.0 {
                let vll = l * p + lp1; // v(l+1,l)
                for j in lp1..p {
                    let vlj = j * p + lp1; // v(l+1,j)
                    let mut t = ZERO;
                    for i in 0..p - lp1 {
                        let a = v[vll + i];
                        let b = v[vlj + i];
                        t.re += a.re * b.re + a.im * b.im;
                        t.im += a.re * b.im - a.im * b.re;
                    }
                    t = -t;
                    t /= v[vll];
                    for i in 0..p - lp1 {
                        let prod = t * v[vll + i];
                        v[vlj + i] += prod;
                    }
                }
            }
            for i in 0..p {
                v[l * p + i] = ZERO;
            }
            v[l * p + l] = ONE;
        }
    }

    // ------------------------------------------------------------------
    // Transform s and e so that they are real.
    for l in 0..m_total {
        let t = pythag(s[l].re, s[l].im);
        if t != 0.0 {
            let r = Complex64::new(s[l].re / t, s[l].im / t);
            s[l] = Complex64::new(t, 0.0);
            if l + 1 < m_total {
                e[l] /= r;
            }
            if wantv && l < n {
                scale_col(u, n, l, r);
            }
        }
        if l + 1 == m_total {
            break;
        }
        let t = pythag(e[l].re, e[l].im);
        if t != 0.0 {
            let r = Complex64::new(t, 0.0) / e[l];
            e[l] = Complex64::new(t, 0.0);
            s[l + 1] *= r;
            if wantv {
                scale_col(v, p, l + 1, r);
            }
        }
    }

    // ------------------------------------------------------------------
    // Main iteration loop for the singular values.
    let mm = m_total;
    let mut m = m_total;
    let mut iter = 0usize;
    let mut snorm = 0.0f64;
    for l in 0..m {
        snorm = snorm.max(s[l].re.abs()).max(e[l].re.abs());
    }

    while m != 0 {
        if iter > MAXIT {
            return Err(SvdError::NonConvergence { unresolved: m });
        }
        match classify(s, e, m, iter, snorm)? {
            Kase::Deflate { l } => deflate(s, e, v, wantv, p, m, l),
            Kase::Split { l } => split(s, e, u, wantv, n, m, l),
            Kase::QrStep { l } => {
                qr_step(s, e, u, v, wantv, n, p, m, l);
                iter += 1;
            }
            Kase::Converge { l } => {
                converge(s, u, v, wantv, n, p, mm, l);
                m -= 1;
                iter = 0;
            }
        }
    }
    Ok(())
}

/// Result of the [`svd`] convenience wrapper.
#[derive(Debug, Clone)]
pub struct Svd {
    /// Singular values, non-negative, sorted descending, `min(n, p)` of
    /// them.
    pub s: Vec<f64>,
    /// Left singular vectors, `nrows × min(n, p)`, unitary columns.
    /// `None` unless requested.
    pub u: Option<Array2<Complex64>>,
    /// Right singular vectors, `ncols × min(n, p)`, unitary columns.
    /// `None` unless requested.
    pub v: Option<Array2<Complex64>>,
}

/// Singular value decomposition of an `ndarray` complex matrix.
///
/// This is the "client" layer the kernel expects: it allocates the
/// workspace, and when the matrix is wide (`rows < cols`) it hands the
/// kernel the conjugate transpose and swaps the U/V roles on return, so
/// the economy-size precondition of [`svd_z`] always holds.
///
/// # Arguments
///
/// * `a` - the matrix to decompose (any shape with `rows >= 1`,
///   `cols >= 1`)
/// * `want_uv` - whether to accumulate the singular vector matrices
///
/// # Returns
///
/// [`Svd`] with `a ≈ u · diag(s) · vᴴ` when vectors are requested, or an
/// [`SvdError`] from the kernel.
///
/// # Examples
///
/// ```
/// use dsprt_rs::svd::svd;
/// use ndarray::arr2;
/// use num_complex::Complex64;
///
/// let z = |re| Complex64::new(re, 0.0);
/// let a = arr2(&[[z(3.0), z(0.0)], [z(4.0), z(0.0)]]);
/// let result = svd(&a, true).unwrap();
/// assert!((result.s[0] - 5.0).abs() < 1e-12);
/// assert!(result.s[1].abs() < 1e-12);
/// ```
pub fn svd(a: &Array2<Complex64>, want_uv: bool) -> Result<Svd, SvdError> {
    let (rows, cols) = a.dim();
    let flipped = rows < cols;
    let work_mat;
    let a_ref = if flipped {
        work_mat = a.t().mapv(|z| z.conj());
        &work_mat
    } else {
        a
    };

    let (n, p) = a_ref.dim();
    let mut x: Vec<Complex64> = Vec::with_capacity(n * p);
    for j in 0..p {
        for i in 0..n {
            x.push(a_ref[[i, j]]);
        }
    }

    let k = n.min(p);
    let mut s = vec![ZERO; p.min(n + 1)];
    let mut e = vec![ZERO; p];
    let mut work = vec![ZERO; n];

    if !want_uv {
        svd_z(&mut x, n, p, &mut s, &mut e, &mut work, None)?;
        return Ok(Svd {
            s: s.iter().take(k).map(|z| z.re).collect(),
            u: None,
            v: None,
        });
    }

    let mut u = vec![ZERO; n * k];
    let mut v = vec![ZERO; p * p];
    svd_z(&mut x, n, p, &mut s, &mut e, &mut work, Some((&mut u, &mut v)))?;

    let mut umat = Array2::zeros((n, k));
    for j in 0..k {
        for i in 0..n {
            umat[[i, j]] = u[j * n + i];
        }
    }
    let mut vmat = Array2::zeros((p, k));
    for j in 0..k {
        for i in 0..p {
            vmat[[i, j]] = v[j * p + i];
        }
    }

    let sv = s.iter().take(k).map(|z| z.re).collect();
    if flipped {
        // a = (aᴴ)ᴴ = V·diag(s)·Uᴴ of the transposed problem.
        Ok(Svd {
            s: sv,
            u: Some(vmat),
            v: Some(umat),
        })
    } else {
        Ok(Svd {
            s: sv,
            u: Some(umat),
            v: Some(vmat),
        })
    }
}
