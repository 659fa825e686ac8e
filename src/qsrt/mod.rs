//! In-place quicksort routines (family QSRT)
//!
//! Two sort-by-value variants reorder the data itself; two sort-by-index
//! variants leave the data untouched and permute a `u32` index vector so
//! the data reads ascending through it. All four share the same pivot
//! selection: median-of-three with an equal-scan fallback that declares
//! a range already sorted when every element compares equal (the scan's
//! `(d < a) || (d > a)` inequality also leaves NaN runs alone instead of
//! looping).

/// Orders `data[i]`, `data[mid]`, `data[j]` and picks the higher of two
/// distinct values as pivot; `None` means the range needs no sorting.
fn find_pivot_val<T: PartialOrd + Copy>(data: &mut [T], i: isize, j: isize) -> Option<isize> {
    let mid = (i + j) >> 1;
    let (iu, mu, ju) = (i as usize, mid as usize, j as usize);

    if data[iu] > data[mu] {
        data.swap(iu, mu);
    }
    if data[iu] > data[ju] {
        data.swap(iu, ju);
    }
    if data[mu] > data[ju] {
        data.swap(mu, ju);
    }

    let a = data[iu];
    let b = data[mu];
    let c = data[ju];

    if a < b {
        return Some(mid);
    }
    if b < c {
        return Some(j);
    }
    for k in (i + 1)..=j {
        let d = data[k as usize];
        if (d < a) || (d > a) {
            return Some(if d < a { i } else { k });
        }
    }
    None
}

/// Sedgewick partition: returns the first index of the upper half.
fn partition_val<T: PartialOrd + Copy>(data: &mut [T], i: isize, j: isize, pivot: isize) -> isize {
    let pval = data[pivot as usize];
    let mut count = j - i;
    let mut i = i;
    let mut j = j;

    while i <= j && count >= 0 {
        while data[i as usize] < pval {
            i += 1;
        }
        while data[j as usize] >= pval {
            j -= 1;
        }
        if i < j {
            data.swap(i as usize, j as usize);
            i += 1;
            j -= 1;
        }
        count -= 1;
    }
    i
}

fn qsort_val<T: PartialOrd + Copy>(data: &mut [T], i: isize, j: isize) {
    if let Some(pivot) = find_pivot_val(data, i, j) {
        let k = partition_val(data, i, j, pivot);
        qsort_val(data, i, k - 1);
        qsort_val(data, k, j);
    }
}

fn find_pivot_idx<T: PartialOrd + Copy>(
    data: &[T],
    idx: &mut [u32],
    i: isize,
    j: isize,
) -> Option<isize> {
    let mid = (i + j) / 2;
    let (iu, mu, ju) = (i as usize, mid as usize, j as usize);

    // Order the three index entries by the data they point at.
    if data[idx[iu] as usize] > data[idx[mu] as usize] {
        idx.swap(iu, mu);
    }
    if data[idx[iu] as usize] > data[idx[ju] as usize] {
        idx.swap(iu, ju);
    }
    if data[idx[mu] as usize] > data[idx[ju] as usize] {
        idx.swap(mu, ju);
    }

    let a = data[idx[iu] as usize];
    let b = data[idx[mu] as usize];
    let c = data[idx[ju] as usize];

    if a < b {
        return Some(mid);
    }
    if b < c {
        return Some(j);
    }
    for k in (i + 1)..=j {
        let d = data[idx[k as usize] as usize];
        if (d < a) || (d > a) {
            return Some(if d < a { i } else { k });
        }
    }
    None
}

fn partition_idx<T: PartialOrd + Copy>(
    data: &[T],
    idx: &mut [u32],
    i: isize,
    j: isize,
    pivot: isize,
) -> isize {
    let pval = data[idx[pivot as usize] as usize];
    let mut count = j - i;
    let mut i = i;
    let mut j = j;

    while i <= j && count >= 0 {
        while data[idx[i as usize] as usize] < pval {
            i += 1;
        }
        while data[idx[j as usize] as usize] >= pval {
            j -= 1;
        }
        if i < j {
            idx.swap(i as usize, j as usize);
            i += 1;
            j -= 1;
        }
        count -= 1;
    }
    i
}

fn qsort_idx<T: PartialOrd + Copy>(data: &[T], idx: &mut [u32], i: isize, j: isize) {
    if let Some(pivot) = find_pivot_idx(data, idx, i, j) {
        let k = partition_idx(data, idx, i, j, pivot);
        qsort_idx(data, idx, i, k - 1);
        qsort_idx(data, idx, k, j);
    }
}

/// Sorts a slice of `f32` values ascending in place.
///
/// NaN values are left where the equal-scan finds them rather than
/// forcing a total order.
///
/// # Reference
///
/// Translation of `MWDSP_Sort_Qk_Val_R` (`dspqsrt/sort_qk_val_r_rt.c`).
/// The `(i, j)` range arguments of the C routine are replaced by the
/// slice bounds.
pub fn sort_qk_val_r(data: &mut [f32]) {
    if data.len() > 1 {
        qsort_val(data, 0, data.len() as isize - 1);
    }
}

/// Sorts a slice of `i32` values ascending in place.
///
/// # Reference
///
/// Translation of `MWDSP_Sort_Qk_Val_S32` (`dspqsrt/sort_qk_val_s32_rt.c`).
pub fn sort_qk_val_s32(data: &mut [i32]) {
    if data.len() > 1 {
        qsort_val(data, 0, data.len() as isize - 1);
    }
}

/// Permutes `idx` so `data[idx[0]] <= data[idx[1]] <= ...`; `data` is
/// not modified. `idx` is typically initialized to `0..n` but any
/// permutation (or repetition) of valid indices is accepted.
///
/// # Examples
///
/// ```
/// use dsprt_rs::qsrt::sort_qk_idx_d;
///
/// let data = [3.0, 1.0, 2.0];
/// let mut idx = [0u32, 1, 2];
/// sort_qk_idx_d(&data, &mut idx);
/// assert_eq!(idx, [1, 2, 0]);
/// ```
///
/// # Reference
///
/// Translation of `MWDSP_Sort_Qk_Idx_D` (`dspqsrt/sort_qk_idx_d_rt.c`).
pub fn sort_qk_idx_d(data: &[f64], idx: &mut [u32]) {
    if idx.len() > 1 {
        qsort_idx(data, idx, 0, idx.len() as isize - 1);
    }
}

/// `i32` counterpart of [`sort_qk_idx_d`].
///
/// # Reference
///
/// Translation of `MWDSP_Sort_Qk_Idx_S32` (`dspqsrt/sort_qk_idx_s32_rt.c`).
pub fn sort_qk_idx_s32(data: &[i32], idx: &mut [u32]) {
    if idx.len() > 1 {
        qsort_idx(data, idx, 0, idx.len() as isize - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_val_r_sorts_ascending() {
        let mut data = [3.0f32, -1.0, 4.0, 1.0, 5.0, -9.0, 2.0, 6.0];
        sort_qk_val_r(&mut data);
        assert_eq!(data, [-9.0, -1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_val_r_duplicates_and_constant() {
        let mut data = [2.0f32, 1.0, 2.0, 1.0, 2.0];
        sort_qk_val_r(&mut data);
        assert_eq!(data, [1.0, 1.0, 2.0, 2.0, 2.0]);

        let mut flat = [7.0f32; 6];
        sort_qk_val_r(&mut flat);
        assert_eq!(flat, [7.0; 6]);
    }

    #[test]
    fn test_val_r_small_and_empty() {
        let mut empty: [f32; 0] = [];
        sort_qk_val_r(&mut empty);

        let mut one = [5.0f32];
        sort_qk_val_r(&mut one);
        assert_eq!(one, [5.0]);

        let mut two = [2.0f32, 1.0];
        sort_qk_val_r(&mut two);
        assert_eq!(two, [1.0, 2.0]);
    }

    #[test]
    fn test_val_r_all_nan_terminates() {
        // Every comparison fails, so the pivot scan reports "sorted".
        let mut data = [f32::NAN, f32::NAN, f32::NAN];
        sort_qk_val_r(&mut data);
        assert!(data.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_val_s32_sorts() {
        let mut data = [5, -3, 0, 2, -3, 9, 1];
        sort_qk_val_s32(&mut data);
        assert_eq!(data, [-3, -3, 0, 1, 2, 5, 9]);
    }

    #[test]
    fn test_val_s32_already_sorted_and_reversed() {
        let mut sorted = [1, 2, 3, 4, 5];
        sort_qk_val_s32(&mut sorted);
        assert_eq!(sorted, [1, 2, 3, 4, 5]);

        let mut rev = [5, 4, 3, 2, 1];
        sort_qk_val_s32(&mut rev);
        assert_eq!(rev, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_idx_d_permutes_without_touching_data() {
        let data = [0.5, -1.0, 2.5, 2.5, 0.0];
        let orig = data;
        let mut idx: Vec<u32> = (0..data.len() as u32).collect();
        sort_qk_idx_d(&data, &mut idx);
        assert_eq!(data, orig);
        for w in idx.windows(2) {
            assert!(data[w[0] as usize] <= data[w[1] as usize]);
        }
        let mut seen = idx.clone();
        seen.sort_unstable();
        assert_eq!(seen, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_idx_s32_matches_value_sort() {
        let data = [30, -10, 20, 20, 0, -10];
        let mut idx: Vec<u32> = (0..data.len() as u32).collect();
        sort_qk_idx_s32(&data, &mut idx);
        let through: Vec<i32> = idx.iter().map(|&i| data[i as usize]).collect();
        let mut expected = data;
        expected.sort_unstable();
        assert_eq!(through, expected);
    }

    #[test]
    fn test_idx_d_single_element() {
        let data = [42.0];
        let mut idx = [0u32];
        sort_qk_idx_d(&data, &mut idx);
        assert_eq!(idx, [0]);
    }

    #[test]
    fn test_val_r_larger_random_like() {
        // Pseudo-random fill from a small LCG, checked against the
        // standard library sort.
        let mut x: u32 = 12345;
        let mut data: Vec<f32> = (0..200)
            .map(|_| {
                x = x.wrapping_mul(69069).wrapping_add(1);
                (x >> 8) as f32 / 1e6 - 8.0
            })
            .collect();
        let mut expected = data.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sort_qk_val_r(&mut data);
        assert_eq!(data, expected);
    }
}
