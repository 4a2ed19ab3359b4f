/// Sparse feature vector: `(feature index, value)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f32)>;

pub(crate) fn normalize_sparse(vec: &mut SparseVector) {
    let norm: f32 = vec.iter().map(|&(_, x)| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        for (_, value) in vec.iter_mut() {
            *value /= norm;
        }
    } else {
        vec.clear();
    }
}

pub(crate) fn softmax_inplace(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }

    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0f32;
    for val in values.iter_mut() {
        *val = (*val - max_val).exp();
        sum += *val;
    }

    if sum > 0.0 {
        for val in values.iter_mut() {
            *val /= sum;
        }
    }
}

pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}
