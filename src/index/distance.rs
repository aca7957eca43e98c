use crate::error::{Result, RetrievalError};

/// L2 norm, unrolled by 4 like `dot`.
pub fn magnitude(v: &[f32]) -> f32 {
    norm_f64(v) as f32
}

/// Squares are summed in f64: every f32 square is representable there, so
/// large components do not overflow and tiny ones do not flush to zero.
fn norm_f64(v: &[f32]) -> f64 {
    let mut sum = 0.0f64;
    let n = v.len();
    let mut i = 0;

    while i + 3 < n {
        let (a, b, c, d) = (v[i] as f64, v[i+1] as f64, v[i+2] as f64, v[i+3] as f64);
        sum += a * a + b * b + c * c + d * d;
        i += 4;
    }

    while i < n {
        let x = v[i] as f64;
        sum += x * x;
        i += 1;
    }

    sum.sqrt()
}

/// Inner product. Callers guarantee equal lengths; the hot scan path
/// checks dimensions once per query, not once per row.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum = 0.0;
    let n = a.len().min(b.len());
    let mut i = 0;

    // Unrolling 4
    while i + 3 < n {
        sum += a[i] * b[i] + a[i+1] * b[i+1] + a[i+2] * b[i+2] + a[i+3] * b[i+3];
        i += 4;
    }

    while i < n {
        sum += a[i] * b[i];
        i += 1;
    }

    sum
}

/// Cosine similarity for vectors that are not known to be unit length.
/// Zero-magnitude inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let ma = magnitude(a);
    let mb = magnitude(b);

    if ma == 0.0 || mb == 0.0 {
        return 0.0;
    }

    clamp_score(dot(a, b) / (ma * mb))
}

/// Scale `v` to unit L2 norm.
///
/// Empty, zero-norm and non-finite vectors are rejected instead of producing
/// NaN/Inf components. The returned error carries no position; callers that
/// know the row index attach it.
pub fn normalize(v: &[f32]) -> Result<Vec<f32>> {
    let mag = norm_f64(v);
    if v.is_empty() || mag == 0.0 || !mag.is_finite() {
        return Err(RetrievalError::DegenerateVector { position: None });
    }

    Ok(v.iter().map(|&x| (x as f64 / mag) as f32).collect())
}

/// Unit-norm check used by debug assertions and tests.
pub fn is_unit(v: &[f32], tolerance: f32) -> bool {
    (magnitude(v) - 1.0).abs() < tolerance
}

/// Inner products of two unit vectors can land a hair outside [-1, 1].
#[inline]
pub fn clamp_score(score: f32) -> f32 {
    score.clamp(-1.0, 1.0)
}
