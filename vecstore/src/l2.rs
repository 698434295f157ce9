/// Compute the squared Euclidean distance between two vectors.
///
/// Accumulates in f64 and returns `f32::INFINITY` on a dimension
/// mismatch, so a malformed pair always ranks last.
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    let mut sum: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let d = x as f64 - y as f64;
        sum += d * d;
    }
    sum as f32
}
