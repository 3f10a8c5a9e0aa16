//! Distance metrics for neighbor search.
//!
//! Minkowski distance with power `p`:
//!
//! ```text
//! d(a, b) = (Σ |a_i - b_i|^p)^(1/p)
//! ```
//!
//! `p = 1` and `p = 2` get dedicated branches (Manhattan / Euclidean) so the
//! common case avoids `powf`.

/// Minkowski distance between two equally long feature vectors.
pub fn minkowski<'a, A, B>(a: A, b: B, p: f64) -> f64
where
    A: IntoIterator<Item = &'a f64>,
    B: IntoIterator<Item = &'a f64>,
{
    let diffs = a.into_iter().zip(b).map(|(x, y)| (x - y).abs());

    if p == 1.0 {
        diffs.sum()
    } else if p == 2.0 {
        diffs.map(|d| d * d).sum::<f64>().sqrt()
    } else {
        diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p)
    }
}
