use crate::error::{AppError, AppResult};

/// One hit returned by a nearest-neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row in the feature table
    pub position: usize,
    pub distance: f32,
}

/// Nearest-neighbor lookup over the precomputed feature table
///
/// Results are ordered nearest first and include the queried row itself.
/// Implementations must be deterministic for a fixed table.
#[cfg_attr(test, mockall::automock)]
pub trait SimilarityIndex: Send + Sync {
    /// Up to `count` nearest rows to the row at `position`
    fn nearest(&self, position: usize, count: usize) -> Vec<Neighbor>;

    /// Number of rows in the table
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact nearest-neighbor index using cosine distance
///
/// Rows are normalized once at construction; a query is a linear scan.
/// Ties are broken by row position so output is stable across runs.
#[derive(Debug, Clone)]
pub struct CosineIndex {
    rows: Vec<Vec<f32>>,
    dimension: usize,
}

impl CosineIndex {
    pub fn new(vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        if let Some((pos, v)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            return Err(AppError::Catalog(format!(
                "Vector {} has dimension {}, expected {}",
                pos,
                v.len(),
                dimension
            )));
        }

        for (pos, v) in vectors.iter().enumerate() {
            if let Some(col) = v.iter().position(|x| !x.is_finite()) {
                return Err(AppError::Catalog(format!(
                    "Vector {} has a non-finite value at column {}",
                    pos, col
                )));
            }
        }

        let rows = vectors.into_iter().map(normalize).collect();
        Ok(Self { rows, dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Scales `v` to unit length; zero vectors stay zero
///
/// The norm is taken in `f64` so large finite components cannot overflow it.
fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        v.iter_mut()
            .for_each(|x| *x = (f64::from(*x) / norm) as f32);
    }
    v
}

impl SimilarityIndex for CosineIndex {
    fn nearest(&self, position: usize, count: usize) -> Vec<Neighbor> {
        let Some(query) = self.rows.get(position) else {
            return Vec::new();
        };

        let mut hits: Vec<Neighbor> = self
            .rows
            .iter()
            .enumerate()
            .map(|(pos, row)| {
                let dot: f32 = query.iter().zip(row).map(|(a, b)| a * b).sum();
                let distance = if pos == position { 0.0 } else { 1.0 - dot };
                Neighbor {
                    position: pos,
                    distance,
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(count);
        hits
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
