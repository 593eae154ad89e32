//! Segment clustering and representative selection
//!
//! Segments are grouped by embedding proximity with k-means; the segment
//! closest to each centroid stands in for its whole cluster. The cluster
//! count is a fixed step function of the segment count, and the chosen
//! representatives are returned in source order.

use crate::error::{ChecklistError, Result};
use crate::ingest::Segment;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default seed, so repeated runs pick the same representatives
pub const DEFAULT_SEED: u64 = 42;

const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Number of clusters for `n` segments
pub fn cluster_count(n: usize) -> usize {
    match n {
        0..=1 => n,
        2..=5 => 2,
        6..=10 => 3,
        11..=15 => 4,
        16..=20 => 5,
        _ => n * 10 / 50,
    }
}

/// Euclidean distance between two vectors of equal length
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Result of a k-means run
#[derive(Debug, Clone)]
pub struct Clustering {
    /// One centroid per cluster
    pub centroids: Vec<Vec<f32>>,
    /// Cluster id of every input point
    pub assignments: Vec<usize>,
    /// Lloyd iterations performed
    pub iterations: usize,
}

/// Seeded k-means over embedding vectors
///
/// The first centroid is drawn with the seeded generator; the others are
/// picked by maximin (the point farthest from every centroid chosen so far),
/// then refined with Lloyd iterations until assignments settle.
pub fn kmeans(points: &[Vec<f32>], k: usize, seed: u64, max_iterations: usize) -> Clustering {
    let n = points.len();
    let k = k.min(n);
    if k == 0 {
        return Clustering {
            centroids: Vec::new(),
            assignments: vec![0; n],
            iterations: 0,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..n)].clone());

    while centroids.len() < k {
        let farthest = (0..n)
            .map(|i| {
                let nearest = centroids
                    .iter()
                    .map(|c| euclidean_distance(&points[i], c))
                    .fold(f64::INFINITY, f64::min);
                (i, nearest)
            })
            .fold((0, f64::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        centroids.push(points[farthest.0].clone());
    }

    let mut assignments = vec![usize::MAX; n];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let cluster = nearest_index(point, &centroids);
            if assignments[i] != cluster {
                assignments[i] = cluster;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f32>> = points
                .iter()
                .zip(assignments.iter())
                .filter(|(_, a)| **a == cluster)
                .map(|(p, _)| p)
                .collect();

            // An emptied cluster keeps its previous centroid
            if members.is_empty() {
                continue;
            }

            let dim = centroid.len();
            let mut mean = vec![0.0f32; dim];
            for member in &members {
                for (m, v) in mean.iter_mut().zip(member.iter()) {
                    *m += *v;
                }
            }
            for m in &mut mean {
                *m /= members.len() as f32;
            }
            *centroid = mean;
        }
    }

    Clustering {
        centroids,
        assignments,
        iterations,
    }
}

/// Index of the vector closest to `target`; ties go to the lowest index
fn nearest_index(target: &[f32], candidates: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, candidate) in candidates.iter().enumerate() {
        let distance = euclidean_distance(target, candidate);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Source indices of the points nearest each centroid, sorted and deduplicated
pub fn representative_indices(embeddings: &[Vec<f32>], centroids: &[Vec<f32>]) -> Vec<usize> {
    let mut indices: Vec<usize> = centroids
        .iter()
        .map(|centroid| nearest_index(centroid, embeddings))
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Picks one representative segment per cluster
#[derive(Debug, Clone)]
pub struct ClusterSelector {
    seed: u64,
}

impl ClusterSelector {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Select representatives in source order
    pub fn select_representatives(
        &self,
        segments: &[Segment],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Segment>> {
        if segments.len() != embeddings.len() {
            return Err(ChecklistError::InputValidation(format!(
                "{} segments but {} embeddings",
                segments.len(),
                embeddings.len()
            )));
        }

        let n = segments.len();
        if n <= 1 {
            return Ok(segments.to_vec());
        }

        let k = cluster_count(n);
        let clustering = kmeans(embeddings, k, self.seed, DEFAULT_MAX_ITERATIONS);
        let indices = representative_indices(embeddings, &clustering.centroids);

        tracing::debug!(
            "Clustered {} segments into {} clusters in {} iterations, representatives {:?}",
            n,
            k,
            clustering.iterations,
            indices
        );

        Ok(indices.into_iter().map(|i| segments[i].clone()).collect())
    }
}

impl Default for ClusterSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
