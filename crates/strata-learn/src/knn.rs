use strata_tensor::ops::euclidean_distances;
use strata_tensor::{Dim, Element, Tensor};

use crate::error::{ModelError, Result};

/// One training sample's distance to a query, with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<T, L = String> {
    pub distance: T,
    pub label: L,
}

/// k-nearest-neighbours classifier over a `[samples, features]` training set.
///
/// `labels[i]` is the label of training row `i`. The training tensor is held
/// as a shared header, so the model never copies it.
#[derive(Debug, Clone)]
pub struct Knn<T: Element, S: Dim = usize, L = String> {
    k: usize,
    features: Tensor<T, S>,
    labels: Vec<L>,
}

impl<T: Element, S: Dim, L: Clone + PartialEq> Knn<T, S, L> {
    pub fn new(k: usize, features: Tensor<T, S>, labels: Vec<L>) -> Self {
        Knn {
            k,
            features,
            labels,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn training_features(&self) -> &Tensor<T, S> {
        &self.features
    }

    pub fn training_labels(&self) -> &[L] {
        &self.labels
    }

    /// The `min(k, samples)` training rows closest to a `[1, features]` query,
    /// nearest first. Equal distances keep training order and NaN distances
    /// sort last.
    pub fn find_k_nearest_labels(&self, query: &Tensor<T, S>) -> Result<Vec<Neighbor<T, L>>> {
        let distances = euclidean_distances(query, &self.features)?;
        let samples = distances.dims()[0].as_usize();
        if samples != self.labels.len() {
            return Err(ModelError::LabelCountMismatch {
                samples,
                labels: self.labels.len(),
            });
        }

        let mut neighbors: Vec<Neighbor<T, L>> = distances
            .to_vec()
            .into_iter()
            .zip(self.labels.iter().cloned())
            .map(|(distance, label)| Neighbor { distance, label })
            .collect();
        neighbors.sort_by(|a, b| a.distance.as_f64().total_cmp(&b.distance.as_f64()));
        neighbors.truncate(self.k.min(samples));
        Ok(neighbors)
    }

    /// Label chosen by [`majority_vote`] over the nearest neighbours.
    pub fn predict(&self, query: &Tensor<T, S>) -> Result<L> {
        majority_vote(&self.find_k_nearest_labels(query)?)
    }
}

/// Most frequent label among `neighbors`.
///
/// A tie in count goes to the label whose first occurrence in `neighbors` had
/// the smaller distance. Only the first occurrence of each label is
/// remembered, not its closest one.
pub fn majority_vote<T: Element, L: Clone + PartialEq>(neighbors: &[Neighbor<T, L>]) -> Result<L> {
    struct Tally<'a, T, L> {
        label: &'a L,
        count: usize,
        first_distance: T,
    }

    let mut tallies: Vec<Tally<'_, T, L>> = Vec::new();
    for n in neighbors {
        match tallies.iter_mut().find(|t| *t.label == n.label) {
            Some(tally) => tally.count += 1,
            None => tallies.push(Tally {
                label: &n.label,
                count: 1,
                first_distance: n.distance,
            }),
        }
    }

    let mut winner: Option<&Tally<'_, T, L>> = None;
    for tally in &tallies {
        winner = match winner {
            Some(best)
                if tally.count < best.count
                    || (tally.count == best.count && tally.first_distance >= best.first_distance) =>
            {
                Some(best)
            }
            _ => Some(tally),
        };
    }
    winner
        .map(|t| t.label.clone())
        .ok_or(ModelError::EmptyNeighborSet)
}
