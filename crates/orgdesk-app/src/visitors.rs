// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::VecDeque;

pub const DEFAULT_THRESHOLD: f32 = 0.6;
pub const DEFAULT_MAX_KNOWN: usize = 512;

/// Fixed-length face embedding produced by the detector.
pub type Descriptor = Vec<f32>;

/// Opaque face detector: each call yields the descriptors found in the
/// current frame, or `None` when no frame is available yet.
pub trait FaceDetector {
    fn next_frame(&mut self) -> Result<Option<Vec<Descriptor>>>;
}

pub fn euclidean_distance(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub detected: usize,
    pub new_visitors: usize,
}

/// Counts distinct faces over a session by nearest-neighbour matching
/// against the descriptors seen so far.
#[derive(Debug, Clone)]
pub struct VisitorCounter {
    threshold: f32,
    max_known: usize,
    known: VecDeque<Descriptor>,
    dimension: Option<usize>,
    count: u64,
}

impl Default for VisitorCounter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_MAX_KNOWN)
    }
}

impl VisitorCounter {
    pub fn new(threshold: f32, max_known: usize) -> Self {
        Self {
            threshold,
            max_known: max_known.max(1),
            known: VecDeque::new(),
            dimension: None,
            count: 0,
        }
    }

    pub const fn count(&self) -> u64 {
        self.count
    }

    pub fn known_len(&self) -> usize {
        self.known.len()
    }

    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Processes one frame. A frame with a descriptor of the wrong length
    /// is rejected whole and leaves the counter untouched.
    pub fn observe_frame(&mut self, descriptors: &[Descriptor]) -> Result<FrameOutcome> {
        let expected = self
            .dimension
            .or_else(|| descriptors.first().map(Vec::len));
        for descriptor in descriptors {
            if descriptor.is_empty() {
                bail!("detector returned an empty descriptor -- check the feed format");
            }
            if let Some(expected) = expected
                && descriptor.len() != expected
            {
                bail!(
                    "descriptor has {} values, expected {expected} -- check the feed format",
                    descriptor.len()
                );
            }
        }
        if self.dimension.is_none() {
            self.dimension = expected;
        }

        let mut new_visitors = 0;
        for descriptor in descriptors {
            if self.is_new(descriptor) {
                if self.known.len() == self.max_known {
                    self.known.pop_front();
                }
                self.known.push_back(descriptor.clone());
                self.count += 1;
                new_visitors += 1;
            }
        }
        Ok(FrameOutcome {
            detected: descriptors.len(),
            new_visitors,
        })
    }

    fn is_new(&self, descriptor: &[f32]) -> bool {
        self.known
            .iter()
            .map(|known| euclidean_distance(known, descriptor))
            .reduce(f32::min)
            .is_none_or(|nearest| nearest > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_THRESHOLD, VisitorCounter, euclidean_distance};
    use anyhow::Result;

    #[test]
    fn distance_is_euclidean() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn first_face_is_always_new() -> Result<()> {
        let mut counter = VisitorCounter::default();
        let outcome = counter.observe_frame(&[vec![0.1, 0.2, 0.3]])?;
        assert_eq!(outcome.new_visitors, 1);
        assert_eq!(counter.count(), 1);
        Ok(())
    }

    #[test]
    fn close_face_is_not_new_and_far_face_is() -> Result<()> {
        let mut counter = VisitorCounter::new(DEFAULT_THRESHOLD, 16);
        counter.observe_frame(&[vec![0.0, 0.0]])?;

        let near = counter.observe_frame(&[vec![0.3, 0.0]])?;
        assert_eq!(near.new_visitors, 0);
        assert_eq!(counter.count(), 1);

        let far = counter.observe_frame(&[vec![0.9, 0.0]])?;
        assert_eq!(far.new_visitors, 1);
        assert_eq!(counter.count(), 2);
        assert_eq!(counter.known_len(), 2);
        Ok(())
    }

    #[test]
    fn duplicate_faces_in_one_frame_count_once() -> Result<()> {
        let mut counter = VisitorCounter::default();
        let outcome = counter.observe_frame(&[vec![1.0, 1.0], vec![1.0, 1.0]])?;
        assert_eq!(outcome.detected, 2);
        assert_eq!(outcome.new_visitors, 1);
        Ok(())
    }

    #[test]
    fn empty_frame_changes_nothing() -> Result<()> {
        let mut counter = VisitorCounter::default();
        let outcome = counter.observe_frame(&[])?;
        assert_eq!(outcome.detected, 0);
        assert_eq!(counter.count(), 0);
        Ok(())
    }

    #[test]
    fn known_list_evicts_oldest_when_full() -> Result<()> {
        let mut counter = VisitorCounter::new(0.5, 2);
        counter.observe_frame(&[vec![0.0]])?;
        counter.observe_frame(&[vec![10.0]])?;
        counter.observe_frame(&[vec![20.0]])?;
        assert_eq!(counter.known_len(), 2);
        assert_eq!(counter.count(), 3);

        // The first face was evicted, so it counts again.
        counter.observe_frame(&[vec![0.0]])?;
        assert_eq!(counter.count(), 4);
        Ok(())
    }

    #[test]
    fn mismatched_dimension_rejects_the_frame() -> Result<()> {
        let mut counter = VisitorCounter::default();
        counter.observe_frame(&[vec![0.0, 0.0]])?;
        let error = counter
            .observe_frame(&[vec![5.0, 5.0], vec![1.0, 2.0, 3.0]])
            .expect_err("wrong length should fail");
        assert!(error.to_string().contains("expected 2"));
        assert_eq!(counter.count(), 1);
        Ok(())
    }
}
