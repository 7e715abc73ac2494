//! Synthetic frame generation for test fixtures

use crate::source::FrameSource;
use frametool_codec::{Frame, Payload, Result};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Default number of frames produced by `gen`
pub const DEFAULT_GEN_COUNT: u64 = 10;
/// Default generator seed
pub const DEFAULT_GEN_SEED: u64 = 1;

const HOSTS: [&str; 4] = ["alpha", "bravo", "charlie", "delta"];
const METRICS: [&str; 3] = ["cpu", "disk", "net"];

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOptions {
    /// Exact number of frames to produce
    pub count: u64,
    /// Seed for frame content
    pub seed: u64,
    /// Timestamp of the first frame, in nanoseconds
    pub base_timestamp: i64,
    /// Gap between consecutive timestamps, in nanoseconds
    pub interval_nanos: i64,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_GEN_COUNT,
            seed: DEFAULT_GEN_SEED,
            base_timestamp: 1_500_000_000_000_000_000,
            interval_nanos: 1_000_000_000,
        }
    }
}

/// Source of pseudo-random frames
///
/// Frame order and timestamps depend only on the position; content depends
/// only on the seed, so equal options always produce identical frames.
pub struct GeneratedSource {
    opts: GenOptions,
    rng: StdRng,
    emitted: u64,
}

impl GeneratedSource {
    /// Generator for the given options
    pub fn new(opts: GenOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(opts.seed),
            opts,
            emitted: 0,
        }
    }

    /// Frames still to be produced
    pub fn remaining(&self) -> u64 {
        self.opts.count - self.emitted
    }

    fn synthesize(&mut self) -> Frame {
        let mut source = BTreeMap::new();
        source.insert(
            "host".to_string(),
            HOSTS[self.rng.gen_range(0..HOSTS.len())].to_string(),
        );
        source.insert(
            "metric".to_string(),
            METRICS[self.rng.gen_range(0..METRICS.len())].to_string(),
        );
        source.insert("generator".to_string(), "frametool".to_string());

        let payload = match self.rng.gen_range(0..4) {
            0 => Payload::Number(self.rng.gen_range(0..1_000_000)),
            1 => Payload::Real(self.rng.gen::<f64>() * 100.0),
            2 => {
                let len = self.rng.gen_range(8..32);
                let text = (&mut self.rng)
                    .sample_iter(&Alphanumeric)
                    .take(len)
                    .map(char::from)
                    .collect();
                Payload::Text(text)
            }
            _ => {
                let mut bytes = vec![0u8; self.rng.gen_range(0..64)];
                self.rng.fill(&mut bytes[..]);
                Payload::Binary(bytes)
            }
        };

        let timestamp = self
            .opts
            .base_timestamp
            .saturating_add((self.emitted as i64).saturating_mul(self.opts.interval_nanos));

        Frame::new(source, timestamp, payload)
    }
}

impl FrameSource for GeneratedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.emitted >= self.opts.count {
            return Ok(None);
        }
        let frame = self.synthesize();
        self.emitted += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(opts: GenOptions) -> Vec<Frame> {
        GeneratedSource::new(opts)
            .frames()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn produces_exact_count() {
        for count in [0, 1, 17] {
            let frames = collect(GenOptions {
                count,
                ..GenOptions::default()
            });
            assert_eq!(frames.len() as u64, count);
        }
    }

    #[test]
    fn same_seed_same_frames() {
        let opts = GenOptions {
            count: 25,
            seed: 99,
            ..GenOptions::default()
        };
        assert_eq!(collect(opts.clone()), collect(opts));
    }

    #[test]
    fn different_seed_changes_content() {
        let a = collect(GenOptions {
            count: 25,
            seed: 1,
            ..GenOptions::default()
        });
        let b = collect(GenOptions {
            count: 25,
            seed: 2,
            ..GenOptions::default()
        });
        assert_ne!(a, b);
    }

    #[test]
    fn timestamps_follow_position() {
        let opts = GenOptions {
            count: 4,
            ..GenOptions::default()
        };
        let frames = collect(opts.clone());
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(
                frame.timestamp,
                opts.base_timestamp + i as i64 * opts.interval_nanos
            );
            assert_eq!(frame.source["generator"], "frametool");
        }
    }

    #[test]
    fn remaining_counts_down() {
        let mut source = GeneratedSource::new(GenOptions {
            count: 2,
            ..GenOptions::default()
        });
        assert_eq!(source.remaining(), 2);
        source.next_frame().unwrap();
        assert_eq!(source.remaining(), 1);
    }
}
