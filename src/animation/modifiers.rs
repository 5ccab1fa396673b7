//! Modifier stack: repeat, noise and shake.
//!
//! Repeat reshapes a segment's timing and endpoints. Noise and shake are
//! additive offsets layered on top of the eased base value; they never touch
//! the segment's start or end values.
//!
//! All random samples are drawn at build time from a [`StdRng`] seeded from
//! [`AnimationSettings::noise_seed`](crate::settings::AnimationSettings) and
//! the segment's position, so evaluation is a pure function of time and a
//! rebuild reproduces the same motion.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::animation::easing::{EaseFamily, EaseMode, ease};
use crate::animation::options::{KeyframeOptions, NoiseOptions, RepeatType};
use crate::animation::values::lerp;

/// Upper bound on samples drawn per lattice, whatever the segment length.
const MAX_SAMPLES: usize = 1 << 14;
/// Higher octaves are below sample resolution.
pub const MAX_OCTAVES: u32 = 16;

// ============================================================================
// Repeat
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatSpec {
    pub kind: RepeatType,
    /// Extra runs after the first.
    pub count: u32,
    pub delay: f32,
}

/// Where a local time falls within a repeating segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatPhase {
    pub iteration: u32,
    /// Linear progress through the current iteration, in `[0, 1]`.
    pub progress: f32,
    pub finished: bool,
}

impl RepeatSpec {
    pub const NONE: Self = Self {
        kind: RepeatType::None,
        count: 0,
        delay: 0.0,
    };

    #[must_use]
    pub fn from_options(options: &KeyframeOptions) -> Self {
        let count = options.effective_repeats();
        if count == 0 {
            return Self::NONE;
        }
        Self {
            kind: options.repeat_type,
            count,
            delay: options.repeat_delay.max(0.0),
        }
    }

    /// Total time covered by the first run plus all repeats.
    #[must_use]
    pub fn span(&self, duration: f32) -> f32 {
        duration * (self.count + 1) as f32 + self.delay * self.count as f32
    }

    #[must_use]
    pub fn locate(&self, duration: f32, local_time: f32) -> RepeatPhase {
        let local_time = local_time.max(0.0);
        let cycle = duration + self.delay;

        if duration <= 0.0 {
            let iteration = if self.delay > 0.0 {
                ((local_time / self.delay).floor() as u32).min(self.count)
            } else {
                self.count
            };
            return RepeatPhase {
                iteration,
                progress: 1.0,
                finished: iteration == self.count,
            };
        }

        let iteration = (local_time / cycle).floor() as u32;
        if iteration > self.count {
            return RepeatPhase {
                iteration: self.count,
                progress: 1.0,
                finished: true,
            };
        }
        let within = local_time - iteration as f32 * cycle;
        let progress = (within / duration).min(1.0);
        RepeatPhase {
            iteration,
            progress,
            finished: iteration == self.count && within >= duration,
        }
    }

    /// Start and end values of iteration `iteration`.
    #[must_use]
    pub fn endpoints(&self, from: f32, to: f32, iteration: u32) -> (f32, f32) {
        match self.kind {
            RepeatType::None | RepeatType::Restart => (from, to),
            RepeatType::Yoyo => {
                if iteration % 2 == 0 {
                    (from, to)
                } else {
                    (to, from)
                }
            }
            RepeatType::Incremental => {
                let delta = (to - from) * iteration as f32;
                (from + delta, to + delta)
            }
        }
    }

    /// Value held once every iteration has played.
    #[must_use]
    pub fn final_value(&self, from: f32, to: f32) -> f32 {
        self.endpoints(from, to, self.count).1
    }
}

// ============================================================================
// Seeding
// ============================================================================

/// Derives a per-lattice seed from the base seed and a position.
#[must_use]
pub fn mix_seed(base: u64, parts: &[u64]) -> u64 {
    parts.iter().fold(base ^ 0x5851_F42D_4C95_7F2D, |acc, &part| {
        let mut z = acc.wrapping_add(part.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    })
}

fn draw_samples(seed: u64, count: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count.clamp(1, MAX_SAMPLES))
        .map(|_| rng.random_range(0.0..1.0f32))
        .collect()
}

fn sample_lattice(samples: &[f32], x: f32, smooth: bool) -> f32 {
    let last = samples.len().saturating_sub(1);
    let x = x.max(0.0);
    let i = (x.floor() as usize).min(last);
    let a = samples[i];
    if !smooth {
        return a;
    }
    let b = samples[(i + 1).min(last)];
    let f = (x - x.floor()).clamp(0.0, 1.0);
    lerp(a, b, f * f * (3.0 - 2.0 * f))
}

// ============================================================================
// Noise
// ============================================================================

/// Value-noise offset over one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseModifier {
    options: NoiseOptions,
    duration: f32,
    /// `[generation][octave]` lattices. One generation unless every repeat
    /// iteration draws fresh noise.
    lattices: Vec<Vec<Vec<f32>>>,
}

impl NoiseModifier {
    #[must_use]
    pub fn new(mut options: NoiseOptions, duration: f32, generations: u32, seed: u64) -> Self {
        options.lod = options.lod.clamp(1, MAX_OCTAVES);
        let octaves = options.lod;
        let base_steps = (duration.max(0.0) * options.step_size_per_second.max(0.0)).ceil() as usize;
        let lattices = (0..generations.max(1))
            .map(|generation| {
                (0..octaves)
                    .map(|octave| {
                        let steps = base_steps.saturating_mul(1 << octave);
                        let seed = mix_seed(seed, &[u64::from(generation), u64::from(octave)]);
                        draw_samples(seed, steps + 2)
                    })
                    .collect()
            })
            .collect();
        Self {
            options,
            duration,
            lattices,
        }
    }

    /// Offset at `progress` through iteration `iteration`.
    #[must_use]
    pub fn offset(&self, progress: f32, iteration: u32) -> f32 {
        let generation = (iteration as usize).min(self.lattices.len() - 1);
        let octaves = &self.lattices[generation];
        let x = progress * self.duration * self.options.step_size_per_second.max(0.0);

        let mut total = 0.0;
        let mut weight = 0.0;
        let mut amplitude = 1.0;
        for (octave, samples) in octaves.iter().enumerate() {
            let frequency = (1u32 << octave) as f32;
            total += sample_lattice(samples, x * frequency, self.options.smooth) * amplitude;
            weight += amplitude;
            amplitude *= 0.5;
        }
        let n = if weight > 0.0 { total / weight } else { 0.0 };
        let offset = lerp(self.options.start_range, self.options.end_range, n);

        let mut envelope = 1.0;
        if self.options.fade_in {
            envelope *= ease(EaseFamily::Sine, EaseMode::InOut, progress * 2.0);
        }
        if self.options.fade_out {
            envelope *= ease(EaseFamily::Sine, EaseMode::InOut, (1.0 - progress) * 2.0);
        }
        offset * envelope
    }
}

// ============================================================================
// Shake
// ============================================================================

/// Random offset resampled at a fixed rate, eased between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ShakeModifier {
    bottom: f32,
    top: f32,
    update_rate: f32,
    mode: EaseMode,
    samples: Vec<f32>,
}

impl ShakeModifier {
    /// `span` is the full segment time including repeats.
    #[must_use]
    pub fn new(options: &KeyframeOptions, span: f32, seed: u64) -> Self {
        let update_rate = options.shake_update_rate.max(0.0);
        let count = if update_rate > 0.0 {
            (span.max(0.0) / update_rate).ceil() as usize + 2
        } else {
            1
        };
        Self {
            bottom: options.shake_range_bottom,
            top: options.shake_range_top,
            update_rate,
            mode: options.shake_type,
            samples: draw_samples(seed, count),
        }
    }

    /// Offset at segment-local time `local_time`.
    #[must_use]
    pub fn offset(&self, local_time: f32) -> f32 {
        let n = if self.update_rate > 0.0 {
            let x = local_time.max(0.0) / self.update_rate;
            let last = self.samples.len() - 1;
            let i = (x.floor() as usize).min(last);
            let a = self.samples[i];
            let b = self.samples[(i + 1).min(last)];
            lerp(a, b, ease(EaseFamily::Sine, self.mode, x - x.floor()))
        } else {
            self.samples[0]
        };
        lerp(self.bottom, self.top, n)
    }
}

// ============================================================================
// Stack
// ============================================================================

/// Additive modifiers attached to one segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierStack {
    pub noise: Option<NoiseModifier>,
    pub shake: Option<ShakeModifier>,
}

impl ModifierStack {
    /// Builds the stack for a segment from its keyframe options.
    ///
    /// Modifiers are only created when their `add_*` flag is set; a
    /// zero-length segment never gets noise.
    #[must_use]
    pub fn from_options(options: &KeyframeOptions, repeat: &RepeatSpec, duration: f32, seed: u64) -> Self {
        let noise = (options.add_noise && duration > 0.0).then(|| {
            let generations = if options.generate_new_noise_each_iteration {
                repeat.count + 1
            } else {
                1
            };
            NoiseModifier::new(options.noise, duration, generations, mix_seed(seed, &[1]))
        });
        let shake = options
            .add_shake
            .then(|| ShakeModifier::new(options, repeat.span(duration), mix_seed(seed, &[2])));
        Self { noise, shake }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.noise.is_none() && self.shake.is_none()
    }

    /// Sum of all active offsets. Exactly 0 when the stack is empty.
    #[must_use]
    pub fn offset(&self, local_time: f32, phase: &RepeatPhase) -> f32 {
        let mut offset = 0.0;
        if let Some(noise) = &self.noise {
            offset += noise.offset(phase.progress, phase.iteration);
        }
        if let Some(shake) = &self.shake {
            offset += shake.offset(local_time);
        }
        offset
    }
}
