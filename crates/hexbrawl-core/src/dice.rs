//! Dice for attack, location, escape and piloting rolls.
//!
//! All randomness in a round is drawn synchronously from one [`DiceRoller`]
//! owned by the engine. [`SeededDice`] wraps a `ChaCha8Rng` so a round can be
//! replayed bit-for-bit from its seed; [`ScriptedDice`] plays back a fixed
//! sequence of faces, which is how replays of recorded games and scenario
//! tests pin exact outcomes.

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Result of a 2d6 roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roll {
    /// Individual die faces
    pub dice: [u8; 2],
    /// Sum of the faces
    pub total: i32,
}

impl Roll {
    /// Creates a roll from two faces, each clamped to 1..=6.
    #[must_use]
    pub fn new(a: u8, b: u8) -> Self {
        let (a, b) = (a.clamp(1, 6), b.clamp(1, 6));
        Self {
            dice: [a, b],
            total: i32::from(a) + i32::from(b),
        }
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.total)
    }
}

/// Source of die rolls.
pub trait DiceRoller: Send {
    /// Rolls one six-sided die.
    fn d6(&mut self) -> u8;

    /// Rolls two six-sided dice.
    fn roll_2d6(&mut self) -> Roll {
        let a = self.d6();
        let b = self.d6();
        Roll::new(a, b)
    }
}

/// Deterministic dice driven by a seeded ChaCha8 stream.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededDice {
    /// Creates dice from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this stream started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl DiceRoller for SeededDice {
    fn d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// Dice that play back a fixed sequence of faces.
///
/// Once the script runs out, rolls continue from a seeded stream so a long
/// scenario never stalls.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    fallback: SeededDice,
}

impl ScriptedDice {
    /// Creates dice that return `faces` in order. Faces are clamped to 1..=6.
    #[must_use]
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().map(|f| f.clamp(1, 6)).collect(),
            fallback: SeededDice::new(0),
        }
    }

    /// Appends more faces to the script.
    pub fn push(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.faces.extend(faces.into_iter().map(|f| f.clamp(1, 6)));
    }

    /// Number of scripted faces not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn d6(&mut self) -> u8 {
        match self.faces.pop_front() {
            Some(face) => face,
            None => self.fallback.d6(),
        }
    }
}
