//! Dice-based battle resolution.
//!
//! The attacker rolls one die per army it commits, at most three, and must
//! leave one army behind. The defender rolls up to two dice. Highest dice are
//! paired off; each pair removes one army from the side with the lower die,
//! and the defender wins ties.

use rand::Rng;

/// Most dice the attacker may roll in one battle.
pub const MAX_ATTACK_DICE: u32 = 3;

/// Most dice the defender may roll in one battle.
pub const MAX_DEFENSE_DICE: u32 = 2;

/// Outcome of a single exchange of dice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    /// Attacker dice, sorted highest first.
    pub attacker_rolls: Vec<u8>,
    /// Defender dice, sorted highest first.
    pub defender_rolls: Vec<u8>,
    pub attacker_losses: u32,
    pub defender_losses: u32,
}

impl Battle {
    /// Number of dice the attacker rolled.
    pub fn attacker_dice(&self) -> u32 {
        self.attacker_rolls.len() as u32
    }
}

/// Dice counts for a battle, or `None` if either side cannot fight.
pub fn dice_counts(attacking_armies: u32, defending_armies: u32) -> Option<(u32, u32)> {
    let attack = attacking_armies.saturating_sub(1).min(MAX_ATTACK_DICE);
    let defense = defending_armies.min(MAX_DEFENSE_DICE);
    (attack > 0 && defense > 0).then_some((attack, defense))
}

fn roll(count: u32, rng: &mut impl Rng) -> Vec<u8> {
    let mut dice: Vec<u8> = (0..count).map(|_| rng.gen_range(1..=6)).collect();
    dice.sort_unstable_by(|a, b| b.cmp(a));
    dice
}

/// Scores already-sorted dice against each other.
pub fn compare_rolls(attacker_rolls: Vec<u8>, defender_rolls: Vec<u8>) -> Battle {
    let mut attacker_losses = 0;
    let mut defender_losses = 0;
    for (a, d) in attacker_rolls.iter().zip(defender_rolls.iter()) {
        if a > d {
            defender_losses += 1;
        } else {
            attacker_losses += 1;
        }
    }
    Battle {
        attacker_rolls,
        defender_rolls,
        attacker_losses,
        defender_losses,
    }
}

/// Rolls one battle between the given army counts.
///
/// Returns `None` if the attacker has fewer than two armies or the defender
/// has none. Losses never exceed the dice a side rolled, so neither count
/// can go below zero.
pub fn resolve_battle(
    attacking_armies: u32,
    defending_armies: u32,
    rng: &mut impl Rng,
) -> Option<Battle> {
    let (attack, defense) = dice_counts(attacking_armies, defending_armies)?;
    let attacker_rolls = roll(attack, rng);
    let defender_rolls = roll(defense, rng);
    Some(compare_rolls(attacker_rolls, defender_rolls))
}
