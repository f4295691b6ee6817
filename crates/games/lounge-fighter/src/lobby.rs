//! Fighter sprite assignment for the pre-match lobby.

use std::collections::BTreeSet;

use rand::Rng;

pub const FIGHTER_SPRITES: [&str; 8] = [
    "dino1", "dino2", "dino3", "dino4", "dino5", "dino6", "dino7", "dino8",
];

/// Pick a random fighter sprite nobody in `taken` uses yet.
pub fn assign_unique_sprite<R: Rng + ?Sized>(
    taken: &BTreeSet<String>,
    rng: &mut R,
) -> Option<&'static str> {
    let free: Vec<&'static str> = FIGHTER_SPRITES
        .iter()
        .copied()
        .filter(|s| !taken.contains(*s))
        .collect();
    if free.is_empty() {
        tracing::debug!(taken = taken.len(), "No fighter sprites left");
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn never_hands_out_a_taken_sprite() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut taken = BTreeSet::new();
        for _ in 0..FIGHTER_SPRITES.len() {
            let sprite = assign_unique_sprite(&taken, &mut rng).unwrap();
            assert!(taken.insert(sprite.to_string()));
        }
        assert_eq!(assign_unique_sprite(&taken, &mut rng), None);
    }
}
