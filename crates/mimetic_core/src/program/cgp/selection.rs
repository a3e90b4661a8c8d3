use rand::Rng;

/// Indices ordered from fittest to least fit. Ties keep population order.
#[must_use]
pub fn rank_by_fitness(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
    order
}

/// Draws `size` contestants with replacement and returns the fittest.
pub fn tournament<R: Rng>(fitness: &[f64], size: usize, rng: &mut R) -> usize {
    let mut winner = rng.gen_range(0..fitness.len());
    for _ in 1..size.max(1) {
        let challenger = rng.gen_range(0..fitness.len());
        if fitness[challenger] > fitness[winner] {
            winner = challenger;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rank_by_fitness_descending() {
        assert_eq!(rank_by_fitness(&[0.5, 2.0, -1.0, 2.0]), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_large_tournament_finds_the_best() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let fitness = [0.1, 0.9, 0.3];
        let wins = (0..100)
            .filter(|_| tournament(&fitness, 30, &mut rng) == 1)
            .count();
        assert!(wins > 95);
    }
}
