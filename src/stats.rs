use crate::engine::Outcome;

/// Number of students placed at each preference rank (index 0 is rank 1),
/// truncated after the last non-empty rank.
pub fn statistics(outcome: &Outcome) -> Vec<usize> {
    let mut ranks = Vec::new();
    for rank in outcome.entries.iter().filter_map(|e| e.rank) {
        if ranks.len() < rank {
            ranks.resize(rank, 0);
        }
        ranks[rank - 1] += 1;
    }
    ranks
}

pub fn mean_satisfaction(outcome: &Outcome) -> f64 {
    if outcome.entries.is_empty() {
        return 0.0;
    }
    let total: u32 = outcome.entries.iter().map(|e| u32::from(e.satisfaction)).sum();
    f64::from(total) / outcome.entries.len() as f64
}
