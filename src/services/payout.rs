//! Stateless payout calculator: pools every player's risky contribution,
//! grows it by the configured multiplier, and splits it evenly.
//!
//! Payouts are computed from the allocation fields, never from the ready
//! bit: the bit is already recycled for restart votes by the time results
//! are consumed.

use crate::dao::models::PlayerEntity;

/// Ranked payout table for one finished round.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutTable {
    /// Sum of all pool contributions.
    pub pool_total: u32,
    /// Pool after applying the growth multiplier.
    pub pool_grown: f64,
    /// Even share of the grown pool.
    pub equal_share: f64,
    /// Per-player payouts, highest first.
    pub players: Vec<PlayerPayout>,
}

/// One player's line in the payout table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPayout {
    /// Display name.
    pub name: String,
    /// Safe-asset allocation (missing allocations count as zero).
    pub asset_a: u32,
    /// Pool contribution (missing allocations count as zero).
    pub asset_b: u32,
    /// Safe asset plus the equal share of the grown pool.
    pub final_payout: f64,
}

/// Compute the payout table for the given roster.
///
/// An empty roster yields an empty table rather than dividing by zero; the
/// game service never exposes results for an empty room anyway.
pub fn compute(players: &[PlayerEntity], multiplier: f64) -> PayoutTable {
    let pool_total: u32 = players.iter().map(|p| p.asset_b.unwrap_or(0)).sum();
    let pool_grown = f64::from(pool_total) * multiplier;
    let equal_share = if players.is_empty() {
        0.0
    } else {
        pool_grown / players.len() as f64
    };

    let mut ranked: Vec<PlayerPayout> = players
        .iter()
        .map(|player| {
            let asset_a = player.asset_a.unwrap_or(0);
            PlayerPayout {
                name: player.name.clone(),
                asset_a,
                asset_b: player.asset_b.unwrap_or(0),
                final_payout: f64::from(asset_a) + equal_share,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.final_payout
            .total_cmp(&a.final_payout)
            .then_with(|| a.name.cmp(&b.name))
    });

    PayoutTable {
        pool_total,
        pool_grown,
        equal_share,
        players: ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(name: &str, asset_a: u32, asset_b: u32) -> PlayerEntity {
        let mut player = PlayerEntity::new("ROOM01", name, false);
        player.asset_a = Some(asset_a);
        player.asset_b = Some(asset_b);
        player
    }

    #[test]
    fn two_player_round_matches_worked_example() {
        // One submits (60, 40), the other (100, 0): pool 40, grown 60,
        // share 30 each, payouts 90 and 130.
        let players = [submitted("alice", 60, 40), submitted("bob", 100, 0)];
        let table = compute(&players, 1.5);

        assert_eq!(table.pool_total, 40);
        assert_eq!(table.pool_grown, 60.0);
        assert_eq!(table.equal_share, 30.0);

        assert_eq!(table.players[0].name, "bob");
        assert_eq!(table.players[0].final_payout, 130.0);
        assert_eq!(table.players[1].name, "alice");
        assert_eq!(table.players[1].final_payout, 90.0);
    }

    #[test]
    fn payouts_conserve_the_grown_pool() {
        let players = [
            submitted("a", 10, 90),
            submitted("b", 55, 45),
            submitted("c", 100, 0),
            submitted("d", 0, 100),
        ];
        let table = compute(&players, 1.5);

        let total_paid: f64 = table.players.iter().map(|p| p.final_payout).sum();
        let safe_total: f64 = players.iter().map(|p| f64::from(p.asset_a.unwrap())).sum();
        let pool_total: f64 = players.iter().map(|p| f64::from(p.asset_b.unwrap())).sum();

        assert!((total_paid - (safe_total + pool_total * 1.5)).abs() < 1e-9);
    }

    #[test]
    fn missing_allocations_count_as_zero() {
        let mut pending = PlayerEntity::new("ROOM01", "pending", false);
        pending.asset_a = None;
        pending.asset_b = None;
        let players = [submitted("done", 50, 50), pending];

        let table = compute(&players, 1.5);
        assert_eq!(table.pool_total, 50);
        let pending_row = table.players.iter().find(|p| p.name == "pending").unwrap();
        assert_eq!(pending_row.asset_a, 0);
        assert_eq!(pending_row.final_payout, table.equal_share);
    }

    #[test]
    fn empty_roster_yields_empty_table() {
        let table = compute(&[], 1.5);
        assert_eq!(table.pool_total, 0);
        assert_eq!(table.equal_share, 0.0);
        assert!(table.players.is_empty());
    }
}
