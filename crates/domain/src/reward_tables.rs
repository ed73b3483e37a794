//! Weekly vault reward tables for the current season.
//!
//! Plain lookups; the only computation is clamping keystone depth to the
//! table's cap. Values are reward item levels.

use crate::value_objects::RaidDifficulty;

/// Keystone depth at and above which the reward stops increasing.
pub const KEYSTONE_MAX_DEPTH: u32 = 10;

/// Lowest keystone depth that grants a reward.
pub const KEYSTONE_MIN_DEPTH: u32 = 2;

/// Highest world-activity tier.
pub const WORLD_MAX_TIER: u8 = 11;

// Index 0 is depth 2.
const KEYSTONE_REWARDS: [u32; 9] = [259, 259, 263, 263, 266, 269, 269, 269, 272];

// Index 0 is tier 1.
const WORLD_TIER_REWARDS: [u32; 11] = [239, 239, 242, 246, 249, 252, 255, 259, 262, 265, 268];

/// Reward level for a keystone run of `depth`, or `floor` below the minimum depth.
///
/// ```
/// use innkeeper_domain::reward_tables::keystone_reward;
///
/// assert_eq!(keystone_reward(10, 0), keystone_reward(15, 0));
/// assert_eq!(keystone_reward(1, 0), 0);
/// ```
pub fn keystone_reward(depth: u32, floor: u32) -> u32 {
    if depth < KEYSTONE_MIN_DEPTH {
        return floor;
    }
    let capped = depth.min(KEYSTONE_MAX_DEPTH);
    KEYSTONE_REWARDS
        .get((capped - KEYSTONE_MIN_DEPTH) as usize)
        .copied()
        .unwrap_or(floor)
}

/// Reward level for a boss killed on `difficulty`.
pub fn raid_reward(difficulty: RaidDifficulty) -> u32 {
    match difficulty {
        RaidDifficulty::Lfr => 243,
        RaidDifficulty::Normal => 256,
        RaidDifficulty::Heroic => 269,
        RaidDifficulty::Mythic => 282,
    }
}

/// Reward level for a world activity of `tier` (1..=11), or `floor` outside it.
pub fn world_reward(tier: u8, floor: u32) -> u32 {
    if tier == 0 {
        return floor;
    }
    WORLD_TIER_REWARDS
        .get(usize::from(tier) - 1)
        .copied()
        .unwrap_or(floor)
}

/// Full keystone table as (depth, reward) pairs, for display alongside vault data.
pub fn keystone_table() -> Vec<(u32, u32)> {
    (KEYSTONE_MIN_DEPTH..=KEYSTONE_MAX_DEPTH)
        .zip(KEYSTONE_REWARDS.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keystone_depths_map_to_table() {
        assert_eq!(keystone_reward(2, 0), 259);
        assert_eq!(keystone_reward(3, 0), 259);
        assert_eq!(keystone_reward(4, 0), 263);
        assert_eq!(keystone_reward(6, 0), 266);
        assert_eq!(keystone_reward(9, 0), 269);
        assert_eq!(keystone_reward(10, 0), 272);
    }

    #[test]
    fn keystone_depth_is_capped_not_extrapolated() {
        assert_eq!(keystone_reward(15, 0), 272);
        assert_eq!(keystone_reward(u32::MAX, 0), 272);
    }

    #[test]
    fn keystone_below_minimum_uses_floor() {
        assert_eq!(keystone_reward(0, 0), 0);
        assert_eq!(keystone_reward(1, 7), 7);
    }

    #[test]
    fn raid_difficulties_are_ordered_by_reward() {
        assert!(raid_reward(RaidDifficulty::Lfr) < raid_reward(RaidDifficulty::Normal));
        assert!(raid_reward(RaidDifficulty::Normal) < raid_reward(RaidDifficulty::Heroic));
        assert!(raid_reward(RaidDifficulty::Heroic) < raid_reward(RaidDifficulty::Mythic));
    }

    #[test]
    fn world_tiers_outside_range_use_floor() {
        assert_eq!(world_reward(1, 0), 239);
        assert_eq!(world_reward(11, 0), 268);
        assert_eq!(world_reward(0, 0), 0);
        assert_eq!(world_reward(12, 0), 0);
    }

    #[test]
    fn keystone_table_covers_every_rewarding_depth() {
        let table = keystone_table();
        assert_eq!(table.first(), Some(&(2, 259)));
        assert_eq!(table.last(), Some(&(10, 272)));
        assert_eq!(table.len(), 9);
    }
}
