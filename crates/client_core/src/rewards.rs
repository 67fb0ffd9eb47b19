use std::fmt;

use shared::protocol::Reward;

pub const BANK_REWARDS_PROGRAM: &str = "Bank Rewards";
pub const POINTS_PER_RUPEE: i64 = 10;
pub const MIN_REDEEM_POINTS: i64 = 10;
/// Rupees of debit spend that earn one point.
pub const SPEND_PER_POINT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RewardLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl RewardLevel {
    pub fn for_points(points: i64) -> Self {
        match points {
            p if p >= 2000 => Self::Platinum,
            p if p >= 1500 => Self::Gold,
            p if p >= 1000 => Self::Silver,
            _ => Self::Bronze,
        }
    }
}

impl fmt::Display for RewardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        })
    }
}

/// What a point balance is worth when redeemed. Only whole multiples of
/// `POINTS_PER_RUPEE` are redeemable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemQuote {
    pub total_points: i64,
    pub redeemable_points: i64,
    pub value_rupees: i64,
}

impl RedeemQuote {
    pub fn for_points(total_points: i64) -> Self {
        let total_points = total_points.max(0);
        let redeemable_points = total_points / POINTS_PER_RUPEE * POINTS_PER_RUPEE;
        Self {
            total_points,
            redeemable_points,
            value_rupees: redeemable_points / POINTS_PER_RUPEE,
        }
    }

    pub fn can_redeem(&self) -> bool {
        self.redeemable_points >= MIN_REDEEM_POINTS
    }

    pub fn leftover_points(&self) -> i64 {
        self.total_points - self.redeemable_points
    }
}

pub fn bank_reward(rewards: &[Reward]) -> Option<&Reward> {
    rewards
        .iter()
        .find(|reward| reward.program_name == BANK_REWARDS_PROGRAM)
}

/// Points a debit of `amount` rupees will earn.
pub fn points_for_debit(amount: f64) -> i64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    (amount / SPEND_PER_POINT).floor() as i64
}

#[cfg(test)]
mod tests {
    use shared::domain::RewardId;

    use super::*;

    #[test]
    fn only_whole_tens_are_redeemable() {
        let quote = RedeemQuote::for_points(1237);
        assert_eq!(quote.redeemable_points, 1230);
        assert_eq!(quote.value_rupees, 123);
        assert_eq!(quote.leftover_points(), 7);
        assert!(quote.can_redeem());
    }

    #[test]
    fn below_minimum_cannot_redeem() {
        let quote = RedeemQuote::for_points(9);
        assert_eq!(quote.redeemable_points, 0);
        assert!(!quote.can_redeem());
        assert!(!RedeemQuote::for_points(-40).can_redeem());
        assert!(RedeemQuote::for_points(10).can_redeem());
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(RewardLevel::for_points(0), RewardLevel::Bronze);
        assert_eq!(RewardLevel::for_points(999), RewardLevel::Bronze);
        assert_eq!(RewardLevel::for_points(1000), RewardLevel::Silver);
        assert_eq!(RewardLevel::for_points(1500), RewardLevel::Gold);
        assert_eq!(RewardLevel::for_points(2400), RewardLevel::Platinum);
    }

    #[test]
    fn finds_bank_program_among_others() {
        let rewards = vec![
            Reward {
                id: RewardId(1),
                program_name: "Airline Miles".into(),
                points_balance: 50,
                last_updated: None,
            },
            Reward {
                id: RewardId(2),
                program_name: BANK_REWARDS_PROGRAM.into(),
                points_balance: 320,
                last_updated: None,
            },
        ];
        assert_eq!(bank_reward(&rewards).map(|r| r.id), Some(RewardId(2)));
        assert!(bank_reward(&rewards[..1]).is_none());
    }

    #[test]
    fn debit_earns_a_point_per_hundred() {
        assert_eq!(points_for_debit(99.99), 0);
        assert_eq!(points_for_debit(250.0), 2);
        assert_eq!(points_for_debit(-500.0), 0);
    }
}
