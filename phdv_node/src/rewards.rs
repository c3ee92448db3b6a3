//! Token reward policy. Pure helpers, no I/O; the only non-determinism is
//! the base random draw.

use rand::Rng;
use serde_json::Value;

/// Bounds of the flat per-analysis draw.
pub const MIN_REWARD: u64 = 10;
pub const MAX_REWARD: u64 = 100;

/// Amount used by the PHDV route when no quality scores came back.
pub const DEFAULT_PHDV_REWARD: u64 = 50;

/// Uniform random reward in `[min, max]`, both ends inclusive.
pub fn generate_token_reward(min: u64, max: u64) -> u64 {
    rand::thread_rng().gen_range(min..=max)
}

/// Larger documents earn a flat 20% bonus.
pub fn file_size_bonus(file_size: u64) -> f64 {
    if file_size > 5 * 1024 * 1024 {
        1.2
    } else {
        1.0
    }
}

/// Consecutive upload days increase rewards.
pub fn streak_bonus(consecutive_days: u32) -> f64 {
    match consecutive_days {
        days if days >= 30 => 1.5,
        days if days >= 14 => 1.3,
        days if days >= 7 => 1.2,
        days if days >= 3 => 1.1,
        _ => 1.0,
    }
}

/// Bonus from the 0-100 data quality score.
pub fn quality_bonus(quality_score: f64) -> f64 {
    match quality_score {
        score if score >= 90.0 => 1.5,
        score if score >= 80.0 => 1.3,
        score if score >= 70.0 => 1.2,
        score if score >= 60.0 => 1.1,
        _ => 1.0,
    }
}

/// Loyalty tier keyed by cumulative token balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserTier {
    pub name: &'static str,
    pub min_tokens: u64,
    pub multiplier: f64,
}

pub const USER_TIERS: [UserTier; 5] = [
    UserTier { name: "Bronze", min_tokens: 0, multiplier: 1.0 },
    UserTier { name: "Silver", min_tokens: 1_000, multiplier: 1.1 },
    UserTier { name: "Gold", min_tokens: 5_000, multiplier: 1.25 },
    UserTier { name: "Platinum", min_tokens: 20_000, multiplier: 1.5 },
    UserTier { name: "Diamond", min_tokens: 50_000, multiplier: 2.0 },
];

pub fn user_tier(total_tokens: u64) -> UserTier {
    USER_TIERS
        .iter()
        .rev()
        .find(|tier| total_tokens >= tier.min_tokens)
        .copied()
        .unwrap_or(USER_TIERS[0])
}

/// Optional inputs to the composed reward.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardFactors {
    pub file_size: Option<u64>,
    pub consecutive_days: Option<u32>,
    pub quality_score: Option<f64>,
    pub total_tokens: Option<u64>,
}

/// Composes every applicable bonus multiplicatively and rounds once at the
/// end, half away from zero.
pub fn calculate_total_reward(base_reward: u64, factors: &RewardFactors) -> u64 {
    let mut multiplier = 1.0;

    if let Some(file_size) = factors.file_size {
        multiplier *= file_size_bonus(file_size);
    }
    if let Some(days) = factors.consecutive_days {
        multiplier *= streak_bonus(days);
    }
    if let Some(score) = factors.quality_score {
        multiplier *= quality_bonus(score);
    }
    if let Some(total) = factors.total_tokens {
        multiplier *= user_tier(total).multiplier;
    }

    (base_reward as f64 * multiplier).round() as u64
}

/// Maps the average `overallScore` of the PHDV quality reports linearly
/// into the 10..=100 token range. Higher quality data earns more.
pub fn quality_reward_tokens(quality_scores: &[Value]) -> u64 {
    let scores: Vec<f64> = quality_scores
        .iter()
        .filter_map(|entry| entry["qualityScore"]["overallScore"].as_f64())
        .collect();
    if scores.is_empty() {
        return DEFAULT_PHDV_REWARD;
    }
    let average = scores.iter().sum::<f64>() / scores.len() as f64;
    (10.0 + (average / 100.0) * 90.0).round() as u64
}
