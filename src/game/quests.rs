//! Quest reward lines of the form `"<amount> <kind>"`.

use crate::shared::Rejection;

use super::RewardReceipt;

/// A reward line whose amount parsed. `kind` is unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardLine<'a> {
    pub amount: u64,
    pub kind: &'a str,
}

/// Parse the numeric prefix and the kind that follows it.
///
/// Returns `None` only when the amount does not parse; an unknown or empty
/// kind is left for the reward claim to report.
pub fn parse_reward_line(line: &str) -> Option<RewardLine<'_>> {
    let line = line.trim();
    let (amount, kind) = match line.split_once(char::is_whitespace) {
        Some((amount, kind)) => (amount, kind.trim()),
        None => (line, ""),
    };
    let amount = amount.parse().ok()?;
    Some(RewardLine { amount, kind })
}

/// What `complete_quest` did with each reward line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestReport {
    pub quest_id: u32,
    pub claimed: Vec<RewardReceipt>,
    /// Lines whose amount parsed but whose claim was rejected.
    pub rejected: Vec<(String, Rejection)>,
    /// Lines whose amount did not parse.
    pub skipped: Vec<String>,
}
