use crate::notifications::Severity;
use crate::shared::{Rejection, ResourceKind, SectId};

use super::vip::VipChange;
use super::{EventReward, GameStore, LoginReport, QuestReport, RewardReceipt, ServerEvent};

/// One game-store operation, as sent by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameCommand {
    ClaimReward {
        kind: ResourceKind,
        amount: u64,
        items: Vec<String>,
    },
    CompleteQuest {
        quest_id: u32,
        rewards: Vec<String>,
    },
    AddNotification {
        message: String,
        severity: Severity,
    },
    SetSect(SectId),
    Recharge {
        amount: u64,
    },
    RenamePlayer(String),
    RecordLogin,
    AddCultivationTime {
        minutes: u64,
    },
    RecordBossDefeat,
    PublishEvent {
        event: ServerEvent,
        rewards: Vec<EventReward>,
    },
    ClaimEventReward {
        reward_id: String,
    },
    ExpireEvents,
}

/// The result of a successfully applied [`GameCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameApplied {
    Reward(RewardReceipt),
    Quest(QuestReport),
    Notification(u64),
    SectJoined(SectId),
    Recharged(VipChange),
    Renamed,
    LoggedIn(LoginReport),
    CultivationTime(u64),
    BossesDefeated(u32),
    EventPublished,
    EventsExpired(usize),
}

impl GameStore {
    pub fn apply(&mut self, command: GameCommand) -> Result<GameApplied, Rejection> {
        match command {
            GameCommand::ClaimReward {
                kind,
                amount,
                items,
            } => self.claim_reward(kind, amount, &items).map(GameApplied::Reward),
            GameCommand::CompleteQuest { quest_id, rewards } => {
                Ok(GameApplied::Quest(self.complete_quest(quest_id, &rewards)))
            }
            GameCommand::AddNotification { message, severity } => {
                Ok(GameApplied::Notification(self.add_notification(message, severity)))
            }
            GameCommand::SetSect(sect) => {
                self.set_sect(sect);
                Ok(GameApplied::SectJoined(sect))
            }
            GameCommand::Recharge { amount } => self.recharge(amount).map(GameApplied::Recharged),
            GameCommand::RenamePlayer(name) => {
                self.rename_player(&name).map(|()| GameApplied::Renamed)
            }
            GameCommand::RecordLogin => self.record_login().map(GameApplied::LoggedIn),
            GameCommand::AddCultivationTime { minutes } => self
                .add_cultivation_time(minutes)
                .map(GameApplied::CultivationTime),
            GameCommand::RecordBossDefeat => {
                Ok(GameApplied::BossesDefeated(self.record_boss_defeat()))
            }
            GameCommand::PublishEvent { event, rewards } => self
                .publish_event(event, rewards)
                .map(|()| GameApplied::EventPublished),
            GameCommand::ClaimEventReward { reward_id } => {
                self.claim_event_reward(&reward_id).map(GameApplied::Reward)
            }
            GameCommand::ExpireEvents => Ok(GameApplied::EventsExpired(self.expire_events())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ManualClock;
    use std::sync::Arc;

    #[test]
    fn test_apply_dispatches_to_operations() {
        let mut game = GameStore::in_memory(Arc::new(ManualClock::new(0)));

        let applied = game
            .apply(GameCommand::ClaimReward {
                kind: ResourceKind::SpiritStones,
                amount: 25,
                items: vec![],
            })
            .unwrap();
        assert!(matches!(applied, GameApplied::Reward(r) if r.amount == 25));
        assert_eq!(game.state().player.spirit_stones, 125);

        assert_eq!(
            game.apply(GameCommand::SetSect(SectId::AzureCloud)),
            Ok(GameApplied::SectJoined(SectId::AzureCloud))
        );
        assert_eq!(
            game.apply(GameCommand::Recharge { amount: 0 }),
            Err(Rejection::ZeroAmount)
        );
        assert_eq!(
            game.apply(GameCommand::RecordBossDefeat),
            Ok(GameApplied::BossesDefeated(1))
        );
    }
}
