//! Route platform events into the engine's write paths

use tracing::debug;

use super::engine::RespecEngine;
use super::outcome::{EventKind, MessageReport, Outcome, SkipReason};
use crate::core::error::Result;
use crate::core::types::{Channel, User};
use crate::events::{ChannelRef, PlatformEvent, UserRef};
use crate::ledger::Ledger;

impl<L: Ledger> RespecEngine<L> {
    /// Apply everything one platform event is worth
    ///
    /// A chat message rewards each unique mentioned user first and then the
    /// author. Each of those is its own atomic update; a ledger failure part way
    /// through returns the error and leaves earlier updates in place.
    pub fn dispatch(&self, event: &PlatformEvent) -> Result<MessageReport> {
        let channel = self.resolve_channel(event.channel())?;
        let mut report = MessageReport::default();

        match event {
            PlatformEvent::Message { author, .. } => {
                let author = self.resolve_user(author)?;
                if author.bot {
                    report.outcomes.push(Outcome::skipped(
                        EventKind::OrganicMessage,
                        &author.id,
                        SkipReason::BotAuthor,
                    ));
                    return Ok(report);
                }
                if !channel.active {
                    debug!("Ignoring message from {} in inactive {}", author.name, channel.id);
                    report.outcomes.push(Outcome::skipped(
                        EventKind::OrganicMessage,
                        &author.id,
                        SkipReason::InactiveChannel,
                    ));
                    return Ok(report);
                }

                for mention in event.unique_mentions() {
                    if mention.id == author.id {
                        report.outcomes.push(Outcome::skipped(
                            EventKind::Mention,
                            &author.id,
                            SkipReason::SelfInteraction,
                        ));
                        continue;
                    }
                    let mentioned = self.resolve_user(mention)?;
                    debug!("{} mentioned {} in {}", author.name, mentioned.name, channel.id);
                    report.outcomes.push(self.process_mention(
                        &mentioned,
                        &channel,
                        self.config().mention_value,
                    )?);
                }

                report.outcomes.push(self.process_organic_message(
                    &author,
                    &channel,
                    self.config().message_value,
                )?);
            }
            PlatformEvent::ReactionAdded { reactor, author, .. } => {
                let reactor = self.resolve_user(reactor)?;
                let author = self.resolve_user(author)?;
                report.outcomes.push(self.process_reaction_added(
                    &reactor,
                    &author,
                    &channel,
                    self.config().reaction_value,
                )?);
            }
            PlatformEvent::ReactionRemoved { reactor, author, .. } => {
                let reactor = self.resolve_user(reactor)?;
                let author = self.resolve_user(author)?;
                report.outcomes.push(self.process_reaction_removed(
                    &reactor,
                    &author,
                    &channel,
                    self.config().mention_value,
                )?);
            }
        }

        Ok(report)
    }

    fn resolve_user(&self, user: &UserRef) -> Result<User> {
        Ok(self.ledger().get_or_create_user(&user.id, &user.name, user.bot)?)
    }

    fn resolve_channel(&self, channel: &ChannelRef) -> Result<Channel> {
        self.ledger().get_or_create_server(&channel.server)?;
        Ok(self.ledger().get_or_create_channel(&channel.id, &channel.server)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::config::RespecConfig;
    use crate::core::types::{ChannelId, UserId};
    use crate::ledger::MemoryLedger;
    use chrono::Utc;
    use rand::rngs::mock::StepRng;

    fn engine() -> RespecEngine<MemoryLedger> {
        RespecEngine::new(MemoryLedger::new(), RespecConfig::default())
            .unwrap()
            .with_rng(StepRng::new(u64::MAX, 0))
            .with_clock(ManualClock::new(Utc::now()))
    }

    fn message(author: UserRef, mentions: Vec<UserRef>) -> PlatformEvent {
        PlatformEvent::Message {
            author,
            channel: ChannelRef::new("c1", "s1"),
            content: String::new(),
            mentions,
        }
    }

    #[test]
    fn test_first_sight_channel_is_inactive() {
        let engine = engine();
        let report = engine.dispatch(&message(UserRef::new("a", "alice"), vec![])).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(
            report.outcomes[0].skip_reason(),
            Some(SkipReason::InactiveChannel)
        );
        assert_eq!(engine.ledger().user_count().unwrap(), 1);
    }

    #[test]
    fn test_message_rewards_mentions_then_author() {
        let engine = engine();
        engine.dispatch(&message(UserRef::new("a", "alice"), vec![])).unwrap();
        engine
            .ledger()
            .set_channel_active(&ChannelId::new("c1"), true)
            .unwrap();

        let event = message(
            UserRef::new("a", "alice"),
            vec![
                UserRef::new("b", "bob"),
                UserRef::new("a", "alice"),
                UserRef::new("b", "bob"),
            ],
        );
        let report = engine.dispatch(&event).unwrap();

        let kinds: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| (o.is_applied(), o.skip_reason()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (true, None),
                (false, Some(SkipReason::SelfInteraction)),
                (true, None),
            ]
        );
        assert_eq!(report.net_delta(), 3 + 2);

        let channel = ChannelId::new("c1");
        let ledger = engine.ledger();
        assert_eq!(ledger.current_score(&UserId::new("b"), &channel).unwrap(), 3);
        assert_eq!(ledger.current_score(&UserId::new("a"), &channel).unwrap(), 2);
    }

    #[test]
    fn test_bot_messages_ignored() {
        let engine = engine();
        let mut bot = UserRef::new("bot", "helper");
        bot.bot = true;

        let report = engine.dispatch(&message(bot, vec![UserRef::new("b", "bob")])).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].skip_reason(), Some(SkipReason::BotAuthor));
        assert_eq!(engine.global_total(), 0);
    }

    #[test]
    fn test_reaction_events_route_to_author() {
        let engine = engine();
        let added = PlatformEvent::ReactionAdded {
            reactor: UserRef::new("a", "alice"),
            author: UserRef::new("b", "bob"),
            channel: ChannelRef::new("c1", "s1"),
        };
        let report = engine.dispatch(&added).unwrap();
        let applied = report.applied().next().unwrap();
        assert_eq!(applied.user, UserId::new("b"));
        assert_eq!(applied.kind, EventKind::ReactionAdded);
        assert_eq!(applied.applied, 2);
    }
}
