use tracing::{debug, error, info, warn};

use crate::arena_deck::Deck;
use crate::arena_game::{Card, CardKind};
use crate::arena_proto::{ProtoClient, GAME_OVER, TEAM_NAME_PROMPT, TURN_START};
use crate::arena_scoring::{self, ScoreEntry, ScoringInput};
use crate::arena_transport::{LineTransport, TransportError};

/// Every 4th turn is reserved for attacking instead of drawing.
const TURN_CYCLE: u32 = 4;
/// Last turn of a round; triggers the defensive cleanup actions.
const FINAL_TURN: u32 = 16;

/// Server-driven decision loop: waits for a server message, reacts,
/// and goes back to waiting. The session owns the protocol client and
/// the deck for the whole process lifetime.
pub struct BotSession<T: LineTransport> {
    client: ProtoClient<T>,
    deck: Deck,
    team_name: String,
    team_index: Option<i32>,
}

impl<T: LineTransport> BotSession<T> {
    pub fn new(team_name: String, transport: T) -> Self {
        BotSession {
            client: ProtoClient::new(transport),
            deck: Deck::new(),
            team_name,
            team_index: None,
        }
    }

    /// Runs the loop until the server terminates the game or the
    /// connection fails. The transport is released on both paths.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        info!("starting game loop");
        let result = self.game_loop().await;
        self.client.close().await;
        match &result {
            Ok(()) => info!("game loop finished"),
            Err(e) => error!("game loop aborted: {}", e),
        }
        result
    }

    async fn game_loop(&mut self) -> Result<(), TransportError> {
        loop {
            let message = self.client.receive().await?;
            let Some(token) = message.first() else {
                continue;
            };
            match token.as_str() {
                GAME_OVER => break,
                TEAM_NAME_PROMPT => {
                    let index = self.client.announce_team(&self.team_name).await?;
                    info!(team = %self.team_name, index, "team registered");
                    self.team_index = Some(index);
                }
                TURN_START => self.play_turn(&message).await?,
                other => debug!("ignoring server message {:?}", other),
            }
        }
        Ok(())
    }

    /// One full turn: fetch fresh snapshots, rank them, act.
    async fn play_turn(&mut self, message: &[String]) -> Result<(), TransportError> {
        let turn_index = match message.get(2).and_then(|field| field.trim().parse().ok()) {
            Some(turn_index) => turn_index,
            None => {
                warn!("turn start without a turn index: {:?}, assuming 0", message);
                0
            }
        };

        let me = self.client.myself().await?;
        let team_index = self.team_index.unwrap_or(0);
        let others: Vec<_> = self
            .client
            .players()
            .await?
            .into_iter()
            .enumerate()
            .filter(|(index, _)| *index as i32 != team_index)
            .map(|(_, player)| player)
            .collect();
        let monsters = self.client.monsters().await?;
        let drawables = self.client.drawables().await?;
        let damage_threshold = self.client.damage_threshold().await?;
        debug!(
            turn_index,
            damage_threshold,
            opponents = others.len(),
            monsters = monsters.len(),
            drawables = drawables.len(),
            "turn snapshot"
        );

        let scores = arena_scoring::evaluate(&ScoringInput {
            monsters: &monsters,
            drawables: &drawables,
            me: &me,
            deck: &self.deck,
            damage_threshold,
            turn_index,
        });

        let draw_turn = (turn_index + 1) % TURN_CYCLE != 0;
        let no_attack_capacity =
            self.deck.sum_values(CardKind::Attack) <= 0 && me.attack_score <= 0;
        if draw_turn || no_attack_capacity {
            self.draw_best(&scores.cards, &drawables).await?;
        } else {
            if !self.client.use_card(CardKind::Attack).await? {
                warn!("server refused the attack card");
            }
            match arena_scoring::best_entry(&scores.monsters) {
                Some(best) => {
                    if !self.client.attack(best.index).await? {
                        warn!(monster = best.index, "server refused the attack");
                    }
                }
                None => warn!("attack turn with no monsters to attack"),
            }
        }

        if turn_index + 1 == FINAL_TURN {
            if !self.client.use_card(CardKind::Defense).await? {
                warn!("server refused the defense card");
            }
            if !self.client.use_card(CardKind::Knowledge).await? {
                warn!("server refused the knowledge card");
            }
        }
        Ok(())
    }

    /// Draws the best-scored expedition and, if the server accepts,
    /// stores the matching card in the deck.
    async fn draw_best(
        &mut self,
        scored: &[ScoreEntry],
        drawables: &[Card],
    ) -> Result<(), TransportError> {
        let Some(best) = arena_scoring::best_entry(scored) else {
            debug!("nothing to draw this turn");
            return Ok(());
        };
        if self.client.draw(best.index, None).await? {
            if let Some(card) = drawables.iter().find(|card| card.index == best.index) {
                self.deck.add(*card);
                debug!(deck = %self.deck, "deck updated");
            }
        } else {
            warn!(expedition = best.index, "server refused the draw");
        }
        Ok(())
    }
}
