//! Pipe-delimited wire protocol: command encoding, response splitting,
//! and one typed operation per server command.

use tracing::warn;

use crate::arena_game::{Card, CardKind, Monster, Player};
use crate::arena_transport::{LineTransport, TransportError};

// Server-originated tokens.
pub const TEAM_NAME_PROMPT: &str = "NOM_EQUIPE";
pub const TURN_START: &str = "DEBUT_TOUR";
pub const GAME_OVER: &str = "FIN";
pub const ACK: &str = "OK";

// Command tokens.
const CMD_DRAW: &str = "PIOCHER";
const CMD_USE: &str = "UTILISER";
const CMD_ATTACK: &str = "ATTAQUER";
const CMD_PLAYERS: &str = "JOUEURS";
const CMD_SELF: &str = "MOI";
const CMD_MONSTERS: &str = "MONSTRES";
const CMD_DRAWABLES: &str = "PIOCHES";
const CMD_DAMAGE: &str = "DAMAGE";

/// `TOKEN|arg|arg`, with absent arguments left out entirely.
fn format_command(token: &str, args: &[Option<String>]) -> String {
    let mut line = String::from(token);
    for arg in args.iter().flatten() {
        line.push('|');
        line.push_str(arg);
    }
    line
}

pub fn split_fields(line: &str) -> Vec<String> {
    line.trim().split('|').map(str::to_owned).collect()
}

/// Typed request/response client for the game protocol.
///
/// Every operation sends one line and waits for exactly one reply line
/// before returning. Replies that do not match the expected shape
/// degrade to defaults; only the transport itself can fail a call.
pub struct ProtoClient<T: LineTransport> {
    transport: T,
}

impl<T: LineTransport> ProtoClient<T> {
    pub fn new(transport: T) -> Self {
        ProtoClient { transport }
    }

    /// Waits for the next server-initiated message.
    pub async fn receive(&mut self) -> Result<Vec<String>, TransportError> {
        let line = self.transport.receive_line().await?;
        Ok(split_fields(&line))
    }

    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    async fn exchange(&mut self, line: &str) -> Result<Vec<String>, TransportError> {
        self.transport.send_line(line).await?;
        let reply = self.transport.receive_line().await?;
        Ok(split_fields(&reply))
    }

    async fn exchange_ack(&mut self, line: &str) -> Result<bool, TransportError> {
        let reply = self.exchange(line).await?;
        Ok(reply.first().map(String::as_str) == Some(ACK))
    }

    /// Sends the raw team name; the reply's second field is the team
    /// index assigned by the server.
    pub async fn announce_team(&mut self, name: &str) -> Result<i32, TransportError> {
        let reply = self.exchange(name).await?;
        match reply.get(1).and_then(|field| field.trim().parse().ok()) {
            Some(index) => Ok(index),
            None => {
                warn!("no team index in reply {:?}, assuming 0", reply);
                Ok(0)
            }
        }
    }

    pub async fn draw(
        &mut self,
        expedition: usize,
        malus_player: Option<usize>,
    ) -> Result<bool, TransportError> {
        let line = format_command(
            CMD_DRAW,
            &[
                Some(expedition.to_string()),
                malus_player.map(|p| p.to_string()),
            ],
        );
        self.exchange_ack(&line).await
    }

    pub async fn use_card(&mut self, kind: CardKind) -> Result<bool, TransportError> {
        let line = format_command(CMD_USE, &[Some(kind.token().to_owned())]);
        self.exchange_ack(&line).await
    }

    pub async fn attack(&mut self, monster: usize) -> Result<bool, TransportError> {
        let line = format_command(CMD_ATTACK, &[Some(monster.to_string())]);
        self.exchange_ack(&line).await
    }

    pub async fn players(&mut self) -> Result<Vec<Player>, TransportError> {
        let reply = self.exchange(CMD_PLAYERS).await?;
        Ok(Player::from_batch(&reply))
    }

    pub async fn myself(&mut self) -> Result<Player, TransportError> {
        let reply = self.exchange(CMD_SELF).await?;
        Ok(Player::from_fields(&reply))
    }

    pub async fn monsters(&mut self) -> Result<Vec<Monster>, TransportError> {
        let reply = self.exchange(CMD_MONSTERS).await?;
        Ok(Monster::from_batch(&reply))
    }

    pub async fn drawables(&mut self) -> Result<Vec<Card>, TransportError> {
        let reply = self.exchange(CMD_DRAWABLES).await?;
        Ok(Card::from_batch(&reply))
    }

    pub async fn damage_threshold(&mut self) -> Result<i32, TransportError> {
        let reply = self.exchange(CMD_DAMAGE).await?;
        match reply.get(1).and_then(|field| field.trim().parse().ok()) {
            Some(threshold) => Ok(threshold),
            None => {
                warn!("no damage threshold in reply {:?}, assuming 0", reply);
                Ok(0)
            }
        }
    }
}
