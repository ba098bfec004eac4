use tracing::warn;

/// A player snapshot, rebuilt from scratch every turn.
///
/// A reply that does not carry exactly four numeric fields decodes to an
/// all-zero player instead of failing the turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Player {
    pub life: i32,
    pub defense_score: i32,
    pub attack_score: i32,
    pub knowledge_score: i32,
}

impl Player {
    const FIELDS: usize = 4;

    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Player {
        if fields.len() != Self::FIELDS {
            warn!(
                "invalid player data, expected {} fields, got {}",
                Self::FIELDS,
                fields.len()
            );
            return Player::default();
        }
        match (
            parse_stat(fields[0].as_ref()),
            parse_stat(fields[1].as_ref()),
            parse_stat(fields[2].as_ref()),
            parse_stat(fields[3].as_ref()),
        ) {
            (Some(life), Some(defense_score), Some(attack_score), Some(knowledge_score)) => {
                Player {
                    life,
                    defense_score,
                    attack_score,
                    knowledge_score,
                }
            }
            _ => {
                warn!("non-numeric player data, using zero-valued player");
                Player::default()
            }
        }
    }

    /// Decodes a flat batch of 4-field groups, one player each.
    pub fn from_batch<S: AsRef<str>>(fields: &[S]) -> Vec<Player> {
        let chunks = fields.chunks_exact(Self::FIELDS);
        if !chunks.remainder().is_empty() {
            warn!(
                "player batch of {} fields is not a multiple of {}, dropping the remainder",
                fields.len(),
                Self::FIELDS
            );
        }
        chunks.map(Player::from_fields).collect()
    }
}

/// A monster snapshot. `index` is the 0-based position in the batch it
/// was decoded from, and is what the attack command refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Monster {
    pub life: i32,
    pub knowledge_reward: i32,
    pub index: usize,
}

impl Monster {
    const FIELDS: usize = 2;

    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Monster {
        if fields.len() != Self::FIELDS {
            warn!(
                "invalid monster data, expected {} fields, got {}",
                Self::FIELDS,
                fields.len()
            );
            return Monster::default();
        }
        match (parse_stat(fields[0].as_ref()), parse_stat(fields[1].as_ref())) {
            (Some(life), Some(knowledge_reward)) => Monster {
                life,
                knowledge_reward,
                index: 0,
            },
            _ => {
                warn!("non-numeric monster data, using zero-valued monster");
                Monster::default()
            }
        }
    }

    pub fn from_batch<S: AsRef<str>>(fields: &[S]) -> Vec<Monster> {
        let chunks = fields.chunks_exact(Self::FIELDS);
        if !chunks.remainder().is_empty() {
            warn!(
                "monster batch of {} fields is not a multiple of {}, dropping the remainder",
                fields.len(),
                Self::FIELDS
            );
        }
        chunks
            .enumerate()
            .map(|(index, group)| Monster {
                index,
                ..Monster::from_fields(group)
            })
            .collect()
    }
}

/// The three card kinds the game knows about, with their wire tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Defense,
    Attack,
    Knowledge,
}

impl CardKind {
    pub const ALL: [CardKind; 3] = [CardKind::Defense, CardKind::Attack, CardKind::Knowledge];

    pub fn token(self) -> &'static str {
        match self {
            CardKind::Defense => "DEFENSE",
            CardKind::Attack => "ATTAQUE",
            CardKind::Knowledge => "SAVOIR",
        }
    }

    pub fn from_token(token: &str) -> Option<CardKind> {
        CardKind::ALL.into_iter().find(|kind| kind.token() == token)
    }
}

/// A drawable card. An unrecognized kind token decodes to `kind: None`
/// rather than failing; such a card can be scored (at zero) but never
/// enters the deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Card {
    pub kind: Option<CardKind>,
    pub value: i32,
    pub index: usize,
}

impl Card {
    const FIELDS: usize = 2;

    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Card {
        if fields.len() != Self::FIELDS {
            warn!(
                "invalid card data, expected {} fields, got {}",
                Self::FIELDS,
                fields.len()
            );
            return Card::default();
        }
        match parse_stat(fields[1].as_ref()) {
            Some(value) => Card {
                kind: CardKind::from_token(fields[0].as_ref().trim()),
                value,
                index: 0,
            },
            None => {
                warn!("non-numeric card value, using zero-valued card");
                Card::default()
            }
        }
    }

    pub fn from_batch<S: AsRef<str>>(fields: &[S]) -> Vec<Card> {
        let chunks = fields.chunks_exact(Self::FIELDS);
        if !chunks.remainder().is_empty() {
            warn!(
                "card batch of {} fields is not a multiple of {}, dropping the remainder",
                fields.len(),
                Self::FIELDS
            );
        }
        chunks
            .enumerate()
            .map(|(index, group)| Card {
                index,
                ..Card::from_fields(group)
            })
            .collect()
    }
}

fn parse_stat(field: &str) -> Option<i32> {
    field.trim().parse().ok()
}
