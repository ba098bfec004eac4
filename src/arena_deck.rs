use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::arena_game::{Card, CardKind};

/// The bot's accumulated cards, bucketed by kind.
///
/// A card's value is scaled once, at insertion, based on how many cards
/// of the same kind the deck already held; stored values are never
/// rescaled afterwards. The deck lives for the whole game session.
#[derive(Debug, Default)]
pub struct Deck {
    defense: Vec<Card>,
    attack: Vec<Card>,
    knowledge: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Deck::default()
    }

    fn bucket(&self, kind: CardKind) -> &Vec<Card> {
        match kind {
            CardKind::Defense => &self.defense,
            CardKind::Attack => &self.attack,
            CardKind::Knowledge => &self.knowledge,
        }
    }

    fn bucket_mut(&mut self, kind: CardKind) -> &mut Vec<Card> {
        match kind {
            CardKind::Defense => &mut self.defense,
            CardKind::Attack => &mut self.attack,
            CardKind::Knowledge => &mut self.knowledge,
        }
    }

    /// Adds a card, scaling its value by the pre-insertion count of its
    /// kind: more than 8 already held doubles it, 5 to 8 multiplies it
    /// by 1.5 (truncated). A card without a decoded kind is dropped.
    pub fn add(&mut self, mut card: Card) {
        let Some(kind) = card.kind else {
            warn!("not adding a card of unknown kind to the deck");
            return;
        };
        let count = self.count_of(kind);
        if count > 8 {
            card.value *= 2;
        } else if count >= 5 {
            card.value = (f64::from(card.value) * 1.5) as i32;
        }
        debug!(
            kind = kind.token(),
            value = card.value,
            held = count,
            "card added to deck"
        );
        self.bucket_mut(kind).push(card);
    }

    /// Clears a whole bucket. Nothing in the turn cycle calls this; it
    /// is the only bulk removal the deck supports.
    pub fn remove_all(&mut self, kind: CardKind) {
        self.bucket_mut(kind).clear();
    }

    pub fn count_of(&self, kind: CardKind) -> usize {
        self.bucket(kind).len()
    }

    pub fn sum_values(&self, kind: CardKind) -> i32 {
        self.bucket(kind).iter().map(|card| card.value).sum()
    }

    /// Per-kind `(count, value sum)` plus a synthetic `TOTAL` row.
    pub fn summary(&self) -> HashMap<&'static str, (usize, i32)> {
        let mut summary = HashMap::new();
        let mut total_count = 0;
        let mut total_value = 0;
        for kind in CardKind::ALL {
            let count = self.count_of(kind);
            let sum = self.sum_values(kind);
            total_count += count;
            total_value += sum;
            summary.insert(kind.token(), (count, sum));
        }
        summary.insert("TOTAL", (total_count, total_value));
        summary
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deck:")?;
        for kind in CardKind::ALL {
            write!(
                f,
                " {}: {} cards worth {},",
                kind.token(),
                self.count_of(kind),
                self.sum_values(kind)
            )?;
        }
        let (count, sum) = self.summary()["TOTAL"];
        write!(f, " TOTAL: {} cards worth {}", count, sum)
    }
}
