//! Heuristic scoring for one turn.
//!
//! The whole module is pure: scores are a function of the frozen turn
//! snapshot and nothing else, so the same inputs always rank the same.

use crate::arena_deck::Deck;
use crate::arena_game::{Card, CardKind, Monster, Player};

/// One ranked entry; `index` refers back to the snapshot batch the
/// monster or card came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEntry {
    pub index: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnScores {
    pub monsters: Vec<ScoreEntry>,
    pub cards: Vec<ScoreEntry>,
}

/// Everything the scorer is allowed to look at for one turn.
pub struct ScoringInput<'a> {
    pub monsters: &'a [Monster],
    pub drawables: &'a [Card],
    pub me: &'a Player,
    pub deck: &'a Deck,
    pub damage_threshold: i32,
    pub turn_index: u32,
}

pub fn evaluate(input: &ScoringInput) -> TurnScores {
    let monsters = score_monsters(input);
    let cards = score_cards(input, &monsters);
    TurnScores { monsters, cards }
}

/// Global worth-it multiplier for attacking at all this turn.
///
/// Deliberately derived from the first monster in the list only; the
/// rest of the list does not influence it. Callers pass the whole list
/// so the contract stays in one place.
pub fn turn_value_multiplier(turn_index: u32, monsters: &[Monster]) -> f64 {
    let Some(first) = monsters.first() else {
        return 0.0;
    };
    let ceiling = f64::from(first.knowledge_reward) / 4.0;
    let reachable_damage = ((16 - i64::from(turn_index)) * 2 * 4) as f64;
    if reachable_damage < ceiling {
        0.0
    } else if ceiling < 40.0 {
        4.0
    } else if ceiling < 110.0 {
        2.0
    } else {
        0.0
    }
}

fn score_monsters(input: &ScoringInput) -> Vec<ScoreEntry> {
    let multiplier = turn_value_multiplier(input.turn_index, input.monsters);
    let attack_power = input.me.attack_score + input.deck.sum_values(CardKind::Attack);
    input
        .monsters
        .iter()
        .map(|monster| {
            let life_ceiling = f64::from(monster.knowledge_reward) / 4.0;
            let life = f64::from(monster.life);
            let remaining_life = -(((life - 1.0) / (life_ceiling - 1.0)) * 0.5 - 1.0);
            let one_shot = if attack_power >= monster.life { 1.5 } else { 1.0 };
            ScoreEntry {
                index: monster.index,
                score: f64::from(monster.knowledge_reward) * multiplier * remaining_life * one_shot,
            }
        })
        .collect()
}

fn score_cards(input: &ScoringInput, scored_monsters: &[ScoreEntry]) -> Vec<ScoreEntry> {
    let defense_total = input.me.defense_score + input.deck.sum_values(CardKind::Defense);
    let attack_total = input.me.attack_score + input.deck.sum_values(CardKind::Attack);
    let best_monster_factor = match scored_monsters
        .iter()
        .map(|entry| entry.score)
        .reduce(f64::max)
    {
        Some(max) if max != 0.0 => max / 10.0,
        _ => 1.0,
    };

    input
        .drawables
        .iter()
        .map(|card| {
            let value = f64::from(card.value);
            let score = match card.kind {
                Some(CardKind::Defense) => {
                    let deficit = input.damage_threshold - defense_total;
                    let fdr_multiplier = if deficit <= 0 {
                        1.0
                    } else {
                        f64::from(1 + deficit) / 10.0
                    };
                    let hard_danger_multiplier =
                        if input.damage_threshold > defense_total + input.me.life {
                            100.0
                        } else {
                            1.0
                        };
                    value * fdr_multiplier * hard_danger_multiplier * 2.0
                }
                Some(CardKind::Attack) => {
                    let no_attack_multiplier = if attack_total == 0 { 5.0 } else { 1.0 };
                    let no_monster_multiplier = if scored_monsters.is_empty() { 0.0 } else { 1.0 };
                    value * no_attack_multiplier * no_monster_multiplier * best_monster_factor
                }
                Some(CardKind::Knowledge) => {
                    let scarcity_multiplier = if scored_monsters.is_empty() {
                        5.0
                    } else {
                        1.0 / scored_monsters.len() as f64
                    };
                    value * scarcity_multiplier
                }
                None => 0.0,
            };
            ScoreEntry {
                index: card.index,
                score,
            }
        })
        .collect()
}

/// First entry strictly better than everything before it wins; ties go
/// to the earliest entry. This is a plain left-to-right scan, not a
/// sort.
pub fn best_entry(entries: &[ScoreEntry]) -> Option<&ScoreEntry> {
    let mut best = entries.first()?;
    for entry in &entries[1..] {
        if entry.score > best.score {
            best = entry;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me(life: i32, defense: i32, attack: i32) -> Player {
        Player {
            life,
            defense_score: defense,
            attack_score: attack,
            knowledge_score: 0,
        }
    }

    fn monster(index: usize, life: i32, knowledge_reward: i32) -> Monster {
        Monster {
            life,
            knowledge_reward,
            index,
        }
    }

    fn card(index: usize, kind: CardKind, value: i32) -> Card {
        Card {
            kind: Some(kind),
            value,
            index,
        }
    }

    #[test]
    fn evaluate_is_pure() {
        let monsters = vec![monster(0, 10, 40), monster(1, 25, 120)];
        let drawables = vec![
            card(0, CardKind::Defense, 2),
            card(1, CardKind::Attack, 3),
            card(2, CardKind::Knowledge, 6),
        ];
        let me = me(20, 5, 3);
        let deck = Deck::new();
        let input = ScoringInput {
            monsters: &monsters,
            drawables: &drawables,
            me: &me,
            deck: &deck,
            damage_threshold: 4,
            turn_index: 2,
        };
        let first = evaluate(&input);
        let second = evaluate(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn turn_value_multiplier_uses_only_the_first_monster() {
        let monsters = vec![monster(0, 10, 40), monster(1, 5, 600), monster(2, 3, 8)];
        let permuted = vec![monster(0, 10, 40), monster(2, 3, 8), monster(1, 5, 600)];
        assert_eq!(
            turn_value_multiplier(3, &monsters),
            turn_value_multiplier(3, &permuted)
        );
    }

    #[test]
    fn turn_value_multiplier_tiers() {
        // ceiling = 10 -> cheap monster tier.
        assert_eq!(turn_value_multiplier(0, &[monster(0, 10, 40)]), 4.0);
        // ceiling = 50 -> midrange tier.
        assert_eq!(turn_value_multiplier(0, &[monster(0, 10, 200)]), 2.0);
        // ceiling = 120 -> too expensive outright.
        assert_eq!(turn_value_multiplier(0, &[monster(0, 10, 480)]), 0.0);
        // ceiling = 50 but only one turn left: (16-15)*8 = 8 < 50.
        assert_eq!(turn_value_multiplier(15, &[monster(0, 10, 200)]), 0.0);
        // No monsters at all.
        assert_eq!(turn_value_multiplier(0, &[]), 0.0);
    }

    #[test]
    fn one_shot_bonus_applies_when_attack_power_covers_monster_life() {
        let monsters = vec![monster(0, 10, 40)];
        let drawables = vec![];
        let weak = me(20, 0, 3);
        let strong = me(20, 0, 10);
        let deck = Deck::new();
        let base = ScoringInput {
            monsters: &monsters,
            drawables: &drawables,
            me: &weak,
            deck: &deck,
            damage_threshold: 0,
            turn_index: 0,
        };
        let weak_score = evaluate(&base).monsters[0].score;
        let strong_score = evaluate(&ScoringInput { me: &strong, ..base }).monsters[0].score;
        assert_eq!(strong_score, weak_score * 1.5);
    }

    #[test]
    fn attack_card_scores_zero_without_monsters() {
        let drawables = vec![card(0, CardKind::Attack, 10)];
        let me = me(20, 0, 0);
        let deck = Deck::new();
        let scores = evaluate(&ScoringInput {
            monsters: &[],
            drawables: &drawables,
            me: &me,
            deck: &deck,
            damage_threshold: 0,
            turn_index: 0,
        });
        // 10 * 5 (no attack power) * 0 (no monster) * 1 = 0.
        assert_eq!(scores.cards[0].score, 0.0);
    }

    #[test]
    fn knowledge_card_scarcity_without_monsters() {
        let drawables = vec![card(0, CardKind::Knowledge, 6)];
        let me = me(20, 0, 0);
        let deck = Deck::new();
        let scores = evaluate(&ScoringInput {
            monsters: &[],
            drawables: &drawables,
            me: &me,
            deck: &deck,
            damage_threshold: 0,
            turn_index: 0,
        });
        assert_eq!(scores.cards[0].score, 30.0);
    }

    #[test]
    fn defense_card_reacts_to_damage_deficit_and_lethal_risk() {
        let drawables = vec![card(0, CardKind::Defense, 4)];
        let covered = me(20, 10, 0);
        let deck = Deck::new();
        let covered_score = evaluate(&ScoringInput {
            monsters: &[],
            drawables: &drawables,
            me: &covered,
            deck: &deck,
            damage_threshold: 8,
            turn_index: 0,
        })
        .cards[0]
            .score;
        // Deficit <= 0: plain value * 2.
        assert_eq!(covered_score, 8.0);

        let exposed = me(2, 1, 0);
        let exposed_score = evaluate(&ScoringInput {
            monsters: &[],
            drawables: &drawables,
            me: &exposed,
            deck: &deck,
            damage_threshold: 9,
            turn_index: 0,
        })
        .cards[0]
            .score;
        // Deficit 8 -> fdr 0.9; 9 > 1 + 2 -> lethal-risk x100.
        assert_eq!(exposed_score, 4.0 * 0.9 * 100.0 * 2.0);
    }

    #[test]
    fn deck_attack_cards_count_towards_one_shot_power() {
        let monsters = vec![monster(0, 10, 40)];
        let me = me(20, 0, 4);
        let mut deck = Deck::new();
        deck.add(card(0, CardKind::Attack, 6));
        let scores = evaluate(&ScoringInput {
            monsters: &monsters,
            drawables: &[],
            me: &me,
            deck: &deck,
            damage_threshold: 0,
            turn_index: 0,
        });
        // 4 + 6 covers the monster's 10 life: one-shot bonus applies.
        // ceiling 10, life 10 -> remaining-life multiplier 0.5.
        assert_eq!(scores.monsters[0].score, 40.0 * 4.0 * 0.5 * 1.5);
    }

    #[test]
    fn best_entry_is_a_stable_left_to_right_scan() {
        let entries = [
            ScoreEntry { index: 4, score: 3.0 },
            ScoreEntry { index: 7, score: 9.0 },
            ScoreEntry { index: 1, score: 9.0 },
            ScoreEntry { index: 2, score: 5.0 },
        ];
        // The later 9.0 does not displace the earlier one.
        assert_eq!(best_entry(&entries).map(|e| e.index), Some(7));
        assert_eq!(best_entry(&[]), None);
    }
}
