//! Escalating mini-boss encounters
//!
//! One encounter at a time, modelled as a tagged union so that illegal
//! combinations (flashing while inactive, defeat during spawn) cannot exist:
//!
//! `Inactive -> Spawning -> Active -> Defeated -> Inactive`
//!
//! The encounter never touches entities. It returns [`BossEvent`]s and the
//! session reacts (fading bricks, spawning the boss sprite, repacking).

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::brick_field::{AspectCatalog, AspectInfo};
use crate::consts::*;

/// Score at which the next boss shows up, given how many have appeared
///
/// `1000 + Σ_{i=1..n}((400 + 100·i) + 1000)`
pub fn next_threshold(bosses_defeated: u32) -> u64 {
    let n = bosses_defeated as u64;
    1000 + (1..=n).map(|i| 400 + 100 * i + 1000).sum::<u64>()
}

/// Hits needed to defeat boss number `n`
pub fn max_hits_for(boss_number: u32) -> u32 {
    4 + boss_number
}

/// Bonus awarded for defeating boss number `n`
pub fn defeat_bonus_for(boss_number: u32) -> u64 {
    400 + 100 * boss_number as u64
}

/// Boss sprite families (source pixel sizes)
pub fn default_boss_catalog() -> AspectCatalog {
    [
        ("saucer", 320.0, 160.0),
        ("skull", 240.0, 240.0),
        ("squid", 200.0, 260.0),
        ("mothership", 400.0, 180.0),
    ]
    .into_iter()
    .map(|(name, w, h)| (name.to_string(), AspectInfo::from_dimensions(w, h)))
    .collect()
}

/// Everything needed to put a boss on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSpawn {
    pub boss_number: u32,
    pub family: String,
    pub width: f32,
    pub height: f32,
    pub max_hits: u32,
}

/// Live boss bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossRecord {
    pub boss_number: u32,
    pub hits: u32,
    pub max_hits: u32,
    /// Remaining hit-flash time, `Some` while flashing
    flash_ms: Option<f64>,
}

impl BossRecord {
    fn new(boss_number: u32) -> Self {
        Self {
            boss_number,
            hits: 0,
            max_hits: max_hits_for(boss_number),
            flash_ms: None,
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_ms.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    Inactive,
    /// Bricks are fading out; the boss appears when the delay runs out
    Spawning { remaining_ms: f64, spawn: BossSpawn },
    Active(BossRecord),
    /// Defeat animation playing; bricks come back when it ends
    Defeated { remaining_ms: f64, boss_number: u32 },
}

/// Lifecycle notifications for the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BossEvent {
    /// Fade the brick field out
    BattleWillStart { boss_number: u32 },
    /// Create the boss entity
    Started(BossSpawn),
    /// Hit flash finished
    FlashEnded { boss_number: u32 },
    /// Regenerate the brick field
    Defeated { boss_number: u32 },
}

/// Result of a registered hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    /// A new flash started (false if one was already running)
    pub flash_started: bool,
    /// Hits reached the boss's maximum
    pub defeated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossEncounter {
    phase: BossPhase,
    /// Incremented when an encounter begins, so it doubles as the boss number
    bosses_defeated: u32,
    families: Vec<(String, AspectInfo)>,
    paused: bool,
}

impl Default for BossEncounter {
    fn default() -> Self {
        Self::new(&default_boss_catalog())
    }
}

impl BossEncounter {
    pub fn new(catalog: &AspectCatalog) -> Self {
        Self {
            phase: BossPhase::Inactive,
            bosses_defeated: 0,
            families: catalog
                .iter()
                .map(|(name, info)| (name.clone(), *info))
                .collect(),
            paused: false,
        }
    }

    pub fn phase(&self) -> &BossPhase {
        &self.phase
    }

    pub fn bosses_defeated(&self) -> u32 {
        self.bosses_defeated
    }

    /// True from `begin` until the post-defeat delay has run out
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, BossPhase::Inactive)
    }

    pub fn record(&self) -> Option<&BossRecord> {
        match &self.phase {
            BossPhase::Active(record) => Some(record),
            _ => None,
        }
    }

    pub fn next_threshold(&self) -> u64 {
        next_threshold(self.bosses_defeated)
    }

    /// Should an encounter begin at this score?
    pub fn check_trigger(&self, current_score: u64) -> bool {
        !self.is_active() && current_score >= self.next_threshold()
    }

    /// Start an encounter; `None` if one is already running
    pub fn begin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<BossEvent> {
        if self.is_active() {
            log::debug!("Boss encounter already active, ignoring begin");
            return None;
        }

        self.bosses_defeated += 1;
        let boss_number = self.bosses_defeated;
        let (family, aspect_ratio) = if self.families.is_empty() {
            ("boss".to_string(), 1.0)
        } else {
            let (name, info) = &self.families[rng.random_range(0..self.families.len())];
            (name.clone(), info.aspect_ratio)
        };

        let spawn = BossSpawn {
            boss_number,
            family,
            width: BOSS_HEIGHT * aspect_ratio,
            height: BOSS_HEIGHT,
            max_hits: max_hits_for(boss_number),
        };
        log::info!(
            "Boss {} incoming ({}, {} hits)",
            boss_number,
            spawn.family,
            spawn.max_hits
        );
        self.phase = BossPhase::Spawning {
            remaining_ms: BOSS_SPAWN_DELAY_MS,
            spawn,
        };
        Some(BossEvent::BattleWillStart { boss_number })
    }

    /// Count a hit on the active boss
    pub fn register_hit(&mut self) -> Option<HitOutcome> {
        let BossPhase::Active(record) = &mut self.phase else {
            return None;
        };

        record.hits += 1;
        let flash_started = if record.is_flashing() {
            false
        } else {
            record.flash_ms = Some(BOSS_FLASH_MS);
            true
        };
        Some(HitOutcome {
            flash_started,
            defeated: record.hits >= record.max_hits,
        })
    }

    /// Finish the active boss, returning the bonus score
    pub fn defeat(&mut self) -> Option<u64> {
        let BossPhase::Active(record) = &self.phase else {
            return None;
        };

        let boss_number = record.boss_number;
        let bonus = defeat_bonus_for(self.bosses_defeated);
        log::info!("Boss {} defeated (+{})", boss_number, bonus);
        self.phase = BossPhase::Defeated {
            remaining_ms: BOSS_DEFEAT_DELAY_MS,
            boss_number,
        };
        Some(bonus)
    }

    /// Drop any encounter and forget progress (restart)
    pub fn reset(&mut self) {
        self.phase = BossPhase::Inactive;
        self.bosses_defeated = 0;
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Run encounter timers; returns the lifecycle events that became due
    pub fn advance(&mut self, delta_ms: f64) -> Vec<BossEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }

        let next = match &mut self.phase {
            BossPhase::Inactive => None,
            BossPhase::Spawning { remaining_ms, spawn } => {
                *remaining_ms -= delta_ms;
                if *remaining_ms <= 0.0 {
                    events.push(BossEvent::Started(spawn.clone()));
                    Some(BossPhase::Active(BossRecord::new(spawn.boss_number)))
                } else {
                    None
                }
            }
            BossPhase::Active(record) => {
                if let Some(flash) = &mut record.flash_ms {
                    *flash -= delta_ms;
                    if *flash <= 0.0 {
                        record.flash_ms = None;
                        events.push(BossEvent::FlashEnded {
                            boss_number: record.boss_number,
                        });
                    }
                }
                None
            }
            BossPhase::Defeated {
                remaining_ms,
                boss_number,
            } => {
                *remaining_ms -= delta_ms;
                if *remaining_ms <= 0.0 {
                    events.push(BossEvent::Defeated {
                        boss_number: *boss_number,
                    });
                    Some(BossPhase::Inactive)
                } else {
                    None
                }
            }
        };

        if let Some(phase) = next {
            self.phase = phase;
        }
        events
    }
}
