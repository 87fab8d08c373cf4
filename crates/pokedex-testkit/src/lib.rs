// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use pokedex_app::{
    BaseStat, CapturedEntry, CaptureChance, CatalogEntryDetail, CatalogEntrySummary, CatalogId,
    CatalogSource, CollectionStore, Navigator, NewCapture,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::path::PathBuf;

struct Species {
    id: i64,
    name: &'static str,
    types: &'static [&'static str],
    height: i64,
    weight: i64,
    abilities: &'static [&'static str],
    // hp, attack, defense, special-attack, special-defense, speed
    stats: [i64; 6],
    moves: &'static [&'static str],
}

const STAT_NAMES: [&str; 6] = [
    "hp",
    "attack",
    "defense",
    "special-attack",
    "special-defense",
    "speed",
];

const SPECIES: [Species; 12] = [
    Species {
        id: 1,
        name: "bulbasaur",
        types: &["grass", "poison"],
        height: 7,
        weight: 69,
        abilities: &["overgrow", "chlorophyll"],
        stats: [45, 49, 49, 65, 65, 45],
        moves: &["razor-wind", "swords-dance", "cut", "bind", "vine-whip"],
    },
    Species {
        id: 4,
        name: "charmander",
        types: &["fire"],
        height: 6,
        weight: 85,
        abilities: &["blaze", "solar-power"],
        stats: [39, 52, 43, 60, 50, 65],
        moves: &["mega-punch", "fire-punch", "thunder-punch", "scratch", "ember"],
    },
    Species {
        id: 7,
        name: "squirtle",
        types: &["water"],
        height: 5,
        weight: 90,
        abilities: &["torrent", "rain-dish"],
        stats: [44, 48, 65, 50, 64, 43],
        moves: &["mega-punch", "ice-punch", "mega-kick", "headbutt", "bubble"],
    },
    Species {
        id: 10,
        name: "caterpie",
        types: &["bug"],
        height: 3,
        weight: 29,
        abilities: &["shield-dust", "run-away"],
        stats: [45, 30, 35, 20, 20, 45],
        moves: &["tackle", "string-shot", "snore", "bug-bite"],
    },
    Species {
        id: 16,
        name: "pidgey",
        types: &["normal", "flying"],
        height: 3,
        weight: 18,
        abilities: &["keen-eye", "tangled-feet", "big-pecks"],
        stats: [40, 45, 40, 35, 35, 56],
        moves: &["razor-wind", "gust", "wing-attack", "whirlwind", "fly"],
    },
    Species {
        id: 25,
        name: "pikachu",
        types: &["electric"],
        height: 4,
        weight: 60,
        abilities: &["static", "lightning-rod"],
        stats: [35, 55, 40, 50, 50, 90],
        moves: &["mega-punch", "pay-day", "thunder-punch", "slam", "thunderbolt"],
    },
    Species {
        id: 39,
        name: "jigglypuff",
        types: &["normal", "fairy"],
        height: 5,
        weight: 55,
        abilities: &["cute-charm", "competitive", "friend-guard"],
        stats: [115, 45, 20, 45, 25, 20],
        moves: &["pound", "double-slap", "sing", "body-slam"],
    },
    Species {
        id: 52,
        name: "meowth",
        types: &["normal"],
        height: 4,
        weight: 42,
        abilities: &["pickup", "technician", "unnerve"],
        stats: [40, 45, 35, 40, 40, 90],
        moves: &["pay-day", "scratch", "bite", "fury-swipes"],
    },
    Species {
        id: 54,
        name: "psyduck",
        types: &["water"],
        height: 8,
        weight: 196,
        abilities: &["damp", "cloud-nine", "swift-swim"],
        stats: [50, 52, 48, 65, 50, 55],
        moves: &["scratch", "water-gun", "confusion", "disable"],
    },
    Species {
        id: 94,
        name: "gengar",
        types: &["ghost", "poison"],
        height: 15,
        weight: 405,
        abilities: &["cursed-body"],
        stats: [60, 65, 60, 130, 75, 110],
        moves: &["lick", "hypnosis", "shadow-ball", "dream-eater"],
    },
    Species {
        id: 133,
        name: "eevee",
        types: &["normal"],
        height: 3,
        weight: 65,
        abilities: &["run-away", "adaptability", "anticipation"],
        stats: [55, 55, 50, 45, 65, 55],
        moves: &["tackle", "tail-whip", "quick-attack", "bite"],
    },
    Species {
        id: 143,
        name: "snorlax",
        types: &["normal"],
        height: 21,
        weight: 4600,
        abilities: &["immunity", "thick-fat", "gluttony"],
        stats: [160, 110, 65, 65, 110, 30],
        moves: &["headbutt", "rest", "snore", "body-slam"],
    },
];

const NICKNAME_SYLLABLES: [&str; 16] = [
    "spa", "rky", "blu", "bel", "fi", "zz", "mo", "chi", "pip", "sy", "lo", "ka", "dot", "ru",
    "nix", "bo",
];

fn to_detail(species: &Species) -> CatalogEntryDetail {
    CatalogEntryDetail {
        id: CatalogId::new(species.id),
        name: species.name.to_owned(),
        height: species.height,
        weight: species.weight,
        abilities: species.abilities.iter().map(|a| (*a).to_owned()).collect(),
        moves: species.moves.iter().map(|m| (*m).to_owned()).collect(),
        stats: STAT_NAMES
            .iter()
            .zip(species.stats)
            .map(|(name, value)| BaseStat {
                name: (*name).to_owned(),
                value,
            })
            .collect(),
        types: species.types.iter().map(|t| (*t).to_owned()).collect(),
    }
}

pub fn fixture_details() -> Vec<CatalogEntryDetail> {
    SPECIES.iter().map(to_detail).collect()
}

/// Fixture detail by name. Panics for names outside the fixture set.
pub fn detail(name: &str) -> CatalogEntryDetail {
    SPECIES
        .iter()
        .find(|species| species.name == name)
        .map(to_detail)
        .unwrap_or_else(|| panic!("no fixture species named {name}"))
}

/// In-memory catalog. Records every detail lookup so tests can assert on
/// hydration traffic.
#[derive(Debug)]
pub struct FixtureCatalog {
    entries: Vec<CatalogEntryDetail>,
    offline: bool,
    lookups: RefCell<Vec<String>>,
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::with_entries(fixture_details())
    }
}

impl FixtureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(mut entries: Vec<CatalogEntryDetail>) -> Self {
        entries.sort_by_key(|entry| entry.id);
        Self {
            entries,
            offline: false,
            lookups: RefCell::new(Vec::new()),
        }
    }

    /// A catalog whose every call fails, as an unreachable server would.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl CatalogSource for FixtureCatalog {
    fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntrySummary>> {
        if self.offline {
            bail!("fixture catalog is offline");
        }
        Ok(self
            .entries
            .iter()
            .skip(offset)
            .take(limit)
            .map(CatalogEntryDetail::summary)
            .collect())
    }

    fn get_detail(&self, name: &str) -> Result<Option<CatalogEntryDetail>> {
        let key = name.trim().to_lowercase();
        self.lookups.borrow_mut().push(key.clone());
        if self.offline {
            bail!("fixture catalog is offline");
        }
        Ok(self.entries.iter().find(|entry| entry.name == key).cloned())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    completions: usize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completions(&self) -> usize {
        self.completions
    }
}

impl Navigator for RecordingNavigator {
    fn complete(&mut self) {
        self.completions += 1;
    }
}

/// Collection store whose writes always fail, for exercising the save-failed
/// path. Reads report the entries it was built with.
#[derive(Debug, Default)]
pub struct BrokenCollection {
    entries: Vec<CapturedEntry>,
    attempted: Vec<NewCapture>,
}

impl BrokenCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempted(&self) -> &[NewCapture] {
        &self.attempted
    }
}

impl CollectionStore for BrokenCollection {
    fn list_all(&self) -> Result<Vec<CapturedEntry>> {
        Ok(self.entries.clone())
    }

    fn add(&mut self, capture: &NewCapture) -> Result<bool> {
        self.attempted.push(capture.clone());
        bail!("disk is read-only")
    }

    fn remove(&mut self, _nickname: &str) -> Result<()> {
        bail!("disk is read-only")
    }
}

pub fn always_capture() -> CaptureChance {
    CaptureChance::seeded(1.0, 0).expect("probability 1.0 is valid")
}

pub fn never_capture() -> CaptureChance {
    CaptureChance::seeded(0.0, 0).expect("probability 0.0 is valid")
}

pub fn seeded_chance(seed: u64) -> CaptureChance {
    CaptureChance::seeded(0.5, seed).expect("probability 0.5 is valid")
}

/// Seeded generator of plausible captures.
#[derive(Debug, Clone)]
pub struct CaptureFaker {
    rng: StdRng,
}

impl CaptureFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A nickname of 2 to 12 characters.
    pub fn nickname(&mut self) -> String {
        let parts = self.rng.random_range(1..=3);
        let mut nickname = String::new();
        for _ in 0..parts {
            if let Some(syllable) = NICKNAME_SYLLABLES.choose(&mut self.rng) {
                nickname.push_str(syllable);
            }
        }
        while nickname.chars().count() < 2 {
            nickname.push('o');
        }
        nickname.truncate(12);
        let mut chars = nickname.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => nickname,
        }
    }

    pub fn capture(&mut self) -> NewCapture {
        let index = self.rng.random_range(0..SPECIES.len());
        let species = &SPECIES[index];
        NewCapture {
            id: CatalogId::new(species.id),
            name: species.name.to_owned(),
            nickname: self.nickname(),
        }
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("pokedex.db");
    Ok((dir, db_path))
}
