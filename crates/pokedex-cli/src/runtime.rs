// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pokedex_app::{
    BattleTiming, CaptureChance, CatalogEntryDetail, CatalogEntrySummary, CatalogSource,
    CollectionRow, CollectionStore, hydrate,
};
use pokedex_db::Store;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleSettings {
    pub capture_chance: f64,
    pub timing: BattleTiming,
    pub seed: Option<u64>,
}

/// Wires the terminal UI to the local store and a catalog source.
pub struct StoreRuntime<C> {
    store: Store,
    catalog: C,
    battle: BattleSettings,
    battles_started: u64,
}

impl<C: CatalogSource> StoreRuntime<C> {
    pub fn new(store: Store, catalog: C, battle: BattleSettings) -> Self {
        Self {
            store,
            catalog,
            battle,
            battles_started: 0,
        }
    }
}

impl<C: CatalogSource> pokedex_tui::AppRuntime for StoreRuntime<C> {
    fn load_catalog_page(
        &mut self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CatalogEntrySummary>> {
        self.catalog.list_page(offset, limit)
    }

    fn load_detail(&mut self, name: &str) -> Result<Option<CatalogEntryDetail>> {
        self.catalog.get_detail(name)
    }

    fn load_collection(&mut self) -> Result<Vec<CollectionRow>> {
        Ok(hydrate(self.store.list_all()?, &self.catalog))
    }

    fn remove_captured(&mut self, nickname: &str) -> Result<()> {
        self.store.remove(nickname)
    }

    fn collection_store(&mut self) -> &mut dyn CollectionStore {
        &mut self.store
    }

    fn capture_chance(&mut self) -> Result<CaptureChance> {
        let battle = self.battles_started;
        self.battles_started += 1;
        match self.battle.seed {
            // one stream per battle, derived from the configured seed
            Some(seed) => CaptureChance::seeded(self.battle.capture_chance, seed.wrapping_add(battle)),
            None => CaptureChance::from_thread_rng(self.battle.capture_chance),
        }
    }

    fn battle_timing(&self) -> BattleTiming {
        self.battle.timing
    }
}

#[cfg(test)]
mod tests {
    use super::{BattleSettings, StoreRuntime};
    use anyhow::Result;
    use pokedex_app::{BattleTiming, CatalogId, CollectionStore, NewCapture};
    use pokedex_db::Store;
    use pokedex_testkit::FixtureCatalog;
    use pokedex_tui::AppRuntime;

    fn settings(seed: Option<u64>) -> BattleSettings {
        BattleSettings {
            capture_chance: 0.5,
            timing: BattleTiming::default(),
            seed,
        }
    }

    fn runtime(seed: Option<u64>) -> Result<StoreRuntime<FixtureCatalog>> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        Ok(StoreRuntime::new(store, FixtureCatalog::new(), settings(seed)))
    }

    #[test]
    fn collection_rows_are_hydrated_from_the_catalog() -> Result<()> {
        let mut runtime = runtime(None)?;
        runtime.collection_store().add(&NewCapture {
            id: CatalogId::new(54),
            name: "psyduck".to_owned(),
            nickname: "Duck".to_owned(),
        })?;

        let rows = runtime.load_collection()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.nickname, "Duck");
        assert_eq!(rows[0].types, vec!["water"]);
        assert!(runtime.owned_names()?.contains("psyduck"));
        Ok(())
    }

    #[test]
    fn remove_captured_deletes_from_the_store() -> Result<()> {
        let mut runtime = runtime(None)?;
        runtime.collection_store().add(&NewCapture {
            id: CatalogId::new(25),
            name: "pikachu".to_owned(),
            nickname: "Sparky".to_owned(),
        })?;

        runtime.remove_captured("Sparky")?;
        assert!(runtime.load_collection()?.is_empty());
        Ok(())
    }

    #[test]
    fn seeded_runtime_replays_the_same_battle_sequence() -> Result<()> {
        let rolls = |runtime: &mut StoreRuntime<FixtureCatalog>| -> Result<Vec<bool>> {
            let mut out = Vec::new();
            for _ in 0..8 {
                out.push(runtime.capture_chance()?.roll());
            }
            Ok(out)
        };

        let first = rolls(&mut runtime(Some(11))?)?;
        let second = rolls(&mut runtime(Some(11))?)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn catalog_pages_pass_through() -> Result<()> {
        let mut runtime = runtime(None)?;
        let page = runtime.load_catalog_page(0, 3)?;
        let names = page.iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["bulbasaur", "charmander", "squirtle"]);
        assert_eq!(runtime.load_detail("EEVEE")?.map(|detail| detail.id), Some(CatalogId::new(133)));
        Ok(())
    }
}
