// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pokedex_app::{
    BaseStat, CatalogEntryDetail, CatalogEntrySummary, CatalogId, CatalogSource,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/pokemon";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One page of the catalog index: names only, plus the catalog size the
/// server reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIndex {
    pub count: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("catalog.base_url must not be empty");
        }
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("catalog.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "catalog.base_url {trimmed:?} must use http or https, got {}",
                parsed.scheme()
            );
        }
        if parsed.cannot_be_a_base() {
            bail!("catalog.base_url {trimmed:?} cannot carry path segments");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url: parsed,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_index(&self, offset: usize, limit: usize) -> Result<CatalogIndex> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());
        tracing::debug!(%url, "list catalog page");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), offset, limit, "list catalog page failed");
            return Err(clean_error_response(status, &body));
        }

        let parsed: ListResponse = response.json().context("decode catalog page")?;
        Ok(CatalogIndex {
            count: parsed.count,
            names: parsed
                .results
                .into_iter()
                .map(|resource| resource.name)
                .collect(),
        })
    }

    pub fn get_detail(&self, name: &str) -> Result<Option<CatalogEntryDetail>> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return Ok(None);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("catalog.base_url cannot carry path segments"))?
            .pop_if_empty()
            .push(&key);
        tracing::debug!(%url, "get catalog detail");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(name = %key, "catalog entry not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), name = %key, "get catalog detail failed");
            return Err(clean_error_response(status, &body));
        }

        let parsed: DetailResponse = response
            .json()
            .with_context(|| format!("decode catalog detail for {key}"))?;
        Ok(Some(parsed.into_detail()))
    }

    /// Lists one page and fetches every entry's detail in parallel to learn
    /// its id and types. Output is in ascending id order.
    pub fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntrySummary>> {
        let index = self.list_index(offset, limit)?;

        let fetched = thread::scope(|scope| {
            let workers = index
                .names
                .iter()
                .map(|name| (name, scope.spawn(move || self.get_detail(name))))
                .collect::<Vec<_>>();
            workers
                .into_iter()
                .map(|(name, worker)| {
                    let result = worker
                        .join()
                        .unwrap_or_else(|_| Err(anyhow!("detail worker panicked")));
                    (name, result)
                })
                .collect::<Vec<_>>()
        });

        let mut summaries = Vec::with_capacity(fetched.len());
        for (name, result) in fetched {
            match result.with_context(|| format!("load catalog entry {name}"))? {
                Some(detail) => summaries.push(detail.summary()),
                None => tracing::warn!(name = %name, "listed entry has no detail"),
            }
        }
        summaries.sort_by_key(|summary| summary.id);
        Ok(summaries)
    }

    pub fn ping(&self) -> Result<usize> {
        Ok(self.list_index(0, 1)?.count)
    }
}

impl CatalogSource for Client {
    fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntrySummary>> {
        Client::list_page(self, offset, limit)
    }

    fn get_detail(&self, name: &str) -> Result<Option<CatalogEntryDetail>> {
        Client::get_detail(self, name)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check your network or set catalog.base_url ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<DetailErrorEnvelope>(body)
        && let Some(detail) = parsed.detail
        && !detail.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), detail);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct DetailErrorEnvelope {
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    count: usize,
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: i64,
    name: String,
    #[serde(default)]
    height: i64,
    #[serde(default)]
    weight: i64,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
    #[serde(default)]
    moves: Vec<MoveSlot>,
    #[serde(default)]
    stats: Vec<StatSlot>,
    #[serde(default)]
    types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
struct AbilitySlot {
    ability: NamedResource,
}

#[derive(Debug, Deserialize)]
struct MoveSlot {
    #[serde(rename = "move")]
    move_ref: NamedResource,
}

#[derive(Debug, Deserialize)]
struct StatSlot {
    base_stat: i64,
    stat: NamedResource,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(default)]
    slot: i64,
    #[serde(rename = "type")]
    type_ref: NamedResource,
}

impl DetailResponse {
    fn into_detail(mut self) -> CatalogEntryDetail {
        self.types.sort_by_key(|slot| slot.slot);
        CatalogEntryDetail {
            id: CatalogId::new(self.id),
            name: self.name,
            height: self.height,
            weight: self.weight,
            abilities: self
                .abilities
                .into_iter()
                .map(|slot| slot.ability.name)
                .collect(),
            moves: self
                .moves
                .into_iter()
                .map(|slot| slot.move_ref.name)
                .collect(),
            stats: self
                .stats
                .into_iter()
                .map(|slot| BaseStat {
                    name: slot.stat.name,
                    value: slot.base_stat,
                })
                .collect(),
            types: self
                .types
                .into_iter()
                .map(|slot| slot.type_ref.name)
                .collect(),
        }
    }
}
