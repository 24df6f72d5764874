//! Cache Lifecycle Management
//!
//! Owns every cache of the origin:
//!
//! - one static generation per build, named `{prefix}-{version}`, populated
//!   from the asset manifest at install and immutable afterwards;
//! - the dynamic network-fill cache, which outlives generations.
//!
//! Generation states: `Installing → Populated → Active → Superseded → Deleted`.

mod storage;

pub use storage::*;

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info, warn};
use spin::RwLock;

use crate::config::OfflineConfig;
use crate::fetch::{Network, Request, RequestMethod, Response, ResponseSource};

// ── Types ───────────────────────────────────────────────────

/// Lifecycle state of a cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// Opened; manifest population in progress.
    Installing,
    /// Population finished (possibly partially).
    Populated,
    /// Serving requests.
    Active,
    /// Replaced by a newer generation; about to be deleted.
    Superseded,
    /// Physically removed.
    Deleted,
}

/// Bookkeeping for one static generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheGeneration {
    /// Generation identifier, e.g. `peeble-v3`.
    pub name: String,
    /// Ordered asset paths the generation must contain.
    pub manifest: Vec<String>,
    /// Current lifecycle state.
    pub state: GenerationState,
    /// Paths actually cached.
    pub cached: Vec<String>,
    /// Paths that failed to populate.
    pub missing: Vec<String>,
}

/// How much of the manifest a generation holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestCoverage {
    pub generation: String,
    pub expected: usize,
    pub cached: Vec<String>,
    pub missing: Vec<String>,
}

impl ManifestCoverage {
    /// Whether every manifest path was cached.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.cached.len() == self.expected
    }
}

/// One asset that could not be cached during install. Logged and absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePopulationError {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for CachePopulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to cache {}: {}", self.path, self.reason)
    }
}

impl std::error::Error for CachePopulationError {}

/// Outcome of an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub coverage: ManifestCoverage,
    pub failures: Vec<CachePopulationError>,
}

/// Cache lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No generation with this name.
    NotFound(String),
    /// The generation is not in a state that allows the transition.
    InvalidTransition {
        generation: String,
        from: GenerationState,
        to: GenerationState,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound(name) => write!(f, "cache generation not found: {}", name),
            CacheError::InvalidTransition {
                generation,
                from,
                to,
            } => write!(f, "generation {} cannot go from {:?} to {:?}", generation, from, to),
        }
    }
}

impl std::error::Error for CacheError {}

/// Read-only cache view used by the classifier.
pub trait AssetCache {
    /// Whether a cached response exists for the request.
    fn has(&self, request: &Request) -> bool;
}

// ── Manager ─────────────────────────────────────────────────

struct CacheState {
    storage: CacheStorage,
    generations: BTreeMap<String, CacheGeneration>,
    active: Option<String>,
}

/// Sole owner of cache generations and cache entries.
pub struct CacheLifecycle {
    config: OfflineConfig,
    state: RwLock<CacheState>,
}

impl CacheLifecycle {
    /// Create a manager over empty storage.
    pub fn new(config: OfflineConfig) -> Self {
        Self::with_storage(config, CacheStorage::new())
    }

    /// Create a manager over storage persisted by earlier builds.
    ///
    /// Generations already in storage are resumed. The newest non-empty one
    /// keeps serving: this build's own generation when it is the only one
    /// left (a restart), otherwise the previous build's until this one
    /// activates. This build's generation next to older ones was installed
    /// but never activated and comes back `Populated`.
    pub fn with_storage(config: OfflineConfig, storage: CacheStorage) -> Self {
        let current = config.generation_name();
        let names: Vec<String> = storage
            .keys()
            .into_iter()
            .filter(|name| is_generation_name(&config, name))
            .collect();

        let serving = if names == [current.clone()] {
            Some(current.clone())
        } else {
            names
                .iter()
                .filter(|name| **name != current)
                .filter_map(|name| {
                    let cache = storage.get(name).filter(|c| !c.is_empty())?;
                    Some((cache.last_cached_at(), name))
                })
                .max()
                .map(|(_, name)| name.clone())
        };

        let mut generations = BTreeMap::new();
        for name in &names {
            let state = if serving.as_deref() == Some(name.as_str()) {
                GenerationState::Active
            } else if *name == current {
                GenerationState::Populated
            } else {
                GenerationState::Superseded
            };
            let generation = if *name == current {
                resumed_generation(&config, &storage, name, state)
            } else {
                CacheGeneration {
                    name: name.clone(),
                    manifest: Vec::new(),
                    state,
                    cached: Vec::new(),
                    missing: Vec::new(),
                }
            };
            debug!("[Peeble Cache] resumed {} as {:?}", name, state);
            generations.insert(name.clone(), generation);
        }
        if let Some(name) = &serving {
            info!("[Peeble Cache] {} serving from persisted storage", name);
        }

        Self {
            config,
            state: RwLock::new(CacheState {
                storage,
                generations,
                active: serving,
            }),
        }
    }

    /// Configuration this manager was built with.
    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Version string of this build.
    pub fn current_version(&self) -> &str {
        &self.config.cache_version
    }

    /// Generation name of this build.
    pub fn current_generation(&self) -> String {
        self.config.generation_name()
    }

    /// Open this build's generation and populate it from the manifest.
    ///
    /// Individual asset failures never abort the install; they are logged
    /// and reported, and the generation ends up `Populated` regardless.
    /// Entries already in the generation are only replaced by a successful
    /// fetch. Every other generation in storage becomes `Superseded`.
    pub fn install(&self, network: &dyn Network, now: u64) -> InstallReport {
        let name = self.current_generation();

        {
            let mut state = self.state.write();
            if let Some(existing) = state.generations.get(&name) {
                if existing.state == GenerationState::Active {
                    debug!("[Peeble Cache] {} already active, install is a no-op", name);
                    return InstallReport {
                        coverage: coverage_of(existing),
                        failures: Vec::new(),
                    };
                }
            }

            for other in state.storage.keys() {
                if other == name || !is_generation_name(&self.config, &other) {
                    continue;
                }
                let generation = state
                    .generations
                    .entry(other.clone())
                    .or_insert_with(|| CacheGeneration {
                        name: other.clone(),
                        manifest: Vec::new(),
                        state: GenerationState::Superseded,
                        cached: Vec::new(),
                        missing: Vec::new(),
                    });
                supersede(generation);
            }

            state.storage.open(&name);
            state.generations.insert(
                name.clone(),
                CacheGeneration {
                    name: name.clone(),
                    manifest: self.config.static_assets.clone(),
                    state: GenerationState::Installing,
                    cached: Vec::new(),
                    missing: Vec::new(),
                },
            );
        }
        info!(
            "[Peeble Cache] installing {} ({} assets)",
            name,
            self.config.static_assets.len()
        );

        let mut failures = Vec::new();
        for path in &self.config.static_assets {
            // No lock is held across the fetch.
            let fetched = self.fetch_asset(network, path);
            let mut state = self.state.write();
            let cached = match fetched {
                Ok((url, response)) => {
                    state
                        .storage
                        .open(&name)
                        .put(CachedResponse::from_response(&url, &response, now));
                    true
                }
                Err(reason) => {
                    let kept = self
                        .config
                        .resolve(path)
                        .is_ok_and(|url| state.storage.match_in(&name, url.as_str()).is_some());
                    if kept {
                        warn!(
                            "[Peeble Cache] failed to refresh {}: {}; keeping cached copy",
                            path, reason
                        );
                    } else {
                        warn!("[Peeble Cache] failed to cache {}: {}", path, reason);
                    }
                    failures.push(CachePopulationError {
                        path: path.clone(),
                        reason,
                    });
                    kept
                }
            };
            if let Some(generation) = state.generations.get_mut(&name) {
                if cached {
                    generation.cached.push(path.clone());
                } else {
                    generation.missing.push(path.clone());
                }
            }
        }

        let mut state = self.state.write();
        let coverage = match state.generations.get_mut(&name) {
            Some(generation) => {
                generation.state = GenerationState::Populated;
                coverage_of(generation)
            }
            None => ManifestCoverage {
                generation: name.clone(),
                expected: self.config.static_assets.len(),
                cached: Vec::new(),
                missing: self.config.static_assets.clone(),
            },
        };
        if coverage.is_complete() {
            info!("[Peeble Cache] {} populated", name);
        } else {
            warn!(
                "[Peeble Cache] {} populated partially: {}/{} assets",
                name,
                coverage.cached.len(),
                coverage.expected
            );
        }

        InstallReport { coverage, failures }
    }

    /// Make this build's generation active and delete every stale cache.
    ///
    /// Older generations pass through `Superseded` to `Deleted`; caches
    /// that are not generations are deleted without a state. Returns the
    /// names of the caches deleted.
    pub fn activate(&self) -> Result<Vec<String>, CacheError> {
        let current = self.current_generation();
        let mut state = self.state.write();

        let current_state = state
            .generations
            .get(&current)
            .map(|g| g.state)
            .ok_or_else(|| CacheError::NotFound(current.clone()))?;
        if current_state != GenerationState::Active {
            check_transition(&current, current_state, GenerationState::Active)?;
        }

        let stale: Vec<String> = state
            .storage
            .keys()
            .into_iter()
            .filter(|name| *name != current && *name != self.config.dynamic_cache_name)
            .collect();
        for name in &stale {
            if let Some(generation) = state.generations.get_mut(name) {
                supersede(generation);
                check_transition(name, generation.state, GenerationState::Deleted)?;
            }
        }

        for name in &stale {
            state.storage.delete(name);
            if let Some(generation) = state.generations.get_mut(name) {
                generation.state = GenerationState::Deleted;
            } else if is_generation_name(&self.config, name) {
                state.generations.insert(
                    name.clone(),
                    CacheGeneration {
                        name: name.clone(),
                        manifest: Vec::new(),
                        state: GenerationState::Deleted,
                        cached: Vec::new(),
                        missing: Vec::new(),
                    },
                );
            }
            info!("[Peeble Cache] deleted stale cache {}", name);
        }

        if let Some(generation) = state.generations.get_mut(&current) {
            generation.state = GenerationState::Active;
        }
        state.active = Some(current.clone());
        info!(
            "[Peeble Cache] {} active, {} bytes cached",
            current,
            state.storage.total_size()
        );

        Ok(stale)
    }

    /// Look a request up: active generation first, then the dynamic cache.
    pub fn lookup(&self, request: &Request) -> Option<Response> {
        if request.method != RequestMethod::Get {
            return None;
        }
        let state = self.state.read();
        if let Some(active) = &state.active {
            if let Some(hit) = state.storage.match_in(active, &request.url) {
                return Some(hit.to_response(ResponseSource::StaticCache));
            }
        }
        state
            .storage
            .match_in(&self.config.dynamic_cache_name, &request.url)
            .map(|hit| hit.to_response(ResponseSource::DynamicCache))
    }

    /// Store a network response in the dynamic cache.
    ///
    /// Only status-200 answers to GET requests are kept; concurrent fills of
    /// one URL resolve last-write-wins. Returns whether anything was written.
    pub fn fill(&self, request: &Request, response: &Response, now: u64) -> bool {
        if request.method != RequestMethod::Get || response.status != 200 {
            return false;
        }
        let entry = CachedResponse::from_response(&request.url, response, now);
        let mut state = self.state.write();
        state.storage.open(&self.config.dynamic_cache_name).put(entry);
        true
    }

    /// Seed the dynamic cache with a response the application already holds.
    pub fn prewarm(&self, url: &str, response: &Response, now: u64) -> bool {
        self.fill(&Request::new(url), response, now)
    }

    /// The cached app-shell document, if any. Falls back to the cached
    /// app root when the shell document itself is missing.
    pub fn app_shell(&self) -> Option<Response> {
        let shell = self.config.app_shell_url().ok()?;
        self.lookup(&Request::new(shell.as_str())).or_else(|| {
            let root = self.config.base_url().ok()?;
            self.lookup(&Request::new(root.as_str()))
        })
    }

    /// Names of all static generations in storage.
    pub fn list_generations(&self) -> Vec<String> {
        self.state
            .read()
            .storage
            .keys()
            .into_iter()
            .filter(|name| *name != self.config.dynamic_cache_name)
            .collect()
    }

    /// Lifecycle state of a generation this manager knows about.
    pub fn generation_state(&self, name: &str) -> Option<GenerationState> {
        self.state.read().generations.get(name).map(|g| g.state)
    }

    /// Manifest coverage of this build's generation.
    pub fn coverage(&self) -> Option<ManifestCoverage> {
        self.state
            .read()
            .generations
            .get(&self.current_generation())
            .map(coverage_of)
    }

    /// Name of the active generation, if activation has happened.
    pub fn active_generation(&self) -> Option<String> {
        self.state.read().active.clone()
    }

    /// Copy of the underlying storage, as a later build would find it.
    pub fn storage_snapshot(&self) -> CacheStorage {
        self.state.read().storage.clone()
    }

    /// Bytes held across every cache of the origin.
    pub fn usage(&self) -> usize {
        self.state.read().storage.total_size()
    }

    /// Number of entries in the dynamic cache.
    pub fn dynamic_len(&self) -> usize {
        self.state
            .read()
            .storage
            .get(&self.config.dynamic_cache_name)
            .map_or(0, |c| c.len())
    }

    fn fetch_asset(&self, network: &dyn Network, path: &str) -> Result<(String, Response), String> {
        let url = self.config.resolve(path).map_err(|e| e.to_string())?;
        let response = network
            .fetch(&Request::new(url.as_str()))
            .map_err(|e| e.to_string())?;
        if response.status != 200 {
            return Err(format!("HTTP {}", response.status));
        }
        Ok((url.into(), response))
    }
}

impl AssetCache for CacheLifecycle {
    fn has(&self, request: &Request) -> bool {
        if request.method != RequestMethod::Get {
            return false;
        }
        let state = self.state.read();
        state
            .active
            .as_deref()
            .is_some_and(|active| state.storage.match_in(active, &request.url).is_some())
            || state
                .storage
                .match_in(&self.config.dynamic_cache_name, &request.url)
                .is_some()
    }
}

impl fmt::Debug for CacheLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheLifecycle")
            .field("generation", &self.current_generation())
            .field("active", &self.active_generation())
            .finish()
    }
}

/// `{prefix}-*` caches other than the dynamic one.
fn is_generation_name(config: &OfflineConfig, name: &str) -> bool {
    name != config.dynamic_cache_name
        && name
            .strip_prefix(config.cache_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
}

/// Rebuild bookkeeping for this build's generation from what storage holds.
fn resumed_generation(
    config: &OfflineConfig,
    storage: &CacheStorage,
    name: &str,
    state: GenerationState,
) -> CacheGeneration {
    let (cached, missing): (Vec<String>, Vec<String>) =
        config.static_assets.iter().cloned().partition(|path| {
            config
                .resolve(path)
                .is_ok_and(|url| storage.match_in(name, url.as_str()).is_some())
        });
    CacheGeneration {
        name: name.to_string(),
        manifest: config.static_assets.clone(),
        state,
        cached,
        missing,
    }
}

/// Mark a generation as replaced. It keeps serving until deleted.
fn supersede(generation: &mut CacheGeneration) {
    if generation.state == GenerationState::Superseded {
        return;
    }
    match check_transition(&generation.name, generation.state, GenerationState::Superseded) {
        Ok(()) => {
            debug!("[Peeble Cache] {} superseded", generation.name);
            generation.state = GenerationState::Superseded;
        }
        Err(e) => warn!("[Peeble Cache] {}", e),
    }
}

fn coverage_of(generation: &CacheGeneration) -> ManifestCoverage {
    ManifestCoverage {
        generation: generation.name.clone(),
        expected: generation.manifest.len(),
        cached: generation.cached.clone(),
        missing: generation.missing.clone(),
    }
}

/// Check if a generation state transition is valid
fn is_valid_transition(from: GenerationState, to: GenerationState) -> bool {
    use GenerationState::*;

    matches!(
        (from, to),
        (Installing, Populated)
            | (Populated, Active)
            | (Populated, Superseded)
            | (Active, Superseded)
            | (Superseded, Deleted)
    )
}

fn check_transition(
    name: &str,
    from: GenerationState,
    to: GenerationState,
) -> Result<(), CacheError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(CacheError::InvalidTransition {
            generation: name.to_string(),
            from,
            to,
        })
    }
}
