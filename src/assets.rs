//! Asset loading
//!
//! Dataset, catalog and molecule files are fetched asynchronously. Every
//! failure degrades to a fallback: no dataset means random rounds, no
//! molecule file means the built-in structure.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::poll_fn;
use std::rc::Rc;
use std::task::{Poll, Waker};

use thiserror::Error;

use crate::catalog::{Catalog, LevelSet};
use crate::molecule::FALLBACK_MOL2;
use crate::settings::Settings;

#[cfg(target_arch = "wasm32")]
pub use http::HttpSource;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("'{path}' returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("request for '{path}' failed: {details}")]
    Network { path: String, details: String },
    #[error("'{0}' did not contain text")]
    Decode(String),
}

/// Where asset text comes from
#[allow(async_fn_in_trait)]
pub trait AssetSource {
    async fn fetch_text(&self, path: &str) -> Result<String, AssetError>;
}

/// In-memory files for native runs and tests. Records every request.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: &str, text: &str) {
        self.files.insert(path.to_string(), text.to_string());
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl AssetSource for MemorySource {
    async fn fetch_text(&self, path: &str) -> Result<String, AssetError> {
        self.requests.borrow_mut().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Molecule file contents by path, shared for the session.
/// Only successful fetches are cached so a transient failure can recover.
/// Loads of a path already being fetched wait for that fetch instead of
/// issuing their own.
#[derive(Debug, Default)]
pub struct MoleculeCache {
    files: RefCell<HashMap<String, Entry>>,
}

#[derive(Debug)]
enum Entry {
    /// Fetch in progress; wakers of the loads waiting on it
    Loading(Vec<Waker>),
    Ready(Rc<str>),
}

/// Settles an in-flight entry if its loader goes away before the fetch ends
struct InFlight<'a> {
    cache: &'a MoleculeCache,
    path: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let loading = matches!(
            self.cache.files.borrow().get(self.path),
            Some(Entry::Loading(_))
        );
        if loading {
            self.cache.settle(self.path, None);
        }
    }
}

impl MoleculeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Molecule text for `path`, or the built-in structure when it cannot be fetched
    pub async fn load<S: AssetSource + ?Sized>(&self, source: &S, path: &str) -> Rc<str> {
        let in_flight = match self.files.borrow().get(path) {
            Some(Entry::Ready(text)) => return Rc::clone(text),
            Some(Entry::Loading(_)) => true,
            None => false,
        };
        if in_flight {
            return self
                .wait_for(path)
                .await
                .unwrap_or_else(|| Rc::from(FALLBACK_MOL2));
        }

        self.files
            .borrow_mut()
            .insert(path.to_string(), Entry::Loading(Vec::new()));
        let _guard = InFlight { cache: self, path };

        match source.fetch_text(path).await {
            Ok(text) => {
                let text: Rc<str> = Rc::from(text);
                self.settle(path, Some(Rc::clone(&text)));
                text
            }
            Err(e) => {
                log::warn!("Using fallback molecule for '{path}': {e}");
                self.settle(path, None);
                Rc::from(FALLBACK_MOL2)
            }
        }
    }

    /// Result of another load's fetch; `None` when it failed
    async fn wait_for(&self, path: &str) -> Option<Rc<str>> {
        poll_fn(|cx| match self.files.borrow_mut().get_mut(path) {
            Some(Entry::Ready(text)) => Poll::Ready(Some(Rc::clone(text))),
            Some(Entry::Loading(waiters)) => {
                waiters.push(cx.waker().clone());
                Poll::Pending
            }
            None => Poll::Ready(None),
        })
        .await
    }

    /// Finish a fetch: cache the text (or forget the path) and wake the waiters
    fn settle(&self, path: &str, text: Option<Rc<str>>) {
        let previous = {
            let mut files = self.files.borrow_mut();
            match text {
                Some(text) => files.insert(path.to_string(), Entry::Ready(text)),
                None => files.remove(path),
            }
        };
        if let Some(Entry::Loading(waiters)) = previous {
            for waker in waiters {
                waker.wake();
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        matches!(self.files.borrow().get(path), Some(Entry::Ready(_)))
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.files
            .borrow()
            .values()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Leveled dataset, or `None` when it is missing or unusable
pub async fn load_level_set<S: AssetSource + ?Sized>(source: &S, url: &str) -> Option<LevelSet> {
    let json = match source.fetch_text(url).await {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Level dataset unavailable: {e}");
            return None;
        }
    };
    match LevelSet::from_json(&json) {
        Ok(levels) => {
            log::info!("Loaded {} levels from {url}", levels.len());
            Some(levels)
        }
        Err(e) => {
            log::warn!("Level dataset rejected: {e}");
            None
        }
    }
}

/// Flat catalog; empty when missing or malformed
pub async fn load_catalog<S: AssetSource + ?Sized>(source: &S, url: &str) -> Catalog {
    let json = match source.fetch_text(url).await {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Catalog unavailable: {e}");
            return Catalog::default();
        }
    };
    match Catalog::from_json(&json) {
        Ok(catalog) => {
            log::info!("Loaded catalog with {} molecules", catalog.len());
            catalog
        }
        Err(e) => {
            log::warn!("Catalog rejected: {e}");
            Catalog::default()
        }
    }
}

/// Dataset and catalog for a new game. The flat catalog is only fetched when
/// there is no usable dataset.
pub async fn load_game_data<S: AssetSource + ?Sized>(
    source: &S,
    settings: &Settings,
) -> (Option<LevelSet>, Catalog) {
    match load_level_set(source, &settings.levels_url).await {
        Some(levels) => {
            let catalog = Catalog::from_levels(&levels);
            (Some(levels), catalog)
        }
        None => (None, load_catalog(source, &settings.catalog_url).await),
    }
}

#[cfg(target_arch = "wasm32")]
mod http {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{AssetError, AssetSource};

    /// `fetch()` relative to the page
    #[derive(Debug, Clone, Copy, Default)]
    pub struct HttpSource;

    fn network(path: &str, err: wasm_bindgen::JsValue) -> AssetError {
        AssetError::Network {
            path: path.to_string(),
            details: format!("{err:?}"),
        }
    }

    impl AssetSource for HttpSource {
        async fn fetch_text(&self, path: &str) -> Result<String, AssetError> {
            let window = web_sys::window().ok_or_else(|| AssetError::Network {
                path: path.to_string(),
                details: "no window".to_string(),
            })?;

            let opts = RequestInit::new();
            opts.set_method("GET");
            opts.set_mode(RequestMode::SameOrigin);
            let request =
                Request::new_with_str_and_init(path, &opts).map_err(|e| network(path, e))?;

            let response = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(|e| network(path, e))?;
            let response: Response = response.dyn_into().map_err(|e| network(path, e))?;
            if !response.ok() {
                return Err(AssetError::Status {
                    path: path.to_string(),
                    status: response.status(),
                });
            }

            let text = JsFuture::from(response.text().map_err(|e| network(path, e))?)
                .await
                .map_err(|e| network(path, e))?;
            text.as_string()
                .ok_or_else(|| AssetError::Decode(path.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    const LEVELS: &str = r#"{"levels": [
        {"target": {"name": "a", "file": "a.mol2", "atom_count": 5},
         "similar": [{"name": "b", "file": "b.mol2", "atom_count": 5},
                     {"name": "c", "file": "c.mol2", "atom_count": 6}]}
    ]}"#;

    #[test]
    fn test_cache_fetches_once() {
        let source = MemorySource::new().with("data/DB/a.mol2", "AAA");
        let cache = MoleculeCache::new();

        let first = block_on(cache.load(&source, "data/DB/a.mol2"));
        let second = block_on(cache.load(&source, "data/DB/a.mol2"));
        assert_eq!(&*first, "AAA");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(source.requests().len(), 1);
    }

    #[test]
    fn test_cache_falls_back_without_caching() {
        let mut source = MemorySource::new();
        let cache = MoleculeCache::new();

        let text = block_on(cache.load(&source, "missing.mol2"));
        assert_eq!(&*text, FALLBACK_MOL2);
        assert!(!cache.contains("missing.mol2"));

        // A later successful fetch replaces the fallback
        source.insert("missing.mol2", "REAL");
        let text = block_on(cache.load(&source, "missing.mol2"));
        assert_eq!(&*text, "REAL");
        assert_eq!(cache.len(), 1);
    }

    /// Suspends once before answering, so two loads can overlap
    struct SlowSource(MemorySource);

    impl AssetSource for SlowSource {
        async fn fetch_text(&self, path: &str) -> Result<String, AssetError> {
            let mut yielded = false;
            poll_fn(|cx| {
                if yielded {
                    Poll::Ready(())
                } else {
                    yielded = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            })
            .await;
            self.0.fetch_text(path).await
        }
    }

    /// Drive two futures together until both finish
    fn join<A: Future, B: Future>(a: A, b: B) -> (A::Output, B::Output) {
        let (mut a, mut b) = (Box::pin(a), Box::pin(b));
        let (mut out_a, mut out_b) = (None, None);
        block_on(poll_fn(|cx| {
            if out_a.is_none() {
                if let Poll::Ready(v) = a.as_mut().poll(cx) {
                    out_a = Some(v);
                }
            }
            if out_b.is_none() {
                if let Poll::Ready(v) = b.as_mut().poll(cx) {
                    out_b = Some(v);
                }
            }
            if out_a.is_some() && out_b.is_some() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        }));
        (out_a.unwrap(), out_b.unwrap())
    }

    #[test]
    fn test_overlapping_loads_share_one_fetch() {
        let source = SlowSource(MemorySource::new().with("data/DB/a.mol2", "AAA"));
        let cache = MoleculeCache::new();

        let (first, second) = join(
            cache.load(&source, "data/DB/a.mol2"),
            cache.load(&source, "data/DB/a.mol2"),
        );
        assert_eq!(&*first, "AAA");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(source.0.requests().len(), 1);
        assert!(cache.contains("data/DB/a.mol2"));
    }

    #[test]
    fn test_overlapping_failed_loads_both_fall_back() {
        let source = SlowSource(MemorySource::new());
        let cache = MoleculeCache::new();

        let (first, second) = join(
            cache.load(&source, "data/DB/gone.mol2"),
            cache.load(&source, "data/DB/gone.mol2"),
        );
        assert_eq!(&*first, FALLBACK_MOL2);
        assert_eq!(&*second, FALLBACK_MOL2);
        assert_eq!(source.0.requests().len(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_dropped_load_releases_waiters() {
        let source = SlowSource(MemorySource::new().with("data/DB/a.mol2", "AAA"));
        let cache = MoleculeCache::new();

        // Start a fetch and abandon it mid-flight
        let mut abandoned = Box::pin(cache.load(&source, "data/DB/a.mol2"));
        let waker = Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        assert!(abandoned.as_mut().poll(&mut cx).is_pending());
        drop(abandoned);

        let text = block_on(cache.load(&source, "data/DB/a.mol2"));
        assert_eq!(&*text, "AAA");
        assert_eq!(source.0.requests().len(), 1);
    }

    #[test]
    fn test_load_level_set() {
        let source = MemorySource::new()
            .with("levels.json", LEVELS)
            .with("broken.json", "{ nope")
            .with("empty.json", r#"{"levels": []}"#);

        assert_eq!(block_on(load_level_set(&source, "levels.json")).unwrap().len(), 1);
        assert!(block_on(load_level_set(&source, "broken.json")).is_none());
        assert!(block_on(load_level_set(&source, "empty.json")).is_none());
        assert!(block_on(load_level_set(&source, "absent.json")).is_none());
    }

    #[test]
    fn test_game_data_prefers_levels() {
        let settings = Settings::default();
        let source = MemorySource::new().with(&settings.levels_url, LEVELS);

        let (levels, catalog) = block_on(load_game_data(&source, &settings));
        assert!(levels.is_some());
        assert_eq!(catalog.len(), 3);
        assert_eq!(source.requests(), vec![settings.levels_url.clone()]);
    }

    #[test]
    fn test_game_data_falls_back_to_catalog() {
        let settings = Settings::default();
        let source = MemorySource::new().with(
            &settings.catalog_url,
            r#"["data/DB/x.mol2", "data/DB/y.mol2", "data/DB/z.mol2"]"#,
        );

        let (levels, catalog) = block_on(load_game_data(&source, &settings));
        assert!(levels.is_none());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_game_data_with_nothing() {
        let source = MemorySource::new();
        let (levels, catalog) = block_on(load_game_data(&source, &Settings::default()));
        assert!(levels.is_none());
        assert!(catalog.is_empty());
    }
}
