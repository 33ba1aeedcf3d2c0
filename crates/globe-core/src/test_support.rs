//! Fixtures and fakes shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::CatalogError;
use crate::location::{LocationError, LocationProvider};
use crate::models::{Country, Currency};
use crate::remote::CatalogSource;
use crate::services::{DurableStore, MemoryStore};
use crate::{Error, Result};

pub fn egypt() -> Country {
    Country::new("Egypt", "EG", "EGY")
        .with_capital("Cairo")
        .with_currencies(vec![Currency::new("EGP", "Egyptian pound", Some("E£"))])
        .with_flag("https://flagcdn.com/eg.svg")
}

pub fn united_kingdom() -> Country {
    Country::new("United Kingdom", "GB", "GBR")
        .with_capital("London")
        .with_currencies(vec![Currency::new("GBP", "British pound", Some("£"))])
        .with_flag("https://flagcdn.com/gb.svg")
}

pub fn japan() -> Country {
    Country::new("Japan", "JP", "JPN")
        .with_capital("Tokyo")
        .with_currencies(vec![Currency::new("JPY", "Japanese yen", Some("¥"))])
        .with_flag("https://flagcdn.com/jp.svg")
}

/// Synthetic country `Sample A`, `Sample B`, ... with codes `XA`/`XXA`, ...
pub fn sample(index: u8) -> Country {
    let letter = char::from(b'A' + index);
    Country::new(
        format!("Sample {letter}"),
        format!("X{letter}"),
        format!("XX{letter}"),
    )
}

/// In-memory [`CatalogSource`] that can be switched to fail.
pub struct StubSource {
    response: Mutex<std::result::Result<Vec<Country>, CatalogError>>,
    all_calls: AtomicUsize,
}

impl StubSource {
    pub fn with_countries(countries: Vec<Country>) -> Self {
        Self {
            response: Mutex::new(Ok(countries)),
            all_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CatalogError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            all_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_countries(&self, countries: Vec<Country>) {
        *self.response.lock().unwrap() = Ok(countries);
    }

    pub fn all_calls(&self) -> usize {
        self.all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StubSource {
    async fn fetch_all(&self) -> std::result::Result<Vec<Country>, CatalogError> {
        self.all_calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }

    async fn fetch_by_code(&self, code: &str) -> std::result::Result<Country, CatalogError> {
        let response = self.response.lock().unwrap().clone();
        response?
            .into_iter()
            .find(|country| country.matches_code(code))
            .ok_or_else(|| CatalogError::NotFound(code.to_string()))
    }
}

/// [`MemoryStore`] whose reads and writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Database(format!("injected {operation} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn read_favorites(&self) -> Result<Vec<Country>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.read_favorites().await
    }

    async fn write_favorites(&self, countries: &[Country]) -> Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.write_favorites(countries).await
    }

    async fn read_catalog_snapshot(&self) -> Result<Vec<Country>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.read_catalog_snapshot().await
    }

    async fn write_catalog_snapshot(&self, countries: &[Country]) -> Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.write_catalog_snapshot(countries).await
    }
}

/// [`MemoryStore`] that yields to the scheduler before every operation.
#[derive(Default)]
pub struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait]
impl DurableStore for YieldingStore {
    async fn read_favorites(&self) -> Result<Vec<Country>> {
        tokio::task::yield_now().await;
        self.inner.read_favorites().await
    }

    async fn write_favorites(&self, countries: &[Country]) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.write_favorites(countries).await
    }

    async fn read_catalog_snapshot(&self) -> Result<Vec<Country>> {
        tokio::task::yield_now().await;
        self.inner.read_catalog_snapshot().await
    }

    async fn write_catalog_snapshot(&self, countries: &[Country]) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.write_catalog_snapshot(countries).await
    }
}

/// Location provider with a scripted answer.
pub struct StubLocation {
    answer: std::result::Result<String, LocationError>,
}

impl StubLocation {
    pub fn failing(error: LocationError) -> Self {
        Self { answer: Err(error) }
    }
}

#[async_trait]
impl LocationProvider for StubLocation {
    async fn current_country_code(&self) -> std::result::Result<String, LocationError> {
        self.answer.clone()
    }
}
