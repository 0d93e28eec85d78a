//! Country name → ISO 3166 alpha-3 code resolution.
//!
//! [`CountryCodes`] runs an ordered chain of [`ResolveStrategy`] objects and
//! returns the first code found. The chain can be rebuilt or extended, so the
//! pipeline only ever depends on the [`CountryResolver`] capability.

mod iso3166;

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

use log::warn;

pub use iso3166::{COUNTRIES, HISTORIC_COUNTRIES, WHO_NAME_OVERRIDES};

/// Resolves a country name to its alpha-3 code, or `""` when unknown.
pub trait CountryResolver {
    fn resolve(&self, name: &str) -> String;
}

impl<F> CountryResolver for F
where
    F: Fn(&str) -> String,
{
    fn resolve(&self, name: &str) -> String {
        self(name)
    }
}

/// One lookup technique in the resolution chain.
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn lookup(&self, country: &str) -> Option<String>;
}

/// Lower-cases, folds `&` into `and`, expands `St.` and drops punctuation so
/// that `Saint Kitts & Nevis` and `St. Kitts and Nevis` compare equal.
pub fn normalize_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '&' => cleaned.push_str(" and "),
            c if c.is_alphanumeric() => cleaned.extend(c.to_lowercase()),
            '\'' | '’' => {}
            _ => cleaned.push(' '),
        }
    }
    cleaned
        .split_whitespace()
        .map(|word| match word {
            "st" => "saint",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-sensitive match against every ISO name of a table.
pub struct ExactName {
    table: &'static [(&'static str, &'static [&'static str])],
}

impl ExactName {
    pub fn current() -> Self {
        Self { table: COUNTRIES }
    }
}

impl ResolveStrategy for ExactName {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn lookup(&self, country: &str) -> Option<String> {
        let trimmed = country.trim();
        self.table
            .iter()
            .find(|(_, names)| names.contains(&trimmed))
            .map(|(code, _)| code.to_string())
    }
}

/// Normalized comparison, then whole-word containment in either direction.
/// Among containment hits the longest candidate name wins.
pub struct FuzzyName {
    candidates: Vec<(String, &'static str)>,
}

impl FuzzyName {
    pub fn current() -> Self {
        let candidates = COUNTRIES
            .iter()
            .flat_map(|(code, names)| names.iter().map(move |name| (normalize_name(name), *code)))
            .collect();
        Self { candidates }
    }
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.split(' ').collect::<Vec<_>>();
    let needle = needle.split(' ').collect::<Vec<_>>();
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

impl ResolveStrategy for FuzzyName {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn lookup(&self, country: &str) -> Option<String> {
        let query = normalize_name(country);
        if query.is_empty() {
            return None;
        }
        if let Some((_, code)) = self.candidates.iter().find(|(name, _)| *name == query) {
            return Some(code.to_string());
        }
        self.candidates
            .iter()
            .filter(|(name, _)| contains_words(&query, name) || contains_words(name, &query))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, code)| code.to_string())
    }
}

/// Exact match against withdrawn country names.
pub struct HistoricName;

impl ResolveStrategy for HistoricName {
    fn name(&self) -> &'static str {
        "historic"
    }

    fn lookup(&self, country: &str) -> Option<String> {
        ExactName {
            table: HISTORIC_COUNTRIES,
        }
        .lookup(country)
    }
}

/// Hand-maintained table for names the other strategies miss.
pub struct OverrideTable {
    entries: BTreeMap<String, String>,
}

impl OverrideTable {
    /// The built-in WHO spellings, extended (and overridden) by `extra`.
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Self {
        let mut entries = WHO_NAME_OVERRIDES
            .iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect::<BTreeMap<_, _>>();
        entries.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { entries }
    }
}

impl ResolveStrategy for OverrideTable {
    fn name(&self) -> &'static str {
        "override"
    }

    fn lookup(&self, country: &str) -> Option<String> {
        self.entries.get(country.trim()).cloned()
    }
}

pub struct CountryCodes {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl CountryCodes {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Exact, historic, fuzzy, then the override table. Withdrawn names are
    /// matched before fuzzy containment, which would otherwise map
    /// `Serbia and Montenegro` onto a current country.
    pub fn standard(extra_overrides: &BTreeMap<String, String>) -> Self {
        Self::new(vec![
            Box::new(ExactName::current()),
            Box::new(HistoricName),
            Box::new(FuzzyName::current()),
            Box::new(OverrideTable::with_extra(extra_overrides)),
        ])
    }

    pub fn push(&mut self, strategy: Box<dyn ResolveStrategy>) {
        self.strategies.push(strategy);
    }

    /// The code and the name of the strategy that produced it.
    pub fn lookup(&self, country: &str) -> Option<(String, &'static str)> {
        self.strategies
            .iter()
            .find_map(|s| s.lookup(country).map(|code| (code, s.name())))
    }
}

impl Default for CountryCodes {
    fn default() -> Self {
        Self::standard(&BTreeMap::new())
    }
}

impl CountryResolver for CountryCodes {
    fn resolve(&self, name: &str) -> String {
        match self.lookup(name) {
            Some((code, _)) => code,
            None => {
                warn!("Could not find alpha-3 code for country {name}");
                String::new()
            }
        }
    }
}

/// Memoizes another resolver so each distinct name is looked up once.
pub struct CachedResolver<'a, R: CountryResolver + ?Sized> {
    inner: &'a R,
    cache: RefCell<HashMap<String, String>>,
}

impl<'a, R: CountryResolver + ?Sized> CachedResolver<'a, R> {
    pub fn new(inner: &'a R) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn lookups(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<R: CountryResolver + ?Sized> CountryResolver for CachedResolver<'_, R> {
    fn resolve(&self, name: &str) -> String {
        if let Some(code) = self.cache.borrow().get(name) {
            return code.clone();
        }
        let code = self.inner.resolve(name);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), code.clone());
        code
    }
}
