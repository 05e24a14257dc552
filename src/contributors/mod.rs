//! # Contributors Module
//!
//! Contribution facts and the author set they are merged into.
//!
//! - [`filter`] decides which identities are human contributors
//! - [`aggregate`] combines header, history and pull request sources and
//!   orders the result for rendering

pub mod aggregate;
pub mod filter;

use std::collections::HashMap;

pub use aggregate::{aggregate, order_for_rendering, strip_email, strip_emails};
pub use filter::{IdentityFilter, IdentityRule};

/// An identity's first and last year of recorded activity on a file.
///
/// `first_year <= last_year` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionFact {
  /// `"Name <email>"` or a bare name.
  pub identity: String,
  pub first_year: i32,
  pub last_year: i32,
}

impl ContributionFact {
  /// Creates a fact, swapping the years if they are out of order.
  pub fn new(identity: impl Into<String>, first_year: i32, last_year: i32) -> Self {
    Self {
      identity: identity.into(),
      first_year: first_year.min(last_year),
      last_year: first_year.max(last_year),
    }
  }

  /// A fact covering a single year.
  pub fn single(identity: impl Into<String>, year: i32) -> Self {
    Self::new(identity, year, year)
  }

  /// Widens this fact's range to cover `other`'s.
  pub fn widen(&mut self, first_year: i32, last_year: i32) {
    self.first_year = self.first_year.min(first_year);
    self.last_year = self.last_year.max(last_year);
  }
}

/// Identity to contribution fact mapping with unique keys.
///
/// Inserting an identity that is already present widens its year range.
/// Iteration order is unspecified; see [`order_for_rendering`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorSet {
  facts: HashMap<String, ContributionFact>,
}

impl AuthorSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `fact`, merging it with an existing fact for the same identity.
  pub fn insert(&mut self, fact: ContributionFact) {
    match self.facts.get_mut(&fact.identity) {
      Some(existing) => existing.widen(fact.first_year, fact.last_year),
      None => {
        self.facts.insert(fact.identity.clone(), fact);
      }
    }
  }

  pub fn get(&self, identity: &str) -> Option<&ContributionFact> {
    self.facts.get(identity)
  }

  pub fn contains(&self, identity: &str) -> bool {
    self.facts.contains_key(identity)
  }

  pub fn len(&self) -> usize {
    self.facts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.facts.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ContributionFact> {
    self.facts.values()
  }

  pub fn identities(&self) -> impl Iterator<Item = &str> {
    self.facts.keys().map(String::as_str)
  }
}

impl FromIterator<ContributionFact> for AuthorSet {
  fn from_iter<I: IntoIterator<Item = ContributionFact>>(iter: I) -> Self {
    let mut set = Self::new();
    set.extend(iter);
    set
  }
}

impl Extend<ContributionFact> for AuthorSet {
  fn extend<I: IntoIterator<Item = ContributionFact>>(&mut self, iter: I) {
    for fact in iter {
      self.insert(fact);
    }
  }
}

impl IntoIterator for AuthorSet {
  type Item = ContributionFact;
  type IntoIter = std::collections::hash_map::IntoValues<String, ContributionFact>;

  fn into_iter(self) -> Self::IntoIter {
    self.facts.into_values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_orders_years() {
    let fact = ContributionFact::new("Ada", 2024, 2020);
    assert_eq!((fact.first_year, fact.last_year), (2020, 2024));
  }

  #[test]
  fn test_insert_widens_never_narrows() {
    let mut set = AuthorSet::new();
    set.insert(ContributionFact::new("Ada <ada@x.com>", 2019, 2021));
    set.insert(ContributionFact::new("Ada <ada@x.com>", 2020, 2020));
    set.insert(ContributionFact::new("Ada <ada@x.com>", 2018, 2023));

    let fact = set.get("Ada <ada@x.com>").expect("present");
    assert_eq!((fact.first_year, fact.last_year), (2018, 2023));
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn test_identities_are_exact_strings() {
    let set: AuthorSet = [
      ContributionFact::single("Ada", 2020),
      ContributionFact::single("ada", 2021),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 2);
    assert!(set.contains("Ada"));
    assert!(!set.contains("ADA"));
  }
}
