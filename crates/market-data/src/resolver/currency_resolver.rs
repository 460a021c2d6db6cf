//! Currency identity resolution.
//!
//! Turns free-form user queries into something every source can match
//! against its own row labels.

use std::borrow::Cow;
use std::sync::Arc;

use crate::models::{Currency, CurrencyTable};

/// Separators users type between code fragments ("usd/cny", "hkd_cny").
const SEPARATORS: [char; 3] = ['_', '-', '/'];

/// A query after normalization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedQuery {
    /// Trimmed, separator-free, lower-cased query
    pub key: String,
    /// Text compared against row labels: the display name when the query
    /// is a known code, the trimmed query otherwise
    pub target: String,
    /// Upper-case 3-letter code, when the query looks like one
    pub code: Option<Currency>,
}

impl NormalizedQuery {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Resolves queries and row labels against the shared [`CurrencyTable`].
#[derive(Clone, Debug)]
pub struct CurrencyResolver {
    table: Arc<CurrencyTable>,
}

impl Default for CurrencyResolver {
    fn default() -> Self {
        Self::new(CurrencyTable::builtin())
    }
}

impl CurrencyResolver {
    pub fn new(table: Arc<CurrencyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CurrencyTable {
        &self.table
    }

    /// Normalize a user query.
    ///
    /// Known codes and whole-string synonyms ("rmb") are replaced by the
    /// canonical display name, since several sources index rows by name.
    pub fn normalize(&self, query: &str) -> NormalizedQuery {
        let trimmed = query.trim();
        let key: String = trimmed
            .chars()
            .filter(|c| !SEPARATORS.contains(c))
            .collect::<String>()
            .to_lowercase();

        if key.is_empty() {
            return NormalizedQuery {
                key,
                target: String::new(),
                code: None,
            };
        }

        let known = self
            .table
            .by_code(&key)
            .filter(|_| key.len() == 3)
            .or_else(|| {
                self.table
                    .identities()
                    .iter()
                    .find(|c| c.synonyms.iter().any(|s| s.eq_ignore_ascii_case(&key)))
            });

        match known {
            Some(identity) => NormalizedQuery {
                key,
                target: identity.name.to_string(),
                code: Some(identity.code.clone()),
            },
            None => {
                let code = (key.len() == 3 && key.chars().all(|c| c.is_ascii_alphabetic()))
                    .then(|| Cow::Owned(key.to_ascii_uppercase()));
                NormalizedQuery {
                    key,
                    target: trimmed.to_string(),
                    code,
                }
            }
        }
    }

    /// Does a source row match the query?
    ///
    /// Name matching is symmetric substring containment after synonym
    /// unification, tried against both the display target and the raw
    /// key. When the row carries a code, an exact code match also counts.
    pub fn matches(&self, row_label: &str, row_code: Option<&str>, query: &NormalizedQuery) -> bool {
        if query.is_empty() {
            return false;
        }

        let code_match = match (row_code.map(str::trim), &query.code) {
            (Some(row_code), Some(code)) if !row_code.is_empty() => {
                row_code.eq_ignore_ascii_case(code)
            }
            _ => false,
        };

        code_match || self.name_matches(row_label, &query.target) || self.name_matches(row_label, &query.key)
    }

    /// Resolve the ISO code for a row label, if the table knows it.
    pub fn code_for_label(&self, label: &str) -> Option<Currency> {
        let unified = self.table.unify(label);
        self.table.find(&unified).map(|c| c.code.clone())
    }

    fn name_matches(&self, label: &str, target: &str) -> bool {
        let label = self.table.unify(label).to_lowercase();
        let target = self.table.unify(target).to_lowercase();
        if label.is_empty() || target.is_empty() {
            return false;
        }
        label == target || label.contains(&target) || target.contains(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CurrencyResolver {
        CurrencyResolver::default()
    }

    #[test]
    fn test_normalize_known_code() {
        let q = resolver().normalize(" USD ");
        assert_eq!(q.key, "usd");
        assert_eq!(q.target, "美元");
        assert_eq!(q.code.as_deref(), Some("USD"));
    }

    #[test]
    fn test_normalize_strips_separators() {
        let q = resolver().normalize("h-k_d");
        assert_eq!(q.key, "hkd");
        assert_eq!(q.target, "港币");
    }

    #[test]
    fn test_normalize_unknown_code_keeps_query() {
        let q = resolver().normalize("xyz");
        assert_eq!(q.target, "xyz");
        assert_eq!(q.code.as_deref(), Some("XYZ"));
    }

    #[test]
    fn test_normalize_chinese_name() {
        let q = resolver().normalize("日元");
        assert_eq!(q.target, "日元");
        assert!(q.code.is_none());
    }

    #[test]
    fn test_normalize_synonym() {
        let q = resolver().normalize("rmb");
        assert_eq!(q.target, "人民币");
        assert_eq!(q.code.as_deref(), Some("CNY"));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(resolver().normalize("   ").is_empty());
    }

    #[test]
    fn test_matches_by_name() {
        let r = resolver();
        let q = r.normalize("usd");
        assert!(r.matches("美元", None, &q));
        assert!(!r.matches("欧元", None, &q));
    }

    #[test]
    fn test_matches_label_with_qualifier() {
        let r = resolver();
        let q = r.normalize("usd");
        assert!(r.matches("美元 USD", None, &q));
        assert!(r.matches("美元/USD", None, &q));
    }

    #[test]
    fn test_matches_by_code() {
        let r = resolver();
        let q = r.normalize("usd");
        assert!(r.matches("US Dollar", Some("USD"), &q));
        assert!(!r.matches("Euro", Some("EUR"), &q));
    }

    #[test]
    fn test_matches_synonym_spellings() {
        let r = resolver();
        let q = r.normalize("港元");
        assert!(r.matches("港币", None, &q));

        let q = r.normalize("hkd");
        assert!(r.matches("港元", None, &q));
    }

    #[test]
    fn test_taiwan_dollar_not_doubled() {
        let r = resolver();
        let q = r.normalize("twd");
        assert!(r.matches("新台币", None, &q));
        assert!(r.matches("台币", None, &q));
    }

    #[test]
    fn test_empty_label_never_matches_by_name() {
        let r = resolver();
        let q = r.normalize("usd");
        assert!(!r.matches("", None, &q));
        assert!(!r.matches("  ", Some(""), &q));
    }

    #[test]
    fn test_empty_query_never_matches() {
        let r = resolver();
        let q = r.normalize("");
        assert!(!r.matches("美元", Some("USD"), &q));
    }

    #[test]
    fn test_code_for_label() {
        let r = resolver();
        assert_eq!(r.code_for_label("美元").as_deref(), Some("USD"));
        assert_eq!(r.code_for_label("韩元").as_deref(), Some("KRW"));
        assert_eq!(r.code_for_label("坚戈").as_deref(), Some("KZT"));
        assert_eq!(r.code_for_label("未知币").as_deref(), None);
    }
}
