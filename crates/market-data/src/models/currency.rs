//! Currency identities shared by every source adapter.
//!
//! Sources index their tables inconsistently: some by Chinese display name,
//! some by ISO code, some by both in one cell, and a few institutions spell
//! the same currency differently (港币 vs 港元). The [`CurrencyTable`] is the
//! single immutable place that knows about all of these names.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use super::types::Currency;

/// Domestic currency code. Every source quotes foreign currencies in it.
pub const DOMESTIC_CURRENCY: &str = "CNY";

/// One currency as known across all sources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrencyIdentity {
    /// Upper-case ISO code, e.g. "HKD"
    pub code: Currency,
    /// Canonical display name, e.g. "港币"
    pub name: Cow<'static, str>,
    /// Alternative spellings that refer to the same currency
    pub synonyms: Vec<Cow<'static, str>>,
}

impl CurrencyIdentity {
    pub fn new(code: &'static str, name: &'static str) -> Self {
        Self {
            code: Cow::Borrowed(code),
            name: Cow::Borrowed(name),
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: &[&'static str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| Cow::Borrowed(*s)).collect();
        self
    }

    /// True if `text` is this currency's code, name or one of its synonyms.
    pub fn is_named(&self, text: &str) -> bool {
        let text = text.trim();
        self.code.eq_ignore_ascii_case(text)
            || self.name == text
            || self.synonyms.iter().any(|s| s.eq_ignore_ascii_case(text))
    }
}

/// Immutable lookup table of currency identities.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// adapter running in an aggregation.
#[derive(Debug)]
pub struct CurrencyTable {
    identities: Vec<CurrencyIdentity>,
    by_code: HashMap<String, usize>,
    domestic: Currency,
}

lazy_static! {
    static ref BUILTIN: Arc<CurrencyTable> = Arc::new(CurrencyTable::new(
        builtin_identities(),
        DOMESTIC_CURRENCY
    ));
}

impl CurrencyTable {
    /// Create a table from a list of identities.
    ///
    /// Later entries with a duplicate code are ignored.
    pub fn new(identities: Vec<CurrencyIdentity>, domestic: &'static str) -> Self {
        let mut by_code = HashMap::with_capacity(identities.len());
        for (idx, identity) in identities.iter().enumerate() {
            by_code
                .entry(identity.code.to_ascii_uppercase())
                .or_insert(idx);
        }
        Self {
            identities,
            by_code,
            domestic: Cow::Borrowed(domestic),
        }
    }

    /// The built-in table covering every currency the bundled sources list.
    pub fn builtin() -> Arc<CurrencyTable> {
        BUILTIN.clone()
    }

    pub fn identities(&self) -> &[CurrencyIdentity] {
        &self.identities
    }

    pub fn domestic(&self) -> &str {
        &self.domestic
    }

    /// Case-insensitive lookup by ISO code.
    pub fn by_code(&self, code: &str) -> Option<&CurrencyIdentity> {
        self.by_code
            .get(&code.trim().to_ascii_uppercase())
            .map(|idx| &self.identities[*idx])
    }

    /// Lookup by code, display name or synonym (whole-string comparison).
    pub fn find(&self, text: &str) -> Option<&CurrencyIdentity> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.by_code(text)
            .or_else(|| self.identities.iter().find(|c| c.is_named(text)))
    }

    /// True if `text` names the domestic currency.
    pub fn is_domestic(&self, text: &str) -> bool {
        self.find(text)
            .map(|c| c.code.eq_ignore_ascii_case(&self.domestic))
            .unwrap_or(false)
    }

    /// Rewrite every synonym occurring in `label` to its canonical name.
    ///
    /// A synonym is only rewritten when the canonical name is not already
    /// present, so "新台币" stays "新台币" even though it contains "台币".
    pub fn unify(&self, label: &str) -> String {
        let mut out = label.trim().to_string();
        for identity in &self.identities {
            if out.contains(identity.name.as_ref()) {
                continue;
            }
            for synonym in &identity.synonyms {
                if !synonym.is_ascii() && out.contains(synonym.as_ref()) {
                    out = out.replace(synonym.as_ref(), identity.name.as_ref());
                    break;
                }
            }
        }
        out
    }
}

fn builtin_identities() -> Vec<CurrencyIdentity> {
    vec![
        CurrencyIdentity::new("CNY", "人民币").with_synonyms(&["RMB", "RENMINBI"]),
        CurrencyIdentity::new("USD", "美元"),
        CurrencyIdentity::new("HKD", "港币").with_synonyms(&["港元"]),
        CurrencyIdentity::new("EUR", "欧元"),
        CurrencyIdentity::new("GBP", "英镑"),
        CurrencyIdentity::new("JPY", "日元"),
        CurrencyIdentity::new("AUD", "澳大利亚元").with_synonyms(&["澳元"]),
        CurrencyIdentity::new("CAD", "加拿大元").with_synonyms(&["加元"]),
        CurrencyIdentity::new("SGD", "新加坡元"),
        CurrencyIdentity::new("NZD", "新西兰元"),
        CurrencyIdentity::new("CHF", "瑞士法郎"),
        CurrencyIdentity::new("THB", "泰国铢").with_synonyms(&["泰铢"]),
        CurrencyIdentity::new("TWD", "新台币").with_synonyms(&["台币"]),
        CurrencyIdentity::new("KRW", "韩国元").with_synonyms(&["韩元"]),
        CurrencyIdentity::new("PHP", "菲律宾比索"),
        CurrencyIdentity::new("IDR", "印尼卢比"),
        CurrencyIdentity::new("INR", "印度卢比"),
        CurrencyIdentity::new("RUB", "卢布").with_synonyms(&["俄罗斯卢布"]),
        CurrencyIdentity::new("ZAR", "南非兰特"),
        CurrencyIdentity::new("AED", "阿联酋迪拉姆"),
        CurrencyIdentity::new("SAR", "沙特里亚尔"),
        CurrencyIdentity::new("HUF", "匈牙利福林"),
        CurrencyIdentity::new("CZK", "捷克克朗"),
        CurrencyIdentity::new("SEK", "瑞典克朗"),
        CurrencyIdentity::new("DKK", "丹麦克朗"),
        CurrencyIdentity::new("NOK", "挪威克朗"),
        CurrencyIdentity::new("MXN", "墨西哥比索"),
        CurrencyIdentity::new("ILS", "以色列谢克尔"),
        CurrencyIdentity::new("TRY", "土耳其里拉"),
        CurrencyIdentity::new("BRL", "巴西里亚尔").with_synonyms(&["巴西雷亚尔"]),
        CurrencyIdentity::new("VND", "越南盾"),
        CurrencyIdentity::new("BND", "文莱元"),
        CurrencyIdentity::new("KWD", "科威特第纳尔"),
        CurrencyIdentity::new("NPR", "尼泊尔卢比"),
        CurrencyIdentity::new("PKR", "巴基斯坦卢比"),
        CurrencyIdentity::new("QAR", "卡塔尔里亚尔"),
        CurrencyIdentity::new("MNT", "蒙古图格里克"),
        CurrencyIdentity::new("MOP", "澳门元").with_synonyms(&["澳门币"]),
        CurrencyIdentity::new("MYR", "马来西亚林吉特"),
        CurrencyIdentity::new("KZT", "坚戈").with_synonyms(&["哈萨克斯坦坚戈"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_code_is_case_insensitive() {
        let table = CurrencyTable::builtin();
        assert_eq!(table.by_code("usd").map(|c| c.name.as_ref()), Some("美元"));
        assert_eq!(table.by_code(" HKD ").map(|c| c.name.as_ref()), Some("港币"));
        assert!(table.by_code("XXX").is_none());
    }

    #[test]
    fn test_find_by_synonym() {
        let table = CurrencyTable::builtin();
        assert_eq!(table.find("港元").map(|c| c.code.as_ref()), Some("HKD"));
        assert_eq!(table.find("韩元").map(|c| c.code.as_ref()), Some("KRW"));
        assert_eq!(table.find("坚戈").map(|c| c.code.as_ref()), Some("KZT"));
        assert!(table.find("").is_none());
    }

    #[test]
    fn test_is_domestic() {
        let table = CurrencyTable::builtin();
        assert!(table.is_domestic("cny"));
        assert!(table.is_domestic("RMB"));
        assert!(table.is_domestic("renminbi"));
        assert!(table.is_domestic("人民币"));
        assert!(!table.is_domestic("usd"));
    }

    #[test]
    fn test_unify_rewrites_synonyms() {
        let table = CurrencyTable::builtin();
        assert_eq!(table.unify("港元"), "港币");
        assert_eq!(table.unify("澳门币"), "澳门元");
        assert_eq!(table.unify("韩元"), "韩国元");
    }

    #[test]
    fn test_unify_keeps_canonical_names() {
        let table = CurrencyTable::builtin();
        assert_eq!(table.unify("新台币"), "新台币");
        assert_eq!(table.unify("港币"), "港币");
        assert_eq!(table.unify("美元"), "美元");
    }

    #[test]
    fn test_duplicate_codes_keep_first() {
        let table = CurrencyTable::new(
            vec![
                CurrencyIdentity::new("USD", "美元"),
                CurrencyIdentity::new("USD", "美金"),
            ],
            "CNY",
        );
        assert_eq!(table.by_code("USD").map(|c| c.name.as_ref()), Some("美元"));
    }
}
