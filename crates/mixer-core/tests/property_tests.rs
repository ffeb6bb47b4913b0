//! Property-based tests for hashing, rule bookkeeping and path mapping.

use mixer_core::hash::hash_bytes;
use mixer_core::paths::{logical_from_physical, physical_from_logical, to_logical};
use mixer_core::{BuildConfig, ModuleRule};
use proptest::prelude::*;
use std::collections::HashMap;
use std::path::Path;

const EXTENSIONS: &[&str] = &["js", "css", "scss", "less", "png", "svg", "vue"];

/// A rule claiming a non-empty subset of `EXTENSIONS`.
fn rule_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(EXTENSIONS, 1..=EXTENSIONS.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: the token depends on content only and has the requested length
    #[test]
    fn prop_hash_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..512), len in 8usize..=64) {
        let first = hash_bytes(&bytes, len);
        let second = hash_bytes(&bytes, len);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.as_str().len(), len);
    }

    /// Property: after any sequence of rules, every extension is claimed once,
    /// by the last rule that mentioned it
    #[test]
    fn prop_rules_never_overlap(rules in prop::collection::vec(rule_strategy(), 1..12)) {
        let mut config = BuildConfig::default();
        let mut owner: HashMap<&str, String> = HashMap::new();

        for (index, exts) in rules.iter().enumerate() {
            let loader = format!("loader-{}", index);
            config.add_rule(ModuleRule::with_loaders(exts, [loader.as_str()]));
            for ext in exts {
                owner.insert(*ext, loader.clone());
            }
        }

        prop_assert!(config.duplicate_extensions().is_empty());
        prop_assert!(config.module.rules.iter().all(|rule| !rule.test.is_empty()));
        for (ext, loader) in &owner {
            let rule = config.rule_for(ext);
            prop_assert!(rule.is_some());
            prop_assert_eq!(rule.map(|r| r.loaders.loader_names()), Some(vec![loader.as_str()]));
        }
    }

    /// Property: logical keys map to files under the public directory and back
    #[test]
    fn prop_logical_paths_round_trip(parts in prop::collection::vec("[a-z]{1,8}", 1..=4)) {
        let public = Path::new("/srv/app/public");
        let key = to_logical(&format!("public/{}.js", parts.join("/")), &["public"]);
        prop_assert!(key.starts_with('/') && !key.starts_with("//"));

        let physical = physical_from_logical(public, &format!("{}?id=abc", key));
        prop_assert_eq!(logical_from_physical(public, &physical), Some(key));
    }
}
