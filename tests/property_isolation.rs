/// Property-based tests for scope isolation
///
/// Whatever gets bound in one scope, no other scope of the same registry
/// may observe it, and disposal always leaves the registry consistent.

use proptest::prelude::*;
use scoped_container::{DiError, Lifetime, Provider, Resolver, ScopeRegistry, Token};
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn bindings_never_leak_between_scopes(
        tokens in prop::collection::btree_set("[a-z]{1,8}", 1..8),
        value in any::<u64>(),
    ) {
        let registry = ScopeRegistry::new();
        let a = registry.create_scope("a".into()).unwrap();
        let b = registry.create_scope("b".into()).unwrap();

        for token in &tokens {
            a.register(Token::named(token.clone()), Provider::value(value), Lifetime::Scoped)
                .unwrap();
        }

        for token in &tokens {
            prop_assert_eq!(*a.resolve::<u64>(Token::named(token.clone())).unwrap(), value);
            let leaked = b.resolve::<u64>(Token::named(token.clone()));
            prop_assert!(matches!(leaked, Err(DiError::UnresolvedToken(_))));
        }

        registry.dispose_all();
    }
}

proptest! {
    #[test]
    fn fallthrough_only_ever_reaches_defaults(
        local in any::<u32>(),
        shared in any::<u32>(),
        override_in_a in any::<bool>(),
    ) {
        let registry = ScopeRegistry::new();
        registry.defaults().set("value", shared);

        let a = registry.create_scope("a".into()).unwrap();
        let b = registry.create_scope("b".into()).unwrap();
        if override_in_a {
            a.set("value", local).unwrap();
        }

        let expected_a = if override_in_a { local } else { shared };
        prop_assert_eq!(*a.resolve::<u32>("value").unwrap(), expected_a);
        prop_assert_eq!(*b.resolve::<u32>("value").unwrap(), shared);

        registry.dispose_all();
    }
}

proptest! {
    #[test]
    fn registry_tracks_exactly_the_undisposed_scopes(
        created in prop::collection::btree_set(0u64..64, 0..32),
        disposed in prop::collection::vec(0u64..64, 0..48),
    ) {
        let registry = ScopeRegistry::new();
        for id in &created {
            registry.create_scope((*id).into()).unwrap();
        }

        let mut expected: BTreeSet<u64> = created.clone();
        for id in &disposed {
            let was_live = expected.remove(id);
            prop_assert_eq!(registry.dispose_scope(&(*id).into()), was_live);
        }

        let live: BTreeSet<String> = registry
            .list_live_scope_ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        let expected: BTreeSet<String> = expected.iter().map(|id| id.to_string()).collect();
        prop_assert_eq!(live, expected);

        registry.dispose_all();
    }
}
