use scoped_container::{
    DiError, Lifetime, Provider, RequestContext, Resolver, ScopeRegistry, Token, CONTEXT_TOKEN,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_factory(counter: &Arc<AtomicUsize>) -> Provider<usize> {
    let counter = counter.clone();
    Provider::factory(move |_| counter.fetch_add(1, Ordering::SeqCst) + 1)
}

#[test]
fn test_token_bound_in_one_scope_is_invisible_in_another() {
    let registry = ScopeRegistry::new();
    let a = registry.create_scope("a".into()).unwrap();
    let b = registry.create_scope("b".into()).unwrap();

    a.set("user", "alice".to_string()).unwrap();

    let from_b = b.resolve::<String>("user");
    assert!(
        matches!(from_b, Err(DiError::UnresolvedToken(token)) if token == Token::named("user"))
    );
    assert_eq!(a.resolve::<String>("user").unwrap().as_str(), "alice");

    registry.dispose_all();
}

#[test]
fn test_unbound_token_falls_through_to_defaults() {
    let registry = ScopeRegistry::new();
    registry.defaults().set("user", "anonymous".to_string());

    let a = registry.create_scope("a".into()).unwrap();
    let b = registry.create_scope("b".into()).unwrap();
    a.set("user", "alice".to_string()).unwrap();

    assert_eq!(a.resolve::<String>("user").unwrap().as_str(), "alice");
    assert_eq!(b.resolve::<String>("user").unwrap().as_str(), "anonymous");

    registry.dispose_all();
}

#[test]
fn test_dispose_removes_scope_from_registry() {
    let registry = ScopeRegistry::new();
    registry.create_scope("r1".into()).unwrap();

    assert!(registry.dispose_scope(&"r1".into()));
    assert!(matches!(
        registry.get_scope(&"r1".into()),
        Err(DiError::ScopeNotFound(id)) if id.as_str() == "r1"
    ));
}

#[test]
fn test_dispose_is_idempotent() {
    let registry = ScopeRegistry::new();
    registry.create_scope("r1".into()).unwrap();
    registry.create_scope("r2".into()).unwrap();

    assert!(registry.dispose_scope(&"r1".into()));
    assert!(!registry.dispose_scope(&"r1".into()));
    assert!(!registry.dispose_scope(&"never-created".into()));

    assert_eq!(registry.list_live_scope_ids(), vec!["r2".into()]);
    registry.dispose_all();
}

#[test]
fn test_duplicate_scope_is_rejected() {
    let registry = ScopeRegistry::new();
    let first = registry.create_scope("r1".into()).unwrap();
    first.set("marker", 1u32).unwrap();

    let err = registry.create_scope("r1".into()).unwrap_err();
    assert!(matches!(err, DiError::DuplicateScope(id) if id.as_str() == "r1"));

    // The live scope is untouched
    let live = registry.get_scope(&"r1".into()).unwrap();
    assert!(Arc::ptr_eq(&first, &live));
    assert_eq!(*live.resolve::<u32>("marker").unwrap(), 1);

    registry.dispose_all();
}

#[test]
fn test_scoped_factory_runs_once_per_container() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ScopeRegistry::new();
    let a = registry.create_scope("a".into()).unwrap();
    let b = registry.create_scope("b".into()).unwrap();
    a.register("n", counting_factory(&calls), Lifetime::Scoped).unwrap();
    b.register("n", counting_factory(&calls), Lifetime::Scoped).unwrap();

    let a1 = a.resolve::<usize>("n").unwrap();
    let a2 = a.resolve::<usize>("n").unwrap();
    assert!(Arc::ptr_eq(&a1, &a2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let b1 = b.resolve::<usize>("n").unwrap();
    let b2 = b.resolve::<usize>("n").unwrap();
    assert!(Arc::ptr_eq(&b1, &b2));
    assert!(!Arc::ptr_eq(&a1, &b1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    registry.dispose_all();
}

#[test]
fn test_transient_factory_runs_on_every_resolve() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    scope.register("n", counting_factory(&calls), Lifetime::Transient).unwrap();

    let values: Vec<usize> = (0..3).map(|_| *scope.resolve::<usize>("n").unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    registry.dispose_all();
}

#[test]
fn test_singleton_is_shared_across_scopes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ScopeRegistry::new();
    let a = registry.create_scope("a".into()).unwrap();
    let b = registry.create_scope("b".into()).unwrap();

    a.register("n", counting_factory(&calls), Lifetime::Singleton).unwrap();

    let from_a = a.resolve::<usize>("n").unwrap();
    let from_b = b.resolve::<usize>("n").unwrap();
    assert!(Arc::ptr_eq(&from_a, &from_b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(registry.defaults().contains("n"));

    // Singletons outlive the scope that registered them
    registry.dispose_scope(&"a".into());
    assert!(Arc::ptr_eq(&from_b, &b.resolve::<usize>("n").unwrap()));

    registry.dispose_all();
}

#[test]
fn test_scope_override_shadows_default_binding() {
    let registry = ScopeRegistry::new();
    registry.defaults().set("clock", 0u64);

    let scope = registry.create_scope("r1".into()).unwrap();
    assert_eq!(*scope.resolve::<u64>("clock").unwrap(), 0);

    scope.set("clock", 1_700_000_000u64).unwrap();
    assert_eq!(*scope.resolve::<u64>("clock").unwrap(), 1_700_000_000);

    let other = registry.create_scope("r2".into()).unwrap();
    assert_eq!(*other.resolve::<u64>("clock").unwrap(), 0);

    registry.dispose_all();
}

#[test]
fn test_disposed_container_rejects_use() {
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    scope.set("value", 1u8).unwrap();
    registry.dispose_scope(&"r1".into());

    assert!(scope.is_disposed());
    assert!(matches!(scope.resolve::<u8>("value"), Err(DiError::ContainerDisposed(_))));
    assert!(matches!(scope.set("value", 2u8), Err(DiError::ContainerDisposed(_))));
    assert!(!scope.contains("value"));
}

#[test]
fn test_factories_resolve_from_their_own_scope() {
    struct Greeting(String);

    let registry = ScopeRegistry::new();
    registry.defaults().register(
        Token::of::<Greeting>(),
        Provider::factory(|_| Greeting("hello, stranger".to_string())),
        Lifetime::Transient,
    );

    let scope = registry.create_scope("r1".into()).unwrap();
    scope.set("user", "alice".to_string()).unwrap();
    scope
        .register_scoped(Provider::try_factory(|r| {
            let user = r.resolve::<String>("user")?;
            Ok(Greeting(format!("hello, {}", user)))
        }))
        .unwrap();

    assert_eq!(scope.get::<Greeting>().unwrap().0, "hello, alice");

    let other = registry.create_scope("r2".into()).unwrap();
    assert_eq!(other.get::<Greeting>().unwrap().0, "hello, stranger");

    registry.dispose_all();
}

#[test]
fn test_symbol_tokens_do_not_collide() {
    let first = Token::symbol("cache");
    let second = Token::symbol("cache");

    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    scope.set(first.clone(), 1u32).unwrap();
    scope.set(second.clone(), 2u32).unwrap();

    assert_eq!(*scope.resolve::<u32>(&first).unwrap(), 1);
    assert_eq!(*scope.resolve::<u32>(&second).unwrap(), 2);
    assert!(scope.try_resolve::<u32>(Token::symbol("cache")).unwrap().is_none());

    registry.dispose_all();
}

#[test]
fn test_end_to_end_request_context_scenario() {
    let registry = ScopeRegistry::new();

    let r1 = registry.create_scope("r1".into()).unwrap();
    let r2 = registry.create_scope("r2".into()).unwrap();
    let ctx1 = RequestContext::new("r1".into(), r1.clone());
    let ctx2 = RequestContext::new("r2".into(), r2.clone());
    r1.set(CONTEXT_TOKEN, ctx1.clone()).unwrap();
    r2.set(CONTEXT_TOKEN, ctx2.clone()).unwrap();

    let resolved = r1.resolve::<RequestContext>(CONTEXT_TOKEN).unwrap();
    assert_eq!(resolved.request_id().as_str(), "r1");
    assert!(Arc::ptr_eq(resolved.container(), &r1));

    registry.dispose_scope(&"r1".into());
    assert!(matches!(registry.get_scope(&"r1".into()), Err(DiError::ScopeNotFound(_))));

    let still_live = registry.get_scope(&"r2".into()).unwrap();
    let resolved = RequestContext::current(&still_live).unwrap();
    assert_eq!(resolved.request_id().as_str(), "r2");
    assert!(Arc::ptr_eq(resolved.container(), &r2));
    assert_eq!(registry.list_live_scope_ids(), vec!["r2".into()]);

    registry.dispose_all();
}
