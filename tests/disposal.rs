use async_trait::async_trait;
use scoped_container::{
    AsyncDispose, DefaultContainer, Dispose, Lifetime, Provider, Resolver, ResolverCore,
    ScopeRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Tracked {
    name: &'static str,
    log: Log,
}

impl Dispose for Tracked {
    fn dispose(&self) {
        self.log.lock().unwrap().push(format!("sync:{}", self.name));
    }
}

#[async_trait]
impl AsyncDispose for Tracked {
    async fn dispose(&self) {
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(format!("async:{}", self.name));
    }
}

fn tracked(name: &'static str, log: &Log) -> Provider<Tracked> {
    let log = log.clone();
    Provider::factory(move |_| Tracked { name, log: log.clone() }).disposable()
}

#[test]
fn test_teardowns_run_in_reverse_resolution_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    scope.register("first", tracked("first", &log), Lifetime::Scoped).unwrap();
    scope.register("second", tracked("second", &log), Lifetime::Scoped).unwrap();
    scope.register("third", tracked("third", &log), Lifetime::Scoped).unwrap();

    scope.resolve::<Tracked>("first").unwrap();
    scope.resolve::<Tracked>("second").unwrap();
    scope.resolve::<Tracked>("third").unwrap();
    assert!(log.lock().unwrap().is_empty());

    registry.dispose_scope(&"r1".into());
    assert_eq!(*log.lock().unwrap(), vec!["sync:third", "sync:second", "sync:first"]);

    // A second dispose runs nothing
    registry.dispose_scope(&"r1".into());
    scope.dispose();
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[test]
fn test_unresolved_and_transient_bindings_are_not_torn_down() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    scope.register("never", tracked("never", &log), Lifetime::Scoped).unwrap();
    scope.register("each", tracked("each", &log), Lifetime::Transient).unwrap();
    scope.resolve::<Tracked>("each").unwrap();

    registry.dispose_scope(&"r1".into());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_value_providers_with_teardown_run_on_dispose() {
    let torn_down = Arc::new(AtomicUsize::new(0));
    let counter = torn_down.clone();

    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    scope
        .register(
            "buffer",
            Provider::value(vec![1u8, 2, 3]).with_teardown(move |buffer: &Vec<u8>| {
                counter.fetch_add(buffer.len(), Ordering::SeqCst);
            }),
            Lifetime::Scoped,
        )
        .unwrap();

    registry.dispose_scope(&"r1".into());
    assert_eq!(torn_down.load(Ordering::SeqCst), 3);
}

#[test]
fn test_overwritten_binding_keeps_teardown_of_resolved_instance() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    scope.register("svc", tracked("old", &log), Lifetime::Scoped).unwrap();
    scope.resolve::<Tracked>("svc").unwrap();
    scope.register("svc", tracked("new", &log), Lifetime::Scoped).unwrap();
    assert_eq!(scope.resolve::<Tracked>("svc").unwrap().name, "new");

    registry.dispose_scope(&"r1".into());
    assert_eq!(*log.lock().unwrap(), vec!["sync:new", "sync:old"]);
}

#[test]
fn test_panicking_teardown_does_not_stop_the_rest() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    scope.register("first", tracked("first", &log), Lifetime::Scoped).unwrap();
    scope
        .register(
            "broken",
            Provider::value(0u8).with_teardown(|_| panic!("teardown failed")),
            Lifetime::Scoped,
        )
        .unwrap();
    scope.register("last", tracked("last", &log), Lifetime::Scoped).unwrap();
    scope.resolve::<Tracked>("first").unwrap();
    scope.resolve::<Tracked>("last").unwrap();

    registry.dispose_scope(&"r1".into());
    assert_eq!(*log.lock().unwrap(), vec!["sync:last", "sync:first"]);
    assert_eq!(registry.live_scope_count(), 0);
}

#[test]
fn test_factory_registered_disposers_run_on_dispose() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    let factory_log = log.clone();
    scope
        .register(
            "conn",
            Provider::factory(move |r| {
                let conn = Arc::new(Tracked { name: "conn", log: factory_log.clone() });
                r.register_disposer(conn.clone());
                "conn".to_string()
            }),
            Lifetime::Scoped,
        )
        .unwrap();
    scope.resolve::<String>("conn").unwrap();

    registry.dispose_scope(&"r1".into());
    assert_eq!(*log.lock().unwrap(), vec!["sync:conn"]);
}

#[tokio::test]
async fn test_async_teardowns_run_before_sync_ones() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    scope.register("sync", tracked("sync", &log), Lifetime::Scoped).unwrap();
    scope.resolve::<Tracked>("sync").unwrap();

    for name in ["a", "b"] {
        let service = Arc::new(Tracked { name, log: log.clone() });
        scope.register_async_disposer(service);
    }

    assert!(registry.dispose_scope_async(&"r1".into()).await);
    assert_eq!(*log.lock().unwrap(), vec!["async:b", "async:a", "sync:sync"]);
    assert!(!registry.dispose_scope_async(&"r1".into()).await);
}

#[test]
fn test_sync_dispose_skips_async_teardowns() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    scope.register_async_disposer(Arc::new(Tracked { name: "skipped", log: log.clone() }));
    scope.register_disposer(Arc::new(Tracked { name: "kept", log: log.clone() }));

    registry.dispose_scope(&"r1".into());
    assert_eq!(*log.lock().unwrap(), vec!["sync:kept"]);
}

#[test]
fn test_teardown_after_dispose_runs_immediately() {
    let ran = Arc::new(AtomicUsize::new(0));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();
    registry.dispose_scope(&"r1".into());

    let counter = ran.clone();
    scope.push_sync_disposer(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_singleton_teardowns_run_when_defaults_are_disposed() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let defaults = Arc::new(DefaultContainer::new());
    defaults.register("pool", tracked("pool", &log), Lifetime::Singleton);

    let registry = ScopeRegistry::with_defaults(defaults.clone());
    let scope = registry.create_scope("r1".into()).unwrap();
    let first = scope.resolve::<Tracked>("pool").unwrap();

    // Disposing the scope leaves singletons alone
    registry.dispose_scope(&"r1".into());
    assert!(log.lock().unwrap().is_empty());

    defaults.dispose_all().await;
    assert_eq!(*log.lock().unwrap(), vec!["sync:pool"]);

    let rebuilt = defaults.resolve::<Tracked>("pool").unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
}

#[test]
fn test_instance_built_while_binding_is_replaced_is_still_torn_down() {
    let torn_down = Arc::new(AtomicUsize::new(0));
    let registry = ScopeRegistry::new();
    let scope = registry.create_scope("r1".into()).unwrap();

    let counter = torn_down.clone();
    let same_scope = scope.clone();
    scope
        .register(
            "svc",
            Provider::factory(move |_| {
                // Rebinds the token while the first instance is still being built
                same_scope.set("svc", 99u32).unwrap();
                1u32
            })
            .with_teardown(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            Lifetime::Scoped,
        )
        .unwrap();

    assert_eq!(*scope.resolve::<u32>("svc").unwrap(), 1);
    assert_eq!(*scope.resolve::<u32>("svc").unwrap(), 99);

    registry.dispose_scope(&"r1".into());
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}
