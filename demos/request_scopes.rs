//! Simulated request loop: every request gets a scope, resolvers pull their
//! dependencies from it, and the finalizer disposes it before "replying".
//!
//! Run with `RUST_LOG=debug cargo run --example request_scopes`.

use scoped_container::{
    ContextFactory, DefaultContainer, DiResult, Dispose, Lifetime, Provider, RegistryConfig,
    RequestContext, RequestScopeHooks, Resolver, ResponseFinalizer, ScopeRegistry,
    SequentialGenerator, Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ===== Domain Types =====

#[derive(Debug, Clone)]
struct Recipe {
    id: String,
    title: String,
}

struct RecipeStore {
    recipes: Vec<Recipe>,
}

impl RecipeStore {
    fn seeded() -> Self {
        let recipe = |id: &str, title: &str| Recipe {
            id: id.to_string(),
            title: title.to_string(),
        };
        Self {
            recipes: vec![
                recipe("1", "Pancakes"),
                recipe("2", "Shakshuka"),
                recipe("3", "Ramen"),
            ],
        }
    }
}

/// Per-request view over the store that counts its lookups.
struct RecipeService {
    store: Arc<RecipeStore>,
    request_id: String,
    lookups: AtomicUsize,
}

impl RecipeService {
    fn find(&self, id: &str) -> Option<Recipe> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.store.recipes.iter().find(|r| r.id == id).cloned()
    }
}

impl Dispose for RecipeService {
    fn dispose(&self) {
        tracing::info!(
            request = %self.request_id,
            lookups = self.lookups.load(Ordering::Relaxed),
            "recipe service released"
        );
    }
}

// ===== Resolvers =====

async fn recipe_resolver(ctx: &RequestContext, id: &str) -> DiResult<String> {
    let service = ctx.get::<RecipeService>()?;
    tokio::task::yield_now().await;
    Ok(match service.find(id) {
        Some(recipe) => format!("{} -> {}", ctx.request_id(), recipe.title),
        None => format!("{} -> recipe {} not found", ctx.request_id(), id),
    })
}

#[tokio::main]
async fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let defaults = Arc::new(DefaultContainer::new());
    defaults.register_singleton(Provider::value(RecipeStore::seeded()));
    defaults.register(
        Token::of::<RecipeService>(),
        Provider::try_factory(|r| {
            let store = r.get::<RecipeStore>()?;
            Ok(RecipeService {
                store,
                request_id: "default".to_string(),
                lookups: AtomicUsize::new(0),
            })
        }),
        Lifetime::Transient,
    );

    let config = RegistryConfig::from_env()?.with_live_scope_logging(true);
    let registry = Arc::new(ScopeRegistry::with_defaults(defaults.clone()).with_config(config));
    let hooks = RequestScopeHooks::new(registry.clone())
        .with_id_generator(SequentialGenerator::new("req"))
        .with_seed(|ctx| {
            let request_id = ctx.request_id().to_string();
            ctx.container().register_scoped(
                Provider::try_factory(move |r| {
                    Ok(RecipeService {
                        store: r.get::<RecipeStore>()?,
                        request_id: request_id.clone(),
                        lookups: AtomicUsize::new(0),
                    })
                })
                .disposable(),
            )
        });

    let mut requests = Vec::new();
    for id in ["1", "2", "3", "4"] {
        let hooks = hooks.clone();
        requests.push(tokio::spawn(async move {
            let ctx = hooks.create_context().await?;
            let result = recipe_resolver(&ctx, id).await;
            Ok::<_, scoped_container::DiError>(hooks.finalize(result, &ctx).await)
        }));
    }

    for request in requests {
        match request.await {
            Ok(Ok(Ok(reply))) => println!("{}", reply),
            Ok(Ok(Err(e))) | Ok(Err(e)) => eprintln!("request failed: {}", e),
            Err(e) => eprintln!("request task panicked: {}", e),
        }
    }

    tracing::info!(live = registry.live_scope_count(), "all requests finished");
    defaults.dispose_all().await;
    Ok(())
}
