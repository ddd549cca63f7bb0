//! Application state - shared across all handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use yatube_core::domain::NewGroup;
use yatube_core::ports::{
    CommentRepository, GroupRepository, PasswordService, PostRepository, TokenService,
    UserRepository,
};
use yatube_infra::{
    Argon2PasswordService, InMemoryCommentRepository, InMemoryGroupRepository,
    InMemoryPostRepository, InMemoryUserRepository, JwtTokenService, MemoryStore,
};

#[cfg(feature = "postgres")]
use yatube_infra::database::{
    DatabaseConfig, DatabaseConnections, PostgresCommentRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository,
};

use crate::config::{AppConfig, SiteSettings};
use crate::templates::Templates;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub templates: Arc<Templates>,
    pub settings: Arc<SiteSettings>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let templates = Arc::new(
            Templates::load(&config.templates_dir)
                .with_context(|| format!("loading templates from {}", config.templates_dir))?,
        );
        let settings = Arc::new(config.site.clone());
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());

        #[cfg(feature = "postgres")]
        let state = match config.database.as_ref() {
            Some(db_config) => match Self::connect(config, db_config).await {
                Ok(connections) => Self::postgres(connections, templates, settings, tokens),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {:#}. Using in-memory fallback.",
                        e
                    );
                    Self::in_memory(templates, settings, tokens)
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Self::in_memory(templates, settings, tokens)
            }
        };

        #[cfg(not(feature = "postgres"))]
        let state = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Self::in_memory(templates, settings, tokens)
        };

        if let Some(path) = &config.seed_groups_file {
            state.seed_groups(path).await?;
        }

        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Open the pool and bring the schema up to date.
    #[cfg(feature = "postgres")]
    async fn connect(
        config: &AppConfig,
        db_config: &DatabaseConfig,
    ) -> anyhow::Result<DatabaseConnections> {
        use migration::MigratorTrait;

        let connections = DatabaseConnections::init(db_config)
            .await
            .context("connecting to the database")?;
        if config.run_migrations {
            migration::Migrator::up(&connections.main, None)
                .await
                .context("applying migrations")?;
            tracing::info!("Migrations applied");
        }
        Ok(connections)
    }

    #[cfg(feature = "postgres")]
    fn postgres(
        connections: DatabaseConnections,
        templates: Arc<Templates>,
        settings: Arc<SiteSettings>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let db = connections.main;
        Self {
            users: Arc::new(PostgresUserRepository::new(db.clone())),
            groups: Arc::new(PostgresGroupRepository::new(db.clone())),
            posts: Arc::new(PostgresPostRepository::new(db.clone())),
            comments: Arc::new(PostgresCommentRepository::new(db)),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            templates,
            settings,
        }
    }

    /// State backed by a fresh in-process store.
    pub fn in_memory(
        templates: Arc<Templates>,
        settings: Arc<SiteSettings>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            groups: Arc::new(InMemoryGroupRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(store)),
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            templates,
            settings,
        }
    }

    /// Create the groups listed in a JSON file, skipping slugs that exist.
    ///
    /// ```json
    /// [{"title": "Cats", "slug": "cats", "description": "All about cats"}]
    /// ```
    pub async fn seed_groups(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let entries: Vec<NewGroup> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        let mut created = 0;
        for entry in entries {
            let group = match NewGroup::new(&entry.title, &entry.slug, &entry.description) {
                Ok(group) => group,
                Err(e) => {
                    tracing::warn!(slug = %entry.slug, "Skipping group: {}", e);
                    continue;
                }
            };
            if self.groups.find_by_slug(&group.slug).await?.is_some() {
                tracing::debug!(slug = %group.slug, "Group exists, skipping");
                continue;
            }
            self.groups.create(group).await?;
            created += 1;
        }

        tracing::info!(created, file = %path.display(), "Groups seeded");
        Ok(created)
    }
}
