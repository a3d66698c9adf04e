//! Migrate command implementation

use crate::adapters::database::Database;
use crate::adapters::factory::create_database;
use crate::config::load_config;
use crate::core::templates::TemplateService;
use clap::Args;
use std::sync::Arc;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Skip inserting the built-in default templates
    #[arg(long)]
    pub no_seed: bool,
}

impl MigrateArgs {
    /// Execute the migrate command
    ///
    /// Applies the schema regardless of `postgresql.run_migrations`.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("🔄 Applying database schema");
        let database = match create_database(&config).await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("Failed to connect to database: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        self.run(database).await
    }

    pub(crate) async fn run(&self, database: Arc<dyn Database>) -> anyhow::Result<i32> {
        if let Err(e) = database.ensure_schema().await {
            tracing::error!(error = %e, "Schema migration failed");
            println!("❌ Schema migration failed: {e}");
            return Ok(5);
        }
        println!("✅ Schema is up to date ({})", database.backend_name());

        if self.no_seed {
            return Ok(0);
        }

        match TemplateService::new(database).seed_defaults().await {
            Ok(created) => {
                println!("✅ Seeded {created} default template(s)");
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Seeding default templates failed");
                println!("❌ Seeding default templates failed: {e}");
                Ok(5)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::TemplateRepository;
    use crate::adapters::memory::MemoryDatabase;

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let args = MigrateArgs { no_seed: false };

        assert_eq!(args.run(db.clone()).await.unwrap(), 0);
        assert_eq!(args.run(db.clone()).await.unwrap(), 0);

        let defaults = db.list_default_templates("Gynecology").await.unwrap();
        assert_eq!(defaults.len(), 1);
    }
}
