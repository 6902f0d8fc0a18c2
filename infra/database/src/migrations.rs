use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

#[derive(Debug, SurrealValue)]
pub(crate) struct Permissions {
    pub slice: &'static str,
    pub permissions: Vec<&'static str>,
}

impl Permissions {
    #[must_use]
    pub(crate) const fn new(slice: &'static str, permissions: Vec<&'static str>) -> Self {
        Self { slice, permissions }
    }
}

#[derive(Debug)]
pub(crate) struct Migration {
    pub slice_key: &'static str,
    pub slice_name: &'static str,
    pub slice_description: Option<&'static str>,
    pub version: &'static str,
    pub script: &'static str,
    pub checksum: String,
    pub is_bootstrap: bool,
}

impl Migration {
    /// Builds a migration entry, hashing `script` with SHA-256 for the
    /// checksum the runner later compares against what was recorded at
    /// apply time.
    ///
    /// There is no `xtask`-style codegen step in this workspace — the
    /// manifest below is hand-written, so the checksum is computed here at
    /// call time instead of baked in by a build tool.
    #[must_use]
    pub(crate) fn new(
        slice_key: &'static str,
        slice_name: &'static str,
        slice_description: Option<&'static str>,
        version: &'static str,
        script: &'static str,
        is_bootstrap: bool,
    ) -> Self {
        let checksum = hex::encode(Sha256::digest(script.as_bytes()));
        Self { slice_key, slice_name, slice_description, version, script, checksum, is_bootstrap }
    }

    fn to_applied(&self) -> AppliedMigration {
        AppliedMigration {
            slice_key: self.slice_key.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum.to_owned(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct AppliedMigration {
    pub slice_key: String,
    pub version: String,
    pub checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner {
    db: Surreal<Any>,
}

impl MigrationRunner {
    #[must_use]
    pub(crate) const fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }
    pub(crate) async fn run(&self) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let migrations = builtin_migrations();
        let applied_migrations = self.get_migrations_map().await?;

        for migration in migrations {
            if let Some(applied) =
                applied_migrations.get(&format!("{}:{}", migration.slice_key, migration.version))
            {
                ensure_checksum_match(&migration, &applied.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply_migration(&migration).await?;
            report.applied.push(migration.to_applied());
        }

        self.sync_permissions().await?;

        Ok(report)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = if migration.is_bootstrap {
            format!(
                "BEGIN TRANSACTION;
                {}
                fn::ensure_slice($slice, $name, $description);
                RETURN fn::confirm_migration($slice, $version, $checksum);
                COMMIT TRANSACTION;",
                migration.script,
            )
        } else {
            format!(
                "BEGIN TRANSACTION;
                fn::ensure_slice($slice, $name, $description);
                {}
                RETURN fn::confirm_migration($slice, $version, $checksum);
                COMMIT TRANSACTION;",
                migration.script,
            )
        };

        let _ = self
            .db
            .query(&query)
            .bind(("slice", migration.slice_key))
            .bind(("name", migration.slice_name))
            .bind(("description", migration.slice_description))
            .bind(("version", migration.version))
            .bind(("checksum", migration.checksum.clone()))
            .await
            .context(format!(
                "SQL execution failed at {}:{}",
                migration.slice_key, migration.version
            ))?;

        Ok(())
    }

    async fn is_system_ready(&self) -> Result<bool, DatabaseError> {
        let mut response = self
            .db
            .query("!(SELECT VALUE fields FROM ONLY INFO FOR TABLE slice).is_empty()")
            .await
            .context("Checking if system is ready")?;

        let is_ready = response.take::<Option<bool>>(0)?.unwrap_or_default();
        Ok(is_ready)
    }

    async fn get_migrations_map(
        &self,
    ) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let is_ready = self.is_system_ready().await?;

        if !is_ready {
            return Ok(FxHashMap::default());
        }

        let entries = self
            .db
            .query("SELECT id[0].id() as slice_key, version, checksum FROM migration")
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(0)
            .context("Parsing migrations map")?;

        Ok(entries
            .into_iter()
            .map(|entry| (format!("{}:{}", entry.slice_key, entry.version), entry))
            .collect())
    }

    pub(crate) async fn sync_permissions(&self) -> Result<(), DatabaseError> {
        let registry = builtin_registry();

        self.db
            .query("fn::sync_permissions($registry)")
            .bind(("registry", registry))
            .await?
            .check()
            .map_err(surrealdb::Error::from)?;

        Ok(())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    if existing != migration.checksum {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {}:{} (expected {}, got {})",
                migration.slice_key, migration.version, existing, migration.checksum
            )
            .into(),
            context: Some("Migration already applied with different checksum".into()),
        });
    }
    Ok(())
}

const BOOTSTRAP_SCRIPT: &str = "
DEFINE TABLE IF NOT EXISTS slice SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON slice TYPE string;
DEFINE FIELD IF NOT EXISTS description ON slice TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON slice TYPE datetime DEFAULT time::now();

DEFINE TABLE IF NOT EXISTS migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON migration TYPE string;
DEFINE FIELD IF NOT EXISTS checksum ON migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON migration TYPE datetime DEFAULT time::now();

DEFINE FUNCTION IF NOT EXISTS fn::ensure_slice($slice: string, $name: string, $description: option<string>) {
    UPSERT type::thing('slice', $slice) SET name = $name, description = $description;
};

DEFINE FUNCTION IF NOT EXISTS fn::confirm_migration($slice: string, $version: string, $checksum: string) {
    UPSERT type::thing('migration', $slice) SET version = $version, checksum = $checksum;
    RETURN true;
};

DEFINE FUNCTION IF NOT EXISTS fn::sync_permissions($registry: array<object>) {
    RETURN true;
};
";

const IDENTITY_SCRIPT: &str = "
DEFINE TABLE IF NOT EXISTS users SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS login ON users TYPE string;
DEFINE FIELD IF NOT EXISTS created_at ON users TYPE datetime DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS users_login_unique ON users FIELDS login UNIQUE;

DEFINE TABLE IF NOT EXISTS passwords SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS user ON passwords TYPE record<users>;
DEFINE FIELD IF NOT EXISTS hash ON passwords TYPE string;
DEFINE INDEX IF NOT EXISTS passwords_user_unique ON passwords FIELDS user UNIQUE;
";

const SECRETS_SCRIPT: &str = "
DEFINE TABLE IF NOT EXISTS cards SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON cards TYPE string;
DEFINE FIELD IF NOT EXISTS user ON cards TYPE record<users>;
DEFINE FIELD IF NOT EXISTS payload ON cards TYPE bytes;
DEFINE INDEX IF NOT EXISTS cards_name_user_unique ON cards FIELDS name, user UNIQUE;

DEFINE TABLE IF NOT EXISTS logincreds SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON logincreds TYPE string;
DEFINE FIELD IF NOT EXISTS user ON logincreds TYPE record<users>;
DEFINE FIELD IF NOT EXISTS payload ON logincreds TYPE bytes;
DEFINE INDEX IF NOT EXISTS logincreds_name_user_unique ON logincreds FIELDS name, user UNIQUE;

DEFINE TABLE IF NOT EXISTS notes SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON notes TYPE string;
DEFINE FIELD IF NOT EXISTS user ON notes TYPE record<users>;
DEFINE FIELD IF NOT EXISTS payload ON notes TYPE bytes;
DEFINE INDEX IF NOT EXISTS notes_name_user_unique ON notes FIELDS name, user UNIQUE;

DEFINE TABLE IF NOT EXISTS binaries SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON binaries TYPE string;
DEFINE FIELD IF NOT EXISTS user ON binaries TYPE record<users>;
DEFINE FIELD IF NOT EXISTS payload ON binaries TYPE bytes;
DEFINE INDEX IF NOT EXISTS binaries_name_user_unique ON binaries FIELDS name, user UNIQUE;

DEFINE EVENT IF NOT EXISTS users_cascade_delete ON TABLE users WHEN $event = 'DELETE' THEN {
    DELETE cards WHERE user = $before.id;
    DELETE logincreds WHERE user = $before.id;
    DELETE notes WHERE user = $before.id;
    DELETE binaries WHERE user = $before.id;
    DELETE passwords WHERE user = $before.id;
};
";

/// The hand-written migration manifest. There is no `.surql`/codegen pipeline
/// in this workspace, so each script lives here as a string literal and its
/// checksum is computed at call time rather than baked in by a build step.
fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration::new("engine", "Engine", Some("Core slice and migration bookkeeping"), "1", BOOTSTRAP_SCRIPT, true),
        Migration::new("identity", "Identity", Some("User accounts and password hashes"), "1", IDENTITY_SCRIPT, false),
        Migration::new("secrets", "Secrets", Some("Encrypted item storage"), "1", SECRETS_SCRIPT, false),
    ]
}

/// No slice in this workspace defines field-level permission profiles — user
/// scoping through [`crate::Database::authenticate`] is the access boundary —
/// so `fn::sync_permissions` is a no-op and this registry is always empty.
fn builtin_registry() -> Vec<Permissions> {
    Vec::new()
}
