use sqlx::Row;

use crate::{
    db::{Db, DbC},
    Error, Result,
};

#[derive(Debug)]
struct Migration {
    filename: &'static str,
    content: &'static str,
}

macro_rules! migration {
    ($filename:literal) => {
        Migration {
            filename: $filename,
            content: include_str!($filename),
        }
    };
}

pub async fn run(db: &Db) -> Result<()> {
    tracing::info!("running migrations");
    run_migration(db, migration!("000_init.sql")).await?;
    tracing::info!("migrations complete");
    Ok(())
}

async fn run_migration(db: &Db, migration: Migration) -> Result<()> {
    let filename = migration
        .filename
        .strip_suffix(".sql")
        .unwrap_or(migration.filename);
    let migration_name = filename
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(filename);

    tracing::info!("applying migration {}", migration_name);

    sqlx::query("CREATE TABLE IF NOT EXISTS migration (name TEXT PRIMARY KEY, content TEXT)")
        .execute(db)
        .await?;

    let existing = sqlx::query("SELECT content FROM migration WHERE name = ?")
        .bind(migration_name)
        .fetch_optional(db)
        .await?;
    if let Some(existing) = existing {
        let existing_content = existing.get::<String, _>(0);
        if existing_content == migration.content {
            tracing::info!("migration {} already applied", migration_name);
            return Ok(());
        } else {
            tracing::error!(
                "migration {} already applied with different content\n{}",
                migration_name,
                existing_content
            );
            return Err(Error::internal(format!(
                "migration {} already applied with different content",
                migration_name
            )));
        }
    }

    let mut tx = db.begin().await?;
    apply_statements(&mut tx, migration.content).await?;
    sqlx::query("INSERT INTO migration (name, content) VALUES (?, ?)")
        .bind(migration_name)
        .bind(migration.content)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

async fn apply_statements(db: &mut DbC, content: &str) -> Result<()> {
    for statement in content.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(&mut *db).await?;
    }
    Ok(())
}
