//! Persistence for the skills library.

use std::path::Path;

use {
    async_trait::async_trait,
    prompthub_common::time::now_ms,
    serde_json::Value,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::{
    error::{Context, Error, Result},
    types::{NewSkill, Skill, SkillPatch},
};

/// Storage for [`Skill`] records.
///
/// Names are unique ignoring case, but only at creation: a rename through
/// [`SkillStore::update`] is not checked.
#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Insert a new skill. Fails with [`Error::Conflict`] when a skill with
    /// the same name (ignoring case) exists.
    async fn create(&self, input: NewSkill) -> Result<Skill>;
    async fn get(&self, id: &str) -> Result<Option<Skill>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Skill>>;
    /// Most recently updated first.
    async fn list(&self) -> Result<Vec<Skill>>;
    /// `Ok(None)` when no skill has this id.
    async fn update(&self, id: &str, patch: SkillPatch) -> Result<Option<Skill>>;
    /// Whether a row was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Open (creating if needed) the SQLite database at `path`.
pub async fn open_pool(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database {}", path.display()))
}

/// Run database migrations for the skills crate.
///
/// Creates the `skills` table and indexes. Call before using
/// [`SqliteSkillStore`].
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}

/// Stores skills in a SQLite database.
pub struct SqliteSkillStore {
    pool: SqlitePool,
}

impl SqliteSkillStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn write(&self, skill: &Skill) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO skills (id, name, description, content, instructions, protocol_type, version, author, tags, is_favorite, source_url, registry_slug, is_builtin, prerequisites, compatibility, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 content = excluded.content,
                 instructions = excluded.instructions,
                 protocol_type = excluded.protocol_type,
                 version = excluded.version,
                 author = excluded.author,
                 tags = excluded.tags,
                 is_favorite = excluded.is_favorite,
                 source_url = excluded.source_url,
                 registry_slug = excluded.registry_slug,
                 is_builtin = excluded.is_builtin,
                 prerequisites = excluded.prerequisites,
                 compatibility = excluded.compatibility,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&skill.id)
        .bind(&skill.name)
        .bind(&skill.description)
        .bind(&skill.content)
        .bind(&skill.instructions)
        .bind(&skill.protocol_type)
        .bind(&skill.version)
        .bind(&skill.author)
        .bind(serde_json::to_string(&skill.tags)?)
        .bind(i32::from(skill.is_favorite))
        .bind(&skill.source_url)
        .bind(&skill.registry_slug)
        .bind(i32::from(skill.is_builtin))
        .bind(blob_to_text(skill.prerequisites.as_ref())?)
        .bind(blob_to_text(skill.compatibility.as_ref())?)
        .bind(skill.created_at)
        .bind(skill.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SkillStore for SqliteSkillStore {
    async fn create(&self, input: NewSkill) -> Result<Skill> {
        if self.find_by_name(&input.name).await?.is_some() {
            return Err(Error::Conflict { name: input.name });
        }
        let skill = input.into_skill(uuid::Uuid::new_v4().to_string(), now_ms());
        self.write(&skill).await?;
        debug!(id = %skill.id, name = %skill.name, "skill created");
        Ok(skill)
    }

    async fn get(&self, id: &str) -> Result<Option<Skill>> {
        let row = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Skill::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Skill>> {
        let row = sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills WHERE name = ? COLLATE NOCASE ORDER BY created_at LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Skill::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Skill>> {
        let rows = sqlx::query_as::<_, SkillRow>(
            "SELECT * FROM skills ORDER BY updated_at DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Skill::try_from).collect()
    }

    async fn update(&self, id: &str, patch: SkillPatch) -> Result<Option<Skill>> {
        let Some(mut skill) = self.get(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut skill, now_ms());
        self.write(&skill).await?;
        Ok(Some(skill))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM skills WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn blob_to_text(value: Option<&Value>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Into::into)
}

fn text_to_blob(text: Option<String>) -> Result<Option<Value>> {
    text.map(|t| serde_json::from_str(&t))
        .transpose()
        .map_err(Into::into)
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct SkillRow {
    id: String,
    name: String,
    description: String,
    content: String,
    instructions: String,
    protocol_type: String,
    version: String,
    author: String,
    tags: String,
    is_favorite: i32,
    source_url: Option<String>,
    registry_slug: Option<String>,
    is_builtin: i32,
    prerequisites: Option<String>,
    compatibility: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SkillRow> for Skill {
    type Error = Error;

    fn try_from(r: SkillRow) -> Result<Self> {
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            content: r.content,
            instructions: r.instructions,
            protocol_type: r.protocol_type,
            version: r.version,
            author: r.author,
            tags: serde_json::from_str(&r.tags)?,
            is_favorite: r.is_favorite != 0,
            source_url: r.source_url,
            registry_slug: r.registry_slug,
            is_builtin: r.is_builtin != 0,
            prerequisites: text_to_blob(r.prerequisites)?,
            compatibility: text_to_blob(r.compatibility)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// In-memory single-connection store for tests.
#[allow(clippy::expect_used)]
#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteSkillStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    SqliteSkillStore::new(pool)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn new_skill(name: &str) -> NewSkill {
        NewSkill {
            name: name.into(),
            description: "desc".into(),
            content: Some("body".into()),
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let store = memory_store().await;
        let created = store
            .create(NewSkill {
                prerequisites: Some(json!({"bins": ["jq"]})),
                ..new_skill("alpha")
            })
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.content, fetched.instructions);
        assert_eq!(fetched.tags, vec!["a", "b"]);
        assert_eq!(fetched.prerequisites, Some(json!({"bins": ["jq"]})));
        assert!(fetched.compatibility.is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_uuids() {
        let store = memory_store().await;
        let a = store.create(new_skill("a")).await.unwrap();
        let b = store.create(new_skill("b")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_ignoring_case() {
        let store = memory_store().await;
        store.create(new_skill("dup")).await.unwrap();
        let err = store.create(new_skill("DUP")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { ref name } if name == "DUP"));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_name_ignores_case() {
        let store = memory_store().await;
        let created = store.create(new_skill("mixed")).await.unwrap();
        let found = store.find_by_name("MiXeD").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_name("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_applies_patch_and_keeps_body_in_sync() {
        let store = memory_store().await;
        let created = store.create(new_skill("edit")).await.unwrap();

        let updated = store
            .update(&created.id, SkillPatch {
                instructions: Some("rewritten".into()),
                is_favorite: Some(true),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "rewritten");
        assert_eq!(updated.instructions, "rewritten");
        assert!(updated.is_favorite);
        assert_eq!(updated.description, "desc");
        assert!(updated.updated_at >= created.updated_at);

        let stored = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn rename_is_not_checked_for_uniqueness() {
        let store = memory_store().await;
        store.create(new_skill("first")).await.unwrap();
        let second = store.create(new_skill("second")).await.unwrap();
        let renamed = store
            .update(&second.id, SkillPatch {
                name: Some("first".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(renamed.is_some());
    }

    #[tokio::test]
    async fn update_and_delete_missing_ids() {
        let store = memory_store().await;
        assert!(
            store
                .update("nope", SkillPatch::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete("nope").await.unwrap());

        let created = store.create(new_skill("gone")).await.unwrap();
        assert!(store.delete(&created.id).await.unwrap());
        assert!(store.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_pool_creates_database_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("prompthub.db");
        let pool = open_pool(&path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(path.exists());
    }
}
