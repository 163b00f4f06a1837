//! PostgreSQL store: schema DDL plus the `Store` operations over the SQL builder.

use crate::error::{AppError, ConfigError};
use crate::model::{Contact, ContactFields, PhoneNumber, PhoneNumberChanges};
use crate::sql::{self, Condition, PgBindValue, QueryBuf, CONTACTS, PHONE_NUMBERS};
use crate::store::{Listing, PhoneNumberFilter, SortField, Store, Window};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, FromRow, PgPool};
use std::str::FromStr;

const SCHEMA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "contacts" (
        "id" BIGSERIAL PRIMARY KEY,
        "name_first" VARCHAR NOT NULL,
        "name_last" VARCHAR NOT NULL,
        "email" VARCHAR,
        "twitter" VARCHAR,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "phone_numbers" (
        "id" BIGSERIAL PRIMARY KEY,
        "contact_id" BIGINT REFERENCES "contacts" ("id") ON DELETE CASCADE,
        "name" VARCHAR,
        "phone_number" VARCHAR,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS "index_phone_numbers_on_contact_id" ON "phone_numbers" ("contact_id")"#,
];

/// Create the `contacts` and `phone_numbers` tables if they do not exist. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in SCHEMA_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Create the database named in `database_url` if it does not exist, via the `postgres` maintenance db.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url).map_err(|e| ConfigError::InvalidSetting {
        name: "DATABASE_URL",
        reason: e.to_string(),
    })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "\"\"")))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url.rfind('/').ok_or_else(|| ConfigError::InvalidSetting {
        name: "DATABASE_URL",
        reason: "no database path".into(),
    })? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_all<T>(&self, q: &QueryBuf) -> Result<Vec<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_optional<T>(&self, q: &QueryBuf) -> Result<Option<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn count(&self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn delete_by_id(&self, table: &sql::Table, id: i64) -> Result<bool, AppError> {
        let mut q = sql::delete(table);
        q.params.push(PgBindValue::I64(id));
        let deleted: Option<(i64,)> = self.fetch_optional(&q).await?;
        Ok(deleted.is_some())
    }

    async fn list<T>(
        &self,
        table: &sql::Table,
        conditions: &[Condition],
        sort: &[SortField],
        window: Window,
    ) -> Result<Listing<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let records = self.fetch_all(&sql::select_list(table, conditions, sort, window)).await?;
        let total = self.count(&sql::count(table, conditions)).await?;
        Ok(Listing { records, total })
    }
}

fn ids_condition(column: &'static str, ids: &[i64]) -> Condition {
    Condition {
        column,
        values: ids.iter().copied().map(PgBindValue::I64).collect(),
    }
}

fn contact_values(fields: &ContactFields) -> Vec<(&'static str, PgBindValue)> {
    vec![
        ("name_first", PgBindValue::Text(fields.name_first.clone())),
        ("name_last", PgBindValue::Text(fields.name_last.clone())),
        ("email", fields.email.clone().into()),
        ("twitter", fields.twitter.clone().into()),
    ]
}

fn phone_number_values(changes: &PhoneNumberChanges) -> Vec<(&'static str, PgBindValue)> {
    let mut values = Vec::new();
    if let Some(v) = changes.contact_id {
        values.push(("contact_id", v.into()));
    }
    if let Some(v) = &changes.name {
        values.push(("name", v.clone().into()));
    }
    if let Some(v) = &changes.phone_number {
        values.push(("phone_number", v.clone().into()));
    }
    values
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_contacts(&self, sort: &[SortField], window: Window) -> Result<Listing<Contact>, AppError> {
        self.list(&CONTACTS, &[], sort, window).await
    }

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, AppError> {
        let mut q = sql::select_by_id(&CONTACTS);
        q.params.push(PgBindValue::I64(id));
        self.fetch_optional(&q).await
    }

    async fn find_contacts(&self, ids: &[i64]) -> Result<Vec<Contact>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_list(&CONTACTS, &[ids_condition("id", ids)], &[], Window::default());
        self.fetch_all(&q).await
    }

    async fn insert_contact(&self, fields: &ContactFields) -> Result<Contact, AppError> {
        let q = sql::insert(&CONTACTS, contact_values(fields));
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update_contact(&self, id: i64, fields: &ContactFields) -> Result<Option<Contact>, AppError> {
        self.fetch_optional(&sql::update(&CONTACTS, id, contact_values(fields))).await
    }

    async fn delete_contact(&self, id: i64) -> Result<bool, AppError> {
        self.delete_by_id(&CONTACTS, id).await
    }

    async fn list_phone_numbers(
        &self,
        filter: &PhoneNumberFilter,
        sort: &[SortField],
        window: Window,
    ) -> Result<Listing<PhoneNumber>, AppError> {
        let conditions: Vec<Condition> = filter
            .contact_ids
            .as_deref()
            .map(|ids| vec![ids_condition("contact_id", ids)])
            .unwrap_or_default();
        self.list(&PHONE_NUMBERS, &conditions, sort, window).await
    }

    async fn phone_numbers_for_contacts(&self, contact_ids: &[i64]) -> Result<Vec<PhoneNumber>, AppError> {
        if contact_ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = sql::select_list(
            &PHONE_NUMBERS,
            &[ids_condition("contact_id", contact_ids)],
            &[],
            Window::default(),
        );
        self.fetch_all(&q).await
    }

    async fn find_phone_number(&self, id: i64) -> Result<Option<PhoneNumber>, AppError> {
        let mut q = sql::select_by_id(&PHONE_NUMBERS);
        q.params.push(PgBindValue::I64(id));
        self.fetch_optional(&q).await
    }

    async fn insert_phone_number(&self, changes: &PhoneNumberChanges) -> Result<PhoneNumber, AppError> {
        let q = sql::insert(&PHONE_NUMBERS, phone_number_values(changes));
        self.fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update_phone_number(
        &self,
        id: i64,
        changes: &PhoneNumberChanges,
    ) -> Result<Option<PhoneNumber>, AppError> {
        self.fetch_optional(&sql::update(&PHONE_NUMBERS, id, phone_number_values(changes)))
            .await
    }

    async fn delete_phone_number(&self, id: i64) -> Result<bool, AppError> {
        self.delete_by_id(&PHONE_NUMBERS, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_targets_postgres_db() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/contacts?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "contacts");
    }

    #[test]
    fn absent_phone_number_fields_are_not_written() {
        let values = phone_number_values(&PhoneNumberChanges {
            name: Some(Some("cell".into())),
            ..PhoneNumberChanges::default()
        });
        assert_eq!(values, vec![("name", PgBindValue::Text("cell".into()))]);
    }
}
