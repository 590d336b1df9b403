use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use crate::models::{
    Garment, MeasurementRecord, MeasurementSlot, MeasurementValue, NewMeasurementRecord,
    NewSizeRule, RuleTable, SizeCount, SizeRule, SlotLayout,
};
use crate::services::store::{CatalogStore, RecordStore, StoreError};

/// PostgreSQL adapter for the catalog and the measurement records
///
/// Rule order is the `position` column, a sequence value assigned on
/// insert, so removals never reorder the remaining rules.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Close the pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }

    async fn ensure_garment(&self, garment_id: Uuid) -> Result<(), StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM garments WHERE id = $1)")
            .bind(garment_id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(StoreError::garment_not_found(garment_id))
        }
    }

    async fn record_values(
        &self,
        record_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<MeasurementValue>>, StoreError> {
        let query = r#"
            SELECT record_id, measure_key, value
            FROM measurement_values
            WHERE record_id = ANY($1)
            ORDER BY record_id, position
        "#;

        let rows = sqlx::query(query)
            .bind(record_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut values: HashMap<Uuid, Vec<MeasurementValue>> = HashMap::new();
        for row in rows {
            values
                .entry(row.get("record_id"))
                .or_default()
                .push(MeasurementValue {
                    measure_key: row.get("measure_key"),
                    value: row.get("value"),
                });
        }
        Ok(values)
    }
}

fn garment_from_row(row: &sqlx::postgres::PgRow) -> Garment {
    Garment {
        id: row.get("id"),
        key: row.get("key"),
        description: row.get("description"),
        category: row.get("category"),
    }
}

fn rule_from_row(row: &sqlx::postgres::PgRow) -> SizeRule {
    SizeRule {
        id: row.get("id"),
        garment_id: row.get("garment_id"),
        measure_key: row.get("measure_key"),
        label: row.get("label"),
        min_value: row.get("min_value"),
        max_value: row.get("max_value"),
        priority: row.get("priority"),
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn garment(&self, garment_id: Uuid) -> Result<Garment, StoreError> {
        let query = r#"
            SELECT id, key, description, category
            FROM garments
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(garment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::garment_not_found(garment_id))?;

        Ok(garment_from_row(&row))
    }

    async fn garments(&self, garment_ids: &[Uuid]) -> Result<Vec<Garment>, StoreError> {
        let query = r#"
            SELECT id, key, description, category
            FROM garments
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query)
            .bind(garment_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(garment_from_row).collect())
    }

    async fn company_garments(&self, company_id: Uuid) -> Result<Vec<Garment>, StoreError> {
        let query = r#"
            SELECT g.id, g.key, g.description, g.category
            FROM garments g
            JOIN company_garments cg ON cg.garment_id = g.id
            WHERE cg.company_id = $1
            ORDER BY g.key
        "#;

        let rows = sqlx::query(query)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(garment_from_row).collect())
    }

    async fn slots(&self, garment_id: Uuid) -> Result<SlotLayout, StoreError> {
        self.ensure_garment(garment_id).await?;

        let query = r#"
            SELECT slot, measure_key
            FROM measurement_slots
            WHERE garment_id = $1
            ORDER BY slot
        "#;

        let rows = sqlx::query(query)
            .bind(garment_id)
            .fetch_all(&self.pool)
            .await?;

        let slots = rows
            .iter()
            .map(|row| {
                let slot: i16 = row.get("slot");
                MeasurementSlot {
                    slot: slot as u16,
                    measure_key: row.get("measure_key"),
                }
            })
            .collect();

        Ok(SlotLayout::from_slots(slots))
    }

    async fn rules(&self, garment_id: Uuid) -> Result<RuleTable, StoreError> {
        self.ensure_garment(garment_id).await?;

        let query = r#"
            SELECT id, garment_id, measure_key, label, min_value, max_value, priority
            FROM size_rules
            WHERE garment_id = $1
            ORDER BY position
        "#;

        let rows = sqlx::query(query)
            .bind(garment_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(RuleTable::from_rules(rows.iter().map(rule_from_row)))
    }

    async fn add_rule(&self, rule: NewSizeRule) -> Result<SizeRule, StoreError> {
        rule.validate().map_err(StoreError::InvalidInput)?;
        self.ensure_garment(rule.garment_id).await?;

        let query = r#"
            INSERT INTO size_rules (id, garment_id, measure_key, label, min_value, max_value, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        let rule = rule.into_rule(Uuid::new_v4());
        sqlx::query(query)
            .bind(rule.id)
            .bind(rule.garment_id)
            .bind(&rule.measure_key)
            .bind(&rule.label)
            .bind(rule.min_value)
            .bind(rule.max_value)
            .bind(rule.priority)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Added size rule {} ({} {}..={}) to garment {}",
            rule.label,
            rule.measure_key,
            rule.min_value,
            rule.max_value,
            rule.garment_id
        );

        Ok(rule)
    }

    async fn remove_rule(&self, garment_id: Uuid, rule_id: Uuid) -> Result<bool, StoreError> {
        let query = r#"
            DELETE FROM size_rules
            WHERE garment_id = $1 AND id = $2
        "#;

        let result = sqlx::query(query)
            .bind(garment_id)
            .bind(rule_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    /// Insert or update the (user, garment) record in one transaction
    ///
    /// The unique constraint on (user_id, garment_id) plus ON CONFLICT
    /// makes concurrent saves for the same pair converge on one row.
    async fn upsert_record(
        &self,
        record: NewMeasurementRecord,
    ) -> Result<MeasurementRecord, StoreError> {
        let garment_id = record.garment_id;
        let mut tx = self.pool.begin().await?;

        let upsert = r#"
            INSERT INTO measurement_records (id, user_id, company_id, garment_id, size_label, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, garment_id)
            DO UPDATE SET
                company_id = EXCLUDED.company_id,
                size_label = EXCLUDED.size_label,
                updated_at = EXCLUDED.updated_at
            RETURNING id, updated_at
        "#;

        let row = sqlx::query(upsert)
            .bind(Uuid::new_v4())
            .bind(&record.user_id)
            .bind(record.company_id)
            .bind(record.garment_id)
            .bind(&record.size_label)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
                    StoreError::garment_not_found(garment_id)
                } else {
                    StoreError::from(e)
                }
            })?;

        let record_id: Uuid = row.get("id");
        let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

        sqlx::query("DELETE FROM measurement_values WHERE record_id = $1")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

        for (position, value) in record.values.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO measurement_values (record_id, position, measure_key, value)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(record_id)
            .bind(position as i32)
            .bind(&value.measure_key)
            .bind(value.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Stored record {} for user {} garment {} ({})",
            record_id,
            record.user_id,
            record.garment_id,
            record.size_label
        );

        Ok(MeasurementRecord {
            id: record_id,
            user_id: record.user_id,
            company_id: record.company_id,
            garment_id: record.garment_id,
            size_label: record.size_label,
            values: record.values,
            updated_at,
        })
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<MeasurementRecord>, StoreError> {
        let query = r#"
            SELECT id, user_id, company_id, garment_id, size_label, updated_at
            FROM measurement_records
            WHERE user_id = $1
            ORDER BY updated_at DESC
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let mut values = self.record_values(&ids).await?;

        let records = rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                MeasurementRecord {
                    id,
                    user_id: row.get("user_id"),
                    company_id: row.get("company_id"),
                    garment_id: row.get("garment_id"),
                    size_label: row.get("size_label"),
                    values: values.remove(&id).unwrap_or_default(),
                    updated_at: row.get("updated_at"),
                }
            })
            .collect();

        Ok(records)
    }

    async fn delete_record(&self, user_id: &str, record_id: Uuid) -> Result<bool, StoreError> {
        let query = r#"
            DELETE FROM measurement_records
            WHERE id = $1 AND user_id = $2
        "#;

        let result = sqlx::query(query)
            .bind(record_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn size_counts(&self, company_id: Uuid) -> Result<Vec<SizeCount>, StoreError> {
        let query = r#"
            SELECT garment_id, size_label, COUNT(*) AS count
            FROM measurement_records
            WHERE company_id = $1
            GROUP BY garment_id, size_label
        "#;

        let rows = sqlx::query(query)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| SizeCount {
                garment_id: row.get("garment_id"),
                size_label: row.get("size_label"),
                count: row.get("count"),
            })
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
