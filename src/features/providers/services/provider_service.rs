use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::features::providers::dtos::{
    CreateProviderDto, CreateProviderModelDto, ProviderModelResponseDto, ProviderResponseDto,
    UpdateProviderDto,
};
use crate::features::providers::models::{Provider, ProviderModel};

const PROVIDER_COLUMNS: &str = "id, name, api_key, base_url, is_active, created_at";
const MODEL_COLUMNS: &str = "id, provider_id, name, capabilities";

pub struct ProviderService {
    pool: SqlitePool,
}

impl ProviderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<ProviderResponseDto>> {
        let providers_sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers ORDER BY id ASC");
        let providers = sqlx::query_as::<_, Provider>(&providers_sql)
            .fetch_all(&self.pool)
            .await?;

        let models_sql = format!("SELECT {MODEL_COLUMNS} FROM provider_models ORDER BY id ASC");
        let models = sqlx::query_as::<_, ProviderModel>(&models_sql)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: std::collections::HashMap<i64, Vec<ProviderModel>> =
            std::collections::HashMap::new();
        for model in models {
            grouped.entry(model.provider_id).or_default().push(model);
        }

        Ok(providers
            .into_iter()
            .map(|provider| {
                let mine = grouped.remove(&provider.id).unwrap_or_default();
                ProviderResponseDto::from_parts(provider, mine)
            })
            .collect())
    }

    pub async fn create(&self, dto: CreateProviderDto) -> Result<ProviderResponseDto> {
        let sql = format!(
            "INSERT INTO providers (name, api_key, base_url, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {PROVIDER_COLUMNS}"
        );
        let provider = sqlx::query_as::<_, Provider>(&sql)
            .bind(&dto.name)
            .bind(&dto.api_key)
            .bind(&dto.base_url)
            .bind(dto.is_active)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(ProviderResponseDto::from_parts(provider, Vec::new()))
    }

    pub async fn get(&self, id: i64) -> Result<ProviderResponseDto> {
        let provider = self
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Provider with id {} not found", id)))?;
        let models = self.fetch_models(id).await?;
        Ok(ProviderResponseDto::from_parts(provider, models))
    }

    /// Raw row lookup used by execution-profile resolution; absence is not
    /// an error there.
    pub async fn find(&self, id: i64) -> Result<Option<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = ?");
        Ok(sqlx::query_as::<_, Provider>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: i64, dto: UpdateProviderDto) -> Result<ProviderResponseDto> {
        let sql = format!(
            "UPDATE providers SET name = COALESCE(?, name), \
             api_key = COALESCE(?, api_key), \
             base_url = COALESCE(?, base_url), \
             is_active = COALESCE(?, is_active) \
             WHERE id = ? RETURNING {PROVIDER_COLUMNS}"
        );
        let provider = sqlx::query_as::<_, Provider>(&sql)
            .bind(&dto.name)
            .bind(&dto.api_key)
            .bind(&dto.base_url)
            .bind(dto.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Provider with id {} not found", id)))?;

        let models = self.fetch_models(id).await?;
        Ok(ProviderResponseDto::from_parts(provider, models))
    }

    /// Deletes the provider; its models go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM providers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Provider with id {} not found",
                id
            )));
        }

        Ok(())
    }

    pub async fn add_model(
        &self,
        provider_id: i64,
        dto: CreateProviderModelDto,
    ) -> Result<ProviderModelResponseDto> {
        self.find(provider_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Provider with id {} not found", provider_id))
        })?;

        let sql = format!(
            "INSERT INTO provider_models (provider_id, name, capabilities) \
             VALUES (?, ?, ?) RETURNING {MODEL_COLUMNS}"
        );
        let model = sqlx::query_as::<_, ProviderModel>(&sql)
            .bind(provider_id)
            .bind(&dto.name)
            .bind(&dto.capabilities)
            .fetch_one(&self.pool)
            .await?;

        Ok(ProviderModelResponseDto::from(model))
    }

    /// A model reached through the wrong provider id is reported as not
    /// found, even if it exists elsewhere.
    pub async fn delete_model(&self, provider_id: i64, model_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM provider_models WHERE id = ? AND provider_id = ?")
            .bind(model_id)
            .bind(provider_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Model with id {} not found",
                model_id
            )));
        }

        Ok(())
    }

    async fn fetch_models(&self, provider_id: i64) -> Result<Vec<ProviderModel>> {
        let sql =
            format!("SELECT {MODEL_COLUMNS} FROM provider_models WHERE provider_id = ? ORDER BY id ASC");
        Ok(sqlx::query_as::<_, ProviderModel>(&sql)
            .bind(provider_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
