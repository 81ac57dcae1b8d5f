use chrono::Utc;
use sqlx::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{
    CreatePromptDto, CreatePromptVersionDto, PromptDetailDto, PromptPageDto, PromptQueryParams,
    PromptResponseDto, PromptVersionResponseDto, UpdatePromptDto, UpdatePromptVersionDto,
};
use crate::features::prompts::models::{Prompt, PromptVersion};

const PROMPT_COLUMNS: &str = "id, name, description, tags, active_version_id, created_at, updated_at";
const VERSION_COLUMNS: &str =
    "id, prompt_id, version_number, template, input_variables, model_config_json, commit_message, created_at";

/// Map a caller-supplied sort field onto a real column. Unknown names fall
/// back to creation time rather than erroring.
fn sort_column(name: &str) -> &'static str {
    match name {
        "id" => "id",
        "name" => "name",
        "updated_at" => "updated_at",
        _ => "created_at",
    }
}

pub struct PromptService {
    pool: SqlitePool,
}

impl PromptService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, dto: CreatePromptDto) -> Result<PromptDetailDto> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO prompts (name, description, tags, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {PROMPT_COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&sql)
            .bind(&dto.name)
            .bind(&dto.description)
            .bind(&dto.tags)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(PromptDetailDto::from_parts(prompt, Vec::new()))
    }

    pub async fn get(&self, id: i64) -> Result<PromptDetailDto> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?");
        let prompt = sqlx::query_as::<_, Prompt>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))?;

        let versions = self.fetch_versions(id).await?;
        Ok(PromptDetailDto::from_parts(prompt, versions))
    }

    /// Filtered, sorted, paginated listing. Offset/limit are passed through
    /// unvalidated; the page number is derived as skip/limit + 1.
    pub async fn list(&self, params: &PromptQueryParams) -> Result<PromptPageDto> {
        let search_pattern = params
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let where_clause = if search_pattern.is_some() {
            "WHERE (LOWER(name) LIKE ?1 OR LOWER(description) LIKE ?1)"
        } else {
            ""
        };

        let count_sql = format!("SELECT COUNT(*) FROM prompts {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref pattern) = search_pattern {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts {where_clause} ORDER BY {} {} LIMIT ? OFFSET ?",
            sort_column(&params.sort_by),
            params.order.as_sql()
        );
        let mut page_query = sqlx::query_as::<_, Prompt>(&page_sql);
        if let Some(ref pattern) = search_pattern {
            page_query = page_query.bind(pattern);
        }
        let prompts = page_query
            .bind(params.limit)
            .bind(params.skip)
            .fetch_all(&self.pool)
            .await?;

        let page = if params.limit > 0 {
            params.skip / params.limit + 1
        } else {
            1
        };

        Ok(PromptPageDto {
            items: prompts.into_iter().map(PromptResponseDto::from).collect(),
            total,
            page,
            size: params.limit,
        })
    }

    pub async fn update(&self, id: i64, dto: UpdatePromptDto) -> Result<PromptDetailDto> {
        let sql = format!(
            "UPDATE prompts SET name = COALESCE(?, name), \
             description = COALESCE(?, description), \
             tags = COALESCE(?, tags), \
             updated_at = ? \
             WHERE id = ? RETURNING {PROMPT_COLUMNS}"
        );
        let prompt = sqlx::query_as::<_, Prompt>(&sql)
            .bind(&dto.name)
            .bind(&dto.description)
            .bind(&dto.tags)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", id)))?;

        let versions = self.fetch_versions(id).await?;
        Ok(PromptDetailDto::from_parts(prompt, versions))
    }

    /// Deletes the prompt; versions go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Prompt with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Creates a version under the prompt. The first version of a prompt
    /// with no active version becomes active in the same transaction.
    pub async fn add_version(
        &self,
        prompt_id: i64,
        dto: CreatePromptVersionDto,
    ) -> Result<PromptVersionResponseDto> {
        let mut tx = self.pool.begin().await?;

        let prompt_sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?");
        let prompt = sqlx::query_as::<_, Prompt>(&prompt_sql)
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", prompt_id)))?;

        let now = Utc::now();
        let insert_sql = format!(
            "INSERT INTO prompt_versions \
             (prompt_id, version_number, template, input_variables, model_config_json, commit_message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {VERSION_COLUMNS}"
        );
        let version = sqlx::query_as::<_, PromptVersion>(&insert_sql)
            .bind(prompt_id)
            .bind(dto.version_number)
            .bind(&dto.template)
            .bind(&dto.input_variables)
            .bind(&dto.model_config_json)
            .bind(&dto.commit_message)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        if prompt.active_version_id.is_none() {
            sqlx::query("UPDATE prompts SET active_version_id = ?, updated_at = ? WHERE id = ?")
                .bind(version.id)
                .bind(now)
                .bind(prompt_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(PromptVersionResponseDto::from(version))
    }

    /// Points the prompt at one of its own versions. A version owned by a
    /// different prompt is reported as not found.
    pub async fn set_active_version(
        &self,
        prompt_id: i64,
        version_id: i64,
    ) -> Result<PromptDetailDto> {
        let mut tx = self.pool.begin().await?;

        let prompt_sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?");
        sqlx::query_as::<_, Prompt>(&prompt_sql)
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prompt with id {} not found", prompt_id)))?;

        let version_sql =
            format!("SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE id = ? AND prompt_id = ?");
        sqlx::query_as::<_, PromptVersion>(&version_sql)
            .bind(version_id)
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Version with id {} not found", version_id))
            })?;

        sqlx::query("UPDATE prompts SET active_version_id = ?, updated_at = ? WHERE id = ?")
            .bind(version_id)
            .bind(Utc::now())
            .bind(prompt_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.get(prompt_id).await
    }

    pub async fn update_version(
        &self,
        prompt_id: i64,
        version_id: i64,
        dto: UpdatePromptVersionDto,
    ) -> Result<PromptVersionResponseDto> {
        let sql = format!(
            "UPDATE prompt_versions SET template = COALESCE(?, template), \
             input_variables = COALESCE(?, input_variables), \
             model_config_json = COALESCE(?, model_config_json), \
             commit_message = COALESCE(?, commit_message) \
             WHERE id = ? AND prompt_id = ? RETURNING {VERSION_COLUMNS}"
        );
        let version = sqlx::query_as::<_, PromptVersion>(&sql)
            .bind(&dto.template)
            .bind(&dto.input_variables)
            .bind(&dto.model_config_json)
            .bind(&dto.commit_message)
            .bind(version_id)
            .bind(prompt_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Version with id {} not found", version_id))
            })?;

        Ok(PromptVersionResponseDto::from(version))
    }

    /// Deletes the version. If it was the active one, the prompt's pointer
    /// is cleared in the same transaction; no other version is promoted.
    pub async fn delete_version(&self, prompt_id: i64, version_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let version_sql =
            format!("SELECT {VERSION_COLUMNS} FROM prompt_versions WHERE id = ? AND prompt_id = ?");
        sqlx::query_as::<_, PromptVersion>(&version_sql)
            .bind(version_id)
            .bind(prompt_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Version with id {} not found", version_id))
            })?;

        sqlx::query(
            "UPDATE prompts SET active_version_id = NULL, updated_at = ? \
             WHERE id = ? AND active_version_id = ?",
        )
        .bind(Utc::now())
        .bind(prompt_id)
        .bind(version_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM prompt_versions WHERE id = ?")
            .bind(version_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_versions(&self, prompt_id: i64) -> Result<Vec<PromptVersion>> {
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM prompt_versions \
             WHERE prompt_id = ? ORDER BY version_number ASC, id ASC"
        );
        Ok(sqlx::query_as::<_, PromptVersion>(&sql)
            .bind(prompt_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::prompts::dtos::SortDirection;
    use crate::shared::test_helpers::test_pool;

    fn create_dto(name: &str, description: Option<&str>) -> CreatePromptDto {
        CreatePromptDto {
            name: name.to_string(),
            description: description.map(str::to_string),
            tags: None,
        }
    }

    fn version_dto(number: i64, template: &str) -> CreatePromptVersionDto {
        CreatePromptVersionDto {
            version_number: number,
            template: template.to_string(),
            input_variables: None,
            model_config_json: None,
            commit_message: None,
        }
    }

    fn params(
        search: Option<&str>,
        sort_by: &str,
        order: SortDirection,
        skip: i64,
        limit: i64,
    ) -> PromptQueryParams {
        PromptQueryParams {
            search: search.map(str::to_string),
            sort_by: sort_by.to_string(),
            order,
            skip,
            limit,
        }
    }

    /// Asserts the active-version invariant directly against storage.
    async fn assert_invariant(service: &PromptService, prompt_id: i64) {
        let prompt = service.get(prompt_id).await.unwrap();
        if let Some(active_id) = prompt.active_version_id {
            assert!(
                prompt
                    .versions
                    .iter()
                    .any(|v| v.id == active_id && v.prompt_id == prompt_id),
                "active_version_id {} does not reference an owned version",
                active_id
            );
        }
    }

    #[tokio::test]
    async fn create_starts_with_no_active_version() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();

        assert_eq!(prompt.name, "greeting");
        assert!(prompt.active_version_id.is_none());
        assert!(prompt.versions.is_empty());
    }

    #[tokio::test]
    async fn first_version_becomes_active_second_does_not_take_over() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();

        let v1 = service
            .add_version(prompt.id, version_dto(1, "Hello {name}"))
            .await
            .unwrap();
        let after_first = service.get(prompt.id).await.unwrap();
        assert_eq!(after_first.active_version_id, Some(v1.id));

        let _v2 = service
            .add_version(prompt.id, version_dto(2, "Hi {name}"))
            .await
            .unwrap();
        let after_second = service.get(prompt.id).await.unwrap();
        assert_eq!(after_second.active_version_id, Some(v1.id));
        assert_invariant(&service, prompt.id).await;
    }

    #[tokio::test]
    async fn deleting_active_version_clears_pointer_without_promotion() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();
        let v1 = service
            .add_version(prompt.id, version_dto(1, "a"))
            .await
            .unwrap();
        let _v2 = service
            .add_version(prompt.id, version_dto(2, "b"))
            .await
            .unwrap();

        service.delete_version(prompt.id, v1.id).await.unwrap();

        let after = service.get(prompt.id).await.unwrap();
        assert_eq!(after.active_version_id, None);
        assert_eq!(after.versions.len(), 1);
        assert_invariant(&service, prompt.id).await;
    }

    #[tokio::test]
    async fn deleting_inactive_version_leaves_pointer_alone() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();
        let v1 = service
            .add_version(prompt.id, version_dto(1, "a"))
            .await
            .unwrap();
        let v2 = service
            .add_version(prompt.id, version_dto(2, "b"))
            .await
            .unwrap();

        service.delete_version(prompt.id, v2.id).await.unwrap();

        let after = service.get(prompt.id).await.unwrap();
        assert_eq!(after.active_version_id, Some(v1.id));
        assert_invariant(&service, prompt.id).await;
    }

    #[tokio::test]
    async fn set_active_rejects_version_of_another_prompt() {
        let service = PromptService::new(test_pool().await);
        let first = service.create(create_dto("first", None)).await.unwrap();
        let second = service.create(create_dto("second", None)).await.unwrap();
        let foreign = service
            .add_version(second.id, version_dto(1, "x"))
            .await
            .unwrap();
        let own = service
            .add_version(first.id, version_dto(1, "y"))
            .await
            .unwrap();

        let err = service
            .set_active_version(first.id, foreign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // state unchanged
        let after = service.get(first.id).await.unwrap();
        assert_eq!(after.active_version_id, Some(own.id));
        assert_invariant(&service, first.id).await;
    }

    #[tokio::test]
    async fn set_active_moves_pointer_to_chosen_version() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();
        let _v1 = service
            .add_version(prompt.id, version_dto(1, "a"))
            .await
            .unwrap();
        let v2 = service
            .add_version(prompt.id, version_dto(2, "b"))
            .await
            .unwrap();

        let after = service.set_active_version(prompt.id, v2.id).await.unwrap();
        assert_eq!(after.active_version_id, Some(v2.id));
        assert_invariant(&service, prompt.id).await;
    }

    #[tokio::test]
    async fn version_operations_against_wrong_prompt_are_not_found() {
        let service = PromptService::new(test_pool().await);
        let first = service.create(create_dto("first", None)).await.unwrap();
        let second = service.create(create_dto("second", None)).await.unwrap();
        let version = service
            .add_version(second.id, version_dto(1, "x"))
            .await
            .unwrap();

        let update = UpdatePromptVersionDto {
            template: Some("changed".to_string()),
            input_variables: None,
            model_config_json: None,
            commit_message: None,
        };
        assert!(matches!(
            service
                .update_version(first.id, version.id, update)
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service
                .delete_version(first.id, version.id)
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn partial_update_keeps_untouched_fields() {
        let service = PromptService::new(test_pool().await);
        let prompt = service
            .create(CreatePromptDto {
                name: "greeting".to_string(),
                description: Some("says hello".to_string()),
                tags: Some("demo".to_string()),
            })
            .await
            .unwrap();

        let updated = service
            .update(
                prompt.id,
                UpdatePromptDto {
                    name: Some("welcome".to_string()),
                    description: None,
                    tags: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "welcome");
        assert_eq!(updated.description.as_deref(), Some("says hello"));
        assert_eq!(updated.tags.as_deref(), Some("demo"));
    }

    #[tokio::test]
    async fn update_version_patches_only_supplied_fields() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();
        let version = service
            .add_version(
                prompt.id,
                CreatePromptVersionDto {
                    version_number: 1,
                    template: "Hello".to_string(),
                    input_variables: Some("{\"name\": \"str\"}".to_string()),
                    model_config_json: None,
                    commit_message: Some("initial".to_string()),
                },
            )
            .await
            .unwrap();

        let patched = service
            .update_version(
                prompt.id,
                version.id,
                UpdatePromptVersionDto {
                    template: Some("Hello there".to_string()),
                    input_variables: None,
                    model_config_json: None,
                    commit_message: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.template, "Hello there");
        assert_eq!(
            patched.input_variables.as_deref(),
            Some("{\"name\": \"str\"}")
        );
        assert_eq!(patched.commit_message.as_deref(), Some("initial"));
    }

    #[tokio::test]
    async fn delete_prompt_cascades_to_versions() {
        let service = PromptService::new(test_pool().await);
        let prompt = service.create(create_dto("greeting", None)).await.unwrap();
        let pool = service.pool.clone();
        service
            .add_version(prompt.id, version_dto(1, "a"))
            .await
            .unwrap();

        service.delete(prompt.id).await.unwrap();

        assert!(matches!(
            service.get(prompt.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM prompt_versions WHERE prompt_id = ?")
                .bind(prompt.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn missing_ids_report_not_found() {
        let service = PromptService::new(test_pool().await);

        assert!(matches!(
            service.get(999).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete(999).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service
                .add_version(999, version_dto(1, "x"))
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn pagination_reports_total_page_and_size() {
        let service = PromptService::new(test_pool().await);
        for i in 0..25 {
            service
                .create(create_dto(&format!("prompt-{:02}", i), None))
                .await
                .unwrap();
        }

        let first = service
            .list(&params(None, "created_at", SortDirection::Asc, 0, 10))
            .await
            .unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.page, 1);
        assert_eq!(first.size, 10);
        assert_eq!(first.items.len(), 10);

        let third = service
            .list(&params(None, "created_at", SortDirection::Asc, 20, 10))
            .await
            .unwrap();
        assert_eq!(third.total, 25);
        assert_eq!(third.page, 3);
        assert_eq!(third.items.len(), 5);
    }

    #[tokio::test]
    async fn search_matches_description_when_name_does_not() {
        let service = PromptService::new(test_pool().await);
        service
            .create(create_dto("summarizer", Some("Condenses Articles")))
            .await
            .unwrap();
        service
            .create(create_dto("translator", Some("converts languages")))
            .await
            .unwrap();

        let page = service
            .list(&params(
                Some("articles"),
                "created_at",
                SortDirection::Desc,
                0,
                10,
            ))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "summarizer");
    }

    #[tokio::test]
    async fn sorting_by_name_and_unknown_field_fallback() {
        let service = PromptService::new(test_pool().await);
        for name in ["charlie", "alpha", "bravo"] {
            service.create(create_dto(name, None)).await.unwrap();
        }

        let by_name = service
            .list(&params(None, "name", SortDirection::Asc, 0, 10))
            .await
            .unwrap();
        let names: Vec<_> = by_name.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);

        // unknown sort field falls back to creation order
        let fallback = service
            .list(&params(None, "bogus_field", SortDirection::Asc, 0, 10))
            .await
            .unwrap();
        let names: Vec<_> = fallback.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["charlie", "alpha", "bravo"]);
    }
}
