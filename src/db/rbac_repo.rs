// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::rbac::{Permission, UserPermission};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Sincroniza uma entrada do catálogo estático com a tabela
    pub async fn upsert_permission<'e, E>(
        &self,
        executor: E,
        code: &str,
        name: &str,
        description: Option<&str>,
        category: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO permissions (code, name, description, category)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                category = EXCLUDED.category
            "#,
        )
            .bind(code)
            .bind(name)
            .bind(description)
            .bind(category)
            .execute(executor)
            .await?;
        Ok(())
    }

    // 2. Listar todas as permissões disponíveis (para o Frontend montar a tela)
    pub async fn list_all_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, code, name, description, category FROM permissions ORDER BY category, code",
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(permissions)
    }

    // 3. Resolve códigos ("sales_create") para linhas (com UUID)
    pub async fn find_permissions_by_codes<'e, E>(
        &self,
        executor: E,
        codes: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, code, name, description, category
            FROM permissions
            WHERE code = ANY($1)
            "#,
        )
            .bind(codes)
            .fetch_all(executor)
            .await?;
        Ok(permissions)
    }

    // 4. Ativa (ou reativa) as permissões de um usuário
    pub async fn activate_grants<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        permission_ids: &[Uuid],
        granted_by: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Inserção em massa usando UNNEST. Quem já estava ativo mantém a data original.
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id, granted_by)
            SELECT $1, unnest($2::uuid[]), $3
            ON CONFLICT (user_id, permission_id) DO UPDATE SET
                is_active = TRUE,
                granted_by = CASE WHEN user_permissions.is_active
                                  THEN user_permissions.granted_by
                                  ELSE EXCLUDED.granted_by END,
                granted_at = CASE WHEN user_permissions.is_active
                                  THEN user_permissions.granted_at
                                  ELSE NOW() END
            "#,
        )
            .bind(user_id)
            .bind(permission_ids)
            .bind(granted_by)
            .execute(executor)
            .await?;
        Ok(())
    }

    // 5. Desativa tudo que não está na lista
    pub async fn deactivate_other_grants<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        keep_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE user_permissions
            SET is_active = FALSE
            WHERE user_id = $1
              AND is_active = TRUE
              AND NOT (permission_id = ANY($2))
            "#,
        )
            .bind(user_id)
            .bind(keep_ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_user_grants(&self, user_id: Uuid) -> Result<Vec<UserPermission>, AppError> {
        let grants = sqlx::query_as::<_, UserPermission>(
            r#"
            SELECT up.id, up.user_id, up.permission_id, p.code,
                   up.is_active, up.granted_by, up.granted_at
            FROM user_permissions up
            JOIN permissions p ON p.id = up.permission_id
            WHERE up.user_id = $1
            ORDER BY p.category, p.code
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(grants)
    }

    pub async fn user_has_permission(&self, user_id: Uuid, code: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_permissions up
                JOIN permissions p ON up.permission_id = p.id
                WHERE up.user_id = $1
                  AND up.is_active = TRUE
                  AND p.code = $2
            )
            "#,
        )
            .bind(user_id)
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
