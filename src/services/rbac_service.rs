// src/services/rbac_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, UserRepository},
    middleware::rbac::{catalog, is_known},
    models::{
        auth::{User, UserRole},
        rbac::{group_by_category, PermissionGroup, UserPermissionsResponse},
    },
};

/// Conjunto inicial de permissões de cada cargo. ADMIN não precisa de nenhuma.
pub fn default_permissions_for(role: UserRole) -> Vec<&'static str> {
    let all = catalog().into_iter().map(|spec| spec.code);
    match role {
        UserRole::Admin => Vec::new(),
        UserRole::Manager => all.filter(|code| *code != "users_manage").collect(),
        UserRole::Cashier => vec![
            "sales_view",
            "sales_create",
            "sales_manage",
            "products_view",
            "alerts_view",
        ],
        UserRole::Server => vec!["sales_view", "sales_create", "products_view"],
        UserRole::Cook => vec!["kitchen_view", "kitchen_manage", "alerts_view", "products_view"],
    }
}

/// Regra de resolução: desativado não pode nada, admin pode tudo, resto depende da concessão.
pub fn resolve_access(role: UserRole, is_active: bool, has_grant: bool) -> bool {
    if !is_active {
        return false;
    }
    role == UserRole::Admin || has_grant
}

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    /// Grava o catálogo estático na tabela `permissions` (boot).
    pub async fn sync_catalog(&self) -> Result<usize, AppError> {
        let specs = catalog();
        let mut tx = self.pool.begin().await?;
        for spec in &specs {
            self.repo
                .upsert_permission(
                    &mut *tx,
                    spec.code,
                    spec.name,
                    Some(spec.description),
                    spec.category,
                )
                .await?;
        }
        tx.commit().await?;
        Ok(specs.len())
    }

    pub async fn list_permissions(&self) -> Result<Vec<PermissionGroup>, AppError> {
        let permissions = self.repo.list_all_permissions().await?;
        Ok(group_by_category(permissions))
    }

    pub async fn user_permissions(&self, user_id: Uuid) -> Result<UserPermissionsResponse, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let permissions = self
            .repo
            .list_user_grants(user_id)
            .await?
            .into_iter()
            .filter(|g| g.is_active)
            .map(|g| g.code)
            .collect();

        Ok(UserPermissionsResponse { user_id, permissions })
    }

    /// Substitui o conjunto ativo do usuário: os códigos listados ficam ativos, o resto é desativado.
    pub async fn set_user_permissions(
        &self,
        user_id: Uuid,
        codes: Vec<String>,
        granted_by: Uuid,
    ) -> Result<UserPermissionsResponse, AppError> {
        let mut codes = codes;
        codes.sort();
        codes.dedup();

        let unknown: Vec<String> = codes.iter().filter(|c| !is_known(c)).cloned().collect();
        if !unknown.is_empty() {
            return Err(AppError::UnknownPermissions(unknown));
        }

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let mut tx = self.pool.begin().await?;
        self.replace_grants_in(&mut *tx, user_id, &codes, Some(granted_by)).await?;
        tx.commit().await?;

        tracing::info!("Permissões do usuário {} redefinidas ({} ativas)", user_id, codes.len());
        Ok(UserPermissionsResponse { user_id, permissions: codes })
    }

    /// Concede o conjunto padrão do cargo dentro da transação do chamador.
    pub async fn grant_defaults_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        role: UserRole,
        granted_by: Option<Uuid>,
    ) -> Result<(), AppError> {
        let codes: Vec<String> = default_permissions_for(role)
            .into_iter()
            .map(String::from)
            .collect();
        if codes.is_empty() {
            return Ok(());
        }
        self.replace_grants_in(conn, user_id, &codes, granted_by).await
    }

    async fn replace_grants_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        codes: &[String],
        granted_by: Option<Uuid>,
    ) -> Result<(), AppError> {
        let permissions = self.repo.find_permissions_by_codes(&mut *conn, codes).await?;
        let ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();

        if !ids.is_empty() {
            self.repo.activate_grants(&mut *conn, user_id, &ids, granted_by).await?;
        }
        self.repo.deactivate_other_grants(&mut *conn, user_id, &ids).await?;
        Ok(())
    }

    pub async fn user_can(&self, user: &User, code: &str) -> Result<bool, AppError> {
        // Sem ida ao banco quando a resposta já é conhecida
        if !user.is_active || user.role == UserRole::Admin {
            return Ok(resolve_access(user.role, user.is_active, false));
        }
        let has_grant = self.repo.user_has_permission(user.id, code).await?;
        Ok(resolve_access(user.role, user.is_active, has_grant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_gets_everything_but_user_management() {
        let codes = default_permissions_for(UserRole::Manager);
        assert_eq!(codes.len(), catalog().len() - 1);
        assert!(!codes.contains(&"users_manage"));
        assert!(codes.contains(&"reports_view"));
    }

    #[test]
    fn floor_roles_have_narrow_defaults() {
        let server = default_permissions_for(UserRole::Server);
        assert_eq!(server, vec!["sales_view", "sales_create", "products_view"]);

        let cook = default_permissions_for(UserRole::Cook);
        assert!(cook.contains(&"kitchen_manage"));
        assert!(!cook.contains(&"sales_create"));

        let cashier = default_permissions_for(UserRole::Cashier);
        assert!(cashier.contains(&"sales_manage"));
        assert!(!cashier.contains(&"inventory_manage"));
    }

    #[test]
    fn every_default_code_is_in_the_catalog() {
        for role in [UserRole::Manager, UserRole::Cashier, UserRole::Server, UserRole::Cook] {
            for code in default_permissions_for(role) {
                assert!(is_known(code), "{} -> {}", role, code);
            }
        }
        assert!(default_permissions_for(UserRole::Admin).is_empty());
    }

    #[test]
    fn admin_bypasses_grants_but_not_deactivation() {
        assert!(resolve_access(UserRole::Admin, true, false));
        assert!(!resolve_access(UserRole::Admin, false, true));
        assert!(!resolve_access(UserRole::Cashier, true, false));
        assert!(resolve_access(UserRole::Cashier, true, true));
        assert!(!resolve_access(UserRole::Server, false, true));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn replacing_permissions_deactivates_unlisted_codes(pool: PgPool) {
        use crate::models::auth::CreateUserPayload;
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let cashier = state
            .auth_service
            .create_user(
                &CreateUserPayload {
                    username: "caixa".to_string(),
                    password: "senha-do-caixa".to_string(),
                    email: None,
                    first_name: None,
                    last_name: None,
                    role: UserRole::Cashier,
                },
                admin.id,
            )
            .await
            .unwrap();
        let rbac = &state.rbac_service;
        assert!(rbac.user_can(&cashier, "sales_manage").await.unwrap());

        let response = rbac
            .set_user_permissions(
                cashier.id,
                vec!["sales_view".to_string(), "reports_view".to_string(), "sales_view".to_string()],
                admin.id,
            )
            .await
            .unwrap();
        assert_eq!(response.permissions, vec!["reports_view", "sales_view"]);

        let mut active = rbac.user_permissions(cashier.id).await.unwrap().permissions;
        active.sort();
        assert_eq!(active, vec!["reports_view", "sales_view"]);
        assert!(!rbac.user_can(&cashier, "sales_manage").await.unwrap());

        // Os vínculos antigos continuam gravados, só que inativos
        let grants = rbac.repo.list_user_grants(cashier.id).await.unwrap();
        let manage = grants.iter().find(|g| g.code == "sales_manage").unwrap();
        assert!(!manage.is_active);

        // Código desconhecido: nada muda
        let err = rbac
            .set_user_permissions(cashier.id, vec!["bar_open".to_string()], admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownPermissions(_)));
        assert_eq!(rbac.user_permissions(cashier.id).await.unwrap().permissions.len(), 2);
    }
}
