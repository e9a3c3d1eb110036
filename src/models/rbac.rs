// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O que sai do banco (Tabela permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,

    #[schema(example = "sales_create")]
    pub code: String,

    #[schema(example = "Registrar vendas")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = "sales")]
    pub category: String,
}

// Vínculo usuário <-> permissão (tabela user_permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

// Catálogo agrupado (para o frontend montar a tela)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    #[schema(example = "kitchen")]
    pub category: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetUserPermissionsPayload {
    #[schema(example = json!(["sales_view", "sales_create"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionsResponse {
    pub user_id: Uuid,
    #[schema(example = json!(["sales_view", "sales_create"]))]
    pub permissions: Vec<String>,
}

/// Agrupa as permissões por categoria, mantendo a ordem de chegada das categorias.
pub fn group_by_category(permissions: Vec<Permission>) -> Vec<PermissionGroup> {
    let mut groups: Vec<PermissionGroup> = Vec::new();
    for permission in permissions {
        match groups.iter_mut().find(|g| g.category == permission.category) {
            Some(group) => group.permissions.push(permission),
            None => groups.push(PermissionGroup {
                category: permission.category.clone(),
                permissions: vec![permission],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(code: &str, category: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            code: code.into(),
            name: code.into(),
            description: None,
            category: category.into(),
        }
    }

    #[test]
    fn groups_keep_category_order() {
        let groups = group_by_category(vec![
            perm("sales_view", "sales"),
            perm("kitchen_view", "kitchen"),
            perm("sales_create", "sales"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "sales");
        assert_eq!(groups[0].permissions.len(), 2);
        assert_eq!(groups[1].permissions[0].code, "kitchen_view");
    }
}
