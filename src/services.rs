pub mod alert_service;
pub mod auth;
pub mod document_service;
pub mod expense_service;
pub mod inventory_service;
pub mod kitchen_service;
pub mod product_service;
pub mod rbac_service;
pub mod report_service;
pub mod sales_service;
pub mod supplier_service;
