pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod kitchen_repo;
pub use kitchen_repo::KitchenRepository;
pub mod supplier_repo;
pub use supplier_repo::SupplierRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod alert_repo;
pub use alert_repo::AlertRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
