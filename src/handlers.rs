pub mod alerts;
pub mod auth;
pub mod documents;
pub mod expenses;
pub mod inventory;
pub mod kitchen;
pub mod products;
pub mod rbac;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;
