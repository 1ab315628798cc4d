pub mod health;
pub mod locale;
pub mod page;
