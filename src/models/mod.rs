pub mod driver;
pub mod event;
pub mod trip;
pub mod user;
