pub mod clean;
pub mod credentials;
pub mod login;
pub mod sync;
