pub mod db;
pub mod password;

pub use db::DbAdapter;
pub use password::Argon2Credentials;
