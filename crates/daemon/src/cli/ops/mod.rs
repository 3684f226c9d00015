pub mod health;
pub mod serve;

pub use health::Health;
pub use serve::Serve;

crate::command_enum! {
    (Serve, Serve),
    (Health, Health),
}
