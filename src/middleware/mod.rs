pub mod client;
pub mod cookie;
pub mod flash;
pub mod session;

pub use client::ClientAddr;
pub use cookie::CookieSettings;
pub use flash::{Flash, FlashLevel, push_flash, take_flashes};
pub use session::{AdminSession, RequireAdmin, StoredSession};
