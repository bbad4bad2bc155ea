//! Business logic over the `domains` ports: the access policy engine,
//! the session authority, and one thin service per resource following
//! the same shape — validate, authorize, then call the repository.

pub mod announcements;
pub mod auth;
pub mod battles;
pub mod chat;
pub mod events;
pub mod pages;
pub mod policy;
pub mod settings;
pub mod users;

pub use announcements::AnnouncementService;
pub use auth::SessionAuthority;
pub use battles::BattleService;
pub use chat::MessageService;
pub use events::EventService;
pub use pages::PageService;
pub use settings::SettingService;
pub use users::UserService;
