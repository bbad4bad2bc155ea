use std::sync::Arc;

use domains::traits::{
    AnnouncementRepo, BattleRepo, CredentialVerifier, EventRepo, MessageRepo, PageRepo,
    SessionStore, SettingsRepo, UserRepo,
};
use services::{
    AnnouncementService, BattleService, EventService, MessageService, PageService,
    SessionAuthority, SettingService, UserService,
};

use crate::session::CookiePolicy;

/// The full set of ports a running server needs. Built once at startup by
/// the binary, which decides which backend each port is wired to.
pub struct Ports {
    pub users: Arc<dyn UserRepo>,
    pub messages: Arc<dyn MessageRepo>,
    pub pages: Arc<dyn PageRepo>,
    pub events: Arc<dyn EventRepo>,
    pub battles: Arc<dyn BattleRepo>,
    pub announcements: Arc<dyn AnnouncementRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Shared handler state. Services are cheap to clone (they hold `Arc`s).
#[derive(Clone)]
pub struct AppState {
    pub cookies: CookiePolicy,
    pub auth: SessionAuthority,
    pub users: UserService,
    pub chat: MessageService,
    pub pages: PageService,
    pub events: EventService,
    pub battles: BattleService,
    pub announcements: AnnouncementService,
    pub settings: SettingService,
}

impl AppState {
    pub fn new(ports: Ports, cookies: CookiePolicy) -> Self {
        Self {
            cookies,
            auth: SessionAuthority::new(
                Arc::clone(&ports.users),
                Arc::clone(&ports.verifier),
                Arc::clone(&ports.sessions),
            ),
            users: UserService::new(Arc::clone(&ports.users), Arc::clone(&ports.verifier)),
            chat: MessageService::new(Arc::clone(&ports.messages), Arc::clone(&ports.users)),
            pages: PageService::new(ports.pages),
            events: EventService::new(ports.events),
            battles: BattleService::new(ports.battles),
            announcements: AnnouncementService::new(ports.announcements),
            settings: SettingService::new(ports.settings),
        }
    }
}
