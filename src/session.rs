use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::SessionBackend;
use crate::config::RuntimeConfig;
use crate::llm::Content;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    #[serde(default)]
    pub state_delta: HashMap<String, Value>,
}

/// One recorded turn fragment: who produced it, what was said, and which
/// state keys it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub content: Option<Content>,
    #[serde(default)]
    pub actions: EventActions,
    #[serde(default)]
    pub final_response: bool,
}

impl Event {
    pub fn new(author: impl Into<String>, content: Option<Content>) -> Self {
        Self {
            timestamp: Utc::now(),
            author: author.into(),
            content,
            actions: EventActions::default(),
            final_response: false,
        }
    }

    pub fn with_state_delta(mut self, state_delta: HashMap<String, Value>) -> Self {
        self.actions.state_delta = state_delta;
        self
    }

    pub fn mark_final(mut self) -> Self {
        self.final_response = true;
        self
    }

    pub fn is_final_response(&self) -> bool {
        self.final_response
    }

    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(Content::text)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self::new(&cfg.app_name, &cfg.user_id, &cfg.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub app_name: String,
    pub user_id: String,
    pub id: String,
    #[serde(default)]
    pub state: HashMap<String, Value>,
    #[serde(default)]
    pub events: Vec<Event>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    pub fn new(key: &SessionKey, state: HashMap<String, Value>) -> Self {
        Self {
            app_name: key.app_name.clone(),
            user_id: key.user_id.clone(),
            id: key.session_id.clone(),
            state,
            events: Vec::new(),
            last_update_time: Utc::now(),
        }
    }

    /// Appends events and folds their state deltas into the session state.
    pub fn apply_events(&mut self, events: &[Event]) {
        for event in events {
            for (key, value) in &event.actions.state_delta {
                self.state.insert(key.clone(), value.clone());
            }
            if event.timestamp > self.last_update_time {
                self.last_update_time = event.timestamp;
            }
            self.events.push(event.clone());
        }
    }

    fn truncate_to_recent(&mut self, num_recent_events: Option<usize>) {
        if let Some(recent) = num_recent_events
            && self.events.len() > recent
        {
            let tail = self.events.split_off(self.events.len() - recent);
            self.events = tail;
        }
    }
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create(&self, key: &SessionKey, state: HashMap<String, Value>) -> Result<Session>;

    async fn get(&self, key: &SessionKey, num_recent_events: Option<usize>) -> Result<Session>;

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    async fn delete(&self, key: &SessionKey) -> Result<()>;

    async fn append(&self, key: &SessionKey, events: &[Event]) -> Result<()>;
}

type SessionMap = HashMap<(String, String, String), Session>;

#[derive(Default)]
pub struct InMemorySessionService {
    sessions: Mutex<SessionMap>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

fn map_key(key: &SessionKey) -> (String, String, String) {
    (
        key.app_name.clone(),
        key.user_id.clone(),
        key.session_id.clone(),
    )
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, key: &SessionKey, state: HashMap<String, Value>) -> Result<Session> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if sessions.contains_key(&map_key(key)) {
            return Err(anyhow::anyhow!(
                "session '{}' already exists for app '{}' and user '{}'",
                key.session_id,
                key.app_name,
                key.user_id
            ));
        }
        let session = Session::new(key, state);
        sessions.insert(map_key(key), session.clone());
        Ok(session)
    }

    async fn get(&self, key: &SessionKey, num_recent_events: Option<usize>) -> Result<Session> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut session = sessions
            .get(&map_key(key))
            .cloned()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "session '{}' not found for app '{}' and user '{}'",
                    key.session_id,
                    key.app_name,
                    key.user_id
                )
            })?;
        session.truncate_to_recent(num_recent_events);
        Ok(session)
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sessions
            .values()
            .filter(|session| session.app_name == app_name && session.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&map_key(key)).ok_or_else(|| {
            anyhow::anyhow!(
                "session '{}' not found for app '{}' and user '{}'",
                key.session_id,
                key.app_name,
                key.user_id
            )
        })?;
        Ok(())
    }

    async fn append(&self, key: &SessionKey, events: &[Event]) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session = sessions.get_mut(&map_key(key)).ok_or_else(|| {
            anyhow::anyhow!(
                "cannot append events: session '{}' not found for app '{}' and user '{}'",
                key.session_id,
                key.app_name,
                key.user_id
            )
        })?;
        session.apply_events(events);
        Ok(())
    }
}

/// One JSON document per session under the configured state directory.
pub struct FileSessionService {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionService {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session directory '{}'", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn session_path(&self, key: &SessionKey) -> PathBuf {
        let file_name = format!(
            "{}--{}--{}.json",
            sanitize_component(&key.app_name),
            sanitize_component(&key.user_id),
            sanitize_component(&key.session_id)
        );
        self.dir.join(file_name)
    }

    fn load(&self, key: &SessionKey) -> Result<Session> {
        let path = self.session_path(key);
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "session '{}' not found for app '{}' and user '{}'",
                key.session_id, key.app_name, key.user_id
            )
        })?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid session file '{}'", path.display()))
    }

    fn store(&self, key: &SessionKey, session: &Session) -> Result<()> {
        let path = self.session_path(key);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let payload = serde_json::to_string_pretty(session)
            .context("failed to serialize session state")?;
        std::fs::write(&path, payload)
            .with_context(|| format!("failed to write session file '{}'", path.display()))
    }
}

pub fn sanitize_component(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}

#[async_trait]
impl SessionService for FileSessionService {
    async fn create(&self, key: &SessionKey, state: HashMap<String, Value>) -> Result<Session> {
        if self.session_path(key).exists() {
            return Err(anyhow::anyhow!(
                "session '{}' already exists for app '{}' and user '{}'",
                key.session_id,
                key.app_name,
                key.user_id
            ));
        }
        let session = Session::new(key, state);
        self.store(key, &session)?;
        Ok(session)
    }

    async fn get(&self, key: &SessionKey, num_recent_events: Option<usize>) -> Result<Session> {
        let mut session = self.load(key)?;
        session.truncate_to_recent(num_recent_events);
        Ok(session)
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let entries = std::fs::read_dir(&self.dir).with_context(|| {
            format!("failed to read session directory '{}'", self.dir.display())
        })?;

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry
                .context("failed to read session directory entry")?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(session) = serde_json::from_str::<Session>(&content) else {
                tracing::warn!(path = %path.display(), "skipping unreadable session file");
                continue;
            };
            if session.app_name == app_name && session.user_id == user_id {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        let path = self.session_path(key);
        std::fs::remove_file(&path).with_context(|| {
            format!(
                "session '{}' not found for app '{}' and user '{}'",
                key.session_id, key.app_name, key.user_id
            )
        })
    }

    async fn append(&self, key: &SessionKey, events: &[Event]) -> Result<()> {
        let mut session = self.load(key).with_context(|| {
            format!(
                "cannot append events: session '{}' is missing",
                key.session_id
            )
        })?;
        session.apply_events(events);
        self.store(key, &session)
    }
}

pub fn build_session_service(cfg: &RuntimeConfig) -> Result<Arc<dyn SessionService>> {
    match cfg.session_backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionService::new())),
        SessionBackend::File => Ok(Arc::new(FileSessionService::new(&cfg.session_dir)?)),
    }
}

pub async fn ensure_session_exists(
    session_service: &Arc<dyn SessionService>,
    key: &SessionKey,
) -> Result<()> {
    if session_service.get(key, None).await.is_ok() {
        return Ok(());
    }

    session_service
        .create(key, HashMap::new())
        .await
        .with_context(|| {
            format!(
                "failed to create session '{}' for app '{}'",
                key.session_id, key.app_name
            )
        })?;

    Ok(())
}

pub async fn run_sessions_list(cfg: &RuntimeConfig) -> Result<()> {
    let session_service = build_session_service(cfg)?;
    let mut sessions = session_service
        .list(&cfg.app_name, &cfg.user_id)
        .await
        .with_context(|| {
            format!(
                "failed to list sessions for app '{}' and user '{}'",
                cfg.app_name, cfg.user_id
            )
        })?;

    if sessions.is_empty() {
        println!(
            "No sessions found for app '{}' and user '{}'.",
            cfg.app_name, cfg.user_id
        );
        return Ok(());
    }

    sessions.sort_by_key(|session| std::cmp::Reverse(session.last_update_time));

    println!(
        "Sessions for app '{}' and user '{}':",
        cfg.app_name, cfg.user_id
    );
    for session in sessions {
        println!(
            "- {} (updated: {})",
            session.id,
            session.last_update_time.to_rfc3339()
        );
    }

    Ok(())
}

pub async fn run_sessions_show(
    cfg: &RuntimeConfig,
    session_id_override: Option<String>,
    recent: usize,
) -> Result<()> {
    let session_id = session_id_override.unwrap_or_else(|| cfg.session_id.clone());
    let key = SessionKey::new(&cfg.app_name, &cfg.user_id, &session_id);
    let session_service = build_session_service(cfg)?;
    let session = session_service
        .get(&key, (recent > 0).then_some(recent))
        .await
        .with_context(|| {
            format!(
                "failed to load session '{}' for app '{}' and user '{}'",
                session_id, cfg.app_name, cfg.user_id
            )
        })?;

    println!(
        "Session '{}' (app='{}', user='{}', events={}):",
        session.id,
        session.app_name,
        session.user_id,
        session.events.len()
    );

    if session.events.is_empty() {
        println!("No events in this session.");
        return Ok(());
    }

    for event in &session.events {
        print_session_event(event);
    }

    Ok(())
}

pub async fn run_sessions_delete(
    cfg: &RuntimeConfig,
    session_id_override: Option<String>,
    force: bool,
) -> Result<()> {
    let session_id = session_id_override.unwrap_or_else(|| cfg.session_id.clone());
    if !force {
        return Err(anyhow::anyhow!(
            "session delete is destructive. Re-run with --force to delete session '{}'",
            session_id
        ));
    }

    let key = SessionKey::new(&cfg.app_name, &cfg.user_id, &session_id);
    let session_service = build_session_service(cfg)?;
    session_service.delete(&key).await.with_context(|| {
        format!(
            "failed to delete session '{}' for app '{}' and user '{}'",
            session_id, cfg.app_name, cfg.user_id
        )
    })?;

    println!(
        "Deleted session '{}' for app '{}' and user '{}'.",
        session_id, cfg.app_name, cfg.user_id
    );
    Ok(())
}

pub async fn run_sessions_prune(
    cfg: &RuntimeConfig,
    keep: usize,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let keep = keep.max(1);
    let session_service = build_session_service(cfg)?;
    let mut sessions = session_service
        .list(&cfg.app_name, &cfg.user_id)
        .await
        .with_context(|| {
            format!(
                "failed to list sessions for prune in app '{}' and user '{}'",
                cfg.app_name, cfg.user_id
            )
        })?;

    sessions.sort_by_key(|session| std::cmp::Reverse(session.last_update_time));
    let prune_ids = sessions
        .into_iter()
        .skip(keep)
        .map(|session| session.id)
        .collect::<Vec<String>>();

    if prune_ids.is_empty() {
        println!(
            "Nothing to prune. Keep={} and current session count is within limit.",
            keep
        );
        return Ok(());
    }

    if dry_run {
        println!(
            "Dry-run: {} session(s) would be deleted (keeping {} most recent):",
            prune_ids.len(),
            keep
        );
        for id in prune_ids {
            println!("- {id}");
        }
        return Ok(());
    }

    if !force {
        return Err(anyhow::anyhow!(
            "session prune is destructive and would delete {} session(s). Re-run with --force or preview with --dry-run",
            prune_ids.len()
        ));
    }

    for session_id in &prune_ids {
        let key = SessionKey::new(&cfg.app_name, &cfg.user_id, session_id);
        session_service.delete(&key).await.with_context(|| {
            format!(
                "failed to delete pruned session '{}' for app '{}' and user '{}'",
                session_id, cfg.app_name, cfg.user_id
            )
        })?;
    }

    println!(
        "Pruned {} session(s). Kept {} most recent session(s).",
        prune_ids.len(),
        keep
    );
    Ok(())
}

fn print_session_event(event: &Event) {
    let mut header = format!("[{}] {}", event.timestamp.to_rfc3339(), event.author);
    if event.is_final_response() {
        header.push_str(" [final]");
    }
    println!("{header}");

    let text = event.text();
    if !text.is_empty() {
        println!("{text}");
    } else {
        println!("<non-text event>");
    }

    if !event.actions.state_delta.is_empty() {
        let mut keys = event
            .actions
            .state_delta
            .keys()
            .cloned()
            .collect::<Vec<String>>();
        keys.sort();
        println!("state_delta keys: {}", keys.join(", "));
    }

    println!();
}
