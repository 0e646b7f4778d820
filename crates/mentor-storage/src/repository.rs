//! Repository implementations for SQLite-backed persistence.
//!
//! Provides UserRepository and ConversationRepository that operate on
//! the Database struct using raw SQL.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use mentor_core::error::MentorError;
use mentor_core::types::{ConversationRecord, UserRecord};

use crate::db::Database;

/// Repository for registered users.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch a user by name, creating one if absent.
    pub fn get_or_create(&self, username: &str) -> Result<UserRecord, MentorError> {
        if let Some(user) = self.find_by_username(username)? {
            return Ok(user);
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    user.id.to_string(),
                    user.username,
                    user.created_at.timestamp(),
                ],
            )
            .map_err(|e| MentorError::Storage(format!("Failed to create user: {}", e)))?;
            Ok(())
        })?;

        Ok(user)
    }

    /// Find a user by name.
    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, MentorError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, created_at FROM users WHERE username = ?1")
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![username], |row| {
                    let id: String = row.get(0)?;
                    let username: String = row.get(1)?;
                    let created_at: i64 = row.get(2)?;
                    Ok((id, username, created_at))
                })
                .optional()
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            match result {
                Some((id, username, created_at)) => Ok(Some(UserRecord {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| MentorError::Storage(format!("Invalid user id: {}", e)))?,
                    username,
                    created_at: Utc
                        .timestamp_opt(created_at, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                })),
                None => Ok(None),
            }
        })
    }
}

/// Repository for the append-only conversation audit log.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append one completed turn.
    pub fn append(&self, record: &ConversationRecord) -> Result<(), MentorError> {
        let suggestions = serde_json::to_string(&record.suggestions)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, user_id, timestamp, user_message, bot_response, suggestions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    record.id.to_string(),
                    record.user_id.to_string(),
                    record.timestamp.timestamp(),
                    record.user_message,
                    record.bot_response,
                    suggestions,
                ],
            )
            .map_err(|e| MentorError::Storage(format!("Failed to save conversation: {}", e)))?;
            Ok(())
        })
    }

    /// The most recent turns for a user, newest first.
    pub fn recent(&self, user_id: Uuid, limit: u64) -> Result<Vec<ConversationRecord>, MentorError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, timestamp, user_message, bot_response, suggestions
                     FROM conversations
                     WHERE user_id = ?1
                     ORDER BY timestamp DESC
                     LIMIT ?2",
                )
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], |row| {
                    let id: String = row.get(0)?;
                    let user_id: String = row.get(1)?;
                    let timestamp: i64 = row.get(2)?;
                    let user_message: String = row.get(3)?;
                    let bot_response: String = row.get(4)?;
                    let suggestions: String = row.get(5)?;
                    Ok((id, user_id, timestamp, user_message, bot_response, suggestions))
                })
                .map_err(|e| MentorError::Storage(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, user_id, timestamp, user_message, bot_response, suggestions) =
                    row.map_err(|e| MentorError::Storage(e.to_string()))?;
                records.push(ConversationRecord {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| MentorError::Storage(format!("Invalid id: {}", e)))?,
                    user_id: Uuid::parse_str(&user_id)
                        .map_err(|e| MentorError::Storage(format!("Invalid user id: {}", e)))?,
                    timestamp: Utc
                        .timestamp_opt(timestamp, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    user_message,
                    bot_response,
                    suggestions: serde_json::from_str(&suggestions).unwrap_or_default(),
                });
            }
            Ok(records)
        })
    }

    /// Count all persisted turns.
    pub fn count(&self) -> Result<u64, MentorError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
                .map_err(|e| MentorError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}
