//! Read-only queries behind the display feed endpoints.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::{DataError, Result};

const SELECT_TICKER: &str = "SELECT t.text, t.icon, \
     (SELECT separator_icon FROM ticker WHERE id = 1) AS separator_icon \
     FROM ticker t ORDER BY t.updated_at ASC, t.id ASC";
const SELECT_MATCHES: &str = "SELECT m.team1_id, m.team2_id, m.match_time, m.channel, \
     t1.name AS team1_name, t1.logo AS team1_logo, \
     t2.name AS team2_name, t2.logo AS team2_logo \
     FROM matches m \
     JOIN teams t1 ON m.team1_id = t1.id \
     JOIN teams t2 ON m.team2_id = t2.id \
     ORDER BY m.updated_at DESC, m.id DESC";
const SELECT_LAST_MESSAGE: &str =
    "SELECT text FROM ticker ORDER BY updated_at DESC, id DESC LIMIT 1";

/// Placeholder returned when no ticker message has been stored.
pub const NO_MESSAGE: &str = "No messages sent yet";

/// Ticker line as rendered by displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TickerRow {
    /// Message text.
    pub text: String,
    /// Optional icon shown before the message.
    pub icon: Option<String>,
    /// Separator icon shared by every line (taken from the first ticker row).
    pub separator_icon: Option<String>,
}

/// Upcoming match with both teams resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MatchRow {
    /// Home team identifier.
    pub team1_id: i64,
    /// Away team identifier.
    pub team2_id: i64,
    /// Kick-off time as stored.
    pub match_time: String,
    /// Broadcast channel.
    pub channel: String,
    /// Home team name.
    pub team1_name: String,
    /// Home team logo path.
    pub team1_logo: Option<String>,
    /// Away team name.
    pub team2_name: String,
    /// Away team logo path.
    pub team2_logo: Option<String>,
}

/// Most recent ticker message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastMessage {
    /// Message text, or [`NO_MESSAGE`] when the ticker is empty.
    pub text: String,
}

/// Feed query facade.
#[derive(Clone)]
pub struct FeedStore {
    pool: SqlitePool,
}

fn map_query_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}

impl FeedStore {
    /// Wrap an already-migrated pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ticker lines, oldest update first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_ticker(&self) -> Result<Vec<TickerRow>> {
        sqlx::query_as::<_, TickerRow>(SELECT_TICKER)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("feed.ticker"))
    }

    /// Matches, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_matches(&self) -> Result<Vec<MatchRow>> {
        sqlx::query_as::<_, MatchRow>(SELECT_MATCHES)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_err("feed.matches"))
    }

    /// The newest ticker message.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn last_message(&self) -> Result<LastMessage> {
        let text = sqlx::query_scalar::<_, String>(SELECT_LAST_MESSAGE)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_query_err("feed.last_message"))?;
        Ok(LastMessage {
            text: text.unwrap_or_else(|| NO_MESSAGE.to_string()),
        })
    }
}
