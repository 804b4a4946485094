// =============================================================================
// POSTGRES REPOSITORY - Connection pool, schema bootstrap and queries
// =============================================================================

use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{ConnectOptions, PgPool, Row};
use tokio::sync::OnceCell;
use tracing::{debug, info, log::LevelFilter};
use uuid::Uuid;

use crate::config::environment::EnvironmentVariables;
use crate::database::repository::{Repository, RepositoryError, RepositoryResult};
use crate::models::{
    FriendRequest, FriendStatus, Friendship, NewOAuthUser, NewRide, ProfileUpdate, Ride,
    RideStatus, User, UserSummary,
};

// =============================================================================
// SQL CONSTANTS
// =============================================================================

/// Single initialization SQL script
const INIT_SCHEMA_SQL: &str = include_str!("sql/schema_init.sql");

const USER_COLUMNS: &str =
    "id, google_id, email, name, username, avatar_url, bio, phone, created_at, updated_at";

const RIDE_SELECT: &str = r#"
    SELECT r.id, r.driver_id, r.origin, r.destination,
           r.origin_lat, r.origin_lng, r.destination_lat, r.destination_lng,
           r.departure_time, r.total_seats, r.status, r.created_at,
           ARRAY(
               SELECT p.user_id FROM ride_participants p
               WHERE p.ride_id = r.id ORDER BY p.joined_at
           ) AS participants
    FROM rides r
"#;

// =============================================================================
// ROW MAPPING
// =============================================================================

#[derive(sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    driver_id: Uuid,
    origin: String,
    destination: String,
    origin_lat: f64,
    origin_lng: f64,
    destination_lat: f64,
    destination_lng: f64,
    departure_time: DateTime<Utc>,
    total_seats: i32,
    status: String,
    created_at: DateTime<Utc>,
    participants: Vec<Uuid>,
}

impl TryFrom<RideRow> for Ride {
    type Error = RepositoryError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        let status: RideStatus = RideStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown ride status '{}'", row.status))?;

        Ok(Ride {
            id: row.id,
            driver_id: row.driver_id,
            origin: row.origin,
            destination: row.destination,
            origin_lat: row.origin_lat,
            origin_lng: row.origin_lng,
            destination_lat: row.destination_lat,
            destination_lng: row.destination_lng,
            departure_time: row.departure_time,
            total_seats: row.total_seats,
            status,
            participants: row.participants,
            created_at: row.created_at,
        })
    }
}

fn friendship_from_row(row: &PgRow) -> RepositoryResult<Friendship> {
    let status: String = row.try_get("status")?;

    Ok(Friendship {
        requester_id: row.try_get("requester_id")?,
        addressee_id: row.try_get("addressee_id")?,
        status: FriendStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("Unknown friendship status '{status}'"))?,
        created_at: row.try_get("created_at")?,
    })
}

/// Maps unique (23505) and foreign-key (23503) violations onto domain errors
fn map_constraint_error(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return RepositoryError::Conflict(conflict.to_string()),
            Some("23503") => return RepositoryError::NotFound("user"),
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

/// Escapes LIKE wildcards so user input matches literally
fn like_pattern(query: &str) -> String {
    let escaped: String = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// POSTGRES REPOSITORY
// =============================================================================

/// Repository backed by a single PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    /// Single connection pool for the application
    pool: Arc<OnceCell<PgPool>>,
    /// Environment configuration
    config: Arc<EnvironmentVariables>,
}

impl PostgresRepository {
    /// Creates a new repository.
    /// Note: The pool is not initialized until `initialize()` is called.
    pub fn new(config: Arc<EnvironmentVariables>) -> Self {
        Self {
            pool: Arc::new(OnceCell::new()),
            config,
        }
    }

    /// Creates the pool and runs the schema script.
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing PostgresRepository...");

        // Initialize the pool if not already initialized
        self.pool.get_or_try_init(|| async {
            self.create_pool().await
        }).await?;

        let pool: &PgPool = self.get_pool()?;
        self.initialize_schema(pool).await?;

        info!("PostgresRepository initialized successfully");
        Ok(())
    }

    /// Returns the connection pool.
    /// Errors if the pool has not been initialized.
    pub fn get_pool(&self) -> Result<&PgPool> {
        self.pool.get().ok_or_else(|| anyhow::anyhow!("Database pool not initialized"))
    }

    async fn fetch_ride(&self, id: Uuid) -> RepositoryResult<Option<Ride>> {
        let pool: &PgPool = self.get_pool()?;
        let query: String = format!("{RIDE_SELECT} WHERE r.id = $1");

        let row: Option<RideRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn fetch_existing_ride(&self, id: Uuid) -> RepositoryResult<Ride> {
        self.fetch_ride(id).await?.ok_or(RepositoryError::NotFound("ride"))
    }

    async fn fetch_rides(&self, query: &str, bind: RideFilter) -> RepositoryResult<Vec<Ride>> {
        let pool: &PgPool = self.get_pool()?;

        let rows: Vec<RideRow> = match bind {
            RideFilter::User(user_id) => sqlx::query_as(query).bind(user_id).fetch_all(pool).await?,
            RideFilter::After(after) => sqlx::query_as(query).bind(after).fetch_all(pool).await?,
        };

        rows.into_iter().map(Ride::try_from).collect()
    }
}

enum RideFilter {
    User(Uuid),
    After(DateTime<Utc>),
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

impl PostgresRepository {
    /// Creates the connection pool based on environment config
    async fn create_pool(&self) -> Result<PgPool> {
        let connect_options: PgConnectOptions = self.create_connect_options();

        let pool: PgPool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .idle_timeout(std::time::Duration::from_secs(30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database connection pool")?;

        Ok(pool)
    }

    /// Creates connection options with SSL and UTC timezone
    fn create_connect_options(&self) -> PgConnectOptions {
        let mut options: PgConnectOptions = PgConnectOptions::new()
            .host(&self.config.db_host)
            .port(self.config.db_port)
            .username(&self.config.db_user)
            .password(&self.config.db_password)
            .database(&self.config.db_name)
            .log_statements(LevelFilter::Debug);

        // Always use UTC and standard app name
        options = options.options([
            ("timezone", "UTC"),
            ("application_name", "juno-backend"),
        ]);

        // Configure SSL based on environment
        if self.config.is_production() {
            options = options.ssl_mode(sqlx::postgres::PgSslMode::Require);
        } else {
            options = options.ssl_mode(sqlx::postgres::PgSslMode::Prefer);
        }

        options
    }

    /// Runs the initialization SQL
    async fn initialize_schema(&self, pool: &PgPool) -> Result<()> {
        info!("Executing schema initialization...");

        sqlx::raw_sql(INIT_SCHEMA_SQL)
            .execute(pool)
            .await
            .context("Failed to execute schema initialization SQL")?;

        info!("Schema initialization completed");
        Ok(())
    }
}

// =============================================================================
// REPOSITORY IMPLEMENTATION
// =============================================================================

#[async_trait]
impl Repository for PostgresRepository {
    async fn upsert_oauth_user(&self, user: NewOAuthUser) -> RepositoryResult<User> {
        let pool: &PgPool = self.get_pool()?;
        let query: String = format!(
            r#"
            INSERT INTO users (id, google_id, email, name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (google_id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
                updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        );

        let saved: User = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(&user.google_id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.avatar_url)
            .fetch_one(pool)
            .await?;

        Ok(saved)
    }

    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let pool: &PgPool = self.get_pool()?;
        let query: String = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        Ok(sqlx::query_as(&query).bind(id).fetch_optional(pool).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let pool: &PgPool = self.get_pool()?;
        let query: String = format!("SELECT {USER_COLUMNS} FROM users WHERE username = LOWER($1)");

        Ok(sqlx::query_as(&query)
            .bind(username.trim())
            .fetch_optional(pool)
            .await?)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> RepositoryResult<User> {
        let pool: &PgPool = self.get_pool()?;
        let query: String = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                username = COALESCE($3, username),
                bio = COALESCE($4, bio),
                phone = COALESCE($5, phone),
                avatar_url = COALESCE($6, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let updated: Option<User> = sqlx::query_as(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.username)
            .bind(update.bio)
            .bind(update.phone)
            .bind(update.avatar_url)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_constraint_error(e, "username is already taken"))?;

        updated.ok_or(RepositoryError::NotFound("user"))
    }

    async fn search_users(
        &self,
        query: &str,
        exclude: Uuid,
        limit: usize,
    ) -> RepositoryResult<Vec<UserSummary>> {
        let pool: &PgPool = self.get_pool()?;

        let found: Vec<UserSummary> = sqlx::query_as(
            r#"
            SELECT id, name, username, avatar_url
            FROM users
            WHERE id <> $1 AND (LOWER(name) LIKE $2 OR username LIKE $2)
            ORDER BY name
            LIMIT $3
            "#,
        )
        .bind(exclude)
        .bind(like_pattern(&query.trim().to_lowercase()))
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        Ok(found)
    }

    async fn friendship_between(&self, a: Uuid, b: Uuid) -> RepositoryResult<Option<Friendship>> {
        let pool: &PgPool = self.get_pool()?;

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(friendship_from_row).transpose()
    }

    async fn create_friend_request(&self, from: Uuid, to: Uuid) -> RepositoryResult<Friendship> {
        let pool: &PgPool = self.get_pool()?;

        let row: PgRow = sqlx::query(
            r#"
            INSERT INTO friendships (requester_id, addressee_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING requester_id, addressee_id, status, created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await
        .map_err(|e| map_constraint_error(e, "a friendship already exists"))?;

        friendship_from_row(&row)
    }

    async fn accept_friend_request(
        &self,
        requester: Uuid,
        addressee: Uuid,
    ) -> RepositoryResult<Friendship> {
        let pool: &PgPool = self.get_pool()?;

        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE friendships SET status = 'accepted'
            WHERE requester_id = $1 AND addressee_id = $2 AND status = 'pending'
            RETURNING requester_id, addressee_id, status, created_at
            "#,
        )
        .bind(requester)
        .bind(addressee)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => friendship_from_row(&row),
            None => Err(RepositoryError::NotFound("friend request")),
        }
    }

    async fn list_friends(&self, user_id: Uuid) -> RepositoryResult<Vec<UserSummary>> {
        let pool: &PgPool = self.get_pool()?;

        let friends: Vec<UserSummary> = sqlx::query_as(
            r#"
            SELECT u.id, u.name, u.username, u.avatar_url
            FROM friendships f
            JOIN users u ON u.id = CASE
                WHEN f.requester_id = $1 THEN f.addressee_id
                ELSE f.requester_id
            END
            WHERE f.status = 'accepted' AND (f.requester_id = $1 OR f.addressee_id = $1)
            ORDER BY u.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(friends)
    }

    async fn list_friend_requests(&self, user_id: Uuid) -> RepositoryResult<Vec<FriendRequest>> {
        let pool: &PgPool = self.get_pool()?;

        let rows: Vec<PgRow> = sqlx::query(
            r#"
            SELECT u.id, u.name, u.username, u.avatar_url, f.created_at
            FROM friendships f
            JOIN users u ON u.id = f.requester_id
            WHERE f.addressee_id = $1 AND f.status = 'pending'
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row: &PgRow| -> RepositoryResult<FriendRequest> {
                Ok(FriendRequest {
                    from: UserSummary {
                        id: row.try_get("id")?,
                        name: row.try_get("name")?,
                        username: row.try_get("username")?,
                        avatar_url: row.try_get("avatar_url")?,
                    },
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn create_ride(&self, driver_id: Uuid, ride: NewRide) -> RepositoryResult<Ride> {
        let pool: &PgPool = self.get_pool()?;
        let id: Uuid = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO rides (
                id, driver_id, origin, destination,
                origin_lat, origin_lng, destination_lat, destination_lng,
                departure_time, total_seats, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'active')
            "#,
        )
        .bind(id)
        .bind(driver_id)
        .bind(&ride.origin)
        .bind(&ride.destination)
        .bind(ride.origin_lat)
        .bind(ride.origin_lng)
        .bind(ride.destination_lat)
        .bind(ride.destination_lng)
        .bind(ride.departure_time)
        .bind(ride.total_seats)
        .execute(pool)
        .await
        .map_err(|e| map_constraint_error(e, "ride already exists"))?;

        self.fetch_existing_ride(id).await
    }

    async fn get_ride(&self, id: Uuid) -> RepositoryResult<Option<Ride>> {
        self.fetch_ride(id).await
    }

    async fn list_rides_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Ride>> {
        let query: String = format!(
            r#"{RIDE_SELECT}
            WHERE r.driver_id = $1
               OR EXISTS (
                   SELECT 1 FROM ride_participants p
                   WHERE p.ride_id = r.id AND p.user_id = $1
               )
            ORDER BY r.departure_time"#
        );

        self.fetch_rides(&query, RideFilter::User(user_id)).await
    }

    async fn list_active_rides(&self, after: DateTime<Utc>) -> RepositoryResult<Vec<Ride>> {
        let query: String = format!(
            "{RIDE_SELECT} WHERE r.status = 'active' AND r.departure_time > $1"
        );

        self.fetch_rides(&query, RideFilter::After(after)).await
    }

    async fn add_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride> {
        let pool: &PgPool = self.get_pool()?;
        let mut tx: sqlx::Transaction<'static, sqlx::Postgres> = pool.begin().await?;

        // Row lock serializes joins against each other and against cancel
        let locked: Option<(i32, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT total_seats, status, departure_time FROM rides WHERE id = $1 FOR UPDATE",
        )
        .bind(ride_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (total_seats, status, departure_time) = locked.ok_or(RepositoryError::NotFound("ride"))?;

        if RideStatus::parse(&status) != Some(RideStatus::Active) {
            return Err(RepositoryError::Conflict("Ride is not active".into()));
        }
        if departure_time <= Utc::now() {
            return Err(RepositoryError::Conflict("Ride has already departed".into()));
        }

        let (taken, already_joined): (i64, bool) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(BOOL_OR(user_id = $2), FALSE)
            FROM ride_participants WHERE ride_id = $1
            "#,
        )
        .bind(ride_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_joined {
            return Err(RepositoryError::Conflict("already joined this ride".into()));
        }
        if taken >= i64::from(total_seats) {
            return Err(RepositoryError::Conflict("ride is full".into()));
        }

        sqlx::query("INSERT INTO ride_participants (ride_id, user_id) VALUES ($1, $2)")
            .bind(ride_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint_error(e, "already joined this ride"))?;

        tx.commit().await?;
        debug!("User {} joined ride {}", user_id, ride_id);

        self.fetch_existing_ride(ride_id).await
    }

    async fn remove_participant(&self, ride_id: Uuid, user_id: Uuid) -> RepositoryResult<Ride> {
        let pool: &PgPool = self.get_pool()?;

        let removed: u64 = sqlx::query(
            "DELETE FROM ride_participants WHERE ride_id = $1 AND user_id = $2",
        )
        .bind(ride_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

        let ride: Ride = self.fetch_existing_ride(ride_id).await?;
        if removed == 0 {
            return Err(RepositoryError::Conflict("not a participant of this ride".into()));
        }

        Ok(ride)
    }

    async fn set_ride_status(&self, ride_id: Uuid, status: RideStatus) -> RepositoryResult<Ride> {
        let pool: &PgPool = self.get_pool()?;

        let updated: u64 = sqlx::query("UPDATE rides SET status = $2 WHERE id = $1")
            .bind(ride_id)
            .bind(status.as_str())
            .execute(pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound("ride"));
        }

        self.fetch_existing_ride(ride_id).await
    }

    /// Closes the pool if it was ever opened
    async fn shutdown(&self) {
        info!("Initiating PostgresRepository shutdown...");
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Database connection pool closed");
        } else {
            debug!("Database pool was not initialized, nothing to close");
        }
    }
}
