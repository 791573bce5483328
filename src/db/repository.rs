//! Database repository for table-level operations.
//!
//! Every successful write bumps the global revision counter.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::auth::constant_time_compare;
use crate::errors::AppError;
use crate::models::{
    CreateMemberRequest, CreateSongRequest, DrinkType, MealPreference, MealPreferenceInput,
    MealPreferenceWithMember, Member, MemberListItem, RevisionInfo, Role, ScheduleEntryInput,
    ScheduleItem, SongRequest,
};

const MEMBER_COLUMNS: &str = "id, name, first_name, birthday, role, is_present, created_at";

const MEAL_COLUMNS: &str = "p.member_id, p.has_allergy, p.allergy_details, p.drink_type, \
     p.favorite_alcohols, p.favorite_soft_drinks, p.alcohol_amount, p.food_categories, \
     p.food_request, p.updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID.
    async fn increment_revision(&self) -> Result<(), AppError> {
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== MEMBER OPERATIONS ====================

    /// List members ordered by name, optionally filtered by a name substring.
    pub async fn list_members(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<MemberListItem>, AppError> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let rows = sqlx::query(
            r#"SELECT m.id, m.name, m.first_name, m.birthday, m.role, m.is_present, m.created_at,
                      EXISTS (SELECT 1 FROM meal_preferences p WHERE p.member_id = m.id) AS has_meal_preference
               FROM members m
               WHERE ? IS NULL OR instr(m.name, ?) > 0 OR instr(m.first_name, ?) > 0
               ORDER BY m.name"#,
        )
        .bind(filter)
        .bind(filter)
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let has_meal_preference: i64 = row.get("has_meal_preference");
                MemberListItem {
                    member: member_from_row(row),
                    has_meal_preference: has_meal_preference != 0,
                }
            })
            .collect())
    }

    /// Every member, ordered by name.
    pub async fn all_members(&self) -> Result<Vec<Member>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM members ORDER BY name",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(member_from_row).collect())
    }

    /// Get a member by ID.
    pub async fn get_member(&self, id: &str) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Resolve a login. The birthday is compared in constant time.
    pub async fn authenticate(
        &self,
        name: &str,
        birthday: &str,
    ) -> Result<Option<Member>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM members WHERE name = ?", MEMBER_COLUMNS))
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(member_from_row)
            .find(|m| constant_time_compare(&m.birthday, birthday)))
    }

    /// Register a new member.
    pub async fn create_member(&self, request: &CreateMemberRequest) -> Result<Member, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO members (id, name, first_name, birthday, role, is_present, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.first_name)
        .bind(&request.birthday)
        .bind(request.role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Member {} with this birthday already exists",
                request.name
            )),
            other => other,
        })?;

        self.increment_revision().await?;

        Ok(Member {
            id,
            name: request.name.clone(),
            first_name: request.first_name.clone(),
            birthday: request.birthday.clone(),
            role: request.role,
            is_present: false,
            created_at: now,
        })
    }

    /// Create the member unless one with the same name and birthday exists.
    /// Returns `true` when a row was inserted.
    pub async fn ensure_member(&self, request: &CreateMemberRequest) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO members (id, name, first_name, birthday, role, is_present, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&request.name)
        .bind(&request.first_name)
        .bind(&request.birthday)
        .bind(request.role.as_str())
        .bind(timestamp())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_revision().await?;
        Ok(true)
    }

    /// Set the attendance flag.
    pub async fn set_presence(&self, id: &str, is_present: bool) -> Result<Member, AppError> {
        let result = sqlx::query("UPDATE members SET is_present = ? WHERE id = ?")
            .bind(is_present as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member {} not found", id)));
        }

        self.increment_revision().await?;

        self.get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    /// Delete a member. Their meal preference goes with them; requests stay.
    pub async fn delete_member(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== MEAL PREFERENCE OPERATIONS ====================

    /// Get the preference a member submitted, if any.
    pub async fn get_meal_preference(
        &self,
        member_id: &str,
    ) -> Result<Option<MealPreference>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM meal_preferences p WHERE p.member_id = ?",
            MEAL_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(meal_preference_from_row))
    }

    /// Insert or replace the member's preference, keyed on member id.
    pub async fn upsert_meal_preference(
        &self,
        member_id: &str,
        input: &MealPreferenceInput,
    ) -> Result<MealPreference, AppError> {
        let now = timestamp();

        sqlx::query(
            r#"INSERT INTO meal_preferences (
                id, member_id, has_allergy, allergy_details, drink_type,
                favorite_alcohols, favorite_soft_drinks, alcohol_amount,
                food_categories, food_request, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (member_id) DO UPDATE SET
                has_allergy = excluded.has_allergy,
                allergy_details = excluded.allergy_details,
                drink_type = excluded.drink_type,
                favorite_alcohols = excluded.favorite_alcohols,
                favorite_soft_drinks = excluded.favorite_soft_drinks,
                alcohol_amount = excluded.alcohol_amount,
                food_categories = excluded.food_categories,
                food_request = excluded.food_request,
                updated_at = excluded.updated_at"#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(member_id)
        .bind(input.has_allergy as i32)
        .bind(&input.allergy_details)
        .bind(input.drink_type.map(|d| d.as_str()))
        .bind(serde_json::to_string(&input.favorite_alcohols)?)
        .bind(serde_json::to_string(&input.favorite_soft_drinks)?)
        .bind(&input.alcohol_amount)
        .bind(serde_json::to_string(&input.food_categories)?)
        .bind(&input.food_request)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(MealPreference {
            member_id: member_id.to_string(),
            has_allergy: input.has_allergy,
            allergy_details: input.allergy_details.clone(),
            drink_type: input.drink_type,
            favorite_alcohols: input.favorite_alcohols.clone(),
            favorite_soft_drinks: input.favorite_soft_drinks.clone(),
            alcohol_amount: input.alcohol_amount.clone(),
            food_categories: input.food_categories.clone(),
            food_request: input.food_request.clone(),
            updated_at: now,
        })
    }

    /// All preferences with member names, most recently updated first.
    pub async fn list_meal_preferences(&self) -> Result<Vec<MealPreferenceWithMember>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {}, m.name AS member_name
               FROM meal_preferences p
               LEFT JOIN members m ON m.id = p.member_id
               ORDER BY p.updated_at DESC"#,
            MEAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MealPreferenceWithMember {
                preference: meal_preference_from_row(row),
                member_name: row.get("member_name"),
            })
            .collect())
    }

    // ==================== SCHEDULE OPERATIONS ====================

    /// List schedule rows by start time.
    pub async fn list_schedules(&self) -> Result<Vec<ScheduleItem>, AppError> {
        let rows = sqlx::query(
            "SELECT id, time_start, title, description FROM schedules ORDER BY time_start, title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(schedule_from_row).collect())
    }

    /// Save the editor contents in one transaction: update rows with an id,
    /// insert the rest. Rows absent from `entries` are left alone.
    pub async fn save_schedules(
        &self,
        entries: &[ScheduleEntryInput],
    ) -> Result<Vec<ScheduleItem>, AppError> {
        if entries.is_empty() {
            return self.list_schedules().await;
        }

        let mut tx = self.pool.begin().await?;

        for entry in entries {
            match &entry.id {
                Some(id) => {
                    let result = sqlx::query(
                        "UPDATE schedules SET time_start = ?, title = ?, description = ? WHERE id = ?",
                    )
                    .bind(&entry.time_start)
                    .bind(&entry.title)
                    .bind(&entry.description)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(AppError::NotFound(format!(
                            "Schedule item {} not found",
                            id
                        )));
                    }
                }
                None => {
                    sqlx::query(
                        "INSERT INTO schedules (id, time_start, title, description) VALUES (?, ?, ?, ?)",
                    )
                    .bind(uuid::Uuid::new_v4().to_string())
                    .bind(&entry.time_start)
                    .bind(&entry.title)
                    .bind(&entry.description)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // One revision for the whole save
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.list_schedules().await
    }

    /// Delete a schedule row.
    pub async fn delete_schedule(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Schedule item {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== REQUEST OPERATIONS ====================

    /// List song requests, newest first, with the submitter's first name.
    pub async fn list_requests(&self) -> Result<Vec<SongRequest>, AppError> {
        let rows = sqlx::query(
            r#"SELECT r.id, r.member_id, r.member_name, m.first_name, r.song_title,
                      r.artist_name, r.message, r.created_at
               FROM requests r
               LEFT JOIN members m ON m.id = r.member_id
               ORDER BY r.created_at DESC, r.rowid DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(request_from_row).collect())
    }

    /// Post a song request on behalf of `member`.
    pub async fn create_request(
        &self,
        member: &Member,
        request: &CreateSongRequest,
    ) -> Result<SongRequest, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO requests (id, member_id, member_name, song_title, artist_name, message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&member.id)
        .bind(&member.name)
        .bind(&request.song_title)
        .bind(&request.artist_name)
        .bind(&request.message)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(SongRequest {
            id,
            member_id: Some(member.id.clone()),
            member_name: Some(member.name.clone()),
            first_name: Some(member.first_name.clone()),
            song_title: request.song_title.clone(),
            artist_name: request.artist_name.clone(),
            message: request.message.clone(),
            created_at: now,
        })
    }

    /// Delete a song request.
    pub async fn delete_request(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Request {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

/// Fixed-width UTC timestamp, so text order matches time order.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// Helper functions for row conversion

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> Member {
    let role: String = row.get("role");
    let is_present: i32 = row.get("is_present");
    Member {
        id: row.get("id"),
        name: row.get("name"),
        first_name: row.get("first_name"),
        birthday: row.get("birthday"),
        role: Role::parse(&role).unwrap_or_default(),
        is_present: is_present != 0,
        created_at: row.get("created_at"),
    }
}

fn meal_preference_from_row(row: &sqlx::sqlite::SqliteRow) -> MealPreference {
    let has_allergy: i32 = row.get("has_allergy");
    let drink_type: Option<String> = row.get("drink_type");
    let favorite_alcohols: String = row.get("favorite_alcohols");
    let favorite_soft_drinks: String = row.get("favorite_soft_drinks");
    let food_categories: String = row.get("food_categories");
    MealPreference {
        member_id: row.get("member_id"),
        has_allergy: has_allergy != 0,
        allergy_details: row.get("allergy_details"),
        drink_type: drink_type.as_deref().and_then(DrinkType::parse),
        favorite_alcohols: parse_json_array(&favorite_alcohols),
        favorite_soft_drinks: parse_json_array(&favorite_soft_drinks),
        alcohol_amount: row.get("alcohol_amount"),
        food_categories: parse_json_array(&food_categories),
        food_request: row.get("food_request"),
        updated_at: row.get("updated_at"),
    }
}

fn schedule_from_row(row: &sqlx::sqlite::SqliteRow) -> ScheduleItem {
    ScheduleItem {
        id: row.get("id"),
        time_start: row.get("time_start"),
        title: row.get("title"),
        description: row.get("description"),
    }
}

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> SongRequest {
    SongRequest {
        id: row.get("id"),
        member_id: row.get("member_id"),
        member_name: row.get("member_name"),
        first_name: row.get("first_name"),
        song_title: row.get("song_title"),
        artist_name: row.get("artist_name"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    match serde_json::from_str(s) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Corrupt JSON list column {:?}: {}", s, e);
            Vec::new()
        }
    }
}
