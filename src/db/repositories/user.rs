use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use std::collections::HashMap;

use crate::constants::defaults;
use crate::entities::{prelude::*, users};

/// User data returned from the repository. Stored secrets stay behind.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub login_identity: Option<String>,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            bio: model.bio,
            is_admin: model.is_admin,
            is_banned: model.is_banned,
            ban_reason: model.ban_reason,
            login_identity: model.login_identity,
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}

/// Display fields refreshed from the provider on every login.
#[derive(Debug, Clone)]
pub struct UserProfileFields {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub login_identity: String,
    pub encrypted_secret: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await
            .context("Failed to query user by external ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query users by ID")?;

        Ok(rows.into_iter().map(|m| (m.id, User::from(m))).collect())
    }

    pub async fn find_by_display_names(&self, names: &[String]) -> Result<Vec<User>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::DisplayName.is_in(names.iter().cloned()))
            .all(&self.conn)
            .await
            .context("Failed to query users by display name")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Creates the user on first sight, otherwise refreshes its display fields
    /// and login time. Concurrent first logins for one external id race on the
    /// unique constraint; the loser's insert is a no-op and it updates the
    /// winner's row instead.
    ///
    /// Returns the current row and whether it was created by this call.
    pub async fn upsert_from_provider(
        &self,
        external_id: &str,
        profile: &UserProfileFields,
        now: &str,
    ) -> Result<(User, bool)> {
        let active_model = users::ActiveModel {
            external_id: Set(external_id.to_string()),
            display_name: Set(profile.display_name.clone()),
            avatar_url: Set(Some(
                profile
                    .avatar_url
                    .clone()
                    .unwrap_or_else(|| defaults::AVATAR_URL.to_string()),
            )),
            bio: Set(Some(
                profile
                    .bio
                    .clone()
                    .unwrap_or_else(|| defaults::BIO.to_string()),
            )),
            is_admin: Set(false),
            is_banned: Set(false),
            created_at: Set(now.to_string()),
            last_login_at: Set(Some(now.to_string())),
            ..Default::default()
        };

        let inserted = Users::insert(active_model)
            .on_conflict(
                OnConflict::column(users::Column::ExternalId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert user")?;

        let created = inserted > 0;

        if !created {
            let mut update = Users::update_many()
                .col_expr(
                    users::Column::DisplayName,
                    Expr::value(profile.display_name.clone()),
                )
                .col_expr(users::Column::LastLoginAt, Expr::value(now.to_string()));

            if let Some(avatar) = &profile.avatar_url {
                update = update.col_expr(users::Column::AvatarUrl, Expr::value(avatar.clone()));
            }
            if let Some(bio) = &profile.bio {
                update = update.col_expr(users::Column::Bio, Expr::value(bio.clone()));
            }

            update
                .filter(users::Column::ExternalId.eq(external_id))
                .exec(&self.conn)
                .await
                .context("Failed to refresh user profile")?;
        }

        let user = self
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {external_id} vanished after upsert"))?;

        Ok((user, created))
    }

    pub async fn store_credentials(
        &self,
        id: i32,
        login_identity: &str,
        encrypted_secret: &str,
        provider_token: &str,
    ) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::LoginIdentity,
                Expr::value(login_identity.to_string()),
            )
            .col_expr(
                users::Column::EncryptedSecret,
                Expr::value(encrypted_secret.to_string()),
            )
            .col_expr(
                users::Column::ProviderToken,
                Expr::value(provider_token.to_string()),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store user credentials")?;

        Ok(())
    }

    pub async fn get_credentials(&self, id: i32) -> Result<Option<StoredCredentials>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user credentials")?;

        Ok(user.and_then(|u| {
            Some(StoredCredentials {
                login_identity: u.login_identity?,
                encrypted_secret: u.encrypted_secret?,
            })
        }))
    }

    pub async fn set_provider_token(&self, id: i32, provider_token: &str) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::ProviderToken,
                Expr::value(provider_token.to_string()),
            )
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update provider token")?;

        Ok(())
    }

    /// Returns false when the user does not exist.
    pub async fn set_banned(&self, id: i32, banned: bool, reason: Option<&str>) -> Result<bool> {
        let Some(user) = Users::find_by_id(id).one(&self.conn).await? else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_banned = Set(banned);
        active.ban_reason = Set(if banned {
            reason.map(str::to_string)
        } else {
            None
        });
        active
            .update(&self.conn)
            .await
            .context("Failed to update ban state")?;

        Ok(true)
    }

    /// Returns false when the user does not exist.
    pub async fn set_admin(&self, id: i32, is_admin: bool) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::IsAdmin, Expr::value(is_admin))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update admin flag")?;

        Ok(result.rows_affected > 0)
    }

    /// Users that have logged in through the bridge, newest first.
    pub async fn list_logged_in(
        &self,
        query: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<User>, u64)> {
        let mut condition = Condition::all().add(users::Column::LoginIdentity.is_not_null());

        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(users::Column::DisplayName.contains(q))
                    .add(users::Column::ExternalId.contains(q))
                    .add(users::Column::LoginIdentity.contains(q)),
            );
        }

        let paginator = Users::find()
            .filter(condition)
            .order_by_desc(users::Column::Id)
            .paginate(&self.conn, per_page);

        let total = paginator.num_items().await.context("Failed to count users")?;
        let rows = paginator
            .fetch_page(page)
            .await
            .context("Failed to list users")?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }
}
