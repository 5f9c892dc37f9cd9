use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Account id on the identity provider. Never changes once written.
    #[sea_orm(unique)]
    pub external_id: String,

    pub display_name: String,

    pub avatar_url: Option<String>,

    pub bio: Option<String>,

    pub is_admin: bool,

    pub is_banned: bool,

    pub ban_reason: Option<String>,

    /// Identity (phone, email or username) last used to log in.
    pub login_identity: Option<String>,

    /// Vault-sealed provider password.
    pub encrypted_secret: Option<String>,

    pub provider_token: Option<String>,

    pub created_at: String,

    pub last_login_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
