use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub recipient_id: i32,

    pub sender_id: Option<i32>,

    /// One of the `notification_kind` constants.
    pub kind: String,

    pub post_id: Option<i32>,

    /// A `work_comments.id` for the `work_comment` and `work_reply` kinds.
    pub comment_id: Option<i32>,

    pub work_id: Option<i32>,

    pub is_read: bool,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RecipientId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl ActiveModelBehavior for ActiveModel {}
