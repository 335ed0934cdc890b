//! `SeaORM` Entity for reconciliations table (append-only).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub statement_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub external_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub ledger_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub discrepancy: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub matched: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub unmatched_external: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub unmatched_ledger: Json,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
