//! `SeaORM` Entity for protocol_tokens time-series rows

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "protocol_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub protocol_id: String,
    pub chain: String,
    pub token: String,
    pub timestamp: i64,
    pub amount: Decimal,
    /// Amount valued in USD, zero when no valuation sample matched
    pub amount_usd: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
