use super::sea_orm_active_enums::AdoptionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "animals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub animal_type: String,
    pub birth_date: Date,
    pub size: Option<String>,
    pub gender: Option<String>,
    pub vaccinated: bool,
    pub castrated: bool,
    pub dewormed: bool,
    pub microchip: bool,
    pub publication_date: Date,
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_information: Option<String>,
    pub status: AdoptionStatus,
    #[sea_orm(unique)]
    pub identification_code: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::animal_image::Entity")]
    AnimalImage,
    #[sea_orm(has_many = "super::testimony::Entity")]
    Testimony,
    #[sea_orm(has_many = "super::adoption_request::Entity")]
    AdoptionRequest,
}

impl Related<super::animal_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnimalImage.def()
    }
}

impl Related<super::testimony::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Testimony.def()
    }
}

impl Related<super::adoption_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdoptionRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
