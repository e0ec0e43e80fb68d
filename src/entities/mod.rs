pub mod adoption_request;
pub mod animal;
pub mod animal_image;
pub mod sea_orm_active_enums;
pub mod testimony;
pub mod user;

pub use adoption_request::Entity as AdoptionRequest;
pub use animal::Entity as Animal;
pub use animal_image::Entity as AnimalImage;
pub use testimony::Entity as Testimony;
pub use user::Entity as User;

pub mod prelude;
