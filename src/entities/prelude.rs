pub use super::adoption_request::Entity as AdoptionRequest;
pub use super::animal::Entity as Animal;
pub use super::animal_image::Entity as AnimalImage;
pub use super::testimony::Entity as Testimony;
pub use super::user::Entity as User;
