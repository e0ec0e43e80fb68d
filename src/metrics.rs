use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use crate::entities::{animal, animal_image};

pub async fn init_metrics(db: &DatabaseConnection) {
    let animal_count = animal::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("shelter_animals_total").set(animal_count as f64);

    let image_count = animal_image::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("shelter_animal_images_total").set(image_count as f64);

    tracing::info!(
        "Initialized metrics: Animals={}, Images={}",
        animal_count, image_count
    );
}

pub fn increment_animals_registered() {
    metrics::counter!("shelter_animals_registered_total").increment(1);
    metrics::gauge!("shelter_animals_total").increment(1.0);
}

pub fn increment_animals_deleted() {
    metrics::counter!("shelter_animals_deleted_total").increment(1);
    metrics::gauge!("shelter_animals_total").decrement(1.0);
}

pub fn increment_images_uploaded() {
    metrics::counter!("shelter_animal_images_uploaded_total").increment(1);
}

pub fn increment_image_upload_failures() {
    metrics::counter!("shelter_image_upload_failures_total").increment(1);
}

pub fn record_image_replacement(removed: usize, added: usize) {
    metrics::gauge!("shelter_animal_images_total").decrement(removed as f64);
    metrics::gauge!("shelter_animal_images_total").increment(added as f64);
}
