pub mod animal_service;
