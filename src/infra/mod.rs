pub mod archive;
pub mod email;
pub mod factory;
pub mod repositories;
pub mod whatsapp;
