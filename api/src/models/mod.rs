pub mod contact;
pub mod profile;
pub mod project;
pub mod site;
