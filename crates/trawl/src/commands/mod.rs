pub mod fetch_contacts;
pub mod status;
