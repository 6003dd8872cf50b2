//! Askama views, localized strings and admin screens.

pub mod admin;
pub mod i18n;
pub mod views;
