//! Application services: post resolution, rendering, SEO, contact and admin.

pub mod admin;
pub mod contact;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod render;
pub mod repos;
pub mod seo;
pub mod site;
pub mod sitemap;
