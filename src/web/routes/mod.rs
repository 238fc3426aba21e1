pub mod activities;
pub mod activity;
pub mod admin;
pub mod auth;
pub mod calendar;
pub mod docs;
pub mod notifications;
